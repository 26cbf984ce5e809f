//! License text identification and compatibility reasoning.
//!
//! - [`canonical`] — reduces raw text to a stable comparison form.
//! - [`corpus`] — reference templates and compatibility matrices, loaded once.
//! - [`identifier`] — maps license text to an SPDX ID by canonical prefix match.
//! - [`header`] — checks that a license header sits near the top of a file.
//! - [`expression`] — flat SPDX expressions (`AND` / `OR` / `WITH`).
//! - [`spdx`] — common non-SPDX spellings mapped to SPDX IDs.
//! - [`compatibility`] — accepts or rejects a license for a main license.

pub mod canonical;
pub mod compatibility;
pub mod corpus;
pub mod expression;
pub mod header;
pub mod identifier;
pub mod spdx;

pub use canonical::canonicalize;
pub use compatibility::{Decision, Evaluator, Policy, Reason};
pub use corpus::Corpus;
pub use identifier::identify;
