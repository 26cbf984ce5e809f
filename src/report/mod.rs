//! Report renderers.
//!
//! - [`terminal`] — colored tables with a summary box; respects `--verbose` / `--quiet`.
//!
//! JSON output is the serde form of the report models, written by the binary.

pub mod terminal;
