//! License compliance checks: license headers in source files and
//! compatibility of dependency licenses with a project's main license.

pub mod assets;
pub mod config;
pub mod deps;
pub mod error;
pub mod headers;
pub mod input;
pub mod license;
pub mod models;
pub mod report;

pub use assets::{AssetStore, EmbeddedAssets, MemoryAssets};
pub use deps::evaluate_dependencies;
pub use error::{CheckError, CompatibilityError, CorpusError, ExpressionError, HeaderError};
pub use headers::HeaderChecker;
pub use license::{canonicalize, identify, Corpus, Decision, Evaluator, Policy, Reason};
pub use models::{DependencyRecord, HeaderReport, Report};
