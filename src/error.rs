use thiserror::Error;

/// Failures while loading the reference corpus. Any of these aborts the run
/// before a single file or dependency is checked.
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("asset {0} is missing from the asset store")]
    MissingAsset(String),

    #[error("template {name} is not valid UTF-8")]
    InvalidUtf8 { name: String },

    #[error("template {name} canonicalizes to an empty string")]
    EmptyTemplate { name: String },

    #[error("templates {first} and {second} overlap: one is a prefix of the other")]
    OverlappingTemplates { first: String, second: String },

    #[error("compatibility matrix {name} could not be parsed: {source}")]
    InvalidMatrix {
        name: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("compatibility matrix for {main} lists {license} in more than one set")]
    OverlappingSets { main: String, license: String },

    #[error("more than one compatibility matrix for {0}")]
    DuplicateMatrix(String),
}

/// Reasons an SPDX expression cannot be reduced to a flat AND/OR list.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpressionError {
    #[error("license expression is empty")]
    Empty,

    #[error("license expression {0:?} mixes AND and OR without parentheses")]
    Ambiguous(String),
}

/// Fatal errors of a compatibility run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompatibilityError {
    #[error("no compatibility matrix for main license {0}")]
    NoCompatibilityEntry(String),
}

/// One dependency that made a `deps check` run fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Offender {
    pub name: String,
    pub version: String,
    pub license: String,
}

impl std::fmt::Display for Offender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.license)
    }
}

/// Aggregated outcome of a failed check: every offending dependency, not
/// just the first one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("{} incompatible dependencies: {}", .0.len(), join(.0))]
    Incompatible(Vec<Offender>),
}

fn join(offenders: &[Offender]) -> String {
    offenders
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors building a header checker.
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("header pattern does not compile: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("invalid path glob: {0}")]
    InvalidGlob(#[from] glob::PatternError),

    #[error("no header content or pattern configured")]
    NothingToMatch,
}
