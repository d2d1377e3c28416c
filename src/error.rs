pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while building a problem or compiling a constraint
/// expression. An unsolvable problem is *not* an error: the solver entry
/// points report it as `None`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("variable `{0}` is already defined")]
    DuplicateVariable(String),

    #[error("variable `{0}` has an empty domain")]
    EmptyDomain(String),

    #[error("unknown variable `{0}`")]
    UnknownVariable(String),

    #[error("a constraint over {vars} variable(s) cannot use a {predicate} predicate")]
    ArityMismatch { vars: usize, predicate: &'static str },

    #[error("invalid constraint: {0}")]
    InvalidConstraint(String),

    #[error("cannot parse `{input}`: {reason}")]
    Parse { input: String, reason: String },
}

impl Error {
    pub(crate) fn parse(input: &str, reason: impl Into<String>) -> Self {
        Error::Parse {
            input: input.to_string(),
            reason: reason.into(),
        }
    }
}
