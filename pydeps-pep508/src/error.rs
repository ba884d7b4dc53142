use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty requirement line")]
    Empty,

    #[error("invalid package name in {input:?}")]
    InvalidName { input: String },

    #[error("unclosed extras list in {input:?}")]
    UnclosedExtras { input: String },

    #[error("invalid version specifier {specifier:?} in {input:?}")]
    InvalidSpecifier { input: String, specifier: String },

    #[error("missing URL after '@' in {input:?}")]
    MissingUrl { input: String },

    #[error("invalid marker {input:?}: {reason}")]
    Marker { input: String, reason: String },

    #[error("invalid version {input:?}")]
    Version { input: String },
}
