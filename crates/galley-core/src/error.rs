//! Error types shared across Galley crates.

/// An outcome code string could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseOutcomeError {
    /// The code does not start with a known outcome name.
    #[error("unrecognised outcome code '{code}'")]
    Unrecognised {
        /// The offending code.
        code: String,
    },
    /// The outcome name is known but its fields are missing or invalid.
    #[error("malformed outcome code '{code}'")]
    Malformed {
        /// The offending code.
        code: String,
    },
}
