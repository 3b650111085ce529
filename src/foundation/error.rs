/// Convenience result type used across gammablend.
pub type GammablendResult<T> = Result<T, GammablendError>;

/// Top-level error taxonomy.
///
/// Compositing and pool operations never return these; they only surface while
/// constructing views over caller memory or loading options.
#[derive(thiserror::Error, Debug)]
pub enum GammablendError {
    /// Invalid caller-provided geometry or options.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing options.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GammablendError {
    /// Build a [`GammablendError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`GammablendError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
