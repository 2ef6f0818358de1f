//! Error types for GL configuration negotiation.

/// Result type alias for GL operations.
pub type GlResult<T> = std::result::Result<T, GlError>;

/// Errors that can occur while negotiating or using a GL context.
#[derive(Debug, thiserror::Error)]
pub enum GlError {
    /// No framebuffer configuration passed the hard filters.
    #[error("no usable GL framebuffer configuration among {candidates} candidates")]
    NoMatchingConfig { candidates: usize },

    /// The context to share objects with has not been created yet.
    #[error("shared GL context must be created first")]
    SharedContextNotRealized,

    /// The configuration cannot change once the context or visual exists.
    #[error("GL configuration already realized")]
    AlreadyRealized,

    /// The display connection was torn down.
    #[error("display connection closed")]
    DisplayClosed,

    /// The platform layer reported a failure.
    #[error("platform GL error: {0}")]
    Platform(String),

    /// Binary stream encoding or decoding failed.
    #[error("GL configuration stream error: {0}")]
    Encoding(#[from] bincode::Error),
}

impl GlError {
    /// Create a platform error.
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Returns true if retrying cannot help, because the display lacks any
    /// usable configuration or is gone.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NoMatchingConfig { .. } | Self::DisplayClosed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GlError::NoMatchingConfig { candidates: 3 };
        assert_eq!(
            err.to_string(),
            "no usable GL framebuffer configuration among 3 candidates"
        );
        assert!(err.is_unavailable());

        let err = GlError::platform("glXCreateNewContext failed");
        assert!(err.to_string().contains("glXCreateNewContext"));
        assert!(!err.is_unavailable());
    }
}
