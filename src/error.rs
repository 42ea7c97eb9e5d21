pub type ScrimResult<T> = Result<T, ScrimError>;

#[derive(thiserror::Error, Debug)]
pub enum ScrimError {
    /// Programmer error at the API surface: malformed percent string,
    /// wrong-kind setter, unsupported asset file type. Fail fast, never retried.
    #[error("usage error: {0}")]
    Usage(String),

    /// The bounds-parent chain loops back on itself.
    #[error("cyclic bounds parent: chain revisits node {0}")]
    CyclicParent(usize),

    /// A descriptor or sheet lacks data the node needs (missing key,
    /// unknown frame name). Raised when the node resolves its source data,
    /// not deferred to draw time.
    #[error("missing data: {0}")]
    MissingData(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ScrimError {
    pub fn usage(msg: impl Into<String>) -> Self {
        Self::Usage(msg.into())
    }

    pub fn missing_data(msg: impl Into<String>) -> Self {
        Self::MissingData(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes_are_stable() {
        assert!(ScrimError::usage("x").to_string().contains("usage error:"));
        assert!(
            ScrimError::missing_data("x")
                .to_string()
                .contains("missing data:")
        );
        assert!(
            ScrimError::CyclicParent(3)
                .to_string()
                .contains("cyclic bounds parent:")
        );
    }
}
