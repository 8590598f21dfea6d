use thiserror::Error;

/// Everything the session layer can report to a caller.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The mandatory baseline path could not be built. Terminal: the
    /// session has no working execution path and stays Failed.
    #[error("portable initialization failed: {0}")]
    PortableInit(#[source] anyhow::Error),

    /// The optional upgrade path could not be built. Non-fatal: the
    /// session keeps running on the portable path. Kept as a variant so
    /// the fallback can be reported, never surfaced as fatal.
    #[error("accelerated initialization failed: {0}")]
    AcceleratedInit(#[source] anyhow::Error),

    /// Inference was requested before the session reached Ready, or
    /// after it failed.
    #[error("model is not loaded yet")]
    NotReady,

    /// The runtime rejected or aborted an inference call. Carries the
    /// runtime's diagnostic verbatim; the session stays Ready.
    #[error("inference failed: {0}")]
    Inference(#[source] anyhow::Error),
}

impl SessionError {
    /// One-line rendering of the full error chain, oldest cause last.
    pub fn chain(&self) -> String {
        use std::error::Error as _;
        let mut out = self.to_string();
        let mut source = self.source().and_then(|e| e.source());
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn not_ready_message() {
        assert_eq!(SessionError::NotReady.to_string(), "model is not loaded yet");
    }

    #[test]
    fn chain_includes_causes() {
        let err = SessionError::Inference(anyhow!("outer").context("shape mismatch"));
        let chain = err.chain();
        assert!(chain.contains("inference failed"));
        assert!(chain.contains("outer"));
    }
}
