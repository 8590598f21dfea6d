use anyhow::Result;

use crate::{ExecutionPath, Feeds, ModelSource, ModelSpec, Outputs, SessionOptions};

/// Builds runtime sessions for a given execution path. The session layer
/// only ever talks to the runtime through this seam.
pub trait ProviderFactory {
    fn create(
        &self,
        source: &ModelSource,
        path: ExecutionPath,
        options: &SessionOptions,
    ) -> Result<Box<dyn ProviderSession>>;
}

/// One live runtime session. Feeds go in, outputs come out; no validation
/// or transformation happens on this side of the seam.
pub trait ProviderSession: Send {
    fn spec(&self) -> &ModelSpec;

    fn run(&mut self, feeds: Feeds) -> Result<Outputs>;
}

/// Answers "can the accelerated path be used at all", without committing
/// a session to it. Implementations fold every failure mode into `false`;
/// absence of GPU support is a normal condition, not an error. Each call
/// is an independent fresh probe.
pub trait CapabilityProbe {
    fn probe(&self) -> impl std::future::Future<Output = bool> + Send;
}
