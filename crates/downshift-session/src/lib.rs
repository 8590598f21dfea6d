//! Model session lifecycle: build the portable session first, then try to
//! upgrade to the accelerated path, falling back silently when the upgrade
//! is unavailable or fails.

use downshift_core::{
    CapabilityProbe, ExecutionPath, Feeds, ModelSource, ModelSpec, Outputs, ProviderFactory,
    ProviderSession, SessionError, SessionOptions, SessionState,
};
use tracing::{debug, error, info, warn};

/// Owns one loaded model and the runtime session currently serving it.
///
/// All state lives in a single [`SessionState`] value replaced whole on
/// each transition. Initialization is strictly sequential: the accelerated
/// attempt never starts before the portable fallback is known to work.
pub struct ModelSession {
    source: ModelSource,
    options: SessionOptions,
    state: SessionState,
    active: Option<Box<dyn ProviderSession>>,
    fallback_error: Option<SessionError>,
}

impl ModelSession {
    /// A new session starts in `Loading` with no runtime session; call
    /// [`initialize`](Self::initialize) to drive it to a terminal state.
    pub fn new(source: ModelSource, options: SessionOptions) -> Self {
        Self {
            source,
            options,
            state: SessionState::Loading,
            active: None,
            fallback_error: None,
        }
    }

    /// Drives the state machine to a terminal state. Never returns an
    /// error: a portable failure is recorded in the `Failed` state, an
    /// accelerated failure is swallowed into the fallback. Calling again
    /// after a terminal state is a no-op.
    pub async fn initialize<F, P>(&mut self, factory: &F, probe: &P)
    where
        F: ProviderFactory,
        P: CapabilityProbe,
    {
        if self.state != SessionState::Loading {
            return;
        }

        debug!(source = ?self.source.path(), "attempting portable initialization");
        let portable = match factory.create(&self.source, ExecutionPath::Portable, &self.options) {
            Ok(session) => session,
            Err(err) => {
                let err = SessionError::PortableInit(err);
                error!(error = %err.chain(), "portable initialization failed");
                self.transition(SessionState::Failed {
                    error: err.chain(),
                });
                return;
            }
        };

        self.active = Some(portable);
        self.transition(SessionState::Ready {
            path: ExecutionPath::Portable,
        });

        if !probe.probe().await {
            debug!("accelerated path unavailable, staying on portable");
            return;
        }

        debug!("GPU support detected, attempting accelerated initialization");
        match factory.create(&self.source, ExecutionPath::Accelerated, &self.options) {
            Ok(session) => {
                self.active = Some(session);
                self.transition(SessionState::Ready {
                    path: ExecutionPath::Accelerated,
                });
            }
            Err(err) => {
                let err = SessionError::AcceleratedInit(err);
                warn!(error = %err.chain(), "accelerated initialization failed, keeping portable session");
                self.fallback_error = Some(err);
            }
        }
    }

    /// Forwards the feeds to the active runtime session.
    ///
    /// Runtime failures come back as [`SessionError::Inference`] and leave
    /// the session Ready; a failed call may simply be retried.
    pub fn run(&mut self, feeds: Feeds) -> Result<Outputs, SessionError> {
        if !self.state.is_ready() {
            return Err(SessionError::NotReady);
        }
        let session = self.active.as_mut().ok_or(SessionError::NotReady)?;
        session.run(feeds).map_err(SessionError::Inference)
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn status_line(&self) -> String {
        self.state.status_line()
    }

    pub fn active_path(&self) -> Option<ExecutionPath> {
        match self.state {
            SessionState::Ready { path } => Some(path),
            _ => None,
        }
    }

    /// Declared IO of the loaded model, once Ready.
    pub fn model_spec(&self) -> Option<&ModelSpec> {
        self.active.as_ref().map(|s| s.spec())
    }

    /// The swallowed accelerated-path error, if the session fell back.
    pub fn fallback_error(&self) -> Option<&SessionError> {
        self.fallback_error.as_ref()
    }

    fn transition(&mut self, next: SessionState) {
        self.state = next;
        info!(status = %self.state.status_line(), "session state changed");
    }
}
