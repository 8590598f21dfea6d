use std::path::PathBuf;

/// Which runtime execution provider a session is running on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionPath {
    /// CPU provider; works everywhere, no hardware requirements.
    Portable,
    /// GPU-backed provider; requires a usable adapter and a successful
    /// provider registration.
    Accelerated,
}

impl ExecutionPath {
    /// User-facing label, shown in status text and result dumps.
    pub fn label(self) -> &'static str {
        match self {
            ExecutionPath::Portable => "CPU",
            ExecutionPath::Accelerated => "CUDA",
        }
    }
}

/// Lifecycle of one loaded model. A single value replaced whole on each
/// transition, so observers never see a partially-updated mixture of
/// "loading" flags and stale errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    Ready { path: ExecutionPath },
    Failed { error: String },
}

impl SessionState {
    pub fn is_ready(&self) -> bool {
        matches!(self, SessionState::Ready { .. })
    }

    /// Status line for the display surface.
    pub fn status_line(&self) -> String {
        match self {
            SessionState::Loading => "Loading model...".to_string(),
            SessionState::Ready { path } => {
                format!("Model loaded successfully (using {})", path.label())
            }
            SessionState::Failed { error } => format!("Error loading model: {error}"),
        }
    }
}

/// Opaque model location; resolved by the runtime, never parsed here.
#[derive(Clone, Debug)]
pub struct ModelSource(pub PathBuf);

impl ModelSource {
    pub fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl From<PathBuf> for ModelSource {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptimizationLevel {
    Disabled,
    Basic,
    Extended,
    All,
}

/// Options forwarded verbatim to the runtime's session builder.
#[derive(Clone, Copy, Debug)]
pub struct SessionOptions {
    pub optimization: OptimizationLevel,
    pub memory_arena: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            optimization: OptimizationLevel::All,
            memory_arena: true,
        }
    }
}
