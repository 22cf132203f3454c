//! Error type shared across the pipeline.
//!
//! Every fallible operation returns `AppError` so the binary can map failures
//! to stable exit codes, and so the orchestrator can branch on the error
//! taxonomy (e.g., a data-availability problem is non-fatal, a precondition
//! violation must not mutate session state).

/// Closed error taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or missing input (ledger columns, dates, config).
    Input,
    /// Valid query, but no data came back (empty weather range, empty sales).
    DataUnavailable,
    /// An operation was invoked out of order; names the missing prerequisite.
    Precondition,
    /// Network failure or malformed response from an external provider.
    External,
    /// Degenerate input rejected by the forecasting engine.
    ModelFit,
    /// Filesystem failure while writing an export artifact.
    Export,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Input => 2,
            ErrorKind::DataUnavailable => 3,
            ErrorKind::Precondition => 4,
            ErrorKind::External => 5,
            ErrorKind::ModelFit => 6,
            ErrorKind::Export => 7,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Input, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataUnavailable, message)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Precondition, message)
    }

    pub fn external(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::External, message)
    }

    pub fn model_fit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelFit, message)
    }

    pub fn export(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Export, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
