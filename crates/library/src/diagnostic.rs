use derive_more::Display;

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    #[display("info")]
    Info,
    #[display("warning")]
    Warning,
    #[display("error")]
    Error,
}

/// A human-readable note attached to a scan or import result.
///
/// Callers render these however they like (console, log pane, JSON); every
/// diagnostic is also emitted as a `tracing` event when it is created.
#[derive(Clone, Debug, Display, PartialEq, Eq)]
#[display("{level}: {message}")]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

impl Diagnostic {
    fn new(level: Level, message: String) -> Self {
        let diagnostic = Self { level, message };
        diagnostic.emit();
        diagnostic
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Level::Info, message.into())
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Level::Warning, message.into())
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Level::Error, message.into())
    }

    fn emit(&self) {
        match self.level {
            Level::Info => tracing::info!("{}", self.message),
            Level::Warning => tracing::warn!("{}", self.message),
            Level::Error => tracing::error!("{}", self.message),
        }
    }
}
