use std::error::Error as StdError;
use std::fmt;
use std::sync::Arc;

/// A failure raised while crawling: the error value plus the traceback text
/// the host captured at the raise site, if any.
///
/// Cloning is cheap; the underlying error is shared.
#[derive(Clone)]
pub struct Failure {
    error: Arc<dyn StdError + Send + Sync + 'static>,
    traceback: Option<String>,
}

impl Failure {
    /// Create a failure from an error value
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            error: Arc::new(error),
            traceback: None,
        }
    }

    /// Attach the traceback text captured at the raise site
    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }

    /// The underlying error value
    pub fn error(&self) -> &(dyn StdError + 'static) {
        self.error.as_ref()
    }

    /// The captured traceback text, if any
    pub fn traceback(&self) -> Option<&str> {
        self.traceback.as_deref()
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Failure")
            .field("error", &self.error.to_string())
            .field("traceback", &self.traceback)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_failure_display() {
        let failure = Failure::new(io::Error::new(io::ErrorKind::Other, "boom"));
        assert_eq!(failure.to_string(), "boom");
        assert!(failure.traceback().is_none());
    }

    #[test]
    fn test_failure_with_traceback() {
        let failure = Failure::new(io::Error::new(io::ErrorKind::Other, "boom"))
            .with_traceback("at parse()\nat download()");
        assert_eq!(failure.traceback().unwrap(), "at parse()\nat download()");
    }
}
