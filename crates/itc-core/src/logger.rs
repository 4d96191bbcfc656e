use std::fmt::Display;

const PREFIX: &str = "[itc]";

/// Leveled logger scoped to one run.
///
/// Passed by value into every stage instead of living in a global.
/// Messages go through the `log` facade; `error` is never gated.
///
/// | verbosity | error | warn / success | info |
/// |-----------|-------|----------------|------|
/// | 0         | yes   | no             | no   |
/// | 1         | yes   | yes            | no   |
/// | 2         | yes   | yes            | yes  |
///
/// # Example
/// ```
/// use itc_core::logger::RunLogger;
/// let log = RunLogger::new(1);
/// assert!(log.warn("shown"));
/// assert!(!log.info("hidden"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RunLogger {
    verbosity: u8,
}

impl RunLogger {
    /// Create a logger for the given verbosity (0..=2).
    #[must_use]
    pub fn new(verbosity: u8) -> Self {
        Self {
            verbosity: verbosity.min(2),
        }
    }

    /// Configured verbosity.
    #[must_use]
    pub fn verbosity(&self) -> u8 {
        self.verbosity
    }

    /// Informational detail. Returns whether it was emitted.
    pub fn info(&self, msg: impl Display) -> bool {
        if self.verbosity < 2 {
            return false;
        }
        log::info!("{PREFIX} {msg}");
        true
    }

    /// Step completed. Returns whether it was emitted.
    pub fn success(&self, msg: impl Display) -> bool {
        if self.verbosity < 1 {
            return false;
        }
        log::info!(target: "itc::success", "{PREFIX} {msg}");
        true
    }

    /// Recoverable problem. Returns whether it was emitted.
    pub fn warn(&self, msg: impl Display) -> bool {
        if self.verbosity < 1 {
            return false;
        }
        log::warn!("{PREFIX} {msg}");
        true
    }

    /// Failure. Always emitted.
    pub fn error(&self, msg: impl Display) -> bool {
        log::error!("{PREFIX} {msg}");
        true
    }
}

impl Default for RunLogger {
    fn default() -> Self {
        Self::new(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gating_by_verbosity() {
        let quiet = RunLogger::new(0);
        assert!(quiet.error("e"));
        assert!(!quiet.warn("w"));
        assert!(!quiet.success("s"));
        assert!(!quiet.info("i"));

        let loud = RunLogger::new(2);
        assert!(loud.warn("w"));
        assert!(loud.success("s"));
        assert!(loud.info("i"));
    }

    #[test]
    fn verbosity_is_capped() {
        assert_eq!(RunLogger::new(7).verbosity(), 2);
    }
}
