//! The error taxonomy and the single central reporter every failure flows
//! through.

use std::sync::{Mutex, OnceLock};

use thiserror::Error;

/// Which presentation slot a view was requested for, used by
/// [`NavError::ViewCreationFailed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewSlot {
    Root,
    Pushed,
    Modal,
    Detour,
}

/// The full taxonomy of failures the engine can produce. Every variant
/// carries enough context for the reporter to log or surface something
/// actionable without the reporter needing to reach back into the tree.
#[derive(Debug, Error, Clone)]
pub enum NavError {
    #[error("{coordinator} could not route to `{route_id}` ({route_type}): {context}")]
    NavigationFailed {
        coordinator: String,
        route_id: String,
        route_type: &'static str,
        context: String,
    },

    #[error("{coordinator} failed to build a view for `{route_id}` ({route_type}) in slot {slot:?}")]
    ViewCreationFailed {
        coordinator: String,
        route_id: String,
        route_type: &'static str,
        slot: ViewSlot,
    },

    #[error("{coordinator} claimed `{route_id}` ({route_type}) as modal, but no registered modal coordinator can handle it")]
    ModalCoordinatorNotConfigured {
        coordinator: String,
        route_id: String,
        route_type: &'static str,
    },

    #[error("{coordinator} returned NavigationType::Detour for `{route_id}` ({route_type}), which is illegal — detours must be presented explicitly")]
    InvalidDetourNavigation {
        coordinator: String,
        route_id: String,
        route_type: &'static str,
    },

    #[error("attaching to {coordinator} would create a cycle in the coordinator tree")]
    CircularReference { coordinator: String },

    #[error("{coordinator} already has child `{child}` attached to a parent")]
    DuplicateChild { coordinator: String, child: String },

    #[error("tab index {index} is out of range 0..{valid_range}")]
    InvalidTabIndex { index: usize, valid_range: usize },

    #[error("configuration error: {0}")]
    ConfigurationError(String),
}

/// Implemented by embedders to receive every [`NavError`] the engine
/// produces. The default sink logs via `tracing`.
pub trait NavErrorReporter: Send + Sync {
    fn report(&self, error: &NavError);
}

struct TracingReporter;

impl NavErrorReporter for TracingReporter {
    fn report(&self, error: &NavError) {
        tracing::warn!(target: "waypoint", %error, "navigation error");
    }
}

static REPORTER: OnceLock<Mutex<Box<dyn NavErrorReporter>>> = OnceLock::new();

fn reporter_cell() -> &'static Mutex<Box<dyn NavErrorReporter>> {
    REPORTER.get_or_init(|| Mutex::new(Box::new(TracingReporter)))
}

/// Sets the process-wide error reporter. Intended to be called once by the
/// embedder during startup; tests may call it repeatedly to install a
/// capturing reporter.
pub fn set_reporter(reporter: Box<dyn NavErrorReporter>) {
    let cell = reporter_cell();
    *cell.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = reporter;
}

/// Routes `error` through the central reporter. Called by the engine;
/// embedders never need to call this directly.
pub fn report(error: NavError) {
    let cell = reporter_cell();
    cell.lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
        .report(&error);
}

/// A capturing reporter other modules' tests can install to assert on what
/// reaches the central reporter, without each call site re-implementing
/// `NavErrorReporter`.
#[cfg(test)]
pub(crate) mod tests_support {
    use super::{set_reporter, NavError, NavErrorReporter};
    use std::sync::{Arc, Mutex};

    pub(crate) struct CapturingReporter(pub Arc<Mutex<Vec<NavError>>>);
    impl NavErrorReporter for CapturingReporter {
        fn report(&self, error: &NavError) {
            self.0.lock().unwrap().push(error.clone());
        }
    }

    /// Installs a fresh capturing reporter as the process-wide reporter and
    /// returns the shared buffer it writes reported errors into.
    pub(crate) fn install_capturing_reporter() -> Arc<Mutex<Vec<NavError>>> {
        let captured = Arc::new(Mutex::new(Vec::new()));
        set_reporter(Box::new(CapturingReporter(captured.clone())));
        captured
    }
}

#[cfg(test)]
mod tests {
    use super::tests_support::install_capturing_reporter;
    use super::*;
    use serial_test::serial;

    // The reporter is process-wide (`OnceLock`); serialize against every
    // other test in the crate that installs a capturing reporter so a
    // concurrently running `navigate()` failure elsewhere can't land in our
    // buffer mid-assertion.
    #[test]
    #[serial(nav_reporter)]
    fn reporter_receives_reported_errors() {
        let captured = install_capturing_reporter();

        report(NavError::ConfigurationError("boom".into()));

        assert!(captured
            .lock()
            .unwrap()
            .iter()
            .any(|err| matches!(err, NavError::ConfigurationError(msg) if msg == "boom")));
    }
}
