//! The per-callback failure boundary.
//!
//! Every listener, state observer, lifecycle hook and handler runs through
//! [`run_isolated`], so an `Err` or a panic in one callback is logged and
//! recorded while the remaining callbacks still run.

use super::error::{FaultKind, ObserverFault, ObserverRole, ReactionError};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use tracing::error;

/// Outcome of one raise, notification or handler dispatch.
///
/// Reports never become errors; they exist so callers can see what ran.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Callbacks that were invoked, including those that faulted
    pub invoked: usize,
    /// Callbacks that were present but not invoked (disabled, or registered
    /// for a different payload type)
    pub skipped: usize,
    /// Faults caught during this call, in invocation order
    pub faults: Vec<ObserverFault>,
}

impl DispatchReport {
    /// True when every invoked callback succeeded.
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }

    /// Number of callbacks that completed without fault.
    pub fn succeeded(&self) -> usize {
        self.invoked - self.faults.len()
    }

    pub fn merge(&mut self, other: DispatchReport) {
        self.invoked += other.invoked;
        self.skipped += other.skipped;
        self.faults.extend(other.faults);
    }

    pub(crate) fn skip(&mut self) {
        self.skipped += 1;
    }

    pub(crate) fn run<F>(&mut self, role: ObserverRole, name: &str, f: F)
    where
        F: FnOnce() -> Result<(), ReactionError>,
    {
        self.invoked += 1;
        if let Err(kind) = run_isolated(role, name, f) {
            self.faults.push(ObserverFault {
                role,
                observer: name.to_string(),
                kind,
            });
        }
    }
}

/// Run one callback inside a failure boundary.
///
/// Errors and panics are logged with the callback's identity and returned as
/// a [`FaultKind`]; nothing unwinds past this call.
pub fn run_isolated<F>(role: ObserverRole, name: &str, f: F) -> Result<(), FaultKind>
where
    F: FnOnce() -> Result<(), ReactionError>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => {
            error!(
                role = %role,
                observer = %name,
                error = %err,
                "Observer returned error"
            );
            Err(FaultKind::Failed(err))
        }
        Err(payload) => {
            let panic_msg = panic_message(payload.as_ref());
            error!(
                role = %role,
                observer = %name,
                panic_msg = %panic_msg,
                "Observer panicked"
            );
            Err(FaultKind::Panicked(panic_msg))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_passes_through() {
        assert!(run_isolated(ObserverRole::Listener, "ok", || Ok(())).is_ok());
    }

    #[test]
    fn error_is_captured() {
        let result = run_isolated(ObserverRole::Handler, "bad", || {
            Err(ReactionError::new("nope"))
        });
        assert_eq!(result, Err(FaultKind::Failed(ReactionError::new("nope"))));
    }

    #[test]
    fn panic_is_captured_with_message() {
        let result = run_isolated(ObserverRole::Handler, "bad", || panic!("kaboom"));
        assert_eq!(result, Err(FaultKind::Panicked("kaboom".to_string())));
    }

    #[test]
    fn formatted_panic_message_is_kept() {
        let code = 7;
        let result = run_isolated(ObserverRole::Listener, "bad", || panic!("code {code}"));
        assert_eq!(result, Err(FaultKind::Panicked("code 7".to_string())));
    }

    #[test]
    fn report_counts_every_invocation() {
        let mut report = DispatchReport::default();
        report.run(ObserverRole::Handler, "a", || Ok(()));
        report.run(ObserverRole::Handler, "b", || Err("broken".into()));
        report.run(ObserverRole::Handler, "c", || Ok(()));
        report.skip();

        assert_eq!(report.invoked, 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults[0].observer, "b");
        assert!(!report.is_clean());
    }

    #[test]
    fn merge_accumulates() {
        let mut first = DispatchReport::default();
        first.run(ObserverRole::ExitHook, "x", || Ok(()));
        let mut second = DispatchReport::default();
        second.run(ObserverRole::EnterHook, "y", || Err("no".into()));

        first.merge(second);
        assert_eq!(first.invoked, 2);
        assert_eq!(first.faults.len(), 1);
    }
}
