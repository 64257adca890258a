//! Single-flight guard for submit actions.

use std::sync::atomic::{AtomicBool, Ordering};

use leadconsole_core::error::CoreError;

/// Tracks whether an action is outstanding. A second submission while one
/// is in flight is rejected with `Conflict`.
#[derive(Debug, Default)]
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot. The returned guard releases it when dropped.
    pub fn try_begin(&self, action: &str) -> Result<InFlightGuard<'_>, CoreError> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!(action, "Rejected submission while another is in flight");
            return Err(CoreError::Conflict(format!(
                "A {action} is already in progress"
            )));
        }
        Ok(InFlightGuard { flag: &self.busy })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the [`InFlight`] slot on drop, including on early return.
#[derive(Debug)]
pub struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
