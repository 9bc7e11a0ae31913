//! Client-side prompt state: the pending screenshot, the single-capture
//! in-flight guard, and submission assembly.
//!
//! At most one screenshot is pending at a time, and it exists only while
//! the overlay is expanded. All of this is driven from the webview via
//! commands; no capture-authority calls live here.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;
use thiserror::Error;

pub struct PromptState {
    pending_screenshot: Mutex<Option<String>>,
    capture_in_flight: AtomicBool,
    captured_since_expand: AtomicBool,
    /// Bumped on every minimize. A capture result only lands if the
    /// overlay has not minimized since the capture began.
    minimize_epoch: AtomicU64,
    capture_epoch: AtomicU64,
}

/// One outgoing request: free-text input, a screenshot, or both.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub text: Option<String>,
    pub screenshot: Option<String>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Nothing to send — type a prompt or attach a screenshot")]
    Empty,
}

impl PromptState {
    pub fn new() -> Self {
        Self {
            pending_screenshot: Mutex::new(None),
            capture_in_flight: AtomicBool::new(false),
            captured_since_expand: AtomicBool::new(false),
            minimize_epoch: AtomicU64::new(0),
            capture_epoch: AtomicU64::new(0),
        }
    }

    /// Claims the single in-flight capture slot. Returns false when a
    /// capture is already outstanding; the caller drops the trigger
    /// rather than queueing it.
    pub fn begin_capture(&self) -> bool {
        let claimed = self
            .capture_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if claimed {
            // Remember which expand this capture belongs to. At most one
            // capture is in flight, so a single slot suffices.
            self.capture_epoch
                .store(self.minimize_epoch.load(Ordering::SeqCst), Ordering::SeqCst);
        }
        claimed
    }

    /// Releases the in-flight slot. A successful capture replaces any
    /// existing pending screenshot; a failed one leaves it untouched.
    /// A result from a capture begun before the last minimize is
    /// discarded — pending screenshots never outlive the expand they
    /// were taken for.
    pub fn finish_capture(&self, screenshot: Option<String>) {
        let stale = self.capture_epoch.load(Ordering::SeqCst)
            != self.minimize_epoch.load(Ordering::SeqCst);
        if let Some(data_url) = screenshot {
            if stale {
                log::info!("[PROMPT] Discarding capture that finished after minimize");
            } else {
                *self.pending_screenshot.lock().unwrap() = Some(data_url);
            }
        }
        self.capture_in_flight.store(false, Ordering::SeqCst);
    }

    /// Discards the pending screenshot without contacting the capture
    /// authority.
    pub fn clear_pending(&self) {
        *self.pending_screenshot.lock().unwrap() = None;
    }

    pub fn pending(&self) -> Option<String> {
        self.pending_screenshot.lock().unwrap().clone()
    }

    /// Pending screenshots exist only while the overlay is expanded:
    /// minimize discards them and re-arms the auto-capture edge trigger.
    pub fn on_minimized(&self) {
        self.clear_pending();
        self.captured_since_expand.store(false, Ordering::SeqCst);
        self.minimize_epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// True exactly once per minimize → expand transition.
    pub fn should_auto_capture(&self) -> bool {
        self.captured_since_expand
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// Assembles the outgoing request. Requires text or a screenshot;
    /// both are cleared on dispatch.
    pub fn take_submission(&self, text: &str) -> Result<Submission, SubmitError> {
        let text = text.trim();
        let mut pending = self.pending_screenshot.lock().unwrap();
        if text.is_empty() && pending.is_none() {
            return Err(SubmitError::Empty);
        }

        Ok(Submission {
            text: (!text.is_empty()).then(|| text.to_string()),
            screenshot: pending.take(),
        })
    }
}

impl Default for PromptState {
    fn default() -> Self {
        Self::new()
    }
}
