//! Screen capture domain — public API.
//!
//! This module owns the capture acquisition path: permission probing,
//! source selection, thumbnail retrieval, and data-URL conversion.
//! External code should only use the public functions exported here.

mod permissions;
mod sources;

pub use permissions::{ensure_permission, probe_permission, PermissionSession};
pub use sources::{enumerate, primary_display_id, select, to_data_url, DisplaySource};

use thiserror::Error;

/// Thumbnail bound for real captures. Full native resolution is never
/// requested — raw desktop pixels can be very large.
pub const CAPTURE_MAX_WIDTH: u32 = 1920;
pub const CAPTURE_MAX_HEIGHT: u32 = 1080;

/// Settle delay before grabbing, to avoid racing window paint state.
const SETTLE_DELAY_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Window not available")]
    WindowUnavailable,

    #[error("No screen sources available. Please grant screen recording permissions.")]
    NoSourcesAvailable,

    #[error("No valid screen source found")]
    NoValidSource,

    #[error("{0}")]
    PermissionDenied(String),

    #[error("Failed to capture screen: {0}")]
    CaptureFailed(String),
}

impl CaptureError {
    /// Permission failures are actionable, not noise — silent captures
    /// still surface these.
    pub fn is_permission_related(&self) -> bool {
        matches!(self, CaptureError::PermissionDenied(_))
    }
}

/// Rewrites a raw platform failure into a classified error.
///
/// The capture API exposes no structured permission-denied code, so this
/// falls back to sniffing the message text. Known misclassification risk:
/// any message that merely mentions "permission" gets promoted.
pub fn classify_failure(message: &str) -> CaptureError {
    let lower = message.to_lowercase();
    if lower.contains("permission")
        || lower.contains("access denied")
        || lower.contains("not authorized")
    {
        CaptureError::PermissionDenied(permissions::remediation_message())
    } else {
        CaptureError::CaptureFailed(message.to_string())
    }
}

/// Post-enumeration half of the capture pipeline: selection plus
/// data-URL conversion. Kept free of OS calls so the selection policy
/// and failure taxonomy are testable without a display.
pub fn acquire(sources: Vec<DisplaySource>, primary_id: Option<&str>) -> Result<String, CaptureError> {
    // Empty enumeration is the dominant real-world failure mode, and the
    // one most likely caused by a missing OS permission grant. It is
    // classified exactly here; selection over non-empty input is total,
    // since the policy ends in a first-source fallback.
    let Some((first, _)) = sources.split_first() else {
        return Err(CaptureError::NoSourcesAvailable);
    };

    let source = sources::select(&sources, primary_id).unwrap_or(first);
    log::info!(
        "[CAPTURE] Selected source id={} name=\"{}\"",
        source.id,
        source.name
    );

    let thumbnail = source.thumbnail.as_ref().ok_or(CaptureError::NoValidSource)?;
    sources::to_data_url(thumbnail).map_err(|e| classify_failure(&e))
}

/// Captures the primary display as a base64 PNG data URL.
///
/// Per call: CheckingWindow → Enumerating → SelectingSource →
/// Success | Failed. No automatic retries and no cancellation — the
/// caller decides whether to try again.
pub async fn capture_screen(app: &tauri::AppHandle) -> Result<String, CaptureError> {
    use tauri::Manager;

    // The host window must exist and not be destroyed.
    if app.get_webview_window(crate::window::COMMAND_BAR).is_none() {
        return Err(CaptureError::WindowUnavailable);
    }

    tokio::time::sleep(std::time::Duration::from_millis(SETTLE_DELAY_MS)).await;

    let start = std::time::Instant::now();
    let sources = sources::enumerate(CAPTURE_MAX_WIDTH, CAPTURE_MAX_HEIGHT)
        .map_err(|e| classify_failure(&e))?;
    let primary = sources::primary_display_id();
    log::info!(
        "[CAPTURE] Enumerated {} source(s) in {}ms (primary={:?})",
        sources.len(),
        start.elapsed().as_millis(),
        primary
    );

    acquire(sources, primary.as_deref())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::DynamicImage;

    fn source(id: &str, name: &str, with_thumbnail: bool) -> DisplaySource {
        DisplaySource {
            id: id.to_string(),
            name: name.to_string(),
            thumbnail: with_thumbnail.then(|| DynamicImage::new_rgba8(8, 8)),
        }
    }

    #[test]
    fn empty_enumeration_is_no_sources_available() {
        let err = acquire(Vec::new(), Some("1")).unwrap_err();
        assert!(matches!(err, CaptureError::NoSourcesAvailable));

        // The requested resolution never changes the classification.
        let err = acquire(Vec::new(), None).unwrap_err();
        assert!(matches!(err, CaptureError::NoSourcesAvailable));
    }

    #[test]
    fn selected_source_without_thumbnail_is_no_valid_source() {
        let sources = vec![source("1", "Screen 1", false)];
        let err = acquire(sources, Some("1")).unwrap_err();
        assert!(matches!(err, CaptureError::NoValidSource));
    }

    #[test]
    fn successful_acquire_returns_a_data_url() {
        let sources = vec![source("2", "Display 2", true), source("1", "Screen 1", true)];
        let url = acquire(sources, Some("1")).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn acquire_falls_back_to_the_first_source() {
        // No id match, no screen/display name — first source wins.
        let sources = vec![source("7", "Capture Device", true), source("8", "Webcam", false)];
        let url = acquire(sources, Some("1")).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn not_authorized_is_classified_as_permission_denied() {
        let err = classify_failure("The operation is not authorized");
        assert!(matches!(err, CaptureError::PermissionDenied(_)));
        assert!(err.is_permission_related());
    }

    #[test]
    fn access_denied_and_permission_substrings_are_promoted() {
        assert!(matches!(
            classify_failure("CGError: access denied by TCC"),
            CaptureError::PermissionDenied(_)
        ));
        assert!(matches!(
            classify_failure("Permission prompt dismissed"),
            CaptureError::PermissionDenied(_)
        ));
    }

    #[test]
    fn unrelated_failures_stay_capture_failed() {
        let err = classify_failure("device wedged");
        match err {
            CaptureError::CaptureFailed(reason) => assert_eq!(reason, "device wedged"),
            other => panic!("expected CaptureFailed, got {:?}", other),
        }
        assert!(!classify_failure("device wedged").is_permission_related());
    }
}
