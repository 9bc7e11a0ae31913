//! Permission probing and the permission-repair dialog flow.
//!
//! The capture API exposes no structured permission-denied signal, so
//! "permission granted" is defined operationally: capture sources are
//! enumerable and non-empty. The probe is recomputed on demand — the only
//! cached fact is "already prompted this session".

use std::sync::Mutex;
use tauri::{AppHandle, Manager};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};

/// Probe bound — a permission probe needs a frame grab to succeed, not a
/// usable image, so keep it tiny.
const PROBE_MAX_WIDTH: u32 = 100;
const PROBE_MAX_HEIGHT: u32 = 100;

/// Session-scoped prompt state, managed by Tauri. The user is prompted at
/// most once per run; the outcome is cached until restart.
pub struct PermissionSession {
    outcome: Mutex<Option<bool>>,
}

impl PermissionSession {
    pub fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
        }
    }

    /// The cached outcome of a previous prompt flow, if any.
    fn recall(&self) -> Option<bool> {
        *self.outcome.lock().unwrap()
    }

    fn record(&self, granted: bool) {
        *self.outcome.lock().unwrap() = Some(granted);
    }
}

impl Default for PermissionSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Pure probe: true iff capture sources are enumerable and non-empty.
/// Never raises; all failures collapse to false.
pub fn probe_permission() -> bool {
    match super::sources::enumerate(PROBE_MAX_WIDTH, PROBE_MAX_HEIGHT) {
        Ok(sources) => !sources.is_empty(),
        Err(e) => {
            log::debug!("[PERMISSIONS] Probe failed: {}", e);
            false
        }
    }
}

/// Idempotent per session: probes, and when not granted walks the user
/// through the OS-specific repair steps. Returns the post-dialog probe
/// result — on macOS this stays false until the app is restarted after
/// the grant, which is expected rather than an error.
pub async fn ensure_permission(app: &AppHandle, session: &PermissionSession) -> bool {
    ensure_with(session, || run_repair_flow(app)).await
}

/// Session gate around the repair flow: the flow runs at most once per
/// session, and later calls get the recorded outcome. Generic over the
/// flow so the gate is testable without an app handle.
async fn ensure_with<F, Fut>(session: &PermissionSession, flow: F) -> bool
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    if let Some(outcome) = session.recall() {
        log::debug!(
            "[PERMISSIONS] Already prompted this session (granted={})",
            outcome
        );
        return outcome;
    }

    let granted = flow().await;
    session.record(granted);
    granted
}

async fn run_repair_flow(app: &AppHandle) -> bool {
    if probe_permission() {
        log::info!("[PERMISSIONS] Screen recording permission already granted");
        return true;
    }

    // The dialog needs a visible parent surface, and window creation is
    // asynchronous relative to this flow.
    app.state::<crate::window::WindowReady>().wait().await;
    show_repair_dialog(app).await;
    probe_permission()
}

#[cfg(target_os = "macos")]
async fn show_repair_dialog(app: &AppHandle) {
    use tauri_plugin_shell::ShellExt;

    const DETAIL: &str = "AirOps needs screen recording permission to capture your screen.\n\n\
        To enable:\n\
        1. Click \"Open System Settings\" below\n\
        2. Find \"AirOps\"\n\
        3. Toggle ON the Screen Recording permission\n\
        4. Restart the app\n\n\
        The app will work, but screen capture features require this permission.";

    // macOS 13+ deep link straight to the Screen Recording pane.
    const SETTINGS_URL: &str =
        "x-apple.systempreferences:com.apple.preference.security?Privacy_ScreenCapture";

    let (tx, rx) = tokio::sync::oneshot::channel();
    app.dialog()
        .message(DETAIL)
        .title("Screen Recording Permission")
        .kind(MessageDialogKind::Warning)
        .buttons(MessageDialogButtons::OkCancelCustom(
            "Open System Settings".to_string(),
            "Later".to_string(),
        ))
        .show(move |open_settings| {
            let _ = tx.send(open_settings);
        });

    if rx.await.unwrap_or(false) {
        // One-way navigation: the grant only takes effect after restart,
        // so there is nothing to re-poll here.
        log::info!("[PERMISSIONS] Opening System Settings > Screen Recording");
        if let Err(e) = app.shell().open(SETTINGS_URL, None) {
            log::error!("[PERMISSIONS] Failed to open System Settings: {}", e);
        }
    }
}

/// No settings deep link exists off macOS — informational dialog only.
#[cfg(not(target_os = "macos"))]
async fn show_repair_dialog(app: &AppHandle) {
    #[cfg(target_os = "windows")]
    const DETAIL: &str = "AirOps needs screen recording permission to capture your screen.\n\n\
        Please grant screen recording permissions in Windows Settings > Privacy > Screen Recording.";
    #[cfg(not(target_os = "windows"))]
    const DETAIL: &str = "AirOps needs screen recording permission to capture your screen.\n\n\
        Please ensure you have the necessary permissions. If using Wayland, consider using X11.";

    let (tx, rx) = tokio::sync::oneshot::channel();
    app.dialog()
        .message(DETAIL)
        .title("Screen Recording Permission")
        .kind(MessageDialogKind::Info)
        .buttons(MessageDialogButtons::Ok)
        .show(move |_acknowledged| {
            let _ = tx.send(());
        });
    let _ = rx.await;
}

/// Remediation text attached to `PermissionDenied` errors.
pub(crate) fn remediation_message() -> String {
    let mut message = String::from("Screen recording permission required.");
    if cfg!(target_os = "macos") {
        message.push_str(
            " Please grant access in System Settings > Privacy & Security > Screen Recording.",
        );
    } else if cfg!(target_os = "windows") {
        message
            .push_str(" Please grant access in Windows Settings > Privacy > Screen Recording.");
    } else {
        message.push_str(
            " Please ensure you have the necessary permissions or use X11 instead of Wayland.",
        );
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_caches_the_first_outcome() {
        let session = PermissionSession::new();
        assert_eq!(session.recall(), None);

        session.record(false);
        assert_eq!(session.recall(), Some(false));

        // A second flow must not overwrite silently via recall.
        assert_eq!(session.recall(), Some(false));
    }

    #[tokio::test]
    async fn ensure_runs_the_repair_flow_at_most_once_per_session() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let session = PermissionSession::new();
        let runs = AtomicUsize::new(0);

        let first = ensure_with(&session, || async {
            runs.fetch_add(1, Ordering::SeqCst);
            false
        })
        .await;

        // The second flow would report granted, but it must never run:
        // the recorded outcome wins until restart.
        let second = ensure_with(&session, || async {
            runs.fetch_add(1, Ordering::SeqCst);
            true
        })
        .await;

        assert!(!first);
        assert!(!second);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn ensure_caches_a_granted_outcome_too() {
        let session = PermissionSession::new();
        assert!(ensure_with(&session, || async { true }).await);
        // Still granted: a flow that would deny never gets to run.
        assert!(ensure_with(&session, || async { false }).await);
    }

    #[test]
    fn remediation_text_names_the_privacy_surface() {
        let message = remediation_message();
        assert!(message.starts_with("Screen recording permission required."));
        assert!(message.to_lowercase().contains("permission"));
    }
}
