//! Tauri command handlers — the request/response boundary between the
//! webview and the capture authority.
//!
//! These are thin wrappers: classification lives in capture/, client
//! state in prompt.rs. Every command resolves; raw platform failures
//! never cross this boundary unclassified.

use crate::capture::{self, PermissionSession};
use crate::prompt::PromptState;
use crate::window;
use tauri::{Emitter, Manager};

/// Delay before the auto-capture fires, letting the expand animation
/// settle.
const EXPAND_SETTLE_MS: u64 = 300;

const RESPONSE_DELAY_MS: u64 = 600;

/// Tauri command: pure permission probe. Always resolves; all failures
/// collapse to false.
#[tauri::command]
pub async fn check_permissions() -> Result<bool, String> {
    Ok(capture::probe_permission())
}

/// Tauri command: run the permission-repair flow (at most once per
/// session) and report the post-dialog probe result.
#[tauri::command]
pub async fn request_permissions(
    app: tauri::AppHandle,
    session: tauri::State<'_, PermissionSession>,
) -> Result<bool, String> {
    Ok(capture::ensure_permission(&app, &session).await)
}

/// Tauri command: capture the primary display and stage the result as
/// the pending screenshot.
///
/// `Ok(Some(url))` on success. `Ok(None)` when the trigger was dropped
/// (a capture is already in flight) or the failure was suppressed
/// (silent mode, non-permission failure). `Err` carries the classified
/// message for the webview to alert.
#[tauri::command]
pub async fn capture_screen(
    app: tauri::AppHandle,
    prompt: tauri::State<'_, PromptState>,
    silent: bool,
) -> Result<Option<String>, String> {
    if !prompt.begin_capture() {
        log::info!("[CAPTURE] Trigger dropped — capture already in flight");
        return Ok(None);
    }

    match capture::capture_screen(&app).await {
        Ok(data_url) => {
            log::info!("[CAPTURE] Screenshot staged ({} chars)", data_url.len());
            prompt.finish_capture(Some(data_url.clone()));
            Ok(Some(data_url))
        }
        Err(err) => {
            prompt.finish_capture(None);
            if silent && !err.is_permission_related() {
                log::warn!("[CAPTURE] Silent capture failed (suppressed): {}", err);
                Ok(None)
            } else {
                log::error!("[CAPTURE] Capture failed: {}", err);
                Err(err.to_string())
            }
        }
    }
}

/// Tauri command: discard the pending screenshot. Never contacts the
/// capture authority.
#[tauri::command]
pub fn clear_screenshot(prompt: tauri::State<'_, PromptState>) -> Result<(), String> {
    prompt.clear_pending();
    log::info!("[PROMPT] Pending screenshot cleared");
    Ok(())
}

/// Tauri command: dispatch the prompt. Requires text or a pending
/// screenshot; clears both on dispatch.
///
/// The response is a fixed-delay stub — there is no real backend yet.
#[tauri::command]
pub async fn submit_prompt(
    prompt: tauri::State<'_, PromptState>,
    text: String,
) -> Result<String, String> {
    let submission = prompt.take_submission(&text).map_err(|e| e.to_string())?;
    log::info!(
        "[PROMPT] Dispatching submission (text={}, screenshot={})",
        submission.text.is_some(),
        submission.screenshot.is_some()
    );

    tokio::time::sleep(std::time::Duration::from_millis(RESPONSE_DELAY_MS)).await;

    let mut response = String::new();
    if let Some(text) = &submission.text {
        response.push_str(text);
        response.push_str("\n\n");
    }
    if submission.screenshot.is_some() {
        response.push_str("(1 screenshot attached)\n\n");
    }
    response.push_str("This is a sample response. Connect to your AI backend to get real responses.");
    Ok(response)
}

/// Tauri command: the overlay was minimized. Discards pending state and
/// re-arms the auto-capture edge trigger.
#[tauri::command]
pub fn overlay_minimized(prompt: tauri::State<'_, PromptState>) -> Result<(), String> {
    prompt.on_minimized();
    Ok(())
}

/// Tauri command: the overlay expanded. Fires the once-per-expand silent
/// auto-capture after a short settle delay.
#[tauri::command]
pub async fn overlay_expanded(
    app: tauri::AppHandle,
    prompt: tauri::State<'_, PromptState>,
) -> Result<(), String> {
    if !prompt.should_auto_capture() {
        return Ok(());
    }

    tauri::async_runtime::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(EXPAND_SETTLE_MS)).await;
        auto_capture(&app).await;
    });
    Ok(())
}

/// Silent auto-capture driven by the expand transition. Failures are
/// swallowed unless permission-related — those are actionable and still
/// interrupt the user.
async fn auto_capture(app: &tauri::AppHandle) {
    let prompt = app.state::<PromptState>();
    if !prompt.begin_capture() {
        log::info!("[CAPTURE] Auto-capture dropped — capture already in flight");
        return;
    }

    match capture::capture_screen(app).await {
        Ok(data_url) => {
            prompt.finish_capture(Some(data_url.clone()));
            if let Some(window) = app.get_webview_window(window::COMMAND_BAR) {
                let _ = window.emit(
                    "screenshot-ready",
                    serde_json::json!({ "dataUrl": data_url }),
                );
            }
        }
        Err(err) => {
            prompt.finish_capture(None);
            if err.is_permission_related() {
                log::error!("[CAPTURE] Auto-capture permission failure: {}", err);
                if let Some(window) = app.get_webview_window(window::COMMAND_BAR) {
                    let _ = window.emit(
                        "capture-error",
                        serde_json::json!({ "message": err.to_string() }),
                    );
                }
            } else {
                log::warn!("[CAPTURE] Auto-capture failed (suppressed): {}", err);
            }
        }
    }
}
