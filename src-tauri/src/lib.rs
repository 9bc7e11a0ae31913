//! AirOps — Tauri application entry point.
//!
//! App shell only: plugin registration, state management, window and
//! shortcut setup, and the command registry. The capture core lives in
//! capture/, client-side state in prompt.rs.

pub mod capture;
mod commands;
pub mod prompt;
pub mod window;

use capture::PermissionSession;
use prompt::PromptState;
use tauri::{Emitter, Manager};

/// Hotkey for a manual screenshot capture.
const CAPTURE_SHORTCUT: &str = "CmdOrCtrl+Shift+S";

/// Entry point — called by the Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    env_logger::init();

    let (window_ready_signal, window_ready) = window::window_ready_pair();

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .manage(PermissionSession::new())
        .manage(PromptState::new())
        .manage(window_ready)
        .invoke_handler(tauri::generate_handler![
            commands::check_permissions,
            commands::request_permissions,
            commands::capture_screen,
            commands::clear_screenshot,
            commands::submit_prompt,
            commands::overlay_minimized,
            commands::overlay_expanded,
        ])
        .setup(move |app| {
            log::info!("[STARTUP] AirOps starting up");

            // Manual capture hotkey — forwarded to the webview, which
            // invokes capture_screen with silent=false so every failure
            // is surfaced.
            app.handle().plugin(
                tauri_plugin_global_shortcut::Builder::new()
                    .with_shortcuts([CAPTURE_SHORTCUT])?
                    .with_handler(|app, _shortcut, event| {
                        if event.state() == tauri_plugin_global_shortcut::ShortcutState::Pressed {
                            log::info!("[CAPTURE] Manual capture hotkey pressed");
                            let _ = app.emit_to(window::COMMAND_BAR, "capture-hotkey", ());
                        }
                    })
                    .build(),
            )?;

            window::create_command_bar(app.handle())?;
            window_ready_signal.notify();

            // Permission repair runs off the main thread; it awaits the
            // window-ready signal before showing any dialog.
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let session = handle.state::<PermissionSession>();
                let granted = capture::ensure_permission(&handle, &session).await;
                log::info!("[PERMISSIONS] Startup check: granted={}", granted);
            });

            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running AirOps");
}
