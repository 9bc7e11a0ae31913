//! Command bar window lifecycle.
//!
//! One frameless, transparent, always-on-top window near the top of the
//! primary display. Readiness is an explicit signal, not a timer: the
//! permission flow awaits `WindowReady` instead of polling.

use tauri::{AppHandle, WebviewUrl, WebviewWindowBuilder};
use tokio::sync::watch;

pub const COMMAND_BAR: &str = "command-bar";

const WINDOW_WIDTH: f64 = 650.0;
const WINDOW_HEIGHT: f64 = 500.0;
const TOP_MARGIN: f64 = 20.0;

/// Awaitable "the command bar exists and is shown" fact.
pub struct WindowReady {
    rx: watch::Receiver<bool>,
}

/// Setup-side handle that flips `WindowReady` once the window is built.
pub struct WindowReadySignal {
    tx: watch::Sender<bool>,
}

pub fn window_ready_pair() -> (WindowReadySignal, WindowReady) {
    let (tx, rx) = watch::channel(false);
    (WindowReadySignal { tx }, WindowReady { rx })
}

impl WindowReadySignal {
    pub fn notify(&self) {
        let _ = self.tx.send(true);
    }
}

impl WindowReady {
    pub async fn wait(&self) {
        let mut rx = self.rx.clone();
        while !*rx.borrow() {
            // Sender dropped means the app is shutting down.
            if rx.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Bar origin within a work area: horizontally centered, fixed top
/// margin. The work-area origin matters — a vertical taskbar or dock
/// shifts it away from the monitor corner.
fn bar_origin(area_x: f64, area_y: f64, area_width: f64) -> (f64, f64) {
    (area_x + (area_width - WINDOW_WIDTH) / 2.0, area_y + TOP_MARGIN)
}

/// Creates the command bar: fixed size, centered horizontally within the
/// primary monitor's work area, floating above everything.
pub fn create_command_bar(app: &AppHandle) -> tauri::Result<tauri::WebviewWindow> {
    // Work area excludes taskbar/dock; Tauri's .center() would center
    // vertically over the whole monitor instead.
    let position = app.primary_monitor().ok().flatten().map(|monitor| {
        let scale = monitor.scale_factor();
        let area = monitor.work_area();
        let origin = area.position.to_logical::<f64>(scale);
        let size = area.size.to_logical::<f64>(scale);
        bar_origin(origin.x, origin.y, size.width)
    });

    let mut builder =
        WebviewWindowBuilder::new(app, COMMAND_BAR, WebviewUrl::App("index.html".into()))
            .title("AirOps")
            .inner_size(WINDOW_WIDTH, WINDOW_HEIGHT)
            .resizable(false)
            .maximizable(false)
            .minimizable(false)
            .decorations(false)
            .transparent(true)
            .shadow(false)
            .always_on_top(true)
            .skip_taskbar(true);

    builder = match position {
        Some((x, y)) => builder.position(x, y),
        None => builder.center(),
    };

    let window = builder.build()?;
    log::info!("[STARTUP] Command bar window created");
    Ok(window)
}
