//! Display enumeration using the `xcap` crate.
//!
//! This is the infrastructure layer — it talks to the OS. Sources are
//! produced fresh on every enumeration and never cached beyond a single
//! capture operation.

use base64::Engine as _;
use image::DynamicImage;
use xcap::Monitor;

/// One capturable display offered by the OS.
pub struct DisplaySource {
    pub id: String,
    pub name: String,
    /// Bounded-resolution preview frame. `None` when the grab failed for
    /// this monitor but enumeration as a whole succeeded.
    pub thumbnail: Option<DynamicImage>,
}

/// Enumerates capturable displays, grabbing one frame per monitor and
/// downscaling it to fit within `max_width` x `max_height`.
///
/// xcap has no server-side thumbnail sizing, so the bound is applied by
/// downscaling after the grab. Callers always pass a bound — raw desktop
/// pixels can be very large.
///
/// Errors when the monitor list itself cannot be read, or when every
/// monitor refuses the frame grab (on macOS that is what a missing
/// Screen Recording grant looks like).
pub fn enumerate(max_width: u32, max_height: u32) -> Result<Vec<DisplaySource>, String> {
    let monitors =
        Monitor::all().map_err(|e| format!("Failed to enumerate monitors: {}", e))?;

    let mut sources = Vec::with_capacity(monitors.len());
    let mut grab_error: Option<String> = None;

    for monitor in monitors {
        let id = monitor.id().map(|id| id.to_string()).unwrap_or_default();
        let name = monitor.name().unwrap_or_default();

        let thumbnail = match monitor.capture_image() {
            Ok(frame) => {
                let full = DynamicImage::ImageRgba8(frame);
                if full.width() > max_width || full.height() > max_height {
                    Some(full.thumbnail(max_width, max_height))
                } else {
                    Some(full)
                }
            }
            Err(e) => {
                log::warn!("[CAPTURE] Frame grab failed for \"{}\": {}", name, e);
                grab_error = Some(e.to_string());
                None
            }
        };

        sources.push(DisplaySource {
            id,
            name,
            thumbnail,
        });
    }

    // Every grab failing is an enumeration-level failure, not a
    // per-source one. Surface the underlying message for classification.
    if !sources.is_empty() && sources.iter().all(|s| s.thumbnail.is_none()) {
        if let Some(e) = grab_error {
            return Err(format!("Screen capture failed: {}", e));
        }
    }

    Ok(sources)
}

/// Stable identifier of the primary display, when the platform reports
/// one. Display ids are not guaranteed to be consistent across drivers,
/// which is why selection has name and positional fallbacks.
pub fn primary_display_id() -> Option<String> {
    let monitors = Monitor::all().ok()?;
    monitors
        .into_iter()
        .find(|m| m.is_primary().unwrap_or(false))
        .and_then(|m| m.id().ok())
        .map(|id| id.to_string())
}

/// Picks the source to capture. Deterministic, in order:
/// exact match on the primary display id, then a source whose name
/// contains "screen" or "display" (case-insensitive), then the first
/// enumerated source.
pub fn select<'a>(
    sources: &'a [DisplaySource],
    primary_id: Option<&str>,
) -> Option<&'a DisplaySource> {
    if let Some(id) = primary_id {
        if let Some(exact) = sources.iter().find(|s| s.id == id) {
            return Some(exact);
        }
    }

    sources
        .iter()
        .find(|s| {
            let name = s.name.to_lowercase();
            name.contains("screen") || name.contains("display")
        })
        .or_else(|| sources.first())
}

/// Re-encodes a thumbnail as a base64 PNG data URL — self-contained and
/// directly displayable, so the webview needs no extra decode step.
pub fn to_data_url(image: &DynamicImage) -> Result<String, String> {
    let mut png_bytes = Vec::new();
    image
        .write_to(
            &mut std::io::Cursor::new(&mut png_bytes),
            image::ImageFormat::Png,
        )
        .map_err(|e| format!("PNG encode failed: {}", e))?;

    let encoded = base64::engine::general_purpose::STANDARD.encode(&png_bytes);
    Ok(format!("data:image/png;base64,{}", encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(id: &str, name: &str) -> DisplaySource {
        DisplaySource {
            id: id.to_string(),
            name: name.to_string(),
            thumbnail: None,
        }
    }

    #[test]
    fn exact_id_match_wins_over_name_substring() {
        let sources = vec![source("2", "Display 2"), source("1", "Screen 1")];
        let picked = select(&sources, Some("1")).unwrap();
        assert_eq!(picked.id, "1");
    }

    #[test]
    fn name_substring_beats_unrelated_first_source() {
        let sources = vec![source("7", "Capture Device"), source("8", "External Display")];
        let picked = select(&sources, Some("1")).unwrap();
        assert_eq!(picked.id, "8");
    }

    #[test]
    fn name_match_is_case_insensitive() {
        let sources = vec![source("7", "Webcam"), source("9", "SCREEN B")];
        let picked = select(&sources, None).unwrap();
        assert_eq!(picked.id, "9");
    }

    #[test]
    fn falls_back_to_first_source() {
        let sources = vec![source("7", "Capture Device"), source("8", "Webcam")];
        let picked = select(&sources, Some("1")).unwrap();
        assert_eq!(picked.id, "7");
    }

    #[test]
    fn empty_enumeration_selects_nothing() {
        assert!(select(&[], Some("1")).is_none());
        assert!(select(&[], None).is_none());
    }

    #[test]
    fn data_url_is_self_describing_png() {
        let image = DynamicImage::new_rgba8(4, 4);
        let url = to_data_url(&image).unwrap();
        assert!(url.starts_with("data:image/png;base64,"));
        assert!(url.len() > "data:image/png;base64,".len());
    }
}
