//! Smoke tests for the live capture path.
//!
//! These hit the real OS display APIs, so they skip cleanly on headless
//! CI or when no screen-recording grant is present — same skip style as
//! the rest of the suite.

use airops_lib::capture;

#[test]
fn enumeration_respects_the_thumbnail_bound() {
    let sources = match capture::enumerate(100, 100) {
        Ok(sources) => sources,
        Err(e) => {
            eprintln!("SKIP: no display available ({})", e);
            return;
        }
    };
    if sources.is_empty() {
        eprintln!("SKIP: zero monitors enumerated");
        return;
    }

    for source in &sources {
        if let Some(thumbnail) = &source.thumbnail {
            assert!(
                thumbnail.width() <= 100 && thumbnail.height() <= 100,
                "thumbnail {}x{} exceeds the 100x100 probe bound",
                thumbnail.width(),
                thumbnail.height()
            );
        }
    }

    // With a working display, the probe must agree with enumeration.
    assert!(capture::probe_permission());
}

#[test]
fn live_acquire_yields_a_displayable_data_url() {
    let sources = match capture::enumerate(320, 180) {
        Ok(sources) if !sources.is_empty() => sources,
        Ok(_) => {
            eprintln!("SKIP: zero monitors enumerated");
            return;
        }
        Err(e) => {
            eprintln!("SKIP: no display available ({})", e);
            return;
        }
    };

    let primary = capture::primary_display_id();
    match capture::acquire(sources, primary.as_deref()) {
        Ok(url) => assert!(url.starts_with("data:image/png;base64,")),
        // A monitor with no grabbable frame is the only acceptable
        // failure here; anything else is a real bug.
        Err(capture::CaptureError::NoValidSource) => {
            eprintln!("SKIP: monitor enumerable but frame grab unavailable");
        }
        Err(other) => panic!("unexpected capture failure: {}", other),
    }
}
