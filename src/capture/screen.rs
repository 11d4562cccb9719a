//! Full-screen capture through `xcap`
//!
//! Captures the primary monitor. On macOS the process needs the Screen
//! Recording permission, otherwise captures come back empty.

use super::traits::{CaptureProvider, Frame, PixelFormat, Resolution, ScreenCapturer};
use crate::recorder::error::{RecordingError, RecordingResult};
use xcap::Monitor;

fn primary_monitor() -> RecordingResult<Monitor> {
    let monitors = Monitor::all()
        .map_err(|e| RecordingError::PlatformError(format!("Failed to enumerate monitors: {}", e)))?;

    let index = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
    monitors
        .into_iter()
        .nth(index)
        .ok_or_else(|| RecordingError::DeviceNotFound("No monitors found".to_string()))
}

/// Capture provider for the primary monitor
#[derive(Debug, Default)]
pub struct XcapProvider;

impl CaptureProvider for XcapProvider {
    fn display_size(&self) -> RecordingResult<Resolution> {
        let monitor = primary_monitor()?;
        Ok(Resolution::new(monitor.width(), monitor.height()))
    }

    fn open_capturer(&self) -> RecordingResult<Box<dyn ScreenCapturer>> {
        let monitor = primary_monitor()?;
        tracing::info!(
            "Capturing monitor '{}' ({}x{})",
            monitor.name(),
            monitor.width(),
            monitor.height()
        );
        Ok(Box::new(XcapCapturer { monitor }))
    }
}

struct XcapCapturer {
    monitor: Monitor,
}

impl ScreenCapturer for XcapCapturer {
    fn capture_frame(&mut self) -> RecordingResult<Frame> {
        let image = self
            .monitor
            .capture_image()
            .map_err(|e| RecordingError::CaptureError(format!("Failed to capture screen: {}", e)))?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RecordingError::CaptureError(
                "Captured empty screenshot - possible permission issue or no display".to_string(),
            ));
        }

        Frame::new(width, height, PixelFormat::Rgba, image.into_raw())
    }
}
