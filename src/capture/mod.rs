//! Screen capture
//!
//! Frame types, capability traits, the `image`-based scaler and, with the
//! `native-capture` feature, the `xcap` screen grabber.

pub mod scaler;
pub mod traits;

#[cfg(feature = "native-capture")]
pub mod screen;

pub use scaler::ImageScaler;
pub use traits::{CaptureProvider, Frame, FrameScaler, PixelFormat, Resolution, ScreenCapturer};

#[cfg(feature = "native-capture")]
pub use screen::XcapProvider;
