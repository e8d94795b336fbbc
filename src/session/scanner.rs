//! QR scanner contract and scoped camera ownership.
//!
//! The camera widget itself lives outside this crate. It is started with a
//! channel on which it reports decode results, and must be stopped again on
//! every path out of the scanning phase. [`CameraLease`] ties the stop to
//! `Drop` so that decode, cancel and error exits all release the camera.

use tokio::sync::mpsc;

/// Which camera to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CameraFacing {
    /// Rear camera, pointed at the visitor's phone
    #[default]
    Environment,
    /// Front camera
    User,
}

/// Size of the decode region in the preview, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRegion {
    pub width: u32,
    pub height: u32,
}

/// Options passed to the camera widget.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Decode attempts per second
    pub fps: u32,
    /// Target decode region
    pub qrbox: ScanRegion,
    /// Preview aspect ratio (width / height)
    pub aspect_ratio: f32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fps: 10,
            qrbox: ScanRegion {
                width: 250,
                height: 250,
            },
            aspect_ratio: 1.0,
        }
    }
}

/// Callback events emitted by a running scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanEvent {
    /// A QR code was read; the text is its raw content.
    Decoded(String),
    /// A frame could not be decoded. Expected many times per second.
    Error(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ScannerError {
    #[error("Camera unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to stop camera: {0}")]
    Stop(String),
}

/// Camera widget driving the scanning phase.
pub trait Scanner: Send {
    /// Open the camera and begin emitting events on `events`.
    fn start(
        &mut self,
        facing: CameraFacing,
        config: &ScanConfig,
        events: mpsc::UnboundedSender<ScanEvent>,
    ) -> Result<(), ScannerError>;

    /// Release the camera.
    fn stop(&mut self) -> Result<(), ScannerError>;
}

/// A started scanner, stopped when the lease is dropped.
pub struct CameraLease<'a, S: Scanner + ?Sized> {
    scanner: &'a mut S,
    events: mpsc::UnboundedReceiver<ScanEvent>,
}

impl<'a, S: Scanner + ?Sized> CameraLease<'a, S> {
    /// Start `scanner`. Nothing needs releasing if this fails.
    pub fn acquire(
        scanner: &'a mut S,
        facing: CameraFacing,
        config: &ScanConfig,
    ) -> Result<Self, ScannerError> {
        let (tx, rx) = mpsc::unbounded_channel();
        scanner.start(facing, config, tx)?;
        Ok(Self {
            scanner,
            events: rx,
        })
    }

    /// Wait for the next decoded text, skipping per-frame decode errors.
    ///
    /// Returns `None` if the scanner dropped its event sender. Cancel safe.
    pub async fn next_decoded(&mut self) -> Option<String> {
        while let Some(event) = self.events.recv().await {
            match event {
                ScanEvent::Decoded(text) => return Some(text),
                ScanEvent::Error(message) => tracing::trace!("QR decode miss: {}", message),
            }
        }
        None
    }
}

impl<S: Scanner + ?Sized> Drop for CameraLease<'_, S> {
    fn drop(&mut self) {
        self.events.close();
        if let Err(e) = self.scanner.stop() {
            tracing::error!("Error stopping QR scanner: {}", e);
        }
    }
}
