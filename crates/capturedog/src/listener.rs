use std::{
    path::{Path, PathBuf},
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use serde::Serialize;

/// One capture RenderDoc has written to disk, rebuilt from `GetCapture` on every lookup.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct CaptureRecord {
    pub index: u32,
    /// As RenderDoc reports it; relative when the path template is relative.
    pub path: PathBuf,
    /// Seconds since the Unix epoch.
    pub timestamp_secs: u64,
}

impl CaptureRecord {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn timestamp(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_secs(self.timestamp_secs)
    }
}

/// Receives capture notifications from [`CaptureSession::update_listeners`].
///
/// Notifications are inferred from RenderDoc's capture count rising, so they are best-effort:
/// a capture that RenderDoc never reports produces no call at all, and one that is reported but
/// cannot be looked up produces [`on_capture_failed`](Self::on_capture_failed).
///
/// [`CaptureSession::update_listeners`]: crate::CaptureSession::update_listeners
pub trait CaptureListener: Send + Sync {
    fn on_capture(&self, capture: &CaptureRecord);

    /// `capture_count` is RenderDoc's capture count when the lookup failed.
    fn on_capture_failed(&self, capture_count: u32) {
        let _ = capture_count;
    }
}

impl<F> CaptureListener for F
where
    F: Fn(&CaptureRecord) + Send + Sync,
{
    fn on_capture(&self, capture: &CaptureRecord) {
        self(capture)
    }
}
