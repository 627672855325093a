use std::{
    collections::VecDeque,
    ffi::{CStr, CString},
    fmt,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use capturedog_sys as sys;

use crate::{
    ApiVersion, CaptureError, CaptureListener, CaptureOption, CaptureRecord, DeviceHandle,
    HandlePair, InputButton, NativeEntryTable, NativeModule, OverlayConfiguration, WindowHandle,
};

/// Work queued with [`CaptureSession::defer`], run by the next [`CaptureSession::update_listeners`]
/// that sees the capture count change.
pub type DeferredTask = Box<dyn FnOnce(&CaptureSession) + Send>;

struct NotificationQueue {
    observed_captures: u32,
    tasks: VecDeque<DeferredTask>,
}

/// The process-wide RenderDoc capture session.
///
/// Obtained once through [`SessionBuilder::build`](crate::SessionBuilder::build); there is no
/// way to hold a `CaptureSession` that is not bound. Every call goes straight to RenderDoc and
/// returns before the caller continues. Most of RenderDoc's in-app API expects to be called from
/// the thread driving rendering.
pub struct CaptureSession {
    entries: Arc<NativeEntryTable>,
    requested_version: ApiVersion,
    version: ApiVersion,
    overlay: OverlayConfiguration,
    handles: RwLock<HandlePair>,
    listeners: RwLock<Vec<Arc<dyn CaptureListener>>>,
    queue: Mutex<NotificationQueue>,
    drain: Mutex<()>,
    max_file_path_length: AtomicUsize,
    _module: NativeModule,
}

pub(crate) struct SessionParts {
    pub(crate) module: NativeModule,
    pub(crate) entries: Arc<NativeEntryTable>,
    pub(crate) requested_version: ApiVersion,
    pub(crate) version: ApiVersion,
    pub(crate) overlay: OverlayConfiguration,
    pub(crate) handles: HandlePair,
    pub(crate) listeners: Vec<Arc<dyn CaptureListener>>,
    pub(crate) max_file_path_length: usize,
}

impl CaptureSession {
    pub(crate) fn from_parts(parts: SessionParts) -> Self {
        let observed_captures = parts.entries.get_num_captures();
        Self {
            entries: parts.entries,
            requested_version: parts.requested_version,
            version: parts.version,
            overlay: parts.overlay,
            handles: RwLock::new(parts.handles),
            listeners: RwLock::new(parts.listeners),
            queue: Mutex::new(NotificationQueue {
                observed_captures,
                tasks: VecDeque::new(),
            }),
            drain: Mutex::new(()),
            max_file_path_length: AtomicUsize::new(parts.max_file_path_length),
            _module: parts.module,
        }
    }

    /// Tears the session apart without unloading RenderDoc.
    pub(crate) fn into_module(self) -> NativeModule {
        self._module
    }

    /// The version RenderDoc reported after binding.
    pub fn version(&self) -> ApiVersion {
        self.version
    }

    /// The version passed to `RENDERDOC_GetAPI`.
    pub fn requested_version(&self) -> ApiVersion {
        self.requested_version
    }

    pub fn overlay(&self) -> &OverlayConfiguration {
        &self.overlay
    }

    /// Captures the next presented frame. Returns immediately.
    pub fn trigger_capture(&self) {
        self.entries.trigger_capture();
    }

    /// Like [`trigger_capture`](Self::trigger_capture), and queues a notification of every
    /// registered listener for the capture this trigger is expected to produce.
    ///
    /// Listeners run from a later [`update_listeners`](Self::update_listeners) call.
    pub fn trigger_capture_and_notify(&self) {
        let expected_index = self.entries.get_num_captures();
        self.trigger_capture();
        self.defer(move |session| session.notify_listeners(expected_index));
    }

    /// Captures the next `frames` frames into one capture.
    pub fn trigger_multi_frame_capture(&self, frames: u32) -> Result<(), CaptureError> {
        if frames < 1 {
            return Err(CaptureError::InvalidArgument(
                "a multi-frame capture needs at least one frame",
            ));
        }
        self.entries.trigger_multi_frame_capture(frames);
        Ok(())
    }

    /// Queues `task` for the next capture-count change seen by
    /// [`update_listeners`](Self::update_listeners).
    pub fn defer<F>(&self, task: F)
    where
        F: FnOnce(&CaptureSession) + Send + 'static,
    {
        self.queue.lock().tasks.push_back(Box::new(task));
    }

    pub fn add_capture_listener<L>(&self, listener: L)
    where
        L: CaptureListener + 'static,
    {
        self.listeners.write().push(Arc::new(listener));
    }

    pub fn num_capture_listeners(&self) -> usize {
        self.listeners.read().len()
    }

    /// The polling heartbeat; call it from the frame loop.
    ///
    /// When RenderDoc's capture count differs from the one seen last, records the new count and
    /// runs every queued task in FIFO order. Returns whether it did so. Only one caller drains at a
    /// time; a concurrent (or reentrant) call returns `false` and leaves the transition to the
    /// drainer. Tasks queued while draining wait for the next change.
    pub fn update_listeners(&self) -> bool {
        let Some(_drain) = self.drain.try_lock() else {
            return false;
        };

        let tasks = {
            let mut queue = self.queue.lock();
            let count = self.entries.get_num_captures();
            if count == queue.observed_captures {
                return false;
            }
            debug!(
                previous = queue.observed_captures,
                count,
                queued = queue.tasks.len(),
                "capture count changed"
            );
            queue.observed_captures = count;
            std::mem::take(&mut queue.tasks)
        };

        for task in tasks {
            task(self);
        }
        true
    }

    fn notify_listeners(&self, index: u32) {
        let listeners = self.listeners.read().clone();
        match self.get_capture(index) {
            Some(capture) => {
                for listener in &listeners {
                    listener.on_capture(&capture);
                }
            }
            None => {
                let count = self.num_captures();
                warn!(index, count, "triggered capture not found");
                for listener in &listeners {
                    listener.on_capture_failed(count);
                }
            }
        }
    }

    pub fn num_captures(&self) -> u32 {
        self.entries.get_num_captures()
    }

    /// The capture at `index`, or `None` if RenderDoc has none there.
    ///
    /// On Unix the path keeps RenderDoc's bytes as they are. Elsewhere a path that is not UTF-8
    /// cannot be represented and the lookup returns `None`.
    pub fn get_capture(&self, index: u32) -> Option<CaptureRecord> {
        let max = self.max_file_path_length.load(Ordering::Relaxed);
        let raw = self.entries.get_capture(index, max)?;
        let Some(path) = path_from_native(raw.path) else {
            warn!(index, "capture path is not valid UTF-8");
            return None;
        };
        debug!(index, path = %path.display(), "looked up capture");
        Some(CaptureRecord {
            index,
            path,
            timestamp_secs: raw.timestamp,
        })
    }

    pub fn latest_capture(&self) -> Option<CaptureRecord> {
        self.num_captures()
            .checked_sub(1)
            .and_then(|index| self.get_capture(index))
    }

    /// Upper bound on capture path lengths accepted by [`get_capture`](Self::get_capture).
    pub fn set_max_file_path_length(&self, max: usize) {
        self.max_file_path_length.store(max, Ordering::Relaxed);
    }

    pub fn max_file_path_length(&self) -> usize {
        self.max_file_path_length.load(Ordering::Relaxed)
    }

    /// Replaces both handles in one step.
    pub fn supply_pointers(&self, device: Option<DeviceHandle>, window: Option<WindowHandle>) {
        *self.handles.write() = HandlePair { device, window };
    }

    pub fn supply_device(&self, device: Option<DeviceHandle>) {
        self.handles.write().device = device;
    }

    pub fn supply_window(&self, window: Option<WindowHandle>) {
        self.handles.write().window = window;
    }

    pub fn handles(&self) -> HandlePair {
        *self.handles.read()
    }

    /// Stores the handles and makes that window the one capture keys act on.
    pub fn set_active_window(&self, device: Option<DeviceHandle>, window: Option<WindowHandle>) {
        self.supply_pointers(device, window);
        self.entries.set_active_window(device, window);
    }

    pub fn start_frame_capture(&self) {
        let HandlePair { device, window } = self.handles();
        self.entries.start_frame_capture(device, window);
    }

    pub fn start_frame_capture_with(
        &self,
        device: Option<DeviceHandle>,
        window: Option<WindowHandle>,
    ) {
        self.supply_pointers(device, window);
        self.start_frame_capture();
    }

    pub fn is_frame_capturing(&self) -> bool {
        self.entries.is_frame_capturing()
    }

    /// Ends the capture and writes it to disk; `false` if RenderDoc reports failure.
    pub fn end_frame_capture(&self) -> bool {
        let HandlePair { device, window } = self.handles();
        let ok = self.entries.end_frame_capture(device, window);
        if !ok {
            warn!("EndFrameCapture reported failure");
        }
        ok
    }

    pub fn end_frame_capture_with(
        &self,
        device: Option<DeviceHandle>,
        window: Option<WindowHandle>,
    ) -> bool {
        self.supply_pointers(device, window);
        self.end_frame_capture()
    }

    /// Ends the capture without writing it; `false` if RenderDoc reports failure.
    pub fn discard_frame_capture(&self) -> bool {
        let HandlePair { device, window } = self.handles();
        let ok = self.entries.discard_frame_capture(device, window);
        if !ok {
            warn!("DiscardFrameCapture reported failure");
        }
        ok
    }

    pub fn discard_frame_capture_with(
        &self,
        device: Option<DeviceHandle>,
        window: Option<WindowHandle>,
    ) -> bool {
        self.supply_pointers(device, window);
        self.discard_frame_capture()
    }

    pub fn set_capture_option_u32(&self, opt: CaptureOption, val: u32) -> bool {
        self.entries.set_capture_option_u32(opt.into(), val)
    }

    pub fn set_capture_option_f32(&self, opt: CaptureOption, val: f32) -> bool {
        self.entries.set_capture_option_f32(opt.into(), val)
    }

    pub fn get_capture_option_u32(&self, opt: CaptureOption) -> u32 {
        self.entries.get_capture_option_u32(opt.into())
    }

    pub fn get_capture_option_f32(&self, opt: CaptureOption) -> f32 {
        self.entries.get_capture_option_f32(opt.into())
    }

    pub fn set_capture_option_bool(&self, opt: CaptureOption, val: bool) -> bool {
        self.set_capture_option_u32(opt, u32::from(val))
    }

    pub fn get_capture_option_bool(&self, opt: CaptureOption) -> bool {
        self.get_capture_option_u32(opt) == 1
    }

    /// Sets every option in `opts`; `true` only if all of them were accepted.
    pub fn set_capture_options_bool(&self, opts: &[CaptureOption], val: bool) -> bool {
        opts.iter()
            .fold(true, |all, opt| self.set_capture_option_bool(*opt, val) && all)
    }

    pub fn set_focus_toggle_keys(&self, keys: &[InputButton]) -> Result<(), CaptureError> {
        let mut owned: Vec<sys::RENDERDOC_InputButton> =
            keys.iter().copied().map(Into::into).collect();
        self.entries.set_focus_toggle_keys(&mut owned)
    }

    pub fn set_capture_keys(&self, keys: &[InputButton]) -> Result<(), CaptureError> {
        let mut owned: Vec<sys::RENDERDOC_InputButton> =
            keys.iter().copied().map(Into::into).collect();
        self.entries.set_capture_keys(&mut owned)
    }

    pub fn disable_focus_toggle_keys(&self) {
        self.entries.clear_focus_toggle_keys();
    }

    pub fn disable_capture_keys(&self) {
        self.entries.clear_capture_keys();
    }

    /// Sets the path prefix for new captures. RenderDoc appends `_frameN.rdc`; relative templates
    /// resolve against the working directory.
    pub fn set_capture_file_path_template(&self, template: &str) -> Result<(), CaptureError> {
        let s = CString::new(template).map_err(|_| CaptureError::InteriorNul)?;
        self.set_capture_file_path_template_cstr(&s);
        Ok(())
    }

    pub(crate) fn set_capture_file_path_template_cstr(&self, template: &CStr) {
        self.entries.set_capture_file_path_template(template);
    }

    pub fn get_capture_file_path_template(&self) -> Result<String, CaptureError> {
        let Some(bytes) = self.entries.get_capture_file_path_template() else {
            return Ok(String::new());
        };
        String::from_utf8(bytes).map_err(|_| CaptureError::InvalidUtf8)
    }

    pub fn set_capture_file_path_template_path<P: AsRef<Path>>(
        &self,
        template: P,
    ) -> Result<(), CaptureError> {
        let s = template.as_ref().to_str().ok_or(CaptureError::InvalidUtf8)?;
        self.set_capture_file_path_template(s)
    }

    pub fn get_capture_file_path_template_path(&self) -> Result<PathBuf, CaptureError> {
        let Some(bytes) = self.entries.get_capture_file_path_template() else {
            return Ok(PathBuf::new());
        };
        path_from_native(bytes).ok_or(CaptureError::InvalidUtf8)
    }

    /// Attaches comments to a capture file; `None` targets the most recent capture.
    pub fn set_capture_file_comments(
        &self,
        capture_file_path: Option<&str>,
        comments: &str,
    ) -> Result<(), CaptureError> {
        let comments_c = CString::new(comments).map_err(|_| CaptureError::InteriorNul)?;
        let path_c = capture_file_path
            .map(CString::new)
            .transpose()
            .map_err(|_| CaptureError::InteriorNul)?;
        self.entries.set_capture_file_comments(path_c.as_deref(), &comments_c);
        Ok(())
    }

    pub fn set_capture_title(&self, title: &str) -> Result<(), CaptureError> {
        let title_c = CString::new(title).map_err(|_| CaptureError::InteriorNul)?;
        self.entries.set_capture_title(&title_c);
        Ok(())
    }

    pub fn is_target_control_connected(&self) -> bool {
        self.entries.is_target_control_connected()
    }

    /// Launches the replay UI. Returns its PID, or `None` if RenderDoc could not launch it.
    pub fn launch_replay_ui(
        &self,
        connect_target_control: bool,
        cmdline: Option<&str>,
    ) -> Result<Option<u32>, CaptureError> {
        let cmdline_c = cmdline
            .map(CString::new)
            .transpose()
            .map_err(|_| CaptureError::InteriorNul)?;
        let pid = self
            .entries
            .launch_replay_ui(connect_target_control, cmdline_c.as_deref());
        if pid == 0 {
            warn!("LaunchReplayUI failed");
            return Ok(None);
        }
        debug!(pid, "launched replay UI");
        Ok(Some(pid))
    }

    pub fn show_replay_ui(&self) -> bool {
        self.entries.show_replay_ui()
    }

    /// Asks RenderDoc to remove its hooks. Platform-dependent; the session stays bound.
    pub fn remove_hooks(&self) {
        self.entries.remove_hooks();
    }

    pub fn unload_crash_handler(&self) {
        self.entries.unload_crash_handler();
    }
}

fn path_from_native(bytes: Vec<u8>) -> Option<PathBuf> {
    #[cfg(unix)]
    {
        use std::{ffi::OsString, os::unix::ffi::OsStringExt};

        Some(PathBuf::from(OsString::from_vec(bytes)))
    }

    #[cfg(not(unix))]
    {
        String::from_utf8(bytes).ok().map(PathBuf::from)
    }
}

impl fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CaptureSession")
            .field("requested_version", &self.requested_version)
            .field("version", &self.version)
            .field("handles", &self.handles())
            .field("listeners", &self.num_capture_listeners())
            .finish_non_exhaustive()
    }
}
