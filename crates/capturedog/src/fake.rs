//! In-process stand-in for the RenderDoc module, used by unit tests.
//!
//! State is thread-local, so tests running in parallel never observe each other. Call [`reset`]
//! at the top of every test. A test that drives the session from several threads moves its state
//! behind a lock with [`share`] and calls [`attach`] on every thread it spawns.

use std::{
    cell::RefCell,
    collections::HashMap,
    ffi::{CStr, CString, c_char, c_int, c_void},
    ptr,
    sync::Arc,
};

use parking_lot::Mutex;

use capturedog_sys as sys;

#[derive(Debug)]
pub struct FakeState {
    pub get_api_result: c_int,
    pub return_null_table: bool,
    pub requested_wire: Option<u32>,
    pub reported_version: (c_int, c_int, c_int),
    pub overlay: u32,
    pub mask_calls: Vec<(u32, u32)>,
    pub captures: Vec<(Vec<u8>, u64)>,
    pub num_captures_override: Option<u32>,
    pub trigger_calls: u32,
    pub multi_frame_requests: Vec<u32>,
    pub options_u32: HashMap<u32, u32>,
    pub options_f32: HashMap<u32, f32>,
    pub rejected_option: Option<u32>,
    pub capture_keys: Option<Vec<u32>>,
    pub focus_toggle_keys: Option<Vec<u32>>,
    pub null_key_arrays: u32,
    pub template: Option<CString>,
    pub comments: Option<(Option<String>, String)>,
    pub title: Option<String>,
    pub active_window: Option<(usize, usize)>,
    pub started: Vec<(usize, usize)>,
    pub ended: Vec<(usize, usize)>,
    pub discarded: Vec<(usize, usize)>,
    pub end_result: u32,
    pub capturing: bool,
    pub target_control_connected: bool,
    pub launched: Option<(u32, Option<String>)>,
    pub launch_pid: u32,
    pub show_replay_ui_result: u32,
    pub hooks_removed: bool,
    pub crash_handler_unloaded: bool,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            get_api_result: 1,
            return_null_table: false,
            requested_wire: None,
            reported_version: (1, 6, 0),
            overlay: sys::RENDERDOC_OverlayBits::eRENDERDOC_Overlay_Default.0,
            mask_calls: Vec::new(),
            captures: Vec::new(),
            num_captures_override: None,
            trigger_calls: 0,
            multi_frame_requests: Vec::new(),
            options_u32: HashMap::new(),
            options_f32: HashMap::new(),
            rejected_option: None,
            capture_keys: None,
            focus_toggle_keys: None,
            null_key_arrays: 0,
            template: None,
            comments: None,
            title: None,
            active_window: None,
            started: Vec::new(),
            ended: Vec::new(),
            discarded: Vec::new(),
            end_result: 1,
            capturing: false,
            target_control_connected: false,
            launched: None,
            launch_pid: 4242,
            show_replay_ui_result: 1,
            hooks_removed: false,
            crash_handler_unloaded: false,
        }
    }
}

pub type SharedState = Arc<Mutex<FakeState>>;

thread_local! {
    static STATE: RefCell<FakeState> = RefCell::new(FakeState::default());
    static SHARED: RefCell<Option<SharedState>> = const { RefCell::new(None) };
}

pub fn reset() {
    SHARED.with(|s| *s.borrow_mut() = None);
    STATE.with(|s| *s.borrow_mut() = FakeState::default());
}

pub fn with_state<R>(f: impl FnOnce(&mut FakeState) -> R) -> R {
    if let Some(shared) = SHARED.with(|s| s.borrow().clone()) {
        return f(&mut shared.lock());
    }
    STATE.with(|s| f(&mut s.borrow_mut()))
}

/// Moves this thread's state behind a lock that other threads can [`attach`] to.
pub fn share() -> SharedState {
    let state = STATE.with(|s| std::mem::take(&mut *s.borrow_mut()));
    let shared = Arc::new(Mutex::new(state));
    attach(&shared);
    shared
}

pub fn attach(shared: &SharedState) {
    SHARED.with(|s| *s.borrow_mut() = Some(shared.clone()));
}

/// Simulates RenderDoc finishing a capture.
pub fn push_capture(path: &str, timestamp: u64) {
    push_capture_bytes(path.as_bytes(), timestamp);
}

pub fn push_capture_bytes(path: &[u8], timestamp: u64) {
    with_state(|s| s.captures.push((path.to_vec(), timestamp)));
}

pub fn api_table() -> sys::RENDERDOC_API_1_6_0 {
    API
}

static API: sys::RENDERDOC_API_1_6_0 = sys::RENDERDOC_API_1_6_0 {
    GetAPIVersion: Some(get_api_version),
    SetCaptureOptionU32: Some(set_capture_option_u32),
    SetCaptureOptionF32: Some(set_capture_option_f32),
    GetCaptureOptionU32: Some(get_capture_option_u32),
    GetCaptureOptionF32: Some(get_capture_option_f32),
    SetFocusToggleKeys: Some(set_focus_toggle_keys),
    SetCaptureKeys: Some(set_capture_keys),
    GetOverlayBits: Some(get_overlay_bits),
    MaskOverlayBits: Some(mask_overlay_bits),
    RemoveHooks: Some(remove_hooks),
    UnloadCrashHandler: Some(unload_crash_handler),
    SetCaptureFilePathTemplate: Some(set_capture_file_path_template),
    GetCaptureFilePathTemplate: Some(get_capture_file_path_template),
    GetNumCaptures: Some(get_num_captures),
    GetCapture: Some(get_capture),
    TriggerCapture: Some(trigger_capture),
    IsTargetControlConnected: Some(is_target_control_connected),
    LaunchReplayUI: Some(launch_replay_ui),
    SetActiveWindow: Some(set_active_window),
    StartFrameCapture: Some(start_frame_capture),
    IsFrameCapturing: Some(is_frame_capturing),
    EndFrameCapture: Some(end_frame_capture),
    TriggerMultiFrameCapture: Some(trigger_multi_frame_capture),
    SetCaptureFileComments: Some(set_capture_file_comments),
    DiscardFrameCapture: Some(discard_frame_capture),
    ShowReplayUI: Some(show_replay_ui),
    SetCaptureTitle: Some(set_capture_title),
};

pub unsafe extern "C" fn get_api(
    version: sys::RENDERDOC_Version,
    out: *mut *mut c_void,
) -> c_int {
    with_state(|s| {
        s.requested_wire = Some(version.0);
        if s.get_api_result != 1 {
            return s.get_api_result;
        }
        let table = if s.return_null_table {
            ptr::null_mut()
        } else {
            &API as *const sys::RENDERDOC_API_1_6_0 as *mut c_void
        };
        unsafe { *out = table };
        1
    })
}

unsafe extern "C" fn get_api_version(major: *mut c_int, minor: *mut c_int, patch: *mut c_int) {
    let (ma, mi, pa) = with_state(|s| s.reported_version);
    unsafe {
        *major = ma;
        *minor = mi;
        *patch = pa;
    }
}

unsafe extern "C" fn set_capture_option_u32(
    opt: sys::RENDERDOC_CaptureOption,
    val: u32,
) -> c_int {
    with_state(|s| {
        if s.rejected_option == Some(opt.0) {
            return 0;
        }
        s.options_u32.insert(opt.0, val);
        1
    })
}

unsafe extern "C" fn set_capture_option_f32(
    opt: sys::RENDERDOC_CaptureOption,
    val: f32,
) -> c_int {
    with_state(|s| {
        if s.rejected_option == Some(opt.0) {
            return 0;
        }
        s.options_f32.insert(opt.0, val);
        1
    })
}

unsafe extern "C" fn get_capture_option_u32(opt: sys::RENDERDOC_CaptureOption) -> u32 {
    with_state(|s| s.options_u32.get(&opt.0).copied().unwrap_or(0))
}

unsafe extern "C" fn get_capture_option_f32(opt: sys::RENDERDOC_CaptureOption) -> f32 {
    with_state(|s| s.options_f32.get(&opt.0).copied().unwrap_or(0.0))
}

unsafe fn read_keys(keys: *mut sys::RENDERDOC_InputButton, num: c_int) -> Vec<u32> {
    if keys.is_null() && num == 0 {
        with_state(|s| s.null_key_arrays += 1);
    }
    if keys.is_null() || num <= 0 {
        return Vec::new();
    }
    unsafe { std::slice::from_raw_parts(keys, num as usize) }
        .iter()
        .map(|k| k.0)
        .collect()
}

unsafe extern "C" fn set_focus_toggle_keys(keys: *mut sys::RENDERDOC_InputButton, num: c_int) {
    let keys = unsafe { read_keys(keys, num) };
    with_state(|s| s.focus_toggle_keys = Some(keys));
}

unsafe extern "C" fn set_capture_keys(keys: *mut sys::RENDERDOC_InputButton, num: c_int) {
    let keys = unsafe { read_keys(keys, num) };
    with_state(|s| s.capture_keys = Some(keys));
}

unsafe extern "C" fn get_overlay_bits() -> u32 {
    with_state(|s| s.overlay)
}

unsafe extern "C" fn mask_overlay_bits(and: u32, or: u32) {
    with_state(|s| {
        s.mask_calls.push((and, or));
        s.overlay = (s.overlay & and) | or;
    });
}

unsafe extern "C" fn remove_hooks() {
    with_state(|s| s.hooks_removed = true);
}

unsafe extern "C" fn unload_crash_handler() {
    with_state(|s| s.crash_handler_unloaded = true);
}

unsafe extern "C" fn set_capture_file_path_template(template: *const c_char) {
    let template = unsafe { CStr::from_ptr(template) }.to_owned();
    with_state(|s| s.template = Some(template));
}

unsafe extern "C" fn get_capture_file_path_template() -> *const c_char {
    // The CString lives in thread-local state until the next set/reset.
    with_state(|s| s.template.as_ref().map_or(ptr::null(), |t| t.as_ptr()))
}

unsafe extern "C" fn get_num_captures() -> u32 {
    with_state(|s| s.num_captures_override.unwrap_or(s.captures.len() as u32))
}

unsafe extern "C" fn get_capture(
    idx: u32,
    filename: *mut c_char,
    pathlength: *mut u32,
    timestamp: *mut u64,
) -> u32 {
    let Some((bytes, ts)) = with_state(|s| s.captures.get(idx as usize).cloned()) else {
        return 0;
    };
    unsafe {
        if !filename.is_null() {
            ptr::copy_nonoverlapping(bytes.as_ptr(), filename as *mut u8, bytes.len());
            *filename.add(bytes.len()) = 0;
        }
        if !pathlength.is_null() {
            *pathlength = bytes.len() as u32 + 1;
        }
        if !timestamp.is_null() {
            *timestamp = ts;
        }
    }
    1
}

unsafe extern "C" fn trigger_capture() {
    with_state(|s| s.trigger_calls += 1);
}

unsafe extern "C" fn is_target_control_connected() -> u32 {
    with_state(|s| u32::from(s.target_control_connected))
}

unsafe extern "C" fn launch_replay_ui(connect: u32, cmdline: *const c_char) -> u32 {
    let cmdline = (!cmdline.is_null())
        .then(|| unsafe { CStr::from_ptr(cmdline) }.to_string_lossy().into_owned());
    with_state(|s| {
        s.launched = Some((connect, cmdline));
        s.launch_pid
    })
}

unsafe extern "C" fn set_active_window(
    device: sys::RENDERDOC_DevicePointer,
    window: sys::RENDERDOC_WindowHandle,
) {
    with_state(|s| s.active_window = Some((device as usize, window as usize)));
}

unsafe extern "C" fn start_frame_capture(
    device: sys::RENDERDOC_DevicePointer,
    window: sys::RENDERDOC_WindowHandle,
) {
    with_state(|s| {
        s.capturing = true;
        s.started.push((device as usize, window as usize));
    });
}

unsafe extern "C" fn is_frame_capturing() -> u32 {
    with_state(|s| u32::from(s.capturing))
}

unsafe extern "C" fn end_frame_capture(
    device: sys::RENDERDOC_DevicePointer,
    window: sys::RENDERDOC_WindowHandle,
) -> u32 {
    with_state(|s| {
        s.capturing = false;
        s.ended.push((device as usize, window as usize));
        s.end_result
    })
}

unsafe extern "C" fn trigger_multi_frame_capture(frames: u32) {
    with_state(|s| s.multi_frame_requests.push(frames));
}

unsafe extern "C" fn set_capture_file_comments(path: *const c_char, comments: *const c_char) {
    let path = (!path.is_null())
        .then(|| unsafe { CStr::from_ptr(path) }.to_string_lossy().into_owned());
    let comments = unsafe { CStr::from_ptr(comments) }
        .to_string_lossy()
        .into_owned();
    with_state(|s| s.comments = Some((path, comments)));
}

unsafe extern "C" fn discard_frame_capture(
    device: sys::RENDERDOC_DevicePointer,
    window: sys::RENDERDOC_WindowHandle,
) -> u32 {
    with_state(|s| {
        s.capturing = false;
        s.discarded.push((device as usize, window as usize));
        s.end_result
    })
}

unsafe extern "C" fn show_replay_ui() -> u32 {
    with_state(|s| s.show_replay_ui_result)
}

unsafe extern "C" fn set_capture_title(title: *const c_char) {
    let title = unsafe { CStr::from_ptr(title) }
        .to_string_lossy()
        .into_owned();
    with_state(|s| s.title = Some(title));
}
