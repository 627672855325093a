//! The validated native function table.
//!
//! `RENDERDOC_GetAPI` hands back a pointer to a struct of function pointers. [`NativeEntryTable`]
//! copies every entry out of that struct once, in ABI field order, refusing to bind if any entry is
//! null. Nothing outside this module sees the struct pointer or calls a raw entry.

use std::{
    ffi::{CStr, c_char, c_int, c_void},
    ptr,
};

use tracing::{debug, warn};

use capturedog_sys as sys;

use crate::{ApiVersion, CaptureError, DeviceHandle, WindowHandle};

macro_rules! require {
    ($api:expr, $field:ident) => {
        $api.$field
            .ok_or(CaptureError::MissingFunction(stringify!($field)))?
    };
}

#[derive(Clone, Copy, Debug)]
pub struct NativeEntryTable {
    get_api_version: sys::RENDERDOC_GetAPIVersion,
    set_capture_option_u32: sys::RENDERDOC_SetCaptureOptionU32,
    set_capture_option_f32: sys::RENDERDOC_SetCaptureOptionF32,
    get_capture_option_u32: sys::RENDERDOC_GetCaptureOptionU32,
    get_capture_option_f32: sys::RENDERDOC_GetCaptureOptionF32,
    set_focus_toggle_keys: sys::RENDERDOC_SetFocusToggleKeys,
    set_capture_keys: sys::RENDERDOC_SetCaptureKeys,
    get_overlay_bits: sys::RENDERDOC_GetOverlayBits,
    mask_overlay_bits: sys::RENDERDOC_MaskOverlayBits,
    remove_hooks: sys::RENDERDOC_RemoveHooks,
    unload_crash_handler: sys::RENDERDOC_UnloadCrashHandler,
    set_capture_file_path_template: sys::RENDERDOC_SetCaptureFilePathTemplate,
    get_capture_file_path_template: sys::RENDERDOC_GetCaptureFilePathTemplate,
    get_num_captures: sys::RENDERDOC_GetNumCaptures,
    get_capture: sys::RENDERDOC_GetCapture,
    trigger_capture: sys::RENDERDOC_TriggerCapture,
    is_target_control_connected: sys::RENDERDOC_IsTargetControlConnected,
    launch_replay_ui: sys::RENDERDOC_LaunchReplayUI,
    set_active_window: sys::RENDERDOC_SetActiveWindow,
    start_frame_capture: sys::RENDERDOC_StartFrameCapture,
    is_frame_capturing: sys::RENDERDOC_IsFrameCapturing,
    end_frame_capture: sys::RENDERDOC_EndFrameCapture,
    trigger_multi_frame_capture: sys::RENDERDOC_TriggerMultiFrameCapture,
    set_capture_file_comments: sys::RENDERDOC_SetCaptureFileComments,
    discard_frame_capture: sys::RENDERDOC_DiscardFrameCapture,
    show_replay_ui: sys::RENDERDOC_ShowReplayUI,
    set_capture_title: sys::RENDERDOC_SetCaptureTitle,
}

/// Output of a `GetCapture` query.
pub(crate) struct RawCapture {
    pub(crate) path: Vec<u8>,
    pub(crate) timestamp: u64,
}

impl NativeEntryTable {
    /// Performs the `RENDERDOC_GetAPI` handshake for `requested` and materializes the table.
    ///
    /// # Safety
    ///
    /// `get_api` must be RenderDoc's `RENDERDOC_GetAPI` (or behave like it), and the table it
    /// returns must stay valid for as long as the returned value is used.
    pub unsafe fn bind(
        get_api: sys::RENDERDOC_GetAPI,
        requested: ApiVersion,
    ) -> Result<Self, CaptureError> {
        let mut out: *mut c_void = ptr::null_mut();
        let ok = unsafe { get_api(requested.to_sys(), &mut out) };
        if ok != 1 {
            return Err(CaptureError::GetApiFailed(requested));
        }
        if out.is_null() {
            return Err(CaptureError::NullApiTable(requested));
        }

        // SAFETY: non-null and produced by GetAPI; every accepted version's table is a prefix of
        // the 1.6.0 layout and RenderDoc always returns its full table.
        let api = unsafe { *(out as *const sys::RENDERDOC_API_1_6_0) };
        let table = Self::from_api(&api)?;
        debug!(version = %requested, "bound renderdoc function table");
        Ok(table)
    }

    fn from_api(api: &sys::RENDERDOC_API_1_6_0) -> Result<Self, CaptureError> {
        Ok(Self {
            get_api_version: require!(api, GetAPIVersion),
            set_capture_option_u32: require!(api, SetCaptureOptionU32),
            set_capture_option_f32: require!(api, SetCaptureOptionF32),
            get_capture_option_u32: require!(api, GetCaptureOptionU32),
            get_capture_option_f32: require!(api, GetCaptureOptionF32),
            set_focus_toggle_keys: require!(api, SetFocusToggleKeys),
            set_capture_keys: require!(api, SetCaptureKeys),
            get_overlay_bits: require!(api, GetOverlayBits),
            mask_overlay_bits: require!(api, MaskOverlayBits),
            remove_hooks: require!(api, RemoveHooks),
            unload_crash_handler: require!(api, UnloadCrashHandler),
            set_capture_file_path_template: require!(api, SetCaptureFilePathTemplate),
            get_capture_file_path_template: require!(api, GetCaptureFilePathTemplate),
            get_num_captures: require!(api, GetNumCaptures),
            get_capture: require!(api, GetCapture),
            trigger_capture: require!(api, TriggerCapture),
            is_target_control_connected: require!(api, IsTargetControlConnected),
            launch_replay_ui: require!(api, LaunchReplayUI),
            set_active_window: require!(api, SetActiveWindow),
            start_frame_capture: require!(api, StartFrameCapture),
            is_frame_capturing: require!(api, IsFrameCapturing),
            end_frame_capture: require!(api, EndFrameCapture),
            trigger_multi_frame_capture: require!(api, TriggerMultiFrameCapture),
            set_capture_file_comments: require!(api, SetCaptureFileComments),
            discard_frame_capture: require!(api, DiscardFrameCapture),
            show_replay_ui: require!(api, ShowReplayUI),
            set_capture_title: require!(api, SetCaptureTitle),
        })
    }

    /// The version the native side actually serves, which may differ from the requested one.
    pub fn negotiated_version(&self) -> Result<ApiVersion, CaptureError> {
        let mut major: c_int = 0;
        let mut minor: c_int = 0;
        let mut patch: c_int = 0;
        unsafe { (self.get_api_version)(&mut major, &mut minor, &mut patch) };
        ApiVersion::from_triple(major, minor, patch)
    }

    pub(crate) fn set_capture_option_u32(
        &self,
        opt: sys::RENDERDOC_CaptureOption,
        val: u32,
    ) -> bool {
        unsafe { (self.set_capture_option_u32)(opt, val) == 1 }
    }

    pub(crate) fn set_capture_option_f32(
        &self,
        opt: sys::RENDERDOC_CaptureOption,
        val: f32,
    ) -> bool {
        unsafe { (self.set_capture_option_f32)(opt, val) == 1 }
    }

    pub(crate) fn get_capture_option_u32(&self, opt: sys::RENDERDOC_CaptureOption) -> u32 {
        unsafe { (self.get_capture_option_u32)(opt) }
    }

    pub(crate) fn get_capture_option_f32(&self, opt: sys::RENDERDOC_CaptureOption) -> f32 {
        unsafe { (self.get_capture_option_f32)(opt) }
    }

    pub(crate) fn set_focus_toggle_keys(
        &self,
        keys: &mut [sys::RENDERDOC_InputButton],
    ) -> Result<(), CaptureError> {
        let (ptr, num) = key_array(keys)?;
        unsafe { (self.set_focus_toggle_keys)(ptr, num) };
        Ok(())
    }

    pub(crate) fn set_capture_keys(
        &self,
        keys: &mut [sys::RENDERDOC_InputButton],
    ) -> Result<(), CaptureError> {
        let (ptr, num) = key_array(keys)?;
        unsafe { (self.set_capture_keys)(ptr, num) };
        Ok(())
    }

    pub(crate) fn clear_focus_toggle_keys(&self) {
        unsafe { (self.set_focus_toggle_keys)(ptr::null_mut(), 0) };
    }

    pub(crate) fn clear_capture_keys(&self) {
        unsafe { (self.set_capture_keys)(ptr::null_mut(), 0) };
    }

    pub(crate) fn get_overlay_bits(&self) -> u32 {
        unsafe { (self.get_overlay_bits)() }
    }

    pub(crate) fn mask_overlay_bits(&self, and_mask: u32, or_mask: u32) {
        unsafe { (self.mask_overlay_bits)(and_mask, or_mask) }
    }

    pub(crate) fn remove_hooks(&self) {
        unsafe { (self.remove_hooks)() }
    }

    pub(crate) fn unload_crash_handler(&self) {
        unsafe { (self.unload_crash_handler)() }
    }

    pub(crate) fn set_capture_file_path_template(&self, template: &CStr) {
        unsafe { (self.set_capture_file_path_template)(template.as_ptr()) }
    }

    /// Copies the template out; `None` when RenderDoc returns null.
    pub(crate) fn get_capture_file_path_template(&self) -> Option<Vec<u8>> {
        let ptr = unsafe { (self.get_capture_file_path_template)() };
        if ptr.is_null() {
            return None;
        }
        Some(unsafe { CStr::from_ptr(ptr) }.to_bytes().to_vec())
    }

    pub(crate) fn get_num_captures(&self) -> u32 {
        unsafe { (self.get_num_captures)() }
    }

    /// Looks up capture `idx`, sizing the path buffer from a first length-only query.
    ///
    /// Returns `None` when RenderDoc has no capture at `idx`, or when the reported path would need
    /// more than `max_path_len` bytes.
    pub(crate) fn get_capture(&self, idx: u32, max_path_len: usize) -> Option<RawCapture> {
        let mut path_len: u32 = 0;
        let mut timestamp: u64 = 0;
        let ok = unsafe { (self.get_capture)(idx, ptr::null_mut(), &mut path_len, &mut timestamp) };
        if ok == 0 {
            return None;
        }

        let needed = path_len as usize;
        if needed > max_path_len {
            warn!(
                index = idx,
                needed,
                max_path_len,
                "capture path exceeds the configured maximum length"
            );
            return None;
        }

        let mut buf = vec![0u8; needed];
        let ok = unsafe {
            (self.get_capture)(
                idx,
                buf.as_mut_ptr() as *mut c_char,
                &mut path_len,
                &mut timestamp,
            )
        };
        if ok == 0 {
            return None;
        }

        // The reported length is authoritative; it may or may not count a terminator.
        buf.truncate((path_len as usize).min(needed));
        while buf.last().copied() == Some(0) {
            buf.pop();
        }
        Some(RawCapture {
            path: buf,
            timestamp,
        })
    }

    pub(crate) fn trigger_capture(&self) {
        unsafe { (self.trigger_capture)() }
    }

    pub(crate) fn is_target_control_connected(&self) -> bool {
        unsafe { (self.is_target_control_connected)() == 1 }
    }

    pub(crate) fn launch_replay_ui(
        &self,
        connect_target_control: bool,
        cmdline: Option<&CStr>,
    ) -> u32 {
        let cmd_ptr = cmdline.map_or(ptr::null(), CStr::as_ptr);
        unsafe { (self.launch_replay_ui)(u32::from(connect_target_control), cmd_ptr) }
    }

    pub(crate) fn set_active_window(
        &self,
        device: Option<DeviceHandle>,
        window: Option<WindowHandle>,
    ) {
        unsafe { (self.set_active_window)(device_ptr(device), window_ptr(window)) }
    }

    pub(crate) fn start_frame_capture(
        &self,
        device: Option<DeviceHandle>,
        window: Option<WindowHandle>,
    ) {
        unsafe { (self.start_frame_capture)(device_ptr(device), window_ptr(window)) }
    }

    pub(crate) fn is_frame_capturing(&self) -> bool {
        unsafe { (self.is_frame_capturing)() == 1 }
    }

    pub(crate) fn end_frame_capture(
        &self,
        device: Option<DeviceHandle>,
        window: Option<WindowHandle>,
    ) -> bool {
        unsafe { (self.end_frame_capture)(device_ptr(device), window_ptr(window)) == 1 }
    }

    pub(crate) fn trigger_multi_frame_capture(&self, frames: u32) {
        unsafe { (self.trigger_multi_frame_capture)(frames) }
    }

    pub(crate) fn set_capture_file_comments(&self, path: Option<&CStr>, comments: &CStr) {
        let path_ptr = path.map_or(ptr::null(), CStr::as_ptr);
        unsafe { (self.set_capture_file_comments)(path_ptr, comments.as_ptr()) }
    }

    pub(crate) fn discard_frame_capture(
        &self,
        device: Option<DeviceHandle>,
        window: Option<WindowHandle>,
    ) -> bool {
        unsafe { (self.discard_frame_capture)(device_ptr(device), window_ptr(window)) == 1 }
    }

    pub(crate) fn show_replay_ui(&self) -> bool {
        unsafe { (self.show_replay_ui)() == 1 }
    }

    pub(crate) fn set_capture_title(&self, title: &CStr) {
        unsafe { (self.set_capture_title)(title.as_ptr()) }
    }
}

fn key_array(
    keys: &mut [sys::RENDERDOC_InputButton],
) -> Result<(*mut sys::RENDERDOC_InputButton, c_int), CaptureError> {
    if keys.is_empty() {
        return Ok((ptr::null_mut(), 0));
    }
    let num = c_int::try_from(keys.len()).map_err(|_| CaptureError::TooManyKeys)?;
    Ok((keys.as_mut_ptr(), num))
}

fn device_ptr(device: Option<DeviceHandle>) -> sys::RENDERDOC_DevicePointer {
    device.map_or(ptr::null_mut(), DeviceHandle::as_ptr)
}

fn window_ptr(window: Option<WindowHandle>) -> sys::RENDERDOC_WindowHandle {
    window.map_or(ptr::null_mut(), WindowHandle::as_ptr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake;

    #[test]
    fn bind_reads_the_negotiated_version_not_the_request() {
        fake::reset();
        fake::with_state(|s| s.reported_version = (1, 4, 1));
        let table = unsafe { NativeEntryTable::bind(fake::get_api, ApiVersion::V1_6_0) }.unwrap();
        assert_eq!(table.negotiated_version().unwrap(), ApiVersion::V1_4_1);
        assert_eq!(fake::with_state(|s| s.requested_wire), Some(10600));
    }

    #[test]
    fn failed_handshake_is_a_bind_failure() {
        fake::reset();
        fake::with_state(|s| s.get_api_result = 0);
        let err = unsafe { NativeEntryTable::bind(fake::get_api, ApiVersion::V1_5_0) }.unwrap_err();
        assert!(matches!(err, CaptureError::GetApiFailed(ApiVersion::V1_5_0)));
        assert!(err.is_fatal());
    }

    #[test]
    fn null_table_is_a_bind_failure() {
        fake::reset();
        fake::with_state(|s| s.return_null_table = true);
        let err = unsafe { NativeEntryTable::bind(fake::get_api, ApiVersion::V1_6_0) }.unwrap_err();
        assert!(matches!(err, CaptureError::NullApiTable(_)));
    }

    #[test]
    fn missing_entry_names_the_field() {
        let mut api = fake::api_table();
        api.DiscardFrameCapture = None;
        let err = NativeEntryTable::from_api(&api).unwrap_err();
        assert!(matches!(
            err,
            CaptureError::MissingFunction("DiscardFrameCapture")
        ));
    }

    #[test]
    fn unknown_native_version_is_unsupported() {
        fake::reset();
        fake::with_state(|s| s.reported_version = (1, 9, 0));
        let table = unsafe { NativeEntryTable::bind(fake::get_api, ApiVersion::V1_6_0) }.unwrap();
        assert!(matches!(
            table.negotiated_version(),
            Err(CaptureError::UnsupportedVersion(_))
        ));
    }

    #[test]
    fn get_capture_decodes_exactly_the_reported_length() {
        fake::reset();
        fake::push_capture("captures/app_frame12.rdc", 1_700_000_000);
        let table = unsafe { NativeEntryTable::bind(fake::get_api, ApiVersion::V1_6_0) }.unwrap();
        let raw = table.get_capture(0, 1024).unwrap();
        assert_eq!(raw.path, b"captures/app_frame12.rdc");
        assert_eq!(raw.timestamp, 1_700_000_000);
        assert!(table.get_capture(1, 1024).is_none());
    }

    #[test]
    fn get_capture_refuses_paths_over_the_limit() {
        fake::reset();
        fake::push_capture("a/rather/long/capture/path_frame1.rdc", 5);
        let table = unsafe { NativeEntryTable::bind(fake::get_api, ApiVersion::V1_6_0) }.unwrap();
        assert!(table.get_capture(0, 8).is_none());
        assert!(table.get_capture(0, 64).is_some());
    }

    #[test]
    fn clearing_keys_passes_a_null_array() {
        fake::reset();
        let table = unsafe { NativeEntryTable::bind(fake::get_api, ApiVersion::V1_6_0) }.unwrap();
        table.clear_capture_keys();
        table.clear_focus_toggle_keys();
        fake::with_state(|s| {
            assert_eq!(s.null_key_arrays, 2);
            assert_eq!(s.capture_keys, Some(vec![]));
            assert_eq!(s.focus_toggle_keys, Some(vec![]));
        });
    }

    #[test]
    fn empty_key_list_passes_null() {
        let mut keys: [sys::RENDERDOC_InputButton; 0] = [];
        let (ptr, num) = key_array(&mut keys).unwrap();
        assert!(ptr.is_null());
        assert_eq!(num, 0);
    }
}
