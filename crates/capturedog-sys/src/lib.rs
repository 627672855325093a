//! Raw declarations for RenderDoc's in-application API (`renderdoc_app.h`).
//!
//! Only the 1.6.0 function table is declared: every older table is a prefix of it, and RenderDoc
//! hands out the same table for any version it accepts. Anonymous unions in the header (for example
//! `RemoveHooks`/`Shutdown`) are declared as a single field, since every member of such a union has
//! the same signature.
//!
//! Nothing here is safe to call directly; see the `capturedog` crate for the wrapper.
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]
#![allow(clippy::all)]

use std::ffi::{c_char, c_int, c_void};

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RENDERDOC_Version(pub u32);

impl RENDERDOC_Version {
    pub const eRENDERDOC_API_Version_1_0_0: Self = Self(10000);
    pub const eRENDERDOC_API_Version_1_0_1: Self = Self(10001);
    pub const eRENDERDOC_API_Version_1_0_2: Self = Self(10002);
    pub const eRENDERDOC_API_Version_1_1_0: Self = Self(10100);
    pub const eRENDERDOC_API_Version_1_1_1: Self = Self(10101);
    pub const eRENDERDOC_API_Version_1_1_2: Self = Self(10102);
    pub const eRENDERDOC_API_Version_1_2_0: Self = Self(10200);
    pub const eRENDERDOC_API_Version_1_3_0: Self = Self(10300);
    pub const eRENDERDOC_API_Version_1_4_0: Self = Self(10400);
    pub const eRENDERDOC_API_Version_1_4_1: Self = Self(10401);
    pub const eRENDERDOC_API_Version_1_4_2: Self = Self(10402);
    pub const eRENDERDOC_API_Version_1_5_0: Self = Self(10500);
    pub const eRENDERDOC_API_Version_1_6_0: Self = Self(10600);
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RENDERDOC_CaptureOption(pub u32);

impl RENDERDOC_CaptureOption {
    pub const eRENDERDOC_Option_AllowVSync: Self = Self(0);
    pub const eRENDERDOC_Option_AllowFullscreen: Self = Self(1);
    pub const eRENDERDOC_Option_APIValidation: Self = Self(2);
    pub const eRENDERDOC_Option_CaptureCallstacks: Self = Self(3);
    pub const eRENDERDOC_Option_CaptureCallstacksOnlyDraws: Self = Self(4);
    pub const eRENDERDOC_Option_DelayForDebugger: Self = Self(5);
    pub const eRENDERDOC_Option_VerifyBufferAccess: Self = Self(6);
    pub const eRENDERDOC_Option_HookIntoChildren: Self = Self(7);
    pub const eRENDERDOC_Option_RefAllResources: Self = Self(8);
    pub const eRENDERDOC_Option_SaveAllInitials: Self = Self(9);
    pub const eRENDERDOC_Option_CaptureAllCmdLists: Self = Self(10);
    pub const eRENDERDOC_Option_DebugOutputMute: Self = Self(11);
    pub const eRENDERDOC_Option_AllowUnsupportedVendorExtensions: Self = Self(12);
    pub const eRENDERDOC_Option_SoftMemoryLimit: Self = Self(13);
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RENDERDOC_InputButton(pub u32);

impl RENDERDOC_InputButton {
    // '0' - '9' and 'A' - 'Z' match their ASCII codes.
    pub const eRENDERDOC_Key_0: Self = Self(0x30);
    pub const eRENDERDOC_Key_A: Self = Self(0x41);
    pub const eRENDERDOC_Key_NonPrintable: Self = Self(0x100);
    pub const eRENDERDOC_Key_Divide: Self = Self(0x100);
    pub const eRENDERDOC_Key_F1: Self = Self(0x104);
    pub const eRENDERDOC_Key_F12: Self = Self(0x10F);
    pub const eRENDERDOC_Key_Home: Self = Self(0x110);
    pub const eRENDERDOC_Key_Max: Self = Self(0x11A);
}

#[repr(transparent)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct RENDERDOC_OverlayBits(pub u32);

impl RENDERDOC_OverlayBits {
    pub const eRENDERDOC_Overlay_Enabled: Self = Self(0x1);
    pub const eRENDERDOC_Overlay_FrameRate: Self = Self(0x2);
    pub const eRENDERDOC_Overlay_FrameNumber: Self = Self(0x4);
    pub const eRENDERDOC_Overlay_CaptureList: Self = Self(0x8);
    pub const eRENDERDOC_Overlay_Default: Self = Self(0xF);
    pub const eRENDERDOC_Overlay_All: Self = Self(!0);
    pub const eRENDERDOC_Overlay_None: Self = Self(0);
}

/// `ID3D11Device*`, `VkInstance` dispatch pointer, `HGLRC`, ...
pub type RENDERDOC_DevicePointer = *mut c_void;
/// `HWND`, `xcb_window_t*`, `ANativeWindow*`, ...
pub type RENDERDOC_WindowHandle = *mut c_void;

pub type RENDERDOC_GetAPI =
    unsafe extern "C" fn(version: RENDERDOC_Version, outAPIPointers: *mut *mut c_void) -> c_int;
pub type pRENDERDOC_GetAPI = Option<RENDERDOC_GetAPI>;

pub type RENDERDOC_GetAPIVersion =
    unsafe extern "C" fn(major: *mut c_int, minor: *mut c_int, patch: *mut c_int);
pub type pRENDERDOC_GetAPIVersion = Option<RENDERDOC_GetAPIVersion>;

pub type RENDERDOC_SetCaptureOptionU32 =
    unsafe extern "C" fn(opt: RENDERDOC_CaptureOption, val: u32) -> c_int;
pub type pRENDERDOC_SetCaptureOptionU32 = Option<RENDERDOC_SetCaptureOptionU32>;

pub type RENDERDOC_SetCaptureOptionF32 =
    unsafe extern "C" fn(opt: RENDERDOC_CaptureOption, val: f32) -> c_int;
pub type pRENDERDOC_SetCaptureOptionF32 = Option<RENDERDOC_SetCaptureOptionF32>;

pub type RENDERDOC_GetCaptureOptionU32 = unsafe extern "C" fn(opt: RENDERDOC_CaptureOption) -> u32;
pub type pRENDERDOC_GetCaptureOptionU32 = Option<RENDERDOC_GetCaptureOptionU32>;

pub type RENDERDOC_GetCaptureOptionF32 = unsafe extern "C" fn(opt: RENDERDOC_CaptureOption) -> f32;
pub type pRENDERDOC_GetCaptureOptionF32 = Option<RENDERDOC_GetCaptureOptionF32>;

pub type RENDERDOC_SetFocusToggleKeys =
    unsafe extern "C" fn(keys: *mut RENDERDOC_InputButton, num: c_int);
pub type pRENDERDOC_SetFocusToggleKeys = Option<RENDERDOC_SetFocusToggleKeys>;

pub type RENDERDOC_SetCaptureKeys =
    unsafe extern "C" fn(keys: *mut RENDERDOC_InputButton, num: c_int);
pub type pRENDERDOC_SetCaptureKeys = Option<RENDERDOC_SetCaptureKeys>;

pub type RENDERDOC_GetOverlayBits = unsafe extern "C" fn() -> u32;
pub type pRENDERDOC_GetOverlayBits = Option<RENDERDOC_GetOverlayBits>;

pub type RENDERDOC_MaskOverlayBits = unsafe extern "C" fn(And: u32, Or: u32);
pub type pRENDERDOC_MaskOverlayBits = Option<RENDERDOC_MaskOverlayBits>;

pub type RENDERDOC_RemoveHooks = unsafe extern "C" fn();
pub type pRENDERDOC_RemoveHooks = Option<RENDERDOC_RemoveHooks>;

pub type RENDERDOC_UnloadCrashHandler = unsafe extern "C" fn();
pub type pRENDERDOC_UnloadCrashHandler = Option<RENDERDOC_UnloadCrashHandler>;

pub type RENDERDOC_SetCaptureFilePathTemplate = unsafe extern "C" fn(pathtemplate: *const c_char);
pub type pRENDERDOC_SetCaptureFilePathTemplate = Option<RENDERDOC_SetCaptureFilePathTemplate>;

pub type RENDERDOC_GetCaptureFilePathTemplate = unsafe extern "C" fn() -> *const c_char;
pub type pRENDERDOC_GetCaptureFilePathTemplate = Option<RENDERDOC_GetCaptureFilePathTemplate>;

pub type RENDERDOC_GetNumCaptures = unsafe extern "C" fn() -> u32;
pub type pRENDERDOC_GetNumCaptures = Option<RENDERDOC_GetNumCaptures>;

/// Returns 0 when `idx` has no capture. `filename` receives the NUL-terminated path when non-null;
/// `pathlength` receives its length including the terminator.
pub type RENDERDOC_GetCapture = unsafe extern "C" fn(
    idx: u32,
    filename: *mut c_char,
    pathlength: *mut u32,
    timestamp: *mut u64,
) -> u32;
pub type pRENDERDOC_GetCapture = Option<RENDERDOC_GetCapture>;

pub type RENDERDOC_TriggerCapture = unsafe extern "C" fn();
pub type pRENDERDOC_TriggerCapture = Option<RENDERDOC_TriggerCapture>;

pub type RENDERDOC_IsTargetControlConnected = unsafe extern "C" fn() -> u32;
pub type pRENDERDOC_IsTargetControlConnected = Option<RENDERDOC_IsTargetControlConnected>;

pub type RENDERDOC_LaunchReplayUI =
    unsafe extern "C" fn(connectTargetControl: u32, cmdline: *const c_char) -> u32;
pub type pRENDERDOC_LaunchReplayUI = Option<RENDERDOC_LaunchReplayUI>;

pub type RENDERDOC_SetActiveWindow =
    unsafe extern "C" fn(device: RENDERDOC_DevicePointer, wndHandle: RENDERDOC_WindowHandle);
pub type pRENDERDOC_SetActiveWindow = Option<RENDERDOC_SetActiveWindow>;

pub type RENDERDOC_StartFrameCapture =
    unsafe extern "C" fn(device: RENDERDOC_DevicePointer, wndHandle: RENDERDOC_WindowHandle);
pub type pRENDERDOC_StartFrameCapture = Option<RENDERDOC_StartFrameCapture>;

pub type RENDERDOC_IsFrameCapturing = unsafe extern "C" fn() -> u32;
pub type pRENDERDOC_IsFrameCapturing = Option<RENDERDOC_IsFrameCapturing>;

pub type RENDERDOC_EndFrameCapture =
    unsafe extern "C" fn(device: RENDERDOC_DevicePointer, wndHandle: RENDERDOC_WindowHandle) -> u32;
pub type pRENDERDOC_EndFrameCapture = Option<RENDERDOC_EndFrameCapture>;

pub type RENDERDOC_TriggerMultiFrameCapture = unsafe extern "C" fn(numFrames: u32);
pub type pRENDERDOC_TriggerMultiFrameCapture = Option<RENDERDOC_TriggerMultiFrameCapture>;

pub type RENDERDOC_SetCaptureFileComments =
    unsafe extern "C" fn(filePath: *const c_char, comments: *const c_char);
pub type pRENDERDOC_SetCaptureFileComments = Option<RENDERDOC_SetCaptureFileComments>;

pub type RENDERDOC_DiscardFrameCapture =
    unsafe extern "C" fn(device: RENDERDOC_DevicePointer, wndHandle: RENDERDOC_WindowHandle) -> u32;
pub type pRENDERDOC_DiscardFrameCapture = Option<RENDERDOC_DiscardFrameCapture>;

pub type RENDERDOC_ShowReplayUI = unsafe extern "C" fn() -> u32;
pub type pRENDERDOC_ShowReplayUI = Option<RENDERDOC_ShowReplayUI>;

pub type RENDERDOC_SetCaptureTitle = unsafe extern "C" fn(title: *const c_char);
pub type pRENDERDOC_SetCaptureTitle = Option<RENDERDOC_SetCaptureTitle>;

/// The function table returned by `RENDERDOC_GetAPI`. Field order is ABI.
#[repr(C)]
#[derive(Clone, Copy, Debug)]
pub struct RENDERDOC_API_1_6_0 {
    pub GetAPIVersion: pRENDERDOC_GetAPIVersion,

    pub SetCaptureOptionU32: pRENDERDOC_SetCaptureOptionU32,
    pub SetCaptureOptionF32: pRENDERDOC_SetCaptureOptionF32,

    pub GetCaptureOptionU32: pRENDERDOC_GetCaptureOptionU32,
    pub GetCaptureOptionF32: pRENDERDOC_GetCaptureOptionF32,

    pub SetFocusToggleKeys: pRENDERDOC_SetFocusToggleKeys,
    pub SetCaptureKeys: pRENDERDOC_SetCaptureKeys,

    pub GetOverlayBits: pRENDERDOC_GetOverlayBits,
    pub MaskOverlayBits: pRENDERDOC_MaskOverlayBits,

    /// union { Shutdown, RemoveHooks }
    pub RemoveHooks: pRENDERDOC_RemoveHooks,
    pub UnloadCrashHandler: pRENDERDOC_UnloadCrashHandler,

    /// union { SetLogFilePathTemplate, SetCaptureFilePathTemplate }
    pub SetCaptureFilePathTemplate: pRENDERDOC_SetCaptureFilePathTemplate,
    /// union { GetLogFilePathTemplate, GetCaptureFilePathTemplate }
    pub GetCaptureFilePathTemplate: pRENDERDOC_GetCaptureFilePathTemplate,

    pub GetNumCaptures: pRENDERDOC_GetNumCaptures,
    pub GetCapture: pRENDERDOC_GetCapture,

    pub TriggerCapture: pRENDERDOC_TriggerCapture,

    /// union { IsRemoteAccessConnected, IsTargetControlConnected }
    pub IsTargetControlConnected: pRENDERDOC_IsTargetControlConnected,
    pub LaunchReplayUI: pRENDERDOC_LaunchReplayUI,

    pub SetActiveWindow: pRENDERDOC_SetActiveWindow,

    pub StartFrameCapture: pRENDERDOC_StartFrameCapture,
    pub IsFrameCapturing: pRENDERDOC_IsFrameCapturing,
    pub EndFrameCapture: pRENDERDOC_EndFrameCapture,

    // 1.1.0
    pub TriggerMultiFrameCapture: pRENDERDOC_TriggerMultiFrameCapture,

    // 1.2.0
    pub SetCaptureFileComments: pRENDERDOC_SetCaptureFileComments,

    // 1.4.0
    pub DiscardFrameCapture: pRENDERDOC_DiscardFrameCapture,

    // 1.5.0
    pub ShowReplayUI: pRENDERDOC_ShowReplayUI,

    // 1.6.0
    pub SetCaptureTitle: pRENDERDOC_SetCaptureTitle,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_table_is_a_flat_pointer_array() {
        assert_eq!(
            std::mem::size_of::<RENDERDOC_API_1_6_0>(),
            27 * std::mem::size_of::<usize>()
        );
    }
}
