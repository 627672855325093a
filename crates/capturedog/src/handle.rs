use std::ffi::c_void;

use serde::{Deserialize, Serialize};

/// Graphics-API device identifier passed through to RenderDoc unmodified
/// (`ID3D11Device*`, the `VkInstance` dispatch table pointer, an `HGLRC`, ...).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceHandle(usize);

/// Platform window identifier passed through to RenderDoc unmodified (`HWND`, ...).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowHandle(usize);

macro_rules! impl_handle {
    ($name:ident) => {
        impl $name {
            /// `None` for 0, which RenderDoc reads as "any".
            pub fn new(raw: usize) -> Option<Self> {
                (raw != 0).then_some(Self(raw))
            }

            pub fn from_ptr(ptr: *mut c_void) -> Option<Self> {
                Self::new(ptr as usize)
            }

            pub fn raw(self) -> usize {
                self.0
            }

            pub(crate) fn as_ptr(self) -> *mut c_void {
                self.0 as *mut c_void
            }
        }
    };
}

impl_handle!(DeviceHandle);
impl_handle!(WindowHandle);

/// The device/window pair frame-capture calls are issued against. Either side may be a wildcard.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct HandlePair {
    pub device: Option<DeviceHandle>,
    pub window: Option<WindowHandle>,
}
