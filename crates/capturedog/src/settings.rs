use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use capturedog_sys as sys;

/// RenderDoc capture options (strongly typed wrapper).
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CaptureOption {
    AllowVSync = 0,
    AllowFullscreen = 1,
    ApiValidation = 2,
    CaptureCallstacks = 3,
    CaptureCallstacksOnlyDraws = 4,
    DelayForDebugger = 5,
    VerifyBufferAccess = 6,
    HookIntoChildren = 7,
    RefAllResources = 8,
    SaveAllInitials = 9,
    CaptureAllCmdLists = 10,
    DebugOutputMute = 11,
    AllowUnsupportedVendorExtensions = 12,
    SoftMemoryLimit = 13,
}

impl From<CaptureOption> for sys::RENDERDOC_CaptureOption {
    fn from(value: CaptureOption) -> Self {
        sys::RENDERDOC_CaptureOption(value as u32)
    }
}

/// RenderDoc input buttons (strongly typed wrapper).
#[allow(missing_docs)]
#[repr(u32)]
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum InputButton {
    Key0 = 0x30,
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    A = 0x41,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    Divide = 0x100,
    Multiply,
    Subtract,
    Plus,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    Home,
    End,
    Insert,
    Delete,
    PageUp,
    PageDn,
    Backspace,
    Tab,
    PrtScrn,
    Pause,
    Max,
}

impl From<InputButton> for sys::RENDERDOC_InputButton {
    fn from(value: InputButton) -> Self {
        sys::RENDERDOC_InputButton(value as u32)
    }
}

bitflags! {
    /// A set of overlay bits, as reported by `GetOverlayBits`.
    ///
    /// `DEFAULT` and `ALL` are composites. Operations that act on one bit take an [`OverlayBit`]
    /// instead, so a composite can never be passed where a single bit is expected.
    #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
    pub struct OverlayBits: u32 {
        const ENABLED = sys::RENDERDOC_OverlayBits::eRENDERDOC_Overlay_Enabled.0;
        const FRAME_RATE = sys::RENDERDOC_OverlayBits::eRENDERDOC_Overlay_FrameRate.0;
        const FRAME_NUMBER = sys::RENDERDOC_OverlayBits::eRENDERDOC_Overlay_FrameNumber.0;
        const CAPTURE_LIST = sys::RENDERDOC_OverlayBits::eRENDERDOC_Overlay_CaptureList.0;
        const DEFAULT = sys::RENDERDOC_OverlayBits::eRENDERDOC_Overlay_Default.0;
        const ALL = sys::RENDERDOC_OverlayBits::eRENDERDOC_Overlay_All.0;
    }
}

impl OverlayBits {
    pub const NONE: OverlayBits = OverlayBits::empty();

    /// The named single bits contained in `self`.
    pub fn single_bits(self) -> impl Iterator<Item = OverlayBit> {
        OverlayBit::ALL
            .into_iter()
            .filter(move |bit| self.contains(OverlayBits::from(*bit)))
    }

    /// Only the named single bits of `self`; unnamed bits are dropped.
    pub fn named(self) -> OverlayBits {
        self & OverlayBits::DEFAULT
    }
}

/// One overlay bit.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayBit {
    Enabled,
    FrameRate,
    FrameNumber,
    CaptureList,
}

impl OverlayBit {
    pub const ALL: [OverlayBit; 4] = [
        OverlayBit::Enabled,
        OverlayBit::FrameRate,
        OverlayBit::FrameNumber,
        OverlayBit::CaptureList,
    ];

    pub const fn mask(self) -> u32 {
        match self {
            OverlayBit::Enabled => OverlayBits::ENABLED.bits(),
            OverlayBit::FrameRate => OverlayBits::FRAME_RATE.bits(),
            OverlayBit::FrameNumber => OverlayBits::FRAME_NUMBER.bits(),
            OverlayBit::CaptureList => OverlayBits::CAPTURE_LIST.bits(),
        }
    }
}

impl From<OverlayBit> for OverlayBits {
    fn from(value: OverlayBit) -> Self {
        OverlayBits::from_bits_retain(value.mask())
    }
}

impl FromIterator<OverlayBit> for OverlayBits {
    fn from_iter<T: IntoIterator<Item = OverlayBit>>(iter: T) -> Self {
        iter.into_iter()
            .fold(OverlayBits::NONE, |acc, bit| acc | OverlayBits::from(bit))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capture_option_maps_to_sys() {
        let sys_opt: sys::RENDERDOC_CaptureOption = CaptureOption::DelayForDebugger.into();
        assert_eq!(
            sys_opt,
            sys::RENDERDOC_CaptureOption::eRENDERDOC_Option_DelayForDebugger
        );
        let sys_opt: sys::RENDERDOC_CaptureOption = CaptureOption::SoftMemoryLimit.into();
        assert_eq!(
            sys_opt,
            sys::RENDERDOC_CaptureOption::eRENDERDOC_Option_SoftMemoryLimit
        );
    }

    #[test]
    fn input_button_maps_to_sys() {
        let sys_btn: sys::RENDERDOC_InputButton = InputButton::F12.into();
        assert_eq!(sys_btn, sys::RENDERDOC_InputButton::eRENDERDOC_Key_F12);
        let sys_btn: sys::RENDERDOC_InputButton = InputButton::A.into();
        assert_eq!(sys_btn, sys::RENDERDOC_InputButton::eRENDERDOC_Key_A);
        let sys_btn: sys::RENDERDOC_InputButton = InputButton::Home.into();
        assert_eq!(sys_btn, sys::RENDERDOC_InputButton::eRENDERDOC_Key_Home);
        let sys_btn: sys::RENDERDOC_InputButton = InputButton::Max.into();
        assert_eq!(sys_btn, sys::RENDERDOC_InputButton::eRENDERDOC_Key_Max);
    }

    #[test]
    fn default_is_the_union_of_the_single_bits() {
        let all_singles: OverlayBits = OverlayBit::ALL.into_iter().collect();
        assert_eq!(all_singles, OverlayBits::DEFAULT);
        assert_eq!(OverlayBits::NONE.bits(), 0);
        assert_eq!(OverlayBits::ALL.named(), OverlayBits::DEFAULT);
    }

    #[test]
    fn single_bits_decomposes_composites() {
        let bits = OverlayBits::ENABLED | OverlayBits::CAPTURE_LIST;
        let singles: Vec<_> = bits.single_bits().collect();
        assert_eq!(singles, vec![OverlayBit::Enabled, OverlayBit::CaptureList]);
        assert_eq!(OverlayBits::ALL.single_bits().count(), 4);
        assert_eq!(OverlayBits::NONE.single_bits().count(), 0);
    }
}
