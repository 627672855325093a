use std::sync::Arc;

use tracing::debug;

use crate::{NativeEntryTable, OverlayBit, OverlayBits};

/// Bit-level control of RenderDoc's in-application overlay.
///
/// RenderDoc exposes the overlay only as `GetOverlayBits` and `MaskOverlayBits(and, or)`, which
/// computes `bits = (bits & and) | or`. Nothing is cached here: every query goes back to RenderDoc.
///
/// [`toggle`](Self::toggle) is a read followed by a write. Another thread mutating the overlay
/// between the two can be lost; like the rest of the in-app API, overlay calls belong on the thread
/// that drives rendering.
#[derive(Debug)]
pub struct OverlayConfiguration {
    entries: Arc<NativeEntryTable>,
}

impl OverlayConfiguration {
    /// Clears the overlay, then turns on each single bit contained in `defaults`.
    pub(crate) fn new(entries: Arc<NativeEntryTable>, defaults: OverlayBits) -> Self {
        entries.mask_overlay_bits(0, 0);
        for bit in defaults.single_bits() {
            entries.mask_overlay_bits(!0, bit.mask());
        }
        debug!(bits = ?defaults.named(), "initialized overlay bits");
        Self { entries }
    }

    /// The raw mask, as RenderDoc reports it right now.
    pub fn bits(&self) -> u32 {
        self.entries.get_overlay_bits()
    }

    /// The named bits currently on.
    pub fn active_bits(&self) -> OverlayBits {
        OverlayBits::from_bits_retain(self.bits()).named()
    }

    pub fn turn_on(&self, bit: OverlayBit) {
        debug!(bit = ?bit, "overlay bit on");
        self.entries.mask_overlay_bits(!0, bit.mask());
    }

    pub fn turn_off(&self, bit: OverlayBit) {
        debug!(bit = ?bit, "overlay bit off");
        self.entries.mask_overlay_bits(!bit.mask(), 0);
    }

    /// Flips `bit`, leaving every other bit as it was.
    pub fn toggle(&self, bit: OverlayBit) {
        let current = self.bits();
        let (and_mask, or_mask) = toggle_masks(current, bit.mask());
        debug!(bit = ?bit, was_on = current & bit.mask() != 0, "overlay bit toggled");
        self.entries.mask_overlay_bits(and_mask, or_mask);
    }

    pub fn is_enabled(&self, bit: OverlayBit) -> bool {
        self.bits() & bit.mask() != 0
    }
}

/// Masks that move `bit` to the negation of its value in `current`: the AND clears it, the OR sets
/// it back only if it was clear.
fn toggle_masks(current: u32, bit: u32) -> (u32, u32) {
    (!bit, bit & !current)
}
