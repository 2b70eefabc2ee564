/*
    FluxFox
    https://github.com/dbalsom/fluxfox

    Copyright 2024 Daniel Balsom

    Permission is hereby granted, free of charge, to any person obtaining a
    copy of this software and associated documentation files (the “Software”),
    to deal in the Software without restriction, including without limitation
    the rights to use, copy, modify, merge, publish, distribute, sublicense,
    and/or sell copies of the Software, and to permit persons to whom the
    Software is furnished to do so, subject to the following conditions:

    The above copyright notice and this permission notice shall be included in
    all copies or substantial portions of the Software.

    THE SOFTWARE IS PROVIDED “AS IS”, WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
    IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
    FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
    AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
    LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING
    FROM, OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER
    DEALINGS IN THE SOFTWARE.

    --------------------------------------------------------------------------

    src/packing.rs

    The packing-method × mapping-direction decision table. `padding_plan`
    is the single source of truth for where zero-padding bits sit relative
    to 10/12-bit datums inside a 32-bit image-data word; both the row
    decoder and row encoder consume it so the two paths cannot drift
    (Design Notes, spec.md §9).
*/

/// How datums and padding bits are arranged inside a 32-bit image-data word.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PackingMethod {
    /// Samples concatenated with no padding, dense across word boundaries.
    Packed,
    /// Each word holds a whole number of samples plus padding on the side
    /// opposite the mapping direction.
    MethodA,
    /// Mirror of Method A: padding on the mapping-direction side.
    MethodB,
}

impl PackingMethod {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(PackingMethod::Packed),
            1 => Some(PackingMethod::MethodA),
            2 => Some(PackingMethod::MethodB),
            _ => None,
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            PackingMethod::Packed => 0,
            PackingMethod::MethodA => 1,
            PackingMethod::MethodB => 2,
        }
    }
}

/// Within an image-data word, whether datums are laid out MSb-first (LTR)
/// or LSb-first in flipped byte order (RTL). Derived from the file header's
/// `DatumMappingDirection`: 0 means RTL, nonzero means LTR.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MappingDirection {
    Ltr,
    Rtl,
}

impl MappingDirection {
    pub fn from_header_field(datum_mapping_direction: u32) -> Self {
        if datum_mapping_direction == 0 {
            MappingDirection::Rtl
        } else {
            MappingDirection::Ltr
        }
    }

    pub fn is_r2l(&self) -> bool {
        matches!(self, MappingDirection::Rtl)
    }
}

/// Describes the padding regime for one (bit_size, packing, direction)
/// combination, for bit sizes that take padding (10 and 12 under Method A
/// or Method B). `None` from [`padding_plan`] means: no padding, consume
/// datums densely (Packed, or any bit size the method doesn't apply to).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PaddingPlan {
    /// Width of one padding slot, in bits (2 for 10-bit, 4 for 12-bit).
    pub pad_bits: u32,
    /// How many datums separate successive padding slots (3 for 10-bit —
    /// padding once per word of 3 samples; 1 for 12-bit — padding after
    /// every sample).
    pub samples_per_pad: u32,
    /// If true, the padding slot precedes the first datum of its group;
    /// if false, it follows the last datum of the group.
    pub pad_before: bool,
    /// If true, padding bits are read/written with flip (LSb-first, byte
    /// order reversed within the word) addressing; otherwise MSb-first.
    pub use_flip: bool,
}

/// The packing × direction decision table from spec.md §6 and §9, pinned
/// against `original_source/hdr_dpx_image_element.cpp`'s `ReadRow`/`WriteDatum`.
pub fn padding_plan(bit_size: u8, packing: PackingMethod, direction: MappingDirection) -> Option<PaddingPlan> {
    if packing == PackingMethod::Packed {
        return None;
    }
    let (pad_bits, samples_per_pad) = match bit_size {
        10 => (2, 3),
        12 => (4, 1),
        _ => return None,
    };
    let (pad_before, use_flip) = match (packing, direction) {
        (PackingMethod::MethodA, MappingDirection::Rtl) => (true, true),
        (PackingMethod::MethodA, MappingDirection::Ltr) => (false, false),
        (PackingMethod::MethodB, MappingDirection::Ltr) => (true, false),
        (PackingMethod::MethodB, MappingDirection::Rtl) => (false, true),
        (PackingMethod::Packed, _) => unreachable!("handled above"),
    };
    Some(PaddingPlan {
        pad_bits,
        samples_per_pad,
        pad_before,
        use_flip,
    })
}

/// Tracks position within the current group of samples for a [`PaddingPlan`],
/// so the decoder/encoder can ask "is a padding slot due now?" without
/// re-deriving word-fullness arithmetic at each call site. Reset once per
/// row, matching the original's fresh per-row FIFO.
#[derive(Debug, Default)]
pub struct PaddingCursor {
    samples_since_pad: u32,
}

impl PaddingCursor {
    pub fn new() -> Self {
        PaddingCursor::default()
    }

    pub fn reset(&mut self) {
        self.samples_since_pad = 0;
    }

    /// Whether a padding slot should be consumed/emitted *before* the next
    /// datum, given `plan`.
    pub fn due_before(&self, plan: &PaddingPlan) -> bool {
        plan.pad_before && self.samples_since_pad == 0
    }

    /// Call after processing one datum. Returns whether a padding slot
    /// should be consumed/emitted *after* the datum just processed.
    pub fn advance(&mut self, plan: &PaddingPlan) -> bool {
        self.samples_since_pad += 1;
        if self.samples_since_pad == plan.samples_per_pad {
            self.samples_since_pad = 0;
            !plan.pad_before
        } else {
            false
        }
    }
}
