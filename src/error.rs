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

    src/error.rs

    Error and warning taxonomy for the image-element codec. Fatal conditions
    are returned as `Result::Err` and abort the current row call; warnings
    accumulate on the element and do not stop I/O.
*/

use bitflags::bitflags;
use thiserror::Error;

/// Fatal conditions, per the codec's error taxonomy. Returning one of these
/// from `read_row`/`write_row` poisons the element until it is reopened.
#[derive(Debug, Error)]
pub enum DpxCodecError {
    #[error("image element is not initialized")]
    Uninitialized,
    #[error("image element is poisoned by a previous fatal error; reopen it to continue")]
    Poisoned,
    #[error("underlying byte stream failed: {0}")]
    Stream(#[from] std::io::Error),
    #[error("sample kind does not match the element's bit size")]
    SampleKindMismatch,
    #[error("cannot open for writing: descriptor or bit size is undefined")]
    UndefinedForWrite,
    #[error("RLE rows must be read/written in ascending order")]
    OutOfOrderRow,
    #[error("RLE element has no data offset and none could be found in the file map")]
    MissingRleOffset,
    #[error("bit FIFO underflowed: requested {requested} bits, only {available} available")]
    FifoUnderflow { requested: u32, available: u32 },
    #[error("bit FIFO overflowed: requested {requested} bits, only {available} free of {capacity}")]
    FifoOverflow {
        requested: u32,
        available: u32,
        capacity: u32,
    },
}

pub type DpxResult<T> = Result<T, DpxCodecError>;

bitflags! {
    /// Non-fatal conditions observed during a row call. These never stop
    /// I/O; they accumulate here until the caller inspects or resets them.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct DpxWarnings: u32 {
        /// A mutation was attempted on a header that is currently locked by
        /// an open element.
        const HEADER_LOCKED           = 1 << 0;
        /// An RLE flag datum encoded a run length of zero.
        const ZERO_RUN_LENGTH         = 1 << 1;
        /// An RLE same-pixel run extended past the end of a row.
        const RLE_SAME_PAST_EOL       = 1 << 2;
        /// An RLE different-pixel run extended past the end of a row.
        const RLE_DIFF_PAST_EOL       = 1 << 3;
        /// A padding slot that should have been zero was observed non-zero.
        const UNEXPECTED_NONZERO_PAD  = 1 << 4;
        /// A `Description` string had to be truncated to fit the field.
        const DESCRIPTION_TRUNCATED   = 1 << 5;
    }
}

/// Accumulated warning state for one image element, plus the mask of
/// offending image-data-word bits observed under [`DpxWarnings::UNEXPECTED_NONZERO_PAD`].
///
/// Mirrors the original's loose collection of `m_warn_*` booleans and
/// `m_warn_image_data_word_mask`, folded into one bitflags value plus a mask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarningLog {
    flags: DpxWarnings,
    image_data_word_mask: u32,
}

impl WarningLog {
    pub fn flags(&self) -> DpxWarnings {
        self.flags
    }

    pub fn image_data_word_mask(&self) -> u32 {
        self.image_data_word_mask
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn reset(&mut self) {
        self.flags = DpxWarnings::empty();
        self.image_data_word_mask = 0;
    }

    pub(crate) fn raise(&mut self, flag: DpxWarnings) {
        if !self.flags.contains(flag) {
            log::warn!("dpx image element: {flag:?}");
        }
        self.flags.insert(flag);
    }

    pub(crate) fn raise_nonzero_padding(&mut self, image_data_word: u32) {
        self.raise(DpxWarnings::UNEXPECTED_NONZERO_PAD);
        self.image_data_word_mask |= image_data_word;
    }
}
