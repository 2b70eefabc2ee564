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
*/

//! # hdr-dpx-codec
//!
//! A bit-accurate pixel codec for the HDR DPX still-image container
//! (SMPTE RP 268). This crate reads and writes one image element's pixel
//! rows at a time: it does not parse or write DPX file headers, and it
//! does not decide image layout (that's a file parser built on top).
//!
//! The pieces, bottom-up:
//!
//! - [`bitfifo`] — a circular bit buffer with MSb-first and "flip"
//!   (LSb-first, byte-reversed) addressing over the same storage.
//! - [`packing`] — the packing-method × mapping-direction decision table
//!   that places padding bits around 10/12-bit samples.
//! - [`descriptor`] — the descriptor-to-component-list mapping.
//! - [`sample`] — the tagged int/float/double row buffer.
//! - [`row_codec`] — one row's decode/encode, including the RLE state
//!   machine.
//! - [`stream`] — the seekable-stream and file-map contracts a caller must
//!   satisfy.
//! - [`element`] — [`element::ImageElement`], the runtime tying the above
//!   together over one element's region of a file.
//!
//! Enable logging via the `log` facade (e.g. with `env_logger`) to see
//! warnings raised during decode; fatal conditions are returned as
//! [`error::DpxCodecError`].

pub mod bitfifo;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod packing;
pub mod row_codec;
pub mod sample;
pub mod stream;

pub use bitfifo::BitFifo;
pub use descriptor::{DatumLabel, Descriptor};
pub use element::{DataSign, FileGeometry, ImageElement, ImageElementHeader, DESCRIPTION_SIZE};
pub use error::{DpxCodecError, DpxResult, DpxWarnings, WarningLog};
pub use packing::{MappingDirection, PackingMethod, PaddingCursor, PaddingPlan};
pub use row_codec::{decode_row, encode_row, RowCodecParams};
pub use sample::{RowBuffer, RowBufferMut};
pub use stream::{ByteStream, FileMap, SingleElementFileMap};
