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

    src/element.rs

    `ImageElement`: the runtime view of one DPX image element over a
    seekable stream. Owns header/geometry state, the RLE cross-row cursor,
    and accumulated warnings; delegates the actual bit-level work for one
    row to `row_codec`.
*/

use crate::descriptor::{DatumLabel, Descriptor};
use crate::error::{DpxCodecError, DpxResult, WarningLog};
use crate::packing::{MappingDirection, PackingMethod};
use crate::row_codec::{self, RowCodecParams};
use crate::sample::{RowBuffer, RowBufferMut};
use crate::stream::{ByteStream, FileMap};

/// `DataSign` header field: whether integer samples are signed or unsigned.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DataSign {
    Unsigned,
    Signed,
}

impl DataSign {
    pub fn from_code(code: u8) -> Self {
        if code == 1 {
            DataSign::Signed
        } else {
            DataSign::Unsigned
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            DataSign::Unsigned => 0,
            DataSign::Signed => 1,
        }
    }

    fn is_signed(&self) -> bool {
        matches!(self, DataSign::Signed)
    }
}

/// Maximum length, in bytes, of the per-element `Description` header field
/// (SMPTE RP 268's `Description of Image Element`). Values exceeding this
/// are truncated and raise [`crate::error::DpxWarnings::DESCRIPTION_TRUNCATED`].
pub const DESCRIPTION_SIZE: usize = 32;

/// The `LowData`/`HighData` reference-code union: an integer data code below
/// 32-bit samples, an IEEE-754 float at or above it. Mirrors the original's
/// `union { double d; uint32_t d; float f; }`-style reinterpretation keyed
/// on `BitSize`, without reaching for unsafe punning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReferenceDataCode(u32);

impl ReferenceDataCode {
    pub const UNDEFINED: ReferenceDataCode = ReferenceDataCode(u32::MAX);

    fn as_f32(&self, bit_size: u8) -> f32 {
        if bit_size >= 32 {
            f32::from_bits(self.0)
        } else {
            self.0 as f32
        }
    }

    fn from_f32(value: f32, bit_size: u8) -> Self {
        if bit_size >= 32 {
            ReferenceDataCode(value.to_bits())
        } else {
            ReferenceDataCode((value + 0.5) as u32)
        }
    }
}

/// The subset of an image element's DPX header fields this codec cares
/// about. A real file parser owns the full header layout; this is the
/// slice the codec reads and writes.
#[derive(Clone, Debug)]
pub struct ImageElementHeader {
    pub data_sign: DataSign,
    pub descriptor: Option<Descriptor>,
    /// Transfer characteristic code. Opaque to this codec (colour-management
    /// interpretation is a non-goal, spec.md §1); carried through unchanged.
    pub transfer: u8,
    /// Colorimetric characteristic code. Opaque, same rationale as `transfer`.
    pub colorimetric: u8,
    pub bit_size: Option<u8>,
    pub packing: PackingMethod,
    pub rle: bool,
    pub data_offset: Option<u32>,
    /// Bytes of zero padding written after each row, beyond the packed
    /// sample data (converted to whole 32-bit words; see DESIGN.md).
    pub end_of_line_padding: u32,
    /// Count of 32-bit zero words written once after the final row
    /// (not a byte count; see DESIGN.md).
    pub end_of_image_padding: u32,
    pub description: Option<String>,
    reference_low_data: ReferenceDataCode,
    pub reference_low_quantity: f32,
    reference_high_data: ReferenceDataCode,
    pub reference_high_quantity: f32,
}

impl Default for ImageElementHeader {
    fn default() -> Self {
        ImageElementHeader {
            data_sign: DataSign::Unsigned,
            descriptor: None,
            transfer: 0,
            colorimetric: 0,
            bit_size: None,
            packing: PackingMethod::Packed,
            rle: false,
            data_offset: None,
            end_of_line_padding: 0,
            end_of_image_padding: 0,
            description: None,
            reference_low_data: ReferenceDataCode::UNDEFINED,
            reference_low_quantity: 0.0,
            reference_high_data: ReferenceDataCode::UNDEFINED,
            reference_high_quantity: 0.0,
        }
    }
}

/// The file-level geometry fields that determine an element's pixel
/// dimensions and datum layout direction.
#[derive(Copy, Clone, Debug)]
pub struct FileGeometry {
    pub pixels_per_line: u32,
    pub lines_per_element: u32,
    /// Raw `DatumMappingDirection` header field: 0 means right-to-left.
    pub datum_mapping_direction: u32,
    /// `ChromaSubsampling`: 4 bits of colour-difference siting per image
    /// element, indexed by `ie_index`. Shared across every element of a
    /// file, which is why it lives on the file-level geometry rather than
    /// the per-element header.
    pub chroma_subsampling: u32,
}

/// Runtime state for one image element. `S` is the seekable byte stream it
/// reads/writes its pixel region of; `M` coordinates RLE write ordering
/// across the file's image elements.
pub struct ImageElement<S, M> {
    ie_index: u8,
    header: ImageElementHeader,
    geometry: FileGeometry,
    width: u32,
    height: u32,
    is_h_subsampled: bool,
    is_v_subsampled: bool,
    direction: MappingDirection,
    byte_swap: bool,
    open_for_read: bool,
    open_for_write: bool,
    header_locked: bool,
    poisoned: bool,
    previous_row: Option<u32>,
    previous_file_offset: u64,
    warnings: WarningLog,
    stream: S,
    file_map: M,
}

impl<S: ByteStream, M: FileMap> ImageElement<S, M> {
    pub fn new(ie_index: u8, header: ImageElementHeader, geometry: FileGeometry, stream: S, file_map: M) -> Self {
        let mut element = ImageElement {
            ie_index,
            header,
            geometry,
            width: 0,
            height: 0,
            is_h_subsampled: false,
            is_v_subsampled: false,
            direction: MappingDirection::Ltr,
            byte_swap: false,
            open_for_read: false,
            open_for_write: false,
            header_locked: false,
            poisoned: false,
            previous_row: None,
            previous_file_offset: 0,
            warnings: WarningLog::default(),
            stream,
            file_map,
        };
        element.compute_width_and_height();
        element
    }

    fn compute_width_and_height(&mut self) {
        let descriptor = self.header.descriptor.unwrap_or(Descriptor::Undefined);
        self.is_h_subsampled = descriptor.is_h_subsampled();
        self.is_v_subsampled = descriptor.is_v_subsampled();
        self.width = self.geometry.pixels_per_line / if self.is_h_subsampled { 2 } else { 1 };
        self.height = self.geometry.lines_per_element / if self.is_v_subsampled { 2 } else { 1 };
    }

    fn check_not_poisoned(&self) -> DpxResult<()> {
        if self.poisoned {
            Err(DpxCodecError::Poisoned)
        } else {
            Ok(())
        }
    }

    pub fn open_for_reading(&mut self, byte_swap: bool) -> DpxResult<()> {
        self.compute_width_and_height();
        self.byte_swap = byte_swap;
        self.direction = MappingDirection::from_header_field(self.geometry.datum_mapping_direction);
        self.open_for_read = true;
        self.open_for_write = false;
        self.header_locked = true;
        self.previous_row = None;
        Ok(())
    }

    pub fn open_for_writing(&mut self, byte_swap: bool) -> DpxResult<()> {
        if self.header.descriptor.is_none() || self.header.bit_size.is_none() {
            return Err(DpxCodecError::UndefinedForWrite);
        }
        self.compute_width_and_height();
        self.byte_swap = byte_swap;
        self.direction = MappingDirection::from_header_field(self.geometry.datum_mapping_direction);
        self.open_for_write = true;
        self.open_for_read = false;
        self.header_locked = true;
        self.previous_row = None;
        Ok(())
    }

    pub fn lock_header(&mut self) {
        self.header_locked = true;
    }

    pub fn unlock_header(&mut self) {
        self.header_locked = false;
    }

    /// Reclaims the underlying stream, e.g. to hand it to the next element
    /// sharing the same file or to close it. Consumes the element.
    pub fn into_stream(self) -> S {
        self.stream
    }

    pub fn datum_labels(&self) -> Vec<DatumLabel> {
        self.header.descriptor.unwrap_or(Descriptor::Undefined).datum_labels()
    }

    pub fn num_components(&self) -> usize {
        self.datum_labels().len()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn warnings(&self) -> WarningLog {
        self.warnings
    }

    pub fn reset_warnings(&mut self) {
        self.warnings.reset();
    }

    pub fn header(&self) -> &ImageElementHeader {
        &self.header
    }

    /// Bytes of this element's pixel data actually occupied in the stream so
    /// far: for RLE, the current stream position minus the data offset,
    /// rounded up to a 32-bit word, plus `end_of_image_padding` words (4
    /// bytes each); for non-RLE, the full `row_size_in_bytes(true) * height`
    /// plus the same padding. `EndOfImagePadding` is a count of 32-bit
    /// words, not bytes (spec.md §3), unlike `EndOfLinePadding`, which is
    /// already in bytes. Mirrors `HdrDpxImageElement::BytesUsed`.
    pub fn bytes_used(&mut self) -> DpxResult<u32> {
        if self.header.rle {
            let data_offset = self.header.data_offset.ok_or(DpxCodecError::MissingRleOffset)?;
            let pos = self.stream.position()? as u32;
            Ok((pos.wrapping_sub(data_offset) + 3) / 4 * 4 + self.header.end_of_image_padding * 4)
        } else {
            Ok(self.image_data_size_in_bytes())
        }
    }

    /// Total pixel-data region size for a fully written, non-RLE element:
    /// `row_size_in_bytes(true) * height + end_of_image_padding * 4`.
    /// Mirrors `HdrDpxImageElement::GetImageDataSizeInBytes`.
    pub fn image_data_size_in_bytes(&self) -> u32 {
        self.row_size_in_bytes(true) * self.height + self.header.end_of_image_padding * 4
    }

    /// Replaces this element's header wholesale (e.g. when duplicating an
    /// element's format onto another), then re-applies this element's own
    /// colour-difference siting onto the shared geometry field, mirroring
    /// `HdrDpxImageElement::CopyHeaderFrom`.
    pub fn copy_header_from(&mut self, other: &ImageElementHeader) {
        let siting = self.color_difference_siting();
        self.header = other.clone();
        self.set_color_difference_siting(siting);
        self.compute_width_and_height();
    }

    /// `ColorDifferenceSiting`: 4 bits of `FileGeometry::chroma_subsampling`
    /// indexed by this element's position in the file.
    pub fn color_difference_siting(&self) -> u8 {
        ((self.geometry.chroma_subsampling >> (4 * self.ie_index as u32)) & 0xf) as u8
    }

    pub fn set_color_difference_siting(&mut self, value: u8) {
        if self.header_locked {
            self.warnings.raise(crate::error::DpxWarnings::HEADER_LOCKED);
            return;
        }
        let shift = 4 * self.ie_index as u32;
        self.geometry.chroma_subsampling &= !(0xfu32 << shift);
        self.geometry.chroma_subsampling |= (value as u32 & 0xf) << shift;
    }

    pub fn data_sign(&self) -> DataSign {
        self.header.data_sign
    }

    pub fn set_data_sign(&mut self, value: DataSign) {
        self.set_header(|h| h.data_sign = value);
    }

    pub fn descriptor(&self) -> Option<Descriptor> {
        self.header.descriptor
    }

    pub fn set_descriptor(&mut self, value: Descriptor) {
        self.set_header(|h| h.descriptor = Some(value));
    }

    pub fn bit_size(&self) -> Option<u8> {
        self.header.bit_size
    }

    pub fn packing(&self) -> PackingMethod {
        self.header.packing
    }

    pub fn set_packing(&mut self, value: PackingMethod) {
        self.set_header(|h| h.packing = value);
    }

    /// `Encoding`: `true` is RLE, `false` is none.
    pub fn encoding(&self) -> bool {
        self.header.rle
    }

    pub fn set_encoding(&mut self, rle: bool) {
        self.set_header(|h| h.rle = rle);
    }

    pub fn data_offset(&self) -> Option<u32> {
        self.header.data_offset
    }

    pub fn set_data_offset(&mut self, value: u32) {
        self.set_header(|h| h.data_offset = Some(value));
    }

    pub fn end_of_line_padding(&self) -> u32 {
        self.header.end_of_line_padding
    }

    pub fn set_end_of_line_padding(&mut self, value: u32) {
        self.set_header(|h| h.end_of_line_padding = value);
    }

    pub fn end_of_image_padding(&self) -> u32 {
        self.header.end_of_image_padding
    }

    pub fn set_end_of_image_padding(&mut self, value: u32) {
        self.set_header(|h| h.end_of_image_padding = value);
    }

    pub fn transfer(&self) -> u8 {
        self.header.transfer
    }

    pub fn set_transfer(&mut self, value: u8) {
        self.set_header(|h| h.transfer = value);
    }

    pub fn colorimetric(&self) -> u8 {
        self.header.colorimetric
    }

    pub fn set_colorimetric(&mut self, value: u8) {
        self.set_header(|h| h.colorimetric = value);
    }

    /// Sets `BitSize`. Crossing the 16-bit/32-bit integer-vs-float boundary
    /// invalidates the previously recorded reference low/high data codes
    /// (their union interpretation depends on which side of that boundary
    /// `BitSize` is on), matching the original's informational-log-and-reset
    /// behavior in its `SetHeader(HdrDpxFieldsBitDepth, ...)`.
    pub fn set_bit_size(&mut self, value: u8) {
        if self.header_locked {
            self.warnings.raise(crate::error::DpxWarnings::HEADER_LOCKED);
            return;
        }
        let old = self.header.bit_size.unwrap_or(0);
        let crosses_float_boundary = (old <= 16 && (value == 32 || value == 64)) || ((old == 32 || old == 64) && value <= 16);
        if crosses_float_boundary {
            log::info!("image element {}: changing bit depth invalidates previous low/high code values", self.ie_index);
            self.header.reference_low_data = ReferenceDataCode::UNDEFINED;
            self.header.reference_high_data = ReferenceDataCode::UNDEFINED;
        }
        self.header.bit_size = Some(value);
    }

    pub fn reference_low_data(&self) -> f32 {
        self.header.reference_low_data.as_f32(self.header.bit_size.unwrap_or(8))
    }

    pub fn set_reference_low_data(&mut self, value: f32) {
        let bit_size = self.header.bit_size.unwrap_or(8);
        self.set_header(|h| h.reference_low_data = ReferenceDataCode::from_f32(value, bit_size));
    }

    pub fn reference_high_data(&self) -> f32 {
        self.header.reference_high_data.as_f32(self.header.bit_size.unwrap_or(8))
    }

    pub fn set_reference_high_data(&mut self, value: f32) {
        let bit_size = self.header.bit_size.unwrap_or(8);
        self.set_header(|h| h.reference_high_data = ReferenceDataCode::from_f32(value, bit_size));
    }

    /// Sets the `Description` field, truncating to [`DESCRIPTION_SIZE`]
    /// bytes and raising `DESCRIPTION_TRUNCATED` if the supplied string
    /// doesn't fit, matching `CopyStringN`'s truncate-and-warn contract.
    pub fn set_description(&mut self, value: &str) {
        if self.header_locked {
            self.warnings.raise(crate::error::DpxWarnings::HEADER_LOCKED);
            return;
        }
        if value.len() > DESCRIPTION_SIZE {
            self.warnings.raise(crate::error::DpxWarnings::DESCRIPTION_TRUNCATED);
            let truncated: String = value.chars().take(DESCRIPTION_SIZE).collect();
            self.header.description = Some(truncated);
        } else {
            self.header.description = Some(value.to_string());
        }
    }

    pub fn description(&self) -> Option<&str> {
        self.header.description.as_deref()
    }

    /// Applies a header mutation unless the header is locked by an open
    /// element, in which case a `HEADER_LOCKED` warning is raised and the
    /// mutation is refused. The original C++ is inconsistent about whether
    /// a locked mutator still applies its write after warning; this codec
    /// always refuses (see DESIGN.md).
    pub fn set_header(&mut self, mutate: impl FnOnce(&mut ImageElementHeader)) {
        if self.header_locked {
            self.warnings.raise(crate::error::DpxWarnings::HEADER_LOCKED);
            return;
        }
        mutate(&mut self.header);
    }

    /// Bytes per output row. `include_padding` adds `end_of_line_padding`,
    /// matching `GetRowSizeInBytes(bool)` in the original.
    pub fn row_size_in_bytes(&self, include_padding: bool) -> u32 {
        let num_c = self.num_components() as u32;
        let bit_size = self.header.bit_size.unwrap_or(8);
        let idw_per_line: u32 = if bit_size == 64 {
            2 * num_c * self.width
        } else if bit_size == 32 {
            num_c * self.width
        } else if bit_size == 16 {
            (num_c * self.width).div_ceil(2)
        } else if self.header.packing == PackingMethod::Packed || bit_size == 8 {
            (num_c * self.width * bit_size as u32).div_ceil(8).div_ceil(4)
        } else if bit_size == 10 {
            (num_c * self.width).div_ceil(3)
        } else {
            (num_c * self.width).div_ceil(2)
        };
        let padding_words = if include_padding { self.header.end_of_line_padding / 4 } else { 0 };
        (idw_per_line + padding_words) * 4
    }

    pub fn row_size_in_datums(&self) -> u32 {
        self.width * self.num_components() as u32
    }

    /// Byte offset of `row` within the stream, for non-RLE elements:
    /// `data_offset + row * row_size_in_bytes(true)`. RLE elements have no
    /// fixed per-row offset (their rows are only reachable by sequential
    /// decode/encode), so this is meaningless for them; callers still get a
    /// `MissingRleOffset` error rather than a silently wrong answer if
    /// `data_offset` hasn't been set yet.
    pub fn offset_for_row(&self, row: u32) -> DpxResult<u64> {
        let data_offset = self.header.data_offset.ok_or(DpxCodecError::MissingRleOffset)?;
        Ok(data_offset as u64 + self.row_size_in_bytes(true) as u64 * row as u64)
    }

    fn codec_params(&self) -> RowCodecParams {
        RowCodecParams {
            width: self.width,
            num_components: self.num_components(),
            bit_size: self.header.bit_size.unwrap_or(8),
            is_signed: self.header.data_sign.is_signed(),
            direction: self.direction,
            packing: self.header.packing,
            rle: self.header.rle,
        }
    }

    fn write_word(&mut self, word: u32) -> DpxResult<()> {
        let word = if self.byte_swap { word.swap_bytes() } else { word };
        self.stream.write_all_at_cursor(&word.to_be_bytes())?;
        Ok(())
    }

    /// Decodes row `row` into `out`. `out` must match the element's sample
    /// kind and hold exactly `width * num_components` samples.
    pub fn read_row(&mut self, row: u32, out: &mut RowBufferMut) -> DpxResult<()> {
        self.check_not_poisoned()?;
        if !self.open_for_read {
            return Err(DpxCodecError::Uninitialized);
        }
        let result = self.read_row_inner(row, out);
        if let Err(ref e) = result {
            log::error!("image element {}: read_row({row}) failed, poisoning element: {e}", self.ie_index);
            self.poisoned = true;
        }
        result
    }

    fn read_row_inner(&mut self, row: u32, out: &mut RowBufferMut) -> DpxResult<()> {
        if self.header.rle {
            if row == 0 {
                let offset = self.header.data_offset.ok_or(DpxCodecError::MissingRleOffset)?;
                self.stream.seek_to(offset as u64)?;
            } else {
                match self.previous_row {
                    Some(prev) if row == prev + 1 => {
                        self.stream.seek_to(self.previous_file_offset)?;
                    }
                    _ => return Err(DpxCodecError::OutOfOrderRow),
                }
            }
        } else {
            let offset = self.offset_for_row(row)?;
            self.stream.seek_to(offset)?;
        }
        self.previous_row = Some(row);
        let params = self.codec_params();
        let byte_swap = self.byte_swap;
        let stream = &mut self.stream;
        row_codec::decode_row(
            &params,
            || {
                let mut buf = [0u8; 4];
                stream.read_exact_at_cursor(&mut buf)?;
                let word = u32::from_be_bytes(buf);
                Ok(if byte_swap { word.swap_bytes() } else { word })
            },
            out,
            &mut self.warnings,
        )?;
        self.previous_file_offset = self.stream.position()?;
        Ok(())
    }

    /// Encodes row `row` from `data` and writes it to the stream. Rows must
    /// be written in ascending order when RLE encoding is active.
    pub fn write_row(&mut self, row: u32, data: RowBuffer) -> DpxResult<()> {
        self.check_not_poisoned()?;
        if !self.open_for_write {
            return Err(DpxCodecError::Uninitialized);
        }
        let result = self.write_row_inner(row, data);
        if let Err(ref e) = result {
            log::error!("image element {}: write_row({row}) failed, poisoning element: {e}", self.ie_index);
            self.poisoned = true;
        }
        result
    }

    fn write_row_inner(&mut self, row: u32, data: RowBuffer) -> DpxResult<()> {
        if self.header.rle && self.file_map.active_rle_index() != Some(self.ie_index) {
            log::warn!(
                "image element {}: writing RLE row out of file-map turn",
                self.ie_index
            );
        }

        if self.header.rle {
            if row == 0 {
                if self.header.data_offset.is_none() {
                    let offsets = self.file_map.rle_ie_data_offsets();
                    let found = offsets.get(self.ie_index as usize).copied().flatten();
                    self.header.data_offset = Some(found.ok_or(DpxCodecError::MissingRleOffset)?);
                }
                let offset = self.header.data_offset.unwrap();
                self.stream.seek_to(offset as u64)?;
            } else {
                match self.previous_row {
                    Some(prev) if row == prev + 1 => {
                        self.stream.seek_to(self.previous_file_offset)?;
                    }
                    _ => return Err(DpxCodecError::OutOfOrderRow),
                }
            }
            self.previous_row = Some(row);
        } else {
            let offset = self.offset_for_row(row)?;
            self.stream.seek_to(offset)?;
        }

        let params = self.codec_params();
        let byte_swap = self.byte_swap;
        let stream = &mut self.stream;
        row_codec::encode_row(&params, data, |word| {
            let word = if byte_swap { word.swap_bytes() } else { word };
            stream.write_all_at_cursor(&word.to_be_bytes())?;
            Ok(())
        })?;

        self.previous_file_offset = self.stream.position()?;

        if row == self.height - 1 {
            // EndOfImagePadding is already a count of 32-bit words (spec.md §3/§6).
            for _ in 0..self.header.end_of_image_padding {
                self.write_word(0)?;
            }
            self.previous_file_offset = self.stream.position()?;
            if self.header.rle {
                let end = self.previous_file_offset as u32;
                self.file_map.edit_region_end(self.ie_index, end);
                self.file_map.advance_rle_ie();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::SingleElementFileMap;
    use std::io::Cursor;

    fn rgb_8bit_element(width: u32, height: u32) -> ImageElement<Cursor<Vec<u8>>, SingleElementFileMap> {
        let header = ImageElementHeader {
            descriptor: Some(Descriptor::Rgb),
            bit_size: Some(8),
            data_offset: Some(0),
            ..Default::default()
        };
        let geometry = FileGeometry {
            pixels_per_line: width,
            lines_per_element: height,
            datum_mapping_direction: 1,
            chroma_subsampling: 0,
        };
        let capacity = 4096;
        let stream = Cursor::new(vec![0u8; capacity]);
        let file_map = SingleElementFileMap::new(0, Some(0));
        ImageElement::new(0, header, geometry, stream, file_map)
    }

    #[test]
    fn write_then_read_row_round_trips() {
        let mut element = rgb_8bit_element(4, 2);
        element.open_for_writing(false).unwrap();
        let row0: Vec<i32> = (0..12).collect();
        element.write_row(0, RowBuffer::Int(&row0)).unwrap();
        let row1: Vec<i32> = (12..24).collect();
        element.write_row(1, RowBuffer::Int(&row1)).unwrap();

        element.open_for_reading(false).unwrap();
        let mut decoded0 = vec![0i32; 12];
        element.read_row(0, &mut RowBufferMut::Int(&mut decoded0)).unwrap();
        assert_eq!(decoded0, row0);
    }

    #[test]
    fn row_size_in_bytes_matches_8bit_rgb_formula() {
        let element = rgb_8bit_element(4, 2);
        // 3 components * 4 pixels * 8 bits = 96 bits = 12 bytes, rounded up
        // to a 4-byte word boundary -> 12 bytes already aligned.
        assert_eq!(element.row_size_in_bytes(false), 12);
    }

    #[test]
    fn opening_for_write_without_descriptor_fails() {
        let header = ImageElementHeader::default();
        let geometry = FileGeometry {
            pixels_per_line: 4,
            lines_per_element: 2,
            datum_mapping_direction: 1,
            chroma_subsampling: 0,
        };
        let mut element = ImageElement::new(
            0,
            header,
            geometry,
            Cursor::new(vec![0u8; 64]),
            SingleElementFileMap::new(0, None),
        );
        assert!(matches!(element.open_for_writing(false), Err(DpxCodecError::UndefinedForWrite)));
    }

    #[test]
    fn locked_header_mutation_is_refused_and_warned() {
        let mut element = rgb_8bit_element(4, 2);
        element.lock_header();
        element.set_header(|h| h.end_of_line_padding = 4);
        assert_eq!(element.header().end_of_line_padding, 0);
        assert!(element.warnings().flags().contains(crate::error::DpxWarnings::HEADER_LOCKED));
    }

    #[test]
    fn out_of_order_rle_row_is_rejected() {
        let mut header = ImageElementHeader {
            descriptor: Some(Descriptor::Rgb),
            bit_size: Some(8),
            data_offset: Some(0),
            rle: true,
            ..Default::default()
        };
        header.rle = true;
        let geometry = FileGeometry {
            pixels_per_line: 4,
            lines_per_element: 3,
            datum_mapping_direction: 1,
            chroma_subsampling: 0,
        };
        let mut element = ImageElement::new(
            0,
            header,
            geometry,
            Cursor::new(vec![0u8; 4096]),
            SingleElementFileMap::new(0, Some(0)),
        );
        element.open_for_writing(false).unwrap();
        let row: Vec<i32> = (0..12).collect();
        // Skipping row 0 and writing row 1 directly must fail.
        assert!(matches!(
            element.write_row(1, RowBuffer::Int(&row)),
            Err(DpxCodecError::OutOfOrderRow)
        ));
    }

    #[test]
    fn reference_data_code_uses_float_union_at_or_above_32_bits() {
        let mut element = rgb_8bit_element(4, 2);
        element.unlock_header();
        element.set_reference_low_data(64.5);
        // Below 32 bits, LowData is an integer code rounded from the float.
        assert_eq!(element.reference_low_data(), 65.0);

        element.set_bit_size(32);
        element.set_reference_high_data(1.5);
        // At or above 32 bits, HighData reinterprets the IEEE-754 bits directly.
        assert_eq!(element.reference_high_data(), 1.5);
    }

    #[test]
    fn crossing_the_float_boundary_invalidates_reference_codes() {
        let mut element = rgb_8bit_element(4, 2);
        element.unlock_header();
        element.set_reference_low_data(10.0);
        element.set_bit_size(32);
        // 8 -> 32 crosses the integer/float boundary; the old 8-bit-encoded
        // code is meaningless as a float bit pattern and must be reset.
        assert_eq!(element.reference_low_data(), f32::from_bits(u32::MAX));
    }

    #[test]
    fn description_longer_than_field_size_is_truncated_with_warning() {
        let mut element = rgb_8bit_element(4, 2);
        element.unlock_header();
        let long = "x".repeat(DESCRIPTION_SIZE + 5);
        element.set_description(&long);
        assert_eq!(element.description().unwrap().len(), DESCRIPTION_SIZE);
        assert!(element.warnings().flags().contains(crate::error::DpxWarnings::DESCRIPTION_TRUNCATED));
    }

    #[test]
    fn color_difference_siting_is_packed_per_element_index() {
        let mut element = rgb_8bit_element(4, 2);
        element.unlock_header();
        element.set_color_difference_siting(0xB);
        assert_eq!(element.color_difference_siting(), 0xB);
        // Only this element's 4-bit slot is touched; the rest of the shared
        // field stays zero.
        assert_eq!(element.geometry.chroma_subsampling, 0xB);
    }

    #[test]
    fn bytes_used_matches_row_size_times_height_for_non_rle() {
        let mut element = rgb_8bit_element(4, 2);
        assert_eq!(element.bytes_used().unwrap(), element.row_size_in_bytes(true) * 2);
    }

    #[test]
    fn offset_for_row_is_linear_in_row_size() {
        let element = rgb_8bit_element(4, 5);
        let base = element.offset_for_row(0).unwrap();
        let stride = element.row_size_in_bytes(true) as u64;
        for r in 0..5u32 {
            assert_eq!(element.offset_for_row(r).unwrap(), base + r as u64 * stride);
        }
    }
}
