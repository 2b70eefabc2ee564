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

    src/stream.rs

    External collaborator contracts (spec.md §6): the seekable byte stream
    an image element reads/writes its region of, and the file map that
    coordinates which RLE element may currently write. Real DPX file
    parsing lives above this crate; what's here is the boundary it must
    satisfy, plus a minimal default `FileMap` for the common case of a
    single RLE element in the file.
*/

use std::io::{Read, Seek, SeekFrom, Write};

/// A seekable byte stream supporting absolute seek, fixed-size read/write,
/// and position query. Blanket-implemented for anything that is
/// `Read + Write + Seek`, so `std::io::Cursor<Vec<u8>>` and `std::fs::File`
/// both satisfy it without adapter code.
pub trait ByteStream {
    fn seek_to(&mut self, pos: u64) -> std::io::Result<()>;
    fn read_exact_at_cursor(&mut self, buf: &mut [u8]) -> std::io::Result<()>;
    fn write_all_at_cursor(&mut self, buf: &[u8]) -> std::io::Result<()>;
    fn position(&mut self) -> std::io::Result<u64>;
}

impl<T: Read + Write + Seek> ByteStream for T {
    fn seek_to(&mut self, pos: u64) -> std::io::Result<()> {
        self.seek(SeekFrom::Start(pos))?;
        Ok(())
    }

    fn read_exact_at_cursor(&mut self, buf: &mut [u8]) -> std::io::Result<()> {
        self.read_exact(buf)
    }

    fn write_all_at_cursor(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.write_all(buf)
    }

    fn position(&mut self) -> std::io::Result<u64> {
        self.stream_position()
    }
}

/// Coordinates RLE write ordering and data-offset discovery across the
/// image elements of one file. Out of scope per spec.md §1 (the
/// multi-image-element file map belongs to the file, not the codec); this
/// trait is the contract the codec depends on.
pub trait FileMap {
    /// The index of the image element currently allowed to write RLE data,
    /// if any.
    fn active_rle_index(&self) -> Option<u8>;
    /// Per-element data offsets discovered for RLE elements so far, indexed
    /// by image-element index; `None` where not yet known.
    fn rle_ie_data_offsets(&self) -> &[Option<u32>];
    /// Record that image element `ie_index`'s RLE region ends at `end_offset`.
    fn edit_region_end(&mut self, ie_index: u8, end_offset: u32);
    /// Advance to the next image element eligible to write RLE data.
    fn advance_rle_ie(&mut self);
}

/// A `FileMap` for the common case of exactly one RLE-encoded image element
/// in the file: it is always the active writer, and nothing advances past
/// it. Supplied so the codec is usable standalone without a full
/// multi-element file parser (SPEC_FULL.md §6).
#[derive(Debug, Clone)]
pub struct SingleElementFileMap {
    ie_index: u8,
    data_offset: Option<u32>,
    region_end: Option<u32>,
}

impl SingleElementFileMap {
    pub fn new(ie_index: u8, data_offset: Option<u32>) -> Self {
        SingleElementFileMap {
            ie_index,
            data_offset,
            region_end: None,
        }
    }

    pub fn region_end(&self) -> Option<u32> {
        self.region_end
    }
}

impl FileMap for SingleElementFileMap {
    fn active_rle_index(&self) -> Option<u8> {
        Some(self.ie_index)
    }

    fn rle_ie_data_offsets(&self) -> &[Option<u32>] {
        std::slice::from_ref(&self.data_offset)
    }

    fn edit_region_end(&mut self, ie_index: u8, end_offset: u32) {
        if ie_index == self.ie_index {
            self.region_end = Some(end_offset);
        }
    }

    fn advance_rle_ie(&mut self) {
        // Only one element; nothing to advance to.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn cursor_satisfies_byte_stream() {
        let mut cursor = Cursor::new(vec![0u8; 16]);
        cursor.write_all_at_cursor(&[1, 2, 3, 4]).unwrap();
        cursor.seek_to(0).unwrap();
        let mut buf = [0u8; 4];
        cursor.read_exact_at_cursor(&mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(cursor.position().unwrap(), 4);
    }

    #[test]
    fn single_element_file_map_is_always_active() {
        let mut map = SingleElementFileMap::new(0, Some(2048));
        assert_eq!(map.active_rle_index(), Some(0));
        assert_eq!(map.rle_ie_data_offsets(), &[Some(2048)]);
        map.edit_region_end(0, 4096);
        assert_eq!(map.region_end(), Some(4096));
        map.advance_rle_ie();
        assert_eq!(map.active_rle_index(), Some(0));
    }
}
