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

    src/sample.rs

    The application-level sample kind a row is read into or written from:
    signed/unsigned integers for bit sizes up to 16, `f32` for 32, `f64`
    for 64. Modeled as a tagged enum over borrowed slices rather than three
    parallel read_row/write_row entry points (Design Notes, spec.md §9).
*/

/// Which destination a decoded row is assembled into.
pub enum RowBufferMut<'a> {
    Int(&'a mut [i32]),
    Float(&'a mut [f32]),
    Double(&'a mut [f64]),
}

/// Which source an encoded row is drawn from.
pub enum RowBuffer<'a> {
    Int(&'a [i32]),
    Float(&'a [f32]),
    Double(&'a [f64]),
}

impl RowBufferMut<'_> {
    pub fn len(&self) -> usize {
        match self {
            RowBufferMut::Int(s) => s.len(),
            RowBufferMut::Float(s) => s.len(),
            RowBufferMut::Double(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether this destination kind is legal for the given element bit size.
    pub fn matches_bit_size(&self, bit_size: u8) -> bool {
        match self {
            RowBufferMut::Int(_) => bit_size < 32,
            RowBufferMut::Float(_) => bit_size == 32,
            RowBufferMut::Double(_) => bit_size == 64,
        }
    }
}

impl RowBuffer<'_> {
    pub fn len(&self) -> usize {
        match self {
            RowBuffer::Int(s) => s.len(),
            RowBuffer::Float(s) => s.len(),
            RowBuffer::Double(s) => s.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn matches_bit_size(&self, bit_size: u8) -> bool {
        match self {
            RowBuffer::Int(_) => bit_size < 32,
            RowBuffer::Float(_) => bit_size == 32,
            RowBuffer::Double(_) => bit_size == 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_buffer_matches_only_sub_32_bit_sizes() {
        let mut data = [0i32; 4];
        let buf = RowBufferMut::Int(&mut data);
        assert!(buf.matches_bit_size(8));
        assert!(buf.matches_bit_size(16));
        assert!(!buf.matches_bit_size(32));
        assert!(!buf.matches_bit_size(64));
    }

    #[test]
    fn float_and_double_match_exactly_their_bit_size() {
        let mut f = [0f32; 2];
        let mut d = [0f64; 2];
        assert!(RowBufferMut::Float(&mut f).matches_bit_size(32));
        assert!(!RowBufferMut::Float(&mut f).matches_bit_size(64));
        assert!(RowBufferMut::Double(&mut d).matches_bit_size(64));
        assert!(!RowBufferMut::Double(&mut d).matches_bit_size(32));
    }
}
