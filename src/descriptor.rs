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

    src/descriptor.rs

    The descriptor-to-component-list mapping table. Pure and total in one
    direction (`Descriptor::datum_labels`); the inverse
    (`DatumLabel::to_descriptor`) returns `None` for component lists that
    don't correspond to a unique descriptor.
*/

use strum::EnumIter;

/// An ordered component identity within a pixel.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter)]
pub enum DatumLabel {
    R,
    G,
    B,
    A,
    Y,
    Y2,
    Cb,
    Cr,
    C,
    Z,
    Composite,
    A2,
    Unspec1,
    Unspec2,
    Unspec3,
    Unspec4,
    Unspec5,
    Unspec6,
    Unspec7,
    Unspec8,
}

/// A DPX image-element descriptor code: identifies which components an
/// element carries and in what order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Descriptor {
    UserDefined,
    Undefined,
    R,
    G,
    B,
    A,
    Y,
    CbCr,
    Z,
    Composite,
    Cb,
    Cr,
    Rgb268_1,
    Rgba268_1,
    Abgr268_1,
    Bgr,
    Bgra,
    Argb,
    Rgb,
    Rgba,
    Abgr,
    CbYCrY,
    CbYACrYA,
    CbYCr,
    CbYCrA,
    CYY,
    CYAYA,
    Generic2,
    Generic3,
    Generic4,
    Generic5,
    Generic6,
    Generic7,
    Generic8,
}

use DatumLabel::*;

impl Descriptor {
    /// Total, pure mapping from descriptor to an ordered component list.
    /// Unknown/undefined descriptors collapse to a single `Unspec1`.
    pub fn datum_labels(&self) -> Vec<DatumLabel> {
        match self {
            Descriptor::UserDefined | Descriptor::Undefined => vec![Unspec1],
            Descriptor::R => vec![R],
            Descriptor::G => vec![G],
            Descriptor::B => vec![B],
            Descriptor::A => vec![A],
            Descriptor::Y => vec![Y],
            Descriptor::CbCr => vec![Cb, Cr],
            Descriptor::Z => vec![Z],
            Descriptor::Composite => vec![DatumLabel::Composite],
            Descriptor::Cb => vec![Cb],
            Descriptor::Cr => vec![Cr],
            Descriptor::Rgb268_1 | Descriptor::Rgb => vec![R, G, B],
            Descriptor::Rgba268_1 | Descriptor::Rgba => vec![R, G, B, A],
            Descriptor::Abgr268_1 | Descriptor::Abgr => vec![A, B, G, R],
            Descriptor::Bgr => vec![B, G, R],
            Descriptor::Bgra => vec![B, G, R, A],
            Descriptor::Argb => vec![A, R, G, B],
            Descriptor::CbYCrY => vec![Cb, Y, Cr, Y2],
            Descriptor::CbYACrYA => vec![Cb, Y, A, Cr, Y2, A2],
            Descriptor::CbYCr => vec![Cb, Y, Cr],
            Descriptor::CbYCrA => vec![Cb, Y, Cr, A],
            Descriptor::CYY => vec![C, Y, Y2],
            Descriptor::CYAYA => vec![C, Y, A, Y2, A2],
            Descriptor::Generic2 => vec![Unspec1, Unspec2],
            Descriptor::Generic3 => vec![Unspec1, Unspec2, Unspec3],
            Descriptor::Generic4 => vec![Unspec1, Unspec2, Unspec3, Unspec4],
            Descriptor::Generic5 => vec![Unspec1, Unspec2, Unspec3, Unspec4, Unspec5],
            Descriptor::Generic6 => vec![Unspec1, Unspec2, Unspec3, Unspec4, Unspec5, Unspec6],
            Descriptor::Generic7 => vec![Unspec1, Unspec2, Unspec3, Unspec4, Unspec5, Unspec6, Unspec7],
            Descriptor::Generic8 => vec![
                Unspec1, Unspec2, Unspec3, Unspec4, Unspec5, Unspec6, Unspec7, Unspec8,
            ],
        }
    }

    pub fn num_components(&self) -> usize {
        self.datum_labels().len()
    }

    /// An element is horizontally subsampled if its descriptor carries
    /// chroma without carrying it at every luma sample.
    pub fn is_h_subsampled(&self) -> bool {
        matches!(
            self,
            Descriptor::Cb
                | Descriptor::Cr
                | Descriptor::CbCr
                | Descriptor::CbYCrY
                | Descriptor::CbYACrYA
                | Descriptor::CYY
                | Descriptor::CYAYA
        )
    }

    /// An element is vertically subsampled only when it carries chroma with
    /// no luma at all (Cb-only or Cr-only planes).
    pub fn is_v_subsampled(&self) -> bool {
        matches!(self, Descriptor::Cb | Descriptor::Cr)
    }
}

impl DatumLabel {
    /// Inverse of [`Descriptor::datum_labels`]. Returns `None` when the list
    /// does not correspond to any known descriptor (the C++ original's
    /// sentinel `0xFF`), including cases the forward direction collapses
    /// (e.g. several `Generic`/undefined descriptors map to the same
    /// `Unspec1` singleton).
    pub fn to_descriptor(labels: &[DatumLabel]) -> Option<Descriptor> {
        use DatumLabel::*;
        Some(match labels {
            [R] => Descriptor::R,
            [G] => Descriptor::G,
            [B] => Descriptor::B,
            [A] => Descriptor::A,
            [Y] => Descriptor::Y,
            [Z] => Descriptor::Z,
            [DatumLabel::Composite] => Descriptor::Composite,
            [Cb] => Descriptor::Cb,
            [Cr] => Descriptor::Cr,
            [Cb, Cr] => Descriptor::CbCr,
            [Unspec1, Unspec2] => Descriptor::Generic2,
            [B, G, R] => Descriptor::Bgr,
            [R, G, B] => Descriptor::Rgb,
            [Cb, Y, Cr] => Descriptor::CbYCr,
            [C, Y, Y2] => Descriptor::CYY,
            [Unspec1, Unspec2, Unspec3] => Descriptor::Generic3,
            [B, G, R, A] => Descriptor::Bgra,
            [A, R, G, B] => Descriptor::Argb,
            [R, G, B, A] => Descriptor::Rgba,
            [A, B, G, R] => Descriptor::Abgr,
            [Cb, Y, Cr, Y2] => Descriptor::CbYCrY,
            [Cb, Y, Cr, A] => Descriptor::CbYCrA,
            [Unspec1, Unspec2, Unspec3, Unspec4] => Descriptor::Generic4,
            [C, Y, A, Y2, A2] => Descriptor::CYAYA,
            [Unspec1, Unspec2, Unspec3, Unspec4, Unspec5] => Descriptor::Generic5,
            [Cb, Y, A, Cr, Y2, A2] => Descriptor::CbYACrYA,
            [Unspec1, Unspec2, Unspec3, Unspec4, Unspec5, Unspec6] => Descriptor::Generic6,
            [Unspec1, Unspec2, Unspec3, Unspec4, Unspec5, Unspec6, Unspec7] => Descriptor::Generic7,
            [Unspec1, Unspec2, Unspec3, Unspec4, Unspec5, Unspec6, Unspec7, Unspec8] => Descriptor::Generic8,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    const CANONICAL: &[Descriptor] = &[
        Descriptor::R,
        Descriptor::G,
        Descriptor::B,
        Descriptor::A,
        Descriptor::Y,
        Descriptor::Z,
        Descriptor::Composite,
        Descriptor::Cb,
        Descriptor::Cr,
        Descriptor::CbCr,
        Descriptor::Bgr,
        Descriptor::Rgb,
        Descriptor::CbYCr,
        Descriptor::CYY,
        Descriptor::Bgra,
        Descriptor::Argb,
        Descriptor::Rgba,
        Descriptor::Abgr,
        Descriptor::CbYCrY,
        Descriptor::CbYCrA,
        Descriptor::CYAYA,
        Descriptor::CbYACrYA,
        Descriptor::Generic2,
        Descriptor::Generic3,
        Descriptor::Generic4,
        Descriptor::Generic5,
        Descriptor::Generic6,
        Descriptor::Generic7,
        Descriptor::Generic8,
    ];

    #[test]
    fn descriptor_inverse_round_trips_for_canonical_descriptors() {
        for d in CANONICAL {
            let labels = d.datum_labels();
            assert_eq!(DatumLabel::to_descriptor(&labels), Some(*d), "descriptor {d:?} did not round-trip");
        }
    }

    #[test]
    fn unspec_collapse_is_not_a_strict_inverse() {
        // Rgb268_1 and Rgba268_1/Abgr268_1 collapse onto their plain
        // counterparts; Undefined/UserDefined collapse onto a singleton
        // Unspec1 list that maps back to Generic-with-one-component, which
        // doesn't exist as a descriptor, so the inverse is None. This is
        // the intentional, documented non-bijection from spec.md §4.2.
        assert_eq!(DatumLabel::to_descriptor(&[DatumLabel::Unspec1]), None);
        assert_eq!(
            Descriptor::Undefined.datum_labels(),
            Descriptor::UserDefined.datum_labels()
        );
    }

    #[test]
    fn unknown_component_list_maps_to_none() {
        assert_eq!(DatumLabel::to_descriptor(&[DatumLabel::Z, DatumLabel::A]), None);
        assert_eq!(DatumLabel::to_descriptor(&[]), None);
    }

    #[test]
    fn subsampling_status_matches_descriptor_rules() {
        assert!(Descriptor::Cb.is_h_subsampled() && Descriptor::Cb.is_v_subsampled());
        assert!(Descriptor::Cr.is_h_subsampled() && Descriptor::Cr.is_v_subsampled());
        assert!(Descriptor::CbCr.is_h_subsampled() && !Descriptor::CbCr.is_v_subsampled());
        assert!(Descriptor::CbYCrY.is_h_subsampled() && !Descriptor::CbYCrY.is_v_subsampled());
        assert!(!Descriptor::Rgb.is_h_subsampled() && !Descriptor::Rgb.is_v_subsampled());
    }

    #[test]
    fn datum_label_enum_iter_covers_all_variants() {
        // Sanity check the strum derive is wired correctly.
        assert_eq!(DatumLabel::iter().count(), 20);
    }
}
