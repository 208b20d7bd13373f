//! Range algebra
//!
//! Collision classification, intersection and difference of two addresses.
//! All operations look at the primary range of each address; siblings of a
//! multi-range address are not consulted.

use crate::address::Address;

/// How two ranges relate to each other.
///
/// Ordered by specificity: `No < Partly < Inside < Equal`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Collision {
    /// Disjoint, or on different sheets
    No,
    /// Overlapping, neither contains the other
    Partly,
    /// The argument lies completely inside the receiver
    Inside,
    /// Identical bounds
    Equal,
}

impl Address {
    /// Classify how `other` relates to this range.
    ///
    /// Ranges qualified with different sheets never collide. `Inside` is
    /// directional: `A1:C3` collides with `B2` as `Inside`, while `B2`
    /// collides with `A1:C3` as `Partly`.
    ///
    /// # Examples
    /// ```
    /// use sheetref_core::{Address, Collision};
    ///
    /// let a = Address::parse("A1:C3").unwrap();
    /// let b = Address::parse("B2").unwrap();
    /// assert_eq!(a.collide(&b), Collision::Inside);
    /// assert_eq!(b.collide(&a), Collision::Partly);
    /// ```
    pub fn collide(&self, other: &Address) -> Collision {
        if !self.same_sheet(other) {
            return Collision::No;
        }
        self.collide_ignoring_sheet(other)
    }

    /// [`Address::collide`] without comparing sheet qualifiers
    pub fn collide_ignoring_sheet(&self, other: &Address) -> Collision {
        if !self.has_bounds() || !other.has_bounds() {
            return Collision::No;
        }

        if other.to_row() < self.from_row()
            || other.from_row() > self.to_row()
            || other.to_col() < self.from_col()
            || other.from_col() > self.to_col()
        {
            return Collision::No;
        }

        if self.from_row() == other.from_row()
            && self.from_col() == other.from_col()
            && self.to_row() == other.to_row()
            && self.to_col() == other.to_col()
        {
            return Collision::Equal;
        }

        if other.from_row() >= self.from_row()
            && other.to_row() <= self.to_row()
            && other.from_col() >= self.from_col()
            && other.to_col() <= self.to_col()
        {
            return Collision::Inside;
        }

        Collision::Partly
    }

    /// Whether the two ranges share at least one cell
    pub fn overlaps(&self, other: &Address) -> bool {
        self.collide(other) != Collision::No
    }

    /// The overlapping part of two ranges, on this range's sheet
    pub fn intersect(&self, other: &Address) -> Option<Address> {
        if self.collide(other) == Collision::No {
            return None;
        }

        let from_row = self.from_row().max(other.from_row());
        let from_col = self.from_col().max(other.from_col());
        let to_row = self.to_row().min(other.to_row());
        let to_col = self.to_col().min(other.to_col());
        if from_row > to_row || from_col > to_col {
            return None;
        }
        Some(self.fragment(from_row, from_col, to_row, to_col))
    }

    /// The parts of this range not covered by `other`.
    ///
    /// Returns up to four disjoint strips as one multi-range address, in the
    /// order top, left, right, bottom. Returns `None` when the ranges are
    /// identical, disjoint, or `other` covers this range completely.
    ///
    /// # Examples
    /// ```
    /// use sheetref_core::Address;
    ///
    /// let a = Address::parse("A1:D4").unwrap();
    /// let b = Address::parse("B2:C3").unwrap();
    /// let ring = a.intersect_reversed(&b).unwrap();
    /// assert_eq!(ring.to_text(), "A1:D1,A2:A3,D2:D3,A4:D4");
    /// ```
    pub fn intersect_reversed(&self, other: &Address) -> Option<Address> {
        match self.collide(other) {
            Collision::No | Collision::Equal => return None,
            _ => {}
        }

        let band_from = self.from_row().max(other.from_row());
        let band_to = self.to_row().min(other.to_row());
        let mut parts = Vec::with_capacity(4);

        // Top
        if self.from_row() < other.from_row() {
            parts.push(self.fragment(
                self.from_row(),
                self.from_col(),
                other.from_row() - 1,
                self.to_col(),
            ));
        }
        // Left
        if self.from_col() < other.from_col() {
            parts.push(self.fragment(band_from, self.from_col(), band_to, other.from_col() - 1));
        }
        // Right
        if self.to_col() > other.to_col() {
            parts.push(self.fragment(band_from, other.to_col() + 1, band_to, self.to_col()));
        }
        // Bottom
        if self.to_row() > other.to_row() {
            parts.push(self.fragment(
                other.to_row() + 1,
                self.from_col(),
                self.to_row(),
                self.to_col(),
            ));
        }

        Address::from_components(parts)
    }

    /// True if either range spans whole rows or whole columns that overlap
    /// the other range
    pub fn collide_full_row_or_column(&self, other: &Address) -> bool {
        if !self.same_sheet(other) || !self.has_bounds() || !other.has_bounds() {
            return false;
        }
        let rows_overlap = self.from_row() <= other.to_row() && other.from_row() <= self.to_row();
        let cols_overlap = self.from_col() <= other.to_col() && other.from_col() <= self.to_col();

        ((self.is_full_row() || other.is_full_row()) && rows_overlap)
            || ((self.is_full_column() || other.is_full_column()) && cols_overlap)
    }

    fn same_sheet(&self, other: &Address) -> bool {
        match (self.sheet(), other.sheet()) {
            (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => true,
        }
    }

    /// A plain rectangle carrying this range's qualifiers
    fn fragment(&self, from_row: u32, from_col: u32, to_row: u32, to_col: u32) -> Address {
        let mut out = Address::bounded(from_row, from_col, to_row, to_col);
        if let Some(workbook) = self.workbook() {
            out = out.with_workbook(workbook);
        }
        if let Some(sheet) = self.sheet() {
            out = out.with_sheet(sheet);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(text: &str) -> Address {
        Address::parse(text).unwrap()
    }

    #[test]
    fn test_collision_order() {
        assert!(Collision::No < Collision::Partly);
        assert!(Collision::Partly < Collision::Inside);
        assert!(Collision::Inside < Collision::Equal);
    }

    #[test]
    fn test_collide() {
        assert_eq!(addr("A1:C3").collide(&addr("B2")), Collision::Inside);
        assert_eq!(addr("A1:C3").collide(&addr("A1:C3")), Collision::Equal);
        assert_eq!(addr("A1:C3").collide(&addr("C3:D4")), Collision::Partly);
        assert_eq!(addr("A1:C3").collide(&addr("D1:D3")), Collision::No);
        assert_eq!(addr("B2").collide(&addr("A1:C3")), Collision::Partly);
    }

    #[test]
    fn test_collide_sheets() {
        assert_eq!(
            addr("Sheet1!A1:B2").collide(&addr("Sheet2!A1:B2")),
            Collision::No
        );
        assert_eq!(
            addr("Sheet1!A1:B2").collide(&addr("sheet1!A1:B2")),
            Collision::Equal
        );
        assert_eq!(addr("Sheet1!A1:B2").collide(&addr("B2")), Collision::Inside);
        assert_eq!(
            addr("Sheet1!A1:B2").collide_ignoring_sheet(&addr("Sheet2!A1")),
            Collision::Inside
        );
        assert_eq!(Address::ref_error().collide(&addr("A1")), Collision::No);
    }

    #[test]
    fn test_intersect() {
        let i = addr("A1:C3").intersect(&addr("B2:D4")).unwrap();
        assert_eq!(i.to_text(), "B2:C3");
        assert!(addr("A1:B2").intersect(&addr("C3")).is_none());

        let i = addr("Data!A:A").intersect(&addr("2:2")).unwrap();
        assert_eq!(i.to_text(), "Data!A2");
    }

    #[test]
    fn test_intersect_reversed() {
        let parts = addr("A1:C3").intersect_reversed(&addr("A1:A3")).unwrap();
        assert_eq!(parts.to_text(), "B1:C3");

        let parts = addr("A1:C3").intersect_reversed(&addr("B2:D4")).unwrap();
        assert_eq!(parts.to_text(), "A1:C1,A2:A3");

        assert!(addr("A1:C3").intersect_reversed(&addr("A1:C3")).is_none());
        assert!(addr("A1:C3").intersect_reversed(&addr("E5")).is_none());
        assert!(addr("B2").intersect_reversed(&addr("A1:C3")).is_none());
    }

    #[test]
    fn test_full_row_and_column() {
        assert!(addr("3:5").is_full_row());
        assert!(!addr("3:5").is_full_column());
        assert!(addr("B:B").is_full_column());
        assert!(addr("3:5").collide_full_row_or_column(&addr("C4")));
        assert!(!addr("3:5").collide_full_row_or_column(&addr("C6")));
        assert!(addr("C2").collide_full_row_or_column(&addr("C:D")));
        assert!(!addr("A1:B2").collide_full_row_or_column(&addr("B2")));
    }
}
