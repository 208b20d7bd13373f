//! Address model
//!
//! [`Address`] is the normalized form of one rectangular range, plus the
//! optional workbook/sheet qualifier, an optional structured table binding
//! and the sibling ranges of a comma-separated multi-range address.

mod cell;
mod classify;
mod r1c1;
mod table;
mod tokenizer;

pub use cell::{column_to_letters, letters_to_column, RefPart};
pub use classify::{classify, is_formula, AddressType};
pub use table::{TableRef, TableRegion};

use crate::error::{Error, Result};
use crate::sheet::quote_sheet_name;
use crate::{MAX_COLS, MAX_ROWS};
use cell::dollar;
use std::fmt;
use std::str::FromStr;
use tokenizer::Component;

/// A parsed cell reference.
///
/// Rows and columns are 1-based. The `#REF!` reference is encoded with all
/// bounds set to `0`; every other range satisfies `from <= to` on both axes.
/// Table references carry a [`TableRef`] instead of literal bounds until they
/// are resolved with [`crate::AddressResolver`].
///
/// Values are immutable: algebra and shift operations return new addresses.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    from_row: u32,
    from_col: u32,
    to_row: u32,
    to_col: u32,
    from_row_fixed: bool,
    from_col_fixed: bool,
    to_row_fixed: bool,
    to_col_fixed: bool,
    workbook: Option<String>,
    sheet: Option<String>,
    table: Option<TableRef>,
    siblings: Vec<Address>,
}

impl Address {
    /// Create a range from 1-based bounds.
    ///
    /// Fails with [`Error::InvalidRange`] if a bound is outside the sheet or
    /// `from > to` on either axis.
    pub fn new(from_row: u32, from_col: u32, to_row: u32, to_col: u32) -> Result<Self> {
        check_row(from_row)?;
        check_row(to_row)?;
        check_col(from_col)?;
        check_col(to_col)?;
        if from_row > to_row || from_col > to_col {
            return Err(Error::InvalidRange(format!(
                "bounds out of order: rows {}..{}, columns {}..{}",
                from_row, to_row, from_col, to_col
            )));
        }
        Ok(Self::bounded(from_row, from_col, to_row, to_col))
    }

    /// Create a single-cell address
    pub fn cell(row: u32, col: u32) -> Result<Self> {
        Self::new(row, col, row, col)
    }

    /// The `A1:XFD1048576` range
    pub fn whole_sheet() -> Self {
        Self::bounded(1, 1, MAX_ROWS, MAX_COLS)
    }

    /// The unresolvable `#REF!` reference
    pub fn ref_error() -> Self {
        Self::bounded(0, 0, 0, 0)
    }

    /// An unresolved structured table reference
    pub fn table_ref(table: TableRef) -> Self {
        let mut addr = Self::bounded(0, 0, 0, 0);
        addr.table = Some(table);
        addr
    }

    /// Build from already validated bounds
    pub(crate) fn bounded(from_row: u32, from_col: u32, to_row: u32, to_col: u32) -> Self {
        Self {
            from_row,
            from_col,
            to_row,
            to_col,
            from_row_fixed: false,
            from_col_fixed: false,
            to_row_fixed: false,
            to_col_fixed: false,
            workbook: None,
            sheet: None,
            table: None,
            siblings: Vec::new(),
        }
    }

    /// Same bounds and flags, different qualifiers and no siblings
    pub(crate) fn with_bounds(&self, from_row: u32, from_col: u32, to_row: u32, to_col: u32) -> Self {
        Self {
            from_row,
            from_col,
            to_row,
            to_col,
            siblings: Vec::new(),
            ..self.clone()
        }
    }

    /// Rebuild a multi-range address; the first component becomes the primary range
    pub fn from_components<I: IntoIterator<Item = Address>>(components: I) -> Option<Self> {
        let mut iter = components.into_iter().flat_map(Address::into_components);
        let mut primary = iter.next()?;
        primary.siblings = iter.collect();
        Some(primary)
    }

    fn into_components(mut self) -> Vec<Address> {
        let siblings = std::mem::take(&mut self.siblings);
        let mut out = Vec::with_capacity(siblings.len() + 1);
        out.push(self);
        out.extend(siblings);
        out
    }

    /// Set the sheet qualifier
    pub fn with_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.sheet = Some(sheet.into());
        self
    }

    /// Set the external workbook qualifier
    pub fn with_workbook(mut self, workbook: impl Into<String>) -> Self {
        self.workbook = Some(workbook.into());
        self
    }

    /// Set the `$` flags of the primary range
    pub fn with_fixed(
        mut self,
        from_row_fixed: bool,
        from_col_fixed: bool,
        to_row_fixed: bool,
        to_col_fixed: bool,
    ) -> Self {
        self.from_row_fixed = from_row_fixed;
        self.from_col_fixed = from_col_fixed;
        self.to_row_fixed = to_row_fixed;
        self.to_col_fixed = to_col_fixed;
        self
    }

    // === Parsing ===

    /// Parse address text.
    ///
    /// # Examples
    /// ```
    /// use sheetref_core::Address;
    ///
    /// let addr = Address::parse("'My Sheet'!$B$2:D4").unwrap();
    /// assert_eq!(addr.sheet(), Some("My Sheet"));
    /// assert_eq!((addr.from_row(), addr.from_col()), (2, 2));
    /// assert_eq!((addr.to_row(), addr.to_col()), (4, 4));
    /// assert!(addr.from_row_fixed() && !addr.to_row_fixed());
    /// ```
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_in(text, None)
    }

    /// Parse address text, putting unqualified ranges on `current_sheet`
    pub fn parse_in(text: &str, current_sheet: Option<&str>) -> Result<Self> {
        let components = tokenizer::tokenize(text)?;
        let mut parts = Vec::with_capacity(components.len());
        for component in components {
            let mut addr = Self::from_component(component)?;
            if addr.sheet.is_none() {
                addr.sheet = current_sheet.map(str::to_string);
            }
            parts.push(addr);
        }
        Self::from_components(parts).ok_or_else(|| Error::parse("empty address"))
    }

    fn from_component(component: Component) -> Result<Self> {
        let mut addr = if component.sheet_mismatch {
            Self::ref_error()
        } else if let Some(table) = component.table {
            Self::table_ref(table)
        } else if component.whole_sheet {
            Self::whole_sheet()
        } else {
            Self::from_tokens(&component.first, component.second.as_deref())?
        };
        addr.workbook = component.workbook;
        addr.sheet = component.sheet;
        Ok(addr)
    }

    fn from_tokens(first: &str, second: Option<&str>) -> Result<Self> {
        let is_ref = |t: &str| t.eq_ignore_ascii_case("#REF!");
        if is_ref(first) || second.map_or(false, is_ref) {
            return Ok(Self::ref_error());
        }

        let a = RefPart::parse(first)?;
        let b = match second {
            Some(text) => RefPart::parse(text)?,
            None => match a {
                RefPart::Cell { .. } => a,
                _ => {
                    return Err(Error::parse(format!(
                        "'{}' is not a cell reference",
                        first
                    )))
                }
            },
        };
        Self::from_parts(a, b)
    }

    /// Build normalized bounds from the two ends of a range
    pub(crate) fn from_parts(a: RefPart, b: RefPart) -> Result<Self> {
        match (a, b) {
            (
                RefPart::Cell {
                    row: r1,
                    col: c1,
                    row_fixed: rf1,
                    col_fixed: cf1,
                },
                RefPart::Cell {
                    row: r2,
                    col: c2,
                    row_fixed: rf2,
                    col_fixed: cf2,
                },
            ) => {
                let ((fr, frf), (tr, trf)) = ordered((r1, rf1), (r2, rf2));
                let ((fc, fcf), (tc, tcf)) = ordered((c1, cf1), (c2, cf2));
                Ok(Self::bounded(fr, fc, tr, tc).with_fixed(frf, fcf, trf, tcf))
            }
            (RefPart::Row { row: r1, fixed: f1 }, RefPart::Row { row: r2, fixed: f2 }) => {
                let ((fr, frf), (tr, trf)) = ordered((r1, f1), (r2, f2));
                Ok(Self::bounded(fr, 1, tr, MAX_COLS).with_fixed(frf, false, trf, false))
            }
            (RefPart::Column { col: c1, fixed: f1 }, RefPart::Column { col: c2, fixed: f2 }) => {
                let ((fc, fcf), (tc, tcf)) = ordered((c1, f1), (c2, f2));
                Ok(Self::bounded(1, fc, MAX_ROWS, tc).with_fixed(false, fcf, false, tcf))
            }
            _ => Err(Error::parse(format!(
                "'{}:{}' mixes cell, row and column forms",
                a.to_a1(),
                b.to_a1()
            ))),
        }
    }

    // === Accessors ===

    pub fn from_row(&self) -> u32 {
        self.from_row
    }

    pub fn from_col(&self) -> u32 {
        self.from_col
    }

    pub fn to_row(&self) -> u32 {
        self.to_row
    }

    pub fn to_col(&self) -> u32 {
        self.to_col
    }

    pub fn from_row_fixed(&self) -> bool {
        self.from_row_fixed
    }

    pub fn from_col_fixed(&self) -> bool {
        self.from_col_fixed
    }

    pub fn to_row_fixed(&self) -> bool {
        self.to_row_fixed
    }

    pub fn to_col_fixed(&self) -> bool {
        self.to_col_fixed
    }

    /// Sheet qualifier; `None` means the current sheet
    pub fn sheet(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    /// External workbook index or name
    pub fn workbook(&self) -> Option<&str> {
        self.workbook.as_deref()
    }

    pub fn table(&self) -> Option<&TableRef> {
        self.table.as_ref()
    }

    /// Additional ranges of a multi-range address, in text order
    pub fn siblings(&self) -> &[Address] {
        &self.siblings
    }

    /// The primary range followed by every sibling.
    ///
    /// Only the bounds, flags and qualifiers of each item are meaningful; the
    /// first item still carries the sibling list.
    pub fn components(&self) -> impl Iterator<Item = &Address> + '_ {
        std::iter::once(self).chain(self.siblings.iter())
    }

    /// The primary range without siblings
    pub fn primary(&self) -> Address {
        Self {
            siblings: Vec::new(),
            ..self.clone()
        }
    }

    /// The primary range without siblings, qualifiers or `$` flags
    pub fn local_bounds(&self) -> Address {
        Self {
            table: self.table.clone(),
            ..Self::bounded(self.from_row, self.from_col, self.to_row, self.to_col)
        }
    }

    pub fn is_ref_error(&self) -> bool {
        self.table.is_none() && self.to_row == 0
    }

    pub fn is_table(&self) -> bool {
        self.table.is_some()
    }

    /// Literal bounds are available (not `#REF!`, not an unresolved table)
    pub fn has_bounds(&self) -> bool {
        self.table.is_none() && self.to_row != 0
    }

    pub fn is_multi(&self) -> bool {
        !self.siblings.is_empty()
    }

    pub fn is_single_cell(&self) -> bool {
        self.has_bounds() && self.from_row == self.to_row && self.from_col == self.to_col
    }

    /// Get the number of rows in the primary range
    pub fn row_count(&self) -> u32 {
        if self.has_bounds() {
            self.to_row - self.from_row + 1
        } else {
            0
        }
    }

    /// Get the number of columns in the primary range
    pub fn col_count(&self) -> u32 {
        if self.has_bounds() {
            self.to_col - self.from_col + 1
        } else {
            0
        }
    }

    /// Get the total number of cells in the primary range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Check if a cell is within the primary range
    pub fn contains(&self, row: u32, col: u32) -> bool {
        self.has_bounds()
            && row >= self.from_row
            && row <= self.to_row
            && col >= self.from_col
            && col <= self.to_col
    }

    /// Spans every column (`3:5`)
    pub fn is_full_row(&self) -> bool {
        self.has_bounds() && self.from_col == 1 && self.to_col == MAX_COLS
    }

    /// Spans every row (`B:D`)
    pub fn is_full_column(&self) -> bool {
        self.has_bounds() && self.from_row == 1 && self.to_row == MAX_ROWS
    }

    /// Iterate over all `(row, col)` cells of the primary range (row by row)
    pub fn cells(&self) -> Cells {
        Cells {
            from_col: self.from_col,
            to_row: if self.has_bounds() { self.to_row } else { 0 },
            to_col: self.to_col,
            row: if self.has_bounds() { self.from_row } else { 1 },
            col: self.from_col,
        }
    }

    // === Formatting ===

    /// Canonical text including workbook/sheet qualifiers
    pub fn to_text(&self) -> String {
        self.components()
            .map(|c| format!("{}{}", c.qualifier(), c.body_text()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Canonical text without qualifiers
    pub fn to_local_text(&self) -> String {
        self.components()
            .map(Address::body_text)
            .collect::<Vec<_>>()
            .join(",")
    }

    fn qualifier(&self) -> String {
        let workbook = self
            .workbook
            .as_deref()
            .map(|wb| format!("[{}]", wb))
            .unwrap_or_default();
        match &self.sheet {
            Some(sheet) => format!("{}{}!", workbook, quote_sheet_name(sheet)),
            None if !workbook.is_empty() => format!("{}!", workbook),
            None => String::new(),
        }
    }

    fn body_text(&self) -> String {
        if let Some(table) = &self.table {
            return table.to_text();
        }
        if self.is_ref_error() {
            return "#REF!".to_string();
        }

        if self.is_full_row() && !self.from_col_fixed && !self.to_col_fixed {
            return format!(
                "{}{}:{}{}",
                dollar(self.from_row_fixed),
                self.from_row,
                dollar(self.to_row_fixed),
                self.to_row
            );
        }
        if self.is_full_column() && !self.from_row_fixed && !self.to_row_fixed {
            return format!(
                "{}{}:{}{}",
                dollar(self.from_col_fixed),
                column_to_letters(self.from_col),
                dollar(self.to_col_fixed),
                column_to_letters(self.to_col)
            );
        }

        let start = RefPart::Cell {
            row: self.from_row,
            col: self.from_col,
            row_fixed: self.from_row_fixed,
            col_fixed: self.from_col_fixed,
        };
        let end = RefPart::Cell {
            row: self.to_row,
            col: self.to_col,
            row_fixed: self.to_row_fixed,
            col_fixed: self.to_col_fixed,
        };
        if start == end {
            start.to_a1()
        } else {
            format!("{}:{}", start.to_a1(), end.to_a1())
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

impl FromStr for Address {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over `(row, col)` cells of a range
pub struct Cells {
    from_col: u32,
    to_row: u32,
    to_col: u32,
    row: u32,
    col: u32,
}

impl Iterator for Cells {
    type Item = (u32, u32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.row > self.to_row {
            return None;
        }

        let cell = (self.row, self.col);

        self.col += 1;
        if self.col > self.to_col {
            self.col = self.from_col;
            self.row += 1;
        }

        Some(cell)
    }
}

fn ordered<T: Copy>(a: (u32, T), b: (u32, T)) -> ((u32, T), (u32, T)) {
    if a.0 <= b.0 {
        (a, b)
    } else {
        (b, a)
    }
}

fn check_row(row: u32) -> Result<()> {
    if row == 0 || row > MAX_ROWS {
        return Err(Error::InvalidRange(format!(
            "row {} outside 1..={}",
            row, MAX_ROWS
        )));
    }
    Ok(())
}

fn check_col(col: u32) -> Result<()> {
    if col == 0 || col > MAX_COLS {
        return Err(Error::InvalidRange(format!(
            "column {} outside 1..={}",
            col, MAX_COLS
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_single_cell() {
        let addr = Address::parse("B2").unwrap();
        assert_eq!(
            (addr.from_row(), addr.from_col(), addr.to_row(), addr.to_col()),
            (2, 2, 2, 2)
        );
        assert!(addr.is_single_cell());
        assert_eq!(addr.sheet(), None);
    }

    #[test]
    fn test_parse_normalizes_order() {
        let addr = Address::parse("$C3:A$1").unwrap();
        assert_eq!(addr.to_local_text(), "A$1:$C3");
        assert!(addr.from_row_fixed());
        assert!(!addr.from_col_fixed());
        assert!(addr.to_col_fixed());
    }

    #[test]
    fn test_parse_rows_and_columns() {
        let rows = Address::parse("3:5").unwrap();
        assert_eq!((rows.from_col(), rows.to_col()), (1, MAX_COLS));
        assert_eq!((rows.from_row(), rows.to_row()), (3, 5));
        assert_eq!(rows.to_text(), "3:5");

        let cols = Address::parse("$B:D").unwrap();
        assert_eq!((cols.from_row(), cols.to_row()), (1, MAX_ROWS));
        assert_eq!((cols.from_col(), cols.to_col()), (2, 4));
        assert_eq!(cols.to_text(), "$B:D");
    }

    #[test]
    fn test_parse_rejects() {
        assert!(matches!(Address::parse("3"), Err(Error::Parse(_))));
        assert!(matches!(Address::parse("Total_1"), Err(Error::Parse(_))));
        assert!(matches!(Address::parse("A1:3"), Err(Error::Parse(_))));
        assert!(matches!(Address::parse("XFE1"), Err(Error::InvalidRange(_))));
    }

    #[test]
    fn test_new_validates() {
        assert!(Address::new(1, 1, 2, 2).is_ok());
        assert!(matches!(Address::new(3, 1, 2, 2), Err(Error::InvalidRange(_))));
        assert!(matches!(Address::new(0, 1, 2, 2), Err(Error::InvalidRange(_))));
        assert!(matches!(
            Address::new(1, 1, 1, MAX_COLS + 1),
            Err(Error::InvalidRange(_))
        ));
    }

    #[test]
    fn test_ref_error_forms() {
        let addr = Address::parse("#REF!").unwrap();
        assert!(addr.is_ref_error());
        assert_eq!(addr.to_text(), "#REF!");

        let addr = Address::parse("Sheet1!#REF!").unwrap();
        assert!(addr.is_ref_error());
        assert_eq!(addr.to_text(), "Sheet1!#REF!");

        let addr = Address::parse("Sheet1!A1:Sheet2!A3").unwrap();
        assert!(addr.is_ref_error());
        assert_eq!(addr.sheet(), Some("Sheet1"));
    }

    #[test]
    fn test_multi_range_order() {
        let addr = Address::parse("C3,A1:B2,Sheet2!D4").unwrap();
        assert!(addr.is_multi());
        let texts: Vec<String> = addr.components().map(|c| c.primary().to_text()).collect();
        assert_eq!(texts, vec!["C3", "A1:B2", "Sheet2!D4"]);
        assert_eq!(addr.to_text(), "C3,A1:B2,Sheet2!D4");
    }

    #[test]
    fn test_parse_in_current_sheet() {
        let addr = Address::parse_in("A1,Other!B2", Some("Main")).unwrap();
        assert_eq!(addr.sheet(), Some("Main"));
        assert_eq!(addr.siblings()[0].sheet(), Some("Other"));
    }

    #[test]
    fn test_qualified_round_trip_text() {
        for text in [
            "'My Sheet'!B2",
            "[1]Sheet1!$A$1:B2",
            "[1]'Q1 Data'!C:C",
            "'Bob''s'!A1",
            "'2024'!A1",
            "Sales[[#Headers],[Price]:[Qty]]",
            "Sheet1!$1:$3",
        ] {
            let addr = Address::parse(text).unwrap();
            assert_eq!(addr.to_text(), text);
        }
    }

    #[test]
    fn test_whole_sheet_from_quoted_name() {
        let addr = Address::parse("'Data Sheet'").unwrap();
        assert_eq!(addr.sheet(), Some("Data Sheet"));
        assert!(addr.is_full_row() && addr.is_full_column());
        assert_eq!(addr.to_text(), "'Data Sheet'!1:1048576");
    }

    #[test]
    fn test_cells_iterator() {
        let addr = Address::parse("A1:B2").unwrap();
        let cells: Vec<_> = addr.cells().collect();
        assert_eq!(cells, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
        assert_eq!(Address::ref_error().cells().count(), 0);
    }

    #[test]
    fn test_from_components_flattens() {
        let a = Address::parse("A1,B2").unwrap();
        let b = Address::parse("C3").unwrap();
        let joined = Address::from_components(vec![a, b]).unwrap();
        assert_eq!(joined.to_text(), "A1,B2,C3");
        assert!(Address::from_components(Vec::new()).is_none());
    }
}
