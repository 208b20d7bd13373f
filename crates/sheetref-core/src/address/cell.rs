//! Cell, row and column tokens (`A1`, `$B$2`, `3`, `$C`)

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// One side of an A1-style reference.
///
/// `A1` and `$B$2` are cells, `3`/`$3` are whole rows and `C`/`$C` are whole
/// columns. Rows and columns are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RefPart {
    /// A single cell
    Cell {
        row: u32,
        col: u32,
        row_fixed: bool,
        col_fixed: bool,
    },
    /// A row number with no column letters
    Row { row: u32, fixed: bool },
    /// Column letters with no row number
    Column { col: u32, fixed: bool },
}

impl RefPart {
    /// Parse an A1-style token.
    ///
    /// # Examples
    /// ```
    /// use sheetref_core::address::RefPart;
    ///
    /// assert_eq!(
    ///     RefPart::parse("$B2").unwrap(),
    ///     RefPart::Cell { row: 2, col: 2, row_fixed: false, col_fixed: true }
    /// );
    /// assert_eq!(RefPart::parse("$7").unwrap(), RefPart::Row { row: 7, fixed: true });
    /// assert_eq!(RefPart::parse("xfd").unwrap(), RefPart::Column { col: 16384, fixed: false });
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::parse("empty reference"));
        }

        let bytes = s.as_bytes();
        let mut pos = 0;

        let first_dollar = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_alphabetic() {
            pos += 1;
        }
        let letters = &s[col_start..pos];

        if letters.is_empty() {
            // Row-only token, the leading `$` belongs to the row
            let row = parse_row(&s[pos..], s)?;
            return Ok(RefPart::Row {
                row,
                fixed: first_dollar,
            });
        }

        let col = letters_to_column(letters)?;

        let row_dollar = if bytes.get(pos) == Some(&b'$') {
            pos += 1;
            true
        } else {
            false
        };

        if pos == bytes.len() {
            if row_dollar {
                return Err(Error::parse(format!("no row number in '{}'", s)));
            }
            return Ok(RefPart::Column {
                col,
                fixed: first_dollar,
            });
        }

        let row = parse_row(&s[pos..], s)?;
        Ok(RefPart::Cell {
            row,
            col,
            row_fixed: row_dollar,
            col_fixed: first_dollar,
        })
    }

    /// Format as A1 text, re-emitting `$` markers
    pub fn to_a1(&self) -> String {
        match *self {
            RefPart::Cell {
                row,
                col,
                row_fixed,
                col_fixed,
            } => format!(
                "{}{}{}{}",
                dollar(col_fixed),
                column_to_letters(col),
                dollar(row_fixed),
                row
            ),
            RefPart::Row { row, fixed } => format!("{}{}", dollar(fixed), row),
            RefPart::Column { col, fixed } => {
                format!("{}{}", dollar(fixed), column_to_letters(col))
            }
        }
    }

    /// Whether two parts can form the two ends of a range
    pub fn pairs_with(&self, other: &RefPart) -> bool {
        matches!(
            (self, other),
            (RefPart::Cell { .. }, RefPart::Cell { .. })
                | (RefPart::Row { .. }, RefPart::Row { .. })
                | (RefPart::Column { .. }, RefPart::Column { .. })
        )
    }

    /// Move the relative components by a row/column delta.
    ///
    /// Fixed components stay put. Returns `None` if the result leaves the sheet.
    pub fn offset(&self, row_delta: i64, col_delta: i64) -> Option<Self> {
        match *self {
            RefPart::Cell {
                row,
                col,
                row_fixed,
                col_fixed,
            } => Some(RefPart::Cell {
                row: if row_fixed {
                    row
                } else {
                    shift_within(row, row_delta, MAX_ROWS)?
                },
                col: if col_fixed {
                    col
                } else {
                    shift_within(col, col_delta, MAX_COLS)?
                },
                row_fixed,
                col_fixed,
            }),
            RefPart::Row { row, fixed } => Some(RefPart::Row {
                row: if fixed {
                    row
                } else {
                    shift_within(row, row_delta, MAX_ROWS)?
                },
                fixed,
            }),
            RefPart::Column { col, fixed } => Some(RefPart::Column {
                col: if fixed {
                    col
                } else {
                    shift_within(col, col_delta, MAX_COLS)?
                },
                fixed,
            }),
        }
    }
}

pub(crate) fn dollar(fixed: bool) -> &'static str {
    if fixed {
        "$"
    } else {
        ""
    }
}

pub(crate) fn shift_within(value: u32, delta: i64, max: u32) -> Option<u32> {
    let shifted = value as i64 + delta;
    if shifted < 1 || shifted > max as i64 {
        None
    } else {
        Some(shifted as u32)
    }
}

fn parse_row(digits: &str, whole: &str) -> Result<u32> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::parse(format!("invalid row number in '{}'", whole)));
    }
    let row: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidRange(format!("row number too large in '{}'", whole)))?;
    if row == 0 || row > MAX_ROWS as u64 {
        return Err(Error::InvalidRange(format!(
            "row {} outside 1..={} in '{}'",
            row, MAX_ROWS, whole
        )));
    }
    Ok(row as u32)
}

/// Convert a 1-based column index to letters (1 = A, 26 = Z, 27 = AA, etc.)
pub fn column_to_letters(col: u32) -> String {
    let mut result = String::new();
    let mut n = col;

    while n > 0 {
        n -= 1;
        let c = ((n % 26) as u8 + b'A') as char;
        result.insert(0, c);
        n /= 26;
    }

    result
}

/// Convert column letters to a 1-based index (A = 1, Z = 26, AA = 27, etc.)
pub fn letters_to_column(letters: &str) -> Result<u32> {
    if letters.is_empty() {
        return Err(Error::parse("empty column letters"));
    }

    let mut col: u64 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return Err(Error::parse(format!("invalid column letter '{}'", c)));
        }
        col = col * 26 + (c.to_ascii_uppercase() as u64 - 'A' as u64 + 1);
        if col > MAX_COLS as u64 {
            return Err(Error::InvalidRange(format!(
                "column '{}' beyond {}",
                letters,
                column_to_letters(MAX_COLS)
            )));
        }
    }

    Ok(col as u32)
}
