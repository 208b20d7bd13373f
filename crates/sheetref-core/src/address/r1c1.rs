//! R1C1 notation for references (`R2C3`, `R[-1]C`, `R2:R4`, `C[1]`)

use super::cell::RefPart;
use super::tokenizer::{read_quoted, split_workbook_prefix};
use super::Address;
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

impl RefPart {
    /// Format relative to the anchor cell. Fixed components are emitted
    /// absolute (`R3`), relative ones as offsets (`R[2]`, or `R` for zero).
    ///
    /// # Examples
    /// ```
    /// use sheetref_core::address::RefPart;
    ///
    /// let part = RefPart::parse("B$3").unwrap();
    /// assert_eq!(part.to_r1c1(1, 1), "R3C[1]");
    /// ```
    pub fn to_r1c1(&self, anchor_row: u32, anchor_col: u32) -> String {
        match *self {
            RefPart::Cell {
                row,
                col,
                row_fixed,
                col_fixed,
            } => format!(
                "{}{}",
                axis('R', row, row_fixed, anchor_row),
                axis('C', col, col_fixed, anchor_col)
            ),
            RefPart::Row { row, fixed } => axis('R', row, fixed, anchor_row),
            RefPart::Column { col, fixed } => axis('C', col, fixed, anchor_col),
        }
    }

    /// Parse an R1C1 token relative to the anchor cell.
    ///
    /// References that land outside the sheet fail with [`Error::InvalidRange`].
    pub fn from_r1c1(text: &str, anchor_row: u32, anchor_col: u32) -> Result<Self> {
        let text = text.trim();
        let bytes = text.as_bytes();
        let mut pos = 0;

        let row = if bytes.first().map(u8::to_ascii_uppercase) == Some(b'R') {
            pos += 1;
            let (offset, used) = read_offset(&text[pos..], text)?;
            pos += used;
            Some(offset)
        } else {
            None
        };
        let col = if bytes.get(pos).map(u8::to_ascii_uppercase) == Some(b'C') {
            pos += 1;
            let (offset, used) = read_offset(&text[pos..], text)?;
            pos += used;
            Some(offset)
        } else {
            None
        };

        if pos != bytes.len() {
            return Err(Error::parse(format!("'{}' is not an R1C1 reference", text)));
        }

        match (row, col) {
            (Some(r), Some(c)) => Ok(RefPart::Cell {
                row: r.resolve(anchor_row, MAX_ROWS, text)?,
                col: c.resolve(anchor_col, MAX_COLS, text)?,
                row_fixed: r.is_absolute(),
                col_fixed: c.is_absolute(),
            }),
            (Some(r), None) => Ok(RefPart::Row {
                row: r.resolve(anchor_row, MAX_ROWS, text)?,
                fixed: r.is_absolute(),
            }),
            (None, Some(c)) => Ok(RefPart::Column {
                col: c.resolve(anchor_col, MAX_COLS, text)?,
                fixed: c.is_absolute(),
            }),
            (None, None) => Err(Error::parse(format!(
                "'{}' is not an R1C1 reference",
                text
            ))),
        }
    }
}

impl Address {
    /// Format in R1C1 notation relative to the anchor cell
    pub fn to_r1c1(&self, anchor_row: u32, anchor_col: u32) -> String {
        self.components()
            .map(|c| format!("{}{}", c.qualifier(), c.r1c1_body(anchor_row, anchor_col)))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn r1c1_body(&self, anchor_row: u32, anchor_col: u32) -> String {
        if !self.has_bounds() {
            return self.body_text();
        }

        let (start, end) = if self.is_full_row() && !self.from_col_fixed && !self.to_col_fixed {
            (
                RefPart::Row {
                    row: self.from_row,
                    fixed: self.from_row_fixed,
                },
                RefPart::Row {
                    row: self.to_row,
                    fixed: self.to_row_fixed,
                },
            )
        } else if self.is_full_column() && !self.from_row_fixed && !self.to_row_fixed {
            (
                RefPart::Column {
                    col: self.from_col,
                    fixed: self.from_col_fixed,
                },
                RefPart::Column {
                    col: self.to_col,
                    fixed: self.to_col_fixed,
                },
            )
        } else {
            (
                RefPart::Cell {
                    row: self.from_row,
                    col: self.from_col,
                    row_fixed: self.from_row_fixed,
                    col_fixed: self.from_col_fixed,
                },
                RefPart::Cell {
                    row: self.to_row,
                    col: self.to_col,
                    row_fixed: self.to_row_fixed,
                    col_fixed: self.to_col_fixed,
                },
            )
        };

        let first = start.to_r1c1(anchor_row, anchor_col);
        if start == end {
            first
        } else {
            format!("{}:{}", first, end.to_r1c1(anchor_row, anchor_col))
        }
    }

    /// Parse R1C1 text relative to the anchor cell.
    ///
    /// A lone row (`R3`) or column (`C[1]`) token is a whole row or column.
    ///
    /// # Examples
    /// ```
    /// use sheetref_core::Address;
    ///
    /// let addr = Address::from_r1c1("Sheet1!R[-1]C:R2C[2]", 3, 2).unwrap();
    /// assert_eq!(addr.to_text(), "Sheet1!B2:D$2");
    /// ```
    pub fn from_r1c1(text: &str, anchor_row: u32, anchor_col: u32) -> Result<Self> {
        let mut components = Vec::new();
        for piece in split_outside_quotes(text, ',') {
            let (workbook, sheet, body) = split_qualifier(piece)?;
            let mut addr = if body.trim().eq_ignore_ascii_case("#REF!") {
                Address::ref_error()
            } else {
                let (first, second) = match body.split_once(':') {
                    Some((a, b)) => (a, Some(b)),
                    None => (body, None),
                };
                let a = RefPart::from_r1c1(first, anchor_row, anchor_col)?;
                let b = match second {
                    Some(text) => RefPart::from_r1c1(text, anchor_row, anchor_col)?,
                    None => a,
                };
                Address::from_parts(a, b)?
            };
            addr.workbook = workbook;
            addr.sheet = sheet;
            components.push(addr);
        }
        Address::from_components(components).ok_or_else(|| Error::parse("empty address"))
    }
}

#[derive(Debug, Clone, Copy)]
enum Offset {
    Absolute(u32),
    Relative(i64),
}

impl Offset {
    fn is_absolute(&self) -> bool {
        matches!(self, Offset::Absolute(_))
    }

    fn resolve(&self, anchor: u32, max: u32, text: &str) -> Result<u32> {
        let value = match *self {
            Offset::Absolute(n) => n as i64,
            Offset::Relative(delta) => anchor as i64 + delta,
        };
        if value < 1 || value > max as i64 {
            return Err(Error::InvalidRange(format!(
                "'{}' points outside the sheet",
                text
            )));
        }
        Ok(value as u32)
    }
}

/// Read `[n]`, `n` or nothing after an `R`/`C` marker
fn read_offset(s: &str, whole: &str) -> Result<(Offset, usize)> {
    if let Some(inner) = s.strip_prefix('[') {
        let close = inner
            .find(']')
            .ok_or_else(|| Error::parse(format!("unclosed '[' in '{}'", whole)))?;
        let delta: i64 = inner[..close]
            .trim()
            .parse()
            .map_err(|_| Error::parse(format!("bad offset in '{}'", whole)))?;
        return Ok((Offset::Relative(delta), close + 2));
    }

    let digits = s.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return Ok((Offset::Relative(0), 0));
    }
    let n: u32 = s[..digits]
        .parse()
        .map_err(|_| Error::InvalidRange(format!("index too large in '{}'", whole)))?;
    Ok((Offset::Absolute(n), digits))
}

fn axis(marker: char, value: u32, fixed: bool, anchor: u32) -> String {
    if fixed {
        return format!("{}{}", marker, value);
    }
    let delta = value as i64 - anchor as i64;
    if delta == 0 {
        marker.to_string()
    } else {
        format!("{}[{}]", marker, delta)
    }
}

fn split_outside_quotes(text: &str, sep: char) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut in_quote = false;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            in_quote = !in_quote;
        } else if c == sep && !in_quote {
            pieces.push(&text[start..i]);
            start = i + c.len_utf8();
        }
    }
    pieces.push(&text[start..]);
    pieces
}

/// Split `[wb]'Sheet'!body` into its parts
fn split_qualifier(piece: &str) -> Result<(Option<String>, Option<String>, &str)> {
    let piece = piece.trim();

    if piece.starts_with('\'') {
        let (name, used) = read_quoted(piece)
            .ok_or_else(|| Error::parse(format!("unterminated sheet name in '{}'", piece)))?;
        let body = piece[used..]
            .strip_prefix('!')
            .ok_or_else(|| Error::parse(format!("expected '!' in '{}'", piece)))?;
        let (workbook, sheet) = split_workbook_prefix(&name);
        return Ok((workbook, Some(sheet), body));
    }

    // `#REF!` ends with a bang of its own
    let search = match piece.len().checked_sub(5) {
        Some(cut) if piece.is_char_boundary(cut) && piece[cut..].eq_ignore_ascii_case("#REF!") => {
            &piece[..cut]
        }
        _ => piece,
    };
    match search.rfind('!') {
        Some(bang) => {
            let (workbook, sheet) = split_workbook_prefix(&piece[..bang]);
            Ok((workbook, (!sheet.is_empty()).then_some(sheet), &piece[bang + 1..]))
        }
        None => Ok((None, None, piece)),
    }
}
