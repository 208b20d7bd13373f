//! Formula rebasing and R1C1 translation
//!
//! A shared formula stores one template anchored at its top-left cell. The
//! literal formula of any other cell is the template with every relative
//! reference moved by the distance between the two cells.

use crate::tokens::{tokenize_formula, FormulaToken, Notation};
use sheetref_core::address::RefPart;
use sheetref_core::Error;

const REF_ERROR: &str = "#REF!";

/// Move the relative references of `template` from the anchor cell
/// `(from_row, from_col)` to `(to_row, to_col)`.
///
/// `$`-fixed components stay put, whole rows move only vertically and whole
/// columns only horizontally. Table references, names and functions are left
/// alone. A reference pushed off the sheet becomes `#REF!`.
///
/// # Examples
/// ```
/// use sheetref_formula::rebase;
///
/// assert_eq!(rebase("=B1*2", 1, 1, 4, 1), "=B4*2");
/// assert_eq!(rebase("=SUM($A$1:A3)+C:C", 1, 1, 2, 3), "=SUM($A$1:C4)+E:E");
/// ```
pub fn rebase(template: &str, from_row: u32, from_col: u32, to_row: u32, to_col: u32) -> String {
    let row_delta = to_row as i64 - from_row as i64;
    let col_delta = to_col as i64 - from_col as i64;
    if row_delta == 0 && col_delta == 0 {
        return template.to_string();
    }

    let mut out = String::with_capacity(template.len());
    for token in tokenize_formula(template, Notation::A1) {
        match &token {
            FormulaToken::Reference {
                qualifier,
                first,
                second,
                second_qualifier,
            } => match a1_parts(first, second.as_deref()) {
                Some((start, end)) => {
                    out.push_str(qualifier);
                    let moved = offset_pair(start, end, second_qualifier, row_delta, col_delta);
                    out.push_str(moved.as_deref().unwrap_or(REF_ERROR));
                }
                None => out.push_str(&token.to_text()),
            },
            _ => out.push_str(&token.to_text()),
        }
    }
    out
}

/// Translate an A1 formula to R1C1 notation relative to `(row, col)`
///
/// # Examples
/// ```
/// use sheetref_formula::to_r1c1_formula;
///
/// assert_eq!(to_r1c1_formula("=B1*$A$1", 3, 1), "=R[-2]C[1]*R1C1");
/// ```
pub fn to_r1c1_formula(formula: &str, row: u32, col: u32) -> String {
    let mut out = String::with_capacity(formula.len());
    for token in tokenize_formula(formula, Notation::A1) {
        match &token {
            FormulaToken::Reference {
                qualifier,
                first,
                second,
                second_qualifier,
            } => match a1_parts(first, second.as_deref()) {
                Some((start, end)) => {
                    out.push_str(qualifier);
                    out.push_str(&start.to_r1c1(row, col));
                    if let Some(end) = end {
                        out.push(':');
                        out.push_str(second_qualifier);
                        out.push_str(&end.to_r1c1(row, col));
                    }
                }
                None => out.push_str(&token.to_text()),
            },
            _ => out.push_str(&token.to_text()),
        }
    }
    out
}

/// Translate an R1C1 formula to A1 notation relative to `(row, col)`.
///
/// References that land outside the sheet become `#REF!`.
///
/// # Examples
/// ```
/// use sheetref_formula::from_r1c1_formula;
///
/// assert_eq!(from_r1c1_formula("=R[-2]C[1]*R1C1", 3, 1), "=B1*$A$1");
/// assert_eq!(from_r1c1_formula("=SUM(R[-1])", 1, 1), "=SUM(#REF!)");
/// ```
pub fn from_r1c1_formula(formula: &str, row: u32, col: u32) -> String {
    let mut out = String::with_capacity(formula.len());
    for token in tokenize_formula(formula, Notation::R1C1) {
        match &token {
            FormulaToken::Reference {
                qualifier,
                first,
                second,
                second_qualifier,
            } => match r1c1_to_a1(first, second.as_deref(), second_qualifier, row, col) {
                Some(text) => {
                    out.push_str(qualifier);
                    out.push_str(&text);
                }
                None => out.push_str(&token.to_text()),
            },
            _ => out.push_str(&token.to_text()),
        }
    }
    out
}

/// Interpret a reference-shaped word pair as A1 parts.
/// A lone row or column token is a number or a name, not a reference.
fn a1_parts(first: &str, second: Option<&str>) -> Option<(RefPart, Option<RefPart>)> {
    let start = RefPart::parse(first).ok()?;
    match second {
        Some(second) => {
            let end = RefPart::parse(second).ok()?;
            start.pairs_with(&end).then_some((start, Some(end)))
        }
        None => matches!(start, RefPart::Cell { .. }).then_some((start, None)),
    }
}

fn offset_pair(
    start: RefPart,
    end: Option<RefPart>,
    end_qualifier: &str,
    rows: i64,
    cols: i64,
) -> Option<String> {
    let start = start.offset(rows, cols)?;
    match end {
        Some(end) => {
            let end = end.offset(rows, cols)?;
            Some(format!("{}:{}{}", start.to_a1(), end_qualifier, end.to_a1()))
        }
        None => Some(start.to_a1()),
    }
}

/// `None` when the word is not an R1C1 reference at all
fn r1c1_to_a1(
    first: &str,
    second: Option<&str>,
    end_qualifier: &str,
    row: u32,
    col: u32,
) -> Option<String> {
    let parse = |text: &str| match RefPart::from_r1c1(text, row, col) {
        Ok(part) => Some(Ok(part)),
        Err(Error::InvalidRange(_)) => Some(Err(())),
        Err(_) => None,
    };

    let start = parse(first)?;
    let end = match second {
        Some(second) => Some(parse(second)?),
        None => None,
    };

    let (start, end) = match (start, end) {
        (Ok(start), Some(Ok(end))) if start.pairs_with(&end) => (start, end),
        (Ok(_), Some(Ok(_))) => return None,
        (Ok(start), None) => (start, start),
        _ => return Some(REF_ERROR.to_string()),
    };

    if start == end && matches!(start, RefPart::Cell { .. }) {
        Some(start.to_a1())
    } else {
        Some(format!("{}:{}{}", start.to_a1(), end_qualifier, end.to_a1()))
    }
}
