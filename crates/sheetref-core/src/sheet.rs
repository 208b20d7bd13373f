//! Sheet name quoting

use lazy_regex::regex_is_match;

/// Check if a sheet name must be quoted when written in a reference.
///
/// Names that start with a digit, contain anything other than letters,
/// digits and `_`, or could be read as a cell reference (`A1`, `R1C1`) need
/// quotes.
pub fn needs_quoting(name: &str) -> bool {
    let Some(first) = name.chars().next() else {
        return false;
    };
    if first.is_ascii_digit() {
        return true;
    }
    if name.chars().any(|c| !(c.is_alphanumeric() || c == '_')) {
        return true;
    }
    regex_is_match!(r"^[A-Za-z]{1,3}[0-9]+$", name)
        || regex_is_match!(r"^([Rr][0-9]*)?([Cc][0-9]*)?$", name)
}

/// Quote a sheet name if needed, doubling embedded apostrophes
///
/// # Examples
/// ```
/// use sheetref_core::quote_sheet_name;
///
/// assert_eq!(quote_sheet_name("Sheet1"), "Sheet1");
/// assert_eq!(quote_sheet_name("My Sheet"), "'My Sheet'");
/// assert_eq!(quote_sheet_name("Bob's"), "'Bob''s'");
/// ```
pub fn quote_sheet_name(name: &str) -> String {
    if needs_quoting(name) {
        format!("'{}'", name.replace('\'', "''"))
    } else {
        name.to_string()
    }
}
