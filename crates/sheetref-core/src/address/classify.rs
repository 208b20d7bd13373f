//! Cheap classification of text before committing to a full parse

use super::tokenizer::tokenize;
use super::Address;
use lazy_regex::regex_is_match;

/// What a piece of text refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AddressType {
    /// Not usable as a reference (empty, numeric or malformed)
    Invalid,
    /// A range on a sheet of this workbook
    InternalAddress,
    /// A range in another workbook
    ExternalAddress,
    /// A defined name in this workbook
    InternalName,
    /// A defined name in another workbook
    ExternalName,
    /// An expression rather than a reference
    Formula,
}

/// Classify text as an address, a defined name or a formula.
///
/// # Examples
/// ```
/// use sheetref_core::{classify, AddressType};
///
/// assert_eq!(classify("Sheet1!A1:B2"), AddressType::InternalAddress);
/// assert_eq!(classify("[1]Sheet1!A1"), AddressType::ExternalAddress);
/// assert_eq!(classify("TaxRate"), AddressType::InternalName);
/// assert_eq!(classify("A1+1"), AddressType::Formula);
/// assert_eq!(classify("42"), AddressType::Invalid);
/// ```
pub fn classify(text: &str) -> AddressType {
    let text = text.trim();
    if text.is_empty() || regex_is_match!(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$", text) {
        return AddressType::Invalid;
    }
    if is_formula(text) {
        return AddressType::Formula;
    }

    let components = match tokenize(text) {
        Ok(components) => components,
        Err(_) => return AddressType::Invalid,
    };
    let external = components.iter().any(|c| c.workbook.is_some());

    if Address::parse(text).is_ok() {
        return if external {
            AddressType::ExternalAddress
        } else {
            AddressType::InternalAddress
        };
    }

    let is_name = components.len() == 1
        && components[0].second.is_none()
        && regex_is_match!(r"^[\p{L}_\\][\p{L}\p{N}_.]*$", &components[0].first);
    match (is_name, external) {
        (true, true) => AddressType::ExternalName,
        (true, false) => AddressType::InternalName,
        (false, _) => AddressType::Invalid,
    }
}

/// Check whether text contains expression syntax outside quotes and table brackets
pub fn is_formula(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    let mut in_quote = false;
    let mut depth = 0usize;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_quote {
            if c == '\'' {
                if chars.get(i + 1) == Some(&'\'') {
                    i += 1;
                } else {
                    in_quote = false;
                }
            }
            i += 1;
            continue;
        }

        match c {
            '\'' => {
                // `A1 'text'` reads like a literal inside an expression, while
                // `A1, 'Sheet 2'!B2` is just the next range of a multi-range
                let after_space = i > 0 && chars[i - 1] == ' ';
                let after_comma = chars[..i]
                    .iter()
                    .rev()
                    .find(|ch| **ch != ' ')
                    .map_or(true, |ch| *ch == ',');
                if depth == 0
                    && after_space
                    && !after_comma
                    && chars.get(i + 1) != Some(&'\'')
                {
                    return true;
                }
                in_quote = depth == 0;
            }
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            '+' | '-' | '*' | '/' | '^' | '&' | '=' | '<' | '>' | '(' | ')' | '{' | '}'
            | '%' | '"'
                if depth == 0 =>
            {
                return true
            }
            _ => {}
        }
        i += 1;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_addresses() {
        assert_eq!(classify("A1"), AddressType::InternalAddress);
        assert_eq!(classify("'My Sheet'!$A$1:B5"), AddressType::InternalAddress);
        assert_eq!(classify("Sales[#All]"), AddressType::InternalAddress);
        assert_eq!(classify("A1,C3"), AddressType::InternalAddress);
        assert_eq!(classify("'[2]Data'!C:C"), AddressType::ExternalAddress);
    }

    #[test]
    fn test_classify_names() {
        assert_eq!(classify("Sheet1!Totals"), AddressType::InternalName);
        assert_eq!(classify("[1]!Rate"), AddressType::ExternalName);
        assert_eq!(classify("_xlnm.Print_Area"), AddressType::InternalName);
    }

    #[test]
    fn test_classify_invalid() {
        assert_eq!(classify(""), AddressType::Invalid);
        assert_eq!(classify("3.14"), AddressType::Invalid);
        assert_eq!(classify("'Open!A1"), AddressType::Invalid);
        assert_eq!(classify("A1:B2:C3"), AddressType::Invalid);
        assert_eq!(classify("1e5"), AddressType::Invalid);
        assert_eq!(classify("-3.5"), AddressType::Invalid);
        assert_eq!(classify(".5"), AddressType::Invalid);
    }

    #[test]
    fn test_float_words_are_names() {
        assert_eq!(classify("Infinity"), AddressType::InternalName);
        assert_eq!(classify("NaN"), AddressType::InternalName);
        assert_eq!(classify("inf"), AddressType::InternalName);
    }

    #[test]
    fn test_is_formula() {
        assert!(is_formula("SUM(A1:A3)"));
        assert!(is_formula("A1*2"));
        assert!(is_formula("\"text\""));
        assert!(is_formula("A1 'x'"));
        assert!(!is_formula("'a+b'!A1"));
        assert!(!is_formula("Sales[Net-Total]"));
        assert!(!is_formula("A1, 'My Sheet'!B2"));
        assert!(!is_formula("Sheet1!A1:B2"));
    }
}
