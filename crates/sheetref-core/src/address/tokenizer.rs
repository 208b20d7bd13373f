//! Reference tokenizer
//!
//! Splits raw address text into components (one per comma-separated range),
//! each carrying its workbook/sheet qualifier and the text on either side of
//! the range colon, or a structured table reference.
//!
//! The body is scanned once, left to right, by an explicit state machine:
//! quote state for embedded `'Sheet name'!` qualifiers and a bounded stack of
//! open bracket positions for structured references.

use super::table::TableRef;
use crate::error::{Error, Result};

/// Deepest bracket nesting accepted inside a structured reference
const MAX_BRACKET_DEPTH: usize = 8;

/// One comma-separated piece of an address
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Component {
    pub workbook: Option<String>,
    pub sheet: Option<String>,
    pub first: String,
    pub second: Option<String>,
    pub table: Option<TableRef>,
    /// A bare `'Sheet'` qualifier with no body: the whole sheet
    pub whole_sheet: bool,
    /// Both ends of the range carried different sheet qualifiers
    pub sheet_mismatch: bool,
}

/// Tokenize address text into components
pub(crate) fn tokenize(text: &str) -> Result<Vec<Component>> {
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::parse("empty address"));
    }

    let mut scanner = BodyScanner::default();

    let body = if text.starts_with('\'') || text.starts_with('[') {
        let qualifier = leading_qualifier(text)?;
        if qualifier.whole_sheet {
            return Ok(vec![Component {
                workbook: qualifier.workbook,
                sheet: qualifier.sheet,
                whole_sheet: true,
                ..Component::default()
            }]);
        }
        scanner.inherited_workbook = qualifier.workbook.clone();
        scanner.current.workbook = qualifier.workbook;
        scanner.current.sheet = qualifier.sheet;
        scanner.explicit_sheet = scanner.current.sheet.is_some();
        qualifier.rest
    } else {
        text
    };

    scanner.scan(body)?;
    Ok(scanner.components)
}

struct LeadingQualifier<'a> {
    workbook: Option<String>,
    sheet: Option<String>,
    rest: &'a str,
    whole_sheet: bool,
}

/// Extract `[workbook]` and/or `'quoted sheet'` from the start of the text
fn leading_qualifier(text: &str) -> Result<LeadingQualifier<'_>> {
    let mut workbook = None;
    let mut rest = text;

    if let Some(after) = rest.strip_prefix('[') {
        let close = after
            .find(']')
            .ok_or_else(|| Error::parse(format!("unterminated workbook index in '{}'", text)))?;
        workbook = Some(after[..close].to_string());
        rest = &after[close + 1..];
    }

    if rest.starts_with('\'') {
        let (name, consumed) = read_quoted(rest)
            .ok_or_else(|| Error::parse(format!("unterminated sheet name in '{}'", text)))?;
        let after = &rest[consumed..];
        let (wb_inside, sheet) = split_workbook_prefix(&name);
        if wb_inside.is_some() {
            workbook = wb_inside;
        }
        return match after.strip_prefix('!') {
            Some(body) => Ok(LeadingQualifier {
                workbook,
                sheet: Some(sheet),
                rest: body,
                whole_sheet: false,
            }),
            None if after.trim().is_empty() => Ok(LeadingQualifier {
                workbook,
                sheet: Some(sheet),
                rest: "",
                whole_sheet: true,
            }),
            None => Err(Error::parse(format!(
                "expected '!' after sheet name in '{}'",
                text
            ))),
        };
    }

    if workbook.is_some() {
        // `[1]Sheet1!A1` - bare sheet name up to the `!`
        let bang = rest
            .find('!')
            .ok_or_else(|| Error::parse(format!("missing sheet qualifier in '{}'", text)))?;
        let sheet = &rest[..bang];
        return Ok(LeadingQualifier {
            workbook,
            sheet: (!sheet.is_empty()).then(|| sheet.to_string()),
            rest: &rest[bang + 1..],
            whole_sheet: false,
        });
    }

    Ok(LeadingQualifier {
        workbook: None,
        sheet: None,
        rest,
        whole_sheet: false,
    })
}

/// Read a `'...'` run starting at the first byte, unescaping `''`.
/// Returns the name and the number of bytes consumed (quotes included).
pub(crate) fn read_quoted(s: &str) -> Option<(String, usize)> {
    let mut name = String::new();
    let mut chars = s.char_indices().skip(1).peekable();
    while let Some((i, c)) = chars.next() {
        if c == '\'' {
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                name.push('\'');
                continue;
            }
            return Some((name, i + 1));
        }
        name.push(c);
    }
    None
}

/// `[1]Sheet1` inside a quoted name carries the workbook index
pub(crate) fn split_workbook_prefix(name: &str) -> (Option<String>, String) {
    if let Some(after) = name.strip_prefix('[') {
        if let Some(close) = after.find(']') {
            return (
                Some(after[..close].to_string()),
                after[close + 1..].to_string(),
            );
        }
    }
    (None, name.to_string())
}

#[derive(Default)]
struct BodyScanner {
    components: Vec<Component>,
    current: Component,
    token: String,
    has_colon: bool,
    explicit_sheet: bool,
    /// Closing quote of a sheet token was just consumed
    after_quote: bool,
    inherited_workbook: Option<String>,
    // Structured reference state
    brackets: Vec<usize>,
    item: String,
    inner_items: usize,
    after_colon: bool,
    table: Option<TableRef>,
}

impl BodyScanner {
    fn scan(&mut self, body: &str) -> Result<()> {
        let chars: Vec<char> = body.chars().collect();
        let mut in_quote = false;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if in_quote {
                if c == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        self.token.push('\'');
                        i += 2;
                        continue;
                    }
                    in_quote = false;
                    self.after_quote = true;
                } else {
                    self.token.push(c);
                }
                i += 1;
                continue;
            }

            if !self.brackets.is_empty() {
                i = self.scan_bracketed(&chars, i)?;
                continue;
            }

            if self.after_quote && c != '!' {
                return Err(Error::parse(format!(
                    "expected '!' after quoted sheet name '{}'",
                    self.token
                )));
            }

            match c {
                '\'' if self.token.trim().is_empty() => {
                    self.token.clear();
                    in_quote = true;
                }
                // `[1]Sheet!A1` on a later component
                '[' if self.token.trim().is_empty() && self.table.is_none() => {
                    let close = chars[i + 1..]
                        .iter()
                        .position(|&ch| ch == ']')
                        .ok_or_else(|| Error::parse("unterminated workbook index"))?;
                    self.current.workbook = Some(chars[i + 1..i + 1 + close].iter().collect());
                    self.token.clear();
                    i += close + 2;
                    continue;
                }
                '[' => {
                    if self.table.is_some() {
                        return Err(Error::parse("unexpected '[' after table reference"));
                    }
                    self.table = Some(TableRef::new(self.token.trim()));
                    self.token.clear();
                    self.brackets.push(i);
                    self.item.clear();
                    self.inner_items = 0;
                    self.after_colon = false;
                }
                '!' => {
                    if self.token.trim().eq_ignore_ascii_case("#REF") {
                        self.token.push('!');
                    } else {
                        self.set_sheet()?;
                    }
                }
                ',' => self.finish_component()?,
                ':' => {
                    if self.has_colon || self.table.is_some() {
                        return Err(Error::parse("unexpected ':' in address"));
                    }
                    self.current.first = std::mem::take(&mut self.token).trim().to_string();
                    self.has_colon = true;
                }
                _ => self.token.push(c),
            }
            i += 1;
        }

        if in_quote {
            return Err(Error::parse("unterminated quoted sheet name"));
        }
        if let Some(&open) = self.brackets.last() {
            return Err(Error::parse(format!("unclosed '[' at position {}", open)));
        }
        if self.after_quote {
            return Err(Error::parse(format!(
                "quoted sheet name '{}' has no reference",
                self.token
            )));
        }
        self.finish_component()
    }

    /// Handle one character inside `[...]`, returning the next index
    fn scan_bracketed(&mut self, chars: &[char], i: usize) -> Result<usize> {
        let c = chars[i];
        match c {
            // `'` escapes the next character inside a column specifier
            '\'' => {
                if let Some(&next) = chars.get(i + 1) {
                    self.item.push(next);
                    return Ok(i + 2);
                }
                return Err(Error::parse("dangling escape in table reference"));
            }
            '[' => {
                if self.brackets.len() >= MAX_BRACKET_DEPTH {
                    return Err(Error::parse("table reference nested too deeply"));
                }
                if self.brackets.len() == 1 && self.item.trim() == "@" {
                    if let Some(table) = self.table.as_mut() {
                        table.push_item("@", false);
                    }
                }
                self.brackets.push(i);
                self.item.clear();
            }
            ']' => {
                self.brackets.pop();
                let item = std::mem::take(&mut self.item);
                if let Some(table) = self.table.as_mut() {
                    match self.brackets.len() {
                        1 => {
                            table.push_item(&item, self.after_colon);
                            self.inner_items += 1;
                            self.after_colon = false;
                        }
                        0 if self.inner_items == 0 => table.push_item(&item, false),
                        _ => {}
                    }
                }
            }
            ',' if self.brackets.len() == 1 => {
                self.after_colon = false;
                self.item.clear();
            }
            ':' if self.brackets.len() == 1 => {
                self.after_colon = true;
                self.item.clear();
            }
            _ => self.item.push(c),
        }
        Ok(i + 1)
    }

    fn set_sheet(&mut self) -> Result<()> {
        let raw = std::mem::take(&mut self.token);
        let quoted = std::mem::replace(&mut self.after_quote, false);
        let raw = if quoted { raw } else { raw.trim().to_string() };
        if raw.is_empty() {
            return Err(Error::parse("empty sheet name"));
        }
        let (workbook, name) = split_workbook_prefix(&raw);
        if workbook.is_some() {
            self.current.workbook = workbook;
        }

        if !self.has_colon || !self.explicit_sheet {
            self.current.sheet = Some(name);
            self.explicit_sheet = true;
            return Ok(());
        }

        // Qualifier on the second half of a range
        let same = self
            .current
            .sheet
            .as_deref()
            .map_or(false, |s| s.to_lowercase() == name.to_lowercase());
        if !same {
            log::debug!(
                "range mixes sheet qualifiers '{}' and '{}'",
                self.current.sheet.as_deref().unwrap_or_default(),
                name
            );
            self.current.sheet_mismatch = true;
        }
        Ok(())
    }

    fn finish_component(&mut self) -> Result<()> {
        if self.after_quote {
            return Err(Error::parse("quoted sheet name must be followed by '!'"));
        }
        let token = std::mem::take(&mut self.token).trim().to_string();
        let mut component = std::mem::take(&mut self.current);

        if let Some(table) = self.table.take() {
            if !token.is_empty() {
                return Err(Error::parse(format!(
                    "unexpected '{}' after table reference",
                    token
                )));
            }
            component.table = Some(table);
        } else if self.has_colon {
            if component.first.is_empty() || token.is_empty() {
                return Err(Error::parse("range is missing one of its ends"));
            }
            component.second = Some(token);
        } else {
            if token.is_empty() {
                return Err(Error::parse("empty address component"));
            }
            component.first = token;
        }

        // Unqualified siblings stay on the sheet of the previous component
        self.current.workbook = component
            .workbook
            .clone()
            .or_else(|| self.inherited_workbook.clone());
        self.current.sheet = component.sheet.clone();
        self.explicit_sheet = false;
        self.has_colon = false;
        self.inner_items = 0;
        self.after_colon = false;

        self.components.push(component);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::TableRegion;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_range() {
        let parts = tokenize("A1:B2").unwrap();
        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].first, "A1");
        assert_eq!(parts[0].second.as_deref(), Some("B2"));
        assert_eq!(parts[0].sheet, None);
    }

    #[test]
    fn test_quoted_sheet_with_escape() {
        let parts = tokenize("'Bob''s Sheet'!C3").unwrap();
        assert_eq!(parts[0].sheet.as_deref(), Some("Bob's Sheet"));
        assert_eq!(parts[0].first, "C3");
    }

    #[test]
    fn test_workbook_qualifier() {
        let parts = tokenize("[1]Sheet1!A1").unwrap();
        assert_eq!(parts[0].workbook.as_deref(), Some("1"));
        assert_eq!(parts[0].sheet.as_deref(), Some("Sheet1"));

        let parts = tokenize("'[2]My Sheet'!A1").unwrap();
        assert_eq!(parts[0].workbook.as_deref(), Some("2"));
        assert_eq!(parts[0].sheet.as_deref(), Some("My Sheet"));
    }

    #[test]
    fn test_whole_sheet_qualifier() {
        let parts = tokenize("'Data'").unwrap();
        assert!(parts[0].whole_sheet);
        assert_eq!(parts[0].sheet.as_deref(), Some("Data"));

        assert!(tokenize("'Data'X").is_err());
    }

    #[test]
    fn test_repeated_sheet_collapses() {
        let parts = tokenize("Sheet1!A1:Sheet1!A3").unwrap();
        assert_eq!(parts[0].sheet.as_deref(), Some("Sheet1"));
        assert!(!parts[0].sheet_mismatch);
        assert_eq!(parts[0].first, "A1");
        assert_eq!(parts[0].second.as_deref(), Some("A3"));

        let parts = tokenize("Sheet1!A1:Sheet2!A3").unwrap();
        assert!(parts[0].sheet_mismatch);
    }

    #[test]
    fn test_multi_range_siblings() {
        let parts = tokenize("A1,'My Sheet'!B2:C3, D4").unwrap();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[1].sheet.as_deref(), Some("My Sheet"));
        assert_eq!(parts[1].first, "B2");
        // D4 stays on the sheet of the previous component
        assert_eq!(parts[2].sheet.as_deref(), Some("My Sheet"));
        assert_eq!(parts[2].first, "D4");

        let parts = tokenize("A1,[2]Other!B2").unwrap();
        assert_eq!(parts[0].workbook, None);
        assert_eq!(parts[1].workbook.as_deref(), Some("2"));
        assert_eq!(parts[1].sheet.as_deref(), Some("Other"));
    }

    #[test]
    fn test_ref_error_guard() {
        let parts = tokenize("Sheet1!#REF!").unwrap();
        assert_eq!(parts[0].sheet.as_deref(), Some("Sheet1"));
        assert_eq!(parts[0].first, "#REF!");
    }

    #[test]
    fn test_table_references() {
        let parts = tokenize("Sales[[#Headers],[Price]:[Qty]]").unwrap();
        let table = parts[0].table.as_ref().unwrap();
        assert_eq!(table.name(), "Sales");
        assert_eq!(table.regions(), &[TableRegion::Headers]);
        assert_eq!(table.columns(), Some(("Price", Some("Qty"))));

        let parts = tokenize("Sales[#ALL],Sales[Unit Price]").unwrap();
        assert_eq!(parts[0].table.as_ref().unwrap().regions(), &[TableRegion::All]);
        assert_eq!(
            parts[1].table.as_ref().unwrap().columns(),
            Some(("Unit Price", None))
        );

        let parts = tokenize("Sales[@[Unit Price]]").unwrap();
        let table = parts[0].table.as_ref().unwrap();
        assert_eq!(table.regions(), &[TableRegion::ThisRow]);
        assert_eq!(table.columns(), Some(("Unit Price", None)));
    }

    #[test]
    fn test_malformed() {
        assert!(tokenize("").is_err());
        assert!(tokenize("Sales[Price").is_err());
        assert!(tokenize("'Open!A1").is_err());
        assert!(tokenize("A1:B2:C3").is_err());
        assert!(tokenize("A1,").is_err());
        assert!(tokenize("!A1").is_err());
        assert!(tokenize("Sales[Price]X").is_err());
    }
}
