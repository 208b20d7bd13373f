//! Formula text tokenizer
//!
//! Splits formula text into string literals, reference-shaped words and
//! everything else. Nothing is evaluated and unknown syntax is kept as text,
//! so joining the tokens back together reproduces the input.

/// Reference notation of the formula text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `A1`, `$B$2:C3`, `3:5`, `B:D`
    A1,
    /// `R1C1`, `R[-1]C`, `R2:R4`
    R1C1,
}

/// A piece of formula text
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormulaToken {
    /// Operators, function names, numbers, whitespace and anything else
    Text(String),
    /// A string literal, unescaped and without its quotes
    Literal(String),
    /// A word that may be a reference, with its raw sheet qualifier
    /// (including the `!`) and the second end of a `:` range. The second end
    /// may repeat a qualifier of its own (`Sheet1!A1:Sheet1!A3`).
    Reference {
        qualifier: String,
        first: String,
        second: Option<String>,
        second_qualifier: String,
    },
}

impl FormulaToken {
    /// Source text of the token
    pub fn to_text(&self) -> String {
        match self {
            FormulaToken::Text(text) => text.clone(),
            FormulaToken::Literal(value) => format!("\"{}\"", value.replace('"', "\"\"")),
            FormulaToken::Reference {
                qualifier,
                first,
                second,
                second_qualifier,
            } => match second {
                Some(second) => format!("{}{}:{}{}", qualifier, first, second_qualifier, second),
                None => format!("{}{}", qualifier, first),
            },
        }
    }
}

/// Split formula text into tokens.
///
/// # Examples
/// ```
/// use sheetref_formula::tokens::{tokenize_formula, FormulaToken, Notation};
///
/// let tokens = tokenize_formula("=SUM(Sheet1!A1:A3)", Notation::A1);
/// assert_eq!(
///     tokens[1],
///     FormulaToken::Reference {
///         qualifier: "Sheet1!".to_string(),
///         first: "A1".to_string(),
///         second: Some("A3".to_string()),
///         second_qualifier: String::new(),
///     }
/// );
/// ```
pub fn tokenize_formula(formula: &str, notation: Notation) -> Vec<FormulaToken> {
    let mut scanner = FormulaScanner {
        input: formula,
        pos: 0,
        notation,
        tokens: Vec::new(),
    };
    scanner.scan();
    scanner.tokens
}

struct FormulaScanner<'a> {
    input: &'a str,
    pos: usize,
    notation: Notation,
    tokens: Vec<FormulaToken>,
}

impl<'a> FormulaScanner<'a> {
    fn scan(&mut self) {
        while let Some(c) = self.peek_char() {
            match c {
                '"' => {
                    let literal = self.scan_string();
                    self.tokens.push(FormulaToken::Literal(literal));
                }
                '#' => {
                    let error = self.scan_error();
                    self.push_text(&error);
                }
                '\'' => self.scan_quoted_qualifier(),
                c if is_word_start(c) => self.scan_word_or_reference(String::new()),
                _ => {
                    self.advance();
                    self.push_text(&c.to_string());
                }
            }
        }
    }

    fn scan_string(&mut self) -> String {
        self.advance(); // Skip opening quote

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                // Check for escaped quote ("")
                if self.peek_char_at(1) == Some('"') {
                    s.push('"');
                    self.advance();
                    self.advance();
                } else {
                    break;
                }
            } else {
                s.push(c);
                self.advance();
            }
        }

        // Skip closing quote
        if self.peek_char() == Some('"') {
            self.advance();
        }

        s
    }

    /// `#REF!`, `#N/A`, `#DIV/0!`
    fn scan_error(&mut self) -> String {
        let start = self.pos;
        self.advance();
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_alphanumeric() || matches!(c, '!' | '/' | '?'))
        {
            let c = self.peek_char();
            self.advance();
            if c == Some('!') {
                break;
            }
        }
        self.input[start..self.pos].to_string()
    }

    /// `'Sheet name'!A1`
    fn scan_quoted_qualifier(&mut self) {
        let start = self.pos;
        self.skip_quoted();

        if self.peek_char() == Some('!') {
            self.advance();
            let qualifier = self.input[start..self.pos].to_string();
            self.scan_after_qualifier(qualifier);
        } else {
            let text = self.input[start..self.pos].to_string();
            self.push_text(&text);
        }
    }

    fn scan_after_qualifier(&mut self, qualifier: String) {
        match self.peek_char() {
            Some('#') => {
                let error = self.scan_error();
                self.push_text(&format!("{}{}", qualifier, error));
            }
            Some(c) if is_word_start(c) => self.scan_word_or_reference(qualifier),
            _ => self.push_text(&qualifier),
        }
    }

    fn scan_word_or_reference(&mut self, qualifier: String) {
        let word = self.scan_word();

        // Sheet qualifier (`Sheet1!`, `[1]Sheet1!`)
        if qualifier.is_empty() && self.peek_char() == Some('!') {
            self.advance();
            self.scan_after_qualifier(format!("{}!", word));
            return;
        }

        match self.peek_char() {
            // Function call
            Some('(') => self.push_text(&format!("{}{}", qualifier, word)),
            // Structured table reference passes through untouched
            Some('[') => {
                let brackets = self.scan_brackets();
                self.push_text(&format!("{}{}{}", qualifier, word, brackets));
            }
            Some(':') => match self.scan_second_end() {
                Some((second_qualifier, second)) => self.tokens.push(FormulaToken::Reference {
                    qualifier,
                    first: word,
                    second: Some(second),
                    second_qualifier,
                }),
                None => self.tokens.push(FormulaToken::Reference {
                    qualifier,
                    first: word,
                    second: None,
                    second_qualifier: String::new(),
                }),
            },
            _ => self.tokens.push(FormulaToken::Reference {
                qualifier,
                first: word,
                second: None,
                second_qualifier: String::new(),
            }),
        }
    }

    /// Second end of a range after the `:`, with its optional qualifier.
    /// Leaves the position at the `:` when no second end follows.
    fn scan_second_end(&mut self) -> Option<(String, String)> {
        let colon = self.pos;
        self.advance();

        let mut qualifier = String::new();
        if self.peek_char() == Some('\'') {
            let start = self.pos;
            self.skip_quoted();
            if self.peek_char() != Some('!') {
                self.pos = colon;
                return None;
            }
            self.advance();
            qualifier = self.input[start..self.pos].to_string();
        }

        if !self.peek_char().map_or(false, is_word_start) {
            self.pos = colon;
            return None;
        }
        let mut second = self.scan_word();

        // Bare qualifier (`Sheet1!A3`)
        if qualifier.is_empty() && self.peek_char() == Some('!') {
            self.advance();
            if !self.peek_char().map_or(false, is_word_start) {
                self.pos = colon;
                return None;
            }
            qualifier = format!("{}!", second);
            second = self.scan_word();
        }
        Some((qualifier, second))
    }

    fn scan_word(&mut self) -> String {
        let start = self.pos;

        // Leading workbook index
        if self.peek_char() == Some('[') {
            self.scan_brackets();
        }

        let mut prev = None;
        while let Some(c) = self.peek_char() {
            if is_word_char(c) {
                self.advance();
            } else if c == '['
                && self.notation == Notation::R1C1
                && matches!(prev, Some('R' | 'r' | 'C' | 'c'))
            {
                self.scan_brackets();
            } else {
                break;
            }
            prev = Some(c);
        }
        self.input[start..self.pos].to_string()
    }

    /// Consume a `'...'` run with `''` escapes
    fn skip_quoted(&mut self) {
        self.advance();
        while let Some(c) = self.peek_char() {
            self.advance();
            if c == '\'' {
                if self.peek_char() == Some('\'') {
                    self.advance();
                    continue;
                }
                break;
            }
        }
    }

    /// Consume a balanced `[...]` run and return it
    fn scan_brackets(&mut self) -> String {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek_char() {
            self.advance();
            match c {
                '[' => depth += 1,
                ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        break;
                    }
                }
                // Escape inside a column name
                '\'' => self.advance(),
                _ => {}
            }
        }
        self.input[start..self.pos].to_string()
    }

    fn push_text(&mut self, text: &str) {
        if let Some(FormulaToken::Text(last)) = self.tokens.last_mut() {
            last.push_str(text);
        } else {
            self.tokens.push(FormulaToken::Text(text.to_string()));
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }
}

fn is_word_start(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '\\' | '[')
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '.' | '\\')
}

/// Join tokens back into formula text
pub fn join_tokens(tokens: &[FormulaToken]) -> String {
    tokens.iter().map(FormulaToken::to_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reference(qualifier: &str, first: &str, second: Option<&str>) -> FormulaToken {
        FormulaToken::Reference {
            qualifier: qualifier.to_string(),
            first: first.to_string(),
            second: second.map(str::to_string),
            second_qualifier: String::new(),
        }
    }

    #[test]
    fn test_tokenize_simple() {
        let tokens = tokenize_formula("=B1*2", Notation::A1);
        assert_eq!(
            tokens,
            vec![
                FormulaToken::Text("=".to_string()),
                reference("", "B1", None),
                FormulaToken::Text("*".to_string()),
                reference("", "2", None),
            ]
        );
    }

    #[test]
    fn test_tokenize_functions_and_literals() {
        let tokens = tokenize_formula("=IF(A1=\"say \"\"hi\"\"\",LOG10(C$3),#N/A)", Notation::A1);
        assert_eq!(tokens[0], FormulaToken::Text("=IF(".to_string()));
        assert_eq!(tokens[1], reference("", "A1", None));
        assert_eq!(tokens[3], FormulaToken::Literal("say \"hi\"".to_string()));
        assert_eq!(tokens[4], FormulaToken::Text(",LOG10(".to_string()));
        assert_eq!(tokens[5], reference("", "C$3", None));
        assert_eq!(tokens[6], FormulaToken::Text("),#N/A)".to_string()));
    }

    #[test]
    fn test_tokenize_qualifiers() {
        let tokens = tokenize_formula("='My Sheet'!A1+[1]Data!B:C+Sheet2!#REF!", Notation::A1);
        assert_eq!(tokens[1], reference("'My Sheet'!", "A1", None));
        assert_eq!(tokens[3], reference("[1]Data!", "B", Some("C")));
        assert_eq!(tokens[4], FormulaToken::Text("+Sheet2!#REF!".to_string()));
    }

    #[test]
    fn test_tokenize_qualified_second_end() {
        let tokens = tokenize_formula("=SUM(Sheet1!A1:Sheet1!A3)", Notation::A1);
        assert_eq!(
            tokens[1],
            FormulaToken::Reference {
                qualifier: "Sheet1!".to_string(),
                first: "A1".to_string(),
                second: Some("A3".to_string()),
                second_qualifier: "Sheet1!".to_string(),
            }
        );

        let tokens = tokenize_formula("='My Sheet'!A1:'My Sheet'!B2", Notation::A1);
        assert_eq!(
            tokens[1],
            FormulaToken::Reference {
                qualifier: "'My Sheet'!".to_string(),
                first: "A1".to_string(),
                second: Some("B2".to_string()),
                second_qualifier: "'My Sheet'!".to_string(),
            }
        );

        // A quoted run that is not a qualifier ends the range
        let tokens = tokenize_formula("=A1:'x'", Notation::A1);
        assert_eq!(tokens[1], reference("", "A1", None));
        assert_eq!(join_tokens(&tokens), "=A1:'x'");
    }

    #[test]
    fn test_tokenize_table_passthrough() {
        let tokens = tokenize_formula("=SUM(Sales[[#Data],[Qty]])", Notation::A1);
        assert_eq!(
            tokens,
            vec![FormulaToken::Text("=SUM(Sales[[#Data],[Qty]])".to_string())]
        );
    }

    #[test]
    fn test_tokenize_r1c1() {
        let tokens = tokenize_formula("=R[-1]C*2+SUM(R1C1:R2C[3])", Notation::R1C1);
        assert_eq!(tokens[1], reference("", "R[-1]C", None));
        assert_eq!(tokens[5], reference("", "R1C1", Some("R2C[3]")));
    }

    #[test]
    fn test_join_reproduces_input() {
        for formula in [
            "=SUM(A1:B2)*'Q1 ''24'!$C$3/2",
            "=CONCAT(\"a\"\"b\", Sales[@Price])",
            "=R[1]C[-1]&\"x\"",
        ] {
            let notation = if formula.contains("R[") {
                Notation::R1C1
            } else {
                Notation::A1
            };
            assert_eq!(join_tokens(&tokenize_formula(formula, notation)), formula);
        }
    }
}
