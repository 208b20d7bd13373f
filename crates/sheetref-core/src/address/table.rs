//! Structured table references (`Table1[[#Headers],[Price]:[Qty]]`)

use std::fmt;

/// Region keyword inside a structured reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TableRegion {
    /// `#All` - headers, data and totals
    All,
    /// `#Headers` - the header row
    Headers,
    /// `#Data` - the data body (the default when no region is given)
    Data,
    /// `#Totals` - the totals row
    Totals,
    /// `#This Row` (or the `@` shorthand) - the data row of the calling cell
    ThisRow,
}

impl TableRegion {
    /// Match a bracket item against the region keywords (case-insensitive)
    pub fn from_keyword(item: &str) -> Option<Self> {
        match item.trim().to_ascii_lowercase().as_str() {
            "#all" => Some(TableRegion::All),
            "#headers" => Some(TableRegion::Headers),
            "#data" => Some(TableRegion::Data),
            "#totals" => Some(TableRegion::Totals),
            "#this row" => Some(TableRegion::ThisRow),
            _ => None,
        }
    }

    /// Canonical keyword spelling
    pub fn keyword(&self) -> &'static str {
        match self {
            TableRegion::All => "#All",
            TableRegion::Headers => "#Headers",
            TableRegion::Data => "#Data",
            TableRegion::Totals => "#Totals",
            TableRegion::ThisRow => "#This Row",
        }
    }
}

/// A structured reference to a table.
///
/// Row and column bounds are not stored here; they depend on the table's
/// current geometry and are filled in by [`crate::AddressResolver`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TableRef {
    name: String,
    regions: Vec<TableRegion>,
    column_from: Option<String>,
    column_to: Option<String>,
}

impl TableRef {
    /// Create a reference to the data body of a table
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: Vec::new(),
            column_from: None,
            column_to: None,
        }
    }

    /// Add a region flag (duplicates are ignored)
    pub fn with_region(mut self, region: TableRegion) -> Self {
        self.push_region(region);
        self
    }

    /// Restrict to a single column
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column_from = Some(column.into());
        self.column_to = None;
        self
    }

    /// Restrict to a column span
    pub fn with_columns(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.column_from = Some(from.into());
        self.column_to = Some(to.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn regions(&self) -> &[TableRegion] {
        &self.regions
    }

    /// First and optional last column of the column span
    pub fn columns(&self) -> Option<(&str, Option<&str>)> {
        self.column_from
            .as_deref()
            .map(|from| (from, self.column_to.as_deref()))
    }

    pub(crate) fn push_region(&mut self, region: TableRegion) {
        if !self.regions.contains(&region) {
            self.regions.push(region);
        }
    }

    /// Record one bracket item. `after_colon` marks the second half of a column span.
    pub(crate) fn push_item(&mut self, item: &str, after_colon: bool) {
        let item = item.trim();
        if item.is_empty() {
            return;
        }
        if let Some(region) = TableRegion::from_keyword(item) {
            self.push_region(region);
            return;
        }
        let column = match item.strip_prefix('@') {
            Some(rest) => {
                self.push_region(TableRegion::ThisRow);
                rest.trim()
            }
            None => item,
        };
        if column.is_empty() {
            return;
        }
        if after_colon && self.column_from.is_some() {
            self.column_to = Some(column.to_string());
        } else {
            self.column_from = Some(column.to_string());
        }
    }

    /// Format as structured reference text
    pub fn to_text(&self) -> String {
        let mut items: Vec<String> = self
            .regions
            .iter()
            .map(|r| format!("[{}]", r.keyword()))
            .collect();
        if let Some(from) = &self.column_from {
            let mut span = format!("[{}]", escape_column(from));
            if let Some(to) = &self.column_to {
                span.push_str(&format!(":[{}]", escape_column(to)));
            }
            items.push(span);
        }

        match items.len() {
            0 => format!("{}[]", self.name),
            // A lone item needs no inner brackets
            1 if self.column_to.is_none() => format!("{}{}", self.name, items[0]),
            _ => format!("{}[{}]", self.name, items.join(",")),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

/// Escape characters that have meaning inside a column specifier
fn escape_column(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if matches!(c, '[' | ']' | '#' | '\'') {
            out.push('\'');
        }
        out.push(c);
    }
    out
}
