//! On-demand resolution of structured table references and sheet names
//!
//! Addresses never change after they are built. The bounds of a table
//! reference depend on the table's current geometry, so they are computed by
//! an [`AddressResolver`] and memoized in the resolver rather than in the
//! address.

use crate::address::{Address, TableRef, TableRegion};
use crate::error::{Error, Result};
use ahash::AHashMap;
use log::trace;

/// Current geometry of a table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableGeometry {
    /// Full extent of the table, header and totals rows included
    pub bounds: Address,
    /// The first row holds column headers
    pub show_header: bool,
    /// The last row holds totals
    pub show_total: bool,
    /// Column names, left to right
    pub columns: Vec<String>,
}

/// Looks up tables by name
pub trait TableLookup {
    fn resolve_table(&self, name: &str) -> Option<TableGeometry>;
}

impl<F> TableLookup for F
where
    F: Fn(&str) -> Option<TableGeometry>,
{
    fn resolve_table(&self, name: &str) -> Option<TableGeometry> {
        self(name)
    }
}

/// Checks sheet names against a workbook
pub trait SheetLookup {
    fn sheet_exists(&self, name: &str) -> bool;
}

impl SheetLookup for [&str] {
    fn sheet_exists(&self, name: &str) -> bool {
        self.iter().any(|s| s.eq_ignore_ascii_case(name))
    }
}

impl SheetLookup for Vec<String> {
    fn sheet_exists(&self, name: &str) -> bool {
        self.iter().any(|s| s.to_lowercase() == name.to_lowercase())
    }
}

/// Resolves table references and unqualified sheets.
///
/// Results are cached by the structural identity of the address (plus the
/// current row when the address uses `#This Row`). Call
/// [`AddressResolver::clear_cache`] after the table layout changes.
///
/// # Examples
/// ```
/// use sheetref_core::{Address, AddressResolver, TableGeometry};
///
/// let tables = |name: &str| {
///     (name == "Sales").then(|| TableGeometry {
///         bounds: Address::parse("B2:D10").unwrap(),
///         show_header: true,
///         show_total: false,
///         columns: vec!["Item".into(), "Price".into(), "Qty".into()],
///     })
/// };
/// let mut resolver = AddressResolver::new(&tables).with_current_sheet("Data");
///
/// let addr = Address::parse("Sales[Price]").unwrap();
/// assert_eq!(resolver.resolve(&addr).unwrap().to_text(), "Data!C3:C10");
/// ```
pub struct AddressResolver<'a, T: TableLookup + ?Sized> {
    tables: &'a T,
    current_sheet: Option<String>,
    current_row: Option<u32>,
    cache: AHashMap<(Address, Option<u32>), Address>,
}

impl<'a, T: TableLookup + ?Sized> AddressResolver<'a, T> {
    pub fn new(tables: &'a T) -> Self {
        Self {
            tables,
            current_sheet: None,
            current_row: None,
            cache: AHashMap::new(),
        }
    }

    /// Sheet used for addresses without a sheet qualifier
    pub fn with_current_sheet(mut self, sheet: impl Into<String>) -> Self {
        self.current_sheet = Some(sheet.into());
        self
    }

    /// Row of the calling cell, used by `#This Row`
    pub fn set_current_row(&mut self, row: Option<u32>) {
        self.current_row = row;
    }

    pub fn current_sheet(&self) -> Option<&str> {
        self.current_sheet.as_deref()
    }

    /// Forget memoized results
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Fill in table bounds and absent sheet names for every component
    pub fn resolve(&mut self, address: &Address) -> Result<Address> {
        let uses_row = address
            .components()
            .filter_map(Address::table)
            .any(|t| t.regions().contains(&TableRegion::ThisRow));
        let key = (address.clone(), if uses_row { self.current_row } else { None });

        if let Some(hit) = self.cache.get(&key) {
            trace!("resolver cache hit for {}", address);
            return Ok(hit.clone());
        }
        trace!("resolver cache miss for {}", address);

        let parts = address
            .components()
            .map(|component| self.resolve_component(component))
            .collect::<Result<Vec<_>>>()?;
        let resolved = Address::from_components(parts)
            .ok_or_else(|| Error::Parse(format!("empty address '{}'", address)))?;

        self.cache.insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Check that every sheet named by a local (non-external) component exists
    pub fn validate_sheets<S: SheetLookup + ?Sized>(&self, address: &Address, sheets: &S) -> Result<()> {
        for component in address.components() {
            if component.workbook().is_some() {
                continue;
            }
            if let Some(sheet) = component.sheet() {
                if !sheets.sheet_exists(sheet) {
                    return Err(Error::InvalidRange(format!("unknown sheet '{}'", sheet)));
                }
            }
        }
        Ok(())
    }

    fn resolve_component(&self, component: &Address) -> Result<Address> {
        let mut out = match component.table() {
            Some(table) => {
                let (bounds, sheet) = self.table_bounds(table)?;
                let bounds = match component.workbook() {
                    Some(workbook) => bounds.with_workbook(workbook),
                    None => bounds,
                };
                match component.sheet().map(str::to_string).or(sheet) {
                    Some(sheet) => bounds.with_sheet(sheet),
                    None => bounds,
                }
            }
            None => component.primary(),
        };

        if out.sheet().is_none() {
            if let Some(sheet) = &self.current_sheet {
                out = out.with_sheet(sheet.clone());
            }
        }
        Ok(out)
    }

    fn table_bounds(&self, table: &TableRef) -> Result<(Address, Option<String>)> {
        let name = table.name();
        let geometry = self
            .tables
            .resolve_table(name)
            .ok_or_else(|| Error::UnresolvedTable(format!("unknown table '{}'", name)))?;
        let b = &geometry.bounds;
        if !b.has_bounds() {
            return Err(Error::UnresolvedTable(format!(
                "table '{}' has no literal bounds",
                name
            )));
        }

        let data_from = b.from_row() + geometry.show_header as u32;
        let data_to = b.to_row().saturating_sub(geometry.show_total as u32);

        let regions: &[TableRegion] = if table.regions().is_empty() {
            &[TableRegion::Data]
        } else {
            table.regions()
        };

        let mut rows: Option<(u32, u32)> = None;
        for region in regions {
            let span = match region {
                TableRegion::All => (b.from_row(), b.to_row()),
                TableRegion::Headers if geometry.show_header => (b.from_row(), b.from_row()),
                TableRegion::Totals if geometry.show_total => (b.to_row(), b.to_row()),
                TableRegion::Data if data_from <= data_to => (data_from, data_to),
                TableRegion::ThisRow => match self.current_row {
                    Some(row) if row >= data_from && row <= data_to => (row, row),
                    Some(row) => {
                        return Err(Error::UnresolvedTable(format!(
                            "row {} is outside the data rows of table '{}'",
                            row, name
                        )))
                    }
                    None => {
                        return Err(Error::UnresolvedTable(format!(
                            "'{}' needs a current row",
                            table
                        )))
                    }
                },
                other => {
                    return Err(Error::UnresolvedTable(format!(
                        "table '{}' has no {} row",
                        name,
                        other.keyword()
                    )))
                }
            };
            rows = Some(match rows {
                None => span,
                Some((from, to)) => (from.min(span.0), to.max(span.1)),
            });
        }
        let (from_row, to_row) = rows.unwrap_or((data_from, data_to));

        let (from_col, to_col) = match table.columns() {
            None => (b.from_col(), b.to_col()),
            Some((first, last)) => {
                let a = column_index(&geometry, name, first)?;
                let z = match last {
                    Some(last) => column_index(&geometry, name, last)?,
                    None => a,
                };
                (a.min(z), a.max(z))
            }
        };

        let bounds = Address::new(from_row, from_col, to_row, to_col)?;
        Ok((bounds, b.sheet().map(str::to_string)))
    }
}

fn column_index(geometry: &TableGeometry, table: &str, column: &str) -> Result<u32> {
    let wanted = column.to_lowercase();
    geometry
        .columns
        .iter()
        .position(|c| c.to_lowercase() == wanted)
        .map(|i| geometry.bounds.from_col() + i as u32)
        .ok_or_else(|| {
            Error::UnresolvedTable(format!("table '{}' has no column '{}'", table, column))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sales(name: &str) -> Option<TableGeometry> {
        if !name.eq_ignore_ascii_case("Sales") {
            return None;
        }
        Some(TableGeometry {
            bounds: Address::parse("Data!B2:E12").unwrap(),
            show_header: true,
            show_total: true,
            columns: vec![
                "Item".to_string(),
                "Price".to_string(),
                "Qty".to_string(),
                "Total".to_string(),
            ],
        })
    }

    fn resolve(text: &str) -> Result<Address> {
        let mut resolver = AddressResolver::new(&sales).with_current_sheet("Main");
        resolver.resolve(&Address::parse(text).unwrap())
    }

    #[test]
    fn test_resolve_regions() {
        assert_eq!(resolve("Sales[#All]").unwrap().to_text(), "Data!B2:E12");
        assert_eq!(resolve("Sales[#Data]").unwrap().to_text(), "Data!B3:E11");
        assert_eq!(resolve("Sales[]").unwrap().to_text(), "Data!B3:E11");
        assert_eq!(resolve("Sales[#Headers]").unwrap().to_text(), "Data!B2:E2");
        assert_eq!(resolve("Sales[#Totals]").unwrap().to_text(), "Data!B12:E12");
        assert_eq!(
            resolve("Sales[[#Headers],[#Data]]").unwrap().to_text(),
            "Data!B2:E11"
        );
    }

    #[test]
    fn test_resolve_columns() {
        assert_eq!(resolve("Sales[Price]").unwrap().to_text(), "Data!C3:C11");
        assert_eq!(
            resolve("sales[[#All],[qty]:[Price]]").unwrap().to_text(),
            "Data!C2:D12"
        );
        assert!(matches!(
            resolve("Sales[Discount]"),
            Err(Error::UnresolvedTable(_))
        ));
        assert!(matches!(resolve("Orders[#All]"), Err(Error::UnresolvedTable(_))));
    }

    #[test]
    fn test_resolve_this_row() {
        let mut resolver = AddressResolver::new(&sales);
        let addr = Address::parse("Sales[@Qty]").unwrap();
        assert!(matches!(
            resolver.resolve(&addr),
            Err(Error::UnresolvedTable(_))
        ));

        resolver.set_current_row(Some(5));
        assert_eq!(resolver.resolve(&addr).unwrap().to_text(), "Data!D5");
        resolver.set_current_row(Some(7));
        assert_eq!(resolver.resolve(&addr).unwrap().to_text(), "Data!D7");
        resolver.set_current_row(Some(12));
        assert!(resolver.resolve(&addr).is_err());
    }

    #[test]
    fn test_resolve_fills_current_sheet() {
        assert_eq!(resolve("A1:B2,Other!C3").unwrap().to_text(), "Main!A1:B2,Other!C3");
    }

    #[test]
    fn test_resolve_uses_cache() {
        let mut resolver = AddressResolver::new(&sales);
        let addr = Address::parse("Sales[Item]").unwrap();
        let first = resolver.resolve(&addr).unwrap();
        assert_eq!(resolver.cache.len(), 1);
        let second = resolver.resolve(&addr).unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.cache.len(), 1);
        resolver.clear_cache();
        assert!(resolver.cache.is_empty());
    }

    #[test]
    fn test_hidden_header_row() {
        let plain = |_: &str| {
            Some(TableGeometry {
                bounds: Address::parse("A1:B5").unwrap(),
                show_header: false,
                show_total: false,
                columns: vec!["X".to_string(), "Y".to_string()],
            })
        };
        let mut resolver = AddressResolver::new(&plain);
        let headers = Address::parse("T[#Headers]").unwrap();
        assert!(matches!(
            resolver.resolve(&headers),
            Err(Error::UnresolvedTable(_))
        ));
        let data = Address::parse("T[Y]").unwrap();
        assert_eq!(resolver.resolve(&data).unwrap().to_text(), "B1:B5");
    }

    #[test]
    fn test_validate_sheets() {
        let resolver = AddressResolver::new(&sales);
        let sheets = vec!["Data".to_string(), "Main".to_string()];
        let ok = Address::parse("Data!A1,main!B2,[1]Missing!C3").unwrap();
        assert_eq!(ok.siblings()[1].workbook(), Some("1"));
        assert!(resolver.validate_sheets(&ok, &sheets).is_ok());
        let bad = Address::parse("Nope!A1").unwrap();
        assert!(matches!(
            resolver.validate_sheets(&bad, &sheets),
            Err(Error::InvalidRange(_))
        ));
    }
}
