//! Per-cell formula slots
//!
//! The shared formula table never owns cell data. It reads and writes the
//! formula slot of each cell through a [`WorksheetContext`] supplied by the
//! host worksheet.

use sheetref_core::Address;
use std::collections::BTreeMap;

/// What a cell holds in its formula slot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FormulaSlot {
    /// No formula (a plain value or an empty cell)
    #[default]
    Empty,
    /// Part of the shared or array formula with this index
    Shared(u32),
    /// A formula of its own
    Text(String),
}

impl FormulaSlot {
    pub fn is_empty(&self) -> bool {
        matches!(self, FormulaSlot::Empty)
    }

    /// The shared formula index, if any
    pub fn shared_index(&self) -> Option<u32> {
        match self {
            FormulaSlot::Shared(index) => Some(*index),
            _ => None,
        }
    }
}

/// Access to the worksheet a shared formula table belongs to
pub trait WorksheetContext {
    /// Name of the worksheet
    fn sheet_name(&self) -> &str;

    /// Formula slot of a cell (1-based)
    fn formula_slot(&self, row: u32, col: u32) -> FormulaSlot;

    /// Replace the formula slot of a cell (1-based)
    fn set_formula_slot(&mut self, row: u32, col: u32, slot: FormulaSlot);

    /// Empty every formula slot inside the primary rectangle of `range`.
    ///
    /// The default walks the rectangle cell by cell. Sparse storage should
    /// override it: a value written over whole rows or columns covers
    /// millions of cells.
    fn clear_formula_slots(&mut self, range: &Address) {
        for (row, col) in range.cells() {
            self.set_formula_slot(row, col, FormulaSlot::Empty);
        }
    }
}

/// Sparse row-based formula slot storage
///
/// Structure: `BTreeMap<row, BTreeMap<col, FormulaSlot>>`. Only non-empty
/// slots are stored.
#[derive(Debug, Clone, Default)]
pub struct SlotStorage {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u32, FormulaSlot>>,
}

impl SlotStorage {
    /// Create empty storage for a named sheet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
        }
    }

    /// Get a slot
    pub fn get(&self, row: u32, col: u32) -> Option<&FormulaSlot> {
        self.rows.get(&row).and_then(|r| r.get(&col))
    }

    /// Set a slot. Empty slots are removed.
    pub fn set(&mut self, row: u32, col: u32, slot: FormulaSlot) {
        if slot.is_empty() {
            self.remove(row, col);
        } else {
            self.rows.entry(row).or_default().insert(col, slot);
        }
    }

    /// Remove a slot
    pub fn remove(&mut self, row: u32, col: u32) -> Option<FormulaSlot> {
        let result = self.rows.get_mut(&row).and_then(|r| r.remove(&col));

        // Clean up empty rows
        if let Some(row_map) = self.rows.get(&row) {
            if row_map.is_empty() {
                self.rows.remove(&row);
            }
        }

        result
    }

    /// Remove every slot inside the primary rectangle of `range`
    pub fn clear(&mut self, range: &Address) {
        if !range.has_bounds() {
            return;
        }
        let cols = range.from_col()..=range.to_col();
        let mut emptied = Vec::new();
        for (&row, slots) in self.rows.range_mut(range.from_row()..=range.to_row()) {
            slots.retain(|col, _| !cols.contains(col));
            if slots.is_empty() {
                emptied.push(row);
            }
        }
        for row in emptied {
            self.rows.remove(&row);
        }
    }

    /// Number of non-empty slots
    pub fn len(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over non-empty slots in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &FormulaSlot)> {
        self.rows
            .iter()
            .flat_map(|(&row, cols)| cols.iter().map(move |(&col, slot)| (row, col, slot)))
    }
}

impl WorksheetContext for SlotStorage {
    fn sheet_name(&self) -> &str {
        &self.name
    }

    fn formula_slot(&self, row: u32, col: u32) -> FormulaSlot {
        self.get(row, col).cloned().unwrap_or_default()
    }

    fn set_formula_slot(&mut self, row: u32, col: u32, slot: FormulaSlot) {
        self.set(row, col, slot);
    }

    fn clear_formula_slots(&mut self, range: &Address) {
        self.clear(range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_storage_set_get_remove() {
        let mut storage = SlotStorage::new("Sheet1");
        storage.set(2, 3, FormulaSlot::Shared(1));
        storage.set(1, 1, FormulaSlot::Text("=A2".to_string()));
        assert_eq!(storage.get(2, 3), Some(&FormulaSlot::Shared(1)));
        assert_eq!(storage.len(), 2);

        storage.set(2, 3, FormulaSlot::Empty);
        assert_eq!(storage.get(2, 3), None);
        assert_eq!(storage.len(), 1);

        assert_eq!(
            storage.remove(1, 1),
            Some(FormulaSlot::Text("=A2".to_string()))
        );
        assert!(storage.is_empty());
    }

    #[test]
    fn test_iter_row_major() {
        let mut storage = SlotStorage::new("S");
        storage.set(2, 1, FormulaSlot::Shared(1));
        storage.set(1, 5, FormulaSlot::Shared(1));
        storage.set(1, 2, FormulaSlot::Shared(1));
        let cells: Vec<_> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(cells, vec![(1, 2), (1, 5), (2, 1)]);
    }

    #[test]
    fn test_clear_range() {
        let mut storage = SlotStorage::new("S");
        storage.set(1, 1, FormulaSlot::Shared(1));
        storage.set(2, 2, FormulaSlot::Shared(1));
        storage.set(2, 4, FormulaSlot::Text("=1".to_string()));
        storage.set(5, 2, FormulaSlot::Shared(2));

        storage.clear(&Address::parse("B1:C9").unwrap());
        let cells: Vec<_> = storage.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(cells, vec![(1, 1), (2, 4)]);

        storage.clear(&Address::whole_sheet());
        assert!(storage.is_empty());
    }

    #[test]
    fn test_context_defaults_to_empty() {
        let storage = SlotStorage::new("Data");
        assert_eq!(storage.sheet_name(), "Data");
        assert_eq!(storage.formula_slot(9, 9), FormulaSlot::Empty);
    }
}
