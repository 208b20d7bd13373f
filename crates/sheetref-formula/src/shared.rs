//! Shared and array formula table
//!
//! Each entry binds one formula template to a rectangle of a worksheet.
//! The cells of the rectangle hold the entry's index in their formula slot
//! rather than the formula text. Entry rectangles never overlap.

use crate::rebase::rebase;
use crate::slots::{FormulaSlot, WorksheetContext};
use log::{debug, warn};
use sheetref_core::{Address, Collision, Error, Result};
use std::collections::BTreeMap;

/// Indices at or above this bit belong to array formulas
pub const ARRAY_INDEX_BIT: u32 = 0x4000_0000;

/// How a formula covers its rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormulaKind {
    /// Shared formula: each cell sees the template moved to its own position
    Normal,
    /// Array formula: one expression for the whole rectangle
    Array,
    /// What-if data table
    DataTable,
}

/// One entry of the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFormula {
    index: u32,
    template: String,
    bounds: Address,
    kind: FormulaKind,
}

impl SharedFormula {
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Formula text as seen from the top-left cell
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Rectangle owned by the entry (without sheet qualifier)
    pub fn bounds(&self) -> &Address {
        &self.bounds
    }

    pub fn kind(&self) -> FormulaKind {
        self.kind
    }

    pub fn is_array(&self) -> bool {
        self.kind == FormulaKind::Array
    }

    /// Literal formula of one cell of the rectangle
    pub fn formula_at(&self, row: u32, col: u32) -> String {
        match self.kind {
            FormulaKind::Normal => rebase(
                &self.template,
                self.bounds.from_row(),
                self.bounds.from_col(),
                row,
                col,
            ),
            FormulaKind::Array | FormulaKind::DataTable => self.template.clone(),
        }
    }
}

/// When a partly overwritten entry is split
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SplitPolicy {
    /// Split only when the overwrite covers the entry's top-left cell.
    /// Otherwise the entry keeps its full rectangle and a warning is logged.
    #[default]
    AnchorOnly,
    /// Always split around the overwritten part
    Partition,
}

/// What is written into a range
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellWrite {
    /// A plain value (the formula slots are cleared)
    Value,
    /// A formula, shared over the range when it covers more than one cell
    Formula(String),
    /// An array formula over the range
    ArrayFormula(String),
}

/// Pending worksheet update
#[derive(Debug)]
enum SlotWrite {
    Slot(u32, u32, FormulaSlot),
    /// Every slot in the rectangle becomes empty
    Clear(Address),
}

/// Shared formula entries of one worksheet, keyed by index
///
/// # Examples
/// ```
/// use sheetref_core::Address;
/// use sheetref_formula::{CellWrite, FormulaKind, SharedFormulaTable, SlotStorage, SplitPolicy};
///
/// let mut sheet = SlotStorage::new("Sheet1");
/// let mut table = SharedFormulaTable::with_policy(SplitPolicy::Partition);
///
/// let range = Address::parse("A1:A5").unwrap();
/// table.create(&mut sheet, &range, "=B1*2", FormulaKind::Normal).unwrap();
/// assert_eq!(table.formula_at(&sheet, 4, 1).as_deref(), Some("=B4*2"));
///
/// let a3 = Address::parse("A3").unwrap();
/// table.write_overwriting(&mut sheet, &a3, CellWrite::Value).unwrap();
/// let parts: Vec<String> = table.iter().map(|f| f.bounds().to_text()).collect();
/// assert_eq!(parts, vec!["A1:A2", "A4:A5"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SharedFormulaTable {
    entries: BTreeMap<u32, SharedFormula>,
    policy: SplitPolicy,
}

impl SharedFormulaTable {
    /// Create an empty table with the default split policy
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: SplitPolicy) -> Self {
        Self {
            entries: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> SplitPolicy {
        self.policy
    }

    pub fn set_policy(&mut self, policy: SplitPolicy) {
        self.policy = policy;
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Get an entry by index
    pub fn get(&self, index: u32) -> Option<&SharedFormula> {
        self.entries.get(&index)
    }

    /// Iterate over entries in index order
    pub fn iter(&self) -> impl Iterator<Item = &SharedFormula> {
        self.entries.values()
    }

    /// Index of the entry owning a cell
    pub fn lookup(&self, row: u32, col: u32) -> Option<u32> {
        self.entries
            .values()
            .find(|entry| entry.bounds.contains(row, col))
            .map(SharedFormula::index)
    }

    /// Literal formula of a cell, following its slot
    pub fn formula_at<C: WorksheetContext + ?Sized>(
        &self,
        ctx: &C,
        row: u32,
        col: u32,
    ) -> Option<String> {
        match ctx.formula_slot(row, col) {
            FormulaSlot::Empty => None,
            FormulaSlot::Text(text) => Some(text),
            FormulaSlot::Shared(index) => self.get(index).map(|f| f.formula_at(row, col)),
        }
    }

    /// Bind a formula to a range.
    ///
    /// A single-cell normal formula is not an entry: it is stored as text in
    /// the cell's slot. Fails with [`Error::InvalidOperation`] for the whole
    /// sheet, a multi-range address, or a range overlapping an existing entry.
    pub fn create<C: WorksheetContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        bounding: &Address,
        template: &str,
        kind: FormulaKind,
    ) -> Result<FormulaSlot> {
        check_target(ctx, bounding)?;
        if bounding.is_multi() {
            return Err(Error::InvalidOperation(format!(
                "{:?} formula needs a single rectangle, got '{}'",
                kind, bounding
            )));
        }

        let (slot, writes) = self.create_entry(&bounding.local_bounds(), template, kind)?;
        apply(ctx, writes);
        Ok(slot)
    }

    /// Write a value or formula over `target`, first removing or splitting
    /// every entry it collides with.
    ///
    /// All checks run before anything changes: on error neither the table nor
    /// the worksheet is modified.
    pub fn write_overwriting<C: WorksheetContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        target: &Address,
        write: CellWrite,
    ) -> Result<()> {
        check_target(ctx, target)?;
        if matches!(write, CellWrite::ArrayFormula(_)) && target.is_multi() {
            return Err(Error::InvalidOperation(format!(
                "array formula cannot span the multi-range address '{}'",
                target
            )));
        }

        // Work on a copy so a failure half way leaves everything untouched
        let mut staged = self.clone();
        let mut writes = Vec::new();
        for component in target.components() {
            let rect = component.local_bounds();
            writes.extend(staged.overwrite_one(&rect, &write)?);
        }

        *self = staged;
        apply(ctx, writes);
        Ok(())
    }

    /// Split entry `index` around `overwrite`.
    ///
    /// The parts of the entry outside `overwrite` become up to four new
    /// entries (top, left, right, bottom), each with its template moved to
    /// its own top-left cell. Cells inside `overwrite` lose their formula.
    pub fn split<C: WorksheetContext + ?Sized>(
        &mut self,
        ctx: &mut C,
        overwrite: &Address,
        index: u32,
    ) -> Result<()> {
        check_target(ctx, overwrite)?;
        let writes = self.split_entry(&overwrite.local_bounds(), index)?;
        apply(ctx, writes);
        Ok(())
    }

    fn overwrite_one(&mut self, rect: &Address, write: &CellWrite) -> Result<Vec<SlotWrite>> {
        let colliding: Vec<u32> = self
            .entries
            .values()
            .filter(|entry| rect.collide_ignoring_sheet(&entry.bounds) != Collision::No)
            .map(SharedFormula::index)
            .collect();

        let mut writes = Vec::new();
        for index in colliding {
            writes.extend(self.resolve_overlap(rect, index)?);
        }

        match write {
            CellWrite::Value => writes.push(SlotWrite::Clear(rect.clone())),
            CellWrite::Formula(text) => {
                let (_, created) = self.create_entry(rect, text, FormulaKind::Normal)?;
                writes.extend(created);
            }
            CellWrite::ArrayFormula(text) => {
                let (_, created) = self.create_entry(rect, text, FormulaKind::Array)?;
                writes.extend(created);
            }
        }
        Ok(writes)
    }

    fn resolve_overlap(&mut self, rect: &Address, index: u32) -> Result<Vec<SlotWrite>> {
        let Some(entry) = self.entries.get(&index) else {
            return Ok(Vec::new());
        };

        match rect.collide_ignoring_sheet(&entry.bounds) {
            Collision::No => Ok(Vec::new()),
            Collision::Equal | Collision::Inside => {
                debug!("removing formula {} over {}", index, entry.bounds);
                let writes = vec![SlotWrite::Clear(entry.bounds.clone())];
                self.entries.remove(&index);
                Ok(writes)
            }
            Collision::Partly => {
                if entry.is_array() {
                    return Err(partial_array(entry));
                }
                let anchor = Address::cell(entry.bounds.from_row(), entry.bounds.from_col())?;
                let anchor_hit = rect.collide_ignoring_sheet(&anchor) >= Collision::Inside;
                if anchor_hit || self.policy == SplitPolicy::Partition {
                    self.split_entry(rect, index)
                } else {
                    warn!(
                        "overwrite of {} leaves shared formula {} over {} in place",
                        rect, index, entry.bounds
                    );
                    Ok(Vec::new())
                }
            }
        }
    }

    fn split_entry(&mut self, rect: &Address, index: u32) -> Result<Vec<SlotWrite>> {
        let entry = self
            .entries
            .get(&index)
            .cloned()
            .ok_or_else(|| Error::InvalidOperation(format!("no shared formula {}", index)))?;

        let collision = rect.collide_ignoring_sheet(&entry.bounds);
        if collision == Collision::No {
            return Ok(Vec::new());
        }
        if entry.is_array() && collision == Collision::Partly {
            return Err(partial_array(&entry));
        }

        let fragments: Vec<Address> = entry
            .bounds
            .intersect_reversed(rect)
            .map(|parts| parts.components().map(Address::primary).collect())
            .unwrap_or_default();

        let mut writes: Vec<SlotWrite> = Vec::new();
        if let Some(cleared) = entry.bounds.intersect(rect) {
            writes.push(SlotWrite::Clear(cleared));
        }

        // New indices are taken while the old entry still exists
        let mut created = Vec::with_capacity(fragments.len());
        for fragment in fragments {
            let new_index = self.next_index(entry.kind);
            let template = match entry.kind {
                FormulaKind::Normal => rebase(
                    &entry.template,
                    entry.bounds.from_row(),
                    entry.bounds.from_col(),
                    fragment.from_row(),
                    fragment.from_col(),
                ),
                FormulaKind::Array | FormulaKind::DataTable => entry.template.clone(),
            };
            writes.extend(
                fragment
                    .cells()
                    .map(|(row, col)| SlotWrite::Slot(row, col, FormulaSlot::Shared(new_index))),
            );
            created.push(fragment.to_text());
            self.entries.insert(
                new_index,
                SharedFormula {
                    index: new_index,
                    template,
                    bounds: fragment,
                    kind: entry.kind,
                },
            );
        }
        self.entries.remove(&index);

        debug!(
            "split formula {} over {} around {} into [{}]",
            index,
            entry.bounds,
            rect,
            created.join(", ")
        );
        Ok(writes)
    }

    fn create_entry(
        &mut self,
        bounds: &Address,
        template: &str,
        kind: FormulaKind,
    ) -> Result<(FormulaSlot, Vec<SlotWrite>)> {
        if bounds.is_full_row() && bounds.is_full_column() {
            return Err(Error::InvalidOperation(
                "cannot set a formula over the whole sheet".to_string(),
            ));
        }

        if kind == FormulaKind::Normal && bounds.is_single_cell() {
            let slot = FormulaSlot::Text(template.to_string());
            let write = SlotWrite::Slot(bounds.from_row(), bounds.from_col(), slot.clone());
            return Ok((slot, vec![write]));
        }

        if let Some(other) = self
            .entries
            .values()
            .find(|entry| entry.bounds.collide_ignoring_sheet(bounds) != Collision::No)
        {
            return Err(Error::InvalidOperation(format!(
                "{} overlaps shared formula {} over {}",
                bounds, other.index, other.bounds
            )));
        }

        let index = self.next_index(kind);
        self.entries.insert(
            index,
            SharedFormula {
                index,
                template: template.to_string(),
                bounds: bounds.clone(),
                kind,
            },
        );
        debug!("created {:?} formula {} over {}", kind, index, bounds);

        let slot = FormulaSlot::Shared(index);
        let writes = bounds
            .cells()
            .map(|(row, col)| SlotWrite::Slot(row, col, slot.clone()))
            .collect();
        Ok((slot, writes))
    }

    fn next_index(&self, kind: FormulaKind) -> u32 {
        let mut index = self.entries.len() as u32 + 1;
        if kind == FormulaKind::Array {
            index |= ARRAY_INDEX_BIT;
        }
        while self.entries.contains_key(&index) {
            index += 1;
        }
        index
    }
}

fn check_target<C: WorksheetContext + ?Sized>(ctx: &C, target: &Address) -> Result<()> {
    for component in target.components() {
        if !component.has_bounds() {
            return Err(Error::InvalidRange(format!(
                "'{}' has no literal bounds",
                component.primary()
            )));
        }
        if let Some(sheet) = component.sheet() {
            if sheet.to_lowercase() != ctx.sheet_name().to_lowercase() {
                return Err(Error::InvalidOperation(format!(
                    "'{}' is not on sheet '{}'",
                    component.primary(),
                    ctx.sheet_name()
                )));
            }
        }
    }
    Ok(())
}

fn partial_array(entry: &SharedFormula) -> Error {
    Error::InvalidOperation(format!(
        "cannot overwrite part of the array formula over {}",
        entry.bounds
    ))
}

fn apply<C: WorksheetContext + ?Sized>(ctx: &mut C, writes: Vec<SlotWrite>) {
    for write in writes {
        match write {
            SlotWrite::Slot(row, col, slot) => ctx.set_formula_slot(row, col, slot),
            SlotWrite::Clear(range) => ctx.clear_formula_slots(&range),
        }
    }
}
