//! # sheetref
//!
//! A Rust library for working with spreadsheet addresses.
//!
//! sheetref parses, normalizes and transforms the references found in
//! Excel-style workbooks, and keeps shared formulas consistent while their
//! cells are overwritten.
//!
//! ## Features
//!
//! - A1 and R1C1 references, multi-ranges, structured table references
//! - Range algebra: collision, intersection, difference
//! - Row and column insertion and deletion
//! - Shared and array formula tables with splitting on overwrite
//! - Formula rebasing and A1 / R1C1 formula translation
//!
//! ## Example
//!
//! ```rust
//! use sheetref::prelude::*;
//!
//! let range = Address::parse("'Q1 Data'!$A$1:A10").unwrap();
//! assert_eq!(range.sheet(), Some("Q1 Data"));
//!
//! // Delete rows 5..7
//! let shifted = range.delete_rows(5, 3, &ShiftOptions::default()).unwrap();
//! assert_eq!(shifted.to_text(), "'Q1 Data'!$A$1:A7");
//!
//! // Keep a shared formula consistent while a cell is overwritten
//! let mut sheet = SlotStorage::new("Q1 Data");
//! let mut table = SharedFormulaTable::with_policy(SplitPolicy::Partition);
//! table
//!     .create(&mut sheet, &Address::parse("B1:B5").unwrap(), "=A1*2", FormulaKind::Normal)
//!     .unwrap();
//! table
//!     .write_overwriting(&mut sheet, &Address::parse("B3").unwrap(), CellWrite::Value)
//!     .unwrap();
//! assert_eq!(table.formula_at(&sheet, 5, 2).as_deref(), Some("=A5*2"));
//! ```

pub mod prelude;

// Re-export core types
pub use sheetref_core::{
    // Address model
    address::RefPart,
    classify,
    column_to_letters,
    is_formula,
    letters_to_column,
    needs_quoting,
    quote_sheet_name,
    Address,
    // Resolution
    AddressResolver,
    AddressType,
    // Range algebra
    Collision,
    // Error types
    Error,
    Result,
    SheetLookup,
    // Structural shifts
    ShiftOptions,
    TableGeometry,
    TableLookup,
    TableRef,
    TableRegion,
    // Constants
    MAX_COLS,
    MAX_ROWS,
};

// Re-export formula types
pub use sheetref_formula::{
    from_r1c1_formula, rebase, to_r1c1_formula, CellWrite, FormulaKind, FormulaSlot,
    SharedFormula, SharedFormulaTable, SlotStorage, SplitPolicy, WorksheetContext,
    ARRAY_INDEX_BIT,
};
