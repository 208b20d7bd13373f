//! # sheetref-formula
//!
//! Formula-level services for sheetref.
//!
//! This crate provides:
//! - A lightweight formula tokenizer that finds references in formula text
//! - Formula rebasing (moving a template from one cell to another)
//! - A1 / R1C1 formula translation
//! - The shared formula table that binds one template to a rectangle of cells
//!
//! ## Example
//!
//! ```rust
//! use sheetref_formula::{rebase, to_r1c1_formula};
//!
//! assert_eq!(rebase("=SUM(A1:A3)", 1, 2, 5, 2), "=SUM(A5:A7)");
//! assert_eq!(to_r1c1_formula("=A1", 2, 2), "=R[-1]C[-1]");
//! ```

pub mod rebase;
pub mod shared;
pub mod slots;
pub mod tokens;

pub use rebase::{from_r1c1_formula, rebase, to_r1c1_formula};
pub use shared::{
    CellWrite, FormulaKind, SharedFormula, SharedFormulaTable, SplitPolicy, ARRAY_INDEX_BIT,
};
pub use slots::{FormulaSlot, SlotStorage, WorksheetContext};
pub use tokens::{join_tokens, tokenize_formula, FormulaToken, Notation};
