//! # sheetref-core
//!
//! Address engine for the sheetref spreadsheet library.
//!
//! This crate provides the positional model every other part of a workbook
//! builds on:
//! - [`Address`] - A parsed, normalized cell reference (single range, multi-range,
//!   structured table reference or `#REF!`)
//! - [`Collision`] - Range algebra (collision, intersection, difference)
//! - [`ShiftOptions`] - Row/column insert and delete transforms
//! - [`AddressResolver`] - On-demand resolution of table references and sheet names
//!
//! ## Example
//!
//! ```rust
//! use sheetref_core::{Address, Collision};
//!
//! let outer = Address::parse("Sheet1!A1:C3").unwrap();
//! let inner = Address::parse("Sheet1!B2").unwrap();
//! assert_eq!(outer.collide(&inner), Collision::Inside);
//!
//! let ring = outer.intersect_reversed(&inner).unwrap();
//! assert_eq!(ring.to_local_text(), "A1:C1,A2,C2,A3:C3");
//! ```

pub mod address;
pub mod collision;
pub mod error;
pub mod resolve;
pub mod sheet;
pub mod shift;

pub use address::{
    classify, column_to_letters, is_formula, letters_to_column, Address, AddressType, TableRef,
    TableRegion,
};
pub use collision::Collision;
pub use error::{Error, Result};
pub use resolve::{AddressResolver, SheetLookup, TableGeometry, TableLookup};
pub use sheet::{needs_quoting, quote_sheet_name};
pub use shift::ShiftOptions;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u32 = 16_384;
