//! Prelude module - common imports for sheetref users
//!
//! ```rust
//! use sheetref::prelude::*;
//! ```

pub use crate::{
    // Address model
    Address,
    AddressResolver,
    AddressType,
    // Formula tables
    CellWrite,
    Collision,

    // Error types
    Error,
    FormulaKind,
    FormulaSlot,
    Result,

    SharedFormulaTable,
    ShiftOptions,
    SlotStorage,
    SplitPolicy,
    TableGeometry,
    TableRef,
    TableRegion,
    WorksheetContext,
};
