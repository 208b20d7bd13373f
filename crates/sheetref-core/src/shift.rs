//! Structural shifts: rewrite an address after rows or columns are inserted
//! or deleted.
//!
//! Every operation returns a new [`Address`], or `None` when the edit
//! removes the range entirely.

use crate::address::Address;
use crate::{MAX_COLS, MAX_ROWS};

/// Options for structural shifts
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShiftOptions {
    /// `$`-anchored bounds keep their number when the edit happens before or over them
    pub keep_fixed: bool,
    /// Inserting directly below (or right of) the range grows it
    pub extend_at_end: bool,
}

/// One axis of a range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    from: u32,
    to: u32,
    from_fixed: bool,
    to_fixed: bool,
}

impl Span {
    fn insert(self, position: u32, count: u32, max: u32, options: &ShiftOptions) -> Option<Span> {
        let grow = |value: u32| value.saturating_add(count).min(max);

        if position > self.to {
            if options.extend_at_end && position == self.to + 1 {
                return Some(Span {
                    to: grow(self.to),
                    ..self
                });
            }
            return Some(self);
        }

        if position <= self.from {
            let moves = |fixed: bool| !(options.keep_fixed && fixed);
            let from = if moves(self.from_fixed) {
                if self.from as u64 + count as u64 > max as u64 {
                    return None;
                }
                self.from + count
            } else {
                self.from
            };
            let to = if moves(self.to_fixed) {
                grow(self.to)
            } else {
                self.to
            };
            return Some(Span {
                from,
                to: to.max(from),
                ..self
            });
        }

        // Inside the range: absorb the new rows
        Some(Span {
            to: grow(self.to),
            ..self
        })
    }

    fn delete(self, position: u32, count: u32, options: &ShiftOptions) -> Option<Span> {
        let end = position.saturating_add(count);

        if position > self.to {
            return Some(self);
        }

        let moves = |fixed: bool| !(options.keep_fixed && fixed);
        if end <= self.from {
            let from = if moves(self.from_fixed) {
                self.from - count
            } else {
                self.from
            };
            let to = if moves(self.to_fixed) {
                self.to - count
            } else {
                self.to
            };
            return Some(Span {
                from,
                to: to.max(from),
                ..self
            });
        }

        if position <= self.from && end > self.to {
            return None;
        }

        if position <= self.from {
            // The band eats the start of the range
            let from = if moves(self.from_fixed) {
                position
            } else {
                self.from
            };
            let to = if moves(self.to_fixed) {
                self.to - count
            } else {
                self.to
            };
            return Some(Span {
                from,
                to: to.max(from),
                ..self
            });
        }

        Some(Span {
            to: self.to.saturating_sub(count).max(position - 1),
            ..self
        })
    }
}

#[derive(Clone, Copy)]
enum Axis {
    Rows,
    Columns,
}

impl Address {
    /// Shift after inserting `count` rows before row `position`.
    ///
    /// # Examples
    /// ```
    /// use sheetref_core::{Address, ShiftOptions};
    ///
    /// let addr = Address::parse("A2:B4").unwrap();
    /// let opts = ShiftOptions::default();
    /// assert_eq!(addr.insert_rows(1, 2, &opts).unwrap().to_text(), "A4:B6");
    /// assert_eq!(addr.insert_rows(3, 2, &opts).unwrap().to_text(), "A2:B6");
    /// assert_eq!(addr.insert_rows(9, 2, &opts).unwrap(), addr);
    /// ```
    pub fn insert_rows(&self, position: u32, count: u32, options: &ShiftOptions) -> Option<Address> {
        let position = position.max(1);
        self.shift_each(Axis::Rows, |span| {
            span.insert(position, count, MAX_ROWS, options)
        })
    }

    /// Shift after deleting `count` rows starting at row `position`.
    ///
    /// Returns `None` if every range of the address is deleted.
    pub fn delete_rows(&self, position: u32, count: u32, options: &ShiftOptions) -> Option<Address> {
        let position = position.max(1);
        self.shift_each(Axis::Rows, |span| span.delete(position, count, options))
    }

    /// Shift after inserting `count` columns before column `position`
    pub fn insert_columns(
        &self,
        position: u32,
        count: u32,
        options: &ShiftOptions,
    ) -> Option<Address> {
        let position = position.max(1);
        self.shift_each(Axis::Columns, |span| {
            span.insert(position, count, MAX_COLS, options)
        })
    }

    /// Shift after deleting `count` columns starting at column `position`
    pub fn delete_columns(
        &self,
        position: u32,
        count: u32,
        options: &ShiftOptions,
    ) -> Option<Address> {
        let position = position.max(1);
        self.shift_each(Axis::Columns, |span| span.delete(position, count, options))
    }

    fn shift_each<F>(&self, axis: Axis, f: F) -> Option<Address>
    where
        F: Fn(Span) -> Option<Span>,
    {
        let shifted: Vec<Address> = self
            .components()
            .filter_map(|component| component.shift_one(axis, &f))
            .collect();
        Address::from_components(shifted)
    }

    fn shift_one<F>(&self, axis: Axis, f: &F) -> Option<Address>
    where
        F: Fn(Span) -> Option<Span>,
    {
        if !self.has_bounds() {
            return Some(self.primary());
        }

        match axis {
            Axis::Rows => {
                // Whole columns have no row bounds to move
                if self.is_full_column() {
                    return Some(self.primary());
                }
                let span = f(Span {
                    from: self.from_row(),
                    to: self.to_row(),
                    from_fixed: self.from_row_fixed(),
                    to_fixed: self.to_row_fixed(),
                })?;
                Some(self.with_bounds(span.from, self.from_col(), span.to, self.to_col()))
            }
            Axis::Columns => {
                if self.is_full_row() {
                    return Some(self.primary());
                }
                let span = f(Span {
                    from: self.from_col(),
                    to: self.to_col(),
                    from_fixed: self.from_col_fixed(),
                    to_fixed: self.to_col_fixed(),
                })?;
                Some(self.with_bounds(self.from_row(), span.from, self.to_row(), span.to))
            }
        }
    }
}
