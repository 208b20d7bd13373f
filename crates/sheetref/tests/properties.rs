//! Property tests for the address model, range algebra, shifts and splits

use proptest::prelude::*;
use sheetref::prelude::*;
use std::collections::HashMap;

const SHEETS: [Option<&str>; 5] = [None, Some("Sheet1"), Some("My Sheet"), Some("Bob's"), Some("2024")];

fn config() -> ProptestConfig {
    ProptestConfig {
        cases: 256,
        failure_persistence: None,
        max_global_rejects: 8192,
        ..ProptestConfig::default()
    }
}

/// Small rectangles near the top-left corner so they often collide
fn rect() -> impl Strategy<Value = Address> {
    (1u32..=30, 1u32..=30, 0u32..=12, 0u32..=12).prop_map(|(row, col, height, width)| {
        Address::new(row, col, row + height, col + width).unwrap()
    })
}

fn address() -> impl Strategy<Value = Address> {
    (rect(), any::<[bool; 4]>(), 0usize..SHEETS.len()).prop_map(|(rect, flags, sheet)| {
        let addr = rect.with_fixed(flags[0], flags[1], flags[2], flags[3]);
        match SHEETS[sheet] {
            Some(name) => addr.with_sheet(name),
            None => addr,
        }
    })
}

fn cell_counts<'a>(parts: impl Iterator<Item = &'a Address>) -> HashMap<(u32, u32), usize> {
    let mut counts = HashMap::new();
    for part in parts {
        for cell in part.cells() {
            *counts.entry(cell).or_insert(0) += 1;
        }
    }
    counts
}

proptest! {
    #![proptest_config(config())]

    #[test]
    fn prop_text_round_trip(addr in address()) {
        let text = addr.to_text();
        let parsed = Address::parse(&text).unwrap();
        prop_assert_eq!(parsed, addr);
    }

    #[test]
    fn prop_collision_symmetry(a in rect(), b in rect()) {
        let ab = a.collide(&b);
        let ba = b.collide(&a);
        prop_assert_eq!(ab == Collision::No, ba == Collision::No);
        prop_assert_eq!(ab == Collision::Equal, ba == Collision::Equal);
        if ab == Collision::Inside {
            prop_assert_eq!(ba, Collision::Partly);
        }
    }

    #[test]
    fn prop_intersection_and_difference_tile(a in rect(), b in rect()) {
        prop_assume!(a.collide(&b) != Collision::No);

        let inner = a.intersect(&b).unwrap();
        let outer = a.intersect_reversed(&b);
        let parts: Vec<&Address> = std::iter::once(&inner)
            .chain(outer.iter().flat_map(|o| o.components()))
            .collect();

        let counts = cell_counts(parts.into_iter());
        prop_assert_eq!(counts.len() as u64, a.cell_count());
        prop_assert!(counts.values().all(|n| *n == 1));
        prop_assert!(counts.keys().all(|(row, col)| a.contains(*row, *col)));
    }

    #[test]
    fn prop_insert_after_range_is_identity(addr in address(), gap in 1u32..50, count in 1u32..20) {
        let opts = ShiftOptions::default();
        let rows = addr.insert_rows(addr.to_row() + gap, count, &opts).unwrap();
        prop_assert_eq!(&rows, &addr);
        let cols = addr.insert_columns(addr.to_col() + gap, count, &opts).unwrap();
        prop_assert_eq!(&cols, &addr);
    }

    #[test]
    fn prop_split_partitions_entry(entry in rect(), overwrite in rect()) {
        prop_assume!(!entry.is_single_cell());

        let mut sheet = SlotStorage::new("Sheet1");
        let mut table = SharedFormulaTable::with_policy(SplitPolicy::Partition);
        table.create(&mut sheet, &entry, "=A1", FormulaKind::Normal).unwrap();
        table.write_overwriting(&mut sheet, &overwrite, CellWrite::Value).unwrap();

        // Surviving fragments never overlap each other or the overwrite
        let fragments: Vec<&Address> = table.iter().map(|f| f.bounds()).collect();
        let counts = cell_counts(fragments.iter().copied());
        prop_assert!(counts.values().all(|n| *n == 1));

        for (row, col) in entry.cells() {
            let covered = counts.contains_key(&(row, col));
            prop_assert_eq!(covered, !overwrite.contains(row, col));
        }
        prop_assert!(counts.keys().all(|(row, col)| entry.contains(*row, *col)));
    }
}
