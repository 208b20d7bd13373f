//! Parsing, formatting and classification of address text

use pretty_assertions::assert_eq;
use sheetref::prelude::*;
use sheetref::{classify, needs_quoting, MAX_COLS, MAX_ROWS};

/// A repeated qualifier on both ends of a range collapses into one
#[test]
fn test_duplicate_sheet_qualifier_collapses() {
    let addr = Address::parse("Sheet1!A1:Sheet1!A3").unwrap();
    assert_eq!(addr.sheet(), Some("Sheet1"));
    assert_eq!(
        (addr.from_row(), addr.from_col(), addr.to_row(), addr.to_col()),
        (1, 1, 3, 1)
    );
    assert_eq!(addr.to_text(), "Sheet1!A1:A3");
}

/// Contradicting qualifiers give a broken reference rather than an error
#[test]
fn test_conflicting_sheet_qualifiers_become_ref_error() {
    let addr = Address::parse("Sheet1!A1:Sheet2!A3").unwrap();
    assert!(addr.is_ref_error());
    assert!(!addr.has_bounds());
}

#[test]
fn test_quoted_sheet_single_cell() {
    let addr = Address::parse("'My Sheet'!B2").unwrap();
    assert_eq!(addr.sheet(), Some("My Sheet"));
    assert_eq!(
        (addr.from_row(), addr.from_col(), addr.to_row(), addr.to_col()),
        (2, 2, 2, 2)
    );
    assert!(addr.is_single_cell());
    assert_eq!(addr.to_text(), "'My Sheet'!B2");
}

#[test]
fn test_external_workbook() {
    let addr = Address::parse("[3]Budget!$C$4").unwrap();
    assert_eq!(addr.workbook(), Some("3"));
    assert_eq!(addr.sheet(), Some("Budget"));
    assert!(addr.from_row_fixed() && addr.from_col_fixed());
    assert_eq!(addr.to_text(), "[3]Budget!$C$4");
}

#[test]
fn test_multi_range_keeps_order() {
    let addr: Address = "D4,A1:B2,'Q 2'!C3".parse().unwrap();
    assert_eq!(addr.siblings().len(), 2);
    let cells: Vec<u64> = addr.components().map(Address::cell_count).collect();
    assert_eq!(cells, vec![1, 4, 1]);
    assert_eq!(addr.to_text(), "D4,A1:B2,'Q 2'!C3");
}

#[test]
fn test_rows_and_columns_span_the_sheet() {
    let rows = Address::parse("3:5").unwrap();
    assert!(rows.is_full_row());
    assert_eq!(rows.col_count(), MAX_COLS);

    let cols = Address::parse("B:D").unwrap();
    assert!(cols.is_full_column());
    assert_eq!(cols.row_count(), MAX_ROWS);
}

#[test]
fn test_table_reference_is_unresolved_until_looked_up() {
    let addr = Address::parse("Sales[[#Data],[Price]]").unwrap();
    assert!(addr.is_table());
    assert!(!addr.has_bounds());

    let tables = |name: &str| {
        name.eq_ignore_ascii_case("sales").then(|| TableGeometry {
            bounds: Address::parse("Report!A1:C6").unwrap(),
            show_header: true,
            show_total: false,
            columns: vec!["Item".into(), "Price".into(), "Qty".into()],
        })
    };
    let mut resolver = AddressResolver::new(&tables);
    let resolved = resolver.resolve(&addr).unwrap();
    assert_eq!(resolved.to_text(), "Report!B2:B6");
}

#[test]
fn test_validate_sheets() {
    let tables = |_: &str| -> Option<TableGeometry> { None };
    let resolver = AddressResolver::new(&tables);
    let sheets = vec!["Data".to_string(), "My Sheet".to_string()];

    let ok = Address::parse("data!A1,'My Sheet'!B2,[1]Elsewhere!C3").unwrap();
    assert!(resolver.validate_sheets(&ok, &sheets).is_ok());

    let missing = Address::parse("Summary!A1").unwrap();
    assert!(matches!(
        resolver.validate_sheets(&missing, &sheets),
        Err(Error::InvalidRange(_))
    ));
}

#[test]
fn test_parse_errors() {
    assert!(matches!(Address::parse(""), Err(Error::Parse(_))));
    assert!(matches!(Address::parse("'Unclosed!A1"), Err(Error::Parse(_))));
    assert!(matches!(Address::parse("Sales[Price"), Err(Error::Parse(_))));
    assert!(matches!(Address::parse("A1048577"), Err(Error::InvalidRange(_))));
}

#[test]
fn test_classification() {
    assert_eq!(classify("Sheet1!A1:B2"), AddressType::InternalAddress);
    assert_eq!(classify("'Q 1'!A1,'Q 2'!B2"), AddressType::InternalAddress);
    assert_eq!(classify("[1]Sheet1!A1"), AddressType::ExternalAddress);
    assert_eq!(classify("Sales[Qty]"), AddressType::InternalAddress);
    assert_eq!(classify("TaxRate"), AddressType::InternalName);
    assert_eq!(classify("SUM(A1:A3)"), AddressType::Formula);
    assert_eq!(classify("12.5"), AddressType::Invalid);
    assert_eq!(classify(""), AddressType::Invalid);
}

#[test]
fn test_sheet_quoting() {
    assert!(!needs_quoting("Sheet1"));
    assert!(needs_quoting("My Sheet"));
    assert!(needs_quoting("2024"));
    assert!(needs_quoting("R1C1"));

    let addr = Address::cell(1, 1).unwrap().with_sheet("Q1 Data");
    assert_eq!(addr.to_text(), "'Q1 Data'!A1");
}

#[test]
fn test_r1c1_round_trip() {
    let addr = Address::parse("Data!B2:$D$9").unwrap();
    let r1c1 = addr.to_r1c1(3, 3);
    assert_eq!(r1c1, "Data!R[-1]C[-1]:R9C4");
    assert_eq!(Address::from_r1c1(&r1c1, 3, 3).unwrap(), addr);
}
