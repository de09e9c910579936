//! Property-based tests for sheetmap using proptest.

use proptest::prelude::*;
use sheetmap::{
    decode, export, format_integer, read_rows, CellValue, ExportRequest, FromRow, MemoryBook,
    Record, SheetLayout,
};

// ============================================================================
// Test helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq, Record, FromRow)]
struct Row {
    name: String,
    count: i64,
    small: i32,
    note: Option<String>,
}

#[derive(Debug, Clone, Record)]
struct Pair {
    key: String,
    value: u16,
}

#[derive(Debug, Clone, Record)]
struct Bundle {
    id: u32,
    pairs: Vec<Pair>,
}

// Names never start or end with spaces (text is trimmed on read) and never
// contain the emphasis marker.
fn row_strategy() -> impl Strategy<Value = Row> {
    (
        "[A-Z][A-Z0-9]{0,10}",
        any::<i64>(),
        any::<i32>(),
        proptest::option::of("[A-Z0-9]{1,8}"),
    )
        .prop_map(|(name, count, small, note)| Row {
            name,
            count,
            small,
            note,
        })
}

fn pair_strategy() -> impl Strategy<Value = Pair> {
    ("[a-z]{1,6}", any::<u16>()).prop_map(|(key, value)| Pair { key, value })
}

// ============================================================================
// Property tests
// ============================================================================

proptest! {
    /// Exported rows read back unchanged.
    #[test]
    fn export_then_read_round_trips(rows in prop::collection::vec(row_strategy(), 0..20)) {
        let mut book = MemoryBook::new();
        let request = ExportRequest::new("s", ["Name", "Count", "Small", "Note"]);
        export(&mut book, &request, &rows).unwrap();

        let back: Vec<Row> = read_rows(book.sheet(0).unwrap()).unwrap();
        prop_assert_eq!(back, rows);
    }

    /// A collection of N elements with M fields adds N×M cells; an empty one
    /// still occupies its column.
    #[test]
    fn flattening_adds_n_times_m_cells(pairs in prop::collection::vec(pair_strategy(), 0..10)) {
        let bundle = Bundle { id: 1, pairs: pairs.clone() };
        let mut book = MemoryBook::new();
        let summary = export(&mut book, &ExportRequest::new("s", ["Id"]), &[bundle]).unwrap();

        prop_assert_eq!(summary.widest_row, 1 + (pairs.len() * 2).max(1));

        let sheet = book.sheet(0).unwrap();
        for (index, pair) in pairs.iter().enumerate() {
            prop_assert_eq!(sheet.text(1, 1 + index * 2), Some(pair.key.as_str()));
            let value = pair.value.to_string();
            prop_assert_eq!(sheet.text(1, 2 + index * 2), Some(value.as_str()));
        }
    }

    /// Integral numbers decode to their decimal form.
    #[test]
    fn integral_numbers_decode_exactly(n in any::<i32>()) {
        prop_assert_eq!(decode(&CellValue::Number(f64::from(n))), n.to_string());
    }

    /// Fractional numbers decode to the nearest integer.
    #[test]
    fn fractions_round_to_nearest(n in 0i32..1_000_000, frac in 0.01f64..0.49) {
        let base = f64::from(n);
        prop_assert_eq!(format_integer(base + frac), n.to_string());
        prop_assert_eq!(format_integer(base + 1.0 - frac), (n + 1).to_string());
    }

    /// Column widths never exceed the configured maximum.
    #[test]
    fn width_is_bounded(len in 0usize..100_000, unit in 1u32..1024, max in 1u32..100_000) {
        let layout = SheetLayout { width_unit: unit, width_max: max };
        prop_assert!(layout.width_for(len) <= max);
    }
}
