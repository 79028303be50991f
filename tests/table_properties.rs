use notemark::table::{TableAction, apply, locate};
use proptest::prelude::*;

fn table_text(header: &[String], body: &[Vec<String>]) -> String {
    let line = |cells: &[String]| format!("| {} |", cells.join(" | "));
    let mut lines = vec![line(header), line(&vec!["---".to_string(); header.len()])];
    lines.extend(body.iter().map(|row| line(row)));
    lines.join("\n")
}

fn table() -> impl Strategy<Value = String> {
    (1usize..5, 0usize..5).prop_flat_map(|(columns, rows)| {
        let cell = "[a-z0-9]{0,6}";
        (
            prop::collection::vec(cell, columns),
            prop::collection::vec(prop::collection::vec(cell, columns), rows),
        )
            .prop_map(|(header, body)| table_text(&header, &body))
    })
}

fn shape(text: &str) -> (usize, usize) {
    let block = locate(text, 0).expect("table at start of buffer");
    (block.row_count(), block.column_count())
}

proptest! {
    #[test]
    fn add_then_delete_column_restores_shape(text in table(), pick in any::<prop::sample::Index>()) {
        let cursor = pick.index(text.len() + 1);
        let before = shape(&text);

        let widened = apply(&text, cursor, TableAction::AddColumn);
        prop_assert_eq!(shape(&widened), (before.0, before.1 + 1));

        let narrowed = apply(&widened, cursor.min(widened.len()), TableAction::DeleteColumn);
        prop_assert_eq!(shape(&narrowed), before);
    }

    #[test]
    fn add_row_adds_exactly_one_row(text in table(), pick in any::<prop::sample::Index>()) {
        let cursor = pick.index(text.len() + 1);
        let (rows, columns) = shape(&text);
        let grown = apply(&text, cursor, TableAction::AddRow);
        prop_assert_eq!(shape(&grown), (rows + 1, columns));
    }

    #[test]
    fn delete_row_never_empties_the_table(text in table()) {
        let (rows, _) = shape(&text);
        let mut current = text;
        for _ in 0..rows + 3 {
            current = apply(&current, 0, TableAction::DeleteRow);
            prop_assert!(shape(&current).0 >= 1);
        }
        prop_assert_eq!(shape(&current).0, 1);
    }

    #[test]
    fn format_is_idempotent(text in table()) {
        let once = apply(&text, 0, TableAction::Format);
        let twice = apply(&once, 0, TableAction::Format);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn test_buffer_outside_table_is_untouched() {
    let text = "before\n\n| a | b |\n| --- | --- |\n\nafter";
    assert_eq!(apply(text, 2, TableAction::AddRow), text);
    assert_eq!(apply(text, text.len(), TableAction::DeleteColumn), text);
}

#[test]
fn test_format_aligns_wide_table() {
    let text = "| name | qty |\n|-|-:|\n| apples | 3 |";
    let formatted = apply(text, 0, TableAction::Format);
    assert_eq!(
        formatted,
        "| name   | qty |\n| ------ | --: |\n| apples | 3   |"
    );
}
