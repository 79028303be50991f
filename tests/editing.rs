use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use notemark::editor::{
    EditState, InlineEditor, InlineFormat, KeyOutcome, Selection, SlashCommand, SlashMenu,
    toggle_format,
};
use notemark::geometry::{CaretResolver, MonospaceMeasure, SurfaceStyle};
use proptest::prelude::*;

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn apply(state: &EditState, outcome: KeyOutcome) -> EditState {
    match outcome {
        KeyOutcome::Edit(next) => next,
        _ => state.clone(),
    }
}

#[test]
fn test_typing_a_checklist() {
    let editor = InlineEditor::default();
    let mut state = EditState::with_cursor("- [ ] milk", 10);

    state = apply(&state, editor.handle_key(&state, key(KeyCode::Enter), false));
    assert_eq!(state.text, "- [ ] milk\n- [ ] ");
    assert_eq!(state.selection, Selection::cursor(17));

    state = apply(&state, editor.handle_key(&state, key(KeyCode::Enter), false));
    assert_eq!(state.text, "- [ ] milk\n");
    assert_eq!(state.selection, Selection::cursor(11));
}

#[test]
fn test_slash_menu_round_trip() {
    let editor = InlineEditor::default();
    let resolver = CaretResolver::new(MonospaceMeasure::for_font_size(16.0));
    let style = SurfaceStyle::default();

    // the host lets `/` through, then records the menu
    let before = EditState::with_cursor("abcd ", 5);
    let KeyOutcome::OpenSlashMenu { trigger } =
        editor.handle_key(&before, key(KeyCode::Char('/')), false)
    else {
        panic!("slash after whitespace should open the menu");
    };
    assert_eq!(trigger, 5);

    let typed = EditState::with_cursor("abcd /", 6);
    let caret = resolver.resolve(&style, &typed.text, trigger);
    let menu = SlashMenu::open(trigger, caret.popup_anchor((0.0, 0.0), (0.0, 0.0)));
    assert!(menu.anchor().top >= caret.line_height);

    assert_eq!(
        editor.handle_key(&typed, key(KeyCode::Esc), true),
        KeyOutcome::CloseSlashMenu
    );

    let chosen = menu.choose(&typed, SlashCommand::Heading1).unwrap();
    assert_eq!(chosen.text, "abcd # ");
    assert_eq!(chosen.selection, Selection::cursor(7));
}

#[test]
fn test_slash_inside_word_is_plain_text() {
    let editor = InlineEditor::default();
    let state = EditState::with_cursor("and", 3);
    assert_eq!(
        editor.handle_key(&state, key(KeyCode::Char('/')), false),
        KeyOutcome::PassThrough
    );
}

#[test]
fn test_shortcut_toggles_bold() {
    let editor = InlineEditor::default();
    let state = EditState::new("make this loud", Selection::new(10, 14));
    let bold = KeyEvent::new(KeyCode::Char('b'), KeyModifiers::CONTROL);

    let once = apply(&state, editor.handle_key(&state, bold, false));
    assert_eq!(once.text, "make this **loud**");
    let twice = apply(&once, editor.handle_key(&once, bold, false));
    assert_eq!(twice, state);
}

#[test]
fn test_pairs_use_utf16_offsets() {
    let editor = InlineEditor::default();
    // the emoji is two UTF-16 units
    let state = EditState::with_cursor("😀 ", 3);
    let next = apply(&state, editor.handle_key(&state, key(KeyCode::Char('[')), false));
    assert_eq!(next.text, "😀 []");
    assert_eq!(next.selection, Selection::cursor(4));
}

proptest! {
    #[test]
    fn bold_toggle_twice_restores_buffer(
        before in "[a-z ]{0,12}",
        word in "[a-z]{1,8}",
        after in "[a-z ]{0,12}",
    ) {
        let text = format!("{before}{word}{after}");
        let start = before.len();
        let state = EditState::new(text.clone(), Selection::new(start, start + word.len()));

        let once = toggle_format(&state, InlineFormat::Bold);
        prop_assert_ne!(&once.text, &text);
        let twice = toggle_format(&once, InlineFormat::Bold);
        prop_assert_eq!(twice, state);
    }
}
