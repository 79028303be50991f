//! Smart list continuation on Enter.

use std::sync::LazyLock;

use regex::Regex;

static TASK_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)([-*+])\s+\[[ xX]\]\s(.*)$").expect("task item pattern")
});
static BULLET_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)([-*+])\s(.*)$").expect("bullet item pattern"));
static NUMBERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\s*)(\d+)([.)])\s(.*)$").expect("numbered item pattern"));

/// What Enter should do for a given line prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Continuation {
    /// Insert a newline followed by this marker (indent included).
    Continue(String),
    /// The item is empty: drop the marker and leave list mode.
    ClearLine,
    /// Not a list line.
    None,
}

/// Decide list continuation from the text between line start and cursor.
pub fn analyze(line_before_cursor: &str) -> Continuation {
    if let Some(caps) = TASK_ITEM.captures(line_before_cursor) {
        if caps[3].trim().is_empty() {
            return Continuation::ClearLine;
        }
        return Continuation::Continue(format!("{}{} [ ] ", &caps[1], &caps[2]));
    }

    if let Some(caps) = BULLET_ITEM.captures(line_before_cursor) {
        if caps[3].trim().is_empty() {
            return Continuation::ClearLine;
        }
        return Continuation::Continue(format!("{}{} ", &caps[1], &caps[2]));
    }

    if let Some(caps) = NUMBERED_ITEM.captures(line_before_cursor) {
        if caps[4].trim().is_empty() {
            return Continuation::ClearLine;
        }
        let next = caps[2]
            .parse::<u64>()
            .map_or(1, |n| n.saturating_add(1));
        return Continuation::Continue(format!("{}{}{} ", &caps[1], next, &caps[3]));
    }

    Continuation::None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_continues_with_same_marker() {
        assert_eq!(analyze("- item"), Continuation::Continue("- ".into()));
        assert_eq!(analyze("* item"), Continuation::Continue("* ".into()));
        assert_eq!(analyze("+ item"), Continuation::Continue("+ ".into()));
    }

    #[test]
    fn test_indent_is_preserved() {
        assert_eq!(analyze("    - nested"), Continuation::Continue("    - ".into()));
    }

    #[test]
    fn test_numbered_auto_increments() {
        assert_eq!(analyze("1. first"), Continuation::Continue("2. ".into()));
        assert_eq!(analyze("  9) ninth"), Continuation::Continue("  10) ".into()));
    }

    #[test]
    fn test_task_reemits_unchecked_box() {
        assert_eq!(analyze("- [x] done"), Continuation::Continue("- [ ] ".into()));
        assert_eq!(analyze("- [ ] todo"), Continuation::Continue("- [ ] ".into()));
    }

    #[test]
    fn test_empty_items_clear() {
        assert_eq!(analyze("- "), Continuation::ClearLine);
        assert_eq!(analyze("3. "), Continuation::ClearLine);
        assert_eq!(analyze("- [ ] "), Continuation::ClearLine);
    }

    #[test]
    fn test_plain_text_is_not_a_list() {
        assert_eq!(analyze("hello"), Continuation::None);
        assert_eq!(analyze("-no space"), Continuation::None);
        assert_eq!(analyze(""), Continuation::None);
    }
}
