//! Syntax highlighting for fenced code blocks.
//!
//! Uses syntect with Sublime Text syntax definitions and emits inline-styled
//! HTML spans (no stylesheet needed by the host).

use std::fmt::Write as _;
use std::sync::OnceLock;

use syntect::easy::HighlightLines;
use syntect::highlighting::{Color, FontStyle, Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

use crate::document::escape_html;

/// Background the preview is shown on; picks the theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundMode {
    Dark,
    Light,
}

/// Configured theme choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemePreference {
    /// Follow `COLORFGBG`, falling back to dark.
    #[default]
    Auto,
    Light,
    Dark,
}

impl ThemePreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn resolve(self) -> BackgroundMode {
        match self {
            Self::Light => BackgroundMode::Light,
            Self::Dark => BackgroundMode::Dark,
            Self::Auto => {
                background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
            }
        }
    }
}

/// Whether `language` names a syntax we can highlight.
pub fn is_known_language(language: &str) -> bool {
    find_syntax(language).is_some()
}

/// Highlight `code` as `language`, returning the inner HTML of a `<code>`
/// element.
///
/// Returns `None` for unknown languages or if syntect fails part-way; the
/// caller falls back to escaped plain text.
pub fn highlight_html(language: &str, code: &str, mode: BackgroundMode) -> Option<String> {
    let syntax = find_syntax(language)?;
    let _scope = crate::perf::scope("highlight.code_block");
    let syntax_set = syntax_set();
    let mut highlighter = HighlightLines::new(syntax, theme(mode));
    let mut html = String::with_capacity(code.len() * 2);

    for line in LinesWithEndings::from(code) {
        let ranges = match highlighter.highlight_line(line, syntax_set) {
            Ok(ranges) => ranges,
            Err(err) => {
                tracing::debug!(%err, language, "highlighting failed, using plain text");
                return None;
            }
        };
        for (style, text) in ranges {
            let fg = adjust_fg_for_background(style.foreground, mode);
            let _ = write!(
                html,
                "<span style=\"color:#{:02x}{:02x}{:02x}",
                fg.r, fg.g, fg.b
            );
            if style.font_style.contains(FontStyle::BOLD) {
                html.push_str(";font-weight:bold");
            }
            if style.font_style.contains(FontStyle::ITALIC) {
                html.push_str(";font-style:italic");
            }
            html.push_str("\">");
            html.push_str(&escape_html(text));
            html.push_str("</span>");
        }
    }

    Some(html)
}

fn find_syntax(language: &str) -> Option<&'static syntect::parsing::SyntaxReference> {
    let language = language.trim();
    if language.is_empty() {
        return None;
    }
    let syntax_set = syntax_set();
    syntax_set
        .find_syntax_by_token(language)
        .or_else(|| syntax_set.find_syntax_by_name(language))
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.load_defaults");
        SyntaxSet::load_defaults_newlines()
    })
}

fn theme_set() -> &'static ThemeSet {
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    THEME_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.theme.load_defaults");
        ThemeSet::load_defaults()
    })
}

fn theme(mode: BackgroundMode) -> &'static Theme {
    static DARK: OnceLock<Theme> = OnceLock::new();
    static LIGHT: OnceLock<Theme> = OnceLock::new();
    let (cell, preferred) = match mode {
        BackgroundMode::Dark => (
            &DARK,
            [
                "Monokai Extended",
                "Monokai Extended Bright",
                "Dracula",
                "Solarized (dark)",
                "base16-ocean.dark",
            ]
            .as_slice(),
        ),
        BackgroundMode::Light => (
            &LIGHT,
            ["InspiredGitHub", "Solarized (light)", "base16-ocean.light"].as_slice(),
        ),
    };

    cell.get_or_init(|| {
        let theme_set = theme_set();
        for name in preferred {
            if let Some(theme) = theme_set.themes.get(*name) {
                return theme.clone();
            }
        }
        theme_set
            .themes
            .values()
            .next()
            .cloned()
            .unwrap_or_default()
    })
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    let Ok(bg) = bg_str.parse::<u8>() else {
        return BackgroundMode::Dark;
    };

    if bg >= 7 {
        BackgroundMode::Light
    } else {
        BackgroundMode::Dark
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn adjust_fg_for_background(color: Color, mode: BackgroundMode) -> Color {
    match mode {
        BackgroundMode::Dark => color,
        BackgroundMode::Light => {
            let luma = 0.0722f32.mul_add(
                f32::from(color.b),
                0.2126f32.mul_add(f32::from(color.r), 0.7152 * f32::from(color.g)),
            );
            if luma < 155.0 {
                return color;
            }

            let darken = |c: u8| (f32::from(c) * 0.42).round() as u8;
            Color {
                r: darken(color.r),
                g: darken(color.g),
                b: darken(color.b),
                a: color.a,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_highlight_rust_produces_colored_spans() {
        let html = highlight_html("rust", "fn main() {\n    let x = 1;\n}\n", BackgroundMode::Dark)
            .unwrap();
        assert!(html.contains("<span style=\"color:#"));
        assert!(html.contains("main"));
        assert_eq!(html.matches('\n').count(), 3);
    }

    #[test]
    fn test_highlight_unknown_language_is_none() {
        assert!(highlight_html("nope-lang", "just text", BackgroundMode::Dark).is_none());
        assert!(!is_known_language("nope-lang"));
        assert!(!is_known_language(""));
    }

    #[test]
    fn test_highlight_escapes_markup() {
        let html = highlight_html("html", "<b>&</b>", BackgroundMode::Light).unwrap();
        assert!(html.contains("&lt;"));
        assert!(html.contains("&amp;"));
        assert!(!html.contains("<b>"));
    }

    #[test]
    fn test_language_lookup_by_name() {
        assert!(is_known_language("Python"));
        assert!(is_known_language("py"));
    }

    #[test]
    fn test_colorfgbg_dark_background() {
        let mode = background_mode_from_colorfgbg(Some("15;0"));
        assert_eq!(mode, BackgroundMode::Dark);
    }

    #[test]
    fn test_colorfgbg_light_background() {
        let mode = background_mode_from_colorfgbg(Some("0;15"));
        assert_eq!(mode, BackgroundMode::Light);
    }

    #[test]
    fn test_theme_preference_parse() {
        assert_eq!(ThemePreference::parse("Dark"), Some(ThemePreference::Dark));
        assert_eq!(ThemePreference::parse("auto"), Some(ThemePreference::Auto));
        assert_eq!(ThemePreference::parse("sepia"), None);
        assert_eq!(ThemePreference::Light.resolve(), BackgroundMode::Light);
    }

    #[test]
    fn test_light_mode_darkens_bright_fg() {
        let bright = Color {
            r: 240,
            g: 230,
            b: 120,
            a: 255,
        };
        let adjusted = adjust_fg_for_background(bright, BackgroundMode::Light);
        assert!(adjusted.r < bright.r);
        assert!(adjusted.g < bright.g);
        assert!(adjusted.b < bright.b);
    }

    #[test]
    fn test_light_mode_caps_luma_for_readability() {
        let bright = Color {
            r: 240,
            g: 230,
            b: 120,
            a: 255,
        };
        let adjusted = adjust_fg_for_background(bright, BackgroundMode::Light);
        let luma = (0.2126 * f32::from(adjusted.r))
            + (0.7152 * f32::from(adjusted.g))
            + (0.0722 * f32::from(adjusted.b));
        assert!(luma < 120.0, "Adjusted color still too bright: {luma}");
    }

    #[test]
    fn test_dark_mode_keeps_colors() {
        let c = Color {
            r: 10,
            g: 200,
            b: 30,
            a: 255,
        };
        assert_eq!(adjust_fg_for_background(c, BackgroundMode::Dark), c);
    }
}
