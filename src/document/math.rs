//! `$…$` / `$$…$$` math to MathML.

use latex2mathml::{DisplayStyle, latex_to_mathml};

use super::tokens::{TokenKind, Tokens};

/// Replace convertible math in a prose segment with tokens.
///
/// Escaped `\$` is never a delimiter. Inline math must not start or end with
/// whitespace and its closing `$` must not be followed by a digit, so prices
/// like `$5 and $10` stay text. Expressions that fail to convert are kept
/// as written.
pub fn extract(prose: &str, tokens: &mut Tokens) -> String {
    let mut out = String::with_capacity(prose.len());
    let mut rest = prose;

    while let Some(pos) = find_unescaped_dollar(rest) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if let Some(body) = tail.strip_prefix("$$") {
            let Some(end) = find_block_close(body) else {
                out.push_str("$$");
                rest = body;
                continue;
            };
            let latex = &body[..end];
            let consumed = 2 + end + 2;
            match convert(latex, DisplayStyle::Block) {
                Some(html) => {
                    out.push_str(&tokens.push(TokenKind::BlockMath, html, &tail[..consumed]));
                }
                None => out.push_str(&tail[..consumed]),
            }
            rest = &tail[consumed..];
            continue;
        }

        let body = &tail[1..];
        match find_inline_close(body) {
            Some(end) => {
                let latex = &body[..end];
                let consumed = 1 + end + 1;
                match convert(latex, DisplayStyle::Inline) {
                    Some(html) => {
                        out.push_str(&tokens.push(TokenKind::InlineMath, html, &tail[..consumed]));
                    }
                    None => out.push_str(&tail[..consumed]),
                }
                rest = &tail[consumed..];
            }
            None => {
                out.push('$');
                rest = body;
            }
        }
    }

    out.push_str(rest);
    out
}

fn convert(latex: &str, style: DisplayStyle) -> Option<String> {
    let latex = latex.trim();
    if latex.is_empty() {
        return None;
    }
    match latex_to_mathml(latex, style) {
        Ok(mathml) => Some(mathml),
        Err(err) => {
            tracing::debug!(%err, latex, "math conversion failed, keeping source");
            None
        }
    }
}

/// Byte index of the next `$` not preceded by a backslash.
fn find_unescaped_dollar(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn find_block_close(body: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = find_unescaped_dollar(&body[from..]) {
        let at = from + pos;
        if body[at..].starts_with("$$") {
            return Some(at);
        }
        from = at + 1;
    }
    None
}

fn find_inline_close(body: &str) -> Option<usize> {
    let line = &body[..body.find('\n').unwrap_or(body.len())];
    if line.is_empty() || line.starts_with(char::is_whitespace) {
        return None;
    }
    let end = find_unescaped_dollar(line)?;
    let latex = &line[..end];
    let after_digit = line[end + 1..].starts_with(|c: char| c.is_ascii_digit());
    if latex.is_empty() || latex.ends_with(char::is_whitespace) || after_digit {
        return None;
    }
    Some(end)
}
