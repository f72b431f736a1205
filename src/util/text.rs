use std::borrow::Cow;

use unicode_width::UnicodeWidthChar;

/// Ellipsis appended to truncated text
const ELLIPSIS: &str = "...";

/// Removes anything that looks like an HTML tag (`<` up to the next `>`,
/// with no `<` in between) and collapses runs of whitespace.
///
/// Display-only: this is not sanitization. Entities are left as they are and
/// a `<` that never closes is kept.
///
/// # Examples
///
/// ```
/// use meti_news::util::strip_tags;
///
/// assert_eq!(strip_tags("<a href=\"x\">Story</a>&nbsp;<font>Site</font>"), "Story&nbsp;Site");
/// assert_eq!(strip_tags("1 < 2"), "1 < 2");
/// ```
pub fn strip_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find(['<', '>']) {
            // Non-empty tag body closed by '>'
            Some(close) if close > 0 && after.as_bytes()[close] == b'>' => {
                rest = &after[close + 1..];
            }
            _ => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);

    collapse_whitespace(&out)
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Keeps the first `max_chars` characters, appending "..." when anything
/// was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS)),
        None => Cow::Borrowed(s),
    }
}

/// Truncates to at most `max_width` terminal columns, counting CJK
/// characters as two columns. The ellipsis is included in the width.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    let mut width = 0;
    let mut fits_with_ellipsis = 0;
    let budget = max_width.saturating_sub(ELLIPSIS.len());

    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if width + w > max_width {
            if max_width <= ELLIPSIS.len() {
                return Cow::Owned(s[..idx].to_string());
            }
            return Cow::Owned(format!("{}{}", &s[..fits_with_ellipsis], ELLIPSIS));
        }
        width += w;
        if width <= budget {
            fits_with_ellipsis = idx + c.len_utf8();
        }
    }

    Cow::Borrowed(s)
}

/// Drops ASCII control characters and escape sequences from feed text
/// before it reaches the terminal. Tab and newline survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let is_control = |c: char| c == '\x7f' || (c < ' ' && c != '\t' && c != '\n');
    if !s.chars().any(is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            // CSI: ESC [ params final-byte
            if chars.peek() == Some(&'[') {
                chars.next();
                for c in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&c) {
                        break;
                    }
                }
            }
        } else if !is_control(c) {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
