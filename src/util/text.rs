use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Width of `s` in terminal columns (CJK and emoji count as 2).
///
/// ```
/// use curio::util::display_width;
///
/// assert_eq!(display_width("Tin"), 3);
/// assert_eq!(display_width("手帳"), 4);
/// ```
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

/// Cut `s` to at most `max_width` columns, marking the cut with "...".
///
/// Widths too narrow for a character plus the ellipsis get as many characters
/// as fit and no ellipsis. Returns `Cow::Borrowed` when `s` already fits.
///
/// ```
/// use curio::util::truncate_to_width;
///
/// assert_eq!(truncate_to_width("Scout Handbook", 8), "Scout...");
/// assert_eq!(truncate_to_width("Tin", 10), "Tin");
/// assert_eq!(truncate_to_width("Tin", 2), "Ti");
/// ```
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };

    let mut used = 0;
    let mut cut = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        cut = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..cut].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..cut], ELLIPSIS))
    }
}

/// Truncate or right-pad `s` to exactly `width` columns.
///
/// A wide character that would straddle the edge is dropped, so the result
/// can fall one column short before padding makes it up.
pub fn pad_to_width(s: &str, width: usize) -> String {
    let cut = truncate_to_width(s, width);
    let fill = width.saturating_sub(display_width(&cut));
    let mut out = String::with_capacity(cut.len() + fill);
    out.push_str(&cut);
    out.extend(std::iter::repeat(' ').take(fill));
    out
}

/// Remove terminal control characters, including whole ANSI CSI sequences,
/// from user-entered text before it is printed.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(char::is_control) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                // Parameters run until the final byte in 0x40..=0x7e
                for f in chars.by_ref() {
                    if ('\x40'..='\x7e').contains(&f) {
                        break;
                    }
                }
            }
            continue;
        }
        if !c.is_control() {
            out.push(c);
        }
    }
    Cow::Owned(out)
}
