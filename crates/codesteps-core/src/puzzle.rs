//! Fragment puzzle verification.
//!
//! An arrangement is correct when its concatenation matches the canonical
//! answer after both sides are normalized: character entities decoded, then
//! every whitespace character dropped.

use std::borrow::Cow;

/// Checks an arrangement against the canonical answer.
///
/// Total and pure. Empty inputs normalize to empty and compare equal.
///
/// # Examples
///
/// ```
/// use codesteps_core::puzzle::check;
///
/// assert!(check(&["a", "  b"], "ab"));
/// assert!(check(&["&lt;p&gt;", "hi", "</p>"], "<p>hi</p>"));
/// assert!(!check(&["b", "a"], "ab"));
/// ```
#[must_use]
pub fn check<S: AsRef<str>>(assembled: &[S], canonical_answer: &str) -> bool {
    let joined: String = assembled.iter().map(AsRef::as_ref).collect();
    normalize(&joined) == normalize(canonical_answer)
}

/// Lays out `parts` in the order given by fragment indices.
///
/// Returns `None` unless `order` uses every index in `0..parts.len()` exactly
/// once, so an answer cannot repeat or leave out fragments.
#[must_use]
pub fn arrange<'a>(parts: &'a [String], order: &[usize]) -> Option<Vec<&'a str>> {
    if order.len() != parts.len() {
        return None;
    }

    let mut used = vec![false; parts.len()];
    order
        .iter()
        .map(|&idx| {
            let slot = used.get_mut(idx)?;
            if *slot {
                return None;
            }
            *slot = true;
            Some(parts[idx].as_str())
        })
        .collect()
}

/// Returns the comparison form of `text`.
#[must_use]
pub fn normalize(text: &str) -> String {
    decode_entities(text)
        .chars()
        .filter(|c| !is_ignorable(*c))
        .collect()
}

/// Decodes character references in a single pass.
///
/// Follows the HTML text-content rules: the full named reference table,
/// legacy names without the trailing `;` (`&lt`, `&amp`), and numeric
/// references, with NUL, surrogates and out-of-range values becoming U+FFFD.
/// Unknown names stay literal.
#[must_use]
pub fn decode_entities(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }
    htmlize::unescape(text)
}

/// Whitespace-equivalent characters removed before comparison.
fn is_ignorable(c: char) -> bool {
    c.is_whitespace() || matches!(c, '\u{00A0}' | '\u{202F}' | '\u{2009}' | '\u{FEFF}')
}
