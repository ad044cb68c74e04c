//! Markup stripping
//!
//! Model replies often use Markdown emphasis. The delimiters would be read
//! aloud, so `**bold**` and `*italic*` are reduced to their inner text.
//! Nothing else is touched.

use once_cell::sync::Lazy;
use regex::Regex;

static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid bold regex"));
static ITALIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*(.+?)\*").expect("valid italic regex"));

/// Remove bold then italic asterisk markup
pub fn strip_markup(text: &str) -> String {
    let without_bold = BOLD.replace_all(text, "$1");
    ITALIC.replace_all(&without_bold, "$1").into_owned()
}
