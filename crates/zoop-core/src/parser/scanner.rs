//! Lexical scanner for declaration sites.
//!
//! Finds `zoop.class(` marker calls and the balanced delimiters around them.
//! Depth counting skips string literals, character literals, line comments
//! and `\\` multiline string lines, so a brace inside a literal does not
//! shift the match.

/// The marker call that introduces a class declaration
pub const CLASS_MARKER: &str = "zoop.class(";

/// Byte offsets of one marker call and its delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationSite {
    /// Start of the statement holding the marker
    pub statement_start: usize,
    /// Offset of the marker token
    pub marker: usize,
    /// Offset of the body's `{`
    pub body_open: usize,
    /// Offset of the matching `}`
    pub body_close: usize,
    /// One past the terminating `);`
    pub end: usize,
}

impl DeclarationSite {
    /// Text between the body braces, exclusive
    pub fn body<'a>(&self, source: &'a str) -> &'a str {
        &source[self.body_open + 1..self.body_close]
    }
}

/// Offset of the next marker at or after `from`
pub fn find_marker(source: &str, from: usize) -> Option<usize> {
    source.get(from..)?.find(CLASS_MARKER).map(|i| from + i)
}

/// Locate the next complete declaration after `from`.
///
/// Returns `None` when there is no further marker, or when the next marker
/// is missing its body, its closing brace or its terminating `);`.
pub fn find_next_declaration(source: &str, from: usize) -> Option<DeclarationSite> {
    let marker = find_marker(source, from)?;
    declaration_at(source, marker)
}

/// Resolve the delimiters of the declaration whose marker sits at `marker`
pub fn declaration_at(source: &str, marker: usize) -> Option<DeclarationSite> {
    let after_marker = marker + CLASS_MARKER.len();
    let body_open = after_marker + source.get(after_marker..)?.find('{')?;
    let body_close = find_matching(source, body_open, b'{', b'}')?;
    let end = body_close + 1 + source.get(body_close + 1..)?.find(");")? + 2;

    Some(DeclarationSite {
        statement_start: statement_start(source, marker),
        marker,
        body_open,
        body_close,
        end,
    })
}

/// First non-blank byte after the last `;`, `}` or newline before `marker`
pub fn statement_start(source: &str, marker: usize) -> usize {
    let after_delimiter = source[..marker]
        .rfind([';', '}', '\n'])
        .map(|i| i + 1)
        .unwrap_or(0);
    after_delimiter
        + source[after_delimiter..marker]
            .find(|c: char| c != ' ' && c != '\t')
            .unwrap_or(marker - after_delimiter)
}

/// Offset of the `{` opening a function body, searching from `from`.
///
/// Inline error sets in the return type (`error{Oom}!void`) are stepped over.
pub fn find_body_open(source: &str, from: usize) -> Option<usize> {
    let mut i = from;
    loop {
        let open = find_top_level(source, i, b'{')?;
        if !ends_with_keyword(&source[..open], "error") {
            return Some(open);
        }
        i = find_matching(source, open, b'{', b'}')? + 1;
    }
}

fn ends_with_keyword(text: &str, keyword: &str) -> bool {
    text.trim_end().strip_suffix(keyword).is_some_and(|before| {
        !before.ends_with(|c: char| c.is_alphanumeric() || c == '_')
    })
}

/// Find the delimiter closing the one at `open_pos`.
///
/// `source[open_pos]` must be `open`. Returns the offset where depth falls
/// back to zero.
pub fn find_matching(source: &str, open_pos: usize, open: u8, close: u8) -> Option<usize> {
    let bytes = source.as_bytes();
    if bytes.get(open_pos) != Some(&open) {
        return None;
    }

    let mut depth = 0usize;
    let mut i = open_pos;
    while i < bytes.len() {
        if let Some(next) = skip_non_code(bytes, i) {
            i = next;
            continue;
        }
        let c = bytes[i];
        if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}

/// Offset of the first `target` byte at depth zero, starting at `from`.
///
/// Nesting is tracked across `()`, `[]` and `{}`; literals and comments are
/// skipped. Stops (returning `None`) if a closer would take depth negative.
pub fn find_top_level(source: &str, from: usize, target: u8) -> Option<usize> {
    find_top_level_any(source, from, &[target])
}

/// Like [`find_top_level`], stopping at whichever of `targets` comes first
pub fn find_top_level_any(source: &str, from: usize, targets: &[u8]) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    let mut i = from;
    while i < bytes.len() {
        if let Some(next) = skip_non_code(bytes, i) {
            i = next;
            continue;
        }
        let c = bytes[i];
        if depth == 0 && targets.contains(&c) {
            return Some(i);
        }
        match c {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                if depth == 0 {
                    return None;
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Split on depth-zero `sep` bytes, trimming pieces and dropping empty ones
pub fn split_top_level(text: &str, sep: u8) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    while let Some(pos) = find_top_level(text, start, sep) {
        parts.push(text[start..pos].trim());
        start = pos + 1;
    }
    parts.push(text[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// If a literal or comment starts at `i`, return the offset just past it.
pub(crate) fn skip_non_code(bytes: &[u8], i: usize) -> Option<usize> {
    match bytes[i] {
        b'"' => Some(skip_quoted(bytes, i, b'"')),
        b'\'' => Some(skip_quoted(bytes, i, b'\'')),
        b'/' if bytes.get(i + 1) == Some(&b'/') => Some(skip_line(bytes, i)),
        b'\\' if bytes.get(i + 1) == Some(&b'\\') => Some(skip_line(bytes, i)),
        _ => None,
    }
}

fn skip_quoted(bytes: &[u8], start: usize, quote: u8) -> usize {
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            c if c == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_line(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| start + p)
        .unwrap_or(bytes.len())
}
