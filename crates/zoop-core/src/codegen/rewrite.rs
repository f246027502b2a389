/*!
# Identifier Rewriting

Context-aware renaming of type references inside copied method text.
Occurrences inside string literals, character literals and line comments are
left alone, and only whole identifiers are replaced.
*/

use crate::parser::scanner::{find_body_open, find_matching, find_top_level};

/// Return types that never name the class
pub const VOID_RETURN_TYPES: &[&str] = &["void", "!void", "noreturn"];

#[derive(Clone, Copy, PartialEq, Eq)]
enum Context {
    Code,
    Str,
    Char,
    LineComment,
}

/// Replace whole-identifier occurrences of `old_name` with `new_name`.
///
/// Code only: string literals, character literals and `//` comments are
/// copied verbatim.
pub fn rewrite_identifier(source: &str, old_name: &str, new_name: &str) -> String {
    if old_name.is_empty() {
        return source.to_string();
    }

    let mut out = String::with_capacity(source.len());
    let mut context = Context::Code;
    let mut escaped = false;
    let mut prev: Option<char> = None;
    let mut i = 0;

    while let Some(c) = source[i..].chars().next() {
        let width = c.len_utf8();
        match context {
            Context::Str | Context::Char => {
                let quote = if context == Context::Str { '"' } else { '\'' };
                out.push(c);
                if escaped {
                    escaped = false;
                } else if c == '\\' {
                    escaped = true;
                } else if c == quote || c == '\n' {
                    context = Context::Code;
                }
            }
            Context::LineComment => {
                out.push(c);
                if c == '\n' {
                    context = Context::Code;
                }
            }
            Context::Code => {
                if c == '"' {
                    context = Context::Str;
                } else if c == '\'' {
                    context = Context::Char;
                } else if source[i..].starts_with("//") {
                    context = Context::LineComment;
                } else if source[i..].starts_with(old_name)
                    && !prev.is_some_and(is_ident_char)
                    && !source[i + old_name.len()..]
                        .chars()
                        .next()
                        .is_some_and(is_ident_char)
                {
                    out.push_str(new_name);
                    i += old_name.len();
                    prev = old_name.chars().next_back();
                    continue;
                }
                out.push(c);
            }
        }
        prev = Some(c);
        i += width;
    }

    out
}

/// Adapt an init/deinit inherited from `ancestor_name` to `new_name`.
///
/// In the signature, the type named by the `self:` annotation is replaced
/// with `new_name`, and so is the return type when it names the ancestor.
/// The type found in the `self:` annotation is then renamed throughout the
/// body as well.
pub fn splice_lifecycle_method(source: &str, ancestor_name: &str, new_name: &str) -> String {
    let Some(paren_open) = source.find('(') else {
        return source.to_string();
    };
    let Some(paren_close) = find_matching(source, paren_open, b'(', b')') else {
        return source.to_string();
    };
    let Some(body_open) = find_body_open(source, paren_close + 1) else {
        return source.to_string();
    };
    let (signature, body) = source.split_at(body_open);

    let mut out = String::with_capacity(source.len() + new_name.len());
    let mut found_parent_type: Option<&str> = None;

    // Parameters: replace the self annotation's type name
    let params_start = paren_open + 1;
    let params = &signature[params_start..paren_close];
    out.push_str(&signature[..params_start]);
    match self_type_range(params) {
        Some((start, end)) => {
            found_parent_type = Some(&params[start..end]);
            out.push_str(&params[..start]);
            out.push_str(new_name);
            out.push_str(&params[end..]);
        }
        None => out.push_str(params),
    }
    out.push(')');

    // Return type
    let return_section = &signature[paren_close + 1..];
    let names_ancestor = |core: &str| core == ancestor_name || Some(core) == found_parent_type;
    let ancestor_range = return_type_range(return_section)
        .filter(|&(start, end)| names_ancestor(&return_section[start..end]));
    match ancestor_range {
        Some((start, end)) => {
            out.push_str(&return_section[..start]);
            out.push_str(new_name);
            out.push_str(&return_section[end..]);
        }
        None => out.push_str(return_section),
    }

    match found_parent_type {
        Some(parent_type) => out.push_str(&rewrite_identifier(body, parent_type, new_name)),
        None => out.push_str(body),
    }
    out
}

/// Byte range of the type name in the `self:` annotation of `params`
fn self_type_range(params: &str) -> Option<(usize, usize)> {
    let first_end = find_top_level(params, 0, b',').unwrap_or(params.len());
    let first = &params[..first_end];
    let self_pos = first.find("self")?;
    let colon = self_pos + first[self_pos..].find(':')?;
    if !first[..self_pos].trim().is_empty() || !first[self_pos + 4..colon].trim().is_empty() {
        return None;
    }
    type_core_range(first, colon + 1, first.len())
}

/// Byte range of the class name in a return-type section, if not void
fn return_type_range(section: &str) -> Option<(usize, usize)> {
    let ret = section.trim();
    if ret.is_empty() || VOID_RETURN_TYPES.contains(&ret) {
        return None;
    }
    // error unions: only the payload after the last `!` names the type
    let payload_start = section.rfind('!').map(|i| i + 1).unwrap_or(0);
    let (start, end) = type_core_range(section, payload_start, section.len())?;
    match &section[start..end] {
        core if VOID_RETURN_TYPES.contains(&core) => None,
        _ => Some((start, end)),
    }
}

/// Strip pointer/optional/const qualifiers from `text[from..to]` and return
/// the range of the remaining identifier
fn type_core_range(text: &str, from: usize, to: usize) -> Option<(usize, usize)> {
    let mut start = from;
    loop {
        let rest = &text[start..to];
        let trimmed = rest.trim_start_matches(|c: char| c.is_whitespace() || c == '*' || c == '?');
        start += rest.len() - trimmed.len();
        match trimmed.strip_prefix("const") {
            Some(after) if after.starts_with(char::is_whitespace) => start += "const".len(),
            _ => break,
        }
    }

    let len = text[start..to]
        .find(|c: char| !is_ident_char(c))
        .unwrap_or(to - start);
    let core = &text[start..start + len];
    match core.chars().next() {
        Some(c) if c.is_alphabetic() || c == '_' => Some((start, start + len)),
        _ => None,
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
