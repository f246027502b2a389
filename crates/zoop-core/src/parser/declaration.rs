//! Declaration parser.
//!
//! Turns one [`DeclarationSite`] into a [`ClassDecl`]. The class body is
//! walked item by item; [`classify_item`] is the single place that decides
//! whether the text at the cursor is a method, a property block, a nested
//! constant or a field. Anything it cannot make sense of is skipped to the
//! end of its line, so a bad member degrades to "not there" instead of
//! failing the whole declaration.

use std::sync::Arc;

use tracing::trace;

use crate::ast::{ClassDecl, ConstDecl, FieldDecl, MethodDecl, PropertyAccess, PropertyDecl};

use super::scanner::{
    find_body_open, find_matching, find_top_level, find_top_level_any, split_top_level,
    DeclarationSite,
};

/// One top-level element of a class body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyItem {
    Method(MethodDecl),
    Properties(Vec<PropertyDecl>),
    Extends(String),
    Mixins(Vec<String>),
    Const(ConstDecl),
    Field(FieldDecl),
    Skip,
}

/// Parse the declaration at `site`.
///
/// Returns `None` only when no `const <Name> =` binding precedes the marker.
pub fn parse_declaration(
    source: &str,
    site: &DeclarationSite,
    file_path: &str,
) -> Option<ClassDecl> {
    let header = &source[site.statement_start..site.marker];
    let const_pos = rfind_keyword(header, "const")?;
    let after_const = &header[const_pos + "const".len()..];
    let name = after_const[..after_const.find('=')?].trim();
    if name.is_empty() {
        return None;
    }

    let mut decl = ClassDecl {
        name: Arc::from(name),
        parent_ref: None,
        mixin_refs: Vec::new(),
        fields: Vec::new(),
        methods: Vec::new(),
        properties: Vec::new(),
        constants: Vec::new(),
        visibility: header[..const_pos].trim_start().to_string(),
        source_span: (site.statement_start, site.end),
        file_path: file_path.to_string(),
    };

    let body = site.body(source);
    let mut cursor = 0;
    loop {
        cursor = skip_whitespace(body, cursor);
        if cursor >= body.len() {
            break;
        }
        let (item, next) = classify_item(body, cursor);
        trace!(class = name, ?item, "body item");
        match item {
            BodyItem::Method(method) => decl.methods.push(method),
            BodyItem::Properties(props) => decl.properties.extend(props),
            BodyItem::Extends(parent) => decl.parent_ref = Some(Arc::from(parent.as_str())),
            BodyItem::Mixins(mixins) => {
                decl.mixin_refs = mixins.iter().map(|m| Arc::from(m.as_str())).collect()
            }
            BodyItem::Const(constant) => decl.constants.push(constant),
            BodyItem::Field(field) => decl.fields.push(field),
            BodyItem::Skip => {}
        }
        cursor = next.max(cursor + 1);
    }

    Some(decl)
}

/// Classify the body element starting at `at` and return it with the offset
/// just past it.
pub fn classify_item(body: &str, at: usize) -> (BodyItem, usize) {
    let rest = &body[at..];

    if rest.starts_with("//") {
        return (BodyItem::Skip, line_end(body, at));
    }

    let unqualified = strip_qualifiers(rest, &["pub", "inline", "export"]);
    if unqualified.starts_with("fn ") || unqualified.starts_with("fn\t") {
        return match parse_method(body, at) {
            Some((method, next)) => (BodyItem::Method(method), next),
            None => (BodyItem::Skip, line_end(body, at)),
        };
    }

    if is_block_statement(unqualified, "comptime") || is_block_statement(unqualified, "test") {
        return (BodyItem::Skip, skip_block(body, at));
    }

    if starts_with_keyword(unqualified, "const") || starts_with_keyword(unqualified, "var") {
        return classify_constant(body, at);
    }

    classify_field(body, at)
}

fn classify_constant(body: &str, at: usize) -> (BodyItem, usize) {
    if let Some(item) = classify_reference_binding(body, at) {
        return item;
    }

    let Some(semi) = find_top_level(body, at, b';') else {
        return (BodyItem::Skip, line_end(body, at));
    };
    let statement = &body[at..semi];
    let next = semi + 1;

    let Some(eq) = statement.find('=') else {
        return (BodyItem::Skip, next);
    };
    let name = binding_name(&statement[..eq]);
    let value = statement[eq + 1..].trim();

    let item = match name {
        "properties" => BodyItem::Properties(parse_properties(value)),
        "" => BodyItem::Skip,
        _ => BodyItem::Const(ConstDecl {
            name: name.to_string(),
            raw_source: body[at..next].to_string(),
        }),
    };
    (item, next)
}

/// `pub const extends = X` / `pub const mixins = .{ ... }`, terminated by a
/// top-level `;`, `,`, newline or the end of the body
fn classify_reference_binding(body: &str, at: usize) -> Option<(BodyItem, usize)> {
    let line = &body[at..line_end(body, at)];
    let eq = line.find('=')?;
    let name = binding_name(&line[..eq]);
    if name != "extends" && name != "mixins" {
        return None;
    }

    let value_start = at + eq + 1;
    let (value_end, next) = match find_top_level_any(body, value_start, b";,\n") {
        Some(end) => (end, end + 1),
        None => (body.len(), body.len()),
    };
    let value = strip_trailing_comment(&body[value_start..value_end]).trim();

    let item = match name {
        "extends" if !value.is_empty() => BodyItem::Extends(value.to_string()),
        "mixins" => BodyItem::Mixins(parse_reference_list(value)),
        _ => BodyItem::Skip,
    };
    Some((item, next))
}

fn binding_name(binding: &str) -> &str {
    strip_qualifiers(binding, &["pub", "const", "var"])
        .split(':')
        .next()
        .unwrap_or_default()
        .trim()
}

fn classify_field(body: &str, at: usize) -> (BodyItem, usize) {
    let (element, next) = match find_top_level(body, at, b',') {
        Some(comma) => (&body[at..comma], comma + 1),
        None => (&body[at..], body.len()),
    };
    let element = strip_trailing_comment(element);

    let Some(colon) = element.find(':') else {
        return (BodyItem::Skip, line_end(body, at));
    };
    if element[..colon].contains('=') {
        return (BodyItem::Skip, line_end(body, at));
    }

    let name = element[..colon].trim();
    if !is_identifier(name) {
        return (BodyItem::Skip, line_end(body, at));
    }

    let after_colon = &element[colon + 1..];
    let (type_text, default_text) = match find_top_level(after_colon, 0, b'=') {
        Some(eq) => (
            after_colon[..eq].trim(),
            Some(after_colon[eq + 1..].trim().to_string()),
        ),
        None => (after_colon.trim(), None),
    };

    let item = match name {
        "extends" => BodyItem::Extends(type_text.to_string()),
        "mixins" => BodyItem::Mixins(parse_reference_list(type_text)),
        _ if type_text.is_empty() => BodyItem::Skip,
        _ => BodyItem::Field(FieldDecl {
            name: name.to_string(),
            type_text: type_text.to_string(),
            default_text: default_text.filter(|d| !d.is_empty()),
        }),
    };
    (item, next)
}

/// Parse a `fn` whose (possibly qualified) declaration starts at `at`
fn parse_method(body: &str, at: usize) -> Option<(MethodDecl, usize)> {
    let fn_pos = at + find_keyword(&body[at..], "fn")?;
    let paren_open = fn_pos + body[fn_pos..].find('(')?;
    let name = body[fn_pos + 2..paren_open].trim();
    if !is_identifier(name) {
        return None;
    }

    let paren_close = find_matching(body, paren_open, b'(', b')')?;
    let body_open = find_body_open(body, paren_close + 1)?;
    let body_close = find_matching(body, body_open, b'{', b'}')?;

    let params = &body[paren_open + 1..paren_close];
    let method = MethodDecl {
        name: name.to_string(),
        raw_source: body[at..=body_close].to_string(),
        signature_text: body[at..body_open].trim().to_string(),
        return_type_text: body[paren_close + 1..body_open].trim().to_string(),
        is_static: !first_param_is_self(params),
    };
    Some((method, body_close + 1))
}

/// True when the first parameter is named `self` and annotated
pub fn first_param_is_self(params: &str) -> bool {
    let Some(first) = split_top_level(params, b',').into_iter().next() else {
        return false;
    };
    first
        .strip_prefix("self")
        .is_some_and(|rest| rest.trim_start().starts_with(':'))
}

/// Parse the value of `pub const properties = .{ ... }`
pub fn parse_properties(value: &str) -> Vec<PropertyDecl> {
    let Some(open) = value.find('{') else {
        return Vec::new();
    };
    let Some(close) = find_matching(value, open, b'{', b'}') else {
        return Vec::new();
    };

    split_top_level(&value[open + 1..close], b',')
        .into_iter()
        .filter_map(parse_property_entry)
        .collect()
}

/// `.name = .{ .type = T, .access = .read_only, .default = V }`
fn parse_property_entry(entry: &str) -> Option<PropertyDecl> {
    let eq = entry.find('=')?;
    let name = entry[..eq].trim().trim_start_matches('.').trim();
    if !is_identifier(name) {
        return None;
    }

    let options = entry[eq + 1..].trim();
    let open = options.find('{')?;
    let close = find_matching(options, open, b'{', b'}')?;

    let mut type_text = None;
    let mut access = PropertyAccess::ReadWrite;
    let mut default_text = None;
    for option in split_top_level(&options[open + 1..close], b',') {
        let Some(eq) = option.find('=') else {
            continue;
        };
        let value = option[eq + 1..].trim();
        match option[..eq].trim().trim_start_matches('.') {
            "type" => type_text = Some(value.to_string()),
            "access" if value.trim_start_matches('.') == "read_only" => {
                access = PropertyAccess::ReadOnly
            }
            "default" => default_text = Some(value.to_string()),
            _ => {}
        }
    }

    Some(PropertyDecl {
        name: name.to_string(),
        type_text: type_text.filter(|t| !t.is_empty())?,
        access,
        default_text,
    })
}

/// `.{ A, mod.B }` or a bare `A` into its references
fn parse_reference_list(value: &str) -> Vec<String> {
    let inner = match (value.find('{'), value.rfind('}')) {
        (Some(open), Some(close)) if open < close => &value[open + 1..close],
        _ => value,
    };
    split_top_level(inner, b',')
        .into_iter()
        .map(str::to_string)
        .collect()
}

fn skip_block(body: &str, at: usize) -> usize {
    match body[at..].find('{') {
        Some(open) => find_matching(body, at + open, b'{', b'}')
            .map(|close| close + 1)
            .unwrap_or(body.len()),
        None => line_end(body, at),
    }
}

fn skip_whitespace(text: &str, from: usize) -> usize {
    text[from..]
        .find(|c: char| !c.is_whitespace())
        .map(|i| from + i)
        .unwrap_or(text.len())
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..]
        .find('\n')
        .map(|i| from + i + 1)
        .unwrap_or(text.len())
}

fn strip_trailing_comment(element: &str) -> &str {
    match element.find("//") {
        Some(pos) if !element[..pos].contains('"') => &element[..pos],
        _ => element,
    }
}

/// Drop any leading run of the given keywords
fn strip_qualifiers<'a>(mut text: &'a str, qualifiers: &[&str]) -> &'a str {
    text = text.trim_start();
    'outer: loop {
        for qualifier in qualifiers {
            if starts_with_keyword(text, qualifier) {
                text = text[qualifier.len()..].trim_start();
                continue 'outer;
            }
        }
        return text;
    }
}

/// `comptime { ... }` or `test "name" { ... }`
fn is_block_statement(text: &str, keyword: &str) -> bool {
    starts_with_keyword(text, keyword)
        && text[keyword.len()..]
            .trim_start()
            .starts_with(['{', '"'])
}

fn starts_with_keyword(text: &str, keyword: &str) -> bool {
    text.strip_prefix(keyword)
        .is_some_and(|rest| !rest.starts_with(|c: char| c.is_alphanumeric() || c == '_'))
}

/// Offset of `keyword` as a whole word in `text`
fn find_keyword(text: &str, keyword: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(pos) = text[from..].find(keyword) {
        let start = from + pos;
        if is_whole_word(text, start, keyword.len()) {
            return Some(start);
        }
        from = start + keyword.len();
    }
    None
}

/// Offset of the last whole-word `keyword` in `text`
fn rfind_keyword(text: &str, keyword: &str) -> Option<usize> {
    let mut to = text.len();
    while let Some(start) = text[..to].rfind(keyword) {
        if is_whole_word(text, start, keyword.len()) {
            return Some(start);
        }
        to = start;
    }
    None
}

fn is_whole_word(text: &str, start: usize, len: usize) -> bool {
    let end = start + len;
    let before_ok = text[..start]
        .chars()
        .next_back()
        .map_or(true, |c| !is_ident_char(c));
    let after_ok = text[end..].chars().next().map_or(true, |c| !is_ident_char(c));
    before_ok && after_ok
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(is_ident_char)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::scanner::find_next_declaration;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> ClassDecl {
        let site = find_next_declaration(source, 0).expect("site");
        parse_declaration(source, &site, "test.zig").expect("declaration")
    }

    const PLAYER: &str = r#"const std = @import("std");

pub const Player = zoop.class(struct {
    pub const extends = base.Entity;
    pub const mixins = .{ Timestamps, traits.Serializable };
    pub const properties = .{
        .id = .{ .type = u64, .access = .read_only },
        .email = .{ .type = []const u8, .access = .read_write, .default = "" },
    };
    const Self = @This();

    // display name
    name: []const u8,
    health: u32 = 100,
    pos: Vec2 = .{ .x = 0, .y = 0 },

    pub fn init(self: *Player, name: []const u8) void {
        self.name = name;
    }

    pub fn create(name: []const u8) Player {
        return .{ .name = name };
    }

    fn damage(self: *Player, amount: u32) !void {
        if (amount > self.health) return error.Dead;
        self.health -= amount;
    }
});
"#;

    #[test]
    fn test_parse_full_declaration() {
        let decl = parse(PLAYER);
        assert_eq!(&*decl.name, "Player");
        assert_eq!(decl.visibility, "pub ");
        assert_eq!(decl.parent_ref.as_deref(), Some("base.Entity"));
        let mixins: Vec<&str> = decl.mixin_refs.iter().map(|m| &**m).collect();
        assert_eq!(mixins, vec!["Timestamps", "traits.Serializable"]);

        assert_eq!(
            decl.fields,
            vec![
                FieldDecl::new("name", "[]const u8"),
                FieldDecl::new("health", "u32").with_default("100"),
                FieldDecl::new("pos", "Vec2").with_default(".{ .x = 0, .y = 0 }"),
            ]
        );

        assert_eq!(decl.properties.len(), 2);
        assert_eq!(decl.properties[0].name, "id");
        assert_eq!(decl.properties[0].access, PropertyAccess::ReadOnly);
        assert_eq!(decl.properties[1].type_text, "[]const u8");
        assert_eq!(decl.properties[1].access, PropertyAccess::ReadWrite);
        assert_eq!(decl.properties[1].default_text.as_deref(), Some("\"\""));

        assert_eq!(decl.constants.len(), 1);
        assert_eq!(decl.constants[0].raw_source, "const Self = @This();");
    }

    #[test]
    fn test_parse_methods() {
        let decl = parse(PLAYER);
        let names: Vec<&str> = decl.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["init", "create", "damage"]);

        let init = decl.method("init").unwrap();
        assert!(!init.is_static);
        assert_eq!(init.return_type_text, "void");
        assert_eq!(
            init.signature_text,
            "pub fn init(self: *Player, name: []const u8) void"
        );
        assert!(init.raw_source.ends_with("self.name = name;\n    }"));

        assert!(decl.method("create").unwrap().is_static);
        let damage = decl.method("damage").unwrap();
        assert!(!damage.is_static);
        assert_eq!(damage.return_type_text, "!void");
        assert!(damage.raw_source.starts_with("fn damage("));
    }

    #[test]
    fn test_legacy_extends_spelling() {
        let decl = parse("const B = zoop.class(struct {\n    extends: A,\n    y: i32,\n});");
        assert_eq!(decl.parent_ref.as_deref(), Some("A"));
        assert_eq!(decl.fields, vec![FieldDecl::new("y", "i32")]);
        assert_eq!(decl.visibility, "");
    }

    #[test]
    fn test_extends_without_semicolon() {
        let decl = parse(
            "const B = zoop.class(struct {\n    pub const extends = A\n    b_field: u16,\n    pub fn hi(self: *B) void {\n        _ = self;\n    }\n});",
        );
        assert_eq!(decl.parent_ref.as_deref(), Some("A"));
        assert_eq!(decl.fields, vec![FieldDecl::new("b_field", "u16")]);
        assert!(decl.has_method("hi"));
    }

    #[test]
    fn test_reference_bindings_end_at_comma_or_body_end() {
        let decl = parse(
            "const B = zoop.class(struct {\n    pub const mixins = .{ M1,\n        m.M2 },\n    x: u8,\n    pub const extends = A // base\n});",
        );
        let mixins: Vec<&str> = decl.mixin_refs.iter().map(|m| &**m).collect();
        assert_eq!(mixins, vec!["M1", "m.M2"]);
        assert_eq!(decl.fields, vec![FieldDecl::new("x", "u8")]);
        assert_eq!(decl.parent_ref.as_deref(), Some("A"));
    }

    #[test]
    fn test_method_with_inline_error_set() {
        let decl = parse(
            "const A = zoop.class(struct {\n    pub fn init(self: *A) error{Oom}!void {\n        _ = self;\n    }\n    x: u8,\n});",
        );
        let init = decl.method("init").unwrap();
        assert_eq!(init.return_type_text, "error{Oom}!void");
        assert!(init.raw_source.ends_with("_ = self;\n    }"));
        assert_eq!(decl.fields, vec![FieldDecl::new("x", "u8")]);
    }

    #[test]
    fn test_missing_name_fails() {
        let source = "_ = zoop.class(struct { x: u8 });";
        let site = find_next_declaration(source, 0).unwrap();
        assert!(parse_declaration(source, &site, "x.zig").is_none());
    }

    #[test]
    fn test_garbage_degrades() {
        let decl = parse("const C = zoop.class(struct {\n    ???\n    pub fn broken(\n});");
        assert!(decl.fields.is_empty());
        assert!(decl.methods.is_empty());
    }

    #[test]
    fn test_first_param_is_self() {
        assert!(first_param_is_self("self: *Foo, x: u8"));
        assert!(first_param_is_self(" self : *const Foo"));
        assert!(!first_param_is_self(""));
        assert!(!first_param_is_self("selfish: u8"));
        assert!(!first_param_is_self("other: *Foo, self: *Foo"));
    }

    #[test]
    fn test_property_without_access_is_read_write() {
        let props = parse_properties(".{ .count = .{ .type = usize } }");
        assert_eq!(props.len(), 1);
        assert!(props[0].is_writable());
    }
}
