// Structural declarations extracted from zoop class bodies.
// These are text-level records, not a syntax tree: every field keeps the
// source text it was sliced from so the generator can re-emit it.

use crate::registry::SharedStr;

/// A plain struct field: `name: type = default,`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDecl {
    pub name: String,
    pub type_text: String,
    pub default_text: Option<String>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, type_text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_text: type_text.into(),
            default_text: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_text = Some(default.into());
        self
    }
}

/// A function declared inside a class body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDecl {
    pub name: String,
    /// Verbatim declaration text, signature and body
    pub raw_source: String,
    /// Header text up to (not including) the body's opening brace
    pub signature_text: String,
    pub return_type_text: String,
    /// True when the first parameter is not `self:`
    pub is_static: bool,
}

impl MethodDecl {
    pub fn is_constructor(&self) -> bool {
        self.name == "init"
    }

    pub fn is_destructor(&self) -> bool {
        self.name == "deinit"
    }
}

/// Property access mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PropertyAccess {
    ReadOnly,
    #[default]
    ReadWrite,
}

/// An entry of `pub const properties = .{ ... }`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDecl {
    pub name: String,
    pub type_text: String,
    pub access: PropertyAccess,
    pub default_text: Option<String>,
}

impl PropertyDecl {
    pub fn is_writable(&self) -> bool {
        self.access == PropertyAccess::ReadWrite
    }
}

/// A nested constant kept verbatim, e.g. `const Self = @This();`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstDecl {
    pub name: String,
    pub raw_source: String,
}

/// One `zoop.class(...)` declaration site
///
/// `parent_ref` and `mixin_refs` are raw textual references; they are only
/// ever resolved through the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDecl {
    pub name: SharedStr,
    pub parent_ref: Option<SharedStr>,
    pub mixin_refs: Vec<SharedStr>,
    pub fields: Vec<FieldDecl>,
    pub methods: Vec<MethodDecl>,
    pub properties: Vec<PropertyDecl>,
    pub constants: Vec<ConstDecl>,
    /// Text before `const` on the declaration line, e.g. `pub `
    pub visibility: String,
    /// Byte range of the whole declaration statement in the source file
    pub source_span: (usize, usize),
    pub file_path: String,
}

impl ClassDecl {
    pub fn method(&self, name: &str) -> Option<&MethodDecl> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.method(name).is_some()
    }

    /// Properties as backing fields, then plain fields
    pub fn layout_fields(&self) -> Vec<FieldDecl> {
        self.properties
            .iter()
            .map(|p| FieldDecl {
                name: p.name.clone(),
                type_text: p.type_text.clone(),
                default_text: p.default_text.clone(),
            })
            .chain(self.fields.iter().cloned())
            .collect()
    }
}
