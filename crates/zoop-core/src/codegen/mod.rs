/*!
# Code Generation

Flattens one zoop class into a plain Zig struct:

1. ancestor fields, root first, then mixin fields, then the class's own
2. nested constants, then the class's own methods verbatim
3. inherited `init`/`deinit` with their signature re-targeted
4. every other inherited instance method, nearest ancestor winning
5. mixin instance methods not already provided
6. property accessors
*/

pub mod hierarchy;
pub mod rewrite;

use std::collections::HashSet;

use tracing::debug;

use crate::ast::{ClassDecl, FieldDecl, MethodDecl, PropertyDecl};
use crate::registry::GlobalRegistry;
use crate::security::{validate_type_name, MAX_SIGNATURE_LEN};
use crate::{Result, ZoopConfig, ZoopError};

use self::hierarchy::ancestor_chain;
use self::rewrite::{rewrite_identifier, splice_lifecycle_method};

const INDENT: &str = "    ";

/// Generate the flattened struct for `decl`, resolving references from
/// `current_file`.
pub fn generate(
    decl: &ClassDecl,
    config: &ZoopConfig,
    current_file: &str,
    registry: &GlobalRegistry,
) -> Result<String> {
    validate_type_name(&decl.name)?;

    let ancestors = ancestor_chain(decl, registry)?;
    let mixins: Vec<&ClassDecl> = decl
        .mixin_refs
        .iter()
        .filter_map(|mixin_ref| {
            let resolved = registry.resolve_reference(mixin_ref, current_file);
            if resolved.is_none() {
                debug!(class = %decl.name, mixin = %mixin_ref, "mixin unresolved, skipping");
            }
            resolved
        })
        .collect();

    let mut out = format!("{}const {} = struct {{\n", decl.visibility, decl.name);

    // Fields: root ancestor first, nearest parent last, then mixins, then own
    let mut fields: Vec<FieldDecl> = Vec::new();
    for ancestor in ancestors.iter().rev() {
        fields.extend(ancestor.layout_fields());
    }
    for mixin in &mixins {
        fields.extend(mixin.layout_fields());
    }
    fields.extend(decl.layout_fields());
    for field in &fields {
        out.push_str(&format_field(field));
    }

    if !decl.constants.is_empty() {
        out.push('\n');
        for constant in &decl.constants {
            out.push_str(&format!("{INDENT}{}\n", constant.raw_source));
        }
    }

    let mut members: Vec<String> = Vec::new();

    // Own methods verbatim
    let mut provided: HashSet<&str> = HashSet::new();
    for method in &decl.methods {
        provided.insert(method.name.as_str());
        members.push(method.raw_source.clone());
    }

    // Parent chain methods
    let mut lifecycle: [Option<(&MethodDecl, &str)>; 2] = [None, None];
    let mut inherited: Vec<(&MethodDecl, &str)> = Vec::new();
    for ancestor in &ancestors {
        for method in &ancestor.methods {
            if method.is_static || provided.contains(method.name.as_str()) {
                continue;
            }
            let slot = if method.is_constructor() {
                Some(0)
            } else if method.is_destructor() {
                Some(1)
            } else {
                None
            };
            match slot {
                Some(slot) => {
                    lifecycle[slot].get_or_insert((method, &*ancestor.name));
                }
                None => {
                    inherited.push((method, &*ancestor.name));
                    provided.insert(method.name.as_str());
                }
            }
        }
    }

    for (method, ancestor_name) in lifecycle.into_iter().flatten() {
        check_signature(method)?;
        provided.insert(method.name.as_str());
        members.push(splice_lifecycle_method(&method.raw_source, ancestor_name, &decl.name));
    }

    for (method, ancestor_name) in inherited {
        check_signature(method)?;
        validate_type_name(ancestor_name)?;
        members.push(rewrite_identifier(&method.raw_source, ancestor_name, &decl.name));
    }

    // Mixin methods, not transitive
    for mixin in &mixins {
        validate_type_name(&mixin.name)?;
        for method in &mixin.methods {
            if method.is_static
                || method.is_constructor()
                || method.is_destructor()
                || provided.contains(method.name.as_str())
            {
                continue;
            }
            check_signature(method)?;
            provided.insert(method.name.as_str());
            members.push(rewrite_identifier(&method.raw_source, &mixin.name, &decl.name));
        }
    }

    for property in &decl.properties {
        members.push(getter(property, config, &decl.name));
        if property.is_writable() {
            members.push(setter(property, config, &decl.name));
        }
    }

    for member in &members {
        out.push('\n');
        out.push_str(INDENT);
        out.push_str(member);
        out.push('\n');
    }

    out.push_str("};");
    debug!(
        class = %decl.name,
        ancestors = ancestors.len(),
        mixins = mixins.len(),
        fields = fields.len(),
        members = members.len(),
        "generated class"
    );
    Ok(out)
}

fn check_signature(method: &MethodDecl) -> Result<()> {
    let len = method.signature_text.len();
    if len > MAX_SIGNATURE_LEN {
        return Err(ZoopError::SignatureTooLong {
            method: method.name.clone(),
            len,
            limit: MAX_SIGNATURE_LEN,
        });
    }
    Ok(())
}

fn format_field(field: &FieldDecl) -> String {
    match &field.default_text {
        Some(default) => format!("{INDENT}{}: {} = {},\n", field.name, field.type_text, default),
        None => format!("{INDENT}{}: {},\n", field.name, field.type_text),
    }
}

fn getter(property: &PropertyDecl, config: &ZoopConfig, class_name: &str) -> String {
    format!(
        "pub inline fn {prefix}{name}(self: *const {class_name}) {ty} {{\n{INDENT}{INDENT}return self.{name};\n{INDENT}}}",
        prefix = config.getter_prefix,
        name = property.name,
        ty = property.type_text,
    )
}

fn setter(property: &PropertyDecl, config: &ZoopConfig, class_name: &str) -> String {
    format!(
        "pub inline fn {prefix}{name}(self: *{class_name}, value: {ty}) void {{\n{INDENT}{INDENT}self.{name} = value;\n{INDENT}}}",
        prefix = config.setter_prefix,
        name = property.name,
        ty = property.type_text,
    )
}
