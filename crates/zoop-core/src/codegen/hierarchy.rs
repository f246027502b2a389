/*!
# Inheritance Chains

Parent-chain walking over the registry: cycle/depth validation for the whole
registry, and the bounded ancestor walk the generator flattens from.
*/

use std::collections::HashSet;

use tracing::debug;

use crate::ast::ClassDecl;
use crate::registry::GlobalRegistry;
use crate::security::MAX_INHERITANCE_DEPTH;

/// Structural errors in the inheritance graph
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("Circular inheritance: {from} reaches {at} again")]
    CircularInheritance { from: String, at: String },

    #[error("Inheritance chain of {class} exceeds maximum depth {max}")]
    MaxDepthExceeded { class: String, max: usize },
}

/// Walk the parent chain of `class_name` and fail on a revisit or when the
/// chain grows past [`MAX_INHERITANCE_DEPTH`].
///
/// An unresolvable parent ends the walk: it is treated as an external root.
pub fn check_no_cycle(
    class_name: &str,
    parent_ref: Option<&str>,
    current_file: &str,
    registry: &GlobalRegistry,
) -> Result<(), CycleError> {
    let mut visited: HashSet<(String, String)> = HashSet::new();
    visited.insert((current_file.to_string(), class_name.to_string()));

    let mut next_ref = parent_ref.map(str::to_string);
    let mut file = current_file.to_string();
    let mut depth = 0usize;

    while let Some(reference) = next_ref {
        let Some(parent) = registry.resolve_reference(&reference, &file) else {
            debug!(class = class_name, parent = %reference, "parent unresolved, treating as root");
            break;
        };

        let key = (parent.file_path.clone(), parent.name.to_string());
        if visited.contains(&key) {
            return Err(CycleError::CircularInheritance {
                from: class_name.to_string(),
                at: parent.name.to_string(),
            });
        }
        visited.insert(key);

        depth += 1;
        if depth > MAX_INHERITANCE_DEPTH {
            return Err(CycleError::MaxDepthExceeded {
                class: class_name.to_string(),
                max: MAX_INHERITANCE_DEPTH,
            });
        }

        next_ref = parent.parent_ref.as_deref().map(str::to_string);
        file = parent.file_path.clone();
    }

    Ok(())
}

/// Check every registered class; run once before any generation
pub fn validate_registry(registry: &GlobalRegistry) -> Result<(), CycleError> {
    for decl in registry.classes() {
        check_no_cycle(&decl.name, decl.parent_ref.as_deref(), &decl.file_path, registry)?;
    }
    Ok(())
}

/// Resolved ancestors of `decl`, nearest parent first.
///
/// Stops at the first unresolvable parent. Still bounded, so a registry that
/// skipped validation cannot loop here.
pub fn ancestor_chain<'r>(
    decl: &ClassDecl,
    registry: &'r GlobalRegistry,
) -> Result<Vec<&'r ClassDecl>, CycleError> {
    let mut chain: Vec<&'r ClassDecl> = Vec::new();
    let mut next_ref = decl.parent_ref.clone();
    let mut file = decl.file_path.as_str();

    while let Some(reference) = next_ref {
        let Some(parent) = registry.resolve_reference(&reference, file) else {
            break;
        };
        let revisited = (parent.file_path == decl.file_path && parent.name == decl.name)
            || chain
                .iter()
                .any(|a| a.file_path == parent.file_path && a.name == parent.name);
        if revisited {
            return Err(CycleError::CircularInheritance {
                from: decl.name.to_string(),
                at: parent.name.to_string(),
            });
        }
        if chain.len() >= MAX_INHERITANCE_DEPTH {
            return Err(CycleError::MaxDepthExceeded {
                class: decl.name.to_string(),
                max: MAX_INHERITANCE_DEPTH,
            });
        }

        chain.push(parent);
        next_ref = parent.parent_ref.clone();
        file = parent.file_path.as_str();
    }

    Ok(chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::class;
    use crate::registry::FileRecord;

    fn linear_registry(len: usize) -> GlobalRegistry {
        // C0 extends C1 extends ... extends C{len-1}
        let mut registry = GlobalRegistry::new();
        registry.register_file(FileRecord::new("chain.zig", "", Default::default()));
        for i in 0..len {
            let parent = (i + 1 < len).then(|| format!("C{}", i + 1));
            registry
                .add_class("chain.zig", class("chain.zig", &format!("C{i}"), parent.as_deref()))
                .unwrap();
        }
        registry
    }

    #[test]
    fn test_detects_three_class_cycle() {
        let mut registry = GlobalRegistry::new();
        registry.register_file(FileRecord::new("m.zig", "", Default::default()));
        registry.add_class("m.zig", class("m.zig", "A", Some("B"))).unwrap();
        registry.add_class("m.zig", class("m.zig", "B", Some("C"))).unwrap();
        registry.add_class("m.zig", class("m.zig", "C", Some("A"))).unwrap();

        let err = validate_registry(&registry).unwrap_err();
        assert_eq!(
            err,
            CycleError::CircularInheritance {
                from: "A".to_string(),
                at: "A".to_string()
            }
        );
    }

    #[test]
    fn test_self_inheritance() {
        let mut registry = GlobalRegistry::new();
        registry.register_file(FileRecord::new("m.zig", "", Default::default()));
        registry.add_class("m.zig", class("m.zig", "A", Some("A"))).unwrap();
        assert!(matches!(
            check_no_cycle("A", Some("A"), "m.zig", &registry),
            Err(CycleError::CircularInheritance { .. })
        ));
    }

    #[test]
    fn test_max_depth_boundary() {
        // C0 has exactly MAX_INHERITANCE_DEPTH ancestors
        let registry = linear_registry(MAX_INHERITANCE_DEPTH + 1);
        assert!(validate_registry(&registry).is_ok());
        let c0 = registry.get_class("chain.zig", "C0").unwrap();
        assert_eq!(ancestor_chain(c0, &registry).unwrap().len(), MAX_INHERITANCE_DEPTH);

        // one more link is fatal
        let registry = linear_registry(MAX_INHERITANCE_DEPTH + 2);
        assert_eq!(
            validate_registry(&registry).unwrap_err(),
            CycleError::MaxDepthExceeded {
                class: "C0".to_string(),
                max: MAX_INHERITANCE_DEPTH
            }
        );
        let c0 = registry.get_class("chain.zig", "C0").unwrap();
        assert!(ancestor_chain(c0, &registry).is_err());
    }

    #[test]
    fn test_unresolved_parent_is_root() {
        let mut registry = GlobalRegistry::new();
        registry.register_file(FileRecord::new("m.zig", "", Default::default()));
        registry.add_class("m.zig", class("m.zig", "A", Some("ext.Base"))).unwrap();
        assert!(validate_registry(&registry).is_ok());
        let a = registry.get_class("m.zig", "A").unwrap();
        assert!(ancestor_chain(a, &registry).unwrap().is_empty());
    }

    #[test]
    fn test_same_name_in_different_files_is_not_a_cycle() {
        let mut registry = GlobalRegistry::new();
        registry.register_file(FileRecord::new("lib/node.zig", "", Default::default()));
        let mut aliases = indexmap::IndexMap::new();
        aliases.insert("lib".to_string(), "lib/node.zig".to_string());
        registry.register_file(FileRecord::new("node.zig", "", aliases));
        registry.add_class("lib/node.zig", class("lib/node.zig", "Node", None)).unwrap();
        registry.add_class("node.zig", class("node.zig", "Node", Some("lib.Node"))).unwrap();

        assert!(validate_registry(&registry).is_ok());
        let node = registry.get_class("node.zig", "Node").unwrap();
        let chain = ancestor_chain(node, &registry).unwrap();
        assert_eq!(chain.len(), 1);
        assert_eq!(chain[0].file_path, "lib/node.zig");
    }
}
