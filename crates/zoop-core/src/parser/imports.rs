//! Import alias resolution.
//!
//! Maps `const alias = @import("path");` bindings to registry keys so a
//! qualified reference such as `base.Entity` can be followed into the file
//! that declares `Entity`.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

/// The framework's own runtime module
pub const RUNTIME_MODULE: &str = "zoop";

/// Modules that never need resolution
pub const RESERVED_MODULES: &[&str] = &["std", RUNTIME_MODULE];

static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"@import\(\s*"([^"]*)"\s*\)"#).expect("import pattern is valid")
});

static ALIAS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bconst\s+([A-Za-z_][A-Za-z0-9_]*)\s*=\s*$").expect("alias pattern is valid")
});

static RUNTIME_IMPORT_LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)^[^\n]*@import\(\s*"zoop"\s*\)[^\n]*(?:\n|$)"#)
        .expect("runtime import pattern is valid")
});

/// Collect `alias -> resolved path` for every non-reserved import in `source`
pub fn parse_imports(source: &str, current_file: &str) -> IndexMap<String, String> {
    let mut aliases = IndexMap::new();

    for captures in IMPORT_RE.captures_iter(source) {
        let (Some(call), Some(path)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let path = path.as_str();
        if RESERVED_MODULES.contains(&path) {
            continue;
        }

        let line_start = source[..call.start()].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let Some(alias) = ALIAS_RE
            .captures(&source[line_start..call.start()])
            .and_then(|c| c.get(1))
        else {
            continue;
        };

        aliases.insert(alias.as_str().to_string(), resolve_import_path(current_file, path));
    }

    aliases
}

/// Join `import_path` onto the directory of `current_file`
pub fn resolve_import_path(current_file: &str, import_path: &str) -> String {
    match current_file.rfind('/') {
        Some(slash) => normalize_path(&format!("{}/{}", &current_file[..slash], import_path)),
        None => normalize_path(import_path),
    }
}

/// Lexically fold `.` and `..` components of a `/`-separated path
pub fn normalize_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    parts.join("/")
}

/// True when `source` imports the runtime module
pub fn has_runtime_import(source: &str) -> bool {
    IMPORT_RE
        .captures_iter(source)
        .any(|c| c.get(1).is_some_and(|p| p.as_str() == RUNTIME_MODULE))
}

/// Remove every line that imports the runtime module
pub fn strip_runtime_imports(source: &str) -> String {
    RUNTIME_IMPORT_LINE_RE.replace_all(source, "").into_owned()
}
