//! # Zoop Core
//!
//! Code generation engine for zoop, single inheritance with mixins for Zig.
//! The engine includes:
//! - Declaration scanning and parsing for `zoop.class(struct { ... })` sites
//! - Import alias resolution and a cross-file class registry
//! - Circular-inheritance validation
//! - Hierarchy flattening and method copying into plain Zig structs
//!
//! The whole run is driven by [`generate_all`], which scans a source tree,
//! registers every declaration, validates the hierarchy and writes the
//! rewritten files into a mirrored output tree.

#![warn(clippy::all)]

pub mod ast;
pub mod codegen;
pub mod parser;
pub mod pipeline;
pub mod registry;
pub mod security;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use ast::{ClassDecl, ConstDecl, FieldDecl, MethodDecl, PropertyAccess, PropertyDecl};
pub use codegen::{
    generate,
    hierarchy::{check_no_cycle, validate_registry, CycleError},
    rewrite::rewrite_identifier,
};
pub use parser::{find_next_declaration, parse_declaration, parse_imports, DeclarationSite};
pub use pipeline::{generate_all, Generator, GenerationSummary, SkippedDeclaration};
pub use registry::{FileRecord, GlobalRegistry, SharedStr};

/// Zoop version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for zoop components
pub fn init_tracing(debug: bool) {
    let default_directive = if debug { "zoop_core=debug" } else { "zoop_core=info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    // A subscriber may already be installed by an embedding build tool.
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Code generation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoopConfig {
    /// Prefix for generated property getters
    pub getter_prefix: String,
    /// Prefix for generated property setters
    pub setter_prefix: String,
    /// Treat a malformed declaration as a fatal error instead of skipping it
    pub strict_declarations: bool,
    /// Copy `.zig` files that carry no declarations into the output tree
    pub copy_passthrough: bool,
    /// Extension of the source files considered during the walk
    pub source_extension: String,
}

impl Default for ZoopConfig {
    fn default() -> Self {
        Self {
            getter_prefix: "get_".to_string(),
            setter_prefix: "set_".to_string(),
            strict_declarations: false,
            copy_passthrough: false,
            source_extension: "zig".to_string(),
        }
    }
}

impl ZoopConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_getter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.getter_prefix = prefix.into();
        self
    }

    pub fn with_setter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.setter_prefix = prefix.into();
        self
    }

    pub fn strict_declarations(mut self, strict: bool) -> Self {
        self.strict_declarations = strict;
        self
    }

    pub fn copy_passthrough(mut self, copy: bool) -> Self {
        self.copy_passthrough = copy;
        self
    }
}

/// Error types for zoop generation runs
#[derive(thiserror::Error, Debug)]
pub enum ZoopError {
    /// Inheritance graph is structurally invalid
    #[error(transparent)]
    Cycle(#[from] CycleError),

    /// A class or type name failed identifier validation
    #[error("Invalid type name: {0:?}")]
    InvalidTypeName(String),

    /// Method signature exceeds the allowed length
    #[error("Method signature too long: {method} ({len} bytes, limit {limit})")]
    SignatureTooLong {
        method: String,
        len: usize,
        limit: usize,
    },

    /// Relative path failed traversal/control-character validation
    #[error("Unsafe path rejected: {0:?}")]
    UnsafePath(String),

    /// Source file exceeds the read limit
    #[error("File too large: {} ({size} bytes, limit {limit})", .path.display())]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        limit: u64,
    },

    /// Registry lookup on a file that was never registered
    #[error("File not registered: {0}")]
    FileNotRegistered(String),

    /// Declaration could not be parsed (strict mode only)
    #[error("Malformed declaration in {file} at byte {offset}")]
    MalformedDeclaration { file: String, offset: usize },

    /// Source directory is missing
    #[error("Source directory does not exist: {}", .0.display())]
    MissingSourceDir(PathBuf),

    /// Filesystem failure
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ZoopError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for zoop operations
pub type Result<T> = std::result::Result<T, ZoopError>;
