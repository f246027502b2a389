//! Global class registry.
//!
//! Populated during the scan pass and read-only afterwards. Every parent and
//! mixin reference is resolved on demand through [`GlobalRegistry`]; parsed
//! declarations never hold pointers to each other.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::warn;

use crate::ast::ClassDecl;
use crate::{Result, ZoopError};

/// Pooled, reference-counted string
pub type SharedStr = Arc<str>;

/// Everything the generator needs to know about one scanned file
#[derive(Debug, Clone, Default)]
pub struct FileRecord {
    pub path: String,
    pub import_aliases: IndexMap<String, String>,
    pub classes: Vec<ClassDecl>,
    pub source_text: String,
}

impl FileRecord {
    pub fn new(
        path: impl Into<String>,
        source_text: impl Into<String>,
        import_aliases: IndexMap<String, String>,
    ) -> Self {
        Self {
            path: path.into(),
            import_aliases,
            classes: Vec::new(),
            source_text: source_text.into(),
        }
    }

    pub fn class(&self, name: &str) -> Option<&ClassDecl> {
        self.classes.iter().find(|c| &*c.name == name)
    }
}

/// Per-run store of scanned files and their declarations
#[derive(Debug, Default)]
pub struct GlobalRegistry {
    files: IndexMap<String, FileRecord>,
    string_pool: HashSet<SharedStr>,
}

impl GlobalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file record; an existing record for the same path is replaced
    pub fn register_file(&mut self, record: FileRecord) {
        self.files.insert(record.path.clone(), record);
    }

    /// Append a declaration to an already registered file
    pub fn add_class(&mut self, file_path: &str, decl: ClassDecl) -> Result<()> {
        if !self.files.contains_key(file_path) {
            return Err(ZoopError::FileNotRegistered(file_path.to_string()));
        }

        let decl = self.intern_decl(decl);
        let Some(record) = self.files.get_mut(file_path) else {
            return Err(ZoopError::FileNotRegistered(file_path.to_string()));
        };
        if record.class(&decl.name).is_some() {
            warn!(
                file = file_path,
                class = %decl.name,
                "duplicate class name, keeping the first declaration"
            );
            return Ok(());
        }
        record.classes.push(decl);
        Ok(())
    }

    pub fn get_class(&self, file_path: &str, name: &str) -> Option<&ClassDecl> {
        self.files.get(file_path)?.class(name)
    }

    /// Resolve `ref_text` as seen from `current_file`.
    ///
    /// `alias.Name` goes through the file's import aliases; a bare `Name` is
    /// looked up in `current_file`. Unknown aliases and names yield `None`.
    pub fn resolve_reference(&self, ref_text: &str, current_file: &str) -> Option<&ClassDecl> {
        let ref_text = ref_text.trim();
        match ref_text.split_once('.') {
            Some((alias, name)) => {
                let target = self.files.get(current_file)?.import_aliases.get(alias.trim())?;
                self.get_class(target, name.trim())
            }
            None => self.get_class(current_file, ref_text),
        }
    }

    /// Return the pooled handle equal to `text`
    pub fn intern(&mut self, text: &str) -> SharedStr {
        if let Some(existing) = self.string_pool.get(text) {
            return existing.clone();
        }
        let shared: SharedStr = Arc::from(text);
        self.string_pool.insert(shared.clone());
        shared
    }

    fn intern_decl(&mut self, mut decl: ClassDecl) -> ClassDecl {
        decl.name = self.intern(&decl.name);
        decl.parent_ref = decl.parent_ref.map(|p| self.intern(&p));
        decl.mixin_refs = decl
            .mixin_refs
            .iter()
            .map(|m| self.intern(m))
            .collect();
        decl
    }

    pub fn file(&self, path: &str) -> Option<&FileRecord> {
        self.files.get(path)
    }

    /// Files in registration order
    pub fn files(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }

    /// Every registered declaration, file by file
    pub fn classes(&self) -> impl Iterator<Item = &ClassDecl> {
        self.files.values().flat_map(|f| f.classes.iter())
    }

    pub fn class_count(&self) -> usize {
        self.files.values().map(|f| f.classes.len()).sum()
    }

    pub fn pool_size(&self) -> usize {
        self.string_pool.len()
    }
}
