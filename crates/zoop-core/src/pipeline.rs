/*!
# Generation Pipeline

Two-pass driver over a source tree.

1. **Scan**: walk the tree, read every candidate `.zig` file once, parse its
   imports and declarations into the [`GlobalRegistry`].
2. **Validate**: reject circular or over-deep inheritance before any output.
3. **Emit**: re-walk the registered files, replace each declaration with its
   flattened struct, drop the runtime import and write the result to the
   mirrored path under the output directory.

A failed run may leave a partially populated output directory.
*/

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::codegen::{generate, hierarchy::validate_registry};
use crate::parser::{imports, is_zoop_source, parse_imports, scan_declarations, ScanOutcome};
use crate::registry::{FileRecord, GlobalRegistry};
use crate::security::{check_relative_path, MAX_FILE_SIZE};
use crate::{Result, ZoopConfig, ZoopError};

/// Header written at the top of every generated file
pub const GENERATED_HEADER: &str =
    "// Auto-generated by zoop-codegen\n// DO NOT EDIT - changes will be overwritten\n\n";

/// Run the whole pipeline with `config`
pub fn generate_all<P: AsRef<Path>, Q: AsRef<Path>>(
    source_dir: P,
    output_dir: Q,
    config: &ZoopConfig,
) -> Result<GenerationSummary> {
    Generator::new(config.clone()).run(source_dir, output_dir)
}

/// A declaration site that was found but could not be parsed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDeclaration {
    pub file: String,
    pub offset: usize,
}

/// Summary of a generation run
#[derive(Debug, Default)]
pub struct GenerationSummary {
    pub files_scanned: u64,
    pub files_written: u64,
    pub files_copied: u64,
    pub classes_generated: u64,
    pub skipped_paths: Vec<String>,
    pub skipped_declarations: Vec<SkippedDeclaration>,
}

impl GenerationSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when nothing was skipped
    pub fn is_clean(&self) -> bool {
        self.skipped_paths.is_empty() && self.skipped_declarations.is_empty()
    }
}

/// Output of the scan pass
#[derive(Debug, Default)]
pub struct ScanPass {
    pub registry: GlobalRegistry,
    /// (relative path, contents) of files copied without generation
    pub passthrough: Vec<(String, String)>,
}

/// Two-pass code generator
#[derive(Debug, Clone, Default)]
pub struct Generator {
    config: ZoopConfig,
}

impl Generator {
    pub fn new(config: ZoopConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ZoopConfig {
        &self.config
    }

    /// Scan `source_dir`, validate, and write generated files to `output_dir`
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_dir: P,
        output_dir: Q,
    ) -> Result<GenerationSummary> {
        let source_dir = source_dir.as_ref();
        let output_dir = output_dir.as_ref();

        let mut summary = GenerationSummary::new();
        let scan = self.scan(source_dir, &mut summary)?;
        validate_registry(&scan.registry)?;

        fs::create_dir_all(output_dir).map_err(|e| ZoopError::io(output_dir, e))?;

        for record in scan.registry.files() {
            let content = self.render_file(record, &scan.registry)?;
            write_output(output_dir, &record.path, &content)?;
            summary.files_written += 1;
            summary.classes_generated += record.classes.len() as u64;
        }

        for (relative, content) in &scan.passthrough {
            write_output(output_dir, relative, content)?;
            summary.files_copied += 1;
        }

        info!(
            scanned = summary.files_scanned,
            written = summary.files_written,
            copied = summary.files_copied,
            classes = summary.classes_generated,
            skipped_paths = summary.skipped_paths.len(),
            skipped_declarations = summary.skipped_declarations.len(),
            "generation complete"
        );
        Ok(summary)
    }

    /// First pass: populate a registry from every candidate file
    pub fn scan(&self, source_dir: &Path, summary: &mut GenerationSummary) -> Result<ScanPass> {
        if !source_dir.is_dir() {
            return Err(ZoopError::MissingSourceDir(source_dir.to_path_buf()));
        }

        let mut files = Vec::new();
        self.collect_files(source_dir, &mut files)?;

        let mut pass = ScanPass::default();
        for path in files {
            let Some(relative) = relative_path(source_dir, &path) else {
                continue;
            };
            if let Err(violation) = check_relative_path(&relative) {
                warn!(path = %relative, %violation, "skipping unsafe path");
                summary.skipped_paths.push(relative);
                continue;
            }

            summary.files_scanned += 1;
            let source = read_source(&path)?;

            if !is_zoop_source(&source) {
                if self.config.copy_passthrough {
                    pass.passthrough.push((relative, source));
                }
                continue;
            }

            self.register_source(&mut pass.registry, &relative, source, summary)?;
        }

        Ok(pass)
    }

    /// Parse one file's imports and declarations into `registry`
    pub fn register_source(
        &self,
        registry: &mut GlobalRegistry,
        relative: &str,
        source: String,
        summary: &mut GenerationSummary,
    ) -> Result<()> {
        let aliases = parse_imports(&source, relative);
        let outcomes = scan_declarations(&source, relative);
        registry.register_file(FileRecord::new(relative, source, aliases));

        for outcome in outcomes {
            match outcome {
                ScanOutcome::Parsed(decl) => {
                    debug!(file = relative, class = %decl.name, "registered class");
                    registry.add_class(relative, decl)?;
                }
                ScanOutcome::Skipped { offset } if self.config.strict_declarations => {
                    return Err(ZoopError::MalformedDeclaration {
                        file: relative.to_string(),
                        offset,
                    });
                }
                ScanOutcome::Skipped { offset } => {
                    warn!(file = relative, offset, "skipping malformed declaration");
                    summary.skipped_declarations.push(SkippedDeclaration {
                        file: relative.to_string(),
                        offset,
                    });
                }
            }
        }
        Ok(())
    }

    /// Second pass for one file: header, untouched text, generated structs
    pub fn render_file(&self, record: &FileRecord, registry: &GlobalRegistry) -> Result<String> {
        let source = &record.source_text;
        let mut classes: Vec<_> = record.classes.iter().collect();
        classes.sort_by_key(|c| c.source_span.0);

        let mut out = String::with_capacity(source.len() + GENERATED_HEADER.len());
        out.push_str(GENERATED_HEADER);

        let mut cursor = 0;
        for decl in classes {
            let (start, end) = decl.source_span;
            out.push_str(&imports::strip_runtime_imports(&source[cursor..start]));
            out.push_str(&generate(decl, &self.config, &record.path, registry)?);
            cursor = end;
        }
        out.push_str(&imports::strip_runtime_imports(&source[cursor..]));

        Ok(out)
    }

    /// Recursively gather files with the configured extension, sorted
    fn collect_files(&self, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir).map_err(|e| ZoopError::io(dir, e))? {
            let entry = entry.map_err(|e| ZoopError::io(dir, e))?;
            entries.push(entry.path());
        }
        entries.sort();

        for path in entries {
            if path.is_dir() {
                self.collect_files(&path, files)?;
            } else if self.should_process_file(&path) {
                files.push(path);
            }
        }
        Ok(())
    }

    fn should_process_file(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| ext.to_string_lossy() == self.config.source_extension)
    }
}

/// `/`-joined path of `path` below `root`
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    Some(parts.join("/"))
}

fn read_source(path: &Path) -> Result<String> {
    let size = fs::metadata(path).map_err(|e| ZoopError::io(path, e))?.len();
    if size > MAX_FILE_SIZE {
        return Err(ZoopError::FileTooLarge {
            path: path.to_path_buf(),
            size,
            limit: MAX_FILE_SIZE,
        });
    }
    fs::read_to_string(path).map_err(|e| ZoopError::io(path, e))
}

fn write_output(output_dir: &Path, relative: &str, content: &str) -> Result<()> {
    if check_relative_path(relative).is_err() {
        return Err(ZoopError::UnsafePath(relative.to_string()));
    }

    let target = output_dir.join(relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|e| ZoopError::io(parent, e))?;
    }
    fs::write(&target, content).map_err(|e| ZoopError::io(&target, e))?;
    debug!(path = %target.display(), "wrote file");
    Ok(())
}
