// Parser module - text-level scanning of zoop declarations.
// Nothing here consults the registry, so files can be parsed independently.

pub mod declaration;
pub mod imports;
pub mod scanner;

pub use declaration::{classify_item, parse_declaration, BodyItem};
pub use imports::{has_runtime_import, parse_imports, strip_runtime_imports};
pub use scanner::{
    declaration_at, find_body_open, find_marker, find_matching, find_next_declaration,
    statement_start, DeclarationSite, CLASS_MARKER,
};

use crate::ast::ClassDecl;

/// Result of scanning one marker site
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOutcome {
    Parsed(ClassDecl),
    /// Marker found but the declaration could not be parsed
    Skipped { offset: usize },
}

/// Scan `source` for every declaration site, in source order.
///
/// Malformed sites are reported as [`ScanOutcome::Skipped`] and scanning
/// resumes one byte past their marker. Spans of parsed declarations never
/// overlap: a statement never starts before the previous declaration ends.
pub fn scan_declarations(source: &str, file_path: &str) -> Vec<ScanOutcome> {
    let mut outcomes = Vec::new();
    let mut from = 0;
    let mut previous_end = 0;

    while let Some(marker) = find_marker(source, from) {
        let parsed = declaration_at(source, marker).and_then(|mut site| {
            site.statement_start = site.statement_start.max(previous_end);
            parse_declaration(source, &site, file_path).map(|decl| (site, decl))
        });
        match parsed {
            Some((site, decl)) => {
                outcomes.push(ScanOutcome::Parsed(decl));
                from = site.end;
                previous_end = site.end;
            }
            None => {
                outcomes.push(ScanOutcome::Skipped { offset: marker });
                from = marker + 1;
            }
        }
    }

    outcomes
}

/// True when the file is worth handing to the generator
pub fn is_zoop_source(source: &str) -> bool {
    source.contains(CLASS_MARKER) || has_runtime_import(source)
}
