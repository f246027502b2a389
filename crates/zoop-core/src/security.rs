//! Input validation for generation runs
//!
//! Provides the checks applied to untrusted input:
//! - Relative path validation (traversal, absolute, control characters)
//! - Identifier validation for emitted type names
//! - Resource limits for files, signatures and inheritance depth

use crate::{Result, ZoopError};

/// Largest source file read during a run (5 MiB)
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;
/// Deepest parent chain walked by validation and flattening
pub const MAX_INHERITANCE_DEPTH: usize = 256;
/// Longest method signature copied into a descendant
pub const MAX_SIGNATURE_LEN: usize = 1024;
/// Longest class/type name emitted
pub const MAX_TYPE_NAME_LEN: usize = 256;

const ENCODED_TRAVERSALS: &[&str] = &["%2e", "%2E", "%252e", "%252E"];

/// Reasons a relative path is rejected
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathViolation {
    #[error("parent directory segment")]
    ParentTraversal,
    #[error("absolute path")]
    Absolute,
    #[error("drive letter prefix")]
    DriveLetter,
    #[error("backslash separator")]
    Backslash,
    #[error("NUL byte")]
    Nul,
    #[error("control character")]
    ControlCharacter,
    #[error("percent-encoded traversal")]
    EncodedTraversal,
}

/// Validate a `/`-separated path relative to the source or output root
pub fn check_relative_path(path: &str) -> std::result::Result<(), PathViolation> {
    if path.contains('\0') {
        return Err(PathViolation::Nul);
    }
    if path
        .chars()
        .any(|c| c.is_ascii_control() && !matches!(c, '\n' | '\r' | '\t'))
    {
        return Err(PathViolation::ControlCharacter);
    }
    if path.contains('\\') {
        return Err(PathViolation::Backslash);
    }
    if path.starts_with('/') {
        return Err(PathViolation::Absolute);
    }
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        return Err(PathViolation::DriveLetter);
    }
    if path.split('/').any(|segment| segment == "..") {
        return Err(PathViolation::ParentTraversal);
    }
    if ENCODED_TRAVERSALS.iter().any(|seq| path.contains(seq)) {
        return Err(PathViolation::EncodedTraversal);
    }
    Ok(())
}

pub fn is_safe_path(path: &str) -> bool {
    check_relative_path(path).is_ok()
}

/// Validate a class/type name before it is written into generated code
pub fn validate_type_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid = valid_start
        && name.len() <= MAX_TYPE_NAME_LEN
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');

    if valid {
        Ok(())
    } else {
        Err(ZoopError::InvalidTypeName(name.to_string()))
    }
}
