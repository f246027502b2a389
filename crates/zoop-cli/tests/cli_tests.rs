use std::fs;

use tempfile::TempDir;
use zoop_cli::{build_command, config_from_matches, format_summary, invocation_from_matches};
use zoop_core::{generate_all, GenerationSummary, SkippedDeclaration};

#[test]
fn test_positional_directories() {
    let matches = build_command()
        .try_get_matches_from(["zoop", "src", "gen"])
        .unwrap();
    let invocation = invocation_from_matches(&matches).unwrap();
    assert_eq!(invocation.source_dir.to_str(), Some("src"));
    assert_eq!(invocation.output_dir.to_str(), Some("gen"));
    assert!(!invocation.debug);
    assert_eq!(invocation.config, zoop_core::ZoopConfig::default());
}

#[test]
fn test_missing_output_dir_is_rejected() {
    assert!(build_command().try_get_matches_from(["zoop", "src"]).is_err());
}

#[test]
fn test_flags_override_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("zoop.json");
    fs::write(
        &config_path,
        r#"{ "getter_prefix": "fetch_", "setter_prefix": "store_" }"#,
    )
    .unwrap();

    let matches = build_command()
        .try_get_matches_from([
            "zoop",
            "src",
            "gen",
            "--config",
            config_path.to_str().unwrap(),
            "--setter-prefix",
            "put_",
            "--strict",
            "--copy-passthrough",
        ])
        .unwrap();
    let config = config_from_matches(&matches).unwrap();
    assert_eq!(config.getter_prefix, "fetch_");
    assert_eq!(config.setter_prefix, "put_");
    assert!(config.strict_declarations);
    assert!(config.copy_passthrough);
}

#[test]
fn test_invalid_config_file() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("broken.json");
    fs::write(&config_path, "{ not json").unwrap();

    let matches = build_command()
        .try_get_matches_from(["zoop", "src", "gen", "--config", config_path.to_str().unwrap()])
        .unwrap();
    let err = config_from_matches(&matches).unwrap_err();
    assert!(err.to_string().contains("Invalid config file"));
}

#[test]
fn test_summary_line() {
    let mut summary = GenerationSummary::new();
    summary.files_scanned = 3;
    summary.files_written = 2;
    summary.classes_generated = 4;
    assert_eq!(
        format_summary(&summary),
        "Generated 4 classes in 2 files (3 scanned)"
    );

    summary.skipped_declarations.push(SkippedDeclaration {
        file: "a.zig".to_string(),
        offset: 0,
    });
    assert_eq!(
        format_summary(&summary),
        "Generated 4 classes in 2 files (3 scanned, 1 malformed declarations skipped)"
    );
}

#[test]
fn test_end_to_end_with_custom_prefixes() {
    let src = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    fs::write(
        src.path().join("user.zig"),
        "const zoop = @import(\"zoop\");\n\npub const User = zoop.class(struct {\n    pub const properties = .{\n        .age = .{ .type = u32, .access = .read_write },\n    };\n});\n",
    )
    .unwrap();

    let matches = build_command()
        .try_get_matches_from([
            "zoop",
            src.path().to_str().unwrap(),
            out.path().to_str().unwrap(),
            "--getter-prefix",
            "read_",
            "--setter-prefix",
            "put_",
        ])
        .unwrap();
    let invocation = invocation_from_matches(&matches).unwrap();
    let summary = generate_all(
        &invocation.source_dir,
        &invocation.output_dir,
        &invocation.config,
    )
    .unwrap();
    assert_eq!(summary.classes_generated, 1);

    let generated = fs::read_to_string(out.path().join("user.zig")).unwrap();
    assert!(generated.contains("pub inline fn read_age(self: *const User) u32"));
    assert!(generated.contains("pub inline fn put_age(self: *User, value: u32) void"));
}
