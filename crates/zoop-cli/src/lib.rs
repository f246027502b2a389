//! Argument handling for the `zoop` binary

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use tracing::debug;
use zoop_core::{GenerationSummary, ZoopConfig};

/// Paths and settings for one invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub config: ZoopConfig,
    pub debug: bool,
}

pub fn build_command() -> Command {
    Command::new("zoop")
        .version(zoop_core::VERSION)
        .about("Flatten zoop class declarations into plain Zig structs")
        .arg(
            Arg::new("source")
                .value_name("SOURCE_DIR")
                .help("Directory scanned for .zig sources")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .value_name("OUTPUT_DIR")
                .help("Directory receiving generated files")
                .required(true)
                .index(2),
        )
        .arg(
            Arg::new("getter-prefix")
                .long("getter-prefix")
                .value_name("PREFIX")
                .help("Prefix for generated property getters"),
        )
        .arg(
            Arg::new("setter-prefix")
                .long("setter-prefix")
                .value_name("PREFIX")
                .help("Prefix for generated property setters"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file; flags override its values"),
        )
        .arg(
            Arg::new("strict")
                .long("strict")
                .help("Fail on malformed declarations instead of skipping them")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("copy-passthrough")
                .long("copy-passthrough")
                .help("Copy .zig files without declarations into the output")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debug")
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue),
        )
}

/// Read a JSON config file; missing keys take their defaults
pub fn load_config(path: &Path) -> Result<ZoopConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config = serde_json::from_str(&text)
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Config file first, then flag overrides
pub fn config_from_matches(matches: &ArgMatches) -> Result<ZoopConfig> {
    let mut config = match matches.get_one::<String>("config") {
        Some(path) => load_config(Path::new(path))?,
        None => ZoopConfig::default(),
    };

    if let Some(prefix) = matches.get_one::<String>("getter-prefix") {
        config.getter_prefix = prefix.clone();
    }
    if let Some(prefix) = matches.get_one::<String>("setter-prefix") {
        config.setter_prefix = prefix.clone();
    }
    if matches.get_flag("strict") {
        config.strict_declarations = true;
    }
    if matches.get_flag("copy-passthrough") {
        config.copy_passthrough = true;
    }
    Ok(config)
}

pub fn invocation_from_matches(matches: &ArgMatches) -> Result<Invocation> {
    let source_dir = matches
        .get_one::<String>("source")
        .context("SOURCE_DIR is required")?;
    let output_dir = matches
        .get_one::<String>("output")
        .context("OUTPUT_DIR is required")?;

    Ok(Invocation {
        source_dir: PathBuf::from(source_dir),
        output_dir: PathBuf::from(output_dir),
        config: config_from_matches(matches)?,
        debug: matches.get_flag("debug"),
    })
}

/// One-line report printed after a successful run
pub fn format_summary(summary: &GenerationSummary) -> String {
    let mut line = format!(
        "Generated {} classes in {} files ({} scanned",
        summary.classes_generated, summary.files_written, summary.files_scanned
    );
    if summary.files_copied > 0 {
        line.push_str(&format!(", {} copied", summary.files_copied));
    }
    if !summary.skipped_paths.is_empty() {
        line.push_str(&format!(", {} unsafe paths skipped", summary.skipped_paths.len()));
    }
    if !summary.skipped_declarations.is_empty() {
        line.push_str(&format!(
            ", {} malformed declarations skipped",
            summary.skipped_declarations.len()
        ));
    }
    line.push(')');
    line
}
