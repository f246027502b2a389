use anyhow::{Context, Result};
use zoop_cli::{build_command, format_summary, invocation_from_matches};
use zoop_core::{generate_all, init_tracing};

fn main() -> Result<()> {
    let matches = build_command().get_matches();
    let invocation = invocation_from_matches(&matches)?;

    init_tracing(invocation.debug);

    let summary = generate_all(
        &invocation.source_dir,
        &invocation.output_dir,
        &invocation.config,
    )
    .with_context(|| {
        format!(
            "Code generation failed for {}",
            invocation.source_dir.display()
        )
    })?;

    println!("{}", format_summary(&summary));
    Ok(())
}
