mod args;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use args::{Cli, Command, CONFIG_ENV, USAGE};
use vocalprep_tools::{collect, manifest, segment, stats, PathRegistry};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = args::parse(std::env::args().skip(1), std::env::var(CONFIG_ENV).ok())?;
    run(cli)
}

fn run(cli: Cli) -> Result<()> {
    if cli.command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let registry = PathRegistry::from_file(&cli.config)?;
    info!("Loaded registry from {}", cli.config.display());

    match cli.command {
        Command::Collect { dataset, target } => {
            let source = registry.dataset_root(&dataset)?;
            let target = target.unwrap_or_else(|| registry.output_dir(&dataset).join("collection"));
            let report = collect::collect_wavs(source, &target)?;
            info!(
                "Copying process finished: {} copied, {} skipped",
                report.copied, report.skipped_non_wav
            );
        }
        Command::Slice(options) => {
            segment::slice_singer(&registry, &options)?;
        }
        Command::Manifest { dataset, rule } => {
            manifest::write_manifests(&registry, &dataset, &rule)?;
        }
        Command::Stats { dataset } => {
            stats::write_statistics(&registry, &dataset)?;
        }
        Command::Help => {}
    }

    Ok(())
}
