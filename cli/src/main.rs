//! Interactome CLI: build human interactome embeddings for a BioGRID release
//!
//! Configuration comes from `INTERACTOME_*` environment variables; see
//! [`interactome::config`].

use anyhow::Context;
use clap::Parser;
use interactome::{CommandTrainer, Pipeline, PipelineConfig};
use tracing::level_filters::LevelFilter;
use tracing::Level;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "interactome-cli",
    version,
    about = "Embed the human BioGRID interactome with node2vec"
)]
struct Cli {
    /// Increase logging (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Retrain even if embeddings for the release are stored
    #[arg(short, long)]
    force: bool,
}

impl Cli {
    fn level(&self) -> Level {
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(cli.level()).into())
        .from_env_lossy();
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    if let Err(e) = run(&cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = PipelineConfig::from_env().context("invalid configuration")?;
    let trainer = CommandTrainer::new(
        config.trainer_program.clone(),
        config.trainer_dir(),
    )
    .with_args(config.trainer_args.clone());

    let pipeline = Pipeline::new(config, trainer)?;
    let summary = pipeline.run(cli.force).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["interactome-cli"]).unwrap();
        assert!(!cli.force);
        assert_eq!(cli.level(), Level::WARN);
    }

    #[test]
    fn test_flags() {
        let cli = Cli::try_parse_from(["interactome-cli", "-vv", "--force"]).unwrap();
        assert!(cli.force);
        assert_eq!(cli.level(), Level::DEBUG);

        let cli = Cli::try_parse_from(["interactome-cli", "-v", "-f"]).unwrap();
        assert!(cli.force);
        assert_eq!(cli.level(), Level::INFO);
    }

    #[test]
    fn test_rejects_positional_arguments() {
        assert!(Cli::try_parse_from(["interactome-cli", "4.4.229"]).is_err());
    }
}
