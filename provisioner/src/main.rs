use clap::{Parser, Subcommand};
use provisioner::{ProvisionConfig, Provisioner};
use runtime::{CliEngine, ContainerEngine};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "faraday-up")]
#[command(about = "Provision a local Faraday deployment on Docker or Podman")]
struct Cli {
    /// TOML file overriding the default topology
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tear down any previous installation and provision the three containers
    Install,
    /// Remove the containers, the network, and the config directory
    Uninstall,
    /// Check the installation and print the summary without changing anything
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ProvisionConfig::from_toml_file(path)?,
        None => ProvisionConfig::default(),
    };

    // Fatal: nothing can be provisioned without a runtime
    let engine = CliEngine::detect()?;
    let runtime_cmd = engine.kind().command();
    info!(runtime = runtime_cmd, "using container runtime");

    let provisioner = Provisioner::new(engine, config)?;

    match cli.command.unwrap_or(Commands::Install) {
        Commands::Install => {
            let report = provisioner.run_install().await?;
            report.print_summary(provisioner.config(), runtime_cmd);
            // Warnings alone exit 0; a failed verification is reported in the
            // exit code after the summary has been printed.
            if !report.verified {
                std::process::exit(1);
            }
        }
        Commands::Uninstall => {
            let report = provisioner.run_uninstall().await?;
            for warning in &report.warnings {
                println!("[{}] {}", warning.stage, warning.message);
            }
            println!("Uninstall complete.");
        }
        Commands::Status => {
            let report = provisioner.run_status().await?;
            report.print_summary(provisioner.config(), runtime_cmd);
            if !report.verified {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
