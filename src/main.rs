use clap::Parser;
use form_autofill::cli::commands::{cmd_clear, cmd_detect, cmd_fill, cmd_load_and_fill, cmd_save, cmd_serve, cmd_show};
use form_autofill::cli::config::{Cli, Commands, load_config};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = load_config(cli.config.as_deref());

    let all_filled = match &cli.command {
        Commands::Detect { format } => {
            cmd_detect(&cli, &config, format)?;
            true
        }
        Commands::Save { data } => {
            cmd_save(&cli, &config, data.as_deref())?;
            true
        }
        Commands::Fill { data, format } => cmd_fill(&cli, &config, data, format)?,
        Commands::LoadAndFill { format } => cmd_load_and_fill(&cli, &config, format)?,
        Commands::Show { format } => {
            cmd_show(&cli, &config, format)?;
            true
        }
        Commands::Clear => {
            cmd_clear(&cli, &config)?;
            true
        }
        Commands::Serve => {
            cmd_serve(&cli, &config)?;
            true
        }
    };

    if !all_filled {
        std::process::exit(1);
    }
    Ok(())
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the `-v` count.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
