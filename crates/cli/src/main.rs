use anyhow::Context;
use clap::{Parser, Subcommand};

use bookstore_app::{app, Application};
use bookstore_kernel::settings::{DatabaseSettings, Settings};

#[derive(Parser)]
#[command(name = "bookstore", version, about = "Book catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Listen on this port instead of the configured one
        #[arg(long)]
        port: Option<u16>,
        /// Use a throwaway in-memory database
        #[arg(long)]
        ephemeral: bool,
    },
    /// Apply pending schema migrations and exit
    Migrate,
    /// Print the effective configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load bookstore settings")?;

    match cli.command {
        Command::Serve { port, ephemeral } => {
            bookstore_telemetry::init(&settings.telemetry)?;
            if let Some(port) = port {
                settings.server.port = port;
            }
            if ephemeral {
                settings.database = DatabaseSettings::in_memory();
            }

            Application::build(settings).await?.run().await
        }
        Command::Migrate => {
            bookstore_telemetry::init(&settings.telemetry)?;
            let applied = app::migrate_database(&settings).await?;
            tracing::info!(applied, db = %settings.database.url, "migrations complete");
            println!("applied {} migration(s)", applied);
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{}", rendered);
            Ok(())
        }
    }
}
