use anyhow::Context;
use clap::{Parser, Subcommand};

use bookshelf::app::Application;
use bookshelf_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "bookshelf-cli", version, about = "Bookshelf service and database tooling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Drop every table and recreate the schema
    Reset {
        /// Confirm that all stored books may be destroyed
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Reset { yes: false }) = cli.command {
        anyhow::bail!("refusing to drop all data without --yes");
    }

    let settings = Settings::load().with_context(|| "failed to load Bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => bookshelf::app::run(settings).await,
        Command::Migrate => {
            // Assembly applies pending migrations.
            Application::assemble(&settings).await?;
            tracing::info!(db = %settings.database.path, "database migrated");
            Ok(())
        }
        Command::Reset { .. } => {
            let app = Application::assemble(&settings).await?;
            app.reset().await?;
            tracing::warn!(db = %settings.database.path, "database reset");
            Ok(())
        }
    }
}
