//! meetwise CLI: the main entry point.
//!
//! Commands:
//! - `onboard`  Write the default config file
//! - `ask`      Run one turn through the pipeline
//! - `memory`   Inspect a session's stored history
//! - `config`   Show or validate the effective configuration

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "meetwise",
    about = "meetwise: history-aware meeting assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "MEETWISE_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration
    Onboard,

    /// Ask the assistant something (one turn)
    Ask {
        /// The user message
        #[arg(short, long)]
        message: String,

        /// Session whose history is read and extended
        #[arg(short, long, default_value = "default")]
        session: String,

        /// Meeting fixture file (JSON) used as the integration source
        #[arg(long)]
        meeting: Option<std::path::PathBuf>,

        /// Meeting to use from the fixture, by id
        #[arg(long)]
        select: Option<String>,

        /// Extra context for the tool (e.g. notes about the client)
        #[arg(long)]
        context: Option<String>,

        /// Print the stage table and terminal status after the response
        #[arg(long)]
        report: bool,
    },

    /// Inspect stored memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum MemoryAction {
    /// List a session's records, oldest first
    List {
        #[arg(short, long, default_value = "default")]
        session: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration (secrets redacted)
    Show,
    /// Load and validate the configuration
    Validate,
    /// Print the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Ask {
            message,
            session,
            meeting,
            select,
            context,
            report,
        } => {
            let args = commands::ask::AskArgs {
                message,
                session,
                meeting,
                select,
                context,
                report,
            };
            commands::ask::run(args).await?
        }
        Commands::Memory { action } => match action {
            MemoryAction::List { session } => commands::memory::list(&session).await?,
        },
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show().await?,
            ConfigAction::Validate => commands::config_cmd::validate().await?,
            ConfigAction::Path => commands::config_cmd::path().await?,
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        let command = Cli::command();
        command.clone().debug_assert();
        let about = command.get_about().map(|a| a.to_string()).unwrap_or_default();
        assert_eq!(about, "meetwise: history-aware meeting assistant");
    }

    #[test]
    fn ask_parses_selection_and_report() {
        let cli = Cli::try_parse_from([
            "meetwise", "ask", "-m", "prep me", "--select", "m2", "--report",
        ])
        .unwrap();
        match cli.command {
            Commands::Ask { message, select, report, session, .. } => {
                assert_eq!(message, "prep me");
                assert_eq!(select.as_deref(), Some("m2"));
                assert!(report);
                assert_eq!(session, "default");
            }
            _ => panic!("expected ask"),
        }
    }
}
