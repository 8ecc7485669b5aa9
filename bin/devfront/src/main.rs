mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "devfront")]
#[command(about = "Drive devtools highlighter actors over the remote debugging protocol", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Debugger endpoint (overrides config client.endpoint)
    #[arg(long, global = true)]
    endpoint: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show configuration and effective runtime flags
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Start the node picker on a highlighter
    Pick {
        /// Highlighter actor id
        #[arg(long)]
        highlighter: String,

        /// Traits of the highlighter as JSON, e.g. '{"pickAndFocus":true}'
        #[arg(long)]
        traits: Option<String>,

        /// Focus the picked node when the highlighter supports it
        #[arg(long)]
        focus: bool,
    },

    /// Stop a running node picker
    CancelPick {
        /// Highlighter actor id
        #[arg(long)]
        highlighter: String,
    },

    /// Highlight a node, hold, then unhighlight
    Highlight {
        /// Highlighter actor id
        #[arg(long)]
        highlighter: String,

        /// Node actor id
        #[arg(long)]
        node: String,

        /// Box model region (content, padding, border, margin)
        #[arg(long)]
        region: Option<String>,

        /// How long to keep the highlight up
        #[arg(long, default_value_t = 2000)]
        hold_ms: u64,

        /// Hide even in testing mode
        #[arg(long)]
        force: bool,
    },

    /// Hide the box model highlighter
    Hide {
        /// Highlighter actor id
        #[arg(long)]
        highlighter: String,
    },

    /// Drive a custom highlighter
    Custom {
        #[command(subcommand)]
        command: CustomCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
enum CustomCommands {
    /// Show the highlighter on a node
    Show {
        /// Custom highlighter actor id
        #[arg(long)]
        actor: String,

        /// Node actor id
        #[arg(long)]
        node: String,

        /// Options as JSON, forwarded untouched
        #[arg(long)]
        options: Option<String>,
    },
    /// Hide the highlighter
    Hide {
        /// Custom highlighter actor id
        #[arg(long)]
        actor: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let endpoint = cli.endpoint;
    match cli.command {
        Commands::Status => {
            commands::status::run().await?;
        }
        Commands::Config { command } => match command {
            ConfigCommands::Show => {
                commands::config_cmd::show().await?;
            }
            ConfigCommands::Init { force } => {
                commands::config_cmd::init(force).await?;
            }
        },
        Commands::Pick {
            highlighter,
            traits,
            focus,
        } => {
            commands::highlighter::pick(endpoint, &highlighter, traits.as_deref(), focus).await?;
        }
        Commands::CancelPick { highlighter } => {
            commands::highlighter::cancel_pick(endpoint, &highlighter).await?;
        }
        Commands::Highlight {
            highlighter,
            node,
            region,
            hold_ms,
            force,
        } => {
            commands::highlighter::highlight(endpoint, &highlighter, &node, region, hold_ms, force).await?;
        }
        Commands::Hide { highlighter } => {
            commands::highlighter::hide(endpoint, &highlighter).await?;
        }
        Commands::Custom { command } => match command {
            CustomCommands::Show { actor, node, options } => {
                commands::custom::show(endpoint, &actor, &node, options.as_deref()).await?;
            }
            CustomCommands::Hide { actor } => {
                commands::custom::hide(endpoint, &actor).await?;
            }
        },
    }

    Ok(())
}
