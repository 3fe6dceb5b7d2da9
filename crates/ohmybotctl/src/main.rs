//! OhMyBot Control - CLI client for the OhMyBot daemon
//!
//! Lets you chat with a daemon running the console transport.

mod client;
mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "ohmybotctl")]
#[command(about = "OhMyBot - anonymous team feedback bot", long_about = None)]
#[command(version)]
struct Cli {
    /// Daemon base URL
    #[arg(long, env = "OHMYBOT_URL", default_value = client::DEFAULT_URL)]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message to the bot and print its reply
    Say {
        /// Message text, e.g. "standup ran long #meetings"
        text: String,

        /// User id to send as
        #[arg(long, default_value = "console-user")]
        user: String,

        /// Display name to send with the message
        #[arg(long)]
        name: Option<String>,
    },

    /// Print (and clear) messages the bot queued for a user
    Outbox {
        #[arg(long, default_value = "console-user")]
        user: String,
    },

    /// Show daemon health
    Health,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = client::BotClient::new(&cli.url)?;

    match cli.command {
        Commands::Say { text, user, name } => commands::say(&client, &text, &user, name).await,
        Commands::Outbox { user } => commands::outbox(&client, &user).await,
        Commands::Health => commands::health(&client).await,
    }
}
