//! Command implementations for ohmybotctl.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::client::BotClient;

pub async fn say(client: &BotClient, text: &str, user: &str, name: Option<String>) -> Result<()> {
    let replies = client.send(text, user, name).await?;
    for reply in replies {
        println!("{} {}", "ohmybot:".cyan().bold(), reply);
    }
    Ok(())
}

pub async fn outbox(client: &BotClient, user: &str) -> Result<()> {
    let messages = client.outbox(user).await?;
    if messages.is_empty() {
        println!("{}", format!("Nothing queued for {}", user).dimmed());
        return Ok(());
    }
    for message in messages {
        println!("{} {}", "ohmybot:".cyan().bold(), message);
    }
    Ok(())
}

pub async fn health(client: &BotClient) -> Result<()> {
    let health = client.health().await?;
    println!("{} {}", "Status:".bold(), health.status.green());
    println!("{} {}", "Version:".bold(), health.version);
    println!("{} {}s", "Uptime:".bold(), health.uptime_seconds);
    println!("{} {}", "Feedback stored:".bold(), health.feedback_count);
    println!(
        "{} {}",
        "Pending clarifications:".bold(),
        health.pending_clarifications
    );
    Ok(())
}
