use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use colored::*;
use pharmagpt_core::{
    sanitize, PharmaBackend, PharmaClient, Relevance, RequestOrchestrator, SearchStore,
    SessionStore,
};

#[derive(Parser)]
#[command(name = "pharmagpt")]
#[command(version, about = "Terminal client for the PharmaGPT medicine search and chat service")]
pub struct Cli {
    /// Base URL of the PharmaGPT service (overrides env and config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search medicines matching symptoms or a condition
    Search {
        /// Symptoms or condition, e.g. "headache and fever"
        text: String,
    },
    /// Ask PharmaGPT a single question
    Ask {
        /// Your question
        question: String,
    },
    /// Check that the service is reachable
    Ping,
}

pub async fn run(command: Commands, client: PharmaClient) -> Result<()> {
    match command {
        Commands::Search { text } => search(client, &text).await,
        Commands::Ask { question } => ask(client, &question).await,
        Commands::Ping => ping(&client).await,
    }
}

async fn search(client: PharmaClient, text: &str) -> Result<()> {
    let orchestrator = RequestOrchestrator::new(Arc::new(client));
    let mut store = SearchStore::new();

    println!("🔍 Searching for: {}", text.bold().cyan());
    orchestrator.submit_search(&mut store, text).await?;

    if let Some(message) = store.error_message() {
        return Err(anyhow!("{message}"));
    }

    if store.results().is_empty() {
        println!("{}", "No matching medicines found".red());
        return Ok(());
    }

    println!("\n{} medicines found:\n", store.results().len().to_string().bold().green());

    for (i, medicine) in store.results().iter().enumerate() {
        let relevance = Relevance::from_score(medicine.relevance_score);
        let badge = match relevance {
            Relevance::High => relevance.label().green(),
            Relevance::Medium => relevance.label().yellow(),
            Relevance::Low => relevance.label().dimmed(),
        };
        println!(
            "{}. {}  {}",
            (i + 1).to_string().bold().blue(),
            medicine.name.bold().yellow(),
            badge
        );
        println!("   {} {}", "Benefits:".bold(), medicine.benefits);
        println!("   {} {}", "Side Effects:".bold(), medicine.side_effects);
        println!("   {} {}\n", "Safety Advice:".bold(), medicine.safety_advice);
    }

    Ok(())
}

async fn ask(client: PharmaClient, question: &str) -> Result<()> {
    let orchestrator = RequestOrchestrator::new(Arc::new(client));
    let mut store = SessionStore::new();

    println!("{} {}", "You:".bold().cyan(), question);
    orchestrator.submit_chat(&mut store, question).await?;

    if let Some(message) = store.error_message() {
        return Err(anyhow!("{message}"));
    }

    if let Some(answer) = store.history().last() {
        println!("\n{}\n{}", "PharmaGPT:".bold().yellow(), sanitize(&answer.content));

        if !answer.sources.is_empty() {
            let labels: Vec<String> = answer
                .sources
                .iter()
                .enumerate()
                .map(|(i, source)| source.label(i))
                .collect();
            println!("\n{} {}", "Sources:".dimmed(), labels.join(", ").magenta());
        }
    }

    Ok(())
}

async fn ping(client: &PharmaClient) -> Result<()> {
    let message = client.welcome().await?;
    println!("{} {} {}", "✓".green().bold(), client.base_url().dimmed(), message);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_interactive() {
        let cli = Cli::parse_from(["pharmagpt", "--base-url", "http://pharma.local"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.base_url.as_deref(), Some("http://pharma.local"));
    }

    #[test]
    fn test_search_subcommand() {
        let cli = Cli::parse_from(["pharmagpt", "search", "dry cough"]);
        assert!(matches!(cli.command, Some(Commands::Search { text }) if text == "dry cough"));
    }

    async fn unreachable_client() -> PharmaClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);
        PharmaClient::new(&base_url)
    }

    #[tokio::test]
    async fn test_failed_ask_reports_the_session_error() {
        let client = unreachable_client().await;
        let mut store = SessionStore::new();
        RequestOrchestrator::new(Arc::new(client.clone()))
            .submit_chat(&mut store, "hello")
            .await
            .unwrap();
        let expected = store.error_message().unwrap().to_string();

        let err = ask(client, "hello").await.unwrap_err();
        assert_eq!(err.to_string(), expected);
    }

    #[tokio::test]
    async fn test_failed_search_exits_with_error() {
        let client = unreachable_client().await;
        let err = search(client, "fever").await.unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
