//! CLI argument definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "llmux")]
#[command(author, version, about = "One interface to many LLM completion APIs", long_about = None)]
pub struct Cli {
    /// Enable verbose logging and print response metadata
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Append JSON logs to this file
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one prompt and print the completion
    Complete(CompleteArgs),
    /// List the built-in providers
    Providers,
    /// Normalize a saved provider response without calling the network
    Normalize {
        /// Provider that produced the payload
        #[arg(short, long)]
        provider: String,
        /// JSON file holding the raw response body
        file: PathBuf,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        command: ConfigSubcommands,
    },
}

#[derive(Args, Debug, Default)]
pub struct CompleteArgs {
    /// Provider to use (openai, anthropic, gemini, groq, together, openrouter, fireworks, ollama)
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Model to use (e.g., gpt-4o, claude-sonnet-4-20250514)
    #[arg(short, long)]
    pub model: Option<String>,

    /// System prompt
    #[arg(short, long)]
    pub system: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[arg(short, long)]
    pub temperature: Option<f32>,

    /// Upper bound on generated tokens
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Print the provider's raw JSON instead of the content
    #[arg(long)]
    pub raw: bool,

    /// The prompt text
    #[arg(required = true, num_args = 1..)]
    pub prompt: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubcommands {
    /// Initialize a new config file
    Init,
    /// Print config file location
    Where,
    /// Print the effective configuration
    Show,
}
