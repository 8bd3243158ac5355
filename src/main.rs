use std::process::ExitCode;

use clap::Parser;

use llmux::cli::{self, Cli};
use llmux::config::AppConfig;
use llmux::logging;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let _guard = logging::init(cli.verbose, cli.log_file.as_deref());

    let config = AppConfig::load();

    match cli::run(&cli, &config).await {
        Ok(output) => {
            if !output.is_empty() {
                println!("{output}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(hint) = e.hint() {
                eprintln!("hint: {hint}");
            }
            ExitCode::FAILURE
        }
    }
}
