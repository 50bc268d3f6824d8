use clap::Parser;
use policy_qa::cli::handle_ask;
use policy_qa::cli::handle_config_command;
use policy_qa::cli::handle_serve_api;
use policy_qa::cli::print_error;
use policy_qa::cli::Cli;
use policy_qa::cli::Commands;
use policy_qa::config::AppConfig;
use policy_qa::Result;
use tracing::info;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        tracing::error!(kind = e.kind(), "{}", e);
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // .env is optional; real environment variables take precedence
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    // Load configuration
    let config = match &cli.config {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::load()?,
    };

    // Initialize logging
    if cli.verbose {
        policy_qa::logging::init_logging_with_level("debug", &config.logging.log_dir)?;
    } else {
        policy_qa::logging::init_logging_with_config(&config)?;
    }
    info!("Configuration loaded successfully");

    // Execute the requested command
    match cli.command {
        Commands::Serve { host, port, cors } => {
            handle_serve_api(&config, host, port, cors).await?;
        }
        Commands::Ask {
            document,
            questions,
            json,
        } => {
            handle_ask(&config, document, questions, json).await?;
        }
        Commands::Config => {
            handle_config_command(&config).await?;
        }
    }

    Ok(())
}
