mod cli;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use avatar_chat::config::{Config, DEFAULT_LOG_LEVEL};
use cli::{Args, Command};

/// Install the fmt subscriber; it also receives records from the `log` facade.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Load configuration or explain what is missing and exit.
fn load_config(path: Option<&std::path::Path>) -> Config {
    match Config::load(path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            eprintln!("Set GROQ_API_KEY, TAVUS_API_KEY and TAVUS_REPLICA_ID in a .env file");
            eprintln!("or in the environment, for example:");
            eprintln!("    echo 'TAVUS_API_KEY=your-api-key-here' >> .env");
            std::process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();
    let config_path = args.config.as_deref();

    let result = match args.command {
        Command::Ask { message, turn } => {
            let config = load_config(config_path);
            init_logging(&config.log_level);
            cli::run_ask(&config, &message, &turn)
        }
        Command::Chat { turn } => {
            let config = load_config(config_path);
            init_logging(&config.log_level);
            cli::run_chat(&config, &turn)
        }
        Command::Config { action } => cli::handle_config_action(action, config_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
