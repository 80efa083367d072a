use std::io;
use std::path::PathBuf;
use std::process;

use aichat::commands::chat::{self, ChatArgs};
use aichat::commands::config::{self, ConfigArgs};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, shells};
use tracing::debug;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    "\ncommit: ",
    env!("AICHAT_GIT_SHA"),
    "\nbuilt: ",
    env!("AICHAT_BUILD_TS"),
);

const ROOT_HELP_EXAMPLES: &str = "Examples:\n  aichat\n  CHAT_PROVIDER=ollama OLLAMA_MODEL=llama3.2 aichat\n  aichat --provider anthropic --model claude-3-5-haiku-latest\n  aichat config check --profile work\n  aichat --provider ollama config check\n  aichat completion bash > ~/.local/share/bash-completion/completions/aichat\n\nVariables from a .env file in the working directory are loaded first.\nIn the chat: /clear, /provider, /help, exit";

#[derive(Debug, Parser)]
#[command(
    name = "aichat",
    about = "Terminal chat with Groq, OpenAI, Anthropic or a local Ollama model",
    version = VERSION,
    after_help = ROOT_HELP_EXAMPLES
)]
struct Cli {
    #[command(flatten)]
    chat: ChatArgs,
    #[arg(long, global = true, help = "Log provider requests to stderr")]
    verbose: bool,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Inspect local config")]
    Config(ConfigArgs),
    #[command(about = "Generate shell completion script")]
    Completion {
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

fn print_completion(shell: CompletionShell) {
    let mut cmd = Cli::command();
    match shell {
        CompletionShell::Bash => generate(shells::Bash, &mut cmd, "aichat", &mut io::stdout()),
        CompletionShell::Zsh => generate(shells::Zsh, &mut cmd, "aichat", &mut io::stdout()),
        CompletionShell::Fish => generate(shells::Fish, &mut cmd, "aichat", &mut io::stdout()),
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "aichat=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("AICHAT_LOG").unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Loads `.env` from the working directory or one of its parents. Variables
/// already set in the environment are kept.
fn load_dotenv() -> Result<Option<PathBuf>, dotenvy::Error> {
    match dotenvy::dotenv() {
        Ok(path) => Ok(Some(path)),
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(err),
    }
}

fn main() {
    let dotenv = load_dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match dotenv {
        Ok(Some(path)) => debug!(path = %path.display(), "loaded .env"),
        Ok(None) => {}
        Err(err) => {
            eprintln!("Failed to load .env: {err}");
            process::exit(1);
        }
    }

    let result = match cli.command {
        None => chat::run(cli.chat),
        Some(Commands::Config(args)) => config::run(args, cli.chat.overrides()),
        Some(Commands::Completion { shell }) => {
            print_completion(shell);
            Ok(())
        }
    };

    if let Err(err) = result {
        eprintln!("{err}");
        process::exit(1);
    }
}
