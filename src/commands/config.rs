use clap::{Args, Subcommand};

use crate::config::{self, ChatSettings, Overrides};
use crate::llm::provider::api_key_env;

#[derive(Debug, Args, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Debug, Subcommand, Clone)]
enum ConfigSubcommand {
    /// Resolve provider, model and credential the way the chat would.
    Check {
        #[arg(long)]
        profile: Option<String>,
    },
}

/// `root` carries the `--provider`/`--model`/`--profile` flags given before the
/// subcommand. A `--profile` after `check` wins over the root one.
pub fn run(args: ConfigArgs, root: Overrides) -> anyhow::Result<()> {
    match args.command {
        ConfigSubcommand::Check { profile } => {
            let overrides = Overrides {
                profile: profile.or(root.profile),
                ..root
            };

            if let Some(name) = overrides.profile.as_deref() {
                let path = config::validate_config(Some(name))?;
                println!("config OK: {}", path.display());
            }

            let settings = ChatSettings::inspect(&overrides)?;
            for line in check_report(&settings) {
                println!("{line}");
            }
            Ok(())
        }
    }
}

fn check_report(settings: &ChatSettings) -> Vec<String> {
    let key_line = match (api_key_env(settings.provider), &settings.api_key) {
        (Some(key_env), Some(_)) => format!("{key_env}: set"),
        (Some(key_env), None) => format!("{key_env}: not set"),
        (None, _) => "api key: not needed (local model)".to_string(),
    };
    vec![
        format!("provider: {}", settings.provider),
        format!("model: {}", settings.model),
        key_line,
    ]
}
