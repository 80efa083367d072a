use std::io::{self, BufRead, Write};

use clap::Args;
use tracing::debug;

use crate::client::ChatClient;
use crate::config::{ChatSettings, Overrides};
use crate::llm::provider::{ProviderId, api_key_env};
use crate::ui::Console;

#[derive(Debug, Args, Clone, Default)]
pub struct ChatArgs {
    #[arg(long, help = "Provider: groq, openai, anthropic, ollama (default: $CHAT_PROVIDER or groq)")]
    pub provider: Option<String>,
    #[arg(long, help = "Model id (default: $<PROVIDER>_MODEL or the provider's built-in model)")]
    pub model: Option<String>,
    #[arg(long, help = "Profile name from the config file")]
    pub profile: Option<String>,
}

impl ChatArgs {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            provider: self.provider.clone(),
            model: self.model.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// One line of REPL input, classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input<'a> {
    Exit,
    Clear,
    Help,
    Provider,
    Say(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        let text = line.trim();
        match text.to_lowercase().as_str() {
            "" | "exit" | "quit" | "bye" => Self::Exit,
            "/clear" => Self::Clear,
            "/help" => Self::Help,
            "/provider" => Self::Provider,
            _ => Self::Say(text),
        }
    }
}

pub fn run(args: ChatArgs) -> anyhow::Result<()> {
    let settings = ChatSettings::resolve(&args.overrides())?;
    let mut console = Console::stdout();
    console.welcome(settings.provider)?;

    let mut client = ChatClient::new(&settings)?;
    debug!(provider = %client.provider(), model = client.model(), "chat session started");
    console.help()?;

    let stdin = io::stdin();
    run_loop(&mut client, stdin.lock(), &mut console)?;
    Ok(())
}

/// Reads lines until an exit word, an empty line, or end of input.
///
/// A failed send is shown and the loop keeps going.
pub fn run_loop<R: BufRead, W: Write>(
    client: &mut ChatClient,
    input: R,
    console: &mut Console<W>,
) -> io::Result<()> {
    let mut lines = input.lines();

    loop {
        console.prompt()?;
        let Some(line) = lines.next().transpose()? else {
            return console.goodbye();
        };

        match Input::parse(&line) {
            Input::Exit => return console.goodbye(),
            Input::Clear => {
                client.clear_history();
                console.cleared()?;
            }
            Input::Help => console.help()?,
            Input::Provider => console.provider_info(client.provider(), client.model())?,
            Input::Say(text) => {
                console.thinking()?;
                match client.send(text) {
                    Ok(reply) => console.reply(&reply)?,
                    Err(err) => {
                        let hint = failure_hint(err.provider);
                        console.error(&err.to_string(), Some(hint.as_str()))?;
                    }
                }
            }
        }
    }
}

fn failure_hint(provider: ProviderId) -> String {
    match api_key_env(provider) {
        Some(key_env) => format!("Check that {key_env} is set and valid."),
        None => "Check that Ollama is running on localhost:11434 (ollama serve).".to_string(),
    }
}
