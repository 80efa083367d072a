//! Terminal rendering for the chat loop.

use std::io::{self, IsTerminal, Write};

use owo_colors::{OwoColorize, Style};

use crate::llm::provider::ProviderId;

mod markdown;

use markdown::Line;

const HELP_LINES: [&str; 5] = [
    "Commands:",
    "  /clear     Clear chat history",
    "  /provider  Show AI provider and model",
    "  /help      Show this help",
    "  exit       Quit (also quit, bye, or an empty line)",
];

/// Output surface handed to the chat loop. Colors are optional so tests and
/// pipes get plain text.
#[derive(Debug)]
pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl Console<io::Stdout> {
    /// Colors only when stdout is a terminal and `NO_COLOR` is unset.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_terminal() && std::env::var_os("NO_COLOR").is_none();
        Self { out, color }
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    pub fn welcome(&mut self, provider: ProviderId) -> io::Result<()> {
        let title = format!("{} Active", provider.as_str().to_uppercase());
        let lines = [
            "AIChat CLI - Fast Multi-Provider Chatbot",
            "",
            "Type /help for commands, exit to quit.",
        ]
        .map(Line::plain);
        self.panel(&title, &lines, Style::new().cyan())?;
        writeln!(self.out)
    }

    pub fn help(&mut self) -> io::Result<()> {
        let lines = HELP_LINES.map(Line::plain);
        self.panel("Help", &lines, Style::new().yellow())?;
        writeln!(self.out)
    }

    pub fn prompt(&mut self) -> io::Result<()> {
        let label = self.paint("You: ", Style::new().green().bold());
        write!(self.out, "{label}")?;
        self.out.flush()
    }

    pub fn thinking(&mut self) -> io::Result<()> {
        let line = self.paint("AI thinking...", Style::new().dimmed());
        writeln!(self.out, "{line}")
    }

    /// Renders the reply as Markdown inside the "AI" panel.
    pub fn reply(&mut self, text: &str) -> io::Result<()> {
        let lines = markdown::render(text);
        self.panel("AI", &lines, Style::new().blue())?;
        writeln!(self.out)
    }

    pub fn cleared(&mut self) -> io::Result<()> {
        let line = self.paint("Chat cleared!", Style::new().yellow().bold());
        writeln!(self.out, "{line}")
    }

    pub fn provider_info(&mut self, provider: ProviderId, model: &str) -> io::Result<()> {
        let line = self.paint(&format!("Provider: {provider}"), Style::new().cyan().bold());
        writeln!(self.out, "{line} (model: {model})")
    }

    pub fn error(&mut self, message: &str, hint: Option<&str>) -> io::Result<()> {
        let line = self.paint(&format!("Error: {message}"), Style::new().red().bold());
        writeln!(self.out, "{line}")?;
        if let Some(hint) = hint {
            let hint = self.paint(hint, Style::new().yellow());
            writeln!(self.out, "{hint}")?;
        }
        Ok(())
    }

    pub fn goodbye(&mut self) -> io::Result<()> {
        let line = self.paint("Goodbye!", Style::new().green().bold());
        writeln!(self.out, "{line}")
    }

    fn paint(&self, text: &str, style: Style) -> String {
        if self.color {
            text.style(style).to_string()
        } else {
            text.to_string()
        }
    }

    fn panel(&mut self, title: &str, lines: &[Line], border: Style) -> io::Result<()> {
        let inner = lines
            .iter()
            .map(Line::width)
            .max()
            .unwrap_or(0)
            .max(title.chars().count() + 2);

        let top = self.paint(
            &format!("╭─ {title} {}╮", "─".repeat(inner - title.chars().count() - 1)),
            border,
        );
        let bottom = self.paint(&format!("╰{}╯", "─".repeat(inner + 2)), border);
        let side = self.paint("│", border);

        writeln!(self.out, "{top}")?;
        for line in lines {
            let text: String = line
                .spans
                .iter()
                .map(|span| match span.style {
                    Some(style) => self.paint(&span.text, style),
                    None => span.text.clone(),
                })
                .collect();
            let pad = " ".repeat(inner - line.width());
            writeln!(self.out, "{side} {text}{pad} {side}")?;
        }
        writeln!(self.out, "{bottom}")
    }
}
