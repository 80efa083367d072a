//! Markdown replies flattened into styled terminal lines.
//!
//! Source line breaks are kept as-is since panels are never re-wrapped.

use owo_colors::Style;
use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd};

const RULE_WIDTH: usize = 24;

/// A run of text sharing one style. `None` is printed as-is.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Span {
    pub text: String,
    pub style: Option<Style>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    pub fn plain(text: &str) -> Self {
        let mut line = Self::default();
        line.push(text, None);
        line
    }

    /// Visible width, ignoring styles.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|span| span.text.chars().count()).sum()
    }

    #[cfg(test)]
    pub fn text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }

    fn push(&mut self, text: &str, style: Option<Style>) {
        if !text.is_empty() {
            self.spans.push(Span {
                text: text.to_string(),
                style,
            });
        }
    }
}

pub(crate) fn render(text: &str) -> Vec<Line> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
    let mut renderer = Renderer::default();
    for event in Parser::new_ext(text, options) {
        renderer.event(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line>,
    current: Option<Line>,
    /// A blank line goes in before the next block.
    gap: bool,
    styles: Vec<Style>,
    /// One entry per open list: the next number, or `None` for bullets.
    lists: Vec<Option<u64>>,
    marker: Option<String>,
    quote_depth: usize,
    in_code_block: bool,
    links: Vec<Option<String>>,
}

impl Renderer {
    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) if self.in_code_block => self.code_block_text(&text),
            Event::Text(text) => self.text(&text, self.style()),
            Event::Code(code) => self.text(&code, Some(Style::new().yellow())),
            Event::Html(html) | Event::InlineHtml(html) => {
                for (index, part) in html.trim_end_matches('\n').split('\n').enumerate() {
                    if index > 0 {
                        self.flush();
                    }
                    self.text(part, None);
                }
            }
            Event::SoftBreak | Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.text(&"─".repeat(RULE_WIDTH), Some(Style::new().dimmed()));
                self.end_block();
            }
            Event::TaskListMarker(done) => self.text(if done { "[x] " } else { "[ ] " }, None),
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.push_style(|style| style.bold());
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.text(&lang, Some(Style::new().dimmed()));
                        self.flush();
                    }
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}. ");
                        *next += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.marker = Some(marker);
            }
            Tag::Emphasis => self.push_style(|style| style.italic()),
            Tag::Strong => self.push_style(|style| style.bold()),
            Tag::Strikethrough => self.push_style(|style| style.strikethrough()),
            Tag::Link {
                link_type,
                dest_url,
                ..
            } => {
                let shown = match link_type {
                    LinkType::Autolink | LinkType::Email => None,
                    _ if dest_url.is_empty() => None,
                    _ => Some(dest_url.to_string()),
                };
                self.links.push(shown);
                self.push_style(|style| style.underline());
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading { .. } => {
                self.styles.pop();
                self.end_block();
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.gap = true;
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.end_block();
            }
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.gap = true;
                }
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link => {
                self.styles.pop();
                if let Some(Some(url)) = self.links.pop() {
                    self.text(&format!(" ({url})"), Some(Style::new().dimmed()));
                }
            }
            _ => {}
        }
    }

    fn style(&self) -> Option<Style> {
        self.styles.last().copied()
    }

    fn push_style(&mut self, apply: impl FnOnce(Style) -> Style) {
        let base = self.style().unwrap_or_else(Style::new);
        self.styles.push(apply(base));
    }

    fn code_block_text(&mut self, text: &str) {
        for line in text.trim_end_matches('\n').split('\n') {
            self.flush();
            self.text(&format!("  {}", line.replace('\t', "    ")), Some(Style::new().yellow()));
            self.flush();
        }
    }

    fn text(&mut self, text: &str, style: Option<Style>) {
        let line = self.open_line();
        line.push(text, style);
    }

    fn open_line(&mut self) -> &mut Line {
        if self.current.is_none() {
            if self.gap && !self.lines.is_empty() {
                self.lines.push(Line::default());
            }
            self.gap = false;

            let mut line = Line::default();
            line.push(&"> ".repeat(self.quote_depth), Some(Style::new().dimmed()));
            if !self.lists.is_empty() {
                line.push(&"  ".repeat(self.lists.len() - 1), None);
                match self.marker.take() {
                    Some(marker) => line.push(&marker, None),
                    None => line.push("  ", None),
                }
            }
            self.current = Some(line);
        }
        self.current.get_or_insert_with(Line::default)
    }

    fn flush(&mut self) {
        if let Some(line) = self.current.take() {
            self.lines.push(line);
        }
    }

    fn end_block(&mut self) {
        self.flush();
        self.gap = true;
    }

    fn finish(mut self) -> Vec<Line> {
        self.flush();
        self.lines
    }
}
