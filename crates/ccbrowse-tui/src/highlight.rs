//! Markdown-ish text to styled lines, with syntect for fenced code

use ratatui::{
    style::{Color, Style},
    text::{Line, Span},
};
use syntect::easy::HighlightLines;
use syntect::highlighting::{Theme, ThemeSet};
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const THEME_NAME: &str = "base16-ocean.dark";

/// Syntax highlighting resources, loaded once per session
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    pub fn new() -> Self {
        let mut themes = ThemeSet::load_defaults().themes;
        let theme = themes.remove(THEME_NAME).unwrap_or_default();
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    /// Split text into lines, highlighting ```lang fenced blocks
    ///
    /// An unclosed fence highlights through the end of the text.
    pub fn text_lines(&self, content: &str) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        let mut fence: Option<String> = None;
        let mut code = Vec::new();

        for line in content.lines() {
            let trimmed = line.trim_start();
            if let Some(rest) = trimmed.strip_prefix("```") {
                match fence.take() {
                    Some(lang) => {
                        lines.extend(self.highlight_code(&code.join("\n"), &lang));
                        code.clear();
                    }
                    None => fence = Some(rest.trim().to_string()),
                }
            } else if fence.is_some() {
                code.push(line);
            } else {
                lines.push(Line::from(line.to_string()));
            }
        }

        if let Some(lang) = fence {
            if !code.is_empty() {
                lines.extend(self.highlight_code(&code.join("\n"), &lang));
            }
        }

        lines
    }

    fn highlight_code(&self, code: &str, lang: &str) -> Vec<Line<'static>> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .or_else(|| self.syntax_set.find_syntax_by_extension(lang))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());
        let mut highlighter = HighlightLines::new(syntax, &self.theme);

        LinesWithEndings::from(code)
            .map(|line| {
                let spans: Vec<Span<'static>> = match highlighter.highlight_line(line, &self.syntax_set) {
                    Ok(ranges) => ranges
                        .into_iter()
                        .map(|(style, text)| {
                            Span::styled(
                                text.trim_end_matches('\n').to_string(),
                                Style::default().fg(to_color(style.foreground)),
                            )
                        })
                        .collect(),
                    Err(_) => vec![Span::raw(line.trim_end_matches('\n').to_string())],
                };
                Line::from(spans)
            })
            .collect()
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn to_color(color: syntect::highlighting::Color) -> Color {
    Color::Rgb(color.r, color.g, color.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_plain_text_passes_through() {
        let hl = Highlighter::new();
        let lines = hl.text_lines("one\ntwo");
        assert_eq!(lines.len(), 2);
        assert_eq!(plain(&lines[1]), "two");
    }

    #[test]
    fn test_fenced_block_is_highlighted() {
        let hl = Highlighter::new();
        let lines = hl.text_lines("before\n```rust\nfn main() {}\n```\nafter");
        let rendered: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(rendered, vec!["before", "fn main() {}", "after"]);
        assert!(lines[1].spans.iter().any(|s| s.style.fg.is_some()));
    }

    #[test]
    fn test_unclosed_fence_and_unknown_language() {
        let hl = Highlighter::new();
        let lines = hl.text_lines("```nosuchlang\nx = 1\ny = 2");
        let rendered: Vec<String> = lines.iter().map(plain).collect();
        assert_eq!(rendered, vec!["x = 1", "y = 2"]);
    }
}
