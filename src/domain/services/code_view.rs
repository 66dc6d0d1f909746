#[cfg(test)]
#[path = "code_view_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Backend;
use ratatui::prelude::Rect;
use ratatui::style::Style;
use ratatui::text::Line;
use ratatui::text::Span;
use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use syntect::highlighting::HighlightIterator;
use syntect::highlighting::HighlightState;
use syntect::highlighting::Highlighter;
use syntect::highlighting::Theme;
use syntect::parsing::ParseState;
use syntect::parsing::ScopeStack;

use super::Syntaxes;
use super::SYNTAX_SET;

/// Read-only, syntax highlighted view of the code buffer.
///
/// Highlighting is incremental: as long as the buffer only grows, complete
/// lines are highlighted once and the trailing partial line is shown plain
/// until its newline arrives. Any other change starts over.
pub struct CodeView {
    theme: Theme,
    language: String,
    parse_state: ParseState,
    highlight_state: HighlightState,
    consumed: String,
    lines: Vec<Line<'static>>,
    tail: String,
}

impl CodeView {
    pub fn new(theme: Theme, language: &str) -> CodeView {
        let parse_state = ParseState::new(Syntaxes::get(language));
        let highlight_state = HighlightState::new(&Highlighter::new(&theme), ScopeStack::new());

        return CodeView {
            theme,
            language: language.to_string(),
            parse_state,
            highlight_state,
            consumed: String::new(),
            lines: vec![],
            tail: String::new(),
        };
    }

    fn reset(&mut self) {
        self.parse_state = ParseState::new(Syntaxes::get(&self.language));
        self.highlight_state =
            HighlightState::new(&Highlighter::new(&self.theme), ScopeStack::new());
        self.consumed.clear();
        self.lines.clear();
        self.tail.clear();
    }

    fn highlight_line(&mut self, line: &str) -> Result<Line<'static>> {
        let highlighter = Highlighter::new(&self.theme);
        let ops = self.parse_state.parse_line(line, &SYNTAX_SET)?;

        let spans = HighlightIterator::new(&mut self.highlight_state, &ops, line, &highlighter)
            .map(|(style, text)| {
                return Span::styled(
                    text.trim_end_matches(['\n', '\r']).replace('\t', "  "),
                    Style {
                        fg: Syntaxes::translate_colour(style.foreground),
                        ..Style::default()
                    },
                );
            })
            .filter(|span| return !span.content.is_empty())
            .collect::<Vec<Span>>();

        return Ok(Line::from(spans));
    }

    /// Brings the view up to date with `code`.
    pub fn sync(&mut self, code: &str) -> Result<()> {
        if !code.starts_with(self.consumed.as_str()) {
            self.reset();
        }

        let pending = code[self.consumed.len()..].to_string();
        self.tail.clear();

        for line in pending.split_inclusive('\n') {
            if !line.ends_with('\n') {
                self.tail = line.replace('\t', "  ");
                break;
            }

            let highlighted = self.highlight_line(line)?;
            self.lines.push(highlighted);
            self.consumed.push_str(line);
        }

        return Ok(());
    }

    pub fn len(&self) -> usize {
        if self.tail.is_empty() {
            return self.lines.len();
        }

        return self.lines.len() + 1;
    }

    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Lines `start..start + count`, with the partial tail line last.
    pub fn window(&self, start: usize, count: usize) -> Vec<Line<'static>> {
        let mut res = self
            .lines
            .iter()
            .skip(start)
            .take(count)
            .cloned()
            .collect::<Vec<Line>>();

        if !self.tail.is_empty() && res.len() < count && start <= self.lines.len() {
            res.push(Line::from(self.tail.to_string()));
        }

        return res;
    }

    pub fn render<B: Backend>(&self, frame: &mut Frame<B>, rect: Rect, position: u16, title: &str) {
        let height = rect.height.saturating_sub(2) as usize;
        let lines = self.window(position as usize, height);

        frame.render_widget(
            Paragraph::new(lines).block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .title(title.to_string()),
            ),
            rect,
        );
    }
}
