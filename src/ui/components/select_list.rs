use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::ui::theme::Theme;

pub struct ListItem {
    pub label: String,
    /// Right-hand annotation, e.g. a topic's best score.
    pub badge: Option<String>,
}

/// Bordered, titled list with a highlighted row. Used for both the subject
/// grid and the topic list.
pub struct SelectList<'a> {
    pub title: String,
    pub subtitle: Option<String>,
    pub items: Vec<ListItem>,
    pub selected: usize,
    pub empty_text: &'a str,
    pub theme: &'a Theme,
}

impl<'a> SelectList<'a> {
    pub fn new(title: &str, items: Vec<ListItem>, selected: usize, theme: &'a Theme) -> Self {
        Self {
            title: title.to_string(),
            subtitle: None,
            items,
            selected,
            empty_text: "Nothing to select.",
            theme,
        }
    }

    pub fn subtitle(mut self, subtitle: Option<String>) -> Self {
        self.subtitle = subtitle;
        self
    }

    pub fn empty_text(mut self, text: &'a str) -> Self {
        self.empty_text = text;
        self
    }
}

impl Widget for SelectList<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(colors.border()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(2), Constraint::Min(0)])
            .split(inner);

        if let Some(subtitle) = &self.subtitle {
            Paragraph::new(Line::from(Span::styled(
                subtitle.as_str(),
                Style::default().fg(colors.muted()),
            )))
            .alignment(Alignment::Center)
            .render(layout[0], buf);
        }

        if self.items.is_empty() {
            Paragraph::new(Line::from(Span::styled(
                self.empty_text,
                Style::default().fg(colors.warning()),
            )))
            .alignment(Alignment::Center)
            .render(layout[1], buf);
            return;
        }

        // Scroll so the highlighted row stays visible.
        let visible = layout[1].height as usize;
        let first = if visible == 0 {
            0
        } else {
            self.selected.saturating_sub(visible.saturating_sub(1))
        };

        let width = layout[1].width as usize;
        let lines: Vec<Line> = self
            .items
            .iter()
            .enumerate()
            .skip(first)
            .take(visible)
            .map(|(i, item)| {
                let is_selected = i == self.selected;
                let indicator = if is_selected { ">" } else { " " };
                let label = format!(" {indicator} {}", item.label);
                let badge = item.badge.clone().unwrap_or_default();
                let pad = width.saturating_sub(label.chars().count() + badge.chars().count() + 1);

                let label_style = Style::default()
                    .fg(if is_selected {
                        colors.accent()
                    } else {
                        colors.fg()
                    })
                    .add_modifier(if is_selected {
                        Modifier::BOLD
                    } else {
                        Modifier::empty()
                    });
                Line::from(vec![
                    Span::styled(label, label_style),
                    Span::raw(" ".repeat(pad)),
                    Span::styled(badge, Style::default().fg(colors.muted())),
                ])
            })
            .collect();

        Paragraph::new(lines).render(layout[1], buf);
    }
}
