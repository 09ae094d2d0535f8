use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget};

use crate::quiz::result::{ResultSummary, format_clock};
use crate::ui::theme::Theme;

pub struct Results<'a> {
    pub result: &'a ResultSummary,
    pub best: Option<u8>,
    pub banner: Option<String>,
    pub theme: &'a Theme,
}

impl<'a> Results<'a> {
    pub fn new(result: &'a ResultSummary, best: Option<u8>, theme: &'a Theme) -> Self {
        Self {
            result,
            best,
            banner: None,
            theme,
        }
    }

    pub fn banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner;
        self
    }
}

impl Widget for Results<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;

        let block = Block::bordered()
            .title(" Quiz Complete ")
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(3),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(0),
                Constraint::Length(2),
            ])
            .split(inner);

        let title = Paragraph::new(Line::from(Span::styled(
            format!("{} / {}", self.result.subject, self.result.topic),
            Style::default().fg(colors.fg()),
        )))
        .alignment(Alignment::Center);
        title.render(layout[0], buf);

        let pct = self.result.accuracy_percent;
        let pct_color = if pct >= 80 {
            colors.correct()
        } else if pct >= 50 {
            colors.warning()
        } else {
            colors.incorrect()
        };
        Paragraph::new(Line::from(Span::styled(
            format!("{pct}%"),
            Style::default().fg(pct_color).add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center)
        .render(layout[1], buf);

        let label = |text: &'static str| Span::styled(text, Style::default().fg(colors.fg()));

        let score_text = format!("{} out of {}", self.result.score, self.result.total);
        Paragraph::new(Line::from(vec![
            label("  Score:      "),
            Span::styled(score_text, Style::default().fg(colors.accent())),
        ]))
        .render(layout[2], buf);

        let time_span = match self.result.elapsed_secs {
            Some(secs) if !self.result.timed_out => {
                Span::styled(format_clock(secs), Style::default().fg(colors.fg()))
            }
            _ => Span::styled(
                "Time Ran Out!",
                Style::default()
                    .fg(colors.incorrect())
                    .add_modifier(Modifier::BOLD),
            ),
        };
        Paragraph::new(Line::from(vec![label("  Time taken: "), time_span])).render(layout[3], buf);

        Paragraph::new(Line::from(vec![
            label("  Accuracy:   "),
            Span::styled(format!("{pct}%"), Style::default().fg(pct_color)),
        ]))
        .render(layout[4], buf);

        let best_text = match self.best {
            Some(best) => format!("{best}%"),
            None => "First attempt!".to_string(),
        };
        Paragraph::new(Line::from(vec![
            label("  Best score: "),
            Span::styled(best_text, Style::default().fg(colors.accent())),
        ]))
        .render(layout[5], buf);

        if let Some(banner) = self.banner {
            Paragraph::new(Line::from(Span::styled(
                banner,
                Style::default()
                    .fg(colors.incorrect())
                    .add_modifier(Modifier::BOLD),
            )))
            .alignment(Alignment::Center)
            .render(layout[6], buf);
        }

        Paragraph::new(Line::from(vec![
            Span::styled("  [r] Restart  ", Style::default().fg(colors.accent())),
            Span::styled("[Enter/n] New quiz  ", Style::default().fg(colors.accent())),
            Span::styled("[q] Quit", Style::default().fg(colors.accent())),
        ]))
        .render(layout[7], buf);
    }
}
