use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph, Widget, Wrap};

use crate::app::Feedback;
use crate::quiz::session::QuizSession;
use crate::ui::theme::Theme;

/// The active question, its numbered options and the feedback line. Once the
/// answer is locked in, the correct option is marked and a wrong pick is
/// flagged.
pub struct QuestionCard<'a> {
    pub session: &'a QuizSession,
    pub highlighted: usize,
    pub feedback: Option<&'a Feedback>,
    pub theme: &'a Theme,
}

impl<'a> QuestionCard<'a> {
    pub fn new(
        session: &'a QuizSession,
        highlighted: usize,
        feedback: Option<&'a Feedback>,
        theme: &'a Theme,
    ) -> Self {
        Self {
            session,
            highlighted,
            feedback,
            theme,
        }
    }
}

impl Widget for QuestionCard<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let colors = &self.theme.colors;
        let Some(question) = self.session.current_question() else {
            return;
        };

        let title = format!(
            " Question {} of {} ",
            self.session.index() + 1,
            self.session.total()
        );
        let block = Block::bordered()
            .title(title)
            .border_style(Style::default().fg(colors.accent()))
            .style(Style::default().bg(colors.bg()));
        let inner = block.inner(area);
        block.render(area, buf);

        let options = self.session.current_options();
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(options.len() as u16 + 1),
                Constraint::Length(2),
            ])
            .split(inner);

        Paragraph::new(Line::from(Span::styled(
            question.text.as_str(),
            Style::default().fg(colors.fg()).add_modifier(Modifier::BOLD),
        )))
        .wrap(Wrap { trim: true })
        .render(layout[0], buf);

        let verification = self.session.verification();
        let lines: Vec<Line> = options
            .iter()
            .enumerate()
            .map(|(i, option)| {
                let is_highlighted = i == self.highlighted;
                let (marker, style) = match verification {
                    Some(v) if *option == v.correct_answer => (
                        "✓",
                        Style::default()
                            .fg(colors.correct())
                            .add_modifier(Modifier::BOLD),
                    ),
                    Some(v) if *option == v.selected => {
                        ("✗", Style::default().fg(colors.incorrect()))
                    }
                    Some(_) => (" ", Style::default().fg(colors.muted())),
                    None if is_highlighted => (
                        ">",
                        Style::default()
                            .fg(colors.highlight())
                            .add_modifier(Modifier::BOLD),
                    ),
                    None => (" ", Style::default().fg(colors.fg())),
                };
                Line::from(Span::styled(
                    format!(" {marker} {}. {option}", i + 1),
                    style,
                ))
            })
            .collect();
        Paragraph::new(lines).render(layout[1], buf);

        if let Some(feedback) = self.feedback {
            let color = match feedback {
                Feedback::Correct => colors.correct(),
                Feedback::Incorrect { .. } | Feedback::TimeUp => colors.incorrect(),
                Feedback::Skipped => colors.warning(),
            };
            Paragraph::new(Line::from(Span::styled(
                format!(" {}", feedback.message()),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            )))
            .wrap(Wrap { trim: true })
            .render(layout[2], buf);
        }
    }
}
