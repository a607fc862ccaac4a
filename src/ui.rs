use chordtime::session::Phase;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;

pub const INSTRUCTIONS: &str = "Press the shown keys as quickly and accurately as possible";
pub const COMPLETE_MESSAGE: &str = "Experiment complete. Thank you!";

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);
        let prompt_style = Style::default().patch(bold_style).fg(Color::Cyan);

        let session = &self.session;
        let total = session.config().trial_count;

        let (header, (body, body_style), footer) = match session.phase() {
            Phase::Idle => (
                Line::from(Span::styled("Key Combination Reaction Experiment", bold_style)),
                (INSTRUCTIONS.to_string(), italic_style),
                "(enter) start / (esc)ape".to_string(),
            ),
            Phase::AwaitingKeys => (
                Line::from(Span::styled(INSTRUCTIONS, italic_style)),
                (
                    format!(
                        "Press the keys: {}",
                        session.target().map(|t| t.to_string()).unwrap_or_default()
                    ),
                    prompt_style,
                ),
                format!("trial {} / {}", session.trials_completed() + 1, total),
            ),
            Phase::Scoring { .. } => (
                Line::from(Span::styled(INSTRUCTIONS, italic_style)),
                (String::new(), dim_style),
                format!("trial {} / {}", session.trials_completed(), total),
            ),
            Phase::Complete { .. } | Phase::Finished => (
                Line::default(),
                (COMPLETE_MESSAGE.to_string(), bold_style),
                format!("results appended to {}", self.output.display()),
            ),
        };

        let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
        let body_lines = ((body.width() as f64 / max_chars_per_line as f64).ceil() as u16).max(1);
        let padding = area.height.saturating_sub(body_lines + 4) / 2;

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(padding),
                Constraint::Length(2),
                Constraint::Length(body_lines),
                Constraint::Length(2),
                Constraint::Min(0),
            ])
            .split(area);

        Paragraph::new(header)
            .alignment(Alignment::Center)
            .render(chunks[1], buf);

        Paragraph::new(Span::styled(body, body_style))
            .alignment(if body_lines == 1 {
                Alignment::Center
            } else {
                Alignment::Left
            })
            .wrap(Wrap { trim: true })
            .render(chunks[2], buf);

        Paragraph::new(Span::styled(footer, dim_style))
            .alignment(Alignment::Center)
            .render(chunks[3], buf);
    }
}
