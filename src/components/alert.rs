use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::theme::THEME;

/// Modal message for failures that concern the whole hub rather than one card.
pub struct Alert {
    pub message: Option<String>,
}

impl Alert {
    pub fn new() -> Self {
        Self { message: None }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        self.message = Some(message.into());
    }

    /// Any key dismisses the alert. Returns true if it consumed the event.
    pub fn handle_key(&mut self, _key: KeyEvent) -> bool {
        self.message.take().is_some()
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let Some(message) = &self.message else {
            return;
        };

        let popup_width = (area.width * 50 / 100).max(30).min(area.width);
        let popup_height = 7.min(area.height);
        let x = area.x + (area.width - popup_width) / 2;
        let y = area.y + (area.height - popup_height) / 2;
        let popup_area = Rect::new(x, y, popup_width, popup_height);

        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Wallet ")
            .borders(Borders::ALL)
            .border_style(THEME.error_style())
            .style(Style::default().bg(THEME.surface));

        let text = vec![
            Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(THEME.text).add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled("Press any key", THEME.muted_style())),
        ];

        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }
}
