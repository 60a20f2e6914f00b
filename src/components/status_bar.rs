use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::theme::THEME;

pub struct StatusBar {
    pub connected: bool,
    pub error_message: Option<String>,
    pub info_message: Option<String>,
    pub watching: bool,
}

impl StatusBar {
    pub fn new() -> Self {
        Self {
            connected: false,
            error_message: None,
            info_message: None,
            watching: false,
        }
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.error_message = None;
        self.info_message = Some(msg.into());
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.error_message = Some(msg.into());
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let bg = Block::default().style(THEME.header_style());
        frame.render_widget(bg, area);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(28)])
            .split(area);

        // --- Left side ---
        let left_content = if let Some(ref err) = self.error_message {
            Line::from(vec![
                Span::styled(
                    " ! ",
                    Style::default()
                        .fg(THEME.error)
                        .add_modifier(Modifier::BOLD),
                ),
                Span::styled(err.as_str(), Style::default().fg(THEME.warning)),
            ])
        } else if let Some(ref info) = self.info_message {
            Line::from(Span::styled(
                format!(" {info}"),
                Style::default().fg(THEME.text_accent),
            ))
        } else {
            Line::from(vec![
                Span::styled(" \u{2190}\u{2192}", Style::default().fg(THEME.text_accent)),
                Span::styled(":Card  ", Style::default().fg(THEME.text_muted)),
                Span::styled("w", Style::default().fg(THEME.text_accent)),
                Span::styled(":Switch  ", Style::default().fg(THEME.text_muted)),
                Span::styled("f", Style::default().fg(THEME.text_accent)),
                Span::styled(":Fee  ", Style::default().fg(THEME.text_muted)),
                Span::styled("g", Style::default().fg(THEME.text_accent)),
                Span::styled(":GM  ", Style::default().fg(THEME.text_muted)),
                Span::styled("?", Style::default().fg(THEME.text_accent)),
                Span::styled(":Help  ", Style::default().fg(THEME.text_muted)),
                Span::styled("q", Style::default().fg(THEME.text_accent)),
                Span::styled(":Quit", Style::default().fg(THEME.text_muted)),
            ])
        };

        let left = Paragraph::new(left_content).style(THEME.header_style());
        frame.render_widget(left, chunks[0]);

        // --- Right side: notification watcher + wallet connection ---
        let (dot_color, status_text) = if self.connected {
            (THEME.success, "Connected")
        } else {
            (THEME.error, "Disconnected")
        };

        let (watch_color, watch_text) = if self.watching {
            (THEME.success, "Watching")
        } else {
            (THEME.text_muted, "Idle")
        };

        let right_content = Line::from(vec![
            Span::styled(watch_text, Style::default().fg(watch_color)),
            Span::styled(" | ", THEME.muted_style()),
            Span::styled("\u{25cf} ", Style::default().fg(dot_color)),
            Span::styled(format!("{status_text} "), Style::default().fg(dot_color)),
        ]);

        let right = Paragraph::new(right_content)
            .alignment(Alignment::Right)
            .style(THEME.header_style());
        frame.render_widget(right, chunks[1]);
    }
}
