use alloy::primitives::Address;
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::data::networks;
use crate::theme::THEME;
use crate::utils;

pub struct Header {
    pub account: Option<Address>,
    pub chain_id: Option<u64>,
    pub connecting: bool,
}

impl Header {
    pub fn new() -> Self {
        Self {
            account: None,
            chain_id: None,
            connecting: false,
        }
    }

    fn display_chain_name(&self) -> String {
        match self.chain_id {
            None => "No network".to_string(),
            Some(id) => match networks::by_chain_id(id) {
                Some(network) => network.name.to_string(),
                None => format!("Chain {}", utils::format_number(id)),
            },
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let header_block = Block::default().style(THEME.header_style());
        frame.render_widget(header_block, area);

        // Left: title, center: connect control, right: active network
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(12),
                Constraint::Min(0),
                Constraint::Length(28),
            ])
            .split(area);

        let title = Paragraph::new(Span::styled(
            " GM Hub",
            Style::default()
                .fg(THEME.text_accent)
                .add_modifier(Modifier::BOLD),
        ))
        .style(THEME.header_style());
        frame.render_widget(title, chunks[0]);

        let connect = match (&self.account, self.connecting) {
            (Some(account), _) => Line::from(vec![
                Span::styled("Connected ", THEME.success_style()),
                Span::styled(utils::truncate_address(account), THEME.address_style()),
                Span::styled("  [d] Disconnect", THEME.muted_style()),
            ]),
            (None, true) => Line::from(Span::styled("Connecting...", THEME.accent_style())),
            (None, false) => Line::from(vec![
                Span::styled("[c] ", THEME.accent_style()),
                Span::styled("Connect Wallet", Style::default().fg(THEME.text)),
            ]),
        };
        frame.render_widget(
            Paragraph::new(connect)
                .alignment(Alignment::Center)
                .style(THEME.header_style()),
            chunks[1],
        );

        let network_info = Line::from(vec![
            Span::styled(self.display_chain_name(), Style::default().fg(THEME.text)),
            Span::styled(" | ", THEME.muted_style()),
            Span::styled(
                self.chain_id
                    .map(|id| format!("#{id} "))
                    .unwrap_or_else(|| "- ".to_string()),
                THEME.accent_style(),
            ),
        ]);
        let network_paragraph = Paragraph::new(network_info)
            .alignment(Alignment::Right)
            .style(THEME.header_style());
        frame.render_widget(network_paragraph, chunks[2]);
    }
}
