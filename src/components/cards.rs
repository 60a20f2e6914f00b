use alloy::primitives::B256;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::*;

use crate::components::Component;
use crate::data::types::NetworkConfig;
use crate::events::AppEvent;
use crate::theme::THEME;

/// Text shown in every field that has no value yet.
pub const PLACEHOLDER: &str = "—";

/// Rendered state of one network's card.
#[derive(Debug, Clone)]
pub struct NetworkCard {
    pub network: &'static NetworkConfig,
    pub status: String,
    pub fee: String,
    pub fee_usd: String,
    pub streak: String,
    pub total: String,
    pub tx_status: String,
    pub last_tx: Option<B256>,
    /// The wallet is on this card's chain.
    pub active: bool,
    /// Fee and greeting actions are available (wallet connected).
    pub actions_enabled: bool,
    pub switching: bool,
    pub fetching_fee: bool,
    pub sending: bool,
}

impl NetworkCard {
    pub fn new(network: &'static NetworkConfig) -> Self {
        Self {
            network,
            status: PLACEHOLDER.to_string(),
            fee: PLACEHOLDER.to_string(),
            fee_usd: PLACEHOLDER.to_string(),
            streak: PLACEHOLDER.to_string(),
            total: PLACEHOLDER.to_string(),
            tx_status: PLACEHOLDER.to_string(),
            last_tx: None,
            active: false,
            actions_enabled: false,
            switching: false,
            fetching_fee: false,
            sending: false,
        }
    }

    /// Back to the state of a freshly built card.
    pub fn reset(&mut self) {
        *self = Self::new(self.network);
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    fn render(&self, frame: &mut Frame, area: Rect, selected: bool) {
        let color = THEME.network_color(self.network.color);
        let title = Line::from(vec![
            Span::styled(
                format!(" {} ", self.network.name),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                if self.active { " Connected " } else { " Switch Network " },
                THEME.indicator_style(self.active),
            ),
            Span::raw(" "),
        ]);

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(if selected { BorderType::Thick } else { BorderType::Rounded })
            .border_style(if selected {
                THEME.border_focused_style()
            } else {
                THEME.border_style()
            });
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let label = |text: &'static str| Span::styled(text, THEME.muted_style());
        let value = |text: &str| Span::styled(text.to_string(), Style::default().fg(THEME.text));
        let fee_text = if self.fee == PLACEHOLDER || self.fee == "Error" {
            self.fee.clone()
        } else {
            format!("{} {}", self.fee, self.network.currency)
        };

        let mut lines = vec![
            Line::from(vec![
                label("Chain ID:  "),
                value(&self.network.chain_id.to_string()),
            ]),
            Line::from(vec![label("Status:    "), value(&self.status)]),
            Line::from(vec![
                label("GM Fee:    "),
                Span::styled(fee_text, THEME.eth_style()),
            ]),
            Line::from(vec![label("Fee (USD): "), value(&self.fee_usd)]),
            Line::from(vec![label("Streak:    "), value(&self.streak)]),
            Line::from(vec![label("Total GM:  "), value(&self.total)]),
            Line::default(),
            Line::from(vec![
                Span::styled(
                    format!(" [w] Switch to {} ", self.network.name),
                    if self.switching {
                        THEME.button_style(color, false)
                    } else {
                        THEME.accent_style().add_modifier(Modifier::REVERSED)
                    },
                ),
            ]),
            Line::from(vec![
                Span::styled(
                    " [f] Check Fee ",
                    THEME.button_style(color, self.actions_enabled && !self.fetching_fee),
                ),
                Span::raw(" "),
                Span::styled(
                    " [g] Say GM ☀️ ",
                    THEME.button_style(color, self.actions_enabled && !self.sending),
                ),
            ]),
            Line::default(),
        ];

        let tx_style = if self.last_tx.is_some() {
            THEME.hash_style()
        } else {
            THEME.muted_style()
        };
        lines.push(Line::from(Span::styled(self.tx_status.clone(), tx_style)));

        let body = Paragraph::new(lines).wrap(Wrap { trim: false });
        frame.render_widget(body, inner);
    }
}

/// One card per configured network, built once at startup.
pub struct CardGrid {
    pub cards: Vec<NetworkCard>,
    pub selected: usize,
}

impl CardGrid {
    pub fn new(networks: &'static [NetworkConfig]) -> Self {
        Self {
            cards: networks.iter().map(NetworkCard::new).collect(),
            selected: 0,
        }
    }

    pub fn get(&self, index: usize) -> Option<&NetworkCard> {
        self.cards.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NetworkCard> {
        self.cards.get_mut(index)
    }

    pub fn select(&mut self, index: usize) {
        if index < self.cards.len() {
            self.selected = index;
        }
    }

    fn select_next(&mut self) {
        if !self.cards.is_empty() {
            self.selected = (self.selected + 1) % self.cards.len();
        }
    }

    fn select_prev(&mut self) {
        if !self.cards.is_empty() {
            self.selected = (self.selected + self.cards.len() - 1) % self.cards.len();
        }
    }

    /// Mark the card on `chain_id` as active, all others inactive.
    pub fn set_active_chain(&mut self, chain_id: Option<u64>) {
        for card in &mut self.cards {
            card.active = Some(card.network.chain_id) == chain_id;
        }
    }

    pub fn index_of_chain(&self, chain_id: u64) -> Option<usize> {
        self.cards
            .iter()
            .position(|c| c.network.chain_id == chain_id)
    }

    pub fn reset_all(&mut self) {
        for card in &mut self.cards {
            card.reset();
        }
    }

    /// Release the fee guards of reads issued under a context that is gone.
    pub fn abandon_reads(&mut self) {
        for card in &mut self.cards {
            card.fetching_fee = false;
        }
    }

    pub fn enable_actions(&mut self) {
        for card in &mut self.cards {
            card.actions_enabled = true;
        }
    }
}

impl Component for CardGrid {
    fn handle_key(&mut self, key: KeyEvent) -> Option<AppEvent> {
        match key.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.select_prev();
                None
            }
            KeyCode::Right | KeyCode::Char('l') | KeyCode::Tab => {
                self.select_next();
                None
            }
            KeyCode::Char(c @ '1'..='9') => {
                self.select(c as usize - '1' as usize);
                None
            }
            KeyCode::Char('w') => Some(AppEvent::SwitchNetwork(self.selected)),
            KeyCode::Char('f') => Some(AppEvent::CheckFee(self.selected)),
            KeyCode::Char('g') | KeyCode::Enter => Some(AppEvent::SayGm(self.selected)),
            KeyCode::Char('r') => Some(AppEvent::RefreshStats),
            KeyCode::Char('o') => Some(AppEvent::ShowTxLink(self.selected)),
            _ => None,
        }
    }

    fn render(&mut self, frame: &mut Frame, area: Rect) {
        if self.cards.is_empty() {
            let empty = Paragraph::new("No networks configured")
                .style(THEME.muted_style())
                .alignment(Alignment::Center);
            frame.render_widget(empty, area);
            return;
        }

        // Side by side when there is room, stacked otherwise.
        let n = self.cards.len() as u32;
        let direction = if area.width >= 30 * n as u16 {
            Direction::Horizontal
        } else {
            Direction::Vertical
        };
        let columns = Layout::default()
            .direction(direction)
            .constraints((0..n).map(|_| Constraint::Ratio(1, n)))
            .split(area);

        for (i, card) in self.cards.iter().enumerate() {
            card.render(frame, columns[i], i == self.selected);
        }
    }
}
