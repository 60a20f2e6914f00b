use ratatui::style::{Color, Modifier, Style};

pub struct Theme {
    pub bg: Color,
    pub surface: Color,
    pub surface_bright: Color,
    pub text: Color,
    pub text_muted: Color,
    pub text_accent: Color,
    pub success: Color,
    pub error: Color,
    pub warning: Color,
    pub border: Color,
    pub border_focused: Color,
    pub eth_value: Color,
    pub address_color: Color,
    pub hash_color: Color,
    pub button_fg: Color,
}

pub const THEME: Theme = Theme {
    bg: Color::Rgb(16, 16, 28),
    surface: Color::Rgb(24, 24, 40),
    surface_bright: Color::Rgb(36, 36, 56),
    text: Color::Rgb(220, 220, 230),
    text_muted: Color::Rgb(120, 120, 140),
    text_accent: Color::Cyan,
    success: Color::Green,
    error: Color::Red,
    warning: Color::Yellow,
    border: Color::Rgb(60, 60, 80),
    border_focused: Color::Cyan,
    eth_value: Color::Rgb(98, 126, 234),
    address_color: Color::Rgb(255, 179, 71),
    hash_color: Color::Rgb(150, 150, 180),
    button_fg: Color::White,
};

impl Theme {
    pub const fn header_style(&self) -> Style {
        Style::new().fg(self.text).bg(self.surface)
    }

    pub const fn border_style(&self) -> Style {
        Style::new().fg(self.border)
    }

    pub const fn border_focused_style(&self) -> Style {
        Style::new().fg(self.border_focused)
    }

    pub const fn muted_style(&self) -> Style {
        Style::new().fg(self.text_muted)
    }

    pub const fn accent_style(&self) -> Style {
        Style::new().fg(self.text_accent)
    }

    pub const fn success_style(&self) -> Style {
        Style::new().fg(self.success)
    }

    pub const fn error_style(&self) -> Style {
        Style::new().fg(self.error)
    }

    pub const fn eth_style(&self) -> Style {
        Style::new().fg(self.eth_value)
    }

    pub const fn address_style(&self) -> Style {
        Style::new().fg(self.address_color)
    }

    pub const fn hash_style(&self) -> Style {
        Style::new().fg(self.hash_color)
    }

    /// Badge showing whether the wallet is on a card's chain.
    pub const fn indicator_style(&self, active: bool) -> Style {
        if active {
            Style::new().fg(self.bg).bg(self.success).add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(self.text).bg(self.surface_bright)
        }
    }

    /// A key "button" filled with the network's color; dimmed while unavailable.
    pub fn button_style(&self, color: Color, enabled: bool) -> Style {
        if enabled {
            Style::new().fg(self.button_fg).bg(color).add_modifier(Modifier::BOLD)
        } else {
            Style::new().fg(self.text_muted).bg(self.surface_bright)
        }
    }

    /// Parse a `#rrggbb` network color, falling back to the accent color.
    pub fn network_color(&self, hex: &str) -> Color {
        hex.parse().unwrap_or(self.text_accent)
    }
}
