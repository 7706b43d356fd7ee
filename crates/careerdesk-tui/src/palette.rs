use careerdesk_core::Theme;
use ratatui::style::{Color, Modifier, Style};

/// Colors for one theme. Re-derived whenever the theme is toggled.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub background: Color,
    pub surface: Color,
    pub text: Color,
    pub muted: Color,
    pub border: Color,
    pub focus: Color,
    pub primary: Color,
    pub accent: Color,
    pub error: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self {
                background: Color::Rgb(0xF8, 0xFA, 0xFC),
                surface: Color::Rgb(0xFF, 0xFF, 0xFF),
                text: Color::Rgb(0x1E, 0x29, 0x3B),
                muted: Color::Rgb(0x64, 0x74, 0x8B),
                border: Color::Rgb(0xCB, 0xD5, 0xE1),
                focus: Color::Rgb(0x4F, 0x46, 0xE5),
                primary: Color::Rgb(0x4F, 0x46, 0xE5),
                accent: Color::Rgb(0xDB, 0x27, 0x77),
                error: Color::Rgb(0xDC, 0x26, 0x26),
            },
            Theme::Dark => Self {
                background: Color::Rgb(0x0F, 0x17, 0x2A),
                surface: Color::Rgb(0x1E, 0x29, 0x3B),
                text: Color::Rgb(0xE2, 0xE8, 0xF0),
                muted: Color::Rgb(0x94, 0xA3, 0xB8),
                border: Color::Rgb(0x33, 0x41, 0x55),
                focus: Color::Rgb(0x81, 0x8C, 0xF8),
                primary: Color::Rgb(0x81, 0x8C, 0xF8),
                accent: Color::Rgb(0xF4, 0x72, 0xB6),
                error: Color::Rgb(0xF8, 0x71, 0x71),
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().bg(self.background).fg(self.text)
    }

    pub fn panel(&self) -> Style {
        Style::default().bg(self.surface).fg(self.text)
    }

    pub fn border(&self, focused: bool) -> Style {
        Style::default().fg(if focused { self.focus } else { self.border })
    }

    pub fn muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn title(&self) -> Style {
        Style::default().fg(self.text).add_modifier(Modifier::BOLD)
    }

    /// Key cap in the footer hints.
    pub fn key(&self) -> Style {
        Style::default()
            .bg(self.primary)
            .fg(self.surface)
            .add_modifier(Modifier::BOLD)
    }
}
