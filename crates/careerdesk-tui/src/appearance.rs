//! Terminal stand-in for the "prefers dark color scheme" media query.

use careerdesk_core::SystemAppearance;

#[derive(Debug, Clone, Copy)]
pub struct TerminalAppearance {
    prefers_dark: bool,
}

impl TerminalAppearance {
    /// Reads `COLORFGBG` ("fg;bg", set by rxvt, Konsole and friends).
    pub fn detect() -> Self {
        let prefers_dark = std::env::var("COLORFGBG")
            .ok()
            .and_then(|value| parse_colorfgbg(&value))
            .unwrap_or(false);
        Self { prefers_dark }
    }

    #[cfg(test)]
    pub fn fixed(prefers_dark: bool) -> Self {
        Self { prefers_dark }
    }
}

impl SystemAppearance for TerminalAppearance {
    fn prefers_dark(&self) -> bool {
        self.prefers_dark
    }
}

/// `Some(true)` when the background color index is a dark ANSI color.
pub fn parse_colorfgbg(value: &str) -> Option<bool> {
    let bg: u8 = value.rsplit(';').next()?.trim().parse().ok()?;
    match bg {
        0..=6 | 8 => Some(true),
        7 | 9..=15 => Some(false),
        _ => None,
    }
}
