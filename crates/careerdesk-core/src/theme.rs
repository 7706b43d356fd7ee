//! Light/dark theme preference.

use std::str::FromStr;

use thiserror::Error;

use crate::prefs::PreferenceStore;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown theme {0:?}")]
pub struct UnknownTheme(String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(UnknownTheme(s.to_string())),
        }
    }
}

/// "Does the user prefer a dark color scheme?"
pub trait SystemAppearance {
    fn prefers_dark(&self) -> bool;
}

impl<F> SystemAppearance for F
where
    F: Fn() -> bool,
{
    fn prefers_dark(&self) -> bool {
        self()
    }
}

pub struct ThemeStore<S, A> {
    store: S,
    appearance: A,
    current: Option<Theme>,
}

impl<S: PreferenceStore, A: SystemAppearance> ThemeStore<S, A> {
    pub fn new(store: S, appearance: A) -> Self {
        Self {
            store,
            appearance,
            current: None,
        }
    }

    /// Resolved once: persisted value, else the system preference (not
    /// written back).
    pub fn current_theme(&mut self) -> Theme {
        if let Some(theme) = self.current {
            return theme;
        }

        let persisted = match self.store.load(THEME_KEY) {
            Ok(value) => value.and_then(|v| match v.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring persisted theme");
                    None
                }
            }),
            Err(e) => {
                tracing::warn!(error = %e, "could not read theme preference");
                None
            }
        };

        let theme = persisted.unwrap_or_else(|| {
            if self.appearance.prefers_dark() {
                Theme::Dark
            } else {
                Theme::Light
            }
        });
        self.current = Some(theme);
        theme
    }

    pub fn toggle_theme(&mut self) -> Theme {
        let theme = self.current_theme().toggled();
        self.current = Some(theme);
        if let Err(e) = self.store.store(THEME_KEY, theme.as_str()) {
            tracing::warn!(error = %e, theme = theme.as_str(), "could not persist theme preference");
        }
        theme
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prefs::MemoryPreferenceStore;
    use anyhow::{anyhow, Result};

    struct BrokenStore;

    impl PreferenceStore for BrokenStore {
        fn load(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow!("disk on fire"))
        }

        fn store(&mut self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow!("disk on fire"))
        }
    }

    #[test]
    fn test_parse_theme() {
        assert_eq!("light".parse::<Theme>(), Ok(Theme::Light));
        assert_eq!(" Dark\n".parse::<Theme>(), Ok(Theme::Dark));
        assert_eq!(
            "sepia".parse::<Theme>(),
            Err(UnknownTheme("sepia".to_string()))
        );
        assert_eq!(Theme::Dark.as_str().parse::<Theme>(), Ok(Theme::Dark));
    }

    #[test]
    fn test_fresh_load_follows_dark_system() {
        let mut themes = ThemeStore::new(MemoryPreferenceStore::new(), || true);
        assert_eq!(themes.current_theme(), Theme::Dark);
        assert_eq!(themes.store().writes(), 0);
        assert_eq!(themes.store().load(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn test_fresh_load_follows_light_system() {
        let mut themes = ThemeStore::new(MemoryPreferenceStore::new(), || false);
        assert_eq!(themes.current_theme(), Theme::Light);
    }

    #[test]
    fn test_persisted_value_wins() {
        let mut themes = ThemeStore::new(MemoryPreferenceStore::with(THEME_KEY, "light"), || true);
        assert_eq!(themes.current_theme(), Theme::Light);
    }

    #[test]
    fn test_unknown_persisted_value_ignored() {
        let mut themes = ThemeStore::new(MemoryPreferenceStore::with(THEME_KEY, "sepia"), || true);
        assert_eq!(themes.current_theme(), Theme::Dark);
    }

    #[test]
    fn test_toggle_persists() {
        let mut themes = ThemeStore::new(MemoryPreferenceStore::new(), || true);
        assert_eq!(themes.toggle_theme(), Theme::Light);
        assert_eq!(themes.store().load(THEME_KEY).unwrap().as_deref(), Some("light"));
    }

    #[test]
    fn test_toggle_twice_is_identity() {
        let mut themes = ThemeStore::new(MemoryPreferenceStore::with(THEME_KEY, "dark"), || false);
        let original = themes.current_theme();

        themes.toggle_theme();
        themes.toggle_theme();

        assert_eq!(themes.current_theme(), original);
        assert_eq!(themes.store().load(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_system_queried_once() {
        use std::cell::Cell;
        let calls = Cell::new(0);
        let mut themes = ThemeStore::new(MemoryPreferenceStore::new(), || {
            calls.set(calls.get() + 1);
            true
        });
        themes.current_theme();
        themes.current_theme();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_broken_store_still_toggles() {
        let mut themes = ThemeStore::new(BrokenStore, || false);
        assert_eq!(themes.current_theme(), Theme::Light);
        assert_eq!(themes.toggle_theme(), Theme::Dark);
        assert_eq!(themes.current_theme(), Theme::Dark);
    }
}
