use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use careerdesk_core::{Config, Gateway, JsonPreferenceStore, ThemeStore};
use clap::Parser;

mod app;
mod appearance;
mod handler;
mod input;
mod logging;
mod palette;
mod preview;
mod tui;
mod ui;

use app::{App, AppOptions};
use appearance::TerminalAppearance;
use tui::EventHandler;

#[derive(Parser, Debug)]
#[command(name = "careerdesk")]
#[command(about = "Job assistant chat and AI image generation in the terminal")]
#[command(version)]
struct Cli {
    /// Chat model name
    #[arg(long)]
    chat_model: Option<String>,

    /// Image model name
    #[arg(long)]
    image_model: Option<String>,

    /// Directory generated images are written to
    #[arg(long)]
    images_dir: Option<PathBuf>,

    /// Directory for the log file
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Write the model and directory flags back to the config file
    #[arg(long)]
    save_config: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config) {
        if let Some(model) = &self.chat_model {
            config.chat_model = Some(model.clone());
        }
        if let Some(model) = &self.image_model {
            config.image_model = Some(model.clone());
        }
        if let Some(dir) = &self.images_dir {
            config.images_dir = Some(dir.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(cli.log_dir.clone())?;

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    cli.apply(&mut config);
    if cli.save_config {
        config.save()?;
        tracing::info!(path = %Config::get_config_path()?.display(), "config saved");
    }

    // Fails before the terminal is touched so the message stays readable
    let client = config.gemini_client()?;
    let gateway = Gateway::new(Arc::new(client));

    let themes = ThemeStore::new(
        JsonPreferenceStore::default_location()?,
        TerminalAppearance::detect(),
    );
    let options = AppOptions {
        images_dir: config.images_dir()?,
        chat_model: config.chat_model().to_string(),
        image_model: config.image_model().to_string(),
    };
    let mut app = App::new(gateway, themes, options);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, &mut app).await;
    tui::restore()?;

    if let Err(e) = &result {
        tracing::error!(error = %e, "exited with error");
    }
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await,
            None => break,
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "careerdesk",
            "--chat-model",
            "gemini-2.5-pro",
            "--images-dir",
            "/tmp/out",
        ]);
        let mut config = Config {
            chat_model: Some("gemini-2.5-flash".to_string()),
            image_model: Some("imagen-3.0-generate-002".to_string()),
            ..Config::default()
        };

        cli.apply(&mut config);

        assert_eq!(config.chat_model(), "gemini-2.5-pro");
        assert_eq!(config.image_model(), "imagen-3.0-generate-002");
        assert_eq!(config.images_dir, Some(PathBuf::from("/tmp/out")));
        assert!(!cli.save_config);
    }
}
