use std::path::PathBuf;

use careerdesk_core::{
    ChatCompletion, Gateway, ImageCompletion, ImageStatus, JsonPreferenceStore, SessionGate,
    Theme, ThemeStore, Workspace,
};
use tokio::task::JoinHandle;

use crate::appearance::TerminalAppearance;
use crate::input::LineInput;
use crate::palette::Palette;
use crate::preview::{self, ImagePreview};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Chat,
    Image,
}

/// Settings resolved from the config file and command line.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub images_dir: PathBuf,
    pub chat_model: String,
    pub image_model: String,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub gate: SessionGate,
    pub input_mode: InputMode,
    pub focus: FocusPane,

    // Theme
    themes: ThemeStore<JsonPreferenceStore, TerminalAppearance>,
    pub theme: Theme,
    pub palette: Palette,

    // Inputs
    pub chat_input: LineInput,
    pub prompt_input: LineInput,

    // Chat scroll, updated during render
    pub chat_scroll: u16,
    pub chat_follow: bool,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_total_lines: u16,

    // In-flight provider calls
    chat_task: Option<JoinHandle<ChatCompletion>>,
    image_task: Option<JoinHandle<ImageCompletion>>,

    // Animation state
    pub animation_frame: u8,

    // Image output
    images_dir: PathBuf,
    pub saved_image: Option<PathBuf>,
    pub notice: Option<String>,
    pub preview: Option<ImagePreview>,

    pub chat_model: String,
    pub image_model: String,
}

impl App {
    pub fn new(
        gateway: Gateway,
        mut themes: ThemeStore<JsonPreferenceStore, TerminalAppearance>,
        options: AppOptions,
    ) -> Self {
        let theme = themes.current_theme();

        Self {
            should_quit: false,
            gate: SessionGate::new(gateway),
            input_mode: InputMode::Normal,
            focus: FocusPane::Chat,

            themes,
            theme,
            palette: Palette::for_theme(theme),

            chat_input: LineInput::default(),
            prompt_input: LineInput::default(),

            chat_scroll: 0,
            chat_follow: true,
            chat_height: 0,
            chat_width: 0,
            chat_total_lines: 0,

            chat_task: None,
            image_task: None,

            animation_frame: 0,

            images_dir: options.images_dir,
            saved_image: None,
            notice: None,
            preview: None,

            chat_model: options.chat_model,
            image_model: options.image_model,
        }
    }

    pub fn workspace(&self) -> Option<&Workspace> {
        self.gate.workspace()
    }

    pub fn login(&mut self) {
        if self.gate.login() {
            self.focus = FocusPane::Chat;
            self.input_mode = InputMode::Normal;
            self.chat_follow = true;
            self.chat_scroll = 0;
        }
    }

    /// Abandon in-flight calls and drop everything the workspace showed.
    pub fn logout(&mut self) {
        if let Some(task) = self.chat_task.take() {
            task.abort();
        }
        if let Some(task) = self.image_task.take() {
            task.abort();
        }
        self.gate.logout();

        self.input_mode = InputMode::Normal;
        self.chat_input.clear();
        self.prompt_input.clear();
        self.saved_image = None;
        self.notice = None;
        self.preview = None;
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.themes.toggle_theme();
        self.palette = Palette::for_theme(self.theme);
        // Preview colors come from the image, but its cache key ignores theme
        self.preview = None;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Chat => FocusPane::Image,
            FocusPane::Image => FocusPane::Chat,
        };
    }

    /// Whether the focused view has a call in flight.
    pub fn focused_busy(&self) -> bool {
        match (self.workspace(), self.focus) {
            (Some(ws), FocusPane::Chat) => ws.chat.is_sending(),
            (Some(ws), FocusPane::Image) => ws.image.is_loading(),
            (None, _) => false,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.workspace()
            .map(|ws| ws.chat.is_sending() || ws.image.is_loading())
            .unwrap_or(false)
    }

    pub fn focused_input(&mut self) -> &mut LineInput {
        match self.focus {
            FocusPane::Chat => &mut self.chat_input,
            FocusPane::Image => &mut self.prompt_input,
        }
    }

    pub fn submit_focused(&mut self) {
        match self.focus {
            FocusPane::Chat => self.submit_chat(),
            FocusPane::Image => self.submit_image(),
        }
    }

    pub fn submit_chat(&mut self) {
        if self.chat_input.is_blank() {
            return;
        }
        let Some(ws) = self.gate.workspace_mut() else {
            return;
        };
        if let Some(pending) = ws.chat.begin_submit(self.chat_input.text()) {
            self.chat_input.clear();
            self.chat_follow = true;
            self.chat_task = Some(tokio::spawn(pending.send()));
        }
    }

    /// A blank prompt still goes through the controller so it can set its
    /// validation message.
    pub fn submit_image(&mut self) {
        let Some(ws) = self.gate.workspace_mut() else {
            return;
        };
        if let Some(pending) = ws.image.begin_submit(self.prompt_input.text()) {
            self.saved_image = None;
            self.notice = None;
            self.preview = None;
            self.image_task = Some(tokio::spawn(pending.generate()));
        }
    }

    pub fn dismiss_image_error(&mut self) {
        if let Some(ws) = self.gate.workspace_mut() {
            ws.image.dismiss_error();
        }
        self.notice = None;
    }

    /// Hand finished calls back to their controllers.
    pub async fn poll_tasks(&mut self) {
        if let Some(task) = self.chat_task.take_if(|t| t.is_finished()) {
            let result = task.await;
            if let Some(ws) = self.gate.workspace_mut() {
                match result {
                    Ok(completion) => {
                        ws.chat.complete(completion);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "chat task failed");
                        ws.chat.recover_lost_send();
                    }
                }
            }
        }

        if let Some(task) = self.image_task.take_if(|t| t.is_finished()) {
            let result = task.await;
            let Some(ws) = self.gate.workspace_mut() else {
                return;
            };
            let applied = match result {
                Ok(completion) => ws.image.complete(completion),
                Err(e) => {
                    tracing::error!(error = %e, "image task failed");
                    ws.image.recover_lost_request();
                    false
                }
            };

            let state = ws.image.state();
            if applied && state.status == ImageStatus::Ready {
                if let Some(image) = &state.result {
                    match preview::save_image(&self.images_dir, image, ws.image.request_id()) {
                        Ok(path) => {
                            tracing::info!(path = %path.display(), "image saved");
                            self.saved_image = Some(path);
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "could not save image");
                            self.notice = Some(format!("Could not save image: {}", e));
                        }
                    }
                }
            }
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_busy() {
            self.animation_frame = (self.animation_frame + 1) % 4;
        } else {
            self.animation_frame = 0;
        }
    }

    pub fn max_chat_scroll(&self) -> u16 {
        self.chat_total_lines.saturating_sub(self.chat_height)
    }

    pub fn scroll_chat_up(&mut self, lines: u16) {
        self.chat_follow = false;
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_chat_down(&mut self, lines: u16) {
        let max = self.max_chat_scroll();
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
        if self.chat_scroll >= max {
            self.chat_follow = true;
        }
    }

    pub fn follow_chat(&mut self) {
        self.chat_follow = true;
        self.chat_scroll = self.max_chat_scroll();
    }

    pub fn scroll_chat_half_page_up(&mut self) {
        self.scroll_chat_up((self.chat_height / 2).max(1));
    }

    pub fn scroll_chat_half_page_down(&mut self) {
        self.scroll_chat_down((self.chat_height / 2).max(1));
    }

    #[cfg(test)]
    fn has_tasks(&self) -> bool {
        self.chat_task.is_some() || self.image_task.is_some()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use careerdesk_core::ai::{ImageRequest, ProviderImage};
    use careerdesk_core::chat::GREETING;
    use careerdesk_core::{AiProvider, ChatMessage, ChatTransport, ProviderError};
    use std::sync::Arc;
    use tempfile::TempDir;

    // FF D8 FF E0
    const JPEG_HEADER_B64: &str = "/9j/4A==";

    #[derive(Clone, Copy)]
    pub(crate) struct Scripted {
        pub hang: bool,
    }

    struct ScriptedChat {
        hang: bool,
    }

    #[async_trait]
    impl ChatTransport for ScriptedChat {
        async fn send(&mut self, text: &str) -> Result<String, ProviderError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(format!("re: {}", text))
        }
    }

    #[async_trait]
    impl AiProvider for Scripted {
        fn start_chat(&self, _system_instruction: &str) -> Box<dyn ChatTransport> {
            Box::new(ScriptedChat { hang: self.hang })
        }

        async fn generate_images(
            &self,
            _request: &ImageRequest,
        ) -> Result<Vec<ProviderImage>, ProviderError> {
            if self.hang {
                std::future::pending::<()>().await;
            }
            Ok(vec![ProviderImage {
                bytes_base64: JPEG_HEADER_B64.to_string(),
                mime_type: Some("image/jpeg".to_string()),
            }])
        }
    }

    pub(crate) fn test_app(provider: Scripted) -> (TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let themes = ThemeStore::new(
            JsonPreferenceStore::new(dir.path().join("preferences.json")),
            TerminalAppearance::fixed(true),
        );
        let options = AppOptions {
            images_dir: dir.path().join("images"),
            chat_model: "chat-model".to_string(),
            image_model: "image-model".to_string(),
        };
        let app = App::new(Gateway::new(Arc::new(provider)), themes, options);
        (dir, app)
    }

    async fn settle(app: &mut App) {
        for _ in 0..100 {
            if !app.has_tasks() {
                return;
            }
            tokio::task::yield_now().await;
            app.poll_tasks().await;
        }
        panic!("tasks did not finish");
    }

    fn type_into(input: &mut LineInput, text: &str) {
        for c in text.chars() {
            input.insert(c);
        }
    }

    #[tokio::test]
    async fn test_starts_logged_out_with_system_theme() {
        let (_dir, app) = test_app(Scripted { hang: false });
        assert!(app.workspace().is_none());
        assert_eq!(app.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.login();
        type_into(&mut app.chat_input, "How do I apply?");

        app.submit_chat();
        assert!(app.chat_input.text().is_empty());
        assert!(app.workspace().unwrap().chat.is_sending());

        settle(&mut app).await;

        let transcript = app.workspace().unwrap().chat.transcript();
        assert_eq!(
            transcript,
            &[
                ChatMessage::assistant(GREETING),
                ChatMessage::user("How do I apply?"),
                ChatMessage::assistant("re: How do I apply?"),
            ]
        );
    }

    #[tokio::test]
    async fn test_blank_chat_not_sent() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.login();
        type_into(&mut app.chat_input, "   ");
        app.submit_chat();
        assert!(!app.has_tasks());
        assert_eq!(app.workspace().unwrap().chat.transcript().len(), 1);
    }

    #[tokio::test]
    async fn test_image_saved_on_success() {
        let (dir, mut app) = test_app(Scripted { hang: false });
        app.login();
        app.focus = FocusPane::Image;
        type_into(&mut app.prompt_input, "a red circle");

        app.submit_focused();
        settle(&mut app).await;

        let state = app.workspace().unwrap().image.state();
        assert_eq!(state.status, ImageStatus::Ready);
        let saved = app.saved_image.clone().unwrap();
        assert!(saved.starts_with(dir.path().join("images")));
        assert_eq!(std::fs::read(saved).unwrap(), vec![0xFF, 0xD8, 0xFF, 0xE0]);
        // The prompt stays in the field for tweaking
        assert_eq!(app.prompt_input.text(), "a red circle");
    }

    #[tokio::test]
    async fn test_blank_image_prompt_sets_error() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.login();
        app.submit_image();
        assert!(!app.has_tasks());
        assert!(app.workspace().unwrap().image.state().error.is_some());

        app.dismiss_image_error();
        assert!(app.workspace().unwrap().image.state().error.is_none());
    }

    #[tokio::test]
    async fn test_logout_abandons_calls() {
        let (_dir, mut app) = test_app(Scripted { hang: true });
        app.login();
        type_into(&mut app.chat_input, "hello");
        app.submit_chat();
        app.focus = FocusPane::Image;
        type_into(&mut app.prompt_input, "a logo");
        app.submit_image();
        assert!(app.is_busy());

        app.logout();
        assert!(!app.has_tasks());
        assert!(app.workspace().is_none());
        assert!(app.prompt_input.text().is_empty());

        app.login();
        let ws = app.workspace().unwrap();
        assert_eq!(ws.chat.transcript(), &[ChatMessage::assistant(GREETING)]);
        assert_eq!(ws.image.state().status, ImageStatus::Idle);
        assert!(!app.is_busy());
    }

    #[tokio::test]
    async fn test_toggle_theme_updates_palette() {
        let (dir, mut app) = test_app(Scripted { hang: false });
        app.toggle_theme();
        assert_eq!(app.theme, Theme::Light);

        let persisted = std::fs::read_to_string(dir.path().join("preferences.json")).unwrap();
        assert!(persisted.contains("light"));
    }

    #[tokio::test]
    async fn test_scroll_follow() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.chat_total_lines = 30;
        app.chat_height = 10;

        app.follow_chat();
        assert_eq!(app.chat_scroll, 20);

        app.scroll_chat_up(5);
        assert!(!app.chat_follow);
        assert_eq!(app.chat_scroll, 15);

        app.scroll_chat_down(100);
        assert!(app.chat_follow);
        assert_eq!(app.chat_scroll, 20);
    }

    #[tokio::test]
    async fn test_animation_only_while_busy() {
        let (_dir, mut app) = test_app(Scripted { hang: true });
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.login();
        type_into(&mut app.chat_input, "hi");
        app.submit_chat();
        app.tick_animation();
        app.tick_animation();
        assert_eq!(app.animation_frame, 2);
    }
}
