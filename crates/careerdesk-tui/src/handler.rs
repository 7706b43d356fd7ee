use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub async fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.poll_tasks().await;
            app.tick_animation();
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    if app.workspace().is_none() {
        handle_login_screen(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_login_screen(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Char('l') => app.login(),
        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        _ => {}
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Tab | KeyCode::BackTab => app.toggle_focus(),
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,

        KeyCode::Char('t') => app.toggle_theme(),
        KeyCode::Char('L') => app.logout(),
        KeyCode::Char('x') => app.dismiss_image_error(),

        // Chat scrolling
        KeyCode::Char('j') | KeyCode::Down => app.scroll_chat_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_chat_up(1),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_half_page_down();
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.scroll_chat_half_page_up();
        }
        KeyCode::PageDown => app.scroll_chat_down(app.chat_height.max(1)),
        KeyCode::PageUp => app.scroll_chat_up(app.chat_height.max(1)),
        KeyCode::Char('g') => app.scroll_chat_up(u16::MAX),
        KeyCode::Char('G') => app.follow_chat(),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.input_mode = InputMode::Normal,
        KeyCode::Tab => app.toggle_focus(),
        _ if app.focused_busy() => {}
        KeyCode::Enter => app.submit_focused(),
        KeyCode::Backspace => app.focused_input().backspace(),
        KeyCode::Delete => app.focused_input().delete(),
        KeyCode::Left => app.focused_input().left(),
        KeyCode::Right => app.focused_input().right(),
        KeyCode::Home => app.focused_input().home(),
        KeyCode::End => app.focused_input().end(),
        KeyCode::Char(c) if !key.modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) => {
            app.focused_input().insert(c);
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    if app.workspace().is_none() {
        return;
    }
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_chat_up(WHEEL_LINES),
        MouseEventKind::ScrollDown => app.scroll_chat_down(WHEEL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{test_app, Scripted};
    use crate::app::FocusPane;
    use careerdesk_core::Theme;
    use crossterm::event::KeyEventKind;

    fn press(code: KeyCode) -> AppEvent {
        AppEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    async fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            handle_event(app, press(KeyCode::Char(c))).await;
        }
    }

    #[tokio::test]
    async fn test_login_screen_keys() {
        let (_dir, mut app) = test_app(Scripted { hang: false });

        handle_event(&mut app, press(KeyCode::Char('t'))).await;
        assert_eq!(app.theme, Theme::Light);

        handle_event(&mut app, press(KeyCode::Char('x'))).await;
        assert!(app.workspace().is_none());

        handle_event(&mut app, press(KeyCode::Enter)).await;
        assert!(app.workspace().is_some());
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_while_editing() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.login();
        app.input_mode = InputMode::Editing;

        let ctrl_c = KeyEvent::new_with_kind(
            KeyCode::Char('c'),
            KeyModifiers::CONTROL,
            KeyEventKind::Press,
        );
        handle_event(&mut app, AppEvent::Key(ctrl_c)).await;
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_typing_goes_to_focused_input() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.login();

        handle_event(&mut app, press(KeyCode::Char('i'))).await;
        type_text(&mut app, "qt").await;
        assert_eq!(app.chat_input.text(), "qt");
        assert!(!app.should_quit);

        handle_event(&mut app, press(KeyCode::Tab)).await;
        assert_eq!(app.focus, FocusPane::Image);
        type_text(&mut app, "logo").await;
        assert_eq!(app.prompt_input.text(), "logo");
    }

    #[tokio::test]
    async fn test_input_locked_while_sending() {
        let (_dir, mut app) = test_app(Scripted { hang: true });
        app.login();
        handle_event(&mut app, press(KeyCode::Char('i'))).await;
        type_text(&mut app, "hello").await;
        handle_event(&mut app, press(KeyCode::Enter)).await;
        assert!(app.focused_busy());

        type_text(&mut app, "more").await;
        handle_event(&mut app, press(KeyCode::Enter)).await;
        assert!(app.chat_input.text().is_empty());
        assert_eq!(app.workspace().unwrap().chat.transcript().len(), 2);

        // Escape still works
        handle_event(&mut app, press(KeyCode::Esc)).await;
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[tokio::test]
    async fn test_modified_chars_not_typed() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.login();
        app.input_mode = InputMode::Editing;
        type_text(&mut app, "ok").await;

        for (c, modifiers) in [('u', KeyModifiers::CONTROL), ('d', KeyModifiers::CONTROL), ('b', KeyModifiers::ALT)] {
            handle_event(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Char(c), modifiers))).await;
        }
        assert_eq!(app.chat_input.text(), "ok");

        // Shifted characters are still text
        handle_event(&mut app, AppEvent::Key(KeyEvent::new(KeyCode::Char('K'), KeyModifiers::SHIFT))).await;
        assert_eq!(app.chat_input.text(), "okK");
    }

    #[tokio::test]
    async fn test_logout_key() {
        let (_dir, mut app) = test_app(Scripted { hang: false });
        app.login();
        handle_event(&mut app, press(KeyCode::Char('L'))).await;
        assert!(app.workspace().is_none());
    }
}
