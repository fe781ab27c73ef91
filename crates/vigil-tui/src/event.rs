//! Event handling for the Vigil TUI.
//!
//! Converts raw key events into app-level actions, switching between
//! the normal list keys and the acknowledge-modal text input.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Application-level events that can trigger state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// Request application quit
    Quit,
    /// Force quit (Ctrl+C)
    ForceQuit,
    /// Manual out-of-cycle refresh
    Refresh,
    /// Navigate up in the alert list
    NavigateUp,
    /// Navigate down in the alert list
    NavigateDown,
    /// Open the acknowledge modal for the selected alert
    OpenAcknowledge,
    /// Toggle the arrival sound
    ToggleSound,
    /// Toggle desktop notifications
    ToggleDesktop,
    /// Text input character (modal)
    TextInput(char),
    /// Backspace in text input (modal)
    Backspace,
    /// Submit the modal
    Submit,
    /// Cancel the modal / current operation
    Cancel,
    /// No action needed
    None,
}

/// Input handler for converting key events to app events.
#[derive(Debug, Default)]
pub struct InputHandler {
    /// Whether the acknowledge modal's text input is active
    modal_mode: bool,
}

impl InputHandler {
    /// Create a new input handler.
    pub fn new() -> Self {
        Self { modal_mode: false }
    }

    /// Set whether the acknowledge modal is capturing input.
    pub fn set_modal_mode(&mut self, active: bool) {
        self.modal_mode = active;
    }

    /// Returns whether modal input mode is active.
    pub fn is_modal_mode(&self) -> bool {
        self.modal_mode
    }

    /// Handle a key event and return the corresponding app event.
    pub fn handle_key(&mut self, key: KeyEvent) -> AppEvent {
        // Ctrl+C always force quits
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return AppEvent::ForceQuit;
        }

        if key.code == KeyCode::Esc {
            if self.modal_mode {
                self.modal_mode = false;
            }
            return AppEvent::Cancel;
        }

        if self.modal_mode {
            return Self::handle_modal_input(key);
        }

        self.handle_normal_mode(key)
    }

    fn handle_modal_input(key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Enter => AppEvent::Submit,
            KeyCode::Backspace => AppEvent::Backspace,
            KeyCode::Char(c) => AppEvent::TextInput(c),
            _ => AppEvent::None,
        }
    }

    fn handle_normal_mode(&mut self, key: KeyEvent) -> AppEvent {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => AppEvent::Quit,

            KeyCode::Char('r') | KeyCode::Char('R') => AppEvent::Refresh,

            KeyCode::Char('a') | KeyCode::Char('A') => {
                self.modal_mode = true;
                AppEvent::OpenAcknowledge
            }

            KeyCode::Char('s') | KeyCode::Char('S') => AppEvent::ToggleSound,
            KeyCode::Char('n') | KeyCode::Char('N') => AppEvent::ToggleDesktop,

            KeyCode::Up | KeyCode::Char('k') => AppEvent::NavigateUp,
            KeyCode::Down | KeyCode::Char('j') => AppEvent::NavigateDown,

            _ => AppEvent::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_normal_mode_keys() {
        let mut handler = InputHandler::new();
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('q'))), AppEvent::Quit);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('r'))), AppEvent::Refresh);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('s'))), AppEvent::ToggleSound);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('j'))), AppEvent::NavigateDown);
        assert_eq!(handler.handle_key(key_event(KeyCode::Char('k'))), AppEvent::NavigateUp);
    }

    #[test]
    fn test_acknowledge_enters_modal_mode() {
        let mut handler = InputHandler::new();
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('a'))),
            AppEvent::OpenAcknowledge
        );
        assert!(handler.is_modal_mode());

        // Characters now feed the comment textarea
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Char('q'))),
            AppEvent::TextInput('q')
        );
        assert_eq!(
            handler.handle_key(key_event(KeyCode::Enter)),
            AppEvent::Submit
        );
    }

    #[test]
    fn test_escape_leaves_modal_mode() {
        let mut handler = InputHandler::new();
        handler.set_modal_mode(true);

        assert_eq!(handler.handle_key(key_event(KeyCode::Esc)), AppEvent::Cancel);
        assert!(!handler.is_modal_mode());
    }

    #[test]
    fn test_ctrl_c_force_quits_in_any_mode() {
        let mut handler = InputHandler::new();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);

        assert_eq!(handler.handle_key(ctrl_c), AppEvent::ForceQuit);

        handler.set_modal_mode(true);
        assert_eq!(handler.handle_key(ctrl_c), AppEvent::ForceQuit);
    }
}
