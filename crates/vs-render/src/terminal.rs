use std::fmt::Display;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::DefaultTerminal;
use vs_core::error::CoreError;
use vs_core::traits::{DisplaySink, InputPoller};

use crate::canvas::render_text;

fn display_err(e: impl Display) -> CoreError {
    CoreError::Display(e.to_string())
}

/// Sink d'affichage sur le terminal ratatui (écran alternatif, raw mode).
///
/// Le terminal est initialisé par l'appelant (`ratatui::init()`) et doit
/// être restauré par lui (`ratatui::restore()`), y compris en cas d'erreur.
pub struct TerminalSink {
    terminal: DefaultTerminal,
}

impl TerminalSink {
    #[must_use]
    pub fn new(terminal: DefaultTerminal) -> Self {
        Self { terminal }
    }
}

impl DisplaySink for TerminalSink {
    fn clear_screen(&mut self) -> Result<(), CoreError> {
        self.terminal.clear().map_err(display_err)
    }

    fn write_text(&mut self, block: &str) -> Result<(), CoreError> {
        self.terminal
            .draw(|frame| {
                let area = frame.area();
                render_text(frame.buffer_mut(), area, block);
            })
            .map(|_| ())
            .map_err(display_err)
    }
}

/// `q`, `Esc` ou `Ctrl+C` (en raw mode, Ctrl+C arrive comme une touche).
///
/// # Example
/// ```
/// use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
/// use vs_render::terminal::is_cancel_key;
/// assert!(is_cancel_key(&KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE)));
/// assert!(!is_cancel_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
/// ```
#[must_use]
pub fn is_cancel_key(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Sondage clavier non bloquant via crossterm.
///
/// Vide la file d'événements à chaque appel ; renvoie `true` si l'un d'eux
/// était une touche d'arrêt.
#[derive(Debug, Default)]
pub struct KeyPoller;

impl InputPoller for KeyPoller {
    fn poll_cancel_key(&mut self) -> bool {
        let mut pressed = false;
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if is_cancel_key(&key) => pressed = true,
                    Ok(_) => {}
                    Err(e) => {
                        log::warn!("Lecture clavier impossible : {e}");
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) => {
                    log::warn!("Sondage clavier impossible : {e}");
                    break;
                }
            }
        }
        pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEventState;

    #[test]
    fn cancel_keys() {
        assert!(is_cancel_key(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_cancel_key(&KeyEvent::new(KeyCode::Char('Q'), KeyModifiers::SHIFT)));
        assert!(is_cancel_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_cancel_key(&KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE)));
    }

    #[test]
    fn release_events_ignored() {
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        assert!(!is_cancel_key(&release));
    }
}
