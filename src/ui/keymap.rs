use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::config::EditorKeys;
use crate::fields::Tab;
use crate::ui::session::Action;

/// One line of the help overlay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub keys: String,
    pub description: &'static str,
}

/// Maps terminal key events to editor actions
#[derive(Debug, Clone)]
pub struct Keymap {
    keys: EditorKeys,
}

impl Keymap {
    pub fn new(keys: EditorKeys) -> Self {
        Self { keys }
    }

    pub fn resolve(&self, event: &KeyEvent) -> Option<Action> {
        if let Some(digit) = field_digit(event) {
            return Some(Action::Field(digit));
        }

        self.keys
            .actions()
            .into_iter()
            .find(|(_, bindings)| key_matches_any(event, bindings))
            .and_then(|(name, _)| action_for(name))
    }

    pub fn help_entries(&self) -> Vec<HelpEntry> {
        let mut entries = vec![HelpEntry {
            keys: "1-9".to_string(),
            description: "Edit the numbered field",
        }];
        for (name, bindings) in self.keys.actions() {
            if bindings.is_empty() {
                continue;
            }
            entries.push(HelpEntry {
                keys: bindings.join(", "),
                description: describe(name),
            });
        }
        entries
    }
}

fn field_digit(event: &KeyEvent) -> Option<u8> {
    if event
        .modifiers
        .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER)
    {
        return None;
    }
    match event.code {
        KeyCode::Char(c @ '1'..='9') => Some(c as u8 - b'0'),
        _ => None,
    }
}

fn action_for(name: &str) -> Option<Action> {
    let action = match name {
        "tab_contact" => Action::SelectTab(Tab::Contact),
        "tab_address" => Action::SelectTab(Tab::Address),
        "tab_phone" => Action::SelectTab(Tab::Phone),
        "tab_other" => Action::SelectTab(Tab::Other),
        "tab_custom" => Action::SelectTab(Tab::Custom),
        "tab_next" => Action::TabNext,
        "tab_prev" => Action::TabPrev,
        "record_next" => Action::RecordNext,
        "record_prev" => Action::RecordPrev,
        "roll" => Action::Roll,
        "undo" => Action::Undo,
        "help" => Action::Help,
        "mail" => Action::LaunchMail,
        "browser" => Action::LaunchBrowser,
        "redraw" => Action::Redraw,
        "quit" => Action::Quit,
        _ => return None,
    };
    Some(action)
}

fn describe(name: &str) -> &'static str {
    match name {
        "tab_contact" => "Contact tab",
        "tab_address" => "Address tab",
        "tab_phone" => "Phone tab",
        "tab_other" => "Other tab",
        "tab_custom" => "Custom tab",
        "tab_next" => "Next tab",
        "tab_prev" => "Previous tab",
        "record_next" => "Next contact",
        "record_prev" => "Previous contact",
        "roll" => "Roll e-mail addresses",
        "undo" => "Undo last change",
        "help" => "Show this help",
        "mail" => "Write mail to contact",
        "browser" => "Open contact URL",
        "redraw" => "Redraw screen",
        "quit" => "Leave the editor",
        _ => "",
    }
}

/// Check if the key event matches any of the bindings in the list
pub fn key_matches_any(event: &KeyEvent, bindings: &[String]) -> bool {
    bindings.iter().any(|b| key_matches_single(event, b))
}

/// Check if the key event matches a single binding string
pub fn key_matches_single(event: &KeyEvent, binding: &str) -> bool {
    let trimmed = binding.trim();
    if trimmed.is_empty() {
        return false;
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("ctrl+") {
        if !event.modifiers.contains(KeyModifiers::CONTROL)
            || event.modifiers.intersects(KeyModifiers::ALT | KeyModifiers::SUPER)
        {
            return false;
        }
        let mut chars = rest.chars();
        return match (chars.next(), chars.next()) {
            (Some(first), None) => {
                matches!(event.code, KeyCode::Char(c) if c.to_ascii_lowercase() == first)
            }
            _ => false,
        };
    }

    let disallowed = KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER;
    if event.modifiers.intersects(disallowed) {
        return false;
    }

    match lower.as_str() {
        "enter" => matches!(event.code, KeyCode::Enter),
        "tab" => matches!(event.code, KeyCode::Tab),
        "backtab" | "shift+tab" => matches!(event.code, KeyCode::BackTab),
        "backspace" => matches!(event.code, KeyCode::Backspace),
        "esc" | "escape" => matches!(event.code, KeyCode::Esc),
        "space" => matches!(event.code, KeyCode::Char(' ')),
        "up" => matches!(event.code, KeyCode::Up),
        "down" => matches!(event.code, KeyCode::Down),
        "left" => matches!(event.code, KeyCode::Left),
        "right" => matches!(event.code, KeyCode::Right),
        "pageup" | "page_up" => matches!(event.code, KeyCode::PageUp),
        "pagedown" | "page_down" => matches!(event.code, KeyCode::PageDown),
        "home" => matches!(event.code, KeyCode::Home),
        "end" => matches!(event.code, KeyCode::End),
        f if f.len() > 1 && f.starts_with('f') => match f[1..].parse::<u8>() {
            Ok(n) => matches!(event.code, KeyCode::F(k) if k == n),
            Err(_) => false,
        },
        // Single character - case-sensitive (c != C, since C requires Shift)
        _ => {
            let mut chars = trimmed.chars();
            if let (Some(first), None) = (chars.next(), chars.next()) {
                matches!(event.code, KeyCode::Char(c) if c == first)
            } else {
                false
            }
        }
    }
}
