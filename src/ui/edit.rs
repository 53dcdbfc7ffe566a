use crossterm::event::{Event, KeyCode, KeyEvent, KeyModifiers};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use tracing::warn;

use crate::emails::{address_count, decode_emails, encode_emails, sanitize_address};
use crate::fields::{Field, MAX_EMAILS, MAX_EMAIL_LEN, MAX_FIELD_LEN};
use crate::record::Record;

/// Blocking single-line text input.
pub trait LineInput {
    /// Ask for a line pre-filled with `initial`, at most `max_len` characters.
    /// `None` means the user cancelled.
    fn read_line(&mut self, prompt: &str, initial: &str, max_len: usize) -> Option<String>;
}

/// Replace `slot` with user input. Returns true when the user cancelled,
/// in which case `slot` is left untouched.
///
/// Empty input clears the slot; it never stores an empty string.
pub fn edit_field<I>(input: &mut I, prompt: &str, slot: &mut Option<String>, max_len: usize) -> bool
where
    I: LineInput + ?Sized,
{
    let current = slot.as_deref().unwrap_or_default();
    let Some(value) = input.read_line(prompt, current, max_len) else {
        return true;
    };

    let value: String = value.chars().take(max_len).collect();
    *slot = if value.is_empty() { None } else { Some(value) };
    false
}

/// Edit the name, refusing to leave it blank.
pub fn edit_name_field<I>(input: &mut I, record: &mut Record) -> bool
where
    I: LineInput + ?Sized,
{
    let previous = record.get(Field::Name).map(str::to_string);
    let slot = record.slot_mut(Field::Name);
    let cancelled = edit_field(input, "Name: ", slot, MAX_FIELD_LEN);
    if slot.is_none() {
        *slot = previous;
    }
    cancelled
}

/// Edit one address of the email bundle and re-pack the bundle.
pub fn edit_email_slot<I>(input: &mut I, record: &mut Record, slot_index: usize) -> bool
where
    I: LineInput + ?Sized,
{
    let stored = address_count(record);
    if stored > MAX_EMAILS {
        warn!(
            stored,
            kept = MAX_EMAILS,
            "e-mail field holds more addresses than slots; extras are dropped"
        );
    }

    let mut bundle = decode_emails(record);
    let Some(address) = bundle.get_mut(slot_index) else {
        return true;
    };

    let mut value = Some(std::mem::take(address)).filter(|a| !a.is_empty());
    if edit_field(input, "E-mail: ", &mut value, MAX_EMAIL_LEN) {
        return true;
    }

    *address = value
        .as_deref()
        .map(str::trim)
        .map(sanitize_address)
        .unwrap_or_default();
    let packed = encode_emails(&bundle);
    record.set(Field::Email, Some(packed));
    false
}

/// Edit any catalog field other than the name and the email bundle.
pub fn edit_record_field<I>(input: &mut I, record: &mut Record, field: Field) -> bool
where
    I: LineInput + ?Sized,
{
    match field {
        Field::Name | Field::Email => {
            unreachable!("{field:?} is edited through its own Contact tab editor")
        }
        _ => {
            let prompt = format!("{}: ", field.descriptor().name);
            edit_field(input, &prompt, record.slot_mut(field), field.max_len())
        }
    }
}

/// Result of feeding one key to the prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptState {
    Pending,
    Submitted(String),
    Cancelled,
}

/// Footer prompt state, backed by `tui-input`
#[derive(Debug, Default)]
pub struct InlineEditor {
    prompt: String,
    max_len: usize,
    input: Input,
}

impl InlineEditor {
    pub fn start(prompt: &str, current: &str, max_len: usize) -> Self {
        let initial: String = current.chars().take(max_len).collect();
        Self {
            prompt: prompt.to_string(),
            max_len,
            input: Input::new(initial),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn value(&self) -> &str {
        self.input.value()
    }

    pub fn visual_cursor(&self) -> usize {
        self.input.visual_cursor()
    }

    pub fn handle_key_event(&mut self, key: KeyEvent) -> PromptState {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return PromptState::Cancelled,
            KeyCode::Char('g') | KeyCode::Char('c') if ctrl => return PromptState::Cancelled,
            KeyCode::Enter => return PromptState::Submitted(self.input.value().to_string()),
            _ => {}
        }

        let before = self.input.clone();
        self.input.handle_event(&Event::Key(key));
        if self.input.value().chars().count() > self.max_len {
            self.input = before;
        }
        PromptState::Pending
    }
}
