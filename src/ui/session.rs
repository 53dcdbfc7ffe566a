//! The record editor as a state machine: one key action in, one outcome out.
//!
//! Terminal concerns stay in `app`; everything here works against a
//! `RecordStore` and a `LineInput`, so it can be driven by tests.

use tracing::debug;

use crate::emails::{self, decode_emails};
use crate::fields::{field_descriptor, fields_in_tab, Field, Tab, MAX_EMAILS, MAX_FIELD_LEN};
use crate::record::Record;
use crate::store::{RecordStore, StoreError};
use crate::ui::edit::{edit_email_slot, edit_field, edit_name_field, edit_record_field, LineInput};
use crate::undo::UndoSlot;

/// Editor commands, already decoded from keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SelectTab(Tab),
    TabPrev,
    TabNext,
    RecordPrev,
    RecordNext,
    Roll,
    Undo,
    Help,
    LaunchMail,
    LaunchBrowser,
    Redraw,
    Quit,
    /// Digit key `1..=9`
    Field(u8),
}

/// What the driver should do after a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Redraw,
    Help,
    LaunchMail(usize),
    LaunchBrowser(usize),
    Quit,
}

/// What a field number refers to on the current tab
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTarget {
    Name,
    Email(usize),
    Field(Field),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub index: usize,
    pub tab: Tab,
}

/// A numbered line on screen
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRow {
    pub number: u8,
    pub label: &'static str,
    pub value: String,
    pub target: EditTarget,
}

/// Everything the drawing code needs, detached from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorView {
    pub cursor: Cursor,
    pub total: usize,
    pub header: String,
    pub rows: Vec<FieldRow>,
    pub can_undo: bool,
}

/// Map a digit on `tab` to the thing it edits.
pub fn resolve_digit(tab: Tab, number: u8) -> Option<EditTarget> {
    let n = usize::from(number);
    if n == 0 {
        return None;
    }
    if tab == Tab::Contact {
        return match n {
            1 => Some(EditTarget::Name),
            n if n - 2 < MAX_EMAILS => Some(EditTarget::Email(n - 2)),
            _ => None,
        };
    }
    fields_in_tab(tab).nth(n - 1).map(EditTarget::Field)
}

pub fn rows(record: &Record, tab: Tab) -> Vec<FieldRow> {
    if tab == Tab::Contact {
        let mut rows = vec![FieldRow {
            number: 1,
            label: Field::Name.descriptor().name,
            value: record.name().to_string(),
            target: EditTarget::Name,
        }];
        for (slot, address) in decode_emails(record).into_iter().enumerate() {
            rows.push(FieldRow {
                number: slot as u8 + 2,
                label: Field::Email.descriptor().name,
                value: address,
                target: EditTarget::Email(slot),
            });
        }
        return rows;
    }

    fields_in_tab(tab)
        .enumerate()
        .map(|(i, field)| FieldRow {
            number: i as u8 + 1,
            label: field_descriptor(field).name,
            value: record.get(field).unwrap_or_default().to_string(),
            target: EditTarget::Field(field),
        })
        .collect()
}

/// "Name <first email>", or just the name
pub fn header(record: &Record) -> String {
    match emails::first_email(record) {
        Some(email) => format!("{} <{}>", record.name(), email),
        None => record.name().to_string(),
    }
}

fn current_record<S>(store: &mut S, index: usize) -> &mut Record
where
    S: RecordStore + ?Sized,
{
    let len = store.len();
    match store.get_mut(index) {
        Some(record) => record,
        None => panic!("editor cursor {index} is outside the address book ({len} records)"),
    }
}

#[derive(Debug)]
pub struct Session {
    cursor: Cursor,
    undo: UndoSlot,
    notice: Option<String>,
}

impl Session {
    pub fn open<S>(store: &S, index: usize, tab: Tab) -> Result<Self, StoreError>
    where
        S: RecordStore + ?Sized,
    {
        if !store.is_valid_index(index) {
            return Err(StoreError::InvalidIndex {
                index,
                len: store.len(),
            });
        }
        debug!(index, "opening editor");
        Ok(Self {
            cursor: Cursor { index, tab },
            undo: UndoSlot::new(),
            notice: None,
        })
    }

    /// Ask for a name and append a new record holding it.
    ///
    /// Cancelling or entering nothing leaves the store untouched.
    pub fn create<S, I>(store: &mut S, input: &mut I) -> Option<usize>
    where
        S: RecordStore + ?Sized,
        I: LineInput + ?Sized,
    {
        let mut name = None;
        if edit_field(input, "Name: ", &mut name, MAX_FIELD_LEN) {
            return None;
        }
        let index = store.append(Record::with_name(name?));
        debug!(index, "created contact");
        Some(index)
    }

    /// Message for the status line produced by the last step
    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn view<S>(&self, store: &S) -> EditorView
    where
        S: RecordStore + ?Sized,
    {
        let record = match store.get(self.cursor.index) {
            Some(record) => record,
            None => panic!(
                "editor cursor {} is outside the address book ({} records)",
                self.cursor.index,
                store.len()
            ),
        };
        EditorView {
            cursor: self.cursor,
            total: store.len(),
            header: header(record),
            rows: rows(record, self.cursor.tab),
            can_undo: self.undo.is_holding(),
        }
    }

    pub fn step<S, I>(&mut self, store: &mut S, input: &mut I, action: Action) -> Outcome
    where
        S: RecordStore + ?Sized,
        I: LineInput + ?Sized,
    {
        match action {
            Action::SelectTab(tab) => self.cursor.tab = tab,
            Action::TabNext => self.cursor.tab = self.cursor.tab.next(),
            Action::TabPrev => self.cursor.tab = self.cursor.tab.prev(),
            Action::RecordPrev => {
                if let Some(prev) = self.cursor.index.checked_sub(1) {
                    self.move_to(store, prev);
                }
            }
            Action::RecordNext => self.move_to(store, self.cursor.index + 1),
            Action::Roll => self.roll(store),
            Action::Undo => self.undo(store),
            Action::Field(number) => self.edit(store, input, number),
            Action::Help => return Outcome::Help,
            Action::LaunchMail => return Outcome::LaunchMail(self.cursor.index),
            Action::LaunchBrowser => return Outcome::LaunchBrowser(self.cursor.index),
            Action::Redraw => return Outcome::Redraw,
            Action::Quit => return Outcome::Quit,
        }
        Outcome::Continue
    }

    /// End the session, dropping any pending undo state.
    pub fn close(mut self) -> Cursor {
        self.undo.clear();
        debug!(index = self.cursor.index, "closing editor");
        self.cursor
    }

    fn move_to<S>(&mut self, store: &S, index: usize)
    where
        S: RecordStore + ?Sized,
    {
        if index == self.cursor.index || !store.is_valid_index(index) {
            return;
        }
        self.cursor.index = index;
        // a backup of the previous record must never land on this one
        self.undo.clear();
    }

    fn roll<S>(&mut self, store: &mut S)
    where
        S: RecordStore + ?Sized,
    {
        let record = current_record(store, self.cursor.index);
        if emails::address_count(record) < 2 {
            return;
        }
        self.undo.backup(record);
        emails::roll_emails(record);
        debug!(index = self.cursor.index, "rolled e-mail addresses");
    }

    fn undo<S>(&mut self, store: &mut S)
    where
        S: RecordStore + ?Sized,
    {
        let record = current_record(store, self.cursor.index);
        if self.undo.restore(record) {
            debug!(index = self.cursor.index, "undo");
            self.notice = Some("Undone".to_string());
        } else {
            self.notice = Some("Nothing to undo".to_string());
        }
    }

    fn edit<S, I>(&mut self, store: &mut S, input: &mut I, number: u8)
    where
        S: RecordStore + ?Sized,
        I: LineInput + ?Sized,
    {
        let Some(target) = resolve_digit(self.cursor.tab, number) else {
            return;
        };
        let record = current_record(store, self.cursor.index);
        self.undo.backup(record);

        let cancelled = match target {
            EditTarget::Name => edit_name_field(input, record),
            EditTarget::Email(slot) => edit_email_slot(input, record, slot),
            EditTarget::Field(field) => edit_record_field(input, record, field),
        };
        if cancelled {
            self.notice = Some("Cancelled".to_string());
        } else {
            debug!(index = self.cursor.index, ?target, "edited field");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AddressBook;
    use crate::ui::edit::tests::ScriptedInput;

    fn book() -> AddressBook {
        let mut ada = Record::with_name("Ada");
        ada.set(Field::Email, Some("a@x,b@y,c@z".into()));
        ada.set(Field::City, Some("London".into()));
        let mut bob = Record::with_name("Bob");
        bob.set(Field::Url, Some("https://bob.example".into()));
        AddressBook::from_records(vec![ada, bob, Record::with_name("Cy")])
    }

    fn run(
        session: &mut Session,
        store: &mut AddressBook,
        input: &mut ScriptedInput,
        actions: &[Action],
    ) -> Vec<Outcome> {
        actions
            .iter()
            .map(|action| session.step(store, input, *action))
            .collect()
    }

    #[test]
    fn test_open_rejects_invalid_index() {
        let store = book();
        assert_eq!(
            Session::open(&store, 3, Tab::Contact).unwrap_err(),
            StoreError::InvalidIndex { index: 3, len: 3 }
        );
    }

    #[test]
    fn test_record_navigation_clamps() {
        let mut store = book();
        let mut input = ScriptedInput::default();
        let mut session = Session::open(&store, 0, Tab::Contact).unwrap();

        session.step(&mut store, &mut input, Action::RecordPrev);
        assert_eq!(session.cursor.index, 0);

        run(
            &mut session,
            &mut store,
            &mut input,
            &[Action::RecordNext, Action::RecordNext, Action::RecordNext],
        );
        assert_eq!(session.cursor.index, 2);
    }

    #[test]
    fn test_tabs_wrap() {
        let mut store = book();
        let mut input = ScriptedInput::default();
        let mut session = Session::open(&store, 0, Tab::Contact).unwrap();

        session.step(&mut store, &mut input, Action::TabPrev);
        assert_eq!(session.cursor.tab, Tab::Custom);
        session.step(&mut store, &mut input, Action::TabNext);
        assert_eq!(session.cursor.tab, Tab::Contact);
        session.step(&mut store, &mut input, Action::SelectTab(Tab::Phone));
        assert_eq!(session.cursor.tab, Tab::Phone);
    }

    #[test]
    fn test_edit_then_undo_restores() {
        let mut store = book();
        let mut input = ScriptedInput::new([Some("Paris")]);
        let mut session = Session::open(&store, 0, Tab::Address).unwrap();

        // City is the third field on the address tab
        session.step(&mut store, &mut input, Action::Field(3));
        assert_eq!(store.get(0).unwrap().get(Field::City), Some("Paris"));
        assert!(session.undo.is_holding());

        session.step(&mut store, &mut input, Action::Undo);
        assert_eq!(store.get(0).unwrap().get(Field::City), Some("London"));
        assert!(!session.undo.is_holding());

        session.step(&mut store, &mut input, Action::Undo);
        assert_eq!(store.get(0).unwrap().get(Field::City), Some("London"));
        assert_eq!(session.take_notice().as_deref(), Some("Nothing to undo"));
    }

    #[test]
    fn test_cancelled_edit_changes_nothing() {
        let mut store = book();
        let before = store.clone();
        let mut input = ScriptedInput::new([None]);
        let mut session = Session::open(&store, 0, Tab::Address).unwrap();

        session.step(&mut store, &mut input, Action::Field(3));
        assert_eq!(store, before);
        assert_eq!(session.take_notice().as_deref(), Some("Cancelled"));
    }

    #[test]
    fn test_undo_after_cancelled_edit_keeps_committed_value() {
        let mut store = book();
        let mut input = ScriptedInput::new([Some("Paris"), None]);
        let mut session = Session::open(&store, 0, Tab::Address).unwrap();

        session.step(&mut store, &mut input, Action::Field(3));
        session.step(&mut store, &mut input, Action::Field(3));
        assert_eq!(store.get(0).unwrap().get(Field::City), Some("Paris"));

        // the backup was taken right before the cancelled attempt
        session.step(&mut store, &mut input, Action::Undo);
        assert_eq!(store.get(0).unwrap().get(Field::City), Some("Paris"));
    }

    #[test]
    fn test_blank_email_then_roll_is_noop() {
        let mut store = AddressBook::from_records(vec![{
            let mut r = Record::with_name("Ada");
            r.set(Field::Email, Some("a@x".into()));
            r
        }]);
        let mut input = ScriptedInput::new([Some("   ")]);
        let mut session = Session::open(&store, 0, Tab::Contact).unwrap();

        session.step(&mut store, &mut input, Action::Field(3));
        assert_eq!(store.get(0).unwrap().get(Field::Email), Some("a@x"));
        session.undo.clear();

        session.step(&mut store, &mut input, Action::Roll);
        assert_eq!(store.get(0).unwrap().get(Field::Email), Some("a@x"));
        assert!(!session.undo.is_holding());
    }

    #[test]
    fn test_out_of_range_digit_is_ignored() {
        let mut store = book();
        let mut input = ScriptedInput::default();
        let mut session = Session::open(&store, 0, Tab::Contact).unwrap();

        let outcome = session.step(&mut store, &mut input, Action::Field(9));
        assert_eq!(outcome, Outcome::Continue);
        assert!(input.prompts.is_empty());
        assert!(!session.undo.is_holding());
    }

    #[test]
    fn test_navigation_clears_undo() {
        let mut store = book();
        let mut input = ScriptedInput::new([Some("Ada Lovelace")]);
        let mut session = Session::open(&store, 0, Tab::Contact).unwrap();

        session.step(&mut store, &mut input, Action::Field(1));
        session.step(&mut store, &mut input, Action::RecordNext);
        session.step(&mut store, &mut input, Action::Undo);
        assert_eq!(store.get(1).unwrap().name(), "Bob");
        session.step(&mut store, &mut input, Action::RecordPrev);
        assert_eq!(store.get(0).unwrap().name(), "Ada Lovelace");
    }

    #[test]
    fn test_name_cannot_be_blanked() {
        let mut store = book();
        let mut input = ScriptedInput::new([Some("")]);
        let mut session = Session::open(&store, 1, Tab::Contact).unwrap();
        session.step(&mut store, &mut input, Action::Field(1));
        assert_eq!(store.get(1).unwrap().name(), "Bob");
    }

    #[test]
    fn test_roll_and_undo() {
        let mut store = book();
        let mut input = ScriptedInput::default();
        let mut session = Session::open(&store, 0, Tab::Contact).unwrap();

        session.step(&mut store, &mut input, Action::Roll);
        assert_eq!(store.get(0).unwrap().get(Field::Email), Some("b@y,c@z,a@x"));
        session.step(&mut store, &mut input, Action::Undo);
        assert_eq!(store.get(0).unwrap().get(Field::Email), Some("a@x,b@y,c@z"));

        // nothing to roll on a record without addresses
        session.step(&mut store, &mut input, Action::RecordNext);
        session.step(&mut store, &mut input, Action::Roll);
        assert!(!session.undo.is_holding());
        assert_eq!(store.get(1).unwrap().get(Field::Email), None);
    }

    #[test]
    fn test_email_slot_edit_through_session() {
        let mut store = book();
        let mut input = ScriptedInput::new([Some("")]);
        let mut session = Session::open(&store, 0, Tab::Contact).unwrap();

        // key 3 is the second address
        session.step(&mut store, &mut input, Action::Field(3));
        assert_eq!(store.get(0).unwrap().get(Field::Email), Some("a@x,c@z"));
        assert_eq!(input.prompts[0].1, "b@y");
    }

    #[test]
    fn test_launch_and_quit_outcomes() {
        let mut store = book();
        let mut input = ScriptedInput::default();
        let mut session = Session::open(&store, 1, Tab::Other).unwrap();

        let outcomes = run(
            &mut session,
            &mut store,
            &mut input,
            &[
                Action::LaunchMail,
                Action::LaunchBrowser,
                Action::Help,
                Action::Redraw,
                Action::Quit,
            ],
        );
        assert_eq!(
            outcomes,
            vec![
                Outcome::LaunchMail(1),
                Outcome::LaunchBrowser(1),
                Outcome::Help,
                Outcome::Redraw,
                Outcome::Quit,
            ]
        );
        assert_eq!(session.close(), Cursor { index: 1, tab: Tab::Other });
    }

    #[test]
    fn test_create_appends_named_record() {
        let mut store = book();
        let mut input = ScriptedInput::new([Some("Dora")]);
        assert_eq!(Session::create(&mut store, &mut input), Some(3));
        assert_eq!(store.get(3).unwrap().name(), "Dora");
    }

    #[test]
    fn test_cancelled_or_blank_create_appends_nothing() {
        let mut store = book();
        let mut input = ScriptedInput::new([None, Some("")]);
        assert_eq!(Session::create(&mut store, &mut input), None);
        assert_eq!(Session::create(&mut store, &mut input), None);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_rows_match_digit_resolution() {
        let store = book();
        let record = store.get(0).unwrap();
        for tab in Tab::ALL {
            for row in rows(record, tab) {
                assert_eq!(resolve_digit(tab, row.number), Some(row.target));
                let field = match row.target {
                    EditTarget::Name => Field::Name,
                    EditTarget::Email(_) => Field::Email,
                    EditTarget::Field(field) => field,
                };
                assert_eq!(field.descriptor().tab, tab);
            }
        }
        assert_eq!(rows(record, Tab::Contact).len(), 1 + MAX_EMAILS);
        assert_eq!(resolve_digit(Tab::Contact, 6), None);
    }

    #[test]
    fn test_header() {
        let store = book();
        assert_eq!(header(store.get(0).unwrap()), "Ada <a@x>");
        assert_eq!(header(store.get(1).unwrap()), "Bob");
    }
}
