use std::io::{stdout, Stdout};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;
use tracing::{info, warn};

use crate::config::{CommandExec, Config, UiColors};
use crate::fields::Tab;
use crate::record::Record;
use crate::store::{AddressBook, RecordStore};

use super::draw::{self, Screen};
use super::edit::{InlineEditor, LineInput, PromptState};
use super::keymap::{HelpEntry, Keymap};
use super::launch;
use super::session::{self, Action, Cursor, EditorView, Outcome, Session};

type Tui = Terminal<CrosstermBackend<Stdout>>;

/// Terminal driver for the record editor
pub struct App<'a> {
    book: &'a mut AddressBook,
    config: &'a Config,
    keymap: Keymap,
    help: Vec<HelpEntry>,
    status: Option<String>,
    /// Tab survives between editor sessions
    tab: Tab,
}

impl<'a> App<'a> {
    pub fn new(book: &'a mut AddressBook, config: &'a Config) -> Self {
        let keymap = Keymap::new(config.keys.clone());
        let help = keymap.help_entries();
        Self {
            book,
            config,
            keymap,
            help,
            status: None,
            tab: Tab::Contact,
        }
    }

    /// Edit the record at `index`; returns the index the user left on.
    pub fn edit(&mut self, index: usize) -> Result<usize> {
        let session = Session::open(&*self.book, index, self.tab)?;
        self.with_terminal(|app, terminal| app.session_loop(terminal, session))
    }

    /// Prompt for a name, append the new contact and open it.
    pub fn add(&mut self) -> Result<Option<usize>> {
        self.with_terminal(|app, terminal| {
            let config = app.config;
            let view = app.blank_view();
            let mut prompt = TerminalPrompt::new(terminal, &view, &config.ui.colors);
            let created = Session::create(&mut *app.book, &mut prompt);
            prompt.finish()?;

            let Some(index) = created else {
                info!("new contact cancelled");
                return Ok(None);
            };
            let session = Session::open(&*app.book, index, Tab::Contact)?;
            app.session_loop(terminal, session).map(Some)
        })
    }

    fn with_terminal<T, F>(&mut self, run: F) -> Result<T>
    where
        F: FnOnce(&mut Self, &mut Tui) -> Result<T>,
    {
        enable_raw_mode()?;
        let mut stdout = stdout();
        stdout.execute(EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        terminal.clear()?;

        let result = run(self, &mut terminal);

        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        result
    }

    fn blank_view(&self) -> EditorView {
        EditorView {
            cursor: Cursor {
                index: self.book.len(),
                tab: Tab::Contact,
            },
            total: self.book.len() + 1,
            header: "New contact".to_string(),
            rows: session::rows(&Record::new(), Tab::Contact),
            can_undo: false,
        }
    }

    fn session_loop(&mut self, terminal: &mut Tui, mut session: Session) -> Result<usize> {
        let config = self.config;
        let mut show_help = false;

        loop {
            let view = session.view(&*self.book);
            let screen = Screen {
                view: &view,
                colors: &config.ui.colors,
                status: self.status.as_deref(),
                prompt: None,
                help: show_help.then_some(self.help.as_slice()),
            };
            draw::render(terminal, &screen)?;

            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if show_help {
                show_help = false;
                continue;
            }

            let action = if is_interrupt(&key) {
                Some(Action::Quit)
            } else {
                self.keymap.resolve(&key)
            };
            let Some(action) = action else {
                continue;
            };
            self.status = None;

            let mut prompt = TerminalPrompt::new(terminal, &view, &config.ui.colors);
            let outcome = session.step(&mut *self.book, &mut prompt, action);
            prompt.finish()?;
            if let Some(notice) = session.take_notice() {
                self.set_status(notice);
            }

            match outcome {
                Outcome::Continue => {}
                Outcome::Redraw => terminal.clear()?,
                Outcome::Help => show_help = true,
                Outcome::LaunchMail(index) => self.launch_mail(terminal, index)?,
                Outcome::LaunchBrowser(index) => self.launch_browser(terminal, index)?,
                Outcome::Quit => break,
            }
        }

        let cursor = session.close();
        self.tab = cursor.tab;
        Ok(cursor.index)
    }

    fn launch_mail(&mut self, terminal: &mut Tui, index: usize) -> Result<()> {
        let Some(target) = self.book.get(index).and_then(launch::mail_target) else {
            self.set_status("No e-mail address");
            return Ok(());
        };
        let Some(command) = self.config.commands.mail.clone() else {
            self.set_status("No mail command configured");
            return Ok(());
        };
        self.run_suspended(terminal, &command, &target)
    }

    fn launch_browser(&mut self, terminal: &mut Tui, index: usize) -> Result<()> {
        let Some(url) = self
            .book
            .get(index)
            .and_then(launch::browser_target)
            .map(str::to_string)
        else {
            self.set_status("No URL");
            return Ok(());
        };
        let Some(command) = self.config.commands.browser.clone() else {
            self.set_status("No browser command configured");
            return Ok(());
        };
        self.run_suspended(terminal, &command, &url)
    }

    /// Hand the terminal to a child process, then take it back and repaint.
    fn run_suspended(&mut self, terminal: &mut Tui, command: &CommandExec, argument: &str) -> Result<()> {
        disable_raw_mode()?;
        terminal.backend_mut().execute(LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        let result = launch::run_external(command, argument);

        enable_raw_mode()?;
        terminal.backend_mut().execute(EnterAlternateScreen)?;
        terminal.clear()?;

        if let Err(err) = result {
            warn!(error = %err, "external command failed");
            self.set_status(format!("{err:#}"));
        }
        Ok(())
    }

    fn set_status<S: Into<String>>(&mut self, message: S) {
        self.status = Some(message.into());
    }
}

/// Ctrl+C always leaves the editor
fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
}

/// Reads a line in the footer while the record stays on screen
struct TerminalPrompt<'t, B: Backend> {
    terminal: &'t mut Terminal<B>,
    view: &'t EditorView,
    colors: &'t UiColors,
    error: Option<anyhow::Error>,
}

impl<'t, B: Backend> TerminalPrompt<'t, B> {
    fn new(terminal: &'t mut Terminal<B>, view: &'t EditorView, colors: &'t UiColors) -> Self {
        Self {
            terminal,
            view,
            colors,
            error: None,
        }
    }

    /// Surface a terminal error hit while prompting
    fn finish(self) -> Result<()> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn next_key(&mut self, editor: &InlineEditor) -> Result<KeyEvent> {
        loop {
            let screen = Screen {
                view: self.view,
                colors: self.colors,
                status: None,
                prompt: Some(editor),
                help: None,
            };
            draw::render(self.terminal, &screen)?;

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return Ok(key);
                }
            }
        }
    }
}

impl<B: Backend> LineInput for TerminalPrompt<'_, B> {
    fn read_line(&mut self, prompt: &str, initial: &str, max_len: usize) -> Option<String> {
        if self.error.is_some() {
            return None;
        }

        let mut editor = InlineEditor::start(prompt, initial, max_len);
        loop {
            let key = match self.next_key(&editor) {
                Ok(key) => key,
                Err(err) => {
                    self.error = Some(err);
                    return None;
                }
            };
            match editor.handle_key_event(key) {
                PromptState::Pending => {}
                PromptState::Submitted(value) => return Some(value),
                PromptState::Cancelled => return None,
            }
        }
    }
}
