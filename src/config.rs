use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use directories::BaseDirs;
use serde::de::Deserializer;
use serde::Deserialize;

const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "contacts.db";
const APP_NAME: &str = "rlabook";

#[derive(Debug, Clone)]
pub struct Config {
    /// Where the configuration came from; `None` when running on defaults
    pub config_path: Option<PathBuf>,
    pub db_path: PathBuf,
    pub log_file: Option<PathBuf>,
    pub log_level: String,
    pub keys: EditorKeys,
    pub ui: UiConfig,
    pub commands: Commands,
}

/// Expand ~ to home directory in paths
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = home::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[derive(Debug, Clone)]
pub struct UiConfig {
    pub colors: UiColors,
}

#[derive(Debug, Clone)]
pub struct UiColors {
    pub border: RgbColor,
    pub selection_bg: RgbColor,
    pub selection_fg: RgbColor,
    pub label: RgbColor,
    pub status_fg: RgbColor,
    pub status_bg: RgbColor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone)]
pub struct Commands {
    pub mail: Option<CommandExec>,
    pub browser: Option<CommandExec>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandExec {
    pub program: String,
    pub args: Vec<String>,
}

// =============================================================================
// Key Bindings - multiple bindings per action
// =============================================================================

/// Bindings used inside the record editor
#[derive(Debug, Clone)]
pub struct EditorKeys {
    pub tab_contact: Vec<String>,
    pub tab_address: Vec<String>,
    pub tab_phone: Vec<String>,
    pub tab_other: Vec<String>,
    pub tab_custom: Vec<String>,
    pub tab_next: Vec<String>,
    pub tab_prev: Vec<String>,
    pub record_next: Vec<String>,
    pub record_prev: Vec<String>,
    pub roll: Vec<String>,
    pub undo: Vec<String>,
    pub help: Vec<String>,
    pub mail: Vec<String>,
    pub browser: Vec<String>,
    pub redraw: Vec<String>,
    pub quit: Vec<String>,
}

impl EditorKeys {
    /// (action name, bindings) pairs, in help order
    pub fn actions(&self) -> [(&'static str, &[String]); 16] {
        [
            ("tab_contact", self.tab_contact.as_slice()),
            ("tab_address", self.tab_address.as_slice()),
            ("tab_phone", self.tab_phone.as_slice()),
            ("tab_other", self.tab_other.as_slice()),
            ("tab_custom", self.tab_custom.as_slice()),
            ("tab_next", self.tab_next.as_slice()),
            ("tab_prev", self.tab_prev.as_slice()),
            ("record_next", self.record_next.as_slice()),
            ("record_prev", self.record_prev.as_slice()),
            ("roll", self.roll.as_slice()),
            ("undo", self.undo.as_slice()),
            ("help", self.help.as_slice()),
            ("mail", self.mail.as_slice()),
            ("browser", self.browser.as_slice()),
            ("redraw", self.redraw.as_slice()),
            ("quit", self.quit.as_slice()),
        ]
    }
}

impl Default for EditorKeys {
    fn default() -> Self {
        Self {
            tab_contact: vec!["c".into()],
            tab_address: vec!["a".into()],
            tab_phone: vec!["p".into()],
            tab_other: vec!["o".into()],
            tab_custom: vec!["C".into()],
            tab_next: vec!["l".into(), "Right".into()],
            tab_prev: vec!["h".into(), "Left".into()],
            record_next: vec!["j".into(), "Down".into(), ">".into()],
            record_prev: vec!["k".into(), "Up".into(), "<".into()],
            roll: vec!["r".into()],
            undo: vec!["u".into()],
            help: vec!["?".into(), "F1".into()],
            mail: vec!["m".into()],
            browser: vec!["v".into()],
            redraw: vec!["Ctrl+l".into()],
            quit: vec!["q".into(), "Escape".into()],
        }
    }
}

// =============================================================================
// Serde deserialization types (support both single string and array)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum KeyBinding {
    Single(String),
    Multiple(Vec<String>),
}

impl KeyBinding {
    fn into_vec(self) -> Vec<String> {
        match self {
            KeyBinding::Single(s) => vec![s],
            KeyBinding::Multiple(v) => v,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct KeysFile {
    editor: EditorKeysFile,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct EditorKeysFile {
    tab_contact: KeyBinding,
    tab_address: KeyBinding,
    tab_phone: KeyBinding,
    tab_other: KeyBinding,
    tab_custom: KeyBinding,
    tab_next: KeyBinding,
    tab_prev: KeyBinding,
    record_next: KeyBinding,
    record_prev: KeyBinding,
    roll: KeyBinding,
    undo: KeyBinding,
    help: KeyBinding,
    mail: KeyBinding,
    browser: KeyBinding,
    redraw: KeyBinding,
    quit: KeyBinding,
}

impl Default for EditorKeysFile {
    fn default() -> Self {
        let defaults = EditorKeys::default();
        Self {
            tab_contact: KeyBinding::Multiple(defaults.tab_contact),
            tab_address: KeyBinding::Multiple(defaults.tab_address),
            tab_phone: KeyBinding::Multiple(defaults.tab_phone),
            tab_other: KeyBinding::Multiple(defaults.tab_other),
            tab_custom: KeyBinding::Multiple(defaults.tab_custom),
            tab_next: KeyBinding::Multiple(defaults.tab_next),
            tab_prev: KeyBinding::Multiple(defaults.tab_prev),
            record_next: KeyBinding::Multiple(defaults.record_next),
            record_prev: KeyBinding::Multiple(defaults.record_prev),
            roll: KeyBinding::Multiple(defaults.roll),
            undo: KeyBinding::Multiple(defaults.undo),
            help: KeyBinding::Multiple(defaults.help),
            mail: KeyBinding::Multiple(defaults.mail),
            browser: KeyBinding::Multiple(defaults.browser),
            redraw: KeyBinding::Multiple(defaults.redraw),
            quit: KeyBinding::Multiple(defaults.quit),
        }
    }
}

impl From<EditorKeysFile> for EditorKeys {
    fn from(file: EditorKeysFile) -> Self {
        Self {
            tab_contact: file.tab_contact.into_vec(),
            tab_address: file.tab_address.into_vec(),
            tab_phone: file.tab_phone.into_vec(),
            tab_other: file.tab_other.into_vec(),
            tab_custom: file.tab_custom.into_vec(),
            tab_next: file.tab_next.into_vec(),
            tab_prev: file.tab_prev.into_vec(),
            record_next: file.record_next.into_vec(),
            record_prev: file.record_prev.into_vec(),
            roll: file.roll.into_vec(),
            undo: file.undo.into_vec(),
            help: file.help.into_vec(),
            mail: file.mail.into_vec(),
            browser: file.browser.into_vec(),
            redraw: file.redraw.into_vec(),
            quit: file.quit.into_vec(),
        }
    }
}

// =============================================================================
// Key binding validation
// =============================================================================

/// Normalize a key binding string to a canonical form for collision detection.
/// Single characters preserve case (since 'C' means Shift+c, different from 'c').
/// Multi-character key names are case-insensitive (Enter, ENTER, enter are the same).
fn normalize_binding(binding: &str) -> String {
    let trimmed = binding.trim();
    if trimmed.chars().count() == 1 {
        trimmed.to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

fn validate_key_bindings(keys: &EditorKeys) -> Result<()> {
    let mut seen: HashMap<String, &str> = HashMap::new();

    for (action_name, bindings) in keys.actions() {
        for key in bindings {
            let normalized = normalize_binding(key);
            if normalized.is_empty() {
                continue;
            }
            if normalized.chars().count() == 1
                && normalized.chars().all(|c| c.is_ascii_digit())
            {
                bail!(
                    "key binding '{}' for '{}' in [keys.editor] is reserved for field selection",
                    key,
                    action_name
                );
            }
            if let Some(existing_action) = seen.get(&normalized) {
                bail!(
                    "key binding collision in [keys.editor]: '{}' is bound to both '{}' and '{}'",
                    key,
                    existing_action,
                    action_name
                );
            }
            seen.insert(normalized, action_name);
        }
    }

    Ok(())
}

// =============================================================================
// Config file structure
// =============================================================================

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    db_path: Option<PathBuf>,
    log_file: Option<PathBuf>,
    log_level: Option<String>,
    keys: KeysFile,
    ui: UiFile,
    commands: CommandsFile,
}

fn config_root() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine base directories")?;
    Ok(base.config_dir().join(APP_NAME))
}

fn default_db_path() -> Result<PathBuf> {
    let base = BaseDirs::new().context("unable to determine data directories")?;
    Ok(base.data_dir().join(APP_NAME).join(DB_FILE_NAME))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(config_root()?.join(CONFIG_FILE_NAME))
}

/// Load configuration.
///
/// An explicit path must exist. The default location is optional and
/// falls back to built-in defaults when absent.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("configuration file not found at {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = config_path()?;
            if !path.exists() {
                return from_file(ConfigFile::default(), None);
            }
            path
        }
    };

    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read configuration file at {}", path.display()))?;
    parse(&raw, Some(path))
}

fn parse(raw: &str, path: Option<PathBuf>) -> Result<Config> {
    let shown = path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<inline>".to_string());

    let value: toml::Value =
        toml::from_str(raw).with_context(|| format!("failed to parse {} as TOML", shown))?;

    warn_unknown_keys(&value);

    let cfg_file: ConfigFile = value
        .try_into()
        .with_context(|| format!("failed to deserialize config from {}", shown))?;

    from_file(cfg_file, path)
}

fn from_file(cfg_file: ConfigFile, config_path: Option<PathBuf>) -> Result<Config> {
    let db_path = match cfg_file.db_path {
        Some(path) => expand_tilde(&path),
        None => default_db_path()?,
    };

    let log_level = cfg_file
        .log_level
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("info")
        .to_ascii_lowercase();

    let keys: EditorKeys = cfg_file.keys.editor.into();
    validate_key_bindings(&keys)?;

    Ok(Config {
        config_path,
        db_path,
        log_file: cfg_file.log_file.map(|p| expand_tilde(&p)),
        log_level,
        keys,
        ui: cfg_file.ui.into(),
        commands: cfg_file.commands.into(),
    })
}

// =============================================================================
// Unknown key warnings
// =============================================================================

fn warn_unknown_keys(value: &toml::Value) {
    let Some(table) = value.as_table() else {
        return;
    };

    warn_unknown_in(
        value,
        "",
        &["db_path", "log_file", "log_level", "keys", "ui", "commands"],
    );

    if let Some(keys) = table.get("keys") {
        warn_unknown_in(keys, "keys.", &["editor"]);
        if let Some(editor) = keys.get("editor") {
            let known: Vec<&str> = EditorKeys::default()
                .actions()
                .iter()
                .map(|(name, _)| *name)
                .collect();
            warn_unknown_in(editor, "keys.editor.", &known);
        }
    }

    if let Some(ui) = table.get("ui") {
        warn_unknown_in(ui, "ui.", &["colors"]);
        if let Some(colors) = ui.get("colors") {
            warn_unknown_in(
                colors,
                "ui.colors.",
                &["border", "selection_bg", "selection_fg", "label", "status_fg", "status_bg"],
            );
        }
    }

    if let Some(commands) = table.get("commands") {
        warn_unknown_in(commands, "commands.", &["mail", "browser"]);
    }
}

fn warn_unknown_in(value: &toml::Value, prefix: &str, known: &[&str]) {
    let Some(table) = value.as_table() else {
        return;
    };
    let known_set: HashSet<&str> = known.iter().copied().collect();
    for key in table.keys() {
        if !known_set.contains(key.as_str()) {
            eprintln!("warning: unknown configuration key `{}{}`", prefix, key);
        }
    }
}

// =============================================================================
// UI config
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct UiFile {
    colors: UiColorsFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct UiColorsFile {
    border: RgbColor,
    selection_bg: RgbColor,
    selection_fg: RgbColor,
    label: RgbColor,
    status_fg: RgbColor,
    status_bg: RgbColor,
}

impl Default for UiColorsFile {
    fn default() -> Self {
        Self {
            border: RgbColor::new(255, 165, 0),
            selection_bg: RgbColor::new(255, 165, 0),
            selection_fg: RgbColor::new(0, 0, 0),
            label: RgbColor::new(255, 165, 0),
            status_fg: RgbColor::new(255, 165, 0),
            status_bg: RgbColor::new(0, 0, 0),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        UiFile::default().into()
    }
}

impl From<UiFile> for UiConfig {
    fn from(file: UiFile) -> Self {
        Self {
            colors: UiColors {
                border: file.colors.border,
                selection_bg: file.colors.selection_bg,
                selection_fg: file.colors.selection_fg,
                label: file.colors.label,
                status_fg: file.colors.status_fg,
                status_bg: file.colors.status_bg,
            },
        }
    }
}

// =============================================================================
// Commands config
// =============================================================================

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct CommandsFile {
    mail: Option<CommandDef>,
    browser: Option<CommandDef>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum CommandDef {
    Simple(String),
    List(Vec<String>),
}

impl From<CommandsFile> for Commands {
    fn from(file: CommandsFile) -> Self {
        Self {
            mail: file
                .mail
                .map_or_else(|| Some(CommandExec::program("mutt")), CommandExec::from_def),
            browser: file
                .browser
                .map_or_else(|| Some(CommandExec::program("xdg-open")), CommandExec::from_def),
        }
    }
}

impl CommandExec {
    fn program(program: &str) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
        }
    }

    fn from_def(def: CommandDef) -> Option<Self> {
        match def {
            CommandDef::Simple(cmd) => {
                let trimmed = cmd.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self::program(trimmed))
                }
            }
            CommandDef::List(mut parts) => {
                if parts.is_empty() {
                    return None;
                }
                let program = parts.remove(0);
                Some(Self {
                    program,
                    args: parts,
                })
            }
        }
    }
}

impl RgbColor {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl<'de> serde::Deserialize<'de> for RgbColor {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Helper {
            Array([u8; 3]),
            Map { r: u8, g: u8, b: u8 },
        }

        let helper = Helper::deserialize(deserializer)?;
        let (r, g, b) = match helper {
            Helper::Array(values) => (values[0], values[1], values[2]),
            Helper::Map { r, g, b } => (r, g, b),
        };
        Ok(RgbColor { r, g, b })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("db_path = \"/tmp/book.db\"", None).unwrap();
        assert_eq!(config.db_path, PathBuf::from("/tmp/book.db"));
        assert_eq!(config.log_level, "info");
        assert!(config.log_file.is_none());
        assert_eq!(config.keys.roll, vec!["r".to_string()]);
        assert_eq!(config.commands.mail, Some(CommandExec::program("mutt")));
    }

    #[test]
    fn test_single_and_list_bindings() {
        let raw = r#"
            db_path = "/tmp/book.db"
            [keys.editor]
            roll = "R"
            undo = ["u", "Backspace"]
        "#;
        let config = parse(raw, None).unwrap();
        assert_eq!(config.keys.roll, vec!["R".to_string()]);
        assert_eq!(config.keys.undo, vec!["u".to_string(), "Backspace".to_string()]);
        // untouched actions keep their defaults
        assert_eq!(config.keys.mail, vec!["m".to_string()]);
    }

    #[test]
    fn test_collision_is_rejected() {
        let raw = r#"
            db_path = "/tmp/book.db"
            [keys.editor]
            roll = "u"
        "#;
        let err = parse(raw, None).unwrap_err();
        assert!(err.to_string().contains("collision"), "{err}");
    }

    #[test]
    fn test_case_matters_for_single_characters() {
        // 'c' (contact) and 'C' (custom) are distinct by default
        assert!(validate_key_bindings(&EditorKeys::default()).is_ok());
        assert_ne!(normalize_binding("c"), normalize_binding("C"));
        assert_eq!(normalize_binding("Escape"), normalize_binding("ESCAPE"));
    }

    #[test]
    fn test_digits_are_reserved() {
        let raw = r#"
            db_path = "/tmp/book.db"
            [keys.editor]
            help = "1"
        "#;
        let err = parse(raw, None).unwrap_err();
        assert!(err.to_string().contains("reserved"), "{err}");
    }

    #[test]
    fn test_commands_and_colors() {
        let raw = r#"
            db_path = "/tmp/book.db"
            log_level = "DEBUG"
            [commands]
            mail = ["neomutt", "-F", "/dev/null"]
            browser = ""
            [ui.colors]
            border = [1, 2, 3]
            label = { r = 4, g = 5, b = 6 }
        "#;
        let config = parse(raw, None).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(
            config.commands.mail,
            Some(CommandExec {
                program: "neomutt".into(),
                args: vec!["-F".into(), "/dev/null".into()],
            })
        );
        assert_eq!(config.commands.browser, None);
        assert_eq!(config.ui.colors.border, RgbColor::new(1, 2, 3));
        assert_eq!(config.ui.colors.label, RgbColor::new(4, 5, 6));
        assert_eq!(config.ui.colors.status_bg, RgbColor::new(0, 0, 0));
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/rlabook/config.toml"))).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
