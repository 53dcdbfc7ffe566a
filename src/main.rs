mod config;
mod db;
mod emails;
mod fields;
mod record;
mod search;
mod store;
mod ui;
mod undo;

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use config::Config;
use db::Database;
use fields::{Field, MAX_EMAILS, MAX_EMAIL_LEN, MAX_FIELD_LEN};
use record::Record;
use store::{AddressBook, RecordStore};

#[derive(Parser, Debug)]
#[command(name = "rlabook", version, about = "Terminal address book")]
struct Cli {
    /// Configuration file (default: <config dir>/rlabook/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Address book database, overrides `db_path` from the configuration
    #[arg(long, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the editor on the contact at INDEX
    Edit(EditArgs),
    /// Add a contact, interactively unless --name is given
    Add(AddArgs),
    /// Print every contact as index, name and first e-mail address
    List,
    /// Query contacts for email addresses (abook-compatible output for aerc/mutt)
    Query(QueryArgs),
}

#[derive(Args, Debug)]
struct EditArgs {
    index: usize,
}

#[derive(Args, Debug)]
struct AddArgs {
    #[arg(long)]
    name: Option<String>,

    /// May be repeated
    #[arg(long = "email", value_name = "ADDR", requires = "name")]
    emails: Vec<String>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    /// Search term (matches name, email, nickname)
    query: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = config::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        config.db_path = db;
    }
    init_logging(&config)?;

    let mut db = Database::open(&config.db_path)?;
    let mut book = db.load()?;
    info!(db = %db.path().display(), count = book.len(), "opened address book");

    match cli.command {
        Some(Command::List) => handle_list(&book),
        Some(Command::Query(args)) => handle_query(&book, &args),
        Some(Command::Add(args)) => {
            if let Some(name) = args.name {
                let index = add_contact(&mut book, &name, &args.emails)?;
                db.save(&book)?;
                println!("Added contact {index}: {}", name.trim());
            } else {
                let created = ui::app::App::new(&mut book, &config).add()?;
                if created.is_some() {
                    db.save(&book)?;
                }
            }
            Ok(())
        }
        Some(Command::Edit(args)) => {
            let index = book.checked_index(args.index)?;
            ui::app::App::new(&mut book, &config).edit(index)?;
            db.save(&book)
        }
        None => {
            let empty = book.is_empty();
            let mut app = ui::app::App::new(&mut book, &config);
            if empty {
                if app.add()?.is_none() {
                    return Ok(());
                }
            } else {
                app.edit(0)?;
            }
            db.save(&book)
        }
    }
}

fn init_logging(config: &Config) -> Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create log dir: {}", parent.display()))?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    let log_level = match config.log_level.as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!("warning: unknown log_level \"{other}\", using info");
            Level::INFO
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }

    info!(config = ?config.config_path, "starting rlabook");
    Ok(())
}

fn handle_list(book: &AddressBook) -> Result<()> {
    for (index, record) in book.records().iter().enumerate() {
        println!(
            "{}\t{}\t{}",
            index,
            record.name(),
            emails::first_email(record).unwrap_or_default()
        );
    }
    Ok(())
}

fn handle_query(book: &AddressBook, args: &QueryArgs) -> Result<()> {
    let results = store::query_emails(book, &args.query);

    // Header line (abook-compatible, ignored by mutt/aerc)
    if results.is_empty() {
        println!("No matches for \"{}\"", args.query);
    } else {
        println!(
            "Found {} contact(s) matching \"{}\"",
            results.len(),
            args.query
        );
    }

    // Results: email<TAB>name<TAB>notes (abook mutt-query format)
    for r in results {
        println!(
            "{}\t{}\t{}",
            r.email,
            r.name,
            r.notes.as_deref().unwrap_or(" ")
        );
    }

    Ok(())
}

fn add_contact(book: &mut AddressBook, name: &str, addresses: &[String]) -> Result<usize> {
    let name: String = name.trim().chars().take(MAX_FIELD_LEN).collect();
    if name.is_empty() {
        bail!("contact name must not be empty");
    }

    let cleaned: Vec<String> = addresses
        .iter()
        .map(|a| emails::sanitize_address(a.trim()))
        .map(|a| a.chars().take(MAX_EMAIL_LEN).collect::<String>())
        .filter(|a| !a.is_empty())
        .collect();
    if cleaned.len() > MAX_EMAILS {
        eprintln!(
            "warning: only the first {} e-mail addresses are kept",
            MAX_EMAILS
        );
    }

    let mut record = Record::with_name(name);
    let kept = &cleaned[..cleaned.len().min(MAX_EMAILS)];
    record.set(Field::Email, Some(emails::encode_emails(kept)));
    Ok(book.append(record))
}
