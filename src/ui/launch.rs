use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::config::CommandExec;
use crate::emails::first_email;
use crate::fields::Field;
use crate::record::Record;

/// Recipient handed to the mail command: "Name <first address>"
pub fn mail_target(record: &Record) -> Option<String> {
    let email = first_email(record)?;
    Some(format!("{} <{}>", record.name(), email))
}

pub fn browser_target(record: &Record) -> Option<&str> {
    record.get(Field::Url)
}

/// Run `command` with `argument` appended, attached to the terminal, and wait for it.
pub fn run_external(command: &CommandExec, argument: &str) -> Result<()> {
    info!(program = %command.program, "launching external command");
    let status = Command::new(&command.program)
        .args(&command.args)
        .arg(argument)
        .status()
        .with_context(|| format!("failed to spawn `{}`", command.program))?;

    if !status.success() {
        bail!("`{}` exited with {}", command.program, status);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mail_target_uses_first_address() {
        let mut record = Record::with_name("Ada Lovelace");
        assert_eq!(mail_target(&record), None);
        record.set(Field::Email, Some(" ada@example.org ,countess@example.org".into()));
        assert_eq!(
            mail_target(&record).as_deref(),
            Some("Ada Lovelace <ada@example.org>")
        );
    }

    #[test]
    fn test_browser_target() {
        let mut record = Record::with_name("Ada");
        assert_eq!(browser_target(&record), None);
        record.set(Field::Url, Some("https://example.org".into()));
        assert_eq!(browser_target(&record), Some("https://example.org"));
    }

    #[cfg(unix)]
    #[test]
    fn test_run_external_reports_failure() {
        let ok = CommandExec {
            program: "true".into(),
            args: Vec::new(),
        };
        assert!(run_external(&ok, "ignored").is_ok());

        let failing = CommandExec {
            program: "false".into(),
            args: Vec::new(),
        };
        let err = run_external(&failing, "ignored").unwrap_err();
        assert!(err.to_string().contains("`false` exited with"));

        let missing = CommandExec {
            program: "rlabook-no-such-program".into(),
            args: Vec::new(),
        };
        assert!(run_external(&missing, "x").is_err());
    }
}
