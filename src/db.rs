use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::{debug, info, warn};

use crate::fields::Field;
use crate::record::Record;
use crate::store::{AddressBook, RecordStore};

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create data dir: {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {}", path.display()))?;

        let mut db = Self {
            conn,
            path: path.to_path_buf(),
        };
        db.setup()?;
        Ok(db)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn setup(&mut self) -> Result<()> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "FULL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;

        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS records (
              idx INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS fields (
              record INTEGER NOT NULL REFERENCES records(idx) ON DELETE CASCADE,
              field  TEXT NOT NULL,
              value  TEXT NOT NULL,
              PRIMARY KEY (record, field)
            );
        "#,
        )?;
        Ok(())
    }

    /// Read every record, in stored order
    pub fn load(&self) -> Result<AddressBook> {
        let mut records: Vec<Record> = {
            let mut stmt = self.conn.prepare("SELECT idx FROM records ORDER BY idx")?;
            let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
            let mut out = Vec::new();
            for row in rows {
                row?;
                out.push(Record::new());
            }
            out
        };

        let mut stmt = self.conn.prepare(
            r#"SELECT r.rank, f.field, f.value
               FROM fields f
               JOIN (SELECT idx, ROW_NUMBER() OVER (ORDER BY idx) - 1 AS rank FROM records) r
                 ON r.idx = f.record"#,
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (rank, key, value) = row?;
            let Some(field) = Field::from_key(&key) else {
                warn!(field = %key, "skipping unknown field in database");
                continue;
            };
            let Some(record) = usize::try_from(rank).ok().and_then(|i| records.get_mut(i)) else {
                continue;
            };
            record.set(field, Some(value));
        }

        info!(path = %self.path.display(), count = records.len(), "loaded address book");
        Ok(AddressBook::from_records(records))
    }

    /// Replace the stored address book with `book`
    pub fn save(&mut self, book: &AddressBook) -> Result<()> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute("DELETE FROM fields", [])?;
        tx.execute("DELETE FROM records", [])?;

        {
            let mut insert_record = tx.prepare("INSERT INTO records (idx) VALUES (?1)")?;
            let mut insert_field =
                tx.prepare("INSERT INTO fields (record, field, value) VALUES (?1, ?2, ?3)")?;

            for (idx, record) in book.records().iter().enumerate() {
                let idx = idx as i64;
                insert_record.execute(params![idx])?;
                for (field, value) in record.values() {
                    insert_field.execute(params![idx, field.descriptor().key, value])?;
                }
            }
        }

        tx.commit()
            .with_context(|| format!("failed to save {}", self.path.display()))?;
        debug!(count = book.len(), "saved address book");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_then_load_keeps_order_and_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("contacts.db");

        let mut ada = Record::with_name("Ada");
        ada.set(Field::Email, Some("ada@example.org,ada@work.example".into()));
        ada.set(Field::Custom3, Some("likes engines".into()));
        let bob = Record::with_name("Bob");
        let book = AddressBook::from_records(vec![ada, bob]);

        let mut db = Database::open(&path).unwrap();
        db.save(&book).unwrap();
        drop(db);

        let db = Database::open(&path).unwrap();
        let loaded = db.load().unwrap();
        assert_eq!(loaded, book);
    }

    #[test]
    fn test_save_replaces_previous_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.db");
        let mut db = Database::open(&path).unwrap();

        db.save(&AddressBook::from_records(vec![
            Record::with_name("One"),
            Record::with_name("Two"),
        ]))
        .unwrap();
        db.save(&AddressBook::from_records(vec![Record::with_name("Only")]))
            .unwrap();

        let loaded = db.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0].name(), "Only");
    }

    #[test]
    fn test_unknown_fields_are_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("contacts.db");
        let db = Database::open(&path).unwrap();
        db.conn
            .execute_batch(
                "INSERT INTO records (idx) VALUES (5);
                 INSERT INTO fields (record, field, value) VALUES (5, 'name', 'Eve');
                 INSERT INTO fields (record, field, value) VALUES (5, 'pager', '123');",
            )
            .unwrap();

        let loaded = db.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.records()[0], Record::with_name("Eve"));
    }
}
