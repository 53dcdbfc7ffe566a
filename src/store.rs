use thiserror::Error;

use crate::emails;
use crate::fields::Field;
use crate::record::Record;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no contact at index {index} (address book has {len})")]
    InvalidIndex { index: usize, len: usize },
}

/// Ordered, randomly indexable collection of records the editor borrows.
pub trait RecordStore {
    fn len(&self) -> usize;

    fn get(&self, index: usize) -> Option<&Record>;

    fn get_mut(&mut self, index: usize) -> Option<&mut Record>;

    /// Append a record and return its index
    fn append(&mut self, record: Record) -> usize;

    fn is_valid_index(&self, index: usize) -> bool {
        index < self.len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressBook {
    records: Vec<Record>,
}

impl AddressBook {
    pub fn from_records(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn checked_index(&self, index: usize) -> Result<usize, StoreError> {
        if self.is_valid_index(index) {
            Ok(index)
        } else {
            Err(StoreError::InvalidIndex {
                index,
                len: self.records.len(),
            })
        }
    }
}

impl RecordStore for AddressBook {
    fn len(&self) -> usize {
        self.records.len()
    }

    fn get(&self, index: usize) -> Option<&Record> {
        self.records.get(index)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut Record> {
        self.records.get_mut(index)
    }

    fn append(&mut self, record: Record) -> usize {
        self.records.push(record);
        self.records.len() - 1
    }
}

/// A row in `query` output (abook/mutt query format)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryResult {
    pub email: String,
    pub name: String,
    pub notes: Option<String>,
}

/// Find addresses whose contact name, email or nickname contains `term`.
pub fn query_emails(book: &AddressBook, term: &str) -> Vec<QueryResult> {
    let Some(needle) = crate::search::normalize_query(term) else {
        return Vec::new();
    };

    let mut results = Vec::new();
    for record in book.records() {
        let haystacks = [Field::Name, Field::Email, Field::Nick]
            .into_iter()
            .filter_map(|field| record.get(field));
        let matched = haystacks
            .map(crate::search::normalize)
            .any(|value| value.contains(&needle));
        if !matched {
            continue;
        }
        for email in emails::decode_emails(record).into_iter().filter(|e| !e.is_empty()) {
            results.push(QueryResult {
                email,
                name: record.name().to_string(),
                notes: record.get(Field::Notes).map(str::to_string),
            });
        }
    }
    results
}
