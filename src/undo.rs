use crate::record::Record;

/// Single-level undo: at most one snapshot of a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum UndoSlot {
    #[default]
    Empty,
    Holding(Record),
}

impl UndoSlot {
    pub fn new() -> Self {
        Self::Empty
    }

    /// Snapshot `record`, replacing (and dropping) any earlier snapshot.
    pub fn backup(&mut self, record: &Record) {
        *self = Self::Holding(record.clone());
    }

    /// Move the snapshot back into `record`. No-op while empty.
    pub fn restore(&mut self, record: &mut Record) -> bool {
        match std::mem::take(self) {
            Self::Holding(snapshot) => {
                *record = snapshot;
                true
            }
            Self::Empty => false,
        }
    }

    pub fn clear(&mut self) {
        *self = Self::Empty;
    }

    pub fn is_holding(&self) -> bool {
        matches!(self, Self::Holding(_))
    }
}
