use crate::fields::{Field, ITEM_FIELDS};

/// One contact: an optional value per catalog field.
///
/// Values are either absent or non-empty; `set` folds empty strings into
/// `None` so callers never have to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    slots: [Option<String>; ITEM_FIELDS],
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        let mut record = Self::new();
        record.set(Field::Name, Some(name.into()));
        record
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.slots[field.index()].as_deref()
    }

    pub fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        &mut self.slots[field.index()]
    }

    pub fn set(&mut self, field: Field, value: Option<String>) {
        self.slots[field.index()] = value.filter(|v| !v.is_empty());
    }

    pub fn name(&self) -> &str {
        self.get(Field::Name).unwrap_or_default()
    }

    /// Iterate over the fields that hold a value
    pub fn values(&self) -> impl Iterator<Item = (Field, &str)> {
        crate::fields::FIELDS
            .iter()
            .zip(self.slots.iter())
            .filter_map(|(desc, slot)| slot.as_deref().map(|v| (desc.field, v)))
    }
}
