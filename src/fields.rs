/// Maximum number of addresses packed into the email slot
pub const MAX_EMAILS: usize = 4;

/// Maximum characters for a single email address
pub const MAX_EMAIL_LEN: usize = 79;

/// Maximum characters for any other field
pub const MAX_FIELD_LEN: usize = 80;

pub const ITEM_FIELDS: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tab {
    Contact,
    Address,
    Phone,
    Other,
    Custom,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Contact, Tab::Address, Tab::Phone, Tab::Other, Tab::Custom];

    pub const COUNT: usize = 5;

    pub fn title(self) -> &'static str {
        match self {
            Tab::Contact => "CONTACT",
            Tab::Address => "ADDRESS",
            Tab::Phone => "PHONE",
            Tab::Other => "OTHER",
            Tab::Custom => "CUSTOM",
        }
    }

    pub fn index(self) -> usize {
        match self {
            Tab::Contact => 0,
            Tab::Address => 1,
            Tab::Phone => 2,
            Tab::Other => 3,
            Tab::Custom => 4,
        }
    }

    /// Next tab, wrapping from the last back to the first
    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::COUNT]
    }

    /// Previous tab, wrapping from the first to the last
    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::COUNT - 1) % Self::COUNT]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Address,
    Address2,
    City,
    State,
    Zip,
    Country,
    Phone,
    WorkPhone,
    Fax,
    Mobile,
    Nick,
    Url,
    Notes,
    Anniversary,
    Custom1,
    Custom2,
    Custom3,
    Custom4,
    Custom5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub field: Field,
    /// Label shown in the editor
    pub name: &'static str,
    /// Column name used by the database
    pub key: &'static str,
    pub tab: Tab,
}

const fn desc(field: Field, name: &'static str, key: &'static str, tab: Tab) -> FieldDescriptor {
    FieldDescriptor { field, name, key, tab }
}

/// Every field in declaration order. `Field as usize` indexes this table.
pub static FIELDS: [FieldDescriptor; ITEM_FIELDS] = [
    desc(Field::Name, "Name", "name", Tab::Contact),
    desc(Field::Email, "E-mail", "email", Tab::Contact),
    desc(Field::Address, "Address", "address", Tab::Address),
    desc(Field::Address2, "Address2", "address2", Tab::Address),
    desc(Field::City, "City", "city", Tab::Address),
    desc(Field::State, "State/Province", "state", Tab::Address),
    desc(Field::Zip, "ZIP/Postal Code", "zip", Tab::Address),
    desc(Field::Country, "Country", "country", Tab::Address),
    desc(Field::Phone, "Home Phone", "phone", Tab::Phone),
    desc(Field::WorkPhone, "Work Phone", "workphone", Tab::Phone),
    desc(Field::Fax, "Fax", "fax", Tab::Phone),
    desc(Field::Mobile, "Mobile", "mobile", Tab::Phone),
    desc(Field::Nick, "Nickname/Alias", "nick", Tab::Other),
    desc(Field::Url, "URL", "url", Tab::Other),
    desc(Field::Notes, "Notes", "notes", Tab::Other),
    desc(Field::Anniversary, "Anniversary day", "anniversary", Tab::Other),
    desc(Field::Custom1, "Custom1", "custom1", Tab::Custom),
    desc(Field::Custom2, "Custom2", "custom2", Tab::Custom),
    desc(Field::Custom3, "Custom3", "custom3", Tab::Custom),
    desc(Field::Custom4, "Custom4", "custom4", Tab::Custom),
    desc(Field::Custom5, "Custom5", "custom5", Tab::Custom),
];

impl Field {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn descriptor(self) -> &'static FieldDescriptor {
        &FIELDS[self.index()]
    }

    pub fn max_len(self) -> usize {
        match self {
            Field::Email => MAX_EMAIL_LEN,
            _ => MAX_FIELD_LEN,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        FIELDS
            .iter()
            .find(|d| d.key.eq_ignore_ascii_case(key.trim()))
            .map(|d| d.field)
    }
}

pub fn field_descriptor(field: Field) -> &'static FieldDescriptor {
    field.descriptor()
}

/// Fields grouped under `tab`, in declaration order
pub fn fields_in_tab(tab: Tab) -> impl Iterator<Item = Field> {
    FIELDS.iter().filter(move |d| d.tab == tab).map(|d| d.field)
}
