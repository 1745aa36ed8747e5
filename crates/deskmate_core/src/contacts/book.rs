use crate::command::CommandError;
use crate::field::format_date;
use crate::schedule::AnnualEvent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ContactsResult<T> = Result<T, ContactsError>;

/// One person in the contact book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    #[serde(default)]
    pub phones: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Contact {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            phones: Vec::new(),
            email: None,
            birthday: None,
            address: None,
        }
    }

    /// Multi-line card used by `show-contact`.
    pub fn card_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Name: {}", self.name)];
        if !self.phones.is_empty() {
            lines.push(format!("Phones: {}", self.phones.join(", ")));
        }
        if let Some(email) = &self.email {
            lines.push(format!("Email: {email}"));
        }
        if let Some(birthday) = self.birthday {
            lines.push(format!("Birthday: {}", format_date(birthday)));
        }
        if let Some(address) = &self.address {
            lines.push(format!("Address: {address}"));
        }
        lines
    }

    fn matches(&self, needle: &str) -> bool {
        self.name.to_lowercase().contains(needle)
            || self.phones.iter().any(|phone| phone.contains(needle))
            || self
                .email
                .as_deref()
                .is_some_and(|email| email.contains(needle))
            || self
                .address
                .as_deref()
                .is_some_and(|address| address.to_lowercase().contains(needle))
    }
}

impl Display for Contact {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.card_lines().join("; "))
    }
}

/// Contact book failures shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContactsError {
    NotFound(String),
    AlreadyExists(String),
    PhoneExists { name: String, phone: String },
    PhoneNotFound { name: String, phone: String },
    Empty,
    NoMatch(String),
}

impl Display for ContactsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "Contact '{name}' not found"),
            Self::AlreadyExists(name) => write!(f, "Contact '{name}' already exists"),
            Self::PhoneExists { name, phone } => {
                write!(f, "Phone {phone} already exists for '{name}'")
            }
            Self::PhoneNotFound { name, phone } => {
                write!(f, "Phone {phone} not found for '{name}'")
            }
            Self::Empty => write!(f, "Contacts list is empty"),
            Self::NoMatch(text) => write!(f, "No contacts match '{text}'"),
        }
    }
}

impl Error for ContactsError {}

impl From<ContactsError> for CommandError {
    fn from(value: ContactsError) -> Self {
        Self::User(value.to_string())
    }
}

/// Contacts keyed by lower-cased name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactBook {
    contacts: BTreeMap<String, Contact>,
}

impl ContactBook {
    /// Builds a book from stored records; later duplicates replace earlier
    /// ones.
    pub fn from_records(records: impl IntoIterator<Item = Contact>) -> Self {
        let contacts = records
            .into_iter()
            .map(|contact| (key(&contact.name), contact))
            .collect();
        Self { contacts }
    }

    /// Records sorted by name.
    pub fn records(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.values()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.contacts.contains_key(&key(name))
    }

    pub fn get(&self, name: &str) -> ContactsResult<&Contact> {
        self.contacts
            .get(&key(name))
            .ok_or_else(|| ContactsError::NotFound(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> ContactsResult<&mut Contact> {
        self.contacts
            .get_mut(&key(name))
            .ok_or_else(|| ContactsError::NotFound(name.to_string()))
    }

    /// Inserts a new record.
    ///
    /// # Errors
    /// - `AlreadyExists` when the name is taken.
    pub fn add(&mut self, contact: Contact) -> ContactsResult<()> {
        let contact_key = key(&contact.name);
        if self.contacts.contains_key(&contact_key) {
            return Err(ContactsError::AlreadyExists(contact.name));
        }
        self.contacts.insert(contact_key, contact);
        Ok(())
    }

    pub fn add_phone(&mut self, name: &str, phone: &str) -> ContactsResult<()> {
        let contact = self.get_mut(name)?;
        if contact.phones.iter().any(|known| known == phone) {
            return Err(ContactsError::PhoneExists {
                name: contact.name.clone(),
                phone: phone.to_string(),
            });
        }
        contact.phones.push(phone.to_string());
        Ok(())
    }

    pub fn delete_phone(&mut self, name: &str, phone: &str) -> ContactsResult<()> {
        let contact = self.get_mut(name)?;
        let Some(position) = contact.phones.iter().position(|known| known == phone) else {
            return Err(ContactsError::PhoneNotFound {
                name: contact.name.clone(),
                phone: phone.to_string(),
            });
        };
        contact.phones.remove(position);
        Ok(())
    }

    /// Moves a record to a new name. Changing only the letter case is
    /// allowed.
    /// Whether `name` already belongs to a contact other than `current`.
    pub fn is_taken_by_other(&self, name: &str, current: &str) -> bool {
        let name_key = key(name);
        name_key != key(current) && self.contacts.contains_key(&name_key)
    }

    pub fn rename(&mut self, old: &str, new: &str) -> ContactsResult<()> {
        let old_key = key(old);
        let new_key = key(new);
        if !self.contacts.contains_key(&old_key) {
            return Err(ContactsError::NotFound(old.to_string()));
        }
        if self.is_taken_by_other(new, old) {
            return Err(ContactsError::AlreadyExists(new.to_string()));
        }

        let Some(mut contact) = self.contacts.remove(&old_key) else {
            return Err(ContactsError::NotFound(old.to_string()));
        };
        contact.name = new.to_string();
        self.contacts.insert(new_key, contact);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> ContactsResult<Contact> {
        self.contacts
            .remove(&key(name))
            .ok_or_else(|| ContactsError::NotFound(name.to_string()))
    }

    /// Case-insensitive substring search over name, phones, email and
    /// address.
    ///
    /// # Errors
    /// - `Empty` for an empty book, `NoMatch` when nothing matches.
    pub fn find(&self, text: &str) -> ContactsResult<Vec<&Contact>> {
        if self.is_empty() {
            return Err(ContactsError::Empty);
        }
        let needle = text.trim().to_lowercase();
        let found: Vec<&Contact> = self
            .records()
            .filter(|contact| contact.matches(&needle))
            .collect();
        if found.is_empty() {
            return Err(ContactsError::NoMatch(text.to_string()));
        }
        Ok(found)
    }

    /// Birthdays as scheduler input, labeled with the contact name.
    pub fn birthday_events(&self) -> Vec<AnnualEvent> {
        self.records()
            .filter_map(|contact| {
                contact
                    .birthday
                    .map(|date| AnnualEvent::from_date(contact.name.clone(), date))
            })
            .collect()
    }
}

fn key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::{Contact, ContactBook, ContactsError};
    use chrono::NaiveDate;

    fn book() -> ContactBook {
        let mut bob = Contact::new("Bob");
        bob.phones.push("0123456789".to_string());
        bob.email = Some("bob@example.com".to_string());
        bob.birthday = NaiveDate::from_ymd_opt(1990, 3, 10);
        let mut ann = Contact::new("Ann");
        ann.address = Some("Main street 1".to_string());
        ContactBook::from_records([bob, ann])
    }

    #[test]
    fn lookups_ignore_case() {
        let book = book();
        assert!(book.contains("bob"));
        assert_eq!(book.get("BOB").unwrap().name, "Bob");
        assert_eq!(
            book.get("eve"),
            Err(ContactsError::NotFound("eve".to_string()))
        );
    }

    #[test]
    fn add_rejects_existing_name() {
        let mut book = book();
        assert_eq!(
            book.add(Contact::new("ann")),
            Err(ContactsError::AlreadyExists("ann".to_string()))
        );
        book.add(Contact::new("Eve")).unwrap();
        assert_eq!(book.len(), 3);
    }

    #[test]
    fn phones_stay_unique_and_ordered() {
        let mut book = book();
        book.add_phone("bob", "0987654321").unwrap();
        assert!(matches!(
            book.add_phone("bob", "0123456789"),
            Err(ContactsError::PhoneExists { .. })
        ));
        book.delete_phone("bob", "0123456789").unwrap();
        assert_eq!(book.get("bob").unwrap().phones, vec!["0987654321"]);
        assert!(matches!(
            book.delete_phone("bob", "0123456789"),
            Err(ContactsError::PhoneNotFound { .. })
        ));
    }

    #[test]
    fn rename_moves_record_and_guards_targets() {
        let mut book = book();
        assert_eq!(
            book.rename("bob", "ann"),
            Err(ContactsError::AlreadyExists("ann".to_string()))
        );
        book.rename("bob", "BOB").unwrap();
        assert_eq!(book.get("bob").unwrap().name, "BOB");
        book.rename("bob", "Robert").unwrap();
        assert!(!book.contains("bob"));
        assert_eq!(book.get("robert").unwrap().phones, vec!["0123456789"]);
    }

    #[test]
    fn find_searches_every_text_field() {
        let book = book();
        assert_eq!(book.find("EXAMPLE").unwrap()[0].name, "Bob");
        assert_eq!(book.find("main").unwrap()[0].name, "Ann");
        assert_eq!(book.find("4567").unwrap().len(), 1);
        assert_eq!(
            book.find("zzz"),
            Err(ContactsError::NoMatch("zzz".to_string()))
        );
        assert_eq!(ContactBook::default().find("x"), Err(ContactsError::Empty));
    }

    #[test]
    fn only_contacts_with_birthdays_become_events() {
        let events = book().birthday_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].display_text, "Bob");
        assert_eq!((events[0].month, events[0].day), (3, 10));
    }

    #[test]
    fn display_joins_card_lines() {
        let book = book();
        assert_eq!(
            book.get("bob").unwrap().to_string(),
            "Name: Bob; Phones: 0123456789; Email: bob@example.com; Birthday: 10.03.1990"
        );
    }
}
