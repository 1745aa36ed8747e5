use crate::command::CommandError;
use crate::field::{format_date, normalize_tags};
use crate::schedule::AnnualEvent;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type NoteId = Uuid;
pub type NotesResult<T> = Result<T, NotesError>;

/// One note in the notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub topic: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Date recurring every year.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<NaiveDate>,
}

impl Note {
    /// Creates a note with a fresh id.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            topic: topic.into(),
            text: String::new(),
            tags: Vec::new(),
            reminder: None,
        }
    }

    pub fn set_tags(&mut self, tags: &[String]) {
        self.tags = normalize_tags(tags.iter().map(String::as_str));
    }

    pub fn card_lines(&self) -> Vec<String> {
        let mut lines = vec![format!("Topic: {}", self.topic)];
        if !self.text.is_empty() {
            lines.push(format!("Text: {}", self.text));
        }
        if !self.tags.is_empty() {
            lines.push(format!("Tags: {}", hashtags(&self.tags)));
        }
        if let Some(reminder) = self.reminder {
            lines.push(format!("Reminder: {}", format_date(reminder)));
        }
        lines
    }

    fn matches(&self, needle: &str) -> bool {
        self.topic.to_lowercase().contains(needle)
            || self.text.to_lowercase().contains(needle)
            || self.tags.iter().any(|tag| tag.contains(needle))
    }
}

impl Display for Note {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.card_lines().join("; "))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesError {
    NotFound(String),
    AlreadyExists(String),
    Empty,
    NoMatch(String),
    NoTags,
}

impl Display for NotesError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(topic) => write!(f, "Note '{topic}' not found"),
            Self::AlreadyExists(topic) => write!(f, "Note '{topic}' already exists"),
            Self::Empty => write!(f, "Notes list is empty"),
            Self::NoMatch(text) => write!(f, "No notes match '{text}'"),
            Self::NoTags => write!(f, "No tags found"),
        }
    }
}

impl Error for NotesError {}

impl From<NotesError> for CommandError {
    fn from(value: NotesError) -> Self {
        Self::User(value.to_string())
    }
}

/// Notes keyed by lower-cased topic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesBook {
    notes: BTreeMap<String, Note>,
}

impl NotesBook {
    pub fn from_records(records: impl IntoIterator<Item = Note>) -> Self {
        let notes = records
            .into_iter()
            .map(|note| (key(&note.topic), note))
            .collect();
        Self { notes }
    }

    /// Records sorted by topic.
    pub fn records(&self) -> impl Iterator<Item = &Note> {
        self.notes.values()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn contains(&self, topic: &str) -> bool {
        self.notes.contains_key(&key(topic))
    }

    pub fn get(&self, topic: &str) -> NotesResult<&Note> {
        self.notes
            .get(&key(topic))
            .ok_or_else(|| NotesError::NotFound(topic.to_string()))
    }

    pub fn get_mut(&mut self, topic: &str) -> NotesResult<&mut Note> {
        self.notes
            .get_mut(&key(topic))
            .ok_or_else(|| NotesError::NotFound(topic.to_string()))
    }

    pub fn add(&mut self, note: Note) -> NotesResult<()> {
        let note_key = key(&note.topic);
        if self.notes.contains_key(&note_key) {
            return Err(NotesError::AlreadyExists(note.topic));
        }
        self.notes.insert(note_key, note);
        Ok(())
    }

    /// Whether `topic` already belongs to a note other than `current`.
    pub fn is_taken_by_other(&self, topic: &str, current: &str) -> bool {
        let topic_key = key(topic);
        topic_key != key(current) && self.notes.contains_key(&topic_key)
    }

    pub fn rename(&mut self, old: &str, new: &str) -> NotesResult<()> {
        let old_key = key(old);
        let new_key = key(new);
        if self.is_taken_by_other(new, old) {
            return Err(NotesError::AlreadyExists(new.to_string()));
        }
        let Some(mut note) = self.notes.remove(&old_key) else {
            return Err(NotesError::NotFound(old.to_string()));
        };
        note.topic = new.trim().to_string();
        self.notes.insert(new_key, note);
        Ok(())
    }

    pub fn delete(&mut self, topic: &str) -> NotesResult<Note> {
        self.notes
            .remove(&key(topic))
            .ok_or_else(|| NotesError::NotFound(topic.to_string()))
    }

    /// Case-insensitive substring search over topic, text and tags.
    pub fn find(&self, text: &str) -> NotesResult<Vec<&Note>> {
        if self.is_empty() {
            return Err(NotesError::Empty);
        }
        let needle = text.trim().to_lowercase();
        let found: Vec<&Note> = self.records().filter(|note| note.matches(&needle)).collect();
        if found.is_empty() {
            return Err(NotesError::NoMatch(text.to_string()));
        }
        Ok(found)
    }

    /// Notes carrying `tag` exactly, after normalization.
    pub fn find_by_tag(&self, tag: &str) -> NotesResult<Vec<&Note>> {
        if self.is_empty() {
            return Err(NotesError::Empty);
        }
        let wanted = normalize_tags(tag.split_whitespace());
        let found: Vec<&Note> = self
            .records()
            .filter(|note| wanted.iter().all(|tag| note.tags.contains(tag)))
            .collect();
        if wanted.is_empty() || found.is_empty() {
            return Err(NotesError::NoMatch(tag.to_string()));
        }
        Ok(found)
    }

    /// Every tag with the number of notes carrying it, sorted by tag.
    pub fn tag_counts(&self) -> NotesResult<BTreeMap<String, usize>> {
        if self.is_empty() {
            return Err(NotesError::Empty);
        }
        let mut counts = BTreeMap::new();
        for tag in self.records().flat_map(|note| note.tags.iter()) {
            *counts.entry(tag.clone()).or_insert(0) += 1;
        }
        if counts.is_empty() {
            return Err(NotesError::NoTags);
        }
        Ok(counts)
    }

    /// Reminders as scheduler input, labeled with the note topic.
    pub fn reminder_events(&self) -> Vec<AnnualEvent> {
        self.records()
            .filter_map(|note| {
                note.reminder
                    .map(|date| AnnualEvent::from_date(note.topic.clone(), date))
            })
            .collect()
    }
}

/// Renders tags the way they are usually typed.
pub(crate) fn hashtags(tags: &[String]) -> String {
    tags.iter()
        .map(|tag| format!("#{tag}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn key(topic: &str) -> String {
    topic.trim().to_lowercase()
}
