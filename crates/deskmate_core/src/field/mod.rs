//! Field validators used by every data-entry path.
//!
//! # Responsibility
//! - Turn one raw user string into a canonical typed value.
//! - Report user-facing validation failures without side effects.
//!
//! # Invariants
//! - Validation is pure: the same input always yields the same outcome.
//! - Returned text values are trimmed.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Date layout accepted and printed for birthdays and reminders.
pub const DATE_FORMAT: &str = "%d.%m.%Y";

const PHONE_DIGITS: usize = 10;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][\w.\-]*@[\w\-]+(\.[\w\-]+)*\.[a-z]{2,}$").expect("valid email regex")
});

/// Kind of value a prompt or positional argument expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Contact key: one whitespace-free word.
    Name,
    /// Note key: free text, must not be blank.
    Topic,
    /// Free text, may be anything.
    Text,
    /// Exactly ten digits.
    Phone,
    Email,
    /// `DD.MM.YYYY` calendar date.
    Date,
    Address,
    /// Whitespace separated tags, `#` prefix optional.
    Tags,
    Number,
    YesNo,
}

/// Canonical value produced by a successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
    Tags(Vec<String>),
    Number(i64),
    Flag(bool),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(value) => Some(*value),
            _ => None,
        }
    }

    pub fn into_tags(self) -> Option<Vec<String>> {
        match self {
            Self::Tags(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Flag(value) => Some(*value),
            _ => None,
        }
    }
}

impl FieldKind {
    /// Validates `raw` and returns its canonical value.
    ///
    /// # Errors
    /// - `FieldError::Empty` when a non-text field is blank.
    /// - A kind-specific variant when the value is malformed.
    pub fn parse(self, raw: &str) -> Result<FieldValue, FieldError> {
        let value = raw.trim();
        if value.is_empty() && !matches!(self, Self::Text | Self::Address) {
            return Err(FieldError::Empty);
        }

        match self {
            Self::Name => {
                if value.split_whitespace().count() != 1 {
                    return Err(FieldError::InvalidName(value.to_string()));
                }
                Ok(FieldValue::Text(value.to_string()))
            }
            Self::Topic | Self::Text | Self::Address => Ok(FieldValue::Text(value.to_string())),
            Self::Phone => {
                if value.len() == PHONE_DIGITS && value.chars().all(|c| c.is_ascii_digit()) {
                    Ok(FieldValue::Text(value.to_string()))
                } else {
                    Err(FieldError::InvalidPhone(value.to_string()))
                }
            }
            Self::Email => {
                let lowered = value.to_lowercase();
                if EMAIL_RE.is_match(&lowered) {
                    Ok(FieldValue::Text(lowered))
                } else {
                    Err(FieldError::InvalidEmail(value.to_string()))
                }
            }
            Self::Date => parse_date(value).map(FieldValue::Date),
            Self::Tags => {
                let tags = normalize_tags(value.split_whitespace());
                if tags.is_empty() {
                    return Err(FieldError::InvalidTags(value.to_string()));
                }
                Ok(FieldValue::Tags(tags))
            }
            Self::Number => value
                .parse::<i64>()
                .map(FieldValue::Number)
                .map_err(|_| FieldError::InvalidNumber(value.to_string())),
            Self::YesNo => match value.to_ascii_lowercase().as_str() {
                "y" | "yes" | "true" | "1" => Ok(FieldValue::Flag(true)),
                "n" | "no" | "false" | "0" => Ok(FieldValue::Flag(false)),
                _ => Err(FieldError::InvalidFlag(value.to_string())),
            },
        }
    }
}

/// Parses a `DD.MM.YYYY` date.
pub fn parse_date(value: &str) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|_| FieldError::InvalidDate(value.trim().to_string()))
}

/// Formats a date the same way it is entered.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Lowercases, strips leading `#`, drops blanks and deduplicates tags.
///
/// Output is sorted by name.
pub fn normalize_tags<'a>(raw: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    raw.into_iter()
        .map(|tag| tag.trim().trim_start_matches('#').to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// User-facing validation failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    Empty,
    InvalidName(String),
    InvalidPhone(String),
    InvalidEmail(String),
    InvalidDate(String),
    InvalidTags(String),
    InvalidNumber(String),
    InvalidFlag(String),
}

impl Display for FieldError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "This field can not be empty"),
            Self::InvalidName(_) => write!(f, "Invalid name format (expecting a single word)"),
            Self::InvalidPhone(_) => {
                write!(f, "Invalid phone number format (expecting 10 digits)")
            }
            Self::InvalidEmail(_) => write!(f, "Invalid email format"),
            Self::InvalidDate(_) => write!(f, "Invalid date format (DD.MM.YYYY)"),
            Self::InvalidTags(_) => write!(f, "Tags must contain at least one word"),
            Self::InvalidNumber(value) => write!(f, "Invalid number: {value}"),
            Self::InvalidFlag(_) => write!(f, "Expecting yes or no"),
        }
    }
}

impl Error for FieldError {}

#[cfg(test)]
mod tests {
    use super::{format_date, normalize_tags, FieldError, FieldKind, FieldValue};
    use chrono::NaiveDate;

    #[test]
    fn name_must_be_a_single_word() {
        assert_eq!(
            FieldKind::Name.parse("  Alice ").unwrap(),
            FieldValue::Text("Alice".to_string())
        );
        assert!(matches!(
            FieldKind::Name.parse("Alice Smith"),
            Err(FieldError::InvalidName(_))
        ));
        assert_eq!(FieldKind::Name.parse("   "), Err(FieldError::Empty));
    }

    #[test]
    fn phone_requires_exactly_ten_digits() {
        assert!(FieldKind::Phone.parse("0123456789").is_ok());
        assert!(FieldKind::Phone.parse("012345678").is_err());
        assert!(FieldKind::Phone.parse("01234567890").is_err());
        assert!(FieldKind::Phone.parse("01234s6789").is_err());
    }

    #[test]
    fn email_is_lowercased_and_checked() {
        assert_eq!(
            FieldKind::Email.parse("Bob.Smith@Example.com").unwrap(),
            FieldValue::Text("bob.smith@example.com".to_string())
        );
        assert!(FieldKind::Email.parse("bob@").is_err());
        assert!(FieldKind::Email.parse("1bob@example.com").is_err());
        assert!(FieldKind::Email.parse("bob@example.c").is_err());
    }

    #[test]
    fn date_uses_day_month_year_layout() {
        let parsed = FieldKind::Date.parse("29.02.2024").unwrap();
        let expected = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(parsed, FieldValue::Date(expected));
        assert_eq!(format_date(expected), "29.02.2024");
        assert!(FieldKind::Date.parse("29.02.2023").is_err());
        assert!(FieldKind::Date.parse("2024-02-01").is_err());
    }

    #[test]
    fn tags_strip_hash_and_deduplicate() {
        assert_eq!(
            normalize_tags(["#Work", "work", "##home", " "]),
            vec!["home".to_string(), "work".to_string()]
        );
        assert!(matches!(
            FieldKind::Tags.parse("# ##"),
            Err(FieldError::InvalidTags(_))
        ));
    }

    #[test]
    fn text_and_address_accept_blank_values() {
        assert_eq!(
            FieldKind::Text.parse("  ").unwrap(),
            FieldValue::Text(String::new())
        );
        assert!(FieldKind::Topic.parse(" ").is_err());
    }

    #[test]
    fn yes_no_and_number_parse() {
        assert_eq!(FieldKind::YesNo.parse("Yes").unwrap(), FieldValue::Flag(true));
        assert_eq!(FieldKind::YesNo.parse("n").unwrap(), FieldValue::Flag(false));
        assert!(FieldKind::YesNo.parse("maybe").is_err());
        assert_eq!(FieldKind::Number.parse(" 42 ").unwrap(), FieldValue::Number(42));
        assert!(FieldKind::Number.parse("4x").is_err());
    }
}
