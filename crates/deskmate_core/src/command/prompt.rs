//! Interactive field-acquisition loop.
//!
//! # Responsibility
//! - Collect an ordered list of typed fields, re-prompting on bad input.
//! - Apply the per-command mandatory-field policy.
//!
//! # Invariants
//! - The returned values are aligned index-for-index with the requests.
//! - A mandatory field is never returned as `None` unless the whole call
//!   fails.
//! - Cancelling a mandatory field fails the command; cancelling an optional
//!   one returns what was collected so far.

use super::context::CommandContext;
use super::outcome::CommandError;
use super::terminal::LineInput;
use crate::field::{FieldError, FieldKind, FieldValue};
use chrono::NaiveDate;
use log::debug;

/// Extra check run after a field validated, e.g. "name must not exist".
pub type Assertion<'a> = Box<dyn Fn(&FieldValue) -> Result<(), String> + 'a>;

/// One prompt in an interactive command.
pub struct FieldRequest<'a> {
    pub kind: FieldKind,
    pub prompt: String,
    pub assertion: Option<Assertion<'a>>,
}

impl<'a> FieldRequest<'a> {
    pub fn new(kind: FieldKind, prompt: impl Into<String>) -> Self {
        Self {
            kind,
            prompt: prompt.into(),
            assertion: None,
        }
    }

    pub fn with_assertion(
        mut self,
        assertion: impl Fn(&FieldValue) -> Result<(), String> + 'a,
    ) -> Self {
        self.assertion = Some(Box::new(assertion));
        self
    }
}

/// Which fields may be left empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPolicy {
    /// The first field must be filled.
    pub mandatory_first_entry: bool,
    /// Every field must be filled; overrides `mandatory_first_entry`.
    pub mandatory_all_entries: bool,
}

impl EntryPolicy {
    /// Only the first field (the record key) is required.
    pub const FIRST_ONLY: Self = Self {
        mandatory_first_entry: true,
        mandatory_all_entries: false,
    };
    pub const ALL: Self = Self {
        mandatory_first_entry: true,
        mandatory_all_entries: true,
    };
    pub const NONE: Self = Self {
        mandatory_first_entry: false,
        mandatory_all_entries: false,
    };

    pub fn is_mandatory(&self, index: usize) -> bool {
        self.mandatory_all_entries || (index == 0 && self.mandatory_first_entry)
    }
}

/// Values collected by `acquire_fields`, one slot per request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Acquired(Vec<Option<FieldValue>>);

impl Acquired {
    pub fn values(&self) -> &[Option<FieldValue>] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<Option<FieldValue>> {
        self.0
    }

    /// Number of slots that received a value.
    pub fn filled(&self) -> usize {
        self.0.iter().filter(|value| value.is_some()).count()
    }

    pub fn text(&self, index: usize) -> Option<String> {
        self.get(index)
            .and_then(FieldValue::as_text)
            .map(str::to_string)
    }

    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        self.get(index).and_then(FieldValue::as_date)
    }

    pub fn tags(&self, index: usize) -> Option<Vec<String>> {
        self.get(index).cloned().and_then(FieldValue::into_tags)
    }

    pub fn number(&self, index: usize) -> Option<i64> {
        self.get(index).and_then(FieldValue::as_number)
    }

    pub fn flag(&self, index: usize) -> Option<bool> {
        self.get(index).and_then(FieldValue::as_flag)
    }

    /// Text of a mandatory slot.
    pub fn require_text(&self, index: usize) -> Result<String, CommandError> {
        self.text(index).ok_or_else(CommandError::interrupted)
    }

    fn get(&self, index: usize) -> Option<&FieldValue> {
        self.0.get(index).and_then(Option::as_ref)
    }
}

impl From<Vec<Option<FieldValue>>> for Acquired {
    fn from(values: Vec<Option<FieldValue>>) -> Self {
        Self(values)
    }
}

/// Prompts for every request in order, honoring `policy`.
///
/// # Errors
/// - `CommandError::User("Command was interrupted")` when the user cancels a
///   mandatory field.
/// - `CommandError::Internal` when the terminal fails.
pub fn acquire_fields(
    ctx: &mut CommandContext<'_>,
    requests: &[FieldRequest<'_>],
    policy: EntryPolicy,
) -> Result<Acquired, CommandError> {
    let mut values: Vec<Option<FieldValue>> = vec![None; requests.len()];

    for (index, request) in requests.iter().enumerate() {
        let mandatory = policy.is_mandatory(index);
        loop {
            let input = match ctx.ask(&request.prompt)? {
                LineInput::Line(line) => line,
                LineInput::Interrupted => {
                    if mandatory {
                        debug!("event=field_prompt module=command status=interrupted index={index}");
                        return Err(CommandError::interrupted());
                    }
                    return Ok(Acquired(values));
                }
            };

            let trimmed = input.trim();
            if trimmed.is_empty() {
                if !mandatory {
                    break;
                }
                ctx.show_error(&FieldError::Empty.to_string())?;
                continue;
            }

            let value = match request.kind.parse(trimmed) {
                Ok(value) => value,
                Err(err) => {
                    ctx.show_error(&err.to_string())?;
                    continue;
                }
            };
            if let Some(assertion) = &request.assertion {
                if let Err(message) = assertion(&value) {
                    ctx.show_error(&message)?;
                    continue;
                }
            }

            values[index] = Some(value);
            break;
        }
    }

    Ok(Acquired(values))
}

/// Collects `requests` from positional `args`, or interactively when there
/// are none.
///
/// Positional values fill the leading requests and go through the same
/// validation and assertions as typed answers. Requests past the given
/// arguments stay empty and must not be mandatory under `policy`.
///
/// # Errors
/// - `CommandError::ArgumentShape` for too many arguments or a missing
///   mandatory one.
/// - `CommandError::User` when a positional value is rejected.
pub fn resolve_fields(
    ctx: &mut CommandContext<'_>,
    args: &[String],
    requests: &[FieldRequest<'_>],
    policy: EntryPolicy,
) -> Result<Acquired, CommandError> {
    if args.is_empty() {
        return acquire_fields(ctx, requests, policy);
    }
    let missing_mandatory = (args.len()..requests.len()).any(|index| policy.is_mandatory(index));
    if args.len() > requests.len() || missing_mandatory {
        return Err(CommandError::ArgumentShape);
    }

    let mut values: Vec<Option<FieldValue>> = vec![None; requests.len()];
    for (index, (request, raw)) in requests.iter().zip(args).enumerate() {
        let value = request.kind.parse(raw)?;
        if let Some(assertion) = &request.assertion {
            assertion(&value).map_err(CommandError::User)?;
        }
        values[index] = Some(value);
    }
    Ok(Acquired(values))
}

/// Free-text search argument: the joined words, or one prompted line.
pub fn search_text(args: &[String], ctx: &mut CommandContext<'_>) -> Result<String, CommandError> {
    if !args.is_empty() {
        return Ok(args.join(" "));
    }
    let requests = [FieldRequest::new(FieldKind::Text, "Search text: ")];
    acquire_fields(ctx, &requests, EntryPolicy::ALL)?.require_text(0)
}

#[cfg(test)]
mod tests {
    use super::{acquire_fields, resolve_fields, EntryPolicy, FieldRequest};
    use crate::command::context::CommandContext;
    use crate::command::outcome::CommandError;
    use crate::command::render::Renderer;
    use crate::command::terminal::ScriptedTerminal;
    use crate::field::{FieldKind, FieldValue};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    fn name_and_phone<'a>() -> Vec<FieldRequest<'a>> {
        vec![
            FieldRequest::new(FieldKind::Name, "Name: "),
            FieldRequest::new(FieldKind::Phone, "Phone: "),
        ]
    }

    #[test]
    fn mandatory_all_overrides_optional_first_entry() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::new(["", "bob", "0123456789"]);
        let policy = EntryPolicy {
            mandatory_first_entry: false,
            mandatory_all_entries: true,
        };
        let acquired = {
            let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
            acquire_fields(&mut ctx, &name_and_phone(), policy).unwrap()
        };
        assert_eq!(acquired.text(0).as_deref(), Some("bob"));
        assert_eq!(acquired.text(1).as_deref(), Some("0123456789"));
        assert_eq!(terminal.prompts().len(), 3);
        assert_eq!(terminal.output(), ["This field can not be empty".to_string()]);
    }

    #[test]
    fn optional_fields_are_skipped_on_empty_input() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::new(["bob", ""]);
        let acquired = {
            let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
            acquire_fields(&mut ctx, &name_and_phone(), EntryPolicy::FIRST_ONLY).unwrap()
        };
        assert_eq!(
            acquired.values(),
            [Some(FieldValue::Text("bob".to_string())), None]
        );
    }

    #[test]
    fn invalid_values_are_reprompted() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::new(["bob", "123", "0123456789"]);
        let acquired = {
            let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
            acquire_fields(&mut ctx, &name_and_phone(), EntryPolicy::ALL).unwrap()
        };
        assert_eq!(acquired.filled(), 2);
        assert_eq!(
            terminal.output(),
            ["Invalid phone number format (expecting 10 digits)".to_string()]
        );
    }

    #[test]
    fn assertion_failure_reprompts_same_field() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::new(["taken", "free"]);
        let requests = vec![FieldRequest::new(FieldKind::Name, "Name: ").with_assertion(
            |value| match value.as_text() {
                Some("taken") => Err("Contact 'taken' already exists".to_string()),
                _ => Ok(()),
            },
        )];
        let acquired = {
            let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
            acquire_fields(&mut ctx, &requests, EntryPolicy::FIRST_ONLY).unwrap()
        };
        assert_eq!(acquired.text(0).as_deref(), Some("free"));
        assert_eq!(
            terminal.output(),
            ["Contact 'taken' already exists".to_string()]
        );
    }

    #[test]
    fn interrupting_mandatory_field_fails_command() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::default().then_interrupt();
        let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
        let err = acquire_fields(&mut ctx, &name_and_phone(), EntryPolicy::FIRST_ONLY)
            .expect_err("mandatory interruption must fail");
        assert_eq!(err, CommandError::interrupted());
    }

    #[test]
    fn interrupting_optional_field_returns_partial_values() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::new(["bob"]).then_interrupt();
        let acquired = {
            let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
            acquire_fields(&mut ctx, &name_and_phone(), EntryPolicy::FIRST_ONLY).unwrap()
        };
        assert_eq!(acquired.values().len(), 2);
        assert_eq!(acquired.text(0).as_deref(), Some("bob"));
        assert_eq!(acquired.text(1), None);
    }

    #[test]
    fn no_policy_allows_skipping_everything() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::new(["", ""]);
        let acquired = {
            let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
            acquire_fields(&mut ctx, &name_and_phone(), EntryPolicy::NONE).unwrap()
        };
        assert_eq!(acquired.filled(), 0);
    }

    #[test]
    fn positional_arguments_skip_prompts() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::default();
        let args = vec!["bob".to_string(), "0123456789".to_string()];
        let acquired = {
            let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
            resolve_fields(&mut ctx, &args, &name_and_phone(), EntryPolicy::ALL).unwrap()
        };
        assert_eq!(acquired.filled(), 2);
        assert!(terminal.prompts().is_empty());
    }

    #[test]
    fn positional_prefix_leaves_optional_tail_empty() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::default();
        let args = vec!["bob".to_string()];
        let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
        let acquired =
            resolve_fields(&mut ctx, &args, &name_and_phone(), EntryPolicy::FIRST_ONLY).unwrap();
        assert_eq!(acquired.text(1), None);
        assert_eq!(
            resolve_fields(&mut ctx, &args, &name_and_phone(), EntryPolicy::ALL),
            Err(CommandError::ArgumentShape)
        );
    }

    #[test]
    fn invalid_positional_value_is_a_user_error() {
        let renderer = Renderer::plain();
        let mut terminal = ScriptedTerminal::default();
        let args = vec!["bob".to_string(), "12".to_string()];
        let mut ctx = CommandContext::new(&mut terminal, &renderer, today());
        assert_eq!(
            resolve_fields(&mut ctx, &args, &name_and_phone(), EntryPolicy::ALL),
            Err(CommandError::user(
                "Invalid phone number format (expecting 10 digits)"
            ))
        );
    }
}
