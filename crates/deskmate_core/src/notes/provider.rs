use super::book::{hashtags, Note, NotesBook, NotesError};
use crate::command::{
    acquire_fields, expect_no_args, resolve_fields, search_text, window_arg, Acquired,
    CommandContext, CommandError, CommandOutput, CommandResult, CommandSpec, EntryPolicy,
    FieldRequest, Provider, WelcomeContext, DEFAULT_WINDOW_DAYS,
};
use crate::field::{format_date, FieldKind, FieldValue};
use crate::schedule::{next_occurrences, render_digest, DigestLayout};
use serde_json::Value;

pub const NOTES_PROVIDER_NAME: &str = "notes";

const NOTES_COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("add-note", "add-note [Topic]", "Add a new note"),
    CommandSpec::new(
        "edit-note",
        "edit-note <Topic>",
        "Edit text, tags and reminder of a note",
    ),
    CommandSpec::new("rename-note", "rename-note <Old> <New>", "Rename a note"),
    CommandSpec::new("delete-note", "delete-note <Topic>", "Delete a note"),
    CommandSpec::new("show-note", "show-note <Topic>", "Show one note"),
    CommandSpec::new("show-notes", "show-notes", "Show all notes"),
    CommandSpec::new("find-note", "find-note <text>", "Search notes by topic, text or tags"),
    CommandSpec::new("find-by-tag", "find-by-tag <tag>", "Show notes carrying a tag"),
    CommandSpec::new("show-tags", "show-tags", "Show every tag with its note count"),
    CommandSpec::new(
        "reminders",
        "reminders [days]",
        "Show reminders in the next days (7 by default)",
    ),
];

/// Notebook commands.
#[derive(Debug, Default)]
pub struct NotesProvider {
    book: NotesBook,
}

impl NotesProvider {
    pub fn new(book: NotesBook) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &NotesBook {
        &self.book
    }

    fn add_note(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let (topic, details) = {
            let book = &self.book;
            let topic_request =
                FieldRequest::new(FieldKind::Topic, "Topic: ").with_assertion(must_be_new(book));
            if args.is_empty() {
                let mut requests = vec![topic_request];
                requests.extend(detail_requests(None));
                let acquired = acquire_fields(ctx, &requests, EntryPolicy::FIRST_ONLY)?;
                let topic = acquired.require_text(0)?;
                let details = Acquired::from(acquired.into_inner().split_off(1));
                (topic, details)
            } else {
                let joined = [args.join(" ")];
                let topic = resolve_fields(ctx, &joined, &[topic_request], EntryPolicy::ALL)?
                    .require_text(0)?;
                let details = acquire_fields(ctx, &detail_requests(None), EntryPolicy::NONE)?;
                (topic, details)
            }
        };

        let mut note = Note::new(topic);
        apply_details(&mut note, &details);
        let message = format!("Note '{}' added", note.topic);
        self.book.add(note)?;
        Ok(CommandOutput::Line(message))
    }

    fn edit_note(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let topic = self.existing_topic(args, ctx)?;
        let details = {
            let current = self.book.get(&topic)?;
            acquire_fields(ctx, &detail_requests(Some(current)), EntryPolicy::NONE)?
        };
        if details.filled() == 0 {
            return Err(CommandError::user("No changes to apply"));
        }

        let note = self.book.get_mut(&topic)?;
        apply_details(note, &details);
        Ok(CommandOutput::Line(format!("Note '{}' updated", note.topic)))
    }

    fn rename_note(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let (old_args, new_args) = match args {
            [] => (args, args),
            [_, _] => args.split_at(1),
            _ => return Err(CommandError::ArgumentShape),
        };
        let old = {
            let requests = [FieldRequest::new(FieldKind::Topic, "Current topic: ")
                .with_assertion(must_exist(&self.book))];
            resolve_fields(ctx, old_args, &requests, EntryPolicy::ALL)?.require_text(0)?
        };
        let new = {
            let requests = [FieldRequest::new(FieldKind::Topic, "New topic: ")
                .with_assertion(must_be_free(&self.book, &old))];
            resolve_fields(ctx, new_args, &requests, EntryPolicy::ALL)?.require_text(0)?
        };
        self.book.rename(&old, &new)?;
        Ok(CommandOutput::Line(format!("Note '{old}' renamed to '{new}'")))
    }

    fn delete_note(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let topic = self.existing_topic(args, ctx)?;
        let removed = self.book.delete(&topic)?;
        Ok(CommandOutput::Line(format!("Note '{}' deleted", removed.topic)))
    }

    fn show_note(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let topic = self.existing_topic(args, ctx)?;
        Ok(CommandOutput::Lines(self.book.get(&topic)?.card_lines()))
    }

    fn show_notes(&self, args: &[String]) -> CommandResult {
        expect_no_args(args)?;
        if self.book.is_empty() {
            return Err(NotesError::Empty.into());
        }
        Ok(CommandOutput::Lines(
            self.book.records().map(Note::to_string).collect(),
        ))
    }

    fn find_note(&self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let text = search_text(args, ctx)?;
        let found = self.book.find(&text)?;
        Ok(CommandOutput::Lines(
            found.into_iter().map(Note::to_string).collect(),
        ))
    }

    fn find_by_tag(&self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let tag = if args.is_empty() {
            let requests = [FieldRequest::new(FieldKind::Tags, "Tag: ")];
            let tags = acquire_fields(ctx, &requests, EntryPolicy::ALL)?
                .tags(0)
                .ok_or_else(CommandError::interrupted)?;
            tags.join(" ")
        } else {
            args.join(" ")
        };
        let found = self.book.find_by_tag(&tag)?;
        Ok(CommandOutput::Lines(
            found.into_iter().map(Note::to_string).collect(),
        ))
    }

    fn show_tags(&self, args: &[String]) -> CommandResult {
        expect_no_args(args)?;
        let counts = self.book.tag_counts()?;
        Ok(CommandOutput::Lines(
            counts
                .into_iter()
                .map(|(tag, count)| format!("#{tag}: {count}"))
                .collect(),
        ))
    }

    fn reminders(&self, args: &[String], ctx: &CommandContext<'_>) -> CommandResult {
        let days = window_arg(args)?;
        if self.book.is_empty() {
            return Err(NotesError::Empty.into());
        }
        let today = ctx.today();
        let digest = next_occurrences(&self.book.reminder_events(), days, today);
        let lines = render_digest(&digest, days, today, DigestLayout::Detailed);
        if lines.is_empty() {
            return Ok(CommandOutput::Line(format!(
                "No reminders in the next {days} days"
            )));
        }
        Ok(CommandOutput::Lines(lines))
    }

    /// Topic of an existing note: all words of `args`, or one prompted line.
    fn existing_topic(
        &self,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> Result<String, CommandError> {
        let joined: Vec<String> = if args.is_empty() {
            Vec::new()
        } else {
            vec![args.join(" ")]
        };
        let requests =
            [FieldRequest::new(FieldKind::Topic, "Topic: ").with_assertion(must_exist(&self.book))];
        resolve_fields(ctx, &joined, &requests, EntryPolicy::ALL)?.require_text(0)
    }
}

impl Provider for NotesProvider {
    fn name(&self) -> &str {
        NOTES_PROVIDER_NAME
    }

    fn commands(&self) -> &[CommandSpec] {
        NOTES_COMMANDS
    }

    fn execute(
        &mut self,
        token: &str,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> CommandResult {
        match token {
            "add-note" => self.add_note(args, ctx),
            "edit-note" => self.edit_note(args, ctx),
            "rename-note" => self.rename_note(args, ctx),
            "delete-note" => self.delete_note(args, ctx),
            "show-note" => self.show_note(args, ctx),
            "show-notes" => self.show_notes(args),
            "find-note" => self.find_note(args, ctx),
            "find-by-tag" => self.find_by_tag(args, ctx),
            "show-tags" => self.show_tags(args),
            "reminders" => self.reminders(args, ctx),
            other => Err(CommandError::Internal(format!(
                "notes provider cannot run `{other}`"
            ))),
        }
    }

    fn welcome_message(&self, ctx: &WelcomeContext) -> Option<String> {
        if !ctx.show_reminders {
            return None;
        }
        let digest = next_occurrences(&self.book.reminder_events(), DEFAULT_WINDOW_DAYS, ctx.today);
        let lines = render_digest(&digest, DEFAULT_WINDOW_DAYS, ctx.today, DigestLayout::Compact);
        if lines.is_empty() {
            return None;
        }
        Some(format!("Upcoming reminders: {}", lines.join("; ")))
    }

    fn export_state(&self) -> Result<Value, serde_json::Error> {
        let records: Vec<&Note> = self.book.records().collect();
        serde_json::to_value(records)
    }

    fn import_state(&mut self, state: Value) -> Result<(), serde_json::Error> {
        let records: Vec<Note> = serde_json::from_value(state)?;
        self.book = NotesBook::from_records(records);
        Ok(())
    }
}

/// Text, Tags and Reminder prompts, showing current values when editing.
fn detail_requests(current: Option<&Note>) -> Vec<FieldRequest<'static>> {
    let text_hint = current
        .filter(|note| !note.text.is_empty())
        .map(|note| format!(" (current {})", note.text))
        .unwrap_or_default();
    let tags_hint = current
        .filter(|note| !note.tags.is_empty())
        .map(|note| format!(" (current {})", hashtags(&note.tags)))
        .unwrap_or_default();
    let reminder_hint = current
        .and_then(|note| note.reminder)
        .map(|date| format!(" (current {})", format_date(date)))
        .unwrap_or_default();

    vec![
        FieldRequest::new(FieldKind::Text, format!("Text{text_hint}: ")),
        FieldRequest::new(FieldKind::Tags, format!("Tags{tags_hint}: ")),
        FieldRequest::new(
            FieldKind::Date,
            format!("Reminder (DD.MM.YYYY){reminder_hint}: "),
        ),
    ]
}

fn apply_details(note: &mut Note, details: &Acquired) {
    if let Some(text) = details.text(0) {
        note.text = text;
    }
    if let Some(tags) = details.tags(1) {
        note.set_tags(&tags);
    }
    if let Some(reminder) = details.date(2) {
        note.reminder = Some(reminder);
    }
}

fn must_exist(book: &NotesBook) -> impl Fn(&FieldValue) -> Result<(), String> + '_ {
    move |value| match value.as_text() {
        Some(topic) if !book.contains(topic) => Err(format!("Note '{topic}' not found")),
        _ => Ok(()),
    }
}

fn must_be_new(book: &NotesBook) -> impl Fn(&FieldValue) -> Result<(), String> + '_ {
    move |value| match value.as_text() {
        Some(topic) if book.contains(topic) => Err(format!("Note '{topic}' already exists")),
        _ => Ok(()),
    }
}

fn must_be_free<'a>(
    book: &'a NotesBook,
    current: &'a str,
) -> impl Fn(&FieldValue) -> Result<(), String> + 'a {
    move |value| match value.as_text() {
        Some(topic) if book.is_taken_by_other(topic, current) => {
            Err(format!("Note '{topic}' already exists"))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::NotesProvider;
    use crate::command::{
        CommandContext, CommandError, CommandOutput, CommandResult, Provider, Renderer,
        ScriptedTerminal, WelcomeContext,
    };
    use chrono::NaiveDate;

    fn friday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 8).unwrap()
    }

    fn run(
        provider: &mut NotesProvider,
        line: &str,
        terminal: &mut ScriptedTerminal,
    ) -> CommandResult {
        let renderer = Renderer::plain();
        let mut words = line.split_whitespace();
        let token = words.next().unwrap_or_default();
        let args: Vec<String> = words.map(str::to_string).collect();
        let mut ctx = CommandContext::new(terminal, &renderer, friday());
        provider.execute(token, &args, &mut ctx)
    }

    fn add(provider: &mut NotesProvider, topic: &str, text: &str, tags: &str, reminder: &str) {
        let mut terminal = ScriptedTerminal::new([topic, text, tags, reminder]);
        run(provider, "add-note", &mut terminal).unwrap();
    }

    fn run_quiet(provider: &mut NotesProvider, line: &str) -> CommandResult {
        run(provider, line, &mut ScriptedTerminal::default())
    }

    #[test]
    fn add_note_interactively_with_multiword_topic() {
        let mut provider = NotesProvider::default();
        add(&mut provider, "Buy milk", "2 liters", "#Shop home", "");
        let note = provider.book().get("buy milk").unwrap();
        assert_eq!(note.text, "2 liters");
        assert_eq!(note.tags, vec!["home", "shop"]);
        assert_eq!(note.reminder, None);
    }

    #[test]
    fn add_note_with_topic_argument_prompts_for_details() {
        let mut provider = NotesProvider::default();
        let mut terminal = ScriptedTerminal::new(["call mom", "", "12.03.2000"]);
        assert_eq!(
            run(&mut provider, "add-note Sunday plans", &mut terminal),
            Ok(CommandOutput::Line("Note 'Sunday plans' added".to_string()))
        );
        assert_eq!(terminal.prompts().len(), 3);
        assert_eq!(
            run_quiet(&mut provider, "add-note sunday plans"),
            Err(CommandError::user("Note 'sunday plans' already exists"))
        );
    }

    #[test]
    fn edit_note_replaces_answered_fields() {
        let mut provider = NotesProvider::default();
        add(&mut provider, "Plan", "old", "a", "");
        let mut terminal = ScriptedTerminal::new(["", "b c", "01.04.2024"]);
        run(&mut provider, "edit-note plan", &mut terminal).unwrap();
        let note = provider.book().get("plan").unwrap();
        assert_eq!(note.text, "old");
        assert_eq!(note.tags, vec!["b", "c"]);
        assert_eq!(terminal.prompts()[0], "Text (current old): ");
        assert_eq!(terminal.prompts()[1], "Tags (current #a): ");
    }

    #[test]
    fn rename_show_and_delete() {
        let mut provider = NotesProvider::default();
        add(&mut provider, "Plan", "text", "", "");
        add(&mut provider, "Budget", "", "", "");
        assert_eq!(
            run_quiet(&mut provider, "rename-note plan budget"),
            Err(CommandError::user("Note 'budget' already exists"))
        );

        let mut terminal = ScriptedTerminal::new(["plan", "BUDGET", "PLAN"]);
        assert_eq!(
            run(&mut provider, "rename-note", &mut terminal),
            Ok(CommandOutput::Line("Note 'plan' renamed to 'PLAN'".to_string()))
        );
        assert_eq!(
            terminal.prompts(),
            ["Current topic: ", "New topic: ", "New topic: "]
        );
        assert!(terminal
            .output()
            .contains(&"Note 'BUDGET' already exists".to_string()));

        run_quiet(&mut provider, "rename-note plan Roadmap").unwrap();
        assert_eq!(
            run_quiet(&mut provider, "show-note roadmap"),
            Ok(CommandOutput::Lines(vec![
                "Topic: Roadmap".to_string(),
                "Text: text".to_string(),
            ]))
        );
        assert_eq!(
            run_quiet(&mut provider, "delete-note plan"),
            Err(CommandError::user("Note 'plan' not found"))
        );
        run_quiet(&mut provider, "delete-note roadmap").unwrap();
        run_quiet(&mut provider, "delete-note budget").unwrap();
        assert!(provider.book().is_empty());
    }

    #[test]
    fn empty_notebook_reports_empty_list() {
        let mut provider = NotesProvider::default();
        for line in ["show-notes", "show-tags", "find-note x", "find-by-tag x", "reminders"] {
            assert_eq!(
                run_quiet(&mut provider, line),
                Err(CommandError::user("Notes list is empty")),
                "{line}"
            );
        }
    }

    #[test]
    fn tag_commands() {
        let mut provider = NotesProvider::default();
        add(&mut provider, "A", "", "work home", "");
        add(&mut provider, "B", "", "#work", "");
        assert_eq!(
            run_quiet(&mut provider, "show-tags"),
            Ok(CommandOutput::Lines(vec![
                "#home: 1".to_string(),
                "#work: 2".to_string(),
            ]))
        );
        assert_eq!(
            run_quiet(&mut provider, "find-by-tag #HOME"),
            Ok(CommandOutput::Lines(vec!["Topic: A; Tags: #home #work".to_string()]))
        );
        let mut terminal = ScriptedTerminal::new(["work"]);
        let found = run(&mut provider, "find-by-tag", &mut terminal).unwrap();
        assert!(matches!(found, CommandOutput::Lines(lines) if lines.len() == 2));
    }

    #[test]
    fn reminders_and_welcome_digest() {
        let mut provider = NotesProvider::default();
        add(&mut provider, "Taxes", "", "", "11.03.2021");
        assert_eq!(
            run_quiet(&mut provider, "reminders"),
            Ok(CommandOutput::Lines(vec![
                "Monday:".to_string(),
                "    Taxes".to_string(),
            ]))
        );
        let ctx = WelcomeContext {
            today: friday(),
            show_birthdays: false,
            show_reminders: true,
        };
        assert_eq!(
            provider.welcome_message(&ctx).as_deref(),
            Some("Upcoming reminders: Monday: Taxes")
        );
    }

    #[test]
    fn state_round_trip_keeps_ids() {
        let mut provider = NotesProvider::default();
        add(&mut provider, "Plan", "text", "x", "01.01.2000");
        let mut restored = NotesProvider::default();
        restored
            .import_state(provider.export_state().unwrap())
            .unwrap();
        assert_eq!(restored.book(), provider.book());
    }
}
