use super::book::{Contact, ContactBook, ContactsError};
use crate::command::{
    acquire_fields, expect_no_args, resolve_fields, search_text, window_arg, CommandContext,
    CommandError, CommandOutput, CommandResult, CommandSpec, EntryPolicy, FieldRequest, Provider,
    WelcomeContext, DEFAULT_WINDOW_DAYS,
};
use crate::field::{format_date, FieldKind, FieldValue};
use crate::schedule::{next_occurrences, render_digest, DigestLayout};
use log::debug;
use serde_json::Value;

pub const CONTACTS_PROVIDER_NAME: &str = "contacts";

const CONTACTS_COMMANDS: &[CommandSpec] = &[
    CommandSpec::new("add-contact", "add-contact [Name]", "Add a new contact"),
    CommandSpec::new("add-phone", "add-phone <Name> <Phone>", "Add a phone to a contact"),
    CommandSpec::new(
        "edit-contact",
        "edit-contact <Name>",
        "Edit email, birthday and address of a contact",
    ),
    CommandSpec::new("rename-contact", "rename-contact <Old> <New>", "Rename a contact"),
    CommandSpec::new(
        "delete-phone",
        "delete-phone <Name> <Phone>",
        "Delete a phone from a contact",
    ),
    CommandSpec::new("delete-contact", "delete-contact <Name>", "Delete a contact"),
    CommandSpec::new("show-contact", "show-contact <Name>", "Show one contact"),
    CommandSpec::new("show-contacts", "show-contacts", "Show all contacts"),
    CommandSpec::new("find-contact", "find-contact <text>", "Search contacts by any field"),
    CommandSpec::new(
        "birthdays",
        "birthdays [days]",
        "Show birthdays in the next days (7 by default)",
    ),
];

/// Contact book commands.
#[derive(Debug, Default)]
pub struct ContactsProvider {
    book: ContactBook,
}

impl ContactsProvider {
    pub fn new(book: ContactBook) -> Self {
        Self { book }
    }

    pub fn book(&self) -> &ContactBook {
        &self.book
    }

    fn add_contact(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let acquired = {
            let book = &self.book;
            let requests = [
                FieldRequest::new(FieldKind::Name, "Name: ").with_assertion(must_be_new(book)),
                FieldRequest::new(FieldKind::Phone, "Phone: "),
                FieldRequest::new(FieldKind::Email, "Email: "),
                FieldRequest::new(FieldKind::Date, "Birthday (DD.MM.YYYY): "),
                FieldRequest::new(FieldKind::Address, "Address: "),
            ];
            resolve_fields(ctx, args, &requests, EntryPolicy::FIRST_ONLY)?
        };

        let mut contact = Contact::new(acquired.require_text(0)?);
        contact.phones.extend(acquired.text(1));
        contact.email = acquired.text(2);
        contact.birthday = acquired.date(3);
        contact.address = acquired.text(4).filter(|address| !address.is_empty());
        let message = format!("Contact '{}' added", contact.name);
        self.book.add(contact)?;
        Ok(CommandOutput::Line(message))
    }

    fn add_phone(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let (name, phone) = self.name_and_phone(args, ctx)?;
        self.book.add_phone(&name, &phone)?;
        Ok(CommandOutput::Line(format!("Phone {phone} added")))
    }

    fn delete_phone(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let (name, phone) = self.name_and_phone(args, ctx)?;
        self.book.delete_phone(&name, &phone)?;
        Ok(CommandOutput::Line(format!("Phone {phone} deleted")))
    }

    fn edit_contact(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let name = self.existing_name(args, ctx)?;
        let acquired = {
            let current = self.book.get(&name)?;
            let requests = [
                FieldRequest::new(
                    FieldKind::Email,
                    format!("Email{}: ", current_hint(current.email.as_deref())),
                ),
                FieldRequest::new(
                    FieldKind::Date,
                    format!(
                        "Birthday (DD.MM.YYYY){}: ",
                        current_hint(current.birthday.map(format_date).as_deref())
                    ),
                ),
                FieldRequest::new(
                    FieldKind::Address,
                    format!("Address{}: ", current_hint(current.address.as_deref())),
                ),
            ];
            acquire_fields(ctx, &requests, EntryPolicy::NONE)?
        };
        if acquired.filled() == 0 {
            return Err(CommandError::user("No changes to apply"));
        }

        let contact = self.book.get_mut(&name)?;
        if let Some(email) = acquired.text(0) {
            contact.email = Some(email);
        }
        if let Some(birthday) = acquired.date(1) {
            contact.birthday = Some(birthday);
        }
        if let Some(address) = acquired.text(2) {
            contact.address = Some(address);
        }
        Ok(CommandOutput::Line(format!("Contact '{}' updated", contact.name)))
    }

    fn rename_contact(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let (old_args, new_args) = match args {
            [] => (args, args),
            [_, _] => args.split_at(1),
            _ => return Err(CommandError::ArgumentShape),
        };
        let old = {
            let requests = [FieldRequest::new(FieldKind::Name, "Current name: ")
                .with_assertion(must_exist(&self.book))];
            resolve_fields(ctx, old_args, &requests, EntryPolicy::ALL)?.require_text(0)?
        };
        // The contact may keep its own name with different casing.
        let new = {
            let requests = [FieldRequest::new(FieldKind::Name, "New name: ")
                .with_assertion(must_be_free(&self.book, &old))];
            resolve_fields(ctx, new_args, &requests, EntryPolicy::ALL)?.require_text(0)?
        };
        self.book.rename(&old, &new)?;
        Ok(CommandOutput::Line(format!("Contact '{old}' renamed to '{new}'")))
    }

    fn delete_contact(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let name = self.existing_name(args, ctx)?;
        let removed = self.book.delete(&name)?;
        debug!("event=contact_delete module=contacts status=ok remaining={}", self.book.len());
        Ok(CommandOutput::Line(format!("Contact '{}' deleted", removed.name)))
    }

    fn show_contact(&mut self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let name = self.existing_name(args, ctx)?;
        Ok(CommandOutput::Lines(self.book.get(&name)?.card_lines()))
    }

    fn show_contacts(&self, args: &[String]) -> CommandResult {
        expect_no_args(args)?;
        if self.book.is_empty() {
            return Err(ContactsError::Empty.into());
        }
        Ok(CommandOutput::Lines(
            self.book.records().map(Contact::to_string).collect(),
        ))
    }

    fn find_contact(&self, args: &[String], ctx: &mut CommandContext<'_>) -> CommandResult {
        let text = search_text(args, ctx)?;
        let found = self.book.find(&text)?;
        Ok(CommandOutput::Lines(
            found.into_iter().map(Contact::to_string).collect(),
        ))
    }

    fn birthdays(&self, args: &[String], ctx: &CommandContext<'_>) -> CommandResult {
        let days = window_arg(args)?;
        if self.book.is_empty() {
            return Err(ContactsError::Empty.into());
        }
        let today = ctx.today();
        let digest = next_occurrences(&self.book.birthday_events(), days, today);
        let lines = render_digest(&digest, days, today, DigestLayout::Detailed);
        if lines.is_empty() {
            return Ok(CommandOutput::Line(format!(
                "No birthdays in the next {days} days"
            )));
        }
        Ok(CommandOutput::Lines(lines))
    }

    fn name_and_phone(
        &self,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> Result<(String, String), CommandError> {
        let requests = [
            FieldRequest::new(FieldKind::Name, "Name: ").with_assertion(must_exist(&self.book)),
            FieldRequest::new(FieldKind::Phone, "Phone: "),
        ];
        let acquired = resolve_fields(ctx, args, &requests, EntryPolicy::ALL)?;
        Ok((acquired.require_text(0)?, acquired.require_text(1)?))
    }

    fn existing_name(
        &self,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> Result<String, CommandError> {
        let requests =
            [FieldRequest::new(FieldKind::Name, "Name: ").with_assertion(must_exist(&self.book))];
        resolve_fields(ctx, args, &requests, EntryPolicy::ALL)?.require_text(0)
    }
}

impl Provider for ContactsProvider {
    fn name(&self) -> &str {
        CONTACTS_PROVIDER_NAME
    }

    fn commands(&self) -> &[CommandSpec] {
        CONTACTS_COMMANDS
    }

    fn execute(
        &mut self,
        token: &str,
        args: &[String],
        ctx: &mut CommandContext<'_>,
    ) -> CommandResult {
        match token {
            "add-contact" => self.add_contact(args, ctx),
            "add-phone" => self.add_phone(args, ctx),
            "edit-contact" => self.edit_contact(args, ctx),
            "rename-contact" => self.rename_contact(args, ctx),
            "delete-phone" => self.delete_phone(args, ctx),
            "delete-contact" => self.delete_contact(args, ctx),
            "show-contact" => self.show_contact(args, ctx),
            "show-contacts" => self.show_contacts(args),
            "find-contact" => self.find_contact(args, ctx),
            "birthdays" => self.birthdays(args, ctx),
            other => Err(CommandError::Internal(format!(
                "contacts provider cannot run `{other}`"
            ))),
        }
    }

    fn welcome_message(&self, ctx: &WelcomeContext) -> Option<String> {
        if !ctx.show_birthdays {
            return None;
        }
        let digest = next_occurrences(&self.book.birthday_events(), DEFAULT_WINDOW_DAYS, ctx.today);
        let lines = render_digest(&digest, DEFAULT_WINDOW_DAYS, ctx.today, DigestLayout::Compact);
        if lines.is_empty() {
            return None;
        }
        Some(format!("Upcoming birthdays: {}", lines.join("; ")))
    }

    fn export_state(&self) -> Result<Value, serde_json::Error> {
        let records: Vec<&Contact> = self.book.records().collect();
        serde_json::to_value(records)
    }

    fn import_state(&mut self, state: Value) -> Result<(), serde_json::Error> {
        let records: Vec<Contact> = serde_json::from_value(state)?;
        self.book = ContactBook::from_records(records);
        Ok(())
    }
}

fn must_exist(book: &ContactBook) -> impl Fn(&FieldValue) -> Result<(), String> + '_ {
    move |value| match value.as_text() {
        Some(name) if !book.contains(name) => Err(format!("Contact '{name}' not found")),
        _ => Ok(()),
    }
}

fn must_be_new(book: &ContactBook) -> impl Fn(&FieldValue) -> Result<(), String> + '_ {
    move |value| match value.as_text() {
        Some(name) if book.contains(name) => Err(format!("Contact '{name}' already exists")),
        _ => Ok(()),
    }
}

fn must_be_free<'a>(
    book: &'a ContactBook,
    current: &'a str,
) -> impl Fn(&FieldValue) -> Result<(), String> + 'a {
    move |value| match value.as_text() {
        Some(name) if book.is_taken_by_other(name, current) => {
            Err(format!("Contact '{name}' already exists"))
        }
        _ => Ok(()),
    }
}

fn current_hint(value: Option<&str>) -> String {
    value
        .map(|value| format!(" (current {value})"))
        .unwrap_or_default()
}
