//! Dispatch engine and interactive shell loop.
//!
//! # Responsibility
//! - Route one input line to the provider owning its token.
//! - Classify every handler outcome into an ok/error styled reply.
//! - Trigger full-state saves after successful mutating commands.
//!
//! # Invariants
//! - No command error ends the loop; only `exit` or a top-level
//!   interruption does, and both still run the final save.
//! - The registry is built once in `Dispatcher::new`; a token conflict
//!   prevents construction.

use super::context::CommandContext;
use super::outcome::{CommandError, CommandOutput, CommandResult, INVALID_COMMAND_MSG};
use super::provider::{Provider, WelcomeContext};
use super::registry::{CommandRegistry, RegistryError};
use super::render::{Renderer, Style};
use super::shell::{ShellProvider, BYE_MSG};
use super::terminal::{LineInput, Terminal};
use crate::store::{StateGateway, StateSnapshot, StoreResult};
use chrono::{Local, NaiveDate};
use log::{error, info, warn};
use std::io;
use std::time::Instant;

/// Token substrings marking commands that change persisted state.
pub const SAVE_PATTERNS: &[&str] = &["add", "edit", "delete", "rename", "settings"];

const HELLO_MSG: &str = "this is your assistant";
const HELLO_HELP_MSG: &str = "write your command ('h|help' for details)";
const PROMPT_MSG: &str = ">>> ";

/// Styled reply for one dispatched command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub style: Style,
    pub lines: Vec<String>,
    /// Set when the follow-up save failed.
    pub save_error: Option<String>,
}

impl Reply {
    fn ok(lines: Vec<String>) -> Self {
        Self {
            style: Style::Ok,
            lines,
            save_error: None,
        }
    }

    fn error(lines: Vec<String>) -> Self {
        Self {
            style: Style::Error,
            lines,
            save_error: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.style == Style::Error
    }
}

/// Owns the providers, the registry and the rendering context.
pub struct Dispatcher {
    shell: ShellProvider,
    stores: Vec<Box<dyn Provider>>,
    registry: CommandRegistry,
    renderer: Renderer,
    gateway: Box<dyn StateGateway>,
    clock: Box<dyn Fn() -> NaiveDate>,
    finished: bool,
}

impl Dispatcher {
    /// Registers the shell commands first, then every store in order.
    ///
    /// # Errors
    /// - `RegistryError` when two providers declare the same token.
    pub fn new(
        shell: ShellProvider,
        stores: Vec<Box<dyn Provider>>,
        gateway: Box<dyn StateGateway>,
    ) -> Result<Self, RegistryError> {
        let registry = {
            let mut providers: Vec<&dyn Provider> = Vec::with_capacity(stores.len() + 1);
            providers.push(&shell);
            providers.extend(stores.iter().map(|store| store.as_ref()));
            CommandRegistry::register_all(&providers)?
        };
        info!(
            "event=registry_build module=command status=ok providers={} commands={}",
            stores.len() + 1,
            registry.len()
        );

        let renderer = shell.settings().renderer();
        Ok(Self {
            shell,
            stores,
            registry,
            renderer,
            gateway,
            clock: Box::new(|| Local::now().date_naive()),
            finished: false,
        })
    }

    /// Replaces the wall clock used for "today".
    pub fn with_clock(mut self, clock: impl Fn() -> NaiveDate + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Forces a rendering context, overriding the shell settings until the
    /// next settings change or state load.
    pub fn with_renderer(mut self, renderer: Renderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn shell(&self) -> &ShellProvider {
        &self.shell
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Loads persisted state into every provider.
    ///
    /// A blob a provider cannot read is skipped with a warning; the provider
    /// keeps its empty state.
    pub fn load_state(&mut self) {
        let mut snapshot = self.gateway.load();
        import_into(&mut self.shell, &mut snapshot);
        for store in &mut self.stores {
            import_into(store.as_mut(), &mut snapshot);
        }
        self.renderer = self.shell.settings().renderer();
    }

    /// Saves the state of every provider through the gateway.
    ///
    /// # Errors
    /// - `StoreError::Serialize` when a provider cannot export its state.
    ///   Nothing is written in that case.
    /// - Whatever the gateway reports.
    pub fn save_state(&mut self) -> StoreResult<()> {
        let mut snapshot = StateSnapshot::new();
        snapshot.insert(self.shell.name().to_string(), self.shell.export_state()?);
        for store in &self.stores {
            snapshot.insert(store.name().to_string(), store.export_state()?);
        }
        self.gateway.save(&snapshot)
    }

    /// Splits `line` and dispatches it. Returns `None` for a blank line.
    pub fn handle_line(&mut self, line: &str, terminal: &mut dyn Terminal) -> Option<Reply> {
        let mut words = line.split_whitespace();
        let token = words.next()?.to_lowercase();
        let args: Vec<String> = words.map(str::to_string).collect();
        Some(self.dispatch(&token, &args, terminal))
    }

    /// Runs `token` and classifies the outcome.
    pub fn dispatch(&mut self, token: &str, args: &[String], terminal: &mut dyn Terminal) -> Reply {
        let started_at = Instant::now();
        let Some(entry) = self.registry.resolve(token) else {
            info!("event=command_dispatch module=command status=unknown");
            return Reply::error(vec![INVALID_COMMAND_MSG.to_string()]);
        };
        let slot = entry.slot;
        let usage = entry.spec.usage;

        let today = (self.clock)();
        let result = {
            let mut ctx = CommandContext::new(terminal, &self.renderer, today);
            let provider: &mut dyn Provider = if slot == 0 {
                &mut self.shell
            } else {
                self.stores[slot - 1].as_mut()
            };
            provider.execute(token, args, &mut ctx)
        };

        let status = match &result {
            Ok(_) => "ok",
            Err(CommandError::Internal(_)) => "error",
            Err(_) => "rejected",
        };
        info!(
            "event=command_dispatch module=command status={} token={} duration_ms={}",
            status,
            token,
            started_at.elapsed().as_millis()
        );

        let mut reply = self.classify(result, usage);
        if token == "settings" && !reply.is_error() {
            self.renderer = self.shell.settings().renderer();
        }
        if !reply.is_error() && triggers_save(token) {
            if let Err(err) = self.save_state() {
                error!(
                    "event=state_save module=command status=error token={} error={}",
                    token, err
                );
                reply.save_error = Some(format!("Failed to save data: {err}"));
            }
        }
        reply
    }

    /// Greeting lines shown before the first prompt.
    pub fn welcome_lines(&self) -> Vec<String> {
        let settings = self.shell.settings();
        let greeting = if settings.user_name.is_empty() {
            format!("Hi, {HELLO_MSG}")
        } else {
            format!("Hi {}, {HELLO_MSG}", settings.user_name)
        };

        let ctx = WelcomeContext {
            today: (self.clock)(),
            show_birthdays: settings.show_birthdays,
            show_reminders: settings.show_reminders,
        };
        let mut lines = vec![greeting];
        lines.extend(
            self.stores
                .iter()
                .filter_map(|store| store.welcome_message(&ctx))
                .map(|message| format!("  {message}")),
        );
        lines
    }

    /// Reads and dispatches lines until `exit` or end-of-input, then saves.
    ///
    /// # Errors
    /// - Terminal I/O failures. The final save is still attempted.
    pub fn run(&mut self, terminal: &mut dyn Terminal) -> io::Result<()> {
        let loop_result = self.run_loop(terminal);

        let save_result = self.save_state();
        if let Err(err) = &save_result {
            error!("event=state_save module=command status=error stage=shutdown error={err}");
        }
        loop_result?;
        if let Err(err) = save_result {
            self.renderer.print(
                terminal,
                &format!("Failed to save data: {err}"),
                Style::Error,
            )?;
        }
        info!("event=shell_stop module=command status=ok");
        Ok(())
    }

    fn run_loop(&mut self, terminal: &mut dyn Terminal) -> io::Result<()> {
        info!("event=shell_start module=command status=ok");
        let welcome = self.welcome_lines();
        self.renderer
            .print(terminal, &welcome.join("\n"), Style::Welcome)?;
        self.renderer.print(terminal, HELLO_HELP_MSG, Style::Hint)?;

        while !self.finished {
            let prompt = self.renderer.paint(PROMPT_MSG, Style::Prompt);
            let line = match terminal.read_line(&prompt)? {
                LineInput::Line(line) => line,
                LineInput::Interrupted => {
                    self.renderer.print(terminal, BYE_MSG, Style::Ok)?;
                    self.finished = true;
                    break;
                }
            };

            match self.handle_line(&line, terminal) {
                None => self.renderer.print(terminal, HELLO_HELP_MSG, Style::Hint)?,
                Some(reply) => {
                    self.renderer.present(terminal, &reply.lines, reply.style)?;
                    if let Some(message) = &reply.save_error {
                        self.renderer.print(terminal, message, Style::Error)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn classify(&mut self, result: CommandResult, usage: &str) -> Reply {
        match result {
            Ok(CommandOutput::Line(line)) => Reply::ok(vec![line]),
            Ok(CommandOutput::Lines(lines)) => Reply::ok(lines),
            Ok(CommandOutput::Help) => Reply::ok(self.registry.help_lines()),
            Ok(CommandOutput::Exit(message)) => {
                self.finished = true;
                Reply::ok(vec![message])
            }
            Err(CommandError::User(message)) => Reply::error(vec![message]),
            Err(CommandError::ArgumentShape) => Reply::error(vec![
                INVALID_COMMAND_MSG.to_string(),
                format!("Expected format: {usage}"),
            ]),
            Err(CommandError::UnknownCommand) => {
                Reply::error(vec![INVALID_COMMAND_MSG.to_string()])
            }
            Err(err @ CommandError::Internal(_)) => {
                error!("event=command_dispatch module=command status=error error={err}");
                Reply::error(vec![err.to_string()])
            }
        }
    }
}

fn import_into(provider: &mut dyn Provider, snapshot: &mut StateSnapshot) {
    let Some(state) = snapshot.remove(provider.name()) else {
        return;
    };
    if let Err(err) = provider.import_state(state) {
        warn!(
            "event=state_import module=command status=error provider={} error={}",
            provider.name(),
            err
        );
    }
}

/// Whether `token` names a state-changing command.
pub fn triggers_save(token: &str) -> bool {
    SAVE_PATTERNS.iter().any(|pattern| token.contains(pattern))
}
