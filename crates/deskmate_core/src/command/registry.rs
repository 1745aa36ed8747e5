//! Flat command namespace built from all providers.
//!
//! # Responsibility
//! - Map every command token to the provider slot owning it.
//! - Build the consolidated help text once, in registration order.
//!
//! # Invariants
//! - A token is registered at most once; conflicts fail the whole build.
//! - Help holds one line per usage group, first registration wins.

use super::provider::Provider;
use super::spec::CommandSpec;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};

const HELP_HEADER: &str = "List of supported commands:";

/// Registry entry for one token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredCommand {
    /// Index of the owning provider in the registration order.
    pub slot: usize,
    pub provider: String,
    pub spec: CommandSpec,
}

/// Token → owning provider lookup.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    entries: BTreeMap<String, RegisteredCommand>,
    help: Vec<String>,
}

impl CommandRegistry {
    /// Registers every command of every provider, in order.
    ///
    /// # Errors
    /// - `RegistryError::EmptyToken` for a blank token.
    /// - `RegistryError::DuplicateToken` when two specs share a token.
    pub fn register_all(providers: &[&dyn Provider]) -> Result<Self, RegistryError> {
        let mut registry = Self::default();
        let mut seen_usages = BTreeSet::<&str>::new();
        let mut help = Vec::new();

        for (slot, provider) in providers.iter().enumerate() {
            for spec in provider.commands() {
                let token = spec.token.trim();
                if token.is_empty() {
                    return Err(RegistryError::EmptyToken {
                        provider: provider.name().to_string(),
                    });
                }
                if let Some(existing) = registry.entries.get(token) {
                    return Err(RegistryError::DuplicateToken {
                        token: token.to_string(),
                        first: existing.provider.clone(),
                        second: provider.name().to_string(),
                    });
                }

                registry.entries.insert(
                    token.to_string(),
                    RegisteredCommand {
                        slot,
                        provider: provider.name().to_string(),
                        spec: *spec,
                    },
                );
                if seen_usages.insert(spec.usage) {
                    help.push(format!("    {:<25} : {}", spec.usage, spec.help));
                }
            }
        }

        registry.help = help;
        Ok(registry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn resolve(&self, token: &str) -> Option<&RegisteredCommand> {
        self.entries.get(token)
    }

    /// All tokens in lexical order, for completion front-ends.
    pub fn sorted_tokens(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    /// Help text: header, one line per usage group, trailing blank line.
    pub fn help_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(self.help.len() + 2);
        lines.push(HELP_HEADER.to_string());
        lines.extend(self.help.iter().cloned());
        lines.push(String::new());
        lines
    }
}

/// Startup configuration errors. Never produced by user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    DuplicateToken {
        token: String,
        first: String,
        second: String,
    },
    EmptyToken {
        provider: String,
    },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateToken {
                token,
                first,
                second,
            } => write!(
                f,
                "command `{token}` registered by `{first}` is registered again by `{second}`"
            ),
            Self::EmptyToken { provider } => {
                write!(f, "provider `{provider}` declares an empty command token")
            }
        }
    }
}

impl Error for RegistryError {}

#[cfg(test)]
mod tests {
    use super::{CommandRegistry, RegistryError};
    use crate::command::context::CommandContext;
    use crate::command::outcome::{CommandOutput, CommandResult};
    use crate::command::provider::Provider;
    use crate::command::spec::CommandSpec;

    struct StaticProvider {
        name: &'static str,
        commands: Vec<CommandSpec>,
    }

    impl Provider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn commands(&self) -> &[CommandSpec] {
            &self.commands
        }

        fn execute(
            &mut self,
            token: &str,
            _args: &[String],
            _ctx: &mut CommandContext<'_>,
        ) -> CommandResult {
            Ok(CommandOutput::Line(format!("{}:{token}", self.name)))
        }
    }

    fn shell() -> StaticProvider {
        StaticProvider {
            name: "shell",
            commands: vec![
                CommandSpec::new("help", "h|help", "Show this message"),
                CommandSpec::new("h", "h|help", "Show this message"),
                CommandSpec::new("exit", "q|exit", "Leave"),
                CommandSpec::new("q", "q|exit", "Leave"),
            ],
        }
    }

    fn contacts() -> StaticProvider {
        StaticProvider {
            name: "contacts",
            commands: vec![
                CommandSpec::new("add-contact", "add-contact [Name]", "Add contact"),
                CommandSpec::new("show-contacts", "show-contacts", "List contacts"),
            ],
        }
    }

    #[test]
    fn resolves_every_token_to_its_provider() {
        let shell = shell();
        let contacts = contacts();
        let registry = CommandRegistry::register_all(&[&shell, &contacts]).unwrap();

        assert_eq!(registry.len(), 6);
        assert_eq!(registry.resolve("h").unwrap().slot, 0);
        assert_eq!(registry.resolve("add-contact").unwrap().slot, 1);
        assert_eq!(registry.resolve("add-contact").unwrap().provider, "contacts");
        assert!(registry.resolve("unknown").is_none());
    }

    #[test]
    fn duplicate_token_fails_the_build() {
        let shell = shell();
        let clash = StaticProvider {
            name: "notes",
            commands: vec![CommandSpec::new("q", "q", "Quick note")],
        };
        let err = CommandRegistry::register_all(&[&shell, &clash]).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateToken {
                token: "q".to_string(),
                first: "shell".to_string(),
                second: "notes".to_string(),
            }
        );
    }

    #[test]
    fn empty_token_is_rejected() {
        let broken = StaticProvider {
            name: "broken",
            commands: vec![CommandSpec::new("  ", "", "")],
        };
        assert!(matches!(
            CommandRegistry::register_all(&[&broken]),
            Err(RegistryError::EmptyToken { .. })
        ));
    }

    #[test]
    fn help_has_one_line_per_usage_group_in_order() {
        let shell = shell();
        let contacts = contacts();
        let registry = CommandRegistry::register_all(&[&shell, &contacts]).unwrap();
        let help = registry.help_lines();

        assert_eq!(help.len(), 6);
        assert_eq!(help[0], "List of supported commands:");
        assert!(help[1].trim_start().starts_with("h|help"));
        assert!(help[2].trim_start().starts_with("q|exit"));
        assert!(help[3].trim_start().starts_with("add-contact [Name]"));
        assert!(help[4].trim_start().starts_with("show-contacts"));
        assert_eq!(help[5], "");
    }

    #[test]
    fn sorted_tokens_are_lexical() {
        let shell = shell();
        let contacts = contacts();
        let registry = CommandRegistry::register_all(&[&shell, &contacts]).unwrap();
        assert_eq!(
            registry.sorted_tokens(),
            vec!["add-contact", "exit", "h", "help", "q", "show-contacts"]
        );
    }
}
