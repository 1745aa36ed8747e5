//! Static command declarations.

/// One command token contributed by a provider.
///
/// Aliases share the same `usage` string, which is also the key used to
/// collapse them into a single help line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandSpec {
    /// Word typed by the user, e.g. `add-contact`.
    pub token: &'static str,
    /// Usage shown in help and in argument-shape errors, e.g. `h|help`.
    pub usage: &'static str,
    /// One-line description.
    pub help: &'static str,
}

impl CommandSpec {
    pub const fn new(token: &'static str, usage: &'static str, help: &'static str) -> Self {
        Self { token, usage, help }
    }
}
