//! Assembly of the standard provider set.

use crate::command::{Dispatcher, Provider, RegistryError, ShellProvider};
use crate::contacts::ContactsProvider;
use crate::notes::NotesProvider;
use crate::store::StateGateway;

/// Builds a dispatcher with the shell, contacts and notes providers, in that
/// registration order.
///
/// # Errors
/// - `RegistryError` when two providers declare the same command token.
pub fn build_assistant(gateway: Box<dyn StateGateway>) -> Result<Dispatcher, RegistryError> {
    let stores: Vec<Box<dyn Provider>> = vec![
        Box::new(ContactsProvider::default()),
        Box::new(NotesProvider::default()),
    ];
    Dispatcher::new(ShellProvider::default(), stores, gateway)
}
