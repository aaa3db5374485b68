/*

    Explicit command registry.

    Commands are registered by id at startup and removed again on
    shutdown. Running a command goes through poll first, a command
    whose poll fails or that stops with a cancellation error reports
    Status::Cancelled instead of an error.

    @date: Oct, 2025
    @author: bartu
*/

use std::collections::BTreeMap;

use crate::error::{CageError, CageResult};
use crate::prelude::*;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Status {
    Finished,
    Cancelled,
}

pub trait Command<H: ?Sized> {
    fn id(&self) -> &'static str;
    fn label(&self) -> &'static str;
    fn poll(&self, host: &H) -> bool;
    /// First run, with the host's current selection
    fn invoke(&mut self, host: &mut H) -> CageResult<Status>;
    /// Re-run after parameters changed
    fn execute(&mut self, host: &mut H) -> CageResult<Status>;
}


pub struct CommandRegistry<H: ?Sized> {
    commands: BTreeMap<&'static str, Box<dyn Command<H>>>,
}

impl<H: ?Sized> Default for CommandRegistry<H> {
    fn default() -> Self {
        Self { commands: BTreeMap::new() }
    }
}

impl<H: ?Sized> CommandRegistry<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces a command registered under the same id
    pub fn register(&mut self, command: Box<dyn Command<H>>) {
        let id = command.id();
        if self.commands.insert(id, command).is_some() {
            warn!("Command '{}' was already registered, replacing it", id);
        } else {
            debug!("Registered command '{}'", id);
        }
    }

    pub fn unregister(&mut self, id: &str) -> Option<Box<dyn Command<H>>> {
        let removed = self.commands.remove(id);
        if removed.is_some() {
            debug!("Unregistered command '{}'", id);
        }
        removed
    }

    pub fn contains(&self, id: &str) -> bool {
        self.commands.contains_key(id)
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.commands.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn poll(&self, id: &str, host: &H) -> CageResult<bool> {
        let command = self.commands.get(id).ok_or_else(|| CageError::UnknownCommand(id.to_string()))?;
        Ok(command.poll(host))
    }

    pub fn invoke(&mut self, id: &str, host: &mut H) -> CageResult<Status> {
        let command = self.commands.get_mut(id).ok_or_else(|| CageError::UnknownCommand(id.to_string()))?;
        if !command.poll(host) {
            warn!("{}: nothing to operate on", command.label());
            return Ok(Status::Cancelled);
        }
        Self::settle(command.label(), command.invoke(host))
    }

    pub fn execute(&mut self, id: &str, host: &mut H) -> CageResult<Status> {
        let command = self.commands.get_mut(id).ok_or_else(|| CageError::UnknownCommand(id.to_string()))?;
        Self::settle(command.label(), command.execute(host))
    }

    /// Unregister everything, returns the ids that were removed
    pub fn shutdown(&mut self) -> Vec<&'static str> {
        let ids = self.ids();
        self.commands.clear();
        info!("Unregistered {} command(s)", ids.len());
        ids
    }

    fn settle(label: &str, result: CageResult<Status>) -> CageResult<Status> {
        match result {
            Err(e) if e.is_cancellation() => {
                warn!("{}: {}", label, e);
                Ok(Status::Cancelled)
            }
            other => other,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        value: i32,
    }

    struct Increment {
        invoked: bool,
    }

    impl Command<Counter> for Increment {
        fn id(&self) -> &'static str {
            "test.increment"
        }

        fn label(&self) -> &'static str {
            "Increment"
        }

        fn poll(&self, host: &Counter) -> bool {
            host.value >= 0
        }

        fn invoke(&mut self, host: &mut Counter) -> CageResult<Status> {
            host.value += 1;
            self.invoked = true;
            Ok(Status::Finished)
        }

        fn execute(&mut self, _host: &mut Counter) -> CageResult<Status> {
            if self.invoked {
                Ok(Status::Finished)
            } else {
                Err(CageError::NotInvoked)
            }
        }
    }

    #[test]
    fn test_register_invoke_shutdown() {
        let mut registry: CommandRegistry<Counter> = CommandRegistry::new();
        registry.register(Box::new(Increment { invoked: false }));
        assert!(registry.contains("test.increment"));

        let mut counter = Counter::default();
        // cancellation errors are reported as a status
        assert_eq!(registry.execute("test.increment", &mut counter).unwrap(), Status::Cancelled);
        assert_eq!(registry.invoke("test.increment", &mut counter).unwrap(), Status::Finished);
        assert_eq!(counter.value, 1);
        assert_eq!(registry.execute("test.increment", &mut counter).unwrap(), Status::Finished);

        assert_eq!(registry.shutdown(), vec!["test.increment"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_failed_poll_cancels() {
        let mut registry: CommandRegistry<Counter> = CommandRegistry::new();
        registry.register(Box::new(Increment { invoked: false }));
        let mut counter = Counter { value: -1 };
        assert!(!registry.poll("test.increment", &counter).unwrap());
        assert_eq!(registry.invoke("test.increment", &mut counter).unwrap(), Status::Cancelled);
        assert_eq!(counter.value, -1);
    }

    #[test]
    fn test_unknown_command() {
        let mut registry: CommandRegistry<Counter> = CommandRegistry::new();
        let mut counter = Counter::default();
        assert!(matches!(registry.invoke("nope", &mut counter), Err(CageError::UnknownCommand(_))));
        assert!(registry.unregister("nope").is_none());
    }
}
