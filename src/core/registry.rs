// src/core/registry.rs

//! The name table: every command is reachable under its lower-cased
//! canonical name and every lower-cased alias, all pointing at one shared
//! definition. Collisions are resolved last-write-wins and logged.

use crate::core::command::Command;
use crate::error::SetupError;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Normalized registration input: one definition or a flattened batch.
/// Anything registerable converges here first; invalid shapes have no
/// constructor, and invalid definitions fail at insertion.
pub enum Registration<C> {
    Single(Arc<dyn Command<C>>),
    Many(Vec<Arc<dyn Command<C>>>),
}

impl<C: Send + Sync> Registration<C> {
    /// An owned command value.
    pub fn one<T>(command: T) -> Self
    where
        T: Command<C> + 'static,
    {
        Self::Single(Arc::new(command))
    }

    /// An already-shared handle.
    pub fn shared(command: Arc<dyn Command<C>>) -> Self {
        Self::Single(command)
    }

    /// A batch, flattened recursively. Map inputs register their values and
    /// ignore their keys: pass `map.into_values()`.
    pub fn many<I>(registrations: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        let mut flattened = Vec::new();
        for registration in registrations {
            match registration {
                Self::Single(command) => flattened.push(command),
                Self::Many(commands) => flattened.extend(commands),
            }
        }
        Self::Many(flattened)
    }
}

impl<C: Send + Sync> std::fmt::Debug for Registration<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Single(command) => write!(f, "Registration::Single({})", command.spec().name),
            Self::Many(commands) => write!(f, "Registration::Many(len={})", commands.len()),
        }
    }
}

/// Lower-cased key → shared definition.
pub struct Registry<C> {
    commands: HashMap<String, Arc<dyn Command<C>>>,
}

impl<C: Send + Sync> Default for Registry<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Send + Sync> Registry<C> {
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Inserts every definition the registration normalized to.
    pub fn register(&mut self, registration: Registration<C>) -> Result<(), SetupError> {
        match registration {
            Registration::Single(command) => self.add(command),
            Registration::Many(commands) => {
                for command in commands {
                    self.add(command)?;
                }
                Ok(())
            }
        }
    }

    /// Sugar for a single owned command.
    pub fn register_command<T>(&mut self, command: T) -> Result<(), SetupError>
    where
        T: Command<C> + 'static,
    {
        self.register(Registration::one(command))
    }

    /// Registers a zero-argument-constructible command type.
    pub fn register_type<T>(&mut self) -> Result<(), SetupError>
    where
        T: Command<C> + Default + 'static,
    {
        self.register(Registration::one(T::default()))
    }

    fn add(&mut self, command: Arc<dyn Command<C>>) -> Result<(), SetupError> {
        let spec = command.spec();
        if spec.name.trim().is_empty() {
            return Err(SetupError::UnnamedCommand);
        }
        for alias in &spec.aliases {
            if alias.trim().is_empty() {
                return Err(SetupError::EmptyAlias {
                    name: spec.name.clone(),
                });
            }
        }
        for name in spec.names() {
            let key = name.to_lowercase();
            if let Some(previous) = self.commands.insert(key.clone(), Arc::clone(&command)) {
                if !Arc::ptr_eq(&previous, &command) {
                    log::warn!(
                        "Registry key '{}' reassigned from '{}' to '{}'",
                        key,
                        previous.spec().name,
                        command.spec().name
                    );
                }
            }
        }
        Ok(())
    }

    /// Removes this definition's keys. A key that a later registration has
    /// already taken over is left untouched.
    pub fn unregister(&mut self, command: &Arc<dyn Command<C>>) {
        for name in command.spec().names() {
            let key = name.to_lowercase();
            let still_owned = self
                .commands
                .get(&key)
                .is_some_and(|current| Arc::ptr_eq(current, command));
            if still_owned {
                self.commands.remove(&key);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Command<C>>> {
        self.commands.get(&name.to_lowercase()).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(&name.to_lowercase())
    }

    /// Number of registered keys, aliases included.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Every registered key, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.commands.keys().cloned().collect();
        names.sort();
        names
    }

    /// `(key, definition)` pairs sorted by key; alias keys included.
    pub fn entries(&self) -> Vec<(String, Arc<dyn Command<C>>)> {
        let mut entries: Vec<(String, Arc<dyn Command<C>>)> = self
            .commands
            .iter()
            .map(|(key, command)| (key.clone(), Arc::clone(command)))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Unique definitions in key order, aliases deduplicated.
    pub fn commands(&self) -> Vec<Arc<dyn Command<C>>> {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for (_, command) in self.entries() {
            let ptr = Arc::as_ptr(&command) as *const () as usize;
            if seen.insert(ptr) {
                unique.push(command);
            }
        }
        unique
    }
}

impl<C> std::fmt::Debug for Registry<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("keys", &self.commands.len())
            .finish()
    }
}

// MARK: --- UNIT TESTS ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::command::CommandSpec;

    struct Stub {
        spec: CommandSpec,
    }

    impl Stub {
        fn new(name: &str, aliases: &[&str]) -> Self {
            Self {
                spec: CommandSpec::new(name).aliases(aliases.iter().copied()),
            }
        }
    }

    impl Default for Stub {
        fn default() -> Self {
            Self::new("stub", &[])
        }
    }

    impl Command<()> for Stub {
        fn spec(&self) -> &CommandSpec {
            &self.spec
        }
    }

    #[test]
    fn register_fans_out_lowercased_aliases() {
        let mut registry: Registry<()> = Registry::new();
        registry.register_command(Stub::new("Ban", &["B", "hammer"])).unwrap();
        assert_eq!(registry.len(), 3);
        assert!(registry.contains("ban"));
        assert!(registry.contains("b"));
        assert!(registry.contains("HAMMER"));
    }

    #[test]
    fn many_flattens_recursively() {
        let mut registry: Registry<()> = Registry::new();
        let batch = Registration::many([
            Registration::one(Stub::new("a", &[])),
            Registration::many([
                Registration::one(Stub::new("b", &[])),
                Registration::one(Stub::new("c", &[])),
            ]),
        ]);
        registry.register(batch).unwrap();
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn map_values_register_and_keys_are_ignored() {
        let mut registry: Registry<()> = Registry::new();
        let mut map = HashMap::new();
        map.insert("whatever".to_string(), Registration::one(Stub::new("real", &[])));
        registry.register(Registration::many(map.into_values())).unwrap();
        assert!(registry.contains("real"));
        assert!(!registry.contains("whatever"));
    }

    #[test]
    fn empty_name_is_a_configuration_error() {
        let mut registry: Registry<()> = Registry::new();
        let err = registry.register_command(Stub::new("", &[])).unwrap_err();
        assert!(matches!(err, SetupError::UnnamedCommand));
    }

    #[test]
    fn empty_alias_is_a_configuration_error() {
        let mut registry: Registry<()> = Registry::new();
        let err = registry.register_command(Stub::new("ok", &[" "])).unwrap_err();
        assert!(matches!(err, SetupError::EmptyAlias { .. }));
    }

    #[test]
    fn collision_is_last_write_wins() {
        let mut registry: Registry<()> = Registry::new();
        registry.register_command(Stub::new("first", &["shared"])).unwrap();
        registry.register_command(Stub::new("second", &["shared"])).unwrap();
        let winner = registry.get("shared").unwrap();
        assert_eq!(winner.spec().name, "second");
        // The earlier definition stays reachable under its own name.
        assert!(registry.contains("first"));
    }

    #[test]
    fn unregister_leaves_taken_over_keys_alone() {
        let mut registry: Registry<()> = Registry::new();
        let first: Arc<dyn Command<()>> = Arc::new(Stub::new("first", &["shared"]));
        registry.register(Registration::shared(Arc::clone(&first))).unwrap();
        registry.register_command(Stub::new("second", &["shared"])).unwrap();

        registry.unregister(&first);

        assert!(!registry.contains("first"));
        // "shared" now belongs to "second" and must survive.
        assert_eq!(registry.get("shared").unwrap().spec().name, "second");
    }

    #[test]
    fn commands_deduplicates_alias_entries() {
        let mut registry: Registry<()> = Registry::new();
        registry.register_command(Stub::new("ban", &["b"])).unwrap();
        registry.register_command(Stub::new("echo", &[])).unwrap();
        let unique = registry.commands();
        assert_eq!(unique.len(), 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn register_type_uses_default() {
        let mut registry: Registry<()> = Registry::new();
        registry.register_type::<Stub>().unwrap();
        assert!(registry.contains("stub"));
    }

    #[test]
    fn registration_debug_names_its_shape() {
        let single = Registration::<()>::one(Stub::default());
        assert_eq!(format!("{single:?}"), "Registration::Single(stub)");

        let many = Registration::many([single]);
        assert_eq!(format!("{many:?}"), "Registration::Many(len=1)");
    }
}
