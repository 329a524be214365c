//! Environment scopes and the engine-wide scope manager

use std::collections::HashMap;

use thiserror::Error;

use crate::shell::Command;

use super::{AnyVariable, VarValue, Variable};

/// Errors raised by scope registration and lookup
#[derive(Error, Debug)]
pub enum EnvError {
    /// A variable or command with this name already exists in the scope
    #[error("scope '{scope}' already has an entry named '{name}'")]
    DuplicateName {
        /// Scope name
        scope: String,
        /// Rejected entry name
        name: String,
    },

    /// A scope with this name already exists
    #[error("a scope named '{0}' already exists")]
    DuplicateScope(String),

    /// No scope with this name exists
    #[error("no scope named '{0}'")]
    UnknownScope(String),
}

/// A namespace holding variables and commands
///
/// Names are unique within a scope across both kinds of entry, so `help` and
/// tab-completion style consumers can treat the scope as one flat namespace.
pub struct Environment {
    name: String,
    variables: HashMap<String, Box<dyn AnyVariable>>,
    commands: HashMap<String, Box<dyn Command>>,
}

impl Environment {
    /// Create an empty scope.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variables: HashMap::new(),
            commands: HashMap::new(),
        }
    }

    /// The scope's name (the owning module's id, or the engine root).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register a variable handle into this scope.
    ///
    /// The caller keeps (clones of) the typed handle; the scope stores a
    /// type-erased view for the shell. Fails if the name is already taken by
    /// a variable or a command; nothing is registered in that case.
    pub fn add_variable<T: VarValue>(&mut self, variable: Variable<T>) -> Result<(), EnvError> {
        let name = variable.name().to_string();
        if self.is_taken(&name) {
            return Err(EnvError::DuplicateName {
                scope: self.name.clone(),
                name,
            });
        }
        self.variables.insert(name, Box::new(variable));
        Ok(())
    }

    /// Recover the typed handle for a variable of type `T`.
    ///
    /// Returns `None` when the name is unknown or registered with a
    /// different type.
    pub fn variable<T: VarValue>(&self, name: &str) -> Option<Variable<T>> {
        self.variables
            .get(name)?
            .as_any()
            .downcast_ref::<Variable<T>>()
            .cloned()
    }

    /// Type-erased view of a variable, if present.
    pub fn any_variable(&self, name: &str) -> Option<&dyn AnyVariable> {
        self.variables.get(name).map(Box::as_ref)
    }

    /// Iterator over all variables in this scope (unspecified order).
    pub fn variables(&self) -> impl Iterator<Item = &dyn AnyVariable> {
        self.variables.values().map(Box::as_ref)
    }

    /// Register a command into this scope.
    ///
    /// Fails if the name is already taken by a variable or a command.
    pub fn add_command(&mut self, command: Box<dyn Command>) -> Result<(), EnvError> {
        let name = command.name().to_string();
        if self.is_taken(&name) {
            return Err(EnvError::DuplicateName {
                scope: self.name.clone(),
                name,
            });
        }
        self.commands.insert(name, command);
        Ok(())
    }

    /// Look up a command by exact (case-sensitive) name.
    pub fn command(&self, name: &str) -> Option<&dyn Command> {
        self.commands.get(name).map(Box::as_ref)
    }

    /// Iterator over all commands in this scope (unspecified order).
    pub fn commands(&self) -> impl Iterator<Item = &dyn Command> {
        self.commands.values().map(Box::as_ref)
    }

    fn is_taken(&self, name: &str) -> bool {
        self.variables.contains_key(name) || self.commands.contains_key(name)
    }
}

/// The engine's scope set: one root scope plus one scope per module
///
/// Scopes are kept in module registration order, which makes unqualified
/// lookups deterministic.
pub struct Environments {
    root: Environment,
    scopes: Vec<Environment>,
}

/// Name of the root scope owned by the engine itself.
pub const ROOT_SCOPE: &str = "engine";

impl Environments {
    /// Create a manager holding only the root scope.
    pub fn new() -> Self {
        Self {
            root: Environment::new(ROOT_SCOPE),
            scopes: Vec::new(),
        }
    }

    /// The engine root scope.
    pub fn root(&self) -> &Environment {
        &self.root
    }

    /// Mutable access to the engine root scope.
    pub fn root_mut(&mut self) -> &mut Environment {
        &mut self.root
    }

    /// Create a new module scope.
    pub fn add_scope(&mut self, name: impl Into<String>) -> Result<&mut Environment, EnvError> {
        let name = name.into();
        if name == ROOT_SCOPE || self.scopes.iter().any(|scope| scope.name() == name) {
            return Err(EnvError::DuplicateScope(name));
        }
        self.scopes.push(Environment::new(name));
        Ok(self.scopes.last_mut().expect("scope was just pushed"))
    }

    /// Scope lookup by name; the root scope is addressable by its name too.
    pub fn scope(&self, name: &str) -> Option<&Environment> {
        if name == ROOT_SCOPE {
            return Some(&self.root);
        }
        self.scopes.iter().find(|scope| scope.name() == name)
    }

    /// Mutable scope lookup by name.
    pub fn scope_mut(&mut self, name: &str) -> Option<&mut Environment> {
        if name == ROOT_SCOPE {
            return Some(&mut self.root);
        }
        self.scopes.iter_mut().find(|scope| scope.name() == name)
    }

    /// Iterator over every scope: root first, then module scopes in
    /// registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Environment> {
        std::iter::once(&self.root).chain(self.scopes.iter())
    }

    /// Resolve a variable by path.
    ///
    /// `"name"` searches the root scope and then module scopes in
    /// registration order; `"scope.name"` addresses one scope explicitly.
    pub fn find_variable(&self, path: &str) -> Option<&dyn AnyVariable> {
        if let Some((scope, name)) = path.split_once('.') {
            return self.scope(scope)?.any_variable(name);
        }
        self.iter().find_map(|scope| scope.any_variable(path))
    }

    /// Resolve a command by name, searching the root scope and then module
    /// scopes in registration order (case-sensitive).
    pub fn find_command(&self, name: &str) -> Option<&dyn Command> {
        self.iter().find_map(|scope| scope.command(name))
    }
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}
