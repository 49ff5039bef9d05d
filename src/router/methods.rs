//! Per-route mapping from HTTP method to handler.

use std::fmt;

use super::Handler;
use crate::http::Method;

/// Handlers of one compiled route, keyed by method, in registration order.
///
/// Registering a method that is already present replaces its handler; the
/// original position is kept so diagnostics stay stable.
#[derive(Clone, Default)]
pub struct MethodTable {
    entries: Vec<(Method, Handler)>,
}

impl MethodTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `method` to `handler`, overwriting a previous registration.
    pub fn register(&mut self, method: Method, handler: Handler) {
        match self.entries.iter_mut().find(|(m, _)| *m == method) {
            Some(entry) => entry.1 = handler,
            None => self.entries.push((method, handler)),
        }
    }

    pub fn get(&self, method: &Method) -> Option<&Handler> {
        self.entries
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, handler)| handler)
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.get(method).is_some()
    }

    /// Registered methods in registration order.
    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.entries.iter().map(|(m, _)| m)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.methods()).finish()
    }
}
