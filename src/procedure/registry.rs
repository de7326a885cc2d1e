// src/procedure/registry.rs

//! Explicit procedure registry.
//!
//! Procedures are resolved once, at worker construction, from the stable
//! identifier a result sink carries.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::anyhow;

use crate::procedure::Procedure;
use crate::sink::Parameters;

pub type ProcedureFactory =
    Box<dyn Fn(&Parameters) -> anyhow::Result<Box<dyn Procedure>> + Send + Sync>;

#[derive(Default)]
pub struct ProcedureRegistry {
    factories: BTreeMap<String, ProcedureFactory>,
}

impl fmt::Debug for ProcedureRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcedureRegistry")
            .field("ids", &self.factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ProcedureRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `id`, replacing any previous one.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn(&Parameters) -> anyhow::Result<Box<dyn Procedure>> + Send + Sync + 'static,
    {
        self.factories.insert(id.into(), Box::new(factory));
        self
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    /// Build the procedure registered under `id`.
    pub fn resolve(&self, id: &str, params: &Parameters) -> anyhow::Result<Box<dyn Procedure>> {
        let factory = self
            .factories
            .get(id)
            .ok_or_else(|| anyhow!("no procedure registered under '{id}'"))?;
        factory(params)
    }
}
