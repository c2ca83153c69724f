use crate::adapter::{Adapter, call_adapter};
use crate::error::{AdapterError, RegistryError};
use crate::path::bfs_shortest_path;
use collection::{Collection, CollectionDef};
use core_types::Context;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// What the registry knows about one collection.
#[derive(Clone)]
pub struct RegistryEntry {
    pub def: Arc<CollectionDef>,
    /// Adapters that take this collection as input.
    pub registered_adapters: Vec<Arc<dyn Adapter>>,
    /// Collections that have an adapter into this one.
    pub adaptable_from: Vec<Arc<CollectionDef>>,
}

impl std::fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("def", &self.def.qualified_name())
            .field(
                "registered_adapters",
                &self.registered_adapters.iter().map(|a| a.name()).collect::<Vec<_>>(),
            )
            .field(
                "adaptable_from",
                &self.adaptable_from.iter().map(|d| d.qualified_name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

/// Collection definitions keyed by qualified name, and the adapters between them.
#[derive(Debug, Default)]
pub struct Registry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_collection(&mut self, def: Arc<CollectionDef>) -> Result<(), RegistryError> {
        let name = def.qualified_name();
        if self.entries.contains_key(&name) {
            return Err(RegistryError::AlreadyRegistered(name));
        }
        tracing::debug!(collection = %name, "registered collection");
        self.entries.insert(
            name,
            RegistryEntry {
                def,
                registered_adapters: Vec::new(),
                adaptable_from: Vec::new(),
            },
        );
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Result<&RegistryEntry, RegistryError> {
        self.entries
            .get(name)
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Registers an adapter between two registered collections.
    pub fn register_adapter(&mut self, adapter: Arc<dyn Adapter>) -> Result<(), RegistryError> {
        let from = adapter.from_collection().qualified_name();
        let target = adapter.target_collection().qualified_name();
        self.entry(&from)?;
        self.entry(&target)?;

        let from_def = Arc::clone(adapter.from_collection());
        tracing::debug!(adapter = %adapter.name(), "registered adapter");
        if let Some(entry) = self.entries.get_mut(&from) {
            entry.registered_adapters.push(adapter);
        }
        if let Some(entry) = self.entries.get_mut(&target) {
            entry.adaptable_from.push(from_def);
        }
        Ok(())
    }

    /// Every registered collection whose schema is named `schema_name`.
    pub fn collections_for_schema(&self, schema_name: &str) -> Vec<Arc<CollectionDef>> {
        self.entries
            .values()
            .filter(|e| e.def.schema().name() == schema_name)
            .map(|e| Arc::clone(&e.def))
            .collect()
    }

    fn adapter_graph(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.entries
            .iter()
            .map(|(name, entry)| {
                let targets = entry
                    .registered_adapters
                    .iter()
                    .map(|a| a.target_collection().qualified_name())
                    .collect();
                (name.clone(), targets)
            })
            .collect()
    }

    /// The shortest chain of adapters leading from `from` to `to`. Empty when
    /// there is no chain.
    pub fn adapter_path(&self, from: &str, to: &str) -> Result<Vec<Arc<dyn Adapter>>, RegistryError> {
        self.entry(from)?;
        self.entry(to)?;

        let Some(nodes) = bfs_shortest_path(&self.adapter_graph(), &from.to_string(), &to.to_string()) else {
            return Ok(Vec::new());
        };

        let mut chain = Vec::with_capacity(nodes.len().saturating_sub(1));
        for step in nodes.windows(2) {
            let entry = self.entry(&step[0])?;
            if let Some(adapter) = entry
                .registered_adapters
                .iter()
                .find(|a| a.target_collection().qualified_name() == step[1])
            {
                chain.push(Arc::clone(adapter));
            }
        }
        Ok(chain)
    }

    /// Adapts `input` into a collection named `target` along the shortest
    /// adapter chain.
    ///
    /// Each adapter sees the context accumulated so far; its output context is
    /// merged in, later keys winning. Returns the final collection and context.
    pub fn adapt(
        &self,
        input: &Collection,
        target: &str,
        context: Context,
    ) -> Result<(Collection, Context), AdapterError> {
        let from = input.def().qualified_name();
        let chain = self.adapter_path(&from, target)?;
        if chain.is_empty() {
            tracing::error!(%from, to = %target, "no adapter chain");
            return Err(AdapterError::NoPath {
                from,
                to: target.to_string(),
            });
        }
        tracing::info!(%from, to = %target, steps = chain.len(), "resolved adapter chain");

        let mut context = context;
        let mut current: Option<Collection> = None;
        for (step, adapter) in chain.iter().enumerate() {
            let source = current.as_ref().unwrap_or(input);
            let output = call_adapter(adapter.as_ref(), source, &context).map_err(|source| {
                tracing::error!(step, adapter = %adapter.name(), error = %source, "adapter failed");
                AdapterError::Chain {
                    step,
                    adapter: adapter.name(),
                    source: Box::new(source),
                }
            })?;
            tracing::debug!(step, adapter = %adapter.name(), records = output.collection.len(), "adapter step done");

            let (collection, produced) = output.into_parts();
            context.extend(produced);
            current = Some(collection);
        }

        let collection = current.ok_or_else(|| AdapterError::NoPath {
            from,
            to: target.to_string(),
        })?;
        Ok((collection, context))
    }
}
