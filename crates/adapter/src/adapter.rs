use crate::error::AdapterError;
use collection::{Collection, CollectionDef, IntoRecords};
use core_types::Context;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Turns a collection of one definition into a collection of another.
///
/// Implementations build their result with `AdapterOutput::render`, which also
/// carries context values on to the next adapter of a chain.
pub trait Adapter: Send + Sync {
    fn from_collection(&self) -> &Arc<CollectionDef>;

    fn target_collection(&self) -> &Arc<CollectionDef>;

    fn adapt(&self, input: &Collection, context: &Context) -> Result<AdapterOutput, AdapterError>;

    /// Used in logs and errors.
    fn name(&self) -> String {
        format!(
            "{} -> {}",
            self.from_collection().qualified_name(),
            self.target_collection().qualified_name()
        )
    }
}

/// The adapted collection plus any context the adapter wants to hand on.
#[derive(Debug, Clone)]
pub struct AdapterOutput {
    pub collection: Collection,
    context: Context,
}

impl AdapterOutput {
    pub fn new(collection: Collection, context: Context) -> Self {
        Self {
            collection,
            context,
        }
    }

    /// Loads `data` into a fresh collection of `target` and wraps it with `context`.
    pub fn render<S: IntoRecords>(
        target: &Arc<CollectionDef>,
        data: S,
        context: Context,
    ) -> Result<Self, AdapterError> {
        let mut collection = Collection::new(Arc::clone(target));
        collection.load_data(data)?;
        Ok(Self::new(collection, context))
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.context.get(key)
    }

    pub fn into_parts(self) -> (Collection, Context) {
        (self.collection, self.context)
    }
}

/// Runs one adapter, checking that the input and the produced collection have
/// the definitions the adapter declares.
pub fn call_adapter(
    adapter: &dyn Adapter,
    input: &Collection,
    context: &Context,
) -> Result<AdapterOutput, AdapterError> {
    if **input.def() != **adapter.from_collection() {
        return Err(AdapterError::InputMismatch {
            adapter: adapter.name(),
            expected: adapter.from_collection().qualified_name(),
            found: input.def().qualified_name(),
        });
    }

    let output = adapter.adapt(input, context)?;

    if **output.collection.def() != **adapter.target_collection() {
        return Err(AdapterError::OutputMismatch {
            adapter: adapter.name(),
            expected: adapter.target_collection().qualified_name(),
            found: output.collection.def().qualified_name(),
        });
    }
    Ok(output)
}
