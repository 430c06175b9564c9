//! Input-schema generation for catalog tools.
//!
//! Tool inputs are plain structs deriving `schemars::JsonSchema`; this
//! module turns them into the Draft 2020-12 object schemas the MCP protocol
//! expects, with `Option<T>` fields marked nullable, cached per `TypeId` so
//! repeated catalog builds don't regenerate.

use schemars::generate::SchemaSettings;
use schemars::transform::AddNullable;
use schemars::{JsonSchema, Schema};
use serde_json::Value;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

thread_local! {
    static CACHE_FOR_TYPE: RefCell<HashMap<TypeId, Arc<Schema>>> = RefCell::new(HashMap::new());
}

fn settings() -> SchemaSettings {
    SchemaSettings::draft2020_12().with_transform(AddNullable::default())
}

/// Cached Draft 2020-12 schema for `T`.
pub fn cached_schema_for<T: JsonSchema + 'static>() -> Arc<Schema> {
    CACHE_FOR_TYPE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(schema) = cache.get(&TypeId::of::<T>()) {
            return Arc::clone(schema);
        }
        let generator = settings().into_generator();
        let root = generator.into_root_schema_for::<T>();
        let arc = Arc::new(root);
        cache.insert(TypeId::of::<T>(), Arc::clone(&arc));
        arc
    })
}

/// The schema for `T` as a JSON value, for embedding in a tool descriptor.
pub fn input_schema_value<T: JsonSchema + 'static>() -> Value {
    serde_json::to_value(cached_schema_for::<T>().as_ref())
        .unwrap_or_else(|_| serde_json::json!({"type": "object"}))
}
