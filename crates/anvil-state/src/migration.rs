//! Schema-versioned `state.json` migration (spec.md §4.7): "on load, older
//! versions are migrated in-memory; writes always use the current
//! schema." Grounded in (but far smaller than) `vx-migration`'s
//! `Migration` trait + registry — that crate's pluggable hooks/dry-run/
//! rollback framework solves cross-project manifest migration; spec.md's
//! state file has exactly one evolving shape, so this is a single
//! `fn(version, Value) -> Value` step table instead.

use serde_json::{json, Value};

use crate::error::{Result, StateError};
use crate::model::CURRENT_SCHEMA_VERSION;

/// Migrate `value` (the raw JSON parsed from `state.json`) forward to
/// [`CURRENT_SCHEMA_VERSION`], applying one step per version gap. A
/// document from a schema newer than this build understands is rejected
/// rather than guessed at.
pub fn migrate_to_current(mut value: Value) -> Result<Value> {
    let mut version = value.get("schema_version").and_then(Value::as_u64).unwrap_or(0) as u32;

    if version > CURRENT_SCHEMA_VERSION {
        return Err(StateError::UnknownSchemaVersion(version));
    }

    while version < CURRENT_SCHEMA_VERSION {
        value = apply_step(version, value)?;
        version += 1;
    }
    Ok(value)
}

fn apply_step(from_version: u32, mut value: Value) -> Result<Value> {
    match from_version {
        // Bootstrap: documents written before `schema_version` existed (or
        // a brand-new, all-defaults document) become a well-formed v1.
        0 => {
            if let Some(obj) = value.as_object_mut() {
                obj.entry("tools").or_insert_with(|| json!({}));
                obj.entry("libraries").or_insert_with(|| json!({}));
                obj.insert("schema_version".to_string(), json!(1));
            }
            Ok(value)
        }
        other => Err(StateError::UnknownSchemaVersion(other)),
    }
}
