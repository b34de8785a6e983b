// src/recipe/schema.rs

//! Reflective schema validation for recipe documents
//!
//! The JSON Schema is derived from the [`Recipe`](super::Recipe) type
//! itself, so the schema can never drift from the model. Validation
//! reports every violation in the document at once rather than stopping
//! at the first; a misauthored recipe usually has several.

use crate::error::{Error, Result};
use jsonschema::Draft;
use schemars::schema_for;
use serde_json::Value;

/// Validate a recipe document against the reflected schema.
///
/// `path` is only used for error reporting. Violations are joined with a
/// newline and tab indent, one per line.
pub(crate) fn validate(path: &str, instance: &Value) -> Result<()> {
    let schema = serde_json::to_value(schema_for!(super::Recipe))?;
    let validator = jsonschema::options()
        .with_draft(Draft::Draft7)
        .build(&schema)
        .map_err(|e| Error::Schema {
            path: path.to_string(),
            violations: e.to_string(),
        })?;

    let violations: Vec<String> = validator
        .iter_errors(instance)
        .map(|err| format!("{}: {}", pointer_label(&err.instance_path.to_string()), err))
        .collect();

    if violations.is_empty() {
        Ok(())
    } else {
        Err(Error::Schema {
            path: path.to_string(),
            violations: violations.join("\n\t"),
        })
    }
}

/// Turn a JSON pointer into the dotted form used in error messages:
/// `/sources/0/b3sum` becomes `sources.0.b3sum`, the root becomes
/// `(root)`.
fn pointer_label(pointer: &str) -> String {
    if pointer.is_empty() {
        "(root)".to_string()
    } else {
        pointer.trim_start_matches('/').replace('/', ".")
    }
}
