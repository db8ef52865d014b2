//! Descriptor parameter validation
//!
//! Checks run in a fixed order and fail fast on the first violation, so a
//! descriptor with several mistakes surfaces one actionable error at a
//! time. Rejected jobs never reach the execution engine.

use std::path::Path;

use serde_yaml::Value;
use tracing::warn;

use crate::errors::ValidationError;
use crate::jobs::descriptor::ClaimedDescriptor;

/// Validate a claimed descriptor against the notebook root
///
/// Check order: exec is a mapping, exec is non-empty, exec.notebook is a
/// string (a missing notebook file only logs), exec.identifier is well
/// shaped, every identifier key resolves to a truthy papermill value, and
/// papermill is a non-empty mapping.
pub fn validate(claimed: &ClaimedDescriptor, notebook_path: &Path) -> Result<(), ValidationError> {
    let exec = match &claimed.exec {
        None => None,
        Some(Value::Mapping(mapping)) => Some(mapping),
        Some(_) => return Err(ValidationError::NotMapping { section: "exec" }),
    };
    let exec = match exec {
        Some(mapping) if !mapping.is_empty() => mapping,
        _ => return Err(ValidationError::Empty { section: "exec" }),
    };

    let notebook = match exec.get("notebook") {
        Some(Value::String(name)) => name,
        _ => {
            return Err(ValidationError::WrongType {
                section: "exec",
                item: "notebook",
                expected: "string",
            });
        }
    };
    // Known weak check: a missing input notebook is logged, not fatal;
    // the engine reports its own error if the file is truly absent.
    let input_path = notebook_path.join(notebook);
    if !input_path.is_file() {
        warn!(
            "failed check exec/notebook: path-exists ({} not found)",
            input_path.display()
        );
    }

    match exec.get("identifier") {
        None | Some(Value::String(_)) => {}
        Some(Value::Sequence(keys)) if keys.iter().all(Value::is_string) => {}
        Some(_) => {
            return Err(ValidationError::WrongType {
                section: "exec",
                item: "identifier",
                expected: "string or sequence of strings",
            });
        }
    }

    if claimed.identifier_keys.is_empty() {
        return Err(ValidationError::IdentifierUnset);
    }
    for key in &claimed.identifier_keys {
        let value = claimed
            .papermill
            .as_ref()
            .and_then(|papermill| papermill.get(key.as_str()));
        if !value.is_some_and(is_truthy) {
            return Err(ValidationError::IdentifierKeyMissing { key: key.clone() });
        }
    }

    match &claimed.papermill {
        Some(Value::Mapping(mapping)) => {
            if mapping.is_empty() {
                return Err(ValidationError::Empty { section: "papermill" });
            }
        }
        _ => return Err(ValidationError::NotMapping { section: "papermill" }),
    }

    Ok(())
}

/// YAML truthiness: null, false, zero, and empty containers are falsy
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() != Some(0.0),
        Value::String(text) => !text.is_empty(),
        Value::Sequence(items) => !items.is_empty(),
        Value::Mapping(mapping) => !mapping.is_empty(),
        Value::Tagged(tagged) => is_truthy(&tagged.value),
    }
}
