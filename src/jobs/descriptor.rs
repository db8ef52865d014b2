//! Descriptor claiming and parsing
//!
//! Claiming renames the descriptor to `<job_id>.tmp` inside the queue
//! folder. The rename is the mutual-exclusion primitive: whichever sweep
//! wins the rename owns the job, and a crashed run leaves the working
//! file behind as a durable failure record.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;
use tokio::fs;
use uuid::Uuid;

use crate::errors::DescriptorError;

/// Characters that cannot appear in output file names
static ILLEGAL_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("hardcoded pattern"));
/// Runs of separator dashes left over after joining empty parts
static DASH_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-{2,}").expect("hardcoded pattern"));

/// A claimed descriptor before validation and typed conversion
///
/// Sections stay raw `serde_yaml::Value`s so the validator can report
/// missing or mistyped sections as check failures rather than parse
/// errors.
#[derive(Debug, Clone)]
pub struct ClaimedDescriptor {
    pub papermill: Option<Value>,
    pub exec: Option<Value>,
    /// Derived, filesystem-safe identifier
    pub identifier: String,
    /// Identifier keys in declaration order
    pub identifier_keys: Vec<String>,
    pub source_file: PathBuf,
    pub working_file: PathBuf,
}

/// Claim a descriptor file and parse its YAML body
///
/// The source file is renamed to `<job_id>.tmp` first; everything after
/// that operates on the working file only.
pub async fn claim_and_parse(
    source: &Path,
    job_id: Uuid,
) -> Result<ClaimedDescriptor, DescriptorError> {
    let working_file = source.with_file_name(format!("{job_id}.tmp"));
    fs::rename(source, &working_file)
        .await
        .map_err(|err| DescriptorError::Claim {
            path: source.to_path_buf(),
            source: err,
        })?;

    let text = fs::read_to_string(&working_file)
        .await
        .map_err(|err| DescriptorError::Read {
            path: working_file.clone(),
            source: err,
        })?;
    let document: Value = serde_yaml::from_str(&text)?;
    if document.as_mapping().is_none() {
        return Err(DescriptorError::NotAMapping);
    }

    let papermill = document.get("papermill").cloned();
    let exec = document.get("exec").cloned();
    let identifier_keys = identifier_keys(exec.as_ref());
    let identifier = derive_identifier(&identifier_keys, papermill.as_ref())?;

    Ok(ClaimedDescriptor {
        papermill,
        exec,
        identifier,
        identifier_keys,
        source_file: source.to_path_buf(),
        working_file,
    })
}

/// Extract identifier keys from the raw exec section
///
/// Lenient on shape: anything that is not a string or a sequence of
/// strings yields no keys here and is rejected by the validator instead.
fn identifier_keys(exec: Option<&Value>) -> Vec<String> {
    match exec.and_then(|value| value.get("identifier")) {
        Some(Value::String(key)) => vec![key.clone()],
        Some(Value::Sequence(keys)) => keys
            .iter()
            .filter_map(|key| key.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

/// Join the named papermill values into a filesystem-safe identifier
///
/// Missing keys contribute an empty part (the validator rejects them
/// afterwards); scalar values are rendered as text; structured values are
/// an error since they cannot name a file.
fn derive_identifier(
    keys: &[String],
    papermill: Option<&Value>,
) -> Result<String, DescriptorError> {
    let mut parts = Vec::with_capacity(keys.len());
    for key in keys {
        match papermill.and_then(|value| value.get(key.as_str())) {
            None | Some(Value::Null) => parts.push(String::new()),
            Some(Value::String(text)) => parts.push(text.clone()),
            Some(Value::Number(number)) => parts.push(number.to_string()),
            Some(Value::Bool(flag)) => parts.push(flag.to_string()),
            Some(_) => {
                return Err(DescriptorError::NonScalarIdentifier { key: key.clone() });
            }
        }
    }
    Ok(safe_file_name(&parts.join("-")))
}

/// Replace filesystem-illegal characters with `-` and collapse the
/// separator runs that empty parts leave behind
fn safe_file_name(raw: &str) -> String {
    let replaced = ILLEGAL_CHARS.replace_all(raw, "-");
    DASH_RUNS.replace_all(&replaced, "-").into_owned()
}
