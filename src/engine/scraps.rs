//! Scrap extraction from executed notebooks
//!
//! Notebooks persist named output values ("scraps") as display outputs
//! whose data mapping carries the scrapbook media type. Each payload is
//! an object with `name` and `data` fields. Cells or outputs that do not
//! match the shape are skipped rather than rejected, since third-party
//! kernels attach all sorts of extra output.

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;
use tokio::fs;

use crate::errors::ScrapError;

/// Media type scrapbook uses for JSON-encoded scraps
const SCRAP_MEDIA_TYPE: &str = "application/scrapbook.scrap.json+data";

/// Name of the scrap that flags a notebook as having findings
pub const FINDINGS_SCRAP: &str = "Findings";

/// Read all named scraps from an executed notebook artifact
pub async fn read_scraps(path: &Path) -> Result<HashMap<String, Value>, ScrapError> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|err| ScrapError::Read {
            path: path.to_path_buf(),
            source: err,
        })?;
    let notebook: Value = serde_json::from_str(&text)?;

    let mut scraps = HashMap::new();
    let cells = notebook
        .get("cells")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    for cell in cells {
        let outputs = cell
            .get("outputs")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for output in outputs {
            let output_type = output.get("output_type").and_then(Value::as_str);
            if !matches!(output_type, Some("display_data" | "execute_result")) {
                continue;
            }
            let Some(payload) = output
                .get("data")
                .and_then(|data| data.get(SCRAP_MEDIA_TYPE))
            else {
                continue;
            };
            collect_payload(payload, &mut scraps);
        }
    }
    Ok(scraps)
}

/// Accept a single scrap object or a list of them
fn collect_payload(payload: &Value, scraps: &mut HashMap<String, Value>) {
    match payload {
        Value::Array(items) => {
            for item in items {
                collect_payload(item, scraps);
            }
        }
        Value::Object(object) => {
            if let (Some(name), Some(data)) = (
                object.get("name").and_then(Value::as_str),
                object.get("data"),
            ) {
                scraps.insert(name.to_string(), data.clone());
            }
        }
        _ => {}
    }
}

/// JSON truthiness for scrap values: null, false, zero, empty string and
/// empty containers are falsy
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64() != Some(0.0),
        Value::String(text) => !text.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(object) => !object.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Minimal executed-notebook JSON with one scrap output
    fn notebook_with_scrap(name: &str, data: Value) -> String {
        serde_json::json!({
            "cells": [
                {
                    "cell_type": "code",
                    "outputs": [
                        {
                            "output_type": "display_data",
                            "data": {
                                (SCRAP_MEDIA_TYPE): {
                                    "name": name,
                                    "data": data,
                                    "encoder": "json",
                                    "version": 1
                                }
                            }
                        }
                    ]
                }
            ],
            "metadata": {},
            "nbformat": 4,
            "nbformat_minor": 5
        })
        .to_string()
    }

    #[tokio::test]
    async fn finds_named_scrap() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("executed.ipynb");
        std::fs::write(&path, notebook_with_scrap("Findings", Value::Bool(true))).unwrap();

        let scraps = read_scraps(&path).await.unwrap();
        assert_eq!(scraps.get(FINDINGS_SCRAP), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn scrapless_notebook_yields_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("executed.ipynb");
        let body = serde_json::json!({
            "cells": [
                {
                    "cell_type": "code",
                    "outputs": [
                        { "output_type": "stream", "text": "hello" }
                    ]
                },
                { "cell_type": "markdown" }
            ],
            "nbformat": 4
        });
        std::fs::write(&path, body.to_string()).unwrap();

        let scraps = read_scraps(&path).await.unwrap();
        assert!(scraps.is_empty());
    }

    #[tokio::test]
    async fn malformed_json_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.ipynb");
        std::fs::write(&path, "not json").unwrap();
        assert!(matches!(
            read_scraps(&path).await.unwrap_err(),
            ScrapError::Json(_)
        ));
    }

    #[test]
    fn truthiness_rules() {
        assert!(is_truthy(&Value::Bool(true)));
        assert!(is_truthy(&serde_json::json!("anything")));
        assert!(is_truthy(&serde_json::json!(["x"])));
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&serde_json::json!(0)));
        assert!(!is_truthy(&serde_json::json!("")));
        assert!(!is_truthy(&serde_json::json!({})));
    }
}
