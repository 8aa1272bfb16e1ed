use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use super::layout::write_json;
use super::ArtifactError;

/// Merges the two filtered agent outputs into a single record.
///
/// The extraction output contributes its keys first; the document-type
/// output is layered on top, so on a key collision the document-type
/// checker wins. Both inputs must be JSON objects.
pub fn merge_model_outputs(
    extractor_path: &Path,
    doc_type_path: &Path,
    output_path: &Path,
) -> Result<Map<String, Value>, ArtifactError> {
    let extraction = read_object(extractor_path)?;
    let doc_type = read_object(doc_type_path)?;

    let mut merged = extraction;
    for (key, value) in doc_type {
        merged.insert(key, value);
    }

    write_json(output_path, &merged)?;
    Ok(merged)
}

fn read_object(path: &Path) -> Result<Map<String, Value>, ArtifactError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ArtifactError::NotAnObject(format!(
            "{}: {other}",
            path.display()
        ))),
    }
}
