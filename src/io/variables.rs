//! Load the variable map (`{"B01001_001E": "TOTAL_POP", ...}`).
//!
//! Key order is kept: it drives both fetch order and column order.

use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde_json::{Map, Value};

use crate::domain::{VariableMap, VariableSpec};
use crate::error::AppError;

/// Read and validate a variable map file.
pub fn load_variable_map(path: &Path) -> Result<VariableMap, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::config(format!(
            "Failed to open variable map '{}': {e}",
            path.display()
        ))
    })?;
    let value: Value = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
        AppError::config(format!("Invalid variable map JSON '{}': {e}", path.display()))
    })?;
    parse_variable_map(value)
        .map_err(|e| AppError::config(format!("Variable map '{}': {e}", path.display())))
}

/// Validate an already-parsed variable map document.
pub fn parse_variable_map(value: Value) -> Result<VariableMap, AppError> {
    let Value::Object(object) = value else {
        return Err(AppError::config(
            "expected a JSON object of variable code to column label",
        ));
    };
    from_object(object)
}

fn from_object(object: Map<String, Value>) -> Result<VariableMap, AppError> {
    if object.is_empty() {
        return Err(AppError::config("no variables configured"));
    }

    let mut labels = HashSet::with_capacity(object.len());
    let mut entries = Vec::with_capacity(object.len());

    for (code, label) in object {
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(AppError::config("empty variable code"));
        }
        let label = match label {
            Value::String(s) if !s.trim().is_empty() => s.trim().to_string(),
            other => {
                return Err(AppError::config(format!(
                    "variable {code} needs a non-empty string label, got {other}"
                )));
            }
        };
        if !labels.insert(label.clone()) {
            return Err(AppError::config(format!(
                "label '{label}' is assigned to more than one variable"
            )));
        }
        entries.push(VariableSpec { code, label });
    }

    Ok(VariableMap::new(entries))
}
