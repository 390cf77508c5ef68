//! YAML model declaration loader.
//!
//! Loads model declarations from YAML files and checks the structural rules
//! that do not need other registries (names present, no duplicate fields).

use crate::error::{FieldforgeError, Result};
use crate::model::declaration::{FieldDecl, ModelDecl, ModelSpec};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load all model declarations from a directory
///
/// Only `.yaml` and `.yml` files are read. Files are loaded in name order so
/// registration order is stable across runs.
///
/// # Example
///
/// ```ignore
/// use fieldforge::model::load_models;
///
/// let models = load_models("config/models").unwrap();
/// ```
pub fn load_models<P: AsRef<Path>>(dir: P) -> Result<Vec<ModelDecl>> {
    let dir_path = dir.as_ref();

    if !dir_path.is_dir() {
        return Err(FieldforgeError::configuration(format!(
            "Model directory does not exist: {}",
            dir_path.display()
        )));
    }

    let read_dir = fs::read_dir(dir_path).map_err(|e| {
        FieldforgeError::configuration(format!(
            "Failed to read directory {}: {}",
            dir_path.display(),
            e
        ))
    })?;

    let mut paths = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(|e| {
            FieldforgeError::configuration(format!("Failed to read directory entry: {}", e))
        })?;
        let path = entry.path();

        if let Some(ext) = path.extension() {
            if ext == "yaml" || ext == "yml" {
                paths.push(path);
            }
        }
    }
    paths.sort();

    let mut models = Vec::with_capacity(paths.len());
    for path in paths {
        let model = load_model(&path).map_err(|e| {
            FieldforgeError::configuration(format!("Failed to load {}: {}", path.display(), e))
        })?;
        models.push(model);
    }

    Ok(models)
}

/// Load a single model declaration from a YAML file
pub fn load_model<P: AsRef<Path>>(path: P) -> Result<ModelDecl> {
    let yaml_content = fs::read_to_string(path.as_ref())
        .map_err(|e| FieldforgeError::configuration(format!("Failed to read file: {}", e)))?;

    parse_model(&yaml_content)
}

/// Parse a model declaration from YAML text
pub fn parse_model(yaml_content: &str) -> Result<ModelDecl> {
    let spec: ModelSpec = serde_yaml::from_str(yaml_content)
        .map_err(|e| FieldforgeError::configuration(format!("Failed to parse YAML: {}", e)))?;

    validate_model(&spec.model)?;

    Ok(spec.model)
}

/// Validate model declaration
///
/// Checks for:
/// - Non-empty model name
/// - Non-empty, unique field names
pub fn validate_model(model: &ModelDecl) -> Result<()> {
    if model.name.trim().is_empty() {
        return Err(FieldforgeError::configuration("Model name cannot be empty"));
    }

    let mut seen = HashSet::new();
    for field in &model.fields {
        validate_field(field, &model.name)?;

        if !seen.insert(field.name.as_str()) {
            return Err(FieldforgeError::configuration(format!(
                "Field '{}' is declared more than once in model '{}'",
                field.name, model.name
            )));
        }
    }

    Ok(())
}

fn validate_field(field: &FieldDecl, model_name: &str) -> Result<()> {
    if field.name.trim().is_empty() {
        return Err(FieldforgeError::configuration(format!(
            "Field name cannot be empty in model '{}'",
            model_name
        )));
    }

    if let Some(lov) = &field.lov {
        if lov.name.trim().is_empty() {
            return Err(FieldforgeError::configuration(format!(
                "Field '{}' in model '{}' has a LOV binding without a name",
                field.name, model_name
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_validate_model_rejects_empty_name() {
        let model = ModelDecl::new("  ");
        assert!(validate_model(&model).is_err());
    }

    #[test]
    fn test_validate_model_rejects_duplicate_fields() {
        let model = ModelDecl::new("Customer")
            .field(FieldDecl::new("name", "String"))
            .field(FieldDecl::new("name", "String"));

        let err = validate_model(&model).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_load_models_reads_yaml_files_in_order() {
        let dir = tempfile::tempdir().unwrap();

        let mut b = fs::File::create(dir.path().join("b_order.yaml")).unwrap();
        writeln!(b, "model:\n  name: Order\n  marker: {{}}\n  fields: []").unwrap();

        let mut a = fs::File::create(dir.path().join("a_customer.yml")).unwrap();
        writeln!(
            a,
            "model:\n  name: Customer\n  marker: {{}}\n  fields:\n    - name: name\n      type: String"
        )
        .unwrap();

        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let models = load_models(dir.path()).unwrap();
        let names: Vec<_> = models.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Customer", "Order"]);
    }

    #[test]
    fn test_load_models_missing_directory() {
        let result = load_models("/definitely/not/here");
        assert!(matches!(result, Err(FieldforgeError::Configuration(_))));
    }
}
