//! Form schema loading from TOML files.

use crate::{
    definition::FormSchema,
    error::{FormError, Result},
};
use bugfill_core::TargetConfig;
use std::path::Path;
use tracing::{debug, info};

/// Schema the target configuration asks for: the TOML override when one
/// is configured, otherwise the built-in protocol.
///
/// # Errors
/// Returns error if the configured file can't be read, parsed or validated.
pub fn schema_for(target: &TargetConfig) -> Result<FormSchema> {
    match &target.schema_path {
        Some(path) => load_schema(path),
        None => {
            debug!("using built-in form schema");
            Ok(FormSchema::builtin())
        }
    }
}

/// Load and validate a schema from a TOML file.
///
/// # Errors
/// Returns error if the file can't be read, parsed or validated.
pub fn load_schema(path: &Path) -> Result<FormSchema> {
    let contents = std::fs::read_to_string(path)?;
    let schema = parse_schema(&contents, &path.display().to_string())?;

    info!(
        path = %path.display(),
        name = %schema.name,
        steps = schema.steps.len(),
        "loaded form schema"
    );

    Ok(schema)
}

/// Parse and validate schema TOML; `origin` names the source in errors.
///
/// # Errors
/// Returns error if the TOML is malformed or the schema is invalid.
pub fn parse_schema(contents: &str, origin: &str) -> Result<FormSchema> {
    let schema: FormSchema = toml::from_str(contents).map_err(|e| FormError::ParseError {
        path: origin.to_string(),
        source: e,
    })?;

    schema.validate()?;
    Ok(schema)
}
