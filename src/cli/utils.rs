use anyhow::Context;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config;
use crate::database::DatabaseManager;

/// Output a success message in the appropriate format; `data` fields are
/// merged into the JSON envelope.
pub fn output_success(output_format: OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });
            if let (Some(Value::Object(fields)), Some(target)) = (data, response.as_object_mut()) {
                target.extend(fields);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Print labelled rows in text mode.
pub fn output_fields(output_format: OutputFormat, fields: &[(&str, String)]) {
    if output_format == OutputFormat::Text {
        let width = fields.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
        for (label, value) in fields {
            println!("  {:width$}  {}", label, value, width = width);
        }
    }
}

/// Pool built from the same configuration the server uses.
pub async fn connect() -> anyhow::Result<DatabaseManager> {
    let db = DatabaseManager::connect_lazy(&config::config().database).context("failed to configure database pool")?;
    db.health_check().await.context("database is not reachable")?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_envelope_in_both_formats() {
        assert!(output_success(OutputFormat::Json, "done", Some(json!({ "id": 1 }))).is_ok());
        assert!(output_success(OutputFormat::Text, "done", None).is_ok());
    }
}
