//! Output formatting: JSON, YAML, table.
//!
//! Structured formats serialise the whole envelope. Table renders only the
//! payload, using a view chosen by the command, and reports failures as a
//! single line.

use std::io::{self, Write};

use serde_json::Value;
use tabled::{Table, Tabled, builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::response::Envelope;

/// How a successful payload is laid out as a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Devices,
    Status,
    Presets,
    Object,
}

// ── Render dispatch ──────────────────────────────────────────────────

pub fn render(format: OutputFormat, envelope: &Envelope, view: View) -> Result<String, CliError> {
    Ok(match format {
        OutputFormat::Json => serde_json::to_string_pretty(envelope)?,
        OutputFormat::JsonCompact => serde_json::to_string(envelope)?,
        OutputFormat::Yaml => serde_yaml::to_string(envelope)?,
        OutputFormat::Table => match envelope {
            Envelope::Success { data, .. } => render_table(view, data),
            Envelope::Failure { error, .. } => format!(
                "error {} (status {}): {}",
                error.code, error.status, error.message
            ),
        },
    })
}

/// Print to stdout, skipping successful output in quiet mode.
pub fn print_output(output: &str, quiet: bool, success: bool) -> Result<(), CliError> {
    if (quiet && success) || output.is_empty() {
        return Ok(());
    }
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{output}")?;
    Ok(())
}

// ── Table views ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Product")]
    product: String,
}

impl From<&Value> for DeviceRow {
    fn from(d: &Value) -> Self {
        let field = |key: &str| d.get(key).map(scalar).unwrap_or_default();
        Self {
            id: field("id"),
            name: field("name"),
            online: match d.get("online").and_then(Value::as_bool) {
                Some(true) => "yes".into(),
                Some(false) => "no".into(),
                None => String::new(),
            },
            category: field("category"),
            product: field("product_name"),
        }
    }
}

#[derive(Tabled)]
struct PresetRow {
    #[tabled(rename = "Preset")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Commands")]
    commands: String,
}

impl From<&Value> for PresetRow {
    fn from(p: &Value) -> Self {
        let commands = p
            .get("commands")
            .and_then(Value::as_array)
            .map(|cmds| {
                cmds.iter()
                    .map(|c| {
                        format!(
                            "{}={}",
                            c.get("code").map(scalar).unwrap_or_default(),
                            c.get("value").map(scalar).unwrap_or_default()
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        Self {
            name: p.get("name").map(scalar).unwrap_or_default(),
            description: p.get("description").map(scalar).unwrap_or_default(),
            commands,
        }
    }
}

fn render_table(view: View, data: &Value) -> String {
    match view {
        View::Devices => {
            let rows: Vec<DeviceRow> = device_list(data).iter().map(DeviceRow::from).collect();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        View::Presets => {
            let rows: Vec<PresetRow> = data
                .as_array()
                .map(|list| list.iter().map(PresetRow::from).collect())
                .unwrap_or_default();
            Table::new(rows).with(Style::rounded()).to_string()
        }
        View::Status => {
            let mut out = key_value_table(("Code", "Value"), data.get("formatted_status"));
            if let Some(labels) = data.get("labels") {
                out.push('\n');
                out.push_str(&key_value_table(("Label", "Value"), Some(labels)));
            }
            out
        }
        View::Object => key_value_table(("Field", "Value"), Some(data)),
    }
}

/// The device array, whether the platform returned a bare list or wrapped it.
fn device_list(data: &Value) -> &[Value] {
    if let Some(list) = data.as_array() {
        return list;
    }
    ["list", "devices"]
        .iter()
        .find_map(|key| data.get(*key).and_then(Value::as_array))
        .map(Vec::as_slice)
        .unwrap_or_default()
}

fn key_value_table(headers: (&str, &str), data: Option<&Value>) -> String {
    let mut builder = Builder::default();
    builder.push_record([headers.0, headers.1]);
    match data {
        Some(Value::Object(map)) => {
            for (key, value) in map {
                if !value.is_null() {
                    builder.push_record([key.clone(), scalar(value)]);
                }
            }
        }
        Some(other) => builder.push_record(["value".to_owned(), scalar(other)]),
        None => {}
    }
    builder.build().with(Style::rounded()).to_string()
}

/// Strings without quotes, everything else as compact JSON.
fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn wrapped_device_lists_are_found() {
        let wrapped = json!({"list": [{"id": "a"}], "has_more": false});
        assert_eq!(device_list(&wrapped).len(), 1);
        assert_eq!(device_list(&json!([{"id": "a"}, {"id": "b"}])).len(), 2);
        assert!(device_list(&json!({"total": 0})).is_empty());
    }

    #[test]
    fn device_table_lists_names() {
        let data = json!([{"id": "vdevo1234567", "name": "Hallway", "online": true}]);
        let out = render_table(View::Devices, &data);
        assert!(out.contains("vdevo1234567"));
        assert!(out.contains("Hallway"));
        assert!(out.contains("yes"));
    }

    #[test]
    fn status_table_shows_points_and_labels() {
        let data = json!({
            "formatted_status": {"alarm_volume": "high"},
            "labels": {"volume": "high", "battery_state": null}
        });
        let out = render_table(View::Status, &data);
        assert!(out.contains("alarm_volume"));
        assert!(out.contains("volume"));
        assert!(!out.contains("battery_state"));
    }
}
