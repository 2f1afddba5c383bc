//! Device command handlers.

use serde_json::Value;
use tuyalarm_core::{CommandPayload, CoreError, DeviceOperations};

use crate::cli::{DevicesArgs, DevicesCommand};
use crate::output::View;

use super::Reply;

pub async fn handle(ops: &DeviceOperations, args: DevicesArgs) -> Reply {
    match args.command {
        DevicesCommand::List => Reply::new(ops.list_devices().await, View::Devices),

        DevicesCommand::Get { device_id } => {
            Reply::new(ops.get_device(&device_id).await, View::Object)
        }

        DevicesCommand::Status { device_id } => {
            Reply::new(ops.get_status(&device_id).await, View::Status)
        }

        DevicesCommand::Send {
            device_id,
            commands,
            json,
        } => {
            let parsed = match json {
                Some(raw) => parse_json(&raw),
                None => parse_pairs(&commands),
            };
            let result = match parsed {
                Ok(commands) => ops.send_commands(&device_id, &commands).await,
                Err(err) => Err(err),
            };
            Reply::new(result, View::Object)
        }
    }
}

fn parse_json(raw: &str) -> Result<Vec<CommandPayload>, CoreError> {
    serde_json::from_str(raw).map_err(|e| CoreError::Validation {
        message: format!("--json must be an array of {{\"code\", \"value\"}} objects: {e}"),
    })
}

/// `code=value` pairs; values that are not valid JSON are taken as strings.
fn parse_pairs(pairs: &[String]) -> Result<Vec<CommandPayload>, CoreError> {
    pairs
        .iter()
        .map(|pair| {
            let (code, value) = pair.split_once('=').ok_or_else(|| CoreError::Validation {
                message: format!("expected CODE=VALUE, got '{pair}'"),
            })?;
            let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.into()));
            Ok(CommandPayload {
                code: code.trim().to_owned(),
                value,
            })
        })
        .collect()
}
