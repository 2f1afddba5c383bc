//! Preset handlers.

use tuyalarm_core::{CoreError, DeviceOperations};

use crate::cli::{PresetArgs, PresetCommand};
use crate::output::View;

use super::Reply;

pub async fn handle(ops: &DeviceOperations, args: PresetArgs) -> Reply {
    match args.command {
        PresetCommand::Apply { device_id, name } => {
            Reply::new(ops.apply_preset(&device_id, &name).await, View::Object)
        }
        PresetCommand::List => list(),
    }
}

/// Static listing; needs no credentials.
pub fn list() -> Reply {
    Reply::new(Ok::<_, CoreError>(DeviceOperations::presets()), View::Presets)
}
