//! Single-setting handlers. Values are validated by the core.

use tuyalarm_core::DeviceOperations;

use crate::cli::{SetArgs, SetCommand};
use crate::output::View;

use super::Reply;

pub async fn handle(ops: &DeviceOperations, args: SetArgs) -> Reply {
    let result = match args.command {
        SetCommand::Volume { device_id, level } => ops.set_volume(&device_id, &level).await,
        SetCommand::Brightness { device_id, level } => {
            ops.set_brightness(&device_id, &level).await
        }
        SetCommand::Mode { device_id, mode } => ops.set_mode(&device_id, &mode).await,
        SetCommand::Duration { device_id, seconds } => {
            ops.set_duration(&device_id, seconds).await
        }
    };
    Reply::new(result, View::Object)
}
