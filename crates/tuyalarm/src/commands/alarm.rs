//! Alarm command handlers.

use tuyalarm_core::DeviceOperations;

use crate::cli::{AlarmArgs, AlarmCommand};
use crate::output::View;

use super::Reply;

pub async fn handle(ops: &DeviceOperations, args: AlarmArgs) -> Reply {
    let result = match args.command {
        AlarmCommand::Activate { device_id } => ops.activate_alarm(&device_id).await,
        AlarmCommand::Deactivate { device_id } => ops.deactivate_alarm(&device_id).await,
        AlarmCommand::TimeToWork { device_id } => ops.time_to_work(&device_id).await,
    };
    Reply::new(result, View::Object)
}
