//! Command dispatch: bridges CLI args -> core operations -> boundary results.

pub mod alarm;
pub mod devices;
pub mod health;
pub mod preset;
pub mod set;

use serde::Serialize;

use tuyalarm_core::{ApiResult, CoreError, DeviceOperations};

use crate::cli::Command;
use crate::output::View;

/// A finished operation and how to lay it out as a table.
pub struct Reply {
    pub result: ApiResult,
    pub view: View,
}

impl Reply {
    pub fn new<T: Serialize>(result: Result<T, CoreError>, view: View) -> Self {
        Self {
            result: ApiResult::from(result),
            view,
        }
    }
}

/// Dispatch a platform-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ops: &DeviceOperations) -> Reply {
    match cmd {
        Command::Devices(args) => devices::handle(ops, args).await,
        Command::Alarm(args) => alarm::handle(ops, args).await,
        Command::Set(args) => set::handle(ops, args).await,
        Command::Preset(args) => preset::handle(ops, args).await,
        Command::Health => health::handle(ops).await,
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}
