// Device endpoints
//
// Listing, detail (which carries the `status` data-point array), and
// command dispatch.

use serde_json::Value;
use tracing::{debug, info};

use crate::client::{TuyaClient, decode};
use crate::error::Error;
use crate::models::{CommandBatch, CommandPayload, DeviceInfo};

impl TuyaClient {
    /// List all devices visible to the cloud project.
    ///
    /// `GET /v1.0/devices`. The result shape varies by project type, so it
    /// is returned untouched.
    pub async fn list_devices(&self) -> Result<Value, Error> {
        debug!("listing devices");
        self.get("/v1.0/devices", &[]).await
    }

    /// Fetch the raw detail object for one device.
    ///
    /// `GET /v1.0/devices/{device_id}`
    pub async fn get_device_raw(&self, device_id: &str) -> Result<Value, Error> {
        debug!(device_id, "fetching device");
        self.get(&format!("/v1.0/devices/{device_id}"), &[]).await
    }

    /// Fetch and decode one device, including its status array.
    pub async fn get_device(&self, device_id: &str) -> Result<DeviceInfo, Error> {
        decode(self.get_device_raw(device_id).await?)
    }

    /// Send a command batch to a device.
    ///
    /// `POST /v1.0/devices/{device_id}/commands` with `{"commands": [...]}`
    pub async fn send_commands(
        &self,
        device_id: &str,
        commands: &[CommandPayload],
    ) -> Result<Value, Error> {
        info!(device_id, count = commands.len(), "sending commands");
        self.post(
            &format!("/v1.0/devices/{device_id}/commands"),
            &CommandBatch { commands },
        )
        .await
    }
}
