//! Credential and connectivity check.

use serde::Serialize;
use tuyalarm_core::{CredentialCheck, DeviceOperations};

use crate::output::View;

use super::Reply;

#[derive(Serialize)]
struct Health {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    api_status: &'static str,
    credentials: CredentialCheck,
}

pub async fn handle(ops: &DeviceOperations) -> Reply {
    let result = ops.check_credentials().await.map(|credentials| Health {
        status: "healthy",
        service: "tuyalarm",
        version: env!("CARGO_PKG_VERSION"),
        api_status: "connected",
        credentials,
    });
    Reply::new(result, View::Object)
}
