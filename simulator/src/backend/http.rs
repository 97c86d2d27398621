use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetcore::fleet::VehicleIdentity;
use fleetcore::sync::BackendSync;
use fleetcore::{SyncError, SyncResult};
use serde::Serialize;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AlertBody<'a> {
    reg_no: &'a str,
    issue: &'a str,
    action_needed: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OverspeedBody<'a> {
    reg_no: &'a str,
    time: String,
    speed: String,
}

/// Backend of record reached over HTTP.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building backend HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> SyncResult<()> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(SyncError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

fn transport(err: reqwest::Error) -> SyncError {
    SyncError::Transport(err.to_string())
}

/// Timestamp format stored with overspeed records, e.g. `Fri Oct 16 2026 14:03:09`.
pub fn overspeed_time(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a %b %d %Y %H:%M:%S").to_string()
}

#[async_trait]
impl BackendSync for HttpBackend {
    async fn update_fuel(&self, vehicle: &VehicleIdentity, fuel_level: f64) -> SyncResult<()> {
        let fuel = fuel_level.to_string();
        let response = self
            .client
            .post(self.url("/fleetManager/updateVehicle"))
            .query(&[("regNo", vehicle.as_str()), ("fuel", fuel.as_str())])
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await
    }

    async fn record_alert(
        &self,
        vehicle: &VehicleIdentity,
        issue: &str,
        action_needed: &str,
    ) -> SyncResult<()> {
        let response = self
            .client
            .post(self.url("/addAllert"))
            .json(&AlertBody {
                reg_no: vehicle.as_str(),
                issue,
                action_needed,
            })
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await
    }

    async fn report_overspeed(
        &self,
        vehicle: &VehicleIdentity,
        timestamp: DateTime<Utc>,
        speed: f64,
    ) -> SyncResult<()> {
        let response = self
            .client
            .post(self.url("/fleetManager/overSpeeding"))
            .json(&OverspeedBody {
                reg_no: vehicle.as_str(),
                time: overspeed_time(timestamp),
                speed: speed.to_string(),
            })
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await
    }
}
