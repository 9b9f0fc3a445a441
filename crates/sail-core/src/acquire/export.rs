//! Appian Deployment API v2 export driver.
//!
//! An export is a three-step conversation:
//! 1. `POST /suite/deployment-management/v2/deployments` with an `export`
//!    action (multipart form, `json` field) → deployment uuid.
//! 2. Poll `GET .../deployments/{uuid}` until the deployment completes.
//! 3. Download the package zip from the URL the final status names.

use crate::config::{Connection, NetworkConfig};
use crate::error::{Result, SailError};
use crate::network::{extract_domain, HttpClient};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// Deployment statuses that mean the package is ready to download.
const COMPLETED_STATUSES: &[&str] = &["COMPLETED", "COMPLETED_WITH_EXPORT_ERRORS"];

#[derive(Debug, Deserialize)]
struct DeploymentCreated {
    uuid: String,
}

#[derive(Debug, Deserialize)]
struct DeploymentStatus {
    #[serde(default)]
    status: String,
    /// Download URL for the package zip, when the platform provides one.
    #[serde(rename = "packageZip")]
    package_zip: Option<String>,
}

/// Client for the export side of the Deployment API.
pub struct ExportClient {
    http: HttpClient,
    connection: Connection,
}

impl ExportClient {
    pub fn new(connection: Connection) -> Result<Self> {
        Ok(Self {
            http: HttpClient::with_timeout(NetworkConfig::DOWNLOAD_TIMEOUT)?,
            connection,
        })
    }

    fn deployments_url(&self) -> String {
        format!(
            "{}/suite/deployment-management/v2/deployments",
            self.connection.base_url
        )
    }

    /// Run a full export of `app_uuid` and return the package zip bytes.
    pub async fn export_application(&self, app_uuid: &str) -> Result<Vec<u8>> {
        let deploy_uuid = self.trigger_export(app_uuid).await?;
        info!("Export deployment {} started for {}", deploy_uuid, app_uuid);

        let status = self.wait_for_completion(&deploy_uuid).await?;
        let package_url = status
            .package_zip
            .unwrap_or_else(|| format!("{}/{}/package-zip", self.deployments_url(), deploy_uuid));

        self.download_package(&package_url).await
    }

    async fn trigger_export(&self, app_uuid: &str) -> Result<String> {
        let payload = json!({
            "exportType": "application",
            "uuids": [app_uuid],
            "name": format!("a11y-audit-export-{}", uuid::Uuid::new_v4().simple()),
        });

        let form = reqwest::multipart::Form::new().text("json", payload.to_string());
        let response = self
            .http
            .post_multipart_with_api_key(
                &self.deployments_url(),
                &self.connection.api_key,
                &[("Action-Type", "export")],
                form,
            )
            .await?;

        let response = HttpClient::require_success(response, "export request")?;
        let created: DeploymentCreated =
            response.json().await.map_err(|e| SailError::Acquisition {
                message: format!("Export response was not a deployment: {}", e),
                cause: Some(e.to_string()),
            })?;
        Ok(created.uuid)
    }

    async fn wait_for_completion(&self, deploy_uuid: &str) -> Result<DeploymentStatus> {
        let status_url = format!("{}/{}", self.deployments_url(), deploy_uuid);

        for attempt in 0..NetworkConfig::EXPORT_POLL_MAX_ATTEMPTS {
            let response = self
                .http
                .get_with_api_key(&status_url, &self.connection.api_key)
                .await?;
            let response = HttpClient::require_success(response, "export status")?;
            let status: DeploymentStatus =
                response.json().await.map_err(|e| SailError::Acquisition {
                    message: format!("Export status response unreadable: {}", e),
                    cause: Some(e.to_string()),
                })?;

            debug!(
                "Export {} status: {} (attempt {})",
                deploy_uuid, status.status, attempt
            );

            if COMPLETED_STATUSES.contains(&status.status.as_str()) {
                return Ok(status);
            }
            if status.status == "FAILED" {
                return Err(SailError::acquisition(format!(
                    "Export deployment {} failed on the platform",
                    deploy_uuid
                )));
            }

            tokio::time::sleep(NetworkConfig::EXPORT_POLL_INTERVAL).await;
        }

        Err(SailError::acquisition(format!(
            "Export deployment {} did not complete within {} polls",
            deploy_uuid,
            NetworkConfig::EXPORT_POLL_MAX_ATTEMPTS
        )))
    }

    async fn download_package(&self, package_url: &str) -> Result<Vec<u8>> {
        info!(
            "Downloading export package from {}",
            extract_domain(package_url)
        );
        let response = self
            .http
            .get_with_api_key(package_url, &self.connection.api_key)
            .await?;
        let response = HttpClient::require_success(response, "package download")?;

        let bytes = response.bytes().await.map_err(|e| SailError::Acquisition {
            message: format!("Package download interrupted: {}", e),
            cause: Some(e.to_string()),
        })?;

        if bytes.is_empty() {
            warn!("Export package from {} was empty", package_url);
            return Err(SailError::acquisition(
                "Export produced an empty package".to_string(),
            ));
        }

        Ok(bytes.to_vec())
    }
}
