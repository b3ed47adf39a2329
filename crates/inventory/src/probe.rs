//! REST endpoint probing
//!
//! An AFS server exposes its REST API on an HTTP and/or HTTPS port taken
//! from its configuration. Both ports are probed concurrently and the first
//! successful response wins; the other request is simply disregarded.

use afsctl_errors::{Error, InventoryError};
use afsctl_types::AfsServer;
use futures::future::select_ok;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use std::time::Duration;

async fn fetch(client: reqwest::Client, url: String) -> Result<Value, reqwest::Error> {
    client
        .get(&url)
        .header("Accept", "application/json")
        .send()
        .await?
        .error_for_status()?
        .json()
        .await
}

/// Fetch `endpoint` from a server's REST API, racing HTTPS against HTTP.
///
/// # Errors
///
/// Returns [`InventoryError::NoRestPort`] when the server configuration
/// carries no usable port, or [`InventoryError::ProbeFailed`] when every
/// probed port fails or times out.
pub async fn probe_rest(
    host: &str,
    server: &AfsServer,
    endpoint: &str,
    timeout: Duration,
) -> Result<Value, Error> {
    let (http, https) = server.rest_ports();
    let endpoint = if endpoint.starts_with('/') {
        endpoint.to_string()
    } else {
        format!("/{endpoint}")
    };
    // Server certificates on these hosts are self-signed as a rule.
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .danger_accept_invalid_certs(true)
        .build()
        .map_err(|e| Error::internal(e.to_string()))?;

    let mut requests: Vec<BoxFuture<'static, Result<Value, reqwest::Error>>> = Vec::new();
    if let Some(port) = https {
        requests.push(fetch(client.clone(), format!("https://{host}:{port}{endpoint}")).boxed());
    }
    if let Some(port) = http {
        requests.push(fetch(client.clone(), format!("http://{host}:{port}{endpoint}")).boxed());
    }

    if requests.is_empty() {
        return Err(InventoryError::NoRestPort {
            name: server.name.clone(),
        }
        .into());
    }

    match select_ok(requests).await {
        Ok((value, _abandoned)) => Ok(value),
        Err(e) => Err(InventoryError::ProbeFailed {
            name: server.name.clone(),
            message: e.to_string(),
        }
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use afsctl_types::{JobStatus, LibraryName, ServerConfiguration};

    fn server_without_ports() -> AfsServer {
        AfsServer {
            library: LibraryName::new("AFSLIB").unwrap(),
            name: "AFSDEMO".to_string(),
            jobq_name: String::new(),
            jobq_library: String::new(),
            ifs_path: "/opt/afs/demo".to_string(),
            user: String::new(),
            java_props: String::new(),
            java_home: String::new(),
            job: JobStatus {
                job_name: String::new(),
                job_user: String::new(),
                job_number: String::new(),
                status: None,
            },
            running: true,
            configuration: ServerConfiguration::default(),
        }
    }

    #[tokio::test]
    async fn server_without_rest_ports_is_rejected_before_any_request() {
        let err = probe_rest(
            "ibmi.example.com",
            &server_without_ports(),
            "/about",
            Duration::from_millis(100),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("no REST port"));
    }
}
