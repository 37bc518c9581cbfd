//! Container descriptor sources.
//!
//! Descriptors come either from the engine's inspect endpoint over its unix
//! socket, or from a JSON document on disk or stdin.

use std::io::Read;
use std::path::{Path, PathBuf};

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use serde::Deserialize;
use tokio::net::UnixStream;

use docket_common::paths::{DOCKER_HOST, socket_path};
use docket_common::{DocketError, DocketResult};
use docket_oci::ContainerInspect;

/// Engine API error body.
#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for the engine API over a unix socket.
#[derive(Debug, Clone)]
pub struct EngineClient {
    socket_path: PathBuf,
}

impl EngineClient {
    /// Client for the engine named by `DOCKER_HOST`, or the default socket.
    ///
    /// # Errors
    ///
    /// Fails when `DOCKER_HOST` names a non-unix address.
    pub fn from_env() -> DocketResult<Self> {
        Self::from_host(&DOCKER_HOST)
    }

    /// Client for an engine address such as `unix:///var/run/docker.sock`.
    ///
    /// # Errors
    ///
    /// Only unix socket addresses are supported.
    pub fn from_host(host: &str) -> DocketResult<Self> {
        socket_path(host).map(Self::with_socket).ok_or_else(|| DocketError::Engine {
            target: host.to_string(),
            message: "only unix:// engine addresses are supported".to_string(),
        })
    }

    /// Client connecting to `path`.
    #[must_use]
    pub fn with_socket(path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
        }
    }

    /// Socket path in use.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Fetch the descriptor of `container` (a name or ID).
    ///
    /// # Errors
    ///
    /// Returns [`DocketError::Engine`] when the socket is unreachable, the
    /// engine reports an error, or the response is not a descriptor.
    pub async fn inspect(&self, container: &str) -> DocketResult<ContainerInspect> {
        let engine_err = |message: String| DocketError::Engine {
            target: container.to_string(),
            message,
        };

        let body = self
            .get(&format!("/containers/{container}/json"))
            .await
            .map_err(engine_err)?;
        serde_json::from_slice(&body).map_err(|e| engine_err(format!("failed to parse response: {e}")))
    }

    async fn get(&self, path: &str) -> Result<Bytes, String> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            format!(
                "failed to connect to engine at {}: {e}",
                self.socket_path.display()
            )
        })?;
        let io = TokioIo::new(stream);

        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| format!("HTTP handshake failed: {e}"))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "Engine connection closed");
            }
        });

        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("http://localhost{path}"))
            .header("Host", "localhost")
            .body(Empty::<Bytes>::new())
            .map_err(|e| format!("failed to build request: {e}"))?;

        tracing::debug!(socket = %self.socket_path.display(), path, "Querying engine");
        let response = sender
            .send_request(request)
            .await
            .map_err(|e| format!("failed to send request: {e}"))?;

        let status = response.status();
        let body = response
            .into_body()
            .collect()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?
            .to_bytes();

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiError>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
            return Err(format!("engine returned {status}: {message}"));
        }

        Ok(body)
    }
}

/// Read a descriptor from a JSON file, or stdin when `path` is `-`.
///
/// # Errors
///
/// Fails when the file cannot be read or does not hold a descriptor.
pub fn read_descriptor(path: &Path) -> DocketResult<ContainerInspect> {
    let data = if path == Path::new("-") {
        let mut data = Vec::new();
        std::io::stdin().read_to_end(&mut data)?;
        data
    } else {
        std::fs::read(path)?
    };

    // `docker inspect` prints an array; accept it as well as a bare object.
    let value: serde_json::Value = serde_json::from_slice(&data)?;
    let value = match value {
        serde_json::Value::Array(mut items) if items.len() == 1 => items.remove(0),
        serde_json::Value::Array(items) => {
            return Err(DocketError::Serialization(format!(
                "expected exactly one container descriptor, found {}",
                items.len()
            )));
        }
        other => other,
    };
    Ok(serde_json::from_value(value)?)
}
