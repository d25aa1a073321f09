use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client as HttpClient, StatusCode, Url};
use serde::Serialize;
use tracing::debug;

use crate::core::config::Configuration;
use crate::core::exposure::ExposureSpec;
use crate::core::manifest::Service;
use crate::core::workload::{WorkloadKind, WorkloadSpec};

/// Errors raised while constructing the cluster client; all of them
/// abort the run before any submission is attempted.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid cluster endpoint {endpoint}: {source}")]
    Endpoint {
        endpoint: String,
        source: url::ParseError,
    },
    #[error("invalid bearer token in the credentials file: {0}")]
    Token(#[source] reqwest::header::InvalidHeaderValue),
    #[error("unable to build the HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}

/// A single create call failed at the transport or API level.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("cluster rejected the request ({status}): {message}")]
    Rejected { status: StatusCode, message: String },
}

/// An `ApiError` wrapped with which object the call was creating.
///
/// Submission errors are never fatal: the runner logs them and moves
/// on to the next step.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error("error creating workload {name}: {source}")]
    Workload { name: String, source: ApiError },
    #[error("error creating exposure {name}: {source}")]
    Exposure { name: String, source: ApiError },
}

/// Contract between the recipe runner and whatever issues the create
/// calls against the cluster.
#[async_trait]
pub trait Submitter {
    /// Ensure a workload object exists for `workload` in `namespace`.
    async fn submit_workload(
        &self,
        namespace: &str,
        workload: &WorkloadSpec,
    ) -> Result<(), SubmissionError>;

    /// Ensure a network-exposure object exists for `exposure` in
    /// `namespace`.
    async fn submit_exposure(
        &self,
        namespace: &str,
        exposure: &ExposureSpec,
    ) -> Result<(), SubmissionError>;
}

/// `Client` provides the ability to interact with the cluster
/// orchestrator by using HTTP Protocol.
#[derive(Debug)]
pub struct Client {
    /// The full address for accessing the cluster API.
    ///
    /// e.g: http://127.0.0.1:8080
    endpoint: String,
    /// The internal HTTP client used to make requests.
    http_client: HttpClient,
    /// Which workload primitive create calls are issued against.
    workload_kind: WorkloadKind,
}

impl Client {
    /// Build a ready-to-use handle from the loaded configuration.
    ///
    /// No timeouts are configured; calls rely on the transport's own
    /// defaults.
    pub fn init(config: &Configuration) -> Result<Self, ClientError> {
        let endpoint = config.cluster.server.trim_end_matches('/').to_string();
        Url::parse(&endpoint).map_err(|source| ClientError::Endpoint {
            endpoint: endpoint.clone(),
            source,
        })?;

        let mut headers = HeaderMap::new();
        if let Some(token) = &config.cluster.token {
            let value =
                HeaderValue::from_str(&format!("Bearer {token}")).map_err(ClientError::Token)?;
            headers.insert(AUTHORIZATION, value);
        }

        let http_client = HttpClient::builder().default_headers(headers).build()?;
        Ok(Self {
            endpoint,
            http_client,
            workload_kind: config.workload_kind,
        })
    }

    /// Build a complete endpoint URL from a collection path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn create<T: Serialize + Sync>(&self, url: String, body: &T) -> Result<(), ApiError> {
        let response = self.http_client.post(url).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let message = response.text().await.unwrap_or_default();
        Err(ApiError::Rejected { status, message })
    }
}

#[async_trait]
impl Submitter for Client {
    async fn submit_workload(
        &self,
        namespace: &str,
        workload: &WorkloadSpec,
    ) -> Result<(), SubmissionError> {
        let manifest = workload.to_manifest(self.workload_kind);
        let url = self.endpoint(&manifest.collection_path(namespace));
        debug!(workload = %workload.name, %url, "submitting workload");

        self.create(url, &manifest)
            .await
            .map_err(|source| SubmissionError::Workload {
                name: workload.name.clone(),
                source,
            })
    }

    async fn submit_exposure(
        &self,
        namespace: &str,
        exposure: &ExposureSpec,
    ) -> Result<(), SubmissionError> {
        let manifest = exposure.to_manifest();
        let url = self.endpoint(&Service::collection_path(namespace));
        debug!(exposure = %exposure.name, %url, "submitting exposure");

        self.create(url, &manifest)
            .await
            .map_err(|source| SubmissionError::Exposure {
                name: exposure.name.clone(),
                source,
            })
    }
}
