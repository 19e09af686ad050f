//! REST client for the Azure DevOps project listing endpoint.
//!
//! Wraps `GET {base_url}/{organization}/_apis/projects` using [`reqwest`]
//! with HTTP Basic auth (empty user name, PAT as password). Status codes
//! are returned as-is: deciding which ones are fatal is the poller's job.

use ado_core::config::Settings;
use async_trait::async_trait;

/// API version pinned by the poller.
pub const PROJECTS_API_VERSION: &str = "7.1-preview.1";

const USER_AGENT: &str = concat!("ado-worker/", env!("CARGO_PKG_VERSION"));

/// Errors from the Azure DevOps HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The underlying [`reqwest::Client`] could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    /// The request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Status and size of a project listing response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProjectsResponse {
    pub status: u16,
    pub content_length: Option<u64>,
}

/// Anything the poll loop can pull a project listing from.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    /// Organization the listing belongs to, used in log fields.
    fn organization(&self) -> &str;

    /// Issue one request for the project listing.
    async fn fetch_projects(&self) -> Result<ProjectsResponse, ClientError>;
}

/// Build the project listing URL for an organization.
pub fn projects_url(base_url: &str, organization: &str) -> String {
    format!(
        "{}/{}/_apis/projects?api-version={}",
        base_url.trim_end_matches('/'),
        organization,
        PROJECTS_API_VERSION,
    )
}

/// HTTP client bound to a single Azure DevOps organization.
pub struct AzureDevOpsClient {
    client: reqwest::Client,
    projects_url: String,
    organization: String,
    pat: String,
}

impl AzureDevOpsClient {
    /// Create a client with the configured request timeout.
    pub fn new(settings: &Settings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(settings.request_timeout())
            .user_agent(USER_AGENT)
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self::with_client(client, settings))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, settings: &Settings) -> Self {
        Self {
            client,
            projects_url: projects_url(&settings.base_url, &settings.organization),
            organization: settings.organization.clone(),
            pat: settings.pat.clone(),
        }
    }

    pub fn projects_url(&self) -> &str {
        &self.projects_url
    }
}

#[async_trait]
impl ProjectSource for AzureDevOpsClient {
    fn organization(&self) -> &str {
        &self.organization
    }

    /// The body is drained so the pooled connection can be reused. When the
    /// server sends no `Content-Length`, the drained size is reported.
    ///
    /// Once the status line has arrived the response counts as received: a
    /// body that fails to drain is logged and the declared length is kept.
    async fn fetch_projects(&self) -> Result<ProjectsResponse, ClientError> {
        let response = self
            .client
            .get(&self.projects_url)
            .basic_auth("", Some(&self.pat))
            .send()
            .await?;

        let status = response.status().as_u16();
        let declared = response.content_length();

        let content_length = match response.bytes().await {
            Ok(body) => declared.or(Some(body.len() as u64)),
            Err(e) => {
                tracing::warn!(status, error = %e, "Failed to read Azure DevOps response body");
                declared
            }
        };

        Ok(ProjectsResponse {
            status,
            content_length,
        })
    }
}
