use std::{future::Future, time::Duration};

use bon::bon;
use log::{debug, trace};
use repo_details_app_info::Identity;
use repo_details_utils::constants::{
    DEFAULT_REQUEST_TIMEOUT_SECS, GIT_REF_QUERY_PARAM, REFERENCES_API_PATH, REPO_QUERY_PARAM,
};

use crate::error::ResolveError;

pub use headers::identity_headers;

mod headers;

/// What to ask the reference service for.
#[derive(Debug, Clone, Copy)]
pub struct ReferenceQuery<'scope> {
    pub repo: &'scope str,
    pub git_ref: &'scope str,
    pub identity: &'scope Identity,
}

/// Fetches raw reference metadata for a repository and ref.
pub trait ReferenceClient: Send + Sync {
    /// Returns the body of a successful response.
    ///
    /// # Errors
    /// Will error on a non-success status or a transport failure.
    fn fetch_references(
        &self,
        query: ReferenceQuery<'_>,
    ) -> impl Future<Output = Result<Vec<u8>, ResolveError>> + Send;
}

/// Talks to the references endpoint of the repository-details
/// extension behind the Argo CD API server.
#[derive(Debug, Clone)]
pub struct HttpReferenceClient {
    client: reqwest::Client,
    endpoint: String,
}

#[bon]
impl HttpReferenceClient {
    /// # Errors
    /// Will error if the underlying HTTP client can't be created.
    #[builder]
    pub fn new(
        /// Base URL of the Argo CD server.
        #[builder(into)]
        server: String,

        /// Upper bound for a single request.
        #[builder(default = Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))]
        timeout: Duration,
    ) -> Result<Self, ResolveError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ResolveError::ClientBuild)?;

        Ok(Self {
            client,
            endpoint: format!("{}{REFERENCES_API_PATH}", server.trim_end_matches('/')),
        })
    }
}

impl HttpReferenceClient {
    fn request(&self, query: ReferenceQuery<'_>) -> reqwest::RequestBuilder {
        self.client
            .get(&self.endpoint)
            .query(&[
                (REPO_QUERY_PARAM, query.repo),
                (GIT_REF_QUERY_PARAM, query.git_ref),
            ])
            .headers(identity_headers(query.identity))
    }
}

impl ReferenceClient for HttpReferenceClient {
    async fn fetch_references(&self, query: ReferenceQuery<'_>) -> Result<Vec<u8>, ResolveError> {
        let transport = |source| ResolveError::Transport {
            repo: query.repo.to_string(),
            git_ref: query.git_ref.to_string(),
            source,
        };

        debug!(
            "Fetching references for {} at {} from {}",
            query.repo, query.git_ref, self.endpoint
        );
        let response = self.request(query).send().await.map_err(transport)?;
        let status = response.status();
        trace!("{} responded with {status}", self.endpoint);

        if !status.is_success() {
            return Err(ResolveError::Fetch {
                repo: query.repo.to_string(),
                git_ref: query.git_ref.to_string(),
                status,
            });
        }

        Ok(response.bytes().await.map_err(transport)?.to_vec())
    }
}
