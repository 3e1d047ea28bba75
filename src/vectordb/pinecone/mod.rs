#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error, warn};
use url::Url;

use super::{
    FetchedVector, IndexDescription, IndexStats, NamespaceInfo, NamespaceSummary, QueryMatch,
    VectorRecord,
};
use crate::VectorPipeError;
use crate::config::PineconeConfig;
use crate::embeddings::openai::DEFAULT_EMBEDDING_DIMENSION;

/// Maximum number of records written per upsert call. Bounds peak request
/// size against the provider's payload limits.
pub const UPSERT_BATCH_SIZE: usize = 500;

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Client for a Pinecone index: control-plane lookups plus namespace
/// introspection. Data-plane operations go through [`PineconeIndex`],
/// obtained from [`PineconeClient::connect`].
#[derive(Debug, Clone)]
pub struct PineconeClient {
    api_key: String,
    index_name: String,
    control_plane: Url,
    agent: ureq::Agent,
    retry_attempts: u32,
}

/// Data-plane handle bound to the host reported by the control plane.
///
/// Handles are cheap to create; callers may cache one across calls but must
/// be prepared to re-connect when the remote reports not-ready.
#[derive(Debug, Clone)]
pub struct PineconeIndex {
    api_key: String,
    base_url: Url,
    agent: ureq::Agent,
    retry_attempts: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ControlPlaneIndex {
    name: Option<String>,
    dimension: Option<u32>,
    metric: Option<String>,
    host: Option<String>,
    status: ControlPlaneStatus,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ControlPlaneStatus {
    ready: bool,
    state: Option<String>,
}

#[derive(Debug, Serialize)]
struct UpsertRequest<'a> {
    vectors: &'a [VectorRecord],
    namespace: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    namespace: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct QueryResponse {
    matches: Vec<QueryMatch>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FetchResponse {
    #[serde(alias = "records")]
    vectors: HashMap<String, FetchedVector>,
}

impl PineconeClient {
    #[inline]
    pub fn new(config: &PineconeConfig) -> Result<Self, VectorPipeError> {
        let control_plane = config
            .control_plane_url()
            .map_err(|e| VectorPipeError::Config(e.to_string()))?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)))
            .build()
            .into();

        Ok(Self {
            api_key: config.api_key.clone(),
            index_name: config.index.clone(),
            control_plane,
            agent,
            retry_attempts: DEFAULT_RETRY_ATTEMPTS,
        })
    }

    #[inline]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();
        self
    }

    #[inline]
    pub fn with_retry_attempts(mut self, attempts: u32) -> Self {
        self.retry_attempts = attempts;
        self
    }

    /// Verify the index is ready and return a data-plane handle bound to its
    /// host.
    #[inline]
    pub fn connect(&self) -> Result<PineconeIndex, VectorPipeError> {
        let description = self.fetch_control_plane_index().map_err(|e| {
            VectorPipeError::Connection(format!(
                "Failed to describe index '{}': {}",
                self.index_name, e
            ))
        })?;

        if !description.status.ready {
            return Err(VectorPipeError::Connection(format!(
                "Index '{}' is not ready (state: {})",
                self.index_name,
                description.status.state.as_deref().unwrap_or("unknown")
            )));
        }

        let host = description.host.ok_or_else(|| {
            VectorPipeError::Connection(format!(
                "Index '{}' reported no data-plane host",
                self.index_name
            ))
        })?;

        let base_url = data_plane_url(&host)?;
        debug!("Connected to index '{}' at {}", self.index_name, base_url);

        Ok(PineconeIndex {
            api_key: self.api_key.clone(),
            base_url,
            agent: self.agent.clone(),
            retry_attempts: self.retry_attempts,
        })
    }

    /// Raw control-plane description, degraded to a not-ready description on
    /// any failure rather than erroring.
    #[inline]
    pub fn describe_index(&self) -> IndexDescription {
        match self.fetch_control_plane_index() {
            Ok(index) => IndexDescription {
                name: index.name,
                dimension: index.dimension,
                metric: index.metric,
                ready: index.status.ready,
                state: index.status.state,
                host: index.host,
            },
            Err(e) => {
                error!("Failed to describe index '{}': {}", self.index_name, e);
                IndexDescription::default()
            }
        }
    }

    /// Dimension of vectors in the index.
    ///
    /// Falls back to [`DEFAULT_EMBEDDING_DIMENSION`] when the stats payload
    /// omits the dimension or the stats call fails.
    #[inline]
    pub fn index_dimension(&self) -> u32 {
        let stats = self.connect().and_then(|index| index.describe_stats());
        match stats {
            Ok(stats) => stats.dimension.unwrap_or(DEFAULT_EMBEDDING_DIMENSION),
            Err(e) => {
                error!("Failed to read index dimension: {}", e);
                DEFAULT_EMBEDDING_DIMENSION
            }
        }
    }

    /// All namespaces with their vector counts. Remote failures degrade to an
    /// empty listing.
    #[inline]
    pub fn namespaces(&self) -> Vec<NamespaceSummary> {
        let stats = self.connect().and_then(|index| index.describe_stats());
        match stats {
            Ok(stats) => {
                let mut summaries: Vec<NamespaceSummary> = stats
                    .namespaces
                    .into_iter()
                    .map(|(name, values)| NamespaceSummary {
                        name,
                        count: values.vector_count,
                    })
                    .collect();
                summaries.sort_by(|a, b| a.name.cmp(&b.name));
                summaries
            }
            Err(e) => {
                warn!("Failed to list namespaces: {}", e);
                Vec::new()
            }
        }
    }

    /// Alias for [`Self::namespaces`]; some index providers call the same
    /// partitioning concept a collection.
    #[inline]
    pub fn collections(&self) -> Vec<NamespaceSummary> {
        self.namespaces()
    }

    /// Look up a single namespace. Returns `None` when the namespace has
    /// never received a write; an empty `name` is a caller error.
    #[inline]
    pub fn namespace(&self, name: &str) -> Result<Option<NamespaceInfo>, VectorPipeError> {
        if name.is_empty() {
            return Err(VectorPipeError::Validation(
                "No namespace value provided".to_string(),
            ));
        }

        let stats = self.connect()?.describe_stats()?;

        Ok(stats
            .namespaces
            .get(name)
            .map(|values| NamespaceInfo {
                name: name.to_string(),
                vector_count: values.vector_count,
            }))
    }

    #[inline]
    pub fn namespace_exists(&self, name: &str) -> Result<bool, VectorPipeError> {
        if name.is_empty() {
            return Err(VectorPipeError::Validation(
                "No namespace value provided".to_string(),
            ));
        }

        let stats = self.connect()?.describe_stats()?;
        Ok(stats.namespaces.contains_key(name))
    }

    /// Total number of vectors across all namespaces, falling back to the
    /// index-level record count when no namespaces are reported.
    #[inline]
    pub fn total_vectors(&self) -> Result<u64, VectorPipeError> {
        let stats = self.connect()?.describe_stats()?;

        let from_namespaces: u64 = stats
            .namespaces
            .values()
            .map(|values| values.vector_count)
            .sum();

        if from_namespaces > 0 {
            Ok(from_namespaces)
        } else {
            Ok(stats.total_record_count.unwrap_or(0))
        }
    }

    fn fetch_control_plane_index(&self) -> Result<ControlPlaneIndex, VectorPipeError> {
        let url = self
            .control_plane
            .join(&format!("/indexes/{}", self.index_name))
            .map_err(|e| VectorPipeError::Config(format!("Invalid control plane URL: {}", e)))?;

        let body = request_with_retry(self.retry_attempts, || {
            self.agent
                .get(url.as_str())
                .header("Api-Key", &self.api_key)
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        serde_json::from_str(&body).map_err(|e| {
            VectorPipeError::VectorDb(format!("Failed to parse index description: {}", e))
        })
    }
}

impl PineconeIndex {
    /// Index statistics: dimension plus per-namespace vector counts. Derived
    /// from a single stats call; all namespace introspection goes through
    /// this.
    #[inline]
    pub fn describe_stats(&self) -> Result<IndexStats, VectorPipeError> {
        let body = self.post_json("/describe_index_stats", &serde_json::json!({}))?;

        serde_json::from_str(&body)
            .map_err(|e| VectorPipeError::VectorDb(format!("Failed to parse index stats: {}", e)))
    }

    /// Write records into a namespace. Idempotent per record id.
    #[inline]
    pub fn upsert(&self, namespace: &str, records: &[VectorRecord]) -> Result<(), VectorPipeError> {
        if records.is_empty() {
            return Ok(());
        }

        let request = UpsertRequest {
            vectors: records,
            namespace,
        };

        self.post_json("/vectors/upsert", &request)?;
        debug!(
            "Upserted {} vectors into namespace '{}'",
            records.len(),
            namespace
        );
        Ok(())
    }

    /// Write records in consecutive groups of at most [`UPSERT_BATCH_SIZE`],
    /// preserving order, one sequential call per group.
    ///
    /// The first failing group stops the loop and surfaces its error; groups
    /// already written stay written. Retrying the whole call is safe because
    /// upsert is idempotent by id.
    #[inline]
    pub fn upsert_in_batches(
        &self,
        namespace: &str,
        records: &[VectorRecord],
    ) -> Result<(), VectorPipeError> {
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            self.upsert(namespace, batch)?;
        }
        Ok(())
    }

    /// Nearest-neighbor query. Vector values are never requested back;
    /// callers only consume ids, scores, and metadata.
    #[inline]
    pub fn query(
        &self,
        namespace: &str,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
    ) -> Result<Vec<QueryMatch>, VectorPipeError> {
        let request = QueryRequest {
            vector,
            top_k,
            include_metadata,
            include_values: false,
            namespace,
        };

        let body = self.post_json("/query", &request)?;

        let response: QueryResponse = serde_json::from_str(&body).map_err(|e| {
            VectorPipeError::VectorDb(format!("Failed to parse query response: {}", e))
        })?;

        Ok(response.matches)
    }

    /// Fetch metadata for specific vector ids.
    #[inline]
    pub fn fetch(
        &self,
        namespace: &str,
        ids: &[String],
    ) -> Result<HashMap<String, FetchedVector>, VectorPipeError> {
        let mut url = self.base_url.join("/vectors/fetch").map_err(|e| {
            VectorPipeError::Config(format!("Invalid data plane URL: {}", e))
        })?;

        {
            let mut pairs = url.query_pairs_mut();
            for id in ids {
                pairs.append_pair("ids", id);
            }
            pairs.append_pair("namespace", namespace);
        }

        let body = request_with_retry(self.retry_attempts, || {
            self.agent
                .get(url.as_str())
                .header("Api-Key", &self.api_key)
                .call()
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })?;

        let response: FetchResponse = serde_json::from_str(&body).map_err(|e| {
            VectorPipeError::VectorDb(format!("Failed to parse fetch response: {}", e))
        })?;

        Ok(response.vectors)
    }

    fn post_json<T: Serialize>(&self, path: &str, payload: &T) -> Result<String, VectorPipeError> {
        let url = self
            .base_url
            .join(path)
            .map_err(|e| VectorPipeError::Config(format!("Invalid data plane URL: {}", e)))?;

        let request_json = serde_json::to_string(payload)
            .map_err(|e| VectorPipeError::VectorDb(format!("Failed to serialize request: {}", e)))?;

        request_with_retry(self.retry_attempts, || {
            self.agent
                .post(url.as_str())
                .header("Api-Key", &self.api_key)
                .header("Content-Type", "application/json")
                .send(&request_json)
                .and_then(|mut resp| resp.body_mut().read_to_string())
        })
    }
}

/// Build the data-plane base URL from the host reported by the control
/// plane. Bare hosts are assumed to be HTTPS.
fn data_plane_url(host: &str) -> Result<Url, VectorPipeError> {
    let with_scheme = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    };

    Url::parse(&with_scheme)
        .map_err(|e| VectorPipeError::Connection(format!("Invalid index host '{}': {}", host, e)))
}

fn request_with_retry<F>(retry_attempts: u32, mut request_fn: F) -> Result<String, VectorPipeError>
where
    F: FnMut() -> Result<String, ureq::Error>,
{
    let mut last_error = None;

    for attempt in 1..=retry_attempts {
        match request_fn() {
            Ok(response_text) => return Ok(response_text),
            Err(error) => {
                let should_retry = match &error {
                    ureq::Error::StatusCode(status) => {
                        if *status >= 500 {
                            warn!(
                                "Index server error (status {}), attempt {}/{}",
                                status, attempt, retry_attempts
                            );
                            true
                        } else {
                            return Err(VectorPipeError::VectorDb(format!(
                                "Index request failed: HTTP {}",
                                status
                            )));
                        }
                    }
                    ureq::Error::ConnectionFailed
                    | ureq::Error::HostNotFound
                    | ureq::Error::Timeout(_)
                    | ureq::Error::Io(_) => {
                        warn!(
                            "Index transport error: {}, attempt {}/{}",
                            error, attempt, retry_attempts
                        );
                        true
                    }
                    _ => {
                        return Err(VectorPipeError::VectorDb(format!(
                            "Index request failed: {}",
                            error
                        )));
                    }
                };

                if should_retry {
                    last_error = Some(VectorPipeError::VectorDb(format!(
                        "Index request failed: {}",
                        error
                    )));

                    if attempt < retry_attempts {
                        let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
                        std::thread::sleep(Duration::from_millis(delay_ms));
                    }
                }
            }
        }
    }

    Err(last_error.unwrap_or_else(|| {
        VectorPipeError::VectorDb("Index request failed after retries".to_string())
    }))
}
