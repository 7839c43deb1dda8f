use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::time::{Duration, Instant};
use url::Url;

use crate::error::{ChemkgError, Result};
use crate::graphdb::types::SparqlJsonResult;

/// Per-call execution options.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryOptions {
    /// Repository id, e.g. `chemkg`
    pub repository: String,
    /// Enable the endpoint's reasoner
    pub infer: bool,
    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl QueryOptions {
    /// Options for `repository` with inference on and a 30 s timeout.
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            infer: true,
            timeout_ms: 30_000,
        }
    }

    pub fn with_infer(mut self, infer: bool) -> Self {
        self.infer = infer;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Anything that can run a SPARQL SELECT and hand back JSON results.
///
/// Implementations report every failure as [`ChemkgError::EngineQueryFailed`]
/// and never retry.
#[async_trait]
pub trait SparqlExecutor: Send + Sync {
    async fn execute(&self, query: &str, options: &QueryOptions) -> Result<SparqlJsonResult>;
}

/// GraphDB (RDF4J protocol) client.
///
/// Sends `POST {base}/repositories/{repository}?infer=..&timeout=..` with the
/// raw query as `application/sparql-query`.
pub struct GraphDbClient {
    client: Client,
    base_url: Url,
}

impl GraphDbClient {
    /// Create a client for the server at `base_url` (e.g. `http://localhost:7200`).
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| ChemkgError::Config(format!("Invalid GraphDB base URL '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ChemkgError::Config(format!(
                "GraphDB base URL cannot be a base: {}",
                base_url
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ChemkgError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    /// Repository endpoint with `infer` and `timeout` (seconds) query parameters.
    pub fn endpoint(&self, options: &QueryOptions) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ChemkgError::Config(format!("GraphDB base URL cannot be a base: {}", self.base_url)))?
            .pop_if_empty()
            .push("repositories")
            .push(&options.repository);

        // GraphDB's timeout parameter is in seconds
        let timeout_secs = (options.timeout_ms.saturating_add(999) / 1000).max(1);
        url.query_pairs_mut()
            .append_pair("infer", if options.infer { "true" } else { "false" })
            .append_pair("timeout", &timeout_secs.to_string());
        Ok(url)
    }
}

#[async_trait]
impl SparqlExecutor for GraphDbClient {
    async fn execute(&self, query: &str, options: &QueryOptions) -> Result<SparqlJsonResult> {
        let url = self.endpoint(options)?;
        let start = Instant::now();

        let response = self
            .client
            .post(url)
            .timeout(Duration::from_millis(options.timeout_ms))
            .header(CONTENT_TYPE, "application/sparql-query")
            .header(ACCEPT, "application/sparql-results+json")
            .body(query.to_string())
            .send()
            .await
            .map_err(|e| {
                log::warn!("GraphDB request to '{}' failed: {}", options.repository, e);
                ChemkgError::EngineQueryFailed(format!("Network error: {}", e))
            })?;

        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            log::warn!("GraphDB returned {} for repository '{}'", status, options.repository);
            return Err(ChemkgError::EngineQueryFailed(format!(
                "GraphDB error {}: {}",
                status.as_u16(),
                body
            )));
        }

        let result: SparqlJsonResult = response
            .json()
            .await
            .map_err(|e| ChemkgError::EngineQueryFailed(format!("Failed to parse response: {}", e)))?;

        log::debug!(
            "GraphDB query on '{}' returned {} rows in {:?}",
            options.repository,
            result.rows().len(),
            start.elapsed()
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, Query, State};
    use axum::http::{HeaderMap, StatusCode};
    use axum::response::{IntoResponse, Response};
    use axum::routing::post;
    use axum::Router;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default, Clone)]
    struct Captured {
        repository: String,
        params: HashMap<String, String>,
        content_type: String,
        accept: String,
        body: String,
    }

    type Shared = Arc<Mutex<Option<Captured>>>;

    async fn stub_handler(
        State(captured): State<Shared>,
        Path(repository): Path<String>,
        Query(params): Query<HashMap<String, String>>,
        headers: HeaderMap,
        body: String,
    ) -> Response {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|h| h.to_str().ok())
                .unwrap_or_default()
                .to_string()
        };
        *captured.lock().unwrap() = Some(Captured {
            repository: repository.clone(),
            params,
            content_type: header("content-type"),
            accept: header("accept"),
            body: body.clone(),
        });

        if body.contains("MALFORMED") {
            return (StatusCode::BAD_REQUEST, "MALFORMED QUERY: Encountered \" \"}\" \"").into_response();
        }
        if repository == "garbage" {
            return (StatusCode::OK, "not json at all").into_response();
        }
        (
            StatusCode::OK,
            [("content-type", "application/sparql-results+json")],
            r#"{"head":{"vars":["x"]},"results":{"bindings":[{"x":{"type":"literal","value":"CCO"}}]}}"#,
        )
            .into_response()
    }

    async fn spawn_stub() -> (String, Shared) {
        let captured: Shared = Arc::new(Mutex::new(None));
        let app = Router::new()
            .route("/repositories/:repository", post(stub_handler))
            .with_state(captured.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}", addr), captured)
    }

    #[test]
    fn test_endpoint_url() {
        let client = GraphDbClient::new("http://localhost:7200/").unwrap();
        let options = QueryOptions::new("chemkg").with_infer(false).with_timeout_ms(60_000);
        let url = client.endpoint(&options).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:7200/repositories/chemkg?infer=false&timeout=60"
        );
    }

    #[test]
    fn test_endpoint_keeps_base_path_and_rounds_timeout_up() {
        let client = GraphDbClient::new("http://example.org/graphdb").unwrap();
        let options = QueryOptions::new("chem kg").with_timeout_ms(1500);
        let url = client.endpoint(&options).unwrap();
        assert_eq!(
            url.as_str(),
            "http://example.org/graphdb/repositories/chem%20kg?infer=true&timeout=2"
        );
    }

    #[test]
    fn test_endpoint_timeout_does_not_overflow() {
        let client = GraphDbClient::new("http://localhost:7200").unwrap();
        let url = client
            .endpoint(&QueryOptions::new("chemkg").with_timeout_ms(u64::MAX))
            .unwrap();
        let expected = format!("timeout={}", u64::MAX / 1000);
        assert!(url.as_str().ends_with(&expected), "{}", url);

        let url = client.endpoint(&QueryOptions::new("chemkg").with_timeout_ms(0)).unwrap();
        assert!(url.as_str().ends_with("timeout=1"));
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(GraphDbClient::new("not a url"), Err(ChemkgError::Config(_))));
        assert!(matches!(GraphDbClient::new("mailto:someone@example.org"), Err(ChemkgError::Config(_))));
    }

    #[tokio::test]
    async fn test_execute_sends_sparql_post() {
        let (base, captured) = spawn_stub().await;
        let client = GraphDbClient::new(&base).unwrap();
        let options = QueryOptions::new("chemkg");

        let result = client.execute("SELECT ?x WHERE { ?x ?p ?o }", &options).await.unwrap();
        assert_eq!(result.rows().len(), 1);
        assert_eq!(result.rows()[0].value("x"), Some("CCO"));

        let seen = captured.lock().unwrap().clone().unwrap();
        assert_eq!(seen.repository, "chemkg");
        assert_eq!(seen.params.get("infer").map(String::as_str), Some("true"));
        assert_eq!(seen.params.get("timeout").map(String::as_str), Some("30"));
        assert_eq!(seen.content_type, "application/sparql-query");
        assert_eq!(seen.accept, "application/sparql-results+json");
        assert_eq!(seen.body, "SELECT ?x WHERE { ?x ?p ?o }");
    }

    #[tokio::test]
    async fn test_execute_maps_http_error() {
        let (base, _captured) = spawn_stub().await;
        let client = GraphDbClient::new(&base).unwrap();

        let err = client
            .execute("MALFORMED", &QueryOptions::new("chemkg"))
            .await
            .unwrap_err();
        match err {
            ChemkgError::EngineQueryFailed(msg) => {
                assert!(msg.starts_with("GraphDB error 400: "));
                assert!(msg.contains("MALFORMED QUERY"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_execute_maps_bad_json() {
        let (base, _captured) = spawn_stub().await;
        let client = GraphDbClient::new(&base).unwrap();

        let err = client
            .execute("SELECT * WHERE {}", &QueryOptions::new("garbage"))
            .await
            .unwrap_err();
        assert!(matches!(err, ChemkgError::EngineQueryFailed(_)));
    }

    #[tokio::test]
    async fn test_execute_maps_connection_failure() {
        // Bind then drop to get a port nobody listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = GraphDbClient::new(&format!("http://{}", addr)).unwrap();
        let err = client
            .execute("SELECT * WHERE {}", &QueryOptions::new("chemkg").with_timeout_ms(2_000))
            .await
            .unwrap_err();
        assert!(matches!(err, ChemkgError::EngineQueryFailed(_)));
    }
}
