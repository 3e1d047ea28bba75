use super::*;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(control_plane_base: &str) -> PineconeClient {
    let config = PineconeConfig {
        api_key: "pc-test".to_string(),
        index: "test-index".to_string(),
        control_plane_base: control_plane_base.to_string(),
    };
    PineconeClient::new(&config)
        .expect("should create client")
        .with_retry_attempts(1)
}

async fn mount_ready_index(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/indexes/test-index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "test-index",
            "dimension": 1536,
            "metric": "cosine",
            "host": server.uri(),
            "status": {"ready": true, "state": "Ready"},
        })))
        .mount(server)
        .await;
}

fn record(id: &str) -> VectorRecord {
    VectorRecord {
        id: id.to_string(),
        values: vec![0.1, 0.2, 0.3],
        metadata: json!({"text": format!("chunk {}", id)}),
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_returns_handle_for_ready_index() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;

    let client = test_client(&server.uri());

    let index = client.connect().expect("connect should succeed");
    assert_eq!(index.base_url.as_str().trim_end_matches('/'), server.uri());
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_fails_when_index_not_ready() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/test-index"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "test-index",
            "host": server.uri(),
            "status": {"ready": false, "state": "Initializing"},
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());

    let result = client.connect();
    assert!(matches!(result, Err(VectorPipeError::Connection(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_fails_when_control_plane_unreachable() {
    let client = test_client("http://127.0.0.1:9");

    let result = client.connect();
    assert!(matches!(result, Err(VectorPipeError::Connection(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn describe_index_degrades_to_not_ready_on_failure() {
    let client = test_client("http://127.0.0.1:9");

    let description = client.describe_index();

    assert!(!description.ready);
    assert_eq!(description.host, None);
}

#[tokio::test(flavor = "multi_thread")]
async fn upsert_in_batches_partitions_preserving_order() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 500})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let index = client.connect().expect("connect should succeed");

    let records: Vec<VectorRecord> = (0..1200).map(|i| record(&format!("v{}", i))).collect();
    index
        .upsert_in_batches("ws-1", &records)
        .expect("batched upsert should succeed");

    let requests = server.received_requests().await.expect("requests recorded");
    let upserts: Vec<serde_json::Value> = requests
        .iter()
        .filter(|r| r.url.path() == "/vectors/upsert")
        .map(|r| serde_json::from_slice(&r.body).expect("valid JSON body"))
        .collect();

    let sizes: Vec<usize> = upserts
        .iter()
        .map(|body| body["vectors"].as_array().expect("vectors array").len())
        .collect();
    assert_eq!(sizes, vec![500, 500, 200]);

    // Original record order is preserved across groups.
    assert_eq!(upserts[0]["vectors"][0]["id"], "v0");
    assert_eq!(upserts[1]["vectors"][0]["id"], "v500");
    assert_eq!(upserts[2]["vectors"][0]["id"], "v1000");
    assert_eq!(upserts[2]["vectors"][199]["id"], "v1199");
}

#[tokio::test(flavor = "multi_thread")]
async fn upsert_in_batches_stops_at_first_failing_group() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"upsertedCount": 500})))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/vectors/upsert"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let index = client.connect().expect("connect should succeed");

    let records: Vec<VectorRecord> = (0..1200).map(|i| record(&format!("v{}", i))).collect();
    let result = index.upsert_in_batches("ws-1", &records);

    assert!(matches!(result, Err(VectorPipeError::VectorDb(_))));

    // The first group was written, the second failed, the third was never
    // attempted.
    let requests = server.received_requests().await.expect("requests recorded");
    let upsert_calls = requests
        .iter()
        .filter(|r| r.url.path() == "/vectors/upsert")
        .count();
    assert_eq!(upsert_calls, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn query_returns_matches_and_never_requests_values() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("POST"))
        .and(path("/query"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "matches": [
                {"id": "v1", "score": 0.97, "metadata": {"text": "first"}},
                {"id": "v2", "score": 0.85, "metadata": {"text": "second"}},
            ],
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let index = client.connect().expect("connect should succeed");

    let matches = index
        .query("ws-1", &[0.1, 0.2, 0.3], 4, true)
        .expect("query should succeed");

    assert_eq!(matches.len(), 2);
    assert_eq!(matches[0].id, "v1");
    assert!(matches[0].score > matches[1].score);

    let requests = server.received_requests().await.expect("requests recorded");
    let query_body: serde_json::Value = requests
        .iter()
        .find(|r| r.url.path() == "/query")
        .map(|r| serde_json::from_slice(&r.body).expect("valid JSON body"))
        .expect("query request sent");
    assert_eq!(query_body["includeValues"], json!(false));
    assert_eq!(query_body["includeMetadata"], json!(true));
    assert_eq!(query_body["topK"], json!(4));
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_parses_vector_map() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("GET"))
        .and(path("/vectors/fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "vectors": {
                "v1": {"id": "v1", "metadata": {"text": "first"}},
                "v2": {"id": "v2", "metadata": {"text": "second"}},
            },
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let index = client.connect().expect("connect should succeed");

    let fetched = index
        .fetch("ws-1", &["v1".to_string(), "v2".to_string()])
        .expect("fetch should succeed");

    assert_eq!(fetched.len(), 2);
    assert_eq!(fetched["v1"].metadata, Some(json!({"text": "first"})));
}

#[tokio::test(flavor = "multi_thread")]
async fn fetch_accepts_records_response_key() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("GET"))
        .and(path("/vectors/fetch"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": {
                "v1": {"id": "v1", "metadata": {"text": "first"}},
            },
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let index = client.connect().expect("connect should succeed");

    let fetched = index
        .fetch("ws-1", &["v1".to_string()])
        .expect("fetch should succeed");

    assert_eq!(fetched.len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn namespace_lookup_returns_counts() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("POST"))
        .and(path("/describe_index_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dimension": 1536,
            "totalVectorCount": 45,
            "namespaces": {
                "ws-1": {"vectorCount": 42},
                "ws-2": {"vectorCount": 3},
            },
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());

    let info = client
        .namespace("ws-1")
        .expect("lookup should succeed")
        .expect("namespace should exist");
    assert_eq!(info.vector_count, 42);

    assert!(client.namespace_exists("ws-1").expect("lookup succeeds"));
    assert!(!client.namespace_exists("ws-9").expect("lookup succeeds"));

    let missing = client.namespace("nonexistent").expect("lookup succeeds");
    assert!(missing.is_none());

    let listing = client.namespaces();
    assert_eq!(listing.len(), 2);
    assert_eq!(listing[0].name, "ws-1");
    assert_eq!(listing[0].count, 42);

    assert_eq!(client.total_vectors().expect("total succeeds"), 45);
}

#[tokio::test(flavor = "multi_thread")]
async fn namespace_requires_a_name() {
    // Validation fires before any remote call; no server is needed.
    let client = test_client("http://127.0.0.1:9");

    assert!(matches!(
        client.namespace(""),
        Err(VectorPipeError::Validation(_))
    ));
    assert!(matches!(
        client.namespace_exists(""),
        Err(VectorPipeError::Validation(_))
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn namespaces_listing_degrades_to_empty_on_failure() {
    let client = test_client("http://127.0.0.1:9");

    assert!(client.namespaces().is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn total_vectors_falls_back_to_record_count() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("POST"))
        .and(path("/describe_index_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "totalVectorCount": 77,
            "namespaces": {},
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());

    assert_eq!(client.total_vectors().expect("total succeeds"), 77);
}

#[tokio::test(flavor = "multi_thread")]
async fn index_dimension_uses_fallback_when_absent() {
    let server = MockServer::start().await;
    mount_ready_index(&server).await;
    Mock::given(method("POST"))
        .and(path("/describe_index_stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"namespaces": {}})))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());

    assert_eq!(client.index_dimension(), DEFAULT_EMBEDDING_DIMENSION);
}

#[tokio::test(flavor = "multi_thread")]
async fn index_dimension_uses_fallback_on_stats_failure() {
    let client = test_client("http://127.0.0.1:9");

    assert_eq!(client.index_dimension(), DEFAULT_EMBEDDING_DIMENSION);
}
