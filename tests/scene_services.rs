// Scene-context services against stubbed HTTP endpoints: geosearch, page
// summaries, the planner fan-out, position lookup, and the inference call.

use std::time::Duration;

use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vantage::config::{InferenceConfig, LandmarkConfig};
use vantage::inference::{OpenRouterDescriber, SceneDescriber};
use vantage::location::{
    Accuracy, Coordinate, FixCache, FixedPositionSource, IpLookupSource, LocationResolver,
    PositionSource,
};
use vantage::planner::TripPlanner;
use vantage::wiki::{LandmarkSource, WikiClient};

fn eiffel() -> Coordinate {
    Coordinate::new(48.8584, 2.2945)
}

fn landmark_config(server: &MockServer) -> LandmarkConfig {
    LandmarkConfig {
        api_endpoint: format!("{}/w/api.php", server.uri()),
        rest_endpoint: format!("{}/api/rest_v1", server.uri()),
        search_radius_m: 10_000,
        search_limit: 20,
        plan_limit: 10,
    }
}

const GEOSEARCH_BODY: &str = r#"{
    "batchcomplete": "",
    "query": {
        "geosearch": [
            {"pageid": 1, "title": "Eiffel Tower", "lat": 48.858296, "lon": 2.294479, "dist": 12.4},
            {"pageid": 2, "title": "Champ de Mars", "lat": 48.856, "lon": 2.298, "dist": 310.2},
            {"pageid": 3, "title": "Trocadero", "lat": 48.861, "lon": 2.289, "dist": 480.0}
        ]
    }
}"#;

#[tokio::test]
async fn nearest_title_is_the_first_ranked_hit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("list", "geosearch"))
        .and(query_param("gsradius", "10000"))
        .and(query_param("gslimit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(GEOSEARCH_BODY, "application/json"))
        .mount(&server)
        .await;

    let client = WikiClient::new(&landmark_config(&server));
    assert_eq!(
        client.nearest_title(eiffel()).await.as_deref(),
        Some("Eiffel Tower")
    );
}

#[tokio::test]
async fn empty_geosearch_degrades_to_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"batchcomplete": "", "query": {"geosearch": []}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let client = WikiClient::new(&landmark_config(&server));
    assert!(client.nearest_title(eiffel()).await.is_none());
}

#[tokio::test]
async fn failing_geosearch_degrades_to_absent_for_the_pipeline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = WikiClient::new(&landmark_config(&server));
    // The raw query surfaces the failure; the landmark seam degrades it.
    assert!(client.search_nearby(eiffel()).await.is_err());
    assert!(client.nearest_title(eiffel()).await.is_none());
}

#[tokio::test]
async fn plan_preserves_rank_order_and_tolerates_failed_summaries() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(GEOSEARCH_BODY, "application/json"))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Eiffel%20Tower"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{
                "description": "Tower in Paris, France",
                "extract": "The Eiffel Tower is a wrought-iron lattice tower.",
                "content_urls": {
                    "desktop": {"page": "https://en.wikipedia.org/wiki/Eiffel_Tower"},
                    "mobile": {"page": "https://en.m.wikipedia.org/wiki/Eiffel_Tower"}
                }
            }"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    // The middle candidate's summary fetch fails; the candidate survives.
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Champ%20de%20Mars"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Trocadero"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"description": "Esplanade across the Seine", "content_urls": {"mobile": {"page": "https://en.m.wikipedia.org/wiki/Trocadero"}}}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let planner = TripPlanner::with_parts(
        LocationResolver::with_parts(
            FixCache::new(dir.path().to_path_buf(), 900),
            Box::new(FixedPositionSource::new(eiffel())),
            Duration::from_millis(7_000),
        ),
        WikiClient::new(&landmark_config(&server)),
        10,
    );

    let items = planner.plan_nearby(Some(eiffel()), None).await.unwrap();
    assert_eq!(items.len(), 3);

    assert_eq!(items[0].title, "Eiffel Tower");
    assert_eq!(items[0].detail.as_deref(), Some("Tower in Paris, France"));
    assert_eq!(
        items[0].url.as_deref(),
        Some("https://en.wikipedia.org/wiki/Eiffel_Tower")
    );

    assert_eq!(items[1].title, "Champ de Mars");
    assert!(items[1].detail.is_none());
    assert!(items[1].url.is_none());

    assert_eq!(items[2].title, "Trocadero");
    assert_eq!(
        items[2].url.as_deref(),
        Some("https://en.m.wikipedia.org/wiki/Trocadero")
    );
}

#[tokio::test]
async fn plan_caps_candidates_at_the_limit() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(GEOSEARCH_BODY, "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/rest_v1/page/summary/Eiffel%20Tower"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(r#"{"description": "Tower"}"#, "application/json"))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let planner = TripPlanner::with_parts(
        LocationResolver::with_parts(
            FixCache::new(dir.path().to_path_buf(), 900),
            Box::new(FixedPositionSource::new(eiffel())),
            Duration::from_millis(7_000),
        ),
        WikiClient::new(&landmark_config(&server)),
        10,
    );

    let items = planner.plan_nearby(None, Some(1)).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].title, "Eiffel Tower");
}

#[tokio::test]
async fn position_lookup_parses_a_successful_fix() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"status": "success", "lat": 48.8584, "lon": 2.2945, "city": "Paris"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let source = IpLookupSource::new(format!("{}/json", server.uri()));
    let coordinate = source.current_position(Accuracy::Balanced).await.unwrap();
    assert_eq!(coordinate, eiffel());
}

#[tokio::test]
async fn refused_position_lookup_carries_the_reason() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"status": "fail", "message": "private range"}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let source = IpLookupSource::new(format!("{}/json", server.uri()));
    let error = source
        .current_position(Accuracy::Balanced)
        .await
        .unwrap_err();
    assert!(error.to_string().contains("private range"));
}

#[tokio::test]
async fn inference_sends_the_inline_image_and_returns_the_completion() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("data:image/jpeg;base64,"))
        .and(body_string_contains("Eiffel"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"choices": [{"message": {"role": "assistant", "content": "  A lattice tower.  "}}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let describer = OpenRouterDescriber::new(&InferenceConfig {
        endpoint: server.uri(),
        api_key: Some("secret".to_string()),
        model: "test-model".to_string(),
        max_tokens: 512,
    });

    let completion = describer
        .describe("Location: Eiffel Tower, Paris, France", "AAAA")
        .await
        .unwrap();
    assert_eq!(completion, "A lattice tower.");
}

#[tokio::test]
async fn inference_error_carries_status_and_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let describer = OpenRouterDescriber::new(&InferenceConfig {
        endpoint: server.uri(),
        api_key: None,
        model: "test-model".to_string(),
        max_tokens: 512,
    });

    let error = describer.describe("prompt", "AAAA").await.unwrap_err();
    let message = error.to_string();
    assert!(message.contains("502"), "message: {}", message);
    assert!(message.contains("upstream exploded"), "message: {}", message);
}

#[tokio::test]
async fn empty_completion_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"{"choices": [{"message": {"role": "assistant", "content": ""}}]}"#,
            "application/json",
        ))
        .mount(&server)
        .await;

    let describer = OpenRouterDescriber::new(&InferenceConfig {
        endpoint: server.uri(),
        api_key: None,
        model: "test-model".to_string(),
        max_tokens: 512,
    });

    let error = describer.describe("prompt", "AAAA").await.unwrap_err();
    assert!(error.to_string().contains("Empty completion"));
}
