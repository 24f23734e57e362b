//! End-to-end client tests against a local canned HTTP server.

mod common;

use std::time::Duration;

use firststreet_client::{
    FirstStreetClient, FirstStreetError, RiskCategory, RiskQueryRequest, PROPERTY_BY_FSID_QUERY,
};
use serde_json::json;

fn client_for(base_url: &str) -> FirstStreetClient {
    FirstStreetClient::with_base_url(base_url, Duration::from_secs(5)).unwrap()
}

fn full_property() -> serde_json::Value {
    json!({
        "fsid": 390655185,
        "address": {"formattedAddress": "1 Main St"},
        "flood": {
            "floodFactor": 5,
            "riskDirection": "increasing",
            "insuranceRequirement": "required",
            "adaptationConnection": {"totalCount": 2},
            "insuranceQuotes": null,
            "historic": [],
            "insights": []
        },
        "fire": {"fireFactor": 3, "historicConnection": {"edges": []}, "insuranceHippo": null},
        "heat": {"heatFactor": 4},
        "wind": {"windFactor": 2, "historicConnection": {"edges": null}},
        "air": {"airFactor": 1, "triFacilityConnection": null}
    })
}

#[tokio::test]
async fn posts_fixed_query_with_string_variables() {
    let server = common::serve(200, json!({"data": {"property": full_property()}}).to_string()).await;
    let client = client_for(&server.base_url);

    let request = RiskQueryRequest::new(390655185).with_building(3);
    let property = client.fetch_property(&request).await.unwrap();
    assert_eq!(property, full_property());

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let captured = &requests[0];
    assert_eq!(captured.method, "POST");
    assert_eq!(captured.path, "/api/fsfapi/");
    assert_eq!(
        captured.header("content-type"),
        Some("application/json; charset=utf-8")
    );
    assert_eq!(captured.body["query"], json!(PROPERTY_BY_FSID_QUERY));
    assert_eq!(
        captured.body["variables"],
        json!({"fsid": "390655185", "buildingId": "3"})
    );
}

#[tokio::test]
async fn aggregate_returns_five_records_with_factors() {
    let server = common::serve(200, json!({"data": {"property": full_property()}}).to_string()).await;
    let client = client_for(&server.base_url);

    let report = client
        .fetch_all_risk_data(&RiskQueryRequest::new(390655185))
        .await
        .unwrap();

    assert_eq!(report.iter().count(), 5);
    let expected = [
        (RiskCategory::Flood, 5),
        (RiskCategory::Fire, 3),
        (RiskCategory::Heat, 4),
        (RiskCategory::Wind, 2),
        (RiskCategory::Air, 1),
    ];
    for (category, factor) in expected {
        assert_eq!(report.factor(category), Some(&json!(factor)), "{category}");
    }
    assert_eq!(
        report.wind.record().unwrap().get("historic_events"),
        Some(&json!([]))
    );
    assert_eq!(
        report.air.record().unwrap().get("tri_facilities"),
        Some(&json!([]))
    );
    assert_eq!(report.summary.formatted_address.as_deref(), Some("1 Main St"));
}

#[tokio::test]
async fn missing_category_is_isolated() {
    let mut property = full_property();
    property.as_object_mut().unwrap().remove("heat");
    let server = common::serve(200, json!({"data": {"property": property}}).to_string()).await;
    let client = client_for(&server.base_url);

    let report = client
        .fetch_all_risk_data(&RiskQueryRequest::new(1))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&report.heat).unwrap(),
        json!({"error": "Missing field: property.heat"})
    );
    assert_eq!(report.failed_categories().collect::<Vec<_>>(), vec![RiskCategory::Heat]);
    assert_eq!(report.factor(RiskCategory::Flood), Some(&json!(5)));
    assert_eq!(report.factor(RiskCategory::Air), Some(&json!(1)));
}

#[tokio::test]
async fn provider_errors_surface_as_api_error() {
    let server = common::serve(200, json!({"errors": ["API Error"]}).to_string()).await;
    let client = client_for(&server.base_url);

    let err = client
        .fetch_all_risk_data(&RiskQueryRequest::new(12345))
        .await
        .unwrap_err();
    assert!(matches!(err, FirstStreetError::Api { ref errors } if *errors == json!(["API Error"])));
}

#[tokio::test]
async fn null_property_is_not_found() {
    let server = common::serve(200, json!({"data": {"property": null}}).to_string()).await;
    let client = client_for(&server.base_url);

    let err = client
        .fetch_property(&RiskQueryRequest::new(12345))
        .await
        .unwrap_err();
    assert!(matches!(err, FirstStreetError::NotFound { fsid: 12345 }));
}

#[tokio::test]
async fn invalid_json_is_malformed() {
    let server = common::serve(200, "<html>maintenance</html>").await;
    let client = client_for(&server.base_url);

    let err = client
        .fetch_property(&RiskQueryRequest::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, FirstStreetError::MalformedResponse { .. }));
    assert!(err.to_string().contains("invalid JSON"));
}

#[tokio::test]
async fn invalid_utf8_body_is_malformed() {
    let body = b"{\"data\":{\"property\":{\"fsid\":\"\xff\xfe\"}}}".to_vec();
    let server = common::serve(200, body).await;
    let client = client_for(&server.base_url);

    let err = client
        .fetch_property(&RiskQueryRequest::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, FirstStreetError::MalformedResponse { .. }));
}

#[tokio::test]
async fn non_success_status_is_transport_error() {
    let server = common::serve(503, "upstream unavailable").await;
    let client = client_for(&server.base_url);

    let err = client
        .fetch_property(&RiskQueryRequest::new(1))
        .await
        .unwrap_err();
    match err {
        FirstStreetError::Transport { ref message, status } => {
            assert_eq!(status, Some(503));
            assert!(message.contains("upstream unavailable"));
        }
        ref other => panic!("expected transport error, got {other:?}"),
    }
    assert!(err.is_retryable());
}

#[tokio::test]
async fn timeout_is_transport_error() {
    let base_url = common::serve_silent().await;
    let client = FirstStreetClient::with_base_url(&base_url, Duration::from_millis(200)).unwrap();

    let err = client
        .fetch_property(&RiskQueryRequest::new(1))
        .await
        .unwrap_err();
    assert!(matches!(err, FirstStreetError::Transport { .. }));
    assert!(err.to_string().contains("timed out"), "{err}");
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(&format!("http://{addr}/"));
    let err = client
        .fetch_property(&RiskQueryRequest::new(1))
        .await
        .unwrap_err();
    assert!(err.is_retryable());
}
