//! Real HTTP traffic against a served, instrumented app.

use route_telemetry::observability::metrics::{
    MetricLabels, HTTP_REQUESTS_TOTAL, HTTP_RESPONSE_SIZE,
};

mod common;
use common::{app, ready_telemetry, spawn_server, SERVICE};

#[tokio::test]
async fn test_served_requests_are_attributed() {
    let (telemetry, instruments) = ready_telemetry();
    let addr = spawn_server(app(&telemetry)).await;
    let client = reqwest::Client::new();

    let body = client
        .get(format!("http://{addr}/users/me"))
        .header("x-request-id", "abc-1")
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert_eq!(body, "/users/me registry-scan abc-1");

    let response = client
        .get(format!("http://{addr}/users/42"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "user 42 via /users/{id}");

    let response = client
        .get(format!("http://{addr}/nope/123"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let me = MetricLabels::new("GET", "/users/me", 200, SERVICE);
    let user = MetricLabels::new("GET", "/users/{id}", 200, SERVICE);
    let missing = MetricLabels::new("GET", "/nope/:id", 404, SERVICE);
    assert_eq!(instruments.counter_value(HTTP_REQUESTS_TOTAL, &me), 1);
    assert_eq!(instruments.counter_value(HTTP_REQUESTS_TOTAL, &user), 1);
    assert_eq!(instruments.counter_value(HTTP_REQUESTS_TOTAL, &missing), 1);

    let expected_size = "user 42 via /users/{id}".len() as f64;
    assert_eq!(
        instruments.histogram_values(HTTP_RESPONSE_SIZE, &user),
        vec![expected_size]
    );
}

#[tokio::test]
async fn test_concurrent_clients() {
    let (telemetry, instruments) = ready_telemetry();
    let addr = spawn_server(app(&telemetry)).await;
    let client = reqwest::Client::new();

    let mut tasks = Vec::new();
    for i in 0..50 {
        let client = client.clone();
        tasks.push(tokio::spawn(async move {
            client
                .get(format!("http://{addr}/users/{i}"))
                .send()
                .await
                .unwrap()
                .status()
        }));
    }
    for task in tasks {
        assert_eq!(task.await.unwrap(), reqwest::StatusCode::OK);
    }

    let user = MetricLabels::new("GET", "/users/{id}", 200, SERVICE);
    assert_eq!(instruments.counter_value(HTTP_REQUESTS_TOTAL, &user), 50);
}
