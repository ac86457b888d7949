//! Integration tests for the external-API fallback path, using a mocked
//! removal endpoint.

mod common;

use common::{assert_flipped, column_gradient_png, image_form, TestHarness};

use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use clearcut::config::Config;

fn config_for(mock: &MockServer) -> Config {
    let mut config = Config::default();
    config.removal.api_key = Some("test-key".to_string());
    config.removal.endpoint = format!("{}/v1.0/removebg", mock.uri());
    config
}

async fn upload_and_fetch_processed(addr: std::net::SocketAddr, input: Vec<u8>) -> Vec<u8> {
    let resp = reqwest::Client::new()
        .post(format!("http://{addr}/api/images/upload"))
        .multipart(image_form(input, "photo.png", "image/png"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    let url = body["image"]["processedUrl"].as_str().unwrap().to_string();

    let resp = reqwest::get(format!("http://{addr}{url}")).await.unwrap();
    assert_eq!(resp.status(), 200);
    resp.bytes().await.unwrap().to_vec()
}

#[tokio::test]
async fn quota_exceeded_falls_back_to_local_flip() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/removebg"))
        .and(header("X-Api-Key", "test-key"))
        .respond_with(ResponseTemplate::new(402))
        .expect(1)
        .mount(&mock)
        .await;

    let (_h, addr) = TestHarness::with_server_config(config_for(&mock)).await;

    let input = column_gradient_png(6, 3);
    let processed = upload_and_fetch_processed(addr, input.clone()).await;
    assert_flipped(&processed, &input);
}

#[tokio::test]
async fn auth_and_rate_limit_failures_fall_back() {
    for status in [401u16, 429] {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1.0/removebg"))
            .respond_with(ResponseTemplate::new(status))
            .mount(&mock)
            .await;

        let (_h, addr) = TestHarness::with_server_config(config_for(&mock)).await;

        let input = column_gradient_png(6, 3);
        let processed = upload_and_fetch_processed(addr, input.clone()).await;
        assert_flipped(&processed, &input);
    }
}

#[tokio::test]
async fn fallback_output_matches_no_credential_output() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/removebg"))
        .respond_with(ResponseTemplate::new(402))
        .mount(&mock)
        .await;

    let input = column_gradient_png(5, 5);

    let (_h1, with_key) = TestHarness::with_server_config(config_for(&mock)).await;
    let (_h2, without_key) = TestHarness::with_server().await;

    let a = upload_and_fetch_processed(with_key, input.clone()).await;
    let b = upload_and_fetch_processed(without_key, input).await;
    assert_eq!(a, b);
}

#[tokio::test]
async fn api_success_result_is_flipped() {
    // The mock "removes the background" by returning a different image; the
    // service must flip what the API returned, not the original upload.
    let api_result = column_gradient_png(4, 2);

    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/removebg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(api_result.clone()))
        .expect(1)
        .mount(&mock)
        .await;

    let (_h, addr) = TestHarness::with_server_config(config_for(&mock)).await;

    let input = column_gradient_png(10, 10);
    let processed = upload_and_fetch_processed(addr, input).await;
    assert_flipped(&processed, &api_result);
}

#[tokio::test]
async fn undecodable_api_response_falls_back() {
    let mock = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1.0/removebg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"garbage bytes".to_vec()))
        .mount(&mock)
        .await;

    let (_h, addr) = TestHarness::with_server_config(config_for(&mock)).await;

    let input = column_gradient_png(6, 3);
    let processed = upload_and_fetch_processed(addr, input.clone()).await;
    assert_flipped(&processed, &input);
}
