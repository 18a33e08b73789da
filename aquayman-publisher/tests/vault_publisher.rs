//! `VaultPublisher` against a mock Vault server.

use aquayman_core::RobotConfig;
use aquayman_publisher::{Publisher, VaultPublisher};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SECRET_PATH: &str = "/v1/secret/data/quay";

fn robot() -> RobotConfig {
    RobotConfig {
        name: "ci".into(),
        vault_secret: Some("secret/data/quay#ci".into()),
        ..RobotConfig::default()
    }
}

fn docker_config(token: &str) -> String {
    let auth = STANDARD.encode(format!("acme+ci:{token}"));
    let config = json!({"auths": {"quay.io": {"auth": auth, "email": ""}}});
    format!("{}\n", serde_json::to_string_pretty(&config).expect("json"))
}

async fn run<T, F>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.expect("join")
}

#[tokio::test(flavor = "multi_thread")]
async fn update_writes_both_fields_and_keeps_others() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SECRET_PATH))
        .and(header("X-Vault-Token", "root"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"data": {"unrelated": "keep-me"}, "metadata": {"version": 3}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SECRET_PATH))
        .and(body_json(json!({"data": {
            "unrelated": "keep-me",
            "ci-token": "tok",
            "ci-config": docker_config("tok"),
        }})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let vault = VaultPublisher::new(&server.uri(), "root", "acme");
    run(move || vault.update_robot(&robot(), "tok"))
        .await
        .expect("update");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_creates_missing_secret() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SECRET_PATH))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"errors": []})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SECRET_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let vault = VaultPublisher::new(&server.uri(), "root", "acme");
    run(move || vault.update_robot(&robot(), "tok"))
        .await
        .expect("update");
}

#[tokio::test(flavor = "multi_thread")]
async fn update_skips_write_when_up_to_date() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SECRET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"data": {"ci-token": "tok", "ci-config": docker_config("tok")}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let vault = VaultPublisher::new(&server.uri(), "root", "acme");
    run(move || vault.update_robot(&robot(), "tok"))
        .await
        .expect("update");
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_removes_only_robot_fields() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(SECRET_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"data": {"ci-token": "tok", "ci-config": "{}", "other": "x"}}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(SECRET_PATH))
        .and(body_json(json!({"data": {"other": "x"}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let vault = VaultPublisher::new(&server.uri(), "root", "acme");
    run(move || vault.delete_robot(&robot())).await.expect("delete");
}

#[tokio::test(flavor = "multi_thread")]
async fn robots_without_address_never_touch_vault() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let vault = VaultPublisher::new(&server.uri(), "root", "acme");
    let plain = RobotConfig {
        name: "ci".into(),
        ..RobotConfig::default()
    };
    run(move || {
        vault.update_robot(&plain, "tok").expect("update");
        vault.delete_robot(&plain).expect("delete");
    })
    .await;
}
