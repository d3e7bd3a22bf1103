//! Identity client loading signing keys from a well-known key document.

use pasetors::claims::Claims;
use pasetors::keys::{AsymmetricKeyPair, Generate};
use pasetors::version4::{PublicToken, V4};
use planguard::{Error, IdentityClient, IdentityConfig, IdentityProvider, UserId};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ISSUER: &str = "https://id.example.com";
const SESSION_ISSUER: &str = "https://session.example.com";
const AUDIENCE: &str = "study-app";
const KEYS_PATH: &str = "/.well-known/paseto-keys";

fn sign(keypair: &AsymmetricKeyPair<V4>, kid: &str, issuer: &str, sub: &str) -> String {
    let mut claims = Claims::new().unwrap();
    claims.issuer(issuer).unwrap();
    claims.audience(AUDIENCE).unwrap();
    claims.subject(sub).unwrap();
    let footer = format!(r#"{{"kid":"{kid}"}}"#);
    PublicToken::sign(
        &keypair.secret,
        claims.to_string().unwrap().as_bytes(),
        Some(footer.as_bytes()),
        None,
    )
    .unwrap()
}

fn config(server: &MockServer) -> IdentityConfig {
    let url = format!("{}{KEYS_PATH}", server.uri()).parse().unwrap();
    IdentityConfig::new(ISSUER, SESSION_ISSUER, AUDIENCE).with_keys_url(url)
}

#[tokio::test]
async fn connect_loads_active_and_retiring_keys() {
    let active = AsymmetricKeyPair::<V4>::generate().unwrap();
    let retiring = AsymmetricKeyPair::<V4>::generate().unwrap();
    let revoked = AsymmetricKeyPair::<V4>::generate().unwrap();

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KEYS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": ISSUER,
            "version": "v4.public",
            "cache_ttl_seconds": 3600,
            "keys": [
                { "kid": "k-2026", "public_key_hex": hex::encode(active.public.as_bytes()),
                  "status": "active", "created_at": "2026-01-01T00:00:00Z" },
                { "kid": "k-2025", "public_key_hex": hex::encode(retiring.public.as_bytes()),
                  "status": "retiring", "created_at": "2025-01-01T00:00:00Z" },
                { "kid": "k-2024", "public_key_hex": hex::encode(revoked.public.as_bytes()),
                  "status": "revoked", "created_at": "2024-01-01T00:00:00Z" },
            ],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = IdentityClient::connect(config(&server)).await.unwrap();

    let token = sign(&active, "k-2026", ISSUER, "user-1");
    assert_eq!(
        client.verify_id_token(&token).await.unwrap(),
        UserId("user-1".into())
    );

    let artifact = sign(&retiring, "k-2025", SESSION_ISSUER, "user-2");
    assert_eq!(
        client.verify_session_artifact(&artifact).await.unwrap(),
        UserId("user-2".into())
    );

    let stale = sign(&revoked, "k-2024", ISSUER, "user-3");
    assert!(client.verify_id_token(&stale).await.is_err());
}

#[tokio::test]
async fn connect_reports_key_document_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KEYS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = IdentityClient::connect(config(&server)).await.unwrap_err();
    match err {
        Error::KeyDocument { status, detail } => {
            assert_eq!(status, 503);
            assert_eq!(detail, "maintenance");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn empty_key_document_is_a_config_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(KEYS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issuer": ISSUER,
            "version": "v4.public",
            "cache_ttl_seconds": 3600,
            "keys": [],
        })))
        .mount(&server)
        .await;

    let err = IdentityClient::connect(config(&server)).await.unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}
