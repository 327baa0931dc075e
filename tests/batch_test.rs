//! Batch endpoint tests: authentication, body validation, URL issuance.

mod common;

use common::*;
use lfs_s3_gateway::storage::PresignMethod;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn test_download_scenario_exact_body() {
    let (gateway, backend) = gateway(single_bucket_backend());
    let event = single_batch(
        &basic_auth("u", "p"),
        r#"{"operation":"download","objects":[{"oid":"abc123"}]}"#,
    );

    let response = gateway.handle(&event).await.unwrap();

    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.headers.get("Content-Type").map(String::as_str),
        Some("application/vnd.git-lfs+json; charset=utf-8")
    );
    let url = fake_url(PresignMethod::Get, BUCKET, "abc123");
    assert_eq!(
        response.body,
        format!(
            r#"{{"transfer":"basic","objects":[{{"oid":"abc123","authenticated":true,"actions":{{"download":{{"href":"{}","expires_in":3600}}}}}}]}}"#,
            url
        )
    );
    assert_eq!(backend.presign_calls().len(), 1);
}

#[tokio::test]
async fn test_upload_n_objects() {
    let (gateway, backend) = gateway(single_bucket_backend());
    let body = json!({
        "operation": "upload",
        "transfers": ["basic"],
        "objects": [
            {"oid": "1111", "size": 10},
            {"oid": "2222", "size": 20},
            {"oid": "3333", "size": 30},
        ]
    })
    .to_string();

    let response = gateway
        .handle(&single_batch(&basic_auth("u", "p"), &body))
        .await
        .unwrap();
    assert_eq!(response.status_code, 200);

    let value = response.json_body().unwrap();
    assert_eq!(value["transfer"], "basic");
    let objects = value["objects"].as_array().unwrap();
    assert_eq!(objects.len(), 3);
    for (object, (oid, size)) in objects
        .iter()
        .zip([("1111", 10), ("2222", 20), ("3333", 30)])
    {
        assert_eq!(object["oid"], oid);
        assert_eq!(object["size"], size);
        assert_eq!(object["authenticated"], true);
        assert_eq!(object["actions"]["upload"]["expires_in"], 3600);
        assert_eq!(
            object["actions"]["upload"]["href"],
            fake_url(PresignMethod::Put, BUCKET, oid)
        );
        assert!(object["actions"].get("download").is_none());
    }

    let calls = backend.presign_calls();
    assert_eq!(calls.len(), 3);
    for call in &calls {
        assert_eq!(call.method, PresignMethod::Put);
        assert_eq!(call.bucket, BUCKET);
        assert_eq!(call.expires_in, Duration::from_secs(3600));
        assert_eq!(
            call.content_type.as_deref(),
            Some("application/octet-stream")
        );
    }
    let keys: Vec<&str> = calls.iter().map(|c| c.key.as_str()).collect();
    assert_eq!(keys, ["1111", "2222", "3333"]);
}

#[tokio::test]
async fn test_extra_fields_are_echoed_in_order() {
    let (gateway, _backend) = gateway(single_bucket_backend());
    let body = r#"{"operation":"download","objects":[{"oid":"abc","size":5,"zeta":{"nested":[1,2]},"alpha":null}]}"#;

    let response = gateway
        .handle(&single_batch(&basic_auth("u", "p"), body))
        .await
        .unwrap();
    assert_eq!(response.status_code, 200);

    let url = fake_url(PresignMethod::Get, BUCKET, "abc");
    assert_eq!(
        response.body,
        format!(
            r#"{{"transfer":"basic","objects":[{{"oid":"abc","size":5,"zeta":{{"nested":[1,2]}},"alpha":null,"authenticated":true,"actions":{{"download":{{"href":"{}","expires_in":3600}}}}}}]}}"#,
            url
        )
    );
}

#[tokio::test]
async fn test_wrong_password_is_forbidden_without_signing() {
    let (gateway, backend) = gateway(single_bucket_backend());
    let event = single_batch(
        &basic_auth("u", "wrong"),
        r#"{"operation":"upload","objects":[{"oid":"abc"}]}"#,
    );

    let response = gateway.handle(&event).await.unwrap();

    assert_eq!(response.status_code, 403);
    assert_eq!(response.body, r#"{"message":"Forbidden"}"#);
    assert!(response.headers.is_empty());
    assert!(backend.presign_calls().is_empty());
}

#[tokio::test]
async fn test_missing_or_empty_authorization_skips_tag_read() {
    let (gateway, backend) = gateway(single_bucket_backend());
    let body = r#"{"operation":"upload","objects":[{"oid":"abc"}]}"#;

    let missing = batch_event(SINGLE_RESOURCE, BUCKET, None, None, Some(body));
    assert_eq!(gateway.handle(&missing).await.unwrap().status_code, 403);

    let empty = batch_event(SINGLE_RESOURCE, BUCKET, None, Some(""), Some(body));
    assert_eq!(gateway.handle(&empty).await.unwrap().status_code, 403);

    let garbage = batch_event(SINGLE_RESOURCE, BUCKET, None, Some("Basic %%%"), Some(body));
    assert_eq!(gateway.handle(&garbage).await.unwrap().status_code, 403);

    assert_eq!(backend.tag_read_count(), 0);
    assert!(backend.presign_calls().is_empty());
}

#[tokio::test]
async fn test_lowercase_authorization_header_is_accepted() {
    let (gateway, _backend) = gateway(single_bucket_backend());
    let mut event = single_batch(
        "unused",
        r#"{"operation":"download","objects":[{"oid":"abc"}]}"#,
    );
    event.headers = Some(
        [("authorization".to_string(), basic_auth("u", "p"))]
            .into_iter()
            .collect(),
    );

    assert_eq!(gateway.handle(&event).await.unwrap().status_code, 200);
}

#[tokio::test]
async fn test_fewer_than_two_tags_is_forbidden() {
    let backend = MockBackend::new().with_tags(BUCKET, &[("LFS_USERNAME", "u")]);
    let (gateway, backend) = gateway(backend);
    let event = single_batch(
        &basic_auth("u", ""),
        r#"{"operation":"download","objects":[{"oid":"abc"}]}"#,
    );

    assert_eq!(gateway.handle(&event).await.unwrap().status_code, 403);
    assert_eq!(backend.tag_read_count(), 1);
    assert!(backend.presign_calls().is_empty());
}

#[tokio::test]
async fn test_missing_credential_tags_is_forbidden() {
    let backend = MockBackend::new().with_tags(
        BUCKET,
        &[("Project", "assets"), ("LFS_USERNAME", "u"), ("Owner", "ops")],
    );
    let (gateway, _backend) = gateway(backend);
    let event = single_batch(
        &basic_auth("u", "p"),
        r#"{"operation":"download","objects":[{"oid":"abc"}]}"#,
    );

    assert_eq!(gateway.handle(&event).await.unwrap().status_code, 403);
}

#[tokio::test]
async fn test_unsupported_operation_is_bad_request() {
    let (gateway, backend) = gateway(single_bucket_backend());
    let event = single_batch(
        &basic_auth("u", "p"),
        r#"{"operation":"delete","objects":[{"oid":"abc"}]}"#,
    );

    let response = gateway.handle(&event).await.unwrap();
    assert_eq!(response.status_code, 400);
    assert_eq!(response.body, r#"{"message":"Bad request"}"#);
    assert!(backend.presign_calls().is_empty());
}

#[tokio::test]
async fn test_invalid_bodies_are_bad_request() {
    let (gateway, _backend) = gateway(single_bucket_backend());
    let auth = basic_auth("u", "p");

    let no_body = batch_event(SINGLE_RESOURCE, BUCKET, None, Some(&auth), None);
    assert_eq!(gateway.handle(&no_body).await.unwrap().status_code, 400);

    for body in [
        "",
        "not json",
        "{}",
        r#"{"operation":"","objects":[{"oid":"a"}]}"#,
        r#"{"operation":"upload","objects":[]}"#,
        r#"{"operation":"upload"}"#,
        r#"{"objects":[{"oid":"a"}]}"#,
        r#"{"operation":"upload","objects":[{"size":1}]}"#,
    ] {
        let response = gateway.handle(&single_batch(&auth, body)).await.unwrap();
        assert_eq!(response.status_code, 400, "body {:?}", body);
    }
}

#[tokio::test]
async fn test_auth_is_checked_before_body() {
    let (gateway, _backend) = gateway(single_bucket_backend());
    let response = gateway
        .handle(&single_batch(&basic_auth("u", "nope"), "not json"))
        .await
        .unwrap();
    assert_eq!(response.status_code, 403);
}

#[tokio::test]
async fn test_empty_url_is_internal_error() {
    let (gateway, backend) = gateway(single_bucket_backend().with_forced_url(""));
    let event = single_batch(
        &basic_auth("u", "p"),
        r#"{"operation":"upload","objects":[{"oid":"a"},{"oid":"b"}]}"#,
    );

    let response = gateway.handle(&event).await.unwrap();
    assert_eq!(response.status_code, 500);
    assert_eq!(response.body, r#"{"message":"Internal Error"}"#);
    // the first empty URL aborts the whole batch
    assert_eq!(backend.presign_calls().len(), 1);
}

#[tokio::test]
async fn test_shared_bucket_uses_repository_scope() {
    let backend = MockBackend::new().with_tags(
        BUCKET,
        &[
            ("LFS_USERNAME", "root"),
            ("LFS_PASSWORD", "rootpw"),
            ("LFS_USERNAME-game", "gamer"),
            ("LFS_PASSWORD-game", "gamepw"),
        ],
    );
    let (gateway, backend) = gateway(backend);
    let body = r#"{"operation":"upload","objects":[{"oid":"abc"}]}"#;

    let scoped = batch_event(
        SHARED_RESOURCE,
        BUCKET,
        Some("game"),
        Some(&basic_auth("gamer", "gamepw")),
        Some(body),
    );
    let response = gateway.handle(&scoped).await.unwrap();
    assert_eq!(response.status_code, 200);
    assert_eq!(
        response.json_body().unwrap()["objects"][0]["actions"]["upload"]["href"],
        fake_url(PresignMethod::Put, BUCKET, "game/abc")
    );
    assert_eq!(backend.presign_calls()[0].key, "game/abc");

    // bucket-wide credentials do not open a repository scope
    let unscoped_creds = batch_event(
        SHARED_RESOURCE,
        BUCKET,
        Some("game"),
        Some(&basic_auth("root", "rootpw")),
        Some(body),
    );
    assert_eq!(gateway.handle(&unscoped_creds).await.unwrap().status_code, 403);

    // and another repository's credentials do not either
    let other_repo = batch_event(
        SHARED_RESOURCE,
        BUCKET,
        Some("docs"),
        Some(&basic_auth("gamer", "gamepw")),
        Some(body),
    );
    assert_eq!(gateway.handle(&other_repo).await.unwrap().status_code, 403);
}

#[tokio::test]
async fn test_base64_encoded_body() {
    use base64::Engine;
    let (gateway, _backend) = gateway(single_bucket_backend());
    let mut event = single_batch(
        &basic_auth("u", "p"),
        &base64::engine::general_purpose::STANDARD
            .encode(r#"{"operation":"download","objects":[{"oid":"abc"}]}"#),
    );
    event.is_base64_encoded = Some(true);

    assert_eq!(gateway.handle(&event).await.unwrap().status_code, 200);
}

#[tokio::test]
async fn test_storage_fault_propagates() {
    // no tags registered for this bucket: the mock reports it as missing
    let (gateway, backend) = gateway(MockBackend::new());
    let event = single_batch(
        &basic_auth("u", "p"),
        r#"{"operation":"download","objects":[{"oid":"abc"}]}"#,
    );

    assert!(gateway.handle(&event).await.is_err());
    assert!(backend.presign_calls().is_empty());
}

#[tokio::test]
async fn test_array_body_is_bad_request() {
    let (gateway, backend) = gateway(single_bucket_backend());
    let event = single_batch(&basic_auth("u", "p"), r#"["upload",[{"oid":"abc"}]]"#);

    let response = gateway.handle(&event).await.unwrap();
    assert_eq!(response.status_code, 400);
    assert_eq!(response.body, r#"{"message":"Bad request"}"#);
    assert!(backend.presign_calls().is_empty());
}

#[tokio::test]
async fn test_exact_authorization_header_wins_over_other_spellings() {
    let (gateway, _backend) = gateway(single_bucket_backend());
    let mut event = single_batch(
        "unused",
        r#"{"operation":"download","objects":[{"oid":"abc"}]}"#,
    );
    event.headers = Some(
        [
            ("Authorization".to_string(), basic_auth("u", "p")),
            ("authorization".to_string(), basic_auth("x", "y")),
        ]
        .into_iter()
        .collect(),
    );

    for _ in 0..20 {
        assert_eq!(gateway.handle(&event).await.unwrap().status_code, 200);
    }
}

#[tokio::test]
async fn test_oid_position_is_preserved() {
    let (gateway, _backend) = gateway(single_bucket_backend());
    let body = r#"{"operation":"download","objects":[{"size":5,"oid":"abc"}]}"#;

    let response = gateway
        .handle(&single_batch(&basic_auth("u", "p"), body))
        .await
        .unwrap();
    assert_eq!(response.status_code, 200);

    let url = fake_url(PresignMethod::Get, BUCKET, "abc");
    assert_eq!(
        response.body,
        format!(
            r#"{{"transfer":"basic","objects":[{{"size":5,"oid":"abc","authenticated":true,"actions":{{"download":{{"href":"{}","expires_in":3600}}}}}}]}}"#,
            url
        )
    );
}
