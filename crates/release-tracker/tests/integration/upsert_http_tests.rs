//! Write counts of the upsert against a mocked GitLab.

use gitlab_api::ProjectRef;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use release_tracker::{AggregateUpsert, TrackerError, VersionMapCodec};

use crate::helpers::{client, forbid, issue, mount_locate, LABEL};

const TITLE: &str = "Project release requested by submodule release";

#[tokio::test]
async fn test_no_issue_creates_once_and_never_updates() {
    let server = MockServer::start().await;
    mount_locate(&server, "1", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/1/issues"))
        .and(body_json(json!({
            "title": TITLE,
            "description": "module3: 1.0.0\n",
            "labels": [LABEL]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(issue(1, "module3: 1.0.0\n")))
        .expect(1)
        .mount(&server)
        .await;
    forbid(&server, "PUT", "/api/v4/projects/1/issues/1".to_string()).await;

    let client = client(&server);
    let outcome = AggregateUpsert::new(&client, VersionMapCodec::default())
        .upsert(&ProjectRef::new("1"), LABEL, TITLE, "module3", "1.0.0")
        .await
        .unwrap();

    assert!(outcome.created);
    assert_eq!(outcome.iid, 1);
}

#[tokio::test]
async fn test_single_issue_updates_once_and_never_creates() {
    let server = MockServer::start().await;
    mount_locate(
        &server,
        "group%2Fparent",
        json!([issue(4, "module1: 1.0.0\nmodule2: 2.0.0\n")]),
    )
    .await;
    // Serves both the pre-write freshness check and the post-write verification.
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/group%2Fparent/issues/4"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(issue(4, "module1: 2.0.0\nmodule2: 2.0.0\n")),
        )
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/v4/projects/group%2Fparent/issues/4"))
        .and(body_json(json!({
            "description": "module1: 2.0.0\nmodule2: 2.0.0\n"
        })))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(issue(4, "module1: 2.0.0\nmodule2: 2.0.0\n")),
        )
        .expect(1)
        .mount(&server)
        .await;
    forbid(&server, "POST", "/api/v4/projects/group%2Fparent/issues".to_string()).await;

    let client = client(&server);
    let outcome = AggregateUpsert::new(&client, VersionMapCodec::default())
        .upsert(
            &ProjectRef::new("group/parent"),
            LABEL,
            TITLE,
            "module1",
            "2.0.0",
        )
        .await
        .unwrap();

    assert!(!outcome.created);
    assert_eq!(outcome.iid, 4);
    assert_eq!(outcome.attempts, 1);
}

#[tokio::test]
async fn test_two_issues_write_nothing() {
    let server = MockServer::start().await;
    mount_locate(
        &server,
        "1",
        json!([issue(2, "b: 1.0.0\n"), issue(1, "a: 1.0.0\n")]),
    )
    .await;
    forbid(&server, "POST", "/api/v4/projects/1/issues".to_string()).await;
    forbid(&server, "PUT", "/api/v4/projects/1/issues/1".to_string()).await;
    forbid(&server, "PUT", "/api/v4/projects/1/issues/2".to_string()).await;

    let client = client(&server);
    let err = AggregateUpsert::new(&client, VersionMapCodec::default())
        .upsert(&ProjectRef::new("1"), LABEL, TITLE, "module3", "1.0.0")
        .await
        .unwrap_err();

    match err {
        TrackerError::MultipleTrackingIssuesFound { count, project } => {
            assert_eq!(count, 2);
            assert_eq!(project.as_str(), "1");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_create_failure_propagates_status() {
    let server = MockServer::start().await;
    mount_locate(&server, "1", json!([])).await;
    Mock::given(method("POST"))
        .and(path("/api/v4/projects/1/issues"))
        .respond_with(ResponseTemplate::new(403).set_body_string("403 Forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server);
    let err = AggregateUpsert::new(&client, VersionMapCodec::default())
        .upsert(&ProjectRef::new("1"), LABEL, TITLE, "module3", "1.0.0")
        .await
        .unwrap_err();

    match err {
        TrackerError::Api(api) => assert_eq!(api.status().map(|s| s.as_u16()), Some(403)),
        other => panic!("unexpected error: {other}"),
    }
}
