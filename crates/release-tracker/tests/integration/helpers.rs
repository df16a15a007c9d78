use gitlab_api::{GitLabClient, RetryPolicy};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use release_tracker::{ConfigOverrides, TrackerConfig};

pub const LABEL: &str = "submodule_released";

pub fn client(server: &MockServer) -> GitLabClient {
    GitLabClient::builder(&format!("{}/api/v4", server.uri()), "1234567890")
        .retry(RetryPolicy {
            limit: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(5),
        })
        .build()
        .unwrap()
}

/// Tracker configuration pointing at the mock server, as CI would set it up.
pub fn config(server: &MockServer, parent: &str) -> TrackerConfig {
    let env: HashMap<String, String> = [
        ("GITLAB_TOKEN", "1234567890".to_string()),
        ("GL_URL", server.uri()),
        ("CI_PARENT_ID_OR_PATH", parent.to_string()),
        ("RELEASE_TRACKER_RETRY_LIMIT", "0".to_string()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    TrackerConfig::resolve(ConfigOverrides::default(), &env).unwrap()
}

pub fn issue(iid: u64, description: &str) -> Value {
    json!({
        "id": 100 + iid,
        "iid": iid,
        "title": "Project release requested by submodule release",
        "description": description,
        "labels": [LABEL],
        "state": "opened",
        "updated_at": "2024-05-01T10:00:00Z"
    })
}

/// Mount the tracking issue query for `project` answering with `issues`.
pub async fn mount_locate(server: &MockServer, project: &str, issues: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v4/projects/{project}/issues")))
        .and(query_param("labels", LABEL))
        .and(query_param("state", "opened"))
        .and(query_param("order_by", "created_at"))
        .and(query_param("sort", "desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(issues))
        .expect(1)
        .mount(server)
        .await;
}

/// Mount a write endpoint that must not be called.
pub async fn forbid(server: &MockServer, verb: &str, route: String) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}
