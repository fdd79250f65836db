use std::time::Duration;

use github::{ComponentDirectory, GithubClient, GithubConfig};
use model::{
    ApiError, ComponentCatalog, Credentials, IssueOptions, NewIssue, NewPullRequest,
    RepositoryHost, RepositoryId, UserLogin,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// base64("bot:secret")
const BASIC_AUTH: &str = "Basic Ym90OnNlY3JldA==";

fn client(server: &MockServer) -> GithubClient {
    let config = GithubConfig {
        base_url: server.uri(),
        timeout: Duration::from_secs(5),
        ..Default::default()
    };
    GithubClient::new(
        config,
        Credentials::new(UserLogin::new("bot").unwrap(), "secret"),
    )
    .unwrap()
}

fn repo_json(name: &str) -> serde_json::Value {
    json!({
        "id": 1,
        "name": name,
        "full_name": format!("bot/{name}"),
        "fork": true,
        "private": false,
        "html_url": format!("https://github.com/bot/{name}"),
        "default_branch": "master",
        "updated_at": "2024-01-02T03:04:05Z"
    })
}

#[tokio::test]
async fn list_repositories_sends_basic_auth_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(header("authorization", BASIC_AUTH))
        .and(query_param("affiliation", "owner"))
        .and(query_param("page", "1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([repo_json("emitter"), repo_json("events")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repos = client(&server).list_repositories().await.unwrap();

    let names: Vec<_> = repos.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["emitter", "events"]);
    assert!(repos[0].fork);
    assert_eq!(repos[0].default_branch.as_deref(), Some("master"));
}

#[tokio::test]
async fn list_repositories_past_page_limit_is_an_error() {
    let server = MockServer::start().await;
    let full_page: Vec<_> = (0..100).map(|i| repo_json(&format!("repo-{i}"))).collect();
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(2)
        .mount(&server)
        .await;
    let client = GithubClient::new(
        GithubConfig {
            base_url: server.uri(),
            max_pages: 2,
            ..Default::default()
        },
        Credentials::new(UserLogin::new("bot").unwrap(), "secret"),
    )
    .unwrap();

    let err = client.list_repositories().await.unwrap_err();

    assert_eq!(err, ApiError::ListingTruncated { pages: 2 });
}

#[tokio::test]
async fn list_repositories_follows_pages_until_short_page() {
    let server = MockServer::start().await;
    let full_page: Vec<_> = (0..100).map(|i| repo_json(&format!("repo-{i}"))).collect();
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "1"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(full_page))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([repo_json("last")])))
        .expect(1)
        .mount(&server)
        .await;

    let repos = client(&server).list_repositories().await.unwrap();

    assert_eq!(repos.len(), 101);
    assert_eq!(repos.last().unwrap().name, "last");
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Bad credentials"})))
        .mount(&server)
        .await;

    let err = client(&server).list_repositories().await.unwrap_err();

    assert_eq!(
        err,
        ApiError::Status {
            status: 401,
            reason: "Unauthorized".into()
        }
    );
    assert_eq!(err.to_string(), "got 401 \"Unauthorized\" response");
}

#[tokio::test]
async fn malformed_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/user/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server).list_repositories().await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }), "{err:?}");
}

#[tokio::test]
async fn delete_repository_targets_bot_account() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/bot/emitter"))
        .and(header("authorization", BASIC_AUTH))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client(&server).delete_repository("emitter").await.unwrap();
}

#[tokio::test]
async fn delete_missing_repository_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/repos/bot/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).delete_repository("gone").await.unwrap_err();

    assert_eq!(err.status_code(), Some(404));
}

#[tokio::test]
async fn create_fork_posts_empty_object() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/component/emitter/forks"))
        .and(body_json(json!({})))
        .respond_with(ResponseTemplate::new(202).set_body_json(repo_json("emitter")))
        .expect(1)
        .mount(&server)
        .await;

    let repo = RepositoryId::parse("component/emitter").unwrap();
    client(&server).create_fork(&repo).await.unwrap();
}

#[tokio::test]
async fn create_issue_merges_options_into_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/component/emitter/issues"))
        .and(body_json(json!({
            "title": "Add license",
            "body": "Please add a license field.",
            "labels": ["bot"],
            "milestone": 3
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 42,
            "html_url": "https://github.com/component/emitter/issues/42",
            "title": "Add license"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let issue = NewIssue {
        title: "Add license".into(),
        body: "Please add a license field.".into(),
        options: IssueOptions {
            labels: vec!["bot".into()],
            milestone: Some(3),
            ..Default::default()
        },
    };
    let repo = RepositoryId::parse("component/emitter").unwrap();
    let created = client(&server).create_issue(&repo, &issue).await.unwrap();

    assert_eq!(created.number, 42);
    assert_eq!(created.title, "Add license");
}

#[tokio::test]
async fn create_pull_request_sends_base_and_head() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/component/emitter/pulls"))
        .and(body_json(json!({
            "title": "Add license",
            "body": "Adds the license property.",
            "base": "master",
            "head": "bot:master"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 7,
            "html_url": "https://github.com/component/emitter/pull/7"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pull = NewPullRequest {
        title: "Add license".into(),
        body: "Adds the license property.".into(),
        base: "master".into(),
        head: "bot:master".into(),
        draft: None,
        maintainer_can_modify: None,
    };
    let repo = RepositoryId::parse("component/emitter").unwrap();
    let created = client(&server)
        .create_pull_request(&repo, &pull)
        .await
        .unwrap();

    assert_eq!(created.number, 7);
    assert_eq!(created.title, "");
}

#[tokio::test]
async fn components_are_fetched_without_credentials() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/components/all"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"repo": "component/emitter"},
            {"repo": "component/events"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let directory = ComponentDirectory::new(
        &format!("{}/components/all", server.uri()),
        "forkbot-test",
        Duration::from_secs(5),
    )
    .unwrap();
    let components = directory.list_components().await.unwrap();

    assert_eq!(components.len(), 2);
    assert_eq!(components[0]["repo"], "component/emitter");
    let requests = server.received_requests().await.unwrap();
    assert!(requests[0].headers.get("authorization").is_none());
}
