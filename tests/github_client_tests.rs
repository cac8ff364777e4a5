//! GitHub REST client tests against a wiremock server.

use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use team_pr_metrics::github::{
    fetch_pull_requests, silent, CommentKind, GitHubClient, RepoCoords, SourceControl,
};
use team_pr_metrics::model::Window;
use team_pr_metrics::Error;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "mock-token";

fn search_item(id: u64, number: u64, merged: bool) -> Value {
    json!({
        "id": id,
        "number": number,
        "title": format!("Change {number}"),
        "html_url": format!("https://github.com/acme/widgets/pull/{number}"),
        "user": { "login": "alice" },
        "created_at": "2025-02-01T10:00:00Z",
        "closed_at": if merged { json!("2025-02-02T10:00:00Z") } else { Value::Null },
        "comments": 0,
        "pull_request": {
            "merged_at": if merged { json!("2025-02-02T10:00:00Z") } else { Value::Null }
        }
    })
}

fn comment(id: u64, login: &str) -> Value {
    json!({
        "id": id,
        "user": { "login": login },
        "created_at": "2025-02-01T12:00:00Z",
        "body": "looks good"
    })
}

async fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::new(&server.uri(), TOKEN).unwrap()
}

fn window() -> Window {
    Window::since(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
}

#[tokio::test]
async fn search_sends_query_and_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("q", "author:alice is:pr created:>=2025-01-01"))
        .and(query_param("per_page", "100"))
        .and(query_param("page", "1"))
        .and(header("authorization", "Bearer mock-token"))
        .and(header("accept", "application/vnd.github+json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 2,
            "items": [search_item(1, 10, true), search_item(2, 11, false)]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pull_requests = client(&server)
        .await
        .search_pull_requests("author:alice is:pr created:>=2025-01-01", 1, 100)
        .await
        .unwrap();

    assert_eq!(pull_requests.len(), 2);
    assert!(pull_requests[0].is_merged());
    assert!(!pull_requests[1].is_merged());
    assert_eq!(pull_requests[0].author, "alice");
}

#[tokio::test]
async fn pagination_follows_full_pages() {
    let server = MockServer::start().await;
    let full_page = (1..=100).map(|n| search_item(n, n, true)).collect::<Vec<_>>();
    let short_page = (101..=103).map(|n| search_item(n, n, false)).collect::<Vec<_>>();
    for (page, items) in [("1", full_page), ("2", short_page)] {
        Mock::given(method("GET"))
            .and(path("/search/issues"))
            .and(query_param("page", page))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "total_count": 103,
                "items": items
            })))
            .expect(1)
            .mount(&server)
            .await;
    }

    let client = client(&server).await;
    let fetched = fetch_pull_requests(&client, "alice", &window(), &mut silent())
        .await
        .unwrap();

    assert!(fetched.is_complete());
    assert_eq!(fetched.attempted, 2);
    assert_eq!(fetched.data.len(), 103);
}

#[tokio::test]
async fn failed_page_keeps_earlier_results() {
    let server = MockServer::start().await;
    let full_page = (1..=100).map(|n| search_item(n, n, true)).collect::<Vec<_>>();
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 250,
            "items": full_page
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let fetched = fetch_pull_requests(&client, "alice", &window(), &mut silent())
        .await
        .unwrap();

    assert_eq!(fetched.data.len(), 100);
    assert_eq!(fetched.failures.len(), 1);
    assert_eq!(fetched.failures[0].unit.to_string(), "pull requests of alice (page 2)");
}

#[tokio::test]
async fn comments_are_read_from_issue_and_review_endpoints() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues/7/comments"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([comment(1, "bob"), comment(2, "zed")])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls/7/comments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([comment(3, "bob")])))
        .mount(&server)
        .await;

    let client = client(&server).await;
    let repository = RepoCoords::new("acme", "widgets");
    let issue = client.list_issue_comments(&repository, 7, 1, 100).await.unwrap();
    let review = client.list_review_comments(&repository, 7, 1, 100).await.unwrap();

    assert_eq!(issue.len(), 2);
    assert!(issue.iter().all(|c| c.kind == CommentKind::Issue));
    assert_eq!(review.len(), 1);
    assert_eq!(review[0].kind, CommentKind::Review);
    assert_eq!(review[0].pull_request.to_string(), "acme/widgets#7");
}

#[tokio::test]
async fn pull_request_detail_yields_change_stats() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls/7"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "number": 7,
            "commits": 3,
            "additions": 120,
            "deletions": 40
        })))
        .mount(&server)
        .await;

    let changes = client(&server)
        .await
        .pull_request_changes(&RepoCoords::new("acme", "widgets"), 7)
        .await
        .unwrap();

    assert_eq!(changes.commits, 3);
    assert_eq!(changes.additions, 120);
    assert_eq!(changes.deletions, 40);
}

#[tokio::test]
async fn issue_count_uses_total_count() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search/issues"))
        .and(query_param("per_page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "total_count": 42,
            "items": []
        })))
        .mount(&server)
        .await;

    let count = client(&server)
        .await
        .count_issues("author:alice is:issue")
        .await
        .unwrap();
    assert_eq!(count, 42);
}

#[tokio::test]
async fn server_error_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client(&server)
        .await
        .search_pull_requests("author:alice is:pr", 1, 100)
        .await;
    assert!(matches!(result, Err(Error::Http(_))));
}
