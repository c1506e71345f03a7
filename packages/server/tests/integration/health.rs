use serde_json::json;

use crate::common::{TestApp, routes};

#[tokio::test]
async fn health_reports_database_reachability() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::HEALTH).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["status"], "ok");
    assert_eq!(res.data()["database"], true);
    assert!(res.data()["version"].is_string());
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::OPENAPI).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["info"]["title"], "Movies Space API");
    assert!(res.body["paths"]["/api/v1/movies/{id}"].is_object());
    assert!(res.body["paths"]["/api/v1/uploads/{id}/content"].is_object());
}

#[tokio::test]
async fn incoming_request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let res = app
        .get_with_headers(routes::MOVIES, None, &[("x-request-id", "trace-me-123")])
        .await;

    assert_eq!(res.status, 200);
    assert_eq!(res.header("x-request-id"), Some("trace-me-123"));
    assert_eq!(res.body["requestId"], "trace-me-123");
}

mod rate_limiting {
    use super::*;

    #[tokio::test]
    async fn requests_over_the_limit_get_429_with_retry_after() {
        let app = TestApp::spawn_with(|c| c.rate_limit.max_requests = 2).await;

        for _ in 0..2 {
            let res = app.get_without_token(routes::MOVIES).await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let res = app.get_without_token(routes::MOVIES).await;
        assert_eq!(res.status, 429);
        assert_eq!(res.body["code"], "RATE_LIMITED");
        let retry_after: u64 = res
            .header("retry-after")
            .expect("Retry-After header")
            .parse()
            .expect("Retry-After should be seconds");
        assert!((1..=60).contains(&retry_after));
        assert!(res.header("x-request-id").is_some());
    }

    #[tokio::test]
    async fn forwarding_headers_from_untrusted_peers_share_one_window() {
        let app = TestApp::spawn_with(|c| c.rate_limit.max_requests = 1).await;

        let first = app
            .get_with_headers(routes::MOVIES, None, &[("x-forwarded-for", "203.0.113.1")])
            .await;
        assert_eq!(first.status, 200, "{}", first.text);

        for spoofed in ["203.0.113.2", "203.0.113.3"] {
            let res = app
                .get_with_headers(routes::MOVIES, None, &[("x-forwarded-for", spoofed)])
                .await;
            assert_eq!(res.status, 429, "{spoofed}: {}", res.text);
        }
    }

    #[tokio::test]
    async fn trusted_proxy_gets_a_window_per_forwarded_client() {
        let app = TestApp::spawn_with(|c| {
            c.rate_limit.max_requests = 1;
            c.rate_limit.trusted_proxies = vec!["127.0.0.1".to_string()];
        })
        .await;

        for client in ["203.0.113.1", "203.0.113.2"] {
            let res = app
                .get_with_headers(routes::MOVIES, None, &[("x-forwarded-for", client)])
                .await;
            assert_eq!(res.status, 200, "{client}: {}", res.text);
        }

        let again = app
            .get_with_headers(routes::MOVIES, None, &[("x-forwarded-for", "203.0.113.1")])
            .await;
        assert_eq!(again.status, 429);
    }

    #[tokio::test]
    async fn health_is_not_rate_limited() {
        let app = TestApp::spawn_with(|c| c.rate_limit.max_requests = 1).await;

        app.post_without_token(routes::LOGIN, &json!({"email": "x@y.z", "password": "p"}))
            .await;

        for _ in 0..3 {
            assert_eq!(app.get_without_token(routes::HEALTH).await.status, 200);
        }
    }
}
