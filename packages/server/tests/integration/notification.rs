use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

/// Alice gains one follow notification per entry in `followers`.
async fn followed_by(app: &TestApp, alice: &TestUser, followers: &[&str]) {
    for name in followers {
        let user = app.create_authenticated_user(name).await;
        let res = app
            .put_with_token(&routes::follow(alice.id), &json!({}), &user.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
    }
}

#[tokio::test]
async fn unread_count_and_mark_read() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    followed_by(&app, &alice, &["bob", "carol"]).await;

    let unread = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice.token).await;
    assert_eq!(unread.status, 200, "{}", unread.text);
    assert_eq!(unread.data()["count"], 2);

    let inbox = app.get_with_token(routes::NOTIFICATIONS, &alice.token).await;
    let id = inbox.data()["items"][0]["id"].as_i64().unwrap() as i32;

    for _ in 0..2 {
        let res = app
            .put_with_token(&routes::notification_read(id), &json!({}), &alice.token)
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["isRead"], true);
    }

    let unread = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice.token).await;
    assert_eq!(unread.data()["count"], 1);

    let only_unread = app
        .get_with_token(
            &format!("{}?unreadOnly=true", routes::NOTIFICATIONS),
            &alice.token,
        )
        .await;
    assert_eq!(only_unread.data()["total"], 1);
    assert_ne!(only_unread.data()["items"][0]["id"], id);
}

#[tokio::test]
async fn mark_all_read_reports_how_many_changed() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    followed_by(&app, &alice, &["bob", "carol", "dave"]).await;

    let res = app
        .post_with_token(routes::NOTIFICATIONS_READ_ALL, &json!({}), &alice.token)
        .await;
    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["affected"], 3);

    let again = app
        .post_with_token(routes::NOTIFICATIONS_READ_ALL, &json!({}), &alice.token)
        .await;
    assert_eq!(again.data()["affected"], 0);

    let unread = app.get_with_token(routes::NOTIFICATIONS_UNREAD, &alice.token).await;
    assert_eq!(unread.data()["count"], 0);
}

#[tokio::test]
async fn notifications_of_other_users_are_invisible() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    let mallory = app.create_authenticated_user("mallory").await;
    followed_by(&app, &alice, &["bob"]).await;

    let inbox = app.get_with_token(routes::NOTIFICATIONS, &alice.token).await;
    let id = inbox.data()["items"][0]["id"].as_i64().unwrap() as i32;

    let read = app
        .put_with_token(&routes::notification_read(id), &json!({}), &mallory.token)
        .await;
    assert_eq!(read.status, 404);

    let delete = app.delete_with_token(&routes::notification(id), &mallory.token).await;
    assert_eq!(delete.status, 404);

    let mine = app.get_with_token(routes::NOTIFICATIONS, &mallory.token).await;
    assert_eq!(mine.data()["total"], 0);
}

#[tokio::test]
async fn owner_can_delete_a_notification() {
    let app = TestApp::spawn().await;
    let alice = app.create_authenticated_user("alice").await;
    followed_by(&app, &alice, &["bob"]).await;
    let inbox = app.get_with_token(routes::NOTIFICATIONS, &alice.token).await;
    let id = inbox.data()["items"][0]["id"].as_i64().unwrap() as i32;

    let res = app.delete_with_token(&routes::notification(id), &alice.token).await;
    assert_eq!(res.status, 200);

    let inbox = app.get_with_token(routes::NOTIFICATIONS, &alice.token).await;
    assert_eq!(inbox.data()["total"], 0);
}

#[tokio::test]
async fn inbox_requires_a_token() {
    let app = TestApp::spawn().await;

    let res = app.get_without_token(routes::NOTIFICATIONS).await;

    assert_eq!(res.status, 401);
    assert_eq!(res.body["code"], "TOKEN_MISSING");
}
