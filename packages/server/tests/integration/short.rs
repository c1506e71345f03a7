use serde_json::json;

use crate::common::{TestApp, routes};

mod posting {
    use super::*;

    #[tokio::test]
    async fn user_posts_a_short_with_author_summary() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::SHORTS,
                &json!({
                    "title": "Sunset timelapse",
                    "videoUrl": "https://cdn.example.com/sunset.mp4",
                    "durationSeconds": 45,
                }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["userId"], alice.id);
        assert_eq!(res.data()["author"]["username"], "alice");
        assert_eq!(res.data()["viewCount"], 0);
    }

    #[tokio::test]
    async fn duration_is_capped_at_ten_minutes() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::SHORTS,
                &json!({
                    "title": "Too long",
                    "videoUrl": "https://cdn.example.com/long.mp4",
                    "durationSeconds": 601,
                }),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn followers_are_notified_of_new_shorts() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        app.put_with_token(&routes::follow(alice.id), &json!({}), &bob.token)
            .await;

        let short = app.create_short(&alice.token, "Hello").await;

        let inbox = app.get_with_token(routes::NOTIFICATIONS, &bob.token).await;
        assert_eq!(inbox.status, 200, "{}", inbox.text);
        let newest = &inbox.data()["items"][0];
        assert_eq!(newest["kind"], "new_short");
        assert_eq!(newest["entityType"], "short");
        assert_eq!(newest["entityId"], short);
    }
}

mod browsing {
    use super::*;

    #[tokio::test]
    async fn list_filters_by_author() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        app.create_short(&alice.token, "A1").await;
        app.create_short(&alice.token, "A2").await;
        app.create_short(&bob.token, "B1").await;

        let all = app.get_without_token(routes::SHORTS).await;
        assert_eq!(all.data()["total"], 3);

        let mine = app
            .get_without_token(&format!("{}?userId={}", routes::SHORTS, alice.id))
            .await;
        assert_eq!(mine.status, 200, "{}", mine.text);
        assert_eq!(mine.data()["total"], 2);
        assert_eq!(mine.data()["items"][0]["title"], "A2");
    }

    #[tokio::test]
    async fn viewing_counts_a_view() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_short(&alice.token, "Clip").await;

        app.get_without_token(&routes::short(id)).await;
        let res = app.get_with_token(&routes::short(id), &alice.token).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.data()["viewCount"], 2);
        assert_eq!(res.data()["isFavorite"], false);
    }
}

mod deleting {
    use super::*;

    #[tokio::test]
    async fn only_owner_or_admin_may_delete() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let mallory = app.create_authenticated_user("mallory").await;
        let admin = app.create_admin("root").await;
        let first = app.create_short(&alice.token, "First").await;
        let second = app.create_short(&alice.token, "Second").await;

        let denied = app.delete_with_token(&routes::short(first), &mallory.token).await;
        assert_eq!(denied.status, 403);
        assert_eq!(denied.body["code"], "PERMISSION_DENIED");

        let own = app.delete_with_token(&routes::short(first), &alice.token).await;
        assert_eq!(own.status, 200);

        let moderated = app.delete_with_token(&routes::short(second), &admin.token).await;
        assert_eq!(moderated.status, 200);

        assert_eq!(app.get_without_token(&routes::short(first)).await.status, 404);
    }

    #[tokio::test]
    async fn deleting_removes_favorites_and_comments() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = app.create_short(&alice.token, "Clip").await;
        app.put_with_token(
            routes::FAVORITES,
            &json!({"entityType": "short", "entityId": id}),
            &bob.token,
        )
        .await;
        app.post_with_token(
            routes::COMMENTS,
            &json!({"entityType": "short", "entityId": id, "body": "nice"}),
            &bob.token,
        )
        .await;

        let res = app.delete_with_token(&routes::short(id), &alice.token).await;
        assert_eq!(res.status, 200);

        let favs = app.get_with_token(routes::FAVORITES, &bob.token).await;
        assert_eq!(favs.data()["total"], 0);
        let comments = app
            .get_without_token(&format!("{}?entityType=short&entityId={id}", routes::COMMENTS))
            .await;
        assert_eq!(comments.status, 404);
    }
}
