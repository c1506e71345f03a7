use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

/// An admin-created movie and a regular user to engage with it.
async fn setup(app: &TestApp) -> (TestUser, i32) {
    let admin = app.create_admin("root").await;
    let movie_id = app.create_movie(&admin.token, "Heat", &["Crime"]).await;
    let alice = app.create_authenticated_user("alice").await;
    (alice, movie_id)
}

fn summary_url(kind: &str, id: i32) -> String {
    format!("{}?entityType={kind}&entityId={id}", routes::RATING_SUMMARY)
}

mod ratings {
    use super::*;

    #[tokio::test]
    async fn rating_twice_replaces_the_first_rating() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;

        let first = app
            .put_with_token(
                routes::RATINGS,
                &json!({"entityType": "movie", "entityId": movie, "value": 2}),
                &alice.token,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.data()["value"], 2);

        let second = app
            .put_with_token(
                routes::RATINGS,
                &json!({"entityType": "movie", "entityId": movie, "value": 5, "review": "Great"}),
                &alice.token,
            )
            .await;
        assert_eq!(second.status, 200, "{}", second.text);
        assert_eq!(second.data()["value"], 5);
        assert_eq!(second.data()["review"], "Great");

        let summary = app.get_without_token(&summary_url("movie", movie)).await;
        assert_eq!(summary.status, 200, "{}", summary.text);
        assert_eq!(summary.data()["count"], 1);
        assert_eq!(summary.data()["average"], 5.0);
    }

    #[tokio::test]
    async fn summary_averages_across_users() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;

        for (user, value) in [(&alice, 5), (&bob, 4), (&carol, 4)] {
            let res = app
                .put_with_token(
                    routes::RATINGS,
                    &json!({"entityType": "movie", "entityId": movie, "value": value}),
                    &user.token,
                )
                .await;
            assert_eq!(res.status, 200);
        }

        let summary = app.get_without_token(&summary_url("movie", movie)).await;
        assert_eq!(summary.data()["count"], 3);
        assert_eq!(summary.data()["average"], 4.33);
    }

    #[tokio::test]
    async fn values_outside_one_to_five_are_rejected() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;

        for value in [0, 6] {
            let res = app
                .put_with_token(
                    routes::RATINGS,
                    &json!({"entityType": "movie", "entityId": movie, "value": value}),
                    &alice.token,
                )
                .await;
            assert_eq!(res.status, 400, "value {value} should be rejected");
            assert_eq!(res.body["code"], "VALIDATION_ERROR");
        }
    }

    #[tokio::test]
    async fn rating_a_missing_item_is_not_found() {
        let app = TestApp::spawn().await;
        let (alice, _) = setup(&app).await;

        let res = app
            .put_with_token(
                routes::RATINGS,
                &json!({"entityType": "music", "entityId": 4242, "value": 3}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn unknown_entity_type_is_rejected() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;

        let res = app
            .put_with_token(
                routes::RATINGS,
                &json!({"entityType": "podcast", "entityId": movie, "value": 3}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn removing_a_rating_updates_the_summary() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;
        app.put_with_token(
            routes::RATINGS,
            &json!({"entityType": "movie", "entityId": movie, "value": 3}),
            &alice.token,
        )
        .await;

        let res = app
            .delete_with_token(
                &format!("{}?entityType=movie&entityId={movie}", routes::RATINGS),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);

        let summary = app.get_without_token(&summary_url("movie", movie)).await;
        assert_eq!(summary.data()["count"], 0);
        assert_eq!(summary.data()["average"], 0.0);

        let mine = app.get_with_token(routes::RATINGS, &alice.token).await;
        assert_eq!(mine.data()["total"], 0);
    }

    #[tokio::test]
    async fn rating_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app
            .put_without_token(
                routes::RATINGS,
                &json!({"entityType": "movie", "entityId": 1, "value": 3}),
            )
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod favorites {
    use super::*;

    #[tokio::test]
    async fn favoriting_twice_keeps_one_entry() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;
        let body = json!({"entityType": "movie", "entityId": movie});

        let first = app.put_with_token(routes::FAVORITES, &body, &alice.token).await;
        assert_eq!(first.status, 200, "{}", first.text);
        let second = app.put_with_token(routes::FAVORITES, &body, &alice.token).await;
        assert_eq!(second.status, 200);
        assert_eq!(second.data()["createdAt"], first.data()["createdAt"]);

        let list = app.get_with_token(routes::FAVORITES, &alice.token).await;
        assert_eq!(list.data()["total"], 1);
        assert_eq!(list.data()["items"][0]["entityId"], movie);
    }

    #[tokio::test]
    async fn favorites_can_be_filtered_by_kind() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;
        let short = app.create_short(&alice.token, "Cat video").await;

        app.put_with_token(
            routes::FAVORITES,
            &json!({"entityType": "movie", "entityId": movie}),
            &alice.token,
        )
        .await;
        app.put_with_token(
            routes::FAVORITES,
            &json!({"entityType": "short", "entityId": short}),
            &alice.token,
        )
        .await;

        let shorts = app
            .get_with_token(&format!("{}?entityType=short", routes::FAVORITES), &alice.token)
            .await;
        assert_eq!(shorts.status, 200, "{}", shorts.text);
        assert_eq!(shorts.data()["total"], 1);
        assert_eq!(shorts.data()["items"][0]["entityType"], "short");
    }

    #[tokio::test]
    async fn unfavoriting_is_idempotent() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;
        let url = format!("{}?entityType=movie&entityId={movie}", routes::FAVORITES);

        app.put_with_token(
            routes::FAVORITES,
            &json!({"entityType": "movie", "entityId": movie}),
            &alice.token,
        )
        .await;

        assert_eq!(app.delete_with_token(&url, &alice.token).await.status, 200);
        assert_eq!(app.delete_with_token(&url, &alice.token).await.status, 200);

        let list = app.get_with_token(routes::FAVORITES, &alice.token).await;
        assert_eq!(list.data()["total"], 0);
    }
}

mod watchlist {
    use super::*;

    #[tokio::test]
    async fn watchlist_add_list_and_remove() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;

        for _ in 0..2 {
            let res = app
                .put_with_token(routes::WATCHLIST, &json!({"movieId": movie}), &alice.token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let list = app.get_with_token(routes::WATCHLIST, &alice.token).await;
        assert_eq!(list.data()["total"], 1);
        assert_eq!(list.data()["items"][0]["movieId"], movie);
        assert_eq!(list.data()["items"][0]["movie"]["title"], "Heat");

        let removed = app
            .delete_with_token(&routes::watchlist_entry(movie), &alice.token)
            .await;
        assert_eq!(removed.status, 200);

        let list = app.get_with_token(routes::WATCHLIST, &alice.token).await;
        assert_eq!(list.data()["total"], 0);
    }

    #[tokio::test]
    async fn unknown_movie_cannot_be_added() {
        let app = TestApp::spawn().await;
        let (alice, _) = setup(&app).await;

        let res = app
            .put_with_token(routes::WATCHLIST, &json!({"movieId": 31337}), &alice.token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod history {
    use super::*;

    #[tokio::test]
    async fn recording_again_overwrites_progress() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;

        let first = app
            .put_with_token(
                routes::HISTORY,
                &json!({"entityType": "movie", "entityId": movie, "progress": 60, "duration": 8160}),
                &alice.token,
            )
            .await;
        assert_eq!(first.status, 200, "{}", first.text);

        let second = app
            .put_with_token(
                routes::HISTORY,
                &json!({"entityType": "movie", "entityId": movie, "progress": 4000, "duration": 8160}),
                &alice.token,
            )
            .await;
        assert_eq!(second.data()["progress"], 4000);

        let list = app.get_with_token(routes::HISTORY, &alice.token).await;
        assert_eq!(list.data()["total"], 1);
        assert_eq!(list.data()["items"][0]["progress"], 4000);
    }

    #[tokio::test]
    async fn negative_progress_is_rejected() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;

        let res = app
            .put_with_token(
                routes::HISTORY,
                &json!({"entityType": "movie", "entityId": movie, "progress": -1, "duration": 10}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn clearing_history_reports_removed_rows() {
        let app = TestApp::spawn().await;
        let (alice, movie) = setup(&app).await;
        let short = app.create_short(&alice.token, "Clip").await;
        for (kind, id) in [("movie", movie), ("short", short)] {
            app.put_with_token(
                routes::HISTORY,
                &json!({"entityType": kind, "entityId": id, "progress": 1, "duration": 2}),
                &alice.token,
            )
            .await;
        }

        let res = app.delete_with_token(routes::HISTORY, &alice.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["affected"], 2);

        let list = app.get_with_token(routes::HISTORY, &alice.token).await;
        assert_eq!(list.data()["total"], 0);
    }
}
