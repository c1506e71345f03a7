use serde_json::json;

use crate::common::{TestApp, routes};

mod catalog_management {
    use super::*;

    #[tokio::test]
    async fn admin_can_create_update_and_delete_a_movie() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let create = app
            .post_with_token(
                routes::MOVIES,
                &json!({
                    "title": "  The Matrix  ",
                    "description": "Red pill or blue pill",
                    "genres": ["Action", "Sci-Fi"],
                    "year": 1999,
                    "type": "movie",
                    "durationMinutes": 136,
                }),
                &admin.token,
            )
            .await;
        assert_eq!(create.status, 201, "{}", create.text);
        assert_eq!(create.data()["title"], "The Matrix");
        assert_eq!(create.data()["type"], "movie");
        assert_eq!(create.data()["viewCount"], 0);
        let id = create.id();

        let update = app
            .patch_with_token(
                &routes::movie(id),
                &json!({"title": "The Matrix Reloaded", "year": 2003, "durationMinutes": null}),
                &admin.token,
            )
            .await;
        assert_eq!(update.status, 200, "{}", update.text);
        assert_eq!(update.data()["title"], "The Matrix Reloaded");
        assert_eq!(update.data()["year"], 2003);
        assert!(update.data()["durationMinutes"].is_null());
        assert_eq!(update.data()["genres"], json!(["Action", "Sci-Fi"]));

        let delete = app.delete_with_token(&routes::movie(id), &admin.token).await;
        assert_eq!(delete.status, 200);

        let gone = app.get_without_token(&routes::movie(id)).await;
        assert_eq!(gone.status, 404);
        assert_eq!(gone.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_a_movie() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({"title": "Bootleg", "year": 2020}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn anonymous_create_needs_a_token() {
        let app = TestApp::spawn().await;

        let res = app
            .post_without_token(routes::MOVIES, &json!({"title": "Bootleg", "year": 2020}))
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn out_of_range_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let res = app
            .post_with_token(
                routes::MOVIES,
                &json!({"title": "", "year": 1500, "durationMinutes": 0}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let id = app.create_movie(&admin.token, "Valid", &["Drama"]).await;
        let res = app
            .patch_with_token(&routes::movie(id), &json!({"title": "   "}), &admin.token)
            .await;
        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn updating_a_missing_movie_is_not_found() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let res = app
            .patch_with_token(&routes::movie(9999), &json!({"title": "Ghost"}), &admin.token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod browsing {
    use super::*;

    #[tokio::test]
    async fn empty_catalog_uses_default_page() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::MOVIES).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(
            res.data(),
            &json!({"items": [], "total": 0, "page": 1, "limit": 20, "hasMore": false})
        );
    }

    #[tokio::test]
    async fn list_is_paginated() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        for i in 0..5 {
            app.create_movie(&admin.token, &format!("Movie {i}"), &["Drama"])
                .await;
        }

        let first = app
            .get_without_token(&format!("{}?page=1&limit=2", routes::MOVIES))
            .await;
        assert_eq!(first.status, 200, "{}", first.text);
        assert_eq!(first.data()["total"], 5);
        assert_eq!(first.data()["page"], 1);
        assert_eq!(first.data()["limit"], 2);
        assert_eq!(first.data()["hasMore"], true);
        assert_eq!(first.data()["items"].as_array().unwrap().len(), 2);

        let last = app
            .get_without_token(&format!("{}?page=3&limit=2", routes::MOVIES))
            .await;
        assert_eq!(last.data()["items"].as_array().unwrap().len(), 1);
        assert_eq!(last.data()["hasMore"], false);
    }

    #[tokio::test]
    async fn invalid_pagination_is_rejected() {
        let app = TestApp::spawn().await;

        let zero_page = app
            .get_without_token(&format!("{}?page=0", routes::MOVIES))
            .await;
        assert_eq!(zero_page.status, 400);

        let huge_limit = app
            .get_without_token(&format!("{}?limit=500", routes::MOVIES))
            .await;
        assert_eq!(huge_limit.status, 400);

        let garbage = app
            .get_without_token(&format!("{}?page=abc", routes::MOVIES))
            .await;
        assert_eq!(garbage.status, 400);
        assert_eq!(garbage.body["code"], "VALIDATION_ERROR");

        let far_page = app
            .get_without_token(&format!(
                "{}?page=100000000000000000&limit=100",
                routes::MOVIES
            ))
            .await;
        assert_eq!(far_page.status, 400, "{}", far_page.text);
        assert_eq!(far_page.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn list_filters_by_genre_case_insensitively() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        app.create_movie(&admin.token, "Alien", &["Horror", "Sci-Fi"])
            .await;
        app.create_movie(&admin.token, "Amelie", &["Romance"]).await;

        let res = app
            .get_without_token(&format!("{}?genre=horror", routes::MOVIES))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["total"], 1);
        assert_eq!(res.data()["items"][0]["title"], "Alien");
    }

    #[tokio::test]
    async fn genres_are_distinct() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        app.create_movie(&admin.token, "A", &["Drama", "Crime"]).await;
        app.create_movie(&admin.token, "B", &["Drama"]).await;

        let res = app.get_without_token(routes::MOVIE_GENRES).await;

        assert_eq!(res.status, 200);
        let genres = res.data().as_array().unwrap();
        assert_eq!(genres.len(), 2);
        assert!(genres.contains(&json!("Drama")));
        assert!(genres.contains(&json!("Crime")));
    }

    #[tokio::test]
    async fn viewing_counts_and_trending_orders_by_views() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let quiet = app.create_movie(&admin.token, "Quiet", &["Drama"]).await;
        let hit = app.create_movie(&admin.token, "Hit", &["Drama"]).await;

        for _ in 0..3 {
            let res = app.get_without_token(&routes::movie(hit)).await;
            assert_eq!(res.status, 200);
        }
        let detail = app.get_without_token(&routes::movie(quiet)).await;
        assert_eq!(detail.data()["viewCount"], 1);
        assert_eq!(detail.data()["rating"]["count"], 0);
        assert!(detail.data().get("isFavorite").is_none());

        let trending = app.get_without_token(routes::MOVIES_TRENDING).await;
        assert_eq!(trending.status, 200);
        assert_eq!(trending.data()["items"][0]["id"], hit);
        assert_eq!(trending.data()["items"][0]["viewCount"], 3);
    }

    #[tokio::test]
    async fn signed_in_detail_includes_caller_state() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_movie(&admin.token, "Heat", &["Crime"]).await;

        app.put_with_token(
            routes::RATINGS,
            &json!({"entityType": "movie", "entityId": id, "value": 4}),
            &alice.token,
        )
        .await;
        app.put_with_token(routes::WATCHLIST, &json!({"movieId": id}), &alice.token)
            .await;

        let res = app.get_with_token(&routes::movie(id), &alice.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["userRating"], 4);
        assert_eq!(res.data()["isFavorite"], false);
        assert_eq!(res.data()["inWatchlist"], true);
        assert_eq!(res.data()["rating"]["average"], 4.0);
    }
}
