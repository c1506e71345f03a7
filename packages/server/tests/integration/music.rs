use serde_json::json;

use crate::common::{TestApp, routes};

mod catalog_management {
    use super::*;

    #[tokio::test]
    async fn admin_creates_and_updates_a_track() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let create = app
            .post_with_token(
                routes::MUSIC,
                &json!({
                    "title": "Windowlicker",
                    "artist": "Aphex Twin",
                    "album": "Windowlicker EP",
                    "genres": ["Electronic"],
                    "year": 1999,
                    "durationSeconds": 367,
                    "audioUrl": "https://cdn.example.com/windowlicker.mp3",
                }),
                &admin.token,
            )
            .await;
        assert_eq!(create.status, 201, "{}", create.text);
        assert_eq!(create.data()["artist"], "Aphex Twin");
        assert_eq!(create.data()["playCount"], 0);
        let id = create.id();

        let update = app
            .patch_with_token(
                &routes::music(id),
                &json!({"album": null, "durationSeconds": 368}),
                &admin.token,
            )
            .await;
        assert_eq!(update.status, 200, "{}", update.text);
        assert!(update.data()["album"].is_null());
        assert_eq!(update.data()["durationSeconds"], 368);
        assert_eq!(update.data()["title"], "Windowlicker");
    }

    #[tokio::test]
    async fn duration_must_be_positive() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let res = app
            .post_with_token(
                routes::MUSIC,
                &json!({
                    "title": "Silence",
                    "artist": "Nobody",
                    "durationSeconds": 0,
                    "audioUrl": "https://cdn.example.com/silence.mp3",
                }),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn regular_user_cannot_delete_a_track() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;
        let id = app.create_music(&admin.token, "Track", "Artist").await;

        let res = app.delete_with_token(&routes::music(id), &alice.token).await;
        assert_eq!(res.status, 403);

        let res = app.delete_with_token(&routes::music(id), &admin.token).await;
        assert_eq!(res.status, 200);
        assert_eq!(app.get_without_token(&routes::music(id)).await.status, 404);
    }
}

mod listening {
    use super::*;

    #[tokio::test]
    async fn plays_are_counted() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let id = app.create_music(&admin.token, "Loop", "DJ").await;

        let mut last = 0;
        for _ in 0..3 {
            let res = app.post_without_token(&routes::music_play(id), &json!({})).await;
            assert_eq!(res.status, 200, "{}", res.text);
            last = res.data()["playCount"].as_i64().unwrap();
        }
        assert_eq!(last, 3);

        let detail = app.get_without_token(&routes::music(id)).await;
        assert_eq!(detail.data()["playCount"], 3);
    }

    #[tokio::test]
    async fn playing_a_missing_track_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.post_without_token(&routes::music_play(404), &json!({})).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_filters_by_artist_ignoring_case() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        app.create_music(&admin.token, "Teardrop", "Massive Attack").await;
        app.create_music(&admin.token, "Angel", "Massive Attack").await;
        app.create_music(&admin.token, "Roads", "Portishead").await;

        let res = app
            .get_without_token(&format!("{}?artist=massive%20attack", routes::MUSIC))
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["total"], 2);

        let sorted = app
            .get_without_token(&format!("{}?sort=title", routes::MUSIC))
            .await;
        assert_eq!(sorted.data()["items"][0]["title"], "Angel");
        assert_eq!(sorted.data()["items"][2]["title"], "Teardrop");
    }
}
