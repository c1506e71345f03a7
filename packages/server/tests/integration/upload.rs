use serde_json::json;

use crate::common::{TestApp, TestUser, routes};

const AUDIO: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00fake mpeg frames";

async fn upload_audio(app: &TestApp, user: &TestUser, title: Option<&str>) -> i32 {
    let res = app
        .upload_with_token("theme.mp3", "audio/mpeg", AUDIO.to_vec(), title, &user.token)
        .await;
    assert_eq!(res.status, 201, "upload failed: {}", res.text);
    res.id()
}

mod storing {
    use super::*;

    #[tokio::test]
    async fn audio_upload_is_stored_as_pending() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token(
                "theme.mp3",
                "audio/mpeg",
                AUDIO.to_vec(),
                Some("Main theme"),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["kind"], "audio");
        assert_eq!(res.data()["status"], "pending");
        assert_eq!(res.data()["contentType"], "audio/mpeg");
        assert_eq!(res.data()["size"], AUDIO.len());
        assert_eq!(res.data()["title"], "Main theme");
        assert_eq!(res.data()["contentHash"].as_str().unwrap().len(), 64);
        let id = res.id();
        assert_eq!(res.data()["contentUrl"], routes::upload_content(id));

        let mine = app.get_with_token(routes::UPLOADS, &alice.token).await;
        assert_eq!(mine.data()["total"], 1);
    }

    #[tokio::test]
    async fn unsupported_types_are_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let text = app
            .upload_with_token("notes.txt", "text/plain", b"hello".to_vec(), None, &alice.token)
            .await;
        assert_eq!(text.status, 400);
        assert_eq!(text.body["code"], "VALIDATION_ERROR");

        let unknown = app
            .upload_with_token(
                "mystery.qqzz",
                "application/octet-stream",
                b"???".to_vec(),
                None,
                &alice.token,
            )
            .await;
        assert_eq!(unknown.status, 400);
    }

    #[tokio::test]
    async fn empty_and_oversized_files_are_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let empty = app
            .upload_with_token("silence.mp3", "audio/mpeg", Vec::new(), None, &alice.token)
            .await;
        assert_eq!(empty.status, 400);

        let huge = app
            .upload_with_token(
                "huge.mp3",
                "audio/mpeg",
                vec![0u8; 1024 * 1024 + 1],
                None,
                &alice.token,
            )
            .await;
        assert_eq!(huge.status, 400, "{}", huge.text);
        assert_eq!(huge.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn rejected_title_leaves_no_blob_behind() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let long_title = "x".repeat(257);

        let res = app
            .upload_with_token(
                "theme.mp3",
                "audio/mpeg",
                AUDIO.to_vec(),
                Some(&long_title),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.stored_blob_count(), 0);
    }

    #[tokio::test]
    async fn rejected_upload_keeps_blobs_other_uploads_share() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = upload_audio(&app, &alice, None).await;

        let res = app
            .upload_with_token(
                "theme.mp3",
                "audio/mpeg",
                AUDIO.to_vec(),
                Some(&"x".repeat(257)),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 400);
        assert_eq!(app.stored_blob_count(), 1);

        let content = app
            .get_with_headers(&routes::upload_content(id), Some(&alice.token), &[])
            .await;
        assert_eq!(content.status, 200);
        assert_eq!(content.text.as_bytes(), AUDIO);
    }

    #[tokio::test]
    async fn second_file_field_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let part = |bytes: &[u8], name: &str| {
            reqwest::multipart::Part::bytes(bytes.to_vec())
                .file_name(name.to_string())
                .mime_str("audio/mpeg")
                .unwrap()
        };
        let form = reqwest::multipart::Form::new()
            .part("file", part(AUDIO, "first.mp3"))
            .part("file", part(b"ID3 other frames", "second.mp3"));

        let res = app.upload_form_with_token(form, &alice.token).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
        assert_eq!(app.stored_blob_count(), 0);
        let mine = app.get_with_token(routes::UPLOADS, &alice.token).await;
        assert_eq!(mine.data()["total"], 0);
    }

    #[tokio::test]
    async fn uploads_can_be_disabled() {
        let app = TestApp::spawn_with(|c| c.features.uploads_enabled = false).await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .upload_with_token("theme.mp3", "audio/mpeg", AUDIO.to_vec(), None, &alice.token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "FEATURE_DISABLED");
    }
}

mod access {
    use super::*;

    #[tokio::test]
    async fn pending_content_is_private_to_the_owner() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let id = upload_audio(&app, &alice, None).await;

        let own = app.get_with_headers(&routes::upload_content(id), Some(&alice.token), &[]).await;
        assert_eq!(own.status, 200);
        assert_eq!(own.text.as_bytes(), AUDIO);
        assert_eq!(own.header("content-type"), Some("audio/mpeg"));
        assert!(own.header("cache-control").unwrap().starts_with("private"));

        let stranger = app.get_with_headers(&routes::upload_content(id), Some(&bob.token), &[]).await;
        assert_eq!(stranger.status, 403);

        let anonymous = app.get_with_headers(&routes::upload_content(id), None, &[]).await;
        assert_eq!(anonymous.status, 401);

        let metadata = app.get_with_token(&routes::upload(id), &bob.token).await;
        assert_eq!(metadata.status, 403);
    }

    #[tokio::test]
    async fn matching_etag_returns_not_modified() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = upload_audio(&app, &alice, None).await;

        let first = app.get_with_headers(&routes::upload_content(id), Some(&alice.token), &[]).await;
        let etag = first.header("etag").expect("ETag header").to_string();

        let second = app
            .get_with_headers(
                &routes::upload_content(id),
                Some(&alice.token),
                &[("if-none-match", etag.as_str())],
            )
            .await;
        assert_eq!(second.status, 304);
        assert!(second.text.is_empty());

        let stale = app
            .get_with_headers(
                &routes::upload_content(id),
                Some(&alice.token),
                &[("if-none-match", "\"deadbeef\"")],
            )
            .await;
        assert_eq!(stale.status, 200);
    }

    #[tokio::test]
    async fn deleting_keeps_blobs_still_referenced_by_other_uploads() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let first = upload_audio(&app, &alice, None).await;
        let second = upload_audio(&app, &bob, None).await;

        let denied = app.delete_with_token(&routes::upload(first), &bob.token).await;
        assert_eq!(denied.status, 403);

        let res = app.delete_with_token(&routes::upload(first), &alice.token).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(app.get_with_token(&routes::upload(first), &alice.token).await.status, 404);

        let survivor = app
            .get_with_headers(&routes::upload_content(second), Some(&bob.token), &[])
            .await;
        assert_eq!(survivor.status, 200);
        assert_eq!(survivor.text.as_bytes(), AUDIO);
    }
}

mod conversion {
    use super::*;

    #[tokio::test]
    async fn audio_upload_becomes_a_public_music_track() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = upload_audio(&app, &alice, Some("Demo tape")).await;

        let res = app
            .post_with_token(
                &routes::upload_convert(id),
                &json!({"durationSeconds": 180}),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["title"], "Demo tape");
        assert_eq!(res.data()["artist"], "alice");
        assert_eq!(res.data()["uploadedBy"], alice.id);
        assert_eq!(res.data()["audioUrl"], routes::upload_content(id));
        let track = res.id();

        let upload = app.get_with_token(&routes::upload(id), &alice.token).await;
        assert_eq!(upload.data()["status"], "processed");

        let music = app.get_without_token(&routes::music(track)).await;
        assert_eq!(music.status, 200);

        let public = app.get_with_headers(&routes::upload_content(id), None, &[]).await;
        assert_eq!(public.status, 200);
        assert!(public.header("cache-control").unwrap().starts_with("public"));

        let again = app
            .post_with_token(&routes::upload_convert(id), &json!({}), &alice.token)
            .await;
        assert_eq!(again.status, 400);
    }

    #[tokio::test]
    async fn only_audio_can_be_converted() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let image = app
            .upload_with_token("cover.png", "image/png", b"\x89PNG fake".to_vec(), None, &alice.token)
            .await;
        assert_eq!(image.status, 201, "{}", image.text);
        assert_eq!(image.data()["kind"], "image");

        let res = app
            .post_with_token(&routes::upload_convert(image.id()), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn explicit_title_and_artist_win() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let id = upload_audio(&app, &alice, None).await;

        let res = app
            .post_with_token(
                &routes::upload_convert(id),
                &json!({"title": "Opening", "artist": "The Alices"}),
                &alice.token,
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.data()["title"], "Opening");
        assert_eq!(res.data()["artist"], "The Alices");
        assert_eq!(res.data()["durationSeconds"], 0);
    }
}
