use serde_json::json;

use crate::common::{PASSWORD, TestApp, routes};

mod access {
    use super::*;

    #[tokio::test]
    async fn regular_users_cannot_reach_admin_routes() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        for path in [
            routes::ADMIN_STATS,
            routes::ADMIN_USERS,
            routes::ADMIN_REPORTS,
            routes::ADMIN_UPLOADS,
        ] {
            let res = app.get_with_token(path, &alice.token).await;
            assert_eq!(res.status, 403, "{path}: {}", res.text);
            assert_eq!(res.body["code"], "PERMISSION_DENIED");
        }

        let anonymous = app.get_without_token(routes::ADMIN_STATS).await;
        assert_eq!(anonymous.status, 401);
    }

    #[tokio::test]
    async fn stats_count_the_catalog() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;
        app.create_movie(&admin.token, "Heat", &["Crime"]).await;
        app.create_movie(&admin.token, "Ronin", &["Action"]).await;
        app.create_music(&admin.token, "Teardrop", "Massive Attack").await;
        app.create_short(&alice.token, "Skate trick").await;
        app.upload_with_token("theme.mp3", "audio/mpeg", b"ID3 data".to_vec(), None, &alice.token)
            .await;

        let res = app.get_with_token(routes::ADMIN_STATS, &admin.token).await;

        assert_eq!(res.status, 200, "{}", res.text);
        let stats = res.data();
        assert_eq!(stats["users"], 2);
        assert_eq!(stats["movies"], 2);
        assert_eq!(stats["music"], 1);
        assert_eq!(stats["shorts"], 1);
        assert_eq!(stats["comments"], 0);
        assert_eq!(stats["openReports"], 0);
        assert_eq!(stats["pendingUploads"], 1);
    }
}

mod users {
    use super::*;

    #[tokio::test]
    async fn list_users_searches_username_and_email() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        app.create_authenticated_user("alice").await;
        app.create_authenticated_user("bob").await;

        let all = app.get_with_token(routes::ADMIN_USERS, &admin.token).await;
        assert_eq!(all.status, 200, "{}", all.text);
        assert_eq!(all.data()["total"], 3);
        assert!(all.data()["items"][0]["email"].is_string());

        let res = app
            .get_with_token(&format!("{}?q=ALI", routes::ADMIN_USERS), &admin.token)
            .await;
        assert_eq!(res.data()["total"], 1);
        assert_eq!(res.data()["items"][0]["username"], "alice");
    }

    #[tokio::test]
    async fn banning_blocks_login_and_unbanning_restores_it() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(
                &routes::admin_user(alice.id),
                &json!({"isBanned": true}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["isBanned"], true);
        assert_eq!(res.data()["role"], "user");

        let credentials = json!({"email": "alice@example.com", "password": PASSWORD});
        let login = app.post_without_token(routes::LOGIN, &credentials).await;
        assert_eq!(login.status, 403);
        assert_eq!(login.body["code"], "ACCOUNT_BANNED");

        app.patch_with_token(
            &routes::admin_user(alice.id),
            &json!({"isBanned": false}),
            &admin.token,
        )
        .await;
        let login = app.post_without_token(routes::LOGIN, &credentials).await;
        assert_eq!(login.status, 200, "{}", login.text);
    }

    #[tokio::test]
    async fn promoted_users_gain_admin_access() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .patch_with_token(
                &routes::admin_user(alice.id),
                &json!({"role": "admin"}),
                &admin.token,
            )
            .await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.data()["role"], "admin");

        let stats = app.get_with_token(routes::ADMIN_STATS, &alice.token).await;
        assert_eq!(stats.status, 200, "{}", stats.text);
    }

    #[tokio::test]
    async fn admins_cannot_ban_or_demote_themselves() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;

        let ban = app
            .patch_with_token(
                &routes::admin_user(admin.id),
                &json!({"isBanned": true}),
                &admin.token,
            )
            .await;
        assert_eq!(ban.status, 400);
        assert_eq!(ban.body["code"], "VALIDATION_ERROR");

        let demote = app
            .patch_with_token(
                &routes::admin_user(admin.id),
                &json!({"role": "user"}),
                &admin.token,
            )
            .await;
        assert_eq!(demote.status, 400);
    }

    #[tokio::test]
    async fn update_needs_at_least_one_field() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;

        let empty = app
            .patch_with_token(&routes::admin_user(alice.id), &json!({}), &admin.token)
            .await;
        assert_eq!(empty.status, 400);

        let missing = app
            .patch_with_token(&routes::admin_user(98765), &json!({"isBanned": true}), &admin.token)
            .await;
        assert_eq!(missing.status, 404);
    }
}

mod reports {
    use super::*;

    #[tokio::test]
    async fn resolving_a_report_notifies_the_reporter() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let short = app.create_short(&bob.token, "Totally legit giveaway").await;

        let created = app
            .post_with_token(
                routes::REPORTS,
                &json!({
                    "targetType": "short",
                    "targetId": short,
                    "reason": "  Spam  ",
                    "details": "Links to a scam"
                }),
                &alice.token,
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);
        assert_eq!(created.data()["reason"], "Spam");
        assert_eq!(created.data()["status"], "open");
        assert_eq!(created.data()["reporterId"], alice.id);
        let report = created.id();

        let open = app
            .get_with_token(&format!("{}?status=open", routes::ADMIN_REPORTS), &admin.token)
            .await;
        assert_eq!(open.status, 200, "{}", open.text);
        assert_eq!(open.data()["total"], 1);

        let resolved = app
            .patch_with_token(
                &routes::admin_report(report),
                &json!({"status": "resolved"}),
                &admin.token,
            )
            .await;
        assert_eq!(resolved.status, 200, "{}", resolved.text);
        assert_eq!(resolved.data()["status"], "resolved");
        assert_eq!(resolved.data()["resolvedBy"], admin.id);
        assert!(resolved.data()["resolvedAt"].is_string());

        let inbox = app.get_with_token(routes::NOTIFICATIONS, &alice.token).await;
        let note = &inbox.data()["items"][0];
        assert_eq!(note["kind"], "report_update");
        assert_eq!(note["entityType"], "report");
        assert_eq!(note["entityId"], report);

        let open = app
            .get_with_token(&format!("{}?status=open", routes::ADMIN_REPORTS), &admin.token)
            .await;
        assert_eq!(open.data()["total"], 0);

        let again = app
            .patch_with_token(
                &routes::admin_report(report),
                &json!({"status": "dismissed"}),
                &admin.token,
            )
            .await;
        assert_eq!(again.status, 409);
        assert_eq!(again.body["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn reopening_is_not_an_outcome() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let created = app
            .post_with_token(
                routes::REPORTS,
                &json!({"targetType": "user", "targetId": bob.id, "reason": "Harassment"}),
                &alice.token,
            )
            .await;
        assert_eq!(created.status, 201, "{}", created.text);

        let res = app
            .patch_with_token(
                &routes::admin_report(created.id()),
                &json!({"status": "open"}),
                &admin.token,
            )
            .await;

        assert_eq!(res.status, 400);
    }

    #[tokio::test]
    async fn report_needs_a_reason_and_an_existing_target() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;

        let blank = app
            .post_with_token(
                routes::REPORTS,
                &json!({"targetType": "user", "targetId": bob.id, "reason": "   "}),
                &alice.token,
            )
            .await;
        assert_eq!(blank.status, 400);

        let missing = app
            .post_with_token(
                routes::REPORTS,
                &json!({"targetType": "movie", "targetId": 98765, "reason": "Spam"}),
                &alice.token,
            )
            .await;
        assert_eq!(missing.status, 404);

        let anonymous = app
            .post_without_token(
                routes::REPORTS,
                &json!({"targetType": "user", "targetId": bob.id, "reason": "Spam"}),
            )
            .await;
        assert_eq!(anonymous.status, 401);
    }
}

#[tokio::test]
async fn admin_can_list_pending_uploads() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root").await;
    let alice = app.create_authenticated_user("alice").await;
    let bob = app.create_authenticated_user("bob").await;
    for user in [&alice, &bob] {
        let res = app
            .upload_with_token("clip.mp4", "video/mp4", b"fake video".to_vec(), None, &user.token)
            .await;
        assert_eq!(res.status, 201, "{}", res.text);
    }

    let pending = app
        .get_with_token(&format!("{}?status=pending", routes::ADMIN_UPLOADS), &admin.token)
        .await;
    assert_eq!(pending.status, 200, "{}", pending.text);
    assert_eq!(pending.data()["total"], 2);
    assert_eq!(pending.data()["items"][0]["kind"], "video");

    let processed = app
        .get_with_token(&format!("{}?status=processed", routes::ADMIN_UPLOADS), &admin.token)
        .await;
    assert_eq!(processed.data()["total"], 0);
}
