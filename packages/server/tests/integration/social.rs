use serde_json::json;

use crate::common::{TestApp, routes};

mod follows {
    use super::*;

    #[tokio::test]
    async fn follow_is_idempotent_and_notifies_once() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;

        for _ in 0..2 {
            let res = app
                .put_with_token(&routes::follow(alice.id), &json!({}), &bob.token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
            assert_eq!(res.data()["following"], true);
        }

        let profile = app.get_with_token(&routes::profile(alice.id), &bob.token).await;
        assert_eq!(profile.status, 200, "{}", profile.text);
        assert_eq!(profile.data()["followerCount"], 1);
        assert_eq!(profile.data()["followingCount"], 0);
        assert_eq!(profile.data()["isFollowing"], true);

        let inbox = app.get_with_token(routes::NOTIFICATIONS, &alice.token).await;
        assert_eq!(inbox.data()["total"], 1);
        assert_eq!(inbox.data()["items"][0]["kind"], "follow");
        assert_eq!(inbox.data()["items"][0]["actorId"], bob.id);
    }

    #[tokio::test]
    async fn following_yourself_is_rejected() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .put_with_token(&routes::follow(alice.id), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn following_a_missing_user_is_not_found() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app
            .put_with_token(&routes::follow(98765), &json!({}), &alice.token)
            .await;

        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn followers_and_following_lists() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        app.put_with_token(&routes::follow(alice.id), &json!({}), &bob.token)
            .await;
        app.put_with_token(&routes::follow(alice.id), &json!({}), &carol.token)
            .await;

        let followers = app.get_without_token(&routes::followers(alice.id)).await;
        assert_eq!(followers.status, 200, "{}", followers.text);
        assert_eq!(followers.data()["total"], 2);

        let following = app.get_without_token(&routes::following(bob.id)).await;
        assert_eq!(following.data()["total"], 1);
        assert_eq!(following.data()["items"][0]["username"], "alice");

        let unfollow = app
            .delete_with_token(&routes::follow(alice.id), &bob.token)
            .await;
        assert_eq!(unfollow.status, 200);
        assert_eq!(unfollow.data()["following"], false);

        let followers = app.get_without_token(&routes::followers(alice.id)).await;
        assert_eq!(followers.data()["total"], 1);
        assert_eq!(followers.data()["items"][0]["username"], "carol");
    }

    #[tokio::test]
    async fn anonymous_profile_omits_follow_state() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;

        let res = app.get_without_token(&routes::profile(alice.id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.data()["username"], "alice");
        assert!(res.data().get("isFollowing").is_none());
        assert!(res.data().get("email").is_none());
    }
}

mod feed {
    use super::*;

    #[tokio::test]
    async fn feed_shows_ratings_from_followed_users_only() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let movie = app.create_movie(&admin.token, "Heat", &["Crime"]).await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let carol = app.create_authenticated_user("carol").await;
        app.put_with_token(&routes::follow(bob.id), &json!({}), &alice.token)
            .await;

        for (user, value) in [(&bob, 5), (&carol, 1)] {
            app.put_with_token(
                routes::RATINGS,
                &json!({"entityType": "movie", "entityId": movie, "value": value, "review": "ok"}),
                &user.token,
            )
            .await;
        }

        let feed = app.get_with_token(routes::FEED, &alice.token).await;

        assert_eq!(feed.status, 200, "{}", feed.text);
        assert_eq!(feed.data()["total"], 1);
        let item = &feed.data()["items"][0];
        assert_eq!(item["user"]["username"], "bob");
        assert_eq!(item["entityType"], "movie");
        assert_eq!(item["value"], 5);
    }

    #[tokio::test]
    async fn feed_requires_a_token() {
        let app = TestApp::spawn().await;

        let res = app.get_without_token(routes::FEED).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.body["code"], "TOKEN_MISSING");
    }
}

mod lists {
    use super::*;

    async fn create_list(app: &TestApp, token: &str, name: &str, public: bool) -> i32 {
        let res = app
            .post_with_token(routes::LISTS, &json!({"name": name, "isPublic": public}), token)
            .await;
        assert_eq!(res.status, 201, "create_list failed: {}", res.text);
        res.id()
    }

    #[tokio::test]
    async fn items_can_be_added_once_and_removed() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let movie = app.create_movie(&admin.token, "Heat", &["Crime"]).await;
        let alice = app.create_authenticated_user("alice").await;
        let list = create_list(&app, &alice.token, "Crime nights", true).await;
        let item = json!({"entityType": "movie", "entityId": movie});

        for _ in 0..2 {
            let res = app
                .put_with_token(&routes::list_items(list), &item, &alice.token)
                .await;
            assert_eq!(res.status, 200, "{}", res.text);
        }

        let detail = app.get_without_token(&routes::list(list)).await;
        assert_eq!(detail.status, 200, "{}", detail.text);
        assert_eq!(detail.data()["itemCount"], 1);
        assert_eq!(detail.data()["items"][0]["entityId"], movie);

        let res = app
            .delete_with_token(
                &format!("{}?entityType=movie&entityId={movie}", routes::list_items(list)),
                &alice.token,
            )
            .await;
        assert_eq!(res.status, 200);

        let detail = app.get_without_token(&routes::list(list)).await;
        assert_eq!(detail.data()["itemCount"], 0);
    }

    #[tokio::test]
    async fn private_lists_are_hidden_from_profiles_and_strangers() {
        let app = TestApp::spawn().await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        create_list(&app, &alice.token, "Public picks", true).await;
        let secret = create_list(&app, &alice.token, "Guilty pleasures", false).await;

        let public = app.get_without_token(&routes::user_lists(alice.id)).await;
        assert_eq!(public.data()["total"], 1);
        assert_eq!(public.data()["items"][0]["name"], "Public picks");

        let mine = app.get_with_token(routes::LISTS, &alice.token).await;
        assert_eq!(mine.data()["total"], 2);

        assert_eq!(
            app.get_with_token(&routes::list(secret), &bob.token).await.status,
            404
        );
        assert_eq!(
            app.get_with_token(&routes::list(secret), &alice.token).await.status,
            200
        );
    }

    #[tokio::test]
    async fn only_the_owner_can_change_a_list() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin("root").await;
        let movie = app.create_movie(&admin.token, "Heat", &["Crime"]).await;
        let alice = app.create_authenticated_user("alice").await;
        let bob = app.create_authenticated_user("bob").await;
        let list = create_list(&app, &alice.token, "Mine", true).await;

        let add = app
            .put_with_token(
                &routes::list_items(list),
                &json!({"entityType": "movie", "entityId": movie}),
                &bob.token,
            )
            .await;
        assert_eq!(add.status, 403);

        let rename = app
            .patch_with_token(&routes::list(list), &json!({"name": "Bob's"}), &bob.token)
            .await;
        assert_eq!(rename.status, 403);

        let rename = app
            .patch_with_token(&routes::list(list), &json!({"description": "Heists"}), &alice.token)
            .await;
        assert_eq!(rename.status, 200, "{}", rename.text);
        assert_eq!(rename.data()["description"], "Heists");

        assert_eq!(app.delete_with_token(&routes::list(list), &bob.token).await.status, 403);
        assert_eq!(app.delete_with_token(&routes::list(list), &alice.token).await.status, 200);
    }
}
