use serde_json::json;

use crate::common::{TestApp, routes};

fn search_url(query: &str) -> String {
    format!("{}?{query}", routes::SEARCH)
}

#[tokio::test]
async fn search_spans_every_catalog_by_default() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root").await;
    let neo = app.create_authenticated_user("matrix_fan").await;
    app.create_movie(&admin.token, "The Matrix", &["Sci-Fi"]).await;
    app.create_movie(&admin.token, "Heat", &["Crime"]).await;
    app.create_music(&admin.token, "Matrix Theme", "Don Davis").await;
    app.create_short(&neo.token, "MATRIX bullet time").await;

    let res = app.get_without_token(&search_url("q=matrix")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["query"], "matrix");
    assert_eq!(res.data()["movies"]["total"], 1);
    assert_eq!(res.data()["movies"]["items"][0]["title"], "The Matrix");
    assert_eq!(res.data()["music"]["total"], 1);
    assert_eq!(res.data()["shorts"]["total"], 1);
    assert_eq!(res.data()["users"]["total"], 1);
    assert_eq!(res.data()["users"]["items"][0]["username"], "matrix_fan");
}

#[tokio::test]
async fn type_restricts_the_sections() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root").await;
    app.create_movie(&admin.token, "Arrival", &["Sci-Fi"]).await;
    app.create_music(&admin.token, "Arrival", "ABBA").await;

    let res = app.get_without_token(&search_url("q=arrival&type=music")).await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["music"]["total"], 1);
    assert!(res.data().get("movies").is_none());
    assert!(res.data().get("shorts").is_none());
    assert!(res.data().get("users").is_none());
}

#[tokio::test]
async fn query_must_have_at_least_two_characters() {
    let app = TestApp::spawn().await;

    let short = app.get_without_token(&search_url("q=a")).await;
    assert_eq!(short.status, 400);
    assert_eq!(short.body["code"], "VALIDATION_ERROR");

    let padded = app.get_without_token(&search_url("q=%20a%20")).await;
    assert_eq!(padded.status, 400);

    let missing = app.get_without_token(routes::SEARCH).await;
    assert_eq!(missing.status, 400);
}

#[tokio::test]
async fn like_wildcards_are_matched_literally() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root").await;
    app.create_movie(&admin.token, "100% Wolf", &["Animation"]).await;
    app.create_movie(&admin.token, "1000 Suns", &["Drama"]).await;

    let res = app
        .get_without_token(&search_url("q=100%25&type=movie"))
        .await;

    assert_eq!(res.status, 200, "{}", res.text);
    assert_eq!(res.data()["movies"]["total"], 1);
    assert_eq!(res.data()["movies"]["items"][0]["title"], "100% Wolf");
}

#[tokio::test]
async fn banned_users_are_not_listed() {
    let app = TestApp::spawn().await;
    let admin = app.create_admin("root").await;
    let troll = app.create_authenticated_user("troll_one").await;
    app.create_authenticated_user("troll_two").await;

    app.patch_with_token(
        &routes::admin_user(troll.id),
        &json!({"isBanned": true}),
        &admin.token,
    )
    .await;

    let res = app.get_without_token(&search_url("q=troll&type=user")).await;

    assert_eq!(res.data()["users"]["total"], 1);
    assert_eq!(res.data()["users"]["items"][0]["username"], "troll_two");
}
