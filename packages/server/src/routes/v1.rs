use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .nest("/auth", auth_routes())
        .nest("/movies", movie_routes())
        .nest("/shorts", short_routes())
        .nest("/music", music_routes())
        .nest("/playlists", playlist_routes())
        .nest("/engagement", engagement_routes())
        .nest("/comments", comment_routes())
        .nest("/social", social_routes())
        .nest("/notifications", notification_routes())
        .nest("/search", search_routes())
        .nest("/uploads", upload_routes(config))
        .nest("/reports", report_routes())
        .nest("/admin", admin_routes())
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::refresh))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me, handlers::auth::update_me))
        .routes(routes!(handlers::auth::change_password))
}

fn movie_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::movie::list_movies,
            handlers::movie::create_movie
        ))
        .routes(routes!(handlers::movie::trending_movies))
        .routes(routes!(handlers::movie::movie_genres))
        .routes(routes!(
            handlers::movie::get_movie,
            handlers::movie::update_movie,
            handlers::movie::delete_movie
        ))
}

fn short_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::short::list_shorts,
            handlers::short::create_short
        ))
        .routes(routes!(
            handlers::short::get_short,
            handlers::short::delete_short
        ))
}

fn music_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::music::list_music,
            handlers::music::create_music
        ))
        .routes(routes!(handlers::music::trending_music))
        .routes(routes!(handlers::music::music_genres))
        .routes(routes!(
            handlers::music::get_music,
            handlers::music::update_music,
            handlers::music::delete_music
        ))
        .routes(routes!(handlers::music::record_play))
}

fn playlist_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::playlist::list_playlists,
            handlers::playlist::create_playlist
        ))
        .routes(routes!(
            handlers::playlist::get_playlist,
            handlers::playlist::update_playlist,
            handlers::playlist::delete_playlist
        ))
        .routes(routes!(handlers::playlist::add_track))
        .routes(routes!(handlers::playlist::remove_track))
}

fn engagement_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::engagement::rate,
            handlers::engagement::remove_rating,
            handlers::engagement::my_ratings
        ))
        .routes(routes!(handlers::engagement::rating_summary))
        .routes(routes!(
            handlers::engagement::add_favorite,
            handlers::engagement::remove_favorite,
            handlers::engagement::list_favorites
        ))
        .routes(routes!(
            handlers::engagement::add_to_watchlist,
            handlers::engagement::list_watchlist
        ))
        .routes(routes!(handlers::engagement::remove_from_watchlist))
        .routes(routes!(
            handlers::engagement::record_history,
            handlers::engagement::list_history,
            handlers::engagement::clear_history
        ))
}

fn comment_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::comment::list_comments,
            handlers::comment::create_comment
        ))
        .routes(routes!(handlers::comment::list_replies))
        .routes(routes!(
            handlers::comment::update_comment,
            handlers::comment::delete_comment
        ))
}

fn social_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::social::follow_user,
            handlers::social::unfollow_user
        ))
        .routes(routes!(handlers::social::get_profile))
        .routes(routes!(handlers::social::list_followers))
        .routes(routes!(handlers::social::list_following))
        .routes(routes!(handlers::social::list_public_lists))
        .routes(routes!(handlers::social::activity_feed))
        .routes(routes!(
            handlers::social::my_lists,
            handlers::social::create_list
        ))
        .routes(routes!(
            handlers::social::get_list,
            handlers::social::update_list,
            handlers::social::delete_list
        ))
        .routes(routes!(
            handlers::social::add_list_item,
            handlers::social::remove_list_item
        ))
}

fn notification_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::notification::list_notifications))
        .routes(routes!(handlers::notification::unread_count))
        .routes(routes!(handlers::notification::mark_read))
        .routes(routes!(handlers::notification::mark_all_read))
        .routes(routes!(handlers::notification::delete_notification))
}

fn search_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::search::search))
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    let upload = OpenApiRouter::new()
        .routes(routes!(
            handlers::upload::create_upload,
            handlers::upload::list_uploads
        ))
        .layer(handlers::upload::upload_body_limit(
            config.storage.max_blob_size,
        ));

    let manage = OpenApiRouter::new()
        .routes(routes!(
            handlers::upload::get_upload,
            handlers::upload::delete_upload
        ))
        .routes(routes!(handlers::upload::download_upload))
        .routes(routes!(handlers::upload::convert_to_music));

    upload.merge(manage)
}

fn report_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new().routes(routes!(handlers::report::create_report))
}

fn admin_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::admin::stats))
        .routes(routes!(handlers::admin::list_users))
        .routes(routes!(handlers::admin::update_user))
        .routes(routes!(handlers::admin::list_reports))
        .routes(routes!(handlers::admin::resolve_report))
        .routes(routes!(handlers::admin::list_uploads))
}
