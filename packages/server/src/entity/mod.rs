pub mod comment;
pub mod favorite;
pub mod follow;
pub mod history;
pub mod list_item;
pub mod movie;
pub mod music;
pub mod notification;
pub mod playlist;
pub mod playlist_item;
pub mod rating;
pub mod report;
pub mod revoked_token;
pub mod short;
pub mod upload;
pub mod user;
pub mod user_list;
pub mod watchlist;
