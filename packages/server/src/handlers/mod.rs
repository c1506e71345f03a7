pub mod admin;
pub mod auth;
pub mod comment;
pub mod engagement;
pub mod health;
pub mod movie;
pub mod music;
pub mod notification;
pub mod playlist;
pub mod report;
pub mod search;
pub mod short;
pub mod social;
pub mod upload;
