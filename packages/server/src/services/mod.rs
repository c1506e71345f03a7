//! Database logic behind the handlers. Each service borrows a connection or
//! transaction so the same code runs inside and outside `begin()`.

pub mod admin;
pub mod auth;
pub mod catalog;
pub mod comment;
pub mod engagement;
pub mod movie;
pub mod music;
pub mod notification;
pub mod playlist;
pub mod report;
pub mod search;
pub mod short;
pub mod social;
pub mod target;
pub mod upload;
