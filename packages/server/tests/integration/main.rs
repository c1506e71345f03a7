mod admin;
mod common;
mod engagement;
mod health;
mod movie;
mod music;
mod notification;
mod search;
mod short;
mod social;
mod upload;
