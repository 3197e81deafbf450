pub mod app;
pub mod config;
pub mod detail;
pub mod images;
pub mod list;
pub mod models;
pub mod render;
pub mod request;
pub mod tmdb;
