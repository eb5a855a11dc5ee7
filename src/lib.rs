pub mod app;
pub mod models;
pub mod omdb;
pub mod session;
