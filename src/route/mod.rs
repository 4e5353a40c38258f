pub mod api;
pub mod auth;
pub mod model;
pub mod post;
