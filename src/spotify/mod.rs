pub mod api;
pub mod models;
pub mod tracker;

pub use api::SpotifyClient;
