pub mod api;
pub mod clock;
pub mod events;
pub mod models;
