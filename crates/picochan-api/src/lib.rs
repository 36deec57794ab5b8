pub mod canvas;
pub mod client;
pub mod config;
pub mod error;
pub mod messages;
pub mod routes;
pub mod state;

pub use config::Config;
pub use routes::router;
pub use state::{AppState, AppStateInner};
