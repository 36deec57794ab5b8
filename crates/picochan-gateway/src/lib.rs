pub mod connection;
pub mod dispatcher;

pub use connection::Frame;
pub use dispatcher::{Dispatcher, Subscriber};
