use std::sync::Arc;

use tracing::debug;

use picochan_crypto::{IdentityHasher, color_from_pseudonym};
use picochan_gateway::Dispatcher;
use picochan_store::clients::ACTIVE_WINDOW_SECS;
use picochan_store::{BoundedLog, Canvas, ClientTracker};
use picochan_types::events::GatewayEvent;
use picochan_types::models::{Channel, Message};

use crate::config::Config;

pub type AppState = Arc<AppStateInner>;

/// Every piece of board state, built once at startup and shared by handlers.
pub struct AppStateInner {
    pub config: Config,
    pub log: BoundedLog,
    pub canvas: Canvas,
    pub clients: ClientTracker,
    pub identity: IdentityHasher,
    pub dispatcher: Dispatcher,
}

impl AppStateInner {
    pub fn new(config: Config) -> Self {
        Self {
            log: BoundedLog::new(config.max_msgs),
            canvas: Canvas::default(),
            clients: ClientTracker::new(config.post_cooldown, ACTIVE_WINDOW_SECS),
            identity: IdentityHasher::new(config.secret_salt.clone(), config.hash_rotate_daily),
            dispatcher: Dispatcher::new(),
            config,
        }
    }

    /// Sign `text` with the author's pseudonym, append it to `chan` and fan it
    /// out to live subscribers.
    pub fn post(&self, chan: Channel, text: String, addr: &str, now: f64) -> Message {
        let hash = self.identity.pseudonym(addr, now as i64);
        let color = color_from_pseudonym(&hash);

        let msg = self.log.append_with(chan, text, hash, color, |msg| {
            self.dispatcher.publish(GatewayEvent::Message(msg.clone()));
        });
        debug!("[{}] posted #{} to {}", msg.hash, msg.id, msg.chan);
        msg
    }
}
