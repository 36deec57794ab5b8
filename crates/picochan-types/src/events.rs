use serde::{Deserialize, Serialize};

use crate::models::{CanvasSnapshot, Channel, Message, Pixel};

/// Events fanned out to live subscribers.
///
/// Serialized untagged: a message goes over the wire as the message object,
/// a pixel as `{x, y, ch}`. Streams are topic-scoped, so clients never need a
/// discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GatewayEvent {
    /// A message was appended to a channel's log
    Message(Message),

    /// A single canvas cell was applied
    Pixel(Pixel),
}

impl GatewayEvent {
    /// The routing key a stream compares against its own topic.
    pub fn topic(&self) -> Topic {
        match self {
            Self::Message(msg) => Topic::Channel(msg.chan),
            Self::Pixel(_) => Topic::Canvas,
        }
    }
}

/// What a push stream is listening to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Channel(Channel),
    Canvas,
}

/// First frame of a canvas stream: the full grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasFrame {
    pub full: CanvasSnapshot,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_event_serializes_flat() {
        let event = GatewayEvent::Pixel(Pixel::new(1, 2, "#"));
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r##"{"x":1,"y":2,"ch":"#"}"##
        );
        assert_eq!(event.topic(), Topic::Canvas);
    }

    #[test]
    fn message_event_topic_is_its_channel() {
        let event = GatewayEvent::Message(Message {
            id: 1,
            ts: 0,
            chan: Channel::Dessin,
            text: "#".into(),
            hash: "000000".into(),
            color: "#D25656".into(),
        });
        assert_eq!(event.topic(), Topic::Channel(Channel::Dessin));
    }
}
