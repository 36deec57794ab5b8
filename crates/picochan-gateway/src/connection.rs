use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, Sse};
use futures_util::{Stream, StreamExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use picochan_types::events::{CanvasFrame, GatewayEvent, Topic};
use picochan_types::models::CanvasSnapshot;

use crate::dispatcher::Subscriber;

/// Idle interval after which a stream emits a ping frame.
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(15);

/// One unit written to a push connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// Whole canvas, sent once when a canvas stream opens
    Full(CanvasSnapshot),
    /// A live event matching the stream's topic
    Event(GatewayEvent),
    /// Keepalive after `IDLE_TIMEOUT` without traffic
    Ping,
}

impl Frame {
    /// `data: <json>` for payload frames, `event: ping` / `data: {}` for pings.
    pub fn to_sse(&self) -> Event {
        let json = match self {
            Self::Ping => return Event::default().event("ping").data("{}"),
            Self::Full(snapshot) => serde_json::to_string(&CanvasFrame {
                full: snapshot.clone(),
            }),
            Self::Event(event) => serde_json::to_string(event),
        };

        match json {
            Ok(json) => Event::default().data(json),
            Err(e) => {
                warn!("Failed to encode frame: {}", e);
                Event::default().comment("encode error")
            }
        }
    }
}

enum Wake {
    Event(GatewayEvent),
    Idle,
    Closed,
    Shutdown,
}

/// Live events for `topic`, with a ping after each idle interval.
///
/// Events for other topics are discarded here rather than at subscribe time.
/// The stream ends when `shutdown` fires or the sink is closed; dropping it
/// (client disconnect) drops the subscriber, which unregisters it.
pub fn event_stream(
    subscriber: Subscriber,
    topic: Topic,
    shutdown: CancellationToken,
) -> impl Stream<Item = Frame> + Send + 'static {
    relay(None, subscriber, topic, shutdown, IDLE_TIMEOUT)
}

/// Canvas stream: the full snapshot first, then one frame per applied pixel.
///
/// `subscriber` must have been registered before `snapshot` was taken so no
/// pixel falls between the two.
pub fn canvas_stream(
    snapshot: CanvasSnapshot,
    subscriber: Subscriber,
    shutdown: CancellationToken,
) -> impl Stream<Item = Frame> + Send + 'static {
    relay(
        Some(Frame::Full(snapshot)),
        subscriber,
        Topic::Canvas,
        shutdown,
        IDLE_TIMEOUT,
    )
}

/// Wrap a frame stream as an SSE response body.
pub fn into_sse<S>(frames: S) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = Frame> + Send + 'static,
{
    Sse::new(frames.map(|frame| Ok(frame.to_sse())))
}

fn relay(
    first: Option<Frame>,
    mut subscriber: Subscriber,
    topic: Topic,
    shutdown: CancellationToken,
    idle: Duration,
) -> impl Stream<Item = Frame> + Send + 'static {
    async_stream::stream! {
        debug!("Subscriber {} streaming {:?}", subscriber.id(), topic);

        if let Some(frame) = first {
            yield frame;
        }

        let mut deadline = Instant::now() + idle;
        loop {
            let wake = tokio::select! {
                biased;
                _ = shutdown.cancelled() => Wake::Shutdown,
                event = subscriber.recv() => match event {
                    Some(event) => Wake::Event(event),
                    None => Wake::Closed,
                },
                _ = tokio::time::sleep_until(deadline) => Wake::Idle,
            };

            match wake {
                Wake::Event(event) => {
                    if event.topic() != topic {
                        continue;
                    }
                    deadline = Instant::now() + idle;
                    yield Frame::Event(event);
                }
                Wake::Idle => {
                    deadline = Instant::now() + idle;
                    yield Frame::Ping;
                }
                Wake::Closed | Wake::Shutdown => break,
            }
        }

        debug!("Subscriber {} stream ended", subscriber.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use picochan_types::models::{Channel, Message, Pixel};

    fn message(id: u64, chan: Channel) -> GatewayEvent {
        GatewayEvent::Message(Message {
            id,
            ts: 0,
            chan,
            text: format!("m{}", id),
            hash: "ABCDEF".into(),
            color: "#D27556".into(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn discussion_stream_ignores_dessin() {
        let dispatcher = Dispatcher::new();
        let stream = event_stream(
            dispatcher.subscribe(),
            Topic::Channel(Channel::Discussion),
            dispatcher.shutdown_token(),
        );
        tokio::pin!(stream);

        dispatcher.publish(message(1, Channel::Dessin));
        dispatcher.publish(GatewayEvent::Pixel(Pixel::new(0, 0, "#")));
        dispatcher.publish(message(2, Channel::Discussion));

        assert_eq!(stream.next().await, Some(Frame::Event(message(2, Channel::Discussion))));
    }

    #[tokio::test(start_paused = true)]
    async fn dessin_stream_ignores_discussion() {
        let dispatcher = Dispatcher::new();
        let stream = event_stream(
            dispatcher.subscribe(),
            Topic::Channel(Channel::Dessin),
            dispatcher.shutdown_token(),
        );
        tokio::pin!(stream);

        dispatcher.publish(message(1, Channel::Discussion));
        dispatcher.publish(message(2, Channel::Dessin));

        assert_eq!(stream.next().await, Some(Frame::Event(message(2, Channel::Dessin))));
    }

    #[tokio::test(start_paused = true)]
    async fn canvas_stream_sends_snapshot_then_pixels() {
        let dispatcher = Dispatcher::new();
        let snapshot = CanvasSnapshot {
            w: 1,
            h: 1,
            lines: vec![" ".into()],
        };
        let stream = canvas_stream(snapshot.clone(), dispatcher.subscribe(), dispatcher.shutdown_token());
        tokio::pin!(stream);

        dispatcher.publish(message(1, Channel::Dessin));
        dispatcher.publish(GatewayEvent::Pixel(Pixel::new(0, 0, "x")));

        assert_eq!(stream.next().await, Some(Frame::Full(snapshot)));
        assert_eq!(
            stream.next().await,
            Some(Frame::Event(GatewayEvent::Pixel(Pixel::new(0, 0, "x"))))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pings_when_idle() {
        let dispatcher = Dispatcher::new();
        let stream = event_stream(
            dispatcher.subscribe(),
            Topic::Channel(Channel::Discussion),
            dispatcher.shutdown_token(),
        );
        tokio::pin!(stream);

        let started = Instant::now();
        assert_eq!(stream.next().await, Some(Frame::Ping));
        assert!(started.elapsed() >= IDLE_TIMEOUT);

        // Keeps going after a ping
        dispatcher.publish(message(7, Channel::Discussion));
        assert_eq!(stream.next().await, Some(Frame::Event(message(7, Channel::Discussion))));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_ends_stream() {
        let dispatcher = Dispatcher::new();
        let stream = event_stream(
            dispatcher.subscribe(),
            Topic::Channel(Channel::Discussion),
            dispatcher.shutdown_token(),
        );
        tokio::pin!(stream);

        dispatcher.shutdown();
        assert_eq!(stream.next().await, None);
    }

    #[tokio::test]
    async fn dropping_stream_unsubscribes() {
        let dispatcher = Dispatcher::new();
        let stream = event_stream(
            dispatcher.subscribe(),
            Topic::Channel(Channel::Discussion),
            dispatcher.shutdown_token(),
        );
        assert_eq!(dispatcher.subscriber_count(), 1);

        drop(stream);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }
}
