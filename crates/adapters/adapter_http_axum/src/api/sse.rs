//! Server-Sent Events (SSE) stream of live status snapshots.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::extract::State;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::{Stream, StreamExt};

use aroma_app::event_bus::EventDispatcher;
use aroma_app::ports::{AudioEngine, OutputDriver};
use aroma_domain::error::DispatchError;
use aroma_domain::event::Event;
use aroma_domain::id::SubscriptionId;

use crate::state::AppState;

/// Removes the dispatcher subscription once the client goes away.
struct Subscription {
    dispatcher: EventDispatcher,
    id: SubscriptionId,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.dispatcher.unsubscribe(self.id);
        tracing::debug!(subscriber = %self.id, "SSE client disconnected");
    }
}

/// Events forwarded to one connection, tied to its subscription.
struct LiveEvents {
    events: UnboundedReceiverStream<Event>,
    _subscription: Subscription,
}

impl Stream for LiveEvents {
    type Item = Event;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        Pin::new(&mut self.events).poll_next(cx)
    }
}

/// `GET /api/events/stream`: SSE stream of fan and playback snapshots.
///
/// Registers a dispatcher subscriber for the lifetime of the connection and
/// sends every snapshot as a JSON `data:` frame. The subscriber is removed
/// when the client disconnects.
pub async fn stream<D, E>(
    State(state): State<AppState<D, E>>,
) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>>
where
    D: OutputDriver + 'static,
    E: AudioEngine + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let id = state.dispatcher.subscribe(move |event: &Event| {
        tx.send(event.clone())
            .map_err(|_| DispatchError::Disconnected)
    });
    tracing::debug!(subscriber = %id, "SSE client connected");

    let events = LiveEvents {
        events: UnboundedReceiverStream::new(rx),
        _subscription: Subscription {
            dispatcher: state.dispatcher.clone(),
            id,
        },
    };
    let frames = events.filter_map(|event| match serde_json::to_string(&event) {
        Ok(json) => Some(Ok(SseEvent::default().data(json))),
        Err(err) => {
            tracing::warn!(%err, "failed to serialize event to JSON for SSE stream");
            None
        }
    });

    Sse::new(frames).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_state;

    #[tokio::test]
    async fn should_subscribe_for_as_long_as_the_stream_lives() {
        let state = test_state("static");
        let dispatcher = state.dispatcher.clone();

        let sse = stream(State(state)).await;
        assert_eq!(dispatcher.subscriber_count(), 1);

        drop(sse);
        assert_eq!(dispatcher.subscriber_count(), 0);
    }
}
