use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::{
        sse::{RoomVersionEvent, ServerEvent},
        validation::normalize_room_code,
    },
    error::ServiceError,
    services::sse_events::EVENT_ROOM_VERSION,
    state::SharedState,
};

/// Subscription to one room's change notifications.
pub struct RoomSubscription {
    /// Normalised room code.
    pub code: String,
    /// Event announcing the version current at subscription time.
    pub initial: ServerEvent,
    pub receiver: broadcast::Receiver<ServerEvent>,
}

/// Subscribe to the events of room `code`, which must exist.
pub async fn subscribe_room(
    state: &SharedState,
    code: &str,
) -> Result<RoomSubscription, ServiceError> {
    let code = normalize_room_code(code);
    let receiver = state.hubs().subscribe(&code);
    let room = match state.load_room(&code).await {
        Ok(room) => room,
        Err(err) => {
            drop(receiver);
            state.hubs().release(&code);
            return Err(err);
        }
    };

    let initial = ServerEvent::json(
        Some(EVENT_ROOM_VERSION.to_string()),
        &RoomVersionEvent {
            version: room.version.to_string(),
            state: room.phase,
        },
    )
    .map_err(|err| ServiceError::Internal(err.to_string()))?;

    Ok(RoomSubscription {
        code,
        initial,
        receiver,
    })
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}

/// Convert a room subscription into an SSE response, forwarding events and
/// releasing the room's hub once the client disconnects.
pub fn to_sse_stream(
    state: SharedState,
    subscription: RoomSubscription,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let RoomSubscription {
        code,
        initial,
        mut receiver,
    } = subscription;

    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(to_event(initial))).await.is_ok() {
            loop {
                tokio::select! {
                    _ = tx.closed() => break,
                    recv_result = receiver.recv() => {
                        match recv_result {
                            Ok(payload) => {
                                if tx.send(Ok(to_event(payload))).await.is_err() {
                                    break;
                                }
                            }
                            Err(RecvError::Closed) => break,
                            Err(RecvError::Lagged(skipped)) => {
                                // Clients re-poll on the next event anyway.
                                debug!(room = %code, skipped, "room SSE subscriber lagged");
                                continue;
                            }
                        }
                    }
                }
            }
        }

        drop(receiver);
        state.hubs().release(&code);
        info!(room = %code, "room SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
