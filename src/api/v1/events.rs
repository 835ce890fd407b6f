use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Extension,
};
use futures::stream::{self, Stream};
use std::convert::Infallible;
use tokio::sync::broadcast::error::RecvError;

use crate::domain::{DomainEvent, Role, User};
use crate::InnerState;

/// Admins see every event; others see the events that name them or the
/// videaste they assist.
fn concerns(user: &User, event: &DomainEvent) -> bool {
    user.role == Role::Admin
        || event.user_ids.contains(&user.id)
        || user
            .assistant_of
            .map_or(false, |videaste| event.user_ids.contains(&videaste))
}

#[tracing::instrument(name = "Event stream", skip(inner, actor), fields(actor = %actor.username))]
pub async fn stream_events(
    State(inner): State<InnerState>,
    Extension(actor): Extension<User>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = inner.notifier.subscribe();

    let events = stream::unfold((receiver, actor), |(mut receiver, actor)| async move {
        loop {
            match receiver.recv().await {
                Ok(event) if concerns(&actor, &event) => {
                    match Event::default()
                        .event(format!("{:?}", event.kind))
                        .json_data(&event)
                    {
                        Ok(sse) => return Some((Ok(sse), (receiver, actor))),
                        Err(e) => tracing::warn!("Failed to encode event: {}", e),
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event subscriber lagged behind");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(events).keep_alive(KeepAlive::default())
}
