//! Change notification.
//!
//! Mutations publish best-effort [`ChangeEvent`]s after commit. Publication
//! never blocks or fails the data operation: events cross an unbounded
//! channel to a background task that pushes them into an [`EventSink`]
//! (the real-time gateway in production, a recording fake in tests).

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::{error::Error as StdError, fmt, sync::Arc};
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

/// Sink failure; logged, never surfaced to the caller.
pub type SinkError = Box<dyn StdError + Send + Sync>;

///
/// ChangeAction
///

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeAction {
    Created,
    Updated,
    Deleted,
}

impl fmt::Display for ChangeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
        };
        f.write_str(label)
    }
}

///
/// Room
///
/// A concrete delivery target resolved from the descriptor's audiences and
/// the acting user's tenancy.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Room {
    User(Uuid),
    Team(Uuid),
    Broker(Uuid),
}

///
/// ChangeEvent
///

#[derive(Clone, Debug)]
pub struct ChangeEvent {
    pub entity: String,
    pub entity_id: Option<Uuid>,
    pub action: ChangeAction,
    pub payload: JsonValue,
    pub rooms: Vec<Room>,
}

///
/// EventSink
///
/// Transport boundary for room delivery.
///

#[async_trait::async_trait]
pub trait EventSink: Send + Sync {
    async fn deliver_to_user(&self, user: Uuid, event: &ChangeEvent) -> Result<(), SinkError>;
    async fn deliver_to_team(&self, team: Uuid, event: &ChangeEvent) -> Result<(), SinkError>;
    async fn deliver_to_broker(&self, broker: Uuid, event: &ChangeEvent) -> Result<(), SinkError>;
}

///
/// ChangeNotifier
///
/// Cheap to clone; `publish` is non-blocking. A disabled notifier drops
/// events on the floor, which is the correct behavior for batch tools and
/// tests that do not care about delivery.
///

#[derive(Clone, Debug, Default)]
pub struct ChangeNotifier {
    tx: Option<UnboundedSender<ChangeEvent>>,
}

impl ChangeNotifier {
    #[must_use]
    pub const fn disabled() -> Self {
        Self { tx: None }
    }

    /// Start the delivery task and return a handle publishing into it.
    #[must_use]
    pub fn spawn(sink: Arc<dyn EventSink>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChangeEvent>();

        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                for room in &event.rooms {
                    let outcome = match room {
                        Room::User(id) => sink.deliver_to_user(*id, &event).await,
                        Room::Team(id) => sink.deliver_to_team(*id, &event).await,
                        Room::Broker(id) => sink.deliver_to_broker(*id, &event).await,
                    };
                    if let Err(err) = outcome {
                        tracing::warn!(
                            entity = %event.entity,
                            action = %event.action,
                            ?room,
                            %err,
                            "change event delivery failed"
                        );
                    }
                }
            }
        });

        Self { tx: Some(tx) }
    }

    /// Queue an event for delivery. Silently a no-op when disabled or when
    /// the delivery task has shut down.
    pub fn publish(&self, event: ChangeEvent) {
        if let Some(tx) = &self.tx {
            if tx.send(event).is_err() {
                tracing::warn!("change notifier task is gone; dropping event");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeAction, ChangeEvent, ChangeNotifier, EventSink, Room, SinkError};
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingSink {
        delivered: Mutex<Vec<(String, Room)>>,
    }

    #[async_trait::async_trait]
    impl EventSink for RecordingSink {
        async fn deliver_to_user(&self, user: Uuid, event: &ChangeEvent) -> Result<(), SinkError> {
            self.record(event, Room::User(user));
            Ok(())
        }

        async fn deliver_to_team(&self, team: Uuid, event: &ChangeEvent) -> Result<(), SinkError> {
            self.record(event, Room::Team(team));
            Ok(())
        }

        async fn deliver_to_broker(
            &self,
            broker: Uuid,
            event: &ChangeEvent,
        ) -> Result<(), SinkError> {
            self.record(event, Room::Broker(broker));
            Ok(())
        }
    }

    impl RecordingSink {
        fn record(&self, event: &ChangeEvent, room: Room) {
            self.delivered
                .lock()
                .expect("sink lock")
                .push((event.entity.clone(), room));
        }
    }

    fn event(rooms: Vec<Room>) -> ChangeEvent {
        ChangeEvent {
            entity: "lead".to_owned(),
            entity_id: Some(Uuid::from_u128(7)),
            action: ChangeAction::Created,
            payload: serde_json::json!({"id": "x"}),
            rooms,
        }
    }

    #[tokio::test]
    async fn events_fan_out_to_every_room() {
        let sink = Arc::new(RecordingSink::default());
        let notifier = ChangeNotifier::spawn(sink.clone());

        let user = Uuid::from_u128(1);
        let team = Uuid::from_u128(2);
        notifier.publish(event(vec![Room::User(user), Room::Team(team)]));

        // Delivery is async; poll briefly for the background task.
        for _ in 0..50 {
            if sink.delivered.lock().expect("sink lock").len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let delivered = sink.delivered.lock().expect("sink lock");
        assert_eq!(delivered.len(), 2);
        assert_eq!(delivered[0].1, Room::User(user));
        assert_eq!(delivered[1].1, Room::Team(team));
    }

    #[tokio::test]
    async fn disabled_notifier_drops_events() {
        let notifier = ChangeNotifier::disabled();
        notifier.publish(event(vec![Room::User(Uuid::from_u128(1))]));
        // Nothing to assert beyond not panicking.
    }
}
