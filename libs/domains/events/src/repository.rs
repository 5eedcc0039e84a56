use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::EventResult;
use crate::models::{Event, NewEvent};

/// Repository trait for Event persistence
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Commit an event and all of its images as one unit
    async fn create(&self, event: NewEvent) -> EventResult<Event>;

    /// All events by creation time, each with images in position order
    async fn list_all(&self) -> EventResult<Vec<Event>>;
}

/// In-memory implementation of EventRepository (for development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<Vec<Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    async fn create(&self, event: NewEvent) -> EventResult<Event> {
        let mut event = Event::from_new(event, Utc::now());
        event.images.sort_by_key(|image| image.position);

        self.events.write().await.push(event.clone());

        tracing::info!(event_id = %event.id, image_count = event.images.len(), "Created event");
        Ok(event)
    }

    async fn list_all(&self) -> EventResult<Vec<Event>> {
        let mut events = self.events.read().await.clone();
        events.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(events)
    }
}
