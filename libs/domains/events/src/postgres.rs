use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, TransactionTrait,
};

use crate::entity::{EventsEntity, event, event_image};
use crate::error::{EventError, EventResult};
use crate::models::{Event, NewEvent};
use crate::repository::EventRepository;

/// PostgreSQL implementation of EventRepository
#[derive(Clone)]
pub struct PgEventRepository {
    db: DatabaseConnection,
}

impl PgEventRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn persistence(err: DbErr) -> EventError {
    EventError::Persistence(err.to_string())
}

#[async_trait]
impl EventRepository for PgEventRepository {
    async fn create(&self, new: NewEvent) -> EventResult<Event> {
        let txn = self.db.begin().await.map_err(persistence)?;

        let event_model = event::ActiveModel::from(&new)
            .insert(&txn)
            .await
            .map_err(persistence)?;

        let mut image_models = Vec::with_capacity(new.images.len());
        for image in new.images {
            let model = event_image::ActiveModel::for_event(new.id, image)
                .insert(&txn)
                .await
                .map_err(persistence)?;
            image_models.push(model);
        }

        txn.commit().await.map_err(persistence)?;

        let event = event_model.into_event(image_models);
        tracing::info!(event_id = %event.id, image_count = event.images.len(), "Created event");
        Ok(event)
    }

    async fn list_all(&self) -> EventResult<Vec<Event>> {
        let rows = EventsEntity::find()
            .order_by_asc(event::Column::CreatedAt)
            .order_by_asc(event::Column::Id)
            .find_with_related(event_image::Entity)
            .all(&self.db)
            .await
            .map_err(|e| EventError::Repository(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|(model, images)| model.into_event(images))
            .collect())
    }
}
