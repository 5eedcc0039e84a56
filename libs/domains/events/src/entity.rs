use sea_orm::ActiveValue::Set;
use sea_orm::entity::prelude::*;

use crate::models::{Event, EventImage, NewEvent, NewEventImage};

// ===== Events Entity =====

pub mod event {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "events")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        #[sea_orm(column_type = "Text")]
        pub title: String,
        #[sea_orm(column_type = "Text")]
        pub description: String,
        pub start_at: DateTimeWithTimeZone,
        pub end_at: DateTimeWithTimeZone,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::event_image::Entity")]
        Images,
    }

    impl Related<super::event_image::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Images.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl Model {
        /// Combine with the event's image rows (any order)
        pub fn into_event(self, images: Vec<super::event_image::Model>) -> Event {
            let mut images: Vec<EventImage> = images.into_iter().map(Into::into).collect();
            images.sort_by_key(|image| image.position);

            Event {
                id: self.id,
                title: self.title,
                description: self.description,
                start: self.start_at.to_utc(),
                end: self.end_at.to_utc(),
                created_at: self.created_at.to_utc(),
                images,
            }
        }
    }

    impl From<&NewEvent> for ActiveModel {
        fn from(input: &NewEvent) -> Self {
            ActiveModel {
                id: Set(input.id),
                title: Set(input.title.clone()),
                description: Set(input.description.clone()),
                start_at: Set(input.start.into()),
                end_at: Set(input.end.into()),
                created_at: Set(chrono::Utc::now().into()),
            }
        }
    }
}

// ===== Event Images Entity =====

pub mod event_image {
    use super::*;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
    #[sea_orm(table_name = "event_images")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub event_id: Uuid,
        pub position: i32,
        #[sea_orm(column_type = "Text")]
        pub base64: String,
        #[sea_orm(column_type = "Text")]
        pub image_path: String,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::event::Entity",
            from = "Column::EventId",
            to = "super::event::Column::Id",
            on_delete = "Cascade"
        )]
        Event,
    }

    impl Related<super::event::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Event.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for EventImage {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                event_id: model.event_id,
                position: model.position,
                base64: model.base64,
                image_path: model.image_path,
            }
        }
    }

    impl ActiveModel {
        pub fn for_event(event_id: Uuid, image: NewEventImage) -> Self {
            ActiveModel {
                id: Set(image.id),
                event_id: Set(event_id),
                position: Set(image.position),
                base64: Set(image.base64),
                image_path: Set(image.image_path),
            }
        }
    }
}

pub use event::Entity as EventsEntity;
pub use event_image::Entity as EventImagesEntity;
