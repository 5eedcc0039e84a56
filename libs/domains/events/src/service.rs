use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::error::{EventError, EventResult};
use crate::models::{CreateEvent, EventView, NewEvent, NewEventImage, parse_timestamp};
use crate::repository::EventRepository;
use crate::storage::ImageStore;

/// Service layer for event ingestion and listing
pub struct EventService<R: EventRepository, S: ImageStore> {
    repository: Arc<R>,
    image_store: Arc<S>,
}

impl<R: EventRepository, S: ImageStore> EventService<R, S> {
    pub fn new(repository: R, image_store: S) -> Self {
        Self {
            repository: Arc::new(repository),
            image_store: Arc::new(image_store),
        }
    }

    /// Validate, store every image, then commit the aggregate
    ///
    /// Validation happens before any file is written. If an image fails to
    /// store or the commit fails, the files already written for this request
    /// are removed before the error is returned.
    pub async fn create_event(&self, input: CreateEvent) -> EventResult<Uuid> {
        input
            .validate()
            .map_err(|e| EventError::missing(error_fields(&e)))?;

        let CreateEvent {
            title: Some(title),
            description: Some(description),
            start: Some(start),
            end: Some(end),
            images: uploads,
        } = input
        else {
            return Err(EventError::missing(Vec::new()));
        };

        let (start, end) = parse_window(&start, &end)?;

        let id = Uuid::now_v7();
        let mut images = Vec::with_capacity(uploads.len());

        for (index, upload) in uploads.into_iter().enumerate() {
            let position = match image_position(index) {
                Ok(position) => position,
                Err(err) => {
                    self.discard_images(&images).await;
                    return Err(err);
                }
            };
            let base64 = upload.base64.unwrap_or_default();

            match self.image_store.store(&base64, &upload.filename).await {
                Ok(image_path) => images.push(NewEventImage {
                    id: Uuid::now_v7(),
                    position,
                    base64,
                    image_path,
                }),
                Err(err) => {
                    tracing::warn!(event_id = %id, position, error = %err, "Image upload failed");
                    self.discard_images(&images).await;
                    return Err(err.into());
                }
            }
        }

        let aggregate = NewEvent {
            id,
            title,
            description,
            start,
            end,
            images,
        };
        let written = aggregate.images.clone();

        match self.repository.create(aggregate).await {
            Ok(event) => Ok(event.id),
            Err(err) => {
                tracing::error!(event_id = %id, error = %err, "Event commit failed");
                self.discard_images(&written).await;
                Err(err)
            }
        }
    }

    /// All events with their images
    pub async fn list_events(&self) -> EventResult<Vec<EventView>> {
        let events = self.repository.list_all().await?;
        Ok(events.into_iter().map(EventView::from).collect())
    }

    async fn discard_images(&self, images: &[NewEventImage]) {
        for image in images {
            if let Err(err) = self.image_store.remove(&image.image_path).await {
                tracing::warn!(path = %image.image_path, error = %err, "Failed to remove orphaned image");
            }
        }
    }
}

/// Stored position of the image at `index`; must fit the `position` column
fn image_position(index: usize) -> EventResult<i32> {
    i32::try_from(index).map_err(|_| EventError::invalid(vec!["images".into()]))
}

/// Parse both bounds, listing each unparseable one; `end` may not precede `start`
fn parse_window(start: &str, end: &str) -> EventResult<(DateTime<Utc>, DateTime<Utc>)> {
    match (parse_timestamp(start), parse_timestamp(end)) {
        (Some(start), Some(end)) if end < start => Err(EventError::invalid(vec!["end".into()])),
        (Some(start), Some(end)) => Ok((start, end)),
        (start, end) => {
            let mut fields = Vec::new();
            if start.is_none() {
                fields.push("start".to_string());
            }
            if end.is_none() {
                fields.push("end".to_string());
            }
            Err(EventError::invalid(fields))
        }
    }
}

/// Flatten validator errors into sorted paths like `images[0].base64`
fn error_fields(errors: &ValidationErrors) -> Vec<String> {
    let mut fields = Vec::new();
    collect_fields("", errors, &mut fields);
    fields.sort();
    fields
}

fn collect_fields(prefix: &str, errors: &ValidationErrors, out: &mut Vec<String>) {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };

        match kind {
            ValidationErrorsKind::Field(_) => out.push(path),
            ValidationErrorsKind::Struct(inner) => collect_fields(&path, inner, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_fields(&format!("{path}[{index}]"), inner, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Event, ImageUpload, ValidationReason};
    use crate::repository::MockEventRepository;
    use crate::storage::{ImageStoreError, MockImageStore};
    use chrono::TimeZone;
    use mockall::predicate::eq;

    fn valid_input(images: Vec<ImageUpload>) -> CreateEvent {
        CreateEvent {
            title: Some("Launch".into()),
            description: Some("Kickoff".into()),
            start: Some("2024-01-01T10:00:00Z".into()),
            end: Some("2024-01-01T12:00:00Z".into()),
            images,
        }
    }

    fn upload(base64: &str, filename: &str) -> ImageUpload {
        ImageUpload {
            base64: Some(base64.into()),
            filename: filename.into(),
        }
    }

    fn committed(new: NewEvent) -> EventResult<Event> {
        Ok(Event::from_new(new, Utc::now()))
    }

    fn validation_fields(err: EventError) -> (ValidationReason, Vec<String>) {
        match err {
            EventError::Validation { reason, fields } => (reason, fields),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_event_without_images() {
        let mut repo = MockEventRepository::new();
        repo.expect_create()
            .withf(|new| {
                new.title == "Launch"
                    && new.images.is_empty()
                    && new.start == Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
                    && new.end == Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
            })
            .times(1)
            .returning(committed);

        let mut store = MockImageStore::new();
        store.expect_store().never();

        let service = EventService::new(repo, store);
        let id = service.create_event(valid_input(vec![])).await.unwrap();

        assert_eq!(id.get_version_num(), 7);
    }

    #[tokio::test]
    async fn test_create_event_stores_images_in_order() {
        let mut repo = MockEventRepository::new();
        repo.expect_create()
            .withf(|new| {
                new.images.len() == 2
                    && new.images[0].position == 0
                    && new.images[0].base64 == "aGVsbG8="
                    && new.images[0].image_path == "/uploads/first.png"
                    && new.images[1].position == 1
                    && new.images[1].image_path == "/uploads/second.jpg"
            })
            .times(1)
            .returning(committed);

        let mut store = MockImageStore::new();
        let mut seq = mockall::Sequence::new();
        store
            .expect_store()
            .with(eq("aGVsbG8="), eq("a.png"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("/uploads/first.png".to_string()));
        store
            .expect_store()
            .with(eq("d29ybGQ="), eq("b.jpg"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok("/uploads/second.jpg".to_string()));

        let service = EventService::new(repo, store);
        service
            .create_event(valid_input(vec![
                upload("aGVsbG8=", "a.png"),
                upload("d29ybGQ=", "b.jpg"),
            ]))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_missing_fields_fail_before_side_effects() {
        let mut repo = MockEventRepository::new();
        repo.expect_create().never();
        let mut store = MockImageStore::new();
        store.expect_store().never();

        let service = EventService::new(repo, store);
        let input = CreateEvent {
            title: None,
            description: Some(String::new()),
            images: vec![upload("aGVsbG8=", "a.png")],
            ..valid_input(vec![])
        };

        let (reason, fields) = validation_fields(service.create_event(input).await.unwrap_err());
        assert_eq!(reason, ValidationReason::Missing);
        assert_eq!(fields, vec!["description", "title"]);
    }

    #[tokio::test]
    async fn test_image_without_payload_is_reported_by_path() {
        let mut repo = MockEventRepository::new();
        repo.expect_create().never();
        let mut store = MockImageStore::new();
        store.expect_store().never();

        let service = EventService::new(repo, store);
        let input = valid_input(vec![
            upload("aGVsbG8=", "a.png"),
            ImageUpload {
                base64: None,
                filename: "b.png".into(),
            },
        ]);

        let (reason, fields) = validation_fields(service.create_event(input).await.unwrap_err());
        assert_eq!(reason, ValidationReason::Missing);
        assert_eq!(fields, vec!["images[1].base64"]);
    }

    #[tokio::test]
    async fn test_unparseable_timestamps_are_reported_as_invalid() {
        let service = EventService::new(MockEventRepository::new(), MockImageStore::new());
        let input = CreateEvent {
            start: Some("next week".into()),
            end: Some("2024-13-45".into()),
            ..valid_input(vec![])
        };

        let (reason, fields) = validation_fields(service.create_event(input).await.unwrap_err());
        assert_eq!(reason, ValidationReason::Invalid);
        assert_eq!(fields, vec!["start", "end"]);
    }

    #[tokio::test]
    async fn test_end_before_start_is_rejected() {
        let service = EventService::new(MockEventRepository::new(), MockImageStore::new());
        let input = CreateEvent {
            start: Some("2024-01-01T12:00:00Z".into()),
            end: Some("2024-01-01T10:00:00Z".into()),
            ..valid_input(vec![])
        };

        let (reason, fields) = validation_fields(service.create_event(input).await.unwrap_err());
        assert_eq!(reason, ValidationReason::Invalid);
        assert_eq!(fields, vec!["end"]);
    }

    #[test]
    fn test_image_position_must_fit_column() {
        assert_eq!(image_position(0).unwrap(), 0);
        assert_eq!(image_position(i32::MAX as usize).unwrap(), i32::MAX);

        let (reason, fields) = validation_fields(image_position(i32::MAX as usize + 1).unwrap_err());
        assert_eq!(reason, ValidationReason::Invalid);
        assert_eq!(fields, vec!["images"]);
    }

    #[tokio::test]
    async fn test_equal_start_and_end_is_accepted() {
        let mut repo = MockEventRepository::new();
        repo.expect_create().times(1).returning(committed);

        let service = EventService::new(repo, MockImageStore::new());
        let input = CreateEvent {
            end: Some("2024-01-01T10:00:00Z".into()),
            ..valid_input(vec![])
        };

        assert!(service.create_event(input).await.is_ok());
    }

    #[tokio::test]
    async fn test_decode_failure_removes_earlier_files() {
        let mut repo = MockEventRepository::new();
        repo.expect_create().never();

        let mut store = MockImageStore::new();
        store
            .expect_store()
            .with(eq("aGVsbG8="), eq("a.png"))
            .times(1)
            .returning(|_, _| Ok("/uploads/first.png".to_string()));
        store
            .expect_store()
            .with(eq("%%%"), eq("b.png"))
            .times(1)
            .returning(|_, _| Err(ImageStoreError::Decode("invalid symbol".into())));
        store
            .expect_remove()
            .with(eq("/uploads/first.png"))
            .times(1)
            .returning(|_| Ok(()));

        let service = EventService::new(repo, store);
        let err = service
            .create_event(valid_input(vec![
                upload("aGVsbG8=", "a.png"),
                upload("%%%", "b.png"),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::ImageStore(ImageStoreError::Decode(_))));
    }

    #[tokio::test]
    async fn test_commit_failure_removes_all_files() {
        let mut repo = MockEventRepository::new();
        repo.expect_create()
            .times(1)
            .returning(|_| Err(EventError::Persistence("connection lost".into())));

        let mut store = MockImageStore::new();
        store
            .expect_store()
            .times(2)
            .returning(|_, filename| Ok(format!("/uploads/{filename}")));
        store
            .expect_remove()
            .with(eq("/uploads/a.png"))
            .times(1)
            .returning(|_| Ok(()));
        store
            .expect_remove()
            .with(eq("/uploads/b.png"))
            .times(1)
            .returning(|_| Err(ImageStoreError::InvalidPath("/uploads/b.png".into())));

        let service = EventService::new(repo, store);
        let err = service
            .create_event(valid_input(vec![
                upload("aGVsbG8=", "a.png"),
                upload("d29ybGQ=", "b.png"),
            ]))
            .await
            .unwrap_err();

        assert!(matches!(err, EventError::Persistence(_)));
    }

    #[tokio::test]
    async fn test_list_events_projects_views() {
        let mut repo = MockEventRepository::new();
        repo.expect_list_all().times(1).returning(|| {
            let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
            let new = NewEvent {
                id: Uuid::now_v7(),
                title: "Launch".into(),
                description: "Kickoff".into(),
                start,
                end: start,
                images: vec![NewEventImage {
                    id: Uuid::now_v7(),
                    position: 0,
                    base64: "aGVsbG8=".into(),
                    image_path: "/uploads/a.png".into(),
                }],
            };
            Ok(vec![Event::from_new(new, start)])
        });

        let service = EventService::new(repo, MockImageStore::new());
        let views = service.list_events().await.unwrap();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].title, "Launch");
        assert_eq!(views[0].images[0].image_path, "/uploads/a.png");
    }

    #[tokio::test]
    async fn test_list_events_propagates_repository_error() {
        let mut repo = MockEventRepository::new();
        repo.expect_list_all()
            .returning(|| Err(EventError::Repository("timeout".into())));

        let service = EventService::new(repo, MockImageStore::new());
        assert!(matches!(
            service.list_events().await,
            Err(EventError::Repository(_))
        ));
    }
}
