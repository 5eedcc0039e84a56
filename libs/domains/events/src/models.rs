use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Naive formats accepted besides RFC 3339; read as UTC
const NAIVE_TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a request timestamp
///
/// Accepts RFC 3339 with any offset (normalized to UTC) and the naive
/// `YYYY-MM-DDTHH:MM:SS` / `YYYY-MM-DD HH:MM:SS` forms.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }

    NAIVE_TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(|naive| naive.and_utc())
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ===== Requests =====

/// Body of `POST /api/event/new`
///
/// Fields are optional at the serde level so that absent and empty values
/// are both reported by validation rather than as a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateEvent {
    #[validate(required, length(min = 1))]
    #[schema(example = "Launch")]
    pub title: Option<String>,

    #[validate(required, length(min = 1))]
    #[schema(example = "Kickoff")]
    pub description: Option<String>,

    #[validate(required, length(min = 1))]
    #[schema(example = "2024-01-01T10:00:00Z")]
    pub start: Option<String>,

    #[validate(required, length(min = 1))]
    #[schema(example = "2024-01-01T12:00:00Z")]
    pub end: Option<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(nested)]
    pub images: Vec<ImageUpload>,
}

/// An image embedded in a create request
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, ToSchema)]
pub struct ImageUpload {
    /// Standard base64, optionally with a `data:<mime>;base64,` header
    #[validate(required, length(min = 1))]
    #[schema(example = "aGVsbG8=")]
    pub base64: Option<String>,

    /// Only the extension is used
    #[serde(default)]
    #[schema(example = "a.png")]
    pub filename: String,
}

// ===== Aggregate =====

/// Event plus images, built in memory and committed in one unit
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub images: Vec<NewEventImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewEventImage {
    pub id: Uuid,
    pub position: i32,
    pub base64: String,
    pub image_path: String,
}

/// A committed event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Ordered by `position`
    pub images: Vec<EventImage>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventImage {
    pub id: Uuid,
    pub event_id: Uuid,
    pub position: i32,
    pub base64: String,
    pub image_path: String,
}

impl Event {
    /// Materialize a committed event from its aggregate
    pub fn from_new(new: NewEvent, created_at: DateTime<Utc>) -> Self {
        let event_id = new.id;
        Self {
            id: new.id,
            title: new.title,
            description: new.description,
            start: new.start,
            end: new.end,
            created_at,
            images: new
                .images
                .into_iter()
                .map(|image| EventImage {
                    id: image.id,
                    event_id,
                    position: image.position,
                    base64: image.base64,
                    image_path: image.image_path,
                })
                .collect(),
        }
    }
}

// ===== Views =====

/// Element of `GET /api/event/all`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub images: Vec<EventImageView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventImageView {
    pub id: Uuid,
    /// Payload exactly as submitted
    pub base64: String,
    /// Public path of the stored file
    #[schema(example = "/uploads/0192f0c1a2b37c4d8e9fa0b1c2d3e4f5.png")]
    pub image_path: String,
}

impl From<EventImage> for EventImageView {
    fn from(image: EventImage) -> Self {
        Self {
            id: image.id,
            base64: image.base64,
            image_path: image.image_path,
        }
    }
}

impl From<Event> for EventView {
    fn from(event: Event) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            start: event.start,
            end: event.end,
            images: event.images.into_iter().map(Into::into).collect(),
        }
    }
}

/// Why the listed fields were rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ValidationReason {
    /// Absent, null or empty
    Missing,
    /// Present but unusable (unparseable timestamp, `end` before `start`)
    Invalid,
}

/// `{status, message}` body used by the create endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    #[schema(example = "success")]
    pub status: String,
    #[schema(example = "Event created")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ValidationReason>,
}

impl StatusResponse {
    pub fn created(id: Uuid) -> Self {
        Self {
            status: "success".to_string(),
            message: "Event created".to_string(),
            id: Some(id),
            fields: None,
            reason: None,
        }
    }

    pub fn error(message: impl Into<String>, fields: Option<Vec<String>>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
            id: None,
            fields,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: ValidationReason) -> Self {
        self.reason = Some(reason);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_parse_timestamp_rfc3339() {
        let expected = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();

        assert_eq!(parse_timestamp("2024-01-01T10:00:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-01-01T12:00:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("  2024-01-01T10:00:00Z "), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_naive_is_utc() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 8, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-05T08:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 08:30:00"), Some(expected));
    }

    #[test]
    fn test_parse_timestamp_rejects_garbage() {
        assert_eq!(parse_timestamp("tomorrow"), None);
        assert_eq!(parse_timestamp("2024-13-01T10:00:00Z"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_create_event_images_null_or_absent() {
        let absent: CreateEvent = serde_json::from_value(json!({"title": "t"})).unwrap();
        assert!(absent.images.is_empty());

        let null: CreateEvent =
            serde_json::from_value(json!({"title": "t", "images": null})).unwrap();
        assert!(null.images.is_empty());
    }

    #[test]
    fn test_image_upload_filename_defaults_to_empty() {
        let upload: ImageUpload = serde_json::from_value(json!({"base64": "aGVsbG8="})).unwrap();
        assert_eq!(upload.filename, "");
        assert!(upload.validate().is_ok());
    }

    #[test]
    fn test_create_event_validation_flags_missing_and_empty() {
        let input = CreateEvent {
            title: Some(String::new()),
            description: None,
            start: Some("2024-01-01T10:00:00Z".into()),
            end: Some("2024-01-01T12:00:00Z".into()),
            images: vec![],
        };

        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("description"));
        assert!(!fields.contains_key("start"));
    }

    #[test]
    fn test_event_image_view_uses_camel_case() {
        let view = EventImageView {
            id: Uuid::nil(),
            base64: "aGVsbG8=".into(),
            image_path: "/uploads/x.png".into(),
        };

        let value = serde_json::to_value(view).unwrap();
        assert_eq!(value["imagePath"], "/uploads/x.png");
        assert!(value.get("image_path").is_none());
    }

    #[test]
    fn test_status_response_shapes() {
        let id = Uuid::now_v7();
        let created = serde_json::to_value(StatusResponse::created(id)).unwrap();
        assert_eq!(
            created,
            json!({"status": "success", "message": "Event created", "id": id})
        );

        let error = serde_json::to_value(StatusResponse::error("Invalid image data", None)).unwrap();
        assert_eq!(error, json!({"status": "error", "message": "Invalid image data"}));

        let rejected = StatusResponse::error("Missing data", Some(vec!["end".into()]))
            .with_reason(ValidationReason::Invalid);
        assert_eq!(
            serde_json::to_value(rejected).unwrap(),
            json!({"status": "error", "message": "Missing data", "fields": ["end"], "reason": "invalid"})
        );
    }

    #[test]
    fn test_event_from_new_links_images() {
        let event_id = Uuid::now_v7();
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
        let new = NewEvent {
            id: event_id,
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

        let event = Event::from_new(new, start);
        assert_eq!(event.images[0].event_id, event_id);
        assert_eq!(event.created_at, start);
    }
}
