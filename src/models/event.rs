use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A pair of WGS84 coordinates.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Where an event takes place.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub coordinates: Coordinates,
}

/// Represents an event in the system.
///
/// Stored flat (`address`, `lat`, `lng` columns); serialized with the
/// nested `location` shape on the wire.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// The unique identifier for the event.
    pub id: Uuid,
    /// The event title.
    pub title: String,
    /// The event description.
    pub description: String,
    /// The ID of the user who created the event. Immutable after creation.
    pub organizer: Uuid,
    /// When the event takes place.
    pub date: DateTime<Utc>,
    /// The start time, `HH:MM` 24h.
    pub start_time: String,
    /// The end time, `HH:MM` 24h.
    pub end_time: String,
    /// Where the event takes place.
    pub location: Location,
    /// Lowercase tags.
    pub tags: Vec<String>,
    /// The optional attendance cap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_attendees: Option<i32>,
    /// The IDs of attending users, in RSVP order, no duplicates.
    pub attendees: Vec<Uuid>,
    /// An optional image URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Whether the event is listed.
    pub is_active: bool,
    /// The timestamp when the event was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the event was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Sort key for event listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortBy {
    Date,
    Popularity,
}

/// Sort direction for event listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// A great-circle proximity filter.
#[derive(Clone, Copy, Debug)]
pub struct GeoFilter {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

/// A fully-resolved event listing specification.
///
/// All filters compose with AND; `tags` is OR within the given set. Built
/// from the raw query string by the events handler, which degrades
/// malformed values to these defaults instead of rejecting the request.
#[derive(Clone, Debug)]
pub struct EventQuery {
    pub search: Option<String>,
    pub tags: Option<Vec<String>>,
    pub geo: Option<GeoFilter>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
    pub page: i64,
    pub limit: i64,
}

impl Default for EventQuery {
    fn default() -> Self {
        Self {
            search: None,
            tags: None,
            geo: None,
            date_from: None,
            date_to: None,
            sort_by: SortBy::Date,
            sort_order: SortOrder::Asc,
            page: 1,
            limit: 10,
        }
    }
}
