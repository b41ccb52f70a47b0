use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::event::Event;

/// Validates an event against every field constraint, collecting all
/// violations instead of stopping at the first.
///
/// # Arguments
///
/// * `event` - The event to validate, after normalization and merging.
/// * `require_future_date` - Whether `date` must be strictly in the future.
///   True at creation and whenever an update supplies a new date.
///
/// # Returns
///
/// A `Result<()>`; on failure, a validation error enumerating each
/// violated field.
pub fn validate_event(event: &Event, require_future_date: bool) -> Result<()> {
    let mut errors = Vec::new();

    if event.title.is_empty() {
        errors.push("Event title is required".to_string());
    } else if event.title.chars().count() > 100 {
        errors.push("Title cannot be more than 100 characters".to_string());
    }

    if event.description.is_empty() {
        errors.push("Event description is required".to_string());
    } else if event.description.chars().count() > 1000 {
        errors.push("Description cannot be more than 1000 characters".to_string());
    }

    if require_future_date && event.date <= Utc::now() {
        errors.push("Event date must be in the future".to_string());
    }

    if !is_valid_time(&event.start_time) {
        errors.push("Start time must be a valid time in HH:MM format".to_string());
    }

    if !is_valid_time(&event.end_time) {
        errors.push("End time must be a valid time in HH:MM format".to_string());
    }

    if event.location.address.is_empty() {
        errors.push("Event address is required".to_string());
    }

    let coords = event.location.coordinates;
    if !(-90.0..=90.0).contains(&coords.lat) {
        errors.push("Latitude must be between -90 and 90".to_string());
    }
    if !(-180.0..=180.0).contains(&coords.lng) {
        errors.push("Longitude must be between -180 and 180".to_string());
    }

    if let Some(max) = event.max_attendees {
        if max < 1 {
            errors.push("Maximum attendees must be at least 1".to_string());
        }
    }

    if let Some(url) = &event.image_url {
        if !is_valid_image_url(url) {
            errors.push("Please enter a valid image URL".to_string());
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Lowercases, trims, and drops empty tags.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Checks a 24h `HH:MM` time. The hour may be one or two digits.
fn is_valid_time(value: &str) -> bool {
    let Some((hours, minutes)) = value.split_once(':') else {
        return false;
    };
    if hours.is_empty() || hours.len() > 2 || minutes.len() != 2 {
        return false;
    }
    if !hours.chars().all(|c| c.is_ascii_digit()) || !minutes.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let (Ok(h), Ok(m)) = (hours.parse::<u8>(), minutes.parse::<u8>()) else {
        return false;
    };
    h <= 23 && m <= 59
}

/// Checks an http(s) URL pointing at an image file.
fn is_valid_image_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let Some(rest) = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
    else {
        return false;
    };
    ["jpg", "jpeg", "png", "webp", "gif"]
        .iter()
        .any(|ext| rest.len() > ext.len() + 1 && rest.ends_with(&format!(".{}", ext)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::{Coordinates, Location};
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    fn sample_event() -> Event {
        let now = Utc::now();
        Event {
            id: Uuid::new_v4(),
            title: "Park cleanup".to_string(),
            description: "Bring gloves.".to_string(),
            organizer: Uuid::new_v4(),
            date: now + Duration::days(3),
            start_time: "09:00".to_string(),
            end_time: "12:30".to_string(),
            location: Location {
                address: "1 Main St".to_string(),
                coordinates: Coordinates { lat: 52.52, lng: 13.405 },
            },
            tags: vec!["outdoors".to_string()],
            max_attendees: Some(20),
            attendees: Vec::new(),
            image_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn accepts_valid_event() {
        assert!(validate_event(&sample_event(), true).is_ok());
    }

    #[test]
    fn enforces_title_and_description_limits() {
        let mut event = sample_event();
        event.title = "x".repeat(100);
        event.description = "y".repeat(1000);
        assert!(validate_event(&event, true).is_ok());

        event.title = "x".repeat(101);
        event.description = "y".repeat(1001);
        let err = validate_event(&event, true).unwrap_err();
        match err {
            AppError::Validation(details) => {
                assert_eq!(details.len(), 2);
                assert!(details[0].contains("Title"));
                assert!(details[1].contains("Description"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_past_date_only_when_required() {
        let mut event = sample_event();
        event.date = Utc::now() - Duration::days(1);
        assert!(validate_event(&event, true).is_err());
        assert!(validate_event(&event, false).is_ok());
    }

    #[test]
    fn validates_time_format() {
        for good in ["00:00", "9:05", "09:05", "23:59"] {
            assert!(is_valid_time(good), "rejected {:?}", good);
        }
        for bad in ["24:00", "12:60", "12:5", "1230", "ab:cd", "+1:30", "", ":30", "012:30"] {
            assert!(!is_valid_time(bad), "accepted {:?}", bad);
        }
    }

    #[test]
    fn enforces_coordinate_ranges_inclusively() {
        let mut event = sample_event();
        event.location.coordinates = Coordinates { lat: 90.0, lng: -180.0 };
        assert!(validate_event(&event, true).is_ok());

        event.location.coordinates = Coordinates { lat: 90.01, lng: 180.01 };
        let err = validate_event(&event, true).unwrap_err();
        match err {
            AppError::Validation(details) => assert_eq!(details.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn enforces_positive_capacity() {
        let mut event = sample_event();
        event.max_attendees = Some(0);
        assert!(validate_event(&event, true).is_err());
        event.max_attendees = Some(1);
        assert!(validate_event(&event, true).is_ok());
        event.max_attendees = None;
        assert!(validate_event(&event, true).is_ok());
    }

    #[test]
    fn validates_image_urls() {
        for good in [
            "https://cdn.example.com/banner.png",
            "http://example.com/a/b/c.JPEG",
            "HTTPS://example.com/pic.webp",
        ] {
            assert!(is_valid_image_url(good), "rejected {:?}", good);
        }
        for bad in [
            "ftp://example.com/pic.png",
            "https://example.com/pic.svg",
            "https://.png",
            "example.com/pic.png",
            "https://example.com/picpng",
        ] {
            assert!(!is_valid_image_url(bad), "accepted {:?}", bad);
        }
    }

    #[test]
    fn normalizes_tags() {
        let tags = normalize_tags(vec![
            " Music ".to_string(),
            "FOOD".to_string(),
            "  ".to_string(),
        ]);
        assert_eq!(tags, vec!["music", "food"]);
    }
}
