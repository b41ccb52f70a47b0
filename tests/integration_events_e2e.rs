use std::time::{SystemTime, UNIX_EPOCH};
use once_cell::sync::Lazy;
use serde_json::json;

// Shared test context
struct TestContext {
    client: reqwest::Client,
    base_url: String,
}

static BASE_URL: Lazy<String> = Lazy::new(|| {
    std::env::var("TEST_BASE_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string())
});

impl TestContext {
    fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .cookie_store(true)
                .build()
                .unwrap(),
            base_url: BASE_URL.clone(),
        }
    }

    fn get_timestamp() -> u128 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    }

    async fn register_and_login(&self, name: &str, email: &str) -> String {
        let reg_response = self
            .client
            .post(format!("{}/api/auth/register", self.base_url))
            .json(&json!({
                "name": name,
                "email": email,
                "password": "SecurePass123!@#"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(reg_response.status().as_u16(), 201, "Registration failed");

        let login_response = self
            .client
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&json!({
                "email": email,
                "password": "SecurePass123!@#"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(login_response.status().as_u16(), 200, "Login failed");

        let body: serde_json::Value = login_response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    fn future_date() -> String {
        let year = 2030 + (Self::get_timestamp() % 10) as i32;
        format!("{year}-06-15T00:00:00Z")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn event_payload(title: &str, max_attendees: Option<u32>) -> Value {
        let mut payload = json!({
            "title": title,
            "description": "Test event",
            "date": TestContext::future_date(),
            "startTime": "18:00",
            "endTime": "21:00",
            "location": {
                "address": "1 Test Street",
                "coordinates": { "lat": 52.52, "lng": 13.405 }
            },
            "tags": ["Testing", "rust"]
        });
        if let Some(max) = max_attendees {
            payload["maxAttendees"] = json!(max);
        }
        payload
    }

    #[tokio::test]
    async fn test_capacity_bounded_rsvp_toggle() {
        let organizer = TestContext::new();
        let guest = TestContext::new();
        let timestamp = TestContext::get_timestamp();

        let organizer_token = organizer
            .register_and_login("Organizer", &format!("org_{}@example.com", timestamp))
            .await;
        let guest_token = guest
            .register_and_login("Guest", &format!("guest_{}@example.com", timestamp))
            .await;

        // Organizer creates an event with room for exactly one attendee.
        let create_response = organizer
            .client
            .post(format!("{}/api/events", organizer.base_url))
            .bearer_auth(&organizer_token)
            .json(&event_payload(&format!("Tiny event {}", timestamp), Some(1)))
            .send()
            .await
            .unwrap();
        assert_eq!(create_response.status().as_u16(), 201, "Event creation failed");
        let created: Value = create_response.json().await.unwrap();
        let event_id = created["event"]["id"].as_str().unwrap().to_string();
        assert!(created["event"]["attendees"].as_array().unwrap().is_empty());
        // Tags come back normalized.
        assert_eq!(created["event"]["tags"][0], "testing");

        // Organizer takes the only seat.
        let rsvp1: Value = organizer
            .client
            .post(format!("{}/api/events/{}/rsvp", organizer.base_url, event_id))
            .bearer_auth(&organizer_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(rsvp1["isAttending"], true);
        assert_eq!(rsvp1["attendeeCount"], 1);

        // The event is full: the guest is rejected without a state change.
        let rsvp2 = guest
            .client
            .post(format!("{}/api/events/{}/rsvp", guest.base_url, event_id))
            .bearer_auth(&guest_token)
            .send()
            .await
            .unwrap();
        assert_eq!(rsvp2.status().as_u16(), 400);
        let rsvp2_body: Value = rsvp2.json().await.unwrap();
        assert_eq!(rsvp2_body["kind"], "capacity_exceeded");

        // Organizer toggles off, freeing the seat.
        let rsvp3: Value = organizer
            .client
            .post(format!("{}/api/events/{}/rsvp", organizer.base_url, event_id))
            .bearer_auth(&organizer_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(rsvp3["isAttending"], false);
        assert_eq!(rsvp3["attendeeCount"], 0);

        // Now the guest fits.
        let rsvp4: Value = guest
            .client
            .post(format!("{}/api/events/{}/rsvp", guest.base_url, event_id))
            .bearer_auth(&guest_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(rsvp4["isAttending"], true);
        assert_eq!(rsvp4["attendeeCount"], 1);

        // Anonymous status check sees the true count but no membership.
        let status: Value = reqwest::Client::new()
            .get(format!("{}/api/events/{}/rsvp", organizer.base_url, event_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(status["isAttending"], false);
        assert_eq!(status["attendeeCount"], 1);
        assert_eq!(status["maxAttendees"], 1);
    }

    #[tokio::test]
    async fn test_ownership_is_enforced_on_update_and_delete() {
        let organizer = TestContext::new();
        let intruder = TestContext::new();
        let timestamp = TestContext::get_timestamp();

        let organizer_token = organizer
            .register_and_login("Owner", &format!("owner_{}@example.com", timestamp))
            .await;
        let intruder_token = intruder
            .register_and_login("Intruder", &format!("intruder_{}@example.com", timestamp))
            .await;

        let created: Value = organizer
            .client
            .post(format!("{}/api/events", organizer.base_url))
            .bearer_auth(&organizer_token)
            .json(&event_payload(&format!("Owned event {}", timestamp), None))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let event_id = created["event"]["id"].as_str().unwrap().to_string();
        let organizer_id = created["event"]["organizer"].as_str().unwrap().to_string();

        // A non-owner can neither update nor delete.
        let update = intruder
            .client
            .put(format!("{}/api/events/{}", intruder.base_url, event_id))
            .bearer_auth(&intruder_token)
            .json(&json!({ "title": "Hijacked" }))
            .send()
            .await
            .unwrap();
        assert_eq!(update.status().as_u16(), 403);

        let delete = intruder
            .client
            .delete(format!("{}/api/events/{}", intruder.base_url, event_id))
            .bearer_auth(&intruder_token)
            .send()
            .await
            .unwrap();
        assert_eq!(delete.status().as_u16(), 403);

        // The owner updates; identity and ownership survive the patch.
        let updated: Value = organizer
            .client
            .put(format!("{}/api/events/{}", organizer.base_url, event_id))
            .bearer_auth(&organizer_token)
            .json(&json!({ "title": "Renamed event" }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(updated["event"]["id"].as_str().unwrap(), event_id);
        assert_eq!(updated["event"]["organizer"].as_str().unwrap(), organizer_id);
        assert_eq!(updated["event"]["title"], "Renamed event");

        // Unauthenticated writes are rejected outright.
        let anonymous = reqwest::Client::new()
            .post(format!("{}/api/events", organizer.base_url))
            .json(&event_payload("Anonymous event", None))
            .send()
            .await
            .unwrap();
        assert_eq!(anonymous.status().as_u16(), 401);

        let owner_delete = organizer
            .client
            .delete(format!("{}/api/events/{}", organizer.base_url, event_id))
            .bearer_auth(&organizer_token)
            .send()
            .await
            .unwrap();
        assert_eq!(owner_delete.status().as_u16(), 200);

        let gone = reqwest::Client::new()
            .get(format!("{}/api/events/{}", organizer.base_url, event_id))
            .send()
            .await
            .unwrap();
        assert_eq!(gone.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn test_listing_validation_and_bad_ids() {
        let context = TestContext::new();
        let timestamp = TestContext::get_timestamp();
        let token = context
            .register_and_login("Lister", &format!("lister_{}@example.com", timestamp))
            .await;

        // Validation failures enumerate every violated field.
        let invalid = context
            .client
            .post(format!("{}/api/events", context.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "title": "",
                "description": "",
                "date": TestContext::future_date(),
                "startTime": "25:00",
                "endTime": "21:00",
                "location": {
                    "address": "",
                    "coordinates": { "lat": 95.0, "lng": 0.0 }
                }
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(invalid.status().as_u16(), 400);
        let invalid_body: Value = invalid.json().await.unwrap();
        assert_eq!(invalid_body["kind"], "validation");
        assert!(invalid_body["details"].as_array().unwrap().len() >= 4);

        // A garbage path id is a 400, not a 404.
        let bad_id = context
            .client
            .get(format!("{}/api/events/not-a-uuid", context.base_url))
            .send()
            .await
            .unwrap();
        assert_eq!(bad_id.status().as_u16(), 400);

        // Malformed paging falls back to defaults instead of failing.
        let listing = context
            .client
            .get(format!(
                "{}/api/events?page=abc&limit=zero&sortBy=nonsense",
                context.base_url
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(listing.status().as_u16(), 200);
        let listing_body: Value = listing.json().await.unwrap();
        assert_eq!(listing_body["pagination"]["page"], 1);
        assert_eq!(listing_body["pagination"]["limit"], 10);
    }

    #[tokio::test]
    async fn test_account_deletion_cascades() {
        let leaver = TestContext::new();
        let other = TestContext::new();
        let timestamp = TestContext::get_timestamp();

        let leaver_token = leaver
            .register_and_login("Leaver", &format!("leaver_{}@example.com", timestamp))
            .await;
        let other_token = other
            .register_and_login("Other", &format!("other_{}@example.com", timestamp))
            .await;

        // The leaver organizes one event and attends another.
        let owned: Value = leaver
            .client
            .post(format!("{}/api/events", leaver.base_url))
            .bearer_auth(&leaver_token)
            .json(&event_payload(&format!("Doomed event {}", timestamp), None))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let owned_id = owned["event"]["id"].as_str().unwrap().to_string();

        let others_event: Value = other
            .client
            .post(format!("{}/api/events", other.base_url))
            .bearer_auth(&other_token)
            .json(&event_payload(&format!("Surviving event {}", timestamp), None))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let surviving_id = others_event["event"]["id"].as_str().unwrap().to_string();

        let joined: Value = leaver
            .client
            .post(format!("{}/api/events/{}/rsvp", leaver.base_url, surviving_id))
            .bearer_auth(&leaver_token)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(joined["attendeeCount"], 1);

        let deleted = leaver
            .client
            .delete(format!("{}/api/user/account", leaver.base_url))
            .bearer_auth(&leaver_token)
            .send()
            .await
            .unwrap();
        assert_eq!(deleted.status().as_u16(), 200);

        // Owned events are gone; memberships elsewhere are scrubbed.
        let gone = reqwest::Client::new()
            .get(format!("{}/api/events/{}", leaver.base_url, owned_id))
            .send()
            .await
            .unwrap();
        assert_eq!(gone.status().as_u16(), 404);

        let scrubbed: Value = reqwest::Client::new()
            .get(format!("{}/api/events/{}/rsvp", leaver.base_url, surviving_id))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(scrubbed["attendeeCount"], 0);

        // The deleted identity's token no longer verifies an account.
        let verify = leaver
            .client
            .get(format!("{}/api/auth/verify", leaver.base_url))
            .bearer_auth(&leaver_token)
            .send()
            .await
            .unwrap();
        assert_eq!(verify.status().as_u16(), 401);
    }
}
