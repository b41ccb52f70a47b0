use deadpool_postgres::Pool;
use tokio_postgres::Row;
use tokio_postgres::types::ToSql;
use uuid::Uuid;
use crate::{
    error::Result,
    models::event::{Coordinates, Event, EventQuery, Location, SortBy},
};

const EVENT_COLUMNS: &str = "id, title, description, organizer, date, start_time, end_time, \
     address, lat, lng, tags, max_attendees, attendees, image_url, is_active, \
     created_at, updated_at";

/// A helper function to map a `tokio_postgres::Row` to an `Event`.
fn row_to_event(row: &Row) -> Result<Event> {
    Ok(Event {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        organizer: row.try_get("organizer")?,
        date: row.try_get("date")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        location: Location {
            address: row.try_get("address")?,
            coordinates: Coordinates {
                lat: row.try_get("lat")?,
                lng: row.try_get("lng")?,
            },
        },
        tags: row.try_get("tags")?,
        max_attendees: row.try_get("max_attendees")?,
        attendees: row.try_get("attendees")?,
        image_url: row.try_get("image_url")?,
        is_active: row.try_get("is_active")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Inserts a new event.
///
/// Timestamps come from the database defaults; the returned row is the
/// canonical state.
pub async fn insert_event(pool: &Pool, event: &Event) -> Result<Event> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            format!(
                r#"
                INSERT INTO events (id, title, description, organizer, date, start_time,
                                    end_time, address, lat, lng, tags, max_attendees,
                                    attendees, image_url, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
                RETURNING {EVENT_COLUMNS}
                "#
            )
            .as_str(),
            &[
                &event.id,
                &event.title,
                &event.description,
                &event.organizer,
                &event.date,
                &event.start_time,
                &event.end_time,
                &event.location.address,
                &event.location.coordinates.lat,
                &event.location.coordinates.lng,
                &event.tags,
                &event.max_attendees,
                &event.attendees,
                &event.image_url,
                &event.is_active,
            ],
        )
        .await?;
    row_to_event(&row)
}

/// Finds an event by its ID.
pub async fn find_by_id(pool: &Pool, event_id: &Uuid) -> Result<Option<Event>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            format!("SELECT {EVENT_COLUMNS} FROM events WHERE id = $1").as_str(),
            &[event_id],
        )
        .await?;
    row.map(|r| row_to_event(&r)).transpose()
}

/// Persists every mutable field of an event.
///
/// `organizer`, `attendees`, and `created_at` are not in the SET list, so
/// this path can never change ownership or membership, and it cannot race
/// with concurrent RSVP updates to the attendee array.
pub async fn update_event(pool: &Pool, event: &Event) -> Result<Event> {
    let client = pool.get().await?;
    let row = client
        .query_one(
            format!(
                r#"
                UPDATE events
                SET title = $2, description = $3, date = $4, start_time = $5,
                    end_time = $6, address = $7, lat = $8, lng = $9, tags = $10,
                    max_attendees = $11, image_url = $12, is_active = $13,
                    updated_at = NOW()
                WHERE id = $1
                RETURNING {EVENT_COLUMNS}
                "#
            )
            .as_str(),
            &[
                &event.id,
                &event.title,
                &event.description,
                &event.date,
                &event.start_time,
                &event.end_time,
                &event.location.address,
                &event.location.coordinates.lat,
                &event.location.coordinates.lng,
                &event.tags,
                &event.max_attendees,
                &event.image_url,
                &event.is_active,
            ],
        )
        .await?;
    row_to_event(&row)
}

/// Hard-deletes an event. Returns whether a row was removed.
pub async fn delete_event(pool: &Pool, event_id: &Uuid) -> Result<bool> {
    let client = pool.get().await?;
    let deleted = client
        .execute("DELETE FROM events WHERE id = $1", &[event_id])
        .await?;
    Ok(deleted > 0)
}

/// Runs a listing specification against the store.
///
/// Filters compose into one WHERE clause; the matching total is counted with
/// the same clause so pagination metadata and page contents can never
/// disagree. Every ordering ends with `created_at ASC` as the tie-break, so
/// repeated calls over unchanged data paginate deterministically.
///
/// # Arguments
///
/// * `pool` - The database connection pool.
/// * `query` - The resolved listing specification.
///
/// # Returns
///
/// A `Result` containing the page of events and the total match count.
pub async fn search_events(pool: &Pool, query: &EventQuery) -> Result<(Vec<Event>, i64)> {
    let client = pool.get().await?;

    // Default eligibility: listed events are active and not in the past.
    let mut conditions: Vec<String> = vec![
        "is_active = TRUE".to_string(),
        "date >= NOW()".to_string(),
    ];
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::new();

    let search_pattern = query.search.as_ref().map(|term| format!("%{}%", term));
    if let Some(pattern) = &search_pattern {
        params.push(pattern);
        let n = params.len();
        conditions.push(format!(
            "(title ILIKE ${n} OR description ILIKE ${n} \
             OR EXISTS (SELECT 1 FROM unnest(tags) AS tag WHERE tag ILIKE ${n}))"
        ));
    }

    if let Some(tags) = &query.tags {
        params.push(tags);
        conditions.push(format!("tags && ${}", params.len()));
    }

    // Haversine distance in kilometers; 12742 is the Earth's diameter.
    // The same expression drives both the radius filter (boundary
    // inclusive) and, when present, the hard nearest-first ordering.
    let mut distance_expr = None;
    if let Some(geo) = &query.geo {
        params.push(&geo.lat);
        let lat_p = params.len();
        params.push(&geo.lng);
        let lng_p = params.len();
        let expr = format!(
            "(12742.0 * asin(sqrt(power(sin(radians(${lat_p} - lat) / 2), 2) \
             + cos(radians(lat)) * cos(radians(${lat_p})) \
             * power(sin(radians(${lng_p} - lng) / 2), 2))))"
        );
        params.push(&geo.radius_km);
        conditions.push(format!("{expr} <= ${}", params.len()));
        distance_expr = Some(expr);
    }

    if let Some(from) = &query.date_from {
        params.push(from);
        conditions.push(format!("date >= ${}", params.len()));
    }
    if let Some(to) = &query.date_to {
        params.push(to);
        conditions.push(format!("date <= ${}", params.len()));
    }

    let where_clause = conditions.join(" AND ");

    let total: i64 = client
        .query_one(
            format!("SELECT COUNT(*) FROM events WHERE {where_clause}").as_str(),
            &params,
        )
        .await?
        .try_get(0)?;

    let order_clause = match &distance_expr {
        Some(expr) => format!("{expr} ASC, created_at ASC"),
        None => match query.sort_by {
            SortBy::Date => format!("date {}, created_at ASC", query.sort_order.sql()),
            SortBy::Popularity => format!(
                "cardinality(attendees) {}, created_at ASC",
                query.sort_order.sql()
            ),
        },
    };

    let offset = (query.page - 1) * query.limit;
    params.push(&query.limit);
    let limit_p = params.len();
    params.push(&offset);
    let offset_p = params.len();

    let rows = client
        .query(
            format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE {where_clause} \
                 ORDER BY {order_clause} LIMIT ${limit_p} OFFSET ${offset_p}"
            )
            .as_str(),
            &params,
        )
        .await?;

    let events = rows.iter().map(row_to_event).collect::<Result<Vec<_>>>()?;
    Ok((events, total))
}

/// Lists every event owned by an organizer, soonest first.
///
/// Dashboard view: eligibility is not applied, so past and deactivated
/// events stay visible to their owner.
pub async fn find_by_organizer(pool: &Pool, organizer: &Uuid) -> Result<Vec<Event>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            format!(
                "SELECT {EVENT_COLUMNS} FROM events WHERE organizer = $1 \
                 ORDER BY date ASC, created_at ASC"
            )
            .as_str(),
            &[organizer],
        )
        .await?;
    rows.iter().map(row_to_event).collect()
}

/// Lists every event a user attends but does not organize, soonest first.
pub async fn find_attending(pool: &Pool, user_id: &Uuid) -> Result<Vec<Event>> {
    let client = pool.get().await?;
    let rows = client
        .query(
            format!(
                "SELECT {EVENT_COLUMNS} FROM events \
                 WHERE attendees @> ARRAY[$1::uuid] AND organizer <> $1 \
                 ORDER BY date ASC, created_at ASC"
            )
            .as_str(),
            &[user_id],
        )
        .await?;
    rows.iter().map(row_to_event).collect()
}

/// Appends a user to an event's attendee list, capacity permitting.
///
/// Membership check, capacity check, and append happen in one conditional
/// UPDATE, so two concurrent RSVPs cannot both pass the capacity check and
/// the list can never hold duplicates.
///
/// # Returns
///
/// `Some(attendee_count)` when the append happened; `None` when the
/// condition did not hold (already a member, or the event is full).
pub async fn add_attendee(pool: &Pool, event_id: &Uuid, user_id: &Uuid) -> Result<Option<i32>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            UPDATE events
            SET attendees = array_append(attendees, $2), updated_at = NOW()
            WHERE id = $1
              AND NOT (attendees @> ARRAY[$2::uuid])
              AND (max_attendees IS NULL OR cardinality(attendees) < max_attendees)
            RETURNING cardinality(attendees)
            "#,
            &[event_id, user_id],
        )
        .await?;
    row.map(|r| r.try_get(0)).transpose().map_err(Into::into)
}

/// Removes a user from an event's attendee list.
///
/// # Returns
///
/// `Some(attendee_count)` when the event exists; removal of an absent
/// member is a no-op that still reports the current count.
pub async fn remove_attendee(pool: &Pool, event_id: &Uuid, user_id: &Uuid) -> Result<Option<i32>> {
    let client = pool.get().await?;
    let row = client
        .query_opt(
            r#"
            UPDATE events
            SET attendees = array_remove(attendees, $2), updated_at = NOW()
            WHERE id = $1
            RETURNING cardinality(attendees)
            "#,
            &[event_id, user_id],
        )
        .await?;
    row.map(|r| r.try_get(0)).transpose().map_err(Into::into)
}
