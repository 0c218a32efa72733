use chrono::{DateTime, Utc};
use jotter_core::payload::Payload;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// A named collection of entries. The owner is fixed at creation and the
/// slug never changes after it is assigned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogBook {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One timestamped record in a log book, holding exactly one payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub id: Uuid,
    pub book_id: Uuid,
    pub occurred_at: DateTime<Utc>,
    pub payload: Payload,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
