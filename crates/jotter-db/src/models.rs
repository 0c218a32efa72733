/// Database row types — these map directly to SQLite rows.
/// Distinct from the jotter-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct BookRow {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub slug: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct EntryRow {
    pub id: String,
    pub book_id: String,
    pub occurred_at: String,
    pub kind: Option<String>,
    pub number: Option<f64>,
    /// JSON array of decimals.
    pub number_array: Option<String>,
    pub short_text: Option<String>,
    pub long_text: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}
