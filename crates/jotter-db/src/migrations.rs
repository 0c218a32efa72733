use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          TEXT PRIMARY KEY,
            username    TEXT NOT NULL UNIQUE,
            password    TEXT NOT NULL,
            created_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS books (
            id          TEXT PRIMARY KEY,
            owner_id    TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            title       TEXT NOT NULL,
            slug        TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            created_at  TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(owner_id, slug)
        );

        CREATE INDEX IF NOT EXISTS idx_books_owner_slug
            ON books(owner_id, slug);

        -- kind is NULL only on rows imported from the legacy system; the
        -- decoder falls back to field-precedence inference for those.
        CREATE TABLE IF NOT EXISTS entries (
            id           TEXT PRIMARY KEY,
            book_id      TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
            occurred_at  TEXT NOT NULL,
            kind         TEXT,
            number       REAL,
            number_array TEXT,
            short_text   TEXT,
            long_text    TEXT,
            created_at   TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at   TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (kind IS NULL OR kind IN ('number', 'number_array', 'short_text', 'long_text'))
        );

        CREATE INDEX IF NOT EXISTS idx_entries_book_when
            ON entries(book_id, occurred_at);
        ",
    )?;

    info!("Database migrations complete");
    Ok(())
}
