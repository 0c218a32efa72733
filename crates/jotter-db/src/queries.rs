use crate::Database;
use crate::models::{BookRow, EntryRow, UserRow};
use anyhow::Result;
use jotter_core::payload::Payload;
use rusqlite::Connection;

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Log books --
    //
    // Every query here takes the owner id and filters on it in SQL. There
    // is no unscoped book accessor; a miss for any reason reads the same as
    // a book that does not exist.

    pub fn insert_book(
        &self,
        id: &str,
        owner_id: &str,
        title: &str,
        slug: &str,
        description: &str,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO books (id, owner_id, title, slug, description) VALUES (?1, ?2, ?3, ?4, ?5)",
                (id, owner_id, title, slug, description),
            )?;
            Ok(())
        })
    }

    pub fn list_books(&self, owner_id: &str) -> Result<Vec<BookRow>> {
        self.with_conn(|conn| query_books(conn, owner_id))
    }

    pub fn get_book(&self, owner_id: &str, slug: &str) -> Result<Option<BookRow>> {
        self.with_conn(|conn| query_book(conn, owner_id, slug))
    }

    /// Optimistic pre-check for the slug allocator. The UNIQUE(owner_id,
    /// slug) constraint remains the final arbiter at insert time.
    pub fn book_slug_exists(&self, owner_id: &str, slug: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM books WHERE owner_id = ?1 AND slug = ?2)",
                (owner_id, slug),
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Title and description only; the slug column is never touched.
    pub fn update_book(
        &self,
        owner_id: &str,
        slug: &str,
        title: &str,
        description: &str,
    ) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE books SET title = ?3, description = ?4, updated_at = datetime('now')
                 WHERE owner_id = ?1 AND slug = ?2",
                (owner_id, slug, title, description),
            )?;
            Ok(n > 0)
        })
    }

    /// Entries go with the book via ON DELETE CASCADE.
    pub fn delete_book(&self, owner_id: &str, slug: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM books WHERE owner_id = ?1 AND slug = ?2",
                (owner_id, slug),
            )?;
            Ok(n > 0)
        })
    }

    // -- Entries --
    //
    // Callers reach entries only through a book id they resolved with
    // get_book, so the owner filter has already been applied.

    pub fn insert_entry(
        &self,
        id: &str,
        book_id: &str,
        occurred_at: &str,
        payload: &Payload,
    ) -> Result<()> {
        let (kind, number, number_array, short_text, long_text) = payload_columns(payload)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO entries (id, book_id, occurred_at, kind, number, number_array, short_text, long_text)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![id, book_id, occurred_at, kind, number, number_array, short_text, long_text],
            )?;
            Ok(())
        })
    }

    pub fn list_entries(&self, book_id: &str) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| query_entries(conn, book_id))
    }

    pub fn get_entry(&self, book_id: &str, entry_id: &str) -> Result<Option<EntryRow>> {
        self.with_conn(|conn| query_entry(conn, book_id, entry_id))
    }

    /// Replaces the payload outright: the write covers the kind and all
    /// four value columns, so switching kinds cannot leave stale data
    /// behind. A None occurred_at keeps the stored one.
    pub fn update_entry(
        &self,
        book_id: &str,
        entry_id: &str,
        occurred_at: Option<&str>,
        payload: &Payload,
    ) -> Result<bool> {
        let (kind, number, number_array, short_text, long_text) = payload_columns(payload)?;
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "UPDATE entries
                 SET occurred_at = COALESCE(?3, occurred_at),
                     kind = ?4, number = ?5, number_array = ?6,
                     short_text = ?7, long_text = ?8,
                     updated_at = datetime('now')
                 WHERE id = ?2 AND book_id = ?1",
                rusqlite::params![book_id, entry_id, occurred_at, kind, number, number_array, short_text, long_text],
            )?;
            Ok(n > 0)
        })
    }

    pub fn delete_entry(&self, book_id: &str, entry_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let n = conn.execute(
                "DELETE FROM entries WHERE id = ?2 AND book_id = ?1",
                (book_id, entry_id),
            )?;
            Ok(n > 0)
        })
    }
}

/// Storage encoding for a payload: the kind discriminator plus the four
/// value columns, exactly one of them populated.
fn payload_columns(
    payload: &Payload,
) -> Result<(
    &'static str,
    Option<f64>,
    Option<String>,
    Option<&str>,
    Option<&str>,
)> {
    let kind = payload.kind().as_str();
    Ok(match payload {
        Payload::Number(n) => (kind, Some(*n), None, None, None),
        Payload::NumberArray(a) => (kind, None, Some(serde_json::to_string(a)?), None, None),
        Payload::ShortText(s) => (kind, None, None, Some(s.as_str()), None),
        Payload::LongText(s) => (kind, None, None, None, Some(s.as_str())),
    })
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt
        .query_row([id], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

const BOOK_COLUMNS: &str = "id, owner_id, title, slug, description, created_at, updated_at";

fn book_from_row(row: &rusqlite::Row) -> rusqlite::Result<BookRow> {
    Ok(BookRow {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        slug: row.get(3)?,
        description: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn query_books(conn: &Connection, owner_id: &str) -> Result<Vec<BookRow>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE owner_id = ?1 ORDER BY title");
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([owner_id], book_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_book(conn: &Connection, owner_id: &str, slug: &str) -> Result<Option<BookRow>> {
    let sql = format!("SELECT {BOOK_COLUMNS} FROM books WHERE owner_id = ?1 AND slug = ?2");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt.query_row((owner_id, slug), book_from_row).optional()?;

    Ok(row)
}

const ENTRY_COLUMNS: &str =
    "id, book_id, occurred_at, kind, number, number_array, short_text, long_text, created_at, updated_at";

fn entry_from_row(row: &rusqlite::Row) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        book_id: row.get(1)?,
        occurred_at: row.get(2)?,
        kind: row.get(3)?,
        number: row.get(4)?,
        number_array: row.get(5)?,
        short_text: row.get(6)?,
        long_text: row.get(7)?,
        created_at: row.get(8)?,
        updated_at: row.get(9)?,
    })
}

fn query_entries(conn: &Connection, book_id: &str) -> Result<Vec<EntryRow>> {
    let sql = format!(
        "SELECT {ENTRY_COLUMNS} FROM entries WHERE book_id = ?1
         ORDER BY occurred_at DESC, id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map([book_id], entry_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn query_entry(conn: &Connection, book_id: &str, entry_id: &str) -> Result<Option<EntryRow>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?2 AND book_id = ?1");
    let mut stmt = conn.prepare(&sql)?;

    let row = stmt
        .query_row((book_id, entry_id), entry_from_row)
        .optional()?;

    Ok(row)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::is_unique_violation;

    fn db_with_user(id: &str) -> Database {
        let db = Database::open_in_memory().unwrap();
        db.create_user(id, &format!("user-{id}"), "hash").unwrap();
        db
    }

    fn count_entries(db: &Database) -> i64 {
        db.with_conn(|conn| {
            let n = conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))?;
            Ok(n)
        })
        .unwrap()
    }

    #[test]
    fn duplicate_slug_for_owner_is_unique_violation() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();

        let err = db
            .insert_book("b2", "u1", "Trip Notes", "trip-notes", "")
            .unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn same_slug_under_different_owners_is_fine() {
        let db = db_with_user("u1");
        db.create_user("u2", "user-u2", "hash").unwrap();

        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();
        db.insert_book("b2", "u2", "Trip Notes", "trip-notes", "")
            .unwrap();

        assert!(db.get_book("u1", "trip-notes").unwrap().is_some());
        assert!(db.get_book("u2", "trip-notes").unwrap().is_some());
    }

    #[test]
    fn book_lookups_are_owner_scoped() {
        let db = db_with_user("u1");
        db.create_user("u2", "user-u2", "hash").unwrap();
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();

        assert!(db.get_book("u2", "trip-notes").unwrap().is_none());
        assert!(db.list_books("u2").unwrap().is_empty());
        assert!(!db.update_book("u2", "trip-notes", "Stolen", "").unwrap());
        assert!(!db.delete_book("u2", "trip-notes").unwrap());

        // still intact for the owner
        let book = db.get_book("u1", "trip-notes").unwrap().unwrap();
        assert_eq!(book.title, "Trip Notes");
    }

    #[test]
    fn list_books_orders_by_title() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Workouts", "workouts", "").unwrap();
        db.insert_book("b2", "u1", "Garden", "garden", "").unwrap();

        let titles: Vec<String> = db
            .list_books("u1")
            .unwrap()
            .into_iter()
            .map(|b| b.title)
            .collect();
        assert_eq!(titles, vec!["Garden", "Workouts"]);
    }

    #[test]
    fn update_book_leaves_slug_alone() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();

        assert!(db.update_book("u1", "trip-notes", "Travel Log", "now with a description").unwrap());

        let book = db.get_book("u1", "trip-notes").unwrap().unwrap();
        assert_eq!(book.title, "Travel Log");
        assert_eq!(book.slug, "trip-notes");
        assert_eq!(book.description, "now with a description");
    }

    #[test]
    fn deleting_a_book_cascades_to_entries() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();
        db.insert_entry("e1", "b1", "2026-08-01 10:00:00", &Payload::Number(1.0))
            .unwrap();
        db.insert_entry(
            "e2",
            "b1",
            "2026-08-02 10:00:00",
            &Payload::LongText("day two".into()),
        )
        .unwrap();
        assert_eq!(count_entries(&db), 2);

        assert!(db.delete_book("u1", "trip-notes").unwrap());
        assert_eq!(count_entries(&db), 0);
    }

    #[test]
    fn entries_order_newest_first() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();
        db.insert_entry("e1", "b1", "2026-08-01 10:00:00", &Payload::Number(1.0))
            .unwrap();
        db.insert_entry("e2", "b1", "2026-08-03 10:00:00", &Payload::Number(3.0))
            .unwrap();
        db.insert_entry("e3", "b1", "2026-08-02 10:00:00", &Payload::Number(2.0))
            .unwrap();

        let ids: Vec<String> = db
            .list_entries("b1")
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec!["e2", "e3", "e1"]);
    }

    #[test]
    fn entry_payload_round_trips_through_columns() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();
        db.insert_entry(
            "e1",
            "b1",
            "2026-08-01 10:00:00",
            &Payload::NumberArray(vec![1.0, 2.5, 3.0]),
        )
        .unwrap();

        let row = db.get_entry("b1", "e1").unwrap().unwrap();
        assert_eq!(row.kind.as_deref(), Some("number_array"));
        assert_eq!(row.number_array.as_deref(), Some("[1.0,2.5,3.0]"));
        assert_eq!(row.number, None);
        assert_eq!(row.short_text, None);
        assert_eq!(row.long_text, None);
    }

    #[test]
    fn switching_kinds_clears_the_old_column() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();
        db.insert_entry("e1", "b1", "2026-08-01 10:00:00", &Payload::Number(42.0))
            .unwrap();

        assert!(
            db.update_entry("b1", "e1", None, &Payload::ShortText("note".into()))
                .unwrap()
        );

        let row = db.get_entry("b1", "e1").unwrap().unwrap();
        assert_eq!(row.kind.as_deref(), Some("short_text"));
        assert_eq!(row.short_text.as_deref(), Some("note"));
        assert_eq!(row.number, None);
        // occurred_at untouched when not supplied
        assert_eq!(row.occurred_at, "2026-08-01 10:00:00");
    }

    #[test]
    fn entry_mutations_miss_under_the_wrong_book() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();
        db.insert_book("b2", "u1", "Workouts", "workouts", "").unwrap();
        db.insert_entry("e1", "b1", "2026-08-01 10:00:00", &Payload::Number(1.0))
            .unwrap();

        assert!(db.get_entry("b2", "e1").unwrap().is_none());
        assert!(!db.update_entry("b2", "e1", None, &Payload::Number(2.0)).unwrap());
        assert!(!db.delete_entry("b2", "e1").unwrap());
        assert!(db.get_entry("b1", "e1").unwrap().is_some());
    }

    #[test]
    fn legacy_rows_without_kind_are_readable() {
        let db = db_with_user("u1");
        db.insert_book("b1", "u1", "Trip Notes", "trip-notes", "")
            .unwrap();
        db.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO entries (id, book_id, occurred_at, number, short_text)
                 VALUES ('e1', 'b1', '2026-08-01 10:00:00', 7.5, 'stray')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let row = db.get_entry("b1", "e1").unwrap().unwrap();
        assert_eq!(row.kind, None);
        assert_eq!(row.number, Some(7.5));
        assert_eq!(row.short_text.as_deref(), Some("stray"));
    }
}
