/// Durable client state.
///
/// A small key/value table holding the username and the current room
/// membership, so a restarted client can pick up where it left off.

use crate::error::Result;
use crate::models::RoomCode;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const USERNAME_KEY: &str = "username";
pub const ROOM_CODE_KEY: &str = "roomCode";
pub const IS_HOST_KEY: &str = "isHost";

/// Local storage manager for SQLite database
pub struct LocalStore {
    conn: Connection,
}

impl LocalStore {
    /// Open (or create) the store at the given database path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::initialize(&conn)?;
        Ok(Self { conn })
    }

    /// Store that lives only as long as this value
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::initialize(&conn)?;
        Ok(Self { conn })
    }

    fn initialize(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS client_state (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM client_state WHERE key = ?1",
                (key,),
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO client_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
            (key, value, updated_at),
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM client_state WHERE key = ?1", (key,))?;
        Ok(())
    }

    pub fn username(&self) -> Result<Option<String>> {
        self.get(USERNAME_KEY)
    }

    pub fn set_username(&self, username: &str) -> Result<()> {
        self.set(USERNAME_KEY, username)
    }

    /// The persisted room, if any. A stored code that no longer parses is
    /// treated as absent.
    pub fn room_code(&self) -> Result<Option<RoomCode>> {
        Ok(self
            .get(ROOM_CODE_KEY)?
            .and_then(|raw| RoomCode::parse(&raw).ok()))
    }

    pub fn is_host(&self) -> Result<bool> {
        Ok(self.get(IS_HOST_KEY)?.as_deref() == Some("true"))
    }

    /// Persist the room code and host flag together
    pub fn set_room(&mut self, room_code: &RoomCode, is_host: bool) -> Result<()> {
        let updated_at = chrono::Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO client_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
            (ROOM_CODE_KEY, room_code.as_str(), &updated_at),
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO client_state (key, value, updated_at) VALUES (?1, ?2, ?3)",
            (IS_HOST_KEY, if is_host { "true" } else { "false" }, &updated_at),
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn clear_room(&self) -> Result<()> {
        self.conn.execute(
            "DELETE FROM client_state WHERE key IN (?1, ?2)",
            (ROOM_CODE_KEY, IS_HOST_KEY),
        )?;
        Ok(())
    }
}
