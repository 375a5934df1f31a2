use crate::config::StorageConfig;
use crate::error::{FlashtutorError, Result};
use crate::providers::Role;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

pub mod types;
pub use types::{ConversationTurn, Flashcard, FlashcardSet, FlashcardSetSummary};

/// Persistence for flashcard sets
///
/// Sets are immutable once created; there is no update or delete.
#[async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Store a new set and return its id
    async fn create(&self, topic: &str, flashcards: &[Flashcard]) -> Result<String>;

    /// Fetch one set with its cards
    async fn get(&self, id: &str) -> Result<Option<FlashcardSet>>;

    /// List `{id, topic}` for every set, oldest first
    async fn list_summaries(&self) -> Result<Vec<FlashcardSetSummary>>;
}

/// Append-only persistence for conversation turns
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Append one turn
    async fn append(&self, turn: &ConversationTurn) -> Result<()>;

    /// Append several turns atomically: either all are stored or none
    async fn append_many(&self, turns: &[ConversationTurn]) -> Result<()>;

    /// All turns of a conversation by ascending timestamp, then insertion order
    async fn list_by_conversation(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>>;
}

/// SQLite-backed implementation of both stores
///
/// Holds one connection for the life of the process. Queries run on the
/// blocking thread pool so they never stall the async runtime.
#[derive(Clone)]
pub struct SqliteStorage {
    db_path: PathBuf,
    conn: Arc<Mutex<Connection>>,
}

impl std::fmt::Debug for SqliteStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStorage")
            .field("db_path", &self.db_path)
            .finish()
    }
}

fn persistence_err(context: &'static str) -> impl FnOnce(rusqlite::Error) -> FlashtutorError {
    move |e| FlashtutorError::Persistence(format!("{}: {}", context, e))
}

/// Fixed-width RFC 3339 so lexical order in SQL equals chronological order
fn encode_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn decode_timestamp(raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
}

impl SqliteStorage {
    /// Open the database named by configuration
    ///
    /// Falls back to `flashtutor.db` in the user's data directory when no
    /// path is configured.
    pub fn new(config: &StorageConfig) -> Result<Self> {
        if let Some(path) = &config.db_path {
            return Self::new_with_path(path.clone());
        }

        let proj_dirs = ProjectDirs::from("com", "flashtutor", "flashtutor").ok_or_else(|| {
            FlashtutorError::Persistence("Could not determine data directory".into())
        })?;

        Self::new_with_path(proj_dirs.data_dir().join("flashtutor.db"))
    }

    /// Open (or create) the database at the given path
    ///
    /// # Examples
    ///
    /// ```
    /// use flashtutor::storage::SqliteStorage;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let storage = SqliteStorage::new_with_path(dir.path().join("test.db")).unwrap();
    /// ```
    pub fn new_with_path<P: Into<PathBuf>>(db_path: P) -> Result<Self> {
        let db_path = db_path.into();

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                FlashtutorError::Persistence(format!(
                    "Failed to create parent directory for database: {}",
                    e
                ))
            })?;
        }

        let conn = Connection::open(&db_path).map_err(persistence_err("Failed to open database"))?;
        Self::init(&conn)?;

        tracing::info!("Opened flashcard database at {}", db_path.display());

        Ok(Self {
            db_path,
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Path of the backing database file
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn init(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS flashcard_sets (
                id TEXT PRIMARY KEY,
                topic TEXT NOT NULL,
                created_at TEXT NOT NULL,
                flashcards JSON NOT NULL
            );
            CREATE TABLE IF NOT EXISTS conversation_turns (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                conversation_id TEXT NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_turns_conversation
                ON conversation_turns (conversation_id, timestamp, seq);",
        )
        .map_err(persistence_err("Failed to create tables"))?;
        Ok(())
    }

    /// Run a closure against the shared connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> std::result::Result<T, FlashtutorError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let outcome = tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock().map_err(|_| {
                FlashtutorError::Persistence("Database connection lock poisoned".to_string())
            })?;
            f(&mut guard)
        })
        .await
        .map_err(|e| FlashtutorError::Persistence(format!("Database task failed: {}", e)))?;

        Ok(outcome?)
    }
}

#[async_trait]
impl FlashcardStore for SqliteStorage {
    async fn create(&self, topic: &str, flashcards: &[Flashcard]) -> Result<String> {
        let id = uuid::Uuid::new_v4().to_string();
        let topic = topic.to_string();
        let flashcards_json = serde_json::to_string(flashcards).map_err(|e| {
            FlashtutorError::Persistence(format!("Failed to serialize flashcards: {}", e))
        })?;
        let created_at = encode_timestamp(&Utc::now());

        let row_id = id.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO flashcard_sets (id, topic, created_at, flashcards)
                VALUES (?, ?, ?, ?)",
                params![row_id, topic, created_at, flashcards_json],
            )
            .map_err(persistence_err("Failed to insert flashcard set"))?;
            Ok(())
        })
        .await?;

        tracing::debug!(set_id = %id, "Stored flashcard set");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<FlashcardSet>> {
        let id = id.to_string();
        self.with_conn(move |conn| {
            let row = conn
                .query_row(
                    "SELECT id, topic, created_at, flashcards FROM flashcard_sets WHERE id = ?",
                    params![id],
                    |row| {
                        let id: String = row.get(0)?;
                        let topic: String = row.get(1)?;
                        let created_at: String = row.get(2)?;
                        let flashcards_json: String = row.get(3)?;
                        Ok((id, topic, decode_timestamp(&created_at)?, flashcards_json))
                    },
                )
                .optional()
                .map_err(persistence_err("Failed to query flashcard set"))?;

            match row {
                Some((id, topic, created_at, flashcards_json)) => {
                    let flashcards = serde_json::from_str(&flashcards_json).map_err(|e| {
                        FlashtutorError::Persistence(format!(
                            "Failed to deserialize flashcards: {}",
                            e
                        ))
                    })?;
                    Ok(Some(FlashcardSet {
                        id,
                        topic,
                        flashcards,
                        created_at,
                    }))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn list_summaries(&self) -> Result<Vec<FlashcardSetSummary>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, topic FROM flashcard_sets ORDER BY created_at ASC, rowid ASC")
                .map_err(persistence_err("Failed to prepare statement"))?;

            let rows = stmt
                .query_map([], |row| {
                    Ok(FlashcardSetSummary {
                        id: row.get(0)?,
                        topic: row.get(1)?,
                    })
                })
                .map_err(persistence_err("Failed to query flashcard sets"))?;

            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(persistence_err("Failed to read flashcard set row"))
        })
        .await
    }
}

#[async_trait]
impl ConversationStore for SqliteStorage {
    async fn append(&self, turn: &ConversationTurn) -> Result<()> {
        self.append_many(std::slice::from_ref(turn)).await
    }

    async fn append_many(&self, turns: &[ConversationTurn]) -> Result<()> {
        let rows: Vec<(String, &'static str, String, String)> = turns
            .iter()
            .map(|turn| {
                (
                    turn.conversation_id.clone(),
                    turn.role.as_str(),
                    turn.content.clone(),
                    encode_timestamp(&turn.timestamp),
                )
            })
            .collect();

        self.with_conn(move |conn| {
            let tx = conn
                .transaction()
                .map_err(persistence_err("Failed to begin transaction"))?;
            for (conversation_id, role, content, timestamp) in &rows {
                tx.execute(
                    "INSERT INTO conversation_turns (conversation_id, role, content, timestamp)
                    VALUES (?, ?, ?, ?)",
                    params![conversation_id, role, content, timestamp],
                )
                .map_err(persistence_err("Failed to insert conversation turn"))?;
            }
            tx.commit()
                .map_err(persistence_err("Failed to commit conversation turns"))?;
            Ok(())
        })
        .await
    }

    async fn list_by_conversation(&self, conversation_id: &str) -> Result<Vec<ConversationTurn>> {
        let conversation_id = conversation_id.to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT conversation_id, role, content, timestamp
                    FROM conversation_turns
                    WHERE conversation_id = ?
                    ORDER BY timestamp ASC, seq ASC",
                )
                .map_err(persistence_err("Failed to prepare statement"))?;

            let rows = stmt
                .query_map(params![conversation_id], |row| {
                    let conversation_id: String = row.get(0)?;
                    let role: String = row.get(1)?;
                    let content: String = row.get(2)?;
                    let timestamp: String = row.get(3)?;
                    let role = role.parse::<Role>().map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(
                            1,
                            rusqlite::types::Type::Text,
                            Box::new(e),
                        )
                    })?;
                    Ok(ConversationTurn {
                        conversation_id,
                        role,
                        content,
                        timestamp: decode_timestamp(&timestamp)?,
                    })
                })
                .map_err(persistence_err("Failed to query conversation turns"))?;

            rows.collect::<rusqlite::Result<Vec<_>>>()
                .map_err(persistence_err("Failed to read conversation turn row"))
        })
        .await
    }
}
