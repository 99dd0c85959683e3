use crate::api::models::{Conversation, ListingSummary};
use directories::ProjectDirs;
use rusqlite::{Connection, params};
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn db_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("ma", "protrans", "ProTransGTK")?;
    let dir = proj.data_dir().to_path_buf();
    Some(dir.join("cache.sqlite"))
}

fn ensure_dir(path: &PathBuf) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn open_conn() -> rusqlite::Result<Connection> {
    let path = db_path().ok_or_else(|| rusqlite::Error::InvalidPath("no data dir".into()))?;
    let _ = ensure_dir(&path);
    Connection::open(path)
}

// Listing and conversation summaries are cached so windows can render
// immediately while the network refresh runs.
pub fn init() -> Result<(), String> {
    let conn = open_conn().map_err(|e| e.to_string())?;
    conn.execute_batch(
        r#"
        PRAGMA journal_mode = WAL;
        CREATE TABLE IF NOT EXISTS annonces (
            id TEXT PRIMARY KEY,
            titre TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            raw_json TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS conversations (
            id TEXT PRIMARY KEY,
            interlocuteur TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            raw_json TEXT NOT NULL
        );
        "#,
    )
    .map_err(|e| e.to_string())?;
    Ok(())
}

fn now_secs() -> Result<i64, String> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| e.to_string())?
        .as_secs() as i64)
}

pub fn upsert_listings(listings: &[ListingSummary]) -> Result<(), String> {
    let now = now_secs()?;
    let mut conn = open_conn().map_err(|e| e.to_string())?;
    let tx = conn.transaction().map_err(|e| e.to_string())?;
    for l in listings {
        let raw = serde_json::to_string(l).map_err(|e| e.to_string())?;
        tx.execute(
            r#"
            INSERT INTO annonces (id, titre, updated_at, raw_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                titre=excluded.titre,
                updated_at=excluded.updated_at,
                raw_json=excluded.raw_json
            "#,
            params![l.id, l.titre, now, raw],
        )
        .map_err(|e| e.to_string())?;
    }
    tx.commit().map_err(|e| e.to_string())?;
    Ok(())
}

pub fn get_listings(limit: Option<usize>) -> Result<Vec<ListingSummary>, String> {
    let conn = open_conn().map_err(|e| e.to_string())?;
    let mut stmt = conn
        .prepare("SELECT raw_json FROM annonces ORDER BY updated_at DESC, titre ASC LIMIT ?1")
        .map_err(|e| e.to_string())?;
    let lim = limit.unwrap_or(500) as i64;
    let rows = stmt
        .query_map(params![lim], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    for r in rows {
        let raw = r.map_err(|e| e.to_string())?;
        match serde_json::from_str::<ListingSummary>(&raw) {
            Ok(l) => out.push(l),
            Err(e) => log::warn!("dropping cached listing with stale shape: {e}"),
        }
    }
    Ok(out)
}

pub fn upsert_conversations(convs: &[Conversation]) -> Result<(), String> {
    let now = now_secs()?;
    let mut conn = open_conn().map_err(|e| e.to_string())?;
    let tx = conn.transaction().map_err(|e| e.to_string())?;
    for c in convs {
        let raw = serde_json::to_string(c).map_err(|e| e.to_string())?;
        tx.execute(
            r#"
            INSERT INTO conversations (id, interlocuteur, updated_at, raw_json)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                interlocuteur=excluded.interlocuteur,
                updated_at=excluded.updated_at,
                raw_json=excluded.raw_json
            "#,
            params![c.id, c.interlocuteur, now, raw],
        )
        .map_err(|e| e.to_string())?;
    }
    tx.commit().map_err(|e| e.to_string())?;
    Ok(())
}

pub fn get_conversations(limit: Option<usize>) -> Result<Vec<Conversation>, String> {
    let conn = open_conn().map_err(|e| e.to_string())?;
    let mut stmt = conn
        .prepare("SELECT raw_json FROM conversations ORDER BY updated_at DESC LIMIT ?1")
        .map_err(|e| e.to_string())?;
    let lim = limit.unwrap_or(200) as i64;
    let rows = stmt
        .query_map(params![lim], |row| row.get::<_, String>(0))
        .map_err(|e| e.to_string())?;
    let mut out = Vec::new();
    for r in rows {
        let raw = r.map_err(|e| e.to_string())?;
        match serde_json::from_str::<Conversation>(&raw) {
            Ok(c) => out.push(c),
            Err(e) => log::warn!("dropping cached conversation with stale shape: {e}"),
        }
    }
    Ok(out)
}
