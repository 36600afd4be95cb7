//! Session history persistence.
//!
//! History lives in the key-value store as one JSON array under
//! [`KEY_HISTORY`]. Loading is forgiving: unreadable entries are skipped and
//! an unreadable array is treated as an empty history.

use crate::store::{KeyValueStore, KEY_HISTORY};
use crate::{Result, SessionLog};

/// Load the full history, in stored (insertion) order
///
/// Only storage failures are errors. Malformed JSON is logged and recovered
/// from locally.
pub fn load_history<S: KeyValueStore + ?Sized>(store: &S) -> Result<Vec<SessionLog>> {
    let Some(raw) = store.get(KEY_HISTORY)? else {
        tracing::debug!("No session history stored");
        return Ok(Vec::new());
    };

    Ok(parse_history(&raw))
}

/// Parse a stored history value, dropping anything unreadable
pub fn parse_history(raw: &str) -> Vec<SessionLog> {
    let values = match serde_json::from_str::<Vec<serde_json::Value>>(raw) {
        Ok(values) => values,
        Err(e) => {
            tracing::warn!("Failed to parse session history: {}. Starting empty.", e);
            return Vec::new();
        }
    };

    let mut sessions = Vec::with_capacity(values.len());
    for (idx, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<SessionLog>(value) {
            Ok(log) => sessions.push(log),
            Err(e) => {
                tracing::warn!("Skipping unreadable history entry {}: {}", idx, e);
            }
        }
    }

    tracing::debug!("Loaded {} sessions from history", sessions.len());
    sessions
}

/// Append one completed session and return the new history
///
/// The read and the write happen as one store update, so concurrent
/// appenders never drop each other's sessions.
pub fn append_session<S: KeyValueStore + ?Sized>(
    store: &mut S,
    log: &SessionLog,
) -> Result<Vec<SessionLog>> {
    let mut history = Vec::new();
    store.modify(KEY_HISTORY, &mut |raw: Option<String>| {
        history = raw.as_deref().map(parse_history).unwrap_or_default();
        history.push(log.clone());
        Ok(serde_json::to_string(&history)?)
    })?;

    tracing::info!(
        "Recorded session '{}' ({}s, {} cycles)",
        log.protocol_name,
        log.total_time,
        log.cycles_completed
    );
    Ok(history)
}
