//! Entry read/write operations within a generation.
//!
//! An entry is a whole-response snapshot keyed by request identity. Writes
//! replace the previous snapshot for the same identity in one statement, so
//! concurrent writers resolve as last-write-wins.

use super::connection::CacheDb;
use crate::{CacheRequest, Error};
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A stored (or storable) response: status, headers and full body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseSnapshot {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl ResponseSnapshot {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self { status, headers: Vec::new(), body: body.into() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First header value matching `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Range responses are never stored.
    pub fn is_partial(&self) -> bool {
        self.status == 206
    }
}

/// A response snapshot bound to the request identity it is stored under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub key_hash: String,
    pub method: String,
    pub url: String,
    pub response: ResponseSnapshot,
}

impl CacheEntry {
    /// Bind a response to a request.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for non-GET requests and partial
    /// (206) responses, which are never cached.
    pub fn new(request: &CacheRequest, response: ResponseSnapshot) -> Result<Self, Error> {
        if !request.is_get() {
            return Err(Error::InvalidInput(format!("only GET is cached, got {}", request.method())));
        }
        if response.is_partial() {
            return Err(Error::InvalidInput(format!("partial response for {} is not cacheable", request.url())));
        }
        Ok(Self {
            key_hash: request.identity(),
            method: request.method().to_string(),
            url: request.url().to_string(),
            response,
        })
    }
}

fn upsert(conn: &rusqlite::Connection, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
    let headers_json = serde_json::to_string(&entry.response.headers)?;
    conn.execute(
        "INSERT INTO entries (generation, key_hash, method, url, status, headers_json, body)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ON CONFLICT(generation, key_hash) DO UPDATE SET
            method = excluded.method,
            url = excluded.url,
            status = excluded.status,
            headers_json = excluded.headers_json,
            body = excluded.body",
        params![
            generation,
            &entry.key_hash,
            &entry.method,
            &entry.url,
            entry.response.status,
            headers_json,
            &entry.response.body,
        ],
    )?;
    Ok(())
}

impl CacheDb {
    /// Get the stored response for `key_hash` in `generation`.
    ///
    /// Returns None if there is no entry.
    pub async fn get_entry(&self, generation: &str, key_hash: &str) -> Result<Option<ResponseSnapshot>, Error> {
        let generation = generation.to_string();
        let key_hash = key_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ResponseSnapshot>, Error> {
                let mut stmt = conn
                    .prepare("SELECT status, headers_json, body FROM entries WHERE generation = ?1 AND key_hash = ?2")?;

                let result = stmt.query_row(params![generation, key_hash], |row| {
                    Ok((row.get::<_, u16>(0)?, row.get::<_, String>(1)?, row.get::<_, Vec<u8>>(2)?))
                });

                match result {
                    Ok((status, headers_json, body)) => {
                        let headers = serde_json::from_str(&headers_json)?;
                        Ok(Some(ResponseSnapshot { status, headers, body }))
                    }
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace a single entry.
    ///
    /// Fails if `generation` has not been opened.
    pub async fn put_entry(&self, generation: &str, entry: &CacheEntry) -> Result<(), Error> {
        let generation = generation.to_string();
        let entry = entry.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> { upsert(conn, &generation, &entry) })
            .await
            .map_err(Error::from)
    }

    /// Open `generation` and write all entries in one transaction.
    ///
    /// Either every entry is stored or none is.
    pub async fn put_entries(&self, generation: &str, entries: &[CacheEntry]) -> Result<(), Error> {
        let generation = generation.to_string();
        let entries = entries.to_vec();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT OR IGNORE INTO generations (name, created_at) VALUES (?1, ?2)",
                    params![generation, created_at],
                )?;
                for entry in &entries {
                    upsert(&tx, &generation, entry)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Number of entries stored in `generation`.
    pub async fn count_entries(&self, generation: &str) -> Result<u64, Error> {
        let generation = generation.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE generation = ?1", params![generation], |row| {
                        row.get(0)
                    })?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
