//! Namespace and entry operations on the SQLite store.

use async_trait::async_trait;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::store::{CacheStore, StoredResponse};
use crate::Error;
use crate::http::{RequestKey, ResponseType};

fn ensure_namespace(conn: &rusqlite::Connection, namespace: &str) -> Result<(), Error> {
    conn.execute(
        "INSERT OR IGNORE INTO namespaces (name, created_at) VALUES (?1, ?2)",
        params![namespace, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

#[async_trait]
impl CacheStore for CacheDb {
    async fn open(&self, namespace: &str) -> Result<(), Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> { ensure_namespace(conn, &namespace) })
            .await
            .map_err(Error::from)
    }

    async fn get(&self, namespace: &str, key: &RequestKey) -> Result<Option<StoredResponse>, Error> {
        let namespace = namespace.to_string();
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<Option<StoredResponse>, Error> {
                let row = conn
                    .query_row(
                        "SELECT url, response_url, status, status_text, headers_json, response_type, body, stored_at
                         FROM entries WHERE namespace = ?1 AND key_hash = ?2",
                        params![namespace, hash],
                        |row| {
                            Ok((
                                row.get::<_, String>(0)?,
                                row.get::<_, Option<String>>(1)?,
                                row.get::<_, u16>(2)?,
                                row.get::<_, String>(3)?,
                                row.get::<_, String>(4)?,
                                row.get::<_, String>(5)?,
                                row.get::<_, Vec<u8>>(6)?,
                                row.get::<_, String>(7)?,
                            ))
                        },
                    )
                    .optional()?;

                let Some((key_url, response_url, status, status_text, headers_json, response_type, body, stored_at)) =
                    row
                else {
                    return Ok(None);
                };

                let headers =
                    serde_json::from_str(&headers_json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;
                let response_type = response_type.parse::<ResponseType>().map_err(Error::CorruptEntry)?;

                Ok(Some(StoredResponse {
                    url: Some(response_url.unwrap_or(key_url)),
                    status,
                    status_text,
                    headers,
                    response_type,
                    body,
                    stored_at,
                }))
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, namespace: &str, key: &RequestKey, response: StoredResponse) -> Result<(), Error> {
        let namespace = namespace.to_string();
        let hash = key.hash();
        let method = key.method.clone();
        let url = key.url.to_string();
        let headers_json =
            serde_json::to_string(&response.headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))?;

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_namespace(&tx, &namespace)?;
                tx.execute(
                    "INSERT INTO entries (
                        namespace, key_hash, method, url, status, status_text,
                        headers_json, body, response_type, stored_at, response_url
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                    ON CONFLICT(namespace, key_hash) DO UPDATE SET
                        response_url = excluded.response_url,
                        status = excluded.status,
                        status_text = excluded.status_text,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        response_type = excluded.response_type,
                        stored_at = excluded.stored_at",
                    params![
                        namespace,
                        hash,
                        method,
                        url,
                        response.status,
                        response.status_text,
                        headers_json,
                        response.body,
                        response.response_type.as_str(),
                        response.stored_at,
                        response.url,
                    ],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, namespace: &str, key: &RequestKey) -> Result<bool, Error> {
        let namespace = namespace.to_string();
        let hash = key.hash();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute(
                    "DELETE FROM entries WHERE namespace = ?1 AND key_hash = ?2",
                    params![namespace, hash],
                )?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self, namespace: &str) -> Result<Vec<RequestKey>, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM entries WHERE namespace = ?1 ORDER BY stored_at, url")?;
                let rows = stmt
                    .query_map(params![namespace], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
                    .collect::<Result<Vec<_>, _>>()?;

                rows.into_iter()
                    .map(|(method, url)| {
                        let url = url::Url::parse(&url).map_err(|e| Error::CorruptEntry(format!("url {url}: {e}")))?;
                        Ok(RequestKey::new(&method, url))
                    })
                    .collect()
            })
            .await
            .map_err(Error::from)
    }

    async fn namespaces(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM namespaces ORDER BY name")?;
                let names = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<bool, Error> {
        let namespace = namespace.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM namespaces WHERE name = ?1", params![namespace])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }
}
