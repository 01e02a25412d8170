//! Playlist repository
//!
//! Stored playlists are addressed by `(course, name)`. The resolver looks
//! them up synchronously, so pages preload what they reference through
//! [`PlaylistRepository::load_lookup`].

use async_trait::async_trait;
use sqlx::{FromRow, Pool, Sqlite};
use tracing::{debug, warn};

use super::traits::Repository;
use crate::errors::{RepositoryError, RepositoryResult};
use crate::models::{PlaylistRecord, PlaylistUpsertRequest, ScopeId};
use crate::playlist::InMemoryPlaylistLookup;

#[derive(Debug, FromRow)]
struct PlaylistRow {
    id: i64,
    course: i64,
    name: String,
    list: String,
}

impl From<PlaylistRow> for PlaylistRecord {
    fn from(row: PlaylistRow) -> Self {
        Self {
            id: row.id,
            scope: row.course,
            name: row.name,
            list: row.list,
        }
    }
}

/// Query parameters for listing playlists
#[derive(Debug, Clone, Default)]
pub struct PlaylistQuery {
    /// Restrict to one scope
    pub scope: Option<ScopeId>,
}

impl PlaylistQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scope: ScopeId) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Repository implementation for playlists
#[derive(Clone)]
pub struct PlaylistRepository {
    pool: Pool<Sqlite>,
}

impl PlaylistRepository {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    pub async fn find_by_name(
        &self,
        scope: ScopeId,
        name: &str,
    ) -> RepositoryResult<Option<PlaylistRecord>> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            "SELECT id, course, name, list FROM playlist WHERE course = ? AND name = ?",
        )
        .bind(scope)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::query_failed("find_playlist_by_name", e.to_string()))?;

        Ok(row.map(PlaylistRecord::from))
    }

    /// Fetch every playlist of `scope` whose name is in `names`
    pub async fn find_many(
        &self,
        scope: ScopeId,
        names: &[String],
    ) -> RepositoryResult<Vec<PlaylistRecord>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; names.len()].join(", ");
        let sql = format!(
            "SELECT id, course, name, list FROM playlist WHERE course = ? AND name IN ({placeholders}) ORDER BY name"
        );
        let mut query = sqlx::query_as::<_, PlaylistRow>(&sql).bind(scope);
        for name in names {
            query = query.bind(name);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| RepositoryError::query_failed("find_playlists_by_names", e.to_string()))?;
        Ok(rows.into_iter().map(PlaylistRecord::from).collect())
    }

    /// Create the playlist or replace the list of an existing one
    pub async fn upsert(&self, request: PlaylistUpsertRequest) -> RepositoryResult<PlaylistRecord> {
        let row = sqlx::query_as::<_, PlaylistRow>(
            r#"
            INSERT INTO playlist (course, name, list)
            VALUES (?, ?, ?)
            ON CONFLICT (course, name)
            DO UPDATE SET list = excluded.list, updated_at = CURRENT_TIMESTAMP
            RETURNING id, course, name, list
            "#,
        )
        .bind(request.scope)
        .bind(request.name.trim())
        .bind(&request.list)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::query_failed("upsert_playlist", e.to_string()))?;

        debug!("Stored playlist {}:{}", row.course, row.name);
        Ok(row.into())
    }

    pub async fn list_for_scope(&self, scope: ScopeId) -> RepositoryResult<Vec<PlaylistRecord>> {
        self.find_all(PlaylistQuery::new().scope(scope)).await
    }

    /// Delete a playlist by scope and name
    pub async fn delete_by_name(&self, scope: ScopeId, name: &str) -> RepositoryResult<()> {
        let record = self.find_by_name(scope, name).await?.ok_or_else(|| {
            RepositoryError::record_not_found("playlist", "course:name", format!("{scope}:{name}"))
        })?;
        self.delete(record.id).await
    }

    /// Preload the named playlists of a scope for synchronous lookups
    ///
    /// Storage failures are logged and yield an empty lookup, so references
    /// render as unresolved rather than failing the page.
    pub async fn load_lookup(&self, scope: ScopeId, names: &[String]) -> InMemoryPlaylistLookup {
        match self.find_many(scope, names).await {
            Ok(records) => records.into_iter().collect(),
            Err(e) => {
                warn!("Playlist lookup failed for scope {}: {}", scope, e);
                InMemoryPlaylistLookup::new()
            }
        }
    }
}

#[async_trait]
impl Repository<PlaylistRecord, i64> for PlaylistRepository {
    type Query = PlaylistQuery;

    async fn find_all(&self, query: Self::Query) -> RepositoryResult<Vec<PlaylistRecord>> {
        let rows = match query.scope {
            Some(scope) => {
                sqlx::query_as::<_, PlaylistRow>(
                    "SELECT id, course, name, list FROM playlist WHERE course = ? ORDER BY name",
                )
                .bind(scope)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, PlaylistRow>(
                    "SELECT id, course, name, list FROM playlist ORDER BY course, name",
                )
                .fetch_all(&self.pool)
                .await
            }
        }
        .map_err(|e| RepositoryError::query_failed("list_playlists", e.to_string()))?;

        Ok(rows.into_iter().map(PlaylistRecord::from).collect())
    }

    async fn delete(&self, id: i64) -> RepositoryResult<()> {
        let result = sqlx::query("DELETE FROM playlist WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::query_failed("delete_playlist", e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::record_not_found("playlist", "id", id.to_string()));
        }
        Ok(())
    }
}
