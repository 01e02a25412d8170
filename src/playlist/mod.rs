//! Named playlist lookup
//!
//! The resolver expands `rtmp://playlist=<name>` references through a
//! [`PlaylistLookup`]. Lookups are synchronous: storage-backed callers load
//! the playlists a page references up front (see
//! [`crate::repositories::PlaylistRepository::find_many`]) and hand the
//! resolver an [`InMemoryPlaylistLookup`], wrapped in a
//! [`MemoizedPlaylistLookup`] for the duration of one page render.

use std::cell::RefCell;
use std::collections::HashMap;
use tracing::debug;

use crate::models::{PlaylistRecord, ScopeId};

/// Source of stored playlists, keyed by scope and name
///
/// Implementations report backend failures (including a missing table) as
/// `None`; a lookup never aborts a page render.
pub trait PlaylistLookup {
    fn find_playlist(&self, scope: ScopeId, name: &str) -> Option<PlaylistRecord>;
}

impl<F> PlaylistLookup for F
where
    F: Fn(ScopeId, &str) -> Option<PlaylistRecord>,
{
    fn find_playlist(&self, scope: ScopeId, name: &str) -> Option<PlaylistRecord> {
        self(scope, name)
    }
}

/// Lookup that never finds anything, for hosts without playlist storage
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPlaylists;

impl PlaylistLookup for NoPlaylists {
    fn find_playlist(&self, _scope: ScopeId, _name: &str) -> Option<PlaylistRecord> {
        None
    }
}

/// Playlists held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlaylistLookup {
    playlists: HashMap<(ScopeId, String), PlaylistRecord>,
}

impl InMemoryPlaylistLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, record: PlaylistRecord) {
        self.playlists
            .insert((record.scope, record.name.clone()), record);
    }

    pub fn len(&self) -> usize {
        self.playlists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.playlists.is_empty()
    }
}

impl FromIterator<PlaylistRecord> for InMemoryPlaylistLookup {
    fn from_iter<I: IntoIterator<Item = PlaylistRecord>>(iter: I) -> Self {
        let mut lookup = Self::new();
        for record in iter {
            lookup.insert(record);
        }
        lookup
    }
}

impl PlaylistLookup for InMemoryPlaylistLookup {
    fn find_playlist(&self, scope: ScopeId, name: &str) -> Option<PlaylistRecord> {
        self.playlists.get(&(scope, name.to_string())).cloned()
    }
}

/// Remembers every answer, misses included, of an inner lookup
///
/// Meant to live for one batch of filter invocations; the same playlist
/// reference commonly appears many times in one page.
pub struct MemoizedPlaylistLookup<L> {
    inner: L,
    cache: RefCell<HashMap<(ScopeId, String), Option<PlaylistRecord>>>,
}

impl<L: PlaylistLookup> MemoizedPlaylistLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct `(scope, name)` keys looked up so far
    pub fn cached_keys(&self) -> usize {
        self.cache.borrow().len()
    }
}

impl<L: PlaylistLookup> PlaylistLookup for MemoizedPlaylistLookup<L> {
    fn find_playlist(&self, scope: ScopeId, name: &str) -> Option<PlaylistRecord> {
        let key = (scope, name.to_string());
        if let Some(cached) = self.cache.borrow().get(&key) {
            debug!("Playlist cache hit for {}:{}", scope, name);
            return cached.clone();
        }

        let found = self.inner.find_playlist(scope, name);
        self.cache.borrow_mut().insert(key, found.clone());
        found
    }
}
