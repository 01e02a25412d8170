//! HTTP handlers
//!
//! Handlers stay thin: they preload whatever storage a request needs, then
//! run the synchronous filter or resolver.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::responses::handle_result;
use super::AppState;
use crate::assets::StaticAssets;
use crate::errors::{AppError, AppResult};
use crate::filter::{playlist_references, PageState};
use crate::models::{PlaylistRecord, PlaylistUpsertRequest, ResolveResult, ScopeId};
use crate::playlist::{InMemoryPlaylistLookup, MemoizedPlaylistLookup};
use crate::resolver::{self, playlist_name};

#[derive(Debug, Deserialize)]
pub struct FilterRequest {
    pub text: String,
    #[serde(default)]
    pub scope: ScopeId,
    #[serde(default)]
    pub cache_text: bool,
    #[serde(default)]
    pub preview_prerender: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterResponse {
    pub text: String,
    /// The host page must include the browser module and start it
    pub module_required: bool,
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub href: String,
    #[serde(default)]
    pub scope: ScopeId,
}

#[derive(Debug, Deserialize)]
pub struct PlaylistBody {
    pub name: String,
    pub list: String,
}

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn preload(state: &AppState, scope: ScopeId, names: &[String]) -> InMemoryPlaylistLookup {
    match &state.playlists {
        Some(repo) if !names.is_empty() => repo.load_lookup(scope, names).await,
        _ => InMemoryPlaylistLookup::new(),
    }
}

pub async fn filter_text(
    State(state): State<AppState>,
    Json(request): Json<FilterRequest>,
) -> Response {
    let names = playlist_references(&request.text);
    let lookup = MemoizedPlaylistLookup::new(preload(&state, request.scope, &names).await);

    let mut page = PageState::new(request.scope)
        .with_cache_text(request.cache_text)
        .with_preview_prerender(request.preview_prerender);
    let text = state.filter.filter(&request.text, &mut page, &lookup);

    handle_result(Ok(FilterResponse {
        text,
        module_required: page.module_required(),
    }))
}

pub async fn resolve_href(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Response {
    let names: Vec<String> = request.href.split('#').filter_map(playlist_name).collect();
    let lookup = preload(&state, request.scope, &names).await;

    let result: AppResult<ResolveResult> = resolver::resolve(
        &request.href,
        state.filter.renderer().config().default_captions,
        request.scope,
        &lookup,
    )
    .ok_or_else(|| AppError::not_found("stream", request.href.clone()));
    handle_result(result)
}

fn playlist_repository(state: &AppState) -> AppResult<&crate::repositories::PlaylistRepository> {
    state
        .playlists
        .as_ref()
        .ok_or_else(|| AppError::internal("playlist storage is not configured"))
}

pub async fn list_playlists(
    State(state): State<AppState>,
    Path(scope): Path<ScopeId>,
) -> Response {
    let result = match playlist_repository(&state) {
        Ok(repo) => repo.list_for_scope(scope).await.map_err(AppError::from),
        Err(e) => Err(e),
    };
    handle_result(result)
}

pub async fn upsert_playlist(
    State(state): State<AppState>,
    Path(scope): Path<ScopeId>,
    Json(body): Json<PlaylistBody>,
) -> Response {
    if body.name.trim().is_empty() {
        return handle_result::<PlaylistRecord>(Err(AppError::validation("playlist name is empty")));
    }
    let request = PlaylistUpsertRequest {
        scope,
        name: body.name,
        list: body.list,
    };
    let result = match playlist_repository(&state) {
        Ok(repo) => repo.upsert(request).await.map_err(AppError::from),
        Err(e) => Err(e),
    };
    handle_result(result)
}

pub async fn delete_playlist(
    State(state): State<AppState>,
    Path((scope, name)): Path<(ScopeId, String)>,
) -> Response {
    let result = match playlist_repository(&state) {
        Ok(repo) => repo.delete_by_name(scope, &name).await.map_err(AppError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn serve_static_asset(Path(path): Path<String>) -> impl IntoResponse {
    let asset_path = format!("static/{}", path);
    match StaticAssets::get_asset(&asset_path) {
        Some(asset) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, StaticAssets::get_content_type(&asset_path)),
                (header::CACHE_CONTROL, "public, max-age=3600"),
            ],
            Body::from(asset.data.into_owned()),
        )
            .into_response(),
        None => (StatusCode::NOT_FOUND, "Asset not found").into_response(),
    }
}
