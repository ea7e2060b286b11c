//! Read-only JSON view of the catalog for signed-in clients.

use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    auth::ApiUser,
    db::models::{Artist, Genre, Song, User},
    error::{AppError, Result},
    state::AppState,
};

pub async fn me(ApiUser(user): ApiUser) -> Json<User> {
    Json(user)
}

pub async fn list_genres(
    _user: ApiUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Genre>>> {
    Ok(Json(state.genres.get_all().await?))
}

pub async fn get_genre(
    _user: ApiUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Genre>> {
    state
        .genres
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))
}

pub async fn list_genre_artists(
    _user: ApiUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Artist>>> {
    Ok(Json(state.artists.get_by_genre(&id).await?))
}

pub async fn get_artist(
    _user: ApiUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Artist>> {
    state
        .artists
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Artist {} not found", id)))
}

pub async fn list_artist_songs(
    _user: ApiUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Song>>> {
    Ok(Json(state.songs.get_by_artist(&id).await?))
}
