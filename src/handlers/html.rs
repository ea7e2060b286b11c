use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use serde::Deserialize;

use crate::{
    auth::CurrentUser,
    error::AppError,
    state::AppState,
    templates::{artists_page, genres_page, not_found_page, songs_page},
};

/// Log a failed load and turn it into banner text.
fn banner(context: &str, error: impl Into<AppError>) -> String {
    let error = error.into();
    tracing::error!("Error fetching {}: {}", context, error);
    error.user_message()
}

/// Genre grid.
pub async fn index(CurrentUser(user): CurrentUser, State(state): State<AppState>) -> Html<String> {
    let (genres, error) = match state.genres.get_all().await {
        Ok(genres) => (genres, None),
        Err(e) => (Vec::new(), Some(banner("genres", e))),
    };

    Html(genres_page(&user, &genres, error.as_deref()).into_string())
}

/// Artists of one genre.
pub async fn genre_artists(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(genre_id): Path<String>,
) -> Response {
    let genre = match state.genres.get_by_id(&genre_id).await {
        Ok(Some(genre)) => genre,
        Ok(None) => {
            let page = not_found_page(&user, "This genre does not exist.");
            return (StatusCode::NOT_FOUND, Html(page.into_string())).into_response();
        }
        Err(e) => {
            let page = artists_page(&user, None, &[], Some(&banner("genre", e)));
            return Html(page.into_string()).into_response();
        }
    };

    let (artists, error) = match state.artists.get_by_genre(&genre_id).await {
        Ok(artists) => (artists, None),
        Err(e) => (Vec::new(), Some(banner("artists", e))),
    };

    Html(artists_page(&user, Some(&genre), &artists, error.as_deref()).into_string())
        .into_response()
}

#[derive(Debug, Deserialize)]
pub struct PlayerQuery {
    /// Id of the song loaded into the shared player.
    pub play: Option<String>,
}

/// Songs of one artist, with a shared player for the selected song.
pub async fn artist_songs(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
    Query(query): Query<PlayerQuery>,
) -> Response {
    let artist = match state.artists.get_by_id(&artist_id).await {
        Ok(Some(artist)) => artist,
        Ok(None) => {
            let page = not_found_page(&user, "This artist does not exist.");
            return (StatusCode::NOT_FOUND, Html(page.into_string())).into_response();
        }
        Err(e) => {
            let page = songs_page(&user, None, &[], None, Some(&banner("artist", e)));
            return Html(page.into_string()).into_response();
        }
    };

    let (songs, error) = match state.songs.get_by_artist(&artist_id).await {
        Ok(songs) => (songs, None),
        Err(e) => (Vec::new(), Some(banner("songs", e))),
    };

    let page = songs_page(
        &user,
        Some(&artist),
        &songs,
        query.play.as_deref(),
        error.as_deref(),
    );
    Html(page.into_string()).into_response()
}
