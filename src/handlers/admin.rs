//! Admin panels: catalog management forms for genres, artists and songs.
//!
//! Saving a record with a file is two-phase: the file is stored first and
//! the record is written with its URL afterwards. On edit, the previous file
//! is discarded only after the record points at the new one. Deleting a
//! record discards its file first; that cleanup never blocks the delete.

use std::collections::HashMap;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::{
    auth::AdminUser,
    db::{
        models::{ArtistPatch, GenrePatch, NewArtist, NewGenre, NewSong, SongPatch, User},
        store::StoreResult,
    },
    error::{AppError, Result},
    media::{MediaTarget, SelectedFile, UploadError},
    state::AppState,
    templates::{admin_page, artist_panel, genre_panel, song_panel, upload_progress, AdminTab},
};

#[derive(Debug, Default, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub tab: AdminTab,
    pub edit: Option<String>,
}

/// Text fields and the optional file of a submitted admin form.
#[derive(Debug, Default)]
struct AdminForm {
    fields: HashMap<String, String>,
    file: Option<SelectedFile>,
    upload_id: String,
}

impl AdminForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = AdminForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::Validation(format!("Invalid form data: {}", e)))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "file" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid file upload: {}", e)))?;

                // an untouched file input still submits an empty part
                if !file_name.is_empty() || !bytes.is_empty() {
                    form.file = Some(SelectedFile {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid form data: {}", e)))?;
                form.fields.insert(name, value);
            }
        }

        form.upload_id = form
            .fields
            .get("upload_id")
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .unwrap_or_else(new_upload_id);

        Ok(form)
    }

    fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    fn text(&self, name: &str) -> &str {
        self.fields.get(name).map(|v| v.trim()).unwrap_or("")
    }
}

fn new_upload_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

fn require(values: &[&str], message: &str) -> Result<()> {
    if values.iter().any(|v| v.is_empty()) {
        return Err(AppError::Validation(message.to_string()));
    }
    Ok(())
}

/// Store the form's file, if one was selected, with progress published
/// under the form's upload id.
async fn store_file(
    state: &AppState,
    target: MediaTarget,
    form: &mut AdminForm,
) -> Result<Option<String>> {
    let Some(file) = form.file.take() else {
        return Ok(None);
    };

    let uploads = state.media.uploads();
    let progress = uploads.register(&form.upload_id).await;
    let result = state.media.upload(target, file, &progress).await;
    uploads.release(&form.upload_id, &progress);
    Ok(Some(result?))
}

fn parse_duration(raw: &str) -> Result<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<f64>() {
        Ok(seconds) if seconds.is_finite() && seconds >= 0.0 => Ok(Some(seconds)),
        _ => Err(AppError::Validation(
            "Duration must be a number of seconds".to_string(),
        )),
    }
}

fn failure_status(error: &AppError) -> StatusCode {
    match error {
        AppError::Validation(_)
        | AppError::Upload(UploadError::NotAnImage)
        | AppError::Upload(UploadError::NotAudio)
        | AppError::Upload(UploadError::TooLarge { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
        AppError::NotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::BAD_GATEWAY,
    }
}

/// Keep the first load failure for the banner and fall back to an empty list.
fn or_banner<T: Default>(result: StoreResult<T>, what: &str, banner: &mut Option<String>) -> T {
    result.unwrap_or_else(|e| {
        tracing::error!("Error loading {}: {}", what, e);
        banner.get_or_insert_with(|| {
            format!("Error loading {}: {}", what, AppError::from(e).user_message())
        });
        T::default()
    })
}

async fn render_admin(
    state: &AppState,
    user: &User,
    tab: AdminTab,
    editing: Option<&str>,
    error: Option<String>,
    status: StatusCode,
) -> Response {
    let mut banner = error;
    let upload_id = new_upload_id();

    let panel = match tab {
        AdminTab::Genres => {
            let genres = or_banner(state.genres.get_all().await, "genres", &mut banner);
            let editing = editing.and_then(|id| genres.iter().find(|g| g.id == id));
            genre_panel(&genres, editing, &upload_id)
        }
        AdminTab::Artists => {
            let artists = or_banner(state.artists.get_all().await, "artists", &mut banner);
            let genres = or_banner(state.genres.get_all().await, "genres", &mut banner);
            let editing = editing.and_then(|id| artists.iter().find(|a| a.id == id));
            artist_panel(&artists, &genres, editing, &upload_id)
        }
        AdminTab::Songs => {
            let songs = or_banner(state.songs.get_all().await, "songs", &mut banner);
            let artists = or_banner(state.artists.get_all().await, "artists", &mut banner);
            let editing = editing.and_then(|id| songs.iter().find(|s| s.id == id));
            song_panel(&songs, &artists, editing, &upload_id)
        }
    };

    let page = admin_page(user, tab, banner.as_deref(), panel);
    (status, Html(page.into_string())).into_response()
}

/// Redirect back to the tab on success, otherwise re-render it with the error.
async fn finish(
    state: &AppState,
    user: &User,
    tab: AdminTab,
    editing: Option<&str>,
    action: &str,
    result: Result<()>,
) -> Response {
    match result {
        Ok(()) => Redirect::to(&format!("/admin?tab={}", tab.as_str())).into_response(),
        Err(e) => {
            let status = failure_status(&e);
            let message = if status == StatusCode::BAD_GATEWAY {
                tracing::error!("Error {}: {}", action, e);
                format!("Error {}: {}", action, e.user_message())
            } else {
                e.to_string()
            };
            render_admin(state, user, tab, editing, Some(message), status).await
        }
    }
}

pub async fn admin_index(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> Response {
    render_admin(
        &state,
        &user,
        query.tab,
        query.edit.as_deref(),
        None,
        StatusCode::OK,
    )
    .await
}

/// Progress bar partial for a running upload.
pub async fn upload_status(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> Html<String> {
    let current = state.media.uploads().poll(&upload_id).await;
    Html(upload_progress(&upload_id, current.as_ref()).into_string())
}

// ============================================================================
// Genres
// ============================================================================

async fn save_genre(state: &AppState, editing: Option<&str>, multipart: Multipart) -> Result<()> {
    let mut form = AdminForm::read(multipart).await?;
    let name = form.text("name").to_string();
    require(&[&name], "Name is required")?;

    let Some(id) = editing else {
        if form.file.is_none() {
            return Err(AppError::Validation("Please select an image".to_string()));
        }
        let image = store_file(state, MediaTarget::Genre, &mut form)
            .await?
            .unwrap_or_default();
        state.genres.create(&NewGenre { name, image }).await?;
        return Ok(());
    };

    let existing = state
        .genres
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {} not found", id)))?;
    let image = store_file(state, MediaTarget::Genre, &mut form).await?;

    state
        .genres
        .update(
            id,
            &GenrePatch {
                name: Some(name),
                image: image.clone(),
            },
        )
        .await?;

    if image.is_some() {
        state.media.discard(&existing.image).await;
    }
    Ok(())
}

pub async fn create_genre(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let result = save_genre(&state, None, multipart).await;
    finish(&state, &user, AdminTab::Genres, None, "saving genre", result).await
}

pub async fn update_genre(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let result = save_genre(&state, Some(&id), multipart).await;
    finish(&state, &user, AdminTab::Genres, Some(&id), "saving genre", result).await
}

pub async fn delete_genre(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let result: Result<()> = async {
        if let Some(genre) = state.genres.get_by_id(&id).await? {
            state.media.discard(&genre.image).await;
        }
        state.genres.delete(&id).await?;
        Ok(())
    }
    .await;
    finish(&state, &user, AdminTab::Genres, None, "deleting genre", result).await
}

// ============================================================================
// Artists
// ============================================================================

async fn save_artist(state: &AppState, editing: Option<&str>, multipart: Multipart) -> Result<()> {
    let mut form = AdminForm::read(multipart).await?;
    let name = form.text("name").to_string();
    let genre_id = form.text("genre_id").to_string();
    require(&[&name, &genre_id], "Name and genre are required")?;

    let Some(id) = editing else {
        if form.file.is_none() {
            return Err(AppError::Validation("Please select an image".to_string()));
        }
        let image = store_file(state, MediaTarget::Artist, &mut form)
            .await?
            .unwrap_or_default();
        state
            .artists
            .create(&NewArtist {
                name,
                image,
                genre_id,
            })
            .await?;
        return Ok(());
    };

    let existing = state
        .artists
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Artist {} not found", id)))?;
    let image = store_file(state, MediaTarget::Artist, &mut form).await?;

    state
        .artists
        .update(
            id,
            &ArtistPatch {
                name: Some(name),
                image: image.clone(),
                genre_id: Some(genre_id),
            },
        )
        .await?;

    if image.is_some() {
        state.media.discard(&existing.image).await;
    }
    Ok(())
}

pub async fn create_artist(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let result = save_artist(&state, None, multipart).await;
    finish(&state, &user, AdminTab::Artists, None, "saving artist", result).await
}

pub async fn update_artist(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let result = save_artist(&state, Some(&id), multipart).await;
    finish(&state, &user, AdminTab::Artists, Some(&id), "saving artist", result).await
}

/// Songs of the artist are left in place.
pub async fn delete_artist(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let result: Result<()> = async {
        if let Some(artist) = state.artists.get_by_id(&id).await? {
            state.media.discard(&artist.image).await;
        }
        state.artists.delete(&id).await?;
        Ok(())
    }
    .await;
    finish(&state, &user, AdminTab::Artists, None, "deleting artist", result).await
}

// ============================================================================
// Songs
// ============================================================================

async fn save_song(state: &AppState, editing: Option<&str>, multipart: Multipart) -> Result<()> {
    let mut form = AdminForm::read(multipart).await?;
    let name = form.text("name").to_string();
    let artist_id = form.text("artist_id").to_string();
    require(&[&name, &artist_id], "Name and artist are required")?;
    let duration = parse_duration(form.text("duration"))?;

    let Some(id) = editing else {
        if form.file.is_none() {
            return Err(AppError::Validation(
                "Please select an audio file".to_string(),
            ));
        }
        let audio_url = store_file(state, MediaTarget::Song, &mut form)
            .await?
            .unwrap_or_default();
        state
            .songs
            .create(&NewSong {
                name,
                audio_url,
                artist_id,
                duration,
            })
            .await?;
        return Ok(());
    };

    let existing = state
        .songs
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Song {} not found", id)))?;
    let audio_url = store_file(state, MediaTarget::Song, &mut form).await?;

    state
        .songs
        .update(
            id,
            &SongPatch {
                name: Some(name),
                audio_url: audio_url.clone(),
                artist_id: Some(artist_id),
                // an emptied field clears the duration, a missing one keeps it
                duration: form.has("duration").then_some(duration),
            },
        )
        .await?;

    if audio_url.is_some() {
        state.media.discard(&existing.audio_url).await;
    }
    Ok(())
}

pub async fn create_song(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Response {
    let result = save_song(&state, None, multipart).await;
    finish(&state, &user, AdminTab::Songs, None, "saving song", result).await
}

pub async fn update_song(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    let result = save_song(&state, Some(&id), multipart).await;
    finish(&state, &user, AdminTab::Songs, Some(&id), "saving song", result).await
}

pub async fn delete_song(
    AdminUser(user): AdminUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let result: Result<()> = async {
        if let Some(song) = state.songs.get_by_id(&id).await? {
            state.media.discard(&song.audio_url).await;
        }
        state.songs.delete(&id).await?;
        Ok(())
    }
    .await;
    finish(&state, &user, AdminTab::Songs, None, "deleting song", result).await
}
