pub mod admin;
pub mod api;
pub mod auth;
pub mod health;
pub mod html;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

/// Largest admin form accepted: the audio ceiling plus room for the fields.
pub const MAX_ADMIN_FORM_BYTES: usize = 51 * 1024 * 1024;

/// Every route the application serves, ready for `with_state`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api_routes())
        .merge(html_routes())
        .merge(admin_routes())
}

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(api::me))
        .route("/genres", get(api::list_genres))
        .route("/genres/:id", get(api::get_genre))
        .route("/genres/:id/artists", get(api::list_genre_artists))
        .route("/artists/:id", get(api::get_artist))
        .route("/artists/:id/songs", get(api::list_artist_songs))
}

pub fn html_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_form).post(auth::login))
        .route("/register", get(auth::register_form).post(auth::register))
        .route("/logout", post(auth::logout))
        .route("/", get(html::index))
        .route("/genre/:genre_id", get(html::genre_artists))
        .route("/artist/:artist_id", get(html::artist_songs))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin", get(admin::admin_index))
        .route("/admin/uploads/:upload_id", get(admin::upload_status))
        .route("/admin/genres", post(admin::create_genre))
        .route("/admin/genres/:id", post(admin::update_genre))
        .route("/admin/genres/:id/delete", post(admin::delete_genre))
        .route("/admin/artists", post(admin::create_artist))
        .route("/admin/artists/:id", post(admin::update_artist))
        .route("/admin/artists/:id/delete", post(admin::delete_artist))
        .route("/admin/songs", post(admin::create_song))
        .route("/admin/songs/:id", post(admin::update_song))
        .route("/admin/songs/:id/delete", post(admin::delete_song))
        .layer(DefaultBodyLimit::max(MAX_ADMIN_FORM_BYTES))
}
