use maud::{html, Markup};

use super::components::{
    artist_card, back_link, empty_state, genre_card, grid, maybe_error_banner, player_bar, song_row,
    NowPlaying,
};
use super::layout::{auth_layout, base_layout};
use crate::db::models::{Artist, Genre, Song, User};

const INPUT_CLASS: &str = "w-full px-3 py-2 border border-gray-300 rounded-md focus:outline-none focus:ring-2 focus:ring-primary";
const SUBMIT_CLASS: &str = "w-full px-4 py-2 bg-primary text-white font-semibold rounded-md hover:bg-primary-dark";

fn text_field(label: &str, name: &str, kind: &str, value: &str) -> Markup {
    html! {
        div {
            label for=(name) class="block text-sm font-medium text-gray-700 mb-2" { (label) }
            input type=(kind) id=(name) name=(name) value=(value) class=(INPUT_CLASS);
        }
    }
}

pub fn login_page(error: Option<&str>, email: &str) -> Markup {
    auth_layout(
        "Sign in",
        html! {
            div class="bg-white rounded-lg shadow-md p-6" {
                h2 class="text-xl font-semibold text-gray-900 mb-4" { "Sign in" }

                (maybe_error_banner(error))

                form method="post" action="/login" class="space-y-4" {
                    (text_field("Email", "email", "email", email))
                    (text_field("Password", "password", "password", ""))
                    button type="submit" class=(SUBMIT_CLASS) { "Sign in" }
                }

                p class="text-sm text-gray-600 mt-4 text-center" {
                    "No account yet? "
                    a href="/register" class="text-primary hover:underline" { "Create one" }
                }
            }
        },
    )
}

pub fn register_page(error: Option<&str>, display_name: &str, email: &str) -> Markup {
    auth_layout(
        "Create account",
        html! {
            div class="bg-white rounded-lg shadow-md p-6" {
                h2 class="text-xl font-semibold text-gray-900 mb-4" { "Create account" }

                (maybe_error_banner(error))

                form method="post" action="/register" class="space-y-4" {
                    (text_field("Display name", "display_name", "text", display_name))
                    (text_field("Email", "email", "email", email))
                    (text_field("Password", "password", "password", ""))
                    (text_field("Confirm password", "confirm_password", "password", ""))
                    button type="submit" class=(SUBMIT_CLASS) { "Create account" }
                }

                p class="text-sm text-gray-600 mt-4 text-center" {
                    "Already registered? "
                    a href="/login" class="text-primary hover:underline" { "Sign in" }
                }
            }
        },
    )
}

pub fn genres_page(user: &User, genres: &[Genre], error: Option<&str>) -> Markup {
    base_layout(
        "Genres",
        user,
        html! {
            (maybe_error_banner(error))

            h1 class="text-3xl font-bold text-gray-900 mb-6" { "Genres" }

            @if genres.is_empty() {
                (empty_state("No genres yet."))
            } @else {
                (grid(html! {
                    @for genre in genres {
                        (genre_card(genre))
                    }
                }))
            }
        },
    )
}

pub fn artists_page(
    user: &User,
    genre: Option<&Genre>,
    artists: &[Artist],
    error: Option<&str>,
) -> Markup {
    let title = genre.map(|g| g.name.as_str()).unwrap_or("Artists");

    base_layout(
        title,
        user,
        html! {
            (maybe_error_banner(error))

            div class="flex items-center mb-6" {
                (back_link("/", "Back to genres"))
                h1 class="text-3xl font-bold text-gray-900" { (title) }
            }

            @if artists.is_empty() {
                (empty_state("No artists in this genre yet."))
            } @else {
                (grid(html! {
                    @for artist in artists {
                        (artist_card(artist))
                    }
                }))
            }
        },
    )
}

pub fn songs_page(
    user: &User,
    artist: Option<&Artist>,
    songs: &[Song],
    playing: Option<&str>,
    error: Option<&str>,
) -> Markup {
    let now = playing.and_then(|id| NowPlaying::find(songs, id));
    let title = artist.map(|a| a.name.as_str()).unwrap_or("Songs");
    let back = artist
        .map(|a| format!("/genre/{}", a.genre_id))
        .unwrap_or_else(|| "/".to_string());

    base_layout(
        title,
        user,
        html! {
            (maybe_error_banner(error))

            div class="flex items-center mb-6" {
                (back_link(&back, "Back"))
                @if let Some(artist) = artist {
                    @if !artist.image.is_empty() {
                        img src=(artist.image) alt=(artist.name) class="w-16 h-16 rounded-full object-cover mr-4";
                    }
                }
                h1 class="text-3xl font-bold text-gray-900" { (title) }
            }

            @if songs.is_empty() {
                (empty_state("No songs for this artist yet."))
            } @else {
                ul class={"bg-white rounded-lg shadow-md divide-y divide-gray-200" (if now.is_some() { " mb-32" } else { "" })} {
                    @for song in songs {
                        (song_row(song, now.as_ref().is_some_and(|n| n.is_playing(song))))
                    }
                }
            }

            @if let Some(now) = &now {
                (player_bar(now))
            }
        },
    )
}

pub fn not_found_page(user: &User, message: &str) -> Markup {
    base_layout(
        "Not found",
        user,
        html! {
            div class="text-center py-12" {
                h1 class="text-3xl font-bold text-gray-900 mb-4" { "Not found" }
                p class="text-gray-600 mb-6" { (message) }
                (back_link("/", "Back to genres"))
            }
        },
    )
}
