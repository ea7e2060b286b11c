use maud::{html, Markup};

use crate::db::models::{Artist, Genre, Song};
use crate::media::{format_file_size, UploadState};

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300x300/1a1a1a/ffffff?text=No+Image";

/// `m:ss`, e.g. `3:07`. Negative and non-finite values read as `0:00`.
pub fn format_duration(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

fn catalog_card(href: &str, name: &str, image: &str) -> Markup {
    let image = if image.is_empty() { PLACEHOLDER_IMAGE } else { image };

    html! {
        a href=(href) class="catalog-card block bg-white rounded-lg shadow-md overflow-hidden transition-transform" {
            div class="relative aspect-square" {
                img src=(image) alt=(name) class="w-full h-full object-cover" loading="lazy";
            }
            div class="p-4" {
                h3 class="font-semibold text-gray-900 truncate" title=(name) { (name) }
            }
        }
    }
}

pub fn genre_card(genre: &Genre) -> Markup {
    catalog_card(&format!("/genre/{}", genre.id), &genre.name, &genre.image)
}

pub fn artist_card(artist: &Artist) -> Markup {
    catalog_card(&format!("/artist/{}", artist.id), &artist.name, &artist.image)
}

/// One song of an artist's ordered list, with the song currently playing.
/// Next and previous wrap around at either end of the list.
pub struct NowPlaying<'a> {
    songs: &'a [Song],
    index: usize,
}

impl<'a> NowPlaying<'a> {
    /// `None` when `song_id` is not in `songs`.
    pub fn find(songs: &'a [Song], song_id: &str) -> Option<Self> {
        let index = songs.iter().position(|s| s.id == song_id)?;
        Some(Self { songs, index })
    }

    pub fn current(&self) -> &'a Song {
        &self.songs[self.index]
    }

    pub fn next(&self) -> &'a Song {
        &self.songs[(self.index + 1) % self.songs.len()]
    }

    pub fn previous(&self) -> &'a Song {
        let len = self.songs.len();
        &self.songs[(self.index + len - 1) % len]
    }

    pub fn is_playing(&self, song: &Song) -> bool {
        self.current().id == song.id
    }
}

fn play_href(song: &Song) -> String {
    format!(
        "/artist/{}?play={}",
        urlencoding::encode(&song.artist_id),
        urlencoding::encode(&song.id)
    )
}

pub fn song_row(song: &Song, playing: bool) -> Markup {
    let row_class = if playing {
        "p-4 flex items-center gap-3 bg-indigo-50"
    } else {
        "p-4 flex items-center gap-3 hover:bg-gray-50"
    };

    html! {
        li class=(row_class) {
            div class="flex-grow" {
                p class={"font-medium " (if playing { "text-primary font-bold" } else { "text-gray-900" })} {
                    (song.name)
                }
                @if let Some(duration) = song.duration {
                    p class="text-sm text-gray-500" { (format_duration(duration)) }
                }
            }
            a href=(play_href(song))
              class="px-3 py-1 text-sm border border-primary text-primary rounded-full hover:bg-indigo-100"
              aria-label={"Play " (song.name)} {
                "▶"
            }
        }
    }
}

/// Shared player pinned to the bottom of the page. The track stops when it
/// ends; moving on is up to the listener.
pub fn player_bar(now: &NowPlaying<'_>) -> Markup {
    let song = now.current();

    html! {
        div id="player" class="fixed bottom-0 inset-x-0 z-50 bg-gray-900 text-white shadow-lg p-4" {
            div class="container mx-auto flex flex-col md:flex-row md:items-center gap-4" {
                div class="flex-grow min-w-0" {
                    p class="font-semibold truncate" { (song.name) }
                    @if let Some(duration) = song.duration {
                        p class="text-sm text-gray-300" { (format_duration(duration)) }
                    }
                }
                div class="flex items-center space-x-2" {
                    a href=(play_href(now.previous())) class="px-3 py-2 rounded hover:bg-gray-700"
                      aria-label="Previous song" { "⏮" }
                    a href=(play_href(now.next())) class="px-3 py-2 rounded hover:bg-gray-700"
                      aria-label="Next song" { "⏭" }
                }
                audio controls autoplay preload="auto" src=(song.audio_url) class="w-full md:w-96" {
                    "Your browser does not support audio playback."
                }
            }
        }
    }
}

pub fn grid(cards: Markup) -> Markup {
    html! {
        div class="grid grid-cols-1 sm:grid-cols-2 md:grid-cols-3 lg:grid-cols-4 gap-6" {
            (cards)
        }
    }
}

pub fn empty_state(message: &str) -> Markup {
    html! {
        div class="text-center py-12" {
            p class="text-gray-600 text-lg" { (message) }
        }
    }
}

pub fn back_link(href: &str, label: &str) -> Markup {
    html! {
        a href=(href) class="inline-flex items-center text-sm text-gray-600 hover:text-primary mr-4" {
            "← " (label)
        }
    }
}

/// Error notification with a close button.
pub fn error_banner(message: &str) -> Markup {
    html! {
        div class="error-banner relative mb-4 p-4 rounded-md bg-red-50 text-red-800" role="alert" {
            div class="flex items-center pr-6" {
                span class="font-bold mr-2" { "✗" }
                span { (message) }
            }
            button
                type="button"
                class="absolute top-3 right-4 text-red-800 hover:text-red-600"
                aria-label="Dismiss"
                onclick="this.closest('.error-banner').remove()" {
                "×"
            }
        }
    }
}

pub fn maybe_error_banner(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            (error_banner(message))
        }
    }
}

/// Progress bar partial, refreshed by polling `/admin/uploads/:upload_id`.
/// Polling stops once the swapped-in markup no longer carries the trigger.
pub fn upload_progress(upload_id: &str, state: Option<&UploadState>) -> Markup {
    let poll_url = format!("/admin/uploads/{}", upload_id);

    match state {
        Some(UploadState::Uploading { progress }) => polling(
            &poll_url,
            "every 500ms",
            html! {
                div class="w-full bg-gray-200 rounded-full h-2" {
                    div class="h-2 rounded-full bg-blue-500 transition-all"
                        style={(format!("width: {}%", progress))} {}
                }
                p class="text-xs text-gray-500 mt-1" { "Uploading... " (progress) "%" }
            },
        ),
        Some(UploadState::Selected { file_name, size }) => polling(
            &poll_url,
            "every 500ms",
            html! {
                p class="text-xs text-gray-500" {
                    (file_name) " (" (format_file_size(*size)) ")"
                }
            },
        ),
        Some(UploadState::Validating) => polling(
            &poll_url,
            "every 500ms",
            html! { p class="text-xs text-gray-500" { "Checking file..." } },
        ),
        Some(UploadState::Failed { message }) => html! {
            div class="upload-progress mt-2" {
                p class="text-xs text-red-600" { (message) }
            }
        },
        Some(UploadState::Stored { .. }) | Some(UploadState::Idle) => html! {
            div class="upload-progress mt-2" {
                p class="text-xs text-green-700" { "Upload complete" }
            }
        },
        // not registered yet; starts polling once the form is submitted
        None => polling(
            &poll_url,
            "every 500ms [this.closest('form').dataset.submitting]",
            html! {},
        ),
    }
}

fn polling(poll_url: &str, trigger: &str, inner: Markup) -> Markup {
    html! {
        div class="upload-progress mt-2"
            hx-get=(poll_url)
            hx-trigger=(trigger)
            hx-swap="outerHTML" {
            (inner)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(0.0), "0:00");
        assert_eq!(format_duration(7.9), "0:07");
        assert_eq!(format_duration(187.0), "3:07");
        assert_eq!(format_duration(3600.0), "60:00");
        assert_eq!(format_duration(-4.0), "0:00");
        assert_eq!(format_duration(f64::NAN), "0:00");
    }

    #[test]
    fn test_error_banner_is_dismissible() {
        let markup = error_banner("Could not load genres").into_string();
        assert!(markup.contains("Could not load genres"));
        assert!(markup.contains("Dismiss"));
        assert!(markup.contains("bg-red-50"));
        assert!(markup.contains(r#"role="alert""#));
    }

    #[test]
    fn test_upload_progress_stops_polling_when_done() {
        let uploading = upload_progress("u1", Some(&UploadState::Uploading { progress: 40 }))
            .into_string();
        assert!(uploading.contains("/admin/uploads/u1"));
        assert!(uploading.contains("width: 40%"));

        let done = upload_progress("u1", Some(&UploadState::Idle)).into_string();
        assert!(!done.contains("hx-get"));
    }

    fn song(id: &str) -> Song {
        Song {
            id: id.to_string(),
            name: format!("Song {}", id),
            audio_url: format!("/media/songs/1_{}.mp3", id),
            artist_id: "a1".to_string(),
            duration: Some(65.0),
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_now_playing_wraps_at_both_ends() {
        let songs = vec![song("s1"), song("s2"), song("s3")];

        let first = NowPlaying::find(&songs, "s1").unwrap();
        assert_eq!(first.previous().id, "s3");
        assert_eq!(first.next().id, "s2");

        let last = NowPlaying::find(&songs, "s3").unwrap();
        assert_eq!(last.next().id, "s1");
        assert_eq!(last.previous().id, "s2");

        let only = vec![song("solo")];
        let single = NowPlaying::find(&only, "solo").unwrap();
        assert_eq!(single.next().id, "solo");
        assert_eq!(single.previous().id, "solo");

        assert!(NowPlaying::find(&songs, "missing").is_none());
        assert!(NowPlaying::find(&[], "s1").is_none());
    }

    #[test]
    fn test_song_row_links_to_shared_player() {
        let markup = song_row(&song("s1"), false).into_string();
        assert!(!markup.contains("<audio"));
        assert!(markup.contains("/artist/a1?play=s1"));
        assert!(markup.contains("1:05"));
    }

    #[test]
    fn test_player_bar_plays_current_song() {
        let songs = vec![song("s1"), song("s2")];
        let now = NowPlaying::find(&songs, "s2").unwrap();

        let markup = player_bar(&now).into_string();
        assert_eq!(markup.matches("<audio").count(), 1);
        assert!(markup.contains(r#"src="/media/songs/1_s2.mp3""#));
        assert!(markup.contains("autoplay"));
        assert!(!markup.contains("loop"));
        assert!(markup.contains("/artist/a1?play=s1"));
    }
}
