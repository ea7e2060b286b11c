//! Admin screen: one tab per catalog collection, each with a create/edit
//! form and the list of existing records.

use maud::{html, Markup};
use serde::Deserialize;

use super::components::{format_duration, maybe_error_banner, upload_progress};
use super::layout::base_layout;
use crate::db::models::{Artist, Genre, Song, User};
use crate::media::MediaKind;

const UNKNOWN: &str = "Unknown";
const INPUT_CLASS: &str = "w-full px-3 py-2 border border-gray-300 rounded-md focus:outline-none focus:ring-2 focus:ring-primary";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminTab {
    #[default]
    Genres,
    Artists,
    Songs,
}

impl AdminTab {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Genres => "genres",
            Self::Artists => "artists",
            Self::Songs => "songs",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::Genres => "Genres",
            Self::Artists => "Artists",
            Self::Songs => "Songs",
        }
    }
}

pub fn admin_page(user: &User, tab: AdminTab, error: Option<&str>, panel: Markup) -> Markup {
    base_layout(
        "Admin",
        user,
        html! {
            h1 class="text-3xl font-bold text-gray-900 mb-6" { "Catalog administration" }

            div class="border-b border-gray-200 mb-6" {
                nav class="flex space-x-6" {
                    @for t in [AdminTab::Genres, AdminTab::Artists, AdminTab::Songs] {
                        @let class = if t == tab {
                            "pb-3 border-b-2 border-primary text-primary font-semibold"
                        } else {
                            "pb-3 text-gray-600 hover:text-gray-900"
                        };
                        a href={(format!("/admin?tab={}", t.as_str()))} class=(class) { (t.label()) }
                    }
                }
            }

            (maybe_error_banner(error))

            (panel)
        },
    )
}

fn form_shell(tab: AdminTab, editing_id: Option<&str>, upload_id: &str, fields: Markup) -> Markup {
    let action = match editing_id {
        Some(id) => format!("/admin/{}/{}", tab.as_str(), id),
        None => format!("/admin/{}", tab.as_str()),
    };

    html! {
        form
            method="post"
            action=(action)
            enctype="multipart/form-data"
            onsubmit="this.dataset.submitting = '1'"
            class="bg-white rounded-lg shadow-md p-6 mb-8 space-y-4" {

            h2 class="text-lg font-semibold text-gray-900" {
                @if editing_id.is_some() { "Edit" } @else { "Add" }
                " "
                (tab.label().trim_end_matches('s').to_lowercase())
            }

            input type="hidden" name="upload_id" value=(upload_id);

            (fields)

            div class="flex space-x-3" {
                button type="submit" class="px-4 py-2 bg-primary text-white font-semibold rounded-md hover:bg-primary-dark" {
                    @if editing_id.is_some() { "Save changes" } @else { "Create" }
                }
                @if editing_id.is_some() {
                    a href={(format!("/admin?tab={}", tab.as_str()))}
                      class="px-4 py-2 border border-gray-300 text-gray-700 rounded-md hover:bg-gray-50" {
                        "Cancel"
                    }
                }
            }
        }
    }
}

fn name_field(value: &str) -> Markup {
    html! {
        div {
            label for="name" class="block text-sm font-medium text-gray-700 mb-2" { "Name" }
            input type="text" id="name" name="name" value=(value) required class=(INPUT_CLASS);
        }
    }
}

/// File input; the file is only mandatory when creating.
fn file_field(kind: MediaKind, creating: bool, upload_id: &str) -> Markup {
    let label = match kind {
        MediaKind::Image => "Image",
        MediaKind::Audio => "Audio file",
    };

    html! {
        div {
            label for="file" class="block text-sm font-medium text-gray-700 mb-2" { (label) }
            @if creating {
                input type="file" id="file" name="file" accept=(kind.accept()) required class=(INPUT_CLASS);
            } @else {
                input type="file" id="file" name="file" accept=(kind.accept()) class=(INPUT_CLASS);
                p class="text-xs text-gray-500 mt-1" { "Leave empty to keep the current file." }
            }
            (upload_progress(upload_id, None))
        }
    }
}

fn parent_select<'a>(
    name: &str,
    label: &str,
    options: impl Iterator<Item = (&'a str, &'a str)>,
    selected: Option<&str>,
) -> Markup {
    html! {
        div {
            label for=(name) class="block text-sm font-medium text-gray-700 mb-2" { (label) }
            select id=(name) name=(name) required class=(INPUT_CLASS) {
                option value="" { "Select..." }
                @for (id, option_name) in options {
                    @if Some(id) == selected {
                        option value=(id) selected { (option_name) }
                    } @else {
                        option value=(id) { (option_name) }
                    }
                }
            }
        }
    }
}

fn row_actions(tab: AdminTab, id: &str, name: &str) -> Markup {
    html! {
        div class="flex space-x-2" {
            a href={(format!("/admin?tab={}&edit={}", tab.as_str(), id))}
              class="px-3 py-1 text-sm border border-gray-300 rounded-md hover:bg-gray-50" {
                "Edit"
            }
            form method="post"
                 action={(format!("/admin/{}/{}/delete", tab.as_str(), id))}
                 data-name=(name)
                 onsubmit="return confirm('Delete ' + this.dataset.name + '?')" {
                button type="submit" class="px-3 py-1 text-sm text-red-700 border border-red-300 rounded-md hover:bg-red-50" {
                    "Delete"
                }
            }
        }
    }
}

fn thumbnail(url: &str, alt: &str) -> Markup {
    html! {
        @if url.is_empty() {
            div class="w-12 h-12 rounded bg-gray-200" {}
        } @else {
            img src=(url) alt=(alt) class="w-12 h-12 rounded object-cover";
        }
    }
}

pub fn genre_panel(genres: &[Genre], editing: Option<&Genre>, upload_id: &str) -> Markup {
    let tab = AdminTab::Genres;

    html! {
        (form_shell(tab, editing.map(|g| g.id.as_str()), upload_id, html! {
            (name_field(editing.map(|g| g.name.as_str()).unwrap_or("")))
            (file_field(MediaKind::Image, editing.is_none(), upload_id))
        }))

        ul class="bg-white rounded-lg shadow-md divide-y divide-gray-200" {
            @for genre in genres {
                li class="p-4 flex items-center gap-4" {
                    (thumbnail(&genre.image, &genre.name))
                    span class="flex-grow font-medium text-gray-900" { (genre.name) }
                    (row_actions(tab, &genre.id, &genre.name))
                }
            }
        }
    }
}

pub fn artist_panel(
    artists: &[Artist],
    genres: &[Genre],
    editing: Option<&Artist>,
    upload_id: &str,
) -> Markup {
    let tab = AdminTab::Artists;
    let genre_name = |id: &str| {
        genres
            .iter()
            .find(|g| g.id == id)
            .map(|g| g.name.as_str())
            .unwrap_or(UNKNOWN)
    };

    html! {
        (form_shell(tab, editing.map(|a| a.id.as_str()), upload_id, html! {
            (name_field(editing.map(|a| a.name.as_str()).unwrap_or("")))
            (parent_select(
                "genre_id",
                "Genre",
                genres.iter().map(|g| (g.id.as_str(), g.name.as_str())),
                editing.map(|a| a.genre_id.as_str()),
            ))
            (file_field(MediaKind::Image, editing.is_none(), upload_id))
        }))

        ul class="bg-white rounded-lg shadow-md divide-y divide-gray-200" {
            @for artist in artists {
                li class="p-4 flex items-center gap-4" {
                    (thumbnail(&artist.image, &artist.name))
                    div class="flex-grow" {
                        p class="font-medium text-gray-900" { (artist.name) }
                        p class="text-sm text-gray-500" { (genre_name(&artist.genre_id)) }
                    }
                    (row_actions(tab, &artist.id, &artist.name))
                }
            }
        }
    }
}

pub fn song_panel(
    songs: &[Song],
    artists: &[Artist],
    editing: Option<&Song>,
    upload_id: &str,
) -> Markup {
    let tab = AdminTab::Songs;
    let artist_name = |id: &str| {
        artists
            .iter()
            .find(|a| a.id == id)
            .map(|a| a.name.as_str())
            .unwrap_or(UNKNOWN)
    };
    let duration = editing
        .and_then(|s| s.duration)
        .map(|d| d.to_string())
        .unwrap_or_default();

    html! {
        (form_shell(tab, editing.map(|s| s.id.as_str()), upload_id, html! {
            (name_field(editing.map(|s| s.name.as_str()).unwrap_or("")))
            (parent_select(
                "artist_id",
                "Artist",
                artists.iter().map(|a| (a.id.as_str(), a.name.as_str())),
                editing.map(|s| s.artist_id.as_str()),
            ))
            div {
                label for="duration" class="block text-sm font-medium text-gray-700 mb-2" { "Duration (seconds)" }
                input type="number" id="duration" name="duration" min="0" step="any" value=(duration) class=(INPUT_CLASS);
            }
            (file_field(MediaKind::Audio, editing.is_none(), upload_id))
        }))

        ul class="bg-white rounded-lg shadow-md divide-y divide-gray-200" {
            @for song in songs {
                li class="p-4 flex flex-col md:flex-row md:items-center gap-4" {
                    div class="flex-grow" {
                        p class="font-medium text-gray-900" { (song.name) }
                        p class="text-sm text-gray-500" {
                            (artist_name(&song.artist_id))
                            @if let Some(d) = song.duration {
                                " · " (format_duration(d))
                            }
                        }
                    }
                    audio controls preload="none" src=(song.audio_url) class="w-full md:w-64" {}
                    (row_actions(tab, &song.id, &song.name))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn artist(id: &str, genre_id: &str) -> Artist {
        Artist {
            id: id.to_string(),
            name: format!("Artist {}", id),
            image: String::new(),
            genre_id: genre_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_missing_parent_renders_unknown() {
        let markup = artist_panel(&[artist("a1", "gone")], &[], None, "up-1").into_string();
        assert!(markup.contains("Unknown"));
        assert!(markup.contains("/admin/artists/a1/delete"));
    }

    #[test]
    fn test_delete_confirmation_reads_name_from_attribute() {
        let mut tricky = artist("a1", "g1");
        tricky.name = "Line one\nline two".to_string();

        let markup = artist_panel(&[tricky], &[], None, "up-1").into_string();
        assert!(markup.contains(r#"onsubmit="return confirm('Delete ' + this.dataset.name + '?')""#));
        assert!(markup.contains("data-name=\"Line one\nline two\""));
        assert!(!markup.contains("confirm('Delete Line"));
    }

    #[test]
    fn test_create_form_requires_file_edit_form_does_not() {
        let create = genre_panel(&[], None, "up-1").into_string();
        assert!(create.contains(r#"action="/admin/genres""#));
        assert!(create.contains("required"));
        assert!(create.contains(r#"accept="image/*""#));

        let genre = Genre {
            id: "g1".to_string(),
            name: "Jazz".to_string(),
            image: "/media/genres/1_j.png".to_string(),
            created_at: Utc::now(),
        };
        let edit = genre_panel(&[genre.clone()], Some(&genre), "up-2").into_string();
        assert!(edit.contains(r#"action="/admin/genres/g1""#));
        assert!(edit.contains("Leave empty to keep the current file."));
    }

    #[test]
    fn test_tab_from_query() {
        #[derive(Deserialize)]
        struct Q {
            tab: AdminTab,
        }
        let q: Q = serde_json::from_str(r#"{"tab":"songs"}"#).unwrap();
        assert_eq!(q.tab, AdminTab::Songs);
        assert_eq!(AdminTab::default(), AdminTab::Genres);
    }
}
