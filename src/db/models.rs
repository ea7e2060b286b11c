//! Catalog records as they are stored in the document store.
//!
//! Every record type comes in three shapes: the stored record (with `id` and
//! `createdAt`), a `New*` input for creation and a `*Patch` whose fields are
//! all optional so that updates only touch what they name.

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// A record type persisted in its own document collection.
pub trait Entity: DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: &'static str;

    /// Creation payload: every field except `id` and `createdAt`.
    type New: Serialize + Send + Sync;

    /// Partial update payload; `None` fields must be skipped on serialization.
    type Patch: Serialize + Send + Sync;

    fn id(&self) -> &str;

    fn created_at(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

// ============================================================================
// User
// ============================================================================

/// Application user. `id` is the subject id issued by the auth client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub const DEFAULT_DISPLAY_NAME: &'static str = "User";

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub role: Role,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl Entity for User {
    const COLLECTION: &'static str = "users";
    type New = NewUser;
    type Patch = UserPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Genre
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Genre {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewGenre {
    pub name: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenrePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl Entity for Genre {
    const COLLECTION: &'static str = "genres";
    type New = NewGenre;
    type Patch = GenrePatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Artist
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image: String,
    pub genre_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewArtist {
    pub name: String,
    pub image: String,
    pub genre_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtistPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<String>,
}

impl Entity for Artist {
    const COLLECTION: &'static str = "artists";
    type New = NewArtist;
    type Patch = ArtistPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// ============================================================================
// Song
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub id: String,
    pub name: String,
    pub audio_url: String,
    pub artist_id: String,
    /// Length in seconds, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSong {
    pub name: String,
    pub audio_url: String,
    pub artist_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<String>,
    /// `Some(None)` clears a stored duration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Option<f64>>,
}

impl Entity for Song {
    const COLLECTION: &'static str = "songs";
    type New = NewSong;
    type Patch = SongPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_is_stored_lowercase() {
        assert_eq!(serde_json::to_value(Role::Admin).unwrap(), json!("admin"));
        assert_eq!(serde_json::from_value::<Role>(json!("user")).unwrap(), Role::User);
        assert!(serde_json::from_value::<Role>(json!("root")).is_err());
    }

    #[test]
    fn test_patch_skips_unset_fields() {
        let patch = ArtistPatch {
            name: Some("Renamed".to_string()),
            ..Default::default()
        };

        assert_eq!(serde_json::to_value(&patch).unwrap(), json!({ "name": "Renamed" }));
    }

    #[test]
    fn test_song_patch_can_clear_duration() {
        let clear = SongPatch {
            duration: Some(None),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&clear).unwrap(), json!({ "duration": null }));

        let untouched = SongPatch::default();
        assert_eq!(serde_json::to_value(&untouched).unwrap(), json!({}));
    }

    #[test]
    fn test_song_uses_camel_case_fields() {
        let song = NewSong {
            name: "Track".to_string(),
            audio_url: "/media/songs/1_a.mp3".to_string(),
            artist_id: "a1".to_string(),
            duration: None,
        };

        let value = serde_json::to_value(&song).unwrap();
        assert_eq!(value["audioUrl"], "/media/songs/1_a.mp3");
        assert_eq!(value["artistId"], "a1");
        assert!(value.get("duration").is_none());
    }

    #[test]
    fn test_user_defaults_missing_role() {
        let user: User = serde_json::from_value(json!({
            "id": "uid-1",
            "email": "a@b.c",
            "createdAt": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(user.role, Role::User);
        assert_eq!(user.display_name, "");
        assert!(!user.is_admin());
    }
}
