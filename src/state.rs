use std::sync::Arc;

use crate::auth::{AuthClient, SessionProvider, SessionStore};
use crate::config::Config;
use crate::db::repositories::{ArtistRepository, GenreRepository, SongRepository, UserRepository};
use crate::db::store::DocumentStore;
use crate::media::MediaService;
use crate::storage::ObjectStorage;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub genres: GenreRepository,
    pub artists: ArtistRepository,
    pub songs: SongRepository,
    pub users: UserRepository,
    pub sessions: SessionProvider,
    pub media: MediaService,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
        auth: Arc<dyn AuthClient>,
        session_store: Arc<dyn SessionStore>,
    ) -> Self {
        let users = UserRepository::new(Arc::clone(&store));

        Self {
            config: Arc::new(config),
            genres: GenreRepository::new(Arc::clone(&store)),
            artists: ArtistRepository::new(Arc::clone(&store)),
            songs: SongRepository::new(store),
            sessions: SessionProvider::new(auth, session_store, users.clone()),
            users,
            media: MediaService::new(storage),
        }
    }
}
