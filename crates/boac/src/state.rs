//! Application state with repository-based storage.
//!
//! Handlers receive the repositories as trait objects, so the storage backend
//! is chosen once at startup via feature flags.

use std::sync::Arc;

use anyhow::Context;
use boac_auth::{AuthConfig, AuthState};
use boac_core::redirect::VueRedirects;
use boac_core::storage::{
    AppointmentRepository, AttachmentStore, CohortRepository, CuratedGroupRepository,
    NoteRepository, NoteTemplateRepository, StudentRepository, TopicRepository, UserRepository,
};

use crate::config::Config;

// ============================================================================
// Compile-time feature validation
// ============================================================================

#[cfg(all(feature = "sqlite", feature = "inmemory"))]
compile_error!("Cannot enable both 'sqlite' and 'inmemory' storage features");

#[cfg(not(any(feature = "inmemory", feature = "sqlite")))]
compile_error!("Must enable exactly one storage feature: 'inmemory' or 'sqlite'");

/// A backend implementing every repository the service needs.
pub trait Repositories:
    UserRepository
    + StudentRepository
    + CohortRepository
    + CuratedGroupRepository
    + NoteRepository
    + NoteTemplateRepository
    + TopicRepository
    + AppointmentRepository
    + 'static
{
}

impl<R> Repositories for R where
    R: UserRepository
        + StudentRepository
        + CohortRepository
        + CuratedGroupRepository
        + NoteRepository
        + NoteTemplateRepository
        + TopicRepository
        + AppointmentRepository
        + 'static
{
}

/// Shared application state.
///
/// Cloned for each request handler. All repositories usually point at the
/// same backend instance.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub students: Arc<dyn StudentRepository>,
    pub cohorts: Arc<dyn CohortRepository>,
    pub curated_groups: Arc<dyn CuratedGroupRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub note_templates: Arc<dyn NoteTemplateRepository>,
    pub topics: Arc<dyn TopicRepository>,
    pub appointments: Arc<dyn AppointmentRepository>,
    pub attachments: Arc<dyn AttachmentStore>,
    pub auth: AuthState,
    pub config: Arc<Config>,
    pub redirects: Arc<VueRedirects>,
}

impl AsRef<AuthState> for AppState {
    fn as_ref(&self) -> &AuthState {
        &self.auth
    }
}

impl AppState {
    fn build<R: Repositories>(
        repo: Arc<R>,
        auth: AuthState,
        attachments: Arc<dyn AttachmentStore>,
        config: &Config,
    ) -> Result<Self, anyhow::Error> {
        let redirects = match config.vue_paths.as_deref() {
            Some(json) => VueRedirects::from_json(json).context("Invalid VUE_PATHS")?,
            None => VueRedirects::default(),
        };

        Ok(Self {
            users: repo.clone(),
            students: repo.clone(),
            cohorts: repo.clone(),
            curated_groups: repo.clone(),
            notes: repo.clone(),
            note_templates: repo.clone(),
            topics: repo.clone(),
            appointments: repo,
            attachments,
            auth,
            config: Arc::new(config.clone()),
            redirects: Arc::new(redirects),
        })
    }
}

// ============================================================================
// Factory functions for the storage backends
// ============================================================================

#[cfg(feature = "inmemory")]
mod inmemory {
    use super::*;
    use crate::storage::{FsAttachmentStore, InMemoryRepository};
    use boac_auth::SessionStore;

    impl AppState {
        /// Creates AppState with in-memory storage and sessions.
        pub async fn new(config: &Config, auth_config: AuthConfig) -> Result<Self, anyhow::Error> {
            let repo = Arc::new(InMemoryRepository::new());
            let auth = AuthState::new(Arc::new(SessionStore::new()), repo.clone(), auth_config);
            let attachments = Arc::new(FsAttachmentStore::new(&config.attachments_dir));

            Self::build(repo, auth, attachments, config)
        }
    }
}

#[cfg(feature = "sqlite")]
mod sqlite {
    use super::*;
    use crate::storage::{FsAttachmentStore, SqliteRepository};
    use boac_auth::SqliteSessionStore;

    impl AppState {
        /// Creates AppState with SQLite storage and SQLite-backed sessions.
        pub async fn new(config: &Config, auth_config: AuthConfig) -> Result<Self, anyhow::Error> {
            let repo = Arc::new(SqliteRepository::new(&config.sqlite_path).await?);
            let sessions = SqliteSessionStore::open(&config.sqlite_path).await?;
            let auth = AuthState::new(Arc::new(sessions), repo.clone(), auth_config);
            let attachments = Arc::new(FsAttachmentStore::new(&config.attachments_dir));

            Self::build(repo, auth, attachments, config)
        }
    }
}

#[cfg(test)]
pub mod test_support {
    //! Fixture-seeded state for handler tests.

    use super::*;
    use crate::storage::{InMemoryAttachmentStore, InMemoryRepository};
    use boac_auth::SessionStore;

    pub const DEV_AUTH_PASSWORD: &str = "hunter2";

    pub fn test_config() -> Config {
        let mut config = Config::from_env();
        config.max_attachment_size_mb = 1;
        config.drop_in_departments = vec!["COENG".to_string(), "QCADV".to_string()];
        config.vue_paths = None;
        config.vue_localhost_base_url = None;
        config
    }

    /// In-memory state with fixtures loaded and dev auth enabled.
    pub async fn seeded_state_with(config: Config) -> AppState {
        let repo = Arc::new(InMemoryRepository::new());
        let auth_config = AuthConfig {
            cookie_secure: false,
            ..AuthConfig::default()
        }
        .with_dev_auth(DEV_AUTH_PASSWORD);
        let auth = AuthState::new(Arc::new(SessionStore::new()), repo.clone(), auth_config);
        let state = AppState::build(
            repo,
            auth,
            Arc::new(InMemoryAttachmentStore::default()),
            &config,
        )
        .unwrap();
        crate::fixtures::load(&state).await.unwrap();
        state
    }

    pub async fn seeded_state() -> AppState {
        seeded_state_with(test_config()).await
    }
}
