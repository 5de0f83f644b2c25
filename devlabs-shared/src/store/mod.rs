/// Persistence layer
///
/// Handlers talk to storage through the traits in this module, never to a
/// concrete backend. Two backends exist:
///
/// - [`postgres::PgStore`]: `sqlx` over PostgreSQL, used in production
/// - [`memory::MemoryStore`]: process-local maps, used in development and tests
///
/// Every project and achievement operation takes the caller's user id and only
/// ever sees that user's rows. A row owned by someone else is reported exactly
/// like a missing row, so callers cannot probe for other users' ids.
///
/// Uniqueness of email and portfolio slug is enforced by the backend at write
/// time and surfaced as [`StoreError::Duplicate`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::models::achievement::{
    Achievement, AchievementData, AchievementFilter, AchievementWithProject,
};
use crate::models::project::{Project, ProjectData, ProjectFilter};
use crate::models::user::{Profile, Settings, User};
use crate::pagination::{Page, PageRequest};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Column protected by a uniqueness constraint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Email,
    PortfolioSlug,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UniqueField::Email => write!(f, "email"),
            UniqueField::PortfolioSlug => write!(f, "portfolio slug"),
        }
    }
}

/// Errors returned by store operations
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write would break a uniqueness constraint
    #[error("{0} already exists")]
    Duplicate(UniqueField),

    /// The database failed or was unreachable
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User accounts and portfolio views
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user
    ///
    /// Fails with [`StoreError::Duplicate`] if the email or the portfolio slug
    /// is already in use. The check and the write are atomic.
    async fn insert_user(&self, user: User) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Looks up a user by normalized email
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_slug(&self, slug: &str) -> StoreResult<Option<User>>;

    async fn slug_taken(&self, slug: &str) -> StoreResult<bool> {
        Ok(self.find_user_by_slug(slug).await?.is_some())
    }

    async fn update_profile(&self, id: Uuid, profile: Profile) -> StoreResult<Option<User>>;

    /// Replaces a user's settings; a slug clash yields a duplicate error
    async fn update_settings(&self, id: Uuid, settings: Settings) -> StoreResult<Option<User>>;

    /// Returns false when the user does not exist
    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool>;

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;

    /// Deletes a user with all their projects, achievements and views
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    /// Records a portfolio view and bumps the user's view counter
    async fn record_view(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<()>;

    /// Timestamps of views at or after `since`
    async fn views_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>>;
}

/// Projects, scoped to their owner
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project(&self, user_id: Uuid, data: ProjectData) -> StoreResult<Project>;

    async fn get_project(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Project>>;

    /// Full replacement of the editable fields
    async fn update_project(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: ProjectData,
    ) -> StoreResult<Option<Project>>;

    /// Deletes a project; linked achievements lose their link
    async fn delete_project(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;

    /// One page of matching projects, featured first, then newest first
    async fn list_projects(
        &self,
        user_id: Uuid,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Project>>;

    /// Every matching project, in listing order
    async fn all_projects(&self, user_id: Uuid, filter: &ProjectFilter)
        -> StoreResult<Vec<Project>>;
}

/// Achievements, scoped to their owner
#[async_trait]
pub trait AchievementStore: Send + Sync {
    async fn create_achievement(
        &self,
        user_id: Uuid,
        data: AchievementData,
    ) -> StoreResult<Achievement>;

    async fn get_achievement(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Achievement>>;

    async fn update_achievement(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: AchievementData,
    ) -> StoreResult<Option<Achievement>>;

    async fn delete_achievement(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool>;

    /// One page of matching achievements with their linked project,
    /// featured first, then most recent first
    async fn list_achievements(
        &self,
        user_id: Uuid,
        filter: &AchievementFilter,
        page: PageRequest,
    ) -> StoreResult<Page<AchievementWithProject>>;

    /// Every matching achievement, in listing order
    async fn all_achievements(
        &self,
        user_id: Uuid,
        filter: &AchievementFilter,
    ) -> StoreResult<Vec<Achievement>>;
}

/// A complete storage backend
#[async_trait]
pub trait Store: UserStore + ProjectStore + AchievementStore {
    /// Checks that the backend is reachable
    async fn ping(&self) -> StoreResult<()>;

    /// Short backend name for health reports
    fn backend(&self) -> &'static str;
}
