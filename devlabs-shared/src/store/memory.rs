/// In-memory store
///
/// Keeps every record in process-local maps behind a single
/// `tokio::sync::RwLock`. Writes hold the lock for the whole
/// check-then-write sequence, so uniqueness checks cannot race.
///
/// Data is lost on restart. Used when no `DATABASE_URL` is configured and by
/// the test suites.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{
    AchievementStore, ProjectStore, Store, StoreError, StoreResult, UniqueField, UserStore,
};
use crate::models::achievement::{
    Achievement, AchievementData, AchievementFilter, AchievementWithProject, ProjectRef,
};
use crate::models::project::{Project, ProjectData, ProjectFilter};
use crate::models::user::{Profile, Settings, User};
use crate::models::view::PortfolioView;
use crate::pagination::{Page, PageRequest};

#[derive(Debug, Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    projects: HashMap<Uuid, Project>,
    achievements: HashMap<Uuid, Achievement>,
    views: Vec<PortfolioView>,
}

impl Inner {
    fn slug_owner(&self, slug: &str) -> Option<Uuid> {
        self.users
            .values()
            .find(|u| u.settings.portfolio_slug == slug)
            .map(|u| u.id)
    }

    fn owned_project(&self, user_id: Uuid, id: Uuid) -> Option<&Project> {
        self.projects.get(&id).filter(|p| p.user_id == user_id)
    }

    fn owned_achievement(&self, user_id: Uuid, id: Uuid) -> Option<&Achievement> {
        self.achievements.get(&id).filter(|a| a.user_id == user_id)
    }

    fn matching_projects(&self, user_id: Uuid, filter: &ProjectFilter) -> Vec<Project> {
        let mut projects: Vec<Project> = self
            .projects
            .values()
            .filter(|p| p.user_id == user_id && filter.matches(p))
            .cloned()
            .collect();
        projects.sort_by(Project::listing_order);
        projects
    }

    fn matching_achievements(&self, user_id: Uuid, filter: &AchievementFilter) -> Vec<Achievement> {
        let mut achievements: Vec<Achievement> = self
            .achievements
            .values()
            .filter(|a| a.user_id == user_id && filter.matches(a))
            .cloned()
            .collect();
        achievements.sort_by(Achievement::listing_order);
        achievements
    }
}

/// Store backed by process memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut inner = self.inner.write().await;

        if inner.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate(UniqueField::Email));
        }
        if inner.slug_owner(&user.settings.portfolio_slug).is_some() {
            return Err(StoreError::Duplicate(UniqueField::PortfolioSlug));
        }

        inner.users.insert(user.id, user.clone());
        debug!(user_id = %user.id, "User inserted");
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_slug(&self, slug: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .slug_owner(slug)
            .and_then(|id| inner.users.get(&id))
            .cloned())
    }

    async fn update_profile(&self, id: Uuid, profile: Profile) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;
        Ok(inner.users.get_mut(&id).map(|user| {
            user.profile = profile;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_settings(&self, id: Uuid, settings: Settings) -> StoreResult<Option<User>> {
        let mut inner = self.inner.write().await;

        if let Some(owner) = inner.slug_owner(&settings.portfolio_slug) {
            if owner != id {
                return Err(StoreError::Duplicate(UniqueField::PortfolioSlug));
            }
        }

        Ok(inner.users.get_mut(&id).map(|user| {
            user.settings = settings;
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        Ok(match inner.users.get_mut(&id) {
            Some(user) => {
                user.password_hash = password_hash.to_string();
                user.updated_at = Utc::now();
                true
            }
            None => false,
        })
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        if let Some(user) = self.inner.write().await.users.get_mut(&id) {
            user.last_login_at = Some(at);
        }
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.users.remove(&id).is_none() {
            return Ok(false);
        }
        inner.projects.retain(|_, p| p.user_id != id);
        inner.achievements.retain(|_, a| a.user_id != id);
        inner.views.retain(|v| v.user_id != id);
        debug!(user_id = %id, "User and owned records deleted");
        Ok(true)
    }

    async fn record_view(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        let mut inner = self.inner.write().await;
        if let Some(user) = inner.users.get_mut(&user_id) {
            user.portfolio_views += 1;
            inner.views.push(PortfolioView {
                user_id,
                viewed_at: at,
            });
        }
        Ok(())
    }

    async fn views_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>> {
        let inner = self.inner.read().await;
        Ok(inner
            .views
            .iter()
            .filter(|v| v.user_id == user_id && v.viewed_at >= since)
            .map(|v| v.viewed_at)
            .collect())
    }
}

#[async_trait]
impl ProjectStore for MemoryStore {
    async fn create_project(&self, user_id: Uuid, data: ProjectData) -> StoreResult<Project> {
        let project = Project::from_data(Uuid::new_v4(), user_id, data, Utc::now());
        self.inner
            .write()
            .await
            .projects
            .insert(project.id, project.clone());
        Ok(project)
    }

    async fn get_project(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Project>> {
        Ok(self.inner.read().await.owned_project(user_id, id).cloned())
    }

    async fn update_project(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: ProjectData,
    ) -> StoreResult<Option<Project>> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .projects
            .get_mut(&id)
            .filter(|p| p.user_id == user_id)
            .map(|project| {
                project.apply(data, Utc::now());
                project.clone()
            }))
    }

    async fn delete_project(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.owned_project(user_id, id).is_none() {
            return Ok(false);
        }
        inner.projects.remove(&id);
        for achievement in inner.achievements.values_mut() {
            if achievement.project_id == Some(id) {
                achievement.project_id = None;
            }
        }
        Ok(true)
    }

    async fn list_projects(
        &self,
        user_id: Uuid,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Project>> {
        let matching = self.inner.read().await.matching_projects(user_id, filter);
        Ok(Page {
            items: page.slice(&matching),
            total: matching.len() as u64,
        })
    }

    async fn all_projects(
        &self,
        user_id: Uuid,
        filter: &ProjectFilter,
    ) -> StoreResult<Vec<Project>> {
        Ok(self.inner.read().await.matching_projects(user_id, filter))
    }
}

#[async_trait]
impl AchievementStore for MemoryStore {
    async fn create_achievement(
        &self,
        user_id: Uuid,
        data: AchievementData,
    ) -> StoreResult<Achievement> {
        let achievement = Achievement::from_data(Uuid::new_v4(), user_id, data, Utc::now());
        self.inner
            .write()
            .await
            .achievements
            .insert(achievement.id, achievement.clone());
        Ok(achievement)
    }

    async fn get_achievement(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Achievement>> {
        Ok(self
            .inner
            .read()
            .await
            .owned_achievement(user_id, id)
            .cloned())
    }

    async fn update_achievement(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: AchievementData,
    ) -> StoreResult<Option<Achievement>> {
        let mut inner = self.inner.write().await;
        Ok(inner
            .achievements
            .get_mut(&id)
            .filter(|a| a.user_id == user_id)
            .map(|achievement| {
                achievement.apply(data, Utc::now());
                achievement.clone()
            }))
    }

    async fn delete_achievement(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut inner = self.inner.write().await;
        if inner.owned_achievement(user_id, id).is_none() {
            return Ok(false);
        }
        inner.achievements.remove(&id);
        Ok(true)
    }

    async fn list_achievements(
        &self,
        user_id: Uuid,
        filter: &AchievementFilter,
        page: PageRequest,
    ) -> StoreResult<Page<AchievementWithProject>> {
        let inner = self.inner.read().await;
        let matching = inner.matching_achievements(user_id, filter);
        let total = matching.len() as u64;

        Ok(Page {
            items: page.slice(&matching),
            total,
        }
        .map(|achievement| {
            let project = achievement
                .project_id
                .and_then(|pid| inner.owned_project(user_id, pid))
                .map(|p| ProjectRef {
                    id: p.id,
                    title: p.title.clone(),
                });
            AchievementWithProject {
                achievement,
                project,
            }
        }))
    }

    async fn all_achievements(
        &self,
        user_id: Uuid,
        filter: &AchievementFilter,
    ) -> StoreResult<Vec<Achievement>> {
        Ok(self
            .inner
            .read()
            .await
            .matching_achievements(user_id, filter))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
