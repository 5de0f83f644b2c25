/// PostgreSQL store
///
/// Nested documents (profile, customization, links, team, ...) live in JSONB
/// columns and are decoded through `sqlx::types::Json`. Uniqueness of email
/// and portfolio slug is enforced by the `users_email_key` and
/// `users_portfolio_slug_key` constraints; violations are mapped to
/// [`StoreError::Duplicate`].

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPool;
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{
    AchievementStore, ProjectStore, Store, StoreError, StoreResult, UniqueField, UserStore,
};
use crate::db::pool::health_check;
use crate::models::achievement::{
    Achievement, AchievementData, AchievementFilter, AchievementLevel, AchievementType,
    AchievementWithProject, ProjectRef,
};
use crate::models::project::{
    Hackathon, Project, ProjectCategory, ProjectData, ProjectFilter, ProjectLinks,
    ProjectMetrics, ProjectStatus, TeamMember,
};
use crate::models::user::{Customization, Preferences, Profile, Settings, Theme, User};
use crate::pagination::{Page, PageRequest};

const USER_COLUMNS: &str = "id, email, password_hash, profile, portfolio_slug, is_public, \
     theme, customization, preferences, portfolio_views, created_at, updated_at, last_login_at";

const PROJECT_COLUMNS: &str = "id, user_id, title, short_description, description, \
     technologies, category, status, images, videos, links, hackathon, team, achievements, \
     tags, featured, metrics, created_at, updated_at";

/// Maps a unique-constraint violation to the field it protects
fn map_unique(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            match db_err.constraint() {
                Some("users_email_key") => return StoreError::Duplicate(UniqueField::Email),
                Some("users_portfolio_slug_key") => {
                    return StoreError::Duplicate(UniqueField::PortfolioSlug)
                }
                other => warn!(constraint = ?other, "Unexpected unique violation"),
            }
        }
    }
    StoreError::Database(err)
}

/// Escapes `%`, `_` and `\` so user input matches literally inside ILIKE
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    password_hash: String,
    profile: Json<Profile>,
    portfolio_slug: String,
    is_public: bool,
    theme: Theme,
    customization: Json<Customization>,
    preferences: Json<Preferences>,
    portfolio_views: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_login_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            profile: row.profile.0,
            settings: Settings {
                portfolio_slug: row.portfolio_slug,
                is_public: row.is_public,
                theme: row.theme,
                customization: row.customization.0,
            },
            preferences: row.preferences.0,
            portfolio_views: row.portfolio_views,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_login_at: row.last_login_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ProjectRow {
    id: Uuid,
    user_id: Uuid,
    title: String,
    short_description: String,
    description: String,
    technologies: Vec<String>,
    category: ProjectCategory,
    status: ProjectStatus,
    images: Vec<String>,
    videos: Vec<String>,
    links: Json<ProjectLinks>,
    hackathon: Option<Json<Hackathon>>,
    team: Json<Vec<TeamMember>>,
    achievements: Vec<String>,
    tags: Vec<String>,
    featured: bool,
    metrics: Json<ProjectMetrics>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Project {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            short_description: row.short_description,
            description: row.description,
            technologies: row.technologies,
            category: row.category,
            status: row.status,
            images: row.images,
            videos: row.videos,
            links: row.links.0,
            hackathon: row.hackathon.map(|h| h.0),
            team: row.team.0,
            achievements: row.achievements,
            tags: row.tags,
            featured: row.featured,
            metrics: row.metrics.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AchievementRow {
    id: Uuid,
    user_id: Uuid,
    kind: AchievementType,
    title: String,
    description: Option<String>,
    issuer: String,
    date: NaiveDate,
    expiry_date: Option<NaiveDate>,
    certificate_url: Option<String>,
    verification_url: Option<String>,
    badge_url: Option<String>,
    category: String,
    level: AchievementLevel,
    featured: bool,
    skills: Vec<String>,
    project_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AchievementRow> for Achievement {
    fn from(row: AchievementRow) -> Self {
        Achievement {
            id: row.id,
            user_id: row.user_id,
            kind: row.kind,
            title: row.title,
            description: row.description,
            issuer: row.issuer,
            date: row.date,
            expiry_date: row.expiry_date,
            certificate_url: row.certificate_url,
            verification_url: row.verification_url,
            badge_url: row.badge_url,
            category: row.category,
            level: row.level,
            featured: row.featured,
            skills: row.skills,
            project_id: row.project_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct AchievementListRow {
    #[sqlx(flatten)]
    achievement: AchievementRow,
    project_title: Option<String>,
}

impl From<AchievementListRow> for AchievementWithProject {
    fn from(row: AchievementListRow) -> Self {
        let achievement = Achievement::from(row.achievement);
        let project = achievement
            .project_id
            .zip(row.project_title)
            .map(|(id, title)| ProjectRef { id, title });
        AchievementWithProject {
            achievement,
            project,
        }
    }
}

fn push_project_filter(qb: &mut QueryBuilder<'_, Postgres>, user_id: Uuid, filter: &ProjectFilter) {
    qb.push(" WHERE user_id = ").push_bind(user_id);
    if let Some(category) = filter.category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND featured = ").push_bind(featured);
    }
    if let Some(term) = filter.search.as_deref() {
        let pattern = format!("%{}%", escape_like(term));
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR EXISTS (SELECT 1 FROM unnest(technologies) AS tech WHERE tech ILIKE ")
            .push_bind(pattern)
            .push("))");
    }
}

fn push_achievement_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    user_id: Uuid,
    filter: &AchievementFilter,
) {
    qb.push(" WHERE a.user_id = ").push_bind(user_id);
    if let Some(kind) = filter.kind {
        qb.push(" AND a.kind = ").push_bind(kind);
    }
    if let Some(category) = filter.category.clone() {
        qb.push(" AND a.category = ").push_bind(category);
    }
    if let Some(featured) = filter.featured {
        qb.push(" AND a.featured = ").push_bind(featured);
    }
}

const ACHIEVEMENT_ORDER: &str = " ORDER BY a.featured DESC, a.date DESC, a.created_at DESC";

/// Store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts or updates a project row; `false` when an update matched no row
    async fn write_project(&self, project: &Project, insert: bool) -> StoreResult<bool> {
        let sql = if insert {
            "INSERT INTO projects (id, user_id, title, short_description, description, \
             technologies, category, status, images, videos, links, hackathon, team, \
             achievements, tags, featured, metrics, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19)"
        } else {
            "UPDATE projects SET title = $3, short_description = $4, description = $5, \
             technologies = $6, category = $7, status = $8, images = $9, videos = $10, \
             links = $11, hackathon = $12, team = $13, achievements = $14, tags = $15, \
             featured = $16, metrics = $17, created_at = $18, updated_at = $19 \
             WHERE id = $1 AND user_id = $2"
        };

        let result = sqlx::query(sql)
            .bind(project.id)
            .bind(project.user_id)
            .bind(&project.title)
            .bind(&project.short_description)
            .bind(&project.description)
            .bind(&project.technologies)
            .bind(project.category)
            .bind(project.status)
            .bind(&project.images)
            .bind(&project.videos)
            .bind(Json(&project.links))
            .bind(project.hackathon.as_ref().map(Json))
            .bind(Json(&project.team))
            .bind(&project.achievements)
            .bind(&project.tags)
            .bind(project.featured)
            .bind(Json(&project.metrics))
            .bind(project.created_at)
            .bind(project.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn write_achievement(&self, achievement: &Achievement, insert: bool) -> StoreResult<bool> {
        let sql = if insert {
            "INSERT INTO achievements (id, user_id, kind, title, description, issuer, date, \
             expiry_date, certificate_url, verification_url, badge_url, category, level, \
             featured, skills, project_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18)"
        } else {
            "UPDATE achievements SET kind = $3, title = $4, description = $5, issuer = $6, \
             date = $7, expiry_date = $8, certificate_url = $9, verification_url = $10, \
             badge_url = $11, category = $12, level = $13, featured = $14, skills = $15, \
             project_id = $16, created_at = $17, updated_at = $18 \
             WHERE id = $1 AND user_id = $2"
        };

        let result = sqlx::query(sql)
            .bind(achievement.id)
            .bind(achievement.user_id)
            .bind(achievement.kind)
            .bind(&achievement.title)
            .bind(&achievement.description)
            .bind(&achievement.issuer)
            .bind(achievement.date)
            .bind(achievement.expiry_date)
            .bind(&achievement.certificate_url)
            .bind(&achievement.verification_url)
            .bind(&achievement.badge_url)
            .bind(&achievement.category)
            .bind(achievement.level)
            .bind(achievement.featured)
            .bind(&achievement.skills)
            .bind(achievement.project_id)
            .bind(achievement.created_at)
            .bind(achievement.updated_at)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, profile, portfolio_slug, is_public, \
             theme, customization, preferences, portfolio_views, created_at, updated_at, \
             last_login_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(Json(&user.profile))
        .bind(&user.settings.portfolio_slug)
        .bind(user.settings.is_public)
        .bind(user.settings.theme)
        .bind(Json(&user.settings.customization))
        .bind(Json(&user.preferences))
        .bind(user.portfolio_views)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.last_login_at)
        .execute(&self.pool)
        .await
        .map_err(map_unique)?;

        debug!(user_id = %user.id, "User inserted");
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_slug(&self, slug: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE portfolio_slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn slug_taken(&self, slug: &str) -> StoreResult<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE portfolio_slug = $1)")
                .bind(slug)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn update_profile(&self, id: Uuid, profile: Profile) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET profile = $2, updated_at = NOW() WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(Json(&profile))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update_settings(&self, id: Uuid, settings: Settings) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "UPDATE users SET portfolio_slug = $2, is_public = $3, theme = $4, \
             customization = $5, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(&settings.portfolio_slug)
        .bind(settings.is_public)
        .bind(settings.theme)
        .bind(Json(&settings.customization))
        .fetch_optional(&self.pool)
        .await
        .map_err(map_unique)?;
        Ok(row.map(User::from))
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let result =
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_login(&self, id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        // Projects, achievements and views go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn record_view(&self, user_id: Uuid, at: DateTime<Utc>) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE users SET portfolio_views = portfolio_views + 1 WHERE id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() > 0 {
            sqlx::query("INSERT INTO portfolio_views (user_id, viewed_at) VALUES ($1, $2)")
                .bind(user_id)
                .bind(at)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn views_since(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
    ) -> StoreResult<Vec<DateTime<Utc>>> {
        let views: Vec<DateTime<Utc>> = sqlx::query_scalar(
            "SELECT viewed_at FROM portfolio_views WHERE user_id = $1 AND viewed_at >= $2",
        )
        .bind(user_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(views)
    }
}

#[async_trait]
impl ProjectStore for PgStore {
    async fn create_project(&self, user_id: Uuid, data: ProjectData) -> StoreResult<Project> {
        let project = Project::from_data(Uuid::new_v4(), user_id, data, Utc::now());
        self.write_project(&project, true).await?;
        Ok(project)
    }

    async fn get_project(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Project>> {
        let row: Option<ProjectRow> = sqlx::query_as(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Project::from))
    }

    async fn update_project(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: ProjectData,
    ) -> StoreResult<Option<Project>> {
        let Some(mut project) = self.get_project(user_id, id).await? else {
            return Ok(None);
        };
        project.apply(data, Utc::now());
        // A delete between the read and the write leaves nothing to update
        if !self.write_project(&project, false).await? {
            return Ok(None);
        }
        Ok(Some(project))
    }

    async fn delete_project(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        // Linked achievements are unlinked by ON DELETE SET NULL
        let result = sqlx::query("DELETE FROM projects WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_projects(
        &self,
        user_id: Uuid,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> StoreResult<Page<Project>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects");
        push_project_filter(&mut count, user_id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {PROJECT_COLUMNS} FROM projects"));
        push_project_filter(&mut select, user_id, filter);
        select
            .push(" ORDER BY featured DESC, created_at DESC LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<ProjectRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page {
            items: rows.into_iter().map(Project::from).collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn all_projects(
        &self,
        user_id: Uuid,
        filter: &ProjectFilter,
    ) -> StoreResult<Vec<Project>> {
        let mut select =
            QueryBuilder::<Postgres>::new(format!("SELECT {PROJECT_COLUMNS} FROM projects"));
        push_project_filter(&mut select, user_id, filter);
        select.push(" ORDER BY featured DESC, created_at DESC");
        let rows: Vec<ProjectRow> = select.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Project::from).collect())
    }
}

#[async_trait]
impl AchievementStore for PgStore {
    async fn create_achievement(
        &self,
        user_id: Uuid,
        data: AchievementData,
    ) -> StoreResult<Achievement> {
        let achievement = Achievement::from_data(Uuid::new_v4(), user_id, data, Utc::now());
        self.write_achievement(&achievement, true).await?;
        Ok(achievement)
    }

    async fn get_achievement(&self, user_id: Uuid, id: Uuid) -> StoreResult<Option<Achievement>> {
        let row: Option<AchievementRow> =
            sqlx::query_as("SELECT a.* FROM achievements a WHERE a.id = $1 AND a.user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(Achievement::from))
    }

    async fn update_achievement(
        &self,
        user_id: Uuid,
        id: Uuid,
        data: AchievementData,
    ) -> StoreResult<Option<Achievement>> {
        let Some(mut achievement) = self.get_achievement(user_id, id).await? else {
            return Ok(None);
        };
        achievement.apply(data, Utc::now());
        if !self.write_achievement(&achievement, false).await? {
            return Ok(None);
        }
        Ok(Some(achievement))
    }

    async fn delete_achievement(&self, user_id: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM achievements WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_achievements(
        &self,
        user_id: Uuid,
        filter: &AchievementFilter,
        page: PageRequest,
    ) -> StoreResult<Page<AchievementWithProject>> {
        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM achievements a");
        push_achievement_filter(&mut count, user_id, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut select = QueryBuilder::<Postgres>::new(
            "SELECT a.*, p.title AS project_title FROM achievements a \
             LEFT JOIN projects p ON p.id = a.project_id AND p.user_id = a.user_id",
        );
        push_achievement_filter(&mut select, user_id, filter);
        select
            .push(ACHIEVEMENT_ORDER)
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit()))
            .push(" OFFSET ")
            .push_bind(i64::try_from(page.offset()).unwrap_or(i64::MAX));
        let rows: Vec<AchievementListRow> = select.build_query_as().fetch_all(&self.pool).await?;

        Ok(Page {
            items: rows.into_iter().map(AchievementWithProject::from).collect(),
            total: u64::try_from(total).unwrap_or(0),
        })
    }

    async fn all_achievements(
        &self,
        user_id: Uuid,
        filter: &AchievementFilter,
    ) -> StoreResult<Vec<Achievement>> {
        let mut select = QueryBuilder::<Postgres>::new("SELECT a.* FROM achievements a");
        push_achievement_filter(&mut select, user_id, filter);
        select.push(ACHIEVEMENT_ORDER);
        let rows: Vec<AchievementRow> = select.build_query_as().fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Achievement::from).collect())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("rust"), "rust");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    #[test]
    fn test_project_filter_sql() {
        let filter = ProjectFilter {
            category: Some(ProjectCategory::Web),
            search: Some("bot".to_string()),
            ..Default::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM projects");
        push_project_filter(&mut qb, Uuid::nil(), &filter);
        let sql = qb.sql();
        assert!(sql.contains("WHERE user_id = $1"));
        assert!(sql.contains("AND category = $2"));
        assert!(sql.contains("title ILIKE $3"));
        assert!(sql.contains("tech ILIKE $5"));
        assert!(!sql.contains("status"));
    }

    #[test]
    fn test_achievement_filter_sql() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT a.* FROM achievements a");
        push_achievement_filter(&mut qb, Uuid::nil(), &AchievementFilter::featured());
        assert!(qb.sql().ends_with("WHERE a.user_id = $1 AND a.featured = $2"));
    }

    /// Skipped unless `DATABASE_URL` points at a PostgreSQL server
    #[tokio::test]
    async fn test_write_after_delete_reports_missing_row() {
        use crate::db::migrations::{ensure_database_exists, run_migrations};
        use crate::db::pool::{create_pool, DatabaseConfig};
        use crate::models::user::NewUser;
        use crate::slug::insert_with_unique_slug;

        let Ok(url) = std::env::var("DATABASE_URL") else { return };
        ensure_database_exists(&url).await.unwrap();
        let pool = create_pool(DatabaseConfig {
            url,
            max_connections: 2,
            ..Default::default()
        })
        .await
        .unwrap();
        run_migrations(&pool).await.unwrap();
        let store = PgStore::new(pool);

        let tag = Uuid::new_v4().simple().to_string();
        let user = insert_with_unique_slug(
            &store,
            NewUser {
                email: format!("{tag}@example.com"),
                password_hash: "hash".to_string(),
                profile: Profile::named("Ada", "Lovelace"),
                portfolio_slug: format!("ada-{}", &tag[..12]),
            },
        )
        .await
        .unwrap();

        let data: ProjectData = serde_json::from_value(serde_json::json!({
            "title": "Stale project",
            "shortDescription": "short",
            "description": "a long enough description",
            "technologies": ["Rust"],
            "category": "web"
        }))
        .unwrap();
        let project = store.create_project(user.id, data).await.unwrap();
        assert!(store.write_project(&project, false).await.unwrap());

        assert!(store.delete_project(user.id, project.id).await.unwrap());
        assert!(!store.write_project(&project, false).await.unwrap());

        store.delete_user(user.id).await.unwrap();
    }
}
