/// Project model
///
/// Projects are owned by a single user. A project built at a hackathon
/// carries a [`Hackathon`] record; that is all that distinguishes a
/// competition entry from any other project.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_category AS ENUM (
///     'web', 'mobile', 'ai', 'blockchain', 'iot', 'game', 'other'
/// );
/// CREATE TYPE project_status AS ENUM ('completed', 'ongoing', 'abandoned');
///
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     short_description TEXT NOT NULL,
///     description TEXT NOT NULL,
///     technologies TEXT[] NOT NULL DEFAULT '{}',
///     category project_category NOT NULL,
///     status project_status NOT NULL DEFAULT 'completed',
///     images TEXT[] NOT NULL DEFAULT '{}',
///     videos TEXT[] NOT NULL DEFAULT '{}',
///     links JSONB NOT NULL DEFAULT '{}',
///     hackathon JSONB,
///     team JSONB NOT NULL DEFAULT '[]',
///     achievements TEXT[] NOT NULL DEFAULT '{}',
///     tags TEXT[] NOT NULL DEFAULT '{}',
///     featured BOOLEAN NOT NULL DEFAULT FALSE,
///     metrics JSONB NOT NULL DEFAULT '{"views":0,"likes":0}',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Project category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_category", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectCategory {
    Web,
    Mobile,
    Ai,
    Blockchain,
    Iot,
    Game,
    Other,
}

/// Project lifecycle status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "project_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    #[default]
    Completed,
    Ongoing,
    Abandoned,
}

/// External links of a project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectLinks {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "GitHub link must be a valid URL"))]
    pub github: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Demo link must be a valid URL"))]
    pub demo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Devpost link must be a valid URL"))]
    pub devpost: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "YouTube link must be a valid URL"))]
    pub youtube: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Slides link must be a valid URL"))]
    pub slides: Option<String>,
}

/// Hackathon a project was built at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hackathon {
    pub name: String,

    #[serde(with = "super::date_format")]
    pub date: NaiveDate,

    pub location: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organizer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Hackathon section of a project form
///
/// Every field is optional on the wire so that an untouched form section can
/// be recognized and dropped; once present, name, date and location are
/// required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct HackathonData {
    #[serde(deserialize_with = "super::blank_as_none")]
    #[validate(required(message = "Hackathon name is required"))]
    pub name: Option<String>,

    #[serde(with = "super::date_format::option")]
    #[validate(required(message = "Hackathon date is required"))]
    pub date: Option<NaiveDate>,

    #[serde(deserialize_with = "super::blank_as_none")]
    #[validate(required(message = "Hackathon location is required"))]
    pub location: Option<String>,

    #[serde(deserialize_with = "super::blank_as_none")]
    pub duration: Option<String>,

    #[serde(deserialize_with = "super::blank_as_none")]
    pub organizer: Option<String>,

    #[serde(deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Hackathon website must be a valid URL"))]
    pub website: Option<String>,
}

impl HackathonData {
    /// Whether the form section was left empty
    pub fn is_blank(&self) -> bool {
        self.name.is_none() && self.location.is_none() && self.organizer.is_none()
    }

    /// Converts validated input; `None` when a required field is missing
    pub fn into_hackathon(self) -> Option<Hackathon> {
        Some(Hackathon {
            name: self.name?,
            date: self.date?,
            location: self.location?,
            duration: self.duration,
            organizer: self.organizer,
            website: self.website,
        })
    }
}

fn non_blank_hackathon<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<HackathonData>, D::Error> {
    Ok(Option::<HackathonData>::deserialize(deserializer)?.filter(|h| !h.is_blank()))
}

/// Team member credited on a project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "Team member name is required"))]
    pub name: String,

    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "Team member role is required"))]
    pub role: String,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "GitHub link must be a valid URL"))]
    pub github: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "LinkedIn link must be a valid URL"))]
    pub linkedin: Option<String>,
}

/// Engagement counters of a project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMetrics {
    pub views: i64,

    pub likes: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github_stars: Option<i64>,
}

/// A stored project
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub short_description: String,
    pub description: String,
    pub technologies: Vec<String>,
    pub category: ProjectCategory,
    pub status: ProjectStatus,
    pub images: Vec<String>,
    pub videos: Vec<String>,
    pub links: ProjectLinks,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub hackathon: Option<Hackathon>,

    pub team: Vec<TeamMember>,
    pub achievements: Vec<String>,
    pub tags: Vec<String>,
    pub featured: bool,
    pub metrics: ProjectMetrics,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Builds a new project from validated input
    pub fn from_data(id: Uuid, user_id: Uuid, data: ProjectData, now: DateTime<Utc>) -> Self {
        let mut project = Project {
            id,
            user_id,
            title: String::new(),
            short_description: String::new(),
            description: String::new(),
            technologies: Vec::new(),
            category: data.category,
            status: data.status,
            images: Vec::new(),
            videos: Vec::new(),
            links: ProjectLinks::default(),
            hackathon: None,
            team: Vec::new(),
            achievements: Vec::new(),
            tags: Vec::new(),
            featured: false,
            metrics: ProjectMetrics::default(),
            created_at: now,
            updated_at: now,
        };
        project.apply(data, now);
        project
    }

    /// Replaces every user-editable field; owner, metrics and creation time stay
    pub fn apply(&mut self, data: ProjectData, now: DateTime<Utc>) {
        self.title = data.title;
        self.short_description = data.short_description;
        self.description = data.description;
        self.technologies = data.technologies;
        self.category = data.category;
        self.status = data.status;
        self.images = data.images;
        self.videos = data.videos;
        self.links = data.links;
        self.hackathon = data.hackathon.and_then(HackathonData::into_hackathon);
        self.team = data.team;
        self.achievements = data.achievements;
        self.tags = data.tags;
        self.featured = data.featured;
        self.updated_at = now;
    }

    /// Listing order: featured first, then newest first
    pub fn listing_order(a: &Project, b: &Project) -> Ordering {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// Project create/update payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProjectData {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 3, max = 100, message = "Title must be 3-100 characters"))]
    pub title: String,

    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(
        min = 1,
        max = 200,
        message = "Short description is required and must be at most 200 characters"
    ))]
    pub short_description: String,

    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 10, message = "Description must be at least 10 characters"))]
    pub description: String,

    #[serde(deserialize_with = "super::trimmed_list")]
    #[validate(length(min = 1, message = "At least one technology is required"))]
    pub technologies: Vec<String>,

    pub category: ProjectCategory,

    #[serde(default)]
    pub status: ProjectStatus,

    #[serde(default, deserialize_with = "super::trimmed_list")]
    #[validate(custom(function = "crate::validation::validate_url_list"))]
    pub images: Vec<String>,

    #[serde(default, deserialize_with = "super::trimmed_list")]
    #[validate(custom(function = "crate::validation::validate_url_list"))]
    pub videos: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub links: ProjectLinks,

    #[serde(default, deserialize_with = "non_blank_hackathon")]
    #[validate(nested)]
    pub hackathon: Option<HackathonData>,

    #[serde(default)]
    #[validate(nested)]
    pub team: Vec<TeamMember>,

    #[serde(default, deserialize_with = "super::trimmed_list")]
    pub achievements: Vec<String>,

    #[serde(default, deserialize_with = "super::trimmed_list")]
    pub tags: Vec<String>,

    #[serde(default)]
    pub featured: bool,
}

/// Filters for listing a user's projects
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectFilter {
    pub category: Option<ProjectCategory>,
    pub status: Option<ProjectStatus>,
    pub featured: Option<bool>,

    /// Case-insensitive substring of title, description or a technology
    pub search: Option<String>,
}

impl ProjectFilter {
    /// Featured projects only, as shown on the portfolio page
    pub fn featured() -> Self {
        Self {
            featured: Some(true),
            ..Default::default()
        }
    }

    pub fn matches(&self, project: &Project) -> bool {
        if self.category.is_some_and(|c| c != project.category) {
            return false;
        }
        if self.status.is_some_and(|s| s != project.status) {
            return false;
        }
        if self.featured.is_some_and(|f| f != project.featured) {
            return false;
        }
        match self.search.as_deref() {
            Some(term) => {
                let term = term.to_lowercase();
                project.title.to_lowercase().contains(&term)
                    || project.description.to_lowercase().contains(&term)
                    || project
                        .technologies
                        .iter()
                        .any(|t| t.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> serde_json::Value {
        json!({
            "title": "HackBot",
            "shortDescription": "A chat bot",
            "description": "A chat bot built over a weekend",
            "technologies": ["Rust", " Axum "],
            "category": "ai",
            "links": { "github": "https://github.com/x/hackbot", "demo": "" },
            "hackathon": { "name": "", "location": "", "organizer": "" },
            "team": [{ "name": "Ada", "role": "Backend" }]
        })
    }

    fn sample() -> ProjectData {
        serde_json::from_value(sample_json()).unwrap()
    }

    #[test]
    fn test_category_serialization() {
        assert_eq!(serde_json::to_string(&ProjectCategory::Iot).unwrap(), "\"iot\"");
        assert!(serde_json::from_str::<ProjectCategory>("\"desktop\"").is_err());
    }

    #[test]
    fn test_data_defaults_and_cleanup() {
        let data = sample();
        assert_eq!(data.status, ProjectStatus::Completed);
        assert!(!data.featured);
        assert_eq!(data.technologies, vec!["Rust".to_string(), "Axum".to_string()]);
        assert_eq!(data.links.demo, None);
        assert!(data.hackathon.is_none(), "blank hackathon section is dropped");
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_partial_hackathon_is_rejected() {
        let mut value = sample_json();
        value["hackathon"] = json!({ "name": "HackMIT", "location": "" });
        let data: ProjectData = serde_json::from_value(value).unwrap();
        let errors = data.validate().unwrap_err();
        assert!(errors.errors().contains_key("hackathon"));
    }

    #[test]
    fn test_validation_rules() {
        let mut value = sample_json();
        value["title"] = json!("ab");
        value["technologies"] = json!([" "]);
        value["images"] = json!(["not-a-url"]);
        let data: ProjectData = serde_json::from_value(value).unwrap();
        let errors = data.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("technologies"));
        assert!(fields.contains_key("images"));
    }

    #[test]
    fn test_apply_keeps_metrics_and_owner() {
        let owner = Uuid::new_v4();
        let created = Utc::now();
        let mut project = Project::from_data(Uuid::new_v4(), owner, sample(), created);
        project.metrics.github_stars = Some(12);

        let mut update = sample();
        update.title = "HackBot 2".to_string();
        update.hackathon = Some(HackathonData {
            name: Some("HackMIT".to_string()),
            date: NaiveDate::from_ymd_opt(2024, 9, 14),
            location: Some("Cambridge".to_string()),
            ..Default::default()
        });
        project.apply(update, Utc::now());

        assert_eq!(project.user_id, owner);
        assert_eq!(project.created_at, created);
        assert_eq!(project.title, "HackBot 2");
        assert_eq!(project.metrics.github_stars, Some(12));
        assert_eq!(project.hackathon.map(|h| h.name).as_deref(), Some("HackMIT"));
    }

    #[test]
    fn test_filter_search_is_case_insensitive() {
        let project = Project::from_data(Uuid::new_v4(), Uuid::new_v4(), sample(), Utc::now());
        let filter = |term: &str| ProjectFilter {
            search: Some(term.to_string()),
            ..Default::default()
        };
        assert!(filter("hackbot").matches(&project));
        assert!(filter("WEEKEND").matches(&project));
        assert!(filter("axum").matches(&project));
        assert!(!filter("django").matches(&project));
        assert!(!ProjectFilter::featured().matches(&project));
    }

    #[test]
    fn test_listing_order() {
        let now = Utc::now();
        let older = Project::from_data(Uuid::new_v4(), Uuid::new_v4(), sample(), now - chrono::Duration::hours(1));
        let newer = Project::from_data(Uuid::new_v4(), Uuid::new_v4(), sample(), now);
        let mut featured = older.clone();
        featured.featured = true;

        let mut list = vec![older.clone(), newer.clone(), featured.clone()];
        list.sort_by(Project::listing_order);
        assert_eq!(list, vec![featured, newer, older]);
    }
}
