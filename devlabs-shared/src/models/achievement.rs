/// Achievement model
///
/// Certificates, awards, scholarships and similar recognitions. An
/// achievement may point at one of its owner's projects; deleting that
/// project clears the link rather than the achievement.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE achievement_type AS ENUM (
///     'certificate', 'award', 'participation', 'recognition', 'scholarship'
/// );
/// CREATE TYPE achievement_level AS ENUM (
///     'beginner', 'intermediate', 'advanced', 'expert'
/// );
///
/// CREATE TABLE achievements (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     kind achievement_type NOT NULL,
///     title TEXT NOT NULL,
///     description TEXT,
///     issuer TEXT NOT NULL,
///     date DATE NOT NULL,
///     expiry_date DATE,
///     certificate_url TEXT,
///     verification_url TEXT,
///     badge_url TEXT,
///     category TEXT NOT NULL,
///     level achievement_level NOT NULL,
///     featured BOOLEAN NOT NULL DEFAULT FALSE,
///     skills TEXT[] NOT NULL DEFAULT '{}',
///     project_id UUID REFERENCES projects(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Kind of achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "achievement_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AchievementType {
    Certificate,
    Award,
    Participation,
    Recognition,
    Scholarship,
}

/// Skill level an achievement attests to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "achievement_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AchievementLevel {
    Beginner,
    Intermediate,
    Advanced,
    Expert,
}

/// A stored achievement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: Uuid,

    pub user_id: Uuid,

    #[serde(rename = "type")]
    pub kind: AchievementType,

    pub title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub issuer: String,

    #[serde(with = "super::date_format")]
    pub date: NaiveDate,

    #[serde(with = "super::date_format::option", skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_url: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge_url: Option<String>,

    pub category: String,

    pub level: AchievementLevel,

    pub featured: bool,

    pub skills: Vec<String>,

    pub project_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Achievement {
    pub fn from_data(id: Uuid, user_id: Uuid, data: AchievementData, now: DateTime<Utc>) -> Self {
        Achievement {
            id,
            user_id,
            kind: data.kind,
            title: data.title,
            description: data.description,
            issuer: data.issuer,
            date: data.date,
            expiry_date: data.expiry_date,
            certificate_url: data.certificate_url,
            verification_url: data.verification_url,
            badge_url: data.badge_url,
            category: data.category,
            level: data.level,
            featured: data.featured,
            skills: data.skills,
            project_id: data.project_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full replacement of the editable fields
    pub fn apply(&mut self, data: AchievementData, now: DateTime<Utc>) {
        let created_at = self.created_at;
        *self = Achievement::from_data(self.id, self.user_id, data, now);
        self.created_at = created_at;
    }

    /// Listing order: featured first, then most recent date first
    pub fn listing_order(a: &Achievement, b: &Achievement) -> Ordering {
        b.featured
            .cmp(&a.featured)
            .then_with(|| b.date.cmp(&a.date))
            .then_with(|| b.created_at.cmp(&a.created_at))
    }
}

/// Achievement create/update payload
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AchievementData {
    #[serde(rename = "type")]
    pub kind: AchievementType,

    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 3, max = 100, message = "Title must be 3-100 characters"))]
    pub title: String,

    #[serde(default, deserialize_with = "super::blank_as_none")]
    pub description: Option<String>,

    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "Issuer is required"))]
    pub issuer: String,

    #[serde(with = "super::date_format")]
    pub date: NaiveDate,

    #[serde(default, with = "super::date_format::option")]
    pub expiry_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Certificate URL must be a valid URL"))]
    pub certificate_url: Option<String>,

    #[serde(default, deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Verification URL must be a valid URL"))]
    pub verification_url: Option<String>,

    #[serde(default, deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Badge URL must be a valid URL"))]
    pub badge_url: Option<String>,

    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 1, message = "Category is required"))]
    pub category: String,

    pub level: AchievementLevel,

    #[serde(default)]
    pub featured: bool,

    #[serde(default, deserialize_with = "super::trimmed_list")]
    pub skills: Vec<String>,

    /// Must name a project owned by the same user; checked by the handler
    #[serde(default, deserialize_with = "super::optional_uuid")]
    pub project_id: Option<Uuid>,
}

/// Filters for listing a user's achievements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AchievementFilter {
    pub kind: Option<AchievementType>,
    pub category: Option<String>,
    pub featured: Option<bool>,
}

impl AchievementFilter {
    /// Featured achievements only, as shown on the portfolio page
    pub fn featured() -> Self {
        Self {
            featured: Some(true),
            ..Default::default()
        }
    }

    pub fn matches(&self, achievement: &Achievement) -> bool {
        self.kind.map_or(true, |k| k == achievement.kind)
            && self
                .category
                .as_deref()
                .map_or(true, |c| c == achievement.category)
            && self.featured.map_or(true, |f| f == achievement.featured)
    }
}

/// Minimal view of a linked project
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectRef {
    pub id: Uuid,
    pub title: String,
}

/// Achievement with its linked project resolved, as returned by list endpoints
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementWithProject {
    #[serde(flatten)]
    pub achievement: Achievement,

    pub project: Option<ProjectRef>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> AchievementData {
        serde_json::from_value(json!({
            "type": "award",
            "title": "First Place",
            "issuer": "HackMIT",
            "date": "2024-09-15",
            "expiryDate": "",
            "certificateUrl": "",
            "category": "hackathon",
            "level": "advanced",
            "skills": ["rust", ""],
            "projectId": ""
        }))
        .unwrap()
    }

    #[test]
    fn test_deserialize_form() {
        let data = sample();
        assert_eq!(data.kind, AchievementType::Award);
        assert_eq!(data.date, NaiveDate::from_ymd_opt(2024, 9, 15).unwrap());
        assert_eq!(data.expiry_date, None);
        assert_eq!(data.certificate_url, None);
        assert_eq!(data.project_id, None);
        assert_eq!(data.skills, vec!["rust".to_string()]);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_validation_rules() {
        let mut data = sample();
        data.title = "ab".to_string();
        data.issuer = String::new();
        data.badge_url = Some("nope".to_string());
        let errors = data.validate().unwrap_err();
        let fields = errors.errors();
        assert!(fields.contains_key("title"));
        assert!(fields.contains_key("issuer"));
        assert!(fields.contains_key("badge_url"));
    }

    #[test]
    fn test_serializes_type_and_dates() {
        let achievement = Achievement::from_data(Uuid::new_v4(), Uuid::new_v4(), sample(), Utc::now());
        let value = serde_json::to_value(&achievement).unwrap();
        assert_eq!(value["type"], "award");
        assert_eq!(value["date"], "2024-09-15");
        assert!(value.get("expiryDate").is_none());
        assert_eq!(value["projectId"], serde_json::Value::Null);
    }

    #[test]
    fn test_apply_keeps_creation_time() {
        let created = Utc::now() - chrono::Duration::days(1);
        let mut achievement = Achievement::from_data(Uuid::new_v4(), Uuid::new_v4(), sample(), created);
        let id = achievement.id;
        let mut update = sample();
        update.title = "Grand Prize".to_string();
        achievement.apply(update, Utc::now());

        assert_eq!(achievement.id, id);
        assert_eq!(achievement.created_at, created);
        assert_eq!(achievement.title, "Grand Prize");
    }

    #[test]
    fn test_filter() {
        let achievement = Achievement::from_data(Uuid::new_v4(), Uuid::new_v4(), sample(), Utc::now());
        assert!(AchievementFilter::default().matches(&achievement));
        assert!(AchievementFilter {
            kind: Some(AchievementType::Award),
            category: Some("hackathon".to_string()),
            featured: Some(false),
        }
        .matches(&achievement));
        assert!(!AchievementFilter::featured().matches(&achievement));
    }
}
