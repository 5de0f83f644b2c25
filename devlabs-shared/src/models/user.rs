/// User model
///
/// A user owns a profile, the settings of their public portfolio page, and a
/// handful of account preferences. The nested parts mirror the JSON document
/// the API exposes; the PostgreSQL backend stores them as JSONB columns, with
/// the portfolio slug and visibility flag lifted into real columns so they can
/// be indexed.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     email TEXT NOT NULL CONSTRAINT users_email_key UNIQUE,
///     password_hash TEXT NOT NULL,
///     profile JSONB NOT NULL,
///     portfolio_slug TEXT NOT NULL CONSTRAINT users_portfolio_slug_key UNIQUE,
///     is_public BOOLEAN NOT NULL DEFAULT FALSE,
///     theme portfolio_theme NOT NULL DEFAULT 'modern',
///     customization JSONB NOT NULL,
///     preferences JSONB NOT NULL,
///     portfolio_views BIGINT NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Visual theme of the public portfolio page
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "portfolio_theme", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Modern,
    Professional,
    Creative,
    Minimal,
}

impl Theme {
    /// All themes, in display order
    pub const ALL: [Theme; 4] = [
        Theme::Modern,
        Theme::Professional,
        Theme::Creative,
        Theme::Minimal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Modern => "modern",
            Theme::Professional => "professional",
            Theme::Creative => "creative",
            Theme::Minimal => "minimal",
        }
    }
}

/// Links to the user's accounts elsewhere
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase", default)]
pub struct SocialLinks {
    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "GitHub link must be a valid URL"))]
    pub github: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "LinkedIn link must be a valid URL"))]
    pub linkedin: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Portfolio link must be a valid URL"))]
    pub portfolio: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Twitter link must be a valid URL"))]
    pub twitter: Option<String>,
}

/// Public-facing profile of a user
///
/// Also the request body of a profile update, hence the validation rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 2, max = 50, message = "First name must be 2-50 characters"))]
    pub first_name: String,

    #[serde(deserialize_with = "super::trimmed")]
    #[validate(length(min = 2, max = 50, message = "Last name must be 2-50 characters"))]
    pub last_name: String,

    /// Avatar URL (set by the client; uploads are handled elsewhere)
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(url(message = "Avatar must be a valid URL"))]
    pub avatar: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(length(max = 500, message = "Bio must be at most 500 characters"))]
    pub bio: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(length(max = 100, message = "Location must be at most 100 characters"))]
    pub location: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "super::blank_as_none")]
    #[validate(length(max = 100, message = "University must be at most 100 characters"))]
    pub university: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "crate::validation::validate_graduation_year"))]
    pub graduation_year: Option<i32>,

    #[serde(default, deserialize_with = "super::trimmed_list")]
    pub skills: Vec<String>,

    #[serde(default)]
    #[validate(nested)]
    pub social_links: SocialLinks,
}

impl Profile {
    /// Creates a profile with only a name, as done at registration
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }
}

/// Per-section visibility flags of the public portfolio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionVisibility {
    pub about: bool,
    pub projects: bool,
    pub achievements: bool,
    pub skills: bool,
    pub contact: bool,
}

impl Default for SectionVisibility {
    fn default() -> Self {
        Self {
            about: true,
            projects: true,
            achievements: true,
            skills: true,
            contact: true,
        }
    }
}

/// Colors, font and section toggles of the public portfolio
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Customization {
    #[validate(custom(function = "crate::validation::validate_hex_color"))]
    pub primary_color: String,

    #[validate(custom(function = "crate::validation::validate_hex_color"))]
    pub secondary_color: String,

    #[validate(length(min = 1, max = 100, message = "Font must be 1-100 characters"))]
    pub font: String,

    pub show_section: SectionVisibility,
}

impl Default for Customization {
    fn default() -> Self {
        Self {
            primary_color: "#2563eb".to_string(),
            secondary_color: "#64748b".to_string(),
            font: "Inter".to_string(),
            show_section: SectionVisibility::default(),
        }
    }
}

/// Portfolio settings
///
/// The slug is globally unique; see [`crate::slug`] for how new users get one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[validate(custom(function = "crate::validation::validate_slug"))]
    pub portfolio_slug: String,

    pub is_public: bool,

    pub theme: Theme,

    #[validate(nested)]
    pub customization: Customization,
}

impl Settings {
    /// Default settings for a freshly registered user
    pub fn with_slug(portfolio_slug: impl Into<String>) -> Self {
        Self {
            portfolio_slug: portfolio_slug.into(),
            is_public: false,
            theme: Theme::default(),
            customization: Customization::default(),
        }
    }

    /// Applies a partial update, keeping every field the patch leaves out
    pub fn merge(&self, patch: SettingsPatch) -> Settings {
        let mut merged = self.clone();

        if let Some(slug) = patch.portfolio_slug {
            merged.portfolio_slug = slug;
        }
        if let Some(is_public) = patch.is_public {
            merged.is_public = is_public;
        }
        if let Some(theme) = patch.theme {
            merged.theme = theme;
        }
        if let Some(custom) = patch.customization {
            let target = &mut merged.customization;
            if let Some(color) = custom.primary_color {
                target.primary_color = color;
            }
            if let Some(color) = custom.secondary_color {
                target.secondary_color = color;
            }
            if let Some(font) = custom.font {
                target.font = font;
            }
            if let Some(sections) = custom.show_section {
                let flags = &mut target.show_section;
                flags.about = sections.about.unwrap_or(flags.about);
                flags.projects = sections.projects.unwrap_or(flags.projects);
                flags.achievements = sections.achievements.unwrap_or(flags.achievements);
                flags.skills = sections.skills.unwrap_or(flags.skills);
                flags.contact = sections.contact.unwrap_or(flags.contact);
            }
        }

        merged
    }
}

/// Partial settings update
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SettingsPatch {
    #[validate(custom(function = "crate::validation::validate_slug"))]
    pub portfolio_slug: Option<String>,

    pub is_public: Option<bool>,

    pub theme: Option<Theme>,

    #[validate(nested)]
    pub customization: Option<CustomizationPatch>,
}

/// Partial customization update
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomizationPatch {
    #[validate(custom(function = "crate::validation::validate_hex_color"))]
    pub primary_color: Option<String>,

    #[validate(custom(function = "crate::validation::validate_hex_color"))]
    pub secondary_color: Option<String>,

    #[validate(length(min = 1, max = 100, message = "Font must be 1-100 characters"))]
    pub font: Option<String>,

    pub show_section: Option<SectionVisibilityPatch>,
}

/// Partial section visibility update
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionVisibilityPatch {
    pub about: Option<bool>,
    pub projects: Option<bool>,
    pub achievements: Option<bool>,
    pub skills: Option<bool>,
    pub contact: Option<bool>,
}

/// Account preferences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub email_notifications: bool,
    pub public_profile: bool,
    pub show_email: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            email_notifications: true,
            public_profile: false,
            show_email: false,
        }
    }
}

/// User account
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Lowercased, trimmed email address (unique)
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub profile: Profile,

    pub settings: Settings,

    pub preferences: Preferences,

    /// Number of public portfolio views by other visitors
    pub portfolio_views: i64,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Whether `viewer` is this user
    pub fn is_owned_by(&self, viewer: Option<Uuid>) -> bool {
        viewer == Some(self.id)
    }
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,

    /// Argon2id hash, never a plaintext password
    pub password_hash: String,

    pub profile: Profile,

    /// Candidate slug; rewritten by the slug resolver before insert
    pub portfolio_slug: String,
}

impl NewUser {
    /// Builds the stored user with default settings and preferences
    pub fn into_user(self, id: Uuid, now: DateTime<Utc>) -> User {
        User {
            id,
            email: self.email,
            password_hash: self.password_hash,
            profile: self.profile,
            settings: Settings::with_slug(self.portfolio_slug),
            preferences: Preferences::default(),
            portfolio_views: 0,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}

/// Normalizes an email address for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
