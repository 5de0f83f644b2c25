//! Dashboard statistics
//!
//! Everything is computed from a user's stored projects, achievements and
//! portfolio views; nothing here touches storage.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};
use serde::Serialize;
use std::collections::HashMap;

use crate::models::achievement::{Achievement, AchievementType};
use crate::models::project::{Project, ProjectStatus};

/// Number of months covered by the views chart, current month included
pub const MONTHS_TRACKED: u32 = 6;

/// Number of technologies in the top list
pub const TOP_TECHNOLOGIES: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthlyViews {
    /// Abbreviated month name, e.g. `"Jan"`
    pub month: String,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TechnologyCount {
    pub name: String,
    pub count: u64,

    /// Share of the user's projects using it, rounded to a whole percent
    pub percentage: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_projects: u64,
    pub completed_projects: u64,
    pub ongoing_projects: u64,
    pub total_achievements: u64,
    pub portfolio_views: i64,
    pub github_stars: i64,
    pub hackathons_attended: u64,
    pub awards_won: u64,
    pub monthly_views: Vec<MonthlyViews>,
    pub top_technologies: Vec<TechnologyCount>,
}

/// First day of each tracked month, oldest first
fn tracked_months(now: DateTime<Utc>) -> Vec<NaiveDate> {
    let current = now.year() * 12 + now.month0() as i32;
    (0..MONTHS_TRACKED as i32)
        .rev()
        .filter_map(|back| {
            let index = current - back;
            NaiveDate::from_ymd_opt(index.div_euclid(12), index.rem_euclid(12) as u32 + 1, 1)
        })
        .collect()
}

/// Start of the oldest tracked month; views before it are not charted
pub fn views_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    tracked_months(now)
        .first()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|start| Utc.from_utc_datetime(&start))
        .unwrap_or(now)
}

/// Buckets view timestamps into the tracked months
pub fn monthly_views(views: &[DateTime<Utc>], now: DateTime<Utc>) -> Vec<MonthlyViews> {
    tracked_months(now)
        .into_iter()
        .map(|first_day| {
            let views = views
                .iter()
                .filter(|at| at.year() == first_day.year() && at.month() == first_day.month())
                .count() as u64;
            MonthlyViews {
                month: first_day.format("%b").to_string(),
                views,
            }
        })
        .collect()
}

/// Most used technologies, by project count, ties broken by name
pub fn top_technologies(projects: &[Project]) -> Vec<TechnologyCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for project in projects {
        for tech in &project.technologies {
            *counts.entry(tech.as_str()).or_default() += 1;
        }
    }

    let total = projects.len() as u64;
    let mut ranked: Vec<(&str, u64)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    ranked
        .into_iter()
        .take(TOP_TECHNOLOGIES)
        .map(|(name, count)| TechnologyCount {
            name: name.to_string(),
            count,
            percentage: (count * 100 + total / 2) / total.max(1),
        })
        .collect()
}

/// Computes the dashboard for one user
///
/// `view_times` only needs to cover the tracked months; older entries are
/// ignored. `portfolio_views` is the all-time counter.
pub fn dashboard_stats(
    projects: &[Project],
    achievements: &[Achievement],
    portfolio_views: i64,
    view_times: &[DateTime<Utc>],
    now: DateTime<Utc>,
) -> DashboardStats {
    let count_status =
        |status: ProjectStatus| projects.iter().filter(|p| p.status == status).count() as u64;

    DashboardStats {
        total_projects: projects.len() as u64,
        completed_projects: count_status(ProjectStatus::Completed),
        ongoing_projects: count_status(ProjectStatus::Ongoing),
        total_achievements: achievements.len() as u64,
        portfolio_views,
        github_stars: projects
            .iter()
            .filter_map(|p| p.metrics.github_stars)
            .sum(),
        hackathons_attended: projects.iter().filter(|p| p.hackathon.is_some()).count() as u64,
        awards_won: achievements
            .iter()
            .filter(|a| a.kind == AchievementType::Award)
            .count() as u64,
        monthly_views: monthly_views(view_times, now),
        top_technologies: top_technologies(projects),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::achievement::AchievementData;
    use crate::models::project::{Hackathon, ProjectData};
    use serde_json::json;
    use uuid::Uuid;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn project(techs: &[&str], status: &str) -> Project {
        let data: ProjectData = serde_json::from_value(json!({
            "title": "Project",
            "shortDescription": "short",
            "description": "a long enough description",
            "technologies": techs,
            "category": "web",
            "status": status
        }))
        .unwrap();
        Project::from_data(Uuid::new_v4(), Uuid::nil(), data, Utc::now())
    }

    fn achievement(kind: &str) -> Achievement {
        let data: AchievementData = serde_json::from_value(json!({
            "type": kind,
            "title": "Something",
            "issuer": "Someone",
            "date": "2024-01-01",
            "category": "misc",
            "level": "beginner"
        }))
        .unwrap();
        Achievement::from_data(Uuid::new_v4(), Uuid::nil(), data, Utc::now())
    }

    #[test]
    fn test_tracked_months_cross_year_boundary() {
        let months = monthly_views(&[], at(2024, 2, 10));
        let names: Vec<&str> = months.iter().map(|m| m.month.as_str()).collect();
        assert_eq!(names, vec!["Sep", "Oct", "Nov", "Dec", "Jan", "Feb"]);
        assert_eq!(views_window_start(at(2024, 2, 10)), Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_monthly_views_buckets() {
        let now = at(2024, 6, 15);
        let views = vec![at(2024, 6, 1), at(2024, 6, 2), at(2024, 1, 31), at(2023, 12, 1)];
        let months = monthly_views(&views, now);

        assert_eq!(months.len(), 6);
        assert_eq!(months[0], MonthlyViews { month: "Jan".into(), views: 1 });
        assert_eq!(months[5], MonthlyViews { month: "Jun".into(), views: 2 });
        assert_eq!(months.iter().map(|m| m.views).sum::<u64>(), 3);
    }

    #[test]
    fn test_top_technologies_ranking() {
        let projects = vec![
            project(&["Rust", "React"], "completed"),
            project(&["Rust", "Go"], "completed"),
            project(&["Rust", "Axum", "Go"], "ongoing"),
        ];
        let top = top_technologies(&projects);

        assert_eq!(top[0], TechnologyCount { name: "Rust".into(), count: 3, percentage: 100 });
        assert_eq!(top[1], TechnologyCount { name: "Go".into(), count: 2, percentage: 67 });
        // Ties sorted by name
        assert_eq!(top[2].name, "Axum");
        assert_eq!(top[3].name, "React");
        assert_eq!(top[3].percentage, 33);
    }

    #[test]
    fn test_top_technologies_caps_at_five() {
        let projects = vec![project(&["a", "b", "c", "d", "e", "f", "g"], "completed")];
        assert_eq!(top_technologies(&projects).len(), TOP_TECHNOLOGIES);
        assert!(top_technologies(&[]).is_empty());
    }

    #[test]
    fn test_dashboard_stats() {
        let mut hack = project(&["Rust"], "ongoing");
        hack.hackathon = Some(Hackathon {
            name: "HackMIT".into(),
            date: NaiveDate::from_ymd_opt(2024, 9, 14).unwrap(),
            location: "Cambridge".into(),
            duration: None,
            organizer: None,
            website: None,
        });
        hack.metrics.github_stars = Some(40);
        let mut plain = project(&["Go"], "completed");
        plain.metrics.github_stars = Some(2);
        let abandoned = project(&["Go"], "abandoned");

        let achievements = vec![achievement("award"), achievement("award"), achievement("certificate")];
        let now = at(2024, 6, 15);
        let stats = dashboard_stats(&[hack, plain, abandoned], &achievements, 17, &[at(2024, 6, 1)], now);

        assert_eq!(stats.total_projects, 3);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.ongoing_projects, 1);
        assert_eq!(stats.total_achievements, 3);
        assert_eq!(stats.portfolio_views, 17);
        assert_eq!(stats.github_stars, 42);
        assert_eq!(stats.hackathons_attended, 1);
        assert_eq!(stats.awards_won, 2);
        assert_eq!(stats.monthly_views[5].views, 1);

        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["totalProjects"], 3);
        assert_eq!(json["topTechnologies"][0]["name"], "Go");
        assert_eq!(json["monthlyViews"][0]["month"], "Jan");
    }
}
