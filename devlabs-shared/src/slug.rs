//! Portfolio slug generation
//!
//! New users get a slug derived from their name: `Ada Lovelace` becomes
//! `ada-lovelace`, and if that is taken, `ada-lovelace-1`, `ada-lovelace-2`
//! and so on.
//!
//! Probing for a free slug and inserting the user are separate steps, so two
//! concurrent registrations can pick the same candidate. The store's unique
//! constraint catches that; [`insert_with_unique_slug`] then re-probes and
//! retries a bounded number of times.

use tracing::{debug, warn};

use crate::models::user::{NewUser, User};
use crate::store::{StoreError, StoreResult, UniqueField, UserStore};
use crate::validation::{SLUG_MAX_LEN, SLUG_MIN_LEN};

/// How many times registration re-resolves the slug after losing a race
pub const MAX_SLUG_ATTEMPTS: usize = 5;

/// Fallback when a name has no usable characters
const FALLBACK_SLUG: &str = "user";

/// Derives the base slug for a first and last name
///
/// Lowercases `"{first}-{last}"`, turns every character outside `[a-z0-9]`
/// into `-`, collapses runs of `-` and trims them from both ends. The result
/// is cut to [`SLUG_MAX_LEN`]; anything shorter than [`SLUG_MIN_LEN`] gets a
/// `-user` tail (`jo` becomes `jo-user`).
pub fn base_slug(first_name: &str, last_name: &str) -> String {
    let raw = format!("{first_name}-{last_name}").to_lowercase();

    let mut slug = String::with_capacity(raw.len());
    for c in raw.chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            slug.push(c);
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }

    let slug = truncate(&slug, SLUG_MAX_LEN);
    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else if slug.len() < SLUG_MIN_LEN {
        format!("{slug}-{FALLBACK_SLUG}")
    } else {
        slug.to_string()
    }
}

/// The `n`th candidate for a base slug: `base`, `base-1`, `base-2`, ...
///
/// The base is shortened so the suffixed slug still fits [`SLUG_MAX_LEN`].
pub fn candidate(base: &str, n: usize) -> String {
    if n == 0 {
        return truncate(base, SLUG_MAX_LEN).to_string();
    }
    let suffix = format!("-{n}");
    let base = truncate(base, SLUG_MAX_LEN.saturating_sub(suffix.len()));
    format!("{base}{suffix}")
}

/// Cuts an ASCII slug to `max` bytes and drops trailing hyphens
fn truncate(slug: &str, max: usize) -> &str {
    let end = slug
        .char_indices()
        .nth(max)
        .map_or(slug.len(), |(idx, _)| idx);
    slug[..end].trim_end_matches('-')
}

/// Resolves `base` to a slug no stored user has
///
/// Returns `base` unchanged when it is free.
pub async fn resolve_unique_slug<S>(store: &S, base: &str) -> StoreResult<String>
where
    S: UserStore + ?Sized,
{
    let mut n = 0;
    loop {
        let slug = candidate(base, n);
        if !store.slug_taken(&slug).await? {
            return Ok(slug);
        }
        n += 1;
    }
}

/// Inserts a new user under a unique slug derived from `new_user.portfolio_slug`
///
/// If another registration claims the resolved slug between the probe and the
/// insert, the slug is resolved again and the insert retried, up to
/// [`MAX_SLUG_ATTEMPTS`] times. A duplicate email is returned immediately.
pub async fn insert_with_unique_slug<S>(store: &S, new_user: NewUser) -> StoreResult<User>
where
    S: UserStore + ?Sized,
{
    let base = new_user.portfolio_slug.clone();
    let id = uuid::Uuid::new_v4();
    let now = chrono::Utc::now();

    for attempt in 1..=MAX_SLUG_ATTEMPTS {
        let slug = resolve_unique_slug(store, &base).await?;
        let user = NewUser {
            portfolio_slug: slug.clone(),
            ..new_user.clone()
        }
        .into_user(id, now);

        match store.insert_user(user).await {
            Ok(user) => {
                debug!(user_id = %user.id, slug = %slug, attempt, "Registered user slug");
                return Ok(user);
            }
            Err(StoreError::Duplicate(UniqueField::PortfolioSlug)) => {
                warn!(slug = %slug, attempt, "Portfolio slug claimed concurrently, retrying");
            }
            Err(err) => return Err(err),
        }
    }

    Err(StoreError::Duplicate(UniqueField::PortfolioSlug))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::Profile;
    use crate::validation::validate_slug;
    use crate::store::MemoryStore;
    use std::collections::HashSet;

    #[test]
    fn test_base_slug() {
        assert_eq!(base_slug("Ada", "Lovelace"), "ada-lovelace");
        assert_eq!(base_slug("  Mary Ann ", "O'Neil"), "mary-ann-o-neil");
        assert_eq!(base_slug("José", "Núñez"), "jos-n-ez");
        assert_eq!(base_slug("--", "!!"), "user");
        assert_eq!(base_slug("R2", "D2"), "r2-d2");
    }

    #[test]
    fn test_candidate() {
        assert_eq!(candidate("ada", 0), "ada");
        assert_eq!(candidate("ada", 3), "ada-3");
    }

    #[test]
    fn test_generated_slugs_pass_slug_rule() {
        let long_first = "A".repeat(50);
        let long_last = "B".repeat(50);
        let names = [
            ("Jo", "李明"),
            ("李", "明"),
            ("A", ""),
            ("Al", "-"),
            (long_first.as_str(), long_last.as_str()),
            (&long_first[..30], &long_last[..30]),
            (&long_first[..48], "-x"),
        ];

        for (first, last) in names {
            let base = base_slug(first, last);
            for n in [0, 1, 9, 10, 999, 123_456] {
                let slug = candidate(&base, n);
                assert!(
                    validate_slug(&slug).is_ok(),
                    "{first:?} {last:?} #{n} gave {slug:?}"
                );
                assert!(!slug.ends_with('-'), "{slug:?}");
            }
        }

        assert_eq!(base_slug("Jo", "李明"), "jo-user");
        assert_eq!(base_slug(&long_first, &long_last).len(), SLUG_MAX_LEN);
        assert_eq!(candidate(&"a".repeat(50), 12), format!("{}-12", "a".repeat(47)));
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            profile: Profile::named("Ada", "Lovelace"),
            portfolio_slug: "ada-lovelace".to_string(),
        }
    }

    #[tokio::test]
    async fn test_resolve_unique_slug_against_store() {
        let store = MemoryStore::new();
        assert_eq!(
            resolve_unique_slug(&store, "ada-lovelace").await.unwrap(),
            "ada-lovelace"
        );

        insert_with_unique_slug(&store, new_user("a@x.com")).await.unwrap();
        insert_with_unique_slug(&store, new_user("b@x.com")).await.unwrap();
        let third = insert_with_unique_slug(&store, new_user("c@x.com"))
            .await
            .unwrap();
        assert_eq!(third.settings.portfolio_slug, "ada-lovelace-2");
    }

    #[tokio::test]
    async fn test_resolve_skips_every_collision() {
        let store = MemoryStore::new();
        for k in 0..8 {
            let taken: HashSet<String> = (0..k).map(|n| candidate("ada-lovelace", n)).collect();
            let slug = resolve_unique_slug(&store, "ada-lovelace").await.unwrap();
            assert!(!taken.contains(&slug), "collision after {k} taken");
            assert_eq!(slug, candidate("ada-lovelace", k));

            insert_with_unique_slug(&store, new_user(&format!("{k}@x.com")))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_not_retried() {
        let store = MemoryStore::new();
        insert_with_unique_slug(&store, new_user("a@x.com")).await.unwrap();
        let err = insert_with_unique_slug(&store, new_user("a@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));
    }

    #[tokio::test]
    async fn test_concurrent_registrations_get_distinct_slugs() {
        let store = std::sync::Arc::new(MemoryStore::new());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    insert_with_unique_slug(store.as_ref(), new_user(&format!("{i}@x.com"))).await
                })
            })
            .collect();

        let mut slugs = HashSet::new();
        for handle in handles {
            if let Ok(Ok(user)) = handle.await {
                assert!(slugs.insert(user.settings.portfolio_slug));
            }
        }
        assert!(!slugs.is_empty());
    }
}
