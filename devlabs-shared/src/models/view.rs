/// Portfolio view records
///
/// One row per view of a public portfolio page by someone other than its
/// owner. The `users.portfolio_views` counter is bumped in the same write.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE portfolio_views (
///     id BIGSERIAL PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     viewed_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioView {
    /// Owner of the viewed portfolio
    pub user_id: Uuid,
    pub viewed_at: DateTime<Utc>,
}
