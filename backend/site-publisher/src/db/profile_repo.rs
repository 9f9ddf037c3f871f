/// Profile repository - caller role and business membership
use async_trait::async_trait;
use sqlx::PgPool;

use super::ProfileDirectory;
use crate::error::Result;
use crate::models::{Role, UserProfile};

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    uid: String,
    role: String,
    business_id: Option<String>,
}

#[derive(Clone)]
pub struct PgProfileDirectory {
    pool: PgPool,
}

impl PgProfileDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProfileDirectory for PgProfileDirectory {
    async fn find_profile(&self, uid: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            "SELECT uid, role, business_id FROM user_profiles WHERE uid = $1",
        )
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| UserProfile {
            uid: row.uid,
            role: Role::parse(&row.role),
            business_id: row.business_id,
        }))
    }
}
