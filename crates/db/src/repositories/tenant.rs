use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use hrflow_core::approvals::TenantPolicy;
use hrflow_core::domain::tenant::{Tenant, TenantId};

use super::{RepositoryError, TenantRepository};
use crate::DbPool;

pub struct SqlTenantRepository {
    pool: DbPool,
}

impl SqlTenantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TenantRepository for SqlTenantRepository {
    async fn find_by_id(
        &self,
        id: &TenantId,
    ) -> Result<Option<(Tenant, TenantPolicy)>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, require_ceo_offboarding, require_ceo_rehire, created_at
             FROM tenant WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };

        let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let name: String =
            row.try_get("name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let require_ceo_offboarding: i64 = row
            .try_get("require_ceo_offboarding")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let require_ceo_rehire: i64 = row
            .try_get("require_ceo_rehire")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at: String =
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at)
            .map_err(|e| RepositoryError::Decode(e.to_string()))?
            .with_timezone(&Utc);

        Ok(Some((
            Tenant { id: TenantId(id), name, created_at },
            TenantPolicy {
                require_ceo_offboarding: require_ceo_offboarding != 0,
                require_ceo_rehire: require_ceo_rehire != 0,
            },
        )))
    }

    async fn save(&self, tenant: &Tenant, policy: &TenantPolicy) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO tenant (id, name, require_ceo_offboarding, require_ceo_rehire, created_at)
             VALUES (?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 require_ceo_offboarding = excluded.require_ceo_offboarding,
                 require_ceo_rehire = excluded.require_ceo_rehire",
        )
        .bind(&tenant.id.0)
        .bind(&tenant.name)
        .bind(policy.require_ceo_offboarding as i64)
        .bind(policy.require_ceo_rehire as i64)
        .bind(tenant.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use hrflow_core::approvals::TenantPolicy;
    use hrflow_core::domain::tenant::{Tenant, TenantId};

    use super::SqlTenantRepository;
    use crate::repositories::TenantRepository;
    use crate::{connect_with_settings, migrations};

    #[tokio::test]
    async fn policy_flags_round_trip() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let repo = SqlTenantRepository::new(pool);
        let tenant = Tenant {
            id: TenantId("acme".to_string()),
            name: "Acme".to_string(),
            created_at: Utc::now(),
        };
        let policy = TenantPolicy { require_ceo_offboarding: true, require_ceo_rehire: false };
        repo.save(&tenant, &policy).await.expect("save");

        let (found, found_policy) = repo
            .find_by_id(&TenantId("acme".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.name, "Acme");
        assert_eq!(found_policy, policy);
    }

    #[tokio::test]
    async fn save_upserts_policy_changes() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");

        let repo = SqlTenantRepository::new(pool);
        let tenant = Tenant {
            id: TenantId("acme".to_string()),
            name: "Acme".to_string(),
            created_at: Utc::now(),
        };
        repo.save(&tenant, &TenantPolicy::default()).await.expect("save");
        repo.save(
            &tenant,
            &TenantPolicy { require_ceo_offboarding: true, require_ceo_rehire: true },
        )
        .await
        .expect("upsert");

        let (_, policy) = repo
            .find_by_id(&TenantId("acme".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert!(policy.require_ceo_offboarding);
        assert!(policy.require_ceo_rehire);
    }
}
