use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;

use hrflow_core::domain::employee::{Employee, EmployeeId, EmployeeLifecycle};
use hrflow_core::domain::tenant::TenantId;

use super::{EmployeeRepository, RepositoryError};
use crate::DbPool;

pub struct SqlEmployeeRepository {
    pool: DbPool,
}

impl SqlEmployeeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn parse_lifecycle(raw: &str) -> Result<EmployeeLifecycle, RepositoryError> {
    match raw {
        "active" => Ok(EmployeeLifecycle::Active),
        "offboarding" => Ok(EmployeeLifecycle::Offboarding),
        "offboarded" => Ok(EmployeeLifecycle::Offboarded),
        other => Err(RepositoryError::Decode(format!("unknown lifecycle `{other}`"))),
    }
}

fn row_to_employee(row: &sqlx::sqlite::SqliteRow) -> Result<Employee, RepositoryError> {
    let id: String = row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let tenant_id: String =
        row.try_get("tenant_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let full_name: String =
        row.try_get("full_name").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let email: String =
        row.try_get("email").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let phone: Option<String> =
        row.try_get("phone").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let manager_id: Option<String> =
        row.try_get("manager_id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let lifecycle: String =
        row.try_get("lifecycle").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let created_at: String =
        row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let updated_at: String =
        row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    let parse = |raw: &str| {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    };

    Ok(Employee {
        id: EmployeeId(id),
        tenant_id: TenantId(tenant_id),
        full_name,
        email,
        phone,
        manager_id: manager_id.map(EmployeeId),
        lifecycle: parse_lifecycle(&lifecycle)?,
        created_at: parse(&created_at)?,
        updated_at: parse(&updated_at)?,
    })
}

#[async_trait]
impl EmployeeRepository for SqlEmployeeRepository {
    async fn find_by_id(&self, id: &EmployeeId) -> Result<Option<Employee>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, tenant_id, full_name, email, phone, manager_id, lifecycle,
                    created_at, updated_at
             FROM employee WHERE id = ?",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_employee(r)?)),
            None => Ok(None),
        }
    }

    async fn save(&self, employee: &Employee) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO employee (id, tenant_id, full_name, email, phone, manager_id,
                                   lifecycle, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 full_name = excluded.full_name,
                 email = excluded.email,
                 phone = excluded.phone,
                 manager_id = excluded.manager_id,
                 lifecycle = excluded.lifecycle,
                 updated_at = excluded.updated_at",
        )
        .bind(&employee.id.0)
        .bind(&employee.tenant_id.0)
        .bind(&employee.full_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(employee.manager_id.as_ref().map(|m| m.0.clone()))
        .bind(employee.lifecycle.as_str())
        .bind(employee.created_at.to_rfc3339())
        .bind(employee.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use hrflow_core::domain::employee::{Employee, EmployeeId, EmployeeLifecycle};
    use hrflow_core::domain::tenant::{Tenant, TenantId};

    use super::SqlEmployeeRepository;
    use crate::repositories::{EmployeeRepository, SqlTenantRepository, TenantRepository};
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        SqlTenantRepository::new(pool.clone())
            .save(
                &Tenant {
                    id: TenantId("acme".to_string()),
                    name: "Acme".to_string(),
                    created_at: Utc::now(),
                },
                &Default::default(),
            )
            .await
            .expect("tenant");
        pool
    }

    fn sample(id: &str, manager: Option<&str>) -> Employee {
        let now = Utc::now();
        Employee {
            id: EmployeeId(id.to_string()),
            tenant_id: TenantId("acme".to_string()),
            full_name: "Jane Doe".to_string(),
            email: "jane.doe@acme.test".to_string(),
            phone: Some("+1 555 867 5309".to_string()),
            manager_id: manager.map(|m| EmployeeId(m.to_string())),
            lifecycle: EmployeeLifecycle::Active,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn save_and_find_round_trips_the_manager_link() {
        let pool = setup().await;
        let repo = SqlEmployeeRepository::new(pool);

        repo.save(&sample("emp-1", None)).await.expect("save manager");
        repo.save(&sample("emp-2", Some("emp-1"))).await.expect("save report");

        let found = repo
            .find_by_id(&EmployeeId("emp-2".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.manager_id, Some(EmployeeId("emp-1".to_string())));
        assert_eq!(found.lifecycle, EmployeeLifecycle::Active);
    }

    #[tokio::test]
    async fn save_upserts_lifecycle_and_masked_contacts() {
        let pool = setup().await;
        let repo = SqlEmployeeRepository::new(pool);

        repo.save(&sample("emp-1", None)).await.expect("save");

        let mut updated = sample("emp-1", None);
        updated.lifecycle = EmployeeLifecycle::Offboarded;
        updated.email = "j***@acme.test".to_string();
        updated.phone = Some("***-5309".to_string());
        updated.updated_at = Utc::now();
        repo.save(&updated).await.expect("upsert");

        let found = repo
            .find_by_id(&EmployeeId("emp-1".to_string()))
            .await
            .expect("find")
            .expect("should exist");
        assert_eq!(found.lifecycle, EmployeeLifecycle::Offboarded);
        assert_eq!(found.email, "j***@acme.test");
    }
}
