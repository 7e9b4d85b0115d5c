//! PostgreSQL implementation of ClinicRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::clinic::{Clinic, LicenseKey};
use crate::domain::foundation::{ClinicId, DomainError, ErrorCode, Timestamp};
use crate::domain::subscription::Tier;
use crate::ports::ClinicRepository;

use super::{corrupt, db_error};

pub struct PostgresClinicRepository {
    pool: PgPool,
}

impl PostgresClinicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ClinicRow {
    id: Uuid,
    name: String,
    clinic_name: Option<String>,
    email: String,
    phone: Option<String>,
    license_key: String,
    tier: String,
    doctor_name: Option<String>,
    profile_picture_url: Option<String>,
    verified_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ClinicRow> for Clinic {
    type Error = DomainError;

    fn try_from(row: ClinicRow) -> Result<Self, Self::Error> {
        let license_key = LicenseKey::parse(&row.license_key)
            .map_err(|e| corrupt(format!("Invalid license_key for clinic {}: {}", row.id, e)))?;
        let tier = Tier::parse(&row.tier)
            .ok_or_else(|| corrupt(format!("Invalid tier value: {}", row.tier)))?;

        Ok(Clinic {
            id: ClinicId::from_uuid(row.id),
            name: row.name,
            clinic_name: row.clinic_name,
            email: row.email,
            phone: row.phone,
            license_key,
            tier,
            doctor_name: row.doctor_name,
            profile_picture_url: row.profile_picture_url,
            verified_at: row.verified_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_CLINIC: &str = r#"
    SELECT id, name, clinic_name, email, phone, license_key, tier, doctor_name,
           profile_picture_url, verified_at, created_at, updated_at
    FROM clinics
"#;

impl PostgresClinicRepository {
    async fn find_one(&self, filter: &str, value: impl AsRef<str>) -> Result<Option<Clinic>, DomainError> {
        let sql = format!("{} WHERE {} = $1", SELECT_CLINIC, filter);
        let row: Option<ClinicRow> = sqlx::query_as(&sql)
            .bind(value.as_ref())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load clinic", e))?;
        row.map(Clinic::try_from).transpose()
    }
}

#[async_trait]
impl ClinicRepository for PostgresClinicRepository {
    async fn insert(&self, clinic: &Clinic) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO clinics (
                id, name, clinic_name, email, phone, license_key, tier, doctor_name,
                profile_picture_url, verified_at, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(clinic.id.as_uuid())
        .bind(&clinic.name)
        .bind(&clinic.clinic_name)
        .bind(&clinic.email)
        .bind(&clinic.phone)
        .bind(clinic.license_key.as_str())
        .bind(clinic.tier.as_str())
        .bind(&clinic.doctor_name)
        .bind(&clinic.profile_picture_url)
        .bind(clinic.verified_at.map(|t| *t.as_datetime()))
        .bind(clinic.created_at.as_datetime())
        .bind(clinic.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                match db_err.constraint() {
                    Some("clinics_email_key") => {
                        return DomainError::new(
                            ErrorCode::EmailAlreadyRegistered,
                            "Email already registered",
                        );
                    }
                    Some("clinics_license_key_key") => {
                        return DomainError::new(
                            ErrorCode::LicenseKeyConflict,
                            "License key already issued",
                        );
                    }
                    _ => {}
                }
            }
            db_error("Failed to insert clinic", e)
        })?;

        Ok(())
    }

    async fn update(&self, clinic: &Clinic) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE clinics SET
                name = $2,
                clinic_name = $3,
                phone = $4,
                tier = $5,
                doctor_name = $6,
                profile_picture_url = $7,
                verified_at = $8,
                updated_at = $9
            WHERE id = $1
            "#,
        )
        .bind(clinic.id.as_uuid())
        .bind(&clinic.name)
        .bind(&clinic.clinic_name)
        .bind(&clinic.phone)
        .bind(clinic.tier.as_str())
        .bind(&clinic.doctor_name)
        .bind(&clinic.profile_picture_url)
        .bind(clinic.verified_at.map(|t| *t.as_datetime()))
        .bind(clinic.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update clinic", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::ClinicNotFound,
                format!("Clinic not found: {}", clinic.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &ClinicId) -> Result<Option<Clinic>, DomainError> {
        let sql = format!("{} WHERE id = $1", SELECT_CLINIC);
        let row: Option<ClinicRow> = sqlx::query_as(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to load clinic", e))?;
        row.map(Clinic::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Clinic>, DomainError> {
        self.find_one("email", email).await
    }

    async fn find_by_license_key(&self, key: &LicenseKey) -> Result<Option<Clinic>, DomainError> {
        self.find_one("license_key", key.as_str()).await
    }

    async fn delete(&self, id: &ClinicId) -> Result<(), DomainError> {
        sqlx::query("DELETE FROM clinics WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete clinic", e))?;
        Ok(())
    }
}
