//! PostgreSQL donation repository.
//!
//! Idempotency lives here: the `donations_stripe_payment_id_key` unique
//! constraint is the sole arbiter of "already recorded". The insert uses
//! `ON CONFLICT DO NOTHING` so concurrent duplicate deliveries race
//! safely inside the database instead of in application code.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::donation::{Donation, DonationFrequency, DonationStatus};
use crate::ports::{DonationRepository, InsertOutcome, RepositoryError};

const PAYMENT_ID_CONSTRAINT: &str = "donations_stripe_payment_id_key";

pub struct PostgresDonationRepository {
    pool: PgPool,
}

impl PostgresDonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DonationRow {
    id: Uuid,
    amount: i64,
    donor_name: String,
    donor_email: String,
    frequency: String,
    status: String,
    stripe_payment_id: String,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<DonationRow> for Donation {
    type Error = RepositoryError;

    fn try_from(row: DonationRow) -> Result<Self, Self::Error> {
        let frequency = DonationFrequency::parse(&row.frequency).ok_or_else(|| {
            RepositoryError::Database(format!("unknown frequency value: {}", row.frequency))
        })?;
        let status = DonationStatus::parse(&row.status).ok_or_else(|| {
            RepositoryError::Database(format!("unknown status value: {}", row.status))
        })?;

        Ok(Donation {
            id: row.id,
            amount: row.amount,
            donor_name: row.donor_name,
            donor_email: row.donor_email,
            frequency,
            status,
            stripe_payment_id: row.stripe_payment_id,
            stripe_customer_id: row.stripe_customer_id,
            stripe_subscription_id: row.stripe_subscription_id,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl DonationRepository for PostgresDonationRepository {
    async fn insert(&self, donation: &Donation) -> Result<InsertOutcome, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO donations (
                id, amount, donor_name, donor_email, frequency, status,
                stripe_payment_id, stripe_customer_id, stripe_subscription_id,
                created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (stripe_payment_id) DO NOTHING
            "#,
        )
        .bind(donation.id)
        .bind(donation.amount)
        .bind(&donation.donor_name)
        .bind(&donation.donor_email)
        .bind(donation.frequency.as_str())
        .bind(donation.status.as_str())
        .bind(&donation.stripe_payment_id)
        .bind(&donation.stripe_customer_id)
        .bind(&donation.stripe_subscription_id)
        .bind(donation.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) if done.rows_affected() == 0 => Ok(InsertOutcome::AlreadyRecorded),
            Ok(_) => Ok(InsertOutcome::Inserted),
            Err(sqlx::Error::Database(db_err))
                if db_err.constraint() == Some(PAYMENT_ID_CONSTRAINT) =>
            {
                Ok(InsertOutcome::AlreadyRecorded)
            }
            Err(e) => Err(RepositoryError::Database(e.to_string())),
        }
    }

    async fn find_by_payment_id(
        &self,
        stripe_payment_id: &str,
    ) -> Result<Option<Donation>, RepositoryError> {
        let row: Option<DonationRow> = sqlx::query_as(
            r#"
            SELECT id, amount, donor_name, donor_email, frequency, status,
                   stripe_payment_id, stripe_customer_id, stripe_subscription_id,
                   created_at
            FROM donations
            WHERE stripe_payment_id = $1
            "#,
        )
        .bind(stripe_payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        row.map(Donation::try_from).transpose()
    }
}
