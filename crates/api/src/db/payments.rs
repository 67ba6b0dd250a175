//! Payment card queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use bookstore_core::{CardExpiry, CardNumber, PaymentId, UserId};

use super::RepositoryError;
use crate::models::{NewPayment, Payment};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: PaymentId,
    user_id: Option<UserId>,
    card_number: String,
    expiry_month: i32,
    expiry_year: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = RepositoryError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let card_number = CardNumber::parse(&row.card_number).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid card number in database: {e}"))
        })?;
        let month = u32::try_from(row.expiry_month).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid expiry month in database: {}",
                row.expiry_month
            ))
        })?;

        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            card_number,
            // Expiry is not re-validated on read.
            expiry: CardExpiry {
                month,
                year: row.expiry_year,
            },
            created_at: row.created_at,
        })
    }
}

/// Repository for payment card queries.
pub struct PaymentRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PaymentRepository<'c> {
    /// Create a new payment card repository.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Get a payment by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored card is invalid.
    pub async fn find(&mut self, id: PaymentId) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, user_id, card_number, expiry_month, expiry_year, created_at
            FROM bookstore.payment
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a payment by ID and keep it from being deleted or detached until
    /// the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored card is invalid.
    pub async fn find_for_share(
        &mut self,
        id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, user_id, card_number, expiry_month, expiry_year, created_at
            FROM bookstore.payment
            WHERE id = $1
            FOR SHARE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Get a payment by ID and lock it until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored card is invalid.
    pub async fn find_for_update(
        &mut self,
        id: PaymentId,
    ) -> Result<Option<Payment>, RepositoryError> {
        let row = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, user_id, card_number, expiry_month, expiry_year, created_at
            FROM bookstore.payment
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// List the payments attached to the user's wallet, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored card is invalid.
    pub async fn list_for_user(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<Payment>, RepositoryError> {
        let rows = sqlx::query_as::<_, PaymentRow>(
            r"
            SELECT id, user_id, card_number, expiry_month, expiry_year, created_at
            FROM bookstore.payment
            WHERE user_id = $1
            ORDER BY created_at, id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Attach a new card to the user's wallet.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user already has this card.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &mut self,
        user_id: UserId,
        payment: &NewPayment,
    ) -> Result<Payment, RepositoryError> {
        let month = i32::try_from(payment.expiry.month).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid expiry month {}",
                payment.expiry.month
            ))
        })?;

        let row = sqlx::query_as::<_, PaymentRow>(
            r"
            INSERT INTO bookstore.payment (user_id, card_number, expiry_month, expiry_year)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, card_number, expiry_month, expiry_year, created_at
            ",
        )
        .bind(user_id)
        .bind(payment.card_number.as_str())
        .bind(month)
        .bind(payment.expiry.year)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "card already in wallet"))?;

        row.try_into()
    }

    /// Check whether any order was paid with this card.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_referenced(&mut self, id: PaymentId) -> Result<bool, RepositoryError> {
        let referenced = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM bookstore.order WHERE payment_id = $1)
            ",
        )
        .bind(id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(referenced)
    }

    /// Remove the card from its owner's wallet, keeping the row for the orders
    /// that reference it.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn detach(&mut self, id: PaymentId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE bookstore.payment SET user_id = NULL WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        Ok(())
    }

    /// Delete the card.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was deleted.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&mut self, id: PaymentId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM bookstore.payment WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }
}
