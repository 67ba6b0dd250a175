//! Address and `user_address` link queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use bookstore_core::{AddressId, UserId};

use super::RepositoryError;
use crate::models::{Address, NewAddress, UserAddress};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct AddressRow {
    id: AddressId,
    line1: String,
    line2: Option<String>,
    number: Option<String>,
    city: String,
    state: String,
    country: String,
    zipcode: String,
    created_at: DateTime<Utc>,
}

impl From<AddressRow> for Address {
    fn from(row: AddressRow) -> Self {
        Self {
            id: row.id,
            line1: row.line1,
            line2: row.line2,
            number: row.number,
            city: row.city,
            state: row.state,
            country: row.country,
            zipcode: row.zipcode,
            created_at: row.created_at,
        }
    }
}

/// Internal row type for a user's linked addresses.
#[derive(Debug, sqlx::FromRow)]
struct UserAddressRow {
    #[sqlx(flatten)]
    address: AddressRow,
    is_default: bool,
}

/// Repository for address and address link queries.
pub struct AddressRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> AddressRepository<'c> {
    /// Create a new address and address link repository.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Get an address by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&mut self, id: AddressId) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, line1, line2, number, city, state, country, zipcode, created_at
            FROM bookstore.address
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an address by ID and keep it from being deleted until the
    /// transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_share(
        &mut self,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, line1, line2, number, city, state, country, zipcode, created_at
            FROM bookstore.address
            WHERE id = $1
            FOR SHARE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an address by ID and lock it until the transaction ends.
    ///
    /// An order placement that references the address blocks on this lock,
    /// or holds it first and is visible once this returns.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_update(
        &mut self,
        id: AddressId,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, line1, line2, number, city, state, country, zipcode, created_at
            FROM bookstore.address
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Find a stored address with exactly the same fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_identical(
        &mut self,
        address: &NewAddress,
    ) -> Result<Option<Address>, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            SELECT id, line1, line2, number, city, state, country, zipcode, created_at
            FROM bookstore.address
            WHERE line1 = $1
              AND line2 IS NOT DISTINCT FROM $2
              AND number IS NOT DISTINCT FROM $3
              AND city = $4
              AND state = $5
              AND country = $6
              AND zipcode = $7
            ",
        )
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.number)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.zipcode)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a new address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an identical address was inserted
    /// concurrently.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(&mut self, address: &NewAddress) -> Result<Address, RepositoryError> {
        let row = sqlx::query_as::<_, AddressRow>(
            r"
            INSERT INTO bookstore.address (line1, line2, number, city, state, country, zipcode)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, line1, line2, number, city, state, country, zipcode, created_at
            ",
        )
        .bind(&address.line1)
        .bind(&address.line2)
        .bind(&address.number)
        .bind(&address.city)
        .bind(&address.state)
        .bind(&address.country)
        .bind(&address.zipcode)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "address already exists"))?;

        Ok(row.into())
    }

    /// Check whether the address is in the user's address list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_linked(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let linked = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(
                SELECT 1 FROM bookstore.user_address
                WHERE user_id = $1 AND address_id = $2
            )
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .fetch_one(&mut *self.conn)
        .await?;

        Ok(linked)
    }

    /// Check whether the address is in the user's address list and keep the
    /// link from being removed until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_linked_for_share(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let link = sqlx::query_scalar::<_, bool>(
            r"
            SELECT is_default FROM bookstore.user_address
            WHERE user_id = $1 AND address_id = $2
            FOR SHARE
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(link.is_some())
    }

    /// Add the address to the user's list. The first address a user links
    /// becomes their default.
    ///
    /// Returns whether the new link is the default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the address is already linked.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn link(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let is_default = sqlx::query_scalar::<_, bool>(
            r"
            INSERT INTO bookstore.user_address (user_id, address_id, is_default)
            VALUES (
                $1,
                $2,
                NOT EXISTS(SELECT 1 FROM bookstore.user_address WHERE user_id = $1)
            )
            RETURNING is_default
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "address already linked"))?;

        Ok(is_default)
    }

    /// List the user's addresses, default first, then oldest link first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &mut self,
        user_id: UserId,
    ) -> Result<Vec<UserAddress>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserAddressRow>(
            r"
            SELECT a.id, a.line1, a.line2, a.number, a.city, a.state, a.country,
                   a.zipcode, a.created_at, ua.is_default
            FROM bookstore.user_address ua
            JOIN bookstore.address a ON a.id = ua.address_id
            WHERE ua.user_id = $1
            ORDER BY ua.is_default DESC, ua.created_at, a.id
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserAddress {
                address: row.address.into(),
                is_default: row.is_default,
            })
            .collect())
    }

    /// Make the linked address the user's only default.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the address is not linked.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_default(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<(), RepositoryError> {
        // Clear first: the partial unique index allows one default per user.
        sqlx::query(
            r"
            UPDATE bookstore.user_address
            SET is_default = FALSE
            WHERE user_id = $1 AND is_default AND address_id <> $2
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .execute(&mut *self.conn)
        .await?;

        let result = sqlx::query(
            r"
            UPDATE bookstore.user_address
            SET is_default = TRUE
            WHERE user_id = $1 AND address_id = $2
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Remove the address from the user's list.
    ///
    /// Returns `Some(was_default)` if a link was removed, `None` if there was
    /// none.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unlink(
        &mut self,
        user_id: UserId,
        address_id: AddressId,
    ) -> Result<Option<bool>, RepositoryError> {
        let was_default = sqlx::query_scalar::<_, bool>(
            r"
            DELETE FROM bookstore.user_address
            WHERE user_id = $1 AND address_id = $2
            RETURNING is_default
            ",
        )
        .bind(user_id)
        .bind(address_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(was_default)
    }

    /// Make the user's oldest remaining link the default.
    ///
    /// Returns the promoted address, or `None` if the user has no addresses left.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn promote_default(
        &mut self,
        user_id: UserId,
    ) -> Result<Option<AddressId>, RepositoryError> {
        let promoted = sqlx::query_scalar::<_, AddressId>(
            r"
            UPDATE bookstore.user_address
            SET is_default = TRUE
            WHERE user_id = $1
              AND address_id = (
                  SELECT address_id FROM bookstore.user_address
                  WHERE user_id = $1
                  ORDER BY created_at, address_id
                  LIMIT 1
              )
              AND NOT EXISTS(
                  SELECT 1 FROM bookstore.user_address
                  WHERE user_id = $1 AND is_default
              )
            RETURNING address_id
            ",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(promoted)
    }

    /// Delete the address if no user links it and no order references it.
    ///
    /// Returns whether the row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_if_unused(
        &mut self,
        address_id: AddressId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM bookstore.address a
            WHERE a.id = $1
              AND NOT EXISTS(SELECT 1 FROM bookstore.user_address WHERE address_id = a.id)
              AND NOT EXISTS(SELECT 1 FROM bookstore.order WHERE address_id = a.id)
            ",
        )
        .bind(address_id)
        .execute(&mut *self.conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
