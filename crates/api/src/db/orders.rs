//! Order and order line queries.

use chrono::{DateTime, Utc};
use sqlx::PgConnection;

use bookstore_core::{
    AddressId, Amount, BookId, OrderId, OrderLineId, OrderStatus, PaymentId, ShippingMethod,
    UserId,
};

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderLine};

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    payment_id: PaymentId,
    address_id: AddressId,
    status: OrderStatus,
    shipping_method: ShippingMethod,
    subtotal: Amount,
    tax: Amount,
    shipping_cost: Amount,
    total: Amount,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            payment_id: row.payment_id,
            address_id: row.address_id,
            status: row.status,
            shipping_method: row.shipping_method,
            subtotal: row.subtotal,
            tax: row.tax,
            shipping_cost: row.shipping_cost,
            total: row.total,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Internal row type for database queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderLineRow {
    id: OrderLineId,
    order_id: OrderId,
    book_id: BookId,
    quantity: i32,
}

impl From<OrderLineRow> for OrderLine {
    fn from(row: OrderLineRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            book_id: row.book_id,
            quantity: row.quantity,
        }
    }
}

/// Who an order belongs to and what it is paid with and shipped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderParties {
    pub user_id: UserId,
    pub payment_id: PaymentId,
    pub address_id: AddressId,
}

/// Repository for order and order line queries.
pub struct OrderRepository<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> OrderRepository<'c> {
    /// Create a new order and order line repository.
    #[must_use]
    pub const fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Insert an order row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user, payment or address no
    /// longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert(
        &mut self,
        parties: OrderParties,
        order: &NewOrder,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO bookstore.order
                (user_id, payment_id, address_id, status, shipping_method,
                 subtotal, tax, shipping_cost, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, user_id, payment_id, address_id, status, shipping_method,
                      subtotal, tax, shipping_cost, total, created_at, updated_at
            ",
        )
        .bind(parties.user_id)
        .bind(parties.payment_id)
        .bind(parties.address_id)
        .bind(order.status)
        .bind(order.shipping_method)
        .bind(order.subtotal)
        .bind(order.tax)
        .bind(order.shipping_cost)
        .bind(order.total)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "order already exists"))?;

        Ok(row.into())
    }

    /// Insert one order line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book no longer exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn insert_line(
        &mut self,
        order_id: OrderId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<OrderLine, RepositoryError> {
        let row = sqlx::query_as::<_, OrderLineRow>(
            r"
            INSERT INTO bookstore.order_line (order_id, book_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, order_id, book_id, quantity
            ",
        )
        .bind(order_id)
        .bind(book_id)
        .bind(quantity)
        .fetch_one(&mut *self.conn)
        .await
        .map_err(|e| RepositoryError::from_constraint(e, "order line already exists"))?;

        Ok(row.into())
    }

    /// Get an order by ID and lock it until the transaction ends.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_for_update(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, payment_id, address_id, status, shipping_method,
                   subtotal, tax, shipping_cost, total, created_at, updated_at
            FROM bookstore.order
            WHERE id = $1
            FOR UPDATE
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, payment_id, address_id, status, shipping_method,
                   subtotal, tax, shipping_cost, total, created_at, updated_at
            FROM bookstore.order
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(&mut *self.conn)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List every order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&mut self) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, payment_id, address_id, status, shipping_method,
                   subtotal, tax, shipping_cost, total, created_at, updated_at
            FROM bookstore.order
            ORDER BY id
            ",
        )
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List the lines of every order in `order_ids`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lines_for(
        &mut self,
        order_ids: &[OrderId],
    ) -> Result<Vec<OrderLine>, RepositoryError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, OrderLineRow>(
            r"
            SELECT id, order_id, book_id, quantity
            FROM bookstore.order_line
            WHERE order_id = ANY($1)
            ORDER BY order_id, id
            ",
        )
        .bind(order_ids)
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Set an order's status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn set_status(
        &mut self,
        id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE bookstore.order
            SET status = $2
            WHERE id = $1
            RETURNING id, user_id, payment_id, address_id, status, shipping_method,
                      subtotal, tax, shipping_cost, total, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&mut *self.conn)
        .await?;

        row.map(Into::into).ok_or(RepositoryError::NotFound)
    }

    /// Delete an order and its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn delete(&mut self, id: OrderId) -> Result<u64, RepositoryError> {
        let lines = sqlx::query("DELETE FROM bookstore.order_line WHERE order_id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM bookstore.order WHERE id = $1")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(lines)
    }
}
