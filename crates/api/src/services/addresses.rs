//! The authenticated user's address book.
//!
//! Identical addresses are shared between users. Removing an address from a
//! list only deletes the row once no user links it and no order ships to it.

use sqlx::PgConnection;
use tracing::instrument;

use bookstore_core::{AddressId, UserId};

use crate::db::{AddressRepository, RepositoryError, UserRepository};
use crate::models::{AddressInput, NewAddress, UserAddress};
use crate::services::error::{FieldErrors, ServiceError};

const NOT_IN_LIST: &str = "This address is not in your address list";

/// Result of removing an address from the user's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveAddressOutcome {
    /// The address was not in the list; nothing changed.
    NotLinked,
    /// The link was removed. `deleted` is true if the address row went too.
    Removed { deleted: bool },
}

impl RemoveAddressOutcome {
    /// Message returned to the client.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotLinked => NOT_IN_LIST,
            Self::Removed { .. } => "Your address successfully deleted from address list",
        }
    }
}

/// Validate client address fields.
///
/// Required text fields are trimmed and must not be blank. Blank optional
/// fields become `None`.
///
/// # Errors
///
/// Returns every missing or blank required field.
pub fn validate_address(input: &AddressInput) -> Result<NewAddress, FieldErrors> {
    let mut errors = FieldErrors::new();

    let mut required = |field: &'static str, value: Option<&String>| -> Option<String> {
        let value = value.map(|v| v.trim()).filter(|v| !v.is_empty());
        errors.require(field, value).map(str::to_string)
    };

    let line1 = required("line1", input.line1.as_ref());
    let city = required("city", input.city.as_ref());
    let state = required("state", input.state.as_ref());
    let country = required("country", input.country.as_ref());
    let zipcode = required("zipcode", input.zipcode.as_ref());

    let optional = |value: Option<&String>| {
        value
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    match (line1, city, state, country, zipcode) {
        (Some(line1), Some(city), Some(state), Some(country), Some(zipcode)) => Ok(NewAddress {
            line1,
            line2: optional(input.line2.as_ref()),
            number: optional(input.number.as_ref()),
            city,
            state,
            country,
            zipcode,
        }),
        _ => Err(errors),
    }
}

/// Add an address to the user's list, reusing an identical stored address.
///
/// # Errors
///
/// - `ServiceError::NotFound` if the user is missing.
/// - `ServiceError::Conflict` if the address is already in the list.
/// - `ServiceError::Repository` for database errors.
#[instrument(skip(conn, address))]
pub async fn add_address(
    conn: &mut PgConnection,
    user_id: UserId,
    address: &NewAddress,
) -> Result<UserAddress, ServiceError> {
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    let stored = match AddressRepository::new(conn).find_identical(address).await? {
        Some(existing) => existing,
        None => AddressRepository::new(conn).insert(address).await?,
    };

    if AddressRepository::new(conn).is_linked(user_id, stored.id).await? {
        return Err(ServiceError::Conflict(
            "This address is in your address list".to_string(),
        ));
    }

    let is_default = AddressRepository::new(conn)
        .link(user_id, stored.id)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => {
                ServiceError::Conflict("This address is in your address list".to_string())
            }
            other => other.into(),
        })?;

    Ok(UserAddress {
        address: stored,
        is_default,
    })
}

/// List the user's addresses, default first.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` if the user is missing and
/// `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn list_addresses(
    conn: &mut PgConnection,
    user_id: UserId,
) -> Result<Vec<UserAddress>, ServiceError> {
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    Ok(AddressRepository::new(conn).list_for_user(user_id).await?)
}

/// Make a linked address the user's default.
///
/// # Errors
///
/// - `ServiceError::NotFound` if the address or user is missing.
/// - `ServiceError::Forbidden` if the address is not in the user's list.
/// - `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn set_default(
    conn: &mut PgConnection,
    user_id: UserId,
    address_id: AddressId,
) -> Result<(), ServiceError> {
    AddressRepository::new(conn)
        .find(address_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Address"))?;
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    AddressRepository::new(conn)
        .set_default(user_id, address_id)
        .await
        .map_err(|e| match e {
            RepositoryError::NotFound => ServiceError::Forbidden(NOT_IN_LIST.to_string()),
            other => other.into(),
        })
}

/// Remove an address from the user's list.
///
/// If it was the default, the oldest remaining address is promoted. The
/// address row is deleted once nothing links or references it.
///
/// The address is locked first, so an order placed with it concurrently is
/// either committed before the reference check or sees the removal.
///
/// # Errors
///
/// Returns `ServiceError::NotFound` if the address or user is missing and
/// `ServiceError::Repository` for database errors.
#[instrument(skip(conn))]
pub async fn remove_address(
    conn: &mut PgConnection,
    user_id: UserId,
    address_id: AddressId,
) -> Result<RemoveAddressOutcome, ServiceError> {
    AddressRepository::new(conn)
        .find_for_update(address_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Address"))?;
    UserRepository::new(conn)
        .find(user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    let unlinked = AddressRepository::new(conn)
        .unlink(user_id, address_id)
        .await?;
    let Some(was_default) = unlinked else {
        return Ok(RemoveAddressOutcome::NotLinked);
    };

    if was_default {
        let promoted = AddressRepository::new(conn).promote_default(user_id).await?;
        tracing::debug!(?promoted, "Default address reassigned");
    }

    let deleted = AddressRepository::new(conn).delete_if_unused(address_id).await?;
    Ok(RemoveAddressOutcome::Removed { deleted })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::services::error::MISSING_FIELD;

    fn input() -> AddressInput {
        AddressInput {
            line1: Some("Rua Augusta".to_string()),
            line2: Some("  ".to_string()),
            number: Some("12".to_string()),
            city: Some("Lisbon".to_string()),
            state: Some("Lisboa".to_string()),
            country: Some("Portugal".to_string()),
            zipcode: Some(" 1100-048 ".to_string()),
        }
    }

    #[test]
    fn test_valid_address_is_trimmed() {
        let address = validate_address(&input()).unwrap();

        assert_eq!(address.zipcode, "1100-048");
        assert_eq!(address.line2, None);
        assert_eq!(address.number.as_deref(), Some("12"));
    }

    #[test]
    fn test_blank_required_field_is_missing() {
        let address = AddressInput {
            city: Some("   ".to_string()),
            country: None,
            ..input()
        };

        let errors = validate_address(&address).unwrap_err();

        assert_eq!(errors.get("city").unwrap(), [MISSING_FIELD]);
        assert_eq!(errors.get("country").unwrap(), [MISSING_FIELD]);
        assert!(errors.get("line1").is_none());
    }

    #[test]
    fn test_remove_outcome_messages() {
        assert_eq!(
            RemoveAddressOutcome::NotLinked.message(),
            "This address is not in your address list"
        );
        assert_eq!(
            RemoveAddressOutcome::Removed { deleted: false }.message(),
            "Your address successfully deleted from address list"
        );
    }
}
