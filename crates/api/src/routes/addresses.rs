//! Address book handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, put},
};

use bookstore_core::AddressId;

use super::MessageResponse;
use super::extract::{JsonBody, Path};
use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{AddressInput, UserAddress};
use crate::services::addresses;
use crate::state::AppState;

/// Build the addresses router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/addresses", get(list_addresses).post(add_address))
        .route("/addresses/{address_id}", delete(remove_address))
        .route("/addresses/{address_id}/default", put(set_default))
}

/// Add an address to the user's list.
///
/// # Errors
///
/// 400 for invalid fields or an address already in the list, 404 if the user
/// is missing.
pub async fn add_address(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    JsonBody(input): JsonBody<AddressInput>,
) -> Result<(StatusCode, Json<UserAddress>)> {
    let address = addresses::validate_address(&input)?;

    let mut tx = state.pool().begin().await?;
    let linked = addresses::add_address(&mut tx, user_id, &address).await?;
    tx.commit().await?;

    Ok((StatusCode::CREATED, Json(linked)))
}

/// List the user's addresses, default first.
///
/// # Errors
///
/// 404 if the user is missing.
pub async fn list_addresses(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserAddress>>> {
    let mut conn = state.pool().acquire().await?;
    Ok(Json(addresses::list_addresses(&mut conn, user_id).await?))
}

/// Make one of the user's addresses the default.
///
/// # Errors
///
/// 404 if the address or user is missing, 400 if the address is not in the
/// user's list.
pub async fn set_default(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Path(address_id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.pool().begin().await?;
    addresses::set_default(&mut tx, user_id, address_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new("Your default address changed")))
}

/// Remove an address from the user's list.
///
/// # Errors
///
/// 404 if the address or user is missing.
pub async fn remove_address(
    RequireUser(user_id): RequireUser,
    State(state): State<AppState>,
    Path(address_id): Path<AddressId>,
) -> Result<Json<MessageResponse>> {
    let mut tx = state.pool().begin().await?;
    let outcome = addresses::remove_address(&mut tx, user_id, address_id).await?;
    tx.commit().await?;

    Ok(Json(MessageResponse::new(outcome.message())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{bearer, send};
    use crate::services::error::MISSING_FIELD;

    #[tokio::test]
    async fn test_add_address_reports_missing_fields() {
        let auth = bearer(4);
        let (status, body) = send(
            "POST",
            "/addresses",
            Some(&auth),
            Some(r#"{"line1":"Rua Augusta","city":"Lisbon"}"#),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["fields"]["state"][0], MISSING_FIELD);
        assert_eq!(body["fields"]["country"][0], MISSING_FIELD);
        assert_eq!(body["fields"]["zipcode"][0], MISSING_FIELD);
    }

    #[tokio::test]
    async fn test_address_routes_require_token() {
        for (method, uri) in [
            ("GET", "/addresses"),
            ("PUT", "/addresses/1/default"),
            ("DELETE", "/addresses/1"),
        ] {
            let (status, _) = send(method, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        }
    }
}
