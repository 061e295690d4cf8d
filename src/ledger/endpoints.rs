use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::account::guards::AuthUser;
use crate::error::PortalError;
use crate::ledger::Collection;
use crate::portal::Portal;

/// The caller's owned creatures as `{creatureId: count}`.
#[openapi]
#[get("/collection")]
pub async fn get_collection(
    user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<Collection>, PortalError> {
    Ok(Json(portal.ledger.get_all(&user.0.id).await?))
}
