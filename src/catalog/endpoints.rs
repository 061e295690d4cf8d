use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::catalog::CreatureDefinition;
use crate::portal::Portal;

/// List every creature in the catalogue. Public.
#[openapi]
#[get("/pokemon")]
pub async fn list_pokemon(portal: &State<Portal>) -> Json<Vec<CreatureDefinition>> {
    Json(portal.catalog.all().to_vec())
}
