use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::account::guards::AuthUser;
use crate::battle::BattleReport;
use crate::catalog::CreatureDefinition;
use crate::error::PortalError;
use crate::portal::Portal;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct BattleRequest {
    pub player_pokemon_id: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct OwnedPokemon {
    #[serde(flatten)]
    pub pokemon: CreatureDefinition,
    pub count: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct UserPokemonResponse {
    pub pokemon: Vec<OwnedPokemon>,
}

/// Catalogue creatures the caller owns, with copy counts.
#[openapi]
#[get("/user-pokemon")]
pub async fn user_pokemon(
    user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<UserPokemonResponse>, PortalError> {
    let collection = portal.ledger.get_all(&user.0.id).await?;
    let pokemon = collection
        .iter()
        .filter_map(|(id, count)| {
            portal.catalog.get(*id).map(|p| OwnedPokemon {
                pokemon: p.clone(),
                count: *count,
            })
        })
        .collect();
    Ok(Json(UserPokemonResponse { pokemon }))
}

/// Fight a random catalogue creature with one of the caller's own.
#[openapi]
#[post("/battle", format = "json", data = "<request>")]
pub async fn battle(
    user: AuthUser,
    portal: &State<Portal>,
    request: Json<BattleRequest>,
) -> Result<Json<BattleReport>, PortalError> {
    let mut rng = portal.derive_rng("battle").await;
    let report = portal
        .battles
        .fight(&user.0.id, request.player_pokemon_id, &mut rng)
        .await?;
    Ok(Json(report))
}
