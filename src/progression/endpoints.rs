use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::account::guards::AuthUser;
use crate::error::PortalError;
use crate::portal::Portal;
use crate::progression::{LevelData, LevelReward};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct LevelsResponse {
    pub level_data: LevelData,
    pub reward_history: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ClaimRewardRequest {
    pub level: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct ClaimRewardResponse {
    pub level: u32,
    pub reward: LevelReward,
}

/// The caller's experience, level and claimed reward levels.
#[openapi]
#[get("/levels")]
pub async fn get_levels(
    user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<LevelsResponse>, PortalError> {
    let level_data = portal.progression.level_data(&user.0.id).await?;
    let reward_history = portal.progression.claimed(&user.0.id).await?;
    Ok(Json(LevelsResponse {
        level_data,
        reward_history,
    }))
}

/// Claim the one-time reward of a reached level.
#[openapi]
#[post("/levels/claim-reward", format = "json", data = "<request>")]
pub async fn claim_level_reward(
    user: AuthUser,
    portal: &State<Portal>,
    request: Json<ClaimRewardRequest>,
) -> Result<Json<ClaimRewardResponse>, PortalError> {
    let level = u32::try_from(request.level)
        .ok()
        .filter(|l| *l > 0)
        .ok_or_else(|| PortalError::Validation("Level must be positive".into()))?;
    let mut rng = portal.derive_rng("level-reward").await;
    let reward = portal
        .progression
        .claim_reward(&user.0.id, level, &mut rng)
        .await?;
    Ok(Json(ClaimRewardResponse { level, reward }))
}
