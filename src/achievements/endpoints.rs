use rocket::serde::json::Json;
use rocket::State;
use rocket_okapi::openapi;

use crate::account::guards::AuthUser;
use crate::achievements::quests::QuestView;
use crate::achievements::AchievementView;
use crate::error::PortalError;
use crate::portal::Portal;

/// Every achievement with the caller's completion state.
#[openapi]
#[get("/achievements")]
pub async fn list_achievements(
    user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<Vec<AchievementView>>, PortalError> {
    Ok(Json(portal.achievements.views(&user.0.id).await?))
}

/// Today's quests with the caller's progress.
#[openapi]
#[get("/quests")]
pub async fn list_quests(
    user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<Vec<QuestView>>, PortalError> {
    Ok(Json(portal.quests.views(&user.0.id).await?))
}
