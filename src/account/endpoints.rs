use log::info;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::account::guards::{AdminUser, AuthUser};
use crate::account::{rank_by_experience, LeaderboardEntry, Role, UserAccount};
use crate::achievements::AchievementEvent;
use crate::error::PortalError;
use crate::portal::{Portal, SignedUp};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
    pub total: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AddCoinsRequest {
    pub target_nice_id: String,
    pub amount: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AddCoinsResponse {
    pub nice_id: String,
    pub new_balance: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    pub target_nice_id: String,
    pub new_role: Role,
}

/// Register, receive a bearer token and the starter grant.
#[openapi]
#[post("/signup", format = "json", data = "<request>")]
pub async fn signup(
    portal: &State<Portal>,
    request: Json<SignupRequest>,
) -> Result<Json<SignedUp>, PortalError> {
    let signed = portal
        .sign_up(&request.email, &request.password, &request.name)
        .await?;
    Ok(Json(signed))
}

/// The caller's account record.
#[openapi]
#[get("/profile")]
pub async fn profile(
    user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<UserAccount>, PortalError> {
    Ok(Json(portal.accounts.require(&user.0.id).await?))
}

/// Accounts ranked by experience. Public.
#[openapi]
#[get("/leaderboard?<limit>")]
pub async fn leaderboard(
    portal: &State<Portal>,
    limit: Option<usize>,
) -> Result<Json<LeaderboardResponse>, PortalError> {
    let accounts = portal.accounts.all().await?;
    let mut entries = Vec::with_capacity(accounts.len());
    for account in accounts {
        let level = portal.progression.record(&account.id).await?.level;
        entries.push(LeaderboardEntry {
            id: account.id,
            name: account.name,
            nice_id: account.nice_id,
            experience: account.experience,
            level,
            role: account.role,
        });
    }
    let leaderboard = rank_by_experience(
        entries,
        limit.unwrap_or(portal.config.leaderboard_limit),
    );
    Ok(Json(LeaderboardResponse {
        total: leaderboard.len(),
        leaderboard,
    }))
}

/// Every account.
#[openapi]
#[get("/admin/users")]
pub async fn list_users(
    _admin: AdminUser,
    portal: &State<Portal>,
) -> Result<Json<Vec<UserAccount>>, PortalError> {
    Ok(Json(portal.accounts.all().await?))
}

/// Credit coins to an account by nice id.
#[openapi]
#[post("/admin/add-coins", format = "json", data = "<request>")]
pub async fn add_coins(
    admin: AdminUser,
    portal: &State<Portal>,
    request: Json<AddCoinsRequest>,
) -> Result<Json<AddCoinsResponse>, PortalError> {
    let amount = u64::try_from(request.amount)
        .ok()
        .filter(|a| *a > 0)
        .ok_or_else(|| PortalError::Validation("Amount must be positive".into()))?;
    let target = portal
        .accounts
        .find_by_nice_id(&request.target_nice_id)
        .await?
        .ok_or_else(|| PortalError::NotFound("User".into()))?;

    let balance = portal.wallet.credit(&target.id, amount).await?;
    portal
        .achievements
        .record(&target.id, AchievementEvent::CoinsUpdated { balance })
        .await?;
    info!("{} granted {} coins to {}", admin.0.id, amount, target.nice_id);
    Ok(Json(AddCoinsResponse {
        nice_id: target.nice_id,
        new_balance: portal.wallet.balance(&target.id).await?,
    }))
}

/// Change an account's role.
#[openapi]
#[post("/admin/update-role", format = "json", data = "<request>")]
pub async fn update_role(
    admin: AdminUser,
    portal: &State<Portal>,
    request: Json<UpdateRoleRequest>,
) -> Result<Json<UserAccount>, PortalError> {
    let account = portal
        .accounts
        .set_role(&request.target_nice_id, request.new_role)
        .await?;
    info!(
        "{} set role of {} to {:?}",
        admin.0.id, account.nice_id, account.role
    );
    Ok(Json(account))
}
