use log::info;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::account::guards::{AdminUser, AuthUser};
use crate::auction::{Auction, AuctionListing, BidOutcome, SweepReport};
use crate::error::PortalError;
use crate::portal::Portal;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct CreateAuctionRequest {
    pub pokemon_id: u32,
    pub starting_price: i64,
    /// Hours: 6, 12, 24 or 48.
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct BidRequest {
    pub auction_id: String,
    pub bid_amount: i64,
}

fn positive(value: i64, what: &str) -> Result<u64, PortalError> {
    u64::try_from(value)
        .ok()
        .filter(|v| *v > 0)
        .ok_or_else(|| PortalError::Validation(format!("{what} must be positive")))
}

/// Open auctions, after settling any that have expired. Public.
#[openapi]
#[get("/auctions/active")]
pub async fn active_auctions(
    portal: &State<Portal>,
) -> Result<Json<Vec<AuctionListing>>, PortalError> {
    Ok(Json(portal.auctions.active().await?))
}

/// Auctions the caller listed, any status.
#[openapi]
#[get("/auctions/my")]
pub async fn my_auctions(
    user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<Vec<AuctionListing>>, PortalError> {
    Ok(Json(portal.auctions.mine(&user.0.id).await?))
}

/// List one owned creature copy for auction.
#[openapi]
#[post("/auctions/create", format = "json", data = "<request>")]
pub async fn create_auction(
    user: AuthUser,
    portal: &State<Portal>,
    request: Json<CreateAuctionRequest>,
) -> Result<Json<Auction>, PortalError> {
    let starting_price = positive(request.starting_price, "Starting price")?;
    let duration = u32::try_from(request.duration)
        .map_err(|_| PortalError::Validation("Invalid duration".into()))?;
    let mut rng = portal.derive_rng("auction-id").await;
    let auction = portal
        .auctions
        .create(
            &user.0.id,
            request.pokemon_id,
            starting_price,
            duration,
            &mut rng,
        )
        .await?;
    Ok(Json(auction))
}

/// Bid on an auction; three times the starting price buys it outright.
#[openapi]
#[post("/auctions/bid", format = "json", data = "<request>")]
pub async fn place_bid(
    user: AuthUser,
    portal: &State<Portal>,
    request: Json<BidRequest>,
) -> Result<Json<BidOutcome>, PortalError> {
    let amount = positive(request.bid_amount, "Bid amount")?;
    let outcome = portal
        .auctions
        .bid(&user.0.id, &request.auction_id, amount)
        .await?;
    Ok(Json(outcome))
}

/// Settle every auction past its expiry.
#[openapi]
#[post("/auctions/complete-expired")]
pub async fn complete_expired(
    _user: AuthUser,
    portal: &State<Portal>,
) -> Result<Json<SweepReport>, PortalError> {
    Ok(Json(portal.auctions.settle_expired().await?))
}

/// Moderation delete; returns the removed record.
#[openapi]
#[delete("/admin/auction/<auction_id>")]
pub async fn delete_auction(
    admin: AdminUser,
    portal: &State<Portal>,
    auction_id: &str,
) -> Result<Json<Auction>, PortalError> {
    let removed = portal.auctions.remove(auction_id).await?;
    info!("{} removed auction {}", admin.0.id, auction_id);
    Ok(Json(removed))
}
