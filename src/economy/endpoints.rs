use std::collections::BTreeMap;

use log::info;
use rocket::serde::json::Json;
use rocket::serde::{Deserialize, Serialize};
use rocket::State;
use rocket_okapi::{openapi, JsonSchema};

use crate::account::guards::{AdminUser, AuthUser};
use crate::economy::packs::PackType;
use crate::economy::PackOpening;
use crate::error::PortalError;
use crate::portal::Portal;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct OpenPackRequest {
    pub pack_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct PackSettingsRequest {
    pub pack_settings: BTreeMap<String, PackType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct CreatePackRequest {
    pub pack_id: String,
    pub pack_data: PackType,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct PackCreated {
    pub pack_id: String,
    pub pack: PackType,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct Deleted {
    pub deleted: String,
}

/// Active pack configuration keyed by pack id.
#[openapi]
#[get("/pack-types")]
pub async fn list_pack_types(
    portal: &State<Portal>,
) -> Result<Json<BTreeMap<String, PackType>>, PortalError> {
    Ok(Json(portal.packs.all().await?))
}

/// Buy and open one pack.
#[openapi]
#[post("/open-pack", format = "json", data = "<request>")]
pub async fn open_pack(
    user: AuthUser,
    portal: &State<Portal>,
    request: Json<OpenPackRequest>,
) -> Result<Json<PackOpening>, PortalError> {
    let mut rng = portal.derive_rng("open-pack").await;
    let opening = portal
        .economy
        .open_pack(&user.0.id, &request.pack_type, &mut rng)
        .await?;
    Ok(Json(opening))
}

/// Replace the configuration of existing packs.
#[openapi]
#[post("/admin/update-pack-settings", format = "json", data = "<request>")]
pub async fn update_pack_settings(
    admin: AdminUser,
    portal: &State<Portal>,
    request: Json<PackSettingsRequest>,
) -> Result<Json<BTreeMap<String, PackType>>, PortalError> {
    let packs = portal
        .packs
        .update_settings(request.into_inner().pack_settings)
        .await?;
    info!("{} updated pack settings", admin.0.id);
    Ok(Json(packs))
}

/// Add a custom pack tier.
#[openapi]
#[post("/admin/create-pack", format = "json", data = "<request>")]
pub async fn create_pack(
    admin: AdminUser,
    portal: &State<Portal>,
    request: Json<CreatePackRequest>,
) -> Result<Json<PackCreated>, PortalError> {
    let CreatePackRequest { pack_id, pack_data } = request.into_inner();
    let pack = portal.packs.create(&pack_id, pack_data).await?;
    info!("{} created pack {}", admin.0.id, pack_id);
    Ok(Json(PackCreated { pack_id, pack }))
}

/// Remove a custom pack tier. Built-in tiers stay.
#[openapi]
#[delete("/admin/pack/<pack_id>")]
pub async fn delete_pack(
    admin: AdminUser,
    portal: &State<Portal>,
    pack_id: &str,
) -> Result<Json<Deleted>, PortalError> {
    portal.packs.delete(pack_id).await?;
    info!("{} deleted pack {}", admin.0.id, pack_id);
    Ok(Json(Deleted {
        deleted: pack_id.to_string(),
    }))
}
