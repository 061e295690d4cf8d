//! # PokéPortal
//!
//! JSON API for a collectible creature card economy: players open packs with
//! coins, collect and auction creatures, battle, level up and unlock
//! achievements and daily quests.
//!
//! ## Architecture
//!
//! Each domain module owns its engine and an `endpoints` submodule with the
//! Rocket handlers. Engines keep no state of their own; they read and write a
//! shared [`store::KvStore`] and are wired together in [`portal::Portal`],
//! which Rocket manages as state. Randomness flows from one seeded master
//! generator through a per-request sub-generator.

// Rocket makes this a bit tricky to support
#![allow(clippy::module_name_repetitions)]
#[macro_use]
extern crate rocket;

use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{make_swagger_ui, SwaggerUIConfig};

pub mod account;
pub mod achievements;
pub mod auction;
pub mod battle;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod economy;
pub mod error;
pub mod identity;
pub mod ids;
pub mod ledger;
pub mod portal;
pub mod progression;
pub mod status_messages;
pub mod store;

pub use crate::config::PortalConfig;
pub use crate::error::{PortalError, PortalResult};
pub use crate::portal::Portal;

/// Builds the server with in-memory collaborators, configured from Rocket's
/// figment (`[default.portal]` in Rocket.toml).
///
/// # Example
///
/// ```no_run
/// use poke_portal::rocket_initialize;
///
/// #[rocket::main]
/// async fn main() {
///     rocket_initialize().launch().await.expect("Failed to launch rocket");
/// }
/// ```
pub fn rocket_initialize() -> rocket::Rocket<rocket::Build> {
    #[allow(clippy::no_effect_underscore_binding)]
    let _ = env_logger::try_init();

    let config = PortalConfig::from_figment(&rocket::Config::figment());
    rocket_with(Portal::in_memory(config))
}

/// Builds the server around an explicitly constructed [`Portal`].
pub fn rocket_with(portal: Portal) -> rocket::Rocket<rocket::Build> {
    use crate::account::endpoints::*;
    use crate::achievements::endpoints::*;
    use crate::auction::endpoints::*;
    use crate::battle::endpoints::*;
    use crate::catalog::endpoints::*;
    use crate::economy::endpoints::*;
    use crate::ledger::endpoints::*;
    use crate::progression::endpoints::*;
    use crate::status_messages::*;

    rocket::build()
        .mount(
            "/",
            openapi_get_routes![
                signup,
                profile,
                leaderboard,
                list_pokemon,
                get_collection,
                list_pack_types,
                open_pack,
                active_auctions,
                my_auctions,
                create_auction,
                place_bid,
                complete_expired,
                get_levels,
                claim_level_reward,
                list_achievements,
                list_quests,
                user_pokemon,
                battle,
                list_users,
                add_coins,
                update_role,
                update_pack_settings,
                create_pack,
                delete_pack,
                delete_auction
            ],
        )
        .mount("/swagger", make_swagger_ui(&get_docs()))
        .register(
            "/",
            catchers![
                bad_request,
                unauthorized,
                forbidden,
                not_found,
                unprocessable,
                internal_error
            ],
        )
        .manage(portal)
}

fn get_docs() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/openapi.json".to_string(),
        ..Default::default()
    }
}
