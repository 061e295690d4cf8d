mod common;

use common::*;
use poke_portal::catalog::{BaseStats, Catalog, CreatureDefinition, Rarity};
use poke_portal::PortalConfig;
use rocket::http::Status;

fn common_only_catalog() -> Catalog {
    let stats = BaseStats {
        hp: 40,
        attack: 40,
        defense: 40,
        speed: 40,
    };
    Catalog::new(vec![
        CreatureDefinition::new(1, "bulbasaur", Rarity::Common, stats, vec![]),
        CreatureDefinition::new(4, "charmander", Rarity::Common, stats, vec![]),
        CreatureDefinition::new(7, "squirtle", Rarity::Common, stats, vec![]),
        CreatureDefinition::new(10, "caterpie", Rarity::Common, stats, vec![]),
    ])
}

#[test]
fn legendary_pack_with_exact_balance() {
    // 400 + welcome bonus = exactly the 500 a legendary pack costs
    let portal = portal_with(
        PortalConfig {
            starting_coins: 400,
            ..PortalConfig::default()
        },
        common_only_catalog(),
    );
    let (token, signed) = sign_up(&portal.client, "ash@pallet.town", "Ash");
    assert_eq!(signed["profile"]["poke_coins"], 500);

    let (status, opened) = post(&portal.client, "/open-pack", &token, r#"{ "packType": "legendary" }"#);
    assert_eq!(status, Status::Ok);

    // Only common creatures exist: empty tiers yield nothing for their slot.
    let cards = opened["cards"].as_array().unwrap();
    assert!(cards.len() <= 7);
    assert!(cards.iter().all(|c| c["rarity"] == "common"));
    let card_ids: std::collections::HashSet<&str> =
        cards.iter().map(|c| c["cardId"].as_str().unwrap()).collect();
    assert_eq!(card_ids.len(), cards.len());

    let expected_xp = 25 + 10 * cards.len() as u64;
    assert_eq!(opened["experienceGained"], expected_xp);
    assert_eq!(opened["levelResult"]["leveledUp"], false);
    // Balance went to 0, then first_pack paid 50 once.
    assert_eq!(opened["remainingCoins"], 50);
    assert_eq!(profile_coins(&portal.client, &token), 50);

    let (_, achievements) = get(&portal.client, "/achievements", &token);
    let first_pack = achievements
        .as_array()
        .unwrap()
        .iter()
        .find(|a| a["id"] == "first_pack")
        .unwrap();
    assert_eq!(first_pack["completed"], true);

    let (_, quests) = get(&portal.client, "/quests", &token);
    let open_pack = quests
        .as_array()
        .unwrap()
        .iter()
        .find(|q| q["id"] == "open_pack")
        .unwrap();
    assert_eq!(open_pack["completed"], true);
}

#[test]
fn second_open_costs_exactly_the_pack_price() {
    let portal = portal_with(PortalConfig::default(), common_only_catalog());
    let (token, _) = sign_up(&portal.client, "ash@pallet.town", "Ash");
    post(&portal.client, "/open-pack", &token, r#"{ "packType": "basic" }"#);

    let before = profile_coins(&portal.client, &token);
    let (status, opened) = post(&portal.client, "/open-pack", &token, r#"{ "packType": "basic" }"#);
    assert_eq!(status, Status::Ok);
    assert_eq!(opened["levelResult"]["leveledUp"], false);
    assert_eq!(opened["remainingCoins"], before - 100);
}

#[test]
fn insufficient_funds_leaves_balance_unchanged() {
    let portal = portal_with(
        PortalConfig {
            starting_coins: 0,
            ..PortalConfig::default()
        },
        common_only_catalog(),
    );
    let (token, _) = sign_up(&portal.client, "ash@pallet.town", "Ash");
    assert_eq!(profile_coins(&portal.client, &token), 100);

    let (status, json) = post(&portal.client, "/open-pack", &token, r#"{ "packType": "premium" }"#);
    assert_eq!(status, Status::BadRequest);
    assert_eq!(json["error"], "Insufficient coins");
    assert_eq!(profile_coins(&portal.client, &token), 100);

    let (_, collection) = get(&portal.client, "/collection", &token);
    assert_eq!(collection.as_object().unwrap().len(), 3);
}

#[test]
fn unknown_pack_type_is_rejected() {
    let portal = default_portal();
    let (token, _) = sign_up(&portal.client, "ash@pallet.town", "Ash");
    let (status, json) = post(&portal.client, "/open-pack", &token, r#"{ "packType": "mystery" }"#);
    assert_eq!(status, Status::BadRequest);
    assert_eq!(json["error"], "Invalid pack type: mystery");
    assert_eq!(profile_coins(&portal.client, &token), 600);
}

#[test]
fn admin_routes_require_admin_role() {
    let portal = default_portal();
    let (ash, _) = sign_up(&portal.client, "ash@pallet.town", "Ash");
    let (status, json) = get(&portal.client, "/admin/users", &ash);
    assert_eq!(status, Status::Forbidden);
    assert_eq!(json["error"], "Access denied");

    let (oak, signed) = sign_up(&portal.client, "oak@pallet.town", "Oak");
    assert_eq!(signed["profile"]["role"], "admin");
    let (status, users) = get(&portal.client, "/admin/users", &oak);
    assert_eq!(status, Status::Ok);
    assert_eq!(users.as_array().unwrap().len(), 2);
}

#[test]
fn admin_add_coins_and_role_change() {
    let portal = default_portal();
    let (ash, signed) = sign_up(&portal.client, "ash@pallet.town", "Ash");
    let nice_id = signed["profile"]["nice_id"].as_str().unwrap().to_string();
    let (oak, _) = sign_up(&portal.client, "oak@pallet.town", "Oak");

    let (status, json) = post(
        &portal.client,
        "/admin/add-coins",
        &oak,
        &format!(r#"{{ "targetNiceId": "{nice_id}", "amount": 500 }}"#),
    );
    assert_eq!(status, Status::Ok);
    // 600 + 500 crosses 1000: the rich achievement pays 200 more
    assert_eq!(json["newBalance"], 1300);
    assert_eq!(profile_coins(&portal.client, &ash), 1300);

    let (status, _) = post(
        &portal.client,
        "/admin/add-coins",
        &oak,
        &format!(r#"{{ "targetNiceId": "{nice_id}", "amount": -5 }}"#),
    );
    assert_eq!(status, Status::BadRequest);

    let (status, json) = post(
        &portal.client,
        "/admin/update-role",
        &oak,
        &format!(r#"{{ "targetNiceId": "{nice_id}", "newRole": "admin" }}"#),
    );
    assert_eq!(status, Status::Ok);
    assert_eq!(json["role"], "admin");
    let (status, _) = get(&portal.client, "/admin/users", &ash);
    assert_eq!(status, Status::Ok);
}

#[test]
fn admin_pack_lifecycle() {
    let portal = portal_with(
        PortalConfig {
            admin_emails: vec!["oak@pallet.town".into()],
            ..PortalConfig::default()
        },
        common_only_catalog(),
    );
    let (oak, _) = sign_up(&portal.client, "oak@pallet.town", "Oak");
    let pack = r#"{ "packId": "starter", "packData": {
        "name": "Starter Pack", "cost": 50, "cards": 2,
        "rarities": [ { "rarity": "common", "enabled": true, "chance": 1.0 } ] } }"#;
    let (status, created) = post(&portal.client, "/admin/create-pack", &oak, pack);
    assert_eq!(status, Status::Ok);
    assert_eq!(created["pack"]["rarities"].as_array().unwrap().len(), 5);

    let (status, _) = post(&portal.client, "/admin/create-pack", &oak, pack);
    assert_eq!(status, Status::BadRequest);

    let (status, opened) = post(&portal.client, "/open-pack", &oak, r#"{ "packType": "starter" }"#);
    assert_eq!(status, Status::Ok);
    assert_eq!(opened["cards"].as_array().unwrap().len(), 2);

    let bad = r#"{ "packId": "broken", "packData": {
        "name": "Broken", "cost": 50, "cards": 21, "rarities": [] } }"#;
    let (status, _) = post(&portal.client, "/admin/create-pack", &oak, bad);
    assert_eq!(status, Status::BadRequest);

    let settings = r#"{ "packSettings": { "basic": {
        "name": "Basic Pack", "cost": 80, "cards": 3,
        "rarities": [ { "rarity": "common", "enabled": true, "chance": 1.0 } ] } } }"#;
    let (status, packs) = post(&portal.client, "/admin/update-pack-settings", &oak, settings);
    assert_eq!(status, Status::Ok);
    assert_eq!(packs["basic"]["cost"], 80);

    let builtin = portal
        .client
        .delete("/admin/pack/basic")
        .header(bearer(&oak))
        .dispatch();
    assert_eq!(builtin.status(), Status::BadRequest);

    let custom = portal
        .client
        .delete("/admin/pack/starter")
        .header(bearer(&oak))
        .dispatch();
    assert_eq!(custom.status(), Status::Ok);
    let packs = body(portal.client.get("/pack-types").dispatch());
    assert!(packs.get("starter").is_none());
}
