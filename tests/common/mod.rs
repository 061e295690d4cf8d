#![allow(dead_code)]

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use poke_portal::catalog::Catalog;
use poke_portal::clock::ManualClock;
use poke_portal::identity::MemoryIdentityProvider;
use poke_portal::store::MemoryStore;
use poke_portal::{rocket_with, Portal, PortalConfig};
use rocket::http::uncased::Uncased;
use rocket::http::{Header, Status};
use rocket::local::blocking::Client;
use serde_json::Value;

pub fn json_header() -> Header<'static> {
    Header {
        name: Uncased::from("Content-Type"),
        value: Cow::from("application/json"),
    }
}

pub fn bearer(token: &str) -> Header<'static> {
    Header::new("Authorization", format!("Bearer {token}"))
}

pub struct TestPortal {
    pub client: Client,
    pub clock: Arc<ManualClock>,
}

pub fn portal_with(config: PortalConfig, catalog: Catalog) -> TestPortal {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap(),
    ));
    let portal = Portal::new(
        PortalConfig {
            rng_seed: config.rng_seed.or(Some(7)),
            ..config
        },
        Arc::new(MemoryStore::new()),
        Arc::new(MemoryIdentityProvider::new()),
        clock.clone(),
        Arc::new(catalog),
    );
    let client = Client::tracked(rocket_with(portal)).expect("valid rocket instance");
    TestPortal { client, clock }
}

pub fn default_portal() -> TestPortal {
    portal_with(
        PortalConfig {
            admin_emails: vec!["oak@pallet.town".into()],
            ..PortalConfig::default()
        },
        Catalog::seeded(),
    )
}

pub fn body(response: rocket::local::blocking::LocalResponse<'_>) -> Value {
    let text = response.into_string().expect("response body");
    serde_json::from_str(&text).expect("json body")
}

/// Signs up and returns `(access token, signup body)`.
pub fn sign_up(client: &Client, email: &str, name: &str) -> (String, Value) {
    let response = client
        .post("/signup")
        .header(json_header())
        .body(format!(
            r#"{{ "email": "{email}", "password": "secret-123", "name": "{name}" }}"#
        ))
        .dispatch();
    assert_eq!(response.status(), Status::Ok);
    let json = body(response);
    let token = json["accessToken"].as_str().expect("token").to_string();
    (token, json)
}

pub fn get(client: &Client, path: &str, token: &str) -> (Status, Value) {
    let response = client.get(path.to_string()).header(bearer(token)).dispatch();
    let status = response.status();
    (status, body(response))
}

pub fn post(client: &Client, path: &str, token: &str, json: &str) -> (Status, Value) {
    let response = client
        .post(path.to_string())
        .header(json_header())
        .header(bearer(token))
        .body(json.to_string())
        .dispatch();
    let status = response.status();
    (status, body(response))
}

pub fn profile_coins(client: &Client, token: &str) -> u64 {
    let (status, json) = get(client, "/profile", token);
    assert_eq!(status, Status::Ok);
    json["poke_coins"].as_u64().expect("poke_coins")
}
