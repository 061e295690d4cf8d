use log::warn;
use rocket::figment::Figment;
use rocket::serde::{Deserialize, Serialize};

/// Settings read from the `portal` table of Rocket's configuration
/// (`[default.portal]` in Rocket.toml, or `ROCKET_PORTAL={...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", default)]
pub struct PortalConfig {
    /// Coins granted to every new account.
    pub starting_coins: u64,
    /// Catalogue ids given once each at signup.
    pub starter_pokemon: Vec<u32>,
    /// Fixed seed for the master RNG; OS entropy when absent.
    pub rng_seed: Option<u64>,
    /// Accounts signing up with one of these emails get the admin role.
    pub admin_emails: Vec<String>,
    /// Leaderboard size when the request gives no `limit`.
    pub leaderboard_limit: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        PortalConfig {
            starting_coins: 500,
            starter_pokemon: vec![1, 4, 7],
            rng_seed: None,
            admin_emails: Vec::new(),
            leaderboard_limit: 50,
        }
    }
}

impl PortalConfig {
    pub fn from_figment(figment: &Figment) -> Self {
        if !figment.contains("portal") {
            return PortalConfig::default();
        }
        match figment.extract_inner::<PortalConfig>("portal") {
            Ok(config) => config,
            Err(e) => {
                warn!("invalid [portal] configuration, using defaults: {}", e);
                PortalConfig::default()
            }
        }
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|e| e.eq_ignore_ascii_case(email))
    }
}
