//! Service container handed to Rocket as managed state.
//!
//! Every engine is built here from explicitly injected collaborators: the
//! key-value store, the identity resolver, the clock and the catalogue.

use std::sync::Arc;

use log::{debug, info};
use rand::{RngCore, SeedableRng};
use rand_pcg::Lcg64Xsh32;
use rocket::futures::lock::Mutex;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::account::{Accounts, Role, UserAccount};
use crate::achievements::quests::Quests;
use crate::achievements::{AchievementEvent, Achievements};
use crate::auction::AuctionHouse;
use crate::battle::BattleSimulator;
use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::config::PortalConfig;
use crate::economy::packs::PackCatalog;
use crate::economy::wallet::Wallet;
use crate::economy::Economy;
use crate::error::PortalResult;
use crate::identity::{Identity, IdentityResolver, MemoryIdentityProvider};
use crate::ledger::Ledger;
use crate::progression::Progression;
use crate::store::{KvStore, MemoryStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct SignedUp {
    pub user: Identity,
    pub access_token: String,
    pub profile: UserAccount,
}

pub struct Portal {
    pub config: PortalConfig,
    pub store: Arc<dyn KvStore>,
    pub identity: Arc<dyn IdentityResolver>,
    pub clock: Arc<dyn Clock>,
    pub catalog: Arc<Catalog>,
    pub accounts: Accounts,
    pub wallet: Wallet,
    pub ledger: Ledger,
    pub packs: PackCatalog,
    pub achievements: Achievements,
    pub quests: Quests,
    pub progression: Progression,
    pub economy: Economy,
    pub auctions: AuctionHouse,
    pub battles: BattleSimulator,
    rng: Mutex<Lcg64Xsh32>,
}

impl Portal {
    pub fn new(
        config: PortalConfig,
        store: Arc<dyn KvStore>,
        identity: Arc<dyn IdentityResolver>,
        clock: Arc<dyn Clock>,
        catalog: Arc<Catalog>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => Lcg64Xsh32::seed_from_u64(seed),
            None => Lcg64Xsh32::from_entropy(),
        };

        let accounts = Accounts::new(store.clone());
        let ledger = Ledger::new(store.clone());
        let wallet = Wallet::new(accounts.clone());
        let packs = PackCatalog::new(store.clone());
        let achievements = Achievements::new(store.clone(), wallet.clone(), clock.clone());
        let quests = Quests::new(store.clone(), clock.clone());
        let progression = Progression::new(
            store.clone(),
            accounts.clone(),
            wallet.clone(),
            ledger.clone(),
            achievements.clone(),
            catalog.clone(),
        );
        let economy = Economy::new(
            wallet.clone(),
            ledger.clone(),
            packs.clone(),
            catalog.clone(),
            progression.clone(),
            achievements.clone(),
            quests.clone(),
            clock.clone(),
        );
        let auctions = AuctionHouse::new(
            store.clone(),
            accounts.clone(),
            wallet.clone(),
            ledger.clone(),
            achievements.clone(),
            quests.clone(),
            catalog.clone(),
            clock.clone(),
        );
        let battles = BattleSimulator::new(
            catalog.clone(),
            ledger.clone(),
            wallet.clone(),
            progression.clone(),
            achievements.clone(),
        );

        Portal {
            config,
            store,
            identity,
            clock,
            catalog,
            accounts,
            wallet,
            ledger,
            packs,
            achievements,
            quests,
            progression,
            economy,
            auctions,
            battles,
            rng: Mutex::new(rng),
        }
    }

    /// In-process store and identity provider, wall clock, seeded catalogue.
    pub fn in_memory(config: PortalConfig) -> Self {
        Portal::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryIdentityProvider::new()),
            Arc::new(SystemClock),
            Arc::new(Catalog::seeded()),
        )
    }

    /// Per-request RNG seeded from one draw of the master generator.
    pub async fn derive_rng(&self, purpose: &str) -> Lcg64Xsh32 {
        let seed = self.rng.lock().await.next_u64();
        debug!("rng sub-seed {} for {}", seed, purpose);
        Lcg64Xsh32::seed_from_u64(seed)
    }

    /// Creates the identity and seeds the account: coins, starter creatures,
    /// level record, then the welcome achievement.
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> PortalResult<SignedUp> {
        let issued = self.identity.create_user(email, password, name).await?;
        let identity = issued.identity;
        let role = if self.config.is_admin_email(&identity.email) {
            Role::Admin
        } else {
            Role::User
        };

        let mut rng = self.derive_rng("nice-id").await;
        self.accounts
            .create(
                &identity,
                name,
                role,
                self.config.starting_coins,
                self.clock.now(),
                &mut rng,
            )
            .await?;
        self.ledger
            .seed(&identity.id, &self.config.starter_pokemon)
            .await?;
        self.progression.init(&identity.id).await?;
        self.achievements
            .record(&identity.id, AchievementEvent::SignedUp)
            .await?;

        let profile = self.accounts.require(&identity.id).await?;
        info!("{} signed up as {} ({:?})", identity.id, profile.nice_id, role);
        Ok(SignedUp {
            user: identity,
            access_token: issued.access_token,
            profile,
        })
    }
}
