//! Experience, levels and level-reward claims.
//!
//! `threshold(L) = floor(L^2.5 * 100)` for `L > 1` and `threshold(1) = 0`.
//! Levels are capped at [`MAX_LEVEL`]. Every third level carries a reward that
//! can be claimed once: an epic creature on multiples of 15, a rare creature on
//! other multiples of 9, coins otherwise.

use std::sync::Arc;

use log::{info, warn};
use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::account::Accounts;
use crate::achievements::{AchievementEvent, Achievements};
use crate::catalog::{Catalog, CreatureDefinition, Rarity};
use crate::economy::wallet::Wallet;
use crate::error::{PortalError, PortalResult};
use crate::ledger::Ledger;
use crate::store::{KvStore, KvStoreExt};

pub mod endpoints;

pub const MAX_LEVEL: u32 = 100;

pub fn experience_for_level(level: u32) -> u64 {
    if level <= 1 {
        return 0;
    }
    (f64::from(level).powf(2.5) * 100.0).floor() as u64
}

/// Largest level whose threshold `experience` reaches.
pub fn level_for_experience(experience: u64) -> u32 {
    advance_level(1, experience)
}

fn advance_level(from: u32, experience: u64) -> u32 {
    let mut level = from.max(1);
    while level < MAX_LEVEL && experience >= experience_for_level(level + 1) {
        level += 1;
    }
    level
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct LevelRecord {
    pub experience: u64,
    pub level: u32,
}

impl Default for LevelRecord {
    fn default() -> Self {
        LevelRecord {
            experience: 0,
            level: 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct LevelUp {
    pub leveled_up: bool,
    pub new_level: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct LevelData {
    pub experience: u64,
    pub level: u32,
    /// Experience needed for the next level; `None` at the cap.
    pub next_level_at: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", tag = "type", rename_all = "lowercase")]
pub enum LevelReward {
    Coins { amount: u64 },
    Pokemon { pokemon: CreatureDefinition },
}

fn level_key(user_id: &str) -> String {
    format!("level_{user_id}")
}

fn rewards_key(user_id: &str) -> String {
    format!("level_rewards_{user_id}")
}

#[derive(Clone)]
pub struct Progression {
    store: Arc<dyn KvStore>,
    accounts: Accounts,
    wallet: Wallet,
    ledger: Ledger,
    achievements: Achievements,
    catalog: Arc<Catalog>,
}

impl Progression {
    pub fn new(
        store: Arc<dyn KvStore>,
        accounts: Accounts,
        wallet: Wallet,
        ledger: Ledger,
        achievements: Achievements,
        catalog: Arc<Catalog>,
    ) -> Self {
        Progression {
            store,
            accounts,
            wallet,
            ledger,
            achievements,
            catalog,
        }
    }

    pub async fn record(&self, user_id: &str) -> PortalResult<LevelRecord> {
        Ok(self.store.load(&level_key(user_id)).await?.unwrap_or_default())
    }

    pub async fn claimed(&self, user_id: &str) -> PortalResult<Vec<u32>> {
        Ok(self.store.load(&rewards_key(user_id)).await?.unwrap_or_default())
    }

    /// Fresh level-1 record and an empty claim list.
    pub async fn init(&self, user_id: &str) -> PortalResult<()> {
        self.store
            .save(&level_key(user_id), &LevelRecord::default())
            .await?;
        self.store.save(&rewards_key(user_id), &Vec::<u32>::new()).await
    }

    pub async fn level_data(&self, user_id: &str) -> PortalResult<LevelData> {
        let record = self.record(user_id).await?;
        Ok(LevelData {
            experience: record.experience,
            level: record.level,
            next_level_at: (record.level < MAX_LEVEL)
                .then(|| experience_for_level(record.level + 1)),
        })
    }

    /// Adds experience and recomputes the level. A level-up pays a single
    /// bonus of `10 * new_level`, however many levels were crossed.
    pub async fn add_experience(&self, user_id: &str, amount: u64) -> PortalResult<LevelUp> {
        let mut record = self.record(user_id).await?;
        let previous = record.level;
        record.experience = record.experience.saturating_add(amount);
        record.level = advance_level(previous, record.experience);
        self.store.save(&level_key(user_id), &record).await?;

        let mut account = self.accounts.require(user_id).await?;
        account.experience = record.experience;
        self.accounts.save(&account).await?;

        if record.level <= previous {
            return Ok(LevelUp {
                leveled_up: false,
                new_level: None,
            });
        }

        info!("{} reached level {}", user_id, record.level);
        self.wallet
            .credit(user_id, u64::from(record.level) * 10)
            .await?;
        self.achievements
            .record(user_id, AchievementEvent::LevelUp { level: record.level })
            .await?;
        Ok(LevelUp {
            leveled_up: true,
            new_level: Some(record.level),
        })
    }

    pub async fn claim_reward<R: Rng + Send + ?Sized>(
        &self,
        user_id: &str,
        level: u32,
        rng: &mut R,
    ) -> PortalResult<LevelReward> {
        if level == 0 {
            return Err(PortalError::Validation("Level must be positive".into()));
        }
        let record = self.record(user_id).await?;
        if record.level < level {
            return Err(PortalError::LevelNotReached);
        }
        let mut claimed = self.claimed(user_id).await?;
        if claimed.contains(&level) {
            return Err(PortalError::AlreadyClaimed);
        }
        if level % 3 != 0 {
            return Err(PortalError::NoRewardAtLevel);
        }

        let creature_tier = if level % 15 == 0 {
            Some(Rarity::Epic)
        } else if level % 9 == 0 {
            Some(Rarity::Rare)
        } else {
            None
        };

        let reward = match creature_tier {
            Some(rarity) => {
                let Some(creature) = self.catalog.random_of_rarity(rarity, rng).cloned() else {
                    warn!("no {} creature available for level {} reward", rarity.as_str(), level);
                    return Err(PortalError::NotFound("Reward Pokemon".into()));
                };
                self.ledger.increment(user_id, creature.id, 1).await?;
                let unique_owned = self.ledger.unique_count(user_id).await?;
                self.achievements
                    .record(user_id, AchievementEvent::CollectionChanged { unique_owned })
                    .await?;
                LevelReward::Pokemon { pokemon: creature }
            }
            None => {
                let amount = (f64::from(level) * 25.0 + rng.gen::<f64>() * 50.0).floor() as u64;
                let balance = self.wallet.credit(user_id, amount).await?;
                self.achievements
                    .record(user_id, AchievementEvent::CoinsUpdated { balance })
                    .await?;
                LevelReward::Coins { amount }
            }
        };

        claimed.push(level);
        self.store.save(&rewards_key(user_id), &claimed).await?;
        info!("{} claimed level {} reward", user_id, level);
        Ok(reward)
    }
}
