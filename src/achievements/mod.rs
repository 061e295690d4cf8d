//! Achievement engine.
//!
//! Other engines report what happened as an [`AchievementEvent`]; the engine
//! bumps the per-user counters, completes every achievement whose predicate is
//! newly satisfied and pays its reward. An achievement is completed and paid at
//! most once, so replaying an event is harmless.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::Rarity;
use crate::clock::Clock;
use crate::economy::wallet::Wallet;
use crate::error::PortalResult;
use crate::store::{KvStore, KvStoreExt};

pub mod endpoints;
pub mod quests;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AchievementEvent {
    SignedUp,
    PackOpened {
        drawn: Vec<Rarity>,
        unique_owned: usize,
    },
    BattleWon,
    AuctionSale {
        price: u64,
    },
    AuctionPurchase {
        unique_owned: usize,
    },
    CoinsUpdated {
        balance: u64,
    },
    LevelUp {
        level: u32,
    },
    CollectionChanged {
        unique_owned: usize,
    },
}

/// Unlock predicate attached to each achievement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unlock {
    SignedUp,
    AnyPackOpened,
    AnyBattleWon,
    AnyAuctionSale,
    AnyAuctionPurchase,
    UniqueOwned(usize),
    LevelAtLeast(u32),
    PacksOpened(u64),
    Drew(Rarity),
    BattlesWon(u64),
    AuctionsSold(u64),
    SalePriceAtLeast(u64),
    BalanceAtLeast(u64),
}

pub struct AchievementDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub reward: u64,
    pub icon: &'static str,
    unlock: Unlock,
}

const fn def(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    reward: u64,
    icon: &'static str,
    unlock: Unlock,
) -> AchievementDefinition {
    AchievementDefinition {
        id,
        name,
        description,
        reward,
        icon,
        unlock,
    }
}

pub static ACHIEVEMENTS: [AchievementDefinition; 23] = [
    def("welcome", "Welcome Trainer", "Create your account", 100, "👋", Unlock::SignedUp),
    def("first_pack", "First Pack", "Open your first pack", 50, "📦", Unlock::AnyPackOpened),
    def("collector_10", "Collector", "Own 10 different Pokemon", 100, "📚", Unlock::UniqueOwned(10)),
    def("collector_25", "Dedicated Collector", "Own 25 different Pokemon", 200, "📖", Unlock::UniqueOwned(25)),
    def("collector_50", "Master Collector", "Own 50 different Pokemon", 500, "🏛️", Unlock::UniqueOwned(50)),
    def("level_5", "Rising Trainer", "Reach level 5", 150, "⭐", Unlock::LevelAtLeast(5)),
    def("level_10", "Skilled Trainer", "Reach level 10", 300, "🌟", Unlock::LevelAtLeast(10)),
    def("level_25", "Expert Trainer", "Reach level 25", 500, "💫", Unlock::LevelAtLeast(25)),
    def("level_50", "Pokemon Master", "Reach level 50", 750, "👑", Unlock::LevelAtLeast(50)),
    def("pack_master_10", "Pack Opener", "Open 10 packs", 100, "🎁", Unlock::PacksOpened(10)),
    def("pack_master_50", "Pack Master", "Open 50 packs", 300, "🎉", Unlock::PacksOpened(50)),
    def("rare_collector", "Rare Find", "Pull a rare Pokemon", 100, "💎", Unlock::Drew(Rarity::Rare)),
    def("epic_collector", "Epic Find", "Pull an epic Pokemon", 200, "🔮", Unlock::Drew(Rarity::Epic)),
    def("legendary_collector", "Legendary Find", "Pull a legendary Pokemon", 500, "🐉", Unlock::Drew(Rarity::Legendary)),
    def("first_battle", "First Victory", "Win your first battle", 75, "⚔️", Unlock::AnyBattleWon),
    def("battle_winner_10", "Battle Veteran", "Win 10 battles", 200, "🛡️", Unlock::BattlesWon(10)),
    def("battle_winner_50", "Battle Champion", "Win 50 battles", 500, "🏆", Unlock::BattlesWon(50)),
    def("trader", "Trader", "Sell a Pokemon at auction", 75, "🤝", Unlock::AnyAuctionSale),
    def("auction_master", "Auction Master", "Sell 10 Pokemon at auction", 300, "🔨", Unlock::AuctionsSold(10)),
    def("big_seller", "Big Seller", "Sell a Pokemon for 500 coins or more", 200, "💰", Unlock::SalePriceAtLeast(500)),
    def("social_trader", "Social Trader", "Buy a Pokemon at auction", 100, "🛒", Unlock::AnyAuctionPurchase),
    def("rich", "Rich Trainer", "Hold 1000 coins", 200, "🪙", Unlock::BalanceAtLeast(1000)),
    def("millionaire", "Millionaire", "Hold 5000 coins", 500, "💸", Unlock::BalanceAtLeast(5000)),
];

pub fn definitions() -> impl Iterator<Item = &'static AchievementDefinition> {
    ACHIEVEMENTS.iter()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AchievementState {
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub rewarded: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(crate = "rocket::serde", default)]
pub struct UserStats {
    pub packs_opened: u64,
    pub battles_won: u64,
    pub auctions_sold: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AchievementView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub reward: u64,
    pub icon: String,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub rewarded: bool,
}

/// Achievements completed by one `record` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Unlocked {
    pub ids: Vec<&'static str>,
    pub coins: u64,
}

fn satisfied(unlock: Unlock, event: &AchievementEvent, stats: &UserStats) -> bool {
    use AchievementEvent as E;
    match (unlock, event) {
        (Unlock::SignedUp, E::SignedUp) => true,
        (Unlock::AnyPackOpened, E::PackOpened { .. }) => true,
        (Unlock::AnyBattleWon, E::BattleWon) => true,
        (Unlock::AnyAuctionSale, E::AuctionSale { .. }) => true,
        (Unlock::AnyAuctionPurchase, E::AuctionPurchase { .. }) => true,
        (Unlock::UniqueOwned(n), E::PackOpened { unique_owned, .. })
        | (Unlock::UniqueOwned(n), E::AuctionPurchase { unique_owned })
        | (Unlock::UniqueOwned(n), E::CollectionChanged { unique_owned }) => *unique_owned >= n,
        (Unlock::LevelAtLeast(n), E::LevelUp { level }) => *level >= n,
        (Unlock::PacksOpened(n), E::PackOpened { .. }) => stats.packs_opened >= n,
        (Unlock::Drew(rarity), E::PackOpened { drawn, .. }) => drawn.contains(&rarity),
        (Unlock::BattlesWon(n), E::BattleWon) => stats.battles_won >= n,
        (Unlock::AuctionsSold(n), E::AuctionSale { .. }) => stats.auctions_sold >= n,
        (Unlock::SalePriceAtLeast(n), E::AuctionSale { price }) => *price >= n,
        (Unlock::BalanceAtLeast(n), E::CoinsUpdated { balance }) => *balance >= n,
        _ => false,
    }
}

fn achievements_key(user_id: &str) -> String {
    format!("achievements_{user_id}")
}

fn stats_key(user_id: &str) -> String {
    format!("stats_{user_id}")
}

#[derive(Clone)]
pub struct Achievements {
    store: Arc<dyn KvStore>,
    wallet: Wallet,
    clock: Arc<dyn Clock>,
}

impl Achievements {
    pub fn new(store: Arc<dyn KvStore>, wallet: Wallet, clock: Arc<dyn Clock>) -> Self {
        Achievements {
            store,
            wallet,
            clock,
        }
    }

    pub async fn states(&self, user_id: &str) -> PortalResult<BTreeMap<String, AchievementState>> {
        Ok(self
            .store
            .load(&achievements_key(user_id))
            .await?
            .unwrap_or_default())
    }

    pub async fn stats(&self, user_id: &str) -> PortalResult<UserStats> {
        Ok(self.store.load(&stats_key(user_id)).await?.unwrap_or_default())
    }

    pub async fn record(&self, user_id: &str, event: AchievementEvent) -> PortalResult<Unlocked> {
        let mut stats = self.stats(user_id).await?;
        let counted = match event {
            AchievementEvent::PackOpened { .. } => {
                stats.packs_opened += 1;
                true
            }
            AchievementEvent::BattleWon => {
                stats.battles_won += 1;
                true
            }
            AchievementEvent::AuctionSale { .. } => {
                stats.auctions_sold += 1;
                true
            }
            _ => false,
        };
        if counted {
            self.store.save(&stats_key(user_id), &stats).await?;
        }

        let mut book = self.states(user_id).await?;
        let mut unlocked = Unlocked::default();
        let now = self.clock.now();
        for achievement in definitions() {
            let already = book.get(achievement.id).is_some_and(|s| s.completed);
            if already || !satisfied(achievement.unlock, &event, &stats) {
                continue;
            }
            book.insert(
                achievement.id.to_string(),
                AchievementState {
                    completed: true,
                    completed_at: Some(now),
                    rewarded: true,
                },
            );
            unlocked.ids.push(achievement.id);
            unlocked.coins += achievement.reward;
        }
        if unlocked.ids.is_empty() {
            return Ok(unlocked);
        }

        // Persist completion before paying so a replay cannot pay twice.
        self.store.save(&achievements_key(user_id), &book).await?;
        self.wallet.credit(user_id, unlocked.coins).await?;
        info!(
            "{} unlocked {:?} for {} coins",
            user_id, unlocked.ids, unlocked.coins
        );
        Ok(unlocked)
    }

    pub async fn views(&self, user_id: &str) -> PortalResult<Vec<AchievementView>> {
        let book = self.states(user_id).await?;
        Ok(definitions()
            .map(|a| {
                let state = book.get(a.id).cloned().unwrap_or_default();
                AchievementView {
                    id: a.id.to_string(),
                    name: a.name.to_string(),
                    description: a.description.to_string(),
                    reward: a.reward,
                    icon: a.icon.to_string(),
                    completed: state.completed,
                    completed_at: state.completed_at,
                    rewarded: state.rewarded,
                }
            })
            .collect())
    }
}
