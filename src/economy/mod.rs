//! Economy engine: coin balances and pack opening.

use std::sync::Arc;

use log::info;
use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::achievements::quests::{QuestKey, Quests};
use crate::achievements::{AchievementEvent, Achievements};
use crate::catalog::{Catalog, CreatureDefinition, Rarity};
use crate::clock::Clock;
use crate::error::PortalResult;
use crate::ids::tagged_id;
use crate::ledger::Ledger;
use crate::progression::{LevelUp, Progression};

use self::packs::PackCatalog;
use self::wallet::Wallet;

pub mod endpoints;
pub mod packs;
pub mod wallet;

pub const BASE_PACK_EXPERIENCE: u64 = 25;

pub fn rarity_experience(rarity: Rarity) -> u64 {
    match rarity {
        Rarity::Common => 10,
        Rarity::Uncommon => 20,
        Rarity::Rare => 40,
        Rarity::Epic => 80,
        Rarity::Legendary => 200,
    }
}

/// A drawn creature tagged with a per-draw id for the reveal animation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct DrawnCard {
    #[serde(flatten)]
    pub pokemon: CreatureDefinition,
    pub card_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct PackOpening {
    pub cards: Vec<DrawnCard>,
    pub remaining_coins: u64,
    pub experience_gained: u64,
    pub level_result: LevelUp,
}

#[derive(Clone)]
pub struct Economy {
    wallet: Wallet,
    ledger: Ledger,
    packs: PackCatalog,
    catalog: Arc<Catalog>,
    progression: Progression,
    achievements: Achievements,
    quests: Quests,
    clock: Arc<dyn Clock>,
}

impl Economy {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        wallet: Wallet,
        ledger: Ledger,
        packs: PackCatalog,
        catalog: Arc<Catalog>,
        progression: Progression,
        achievements: Achievements,
        quests: Quests,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Economy {
            wallet,
            ledger,
            packs,
            catalog,
            progression,
            achievements,
            quests,
            clock,
        }
    }

    pub async fn open_pack<R: Rng + Send + ?Sized>(
        &self,
        user_id: &str,
        pack_key: &str,
        rng: &mut R,
    ) -> PortalResult<PackOpening> {
        let pack = self.packs.get(pack_key).await?;
        self.wallet.deduct(user_id, pack.cost).await?;

        let now = self.clock.now();
        let mut cards = Vec::with_capacity(pack.cards as usize);
        for _ in 0..pack.cards {
            let rarity = pack.rarities.draw(rng.gen::<f64>());
            // An empty tier yields nothing for this slot.
            if let Some(pokemon) = self.catalog.random_of_rarity(rarity, rng) {
                cards.push(DrawnCard {
                    pokemon: pokemon.clone(),
                    card_id: tagged_id("card", now, rng),
                });
            }
        }

        let ids: Vec<u32> = cards.iter().map(|c| c.pokemon.id).collect();
        let fresh = self.ledger.add_all(user_id, &ids).await?;

        let experience_gained = BASE_PACK_EXPERIENCE
            + cards
                .iter()
                .map(|c| rarity_experience(c.pokemon.rarity))
                .sum::<u64>();
        let level_result = self
            .progression
            .add_experience(user_id, experience_gained)
            .await?;

        let unique_owned = self.ledger.unique_count(user_id).await?;
        self.achievements
            .record(
                user_id,
                AchievementEvent::PackOpened {
                    drawn: cards.iter().map(|c| c.pokemon.rarity).collect(),
                    unique_owned,
                },
            )
            .await?;
        self.quests.update(user_id, QuestKey::OpenPack, 1).await?;
        self.quests
            .update(user_id, QuestKey::CollectCards, fresh.len() as u32)
            .await?;

        let remaining_coins = self.wallet.balance(user_id).await?;
        info!(
            "{} opened {} pack: {} cards, {} new, {} xp",
            user_id,
            pack_key,
            cards.len(),
            fresh.len(),
            experience_gained
        );
        Ok(PackOpening {
            cards,
            remaining_coins,
            experience_gained,
            level_result,
        })
    }
}
