use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::clock::Clock;
use crate::error::PortalResult;
use crate::store::{KvStore, KvStoreExt};

/// Daily quests. Progress is keyed by calendar day and starts over each day.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(crate = "rocket::serde", rename_all = "snake_case")]
pub enum QuestKey {
    OpenPack,
    CollectCards,
    TradePokemon,
}

pub struct QuestDefinition {
    pub key: QuestKey,
    pub name: &'static str,
    pub description: &'static str,
    pub reward: u64,
    pub target: u32,
    pub icon: &'static str,
}

pub static QUESTS: [QuestDefinition; 3] = [
    QuestDefinition {
        key: QuestKey::OpenPack,
        name: "Pack Opener",
        description: "Open a pack today",
        reward: 25,
        target: 1,
        icon: "📦",
    },
    QuestDefinition {
        key: QuestKey::CollectCards,
        name: "Collector",
        description: "Collect 3 new Pokemon today",
        reward: 50,
        target: 3,
        icon: "🃏",
    },
    QuestDefinition {
        key: QuestKey::TradePokemon,
        name: "Trader",
        description: "Sell a Pokemon at auction today",
        reward: 40,
        target: 1,
        icon: "🤝",
    },
];

impl QuestKey {
    pub fn definition(&self) -> &'static QuestDefinition {
        match self {
            QuestKey::OpenPack => &QUESTS[0],
            QuestKey::CollectCards => &QUESTS[1],
            QuestKey::TradePokemon => &QUESTS[2],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct QuestView {
    pub id: QuestKey,
    pub name: String,
    pub description: String,
    pub reward: u64,
    pub target: u32,
    pub icon: String,
    pub progress: u32,
    pub completed: bool,
}

type DayProgress = BTreeMap<QuestKey, u32>;

#[derive(Clone)]
pub struct Quests {
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
}

impl Quests {
    pub fn new(store: Arc<dyn KvStore>, clock: Arc<dyn Clock>) -> Self {
        Quests { store, clock }
    }

    fn today_key(&self, user_id: &str) -> String {
        format!("quests_{}_{}", user_id, self.clock.day_key())
    }

    async fn today(&self, user_id: &str) -> PortalResult<DayProgress> {
        Ok(self
            .store
            .load(&self.today_key(user_id))
            .await?
            .unwrap_or_default())
    }

    /// Adds `amount` to today's progress, capped at the quest target.
    pub async fn update(&self, user_id: &str, key: QuestKey, amount: u32) -> PortalResult<u32> {
        if amount == 0 {
            return Ok(self.today(user_id).await?.get(&key).copied().unwrap_or(0));
        }
        let target = key.definition().target;
        let mut progress = self.today(user_id).await?;
        let entry = progress.entry(key).or_insert(0);
        let before = *entry;
        *entry = before.saturating_add(amount).min(target);
        let after = *entry;
        self.store.save(&self.today_key(user_id), &progress).await?;
        if before < target && after >= target {
            info!("{} completed daily quest {:?}", user_id, key);
        }
        Ok(after)
    }

    pub async fn views(&self, user_id: &str) -> PortalResult<Vec<QuestView>> {
        let progress = self.today(user_id).await?;
        Ok(QUESTS
            .iter()
            .map(|q| {
                let done = progress.get(&q.key).copied().unwrap_or(0);
                QuestView {
                    id: q.key,
                    name: q.name.to_string(),
                    description: q.description.to_string(),
                    reward: q.reward,
                    target: q.target,
                    icon: q.icon.to_string(),
                    progress: done,
                    completed: done >= q.target,
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use chrono::{TimeZone, Utc};

    fn quests() -> (Quests, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        ));
        (Quests::new(Arc::new(MemoryStore::new()), clock.clone()), clock)
    }

    #[rocket::async_test]
    async fn progress_is_capped_at_target() {
        let (quests, _) = quests();
        assert_eq!(quests.update("ash", QuestKey::CollectCards, 2).await.unwrap(), 2);
        assert_eq!(quests.update("ash", QuestKey::CollectCards, 5).await.unwrap(), 3);
        let views = quests.views("ash").await.unwrap();
        let collect = views.iter().find(|q| q.id == QuestKey::CollectCards).unwrap();
        assert!(collect.completed);
        assert_eq!(collect.progress, 3);
    }

    #[rocket::async_test]
    async fn new_day_starts_from_zero() {
        let (quests, clock) = quests();
        quests.update("ash", QuestKey::OpenPack, 1).await.unwrap();
        clock.advance(chrono::Duration::days(1));
        let views = quests.views("ash").await.unwrap();
        assert!(views.iter().all(|q| q.progress == 0 && !q.completed));
    }

    #[test]
    fn quest_keys_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&QuestKey::TradePokemon).unwrap(),
            "\"trade_pokemon\""
        );
    }
}
