//! Pack types and the rarity-weighted draw.

use std::collections::BTreeMap;
use std::sync::Arc;

use log::info;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::catalog::Rarity;
use crate::error::{PortalError, PortalResult};
use crate::store::{KvStore, KvStoreExt};

const PACK_TYPES_KEY: &str = "pack_types";
const BUILT_IN_PACKS: [&str; 3] = ["basic", "premium", "legendary"];
pub const MAX_CARDS_PER_PACK: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct RarityChance {
    pub rarity: Rarity,
    pub enabled: bool,
    pub chance: f64,
}

/// One entry per rarity, always in canonical order, whatever order the input had.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", from = "Vec<RarityChance>")]
pub struct RarityTable(Vec<RarityChance>);

impl From<Vec<RarityChance>> for RarityTable {
    fn from(entries: Vec<RarityChance>) -> Self {
        let table = Rarity::ALL
            .iter()
            .map(|rarity| {
                entries
                    .iter()
                    .rev()
                    .find(|e| e.rarity == *rarity)
                    .copied()
                    .unwrap_or(RarityChance {
                        rarity: *rarity,
                        enabled: false,
                        chance: 0.0,
                    })
            })
            .collect();
        RarityTable(table)
    }
}

impl RarityTable {
    /// Chances in canonical order; `None` marks a disabled rarity.
    pub fn new(chances: [Option<f64>; 5]) -> Self {
        let entries = Rarity::ALL
            .iter()
            .zip(chances)
            .map(|(rarity, chance)| RarityChance {
                rarity: *rarity,
                enabled: chance.is_some(),
                chance: chance.unwrap_or(0.0),
            })
            .collect::<Vec<_>>();
        RarityTable::from(entries)
    }

    pub fn entries(&self) -> &[RarityChance] {
        &self.0
    }

    /// Maps a uniform `r` in [0, 1) to a rarity by walking the enabled
    /// chances cumulatively. Falls back to common when nothing reaches `r`.
    pub fn draw(&self, r: f64) -> Rarity {
        let mut cumulative = 0.0;
        for entry in &self.0 {
            if !entry.enabled || entry.chance <= 0.0 {
                continue;
            }
            cumulative += entry.chance;
            if cumulative >= r {
                return entry.rarity;
            }
        }
        Rarity::Common
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PackType {
    pub name: String,
    pub cost: u64,
    pub cards: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub rarities: RarityTable,
}

impl PackType {
    pub fn validate(&self) -> PortalResult<()> {
        if self.name.trim().is_empty() {
            return Err(PortalError::Validation("Pack name is required".into()));
        }
        if self.cost == 0 {
            return Err(PortalError::Validation("Pack cost must be positive".into()));
        }
        if self.cards == 0 || self.cards > MAX_CARDS_PER_PACK {
            return Err(PortalError::Validation(format!(
                "Card count must be between 1 and {MAX_CARDS_PER_PACK}"
            )));
        }
        if self
            .rarities
            .entries()
            .iter()
            .any(|e| !e.chance.is_finite() || !(0.0..=1.0).contains(&e.chance))
        {
            return Err(PortalError::Validation(
                "Rarity chances must be between 0 and 1".into(),
            ));
        }
        Ok(())
    }
}

pub fn default_pack_types() -> BTreeMap<String, PackType> {
    let mut packs = BTreeMap::new();
    packs.insert(
        "basic".to_string(),
        PackType {
            name: "Basic Pack".into(),
            cost: 100,
            cards: 3,
            image: None,
            rarities: RarityTable::new([Some(0.6), Some(0.3), Some(0.1), None, None]),
        },
    );
    packs.insert(
        "premium".to_string(),
        PackType {
            name: "Premium Pack".into(),
            cost: 250,
            cards: 5,
            image: None,
            rarities: RarityTable::new([Some(0.4), Some(0.35), Some(0.2), Some(0.05), None]),
        },
    );
    packs.insert(
        "legendary".to_string(),
        PackType {
            name: "Legendary Pack".into(),
            cost: 500,
            cards: 7,
            image: None,
            rarities: RarityTable::new([Some(0.2), Some(0.3), Some(0.3), Some(0.15), Some(0.05)]),
        },
    );
    packs
}

/// Active pack configuration, stored as a single `pack_types` record.
#[derive(Clone)]
pub struct PackCatalog {
    store: Arc<dyn KvStore>,
}

impl PackCatalog {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        PackCatalog { store }
    }

    pub async fn all(&self) -> PortalResult<BTreeMap<String, PackType>> {
        Ok(self
            .store
            .load(PACK_TYPES_KEY)
            .await?
            .unwrap_or_else(default_pack_types))
    }

    pub async fn get(&self, key: &str) -> PortalResult<PackType> {
        self.all()
            .await?
            .remove(key)
            .ok_or_else(|| PortalError::InvalidPackType(key.to_string()))
    }

    async fn put_all(&self, packs: &BTreeMap<String, PackType>) -> PortalResult<()> {
        self.store.save(PACK_TYPES_KEY, packs).await
    }

    /// Replaces the configuration of existing packs; unknown ids reject the whole update.
    pub async fn update_settings(
        &self,
        settings: BTreeMap<String, PackType>,
    ) -> PortalResult<BTreeMap<String, PackType>> {
        let mut packs = self.all().await?;
        for (id, pack) in &settings {
            if !packs.contains_key(id) {
                return Err(PortalError::InvalidPackType(id.clone()));
            }
            pack.validate()?;
        }
        packs.extend(settings);
        self.put_all(&packs).await?;
        info!("pack settings updated");
        Ok(packs)
    }

    pub async fn create(&self, id: &str, pack: PackType) -> PortalResult<PackType> {
        let id = id.trim();
        if id.is_empty() {
            return Err(PortalError::Validation("Pack id is required".into()));
        }
        pack.validate()?;
        let mut packs = self.all().await?;
        if packs.contains_key(id) {
            return Err(PortalError::Validation(format!("Pack type {id} already exists")));
        }
        packs.insert(id.to_string(), pack.clone());
        self.put_all(&packs).await?;
        info!("custom pack {} created", id);
        Ok(pack)
    }

    pub async fn delete(&self, id: &str) -> PortalResult<()> {
        if BUILT_IN_PACKS.contains(&id) {
            return Err(PortalError::Validation(
                "Built-in pack types cannot be deleted".into(),
            ));
        }
        let mut packs = self.all().await?;
        if packs.remove(id).is_none() {
            return Err(PortalError::NotFound("Pack type".into()));
        }
        self.put_all(&packs).await?;
        info!("custom pack {} deleted", id);
        Ok(())
    }
}
