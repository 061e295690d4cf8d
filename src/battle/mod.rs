//! Single-request battles against a random catalogue creature.

use std::sync::Arc;

use log::info;
use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::achievements::{AchievementEvent, Achievements};
use crate::catalog::{BaseStats, Catalog, CreatureDefinition, PokemonType, Rarity};
use crate::economy::wallet::Wallet;
use crate::error::{PortalError, PortalResult};
use crate::ledger::Ledger;
use crate::progression::{LevelUp, Progression};

pub mod endpoints;

pub const MAX_ROUNDS: u32 = 10;
pub const VICTORY_EXPERIENCE: u64 = 25;

pub fn rarity_multiplier(rarity: Rarity) -> f64 {
    match rarity {
        Rarity::Common => 1.0,
        Rarity::Uncommon => 1.2,
        Rarity::Rare => 1.4,
        Rarity::Epic => 1.6,
        Rarity::Legendary => 2.0,
    }
}

pub fn boosted_stats(stats: &BaseStats, rarity: Rarity) -> BaseStats {
    let m = rarity_multiplier(rarity);
    let scale = |v: u32| (f64::from(v) * m).floor() as u32;
    BaseStats {
        hp: scale(stats.hp),
        attack: scale(stats.attack),
        defense: scale(stats.defense),
        speed: scale(stats.speed),
    }
}

/// `floor(r * attack / 2) + floor(attack / 4)` for uniform `r` in [0, 1).
pub fn roll_damage<R: Rng + ?Sized>(attack: u32, rng: &mut R) -> u32 {
    (rng.gen::<f64>() * f64::from(attack) / 2.0).floor() as u32 + attack / 4
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Side {
    Player,
    Opponent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct BattleTurn {
    pub round: u32,
    pub attacker: Side,
    pub damage: u32,
    pub player_hp: u32,
    pub opponent_hp: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Simulation {
    pub victory: bool,
    pub player_hp: u32,
    pub opponent_hp: u32,
    pub log: Vec<BattleTurn>,
}

/// Up to [`MAX_ROUNDS`] rounds, player striking first each round. The player
/// wins only with strictly more HP left, so a tie goes to the opponent.
pub fn simulate<R: Rng + ?Sized>(player: &BaseStats, opponent: &BaseStats, rng: &mut R) -> Simulation {
    let mut player_hp = player.hp;
    let mut opponent_hp = opponent.hp;
    let mut log = Vec::new();

    'rounds: for round in 1..=MAX_ROUNDS {
        for attacker in [Side::Player, Side::Opponent] {
            let damage = match attacker {
                Side::Player => {
                    let d = roll_damage(player.attack, rng);
                    opponent_hp = opponent_hp.saturating_sub(d);
                    d
                }
                Side::Opponent => {
                    let d = roll_damage(opponent.attack, rng);
                    player_hp = player_hp.saturating_sub(d);
                    d
                }
            };
            log.push(BattleTurn {
                round,
                attacker,
                damage,
                player_hp,
                opponent_hp,
            });
            if player_hp == 0 || opponent_hp == 0 {
                break 'rounds;
            }
        }
    }

    Simulation {
        victory: player_hp > opponent_hp,
        player_hp,
        opponent_hp,
        log,
    }
}

/// A creature as it enters the arena, stats already boosted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Fighter {
    pub id: u32,
    pub name: String,
    pub rarity: Rarity,
    pub image: String,
    pub types: Vec<PokemonType>,
    pub stats: BaseStats,
    pub remaining_hp: u32,
}

impl Fighter {
    fn new(creature: &CreatureDefinition, stats: BaseStats, remaining_hp: u32) -> Self {
        Fighter {
            id: creature.id,
            name: creature.name.clone(),
            rarity: creature.rarity,
            image: creature.image.clone(),
            types: creature.types.clone(),
            stats,
            remaining_hp,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct BattleRewards {
    pub coins: u64,
    pub experience: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct BattleReport {
    pub victory: bool,
    pub winner: Side,
    pub player_pokemon: Fighter,
    pub opponent_pokemon: Fighter,
    pub rewards: BattleRewards,
    pub coins_awarded: u64,
    pub level_result: Option<LevelUp>,
    pub battle_log: Vec<BattleTurn>,
}

#[derive(Clone)]
pub struct BattleSimulator {
    catalog: Arc<Catalog>,
    ledger: Ledger,
    wallet: Wallet,
    progression: Progression,
    achievements: Achievements,
}

impl BattleSimulator {
    pub fn new(
        catalog: Arc<Catalog>,
        ledger: Ledger,
        wallet: Wallet,
        progression: Progression,
        achievements: Achievements,
    ) -> Self {
        BattleSimulator {
            catalog,
            ledger,
            wallet,
            progression,
            achievements,
        }
    }

    pub async fn fight<R: Rng + Send + ?Sized>(
        &self,
        user_id: &str,
        pokemon_id: u32,
        rng: &mut R,
    ) -> PortalResult<BattleReport> {
        if self.ledger.count(user_id, pokemon_id).await? == 0 {
            return Err(PortalError::NotOwned);
        }
        let player = self
            .catalog
            .get(pokemon_id)
            .ok_or_else(|| PortalError::NotFound("Pokemon".into()))?
            .clone();
        let opponent = self
            .catalog
            .random(rng)
            .ok_or_else(|| PortalError::NotFound("Opponent".into()))?
            .clone();

        let player_stats = boosted_stats(&player.stats, player.rarity);
        let opponent_stats = boosted_stats(&opponent.stats, opponent.rarity);
        let sim = simulate(&player_stats, &opponent_stats, rng);

        // Experience is quoted on every report but only paid on a win.
        let mut rewards = BattleRewards {
            coins: 0,
            experience: VICTORY_EXPERIENCE,
        };
        let mut level_result = None;
        if sim.victory {
            rewards.coins = rng.gen_range(10..=30);
            self.wallet.credit(user_id, rewards.coins).await?;
            level_result = Some(
                self.progression
                    .add_experience(user_id, rewards.experience)
                    .await?,
            );
            self.achievements
                .record(user_id, AchievementEvent::BattleWon)
                .await?;
            let balance = self.wallet.balance(user_id).await?;
            self.achievements
                .record(user_id, AchievementEvent::CoinsUpdated { balance })
                .await?;
        }
        info!(
            "{} battled {} with {}: {}",
            user_id,
            opponent.name,
            player.name,
            if sim.victory { "won" } else { "lost" }
        );

        Ok(BattleReport {
            victory: sim.victory,
            winner: if sim.victory {
                Side::Player
            } else {
                Side::Opponent
            },
            player_pokemon: Fighter::new(&player, player_stats, sim.player_hp),
            opponent_pokemon: Fighter::new(&opponent, opponent_stats, sim.opponent_hp),
            rewards,
            coins_awarded: rewards.coins,
            level_result,
            battle_log: sim.log,
        })
    }
}
