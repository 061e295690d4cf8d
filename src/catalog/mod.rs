//! Creature catalogue: the immutable registry every engine draws from.

use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

pub mod endpoints;

/// Rarity tiers, declared in canonical (ascending) order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }
}

/// Elemental type tag. Presentation data, carried through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct PokemonType {
    pub name: String,
    pub icon: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct BaseStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub speed: u32,
}

impl BaseStats {
    pub fn total(&self) -> u32 {
        self.hp + self.attack + self.defense + self.speed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct CreatureDefinition {
    pub id: u32,
    pub name: String,
    pub rarity: Rarity,
    pub image: String,
    pub stats: BaseStats,
    pub total_stats: u32,
    pub types: Vec<PokemonType>,
}

impl CreatureDefinition {
    pub fn new(
        id: u32,
        name: &str,
        rarity: Rarity,
        stats: BaseStats,
        types: Vec<PokemonType>,
    ) -> Self {
        CreatureDefinition {
            id,
            name: name.to_string(),
            rarity,
            image: format!(
                "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/other/official-artwork/{id}.png"
            ),
            total_stats: stats.total(),
            stats,
            types,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    creatures: Vec<CreatureDefinition>,
}

impl Catalog {
    pub fn new(creatures: Vec<CreatureDefinition>) -> Self {
        Catalog { creatures }
    }

    /// The built-in ten-creature catalogue.
    pub fn seeded() -> Self {
        let grass = ptype("grass", "🌿", "#78C850");
        let poison = ptype("poison", "☠️", "#A040A0");
        let fire = ptype("fire", "🔥", "#F08030");
        let water = ptype("water", "💧", "#6890F0");
        let electric = ptype("electric", "⚡", "#F8D030");
        let flying = ptype("flying", "🦅", "#A890F0");
        let psychic = ptype("psychic", "🔮", "#F85888");
        let ice = ptype("ice", "❄️", "#98D8D8");

        Catalog::new(vec![
            CreatureDefinition::new(
                1,
                "bulbasaur",
                Rarity::Common,
                stats(45, 49, 49, 45),
                vec![grass.clone(), poison.clone()],
            ),
            CreatureDefinition::new(
                4,
                "charmander",
                Rarity::Common,
                stats(39, 52, 43, 65),
                vec![fire.clone()],
            ),
            CreatureDefinition::new(
                7,
                "squirtle",
                Rarity::Common,
                stats(44, 48, 65, 43),
                vec![water.clone()],
            ),
            CreatureDefinition::new(
                25,
                "pikachu",
                Rarity::Uncommon,
                stats(35, 55, 40, 90),
                vec![electric],
            ),
            CreatureDefinition::new(
                6,
                "charizard",
                Rarity::Epic,
                stats(78, 84, 78, 100),
                vec![fire, flying.clone()],
            ),
            CreatureDefinition::new(
                9,
                "blastoise",
                Rarity::Rare,
                stats(79, 83, 100, 78),
                vec![water.clone()],
            ),
            CreatureDefinition::new(
                3,
                "venusaur",
                Rarity::Rare,
                stats(80, 82, 83, 80),
                vec![grass, poison],
            ),
            CreatureDefinition::new(
                150,
                "mewtwo",
                Rarity::Legendary,
                stats(106, 110, 90, 130),
                vec![psychic],
            ),
            CreatureDefinition::new(
                144,
                "articuno",
                Rarity::Legendary,
                stats(90, 85, 100, 85),
                vec![ice.clone(), flying],
            ),
            CreatureDefinition::new(
                131,
                "lapras",
                Rarity::Epic,
                stats(130, 85, 80, 60),
                vec![water, ice],
            ),
        ])
    }

    pub fn all(&self) -> &[CreatureDefinition] {
        &self.creatures
    }

    pub fn get(&self, id: u32) -> Option<&CreatureDefinition> {
        self.creatures.iter().find(|c| c.id == id)
    }

    pub fn of_rarity(&self, rarity: Rarity) -> Vec<&CreatureDefinition> {
        self.creatures.iter().filter(|c| c.rarity == rarity).collect()
    }

    /// Uniform pick among creatures of `rarity`; `None` when the tier is empty.
    pub fn random_of_rarity<R: Rng + ?Sized>(
        &self,
        rarity: Rarity,
        rng: &mut R,
    ) -> Option<&CreatureDefinition> {
        let pool = self.of_rarity(rarity);
        if pool.is_empty() {
            return None;
        }
        Some(pool[rng.gen_range(0..pool.len())])
    }

    /// Uniform pick over the whole catalogue.
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&CreatureDefinition> {
        if self.creatures.is_empty() {
            return None;
        }
        Some(&self.creatures[rng.gen_range(0..self.creatures.len())])
    }
}

fn ptype(name: &str, icon: &str, color: &str) -> PokemonType {
    PokemonType {
        name: name.to_string(),
        icon: icon.to_string(),
        color: color.to_string(),
    }
}

fn stats(hp: u32, attack: u32, defense: u32, speed: u32) -> BaseStats {
    BaseStats {
        hp,
        attack,
        defense,
        speed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Lcg64Xsh32;

    #[test]
    fn seeded_catalog_uses_national_dex_numbers() {
        let catalog = Catalog::seeded();
        assert_eq!(catalog.all().len(), 10);
        let pikachu = catalog.get(25).expect("pikachu seeded");
        assert_eq!(pikachu.rarity, Rarity::Uncommon);
        assert_eq!(pikachu.total_stats, 220);
        assert_eq!(catalog.of_rarity(Rarity::Common).len(), 3);
        assert_eq!(catalog.of_rarity(Rarity::Legendary).len(), 2);
    }

    #[test]
    fn rarity_order_is_canonical() {
        let mut sorted = Rarity::ALL;
        sorted.sort();
        assert_eq!(sorted, Rarity::ALL);
        assert!(Rarity::Common < Rarity::Legendary);
    }

    #[test]
    fn random_of_empty_tier_is_none() {
        let catalog = Catalog::new(vec![]);
        let mut rng = Lcg64Xsh32::seed_from_u64(1);
        assert!(catalog.random_of_rarity(Rarity::Epic, &mut rng).is_none());
        assert!(catalog.random(&mut rng).is_none());
    }

    #[test]
    fn random_of_rarity_stays_in_tier() {
        let catalog = Catalog::seeded();
        let mut rng = Lcg64Xsh32::seed_from_u64(7);
        for _ in 0..100 {
            let c = catalog
                .random_of_rarity(Rarity::Rare, &mut rng)
                .expect("rare tier is populated");
            assert_eq!(c.rarity, Rarity::Rare);
        }
    }
}
