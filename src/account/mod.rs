//! User accounts: profile records, nice-id handles and the leaderboard read.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::error::{PortalError, PortalResult};
use crate::identity::Identity;
use crate::store::{KvStore, KvStoreExt};

pub mod endpoints;
pub mod guards;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct UserAccount {
    pub id: String,
    pub email: String,
    pub name: String,
    pub nice_id: String,
    pub role: Role,
    pub poke_coins: u64,
    pub experience: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct LeaderboardEntry {
    pub id: String,
    pub name: String,
    pub nice_id: String,
    pub experience: u64,
    pub level: u32,
    pub role: Role,
}

const NICE_ADJECTIVES: [&str; 20] = [
    "Red", "Blue", "Swift", "Brave", "Wild", "Fire", "Water", "Thunder", "Shadow", "Mystic",
    "Royal", "Golden", "Silver", "Crystal", "Storm", "Frost", "Flame", "Ocean", "Forest", "Sky",
];

const NICE_CREATURES: [&str; 20] = [
    "Pikachu", "Charizard", "Blastoise", "Venusaur", "Lucario", "Garchomp", "Dragonite",
    "Mewtwo", "Mew", "Rayquaza", "Dialga", "Palkia", "Giratina", "Arceus", "Lugia", "Hooh",
    "Kyogre", "Groudon", "Reshiram", "Zekrom",
];

/// `<Adjective><Creature><1..=9999>`, e.g. `SwiftLucario4821`.
pub fn generate_nice_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let adjective = NICE_ADJECTIVES[rng.gen_range(0..NICE_ADJECTIVES.len())];
    let creature = NICE_CREATURES[rng.gen_range(0..NICE_CREATURES.len())];
    let number: u32 = rng.gen_range(1..=9999);
    format!("{adjective}{creature}{number}")
}

fn account_key(user_id: &str) -> String {
    format!("user_{user_id}")
}

fn nice_id_key(nice_id: &str) -> String {
    format!("nice_id_{nice_id}")
}

/// Account records in the store.
#[derive(Clone)]
pub struct Accounts {
    store: Arc<dyn KvStore>,
}

impl Accounts {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Accounts { store }
    }

    pub async fn get(&self, user_id: &str) -> PortalResult<Option<UserAccount>> {
        self.store.load(&account_key(user_id)).await
    }

    pub async fn require(&self, user_id: &str) -> PortalResult<UserAccount> {
        self.get(user_id)
            .await?
            .ok_or_else(|| PortalError::NotFound("User profile".into()))
    }

    pub async fn save(&self, account: &UserAccount) -> PortalResult<()> {
        self.store.save(&account_key(&account.id), account).await
    }

    pub async fn find_by_nice_id(&self, nice_id: &str) -> PortalResult<Option<UserAccount>> {
        let user_id: Option<String> = self.store.load(&nice_id_key(nice_id)).await?;
        match user_id {
            Some(id) => self.get(&id).await,
            None => Ok(None),
        }
    }

    /// Every stored account, in key order.
    pub async fn all(&self) -> PortalResult<Vec<UserAccount>> {
        let values = self.store.get_by_prefix("user_").await?;
        let mut accounts = Vec::with_capacity(values.len());
        for value in values {
            accounts.push(serde_json::from_value(value)?);
        }
        Ok(accounts)
    }

    /// Stores a fresh account for `identity` under a newly generated, unused nice id.
    pub async fn create<R: Rng + Send + ?Sized>(
        &self,
        identity: &Identity,
        name: &str,
        role: Role,
        starting_coins: u64,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> PortalResult<UserAccount> {
        let mut nice_id = generate_nice_id(rng);
        while self.store.get(&nice_id_key(&nice_id)).await?.is_some() {
            nice_id = generate_nice_id(rng);
        }

        let account = UserAccount {
            id: identity.id.clone(),
            email: identity.email.clone(),
            name: name.trim().to_string(),
            nice_id,
            role,
            poke_coins: starting_coins,
            experience: 0,
            created_at: now,
        };
        self.save(&account).await?;
        self.store
            .save(&nice_id_key(&account.nice_id), &account.id)
            .await?;
        Ok(account)
    }

    pub async fn set_role(&self, nice_id: &str, role: Role) -> PortalResult<UserAccount> {
        let mut account = self
            .find_by_nice_id(nice_id)
            .await?
            .ok_or_else(|| PortalError::NotFound("User".into()))?;
        account.role = role;
        self.save(&account).await?;
        Ok(account)
    }
}

/// Orders accounts by experience, highest first, keeping at most `limit`.
pub fn rank_by_experience(mut entries: Vec<LeaderboardEntry>, limit: usize) -> Vec<LeaderboardEntry> {
    entries.sort_by(|a, b| b.experience.cmp(&a.experience));
    entries.truncate(limit);
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use rand::SeedableRng;
    use rand_pcg::Lcg64Xsh32;

    fn identity(id: &str) -> Identity {
        Identity {
            id: id.to_string(),
            email: format!("{id}@example.com"),
        }
    }

    #[test]
    fn nice_ids_have_the_expected_shape() {
        let mut rng = Lcg64Xsh32::seed_from_u64(11);
        for _ in 0..50 {
            let nice = generate_nice_id(&mut rng);
            let digits: String = nice.chars().filter(|c| c.is_ascii_digit()).collect();
            let n: u32 = digits.parse().expect("numeric suffix");
            assert!((1..=9999).contains(&n));
            assert!(NICE_ADJECTIVES.iter().any(|a| nice.starts_with(a)));
        }
    }

    #[rocket::async_test]
    async fn created_account_is_indexed_by_nice_id() {
        let accounts = Accounts::new(Arc::new(MemoryStore::new()));
        let mut rng = Lcg64Xsh32::seed_from_u64(5);
        let account = accounts
            .create(&identity("u1"), " Ash ", Role::User, 500, Utc::now(), &mut rng)
            .await
            .unwrap();
        assert_eq!(account.name, "Ash");
        assert_eq!(account.poke_coins, 500);

        let found = accounts.find_by_nice_id(&account.nice_id).await.unwrap();
        assert_eq!(found, Some(account.clone()));
        assert_eq!(accounts.all().await.unwrap(), vec![account]);
    }

    #[rocket::async_test]
    async fn nice_id_collision_is_regenerated() {
        let store = Arc::new(MemoryStore::new());
        let accounts = Accounts::new(store.clone());
        let first_choice = generate_nice_id(&mut Lcg64Xsh32::seed_from_u64(9));
        store
            .save(&nice_id_key(&first_choice), &"someone-else".to_string())
            .await
            .unwrap();

        let account = accounts
            .create(
                &identity("u2"),
                "Gary",
                Role::User,
                500,
                Utc::now(),
                &mut Lcg64Xsh32::seed_from_u64(9),
            )
            .await
            .unwrap();
        assert_ne!(account.nice_id, first_choice);
    }

    #[test]
    fn leaderboard_sorts_descending_and_truncates() {
        let entry = |id: &str, experience| LeaderboardEntry {
            id: id.into(),
            name: id.into(),
            nice_id: id.into(),
            experience,
            level: 1,
            role: Role::User,
        };
        let ranked = rank_by_experience(vec![entry("a", 10), entry("b", 300), entry("c", 50)], 2);
        let ids: Vec<&str> = ranked.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }
}
