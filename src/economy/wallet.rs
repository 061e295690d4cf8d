use log::warn;

use crate::account::Accounts;
use crate::error::{PortalError, PortalResult};

/// Coin balance mutations on the account record.
///
/// Each call is one read-modify-write of `user_<id>`; concurrent calls for the
/// same user can race.
#[derive(Clone)]
pub struct Wallet {
    accounts: Accounts,
}

impl Wallet {
    pub fn new(accounts: Accounts) -> Self {
        Wallet { accounts }
    }

    pub async fn balance(&self, user_id: &str) -> PortalResult<u64> {
        Ok(self.accounts.require(user_id).await?.poke_coins)
    }

    /// Takes `amount` coins or nothing at all.
    pub async fn deduct(&self, user_id: &str, amount: u64) -> PortalResult<u64> {
        let mut account = self.accounts.require(user_id).await?;
        if account.poke_coins < amount {
            warn!(
                "{} cannot afford {} coins (balance {})",
                user_id, amount, account.poke_coins
            );
            return Err(PortalError::InsufficientFunds);
        }
        account.poke_coins -= amount;
        self.accounts.save(&account).await?;
        Ok(account.poke_coins)
    }

    pub async fn credit(&self, user_id: &str, amount: u64) -> PortalResult<u64> {
        let mut account = self.accounts.require(user_id).await?;
        account.poke_coins = account.poke_coins.saturating_add(amount);
        self.accounts.save(&account).await?;
        Ok(account.poke_coins)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;
    use crate::identity::Identity;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use rand::SeedableRng;
    use rand_pcg::Lcg64Xsh32;
    use std::sync::Arc;

    async fn wallet_with_user(coins: u64) -> Wallet {
        let accounts = Accounts::new(Arc::new(MemoryStore::new()));
        let identity = Identity {
            id: "ash".into(),
            email: "ash@pallet.town".into(),
        };
        accounts
            .create(
                &identity,
                "Ash",
                Role::User,
                coins,
                Utc::now(),
                &mut Lcg64Xsh32::seed_from_u64(1),
            )
            .await
            .unwrap();
        Wallet::new(accounts)
    }

    #[rocket::async_test]
    async fn deduct_is_all_or_nothing() {
        let wallet = wallet_with_user(100).await;
        assert_eq!(wallet.deduct("ash", 101).await, Err(PortalError::InsufficientFunds));
        assert_eq!(wallet.balance("ash").await.unwrap(), 100);
        assert_eq!(wallet.deduct("ash", 100).await.unwrap(), 0);
    }

    #[rocket::async_test]
    async fn credit_adds_and_unknown_user_is_not_found() {
        let wallet = wallet_with_user(10).await;
        assert_eq!(wallet.credit("ash", 40).await.unwrap(), 50);
        assert!(matches!(
            wallet.credit("misty", 1).await,
            Err(PortalError::NotFound(_))
        ));
    }
}
