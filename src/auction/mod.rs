//! Auction house.
//!
//! Listing escrows one creature copy out of the seller's ledger; bidding
//! escrows the bid from the bidder's balance and refunds whoever was outbid.
//! An auction is `active` until it is bought out, swept after expiry or
//! removed by an admin. Expiry is lazy: [`AuctionHouse::settle_expired`] runs
//! when a client asks for it or lists active auctions.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use log::{info, warn};
use rand::Rng;
use rocket::serde::{Deserialize, Serialize};
use rocket_okapi::JsonSchema;

use crate::account::Accounts;
use crate::achievements::quests::{QuestKey, Quests};
use crate::achievements::{AchievementEvent, Achievements};
use crate::catalog::{Catalog, CreatureDefinition};
use crate::clock::Clock;
use crate::economy::wallet::Wallet;
use crate::error::{PortalError, PortalResult};
use crate::ids::tagged_id;
use crate::ledger::Ledger;
use crate::store::{KvStore, KvStoreExt};

pub mod endpoints;

pub const DURATIONS_HOURS: [u32; 4] = [6, 12, 24, 48];
/// A bid of this many times the starting price buys the creature outright.
pub const BUY_NOW_MULTIPLIER: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum AuctionStatus {
    Active,
    Sold,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Bid {
    pub bidder_id: String,
    pub amount: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct Auction {
    pub id: String,
    pub seller_id: String,
    pub pokemon_id: u32,
    pub starting_price: u64,
    pub current_price: u64,
    pub highest_bidder: Option<String>,
    pub status: AuctionStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub bids: Vec<Bid>,
}

impl Auction {
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Active && now < self.expires_at
    }
}

/// Auction enriched for listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct AuctionListing {
    #[serde(flatten)]
    pub auction: Auction,
    pub seller_nice_id: Option<String>,
    pub pokemon: Option<CreatureDefinition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde", rename_all = "camelCase")]
pub struct BidOutcome {
    pub auction: Auction,
    pub bought_now: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(crate = "rocket::serde")]
pub struct SweepReport {
    pub completed: usize,
    pub sold: usize,
    pub expired: usize,
}

#[derive(Clone)]
pub struct AuctionHouse {
    store: Arc<dyn KvStore>,
    accounts: Accounts,
    wallet: Wallet,
    ledger: Ledger,
    achievements: Achievements,
    quests: Quests,
    catalog: Arc<Catalog>,
    clock: Arc<dyn Clock>,
}

impl AuctionHouse {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn KvStore>,
        accounts: Accounts,
        wallet: Wallet,
        ledger: Ledger,
        achievements: Achievements,
        quests: Quests,
        catalog: Arc<Catalog>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        AuctionHouse {
            store,
            accounts,
            wallet,
            ledger,
            achievements,
            quests,
            catalog,
            clock,
        }
    }

    pub async fn get(&self, auction_id: &str) -> PortalResult<Auction> {
        if !auction_id.starts_with("auction_") {
            return Err(PortalError::NotFound("Auction".into()));
        }
        self.store
            .load(auction_id)
            .await?
            .ok_or_else(|| PortalError::NotFound("Auction".into()))
    }

    async fn save(&self, auction: &Auction) -> PortalResult<()> {
        self.store.save(&auction.id, auction).await
    }

    async fn all(&self) -> PortalResult<Vec<Auction>> {
        let values = self.store.get_by_prefix("auction_").await?;
        let mut auctions = Vec::with_capacity(values.len());
        for value in values {
            auctions.push(serde_json::from_value(value)?);
        }
        Ok(auctions)
    }

    pub async fn create<R: Rng + Send + ?Sized>(
        &self,
        seller_id: &str,
        pokemon_id: u32,
        starting_price: u64,
        duration_hours: u32,
        rng: &mut R,
    ) -> PortalResult<Auction> {
        if starting_price == 0 {
            return Err(PortalError::Validation("Starting price must be positive".into()));
        }
        if !DURATIONS_HOURS.contains(&duration_hours) {
            return Err(PortalError::Validation(format!(
                "Duration must be one of {DURATIONS_HOURS:?} hours"
            )));
        }
        if self.ledger.count(seller_id, pokemon_id).await? == 0 {
            return Err(PortalError::NotOwned);
        }
        self.ledger.decrement(seller_id, pokemon_id, 1).await?;

        let now = self.clock.now();
        let auction = Auction {
            id: tagged_id("auction", now, rng),
            seller_id: seller_id.to_string(),
            pokemon_id,
            starting_price,
            current_price: starting_price,
            highest_bidder: None,
            status: AuctionStatus::Active,
            created_at: now,
            expires_at: now + Duration::hours(i64::from(duration_hours)),
            bids: Vec::new(),
        };
        self.save(&auction).await?;
        info!(
            "{} listed pokemon {} for {} ({}h) as {}",
            seller_id, pokemon_id, starting_price, duration_hours, auction.id
        );
        Ok(auction)
    }

    pub async fn bid(&self, bidder_id: &str, auction_id: &str, amount: u64) -> PortalResult<BidOutcome> {
        let mut auction = self.get(auction_id).await?;
        let now = self.clock.now();
        if !auction.is_open(now) {
            return Err(PortalError::NotActive);
        }
        if auction.seller_id == bidder_id {
            return Err(PortalError::SelfBid);
        }
        if amount <= auction.current_price {
            return Err(PortalError::BidTooLow);
        }

        // A bidder raising their own bid only adds the difference to escrow.
        let previous = auction.highest_bidder.clone();
        let raising_own = previous.as_deref() == Some(bidder_id);
        let charge = if raising_own {
            amount - auction.current_price
        } else {
            amount
        };
        self.wallet.deduct(bidder_id, charge).await?;
        if let Some(outbid) = previous.filter(|_| !raising_own) {
            self.wallet.credit(&outbid, auction.current_price).await?;
        }

        auction.current_price = amount;
        auction.highest_bidder = Some(bidder_id.to_string());
        auction.bids.push(Bid {
            bidder_id: bidder_id.to_string(),
            amount,
            timestamp: now,
        });

        let bought_now = amount >= auction.starting_price.saturating_mul(BUY_NOW_MULTIPLIER);
        if bought_now {
            auction.status = AuctionStatus::Sold;
        }
        self.save(&auction).await?;

        if bought_now {
            info!("{} bought {} outright for {}", bidder_id, auction.id, amount);
            self.complete_sale(&auction).await?;
        }
        Ok(BidOutcome {
            auction,
            bought_now,
        })
    }

    /// Moves the escrowed creature to the winner and pays the seller the
    /// escrowed price.
    async fn complete_sale(&self, auction: &Auction) -> PortalResult<()> {
        let Some(buyer) = auction.highest_bidder.as_deref() else {
            return Err(PortalError::Internal(format!(
                "auction {} sold without a bidder",
                auction.id
            )));
        };
        self.ledger.increment(buyer, auction.pokemon_id, 1).await?;
        let balance = self
            .wallet
            .credit(&auction.seller_id, auction.current_price)
            .await?;

        let seller = auction.seller_id.as_str();
        self.achievements
            .record(
                seller,
                AchievementEvent::AuctionSale {
                    price: auction.current_price,
                },
            )
            .await?;
        self.achievements
            .record(seller, AchievementEvent::CoinsUpdated { balance })
            .await?;
        self.quests.update(seller, QuestKey::TradePokemon, 1).await?;

        let unique_owned = self.ledger.unique_count(buyer).await?;
        self.achievements
            .record(buyer, AchievementEvent::AuctionPurchase { unique_owned })
            .await?;
        Ok(())
    }

    /// Closes every active auction whose expiry has passed.
    pub async fn settle_expired(&self) -> PortalResult<SweepReport> {
        let now = self.clock.now();
        let mut report = SweepReport::default();
        for mut auction in self.all().await? {
            if auction.status != AuctionStatus::Active || now < auction.expires_at {
                continue;
            }
            if auction.highest_bidder.is_some() {
                auction.status = AuctionStatus::Sold;
                self.save(&auction).await?;
                self.complete_sale(&auction).await?;
                report.sold += 1;
                info!("{} sold at expiry for {}", auction.id, auction.current_price);
            } else {
                auction.status = AuctionStatus::Expired;
                self.save(&auction).await?;
                self.ledger
                    .increment(&auction.seller_id, auction.pokemon_id, 1)
                    .await?;
                report.expired += 1;
                info!("{} expired without bids", auction.id);
            }
            report.completed += 1;
        }
        Ok(report)
    }

    async fn enrich(&self, auction: Auction) -> PortalResult<AuctionListing> {
        let seller_nice_id = self
            .accounts
            .get(&auction.seller_id)
            .await?
            .map(|a| a.nice_id);
        let pokemon = self.catalog.get(auction.pokemon_id).cloned();
        Ok(AuctionListing {
            auction,
            seller_nice_id,
            pokemon,
        })
    }

    /// Open auctions, newest first, after a sweep.
    pub async fn active(&self) -> PortalResult<Vec<AuctionListing>> {
        self.settle_expired().await?;
        let now = self.clock.now();
        let mut open: Vec<Auction> = self
            .all()
            .await?
            .into_iter()
            .filter(|a| a.is_open(now))
            .collect();
        open.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut listings = Vec::with_capacity(open.len());
        for auction in open {
            listings.push(self.enrich(auction).await?);
        }
        Ok(listings)
    }

    /// Every auction the user listed, any status, newest first.
    pub async fn mine(&self, seller_id: &str) -> PortalResult<Vec<AuctionListing>> {
        let mut own: Vec<Auction> = self
            .all()
            .await?
            .into_iter()
            .filter(|a| a.seller_id == seller_id)
            .collect();
        own.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let mut listings = Vec::with_capacity(own.len());
        for auction in own {
            listings.push(self.enrich(auction).await?);
        }
        Ok(listings)
    }

    /// Moderation delete. An active auction's escrow goes back first.
    pub async fn remove(&self, auction_id: &str) -> PortalResult<Auction> {
        let auction = self.get(auction_id).await?;
        if auction.status == AuctionStatus::Active {
            self.ledger
                .increment(&auction.seller_id, auction.pokemon_id, 1)
                .await?;
            if let Some(bidder) = &auction.highest_bidder {
                self.wallet.credit(bidder, auction.current_price).await?;
            }
        }
        self.store.delete(&auction.id).await?;
        warn!("auction {} removed by moderation", auction.id);
        Ok(auction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::Role;
    use crate::clock::ManualClock;
    use crate::identity::Identity;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand_pcg::Lcg64Xsh32;

    struct Fixture {
        house: AuctionHouse,
        wallet: Wallet,
        ledger: Ledger,
        clock: Arc<ManualClock>,
        rng: Lcg64Xsh32,
    }

    async fn fixture(users: &[(&str, u64)]) -> Fixture {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
        ));
        let accounts = Accounts::new(store.clone());
        let mut rng = Lcg64Xsh32::seed_from_u64(77);
        for (id, coins) in users {
            let identity = Identity {
                id: id.to_string(),
                email: format!("{id}@example.com"),
            };
            accounts
                .create(&identity, id, Role::User, *coins, clock.now(), &mut rng)
                .await
                .unwrap();
        }
        let wallet = Wallet::new(accounts.clone());
        let ledger = Ledger::new(store.clone());
        let achievements = Achievements::new(store.clone(), wallet.clone(), clock.clone());
        let quests = Quests::new(store.clone(), clock.clone());
        let house = AuctionHouse::new(
            store,
            accounts,
            wallet.clone(),
            ledger.clone(),
            achievements,
            quests,
            Arc::new(Catalog::seeded()),
            clock.clone(),
        );
        Fixture {
            house,
            wallet,
            ledger,
            clock,
            rng,
        }
    }

    #[rocket::async_test]
    async fn listing_escrows_one_copy_immediately() {
        let mut f = fixture(&[("seller", 0)]).await;
        f.ledger.increment("seller", 25, 1).await.unwrap();
        let auction = f.house.create("seller", 25, 100, 24, &mut f.rng).await.unwrap();
        assert_eq!(f.ledger.count("seller", 25).await.unwrap(), 0);
        assert_eq!(auction.current_price, 100);
        assert_eq!(auction.highest_bidder, None);
        assert!(auction.id.starts_with("auction_"));
        assert_eq!(auction.expires_at - auction.created_at, Duration::hours(24));

        assert_eq!(
            f.house.create("seller", 25, 100, 24, &mut f.rng).await,
            Err(PortalError::NotOwned)
        );
    }

    #[rocket::async_test]
    async fn create_rejects_bad_terms() {
        let mut f = fixture(&[("seller", 0)]).await;
        f.ledger.increment("seller", 25, 1).await.unwrap();
        assert!(matches!(
            f.house.create("seller", 25, 0, 24, &mut f.rng).await,
            Err(PortalError::Validation(_))
        ));
        assert!(matches!(
            f.house.create("seller", 25, 100, 7, &mut f.rng).await,
            Err(PortalError::Validation(_))
        ));
        assert_eq!(f.ledger.count("seller", 25).await.unwrap(), 1);
    }

    #[rocket::async_test]
    async fn bid_rejections_leave_balances_alone() {
        let mut f = fixture(&[("seller", 0), ("poor", 50), ("rich", 1000)]).await;
        f.ledger.increment("seller", 25, 1).await.unwrap();
        let auction = f.house.create("seller", 25, 100, 6, &mut f.rng).await.unwrap();

        assert_eq!(f.house.bid("seller", &auction.id, 150).await, Err(PortalError::SelfBid));
        assert_eq!(f.house.bid("rich", &auction.id, 100).await, Err(PortalError::BidTooLow));
        assert_eq!(
            f.house.bid("poor", &auction.id, 120).await,
            Err(PortalError::InsufficientFunds)
        );
        assert_eq!(
            f.house.bid("rich", "auction_missing", 120).await,
            Err(PortalError::NotFound("Auction".into()))
        );
        assert_eq!(f.wallet.balance("poor").await.unwrap(), 50);
        assert_eq!(f.wallet.balance("rich").await.unwrap(), 1000);

        f.clock.advance(Duration::hours(6));
        assert_eq!(f.house.bid("rich", &auction.id, 120).await, Err(PortalError::NotActive));
    }

    #[rocket::async_test]
    async fn outbid_bidders_are_refunded() {
        let mut f = fixture(&[("seller", 0), ("a", 500), ("b", 500), ("c", 500)]).await;
        f.ledger.increment("seller", 4, 1).await.unwrap();
        let auction = f.house.create("seller", 4, 100, 12, &mut f.rng).await.unwrap();

        f.house.bid("a", &auction.id, 110).await.unwrap();
        f.house.bid("b", &auction.id, 150).await.unwrap();
        f.house.bid("a", &auction.id, 200).await.unwrap();
        let last = f.house.bid("c", &auction.id, 250).await.unwrap();

        assert!(!last.bought_now);
        assert_eq!(last.auction.bids.len(), 4);
        assert_eq!(f.wallet.balance("a").await.unwrap(), 500);
        assert_eq!(f.wallet.balance("b").await.unwrap(), 500);
        assert_eq!(f.wallet.balance("c").await.unwrap(), 250);
    }

    #[rocket::async_test]
    async fn raising_own_bid_charges_only_the_difference() {
        let mut f = fixture(&[("seller", 0), ("a", 500)]).await;
        f.ledger.increment("seller", 4, 1).await.unwrap();
        let auction = f.house.create("seller", 4, 100, 12, &mut f.rng).await.unwrap();
        f.house.bid("a", &auction.id, 120).await.unwrap();
        f.house.bid("a", &auction.id, 180).await.unwrap();
        assert_eq!(f.wallet.balance("a").await.unwrap(), 320);
    }

    #[rocket::async_test]
    async fn buy_now_settles_immediately() {
        let mut f = fixture(&[("seller", 0), ("buyer", 1000)]).await;
        f.ledger.increment("seller", 150, 1).await.unwrap();
        let auction = f.house.create("seller", 150, 100, 48, &mut f.rng).await.unwrap();

        let outcome = f.house.bid("buyer", &auction.id, 300).await.unwrap();
        assert!(outcome.bought_now);
        assert_eq!(outcome.auction.status, AuctionStatus::Sold);
        assert_eq!(f.ledger.count("buyer", 150).await.unwrap(), 1);
        assert_eq!(f.ledger.count("seller", 150).await.unwrap(), 0);
        // 300 for the sale plus the trader achievement
        assert_eq!(f.wallet.balance("seller").await.unwrap(), 300 + 75);
        // 1000 - 300 plus social_trader
        assert_eq!(f.wallet.balance("buyer").await.unwrap(), 700 + 100);
        assert_eq!(
            f.house.bid("buyer", &auction.id, 400).await,
            Err(PortalError::NotActive)
        );
    }

    #[rocket::async_test]
    async fn sweep_sells_or_returns_escrow() {
        let mut f = fixture(&[("seller", 0), ("bidder", 500)]).await;
        f.ledger.increment("seller", 1, 1).await.unwrap();
        f.ledger.increment("seller", 4, 1).await.unwrap();
        let with_bid = f.house.create("seller", 1, 50, 6, &mut f.rng).await.unwrap();
        let without_bid = f.house.create("seller", 4, 50, 6, &mut f.rng).await.unwrap();
        f.house.bid("bidder", &with_bid.id, 60).await.unwrap();

        let early = f.house.settle_expired().await.unwrap();
        assert_eq!(early, SweepReport::default());
        assert_eq!(f.house.active().await.unwrap().len(), 2);

        f.clock.advance(Duration::hours(6));
        let report = f.house.settle_expired().await.unwrap();
        assert_eq!(
            report,
            SweepReport {
                completed: 2,
                sold: 1,
                expired: 1
            }
        );
        assert_eq!(f.ledger.count("bidder", 1).await.unwrap(), 1);
        assert_eq!(f.ledger.count("seller", 4).await.unwrap(), 1);
        assert_eq!(f.wallet.balance("bidder").await.unwrap(), 440 + 100);
        assert_eq!(f.wallet.balance("seller").await.unwrap(), 60 + 75);
        assert_eq!(
            f.house.get(&without_bid.id).await.unwrap().status,
            AuctionStatus::Expired
        );
        assert!(f.house.active().await.unwrap().is_empty());
        assert_eq!(f.house.settle_expired().await.unwrap(), SweepReport::default());
    }

    #[rocket::async_test]
    async fn active_listing_carries_seller_handle() {
        let mut f = fixture(&[("seller", 0)]).await;
        f.ledger.increment("seller", 25, 1).await.unwrap();
        f.house.create("seller", 25, 100, 24, &mut f.rng).await.unwrap();
        let listings = f.house.active().await.unwrap();
        assert_eq!(listings.len(), 1);
        assert!(listings[0].seller_nice_id.is_some());
        assert_eq!(listings[0].pokemon.as_ref().map(|p| p.id), Some(25));
        assert_eq!(f.house.mine("seller").await.unwrap().len(), 1);
        assert!(f.house.mine("someone-else").await.unwrap().is_empty());
    }

    #[rocket::async_test]
    async fn removal_unwinds_escrow() {
        let mut f = fixture(&[("seller", 0), ("bidder", 500)]).await;
        f.ledger.increment("seller", 7, 1).await.unwrap();
        let auction = f.house.create("seller", 7, 100, 24, &mut f.rng).await.unwrap();
        f.house.bid("bidder", &auction.id, 150).await.unwrap();

        f.house.remove(&auction.id).await.unwrap();
        assert_eq!(f.ledger.count("seller", 7).await.unwrap(), 1);
        assert_eq!(f.wallet.balance("bidder").await.unwrap(), 500);
        assert!(matches!(
            f.house.get(&auction.id).await,
            Err(PortalError::NotFound(_))
        ));
    }
}
