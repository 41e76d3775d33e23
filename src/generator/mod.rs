//! Synthetic banking dataset generation.
//!
//! Produces customers, merchants, accounts and transactions in dependency order.
//! Every account belongs to a customer of the same batch, and every transaction
//! references a customer, a merchant and one of that customer's accounts.
//! Generation is deterministic for a given random source and reference time.

mod records;

use std::num::NonZeroUsize;
use std::ops::Range;

use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use fake::faker::address::en::{BuildingNumber, CityName, StateAbbr, StreetName, ZipCode};
use fake::faker::company::en::CompanyName;
use fake::faker::internet::en::{DomainSuffix, SafeEmail, Username};
use fake::faker::lorem::en::Sentence;
use fake::faker::name::en::{FirstName, LastName};
use fake::faker::phone_number::en::PhoneNumber;
use fake::Fake;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

pub use records::{
    Account, AccountStatus, AccountType, Customer, Merchant, MerchantCategory, RiskScore,
    SpendingCategory, Transaction, TransactionStatus, TransactionType,
};

use crate::error::ValidationError;

const DAYS_PER_YEAR: i64 = 365;
const MAX_DESCRIPTION_CHARS: usize = 50;

/// Largest population accepted for any one entity
pub const MAX_COUNT: usize = 100_000;

/// Requested population sizes, each within `1..=MAX_COUNT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSize {
    customers: NonZeroUsize,
    merchants: NonZeroUsize,
    transactions: NonZeroUsize,
}

impl DatasetSize {
    pub fn new(
        customers: usize,
        merchants: usize,
        transactions: usize,
    ) -> Result<Self, ValidationError> {
        let bounded = |count: usize, entity: &'static str| {
            if count > MAX_COUNT {
                return Err(ValidationError::TooMany {
                    entity,
                    count,
                    max: MAX_COUNT,
                });
            }
            NonZeroUsize::new(count).ok_or(ValidationError::ZeroCount { entity })
        };
        Ok(DatasetSize {
            customers: bounded(customers, "customer")?,
            merchants: bounded(merchants, "merchant")?,
            transactions: bounded(transactions, "transaction")?,
        })
    }

    pub fn customers(&self) -> usize {
        self.customers.get()
    }

    pub fn merchants(&self) -> usize {
        self.merchants.get()
    }

    pub fn transactions(&self) -> usize {
        self.transactions.get()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    pub customers: Vec<Customer>,
    pub merchants: Vec<Merchant>,
    pub accounts: Vec<Account>,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataCounts {
    pub customers: usize,
    pub merchants: usize,
    pub accounts: usize,
    pub transactions: usize,
}

impl Dataset {
    pub fn counts(&self) -> DataCounts {
        DataCounts {
            customers: self.customers.len(),
            merchants: self.merchants.len(),
            accounts: self.accounts.len(),
            transactions: self.transactions.len(),
        }
    }
}

pub struct DatasetGenerator<R> {
    rng: R,
    now: NaiveDateTime,
}

impl DatasetGenerator<StdRng> {
    pub fn from_seed(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_os_rng())
    }
}

impl<R: Rng> DatasetGenerator<R> {
    pub fn new(rng: R) -> Self {
        DatasetGenerator {
            rng,
            now: Utc::now().naive_utc(),
        }
    }

    /// Anchors every generated date to `now` instead of the wall clock.
    pub fn with_reference_time(mut self, now: NaiveDateTime) -> Self {
        self.now = now;
        self
    }

    pub fn generate(&mut self, size: DatasetSize) -> Dataset {
        let customers: Vec<Customer> = (0..size.customers()).map(|_| self.customer()).collect();
        let merchants: Vec<Merchant> = (0..size.merchants()).map(|_| self.merchant()).collect();

        let mut accounts = Vec::new();
        // accounts[owned[i]] are the accounts of customers[i]
        let mut owned: Vec<Range<usize>> = Vec::with_capacity(customers.len());
        for customer in &customers {
            let start = accounts.len();
            let count = self.rng.random_range(1..=3);
            for _ in 0..count {
                accounts.push(self.account(customer));
            }
            owned.push(start..accounts.len());
        }

        let mut transactions = Vec::new();
        for _ in 0..size.transactions() {
            let customer_index = self.rng.random_range(0..customers.len());
            let merchant = &merchants[self.rng.random_range(0..merchants.len())];
            let customer_accounts = owned[customer_index].clone();
            let account = if customer_accounts.is_empty() {
                tracing::warn!(
                    customer = %customers[customer_index].customer_id,
                    "customer has no accounts, falling back to the first account of the batch"
                );
                accounts.first()
            } else {
                accounts.get(self.rng.random_range(customer_accounts))
            };
            let Some(account) = account else {
                tracing::warn!("batch has no accounts, skipping transaction generation");
                break;
            };
            transactions.push(self.transaction(&customers[customer_index], merchant, account));
        }

        let dataset = Dataset {
            customers,
            merchants,
            accounts,
            transactions,
        };
        tracing::debug!(counts = ?dataset.counts(), "generated dataset");
        dataset
    }

    fn customer(&mut self) -> Customer {
        let today = self.now.date();
        let age_days = self.rng.random_range(18 * DAYS_PER_YEAR..=80 * DAYS_PER_YEAR);
        let opened_days_ago = self.rng.random_range(0..=5 * DAYS_PER_YEAR);
        Customer {
            customer_id: self.uuid(),
            first_name: FirstName().fake_with_rng(&mut self.rng),
            last_name: LastName().fake_with_rng(&mut self.rng),
            email: SafeEmail().fake_with_rng(&mut self.rng),
            phone: PhoneNumber().fake_with_rng(&mut self.rng),
            address: self.street_address(),
            city: CityName().fake_with_rng(&mut self.rng),
            state: StateAbbr().fake_with_rng(&mut self.rng),
            zip_code: ZipCode().fake_with_rng(&mut self.rng),
            date_of_birth: days_before(today, age_days),
            account_opening_date: days_before(today, opened_days_ago),
            risk_score: RiskScore::saturating(self.rng.random_range(10..=90)),
        }
    }

    fn merchant(&mut self) -> Merchant {
        let merchant_name: String = CompanyName().fake_with_rng(&mut self.rng);
        let email = self.company_email(&merchant_name);
        Merchant {
            merchant_id: self.uuid(),
            merchant_category: self.pick(MerchantCategory::ALL),
            address: self.street_address(),
            city: CityName().fake_with_rng(&mut self.rng),
            state: StateAbbr().fake_with_rng(&mut self.rng),
            zip_code: ZipCode().fake_with_rng(&mut self.rng),
            phone: PhoneNumber().fake_with_rng(&mut self.rng),
            email,
            merchant_name,
        }
    }

    fn account(&mut self, customer: &Customer) -> Account {
        Account {
            account_id: self.uuid(),
            customer_id: customer.customer_id,
            account_type: self.pick(AccountType::ALL),
            account_number: self.account_number(),
            // whole cents, so the value is already rounded to 2 dp
            balance: Decimal::new(self.rng.random_range(10_000..=5_000_000), 2),
            opening_date: customer.account_opening_date,
            status: AccountStatus::Active,
        }
    }

    fn transaction(
        &mut self,
        customer: &Customer,
        merchant: &Merchant,
        account: &Account,
    ) -> Transaction {
        let text: String = Sentence(2..7).fake_with_rng(&mut self.rng);
        let text: String = text.chars().take(MAX_DESCRIPTION_CHARS).collect();
        let seconds_ago = self.rng.random_range(0..=DAYS_PER_YEAR * 24 * 60 * 60);
        Transaction {
            transaction_id: self.uuid(),
            customer_id: customer.customer_id,
            merchant_id: merchant.merchant_id,
            account_id: account.account_id,
            amount: Decimal::new(self.rng.random_range(500..=200_000), 2),
            transaction_type: self.pick(TransactionType::ALL),
            category: self.pick(SpendingCategory::ALL),
            description: format!("{} - {}", merchant.merchant_name, text.trim_end()),
            transaction_date: self.now - Duration::seconds(seconds_ago),
            status: self.status(),
        }
    }

    /// Completed nine times out of ten, otherwise any of the three statuses.
    fn status(&mut self) -> TransactionStatus {
        if self.rng.random_bool(0.1) {
            self.pick(TransactionStatus::ALL)
        } else {
            TransactionStatus::Completed
        }
    }

    fn street_address(&mut self) -> String {
        let number: String = BuildingNumber().fake_with_rng(&mut self.rng);
        let street: String = StreetName().fake_with_rng(&mut self.rng);
        format!("{number} {street}")
    }

    fn company_email(&mut self, company: &str) -> String {
        let user: String = Username().fake_with_rng(&mut self.rng);
        let suffix: String = DomainSuffix().fake_with_rng(&mut self.rng);
        let domain: String = company
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .collect::<String>()
            .to_ascii_lowercase();
        let domain = if domain.is_empty() { "example".to_owned() } else { domain };
        format!("{user}@{domain}.{suffix}")
    }

    /// Four letters and fourteen digits, BBAN style.
    fn account_number(&mut self) -> String {
        let letters = (0..4).map(|_| char::from(self.rng.random_range(b'A'..=b'Z')));
        let letters: String = letters.collect();
        let digits: String = (0..14)
            .map(|_| char::from(self.rng.random_range(b'0'..=b'9')))
            .collect();
        format!("{letters}{digits}")
    }

    fn uuid(&mut self) -> Uuid {
        uuid::Builder::from_random_bytes(self.rng.random()).into_uuid()
    }

    fn pick<T: Copy>(&mut self, items: &[T]) -> T {
        items[self.rng.random_range(0..items.len())]
    }
}

fn days_before(date: NaiveDate, days: i64) -> NaiveDate {
    date - Duration::days(days)
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use warehouse_connector::{BindingValue, SnowflakeInsert};

    use super::*;

    fn reference_time() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 30)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap_or_default()
    }

    fn generate(seed: u64, customers: usize, merchants: usize, transactions: usize) -> Dataset {
        let size = DatasetSize::new(customers, merchants, transactions).unwrap();
        DatasetGenerator::from_seed(seed)
            .with_reference_time(reference_time())
            .generate(size)
    }

    fn assert_referential_consistency(dataset: &Dataset) {
        let customers: HashMap<Uuid, &Customer> = dataset
            .customers
            .iter()
            .map(|c| (c.customer_id, c))
            .collect();
        let merchants: HashSet<Uuid> = dataset.merchants.iter().map(|m| m.merchant_id).collect();
        let accounts: HashMap<Uuid, &Account> = dataset
            .accounts
            .iter()
            .map(|a| (a.account_id, a))
            .collect();

        for account in &dataset.accounts {
            let owner = customers
                .get(&account.customer_id)
                .expect("account owner is in the batch");
            assert!(account.opening_date >= owner.account_opening_date);
        }
        for transaction in &dataset.transactions {
            assert!(customers.contains_key(&transaction.customer_id));
            assert!(merchants.contains(&transaction.merchant_id));
            let account = accounts
                .get(&transaction.account_id)
                .expect("transaction account is in the batch");
            assert_eq!(account.customer_id, transaction.customer_id);
        }
    }

    #[test]
    fn small_scenario() {
        let dataset = generate(7, 3, 2, 10);
        assert_eq!(dataset.customers.len(), 3);
        assert_eq!(dataset.merchants.len(), 2);
        assert!((3..=9).contains(&dataset.accounts.len()));
        assert_eq!(dataset.transactions.len(), 10);
        assert_referential_consistency(&dataset);
    }

    #[test]
    fn consistent_over_many_seeds() {
        for seed in 0..20 {
            let dataset = generate(seed, 25, 5, 200);
            let accounts = dataset.accounts.len();
            assert!((25..=75).contains(&accounts), "seed {seed}: {accounts} accounts");
            assert_referential_consistency(&dataset);
        }
    }

    #[test]
    fn every_customer_gets_one_to_three_accounts() {
        let dataset = generate(11, 50, 1, 1);
        let mut per_customer: HashMap<Uuid, usize> = HashMap::new();
        for account in &dataset.accounts {
            *per_customer.entry(account.customer_id).or_default() += 1;
        }
        assert_eq!(per_customer.len(), 50);
        assert!(per_customer.values().all(|n| (1..=3).contains(n)));
    }

    #[test]
    fn same_seed_same_dataset() {
        assert_eq!(generate(42, 10, 4, 50), generate(42, 10, 4, 50));
        assert_ne!(generate(42, 10, 4, 50), generate(43, 10, 4, 50));
    }

    #[test]
    fn value_ranges() {
        let dataset = generate(3, 40, 10, 500);
        let today = reference_time().date();
        for customer in &dataset.customers {
            assert!((10..=90).contains(&customer.risk_score.get()));
            assert!(customer.account_opening_date <= today);
            assert!(customer.account_opening_date >= today - Duration::days(5 * 365));
            assert!(customer.date_of_birth <= today - Duration::days(18 * 365));
            assert_eq!(customer.state.len(), 2);
        }
        for account in &dataset.accounts {
            assert!(account.balance >= Decimal::new(100, 0));
            assert!(account.balance <= Decimal::new(50_000, 0));
            assert!(account.balance.scale() <= 2);
            assert_eq!(account.account_number.len(), 18);
            assert_eq!(account.status, AccountStatus::Active);
        }
        for transaction in &dataset.transactions {
            assert!(transaction.amount >= Decimal::new(5, 0));
            assert!(transaction.amount <= Decimal::new(2_000, 0));
            assert!(transaction.transaction_date <= reference_time());
            assert!(transaction.transaction_date >= reference_time() - Duration::days(365));
            let merchant = dataset
                .merchants
                .iter()
                .find(|m| m.merchant_id == transaction.merchant_id)
                .expect("merchant exists");
            assert!(transaction.description.starts_with(&merchant.merchant_name));
            let text = &transaction.description[merchant.merchant_name.len() + 3..];
            assert!(text.chars().count() <= MAX_DESCRIPTION_CHARS);
        }
    }

    #[test]
    fn completed_dominates() {
        let dataset = generate(5, 5, 5, 2_000);
        let completed = dataset
            .transactions
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed)
            .count();
        // expected share is 0.1 * 1/3 + 0.9 ≈ 0.933
        assert!(completed > 1_700, "{completed} completed");
        assert!(completed < 2_000);
    }

    #[test]
    fn oversized_counts_are_rejected() {
        assert!(DatasetSize::new(MAX_COUNT, MAX_COUNT, MAX_COUNT).is_ok());
        assert_eq!(
            DatasetSize::new(1, 1, usize::MAX / 2),
            Err(ValidationError::TooMany {
                entity: "transaction",
                count: usize::MAX / 2,
                max: MAX_COUNT
            })
        );
        assert_eq!(
            DatasetSize::new(MAX_COUNT + 1, 1, 1),
            Err(ValidationError::TooMany {
                entity: "customer",
                count: MAX_COUNT + 1,
                max: MAX_COUNT
            })
        );
    }

    fn assert_fits_columns<T: SnowflakeInsert>(records: &[T]) {
        for record in records {
            for (column, value) in T::columns().iter().zip(record.insert_values()) {
                let Some(width) = column
                    .sql_type
                    .strip_prefix("VARCHAR(")
                    .and_then(|rest| rest.strip_suffix(')'))
                else {
                    continue;
                };
                let width: usize = width.parse().expect("numeric VARCHAR width");
                if let BindingValue::String(value) = value {
                    assert!(
                        value.chars().count() <= width,
                        "{} value {value:?} does not fit {}",
                        column.name,
                        column.sql_type
                    );
                }
            }
        }
    }

    #[test]
    fn values_fit_their_columns() {
        for seed in 0..10 {
            let dataset = generate(seed, 300, 150, 300);
            assert_fits_columns(&dataset.customers);
            assert_fits_columns(&dataset.merchants);
            assert_fits_columns(&dataset.accounts);
            assert_fits_columns(&dataset.transactions);
        }
    }

    #[test]
    fn zero_counts_are_rejected() {
        assert_eq!(
            DatasetSize::new(0, 2, 10),
            Err(ValidationError::ZeroCount { entity: "customer" })
        );
        assert_eq!(
            DatasetSize::new(3, 0, 10),
            Err(ValidationError::ZeroCount { entity: "merchant" })
        );
        assert_eq!(
            DatasetSize::new(3, 2, 0),
            Err(ValidationError::ZeroCount { entity: "transaction" })
        );
    }
}
