//! The four record types of a generated batch and their warehouse columns.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;
use warehouse_connector::{BindingKind, BindingValue, Column, SnowflakeInsert};

use crate::error::ValidationError;

macro_rules! labelled_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $label)] $variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

labelled_enum!(MerchantCategory {
    Restaurant => "Restaurant",
    Grocery => "Grocery",
    GasStation => "Gas Station",
    Retail => "Retail",
    Online => "Online",
    Pharmacy => "Pharmacy",
    Entertainment => "Entertainment",
});

labelled_enum!(AccountType {
    Checking => "checking",
    Savings => "savings",
    Credit => "credit",
});

labelled_enum!(AccountStatus {
    Active => "active",
});

labelled_enum!(TransactionType {
    Purchase => "purchase",
    Withdrawal => "withdrawal",
    Deposit => "deposit",
    Transfer => "transfer",
    Payment => "payment",
});

labelled_enum!(
    /// Spending category of a transaction, independent of the merchant's category
    SpendingCategory {
        FoodAndDining => "Food & Dining",
        Shopping => "Shopping",
        Transportation => "Transportation",
        Bills => "Bills",
        Entertainment => "Entertainment",
        Healthcare => "Healthcare",
        Travel => "Travel",
    }
);

labelled_enum!(TransactionStatus {
    Completed => "completed",
    Pending => "pending",
    Failed => "failed",
});

/// Customer risk score, always within 0..=100
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RiskScore(u8);

impl RiskScore {
    pub const MAX: u8 = 100;

    pub fn new(score: u8) -> Result<Self, ValidationError> {
        if score > Self::MAX {
            return Err(ValidationError::RiskScore(score));
        }
        Ok(RiskScore(score))
    }

    /// Clamps scores above the maximum instead of rejecting them.
    pub fn saturating(score: u8) -> Self {
        RiskScore(score.min(Self::MAX))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Customer {
    pub customer_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub date_of_birth: NaiveDate,
    pub account_opening_date: NaiveDate,
    pub risk_score: RiskScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Merchant {
    pub merchant_id: Uuid,
    pub merchant_name: String,
    pub merchant_category: MerchantCategory,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Account {
    pub account_id: Uuid,
    pub customer_id: Uuid,
    pub account_type: AccountType,
    pub account_number: String,
    pub balance: Decimal,
    pub opening_date: NaiveDate,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub transaction_id: Uuid,
    pub customer_id: Uuid,
    pub merchant_id: Uuid,
    pub account_id: Uuid,
    pub amount: Decimal,
    pub transaction_type: TransactionType,
    pub category: SpendingCategory,
    pub description: String,
    pub transaction_date: NaiveDateTime,
    pub status: TransactionStatus,
}

const TEXT: BindingKind = BindingKind::Text;

fn text(value: impl ToString) -> BindingValue {
    BindingValue::String(value.to_string())
}

fn timestamp(value: NaiveDateTime) -> BindingValue {
    BindingValue::String(value.format("%Y-%m-%d %H:%M:%S%.f").to_string())
}

impl SnowflakeInsert for Customer {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("customer_id", "VARCHAR(50)", TEXT),
            Column::new("first_name", "VARCHAR(100)", TEXT),
            Column::new("last_name", "VARCHAR(100)", TEXT),
            Column::new("email", "VARCHAR(200)", TEXT),
            Column::new("phone", "VARCHAR(50)", TEXT),
            Column::new("address", "VARCHAR(500)", TEXT),
            Column::new("city", "VARCHAR(100)", TEXT),
            Column::new("state", "VARCHAR(10)", TEXT),
            Column::new("zip_code", "VARCHAR(20)", TEXT),
            Column::new("date_of_birth", "DATE", TEXT),
            Column::new("account_opening_date", "DATE", TEXT),
            Column::new("risk_score", "INTEGER", BindingKind::Fixed),
        ];
        COLUMNS
    }

    fn insert_values(&self) -> Vec<BindingValue> {
        vec![
            text(self.customer_id),
            text(&self.first_name),
            text(&self.last_name),
            text(&self.email),
            text(&self.phone),
            text(&self.address),
            text(&self.city),
            text(&self.state),
            text(&self.zip_code),
            text(self.date_of_birth),
            text(self.account_opening_date),
            self.risk_score.get().into(),
        ]
    }
}

impl SnowflakeInsert for Merchant {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("merchant_id", "VARCHAR(50)", TEXT),
            Column::new("merchant_name", "VARCHAR(200)", TEXT),
            Column::new("merchant_category", "VARCHAR(100)", TEXT),
            Column::new("address", "VARCHAR(500)", TEXT),
            Column::new("city", "VARCHAR(100)", TEXT),
            Column::new("state", "VARCHAR(10)", TEXT),
            Column::new("zip_code", "VARCHAR(20)", TEXT),
            Column::new("phone", "VARCHAR(50)", TEXT),
            Column::new("email", "VARCHAR(200)", TEXT),
        ];
        COLUMNS
    }

    fn insert_values(&self) -> Vec<BindingValue> {
        vec![
            text(self.merchant_id),
            text(&self.merchant_name),
            text(self.merchant_category),
            text(&self.address),
            text(&self.city),
            text(&self.state),
            text(&self.zip_code),
            text(&self.phone),
            text(&self.email),
        ]
    }
}

impl SnowflakeInsert for Account {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("account_id", "VARCHAR(50)", TEXT),
            Column::new("customer_id", "VARCHAR(50)", TEXT),
            Column::new("account_type", "VARCHAR(50)", TEXT),
            Column::new("account_number", "VARCHAR(50)", TEXT),
            Column::new("balance", "DECIMAL(15,2)", TEXT),
            Column::new("opening_date", "DATE", TEXT),
            Column::new("status", "VARCHAR(20)", TEXT),
        ];
        COLUMNS
    }

    fn insert_values(&self) -> Vec<BindingValue> {
        vec![
            text(self.account_id),
            text(self.customer_id),
            text(self.account_type),
            text(&self.account_number),
            text(self.balance),
            text(self.opening_date),
            text(self.status),
        ]
    }
}

impl SnowflakeInsert for Transaction {
    fn columns() -> &'static [Column] {
        const COLUMNS: &[Column] = &[
            Column::new("transaction_id", "VARCHAR(50)", TEXT),
            Column::new("customer_id", "VARCHAR(50)", TEXT),
            Column::new("merchant_id", "VARCHAR(50)", TEXT),
            Column::new("account_id", "VARCHAR(50)", TEXT),
            Column::new("amount", "DECIMAL(15,2)", TEXT),
            Column::new("transaction_type", "VARCHAR(50)", TEXT),
            Column::new("category", "VARCHAR(100)", TEXT),
            Column::new("description", "TEXT", TEXT),
            Column::new("transaction_date", "TIMESTAMP", TEXT),
            Column::new("status", "VARCHAR(20)", TEXT),
        ];
        COLUMNS
    }

    fn insert_values(&self) -> Vec<BindingValue> {
        vec![
            text(self.transaction_id),
            text(self.customer_id),
            text(self.merchant_id),
            text(self.account_id),
            text(self.amount),
            text(self.transaction_type),
            text(self.category),
            text(&self.description),
            timestamp(self.transaction_date),
            text(self.status),
        ]
    }
}
