//! Fixed SQL served by the API: warehouse schema setup, dashboard queries and
//! the example query catalog.

use serde::Serialize;
use warehouse_connector::SnowflakeInsert;

use crate::generator::{Account, Customer, Merchant, Transaction};

pub const CUSTOMERS: &str = "customers";
pub const MERCHANTS: &str = "merchants";
pub const ACCOUNTS: &str = "accounts";
pub const TRANSACTIONS: &str = "transactions";

pub const TABLE_COUNT: usize = 4;
pub const VIEW_COUNT: usize = 2;

const DAILY_TRANSACTION_SUMMARY: &str = "CREATE OR REPLACE VIEW daily_transaction_summary AS
SELECT
    DATE(transaction_date) AS transaction_date,
    COUNT(*) AS transaction_count,
    SUM(amount) AS total_amount,
    AVG(amount) AS avg_amount,
    COUNT(DISTINCT customer_id) AS unique_customers
FROM transactions
WHERE status = 'completed'
GROUP BY DATE(transaction_date)";

const CUSTOMER_SPENDING_SUMMARY: &str = "CREATE OR REPLACE VIEW customer_spending_summary AS
SELECT
    c.customer_id,
    c.first_name || ' ' || c.last_name AS customer_name,
    COUNT(t.transaction_id) AS transaction_count,
    SUM(t.amount) AS total_spent,
    AVG(t.amount) AS avg_transaction,
    c.risk_score
FROM customers c
LEFT JOIN transactions t ON c.customer_id = t.customer_id
WHERE t.status = 'completed' OR t.status IS NULL
GROUP BY c.customer_id, c.first_name, c.last_name, c.risk_score";

/// `CREATE OR REPLACE TABLE` with the first column as primary key.
fn table_ddl<T: SnowflakeInsert>(table: &str) -> String {
    let columns = T::columns()
        .iter()
        .enumerate()
        .map(|(i, column)| match i {
            0 => format!("{} {} PRIMARY KEY", column.name, column.sql_type),
            _ => format!("{} {}", column.name, column.sql_type),
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!("CREATE OR REPLACE TABLE {table} ({columns})")
}

/// Statements creating the database, schema, four tables and two views.
///
/// `database` and `schema` are interpolated as is and must be plain identifiers.
pub fn setup_statements(database: &str, schema: &str) -> Vec<String> {
    vec![
        format!("CREATE DATABASE IF NOT EXISTS {database}"),
        format!("CREATE SCHEMA IF NOT EXISTS {database}.{schema}"),
        table_ddl::<Customer>(CUSTOMERS),
        table_ddl::<Merchant>(MERCHANTS),
        table_ddl::<Account>(ACCOUNTS),
        table_ddl::<Transaction>(TRANSACTIONS),
        DAILY_TRANSACTION_SUMMARY.to_owned(),
        CUSTOMER_SPENDING_SUMMARY.to_owned(),
    ]
}

pub mod dashboard {
    pub const TOTAL_TRANSACTIONS: &str = "SELECT COUNT(*) AS count FROM transactions";

    pub const TOTAL_AMOUNT: &str =
        "SELECT SUM(amount) AS total FROM transactions WHERE status = 'completed'";

    pub const AVERAGE_AMOUNT: &str =
        "SELECT AVG(amount) AS avg FROM transactions WHERE status = 'completed'";

    pub const DAILY_TRENDS: &str = "SELECT DATE(transaction_date) AS date, COUNT(*) AS transactions, SUM(amount) AS volume \
FROM transactions WHERE status = 'completed' \
GROUP BY DATE(transaction_date) ORDER BY date DESC LIMIT 30";

    pub const CATEGORY_BREAKDOWN: &str = "SELECT category, COUNT(*) AS transaction_count, SUM(amount) AS total_amount \
FROM transactions WHERE status = 'completed' \
GROUP BY category ORDER BY total_amount DESC";

    pub const TOP_CUSTOMERS: &str = "SELECT customer_name, transaction_count, total_spent \
FROM customer_spending_summary ORDER BY total_spent DESC LIMIT 10";
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExampleQuery {
    pub title: &'static str,
    pub description: &'static str,
    pub query: &'static str,
}

pub const EXAMPLE_QUERIES: &[ExampleQuery] = &[
    ExampleQuery {
        title: "Basic Transaction Query",
        description: "Get all transactions for a specific customer",
        query: "SELECT * FROM transactions WHERE customer_id = 'CUSTOMER_ID_HERE' ORDER BY transaction_date DESC;",
    },
    ExampleQuery {
        title: "Daily Transaction Summary",
        description: "Get transaction count and total amount by day",
        query: "SELECT DATE(transaction_date) as date, COUNT(*) as transactions, SUM(amount) as total_amount FROM transactions GROUP BY DATE(transaction_date) ORDER BY date DESC;",
    },
    ExampleQuery {
        title: "Top Spending Customers",
        description: "Find customers with highest total spending",
        query: "SELECT customer_name, total_spent, transaction_count FROM customer_spending_summary ORDER BY total_spent DESC LIMIT 10;",
    },
    ExampleQuery {
        title: "Fraud Detection Query",
        description: "Find suspicious transactions (high amount, high-risk customers)",
        query: "SELECT t.*, c.risk_score FROM transactions t JOIN customers c ON t.customer_id = c.customer_id WHERE t.amount > 1000 AND c.risk_score > 70 ORDER BY t.amount DESC;",
    },
    ExampleQuery {
        title: "Category Analysis",
        description: "Analyze spending by transaction category",
        query: "SELECT category, COUNT(*) as transaction_count, SUM(amount) as total_amount, AVG(amount) as avg_amount FROM transactions WHERE status = 'completed' GROUP BY category ORDER BY total_amount DESC;",
    },
    ExampleQuery {
        title: "Monthly Trends",
        description: "Get monthly transaction trends",
        query: "SELECT YEAR(transaction_date) as year, MONTH(transaction_date) as month, COUNT(*) as transactions, SUM(amount) as volume FROM transactions GROUP BY YEAR(transaction_date), MONTH(transaction_date) ORDER BY year DESC, month DESC;",
    },
];
