use anyhow::Result;
use sqlx::{PgPool, Row};

use crate::domain::transaction::TransactionRow;

#[derive(Clone)]
pub struct TransactionsRepo {
    pub pool: PgPool,
}

pub struct UpsertTransactionInput<'a> {
    pub transaction_ref: &'a str,
    pub org_id: Option<i64>,
    pub amount_minor: Option<i64>,
    pub currency: Option<&'a str>,
    pub customer_email: Option<&'a str>,
    pub customer_phone: Option<&'a str>,
}

fn row_to_transaction(r: sqlx::postgres::PgRow) -> TransactionRow {
    TransactionRow {
        id: r.get("id"),
        transaction_ref: r.get("transaction_ref"),
        org_id: r.get("org_id"),
        amount_minor: r.get("amount_minor"),
        currency: r.get("currency"),
        customer_email: r.get("customer_email"),
        customer_phone: r.get("customer_phone"),
        psp_order_id: r.get("psp_order_id"),
        psp_payment_id: r.get("psp_payment_id"),
        payment_link_url: r.get("payment_link_url"),
        created_at: r.get("created_at"),
    }
}

const COLUMNS: &str = "id, transaction_ref, org_id, amount_minor, currency, customer_email, customer_phone, psp_order_id, psp_payment_id, payment_link_url, created_at";

impl TransactionsRepo {
    pub async fn find_by_ref(&self, transaction_ref: &str) -> Result<Option<TransactionRow>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE transaction_ref=$1"
        ))
        .bind(transaction_ref)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_transaction))
    }

    pub async fn find_by_psp_order_id(&self, psp_order_id: &str) -> Result<Option<TransactionRow>> {
        let row = sqlx::query(&format!(
            "SELECT {COLUMNS} FROM transactions WHERE psp_order_id=$1"
        ))
        .bind(psp_order_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(row_to_transaction))
    }

    /// Upsert by external reference. Amount, currency and contact fields are
    /// only backfilled when previously absent; a transaction is never deleted
    /// and its amount is never overwritten once set.
    pub async fn upsert_by_ref(&self, input: UpsertTransactionInput<'_>) -> Result<TransactionRow> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO transactions (transaction_ref, org_id, amount_minor, currency, customer_email, customer_phone)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (transaction_ref) DO UPDATE SET
                org_id = COALESCE(transactions.org_id, EXCLUDED.org_id),
                amount_minor = COALESCE(transactions.amount_minor, EXCLUDED.amount_minor),
                currency = COALESCE(transactions.currency, EXCLUDED.currency),
                customer_email = COALESCE(transactions.customer_email, EXCLUDED.customer_email),
                customer_phone = COALESCE(transactions.customer_phone, EXCLUDED.customer_phone),
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(input.transaction_ref)
        .bind(input.org_id)
        .bind(input.amount_minor)
        .bind(input.currency)
        .bind(input.customer_email)
        .bind(input.customer_phone)
        .fetch_one(&self.pool)
        .await?;
        Ok(row_to_transaction(row))
    }

    pub async fn set_psp_order_id(&self, id: i64, psp_order_id: &str) -> Result<()> {
        sqlx::query(
            "UPDATE transactions SET psp_order_id=$2, updated_at=now() WHERE id=$1 AND psp_order_id IS NULL",
        )
        .bind(id)
        .bind(psp_order_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_psp_payment_id(&self, id: i64, psp_payment_id: &str) -> Result<()> {
        sqlx::query("UPDATE transactions SET psp_payment_id=$2, updated_at=now() WHERE id=$1")
            .bind(id)
            .bind(psp_payment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn set_payment_link_url(&self, id: i64, url: &str) -> Result<()> {
        sqlx::query("UPDATE transactions SET payment_link_url=$2, updated_at=now() WHERE id=$1")
            .bind(id)
            .bind(url)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Transactions in the reconciliation lookback window that carry a
    /// processor correlation id.
    pub async fn list_reconcilable_since(
        &self,
        window_start: chrono::DateTime<chrono::Utc>,
    ) -> Result<Vec<TransactionRow>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {COLUMNS} FROM transactions
            WHERE created_at >= $1
              AND (psp_order_id IS NOT NULL OR psp_payment_id IS NOT NULL)
            ORDER BY id ASC
            "#
        ))
        .bind(window_start)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(row_to_transaction).collect())
    }
}
