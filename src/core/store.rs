//! Reading store - Durable, date-ordered reading history.
//!
//! Every query returns readings newest first (`date` descending, `id` descending
//! to break ties), which is the order the filter, statistics and codec expect.
//! Readings are never updated in place; the only ways to remove them are
//! [`delete_most_recent`] and [`replace_all`].

use crate::{
    entities::{Reading, reading},
    errors::Result,
};
use sea_orm::{ActiveValue::NotSet, QueryOrder, Select, Set, TransactionTrait, prelude::*};

fn newest_first() -> Select<Reading> {
    Reading::find()
        .order_by_desc(reading::Column::Date)
        .order_by_desc(reading::Column::Id)
}

fn to_active(reading: &reading::Model) -> reading::ActiveModel {
    reading::ActiveModel {
        id: NotSet,
        date: Set(reading.date),
        previous_reading: Set(reading.previous_reading),
        current_reading: Set(reading.current_reading),
        consumption: Set(reading.consumption),
        tariff: Set(reading.tariff),
        amount: Set(reading.amount),
        address: Set(reading.address.clone()),
    }
}

/// Retrieves the whole history, newest first.
pub async fn list_all(db: &DatabaseConnection) -> Result<Vec<reading::Model>> {
    newest_first().all(db).await.map_err(Into::into)
}

/// Retrieves the most recent reading, if any.
pub async fn latest(db: &DatabaseConnection) -> Result<Option<reading::Model>> {
    newest_first().one(db).await.map_err(Into::into)
}

/// Persists a reading and returns the id the database assigned.
///
/// Whatever `id` the reading carries is ignored.
pub async fn insert(db: &DatabaseConnection, reading: &reading::Model) -> Result<i64> {
    let saved = to_active(reading).insert(db).await?;
    tracing::info!(
        "Stored reading {} ({} -> {}, amount {:.2})",
        saved.id,
        saved.previous_reading,
        saved.current_reading,
        saved.amount
    );
    Ok(saved.id)
}

/// Deletes the most recent reading.
///
/// # Returns
/// * `Ok(Some(reading))` - The reading that was removed
/// * `Ok(None)` - The history was already empty
pub async fn delete_most_recent(db: &DatabaseConnection) -> Result<Option<reading::Model>> {
    let txn = db.begin().await?;

    let Some(newest) = newest_first().one(&txn).await? else {
        return Ok(None);
    };
    Reading::delete_by_id(newest.id).exec(&txn).await?;

    txn.commit().await?;
    tracing::info!("Deleted most recent reading {}", newest.id);
    Ok(Some(newest))
}

/// Replaces the whole history with `readings`.
///
/// Runs in a single transaction, so a concurrent reader sees either the old or
/// the new history. Incoming ids are discarded and reassigned.
pub async fn replace_all(db: &DatabaseConnection, readings: &[reading::Model]) -> Result<()> {
    let txn = db.begin().await?;
    replace_rows(&txn, readings).await?;
    txn.commit().await?;
    Ok(())
}

/// Deletes every reading and inserts `readings` on the given connection.
///
/// Callers that need the replacement to commit together with other writes pass
/// an open transaction.
pub async fn replace_rows<C>(db: &C, readings: &[reading::Model]) -> Result<()>
where
    C: ConnectionTrait,
{
    let removed = Reading::delete_many().exec(db).await?.rows_affected;
    if !readings.is_empty() {
        Reading::insert_many(readings.iter().map(to_active))
            .exec(db)
            .await?;
    }

    tracing::info!(
        "Replaced history: removed {} readings, stored {}",
        removed,
        readings.len()
    );
    Ok(())
}

/// Number of stored readings.
pub async fn count(db: &DatabaseConnection) -> Result<u64> {
    Reading::find().count(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_empty_store() -> Result<()> {
        let db = setup_test_db().await?;

        assert!(list_all(&db).await?.is_empty());
        assert!(latest(&db).await?.is_none());
        assert_eq!(count(&db).await?, 0);
        assert!(delete_most_recent(&db).await?.is_none());

        Ok(())
    }

    #[tokio::test]
    async fn test_insert_assigns_id() -> Result<()> {
        let db = setup_test_db().await?;

        let first = insert(&db, &reading_on(2026, 1, 15, 100.0, 6.84)).await?;
        let second = insert(&db, &reading_on(2026, 2, 15, 120.0, 6.84)).await?;

        assert!(first > 0);
        assert_ne!(first, second);
        assert_eq!(count(&db).await?, 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_list_all_is_newest_first() -> Result<()> {
        let db = setup_test_db().await?;

        // Inserted out of order on purpose
        insert(&db, &reading_on(2026, 2, 15, 120.0, 6.84)).await?;
        insert(&db, &reading_on(2026, 3, 15, 130.0, 6.84)).await?;
        insert(&db, &reading_on(2026, 1, 15, 110.0, 6.84)).await?;

        let consumptions: Vec<f64> = list_all(&db)
            .await?
            .iter()
            .map(|r| r.consumption)
            .collect();
        assert_eq!(consumptions, vec![130.0, 120.0, 110.0]);

        let newest = latest(&db).await?.unwrap();
        assert_eq!(newest.consumption, 130.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_delete_most_recent() -> Result<()> {
        let db = setup_test_db().await?;

        insert(&db, &reading_on(2026, 3, 15, 130.0, 6.84)).await?;
        insert(&db, &reading_on(2026, 1, 15, 110.0, 6.84)).await?;

        let removed = delete_most_recent(&db).await?.unwrap();
        assert_eq!(removed.consumption, 130.0);

        let remaining = list_all(&db).await?;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].consumption, 110.0);

        Ok(())
    }

    #[tokio::test]
    async fn test_replace_all() -> Result<()> {
        let db = setup_test_db().await?;

        insert(&db, &reading_on(2024, 1, 15, 999.0, 5.0)).await?;

        let incoming = vec![
            reading_on(2026, 2, 15, 120.0, 6.84),
            reading_on(2026, 1, 15, 110.0, 6.84),
        ];
        replace_all(&db, &incoming).await?;

        let stored = list_all(&db).await?;
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].consumption, 120.0);
        assert_eq!(stored[1].consumption, 110.0);
        assert!(stored.iter().all(|r| r.tariff == 6.84));

        Ok(())
    }

    #[tokio::test]
    async fn test_replace_rows_rolls_back_with_transaction() -> Result<()> {
        let db = setup_test_db().await?;
        insert(&db, &reading_on(2026, 1, 15, 110.0, 6.84)).await?;

        let txn = db.begin().await?;
        replace_rows(&txn, &[reading_on(2026, 2, 15, 120.0, 6.84)]).await?;
        txn.rollback().await?;

        let stored = list_all(&db).await?;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].consumption, 110.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_replace_all_with_nothing_clears() -> Result<()> {
        let db = setup_test_db().await?;

        insert(&db, &reading_on(2026, 1, 15, 110.0, 6.84)).await?;
        replace_all(&db, &[]).await?;

        assert_eq!(count(&db).await?, 0);
        Ok(())
    }
}
