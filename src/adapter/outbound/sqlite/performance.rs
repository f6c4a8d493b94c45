//! Performance record persistence.

use diesel::prelude::*;
use diesel::SqliteConnection;
use rust_decimal::Decimal;

use super::codec::{decode_money, decode_time, encode_money, encode_time};
use super::database::model::PerformanceRecordRow;
use super::database::schema::performance_records;
use crate::domain::id::{PlacementId, RecordId};
use crate::domain::performance::{DeliveryCounters, PerformanceRecord};
use crate::error::{Error, Result};

fn counters_of(row: &PerformanceRecordRow) -> DeliveryCounters {
    DeliveryCounters {
        impressions: row.impressions,
        clicks: row.clicks,
        conversions: row.conversions,
        reposts: row.reposts,
        reactions: row.reactions,
        replies: row.replies,
        views: row.views,
        forwards: row.forwards,
    }
}

fn from_row(row: PerformanceRecordRow) -> Result<PerformanceRecord> {
    Ok(PerformanceRecord {
        counters: counters_of(&row),
        cost: decode_money(&row.cost)?,
        recorded_at: decode_time(&row.recorded_at)?,
        id: RecordId::from(row.id),
        placement_id: PlacementId::from(row.placement_id),
        is_deducted: row.is_deducted,
    })
}

/// Insert a record.
///
/// # Errors
/// Returns an error if the row cannot be written.
pub fn insert_record(conn: &mut SqliteConnection, record: &PerformanceRecord) -> Result<()> {
    let c = record.counters;
    diesel::insert_into(performance_records::table)
        .values(&PerformanceRecordRow {
            id: record.id.to_string(),
            placement_id: record.placement_id.to_string(),
            impressions: c.impressions,
            clicks: c.clicks,
            conversions: c.conversions,
            reposts: c.reposts,
            reactions: c.reactions,
            replies: c.replies,
            views: c.views,
            forwards: c.forwards,
            cost: encode_money(record.cost),
            is_deducted: record.is_deducted,
            recorded_at: encode_time(record.recorded_at),
        })
        .execute(conn)?;
    Ok(())
}

/// Sum of every stored delta for a placement: the cumulative counters
/// already accounted for.
///
/// # Errors
/// Returns an error on query failure.
pub fn history_total(conn: &mut SqliteConnection, placement: &PlacementId) -> Result<DeliveryCounters> {
    let rows: Vec<PerformanceRecordRow> = performance_records::table
        .filter(performance_records::placement_id.eq(placement.as_str()))
        .select(PerformanceRecordRow::as_select())
        .load(conn)?;
    Ok(rows.iter().map(counters_of).sum())
}

/// Flag a record as settled.
///
/// # Errors
/// Returns [`Error::NotFound`] if the record does not exist.
pub fn mark_deducted(conn: &mut SqliteConnection, id: &RecordId) -> Result<()> {
    let updated = diesel::update(performance_records::table.find(id.as_str()))
        .set(performance_records::is_deducted.eq(true))
        .execute(conn)?;
    if updated == 0 {
        return Err(Error::not_found("performance record", id));
    }
    Ok(())
}

/// Records for a placement, oldest first.
///
/// # Errors
/// Returns an error on query failure.
pub fn records_for(conn: &mut SqliteConnection, placement: &PlacementId) -> Result<Vec<PerformanceRecord>> {
    let rows: Vec<PerformanceRecordRow> = performance_records::table
        .filter(performance_records::placement_id.eq(placement.as_str()))
        .order(performance_records::recorded_at.asc())
        .select(PerformanceRecordRow::as_select())
        .load(conn)?;
    rows.into_iter().map(from_row).collect()
}

/// Records with a positive cost that never reached settlement.
///
/// # Errors
/// Returns an error on query failure.
pub fn unsettled(conn: &mut SqliteConnection) -> Result<Vec<PerformanceRecord>> {
    let rows: Vec<PerformanceRecordRow> = performance_records::table
        .filter(performance_records::is_deducted.eq(false))
        .order(performance_records::recorded_at.asc())
        .select(PerformanceRecordRow::as_select())
        .load(conn)?;
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let record = from_row(row)?;
        if record.cost > Decimal::ZERO {
            records.push(record);
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::outbound::sqlite::placement::insert_placement;
    use crate::adapter::outbound::sqlite::Database;
    use crate::testkit::db::{seed_ad, seed_campaign, seed_channel};
    use crate::testkit::domain::placement;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn record(id: &str, impressions: i64, cost: Decimal, deducted: bool) -> PerformanceRecord {
        PerformanceRecord {
            id: RecordId::from(id),
            placement_id: PlacementId::from("p1"),
            counters: DeliveryCounters {
                impressions,
                clicks: 3,
                ..DeliveryCounters::default()
            },
            cost,
            is_deducted: deducted,
            recorded_at: Utc::now(),
        }
    }

    fn seeded() -> Database {
        let db = Database::open_in_memory().unwrap();
        let mut conn = db.connection().unwrap();
        seed_campaign(&mut conn, "c1");
        seed_ad(&mut conn, "ad", "c1");
        seed_channel(&mut conn, "ch1", "owner1");
        insert_placement(&mut conn, &placement("p1", "ad", "ch1", "c1")).unwrap();
        drop(conn);
        db
    }

    #[test]
    fn history_sums_deltas() {
        let db = seeded();
        let mut conn = db.connection().unwrap();
        insert_record(&mut conn, &record("r1", 1_000, dec!(2), true)).unwrap();
        insert_record(&mut conn, &record("r2", 500, dec!(1), true)).unwrap();

        let total = history_total(&mut conn, &PlacementId::from("p1")).unwrap();
        assert_eq!(total.impressions, 1_500);
        assert_eq!(total.clicks, 6);
    }

    #[test]
    fn unsettled_lists_positive_cost_only() {
        let db = seeded();
        let mut conn = db.connection().unwrap();
        insert_record(&mut conn, &record("r1", 1_000, dec!(2), false)).unwrap();
        insert_record(&mut conn, &record("r2", 0, dec!(0), false)).unwrap();
        insert_record(&mut conn, &record("r3", 10, dec!(1), true)).unwrap();

        let pending = unsettled(&mut conn).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, RecordId::from("r1"));

        mark_deducted(&mut conn, &RecordId::from("r1")).unwrap();
        assert!(unsettled(&mut conn).unwrap().is_empty());
        assert_eq!(records_for(&mut conn, &PlacementId::from("p1")).unwrap().len(), 3);
    }
}
