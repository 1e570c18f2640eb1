use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::packet::{self, PALLET_CAPACITY};
use crate::models::pallet;
use crate::models::pallet_shipment;
use crate::models::sizes;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Completion view computed from packet positions. `closed_at` on the pallet
/// row is advisory; this projection is the source of truth on reads.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PalletAggregate {
    pub complete: bool,
    pub packets_count: u64,
    pub iso_start: Option<i64>,
    pub iso_end: Option<i64>,
    pub last_packet_at: Option<DateTime<Utc>>,
}

impl PalletAggregate {
    /// Folds (position, serial, created_at) triples into the aggregate.
    /// Only distinct positions inside 1..=24 count towards completeness.
    pub fn from_packets<I>(packets: I) -> Self
    where
        I: IntoIterator<Item = (Option<i16>, i64, DateTime<Utc>)>,
    {
        let mut positions = BTreeSet::new();
        let mut count = 0u64;
        let mut iso_start: Option<i64> = None;
        let mut iso_end: Option<i64> = None;
        let mut last_packet_at: Option<DateTime<Utc>> = None;

        for (position, iso, created_at) in packets {
            count += 1;
            if let Some(p) = position {
                if (1..=PALLET_CAPACITY).contains(&p) {
                    positions.insert(p);
                }
            }
            iso_start = Some(iso_start.map_or(iso, |s: i64| s.min(iso)));
            iso_end = Some(iso_end.map_or(iso, |e: i64| e.max(iso)));
            last_packet_at = Some(last_packet_at.map_or(created_at, |t| t.max(created_at)));
        }

        PalletAggregate {
            complete: positions.len() == PALLET_CAPACITY as usize,
            packets_count: count,
            iso_start,
            iso_end,
            last_packet_at,
        }
    }
}

/// True when the distinct in-range positions cover every slot.
pub fn positions_complete(taken: impl Iterator<Item = i16>) -> bool {
    let distinct: BTreeSet<i16> = taken.filter(|p| (1..=PALLET_CAPACITY).contains(p)).collect();
    distinct.len() == PALLET_CAPACITY as usize
}

/// Pallet row joined with its computed aggregate.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PalletView {
    #[serde(flatten)]
    pub pallet: pallet::Model,
    #[serde(flatten)]
    pub aggregate: PalletAggregate,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PalletPage {
    pub pallets: Vec<PalletView>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePallet {
    pub size: Option<i32>,
    pub thermoformer_number: Option<i16>,
}

impl UpdatePallet {
    pub fn is_empty(&self) -> bool {
        self.size.is_none() && self.thermoformer_number.is_none()
    }
}

#[derive(Clone)]
pub struct PalletService {
    db_pool: Arc<DbPool>,
}

impl PalletService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Pallets newest-first with their completion aggregates.
    #[instrument(skip(self))]
    pub async fn list_pallets(&self, page: u64, limit: u64) -> Result<PalletPage, ServiceError> {
        let paginator = pallet::Entity::find()
            .order_by_desc(pallet::Column::OpenedAt)
            .paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let mut pallets = Vec::with_capacity(rows.len());
        for row in rows {
            let aggregate = self.aggregate_for(row.id).await?;
            pallets.push(PalletView {
                pallet: row,
                aggregate,
            });
        }
        Ok(PalletPage {
            pallets,
            total,
            page,
            limit,
        })
    }

    pub async fn aggregate_for(&self, pallet_id: Uuid) -> Result<PalletAggregate, ServiceError> {
        let packets = packet::Entity::find()
            .filter(packet::Column::PalletId.eq(pallet_id))
            .all(&*self.db_pool)
            .await?;
        Ok(PalletAggregate::from_packets(
            packets
                .into_iter()
                .map(|p| (p.packet_index, p.iso_number, p.created_at)),
        ))
    }

    /// Opens an empty pallet with the next global number.
    #[instrument(skip(self))]
    pub async fn create_pallet(
        &self,
        size: i32,
        thermoformer_number: i16,
    ) -> Result<pallet::Model, ServiceError> {
        if !sizes::is_supported(size) {
            return Err(ServiceError::InvalidInput(format!(
                "unsupported size {}",
                size
            )));
        }
        if !sizes::is_valid_thermoformer(thermoformer_number) {
            return Err(ServiceError::InvalidInput(format!(
                "unknown thermoformer {}",
                thermoformer_number
            )));
        }
        let txn = self.db_pool.begin().await?;
        let pallet_number = crate::services::counters::next_pallet_number(&txn).await?;
        let created = pallet::ActiveModel {
            id: Set(Uuid::new_v4()),
            pallet_number: Set(pallet_number),
            size: Set(size),
            thermoformer_number: Set(thermoformer_number),
            opened_at: Set(Utc::now()),
            closed_at: Set(None),
        }
        .insert(&txn)
        .await?;
        txn.commit().await?;
        Ok(created)
    }

    /// Patches the pallet and keeps its packets consistent with it.
    #[instrument(skip(self))]
    pub async fn update_pallet(
        &self,
        id: Uuid,
        changes: UpdatePallet,
    ) -> Result<pallet::Model, ServiceError> {
        if let Some(size) = changes.size {
            if !sizes::is_supported(size) {
                return Err(ServiceError::InvalidInput(format!(
                    "unsupported size {}",
                    size
                )));
            }
        }
        if let Some(thermo) = changes.thermoformer_number {
            if !sizes::is_valid_thermoformer(thermo) {
                return Err(ServiceError::InvalidInput(format!(
                    "unknown thermoformer {}",
                    thermo
                )));
            }
        }

        let txn = self.db_pool.begin().await?;
        let existing = pallet::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("pallet {} not found", id)))?;

        // Nothing to change: an empty update is a valid no-op, not an error.
        if changes.is_empty() {
            txn.commit().await?;
            return Ok(existing);
        }

        let mut active: pallet::ActiveModel = existing.into();
        if let Some(size) = changes.size {
            active.size = Set(size);
        }
        if let Some(thermo) = changes.thermoformer_number {
            active.thermoformer_number = Set(thermo);
        }
        let updated = active.update(&txn).await?;

        let mut packet_patch = <packet::ActiveModel as Default>::default();
        if let Some(size) = changes.size {
            packet_patch.size = Set(size);
        }
        if let Some(thermo) = changes.thermoformer_number {
            packet_patch.thermoformer_number = Set(thermo);
        }
        packet::Entity::update_many()
            .set(packet_patch)
            .filter(packet::Column::PalletId.eq(id))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Ok(updated)
    }

    /// Detaches packets, then removes the pallet and any shipment row.
    #[instrument(skip(self))]
    pub async fn delete_pallet(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        pallet::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("pallet {} not found", id)))?;

        let mut detach = <packet::ActiveModel as Default>::default();
        detach.pallet_id = Set(None);
        detach.packet_index = Set(None);
        packet::Entity::update_many()
            .set(detach)
            .filter(packet::Column::PalletId.eq(id))
            .exec(&txn)
            .await?;

        pallet_shipment::Entity::delete_many()
            .filter(pallet_shipment::Column::PalletId.eq(id))
            .exec(&txn)
            .await?;
        pallet::Entity::delete_by_id(id).exec(&txn).await?;
        txn.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(n: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + n, 0).unwrap()
    }

    #[test]
    fn full_pallet_is_complete() {
        let agg =
            PalletAggregate::from_packets((1..=24).map(|p| (Some(p as i16), 100 + p, at(p))));
        assert!(agg.complete);
        assert_eq!(agg.packets_count, 24);
        assert_eq!(agg.iso_start, Some(101));
        assert_eq!(agg.iso_end, Some(124));
        assert_eq!(agg.last_packet_at, Some(at(24)));
    }

    #[test]
    fn duplicate_plus_missing_position_is_incomplete() {
        // 24 rows, but slot 7 appears twice and slot 8 never.
        let positions: Vec<i16> = (1..=24)
            .map(|p| if p == 8 { 7 } else { p })
            .collect();
        let agg = PalletAggregate::from_packets(
            positions
                .into_iter()
                .enumerate()
                .map(|(i, p)| (Some(p), i as i64, at(i as i64))),
        );
        assert_eq!(agg.packets_count, 24);
        assert!(!agg.complete);
    }

    #[test]
    fn out_of_range_positions_never_count() {
        let agg = PalletAggregate::from_packets(
            (1..=23)
                .map(|p| (Some(p as i16), p, at(p)))
                .chain([(Some(0i16), 99, at(99)), (Some(25i16), 98, at(98))]),
        );
        assert!(!agg.complete);
    }

    #[test]
    fn empty_pallet_has_no_serial_range() {
        let agg = PalletAggregate::from_packets(std::iter::empty());
        assert!(!agg.complete);
        assert_eq!(agg.packets_count, 0);
        assert_eq!(agg.iso_start, None);
        assert_eq!(agg.iso_end, None);
    }

    #[test]
    fn fresh_packet_patch_has_no_set_columns() {
        let patch = <packet::ActiveModel as Default>::default();
        assert!(matches!(patch.size, sea_orm::ActiveValue::NotSet));
        assert!(matches!(patch.pallet_id, sea_orm::ActiveValue::NotSet));
        assert!(matches!(patch.packet_index, sea_orm::ActiveValue::NotSet));
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(UpdatePallet::default().is_empty());
        assert!(!UpdatePallet {
            size: Some(25),
            ..Default::default()
        }
        .is_empty());
        assert!(!UpdatePallet {
            thermoformer_number: Some(2),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn unassigned_positions_count_rows_but_not_slots() {
        let agg = PalletAggregate::from_packets([(None, 5, at(1)), (Some(1), 6, at(2))]);
        assert_eq!(agg.packets_count, 2);
        assert!(!agg.complete);
        assert_eq!(agg.iso_start, Some(5));
        assert_eq!(agg.iso_end, Some(6));
    }
}
