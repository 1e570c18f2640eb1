use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::packet::{self, PALLET_CAPACITY};
use crate::models::pallet;
use crate::models::sizes;
use crate::nztime::{self, Shift};
use crate::services::counters;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct CreatePacket {
    pub size: i32,
    pub thermoformer_number: i16,
    /// Operator-declared shift; the factory clock decides when absent.
    pub shift: Option<Shift>,
    pub raw_materials: Option<String>,
    pub batch_number: Option<String>,
    pub box_number: Option<String>,
    pub user_id: Option<String>,
}

/// Outcome of recording a packet: the stored row plus where it landed.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PacketPlacement {
    pub packet: packet::Model,
    pub pallet_number: i64,
    pub packet_index: i16,
    pub pallet_closed: bool,
}

#[derive(Clone)]
pub struct PacketService {
    db_pool: Arc<DbPool>,
}

impl PacketService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Records one produced packet. Serial issuance, pallet placement and
    /// pallet closing all happen inside a single transaction; serials are
    /// serialised by the counter row lock, and if two concurrent scans pick
    /// the same free slot the unique index on (pallet_id, packet_index)
    /// rejects the second insert.
    #[instrument(skip(self, input), fields(size = input.size, thermo = input.thermoformer_number))]
    pub async fn create_packet(&self, input: CreatePacket) -> Result<PacketPlacement, ServiceError> {
        if !sizes::is_supported(input.size) {
            return Err(ServiceError::InvalidInput(format!(
                "unsupported size {}",
                input.size
            )));
        }
        if !sizes::is_valid_thermoformer(input.thermoformer_number) {
            return Err(ServiceError::InvalidInput(format!(
                "unknown thermoformer {}",
                input.thermoformer_number
            )));
        }

        let now = Utc::now();
        let txn = self.db_pool.begin().await?;

        let iso_number = counters::next_iso_number(&txn, input.size).await?;
        let (target_pallet, position) =
            find_or_open_pallet(&txn, input.size, input.thermoformer_number, now).await?;

        let model = packet::ActiveModel {
            id: Set(Uuid::new_v4()),
            iso_number: Set(iso_number),
            size: Set(input.size),
            thermoformer_number: Set(input.thermoformer_number),
            shift: Set(input
                .shift
                .unwrap_or_else(|| Shift::at(nztime::FACTORY_TZ, now))),
            raw_materials: Set(input.raw_materials),
            batch_number: Set(input.batch_number),
            box_number: Set(input.box_number),
            pallet_id: Set(Some(target_pallet.id)),
            packet_index: Set(Some(position)),
            user_id: Set(input.user_id),
            created_at: Set(now),
        };
        let stored = model.insert(&txn).await?;

        let pallet_closed = pallet_is_full(&txn, target_pallet.id).await?;
        if pallet_closed && target_pallet.closed_at.is_none() {
            let mut active: pallet::ActiveModel = target_pallet.clone().into();
            active.closed_at = Set(Some(now));
            active.update(&txn).await?;
        }

        txn.commit().await?;

        info!(
            iso_number,
            pallet_number = target_pallet.pallet_number,
            position,
            pallet_closed,
            "packet recorded"
        );

        Ok(PacketPlacement {
            packet: stored,
            pallet_number: target_pallet.pallet_number,
            packet_index: position,
            pallet_closed,
        })
    }

    /// Most recent packets, newest first.
    #[instrument(skip(self))]
    pub async fn list_recent(&self, limit: u64) -> Result<Vec<packet::Model>, ServiceError> {
        let rows = packet::Entity::find()
            .order_by_desc(packet::Column::CreatedAt)
            .limit(limit)
            .all(&*self.db_pool)
            .await?;
        Ok(rows)
    }

    #[instrument(skip(self))]
    pub async fn get_packet(&self, id: Uuid) -> Result<packet::Model, ServiceError> {
        packet::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("packet {} not found", id)))
    }

    #[instrument(skip(self))]
    pub async fn delete_packet(&self, id: Uuid) -> Result<(), ServiceError> {
        let txn = self.db_pool.begin().await?;
        let existing = packet::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("packet {} not found", id)))?;
        let pallet_id = existing.pallet_id;
        packet::Entity::delete_by_id(id).exec(&txn).await?;

        // Removing a packet reopens its pallet
        if let Some(pallet_id) = pallet_id {
            if let Some(parent) = pallet::Entity::find_by_id(pallet_id).one(&txn).await? {
                if parent.closed_at.is_some() {
                    let mut active: pallet::ActiveModel = parent.into();
                    active.closed_at = Set(None);
                    active.update(&txn).await?;
                }
            }
        }
        txn.commit().await?;
        Ok(())
    }
}

/// Picks the open pallet for this size and thermoformer with the lowest free
/// slot, or opens a fresh one. Open pallets are taken oldest first.
async fn find_or_open_pallet<C: ConnectionTrait>(
    conn: &C,
    size: i32,
    thermoformer_number: i16,
    now: chrono::DateTime<Utc>,
) -> Result<(pallet::Model, i16), ServiceError> {
    let open = pallet::Entity::find()
        .filter(pallet::Column::Size.eq(size))
        .filter(pallet::Column::ThermoformerNumber.eq(thermoformer_number))
        .filter(pallet::Column::ClosedAt.is_null())
        .order_by_asc(pallet::Column::OpenedAt)
        .all(conn)
        .await?;

    for candidate in open {
        let taken: Vec<Option<i16>> = packet::Entity::find()
            .filter(packet::Column::PalletId.eq(candidate.id))
            .select_only()
            .column(packet::Column::PacketIndex)
            .into_tuple()
            .all(conn)
            .await?;
        if let Some(free) = lowest_free_position(taken.into_iter().flatten()) {
            return Ok((candidate, free));
        }
    }

    let pallet_number = counters::next_pallet_number(conn).await?;
    let fresh = pallet::ActiveModel {
        id: Set(Uuid::new_v4()),
        pallet_number: Set(pallet_number),
        size: Set(size),
        thermoformer_number: Set(thermoformer_number),
        opened_at: Set(now),
        closed_at: Set(None),
    }
    .insert(conn)
    .await?;
    Ok((fresh, 1))
}

async fn pallet_is_full<C: ConnectionTrait>(conn: &C, pallet_id: Uuid) -> Result<bool, ServiceError> {
    let taken: Vec<Option<i16>> = packet::Entity::find()
        .filter(packet::Column::PalletId.eq(pallet_id))
        .select_only()
        .column(packet::Column::PacketIndex)
        .into_tuple()
        .all(conn)
        .await?;
    Ok(crate::services::pallets::positions_complete(
        taken.into_iter().flatten(),
    ))
}

/// Smallest unoccupied slot in 1..=24, if any.
fn lowest_free_position(taken: impl Iterator<Item = i16>) -> Option<i16> {
    let mut occupied = [false; PALLET_CAPACITY as usize];
    for p in taken {
        if (1..=PALLET_CAPACITY).contains(&p) {
            occupied[(p - 1) as usize] = true;
        }
    }
    occupied
        .iter()
        .position(|&slot| !slot)
        .map(|idx| (idx + 1) as i16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowest_free_position_prefers_gaps() {
        assert_eq!(lowest_free_position([].into_iter()), Some(1));
        assert_eq!(lowest_free_position([1, 2, 4].into_iter()), Some(3));
        assert_eq!(lowest_free_position((1..=23).collect::<Vec<_>>().into_iter()), Some(24));
        assert_eq!(lowest_free_position((1..=24).collect::<Vec<_>>().into_iter()), None);
    }

    #[test]
    fn out_of_range_positions_are_ignored() {
        assert_eq!(lowest_free_position([0, 25, 99].into_iter()), Some(1));
    }
}
