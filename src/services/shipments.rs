use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::pallet;
use crate::models::pallet_shipment::{self, Destination};
use crate::services::pallets::{PalletAggregate, PalletService};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// A closed pallet ready for (or already given) a destination.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ShipmentView {
    pub pallet_id: Uuid,
    pub pallet_number: i64,
    pub size: i32,
    pub thermoformer_number: i16,
    pub iso_start: Option<i64>,
    pub iso_end: Option<i64>,
    pub closed_at: Option<DateTime<Utc>>,
    pub location: Option<Destination>,
    pub assigned_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ShipmentPage {
    pub shipments: Vec<ShipmentView>,
    pub destinations: Vec<&'static str>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Clone)]
pub struct ShipmentService {
    db_pool: Arc<DbPool>,
    pallets: PalletService,
}

impl ShipmentService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        let pallets = PalletService::new(db_pool.clone());
        Self { db_pool, pallets }
    }

    /// Closed pallets newest-first. Completion is recomputed from packet
    /// positions; a stale `closed_at` on a no-longer-full pallet is skipped,
    /// and `total` counts only pallets that actually appear.
    #[instrument(skip(self))]
    pub async fn list_shipments(&self, page: u64, limit: u64) -> Result<ShipmentPage, ServiceError> {
        let rows = pallet::Entity::find()
            .filter(pallet::Column::ClosedAt.is_not_null())
            .order_by_desc(pallet::Column::ClosedAt)
            .all(&*self.db_pool)
            .await?;

        let mut complete: Vec<(pallet::Model, PalletAggregate)> = Vec::new();
        for row in rows {
            let aggregate = self.pallets.aggregate_for(row.id).await?;
            if aggregate.complete {
                complete.push((row, aggregate));
            }
        }
        let total = complete.len() as u64;

        let limit = limit.max(1);
        let offset = (page.saturating_sub(1)).saturating_mul(limit) as usize;
        let mut shipments = Vec::new();
        for (row, aggregate) in complete.into_iter().skip(offset).take(limit as usize) {
            let assignment = pallet_shipment::Entity::find_by_id(row.id)
                .one(&*self.db_pool)
                .await?;
            shipments.push(ShipmentView {
                pallet_id: row.id,
                pallet_number: row.pallet_number,
                size: row.size,
                thermoformer_number: row.thermoformer_number,
                iso_start: aggregate.iso_start,
                iso_end: aggregate.iso_end,
                closed_at: row.closed_at.or(aggregate.last_packet_at),
                location: assignment.as_ref().map(|a| a.location),
                assigned_at: assignment.map(|a| a.assigned_at),
            });
        }

        Ok(ShipmentPage {
            shipments,
            destinations: Destination::ALL.iter().map(|d| d.as_str()).collect(),
            total,
            page,
            limit,
        })
    }

    /// Assigns (or reassigns) a destination to a closed pallet.
    #[instrument(skip(self))]
    pub async fn assign_destination(
        &self,
        pallet_id: Uuid,
        location: Destination,
    ) -> Result<pallet_shipment::Model, ServiceError> {
        pallet::Entity::find_by_id(pallet_id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("pallet {} not found", pallet_id)))?;

        let now = Utc::now();
        let row = pallet_shipment::ActiveModel {
            pallet_id: Set(pallet_id),
            location: Set(location),
            assigned_at: Set(now),
        };
        pallet_shipment::Entity::insert(row)
            .on_conflict(
                OnConflict::column(pallet_shipment::Column::PalletId)
                    .update_columns([
                        pallet_shipment::Column::Location,
                        pallet_shipment::Column::AssignedAt,
                    ])
                    .to_owned(),
            )
            .exec(&*self.db_pool)
            .await?;

        info!(%pallet_id, location = location.as_str(), "shipment destination assigned");
        Ok(pallet_shipment::Model {
            pallet_id,
            location,
            assigned_at: now,
        })
    }
}
