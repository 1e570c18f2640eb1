use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::packet::{self, PLIXIES_PER_PACKET};
use crate::models::pallet;
use crate::models::sizes;
use crate::nztime::{self, RangeUnit, Shift};
use chrono::{Duration, Utc};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Select};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, Copy, Default)]
pub struct StatsFilter {
    pub thermoformer_number: Option<i16>,
    pub size: Option<i32>,
    pub shift: Option<Shift>,
}

/// Headline counts plus a per-local-hour histogram for one range.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct StatsSummary {
    pub packets: u64,
    pub plixies: u64,
    pub pallets_opened: u64,
    pub pallets_closed: u64,
    pub hourly: Vec<HourBucket>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HourBucket {
    /// Local hour of day, 0..=23
    pub hour: u32,
    pub packets: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct HomeStats {
    pub shift: &'static str,
    pub shift_label: &'static str,
    pub shift_target: u64,
    pub thermoformers: Vec<ThermoformerProgress>,
    pub packets_this_shift: u64,
    pub plixies_this_shift: u64,
    pub trend_24h: Vec<HourBucket>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ThermoformerProgress {
    pub thermoformer_number: i16,
    pub packets: u64,
    pub target: u64,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SizeStats {
    pub size: i32,
    pub packets_today: u64,
    pub latest_iso_number: Option<i64>,
}

#[derive(Clone)]
pub struct StatsService {
    db_pool: Arc<DbPool>,
}

impl StatsService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// KPI counts and hourly histogram for a local-time range.
    #[instrument(skip(self))]
    pub async fn summary(
        &self,
        unit: RangeUnit,
        filter: StatsFilter,
    ) -> Result<StatsSummary, ServiceError> {
        let range = nztime::factory_range(unit);

        let packets = filtered_packets(filter)
            .filter(packet::Column::CreatedAt.gte(range.start))
            .filter(packet::Column::CreatedAt.lt(range.end))
            .all(&*self.db_pool)
            .await?;

        let pallets_opened = pallet::Entity::find()
            .filter(pallet::Column::OpenedAt.gte(range.start))
            .filter(pallet::Column::OpenedAt.lt(range.end))
            .count(&*self.db_pool)
            .await?;
        let pallets_closed = pallet::Entity::find()
            .filter(pallet::Column::ClosedAt.gte(range.start))
            .filter(pallet::Column::ClosedAt.lt(range.end))
            .count(&*self.db_pool)
            .await?;

        let hourly = hourly_histogram(packets.iter().map(|p| p.created_at));
        let count = packets.len() as u64;

        Ok(StatsSummary {
            packets: count,
            plixies: count * PLIXIES_PER_PACKET,
            pallets_opened,
            pallets_closed,
            hourly,
        })
    }

    /// Raw packet rows for the range, newest first.
    #[instrument(skip(self))]
    pub async fn table(
        &self,
        unit: RangeUnit,
        filter: StatsFilter,
    ) -> Result<Vec<packet::Model>, ServiceError> {
        let range = nztime::factory_range(unit);
        let rows = filtered_packets(filter)
            .filter(packet::Column::CreatedAt.gte(range.start))
            .filter(packet::Column::CreatedAt.lt(range.end))
            .order_by_desc(packet::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;
        Ok(rows)
    }

    /// Dashboard snapshot: current shift progress per thermoformer plus a
    /// rolling 24 h trend.
    #[instrument(skip(self))]
    pub async fn home(&self) -> Result<HomeStats, ServiceError> {
        let now = Utc::now();
        let shift = Shift::at(nztime::FACTORY_TZ, now);
        let shift_start = Shift::start_utc(nztime::FACTORY_TZ, now);

        let shift_packets = packet::Entity::find()
            .filter(packet::Column::CreatedAt.gte(shift_start))
            .all(&*self.db_pool)
            .await?;

        let thermoformers = [1i16, 2]
            .into_iter()
            .map(|thermo| ThermoformerProgress {
                thermoformer_number: thermo,
                packets: shift_packets
                    .iter()
                    .filter(|p| p.thermoformer_number == thermo)
                    .count() as u64,
                target: shift.target(),
            })
            .collect();

        let day_ago = now - Duration::hours(24);
        let recent = packet::Entity::find()
            .filter(packet::Column::CreatedAt.gte(day_ago))
            .all(&*self.db_pool)
            .await?;

        let packets_this_shift = shift_packets.len() as u64;
        Ok(HomeStats {
            shift: shift.code(),
            shift_label: shift.label(),
            shift_target: shift.target(),
            thermoformers,
            packets_this_shift,
            plixies_this_shift: packets_this_shift * PLIXIES_PER_PACKET,
            trend_24h: hourly_histogram(recent.iter().map(|p| p.created_at)),
        })
    }

    /// Per-size production for the current local day.
    #[instrument(skip(self))]
    pub async fn sizes(&self) -> Result<Vec<SizeStats>, ServiceError> {
        let range = nztime::factory_range(RangeUnit::Day);
        let mut out = Vec::with_capacity(sizes::ALL_SIZES.len());
        for size in sizes::ALL_SIZES {
            let packets_today = packet::Entity::find()
                .filter(packet::Column::Size.eq(size))
                .filter(packet::Column::CreatedAt.gte(range.start))
                .filter(packet::Column::CreatedAt.lt(range.end))
                .count(&*self.db_pool)
                .await?;
            let latest = packet::Entity::find()
                .filter(packet::Column::Size.eq(size))
                .order_by_desc(packet::Column::IsoNumber)
                .one(&*self.db_pool)
                .await?;
            out.push(SizeStats {
                size,
                packets_today,
                latest_iso_number: latest.map(|p| p.iso_number),
            });
        }
        Ok(out)
    }
}

fn filtered_packets(filter: StatsFilter) -> Select<packet::Entity> {
    let mut query = packet::Entity::find();
    if let Some(thermo) = filter.thermoformer_number {
        query = query.filter(packet::Column::ThermoformerNumber.eq(thermo));
    }
    if let Some(size) = filter.size {
        query = query.filter(packet::Column::Size.eq(size));
    }
    if let Some(shift) = filter.shift {
        query = query.filter(packet::Column::Shift.eq(shift));
    }
    query
}

/// Buckets instants into their local hour of day.
fn hourly_histogram(instants: impl Iterator<Item = chrono::DateTime<Utc>>) -> Vec<HourBucket> {
    let mut buckets = [0u64; 24];
    for instant in instants {
        buckets[nztime::hour_in_zone(nztime::FACTORY_TZ, instant) as usize] += 1;
    }
    buckets
        .iter()
        .enumerate()
        .map(|(hour, &packets)| HourBucket {
            hour: hour as u32,
            packets,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn histogram_buckets_by_local_hour() {
        // 2025-01-15 20:30 UTC is 09:30 on the 16th in Auckland (UTC+13).
        let utc_evening = Utc.with_ymd_and_hms(2025, 1, 15, 20, 30, 0).unwrap();
        let hist = hourly_histogram([utc_evening, utc_evening].into_iter());
        assert_eq!(hist.len(), 24);
        assert_eq!(hist[9].packets, 2);
        assert_eq!(hist.iter().map(|b| b.packets).sum::<u64>(), 2);
    }
}
