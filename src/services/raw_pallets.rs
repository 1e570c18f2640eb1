use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::raw_pallet::{self, ROLLS_PER_PALLET};
use crate::nztime::{self, RangeUnit};
use crate::storage::{self, StorageClient, RAW_PALLETS_BUCKET};
use bytes::Bytes;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SaveRawPallet {
    pub supplier: Option<String>,
    pub pallet_no: i64,
    pub stock_code: Option<String>,
    pub batch_number: String,
    pub sticker_date: Option<NaiveDate>,
    pub photo: Option<Bytes>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateRawPallet {
    pub supplier: Option<String>,
    pub stock_code: Option<String>,
    pub sticker_date: Option<NaiveDate>,
    pub rolls_used: Option<i16>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RawPalletPage {
    pub raw_pallets: Vec<raw_pallet::Model>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Photo-bearing row with a resolvable image URL for the gallery view.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RawPalletPhoto {
    #[serde(flatten)]
    pub raw_pallet: raw_pallet::Model,
    pub photo_url: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RawPalletPhotoPage {
    pub photos: Vec<RawPalletPhoto>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Clone)]
pub struct RawPalletService {
    db_pool: Arc<DbPool>,
    storage: StorageClient,
}

impl RawPalletService {
    pub fn new(db_pool: Arc<DbPool>, storage: StorageClient) -> Self {
        Self { db_pool, storage }
    }

    /// Records a scanned raw-pallet sticker. Repeat scans of the same
    /// (batch_number, pallet_no) update the stored row in place; a new photo
    /// replaces the old path, a scan without one keeps it.
    #[instrument(skip(self, input), fields(batch = %input.batch_number, pallet_no = input.pallet_no))]
    pub async fn save_raw_pallet(
        &self,
        input: SaveRawPallet,
    ) -> Result<raw_pallet::Model, ServiceError> {
        if input.batch_number.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "batch_number must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let photo_path = match input.photo {
            Some(bytes) => {
                let folder = nztime::date_folder(nztime::FACTORY_TZ, now);
                let supplier_slug = input
                    .supplier
                    .as_deref()
                    .map(storage_slug)
                    .unwrap_or_else(|| "unknown".to_string());
                let path = format!(
                    "{}/{}/{}-{}.jpg",
                    folder,
                    supplier_slug,
                    input.pallet_no,
                    nztime::time_compact(nztime::FACTORY_TZ, now)
                );
                self.storage
                    .upload(RAW_PALLETS_BUCKET, &path, bytes, "image/jpeg")
                    .await?;
                Some(path)
            }
            None => None,
        };

        let existing = raw_pallet::Entity::find()
            .filter(raw_pallet::Column::BatchNumber.eq(input.batch_number.clone()))
            .filter(raw_pallet::Column::PalletNo.eq(input.pallet_no))
            .one(&*self.db_pool)
            .await?;

        let stored = match existing {
            Some(row) => {
                let kept_path = photo_path.or(row.photo_path.clone());
                let mut active: raw_pallet::ActiveModel = row.into();
                active.supplier = Set(input.supplier);
                active.stock_code = Set(input.stock_code);
                active.sticker_date = Set(input.sticker_date);
                active.photo_path = Set(kept_path);
                active.update(&*self.db_pool).await?
            }
            None => {
                raw_pallet::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    supplier: Set(input.supplier),
                    pallet_no: Set(input.pallet_no),
                    stock_code: Set(input.stock_code),
                    batch_number: Set(input.batch_number),
                    sticker_date: Set(input.sticker_date),
                    rolls_total: Set(ROLLS_PER_PALLET),
                    rolls_used: Set(0),
                    photo_path: Set(photo_path),
                    created_at: Set(now),
                }
                .insert(&*self.db_pool)
                .await?
            }
        };

        info!(id = %stored.id, "raw pallet saved");
        Ok(stored)
    }

    /// Rows created inside the requested local-time range, newest first.
    #[instrument(skip(self))]
    pub async fn list_range(
        &self,
        unit: RangeUnit,
        page: u64,
        limit: u64,
    ) -> Result<RawPalletPage, ServiceError> {
        let range = nztime::factory_range(unit);
        let paginator = raw_pallet::Entity::find()
            .filter(raw_pallet::Column::CreatedAt.gte(range.start))
            .filter(raw_pallet::Column::CreatedAt.lt(range.end))
            .order_by_desc(raw_pallet::Column::CreatedAt)
            .paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let raw_pallets = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok(RawPalletPage {
            raw_pallets,
            total,
            page,
            limit,
        })
    }

    /// Gallery of photo-bearing rows with public URLs.
    #[instrument(skip(self))]
    pub async fn list_photos(
        &self,
        page: u64,
        limit: u64,
    ) -> Result<RawPalletPhotoPage, ServiceError> {
        let paginator = raw_pallet::Entity::find()
            .filter(raw_pallet::Column::PhotoPath.is_not_null())
            .order_by_desc(raw_pallet::Column::CreatedAt)
            .paginate(&*self.db_pool, limit.max(1));
        let total = paginator.num_items().await?;
        let rows = paginator.fetch_page(page.saturating_sub(1)).await?;

        let photos = rows
            .into_iter()
            .filter_map(|row| {
                let path = row.photo_path.clone()?;
                let photo_url = self.storage.public_url(RAW_PALLETS_BUCKET, &path);
                Some(RawPalletPhoto {
                    raw_pallet: row,
                    photo_url,
                })
            })
            .collect();
        Ok(RawPalletPhotoPage {
            photos,
            total,
            page,
            limit,
        })
    }

    #[instrument(skip(self, changes))]
    pub async fn update_raw_pallet(
        &self,
        id: Uuid,
        changes: UpdateRawPallet,
    ) -> Result<raw_pallet::Model, ServiceError> {
        let existing = raw_pallet::Entity::find_by_id(id)
            .one(&*self.db_pool)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("raw pallet {} not found", id)))?;

        if let Some(used) = changes.rolls_used {
            if used < 0 || used > existing.rolls_total {
                return Err(ServiceError::InvalidInput(format!(
                    "rolls_used must be between 0 and {}",
                    existing.rolls_total
                )));
            }
        }

        let mut active: raw_pallet::ActiveModel = existing.into();
        if let Some(supplier) = changes.supplier {
            active.supplier = Set(Some(supplier));
        }
        if let Some(stock_code) = changes.stock_code {
            active.stock_code = Set(Some(stock_code));
        }
        if let Some(sticker_date) = changes.sticker_date {
            active.sticker_date = Set(Some(sticker_date));
        }
        if let Some(rolls_used) = changes.rolls_used {
            active.rolls_used = Set(rolls_used);
        }
        Ok(active.update(&*self.db_pool).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_raw_pallet(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = raw_pallet::Entity::delete_by_id(id)
            .exec(&*self.db_pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "raw pallet {} not found",
                id
            )));
        }
        Ok(())
    }
}

/// Lowercase alphanumerics and dashes only, safe inside an object path.
fn storage_slug(value: &str) -> String {
    let slug: String = value
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let trimmed = slug.trim_matches('-');
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_flatten_punctuation_and_case() {
        assert_eq!(storage_slug("Alto Packaging Ltd."), "alto-packaging-ltd");
        assert_eq!(storage_slug("  "), "unknown");
        assert_eq!(storage_slug("--x--"), "x");
    }
}
