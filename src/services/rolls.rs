use crate::db::DbPool;
use crate::errors::ServiceError;
use crate::models::roll;
use crate::models::sizes;
use crate::nztime::{self, RangeUnit};
use crate::storage::{StorageClient, ROLLS_BUCKET};
use bytes::Bytes;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument};
use uuid::Uuid;

const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct SaveRoll {
    pub thermoformer_number: i16,
    pub raw_materials: String,
    pub batch_number: String,
    pub box_number: String,
    pub photo: Option<Bytes>,
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SavedRoll {
    #[serde(flatten)]
    pub roll: roll::Model,
    pub photo_url: Option<String>,
}

/// Roll row with a time-limited read URL for its label photo.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct RollView {
    #[serde(flatten)]
    pub roll: roll::Model,
    pub photo_url: Option<String>,
}

#[derive(Clone)]
pub struct RollService {
    db_pool: Arc<DbPool>,
    storage: StorageClient,
}

impl RollService {
    pub fn new(db_pool: Arc<DbPool>, storage: StorageClient) -> Self {
        Self { db_pool, storage }
    }

    /// Records a roll going onto a thermoformer, uploading the label photo
    /// under `YYYY-MM-DD/thermo{n}/` in local date terms.
    #[instrument(skip(self, input), fields(thermo = input.thermoformer_number))]
    pub async fn save_roll(&self, input: SaveRoll) -> Result<SavedRoll, ServiceError> {
        if !sizes::is_valid_thermoformer(input.thermoformer_number) {
            return Err(ServiceError::InvalidInput(format!(
                "unknown thermoformer {}",
                input.thermoformer_number
            )));
        }
        if input.batch_number.trim().is_empty() || input.box_number.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "batch_number and box_number must not be empty".to_string(),
            ));
        }

        let now = Utc::now();
        let photo_path = match input.photo {
            Some(bytes) => {
                let path = format!(
                    "{}/thermo{}/{}.jpg",
                    nztime::date_folder(nztime::FACTORY_TZ, now),
                    input.thermoformer_number,
                    nztime::time_compact(nztime::FACTORY_TZ, now)
                );
                self.storage
                    .upload(ROLLS_BUCKET, &path, bytes, "image/jpeg")
                    .await?;
                Some(path)
            }
            None => None,
        };

        let stored = roll::ActiveModel {
            id: Set(Uuid::new_v4()),
            thermoformer_number: Set(input.thermoformer_number),
            raw_materials: Set(input.raw_materials),
            batch_number: Set(input.batch_number),
            box_number: Set(input.box_number),
            photo_path: Set(photo_path.clone()),
            user_id: Set(input.user_id),
            created_at: Set(now),
        }
        .insert(&*self.db_pool)
        .await?;

        let photo_url = photo_path
            .as_deref()
            .map(|p| self.storage.public_url(ROLLS_BUCKET, p));

        info!(id = %stored.id, "roll saved");
        Ok(SavedRoll {
            roll: stored,
            photo_url,
        })
    }

    /// Rolls in the local-time range, newest first, with signed photo URLs.
    #[instrument(skip(self))]
    pub async fn list_range(&self, unit: RangeUnit) -> Result<Vec<RollView>, ServiceError> {
        let range = nztime::factory_range(unit);
        let rows = roll::Entity::find()
            .filter(roll::Column::CreatedAt.gte(range.start))
            .filter(roll::Column::CreatedAt.lt(range.end))
            .order_by_desc(roll::Column::CreatedAt)
            .all(&*self.db_pool)
            .await?;

        let mut views = Vec::with_capacity(rows.len());
        for row in rows {
            let photo_url = match row.photo_path.as_deref() {
                Some(path) => Some(
                    self.storage
                        .create_signed_url(ROLLS_BUCKET, path, SIGNED_URL_TTL)
                        .await?,
                ),
                None => None,
            };
            views.push(RollView {
                roll: row,
                photo_url,
            });
        }
        Ok(views)
    }

    #[instrument(skip(self))]
    pub async fn delete_roll(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = roll::Entity::delete_by_id(id).exec(&*self.db_pool).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("roll {} not found", id)));
        }
        Ok(())
    }
}
