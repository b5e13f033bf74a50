//! Suggestion lifecycle controller
//!
//! Owns every write to the suggestion store. Submissions run in three
//! phases: full validation, blob uploads, then one database transaction
//! that re-checks the department and inserts the record. Nothing is written
//! before validation passes, and a failure after an upload discards the
//! blobs of that submission.
//!
//! Every read returns a projection from `services::visibility`.

use std::sync::Arc;

use civic_common::config::UploadConfig;
use civic_common::time::now;
use civic_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::blob_store::BlobStore;
use super::routing::validate_assignment;
use super::visibility::{SuggestionView, TrackView};
use crate::db::begin_write;
use crate::db::suggestions::{self, FieldChanges};
use crate::models::suggestion::{ACTION_TAKEN_MAX_CHARS, DESCRIPTION_MAX_CHARS, DESCRIPTION_MIN_CHARS};
use crate::models::{
    normalize_text, Category, MediaAttachment, MediaKind, MediaUpload, NewSubmission, Status,
    Suggestion, SuggestionFilter, SuggestionStats, SuggestionUpdate,
};
use crate::pagination::{Paginated, Pagination};

/// Suggestion store plus the collaborators its writes depend on
#[derive(Clone)]
pub struct SuggestionLifecycle {
    db: SqlitePool,
    blobs: Arc<dyn BlobStore>,
    limits: UploadConfig,
}

fn not_found(id: &str) -> Error {
    Error::NotFound(format!("Suggestion not found: {}", id))
}

fn validate_description(raw: &str) -> Result<String> {
    let description = raw.trim();
    let chars = description.chars().count();
    if !(DESCRIPTION_MIN_CHARS..=DESCRIPTION_MAX_CHARS).contains(&chars) {
        return Err(Error::InvalidArgument(format!(
            "Description must be {} to {} characters (got {})",
            DESCRIPTION_MIN_CHARS, DESCRIPTION_MAX_CHARS, chars
        )));
    }
    Ok(description.to_string())
}

fn validate_action_taken(value: Option<String>) -> Result<Option<String>> {
    let value = normalize_text(value);
    if let Some(text) = &value {
        let chars = text.chars().count();
        if chars > ACTION_TAKEN_MAX_CHARS {
            return Err(Error::InvalidArgument(format!(
                "Action taken must be at most {} characters (got {})",
                ACTION_TAKEN_MAX_CHARS, chars
            )));
        }
    }
    Ok(value)
}

impl SuggestionLifecycle {
    pub fn new(db: SqlitePool, blobs: Arc<dyn BlobStore>, limits: UploadConfig) -> Self {
        Self { db, blobs, limits }
    }

    /// Check media against the configured limits, returning each file's kind
    fn validate_media(&self, media: &[MediaUpload]) -> Result<Vec<MediaKind>> {
        if media.len() > self.limits.max_files {
            return Err(Error::InvalidArgument(format!(
                "At most {} media files per submission (got {})",
                self.limits.max_files,
                media.len()
            )));
        }

        let total: usize = media.iter().map(|m| m.bytes.len()).sum();
        if total > self.limits.max_total_bytes {
            return Err(Error::InvalidArgument(format!(
                "Media exceeds {} bytes in total (got {})",
                self.limits.max_total_bytes, total
            )));
        }

        media
            .iter()
            .map(|m| {
                if m.bytes.is_empty() {
                    return Err(Error::InvalidArgument(format!("Empty media file: {}", m.file_name)));
                }
                MediaKind::from_content_type(&m.content_type).ok_or_else(|| {
                    Error::InvalidArgument(format!(
                        "Unsupported media type '{}' for {}; only images and videos are accepted",
                        m.content_type, m.file_name
                    ))
                })
            })
            .collect()
    }

    /// Best-effort removal of blobs; failures are logged and swallowed
    async fn discard_blobs(&self, media: &[MediaAttachment]) {
        for attachment in media {
            if let Err(e) = self.blobs.delete(&attachment.url).await {
                warn!("Failed to delete blob {}: {}", attachment.url, e);
            }
        }
    }

    async fn upload_all(&self, uploads: &[MediaUpload], kinds: Vec<MediaKind>) -> Result<Vec<MediaAttachment>> {
        let mut stored = Vec::with_capacity(uploads.len());

        for (upload, kind) in uploads.iter().zip(kinds) {
            match self
                .blobs
                .put(&upload.bytes, &upload.content_type, &upload.file_name)
                .await
            {
                Ok(blob) => stored.push(MediaAttachment {
                    kind,
                    url: blob.url,
                    original_name: upload.file_name.clone(),
                    content_type: upload.content_type.clone(),
                    size: blob.size,
                }),
                Err(e) => {
                    self.discard_blobs(&stored).await;
                    return Err(if e.is_storage() {
                        e
                    } else {
                        Error::Storage(e.to_string())
                    });
                }
            }
        }

        Ok(stored)
    }

    async fn persist_new(&self, suggestion: &Suggestion) -> Result<()> {
        let mut tx = begin_write(&self.db).await?;
        if let Some(department) = &suggestion.assigned_department {
            validate_assignment(&mut tx, department).await?;
        }
        suggestions::insert(&mut tx, suggestion).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Accept a new suggestion in state `Received`
    pub async fn submit(&self, input: NewSubmission) -> Result<SuggestionView> {
        let category: Category = input.category.parse()?;
        let description = validate_description(&input.description)?;

        let submitter_id = if input.anonymous {
            None
        } else {
            let identity = input.submitter.as_ref().ok_or_else(|| {
                Error::Unauthorized("Sign in or submit anonymously".to_string())
            })?;
            Some(identity.subject_id.clone())
        };

        let kinds = self.validate_media(&input.media)?;

        let assigned_department = match normalize_text(input.assigned_department) {
            Some(name) => {
                let mut conn = self.db.acquire().await?;
                Some(validate_assignment(&mut conn, &name).await?)
            }
            None => None,
        };

        let media = self.upload_all(&input.media, kinds).await?;

        let timestamp = now();
        let suggestion = Suggestion {
            id: Uuid::new_v4().to_string(),
            submitter_id,
            anonymous: input.anonymous,
            category,
            description,
            status: Status::default(),
            assigned_department,
            assigned_to: None,
            action_taken: None,
            media,
            revision: 0,
            created_at: timestamp,
            updated_at: timestamp,
        };

        if let Err(e) = self.persist_new(&suggestion).await {
            self.discard_blobs(&suggestion.media).await;
            return Err(e);
        }

        info!(
            "Suggestion {} submitted ({}, anonymous: {}, media: {})",
            suggestion.id,
            suggestion.category,
            suggestion.anonymous,
            suggestion.media.len()
        );
        Ok(suggestion.into())
    }

    /// Apply a staff update; on any error the stored record is untouched
    pub async fn update_fields(&self, id: &str, update: SuggestionUpdate) -> Result<SuggestionView> {
        let mut changes = FieldChanges {
            status: update.status.map(|s| s.parse()).transpose()?,
            category: update.category.map(|c| c.parse()).transpose()?,
            assigned_department: update.assigned_department.map(normalize_text),
            assigned_to: update.assigned_to.map(normalize_text),
            action_taken: None,
        };
        if let Some(action) = update.action_taken {
            changes.action_taken = Some(validate_action_taken(action)?);
        }

        let mut tx = begin_write(&self.db).await?;
        if suggestions::get(&mut tx, id).await?.is_none() {
            return Err(not_found(id));
        }

        changes.assigned_department = match changes.assigned_department.take() {
            Some(Some(name)) => Some(Some(validate_assignment(&mut tx, &name).await?)),
            other => other,
        };

        suggestions::apply_changes(&mut tx, id, &changes, now()).await?;
        let updated = suggestions::get(&mut tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        tx.commit().await?;

        debug!("Suggestion {} updated to revision {}", id, updated.revision);
        Ok(updated.into())
    }

    /// Full record for staff
    pub async fn get(&self, id: &str) -> Result<SuggestionView> {
        let mut conn = self.db.acquire().await?;
        suggestions::get(&mut conn, id)
            .await?
            .map(SuggestionView::from)
            .ok_or_else(|| not_found(id))
    }

    /// Public tracking view for anyone holding the id
    pub async fn track(&self, id: &str) -> Result<TrackView> {
        let mut conn = self.db.acquire().await?;
        suggestions::get(&mut conn, id)
            .await?
            .map(TrackView::from)
            .ok_or_else(|| not_found(id))
    }

    /// Public transparency list; carries no submitter, assignee or media
    pub async fn list_resolved(&self, pagination: Pagination) -> Result<Paginated<TrackView>> {
        let (items, total) = suggestions::list_resolved(&self.db, pagination).await?;
        Ok(Paginated::new(items, total, pagination).map(TrackView::from))
    }

    pub async fn list_admin(
        &self,
        filter: &SuggestionFilter,
        pagination: Pagination,
    ) -> Result<Paginated<SuggestionView>> {
        let (items, total) = suggestions::list_admin(&self.db, filter, pagination).await?;
        Ok(Paginated::new(items, total, pagination).map(SuggestionView::from))
    }

    /// Non-anonymous suggestions submitted by `subject_id`
    pub async fn list_mine(&self, subject_id: &str, pagination: Pagination) -> Result<Paginated<SuggestionView>> {
        let (items, total) = suggestions::list_by_submitter(&self.db, subject_id, pagination).await?;
        Ok(Paginated::new(items, total, pagination).map(SuggestionView::from))
    }

    /// Remove the record, then its blobs on a best-effort basis
    pub async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = begin_write(&self.db).await?;
        let suggestion = suggestions::get(&mut tx, id)
            .await?
            .ok_or_else(|| not_found(id))?;
        suggestions::delete(&mut tx, id).await?;
        tx.commit().await?;

        self.discard_blobs(&suggestion.media).await;
        info!("Suggestion {} deleted", id);
        Ok(())
    }

    pub async fn stats(&self) -> Result<SuggestionStats> {
        suggestions::stats(&self.db).await
    }
}
