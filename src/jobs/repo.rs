use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime, Document},
    error::{Error, Result},
    options::{FindOneAndUpdateOptions, FindOptions, ReturnDocument},
    Collection,
};
use serde::{Deserialize, Serialize};

/// A job listing as stored in the `jobs` collection. Field names match the
/// wire format; the store enforces no schema beyond what these writes set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub posted_by: String,
    pub category: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    /// Owner identity, lowercase. Soft reference into `users` by value.
    pub user_email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub experience: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub job_type: Option<String>,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub posted_date: Option<String>,
    #[serde(default)]
    pub salary_range: Option<String>,
    /// At most one accepted worker at a time; last write wins.
    #[serde(default)]
    pub accepted_by: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Filter for the public listing. `q` matches the title case-insensitively.
pub fn list_filter(q: Option<&str>, category: Option<&str>, status: Option<&str>) -> Document {
    let mut filter = Document::new();
    if let Some(q) = q.filter(|s| !s.trim().is_empty()) {
        filter.insert(
            "title",
            doc! { "$regex": regex::escape(q.trim()), "$options": "i" },
        );
    }
    if let Some(category) = category.filter(|s| !s.is_empty()) {
        filter.insert("category", category);
    }
    if let Some(status) = status.filter(|s| !s.is_empty()) {
        filter.insert("status", status);
    }
    filter
}

pub async fn list(
    coll: &Collection<JobDoc>,
    filter: Document,
    sort: Document,
    skip: u64,
    limit: i64,
) -> Result<Vec<JobDoc>> {
    let options = FindOptions::builder()
        .sort(sort)
        .skip(skip)
        .limit(limit)
        .build();
    coll.find(filter, options).await?.try_collect().await
}

pub async fn count(coll: &Collection<JobDoc>, filter: Document) -> Result<u64> {
    coll.count_documents(filter, None).await
}

pub async fn find_by_id(coll: &Collection<JobDoc>, id: ObjectId) -> Result<Option<JobDoc>> {
    coll.find_one(doc! { "_id": id }, None).await
}

pub async fn insert(coll: &Collection<JobDoc>, job: &JobDoc) -> Result<ObjectId> {
    let result = coll.insert_one(job, None).await?;
    result
        .inserted_id
        .as_object_id()
        .ok_or_else(|| Error::custom("insert returned a non-ObjectId _id"))
}

/// Applies a prebuilt `$set` document and returns the updated job, or
/// `None` when the id does not resolve.
pub async fn apply_update(
    coll: &Collection<JobDoc>,
    id: ObjectId,
    set: Document,
) -> Result<Option<JobDoc>> {
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    coll.find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
        .await
}

pub async fn delete(coll: &Collection<JobDoc>, id: ObjectId) -> Result<bool> {
    let result = coll.delete_one(doc! { "_id": id }, None).await?;
    Ok(result.deleted_count > 0)
}

pub async fn find_by_owner(coll: &Collection<JobDoc>, email: &str) -> Result<Vec<JobDoc>> {
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .build();
    coll.find(doc! { "userEmail": email }, options)
        .await?
        .try_collect()
        .await
}

pub async fn find_by_accepted(coll: &Collection<JobDoc>, email: &str) -> Result<Vec<JobDoc>> {
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .build();
    coll.find(doc! { "acceptedBy": email }, options)
        .await?
        .try_collect()
        .await
}

/// Ungated by design: any caller may set any job's acceptedBy. Concurrent
/// writers race and the last write wins.
pub async fn set_accepted_by(
    coll: &Collection<JobDoc>,
    id: ObjectId,
    accepted_by: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<JobDoc>> {
    let accepted: mongodb::bson::Bson = match accepted_by {
        Some(email) => email.into(),
        None => mongodb::bson::Bson::Null,
    };
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    coll.find_one_and_update(
        doc! { "_id": id },
        doc! { "$set": {
            "acceptedBy": accepted,
            "updatedAt": mongodb::bson::DateTime::from_chrono(now),
        } },
        options,
    )
    .await
}
