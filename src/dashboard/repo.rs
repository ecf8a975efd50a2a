use chrono::{DateTime, Duration, Utc};
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, from_document, Document},
    error::Result,
    options::FindOptions,
    Collection,
};
use serde::Deserialize;

use crate::jobs::repo::JobDoc;
use crate::users::repo::UserDoc;

pub const CHART_WINDOW_DAYS: i64 = 30;
pub const RECENT_LIMIT: i64 = 5;

#[derive(Debug, Deserialize, PartialEq)]
pub struct CategoryCount {
    #[serde(rename = "_id")]
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Deserialize, PartialEq)]
pub struct DailyCount {
    /// Day bucket, formatted "%Y-%m-%d".
    #[serde(rename = "_id")]
    pub day: String,
    pub count: i64,
}

pub struct Overview {
    pub total_jobs: u64,
    pub total_users: u64,
    pub accepted_jobs: u64,
    pub open_jobs: u64,
}

pub async fn overview(
    jobs: &Collection<JobDoc>,
    users: &Collection<UserDoc>,
) -> Result<Overview> {
    let total_jobs = jobs.count_documents(None, None).await?;
    let total_users = users.count_documents(None, None).await?;
    // $ne null excludes both missing and null acceptedBy.
    let accepted_jobs = jobs
        .count_documents(doc! { "acceptedBy": { "$ne": null } }, None)
        .await?;
    // The two counts come from separate queries and may race a writer.
    let open_jobs = total_jobs.saturating_sub(accepted_jobs);
    Ok(Overview {
        total_jobs,
        total_users,
        accepted_jobs,
        open_jobs,
    })
}

pub fn category_pipeline() -> Vec<Document> {
    vec![
        doc! { "$group": { "_id": "$category", "count": { "$sum": 1 } } },
        doc! { "$sort": { "count": -1, "_id": 1 } },
    ]
}

pub fn daily_pipeline(since: DateTime<Utc>) -> Vec<Document> {
    vec![
        doc! { "$match": { "createdAt": { "$gte": mongodb::bson::DateTime::from_chrono(since) } } },
        doc! { "$group": {
            "_id": { "$dateToString": { "format": "%Y-%m-%d", "date": "$createdAt" } },
            "count": { "$sum": 1 },
        } },
        doc! { "$sort": { "_id": 1 } },
    ]
}

pub async fn jobs_per_category(jobs: &Collection<JobDoc>) -> Result<Vec<CategoryCount>> {
    let docs: Vec<Document> = jobs
        .aggregate(category_pipeline(), None)
        .await?
        .try_collect()
        .await?;
    docs.into_iter()
        .map(|d| from_document(d).map_err(Into::into))
        .collect()
}

/// Per-day job counts over the trailing window, oldest bucket first. Days
/// with no postings simply have no bucket.
pub async fn jobs_per_day(jobs: &Collection<JobDoc>, now: DateTime<Utc>) -> Result<Vec<DailyCount>> {
    let since = now - Duration::days(CHART_WINDOW_DAYS);
    let docs: Vec<Document> = jobs
        .aggregate(daily_pipeline(since), None)
        .await?
        .try_collect()
        .await?;
    docs.into_iter()
        .map(|d| from_document(d).map_err(Into::into))
        .collect()
}

pub async fn recent_jobs(jobs: &Collection<JobDoc>) -> Result<Vec<JobDoc>> {
    let options = FindOptions::builder()
        .sort(doc! { "createdAt": -1 })
        .limit(RECENT_LIMIT)
        .build();
    jobs.find(None, options).await?.try_collect().await
}
