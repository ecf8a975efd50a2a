use chrono::{DateTime, Utc};
use mongodb::bson::{doc, Bson, Document};
use serde::{Deserialize, Serialize};

use super::repo::JobDoc;

pub const MAX_PAGE_SIZE: i64 = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: String,
    pub posted_by: String,
    pub category: String,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub user_email: String,
    #[serde(default)]
    pub skills: Vec<String>,
    pub experience: Option<String>,
    #[serde(default)]
    pub requirements: Vec<String>,
    pub job_type: Option<String>,
    pub location_type: Option<String>,
    pub posted_date: Option<String>,
    pub salary_range: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub posted_by: Option<String>,
    pub category: Option<String>,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub skills: Option<Vec<String>>,
    pub experience: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub job_type: Option<String>,
    pub location_type: Option<String>,
    pub posted_date: Option<String>,
    pub salary_range: Option<String>,
    pub status: Option<String>,
}

impl UpdateJobRequest {
    /// `$set` document for the provided fields only. Identity and creation
    /// fields (`_id`, `userEmail`, `createdAt`) are not updatable by
    /// construction. Building the same payload twice yields the same
    /// document, so repeated updates are idempotent.
    pub fn to_set_document(&self, now: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        let mut put = |key: &str, value: Option<Bson>| {
            if let Some(value) = value {
                set.insert(key, value);
            }
        };
        put("title", self.title.clone().map(Bson::from));
        put("postedBy", self.posted_by.clone().map(Bson::from));
        put("category", self.category.clone().map(Bson::from));
        put("summary", self.summary.clone().map(Bson::from));
        put("coverImage", self.cover_image.clone().map(Bson::from));
        put(
            "skills",
            self.skills
                .clone()
                .map(|v| Bson::Array(v.into_iter().map(Bson::from).collect())),
        );
        put("experience", self.experience.clone().map(Bson::from));
        put(
            "requirements",
            self.requirements
                .clone()
                .map(|v| Bson::Array(v.into_iter().map(Bson::from).collect())),
        );
        put("jobType", self.job_type.clone().map(Bson::from));
        put("locationType", self.location_type.clone().map(Bson::from));
        put("postedDate", self.posted_date.clone().map(Bson::from));
        put("salaryRange", self.salary_range.clone().map(Bson::from));
        put("status", self.status.clone().map(Bson::from));
        if set.is_empty() {
            return set;
        }
        set.insert("updatedAt", mongodb::bson::DateTime::from_chrono(now));
        set
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

impl SortOrder {
    pub fn sort_document(self) -> Document {
        match self {
            SortOrder::Newest => doc! { "createdAt": -1 },
            SortOrder::Oldest => doc! { "createdAt": 1 },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub status: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default)]
    pub sort: SortOrder,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> i64 {
    10
}

impl JobListQuery {
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    pub fn page_size(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }

    pub fn skip(&self) -> u64 {
        // An absurd page number must not overflow; it just lands past the
        // end of the collection and yields an empty page.
        (self.page() - 1).saturating_mul(self.page_size() as u64)
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptTaskRequest {
    /// `null` clears the acceptance; any string claims the job.
    pub accepted_by: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResponse {
    pub id: String,
    pub title: String,
    pub posted_by: String,
    pub category: String,
    pub summary: Option<String>,
    pub cover_image: Option<String>,
    pub user_email: String,
    pub skills: Vec<String>,
    pub experience: Option<String>,
    pub requirements: Vec<String>,
    pub job_type: Option<String>,
    pub location_type: Option<String>,
    pub posted_date: Option<String>,
    pub salary_range: Option<String>,
    pub accepted_by: Option<String>,
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<JobDoc> for JobResponse {
    fn from(job: JobDoc) -> Self {
        Self {
            id: job.id.map(|id| id.to_hex()).unwrap_or_default(),
            title: job.title,
            posted_by: job.posted_by,
            category: job.category,
            summary: job.summary,
            cover_image: job.cover_image,
            user_email: job.user_email,
            skills: job.skills,
            experience: job.experience,
            requirements: job.requirements,
            job_type: job.job_type,
            location_type: job.location_type,
            posted_date: job.posted_date,
            salary_range: job.salary_range,
            accepted_by: job.accepted_by,
            status: job.status,
            created_at: job.created_at,
            updated_at: job.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListResponse {
    pub jobs: Vec<JobResponse>,
    pub total: u64,
    pub page: u64,
    pub page_size: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_query_defaults() {
        let q: JobListQuery = serde_json::from_value(json!({})).expect("defaults");
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), 10);
        assert_eq!(q.skip(), 0);
        assert_eq!(q.sort, SortOrder::Newest);
    }

    #[test]
    fn list_query_clamps_page_and_size() {
        let q: JobListQuery =
            serde_json::from_value(json!({ "page": 0, "pageSize": 500 })).expect("parse");
        assert_eq!(q.page(), 1);
        assert_eq!(q.page_size(), MAX_PAGE_SIZE);

        let q: JobListQuery =
            serde_json::from_value(json!({ "page": 3, "pageSize": 20 })).expect("parse");
        assert_eq!(q.skip(), 40);
    }

    #[test]
    fn skip_saturates_on_huge_page_numbers() {
        let q: JobListQuery =
            serde_json::from_value(json!({ "page": u64::MAX })).expect("parse");
        assert_eq!(q.skip(), u64::MAX);

        let q: JobListQuery =
            serde_json::from_value(json!({ "page": u64::MAX, "pageSize": 1 })).expect("parse");
        assert_eq!(q.skip(), u64::MAX - 1);
    }

    #[test]
    fn sort_order_parses_and_maps_to_sort_documents() {
        let q: JobListQuery = serde_json::from_value(json!({ "sort": "oldest" })).expect("parse");
        assert_eq!(q.sort.sort_document(), doc! { "createdAt": 1 });
        assert_eq!(
            SortOrder::Newest.sort_document(),
            doc! { "createdAt": -1 }
        );
    }

    #[test]
    fn update_set_document_contains_only_provided_fields() {
        let req = UpdateJobRequest {
            title: Some("New title".into()),
            status: Some("closed".into()),
            ..Default::default()
        };
        let now = Utc::now();
        let set = req.to_set_document(now);
        assert_eq!(set.get_str("title").unwrap(), "New title");
        assert_eq!(set.get_str("status").unwrap(), "closed");
        assert!(set.contains_key("updatedAt"));
        assert_eq!(set.len(), 3);
        // Identity and creation fields can never appear.
        assert!(!set.contains_key("_id"));
        assert!(!set.contains_key("userEmail"));
        assert!(!set.contains_key("createdAt"));
    }

    #[test]
    fn empty_update_builds_empty_set_document() {
        let set = UpdateJobRequest::default().to_set_document(Utc::now());
        assert!(set.is_empty());
    }

    #[test]
    fn identical_payloads_build_identical_set_documents() {
        let req = UpdateJobRequest {
            summary: Some("same".into()),
            skills: Some(vec!["rust".into()]),
            ..Default::default()
        };
        let now = Utc::now();
        assert_eq!(req.to_set_document(now), req.to_set_document(now));
    }

    #[test]
    fn accept_task_body_allows_null() {
        let req: AcceptTaskRequest =
            serde_json::from_value(json!({ "acceptedBy": null })).expect("parse");
        assert!(req.accepted_by.is_none());
        let req: AcceptTaskRequest =
            serde_json::from_value(json!({ "acceptedBy": "w@x.com" })).expect("parse");
        assert_eq!(req.accepted_by.as_deref(), Some("w@x.com"));
    }
}
