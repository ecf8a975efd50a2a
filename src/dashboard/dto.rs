use serde::Serialize;

use super::repo::{CategoryCount, DailyCount, Overview};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewResponse {
    pub total_jobs: u64,
    pub total_users: u64,
    pub accepted_jobs: u64,
    pub open_jobs: u64,
}

impl From<Overview> for OverviewResponse {
    fn from(o: Overview) -> Self {
        Self {
            total_jobs: o.total_jobs,
            total_users: o.total_users,
            accepted_jobs: o.accepted_jobs,
            open_jobs: o.open_jobs,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySlice {
    pub category: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySlice {
    pub day: String,
    pub count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartsResponse {
    pub categories: Vec<CategorySlice>,
    pub postings_per_day: Vec<DailySlice>,
}

impl ChartsResponse {
    pub fn new(categories: Vec<CategoryCount>, per_day: Vec<DailyCount>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .map(|c| CategorySlice {
                    category: c.category,
                    count: c.count,
                })
                .collect(),
            postings_per_day: per_day
                .into_iter()
                .map(|d| DailySlice {
                    day: d.day,
                    count: d.count,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charts_response_serializes_camel_case() {
        let response = ChartsResponse::new(
            vec![CategoryCount {
                category: "design".into(),
                count: 3,
            }],
            vec![DailyCount {
                day: "2026-08-30".into(),
                count: 1,
            }],
        );
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["categories"][0]["category"], "design");
        assert_eq!(value["postingsPerDay"][0]["day"], "2026-08-30");
    }

    #[test]
    fn overview_response_carries_all_counters() {
        let response = OverviewResponse::from(Overview {
            total_jobs: 10,
            total_users: 4,
            accepted_jobs: 3,
            open_jobs: 7,
        });
        let value = serde_json::to_value(&response).expect("serialize");
        assert_eq!(value["totalJobs"], 10);
        assert_eq!(value["openJobs"], 7);
    }
}
