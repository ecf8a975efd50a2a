use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

use super::repo::{Role, UserDoc};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertProfileRequest {
    pub email: String,
    pub name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

impl UpsertProfileRequest {
    /// `$set` half of the upsert; role and createdAt live in `$setOnInsert`.
    pub fn to_set_document(&self, now: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        set.insert("name", opt(&self.name));
        set.insert("photoURL", opt(&self.photo_url));
        set.insert("phone", opt(&self.phone));
        set.insert("location", opt(&self.location));
        set.insert("bio", opt(&self.bio));
        set.insert("updatedAt", mongodb::bson::DateTime::from_chrono(now));
        set
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
}

impl UpdateProfileRequest {
    /// Partial `$set`: only provided fields. `email` and `role` are not
    /// updatable through this path by construction.
    pub fn to_set_document(&self, now: DateTime<Utc>) -> Document {
        let mut set = Document::new();
        let mut put = |key: &str, value: &Option<String>| {
            if let Some(value) = value {
                set.insert(key, value.clone());
            }
        };
        put("name", &self.name);
        put("photoURL", &self.photo_url);
        put("phone", &self.phone);
        put("location", &self.location);
        put("bio", &self.bio);
        if set.is_empty() {
            return set;
        }
        set.insert("updatedAt", mongodb::bson::DateTime::from_chrono(now));
        set
    }
}

/// Role arrives as a raw string so unknown values surface as BadRequest
/// instead of a body-deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct ChangeRoleRequest {
    pub role: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub email: String,
    pub name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDoc> for UserResponse {
    fn from(user: UserDoc) -> Self {
        Self {
            email: user.email,
            name: user.name,
            photo_url: user.photo_url,
            phone: user.phone,
            location: user.location,
            bio: user.bio,
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

fn opt(value: &Option<String>) -> Bson {
    match value {
        Some(v) => Bson::from(v.clone()),
        None => Bson::Null,
    }
}
