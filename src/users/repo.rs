use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, oid::ObjectId, serde_helpers::chrono_datetime_as_bson_datetime, Document},
    error::{Error, Result},
    options::{FindOneAndUpdateOptions, ReturnDocument},
    Collection,
};
use serde::{Deserialize, Serialize};

use crate::auth::guard::RoleResolver;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            _ => Err(()),
        }
    }
}

/// A profile as stored in the `users` collection. The lowercase email is
/// the natural key; `_id` is store-assigned and unused by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDoc {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "photoURL")]
    pub photo_url: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

pub async fn find_by_email(coll: &Collection<UserDoc>, email: &str) -> Result<Option<UserDoc>> {
    coll.find_one(doc! { "email": email }, None).await
}

/// Upsert on login/signup. Profile fields are replaced; `role` and
/// `createdAt` are only seeded on first insert and never touched again,
/// so re-login cannot reset an admin back to "user".
pub async fn upsert_profile(
    coll: &Collection<UserDoc>,
    email: &str,
    set: Document,
    now: DateTime<Utc>,
) -> Result<UserDoc> {
    let update = doc! {
        "$set": set,
        "$setOnInsert": {
            "email": email,
            "role": Role::User.as_str(),
            "createdAt": mongodb::bson::DateTime::from_chrono(now),
        },
    };
    let options = FindOneAndUpdateOptions::builder()
        .upsert(true)
        .return_document(ReturnDocument::After)
        .build();
    coll.find_one_and_update(doc! { "email": email }, update, options)
        .await?
        .ok_or_else(|| Error::custom("upsert returned no document"))
}

pub async fn update_profile(
    coll: &Collection<UserDoc>,
    email: &str,
    set: Document,
) -> Result<Option<UserDoc>> {
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    coll.find_one_and_update(doc! { "email": email }, doc! { "$set": set }, options)
        .await
}

pub async fn set_role(
    coll: &Collection<UserDoc>,
    email: &str,
    role: Role,
    now: DateTime<Utc>,
) -> Result<Option<UserDoc>> {
    let options = FindOneAndUpdateOptions::builder()
        .return_document(ReturnDocument::After)
        .build();
    coll.find_one_and_update(
        doc! { "email": email },
        doc! { "$set": {
            "role": role.as_str(),
            "updatedAt": mongodb::bson::DateTime::from_chrono(now),
        } },
        options,
    )
    .await
}

#[async_trait]
impl RoleResolver for AppState {
    async fn is_admin(&self, email: &str) -> anyhow::Result<bool> {
        let user = find_by_email(&self.users, email).await?;
        // Missing user: fail closed.
        Ok(user.map(|u| u.role.is_admin()).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(
            serde_json::from_str::<Role>("\"user\"").unwrap(),
            Role::User
        );
    }

    #[test]
    fn role_from_str_rejects_unknown_values() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("user".parse::<Role>(), Ok(Role::User));
        assert!("superuser".parse::<Role>().is_err());
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn user_doc_defaults_role_to_user_when_absent() {
        let doc = doc! {
            "email": "a@x.com",
            "createdAt": mongodb::bson::DateTime::from_chrono(Utc::now()),
            "updatedAt": mongodb::bson::DateTime::from_chrono(Utc::now()),
        };
        let user: UserDoc = mongodb::bson::from_document(doc).expect("deserialize");
        assert_eq!(user.role, Role::User);
    }

    #[test]
    fn user_doc_preserves_photo_url_casing() {
        let now = Utc::now();
        let user = UserDoc {
            id: None,
            email: "a@x.com".into(),
            name: Some("Ada".into()),
            photo_url: Some("https://img.example/ada.png".into()),
            phone: None,
            location: None,
            bio: None,
            role: Role::User,
            created_at: now,
            updated_at: now,
        };
        let doc = mongodb::bson::to_document(&user).expect("serialize");
        assert!(doc.contains_key("photoURL"));
        assert!(!doc.contains_key("photoUrl"));
    }
}
