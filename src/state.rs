use std::sync::Arc;

use anyhow::Context;
use mongodb::{options::ClientOptions, Client, Collection};

use crate::config::AppConfig;
use crate::jobs::repo::JobDoc;
use crate::users::repo::UserDoc;

/// Shared handles built once at startup and cloned into every request.
#[derive(Clone)]
pub struct AppState {
    pub jobs: Collection<JobDoc>,
    pub users: Collection<UserDoc>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let client = connect(&config).await?;
        Ok(Self::from_parts(&client, config))
    }

    pub fn from_parts(client: &Client, config: Arc<AppConfig>) -> Self {
        let db = client.database(&config.mongo.database);
        Self {
            jobs: db.collection("jobs"),
            users: db.collection("users"),
            config,
        }
    }
}

async fn connect(config: &AppConfig) -> anyhow::Result<Client> {
    let mut options = ClientOptions::parse(&config.mongo.uri)
        .await
        .context("parse MONGO_URI")?;
    options.app_name = Some("freelance-portal".into());
    options.connect_timeout = Some(config.mongo.timeout);
    options.server_selection_timeout = Some(config.mongo.timeout);
    Client::with_options(options).context("build mongo client")
}
