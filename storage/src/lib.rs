//storage holds the MongoDB schema & async CRUD for finished flood runs

pub mod models;

use crate::models::FloodRunDoc;
use bson::doc;
use futures_util::stream::TryStreamExt;
use mongodb::{Client, Collection, IndexModel, options::ClientOptions, options::IndexOptions};
use tracing::{debug, info};

pub struct FloodRunStore {
    col: Collection<FloodRunDoc>,
}

impl FloodRunStore {
    // Initialize the MongoDB collection
    pub async fn init(uri: &str, db_name: &str, col_name: &str) -> mongodb::error::Result<Self> {
        let mut opts = ClientOptions::parse(uri).await?;
        opts.app_name = Some("FloodMap".to_string());
        let client = Client::with_options(opts)?;
        let col = client.database(db_name).collection(col_name);

        // One run per name
        let index_model = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(Some(IndexOptions::builder().unique(true).build()))
            .build();
        col.create_index(index_model).await?;
        debug!(db_name, col_name, "flood run collection ready");

        Ok(Self { col })
    }

    pub async fn list_names(&self) -> mongodb::error::Result<Vec<String>> {
        let mut cursor = self.col.find(doc! {}).await?;
        let mut names = Vec::new();
        while let Some(doc) = cursor.try_next().await? {
            names.push(doc.name);
        }
        Ok(names)
    }

    pub async fn read_by_name(&self, name: &str) -> mongodb::error::Result<Option<FloodRunDoc>> {
        self.col.find_one(doc! { "name": name }).await
    }

    // Insert a run, replacing any earlier run stored under the same name
    pub async fn create(&self, run: FloodRunDoc) -> mongodb::error::Result<()> {
        let deleted = self.col.delete_one(doc! { "name": &run.name }).await?;
        if deleted.deleted_count > 0 {
            debug!(name = %run.name, "replacing stored flood run");
        }
        let name = run.name.clone();
        self.col.insert_one(run).await?;
        info!(%name, "flood run stored");
        Ok(())
    }

    pub async fn delete_by_name(&self, name: &str) -> mongodb::error::Result<()> {
        self.col.delete_one(doc! { "name": name }).await?;
        Ok(())
    }
}
