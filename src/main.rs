mod config;
mod db;
mod errors;
mod handlers;
mod models;
mod photos;
mod services;
mod store;
mod utils;

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use log::{info, warn};

use crate::config::AppConfig;
use crate::photos::{PhotoStorage, UnconfiguredPhotoStorage};
use crate::services::directory::DirectoryManager;
use crate::services::verification::VerificationResolver;
use crate::store::memory::MemoryStore;
use crate::store::{AdminStore, RecordStore};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = AppConfig::from_env()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err))?;

    let (records, admins): (Arc<dyn RecordStore>, Arc<dyn AdminStore>) = match &config.database_url {
        Some(database_url) => {
            let pool = db::create_pool(database_url)
                .await
                .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err))?;
            let store = Arc::new(db::PgStore::new(pool));
            let records: Arc<dyn RecordStore> = store.clone();
            let admins: Arc<dyn AdminStore> = store;
            (records, admins)
        }
        None => {
            warn!("DATABASE_URL not set; records are kept in memory and lost on restart");
            let store = Arc::new(MemoryStore::new());
            let records: Arc<dyn RecordStore> = store.clone();
            let admins: Arc<dyn AdminStore> = store;
            (records, admins)
        }
    };

    let photos: Arc<dyn PhotoStorage> = match &config.photo_bucket {
        Some(bucket) => {
            let client = utils::s3::create_s3_client(config.aws_region.clone()).await;
            Arc::new(utils::s3::S3PhotoStorage::new(client, bucket.clone()))
        }
        None => {
            warn!("AWS_S3_BUCKET not set; photo uploads will be refused");
            Arc::new(UnconfiguredPhotoStorage)
        }
    };

    let directory = web::Data::new(DirectoryManager::new(
        records.clone(),
        photos,
        config.verification_base_url.clone(),
        config.photo_max_bytes,
    ));
    let resolver = web::Data::new(VerificationResolver::new(records));
    let admins = web::Data::new(admins);
    let bind_addr = config.bind_addr.clone();
    let config = web::Data::new(config);

    info!("Starting server at {}", bind_addr);
    info!("Verification links point at {}", config.verification_base_url);

    HttpServer::new(move || {
        App::new()
            .app_data(config.clone())
            .app_data(directory.clone())
            .app_data(resolver.clone())
            .app_data(admins.clone())
            .configure(handlers::configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
