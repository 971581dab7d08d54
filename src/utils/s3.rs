use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_config::ConfigLoader;
use aws_types::region::Region;
use aws_config::BehaviorVersion;
use log::error;

use crate::photos::{PhotoStorage, StorageError};

pub async fn create_s3_client(region: Option<String>) -> S3Client {
    let aws_config = ConfigLoader::default()
        .region(region.map(Region::new))
        .behavior_version(BehaviorVersion::latest())
        .load()
        .await;

    S3Client::new(&aws_config)
}

/// Photo storage backed by a public-read S3 bucket.
pub struct S3PhotoStorage {
    client: S3Client,
    bucket: String,
}

impl S3PhotoStorage {
    pub fn new(client: S3Client, bucket: String) -> Self {
        S3PhotoStorage { client, bucket }
    }

    pub fn public_uri(&self, key: &str) -> String {
        format!("https://{}.s3.amazonaws.com/{}", self.bucket, key)
    }
}

#[async_trait]
impl PhotoStorage for S3PhotoStorage {
    async fn upload(
        &self,
        data: Vec<u8>,
        suggested_name: &str,
        content_type: &str,
    ) -> Result<String, StorageError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(suggested_name)
            .content_type(content_type)
            .body(data.into())
            .send()
            .await
            .map_err(|err| {
                error!("S3 upload of {} failed: {:?}", suggested_name, err);
                StorageError::Upload(err.to_string())
            })?;

        Ok(self.public_uri(suggested_name))
    }
}
