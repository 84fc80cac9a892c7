//! S3 implementation of [`ResultStore`]

use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;

use super::{ObjectSummary, ResultStore};
use crate::error::{HandlerError, Result};

const LIST_OBJECTS: &str = "s3:ListObjectsV2";
const GET_OBJECT: &str = "s3:GetObject";

/// Result store reading the bucket the filesystem exports into
#[derive(Debug, Clone)]
pub struct S3ResultStore {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ResultStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }
}

#[async_trait]
impl ResultStore for S3ResultStore {
    async fn list_objects(&self, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .send();

        let mut objects = Vec::new();
        while let Some(page) = pages.next().await {
            let page = page.map_err(|error| {
                HandlerError::external(LIST_OBJECTS, DisplayErrorContext(&error).to_string())
            })?;
            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                let size = object.size().unwrap_or(0).max(0) as u64;
                objects.push(ObjectSummary::new(key, size));
            }
        }
        Ok(objects)
    }

    async fn read_object(&self, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|error| {
                HandlerError::external(GET_OBJECT, DisplayErrorContext(&error).to_string())
            })?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|error| HandlerError::external(GET_OBJECT, error.to_string()))?;
        Ok(body.into_bytes().to_vec())
    }
}
