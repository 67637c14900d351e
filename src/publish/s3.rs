//! S3-compatible object storage publisher.
//!
//! Objects are written with a single signed `PUT` each. With a custom
//! endpoint, requests and returned URLs are path-style
//! (`{endpoint}/{bucket}/{key}`); otherwise they use the AWS virtual-host
//! form (`https://{bucket}.s3.{region}.amazonaws.com/{key}`).

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use postergrid_common::{ArtifactFormat, Error, Result};
use reqwest::Url;
use tracing::{debug, info, warn};

use super::sigv4::{amz_date, sha256_hex, uri_encode, SignableRequest, Signer};
use super::{published_for, Publisher};
use crate::config::StorageConfig;
use crate::encode::{ArtifactSet, Staging};
use crate::report::{PublishedArtifacts, SkipReason, Stage};

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(120);

pub struct S3Publisher {
    http: reqwest::Client,
    config: StorageConfig,
    signer: Signer,
}

impl S3Publisher {
    pub fn new(config: StorageConfig) -> Result<Self> {
        let missing = config.missing_settings();
        if !missing.is_empty() {
            return Err(Error::config(format!(
                "object storage is missing {}",
                missing.join(", ")
            )));
        }
        let http = reqwest::Client::builder().timeout(UPLOAD_TIMEOUT).build()?;
        let signer = Signer::new(
            config.access_key_id.clone(),
            config.secret_access_key.clone(),
            config.region.clone(),
            "s3",
        );
        Ok(Self {
            http,
            config,
            signer,
        })
    }

    /// `{prefix}/{format}/{stem}.{ext}`, without a prefix when none is set.
    pub fn object_key(&self, stem: &str, format: ArtifactFormat) -> String {
        let name = format!("{}/{stem}.{}", format.dir_name(), format.extension());
        match self.config.prefix() {
            "" => name,
            prefix => format!("{prefix}/{name}"),
        }
    }

    /// Public URL of `key`.
    pub fn object_url(&self, key: &str) -> String {
        let key = uri_encode(key, true);
        match &self.config.endpoint_url {
            Some(endpoint) => format!(
                "{}/{}/{key}",
                endpoint.trim_end_matches('/'),
                self.config.bucket
            ),
            None => format!(
                "https://{}.s3.{}.amazonaws.com/{key}",
                self.config.bucket, self.config.region
            ),
        }
    }

    /// Upload `body` under `key`.
    pub async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
        let url = Url::parse(&self.object_url(key))
            .map_err(|e| Error::upload(format!("invalid storage URL: {e}")))?;
        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(Error::upload(format!("storage URL has no host: {url}"))),
        };

        let payload_hash = sha256_hex(&body);
        let now = Utc::now();
        let mut headers = vec![
            ("host".to_string(), host),
            ("content-type".to_string(), content_type.to_string()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date(&now)),
        ];
        if self.config.public_read {
            headers.push(("x-amz-acl".to_string(), "public-read".to_string()));
        }

        let authorization = self.signer.authorization(
            &SignableRequest {
                method: "PUT",
                canonical_uri: url.path(),
                canonical_query: "",
                headers: &headers,
                payload_hash: &payload_hash,
            },
            &now,
        )?;

        let mut request = self
            .http
            .put(url.clone())
            .header("authorization", authorization);
        for (name, value) in headers.iter().filter(|(name, _)| name != "host") {
            request = request.header(name.as_str(), value.as_str());
        }

        debug!(%url, bytes = body.len(), "PUT object");
        let resp = request.body(body).send().await?;
        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let detail = resp.text().await.unwrap_or_default();
            warn!(status, %url, detail = %detail.trim(), "Storage rejected upload");
            return Err(Error::status(status, url.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Publisher for S3Publisher {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn staging(&self) -> Result<Staging> {
        Staging::temp()
    }

    async fn publish(&self, set: ArtifactSet) -> PublishedArtifacts {
        let mut published = published_for(&set);

        for (format, file) in &set.files {
            let key = self.object_key(&set.stem, *format);
            let result = match tokio::fs::read(&file.path).await {
                Ok(body) => self.put_object(&key, body, format.content_type()).await,
                Err(e) => Err(e.into()),
            };

            match result {
                Ok(()) => {
                    let url = self.object_url(&key);
                    info!(device = %set.device, %url, "Uploaded");
                    published.references.insert(*format, url);
                    if let Err(e) = tokio::fs::remove_file(&file.path).await {
                        warn!(path = %file.path.display(), error = %e, "Could not remove staged file");
                    }
                }
                Err(e) => {
                    warn!(device = %set.device, %key, error = %e, "Error uploading to object storage");
                    published
                        .skips
                        .push(SkipReason::new(Stage::Upload, key, e));
                }
            }
        }

        published
    }
}
