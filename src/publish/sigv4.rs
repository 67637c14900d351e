//! AWS Signature Version 4 request signing for S3-compatible stores.
//!
//! Only header-based signing is implemented. The caller supplies every header
//! it wants signed, including `host`, `x-amz-date` and
//! `x-amz-content-sha256`.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use postergrid_common::{Error, Result};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Hex SHA-256 of an empty payload.
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// `x-amz-date` value for `time`.
pub fn amz_date(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%dT%H%M%SZ").to_string()
}

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Percent-encode everything except unreserved characters, and `/` when
/// `keep_slash` is set (object key paths).
pub fn uri_encode(input: &str, keep_slash: bool) -> String {
    if keep_slash {
        input
            .split('/')
            .map(urlencoding::encode)
            .collect::<Vec<_>>()
            .join("/")
    } else {
        urlencoding::encode(input).into_owned()
    }
}

/// A request as seen by the signer.
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    /// Already URI-encoded absolute path.
    pub canonical_uri: &'a str,
    /// Already encoded and sorted query string, or empty.
    pub canonical_query: &'a str,
    /// Headers to sign, in any order and case.
    pub headers: &'a [(String, String)],
    /// Hex SHA-256 of the body.
    pub payload_hash: &'a str,
}

#[derive(Clone)]
pub struct Signer {
    access_key_id: String,
    secret_access_key: String,
    region: String,
    service: String,
}

impl std::fmt::Debug for Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signer")
            .field("access_key_id", &self.access_key_id)
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

impl Signer {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    /// Canonical request text and the `SignedHeaders` list.
    pub fn canonical_request(&self, req: &SignableRequest<'_>) -> (String, String) {
        let mut headers: Vec<(String, String)> = req
            .headers
            .iter()
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), collapse_spaces(v)))
            .collect();
        headers.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{k}:{v}\n"))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            req.method,
            req.canonical_uri,
            req.canonical_query,
            canonical_headers,
            signed_headers,
            req.payload_hash
        );
        (canonical, signed_headers)
    }

    fn scope(&self, date: &str) -> String {
        format!("{date}/{}/{}/aws4_request", self.region, self.service)
    }

    pub fn string_to_sign(&self, canonical_request: &str, time: &DateTime<Utc>) -> String {
        let date = time.format("%Y%m%d").to_string();
        format!(
            "{ALGORITHM}\n{}\n{}\n{}",
            amz_date(time),
            self.scope(&date),
            sha256_hex(canonical_request.as_bytes())
        )
    }

    fn signing_key(&self, date: &str) -> Result<Vec<u8>> {
        let secret = format!("AWS4{}", self.secret_access_key);
        let k_date = hmac(secret.as_bytes(), date.as_bytes())?;
        let k_region = hmac(&k_date, self.region.as_bytes())?;
        let k_service = hmac(&k_region, self.service.as_bytes())?;
        hmac(&k_service, b"aws4_request")
    }

    /// Hex signature for `req` at `time`.
    pub fn signature(&self, req: &SignableRequest<'_>, time: &DateTime<Utc>) -> Result<String> {
        let (canonical, _) = self.canonical_request(req);
        let to_sign = self.string_to_sign(&canonical, time);
        let date = time.format("%Y%m%d").to_string();
        let key = self.signing_key(&date)?;
        Ok(hex::encode(hmac(&key, to_sign.as_bytes())?))
    }

    /// Value of the `Authorization` header for `req` at `time`.
    pub fn authorization(&self, req: &SignableRequest<'_>, time: &DateTime<Utc>) -> Result<String> {
        let (_, signed_headers) = self.canonical_request(req);
        let signature = self.signature(req, time)?;
        let date = time.format("%Y%m%d").to_string();
        Ok(format!(
            "{ALGORITHM} Credential={}/{}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id,
            self.scope(&date)
        ))
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| Error::internal(format!("HMAC key rejected: {e}")))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn collapse_spaces(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
