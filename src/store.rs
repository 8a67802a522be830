//! Object-store capabilities consumed by reconciliation.
//!
//! The checker and remediator never talk to a concrete cloud API; they
//! see an existence/upload capability on the target store and a
//! download capability on the legacy store. The HTTP adapters below are
//! the production implementations; tests substitute in-memory fakes.

use std::io::Read;
use std::sync::Arc;

use tracing::debug;
use url::Url;

use crate::{Error, Result};

/// Target-store capability, keyed `"<owner>/<repo>/<oid>"`.
pub trait ObjectStore {
    fn exists(&self, key: &str) -> Result<bool>;
    fn upload(&self, key: &str, bytes: &[u8]) -> Result<()>;
    /// Store name for log output.
    fn name(&self) -> &str;
}

/// Legacy-store capability, keyed `"data/<oid>"`.
pub trait LegacyStore {
    fn download(&self, key: &str) -> Result<Vec<u8>>;
    /// Store name for log output.
    fn name(&self) -> &str;
}

/// Authentication method for store requests.
#[derive(Clone)]
enum Auth {
    /// Bearer token (OAuth/service-account)
    Bearer(String),
    /// Basic auth (username, password)
    Basic(String, String),
}

impl Auth {
    fn header(&self) -> String {
        match self {
            Auth::Bearer(token) => format!("Bearer {}", token),
            Auth::Basic(username, password) => {
                let credentials = format!("{}:{}", username, password);
                let encoded = base64::Engine::encode(
                    &base64::engine::general_purpose::STANDARD,
                    credentials.as_bytes(),
                );
                format!("Basic {}", encoded)
            }
        }
    }
}

/// GCS bucket adapter over the JSON API.
///
/// This type is cheaply cloneable - clones share the same underlying
/// HTTP agent and configuration.
#[derive(Clone)]
pub struct GcsBucket {
    inner: Arc<GcsBucketInner>,
}

struct GcsBucketInner {
    project: String,
    bucket: String,
    agent: ureq::Agent,
    auth: Option<Auth>,
}

impl GcsBucket {
    pub fn new(project: &str, bucket: &str) -> Self {
        GcsBucket {
            inner: Arc::new(GcsBucketInner {
                project: project.to_string(),
                bucket: bucket.to_string(),
                agent: ureq::Agent::new(),
                auth: None,
            }),
        }
    }

    /// Set authentication from a bearer token.
    pub fn with_token(self, token: &str) -> Self {
        GcsBucket {
            inner: Arc::new(GcsBucketInner {
                project: self.inner.project.clone(),
                bucket: self.inner.bucket.clone(),
                agent: ureq::Agent::new(),
                auth: Some(Auth::Bearer(token.to_string())),
            }),
        }
    }

    /// Metadata URL for one object; a GET here is the existence probe.
    fn object_url(&self, key: &str) -> String {
        format!(
            "https://storage.googleapis.com/storage/v1/b/{}/o/{}",
            self.inner.bucket,
            encode_object_name(key)
        )
    }

    fn upload_url(&self, key: &str) -> String {
        format!(
            "https://storage.googleapis.com/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.inner.bucket,
            encode_object_name(key)
        )
    }
}

impl ObjectStore for GcsBucket {
    fn exists(&self, key: &str) -> Result<bool> {
        debug!(
            "checking bucket {} (project {}) for object {}",
            self.inner.bucket, self.inner.project, key
        );
        let mut req = self.inner.agent.get(&self.object_url(key));
        if let Some(auth) = &self.inner.auth {
            req = req.set("Authorization", &auth.header());
        }
        match req.call() {
            Ok(_) => Ok(true),
            Err(ureq::Error::Status(404, _)) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn upload(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut req = self
            .inner
            .agent
            .post(&self.upload_url(key))
            .set("Content-Type", "application/octet-stream")
            .set("Content-Length", &bytes.len().to_string());
        if let Some(auth) = &self.inner.auth {
            req = req.set("Authorization", &auth.header());
        }
        req.send_bytes(bytes)?;
        Ok(())
    }

    fn name(&self) -> &str {
        &self.inner.bucket
    }
}

/// S3 bucket adapter for the legacy store, virtual-hosted-style URLs.
///
/// The legacy layout is read-only here, so only download is exposed.
#[derive(Clone)]
pub struct S3Bucket {
    inner: Arc<S3BucketInner>,
}

struct S3BucketInner {
    bucket: String,
    base: Url,
    agent: ureq::Agent,
    auth: Option<Auth>,
}

impl S3Bucket {
    pub fn new(bucket: &str) -> Result<Self> {
        let base = Url::parse(&format!("https://{}.s3.amazonaws.com/", bucket))?;
        Ok(S3Bucket {
            inner: Arc::new(S3BucketInner {
                bucket: bucket.to_string(),
                base,
                agent: ureq::Agent::new(),
                auth: None,
            }),
        })
    }

    /// Set basic authentication credentials.
    pub fn with_auth(self, username: &str, password: &str) -> Result<Self> {
        Ok(S3Bucket {
            inner: Arc::new(S3BucketInner {
                bucket: self.inner.bucket.clone(),
                base: self.inner.base.clone(),
                agent: ureq::Agent::new(),
                auth: Some(Auth::Basic(username.to_string(), password.to_string())),
            }),
        })
    }
}

impl LegacyStore for S3Bucket {
    fn download(&self, key: &str) -> Result<Vec<u8>> {
        let url = self.inner.base.join(key)?;
        debug!("downloading {} from bucket {}", key, self.inner.bucket);
        let mut req = self.inner.agent.get(url.as_str());
        if let Some(auth) = &self.inner.auth {
            req = req.set("Authorization", &auth.header());
        }
        let response = match req.call() {
            Ok(response) => response,
            Err(ureq::Error::Status(404, _)) => {
                return Err(Error::NotFound(key.to_string()));
            }
            Err(err) => return Err(err.into()),
        };
        let mut content = Vec::new();
        response.into_reader().read_to_end(&mut content)?;
        Ok(content)
    }

    fn name(&self) -> &str {
        &self.inner.bucket
    }
}

/// Percent-encode an object name for use as one URL path segment.
///
/// Store keys contain `/`, which must travel as `%2F` in the JSON API.
fn encode_object_name(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    for b in key.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char);
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    out
}
