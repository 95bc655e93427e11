use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::config::{Settings, DEV_OBJECT_URL_SECRET};
use crate::error::CureError;

/// Signed download links stay valid this long.
pub const SIGNED_URL_TTL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    Expired,
    Invalid,
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), CureError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, CureError>;

    /// Keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, CureError>;

    fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String, CureError>;

    /// Check the token of a link handed out by `signed_url`.
    fn verify_link(&self, bucket: &str, key: &str, token: &str) -> Result<(), LinkError>;
}

fn check_key(key: &str) -> Result<(), CureError> {
    let path = Path::new(key);
    let traversal = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));
    if key.is_empty() || traversal {
        return Err(CureError::Upload(format!("invalid object key: {}", key)));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct LinkClaims {
    /// `{bucket}/{key}`
    sub: String,
    exp: i64,
}

/// Issues and checks the HS256 tokens on download links of one bucket.
#[derive(Clone)]
pub struct LinkSigner {
    public_url: String,
    bucket: String,
    secret: String,
}

impl LinkSigner {
    pub fn new(public_url: &str, bucket: &str, secret: &str) -> Self {
        Self {
            public_url: public_url.to_string(),
            bucket: bucket.to_string(),
            secret: secret.to_string(),
        }
    }

    pub fn sign(&self, key: &str, expires_in: Duration) -> Result<String, CureError> {
        let expires = chrono::Utc::now().timestamp() + expires_in.as_secs() as i64;
        self.sign_until(key, expires)
    }

    fn sign_until(&self, key: &str, expires: i64) -> Result<String, CureError> {
        check_key(key)?;
        let mut url = Url::parse(&self.public_url)
            .map_err(|e| CureError::Upload(format!("invalid public url {}: {}", self.public_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| CureError::Upload(format!("public url {} cannot hold a path", self.public_url)))?
            .pop_if_empty()
            .push(&self.bucket)
            .extend(key.split('/'));
        let claims = LinkClaims {
            sub: format!("{}/{}", self.bucket, key),
            exp: expires,
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CureError::Upload(format!("signing a link to {} failed: {}", key, e)))?;
        url.query_pairs_mut().append_pair("token", &token);
        Ok(url.to_string())
    }

    pub fn verify(&self, bucket: &str, key: &str, token: &str) -> Result<(), LinkError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.sub = Some(format!("{}/{}", bucket, key));
        validation.set_required_spec_claims(&["exp", "sub"]);
        decode::<LinkClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|_| ())
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => LinkError::Expired,
            _ => LinkError::Invalid,
        })
    }
}

/// Objects stored as files under `{root}/{bucket}/{key}`.
pub struct LocalFsStore {
    root: PathBuf,
    bucket: String,
    signer: LinkSigner,
}

impl LocalFsStore {
    pub fn new(root: PathBuf, bucket: &str, public_url: &str, secret: &str) -> Self {
        Self {
            root,
            bucket: bucket.to_string(),
            signer: LinkSigner::new(public_url, bucket, secret),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            PathBuf::from(&settings.object_store_root),
            &settings.object_store_bucket,
            &settings.object_store_public_url,
            &settings.object_url_secret,
        )
    }

    fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, CureError> {
        check_key(key)?;
        Ok(self.bucket_dir().join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    fn backend_tag(&self) -> &'static str {
        "localfs"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), CureError> {
        let path = self.object_path(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CureError::Upload(format!("create {} failed: {}", parent.display(), e)))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| CureError::Upload(format!("write {} failed: {}", key, e)))?;
        log::info!("Stored {} ({})", key, content_type);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, CureError> {
        let path = self.object_path(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(CureError::NotFound(format!("object {} not found", key)))
            }
            Err(e) => Err(CureError::Fetch(format!("read {} failed: {}", key, e))),
        }
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CureError> {
        let base = self.bucket_dir();
        let mut keys = vec![];
        let mut pending = vec![base.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(CureError::Fetch(format!("list {} failed: {}", dir.display(), e))),
            };
            while let Some(entry) = entries
                .next_entry()
                .await
                .map_err(|e| CureError::Fetch(format!("list failed: {}", e)))?
            {
                let path = entry.path();
                let file_type = entry
                    .file_type()
                    .await
                    .map_err(|e| CureError::Fetch(format!("list failed: {}", e)))?;
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }
                if let Ok(relative) = path.strip_prefix(&base) {
                    let key = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy().into_owned())
                        .collect::<Vec<_>>()
                        .join("/");
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String, CureError> {
        self.signer.sign(key, expires_in)
    }

    fn verify_link(&self, bucket: &str, key: &str, token: &str) -> Result<(), LinkError> {
        self.signer.verify(bucket, key, token)
    }
}

/// In-process store, for tests and local runs without a disk.
/// Links are signed for the `memory` bucket with the development secret.
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, (Vec<u8>, String)>>,
    pub fail_puts: bool,
    pub signer: LinkSigner,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            fail_puts: false,
            signer: LinkSigner::new("http://localhost/objects", "memory", DEV_OBJECT_URL_SECRET),
        }
    }
}

impl MemoryStore {
    pub async fn keys(&self) -> Vec<String> {
        self.objects.lock().await.keys().cloned().collect()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), CureError> {
        check_key(key)?;
        if self.fail_puts {
            return Err(CureError::Upload(format!("put {} refused", key)));
        }
        self.objects
            .lock()
            .await
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, CureError> {
        self.objects
            .lock()
            .await
            .get(key)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| CureError::NotFound(format!("object {} not found", key)))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, CureError> {
        Ok(self
            .objects
            .lock()
            .await
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn signed_url(&self, key: &str, expires_in: Duration) -> Result<String, CureError> {
        self.signer.sign(key, expires_in)
    }

    fn verify_link(&self, bucket: &str, key: &str, token: &str) -> Result<(), LinkError> {
        self.signer.verify(bucket, key, token)
    }
}
