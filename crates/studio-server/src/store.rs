//! Generated portraits on disk.
//!
//! Portraits live under `{media_dir}/avatars/{id}.{ext}` and are served at
//! `/media/avatars/...`. The id doubles as the `image_ref` of the video step.

use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use studio_types::ImageMediaType;
use uuid::Uuid;

const AVATAR_DIR: &str = "avatars";
const MAX_SLUG_CHARS: usize = 32;

/// Lowercase ASCII slug of a presenter name, `avatar` if nothing is left.
pub fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
        if out.len() >= MAX_SLUG_CHARS {
            break;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "avatar".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Builds a fresh avatar id: `avatar_{slug}_{8 hex chars}`.
pub fn new_avatar_id(name: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("avatar_{}_{}", slug(name), &suffix[..8])
}

/// Returns `true` for ids this store could have issued.
///
/// Rejects anything that could escape the avatar directory.
pub fn is_valid_avatar_id(id: &str) -> bool {
    id.starts_with("avatar_")
        && id.len() <= 64
        && id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// A portrait found on disk, as listed by `GET /avatar/avatars`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAvatar {
    pub id: String,
    pub image_url: String,
    pub mime_type: &'static str,
    pub bytes: u64,
    /// Unix seconds of the last write.
    pub modified_at: u64,
}

/// A portrait file and its metadata.
struct Entry {
    path: PathBuf,
    file_name: String,
    id: String,
    media_type: ImageMediaType,
    metadata: std::fs::Metadata,
}

/// Portrait storage rooted at the media directory.
#[derive(Debug, Clone)]
pub struct AvatarStore {
    root: PathBuf,
}

impl AvatarStore {
    pub fn new(media_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: media_dir.into(),
        }
    }

    pub fn media_dir(&self) -> &Path {
        &self.root
    }

    fn avatar_dir(&self) -> PathBuf {
        self.root.join(AVATAR_DIR)
    }

    /// Writes a portrait and returns its public URL path.
    pub async fn save(
        &self,
        id: &str,
        data: &[u8],
        media_type: ImageMediaType,
    ) -> std::io::Result<String> {
        let dir = self.avatar_dir();
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!("{}.{}", id, media_type.extension());
        tokio::fs::write(dir.join(&file_name), data).await?;

        tracing::info!(avatar_id = %id, bytes = data.len(), "portrait stored");
        Ok(format!("/media/{}/{}", AVATAR_DIR, file_name))
    }

    /// Loads a stored portrait by id.
    ///
    /// Returns `Ok(None)` for unknown or malformed ids.
    pub async fn load(&self, id: &str) -> std::io::Result<Option<(Bytes, ImageMediaType)>> {
        if !is_valid_avatar_id(id) {
            return Ok(None);
        }
        let dir = self.avatar_dir();
        for media_type in [ImageMediaType::Png, ImageMediaType::Jpeg, ImageMediaType::Webp] {
            let path = dir.join(format!("{}.{}", id, media_type.extension()));
            match tokio::fs::read(&path).await {
                Ok(data) => return Ok(Some((Bytes::from(data), media_type))),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Portrait files in the avatar directory. Anything else there is
    /// skipped.
    async fn entries(&self) -> std::io::Result<Vec<Entry>> {
        let mut dir = match tokio::fs::read_dir(self.avatar_dir()).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let (Some(stem), Some(ext)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.extension().and_then(|e| e.to_str()),
            ) else {
                continue;
            };
            let Some(media_type) = ImageMediaType::from_extension(ext) else {
                continue;
            };
            if !is_valid_avatar_id(stem) {
                continue;
            }
            let metadata = match entry.metadata().await {
                Ok(metadata) if metadata.is_file() => metadata,
                Ok(_) => continue,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            entries.push(Entry {
                id: stem.to_string(),
                file_name: format!("{}.{}", stem, ext),
                path,
                media_type,
                metadata,
            });
        }
        Ok(entries)
    }

    /// Lists stored portraits, newest first.
    pub async fn list(&self) -> std::io::Result<Vec<StoredAvatar>> {
        let mut avatars: Vec<StoredAvatar> = self
            .entries()
            .await?
            .into_iter()
            .map(|entry| {
                StoredAvatar {
                    image_url: format!("/media/{}/{}", AVATAR_DIR, entry.file_name),
                    id: entry.id,
                    mime_type: entry.media_type.as_str(),
                    bytes: entry.metadata.len(),
                    modified_at: entry
                        .metadata
                        .modified()
                        .ok()
                        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                        .map_or(0, |d| d.as_secs()),
                }
            })
            .collect();
        avatars.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then_with(|| a.id.cmp(&b.id)));
        Ok(avatars)
    }

    /// Deletes portraits last written more than `max_age` ago and returns
    /// how many were removed.
    pub async fn remove_older_than(&self, max_age: Duration) -> std::io::Result<usize> {
        let Some(cutoff) = SystemTime::now().checked_sub(max_age) else {
            return Ok(0);
        };

        let mut removed = 0;
        for entry in self.entries().await? {
            let Ok(modified) = entry.metadata.modified() else {
                continue;
            };
            if modified >= cutoff {
                continue;
            }
            match tokio::fs::remove_file(&entry.path).await {
                Ok(()) => {
                    tracing::debug!(avatar_id = %entry.id, "expired portrait removed");
                    removed += 1;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e),
            }
        }
        Ok(removed)
    }
}
