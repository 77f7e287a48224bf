//! 本地持久化的显示名称。
//!
//! 显示名称只保存在客户端，服务端不做任何校验，不等同于身份认证。

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use contest_core::domain::{ContestId, DomainError, Username};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{Result, SyncError};

const IDENTITY_FILE: &str = "identity.json";
const APP_DIR: &str = "contest-sync";

/// 客户端本地键值存储，只保存一个显示名称。
#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn load(&self) -> Result<Option<Username>>;

    async fn save(&self, username: &Username) -> Result<()>;
}

#[derive(Debug, Serialize, Deserialize)]
struct IdentityRecord {
    username: String,
}

/// 保存在 JSON 文件中的显示名称。
#[derive(Debug, Clone)]
pub struct FileIdentityStore {
    path: PathBuf,
}

impl FileIdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 使用平台配置目录下的默认位置。
    pub fn in_config_dir() -> Result<Self> {
        let base = dirs::config_dir().ok_or_else(|| {
            SyncError::Identity("no config directory on this platform".to_string())
        })?;
        Ok(Self::new(base.join(APP_DIR).join(IDENTITY_FILE)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl IdentityStore for FileIdentityStore {
    async fn load(&self) -> Result<Option<Username>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored identity");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        };

        let record: IdentityRecord = serde_json::from_str(&content)?;
        match Username::new(record.username) {
            Ok(username) => Ok(Some(username)),
            Err(DomainError::EmptyUsername) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    async fn save(&self, username: &Username) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let record = IdentityRecord {
            username: username.as_str().to_string(),
        };
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&record)?).await?;
        info!(path = %self.path.display(), "stored display name");
        Ok(())
    }
}

/// 仅存在于内存中的存储，用于测试和无持久化环境。
#[derive(Debug, Default)]
pub struct MemoryIdentityStore {
    username: RwLock<Option<Username>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_username(username: Username) -> Self {
        Self {
            username: RwLock::new(Some(username)),
        }
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn load(&self) -> Result<Option<Username>> {
        Ok(self.username.read().await.clone())
    }

    async fn save(&self, username: &Username) -> Result<()> {
        *self.username.write().await = Some(username.clone());
        Ok(())
    }
}

/// 加入比赛：校验比赛 ID 与用户名，并保存用户名。
pub async fn join_contest(
    store: &dyn IdentityStore,
    contest_id: &str,
    username: &str,
) -> Result<(ContestId, Username)> {
    let contest_id = contest_id.trim();
    if contest_id.is_empty() {
        return Err(DomainError::EmptyContestId.into());
    }
    let username = Username::new(username)?;
    store.save(&username).await?;
    info!(contest_id, username = %username, "joined contest");
    Ok((ContestId::from(contest_id), username))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("contest-sync-test-{}-{name}", std::process::id()))
            .join(IDENTITY_FILE)
    }

    #[tokio::test]
    async fn file_store_roundtrip() {
        let path = temp_path("roundtrip");
        let store = FileIdentityStore::new(&path);

        assert!(store.load().await.expect("missing file is not an error").is_none());

        let username = Username::new("alice").expect("valid username");
        store.save(&username).await.expect("save should succeed");

        let loaded = FileIdentityStore::new(&path)
            .load()
            .await
            .expect("load should succeed");
        assert_eq!(loaded, Some(username));

        let _ = std::fs::remove_dir_all(path.parent().expect("temp dir"));
    }

    #[tokio::test]
    async fn join_persists_trimmed_username() {
        let store = MemoryIdentityStore::new();

        let (contest_id, username) = join_contest(&store, " contest-1 ", " bob ")
            .await
            .expect("join should succeed");

        assert_eq!(contest_id.as_str(), "contest-1");
        assert_eq!(username.as_str(), "bob");
        assert_eq!(store.load().await.expect("load"), Some(username));
    }

    #[tokio::test]
    async fn join_rejects_blank_fields_without_saving() {
        let store = MemoryIdentityStore::new();

        let err = join_contest(&store, "contest-1", "   ")
            .await
            .expect_err("blank username should be rejected");
        assert!(matches!(err, SyncError::Domain(DomainError::EmptyUsername)));

        let err = join_contest(&store, "", "alice")
            .await
            .expect_err("blank contest should be rejected");
        assert!(matches!(err, SyncError::Domain(DomainError::EmptyContestId)));

        assert!(store.load().await.expect("load").is_none());
    }
}
