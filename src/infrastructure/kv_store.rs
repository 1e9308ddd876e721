//! 键值存储 - 基础设施层
//!
//! 每个键整体读、整体写，不做局部更新，后写者覆盖先写者

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::fs;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 存储键
pub mod keys {
    pub const USER_DATA: &str = "userData";
    pub const FORM_ANSWERS: &str = "formAnswers";
    pub const SUCCESSFUL_APPS: &str = "successfulApps";
    pub const IS_AUTO_RUNNING: &str = "isAutoRunning";
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>>;
    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()>;
}

/// 读取并反序列化一个键
pub async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> AppResult<Option<T>> {
    match store.get(key).await? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| AppError::storage(key, e)),
    }
}

/// 序列化并写入一个键
pub async fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> AppResult<()> {
    let json = serde_json::to_value(value).map_err(|e| AppError::storage(key, e))?;
    store.set(key, json).await
}

/// 单个 JSON 文件作为存储
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_all(&self) -> AppResult<Map<String, JsonValue>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(AppError::storage(self.path.display().to_string(), e)),
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| AppError::storage(self.path.display().to_string(), e))
    }
}

#[async_trait]
impl KeyValueStore for JsonFileStore {
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        Ok(all.remove(key))
    }

    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
        let _guard = self.lock.lock().await;
        let mut all = self.read_all().await?;
        all.insert(key.to_string(), value);

        // 先写临时文件再改名，避免写到一半时进程退出留下损坏的文件
        let tmp = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(&all)?;
        fs::write(&tmp, content)
            .await
            .map_err(|e| AppError::storage(key, e))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::storage(key, e))?;
        debug!("存储已写入: {}", key);
        Ok(())
    }
}

/// 内存存储
#[derive(Default)]
pub struct MemoryStore {
    data: Mutex<HashMap<String, JsonValue>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> AppResult<Option<JsonValue>> {
        Ok(self.data.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> AppResult<()> {
        self.data.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio_test::assert_ok;

    fn temp_store_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "job_auto_apply_{}_{}.json",
            name,
            std::process::id()
        ))
    }

    #[tokio::test]
    async fn test_file_store_round_trips_whole_values() {
        let path = temp_store_path("round_trip");
        let _ = std::fs::remove_file(&path);
        let store = JsonFileStore::new(&path);

        assert_eq!(assert_ok!(store.get(keys::FORM_ANSWERS).await), None);

        assert_ok!(store.set(keys::FORM_ANSWERS, json!({"Phone": "123"})).await);
        assert_ok!(store.set(keys::IS_AUTO_RUNNING, json!(true)).await);

        let reopened = JsonFileStore::new(&path);
        let answers: Option<HashMap<String, String>> =
            assert_ok!(load(&reopened, keys::FORM_ANSWERS).await);
        assert_eq!(answers.unwrap().get("Phone").map(String::as_str), Some("123"));
        assert_eq!(
            assert_ok!(reopened.get(keys::IS_AUTO_RUNNING).await),
            Some(json!(true))
        );

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_storage_error() {
        let path = temp_store_path("corrupt");
        std::fs::write(&path, "{ not json").unwrap();
        let store = JsonFileStore::new(&path);

        let err = store.get(keys::USER_DATA).await.unwrap_err();
        assert!(matches!(err, AppError::Storage { .. }));

        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_load_with_wrong_shape_is_storage_error() {
        let store = MemoryStore::new();
        store.set(keys::FORM_ANSWERS, json!([1, 2, 3])).await.unwrap();

        let result: AppResult<Option<HashMap<String, String>>> =
            load(&store, keys::FORM_ANSWERS).await;
        assert!(matches!(result, Err(AppError::Storage { .. })));
    }
}
