//! 自选股存储
//!
//! 以 JSON 数组持久化到 `<data_dir>/stock-watchlist.json`，
//! 每次变更整体写回；文件缺失或损坏时按空列表加载

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};

use crate::models::WatchlistItem;
use crate::services::stock::validation::sanitize_symbol;

/// 固定的存储名称
pub const WATCHLIST_STORE_NAME: &str = "stock-watchlist";

/// 自选股存储
pub struct WatchlistStore {
    path: PathBuf,
    items: RwLock<Vec<WatchlistItem>>,
}

impl WatchlistStore {
    /// 从目录加载自选股
    pub fn load<P: AsRef<Path>>(dir: P) -> Self {
        let path = dir.as_ref().join(format!("{}.json", WATCHLIST_STORE_NAME));
        let items = read_items(&path);
        log::info!("加载自选股 {} 条（{}）", items.len(), path.display());

        Self {
            path,
            items: RwLock::new(items),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<WatchlistItem>> {
        self.items.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<WatchlistItem>> {
        self.items.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 存储文件路径
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 全部自选股，按加入顺序
    pub fn list(&self) -> Vec<WatchlistItem> {
        self.read().clone()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        let symbol = sanitize_symbol(symbol);
        self.read().iter().any(|item| item.symbol == symbol)
    }

    /// 加入自选股，已存在时不做任何修改并返回 false
    pub fn add(&self, symbol: &str, name: &str) -> Result<bool> {
        let symbol = sanitize_symbol(symbol);
        let mut items = self.write();
        if items.iter().any(|item| item.symbol == symbol) {
            return Ok(false);
        }

        let mut updated = items.clone();
        updated.push(WatchlistItem {
            symbol,
            name: name.trim().to_string(),
            added_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        });
        self.persist(&updated)?;
        *items = updated;
        Ok(true)
    }

    /// 移除自选股，不存在时返回 false
    pub fn remove(&self, symbol: &str) -> Result<bool> {
        let symbol = sanitize_symbol(symbol);
        let mut items = self.write();
        let updated: Vec<WatchlistItem> = items
            .iter()
            .filter(|item| item.symbol != symbol)
            .cloned()
            .collect();
        if updated.len() == items.len() {
            return Ok(false);
        }

        self.persist(&updated)?;
        *items = updated;
        Ok(true)
    }

    /// 清空自选股
    pub fn clear(&self) -> Result<()> {
        let mut items = self.write();
        self.persist(&[])?;
        items.clear();
        Ok(())
    }

    /// 写入临时文件后替换，避免写到一半的文件
    fn persist(&self, items: &[WatchlistItem]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir).with_context(|| format!("创建目录 {} 失败", dir.display()))?;
        }

        let content = serde_json::to_string_pretty(items)?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, content).with_context(|| format!("写入 {} 失败", tmp.display()))?;
        fs::rename(&tmp, &self.path).with_context(|| format!("保存 {} 失败", self.path.display()))?;

        log::debug!("自选股已保存: {} 条", items.len());
        Ok(())
    }
}

fn read_items(path: &Path) -> Vec<WatchlistItem> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            log::warn!("自选股文件 {} 无法读取，使用空列表: {}", path.display(), e);
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<WatchlistItem>>(&content) {
        Ok(items) => dedup_by_symbol(items),
        Err(e) => {
            log::warn!("自选股文件 {} 已损坏，使用空列表: {}", path.display(), e);
            Vec::new()
        }
    }
}

/// 保留每个代码第一次出现的条目
fn dedup_by_symbol(items: Vec<WatchlistItem>) -> Vec<WatchlistItem> {
    let mut result: Vec<WatchlistItem> = Vec::with_capacity(items.len());
    for item in items {
        if !result.iter().any(|existing| existing.symbol == item.symbol) {
            result.push(item);
        }
    }
    result
}

// ==================== 测试模块 ====================
