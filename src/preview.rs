//! プレビューモジュール
//!
//! 選択中の写真を表示用の一時ファイルとして書き出す。
//! ハンドルは同時に1つだけ。差し替えは必ず `PreviewSlot::replace` 経由で行い、
//! 旧ハンドルを先に解放する。

use crate::error::Result;
use autosafe_common::{FileId, Selection};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const PREVIEW_PREFIX: &str = "preview-";

/// プレビューファイルへの参照（解放可能）
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    file_id: FileId,
    path: PathBuf,
}

impl PreviewHandle {
    pub fn file_id(&self) -> FileId {
        self.file_id
    }

    /// 表示用ファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }
}

const STORE_PREFIX: &str = "autosafe-preview";

/// プレビューファイルの置き場
///
/// ストアごとに専用ディレクトリを持つ（破棄時に削除）。同じ親を共有しても
/// `FileId` の衝突で互いのファイルを上書きしない。
pub struct PreviewStore {
    root: TempDir,
}

impl PreviewStore {
    /// OSの一時ディレクトリ配下に専用ディレクトリを作る
    pub fn temporary() -> Result<Self> {
        let root = tempfile::Builder::new().prefix(STORE_PREFIX).tempdir()?;
        Ok(Self { root })
    }

    /// 指定ディレクトリ配下に専用ディレクトリを作る
    pub fn in_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let root = tempfile::Builder::new().prefix(STORE_PREFIX).tempdir_in(dir)?;
        Ok(Self { root })
    }

    pub fn dir(&self) -> &Path {
        self.root.path()
    }

    fn acquire(&self, selection: &Selection) -> Result<PreviewHandle> {
        let name = format!(
            "{}{}.{}",
            PREVIEW_PREFIX,
            selection.id.0,
            selection.file.extension()
        );
        let path = self.dir().join(name);
        fs::write(&path, &selection.file.bytes)?;
        debug!(path = %path.display(), "preview: acquired");

        Ok(PreviewHandle {
            file_id: selection.id,
            path,
        })
    }

    fn release(&self, handle: PreviewHandle) {
        match fs::remove_file(&handle.path) {
            Ok(()) => debug!(path = %handle.path.display(), "preview: released"),
            Err(e) => warn!(path = %handle.path.display(), error = %e, "preview: release failed"),
        }
    }

    /// 現存するプレビューファイル数
    pub fn live_handles(&self) -> usize {
        fs::read_dir(self.dir())
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.file_name().to_string_lossy().starts_with(PREVIEW_PREFIX))
                    .count()
            })
            .unwrap_or(0)
    }
}

/// 唯一のプレビューハンドルを保持するスロット
pub struct PreviewSlot {
    store: PreviewStore,
    current: Option<PreviewHandle>,
}

impl PreviewSlot {
    pub fn new(store: PreviewStore) -> Self {
        Self {
            store,
            current: None,
        }
    }

    pub fn current(&self) -> Option<&PreviewHandle> {
        self.current.as_ref()
    }

    pub fn store(&self) -> &PreviewStore {
        &self.store
    }

    /// 旧ハンドルを解放してから、Some なら新しいハンドルを取得
    pub fn replace(&mut self, selection: Option<&Selection>) -> Result<()> {
        if let Some(old) = self.current.take() {
            self.store.release(old);
        }

        if let Some(selection) = selection {
            self.current = Some(self.store.acquire(selection)?);
        }
        Ok(())
    }
}

impl Drop for PreviewSlot {
    fn drop(&mut self) {
        if let Some(handle) = self.current.take() {
            self.store.release(handle);
        }
    }
}
