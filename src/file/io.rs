//! ファイルI/O操作
//!
//! バイナリファイルの読み込みと保存

use crate::address::Range;
use crate::buffer::MemoryBuffer;
use crate::error::{BiError, BufferError, FileError, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// ファイル読み込みの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Loaded {
    pub bytes: Vec<u8>,
    /// ファイルが存在せず空で開始した
    pub new_file: bool,
}

/// `~` と環境変数を展開する。展開できなければそのまま
pub fn expand_path(raw: &str) -> PathBuf {
    match shellexpand::full(raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(err) => {
            log::warn!("path expansion failed for {}: {}", raw, err);
            PathBuf::from(raw)
        }
    }
}

/// ファイル全体を読み込む
pub fn load(path: &Path) -> Result<Vec<u8>> {
    if path.is_dir() {
        return Err(FileError::Io {
            path: path.display().to_string(),
            message: "Is a directory".to_string(),
        }
        .into());
    }
    fs::read(path).map_err(|e| FileError::from_io(e, path).into())
}

/// ファイルを読み込む。存在しなければ新規ファイルとして空で返す
pub fn load_or_new(path: &Path) -> Result<Loaded> {
    match load(path) {
        Ok(bytes) => {
            log::info!("loaded {} ({} bytes)", path.display(), bytes.len());
            Ok(Loaded {
                bytes,
                new_file: false,
            })
        }
        Err(BiError::File(FileError::NotFound { .. })) => {
            log::info!("{} does not exist, starting empty", path.display());
            Ok(Loaded {
                bytes: Vec::new(),
                new_file: true,
            })
        }
        Err(err) => Err(err),
    }
}

/// バイト列をファイルに書き込む
///
/// 同じディレクトリの一時ファイルに書いてから置き換える。
/// 一時ファイルを作れない場合は直接書き込む
pub fn persist(bytes: &[u8], path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(FileError::MissingName.into());
    }

    let temp_path = temp_path_for(path);
    let staged = fs::write(&temp_path, bytes).and_then(|_| fs::rename(&temp_path, path));
    match staged {
        Ok(()) => {}
        Err(err) => {
            log::debug!("staged write to {} failed: {}", temp_path.display(), err);
            let _ = fs::remove_file(&temp_path);
            fs::write(path, bytes).map_err(|e| FileError::from_io(e, path))?;
        }
    }
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

/// 範囲を書き出す。末尾を越えた位置は 0 で埋める
pub fn persist_range(buffer: &MemoryBuffer, range: Range, path: &Path) -> Result<u64> {
    if range.len() > buffer.limit() {
        return Err(BufferError::Overflow {
            requested: range.len(),
        }
        .into());
    }
    let bytes = buffer.read(range.start(), range.end())?;
    persist(&bytes, path)?;
    Ok(range.len())
}

/// 緊急保存。`primary` に書けなければホームディレクトリへ書く
///
/// 実際に保存したパスを返す
pub fn save_recovery(bytes: &[u8], primary: &Path) -> io::Result<PathBuf> {
    match fs::write(primary, bytes) {
        Ok(()) => Ok(primary.to_path_buf()),
        Err(err) => {
            log::error!("recovery save to {} failed: {}", primary.display(), err);
            let name = primary.file_name().unwrap_or(primary.as_os_str());
            let fallback = dirs::home_dir()
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "home directory not found"))?
                .join(name);
            fs::write(&fallback, bytes)?;
            Ok(fallback)
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.bi-tmp", name))
}
