//! 输出文件写入
//!
//! 先写同目录的临时文件再改名，读者不会看到写了一半的文件

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 原子地覆盖写入文件，必要时创建父目录
pub fn write_atomic<P: AsRef<Path>>(path: P, contents: &[u8]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            log::info!("创建输出目录 {}", parent.display());
            fs::create_dir_all(parent)
                .with_context(|| format!("创建目录 {} 失败", parent.display()))?;
        }
    }

    let tmp = tmp_path(path);
    fs::write(&tmp, contents).with_context(|| format!("写入 {} 失败", tmp.display()))?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e).with_context(|| format!("重命名到 {} 失败", path.display()));
    }

    log::info!("💾 已写入 {} ({} 字节)", path.display(), contents.len());
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_and_leaves_no_temp_file() {
        let dir = std::env::temp_dir().join(format!("market-snapshot-output-{}", std::process::id()));
        let path = dir.join("nested").join("info.html");

        write_atomic(&path, "first".as_bytes()).unwrap();
        write_atomic(&path, "second".as_bytes()).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert!(!tmp_path(&path).exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn temp_file_sits_next_to_target() {
        assert_eq!(tmp_path(Path::new("out/info.html")), PathBuf::from("out/info.html.tmp"));
    }
}
