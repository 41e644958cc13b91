use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const FRAGMENT_EXTENSION: &str = "frag";
const MAX_DEPTH: usize = 4;

/// Examples 目录中的一个示例片段文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleEntry {
    /// 相对于 Examples 目录、去掉扩展名的路径，用于菜单显示，例如 `Tutorials/01 - Simple`
    pub name: String,
    pub path: PathBuf,
}

/// 扫描 Examples 目录下的 .frag 文件
///
/// # Arguments
/// * `root` - Examples 目录，不存在时返回空列表
///
/// # Returns
/// * 按显示名称排序的示例列表
pub fn scan(root: &Path) -> Vec<ExampleEntry> {
    let mut entries: Vec<ExampleEntry> = WalkDir::new(root)
        .min_depth(1)
        .max_depth(MAX_DEPTH)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_fragment(e.path()))
        .filter_map(|e| {
            let relative = e.path().strip_prefix(root).ok()?.with_extension("");
            let name = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some(ExampleEntry {
                name,
                path: e.path().to_path_buf(),
            })
        })
        .collect();

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

fn is_fragment(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(FRAGMENT_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_scan_examples() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("Tutorials")).unwrap();
        fs::create_dir_all(root.join("Include")).unwrap();
        fs::write(root.join("Tutorials/02 - Lights.frag"), "").unwrap();
        fs::write(root.join("Tutorials/01 - Simple.FRAG"), "").unwrap();
        fs::write(root.join("Mandelbulb.frag"), "").unwrap();
        fs::write(root.join("Include/notes.txt"), "").unwrap();

        let names: Vec<_> = scan(root).into_iter().map(|e| e.name).collect();
        assert_eq!(
            names,
            vec!["Mandelbulb", "Tutorials/01 - Simple", "Tutorials/02 - Lights"]
        );
    }

    #[test]
    fn test_bundled_examples() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("Examples");
        let names: Vec<_> = scan(&root).into_iter().map(|e| e.name).collect();
        assert!(names.contains(&"Tutorials/01 - Simple 2D system".to_string()));
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(scan(&dir.path().join("Examples")).is_empty());
    }
}
