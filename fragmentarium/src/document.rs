use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// 主窗口中正在编辑的片段源文件
#[derive(Debug, Clone, Default)]
pub struct Document {
    /// 文件路径，新建且未保存的文档为 None
    pub path: Option<PathBuf>,
    pub text: String,
    /// 是否有未保存的修改
    pub modified: bool,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Ok(Self {
            path: Some(path.to_path_buf()),
            text,
            modified: false,
        })
    }

    /// 保存到当前路径
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or_else(|| anyhow::anyhow!("document has no file name"))?;
        self.save_as(&path)
    }

    pub fn save_as(&mut self, path: &Path) -> Result<()> {
        fs::write(path, &self.text)
            .with_context(|| format!("cannot write {}", path.display()))?;
        self.path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// 显示名称：文件名，未命名时为 "Unnamed"
    pub fn display_name(&self) -> String {
        self.path
            .as_ref()
            .and_then(|p| p.file_name())
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Unnamed".to_string())
    }

    /// 窗口标题，例如 `Mandelbulb.frag* - Fragmentarium`
    pub fn window_title(&self) -> String {
        let marker = if self.modified { "*" } else { "" };
        format!("{}{} - Fragmentarium", self.display_name(), marker)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_edit_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scene.frag");
        fs::write(&path, "#include \"DE-Raytracer.frag\"\n").unwrap();

        let mut doc = Document::open(&path).unwrap();
        assert_eq!(doc.window_title(), "scene.frag - Fragmentarium");

        doc.text.push_str("float DE(vec3 p) { return length(p) - 1.0; }\n");
        doc.modified = true;
        assert_eq!(doc.window_title(), "scene.frag* - Fragmentarium");

        doc.save().unwrap();
        assert!(!doc.modified);
        assert!(fs::read_to_string(&path).unwrap().contains("float DE"));
    }

    #[test]
    fn test_unnamed_document() {
        let mut doc = Document::default();
        assert_eq!(doc.display_name(), "Unnamed");
        assert!(doc.save().is_err());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Document::open(&dir.path().join("missing.frag")).is_err());
    }
}
