//! 源码清单扫描器
//!
//! 一次遍历同时产出文件记录、目录树和语言分布，保证三者对纳入条目的判断一致。

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::language::{clean_code_for_llm, decode_lenient, detect_programming_language, extract_file_extension};
use super::types::{DirectoryNode, FileRecord, LanguageHistogram, ScanConfig};

/// 扫描结果
#[derive(Debug, Clone, Default)]
pub struct SourceInventory {
    pub files: Vec<FileRecord>,
    pub tree: DirectoryNode,
    pub languages: LanguageHistogram,
}

/// 源码扫描器
pub struct SourceScanner {
    config: ScanConfig,
    /// 编译后的忽略模式（glob patterns）
    ignore_patterns: Vec<glob::Pattern>,
}

impl SourceScanner {
    /// 创建新的扫描器
    pub fn new(config: ScanConfig) -> Self {
        let ignore_patterns = config
            .ignore_patterns
            .iter()
            .filter_map(|p| match glob::Pattern::new(p) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!("Invalid ignore pattern '{}': {}", p, e);
                    None
                }
            })
            .collect();

        Self {
            config,
            ignore_patterns,
        }
    }

    /// 扫描目录
    ///
    /// 隐藏目录和忽略目录在遍历时直接剪枝，其内容不会被读取。
    pub fn scan(&self, root_path: &Path) -> Result<SourceInventory, ScanError> {
        if !root_path.exists() {
            return Err(ScanError::PathNotFound(root_path.to_path_buf()));
        }
        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory(root_path.to_path_buf()));
        }

        info!("Starting directory scan: {}", root_path.display());

        let mut inventory = SourceInventory::default();

        let walker = WalkDir::new(root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.should_ignore(&e.file_name().to_string_lossy()));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };
            if entry.depth() == 0 {
                continue;
            }

            let components = relative_components(entry.path(), root_path);

            if entry.file_type().is_dir() {
                inventory.tree.ensure_path(components.iter().map(String::as_str));
                continue;
            }
            if !entry.file_type().is_file() {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            if !self.is_supported_file(&file_name) {
                debug!("Skipping unsupported file: {}", entry.path().display());
                continue;
            }

            let bytes = match fs::read(entry.path()) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Error reading {}: {}", entry.path().display(), e);
                    continue;
                }
            };

            let language = detect_programming_language(extract_file_extension(&file_name));
            let content = decode_lenient(&bytes);

            let (dir_parts, _) = components.split_at(components.len() - 1);
            inventory
                .tree
                .ensure_path(dir_parts.iter().map(String::as_str))
                .files
                .push(file_name);

            *inventory.languages.entry(language.to_string()).or_insert(0) += 1;
            inventory.files.push(FileRecord {
                path: components.join("/"),
                language: language.to_string(),
                content: clean_code_for_llm(&content).to_string(),
                size: bytes.len() as u64,
            });
        }

        info!(
            "Scan completed: {} files, {} languages",
            inventory.files.len(),
            inventory.languages.len()
        );

        Ok(inventory)
    }

    /// 检查是否应该忽略该路径片段
    fn should_ignore(&self, name: &str) -> bool {
        // 隐藏文件/目录
        if name.starts_with('.') {
            return true;
        }

        self.ignore_patterns.iter().any(|pattern| pattern.matches(name))
    }

    /// 检查是否是支持的文件类型
    fn is_supported_file(&self, file_name: &str) -> bool {
        let ext = extract_file_extension(file_name).to_lowercase();
        !ext.is_empty() && self.config.supported_extensions.iter().any(|s| *s == ext)
    }
}

/// 相对路径的各个片段
fn relative_components(path: &Path, root_path: &Path) -> Vec<String> {
    path.strip_prefix(root_path)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy().to_string())
        .collect()
}

/// 扫描错误类型
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("路径不存在: {0}")]
    PathNotFound(PathBuf),

    #[error("路径不是目录: {0}")]
    NotADirectory(PathBuf),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = File::create(path).unwrap();
        file.write_all(content).unwrap();
    }

    fn create_test_dir() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        write_file(&root.join("main.py"), b"print(1)");
        write_file(&root.join("src/app.js"), b"  console.log('hi');\n\n");
        write_file(&root.join("src/utils/helper.go"), b"package utils");
        write_file(&root.join("src/notes.md"), b"# notes");
        write_file(&root.join("src/.secret.py"), b"x = 1");

        // 应该被剪枝的目录
        write_file(&root.join("node_modules/lib/index.js"), b"module.exports = 1");
        write_file(&root.join("build/out.py"), b"x = 2");
        write_file(&root.join(".git/hooks/pre-commit.py"), b"x = 3");
        write_file(&root.join("pkg/dist/bundle.js"), b"x = 4");

        dir
    }

    #[test]
    fn test_scan_filters_and_prunes() {
        let test_dir = create_test_dir();
        let scanner = SourceScanner::new(ScanConfig::default());

        let inventory = scanner.scan(test_dir.path()).unwrap();
        let paths: Vec<_> = inventory.files.iter().map(|f| f.path.as_str()).collect();

        assert_eq!(paths, vec!["main.py", "src/app.js", "src/utils/helper.go"]);
        assert!(paths.iter().all(|p| !p.contains("node_modules") && !p.contains("dist")));
    }

    #[test]
    fn test_scan_normalizes_content_and_size() {
        let test_dir = create_test_dir();
        let scanner = SourceScanner::new(ScanConfig::default());

        let inventory = scanner.scan(test_dir.path()).unwrap();
        let app = inventory.files.iter().find(|f| f.path == "src/app.js").unwrap();

        assert_eq!(app.content, "console.log('hi');");
        assert_eq!(app.size, 22);
        assert_eq!(app.language, "JavaScript");
    }

    #[test]
    fn test_tree_agrees_with_files() {
        let test_dir = create_test_dir();
        let scanner = SourceScanner::new(ScanConfig::default());

        let inventory = scanner.scan(test_dir.path()).unwrap();
        let tree = &inventory.tree;

        assert_eq!(tree.files, vec!["main.py".to_string()]);
        let src = &tree.directories["src"];
        assert_eq!(src.files, vec!["app.js".to_string()]);
        assert_eq!(src.directories["utils"].files, vec!["helper.go".to_string()]);
        assert!(!tree.directories.contains_key("node_modules"));
        assert!(!tree.directories.contains_key(".git"));
        assert!(!tree.directories["pkg"].directories.contains_key("dist"));
        assert_eq!(tree.file_count(), inventory.files.len());
    }

    #[test]
    fn test_histogram_counts_languages() {
        let dir = TempDir::new().unwrap();
        write_file(&dir.path().join("a.py"), b"a");
        write_file(&dir.path().join("b.py"), b"b");
        write_file(&dir.path().join("c.json"), b"{}");

        let inventory = SourceScanner::new(ScanConfig::default()).scan(dir.path()).unwrap();

        assert_eq!(inventory.languages.get("Python"), Some(&2));
        assert_eq!(inventory.languages.get("Unknown"), Some(&1));
    }

    #[test]
    fn test_scan_missing_root() {
        let scanner = SourceScanner::new(ScanConfig::default());
        let result = scanner.scan(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(ScanError::PathNotFound(_))));
    }

    #[test]
    fn test_should_ignore() {
        let scanner = SourceScanner::new(ScanConfig::default());

        assert!(scanner.should_ignore(".gitignore"));
        assert!(scanner.should_ignore("node_modules"));
        assert!(scanner.should_ignore("__pycache__"));
        assert!(!scanner.should_ignore("main.py"));
        assert!(!scanner.should_ignore("builder"));
    }

    #[test]
    fn test_is_supported_file() {
        let scanner = SourceScanner::new(ScanConfig::default());

        assert!(scanner.is_supported_file("main.py"));
        assert!(scanner.is_supported_file("App.TS"));
        assert!(scanner.is_supported_file("data.json"));
        assert!(!scanner.is_supported_file("lib.rs"));
        assert!(!scanner.is_supported_file("README.md"));
        assert!(!scanner.is_supported_file("Makefile"));
    }
}
