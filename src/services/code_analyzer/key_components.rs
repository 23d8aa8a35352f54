//! 关键组件识别

use std::path::Path;

use super::types::{FileRecord, KeyComponentRef, KEY_COMPONENT_PATTERNS, KEY_COMPONENT_TYPE};

/// 识别关键组件
///
/// 文件名（不含目录）小写后包含任一模式即入选，保持扫描顺序，不做排序。
pub fn identify_key_components(files: &[FileRecord]) -> Vec<KeyComponentRef> {
    files
        .iter()
        .filter(|file| is_key_file(&file.path))
        .map(|file| KeyComponentRef {
            path: file.path.clone(),
            component_type: KEY_COMPONENT_TYPE.to_string(),
            language: file.language.clone(),
        })
        .collect()
}

fn is_key_file(path: &str) -> bool {
    let name = Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    KEY_COMPONENT_PATTERNS.iter().any(|p| name.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            language: "Python".to_string(),
            content: String::new(),
            size: 0,
        }
    }

    #[test]
    fn test_matches_base_name_only() {
        let files = vec![
            record("main.py"),
            record("core/helpers.py"),
            record("src/UserService.py"),
            record("test_x.py"),
        ];

        let key: Vec<_> = identify_key_components(&files)
            .into_iter()
            .map(|c| c.path)
            .collect();

        assert_eq!(key, vec!["main.py", "src/UserService.py"]);
    }

    #[test]
    fn test_preserves_discovery_order() {
        let files = vec![record("z_app.py"), record("a_index.py")];
        let key = identify_key_components(&files);
        assert_eq!(key[0].path, "z_app.py");
        assert_eq!(key[1].path, "a_index.py");
        assert_eq!(key[0].component_type, "Core Component");
    }
}
