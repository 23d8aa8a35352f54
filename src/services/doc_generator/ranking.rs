//! 文件重要性评分与排序

use std::cmp::Ordering;

use super::types::RankOrder;
use crate::services::code_analyzer::types::FileRecord;

/// 路径中出现这些片段视为更重要
const IMPORTANT_PATH_KEYWORDS: &[&str] = &["main", "app", "index", "core"];

/// 计算文件的重要性分数
///
/// - 路径含入口类关键字 +10
/// - 路径含 `test` -5
/// - 大小在 [100, 10000] 字节之间时加 `min(size / 1000, 5)`
pub fn calculate_file_importance(path: &str, size: u64) -> f64 {
    let path = path.to_lowercase();
    let mut importance = 0.0;

    if IMPORTANT_PATH_KEYWORDS.iter().any(|k| path.contains(k)) {
        importance += 10.0;
    }

    if path.contains("test") {
        importance -= 5.0;
    }

    if (100..=10_000).contains(&size) {
        importance += (size as f64 / 1000.0).min(5.0);
    }

    importance
}

/// 按重要性对文件排序（稳定排序，同分保持扫描顺序）
///
/// 默认升序：分数低的文件排在前面。
pub fn rank_files(files: &[FileRecord], order: RankOrder) -> Vec<&FileRecord> {
    let mut scored: Vec<(f64, &FileRecord)> = files
        .iter()
        .map(|f| (calculate_file_importance(&f.path, f.size), f))
        .collect();

    scored.sort_by(|(a, _), (b, _)| {
        let ordering = a.partial_cmp(b).unwrap_or(Ordering::Equal);
        match order {
            RankOrder::Ascending => ordering,
            RankOrder::Descending => ordering.reverse(),
        }
    });

    scored.into_iter().map(|(_, f)| f).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str, size: u64) -> FileRecord {
        FileRecord {
            path: path.to_string(),
            language: "Python".to_string(),
            content: "x".to_string(),
            size,
        }
    }

    #[test]
    fn test_score_examples() {
        assert_eq!(calculate_file_importance("main.py", 8), 10.0);
        assert_eq!(calculate_file_importance("test_x.py", 4), -5.0);
        assert_eq!(calculate_file_importance("utils/helper.py", 50), 0.0);
        assert_eq!(calculate_file_importance("src/App.tsx", 2500), 12.5);
    }

    #[test]
    fn test_size_bonus_bounds() {
        assert_eq!(calculate_file_importance("lib.py", 99), 0.0);
        assert_eq!(calculate_file_importance("lib.py", 100), 0.1);
        assert_eq!(calculate_file_importance("lib.py", 10_000), 5.0);
        assert_eq!(calculate_file_importance("lib.py", 10_001), 0.0);
        assert_eq!(calculate_file_importance("lib.py", 7_000), 5.0);
    }

    #[test]
    fn test_test_penalty_is_five() {
        for size in [0, 150, 4_000, 20_000] {
            let plain = calculate_file_importance("pkg/core.py", size);
            let tested = calculate_file_importance("pkg/test/core.py", size);
            assert!((plain - tested - 5.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_rank_ascending_is_stable() {
        let files = vec![
            record("main.py", 8),
            record("b.py", 1),
            record("test_x.py", 4),
            record("a.py", 1),
        ];

        let ranked: Vec<_> = rank_files(&files, RankOrder::Ascending)
            .into_iter()
            .map(|f| f.path.as_str())
            .collect();

        assert_eq!(ranked, vec!["test_x.py", "b.py", "a.py", "main.py"]);
    }

    #[test]
    fn test_rank_descending() {
        let files = vec![record("test_x.py", 4), record("b.py", 1), record("main.py", 8)];

        let ranked: Vec<_> = rank_files(&files, RankOrder::Descending)
            .into_iter()
            .map(|f| f.path.as_str())
            .collect();

        assert_eq!(ranked, vec!["main.py", "b.py", "test_x.py"]);
    }
}
