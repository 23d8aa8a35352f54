//! Git 历史收集
//!
//! 通过 `git` 命令行只读查询当前分支和最近提交。任何失败都降级为"无历史"。

use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use super::types::{CommitSummary, GitInfo, MAX_RECENT_COMMITS};

/// 字段分隔符（ASCII unit separator）
const FIELD_SEP: char = '\u{1f}';
/// 记录分隔符（ASCII record separator）
const RECORD_SEP: char = '\u{1e}';

/// 收集 Git 信息
///
/// 仅当 `root` 本身是工作区顶层目录时返回 Some。
pub fn collect_git_info(root: &Path) -> Option<GitInfo> {
    let toplevel = match run_git(root, &["rev-parse", "--show-toplevel"]) {
        Ok(out) => out,
        Err(e) => {
            warn!("Not a git repository ({}). Git-based analysis will be skipped.", e);
            return None;
        }
    };

    let same_root = match (Path::new(toplevel.trim()).canonicalize(), root.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    };
    if !same_root {
        warn!(
            "{} is inside a git repository but is not its top level. Git-based analysis will be skipped.",
            root.display()
        );
        return None;
    }

    let active_branch = match run_git(root, &["rev-parse", "--abbrev-ref", "HEAD"]) {
        Ok(out) => out.trim().to_string(),
        Err(e) => {
            warn!("Failed to read active branch: {}", e);
            return None;
        }
    };

    let format = format!("--format=%H{0}%an{0}%cI{0}%B{1}", FIELD_SEP, RECORD_SEP);
    let max_count = format!("--max-count={}", MAX_RECENT_COMMITS);
    let log = match run_git(root, &["log", &max_count, &format]) {
        Ok(out) => out,
        Err(e) => {
            warn!("Failed to read commit history: {}", e);
            return None;
        }
    };

    let recent_commits = parse_log(&log);
    debug!(
        "Git info collected: branch={}, commits={}",
        active_branch,
        recent_commits.len()
    );

    Some(GitInfo {
        active_branch,
        recent_commits,
    })
}

/// 解析 `git log` 的分隔符格式输出
fn parse_log(output: &str) -> Vec<CommitSummary> {
    output
        .split(RECORD_SEP)
        .filter_map(|record| {
            let record = record.trim_start_matches(['\n', '\r']);
            if record.trim().is_empty() {
                return None;
            }
            let mut fields = record.splitn(4, FIELD_SEP);
            Some(CommitSummary {
                hash: fields.next()?.trim().to_string(),
                author: fields.next()?.to_string(),
                date: fields.next()?.to_string(),
                message: fields.next().unwrap_or_default().trim().to_string(),
            })
        })
        .take(MAX_RECENT_COMMITS)
        .collect()
}

/// 在指定目录下执行 git 子命令，返回标准输出
fn run_git(root: &Path, args: &[&str]) -> Result<String, String> {
    let output = Command::new("git")
        .arg("-C")
        .arg(root)
        .args(args)
        .output()
        .map_err(|e| format!("failed to run git: {}", e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!("git {} failed: {}", args.join(" "), stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
