//! 递归文本切分器
//!
//! 按 段落 → 行 → 单词 → 字符 的优先级寻找切分点，再把小片段合并成
//! 不超过窗口大小、相邻窗口带重叠的分块。长度按字符计。
//!
//! 分隔符保留在其后片段的开头，合并时直接拼接，因此连续空行和缩进原样保留。

use std::collections::VecDeque;
use tracing::debug;

use super::types::DocChunk;

/// 默认分隔符，优先级从高到低
const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// 递归文本切分器
#[derive(Debug, Clone)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl RecursiveTextSplitter {
    /// 创建切分器，`chunk_overlap` 应小于 `chunk_size`
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap: chunk_overlap.min(chunk_size.saturating_sub(1)),
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    /// 切分一段文本
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    /// 切分一组内容单元，每个分块继承原单元的路径和语言
    pub fn split_chunks(&self, chunks: &[DocChunk]) -> Vec<DocChunk> {
        chunks
            .iter()
            .flat_map(|chunk| {
                self.split_text(&chunk.content)
                    .into_iter()
                    .map(move |content| DocChunk {
                        path: chunk.path.clone(),
                        language: chunk.language.clone(),
                        content,
                    })
            })
            .collect()
    }

    fn split_recursive(&self, text: &str, separators: &[&'static str]) -> Vec<String> {
        // 选出文本中实际出现的最高优先级分隔符
        let mut separator = separators.last().copied().unwrap_or("");
        let mut remaining: &[&'static str] = &[];
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() {
                separator = sep;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                remaining = &separators[i + 1..];
                break;
            }
        }

        let mut final_chunks = Vec::new();
        let mut good_splits: Vec<&str> = Vec::new();

        for piece in split_by(text, separator) {
            if char_len(piece) < self.chunk_size {
                good_splits.push(piece);
                continue;
            }

            if !good_splits.is_empty() {
                final_chunks.extend(self.merge_splits(&good_splits));
                good_splits.clear();
            }
            if remaining.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !good_splits.is_empty() {
            final_chunks.extend(self.merge_splits(&good_splits));
        }

        final_chunks
    }

    /// 合并小片段为窗口，窗口间保留不超过 `chunk_overlap` 的重叠
    fn merge_splits(&self, splits: &[&str]) -> Vec<String> {
        let mut docs = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in splits {
            let len = char_len(piece);

            if total + len > self.chunk_size && !current.is_empty() {
                if total > self.chunk_size {
                    debug!(
                        "Created a chunk of size {}, which is longer than the specified {}",
                        total, self.chunk_size
                    );
                }
                if let Some(doc) = join_pieces(&current) {
                    docs.push(doc);
                }

                // 从头部弹出，直到剩余部分满足重叠上限且能容纳下一片段
                while total > self.chunk_overlap || (total + len > self.chunk_size && total > 0) {
                    let Some(first) = current.pop_front() else {
                        break;
                    };
                    total = total.saturating_sub(char_len(first));
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(doc) = join_pieces(&current) {
            docs.push(doc);
        }

        docs
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// 按分隔符切分，分隔符留在后一片段开头，丢弃空片段；空分隔符按字符切分
fn split_by<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    if separator.is_empty() {
        return text
            .char_indices()
            .map(|(i, c)| &text[i..i + c.len_utf8()])
            .collect();
    }

    let mut pieces = Vec::new();
    let mut start = 0;
    for (index, _) in text.match_indices(separator) {
        pieces.push(&text[start..index]);
        start = index;
    }
    pieces.push(&text[start..]);
    pieces.retain(|piece| !piece.is_empty());
    pieces
}

fn join_pieces(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
