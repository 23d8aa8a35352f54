//! 扩展名与语言映射、文本读取工具

/// 无法识别的语言标签
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

/// 提取文件扩展名（不含点）
///
/// 与常见的 splitext 语义一致：只看最后一个点，文件名开头的点不算扩展名分隔符。
pub fn extract_file_extension(filename: &str) -> &str {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    let stem_start = base.len() - base.trim_start_matches('.').len();
    match base[stem_start..].rfind('.') {
        Some(pos) => &base[stem_start + pos + 1..],
        None => "",
    }
}

/// 根据扩展名检测编程语言
pub fn detect_programming_language(file_extension: &str) -> &'static str {
    match file_extension.to_lowercase().as_str() {
        "py" => "Python",
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "java" => "Java",
        "cpp" => "C++",
        "c" => "C",
        "cs" => "C#",
        "go" => "Go",
        "rb" => "Ruby",
        "php" => "PHP",
        "rs" => "Rust",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "scala" => "Scala",
        _ => UNKNOWN_LANGUAGE,
    }
}

/// 清理代码内容，仅去除首尾空白
pub fn clean_code_for_llm(code_content: &str) -> &str {
    code_content.trim()
}

/// 宽松解码：丢弃无效的 UTF-8 字节序列，而不是替换或报错
pub fn decode_lenient(mut bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());

    loop {
        match std::str::from_utf8(bytes) {
            Ok(valid) => {
                text.push_str(valid);
                return text;
            }
            Err(e) => {
                let (valid, rest) = bytes.split_at(e.valid_up_to());
                // valid_up_to 之前的部分保证是合法 UTF-8
                text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match e.error_len() {
                    Some(len) => bytes = &rest[len..],
                    // 末尾是不完整的序列
                    None => return text,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_file_extension() {
        assert_eq!(extract_file_extension("main.py"), "py");
        assert_eq!(extract_file_extension("archive.tar.gz"), "gz");
        assert_eq!(extract_file_extension("Makefile"), "");
        assert_eq!(extract_file_extension(".bashrc"), "");
        assert_eq!(extract_file_extension("src/app.TS"), "TS");
    }

    #[test]
    fn test_detect_programming_language() {
        assert_eq!(detect_programming_language("py"), "Python");
        assert_eq!(detect_programming_language("CPP"), "C++");
        assert_eq!(detect_programming_language("rs"), "Rust");
        assert_eq!(detect_programming_language("html"), UNKNOWN_LANGUAGE);
        assert_eq!(detect_programming_language(""), UNKNOWN_LANGUAGE);
    }

    #[test]
    fn test_clean_code_for_llm_trims_only() {
        assert_eq!(clean_code_for_llm("\n  def f():\n    pass\n\n"), "def f():\n    pass");
    }

    #[test]
    fn test_decode_lenient_drops_invalid_bytes() {
        assert_eq!(decode_lenient(b"ab\xffcd"), "abcd");
        assert_eq!(decode_lenient("中文".as_bytes()), "中文");
        // 截断的多字节序列
        assert_eq!(decode_lenient(b"ok\xe4\xb8"), "ok");
    }
}
