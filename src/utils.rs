use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use tracing::warn;
use url::Url;
use walkdir::WalkDir;

use crate::error::Result;
use crate::translation_error;

lazy_static! {
    static ref LATIN_RUN: Regex = Regex::new(r"[a-zA-Z]{2,}").expect("静态正则表达式");
}

/// 输入源类型枚举
#[derive(Debug, Clone)]
pub enum InputSource {
    /// 本地文件路径
    File(PathBuf),
    /// 本地目录（批量处理其中的HTML文件）
    Directory(PathBuf),
    /// 网页URL
    Url(Url),
}

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    if quiet {
        return;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 语言判断：至少包含一段连续两个以上的拉丁字母
pub fn is_english(text: &str) -> bool {
    LATIN_RUN.is_match(text)
}

/// 片段是否值得送去翻译
///
/// 输入应为已修剪的文本；少于2个字符或不含英文的片段被丢弃。
pub fn is_translatable_segment(text: &str) -> bool {
    text.chars().count() >= 2 && is_english(text)
}

/// 验证输入源
/// 用于判断输入是文件、目录还是URL，并返回相应的类型
pub fn validate_input_source(input: &str) -> Result<InputSource> {
    if let Ok(url) = Url::parse(input) {
        if url.scheme() == "http" || url.scheme() == "https" {
            return Ok(InputSource::Url(url));
        }
    }

    let path = PathBuf::from(input);
    let absolute_path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()?.join(path)
    };

    if absolute_path.is_dir() {
        Ok(InputSource::Directory(absolute_path))
    } else {
        validate_input_file(&absolute_path)?;
        Ok(InputSource::File(absolute_path))
    }
}

/// 验证输入文件
pub fn validate_input_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(translation_error!(input_validation, path.display(), "输入文件不存在"));
    }

    if !path.is_file() {
        return Err(translation_error!(input_validation, path.display(), "输入路径不是文件"));
    }

    if !is_html_path(path) {
        if let Some(ext) = path.extension() {
            warn!("⚠️  文件扩展名不是HTML: {}", ext.to_string_lossy());
        }
    }

    Ok(())
}

fn is_html_path(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
        .unwrap_or(false)
}

/// 收集目录下的全部HTML文件（按路径排序）
///
/// 文件名以 `_{lang}` 结尾的翻译产物会被跳过。
pub fn collect_html_files(dir: &Path, lang: &str) -> Vec<PathBuf> {
    let suffix = format!("_{}", lang);
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!("⚠️  跳过无法访问的路径: {}", e);
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_html_path(path))
        .filter(|path| {
            !path
                .file_stem()
                .map(|stem| stem.to_string_lossy().ends_with(&suffix))
                .unwrap_or(false)
        })
        .collect();
    files.sort();
    files
}

/// 为不同输入源生成输出路径
pub fn generate_output_path_for_source(
    source: &InputSource,
    output: &Option<PathBuf>,
    lang: &str,
) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.clone();
    }

    match source {
        InputSource::File(path) | InputSource::Directory(path) => {
            generate_output_path(path, &None, lang)
        }
        InputSource::Url(url) => {
            let host = url.host_str().unwrap_or("webpage");
            let page_name = url
                .path_segments()
                .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                .map(|name| match name.rfind('.') {
                    Some(dot_pos) => &name[..dot_pos],
                    None => name,
                })
                .unwrap_or("index");

            let filename = format!("{}_{}_{}.html", host, page_name, lang);

            // 清理文件名中的非法字符
            let safe_filename = filename
                .chars()
                .map(|c| {
                    if c.is_alphanumeric() || c == '_' || c == '-' || c == '.' {
                        c
                    } else {
                        '_'
                    }
                })
                .collect::<String>();

            PathBuf::from(safe_filename)
        }
    }
}

/// 生成输出文件路径: input.html -> input_zh.html
pub fn generate_output_path(input: &Path, output: &Option<PathBuf>, lang: &str) -> PathBuf {
    if let Some(output_path) = output {
        return output_path.clone();
    }

    let stem = input.file_stem().unwrap_or_default();
    let output_name = match input.extension() {
        Some(extension) => format!(
            "{}_{}.{}",
            stem.to_string_lossy(),
            lang,
            extension.to_string_lossy()
        ),
        None => format!("{}_{}", stem.to_string_lossy(), lang),
    };

    match input.parent() {
        Some(parent) => parent.join(output_name),
        None => PathBuf::from(output_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_heuristic() {
        assert!(is_english("Hello world"));
        assert!(is_english("第2章 Intro"));
        assert!(!is_english("a"));
        assert!(!is_english("a1b2"));
        assert!(!is_english("你好，世界"));
        assert!(!is_english("2024-05-01"));
    }

    #[test]
    fn test_translatable_segment_rules() {
        assert!(is_translatable_segment("OK"));
        assert!(!is_translatable_segment("X"));
        assert!(!is_translatable_segment("→ 42"));
        assert!(!is_translatable_segment(""));
    }

    #[test]
    fn test_generate_output_path() {
        let path = generate_output_path(Path::new("/tmp/site/index.html"), &None, "zh");
        assert_eq!(path, PathBuf::from("/tmp/site/index_zh.html"));

        let explicit = Some(PathBuf::from("out.html"));
        assert_eq!(
            generate_output_path(Path::new("/tmp/a.html"), &explicit, "zh"),
            PathBuf::from("out.html")
        );
    }

    #[test]
    fn test_output_path_for_url() {
        let source = InputSource::Url(Url::parse("https://example.com/docs/guide.html").unwrap());
        assert_eq!(
            generate_output_path_for_source(&source, &None, "zh"),
            PathBuf::from("example.com_guide_zh.html")
        );

        let root = InputSource::Url(Url::parse("https://example.com/").unwrap());
        assert_eq!(
            generate_output_path_for_source(&root, &None, "zh"),
            PathBuf::from("example.com_index_zh.html")
        );
    }

    #[test]
    fn test_validate_input_source_url_and_missing_file() {
        assert!(matches!(
            validate_input_source("https://example.com/page").unwrap(),
            InputSource::Url(_)
        ));
        assert!(validate_input_source("/definitely/not/here.html").is_err());
    }

    #[test]
    fn test_collect_html_files_skips_outputs() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        std::fs::write(dir.path().join("a.html"), "<p>a</p>").unwrap();
        std::fs::write(dir.path().join("a_zh.html"), "<p>a</p>").unwrap();
        std::fs::write(dir.path().join("sub").join("b.htm"), "<p>b</p>").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let files = collect_html_files(dir.path(), "zh");
        let names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.html", "b.htm"]);
    }
}
