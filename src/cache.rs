//! 片段译文缓存
//!
//! 以修剪后的原文精确匹配为键，只缓存成功的译文；失败不入缓存，下次遍历会重新请求。
//! 生命周期与页面会话一致，只在用户清除时清空。

use std::collections::HashMap;

use crate::translator::TranslationResult;

#[derive(Debug, Default)]
pub struct SegmentCache {
    entries: HashMap<String, String>,
    hits: usize,
    misses: usize,
}

impl SegmentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// 查找译文并记录命中/未命中
    pub fn lookup(&mut self, source: &str) -> Option<String> {
        match self.entries.get(source) {
            Some(translation) => {
                self.hits += 1;
                Some(translation.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    /// 记录一次翻译结果，仅成功时写入，返回是否写入
    pub fn store(&mut self, source: &str, result: &TranslationResult) -> bool {
        match result {
            TranslationResult::Success(translation) => {
                self.entries.insert(source.to_string(), translation.clone());
                true
            }
            TranslationResult::Failure(_) => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    /// 清空缓存与计数
    pub fn clear(&mut self) {
        self.entries.clear();
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::FailureKind;

    #[test]
    fn test_only_successes_are_cached() {
        let mut cache = SegmentCache::new();
        assert!(!cache.store("Hello", &TranslationResult::Failure(FailureKind::Timeout)));
        assert!(cache.lookup("Hello").is_none());

        assert!(cache.store("Hello", &TranslationResult::Success("你好".to_string())));
        assert_eq!(cache.lookup("Hello").as_deref(), Some("你好"));
        assert_eq!((cache.hits(), cache.misses()), (1, 1));
    }

    #[test]
    fn test_keys_are_exact() {
        let mut cache = SegmentCache::new();
        cache.store("Hello", &TranslationResult::Success("你好".to_string()));
        assert!(cache.lookup("hello").is_none());
        assert!(cache.lookup("Hello ").is_none());
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut cache = SegmentCache::new();
        cache.store("Hello", &TranslationResult::Success("你好".to_string()));
        cache.lookup("Hello");
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.hits(), 0);
    }
}
