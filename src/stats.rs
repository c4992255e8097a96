use std::time::Duration;

use chrono::{DateTime, Local};

/// 单次页面遍历的统计
#[derive(Debug, Clone)]
pub struct WalkStats {
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub candidates: usize,
    pub elements_skipped: usize,
    pub segments: usize,
    pub segments_rejected: usize,
    pub cache_hits: usize,
    pub translator_calls: usize,
    pub failures: usize,
    pub timeouts: usize,
    pub inserted: usize,
    pub discarded: usize,
    pub cancelled: bool,
}

impl WalkStats {
    pub fn begin() -> Self {
        Self {
            started_at: Local::now(),
            elapsed: Duration::ZERO,
            candidates: 0,
            elements_skipped: 0,
            segments: 0,
            segments_rejected: 0,
            cache_hits: 0,
            translator_calls: 0,
            failures: 0,
            timeouts: 0,
            inserted: 0,
            discarded: 0,
            cancelled: false,
        }
    }

    /// 合并另一页的统计（目录模式汇总用）
    pub fn absorb(&mut self, other: &WalkStats) {
        self.elapsed += other.elapsed;
        self.candidates += other.candidates;
        self.elements_skipped += other.elements_skipped;
        self.segments += other.segments;
        self.segments_rejected += other.segments_rejected;
        self.cache_hits += other.cache_hits;
        self.translator_calls += other.translator_calls;
        self.failures += other.failures;
        self.timeouts += other.timeouts;
        self.inserted += other.inserted;
        self.discarded += other.discarded;
        self.cancelled |= other.cancelled;
    }
}

/// 打印遍历统计
pub fn print_walk_report(stats: &WalkStats, label: &str) {
    println!("\n📊 翻译统计报告: {}", label);
    println!("═══════════════════════════════════════");
    println!("🕐 开始时间: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("⏱️  总耗时: {}", format_duration(stats.elapsed));

    println!("\n🔤 页面遍历:");
    println!("   候选元素: {} 个", stats.candidates);
    println!("   跳过元素: {} 个", stats.elements_skipped);
    println!("   切分片段: {} 个", stats.segments);
    println!("   过滤片段: {} 个", stats.segments_rejected);
    println!("   插入译文: {} 行", stats.inserted);

    println!("\n🌐 翻译请求:");
    println!("   请求次数: {} 次", stats.translator_calls);
    println!("   失败: {} 次 (其中超时 {} 次)", stats.failures, stats.timeouts);
    if stats.discarded > 0 {
        println!("   停止后丢弃: {} 个", stats.discarded);
    }

    let lookups = stats.cache_hits + stats.translator_calls;
    if lookups > 0 {
        let cache_hit_rate = stats.cache_hits as f64 / lookups as f64;
        println!("\n💾 缓存统计:");
        println!("   缓存命中: {} 次", stats.cache_hits);
        println!("   命中率: {:.1}%", cache_hit_rate * 100.0);
    }

    if stats.cancelled {
        println!("\n⏹️  遍历已被停止，已插入的译文保留");
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{}ms", millis)
    } else {
        format!("{:.3}s", duration.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.500s");
    }

    #[test]
    fn test_absorb_sums_counters() {
        let mut total = WalkStats::begin();
        let mut page = WalkStats::begin();
        page.translator_calls = 3;
        page.inserted = 2;
        page.cancelled = true;

        total.absorb(&page);
        total.absorb(&page);
        assert_eq!(total.translator_calls, 6);
        assert_eq!(total.inserted, 4);
        assert!(total.cancelled);
    }
}
