//! 页面注释器
//!
//! 按文档顺序遍历候选元素，把每个元素的直接子节点切成片段，经缓存或翻译服务取得译文，
//! 再把译文行插到片段最后一个源节点之后。
//!
//! 元素在任何等待之前就被记入 `ProcessedMarks`；同一区域无论经由多少个候选元素到达，
//! 都只会被处理一次。
//! 停止信号在每个元素和每个子节点之前检查；已插入的译文不会回滚。

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use markup5ever_rcdom::{Handle, RcDom};
use tracing::{debug, info, warn};

use crate::api_constants::dom_config;
use crate::cache::SegmentCache;
use crate::html_processor::{
    add_class, closest, collect_elements, create_element, find_first, has_class, insert_after,
    is_block, remove_class, remove_node, tag_name, NodeId,
};
use crate::preferences::PreferenceChange;
use crate::segment::{classify_child, split_segments, ChildStep, Segment, SegmentBuilder};
use crate::stats::WalkStats;
use crate::translator::{FailureKind, Translate, TranslationResult};
use crate::widget::{ensure_styles, FloatingWidget, WidgetState};

/// 停止信号，可克隆后交给其他任务触发
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// 已处理元素集合
///
/// 同时持有节点句柄，被标记的节点在清空之前不会释放，地址也就不会被新节点复用。
#[derive(Clone, Default)]
pub struct ProcessedMarks(HashMap<NodeId, Handle>);

impl fmt::Debug for ProcessedMarks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessedMarks").field("len", &self.0.len()).finish()
    }
}

impl ProcessedMarks {
    /// 标记元素，返回是否为首次标记
    pub fn mark(&mut self, node: &Handle) -> bool {
        match self.0.entry(NodeId::of(node)) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(node.clone());
                true
            }
        }
    }

    pub fn is_marked(&self, node: &Handle) -> bool {
        self.0.contains_key(&NodeId::of(node))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// 候选元素判断
fn is_candidate(node: &Handle) -> bool {
    tag_name(node).is_some_and(|tag| dom_config::CANDIDATE_TAGS.contains(&tag))
}

/// 决定是否处理元素；接受时立即标记
fn admit(marks: &mut ProcessedMarks, element: &Handle) -> bool {
    if closest(element, |n| has_class(n, dom_config::FLOATING_WIDGET_CLASS)).is_some() {
        return false;
    }
    if marks.is_marked(element) || has_class(element, dom_config::TRANSLATION_LINE_CLASS) {
        return false;
    }
    // 行内元素若已被某个祖先的片段覆盖则跳过；块级元素不会被父元素的片段覆盖
    if !is_block(element) && closest(element, |n| marks.is_marked(n)).is_some() {
        return false;
    }
    marks.mark(element)
}

/// 页面会话：缓存、处理标记、控件状态和停止信号
///
/// 每个加载的页面对应一个会话。
#[derive(Debug, Default)]
pub struct Session {
    cache: SegmentCache,
    marks: ProcessedMarks,
    state: WidgetState,
    stop: StopSignal,
    translations_hidden: bool,
    widget: Option<FloatingWidget>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn cache(&self) -> &SegmentCache {
        &self.cache
    }

    pub fn marks(&self) -> &ProcessedMarks {
        &self.marks
    }

    pub fn translations_hidden(&self) -> bool {
        self.translations_hidden
    }

    pub fn widget(&self) -> Option<&FloatingWidget> {
        self.widget.as_ref()
    }

    /// 停止信号的句柄
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    fn set_state(&mut self, state: WidgetState) {
        self.state = state;
        if let Some(widget) = &self.widget {
            widget.render(state, self.translations_hidden);
        }
    }

    /// 遍历页面并插入译文
    pub async fn start<T>(&mut self, dom: &RcDom, translator: &T) -> WalkStats
    where
        T: Translate + ?Sized,
    {
        let mut stats = WalkStats::begin();
        if self.state == WidgetState::Translating {
            warn!("⚠️  已有遍历在进行，忽略本次开始");
            return stats;
        }

        let started = Instant::now();
        ensure_styles(dom);
        if self.translations_hidden {
            self.set_translations_visible(dom, true);
        }
        self.stop.reset();
        self.set_state(WidgetState::Translating);

        let candidates = collect_elements(dom, is_candidate);
        stats.candidates = candidates.len();
        info!(
            "🚀 开始逐段翻译: {} 个候选元素 [{}]",
            candidates.len(),
            translator.provider_name()
        );

        for element in &candidates {
            if self.stop.is_raised() {
                break;
            }
            if !admit(&mut self.marks, element) {
                stats.elements_skipped += 1;
                continue;
            }
            self.translate_element(element, translator, &mut stats).await;
        }

        stats.cancelled = self.stop.is_raised();
        stats.elapsed = started.elapsed();
        if stats.cancelled {
            info!("⏹️  翻译已停止，保留 {} 行译文", stats.inserted);
            self.set_state(WidgetState::Idle);
        } else {
            info!(
                "✅ 翻译完成: 插入 {} 行译文，请求 {} 次，缓存命中 {} 次",
                stats.inserted, stats.translator_calls, stats.cache_hits
            );
            self.set_state(WidgetState::Translated);
        }
        stats
    }

    async fn translate_element<T>(&mut self, element: &Handle, translator: &T, stats: &mut WalkStats)
    where
        T: Translate + ?Sized,
    {
        let children: Vec<Handle> = element.children.borrow().clone();
        let mut builder = SegmentBuilder::new();

        for child in &children {
            if self.stop.is_raised() {
                return;
            }
            match classify_child(child) {
                ChildStep::Boundary => {
                    if let Some(segment) = builder.flush() {
                        self.translate_segment(segment, translator, stats).await;
                    }
                }
                ChildStep::Content(text) => builder.push(child, &text),
                ChildStep::Empty => {}
            }
        }

        if !self.stop.is_raised() {
            if let Some(segment) = builder.flush() {
                self.translate_segment(segment, translator, stats).await;
            }
        }
    }

    async fn translate_segment<T>(&mut self, segment: Segment, translator: &T, stats: &mut WalkStats)
    where
        T: Translate + ?Sized,
    {
        stats.segments += 1;
        if !segment.is_translatable() {
            stats.segments_rejected += 1;
            return;
        }

        let source = segment.source_text().to_string();
        let result = match self.cache.lookup(&source) {
            Some(translation) => {
                stats.cache_hits += 1;
                TranslationResult::Success(translation)
            }
            None => {
                stats.translator_calls += 1;
                let result = translator.translate(&source).await;
                if !self.cache.store(&source, &result) {
                    stats.failures += 1;
                    if result == TranslationResult::Failure(FailureKind::Timeout) {
                        stats.timeouts += 1;
                    }
                }
                result
            }
        };

        if self.stop.is_raised() {
            debug!("停止信号已触发，丢弃译文: {}", source);
            stats.discarded += 1;
            return;
        }

        let Some(anchor) = segment.last_node() else {
            return;
        };
        let line = create_element(
            "div",
            Some(dom_config::TRANSLATION_LINE_CLASS),
            Some(result.inline_text()),
        );
        if insert_after(anchor, line) {
            stats.inserted += 1;
        }
    }

    /// 停止当前遍历
    pub fn stop(&mut self) {
        self.stop.raise();
        self.set_state(WidgetState::Idle);
    }

    /// 清除全部译文、处理标记和缓存，返回移除的译文行数量
    pub fn clear(&mut self, dom: &RcDom) -> usize {
        let lines = collect_elements(dom, |n| has_class(n, dom_config::TRANSLATION_LINE_CLASS));
        let removed = lines.iter().filter(|line| remove_node(line)).count();

        self.marks.clear();
        self.cache.clear();
        self.stop.reset();
        self.set_state(WidgetState::Idle);
        info!("🧹 已清除 {} 行译文", removed);
        removed
    }

    /// 隐藏/显示全部译文，返回切换后是否隐藏
    ///
    /// 隐藏时若仍在翻译则一并停止。
    pub fn toggle_visibility(&mut self, dom: &RcDom) -> bool {
        let hide = !self.translations_hidden;
        if hide && self.state == WidgetState::Translating {
            self.stop();
        }
        self.set_translations_visible(dom, !hide);
        hide
    }

    fn set_translations_visible(&mut self, dom: &RcDom, visible: bool) {
        if let Some(body) = find_first(dom, "body") {
            if visible {
                remove_class(&body, dom_config::HIDE_TRANSLATIONS_CLASS);
            } else {
                add_class(&body, dom_config::HIDE_TRANSLATIONS_CLASS);
            }
        }
        self.translations_hidden = !visible;
        if let Some(widget) = &self.widget {
            widget.render(self.state, self.translations_hidden);
        }
    }

    /// 挂载或移除悬浮控件
    pub fn set_floating(&mut self, dom: &RcDom, enabled: bool) {
        match (enabled, self.widget.take()) {
            (true, Some(widget)) => self.widget = Some(widget),
            (true, None) => {
                ensure_styles(dom);
                self.widget = FloatingWidget::mount(dom);
                if let Some(widget) = &self.widget {
                    widget.render(self.state, self.translations_hidden);
                } else {
                    warn!("⚠️  页面没有body，无法挂载悬浮控件");
                }
            }
            (false, Some(widget)) => widget.unmount(),
            (false, None) => {}
        }
    }

    /// 应用一条偏好变更，返回会话是否受影响
    pub fn apply(&mut self, dom: &RcDom, change: &PreferenceChange) -> bool {
        match change {
            PreferenceChange::FloatingMode(enabled) => {
                debug!("悬浮模式: {}", enabled);
                self.set_floating(dom, *enabled);
                true
            }
            _ => false,
        }
    }

    /// 列出下一次遍历会送去翻译的片段原文（不修改页面和会话）
    pub fn preview(&self, dom: &RcDom) -> Vec<String> {
        let mut marks = self.marks.clone();
        collect_elements(dom, is_candidate)
            .iter()
            .filter(|element| admit(&mut marks, element))
            .flat_map(|element| split_segments(element))
            .filter(Segment::is_translatable)
            .map(|segment| segment.source_text().to_string())
            .collect()
    }
}
