//! 片段切分
//!
//! 在一个元素的直接子节点上累积连续的文本/行内内容，遇到块级子元素或 `<br>` 时
//! 结束当前片段。片段记住自己包含的源节点，译文插在最后一个源节点之后。

use markup5ever_rcdom::{Handle, NodeData};

use crate::html_processor::{is_block, is_break, rendered_text};
use crate::utils::is_translatable_segment;

/// 一个子节点在切分中的作用
#[derive(Debug, PartialEq, Eq)]
pub enum ChildStep {
    /// 块级元素或换行：结束当前片段
    Boundary,
    /// 贡献一段文本
    Content(String),
    /// 没有可见文本
    Empty,
}

/// 判断子节点的作用
pub fn classify_child(node: &Handle) -> ChildStep {
    if is_block(node) || is_break(node) {
        return ChildStep::Boundary;
    }

    let text = match node.data {
        NodeData::Text { ref contents } => contents.borrow().to_string(),
        NodeData::Element { .. } => rendered_text(node),
        _ => String::new(),
    };

    if text.is_empty() {
        ChildStep::Empty
    } else {
        ChildStep::Content(text)
    }
}

/// 一个已完成的片段
#[derive(Debug, Default)]
pub struct Segment {
    nodes: Vec<Handle>,
    text: String,
}

impl Segment {
    /// 修剪后的原文，也是缓存键
    pub fn source_text(&self) -> &str {
        self.text.trim()
    }

    /// 是否通过长度与语言判断
    pub fn is_translatable(&self) -> bool {
        is_translatable_segment(self.source_text())
    }

    /// 译文插入位置
    pub fn last_node(&self) -> Option<&Handle> {
        self.nodes.last()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}

/// 片段累积器
#[derive(Debug, Default)]
pub struct SegmentBuilder {
    current: Segment,
}

impl SegmentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, node: &Handle, text: &str) {
        self.current.nodes.push(node.clone());
        self.current.text.push_str(text);
    }

    /// 取出当前片段并重新开始，没有内容时返回None
    pub fn flush(&mut self) -> Option<Segment> {
        if self.current.nodes.is_empty() {
            return None;
        }
        Some(std::mem::take(&mut self.current))
    }
}

/// 一次性切分元素的全部子节点
pub fn split_segments(element: &Handle) -> Vec<Segment> {
    let children: Vec<Handle> = element.children.borrow().clone();
    let mut builder = SegmentBuilder::new();
    let mut segments = Vec::new();

    for child in &children {
        match classify_child(child) {
            ChildStep::Boundary => segments.extend(builder.flush()),
            ChildStep::Content(text) => builder.push(child, &text),
            ChildStep::Empty => {}
        }
    }
    segments.extend(builder.flush());
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html_processor::{find_first, parse_html, tag_name};

    fn texts(segments: &[Segment]) -> Vec<&str> {
        segments.iter().map(Segment::source_text).collect()
    }

    #[test]
    fn test_inline_run_is_one_segment() {
        let dom = parse_html("<body><p>Read the <a href=\"#\">full guide</a> today.</p></body>").unwrap();
        let p = find_first(&dom, "p").unwrap();
        let segments = split_segments(&p);

        assert_eq!(texts(&segments), vec!["Read the full guide today."]);
        assert_eq!(segments[0].node_count(), 3);
    }

    #[test]
    fn test_block_child_and_break_split_segments() {
        let dom = parse_html(
            "<body><div>Intro text<p>Nested paragraph</p>Middle<br>After break</div></body>",
        )
        .unwrap();
        let div = find_first(&dom, "div").unwrap();
        let segments = split_segments(&div);

        assert_eq!(texts(&segments), vec!["Intro text", "Middle", "After break"]);
    }

    #[test]
    fn test_last_node_is_segment_tail() {
        let dom = parse_html("<body><li>Click <b>here</b><br>next</li></body>").unwrap();
        let li = find_first(&dom, "li").unwrap();
        let segments = split_segments(&li);

        let tail = segments[0].last_node().unwrap();
        assert_eq!(tag_name(tail), Some("b"));
    }

    #[test]
    fn test_whitespace_and_comments_do_not_make_segments_translatable() {
        let dom = parse_html("<body><div>  <!-- note -->  <p>x</p>7</div></body>").unwrap();
        let div = find_first(&dom, "div").unwrap();
        let segments = split_segments(&div);

        assert!(segments.iter().all(|s| !s.is_translatable()));
    }

    #[test]
    fn test_flush_empty_builder() {
        let mut builder = SegmentBuilder::new();
        assert!(builder.flush().is_none());
    }
}
