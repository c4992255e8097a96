//! HTML处理模块
//!
//! 提供HTML解析、序列化以及页面注释所需的DOM查询和修改操作

// 标准库导入
use std::cell::RefCell;
use std::rc::Rc;

// 第三方crate导入
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::{parse_document, Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData, RcDom};

// 本地模块导入
use crate::api_constants::dom_config;
use crate::error::Result;
use crate::translation_error;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// 节点身份标识
///
/// 取自节点的 `Rc` 地址，只在节点存活期间唯一；长期作键时需同时持有句柄。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn of(node: &Handle) -> Self {
        NodeId(Rc::as_ptr(node) as usize)
    }
}

/// 解析HTML文档
pub fn parse_html(html_content: &str) -> Result<RcDom> {
    parse_document(RcDom::default(), Default::default())
        .from_utf8()
        .read_from(&mut html_content.as_bytes())
        .map_err(|e| translation_error!(html_parse, e))
}

/// 序列化DOM为HTML字符串
pub fn serialize_dom_to_html(dom: &RcDom) -> Result<String> {
    use html5ever::serialize::{serialize, SerializeOpts};
    use markup5ever_rcdom::SerializableHandle;
    use std::io::Cursor;

    let mut buffer = Vec::new();
    let cursor = Cursor::new(&mut buffer);

    serialize(
        cursor,
        &SerializableHandle::from(dom.document.clone()),
        SerializeOpts::default(),
    )
    .map_err(|e| translation_error!(html_parse, format!("HTML序列化失败: {:?}", e)))?;

    String::from_utf8(buffer).map_err(|e| translation_error!(html_parse, format!("UTF-8转换失败: {}", e)))
}

/// 元素的小写标签名，非元素返回None
pub fn tag_name(node: &Node) -> Option<&str> {
    match node.data {
        NodeData::Element { ref name, .. } => Some(name.local.as_ref()),
        _ => None,
    }
}

pub fn is_element(node: &Node) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// 块级元素判断
pub fn is_block(node: &Node) -> bool {
    tag_name(node).is_some_and(|tag| dom_config::BLOCK_TAGS.contains(&tag))
}

/// 换行元素判断
pub fn is_break(node: &Node) -> bool {
    tag_name(node) == Some("br")
}

/// 读取属性值
pub fn get_attr(node: &Node, attr_name: &str) -> Option<String> {
    match node.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|attr| attr.name.local.as_ref() == attr_name)
            .map(|attr| attr.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(node: &Node, attr_name: &str) -> bool {
    get_attr(node, attr_name).is_some()
}

pub fn has_class(node: &Node, class: &str) -> bool {
    get_attr(node, "class").is_some_and(|value| value.split_whitespace().any(|c| c == class))
}

/// 添加类名（已存在时不重复添加）
pub fn add_class(node: &Node, class: &str) {
    update_classes(node, |classes| {
        if !classes.iter().any(|c| c == class) {
            classes.push(class.to_string());
        }
    });
}

/// 移除类名
pub fn remove_class(node: &Node, class: &str) {
    update_classes(node, |classes| classes.retain(|c| c != class));
}

fn update_classes(node: &Node, edit: impl FnOnce(&mut Vec<String>)) {
    if !is_element(node) {
        return;
    }

    let mut classes: Vec<String> = get_attr(node, "class")
        .map(|value| value.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    edit(&mut classes);
    set_attr(node, "class", &classes.join(" "));
}

/// 设置属性值（覆盖已有值）
pub fn set_attr(node: &Node, attr_name: &str, value: &str) {
    let NodeData::Element { ref attrs, .. } = node.data else {
        return;
    };

    let mut attrs = attrs.borrow_mut();
    let value = StrTendril::from(value);
    match attrs.iter_mut().find(|a| a.name.local.as_ref() == attr_name) {
        Some(attr) => attr.value = value,
        None => attrs.push(Attribute {
            name: attr_qual_name(attr_name),
            value,
        }),
    }
}

/// 读取父节点
pub fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

/// 从自身开始向上查找第一个满足条件的节点
pub fn closest(node: &Handle, predicate: impl Fn(&Handle) -> bool) -> Option<Handle> {
    let mut current = Some(node.clone());
    while let Some(candidate) = current {
        if predicate(&candidate) {
            return Some(candidate);
        }
        current = parent_of(&candidate);
    }
    None
}

/// 按文档顺序收集满足条件的元素
pub fn collect_elements(dom: &RcDom, predicate: impl Fn(&Handle) -> bool) -> Vec<Handle> {
    let mut found = Vec::new();
    let mut stack = vec![dom.document.clone()];

    while let Some(node) = stack.pop() {
        if is_element(&node) && predicate(&node) {
            found.push(node.clone());
        }
        for child in node.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
    }

    found
}

/// 查找第一个指定标签的元素
pub fn find_first(dom: &RcDom, tag: &str) -> Option<Handle> {
    collect_elements(dom, |node| tag_name(node) == Some(tag))
        .into_iter()
        .next()
}

/// 创建HTML元素，可附带类名和文本内容
pub fn create_element(tag: &str, class: Option<&str>, text: Option<&str>) -> Handle {
    let attrs = class
        .map(|class| {
            vec![Attribute {
                name: attr_qual_name("class"),
                value: StrTendril::from(class),
            }]
        })
        .unwrap_or_default();

    let element = Node::new(NodeData::Element {
        name: QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag)),
        attrs: RefCell::new(attrs),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    });

    if let Some(text) = text {
        append_child(&element, create_text(text));
    }

    element
}

/// 创建文本节点
pub fn create_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// 覆盖元素的全部子节点为一段文本
pub fn set_text(element: &Handle, text: &str) {
    for child in element.children.borrow_mut().drain(..) {
        child.parent.set(None);
    }
    append_child(element, create_text(text));
}

/// 追加子节点
pub fn append_child(parent: &Handle, child: Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// 把新节点作为兄弟节点插入到参考节点之后
///
/// 参考节点没有父节点时不插入，返回false。
pub fn insert_after(reference: &Handle, new_node: Handle) -> bool {
    let Some(parent) = parent_of(reference) else {
        return false;
    };

    let mut children = parent.children.borrow_mut();
    let Some(index) = children.iter().position(|c| Rc::ptr_eq(c, reference)) else {
        return false;
    };

    new_node.parent.set(Some(Rc::downgrade(&parent)));
    children.insert(index + 1, new_node);
    true
}

/// 从父节点上摘除节点
pub fn remove_node(node: &Handle) -> bool {
    let Some(parent) = parent_of(node) else {
        return false;
    };

    let mut children = parent.children.borrow_mut();
    let before = children.len();
    children.retain(|c| !Rc::ptr_eq(c, node));
    node.parent.set(None);
    children.len() != before
}

/// 近似浏览器innerText的可见文本
///
/// `<br>` 记为换行；脚本、样式和 `hidden` 元素不计入，子树中已插入的译文行也不计入。
pub fn rendered_text(node: &Handle) -> String {
    let mut out = String::new();
    push_rendered_text(node, &mut out, true);
    out
}

fn push_rendered_text(node: &Handle, out: &mut String, is_root: bool) {
    match node.data {
        NodeData::Text { ref contents } => out.push_str(&contents.borrow()),
        NodeData::Element { .. } => {
            if is_break(node) {
                out.push('\n');
                return;
            }
            let tag = tag_name(node).unwrap_or_default();
            if dom_config::INVISIBLE_TAGS.contains(&tag) || has_attr(node, "hidden") {
                return;
            }
            if !is_root && has_class(node, dom_config::TRANSLATION_LINE_CLASS) {
                return;
            }
            for child in node.children.borrow().iter() {
                push_rendered_text(child, out, false);
            }
        }
        _ => {}
    }
}

fn attr_qual_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of(dom: &RcDom) -> Handle {
        find_first(dom, "body").unwrap()
    }

    #[test]
    fn test_collect_elements_in_document_order() {
        let dom = parse_html("<body><div><p>a</p><span>b</span></div><p>c</p></body>").unwrap();
        let tags: Vec<String> = collect_elements(&dom, |n| tag_name(n) != Some("html"))
            .iter()
            .filter_map(|n| tag_name(n).map(str::to_string))
            .collect();
        assert_eq!(tags, vec!["head", "body", "div", "p", "span", "p"]);
    }

    #[test]
    fn test_insert_after_keeps_reading_order() {
        let dom = parse_html("<body><p id=\"x\">Hello</p><p>Bye</p></body>").unwrap();
        let first = find_first(&dom, "p").unwrap();
        assert!(insert_after(&first, create_element("div", Some("note"), Some("你好"))));

        let html = serialize_dom_to_html(&dom).unwrap();
        assert!(html.contains(r#"<p id="x">Hello</p><div class="note">你好</div><p>Bye</p>"#));
    }

    #[test]
    fn test_insert_after_detached_node() {
        let orphan = create_element("p", None, Some("alone"));
        assert!(!insert_after(&orphan, create_text("x")));
    }

    #[test]
    fn test_remove_node() {
        let dom = parse_html("<body><p>keep</p><div class=\"gone\">x</div></body>").unwrap();
        let gone = collect_elements(&dom, |n| has_class(n, "gone")).remove(0);
        assert!(remove_node(&gone));
        assert!(parent_of(&gone).is_none());
        assert!(!serialize_dom_to_html(&dom).unwrap().contains("gone"));
    }

    #[test]
    fn test_rendered_text_skips_invisible_content() {
        let dom = parse_html(
            "<body><span>Read<br>more<script>var x = 1;</script><b hidden>secret</b></span></body>",
        )
        .unwrap();
        let span = find_first(&dom, "span").unwrap();
        assert_eq!(rendered_text(&span), "Read\nmore");
    }

    #[test]
    fn test_rendered_text_skips_nested_translation_lines() {
        let dom = parse_html(
            "<body><span>Hello<div class=\"pt-translation-line\">你好</div></span></body>",
        )
        .unwrap();
        let span = find_first(&dom, "span").unwrap();
        assert_eq!(rendered_text(&span), "Hello");

        let line = collect_elements(&dom, |n| has_class(n, "pt-translation-line")).remove(0);
        assert_eq!(rendered_text(&line), "你好");
    }

    #[test]
    fn test_class_editing() {
        let dom = parse_html("<body class=\"dark\"></body>").unwrap();
        let body = body_of(&dom);

        add_class(&body, "pt-hide-translations");
        add_class(&body, "pt-hide-translations");
        assert_eq!(get_attr(&body, "class").as_deref(), Some("dark pt-hide-translations"));

        remove_class(&body, "dark");
        assert!(has_class(&body, "pt-hide-translations"));
        assert!(!has_class(&body, "dark"));
    }

    #[test]
    fn test_set_attr_overwrites() {
        let style = create_element("style", None, None);
        set_attr(&style, "id", "a");
        set_attr(&style, "id", "b");
        assert_eq!(get_attr(&style, "id").as_deref(), Some("b"));
        assert!(!has_attr(&style, "class"));
    }

    #[test]
    fn test_closest_includes_self() {
        let dom = parse_html("<body><div class=\"w\"><span>x</span></div></body>").unwrap();
        let span = find_first(&dom, "span").unwrap();
        assert!(closest(&span, |n| has_class(n, "w")).is_some());
        assert!(closest(&span, |n| tag_name(n) == Some("span")).is_some());
        assert!(closest(&span, |n| has_class(n, "missing")).is_none());
    }

    #[test]
    fn test_set_text_replaces_children() {
        let bubble = create_element("div", Some("pt-translation-bubble"), Some("Translating..."));
        set_text(&bubble, "你好");
        assert_eq!(rendered_text(&bubble), "你好");
        assert_eq!(bubble.children.borrow().len(), 1);
    }
}
