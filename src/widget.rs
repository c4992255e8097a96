//! 悬浮控件
//!
//! 控件状态只在用户开始/停止/清除或遍历结束时变化。控件以普通元素挂在 `<body>` 末尾，
//! 根节点带 `pt-floating-widget` 类，页面遍历会跳过它的整个子树。

use markup5ever_rcdom::{Handle, RcDom};

use crate::api_constants::dom_config;
use crate::html_processor::{
    add_class, append_child, collect_elements, create_element, find_first, get_attr,
    remove_class, remove_node, set_attr, set_text,
};

/// 控件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    #[default]
    Idle,
    Translating,
    Translated,
}

/// 控件上的按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Start,
    Stop,
    Clear,
    Dismiss,
}

/// 当前状态下可见的按钮，按显示顺序
///
/// 开始与停止互斥；清除和隐藏/显示始终可见。
pub fn visible_controls(state: WidgetState) -> Vec<Control> {
    let main = match state {
        WidgetState::Translating => Control::Stop,
        WidgetState::Idle | WidgetState::Translated => Control::Start,
    };
    vec![main, Control::Clear, Control::Dismiss]
}

/// 开始按钮的文字
pub fn start_label(state: WidgetState) -> &'static str {
    match state {
        WidgetState::Translated => "Translated",
        _ => "Translate",
    }
}

/// 隐藏/显示按钮的文字
pub fn dismiss_label(translations_hidden: bool) -> &'static str {
    if translations_hidden {
        "Show"
    } else {
        "Dismiss"
    }
}

/// 在head中注入译文行和控件的样式，已存在时不重复注入
pub fn ensure_styles(dom: &RcDom) -> bool {
    let exists = !collect_elements(dom, |n| {
        get_attr(n, "id").as_deref() == Some(dom_config::STYLESHEET_ID)
    })
    .is_empty();
    if exists {
        return false;
    }

    let Some(head) = find_first(dom, "head") else {
        return false;
    };
    let style = create_element("style", None, Some(dom_config::STYLESHEET));
    set_attr(&style, "id", dom_config::STYLESHEET_ID);
    append_child(&head, style);
    true
}

/// 挂载在页面中的悬浮控件
#[derive(Debug)]
pub struct FloatingWidget {
    root: Handle,
    start: Handle,
    stop: Handle,
    dismiss: Handle,
}

impl FloatingWidget {
    /// 在body末尾挂载控件，页面没有body时返回None
    pub fn mount(dom: &RcDom) -> Option<Self> {
        let body = find_first(dom, "body")?;

        let root = create_element("div", Some(dom_config::FLOATING_WIDGET_CLASS), None);
        let dock = create_element("div", Some("pt-floating-dock"), None);
        let content = create_element("div", Some("pt-floating-content"), None);

        let start = create_element(
            "button",
            Some("pt-control-btn pt-btn-start pt-btn-main"),
            Some(start_label(WidgetState::Idle)),
        );
        let stop = create_element(
            "button",
            Some("pt-control-btn pt-btn-stop pt-hidden"),
            Some("Stop"),
        );
        let clear = create_element("button", Some("pt-control-btn pt-btn-clear"), Some("Clear"));
        let dismiss = create_element(
            "button",
            Some("pt-control-btn pt-btn-cancel"),
            Some(dismiss_label(false)),
        );

        append_child(&content, start.clone());
        append_child(&content, stop.clone());
        append_child(&content, clear);
        append_child(&content, dismiss.clone());
        append_child(&root, dock);
        append_child(&root, content);
        append_child(&body, root.clone());

        Some(Self {
            root,
            start,
            stop,
            dismiss,
        })
    }

    pub fn root(&self) -> &Handle {
        &self.root
    }

    /// 从页面摘除
    pub fn unmount(&self) {
        remove_node(&self.root);
    }

    /// 按状态刷新按钮的文字和类
    pub fn render(&self, state: WidgetState, translations_hidden: bool) {
        let controls = visible_controls(state);

        if controls.contains(&Control::Start) {
            remove_class(&self.start, dom_config::HIDDEN_CLASS);
            add_class(&self.stop, dom_config::HIDDEN_CLASS);
        } else {
            add_class(&self.start, dom_config::HIDDEN_CLASS);
            remove_class(&self.stop, dom_config::HIDDEN_CLASS);
        }

        match state {
            WidgetState::Translated => {
                remove_class(&self.start, "pt-btn-start");
                add_class(&self.start, "pt-btn-translated");
            }
            _ => {
                add_class(&self.start, "pt-btn-start");
                remove_class(&self.start, "pt-btn-translated");
            }
        }
        set_text(&self.start, start_label(state));

        if translations_hidden {
            remove_class(&self.dismiss, "pt-btn-cancel");
            add_class(&self.dismiss, "pt-btn-show");
        } else {
            remove_class(&self.dismiss, "pt-btn-show");
            add_class(&self.dismiss, "pt-btn-cancel");
        }
        set_text(&self.dismiss, dismiss_label(translations_hidden));
    }
}
