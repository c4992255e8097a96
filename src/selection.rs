//! 划词弹窗与鼠标气泡
//!
//! 同一时刻最多一个弹窗和一个气泡。气泡的译文异步返回，用代号（generation）
//! 判断返回时它是否仍是当前气泡，过期的结果直接丢弃。

use tracing::debug;

use crate::api_constants::{layout_config, ui_messages};
use crate::translator::{Translate, TranslationResult};
use crate::utils::is_english;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// 选区在视口中的包围盒
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

/// 计算鼠标气泡的左上角位置（视口坐标）
///
/// 默认在指针下方水平居中；超出视口底部且上方放得下时翻到上方，
/// 都放不下时贴住上边距。水平方向夹在视口边距之内。
pub fn place_bubble(pointer: Point, bubble: Size, viewport: Size) -> Point {
    let gap = layout_config::BUBBLE_GAP;
    let margin = layout_config::VIEWPORT_MARGIN;

    let mut top = pointer.y + gap;
    if top + bubble.height > viewport.height {
        let above = pointer.y - gap - bubble.height;
        top = if above > 0.0 { above } else { above.max(margin) };
    }

    // 先贴左边距再贴右边距，气泡比视口还宽时以右边为准
    let left = (pointer.x - bubble.width / 2.0)
        .max(margin)
        .min(viewport.width - bubble.width - margin);

    Point::new(left, top)
}

/// 事件目标所在位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Page,
    Popup,
    Bubble,
}

/// 弹窗上的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    Translate,
    Listen,
}

/// 划词弹窗，页面坐标
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub position: Point,
    pub text: String,
}

impl Popup {
    pub fn actions(&self) -> [PopupAction; 2] {
        [PopupAction::Translate, PopupAction::Listen]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Anchor {
    /// 固定在弹窗下方
    Fixed,
    /// 跟随指针，内容变化后重新计算位置
    Pointer(Point),
}

/// 译文气泡
#[derive(Debug, Clone, PartialEq)]
pub struct Bubble {
    pub position: Point,
    pub text: String,
    generation: u64,
    anchor: Anchor,
}

/// 打开气泡时领取的凭证，译文返回时凭它更新气泡
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BubbleTicket(u64);

/// 页面上的划词浮层
#[derive(Debug)]
pub struct Overlay {
    viewport: Size,
    popup: Option<Popup>,
    bubble: Option<Bubble>,
    generation: u64,
}

impl Overlay {
    pub fn new(viewport: Size) -> Self {
        Self {
            viewport,
            popup: None,
            bubble: None,
            generation: 0,
        }
    }

    pub fn popup(&self) -> Option<&Popup> {
        self.popup.as_ref()
    }

    pub fn bubble(&self) -> Option<&Bubble> {
        self.bubble.as_ref()
    }

    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    /// 松开鼠标：选中英文时在选区右下角打开弹窗
    pub fn on_mouse_up(
        &mut self,
        selection_mode: bool,
        target: PointerTarget,
        selection: &str,
        rect: Rect,
        scroll: Point,
    ) -> Option<&Popup> {
        if !selection_mode || target != PointerTarget::Page {
            return None;
        }

        let text = selection.trim();
        if !is_english(text) {
            return None;
        }

        self.dismiss();
        self.popup = Some(Popup {
            position: Point::new(
                rect.right + scroll.x,
                rect.bottom + scroll.y + layout_config::POPUP_OFFSET_Y,
            ),
            text: text.to_string(),
        });
        self.popup.as_ref()
    }

    /// 按下鼠标：点在浮层之外时关闭弹窗和气泡，返回是否关闭了东西
    pub fn on_mouse_down(&mut self, target: PointerTarget) -> bool {
        if target != PointerTarget::Page {
            return false;
        }
        let had_any = self.popup.is_some() || self.bubble.is_some();
        self.dismiss();
        had_any
    }

    pub fn dismiss(&mut self) {
        self.popup = None;
        self.bubble = None;
    }

    fn open_bubble(&mut self, position: Point, anchor: Anchor) -> BubbleTicket {
        self.generation += 1;
        self.bubble = Some(Bubble {
            position,
            text: ui_messages::TRANSLATING.to_string(),
            generation: self.generation,
            anchor,
        });
        BubbleTicket(self.generation)
    }

    /// 弹窗的翻译操作：弹窗保留，在其下方打开气泡，返回待翻译文本和凭证
    pub fn popup_translate(&mut self) -> Option<(String, BubbleTicket)> {
        let popup = self.popup.as_ref()?;
        let text = popup.text.clone();
        let position = Point::new(
            popup.position.x,
            popup.position.y + layout_config::BUBBLE_BELOW_POPUP,
        );
        let ticket = self.open_bubble(position, Anchor::Fixed);
        Some((text, ticket))
    }

    /// 弹窗的朗读操作：弹窗保留，返回待朗读文本
    pub fn popup_listen(&self) -> Option<String> {
        self.popup.as_ref().map(|popup| popup.text.clone())
    }

    /// 在指针处打开气泡（快捷键触发）
    pub fn bubble_at_pointer(&mut self, pointer: Point, size: Size) -> BubbleTicket {
        self.popup = None;
        let position = place_bubble(pointer, size, self.viewport);
        self.open_bubble(position, Anchor::Pointer(pointer))
    }

    /// 用译文结果更新气泡；凭证过期时丢弃并返回false
    ///
    /// `size` 是新内容的尺寸，跟随指针的气泡据此重新定位。
    pub fn resolve_bubble(
        &mut self,
        ticket: BubbleTicket,
        result: &TranslationResult,
        size: Size,
    ) -> bool {
        let viewport = self.viewport;
        let Some(bubble) = self.bubble.as_mut().filter(|b| b.generation == ticket.0) else {
            debug!("气泡已关闭或被替换，丢弃译文");
            return false;
        };

        bubble.text = result.bubble_text().to_string();
        if let Anchor::Pointer(pointer) = bubble.anchor {
            bubble.position = place_bubble(pointer, size, viewport);
        }
        true
    }

    /// 翻译并更新气泡
    pub async fn translate_into<T>(
        &mut self,
        translator: &T,
        text: &str,
        ticket: BubbleTicket,
        size: Size,
    ) -> TranslationResult
    where
        T: Translate + ?Sized,
    {
        let result = translator.translate(text).await;
        self.resolve_bubble(ticket, &result, size);
        result
    }
}
