//! 键盘快捷键
//!
//! Alt+A 翻译选中的英文并在指针处显示气泡；Alt+S 朗读选中文本。
//! 只有在设置中启用快捷键时才生效。

use crate::selection::Point;
use crate::utils::is_english;

/// 一次按键
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyChord {
    pub alt: bool,
    /// 按键产生的字符，如 `a`、`A`
    pub key: String,
    /// 物理键位，如 `KeyA`
    pub code: String,
}

impl KeyChord {
    pub fn alt(key: &str) -> Self {
        Self {
            alt: true,
            key: key.to_string(),
            code: format!("Key{}", key.to_uppercase()),
        }
    }

    fn is(&self, letter: char) -> bool {
        let code = format!("Key{}", letter.to_ascii_uppercase());
        self.code == code || self.key.eq_ignore_ascii_case(&letter.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    Translate,
    Speak,
}

/// 匹配快捷键，返回要执行的动作
pub fn match_shortcut(enabled: bool, chord: &KeyChord, selection: &str) -> Option<ShortcutAction> {
    if !enabled || !chord.alt {
        return None;
    }

    let text = selection.trim();
    if chord.is('a') && is_english(text) {
        Some(ShortcutAction::Translate)
    } else if chord.is('s') && !text.is_empty() {
        Some(ShortcutAction::Speak)
    } else {
        None
    }
}

/// 记录最近一次指针位置，供快捷键气泡定位
#[derive(Debug, Default, Clone, Copy)]
pub struct PointerTracker {
    last: Point,
}

impl PointerTracker {
    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        self.last = Point::new(x, y);
    }

    pub fn position(&self) -> Point {
        self.last
    }
}
