//! 页面交互状态
//!
//! 持有划词模式和快捷键两个开关，把鼠标与键盘事件分发给划词浮层，
//! 并在偏好变更时更新开关。

use tracing::debug;

use crate::preferences::{PreferenceChange, Preferences};
use crate::selection::{BubbleTicket, Overlay, Point, PointerTarget, Popup, Rect, Size};
use crate::shortcuts::{match_shortcut, KeyChord, PointerTracker, ShortcutAction};

/// 快捷键触发的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShortcutOutcome {
    /// 已在指针处打开气泡，待翻译
    Translate { text: String, ticket: BubbleTicket },
    /// 待朗读
    Speak(String),
}

#[derive(Debug)]
pub struct Interaction {
    selection_mode: bool,
    shortcuts_enabled: bool,
    overlay: Overlay,
    pointer: PointerTracker,
}

impl Interaction {
    pub fn new(prefs: &Preferences, viewport: Size) -> Self {
        Self {
            selection_mode: prefs.selection_mode,
            shortcuts_enabled: prefs.shortcuts_enabled,
            overlay: Overlay::new(viewport),
            pointer: PointerTracker::default(),
        }
    }

    pub fn selection_mode(&self) -> bool {
        self.selection_mode
    }

    pub fn shortcuts_enabled(&self) -> bool {
        self.shortcuts_enabled
    }

    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    pub fn overlay_mut(&mut self) -> &mut Overlay {
        &mut self.overlay
    }

    /// 应用一条偏好变更，返回开关是否受影响
    pub fn apply(&mut self, change: &PreferenceChange) -> bool {
        match *change {
            PreferenceChange::SelectionMode(enabled) => {
                debug!("划词模式: {}", enabled);
                self.selection_mode = enabled;
                true
            }
            PreferenceChange::ShortcutsEnabled(enabled) => {
                debug!("快捷键: {}", enabled);
                self.shortcuts_enabled = enabled;
                true
            }
            _ => false,
        }
    }

    pub fn on_mouse_move(&mut self, x: f64, y: f64) {
        self.pointer.on_mouse_move(x, y);
    }

    pub fn on_mouse_up(
        &mut self,
        target: PointerTarget,
        selection: &str,
        rect: Rect,
        scroll: Point,
    ) -> Option<&Popup> {
        self.overlay
            .on_mouse_up(self.selection_mode, target, selection, rect, scroll)
    }

    pub fn on_mouse_down(&mut self, target: PointerTarget) -> bool {
        self.overlay.on_mouse_down(target)
    }

    /// 按键：命中 Alt+A 时在指针处打开气泡，命中 Alt+S 时返回朗读文本
    ///
    /// `bubble_size` 是“翻译中”占位内容的尺寸。
    pub fn on_key_down(
        &mut self,
        chord: &KeyChord,
        selection: &str,
        bubble_size: Size,
    ) -> Option<ShortcutOutcome> {
        let text = selection.trim();
        match match_shortcut(self.shortcuts_enabled, chord, text)? {
            ShortcutAction::Translate => {
                let ticket = self
                    .overlay
                    .bubble_at_pointer(self.pointer.position(), bubble_size);
                Some(ShortcutOutcome::Translate {
                    text: text.to_string(),
                    ticket,
                })
            }
            ShortcutAction::Speak => Some(ShortcutOutcome::Speak(text.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translator::TranslationResult;

    const VIEWPORT: Size = Size {
        width: 1000.0,
        height: 800.0,
    };

    fn rect() -> Rect {
        Rect {
            left: 100.0,
            top: 200.0,
            right: 140.0,
            bottom: 220.0,
        }
    }

    #[test]
    fn test_starts_from_preferences() {
        let prefs = Preferences {
            selection_mode: true,
            shortcuts_enabled: false,
            ..Default::default()
        };
        let interaction = Interaction::new(&prefs, VIEWPORT);
        assert!(interaction.selection_mode());
        assert!(!interaction.shortcuts_enabled());
    }

    #[test]
    fn test_selection_mode_change_gates_popup() {
        let mut interaction = Interaction::new(&Preferences::default(), VIEWPORT);
        assert!(interaction
            .on_mouse_up(PointerTarget::Page, "Hello", rect(), Point::default())
            .is_none());

        assert!(interaction.apply(&PreferenceChange::SelectionMode(true)));
        assert!(interaction
            .on_mouse_up(PointerTarget::Page, "Hello", rect(), Point::default())
            .is_some());

        interaction.apply(&PreferenceChange::SelectionMode(false));
        interaction.on_mouse_down(PointerTarget::Page);
        assert!(interaction
            .on_mouse_up(PointerTarget::Page, "Hello", rect(), Point::default())
            .is_none());
    }

    #[test]
    fn test_shortcut_change_gates_keys() {
        let mut interaction = Interaction::new(&Preferences::default(), VIEWPORT);
        let chord = KeyChord::alt("a");
        assert!(interaction
            .on_key_down(&chord, "Hello", Size::new(100.0, 30.0))
            .is_none());

        interaction.apply(&PreferenceChange::ShortcutsEnabled(true));
        interaction.on_mouse_move(500.0, 100.0);
        let outcome = interaction
            .on_key_down(&chord, " Hello ", Size::new(100.0, 30.0))
            .unwrap();
        let ShortcutOutcome::Translate { text, ticket } = outcome else {
            panic!("expected a translate outcome");
        };
        assert_eq!(text, "Hello");

        let bubble = interaction.overlay().bubble().unwrap();
        assert_eq!(bubble.position, Point::new(450.0, 115.0));
        assert!(interaction.overlay_mut().resolve_bubble(
            ticket,
            &TranslationResult::Success("你好".into()),
            Size::new(60.0, 30.0)
        ));
        assert_eq!(interaction.overlay().bubble().unwrap().text, "你好");
    }

    #[test]
    fn test_speak_shortcut_returns_text() {
        let prefs = Preferences {
            shortcuts_enabled: true,
            ..Default::default()
        };
        let mut interaction = Interaction::new(&prefs, VIEWPORT);
        assert_eq!(
            interaction.on_key_down(&KeyChord::alt("s"), "你好", Size::default()),
            Some(ShortcutOutcome::Speak("你好".to_string()))
        );
        assert!(interaction.overlay().bubble().is_none());
    }

    #[test]
    fn test_unrelated_change_is_ignored() {
        let mut interaction = Interaction::new(&Preferences::default(), VIEWPORT);
        assert!(!interaction.apply(&PreferenceChange::FloatingMode(true)));
        assert!(!interaction.apply(&PreferenceChange::Credentials));
    }
}
