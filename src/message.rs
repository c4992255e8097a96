//! 消息桥
//!
//! 页面与后台之间的请求/应答协议，按行传输JSON。翻译和朗读请求等待结果后应答；
//! 开关类请求只更新偏好，不产生应答。

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::preferences::{PreferenceChange, PreferenceStore};
use crate::translator::{to_data_url, Speak, Translate, TranslationResult};

/// 请求
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Request {
    TranslateText { text: String },
    SpeakText { text: String },
    ToggleFloating { value: bool },
    ToggleShortcuts { value: bool },
}

/// 应答
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Translation {
        translation: String,
    },
    Audio {
        #[serde(rename = "audioData")]
        audio_data: String,
    },
    SpeechFailed {
        success: bool,
        error: String,
    },
    Error {
        error: String,
    },
}

impl From<TranslationResult> for Response {
    fn from(result: TranslationResult) -> Self {
        match result {
            TranslationResult::Success(translation) => Response::Translation { translation },
            TranslationResult::Failure(kind) => Response::Error { error: kind.code() },
        }
    }
}

/// 无法解析的请求行的错误代码
pub const INVALID_REQUEST: &str = "INVALID_REQUEST";

pub struct Bridge<'a> {
    translator: &'a dyn Translate,
    speaker: &'a dyn Speak,
    store: Option<PreferenceStore>,
    floating_mode: bool,
    shortcuts_enabled: bool,
    changes: Vec<PreferenceChange>,
}

impl<'a> Bridge<'a> {
    pub fn new(translator: &'a dyn Translate, speaker: &'a dyn Speak) -> Self {
        Self {
            translator,
            speaker,
            store: None,
            floating_mode: false,
            shortcuts_enabled: false,
            changes: Vec::new(),
        }
    }

    /// 绑定偏好存储，开关请求会写回磁盘
    pub fn with_store(mut self, store: PreferenceStore) -> Self {
        let prefs = store.preferences();
        self.floating_mode = prefs.floating_mode;
        self.shortcuts_enabled = prefs.shortcuts_enabled;
        self.store = Some(store);
        self
    }

    pub fn floating_mode(&self) -> bool {
        self.floating_mode
    }

    pub fn shortcuts_enabled(&self) -> bool {
        self.shortcuts_enabled
    }

    /// 处理一条请求；开关请求返回None
    pub async fn handle(&mut self, request: Request) -> Option<Response> {
        match request {
            Request::TranslateText { text } => {
                let result = self.translator.translate(&text).await;
                Some(result.into())
            }
            Request::SpeakText { text } => Some(match self.speaker.synthesize(&text).await {
                Ok(audio) => Response::Audio {
                    audio_data: to_data_url(&audio),
                },
                Err(e) => {
                    error!("Audio playback failed: {}", e);
                    Response::SpeechFailed {
                        success: false,
                        error: e.to_string(),
                    }
                }
            }),
            Request::ToggleFloating { value } => {
                self.persist("floating_mode", value);
                self.apply(PreferenceChange::FloatingMode(value));
                None
            }
            Request::ToggleShortcuts { value } => {
                self.persist("shortcuts_enabled", value);
                self.apply(PreferenceChange::ShortcutsEnabled(value));
                None
            }
        }
    }

    /// 应用一条偏好变更并排入待分发队列
    pub fn apply(&mut self, change: PreferenceChange) {
        match change {
            PreferenceChange::FloatingMode(enabled) => self.floating_mode = enabled,
            PreferenceChange::ShortcutsEnabled(enabled) => self.shortcuts_enabled = enabled,
            _ => {}
        }
        self.changes.push(change);
    }

    /// 取出尚未分发给会话和交互状态的变更
    pub fn take_changes(&mut self) -> Vec<PreferenceChange> {
        std::mem::take(&mut self.changes)
    }

    fn persist(&mut self, key: &str, value: bool) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        match store.set(key, &value.to_string()) {
            Ok(change) => debug!("偏好已保存: {:?}", change),
            Err(e) => warn!("⚠️  偏好保存失败: {}", e),
        }
    }

    /// 逐行读取请求并写出应答，返回写出的应答数量
    pub async fn serve_lines<R, W>(&mut self, reader: R, mut writer: W) -> Result<usize>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();
        let mut answered = 0;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Request>(line) {
                Ok(request) => self.handle(request).await,
                Err(e) => {
                    warn!("⚠️  无法解析的请求: {}", e);
                    Some(Response::Error {
                        error: INVALID_REQUEST.to_string(),
                    })
                }
            };

            if let Some(response) = response {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
                answered += 1;
            }
        }

        info!("🔌 消息桥结束，共应答 {} 条", answered);
        Ok(answered)
    }
}
