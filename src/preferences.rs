//! 偏好设置持久化
//!
//! 以JSON文件保存划词模式、悬浮模式、快捷键开关、服务商及凭据和最近一次的输入输出。
//! 每次修改都会立即落盘并返回一条变更通知，由会话或消息桥应用。

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::{Provider, ProviderKind};
use crate::error::Result;
use crate::translation_error;

/// 持久化的偏好
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub selection_mode: bool,
    pub floating_mode: bool,
    pub shortcuts_enabled: bool,
    pub provider: ProviderKind,
    pub baidu_app_id: Option<String>,
    pub baidu_secret: Option<String>,
    pub last_input: Option<String>,
    pub last_output: Option<String>,
}

impl Preferences {
    /// 按偏好构造服务商
    pub fn provider(&self) -> Result<Provider> {
        Provider::from_parts(
            self.provider,
            self.baidu_app_id.as_deref(),
            self.baidu_secret.as_deref(),
        )
    }
}

/// 一次偏好变更通知
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreferenceChange {
    SelectionMode(bool),
    FloatingMode(bool),
    ShortcutsEnabled(bool),
    Provider(ProviderKind),
    Credentials,
    LastText,
}

/// 偏好存储：文件路径 + 当前值
#[derive(Debug)]
pub struct PreferenceStore {
    path: PathBuf,
    prefs: Preferences,
}

impl PreferenceStore {
    /// 默认偏好文件位置
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_default()
            .join("page-translator")
            .join("preferences.json")
    }

    /// 读取偏好文件，文件不存在时使用默认值
    ///
    /// 文件损坏时同样回退到默认值并给出警告。
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.exists() {
            debug!("偏好文件不存在，使用默认值: {}", path.display());
            return Ok(Self {
                path,
                prefs: Preferences::default(),
            });
        }

        let data = fs::read_to_string(&path)
            .map_err(|e| translation_error!(file_op, path.display(), "读取", e))?;

        let prefs = match serde_json::from_str(&data) {
            Ok(prefs) => prefs,
            Err(e) => {
                warn!("⚠️  偏好文件解析失败，使用默认值: {}", e);
                Preferences::default()
            }
        };

        Ok(Self { path, prefs })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    /// 写回磁盘
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| translation_error!(file_op, parent.display(), "创建目录", e))?;
        }

        let data = serde_json::to_string_pretty(&self.prefs)?;
        fs::write(&self.path, data)
            .map_err(|e| translation_error!(file_op, self.path.display(), "写入", e))?;
        debug!("偏好已保存: {}", self.path.display());
        Ok(())
    }

    /// 按键名修改一项偏好并落盘
    ///
    /// 支持的键：`selection_mode`、`floating_mode`、`shortcuts_enabled`、
    /// `provider`、`baidu_app_id`、`baidu_secret`。
    pub fn set(&mut self, key: &str, value: &str) -> Result<PreferenceChange> {
        let change = match key {
            "selection_mode" => {
                self.prefs.selection_mode = parse_flag(key, value)?;
                PreferenceChange::SelectionMode(self.prefs.selection_mode)
            }
            "floating_mode" => {
                self.prefs.floating_mode = parse_flag(key, value)?;
                PreferenceChange::FloatingMode(self.prefs.floating_mode)
            }
            "shortcuts_enabled" => {
                self.prefs.shortcuts_enabled = parse_flag(key, value)?;
                PreferenceChange::ShortcutsEnabled(self.prefs.shortcuts_enabled)
            }
            "provider" => {
                self.prefs.provider = match value.trim().to_ascii_lowercase().as_str() {
                    "google" => ProviderKind::Google,
                    "baidu" => ProviderKind::Baidu,
                    other => {
                        return Err(translation_error!(
                            input_validation,
                            other,
                            "服务商只能是 google 或 baidu"
                        ))
                    }
                };
                PreferenceChange::Provider(self.prefs.provider)
            }
            "baidu_app_id" => {
                self.prefs.baidu_app_id = non_empty(value);
                PreferenceChange::Credentials
            }
            "baidu_secret" => {
                self.prefs.baidu_secret = non_empty(value);
                PreferenceChange::Credentials
            }
            other => {
                return Err(translation_error!(config, other, "未知的偏好键"));
            }
        };

        self.save()?;
        Ok(change)
    }

    /// 记录最近一次翻译的输入和输出
    pub fn record_last(&mut self, input: &str, output: &str) -> Result<PreferenceChange> {
        self.prefs.last_input = Some(input.to_string());
        self.prefs.last_output = Some(output.to_string());
        self.save()?;
        Ok(PreferenceChange::LastText)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" => Ok(true),
        "false" | "off" | "0" | "no" => Ok(false),
        _ => Err(translation_error!(
            input_validation,
            format!("{}={}", key, value),
            "需要布尔值 (true/false)"
        )),
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
