//! 配置管理模块
//!
//! 提供CLI参数解析、翻译服务商选择和网关配置管理功能

// 标准库导入
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

// 第三方crate导入
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

// 本地模块导入
use crate::api_constants::{api_config, service_config};
use crate::error::Result;
use crate::translation_error;

/// 服务商种类（不含凭据），用于CLI参数和偏好持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// 公共gtx端点，无需凭据
    #[default]
    Google,
    /// 百度通用翻译，需要appid与密钥
    Baidu,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Google => write!(f, "google"),
            ProviderKind::Baidu => write!(f, "baidu"),
        }
    }
}

/// 翻译服务商
#[derive(Clone, PartialEq, Eq)]
pub enum Provider {
    Google,
    Baidu { app_id: String, secret: String },
}

impl Provider {
    /// 由种类和可选凭据构造服务商
    ///
    /// 选择百度但缺少任一凭据时返回配置错误。
    pub fn from_parts(
        kind: ProviderKind,
        app_id: Option<&str>,
        secret: Option<&str>,
    ) -> Result<Self> {
        match kind {
            ProviderKind::Google => Ok(Provider::Google),
            ProviderKind::Baidu => {
                let app_id = app_id.map(str::trim).filter(|s| !s.is_empty());
                let secret = secret.map(str::trim).filter(|s| !s.is_empty());
                match (app_id, secret) {
                    (Some(app_id), Some(secret)) => Ok(Provider::Baidu {
                        app_id: app_id.to_string(),
                        secret: secret.to_string(),
                    }),
                    _ => Err(translation_error!(
                        config,
                        "provider",
                        "百度翻译需要同时提供appid和密钥"
                    )),
                }
            }
        }
    }

    pub fn kind(&self) -> ProviderKind {
        match self {
            Provider::Google => ProviderKind::Google,
            Provider::Baidu { .. } => ProviderKind::Baidu,
        }
    }
}

// 凭据不进日志
impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Google => write!(f, "Google"),
            Provider::Baidu { app_id, .. } => f
                .debug_struct("Baidu")
                .field("app_id", app_id)
                .field("secret", &"****")
                .finish(),
        }
    }
}

/// 翻译网关配置结构体
///
/// 支持Builder模式进行链式配置，所有接口地址均可替换（测试时指向本地监听端口）。
///
/// # Examples
///
/// ```rust
/// use page_translator::config::GatewayConfig;
/// use std::time::Duration;
///
/// let config = GatewayConfig::new()
///     .target_language("zh-TW")
///     .with_timeout(Duration::from_secs(3));
/// assert_eq!(config.target_lang(), "zh-TW");
/// ```
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    provider: Provider,
    source_lang: String,
    target_lang: String,
    tts_lang: String,
    timeout: Duration,
    translate_url: String,
    tts_url: String,
    baidu_url: String,
    user_agent: String,
}

impl GatewayConfig {
    /// 创建新的配置实例
    ///
    /// 默认值：
    /// - 服务商: Google gtx
    /// - 语言: en -> zh-CN，朗读语言 en
    /// - 超时: 5秒
    pub fn new() -> Self {
        Self {
            provider: Provider::Google,
            source_lang: service_config::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            tts_lang: service_config::DEFAULT_TTS_LANG.to_string(),
            timeout: Duration::from_secs(service_config::REQUEST_TIMEOUT_SECONDS),
            translate_url: api_config::GOOGLE_TRANSLATE_URL.to_string(),
            tts_url: api_config::GOOGLE_TTS_URL.to_string(),
            baidu_url: api_config::BAIDU_API_URL.to_string(),
            user_agent: service_config::DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn tts_lang(&self) -> &str {
        &self.tts_lang
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn translate_url(&self) -> &str {
        &self.translate_url
    }

    pub fn tts_url(&self) -> &str {
        &self.tts_url
    }

    pub fn baidu_url(&self) -> &str {
        &self.baidu_url
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// 设置服务商
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// 设置目标语言代码
    pub fn target_language(mut self, lang: &str) -> Self {
        self.target_lang = lang.to_string();
        self
    }

    /// 设置单次请求等待上限
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// 设置翻译接口地址
    pub fn with_translate_url(mut self, url: &str) -> Self {
        self.translate_url = url.to_string();
        self
    }

    /// 设置朗读接口地址
    pub fn with_tts_url(mut self, url: &str) -> Self {
        self.tts_url = url.to_string();
        self
    }

    /// 设置百度接口地址
    pub fn with_baidu_url(mut self, url: &str) -> Self {
        self.baidu_url = url.to_string();
        self
    }

    /// 设置User-Agent
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// CLI参数结构
#[derive(Parser)]
#[command(author, version, about = "网页英文逐段翻译与朗读CLI工具", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// 详细输出模式
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// 翻译服务商 (覆盖偏好设置)
    #[arg(long, global = true, value_enum)]
    pub provider: Option<ProviderKind>,

    /// 百度翻译appid
    #[arg(long, global = true)]
    pub baidu_app_id: Option<String>,

    /// 百度翻译密钥
    #[arg(long, global = true)]
    pub baidu_secret: Option<String>,

    /// 单次请求超时时间（秒）
    #[arg(long, global = true, default_value_t = service_config::REQUEST_TIMEOUT_SECONDS)]
    pub timeout_secs: u64,

    /// 偏好设置文件路径
    #[arg(long, global = true, value_name = "FILE")]
    pub prefs: Option<PathBuf>,
}

/// 子命令
#[derive(Subcommand)]
pub enum Command {
    /// 逐段翻译HTML页面（文件、网址或目录）
    Page(PageArgs),

    /// 翻译一段文本
    Text {
        /// 待翻译文本
        text: String,
    },

    /// 获取文本的朗读音频
    Speak {
        /// 待朗读文本
        text: String,

        /// 音频输出路径
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// 以JSON行协议在stdin/stdout上提供消息桥
    Bridge,

    /// 查看或修改偏好设置
    Prefs {
        #[command(subcommand)]
        action: Option<PrefsAction>,
    },
}

/// 页面翻译参数
#[derive(Args)]
pub struct PageArgs {
    /// 输入HTML文件、目录或网页URL
    #[arg(short, long, value_name = "FILE_OR_URL")]
    pub input: String,

    /// 输出文件路径 (可选，默认为输入文件名+语言代码)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// 在页面中挂载悬浮控件 (覆盖偏好设置)
    #[arg(long)]
    pub floating: bool,

    /// 显示统计报告
    #[arg(long)]
    pub stats: bool,

    /// 目录模式下同时处理的页面数量
    #[arg(long, default_value = "4")]
    pub concurrent_pages: usize,

    /// 爬取超时时间（秒）
    #[arg(long, default_value = "30", help = "网页爬取的超时时间（秒）")]
    pub crawl_timeout: u64,
}

/// 偏好设置子命令
#[derive(Subcommand)]
pub enum PrefsAction {
    /// 显示当前偏好
    Show,
    /// 修改一项偏好
    Set {
        /// 偏好键，如 selection_mode / floating_mode / provider
        key: String,
        /// 新值
        value: String,
    },
}
