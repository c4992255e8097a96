//! 翻译网关
//!
//! 每次调用只发出一个外部请求，并附加固定的等待上限。超时、传输失败、
//! 服务商业务错误和响应格式错误都在这里折叠为带标签的 `TranslationResult`，
//! 不会以错误形式传播到页面注释器或界面层。

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::api_constants::{baidu_error_message, is_valid_api_url, service_config, ui_messages};
use crate::config::{GatewayConfig, Provider};
use crate::error::Result;
use crate::providers;
use crate::translation_error;

/// 失败种类
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// 等待服务商超过上限
    Timeout,
    /// 传输失败或非2xx状态
    NetworkError,
    /// 服务商返回业务错误码
    ProviderError(String),
    /// 响应结构不符合预期
    ParseError,
}

impl FailureKind {
    /// 消息桥中使用的错误代码
    pub fn code(&self) -> String {
        match self {
            FailureKind::Timeout => "TIMEOUT".to_string(),
            FailureKind::NetworkError => "FAILED".to_string(),
            FailureKind::ProviderError(code) => format!("PROVIDER_{}", code),
            FailureKind::ParseError => "PARSE".to_string(),
        }
    }

    /// 页面内译文行显示的文本
    pub fn inline_message(&self) -> &'static str {
        match self {
            FailureKind::Timeout => ui_messages::INLINE_TIMEOUT,
            _ => ui_messages::INLINE_FAILED,
        }
    }

    /// 划词气泡显示的文本
    pub fn bubble_message(&self) -> &'static str {
        match self {
            FailureKind::Timeout => ui_messages::BUBBLE_TIMEOUT,
            FailureKind::NetworkError | FailureKind::ParseError => ui_messages::BUBBLE_FAILED,
            FailureKind::ProviderError(code) => {
                baidu_error_message(code).unwrap_or(ui_messages::BUBBLE_UNKNOWN)
            }
        }
    }
}

/// 翻译结果：成功文本或失败种类，不存在部分填充的状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationResult {
    Success(String),
    Failure(FailureKind),
}

impl TranslationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, TranslationResult::Success(_))
    }

    /// 页面内渲染用文本
    pub fn inline_text(&self) -> &str {
        match self {
            TranslationResult::Success(text) => text,
            TranslationResult::Failure(kind) => kind.inline_message(),
        }
    }

    /// 气泡渲染用文本
    pub fn bubble_text(&self) -> &str {
        match self {
            TranslationResult::Success(text) => text,
            TranslationResult::Failure(kind) => kind.bubble_message(),
        }
    }
}

/// 单次翻译请求，按调用构造后不再修改
#[derive(Debug, Clone)]
pub struct TranslationRequest {
    source_text: String,
    target_locale: String,
    provider: Provider,
}

impl TranslationRequest {
    pub fn new(source_text: &str, target_locale: &str, provider: Provider) -> Self {
        Self {
            source_text: source_text.to_string(),
            target_locale: target_locale.to_string(),
            provider,
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn target_locale(&self) -> &str {
        &self.target_locale
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }
}

/// 翻译能力的抽象，页面注释器和划词界面只依赖这个trait
#[async_trait]
pub trait Translate: Send + Sync {
    /// 翻译一段文本
    async fn translate(&self, text: &str) -> TranslationResult;

    /// 服务名称，用于日志
    fn provider_name(&self) -> &str;
}

/// 朗读能力
#[async_trait]
pub trait Speak: Send + Sync {
    /// 合成一段文本的音频
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;
}

/// 翻译网关
pub struct Gateway {
    client: Client,
    config: GatewayConfig,
}

impl Gateway {
    /// 使用配置创建网关
    pub fn new(config: GatewayConfig) -> Result<Self> {
        if config.timeout().is_zero() {
            return Err(translation_error!(config, "timeout", "超时时间必须大于0"));
        }
        for (field, url) in [
            ("translate_url", config.translate_url()),
            ("tts_url", config.tts_url()),
            ("baidu_url", config.baidu_url()),
        ] {
            if !is_valid_api_url(url) {
                return Err(translation_error!(config, field, format!("接口地址无效: {}", url)));
            }
        }

        let client = Client::builder()
            .user_agent(config.user_agent())
            .build()
            .map_err(|e| translation_error!(config, "http_client", e))?;
        Ok(Self::with_client(config, client))
    }

    /// 使用现成的HTTP客户端创建网关
    pub fn with_client(config: GatewayConfig, client: Client) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// 执行一次翻译请求，超过等待上限时放弃进行中的请求
    pub async fn execute(&self, request: &TranslationRequest) -> TranslationResult {
        let deadline = self.config.timeout();
        match tokio::time::timeout(deadline, self.dispatch(request)).await {
            Ok(result) => {
                if let TranslationResult::Failure(kind) = &result {
                    warn!("❌ 翻译失败 [{}]: {:?}", self.provider_name(), kind);
                }
                result
            }
            Err(_) => {
                warn!("⏱️  翻译请求超时 ({:?})", deadline);
                TranslationResult::Failure(FailureKind::Timeout)
            }
        }
    }

    async fn dispatch(&self, request: &TranslationRequest) -> TranslationResult {
        match request.provider() {
            Provider::Google => self.fetch_google(request).await,
            Provider::Baidu { app_id, secret } => {
                self.fetch_baidu(request, app_id, secret).await
            }
        }
    }

    async fn fetch_google(&self, request: &TranslationRequest) -> TranslationResult {
        let url = match providers::google_translate_url(
            self.config.translate_url(),
            self.config.source_lang(),
            request.target_locale(),
            request.source_text(),
        ) {
            Ok(url) => url,
            Err(e) => {
                error!("翻译接口地址无效: {}", e);
                return TranslationResult::Failure(FailureKind::NetworkError);
            }
        };

        match self.get_text(url).await {
            Ok(body) => providers::parse_google_response(&body),
            Err(kind) => TranslationResult::Failure(kind),
        }
    }

    async fn fetch_baidu(
        &self,
        request: &TranslationRequest,
        app_id: &str,
        secret: &str,
    ) -> TranslationResult {
        let salt = chrono::Utc::now().timestamp_millis().to_string();
        let url = match providers::baidu_translate_url(
            self.config.baidu_url(),
            app_id,
            secret,
            &salt,
            self.config.source_lang(),
            service_config::BAIDU_TARGET_LANG,
            request.source_text(),
        ) {
            Ok(url) => url,
            Err(e) => {
                error!("百度接口地址无效: {}", e);
                return TranslationResult::Failure(FailureKind::NetworkError);
            }
        };

        match self.get_text(url).await {
            Ok(body) => providers::parse_baidu_response(&body),
            Err(kind) => TranslationResult::Failure(kind),
        }
    }

    async fn get_text(&self, url: url::Url) -> std::result::Result<String, FailureKind> {
        debug!("请求: {}", url.host_str().unwrap_or("unknown"));
        let response = self.client.get(url).send().await.map_err(classify)?;

        if !response.status().is_success() {
            warn!("翻译接口返回错误状态: {}", response.status());
            return Err(FailureKind::NetworkError);
        }

        response.text().await.map_err(classify)
    }

    /// 获取朗读音频，失败时给出原因
    pub async fn fetch_speech(&self, text: &str) -> Result<Vec<u8>> {
        let url = providers::google_tts_url(self.config.tts_url(), self.config.tts_lang(), text)
            .map_err(|e| translation_error!(config, "tts_url", e))?;

        let request = async {
            let response = self.client.get(url).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(translation_error!(
                    network,
                    "朗读接口返回错误状态",
                    status.as_u16()
                ));
            }
            Ok::<_, crate::error::TranslationError>(response.bytes().await?.to_vec())
        };

        let audio = tokio::time::timeout(self.config.timeout(), request)
            .await
            .map_err(|_| translation_error!(audio, "request timed out"))??;

        if audio.is_empty() {
            return Err(translation_error!(audio, "empty audio response"));
        }
        Ok(audio)
    }

    /// 朗读文本，失败时记录日志并返回None
    pub async fn speak(&self, text: &str) -> Option<Vec<u8>> {
        match self.fetch_speech(text).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                error!("Audio playback failed: {}", e);
                None
            }
        }
    }

    /// 朗读文本并编码为data URL
    pub async fn speak_data_url(&self, text: &str) -> Option<String> {
        self.speak(text).await.map(|audio| to_data_url(&audio))
    }
}

#[async_trait]
impl Translate for Gateway {
    async fn translate(&self, text: &str) -> TranslationResult {
        let request =
            TranslationRequest::new(text, self.config.target_lang(), self.config.provider().clone());
        self.execute(&request).await
    }

    fn provider_name(&self) -> &str {
        match self.config.provider() {
            Provider::Google => "Google",
            Provider::Baidu { .. } => "Baidu",
        }
    }
}

#[async_trait]
impl Speak for Gateway {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        self.fetch_speech(text).await
    }
}

/// 把音频字节编码为data URL
pub fn to_data_url(audio: &[u8]) -> String {
    format!(
        "data:{};base64,{}",
        service_config::AUDIO_MIME,
        general_purpose::STANDARD.encode(audio)
    )
}

fn classify(error: reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::Timeout
    } else {
        debug!("传输失败: {}", error);
        FailureKind::NetworkError
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// 启动只应答一次的本地HTTP服务，返回基础地址
    async fn serve_once(status: &'static str, body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((mut socket, _)) = listener.accept().await {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            }
        });
        format!("http://{}/api", addr)
    }

    /// 接受连接但从不应答
    async fn serve_silent() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            if let Ok((socket, _)) = listener.accept().await {
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            }
        });
        format!("http://{}/api", addr)
    }

    fn gateway(config: GatewayConfig) -> Gateway {
        let client = Client::builder().no_proxy().build().unwrap();
        Gateway::with_client(config, client)
    }

    #[tokio::test]
    async fn test_translate_success() {
        let body = r#"[[["你好，世界","Hello world",null,null,10]],null,"en"]"#;
        let url = serve_once("200 OK", body.as_bytes().to_vec()).await;
        let gw = gateway(GatewayConfig::new().with_translate_url(&url));

        assert_eq!(
            gw.translate("Hello world").await,
            TranslationResult::Success("你好，世界".to_string())
        );
    }

    #[tokio::test]
    async fn test_translate_timeout() {
        let url = serve_silent().await;
        let gw = gateway(
            GatewayConfig::new()
                .with_translate_url(&url)
                .with_timeout(Duration::from_millis(200)),
        );

        let result = gw.translate("Hello world").await;
        assert_eq!(result, TranslationResult::Failure(FailureKind::Timeout));
        assert_eq!(result.inline_text(), "翻译超时");
    }

    #[tokio::test]
    async fn test_translate_bad_status() {
        let url = serve_once("503 Service Unavailable", b"busy".to_vec()).await;
        let gw = gateway(GatewayConfig::new().with_translate_url(&url));

        assert_eq!(
            gw.translate("Hello world").await,
            TranslationResult::Failure(FailureKind::NetworkError)
        );
    }

    #[tokio::test]
    async fn test_translate_connection_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let gw = gateway(GatewayConfig::new().with_translate_url(&format!("http://{}/api", addr)));
        assert_eq!(
            gw.translate("Hello world").await,
            TranslationResult::Failure(FailureKind::NetworkError)
        );
    }

    #[tokio::test]
    async fn test_baidu_provider_error_is_normalized() {
        let body = r#"{"error_code":"54004","error_msg":"Insufficient balance"}"#;
        let url = serve_once("200 OK", body.as_bytes().to_vec()).await;
        let provider = Provider::Baidu {
            app_id: "20230001".to_string(),
            secret: "s3cret".to_string(),
        };
        let gw = gateway(GatewayConfig::new().with_provider(provider).with_baidu_url(&url));

        let result = gw.translate("apple").await;
        assert_eq!(
            result,
            TranslationResult::Failure(FailureKind::ProviderError("54004".to_string()))
        );
        assert_eq!(result.bubble_text(), "Baidu Error: Insufficient Balance");
    }

    #[tokio::test]
    async fn test_speak_returns_audio_bytes() {
        let url = serve_once("200 OK", vec![0xff, 0xfb, 0x90, 0x64]).await;
        let gw = gateway(GatewayConfig::new().with_tts_url(&url));

        let audio = gw.synthesize("Hello").await.unwrap();
        assert_eq!(audio, vec![0xff, 0xfb, 0x90, 0x64]);
    }

    #[tokio::test]
    async fn test_speak_failure_is_error() {
        let url = serve_once("404 Not Found", Vec::new()).await;
        let gw = gateway(GatewayConfig::new().with_tts_url(&url));

        let err = gw.fetch_speech("Hello").await.unwrap_err();
        assert!(matches!(err, crate::error::TranslationError::Network { status_code: Some(404), .. }));
    }

    #[tokio::test]
    async fn test_speak_failure_is_none() {
        let url = serve_once("500 Internal Server Error", Vec::new()).await;
        let gw = gateway(GatewayConfig::new().with_tts_url(&url));

        assert!(gw.speak("Hello").await.is_none());
    }

    #[tokio::test]
    async fn test_speak_data_url() {
        let url = serve_once("200 OK", b"abc".to_vec()).await;
        let gw = gateway(GatewayConfig::new().with_tts_url(&url));

        assert_eq!(
            gw.speak_data_url("Hello").await.as_deref(),
            Some("data:audio/mpeg;base64,YWJj")
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config = GatewayConfig::new().with_timeout(Duration::ZERO);
        assert!(matches!(
            Gateway::new(config),
            Err(crate::error::TranslationError::Configuration { field, .. }) if field == "timeout"
        ));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let config = GatewayConfig::new().with_translate_url("not a url");
        assert!(matches!(
            Gateway::new(config),
            Err(crate::error::TranslationError::Configuration { .. })
        ));
    }

    #[test]
    fn test_failure_codes_and_messages() {
        assert_eq!(FailureKind::Timeout.code(), "TIMEOUT");
        assert_eq!(FailureKind::NetworkError.code(), "FAILED");
        assert_eq!(FailureKind::ProviderError("54003".into()).code(), "PROVIDER_54003");
        assert_eq!(FailureKind::ParseError.inline_message(), "翻译错误");
        assert_eq!(
            FailureKind::ProviderError("11111".into()).bubble_message(),
            "Translation failed."
        );
    }

    #[test]
    fn test_data_url() {
        assert_eq!(to_data_url(b"abc"), "data:audio/mpeg;base64,YWJj");
    }
}
