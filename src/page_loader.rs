//! 页面加载
//!
//! 本地文件直接读取；网址通过Monolith抓取为自包含的HTML（CSS、图片内嵌为data URL），
//! 在blocking线程中执行，失败时按递增间隔重试。

use std::path::Path;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api_constants::{crawler_config, service_config};
use crate::error::{Result, TranslationError};
use crate::translation_error;
use crate::utils::{validate_input_file, InputSource};

/// 网页抓取配置
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub include_css: bool,
    pub include_js: bool,
    pub include_images: bool,
    pub user_agent: String,
    /// 单次抓取超时（秒）
    pub timeout: u64,
    pub max_retries: u32,
    /// 第n次失败后等待 n * retry_delay
    pub retry_delay: Duration,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            include_css: true,
            include_js: false,
            include_images: true,
            user_agent: service_config::DEFAULT_USER_AGENT.to_string(),
            timeout: crawler_config::DEFAULT_CRAWL_TIMEOUT,
            max_retries: crawler_config::MAX_CRAWL_RETRIES,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl LoaderConfig {
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}

/// 加载好的页面
#[derive(Debug, Clone)]
pub struct LoadedPage {
    /// 用于日志和统计报告的名称
    pub label: String,
    pub html: String,
}

pub struct PageLoader {
    config: LoaderConfig,
}

impl PageLoader {
    pub fn new(config: LoaderConfig) -> Self {
        Self { config }
    }

    /// 按输入来源加载单个页面
    pub async fn load(&self, source: &InputSource) -> Result<LoadedPage> {
        match source {
            InputSource::Url(url) => self.fetch_with_retry(url.as_str()).await.map(|html| {
                LoadedPage {
                    label: url.to_string(),
                    html,
                }
            }),
            InputSource::File(path) => self.read_file(path).await,
            InputSource::Directory(path) => Err(translation_error!(
                input_validation,
                path.display(),
                "目录需要逐个文件加载"
            )),
        }
    }

    /// 读取本地HTML文件
    pub async fn read_file(&self, path: &Path) -> Result<LoadedPage> {
        validate_input_file(path)?;
        let html = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| translation_error!(file_op, path.display(), "读取", e))?;
        debug!("读取文件: {} ({} 字节)", path.display(), html.len());

        Ok(LoadedPage {
            label: path.display().to_string(),
            html,
        })
    }

    async fn fetch(&self, url: &str) -> Result<String> {
        let mut options = monolith::core::Options {
            no_css: !self.config.include_css,
            no_js: !self.config.include_js,
            no_images: !self.config.include_images,
            user_agent: Some(self.config.user_agent.clone()),
            timeout: self.config.timeout,
            ignore_errors: false,
            silent: true,
            ..Default::default()
        };
        let target = url.to_string();

        let result = tokio::task::spawn_blocking(move || {
            use monolith::cache::Cache;
            use monolith::core::create_monolithic_document;

            let mut cache: Option<Cache> = Some(Cache::new(0, None));
            create_monolithic_document(target, &mut options, &mut cache)
        })
        .await
        .map_err(|e| TranslationError::from(anyhow::anyhow!("抓取任务执行失败: {}", e)))?;

        let (bytes, title) =
            result.map_err(|e| translation_error!(network, format!("Monolith抓取失败: {}", e)))?;
        let html = String::from_utf8(bytes)
            .map_err(|e| translation_error!(html_parse, format!("页面不是UTF-8: {}", e)))?;

        if let Some(title) = title {
            info!("📄 网页标题: {}", title);
        }
        info!("✅ 网页抓取完成，大小: {} 字节", html.len());
        Ok(html)
    }

    async fn fetch_with_retry(&self, url: &str) -> Result<String> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            info!("🔄 尝试抓取网页 (第 {} 次): {}", attempt, url);
            match self.fetch(url).await {
                Ok(html) => return Ok(html),
                Err(e) => {
                    warn!("❌ 抓取失败 (尝试 {}/{}): {}", attempt, attempts, e);
                    last_error = Some(e);
                    if attempt < attempts {
                        let delay = self.config.retry_delay * attempt;
                        info!("⏳ 等待 {:?} 后重试...", delay);
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| translation_error!(network, "所有重试均失败")))
    }
}
