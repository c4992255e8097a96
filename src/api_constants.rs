/// 翻译与朗读服务相关常量
///
/// 该文件集中定义接口地址、语言、超时、DOM类名和界面文案，方便统一管理和维护

/// 翻译/朗读接口地址
pub mod api_config {
    /// 主翻译接口（gtx公共端点）
    pub const GOOGLE_TRANSLATE_URL: &str = "https://translate.google.com/translate_a/single";

    /// 朗读接口
    pub const GOOGLE_TTS_URL: &str = "https://translate.google.com/translate_tts";

    /// 百度通用翻译接口（需要appid与密钥）
    pub const BAIDU_API_URL: &str = "https://fanyi-api.baidu.com/api/trans/vip/translate";

    /// 百度接口表示成功的错误码
    pub const BAIDU_SUCCESS_CODE: &str = "52000";
}

/// 翻译服务配置
pub mod service_config {
    /// 源语言
    pub const DEFAULT_SOURCE_LANG: &str = "en";

    /// 目标语言
    pub const DEFAULT_TARGET_LANG: &str = "zh-CN";

    /// 百度接口使用的目标语言代码
    pub const BAIDU_TARGET_LANG: &str = "zh";

    /// 朗读语言
    pub const DEFAULT_TTS_LANG: &str = "en";

    /// 单次请求的等待上限（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 5;

    /// 默认User-Agent
    pub const DEFAULT_USER_AGENT: &str =
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) PageTranslator/0.1";

    /// 朗读音频的MIME类型
    pub const AUDIO_MIME: &str = "audio/mpeg";
}

/// 页面注释相关的标签与类名
pub mod dom_config {
    /// 参与逐段翻译的候选元素
    pub const CANDIDATE_TAGS: &[&str] = &[
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "div", "blockquote", "pre",
        "a", "span", "b", "i", "strong", "em", "small", "big", "button", "label",
    ];

    /// 块级元素：遇到时切断当前片段
    pub const BLOCK_TAGS: &[&str] = &[
        "p", "h1", "h2", "h3", "h4", "h5", "h6", "li", "td", "div", "blockquote", "pre",
        "address", "article", "aside", "canvas", "dd", "dl", "dt", "fieldset", "figcaption",
        "figure", "footer", "form", "header", "hr", "main", "nav", "noscript", "ol", "section",
        "table", "tfoot", "ul", "video",
    ];

    /// 提取可见文本时跳过的元素
    pub const INVISIBLE_TAGS: &[&str] = &["script", "style", "noscript", "template"];

    /// 插入的译文行
    pub const TRANSLATION_LINE_CLASS: &str = "pt-translation-line";

    /// 悬浮控件根节点
    pub const FLOATING_WIDGET_CLASS: &str = "pt-floating-widget";

    /// 隐藏全部译文时加在body上的类
    pub const HIDE_TRANSLATIONS_CLASS: &str = "pt-hide-translations";

    /// 隐藏控件按钮
    pub const HIDDEN_CLASS: &str = "pt-hidden";

    /// 注入页面的样式表id
    pub const STYLESHEET_ID: &str = "pt-styles";

    /// 译文行、隐藏状态和悬浮控件的基础样式
    pub const STYLESHEET: &str = concat!(
        ".pt-translation-line{color:#5f6368;font-size:0.95em;margin:2px 0 6px;}",
        ".pt-hide-translations .pt-translation-line{display:none !important;}",
        ".pt-hidden{display:none !important;}",
        ".pt-floating-widget{position:fixed;right:16px;bottom:16px;z-index:2147483647;}",
        ".pt-control-btn{margin:2px;padding:4px 10px;border-radius:4px;cursor:pointer;}",
    );
}

/// 界面文案
pub mod ui_messages {
    /// 页面内译文：超时
    pub const INLINE_TIMEOUT: &str = "翻译超时";

    /// 页面内译文：其他失败
    pub const INLINE_FAILED: &str = "翻译错误";

    /// 气泡占位文本
    pub const TRANSLATING: &str = "Translating...";

    /// 气泡：超时
    pub const BUBBLE_TIMEOUT: &str = "Translation Timed Out";

    /// 气泡：通用失败
    pub const BUBBLE_FAILED: &str = "Translation Failed";

    /// 气泡：未知服务商错误码
    pub const BUBBLE_UNKNOWN: &str = "Translation failed.";

    /// 百度错误码对应的提示
    pub const BAIDU_ERRORS: &[(&str, &str)] = &[
        ("54003", "Baidu Error: Access Frequency Too High"),
        ("54004", "Baidu Error: Insufficient Balance"),
        ("54005", "Baidu Error: Long Query Frequency Too High"),
        ("52003", "Baidu Error: Unauthorized User"),
        ("58002", "Baidu Error: Service Timeout"),
    ];
}

/// 气泡与弹窗布局常量（像素）
pub mod layout_config {
    /// 气泡与指针之间的间距
    pub const BUBBLE_GAP: f64 = 15.0;

    /// 视口边距
    pub const VIEWPORT_MARGIN: f64 = 10.0;

    /// 弹窗相对选区底部的下移量
    pub const POPUP_OFFSET_Y: f64 = 5.0;

    /// 弹窗触发的气泡相对弹窗的下移量
    pub const BUBBLE_BELOW_POPUP: f64 = 40.0;
}

/// 网页抓取配置
pub mod crawler_config {
    /// 默认抓取超时时间（秒）
    pub const DEFAULT_CRAWL_TIMEOUT: u64 = 30;

    /// 最大重试次数
    pub const MAX_CRAWL_RETRIES: u32 = 3;
}

/// 查找百度错误码对应的提示文本
pub fn baidu_error_message(code: &str) -> Option<&'static str> {
    ui_messages::BAIDU_ERRORS
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, msg)| *msg)
}

/// 验证接口地址是否为HTTP(S)
pub fn is_valid_api_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
