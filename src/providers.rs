//! 服务商请求构造与响应解析
//!
//! 只做纯函数：拼接URL、计算百度签名、把响应体归一化为 `TranslationResult`。
//! 网络收发和超时在 `translator::Gateway` 中完成。

use md5::{Digest, Md5};
use serde_json::Value;
use url::Url;

use crate::api_constants::api_config;
use crate::translator::{FailureKind, TranslationResult};

/// gtx翻译请求地址
pub fn google_translate_url(
    base: &str,
    source_lang: &str,
    target_lang: &str,
    text: &str,
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        base,
        &[
            ("client", "gtx"),
            ("sl", source_lang),
            ("tl", target_lang),
            ("dt", "t"),
            ("q", text),
        ],
    )
}

/// 朗读请求地址
pub fn google_tts_url(base: &str, tts_lang: &str, text: &str) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        base,
        &[
            ("ie", "UTF-8"),
            ("q", text),
            ("tl", tts_lang),
            ("client", "tw-ob"),
        ],
    )
}

/// 解析gtx响应
///
/// 响应是嵌套数组，第一个元素为 `[译文片段, 原文片段, ...]` 序列，译文按顺序拼接。
pub fn parse_google_response(body: &str) -> TranslationResult {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => return TranslationResult::Failure(FailureKind::ParseError),
    };

    let Some(parts) = json.get(0).and_then(Value::as_array) else {
        return TranslationResult::Failure(FailureKind::ParseError);
    };

    let translated: String = parts
        .iter()
        .filter_map(|part| part.get(0).and_then(Value::as_str))
        .collect();

    if translated.is_empty() {
        TranslationResult::Failure(FailureKind::ParseError)
    } else {
        TranslationResult::Success(translated)
    }
}

/// 百度签名：md5(appid + q + salt + 密钥)，小写十六进制
pub fn baidu_sign(app_id: &str, text: &str, salt: &str, secret: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(app_id.as_bytes());
    hasher.update(text.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// 百度翻译请求地址（GET，参数全部在查询串中）
pub fn baidu_translate_url(
    base: &str,
    app_id: &str,
    secret: &str,
    salt: &str,
    source_lang: &str,
    target_lang: &str,
    text: &str,
) -> Result<Url, url::ParseError> {
    let sign = baidu_sign(app_id, text, salt, secret);
    Url::parse_with_params(
        base,
        &[
            ("q", text),
            ("from", source_lang),
            ("to", target_lang),
            ("appid", app_id),
            ("salt", salt),
            ("sign", sign.as_str()),
        ],
    )
}

/// 解析百度响应
///
/// 业务错误码统一转为 `ProviderError(code)`，调用方无需区分服务商。
pub fn parse_baidu_response(body: &str) -> TranslationResult {
    let json: Value = match serde_json::from_str(body) {
        Ok(json) => json,
        Err(_) => return TranslationResult::Failure(FailureKind::ParseError),
    };

    if let Some(code) = json.get("error_code") {
        let code = match code {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return TranslationResult::Failure(FailureKind::ParseError),
        };
        if code != api_config::BAIDU_SUCCESS_CODE {
            return TranslationResult::Failure(FailureKind::ProviderError(code));
        }
    }

    let Some(items) = json.get("trans_result").and_then(Value::as_array) else {
        return TranslationResult::Failure(FailureKind::ParseError);
    };

    let lines: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("dst").and_then(Value::as_str))
        .collect();

    if lines.is_empty() {
        TranslationResult::Failure(FailureKind::ParseError)
    } else {
        TranslationResult::Success(lines.join("\n"))
    }
}
