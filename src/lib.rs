//! Page Translator - 网页英文逐段翻译与朗读工具库
//!
//! 这个库提供翻译网关、页面逐段注释、悬浮控件与划词界面的状态机、消息桥和偏好设置等核心功能。

pub mod annotator;
pub mod api_constants;
pub mod cache;
pub mod config;
pub mod error;
pub mod html_processor;
pub mod interaction;
pub mod message;
pub mod page_loader;
pub mod preferences;
pub mod providers;
pub mod segment;
pub mod selection;
pub mod shortcuts;
pub mod stats;
pub mod translator;
pub mod utils;
pub mod widget;
