use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use tracing::{error, info, warn};

use page_translator::annotator::Session;
use page_translator::config::{
    Cli, Command, GatewayConfig, PageArgs, PrefsAction, Provider,
};
use page_translator::html_processor::{parse_html, serialize_dom_to_html};
use page_translator::message::Bridge;
use page_translator::page_loader::{LoaderConfig, PageLoader};
use page_translator::preferences::{PreferenceChange, PreferenceStore};
use page_translator::stats::{format_duration, print_walk_report, WalkStats};
use page_translator::translator::{Gateway, Translate};
use page_translator::utils::{
    collect_html_files, generate_output_path, generate_output_path_for_source, init_logging,
    validate_input_source, InputSource,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    if let Err(e) = run(&cli).await {
        error!("❌ 执行失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let prefs_path = cli.prefs.clone().unwrap_or_else(PreferenceStore::default_path);
    let mut store = PreferenceStore::load(&prefs_path)
        .with_context(|| format!("读取偏好设置失败: {}", prefs_path.display()))?;

    match &cli.command {
        Command::Prefs { action } => run_prefs(&mut store, action.as_ref()),
        Command::Page(args) => {
            let gateway = build_gateway(cli, &store)?;
            let floating = args.floating || store.preferences().floating_mode;
            run_page(args, &gateway, floating).await
        }
        Command::Text { text } => {
            let gateway = build_gateway(cli, &store)?;
            run_text(text, &gateway, &mut store).await
        }
        Command::Speak { text, output } => {
            let gateway = build_gateway(cli, &store)?;
            run_speak(text, output, &gateway).await
        }
        Command::Bridge => {
            let gateway = build_gateway(cli, &store)?;
            let mut bridge = Bridge::new(&gateway, &gateway).with_store(store);
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            bridge
                .serve_lines(stdin, tokio::io::stdout())
                .await
                .context("消息桥运行失败")?;
            Ok(())
        }
    }
}

/// 合并命令行参数与偏好设置，构造翻译网关
fn build_gateway(cli: &Cli, store: &PreferenceStore) -> Result<Gateway> {
    let prefs = store.preferences();
    let kind = cli.provider.unwrap_or(prefs.provider);
    let app_id = cli.baidu_app_id.as_deref().or(prefs.baidu_app_id.as_deref());
    let secret = cli.baidu_secret.as_deref().or(prefs.baidu_secret.as_deref());

    let provider = Provider::from_parts(kind, app_id, secret).context("翻译服务商配置无效")?;
    let config = GatewayConfig::new()
        .with_provider(provider)
        .with_timeout(Duration::from_secs(cli.timeout_secs));

    info!("🌐 翻译服务: {}", kind);
    Gateway::new(config).context("创建翻译网关失败")
}

/// 输出文件名使用的语言后缀: zh-CN -> zh
fn output_suffix(target_lang: &str) -> &str {
    target_lang.split('-').next().unwrap_or(target_lang)
}

async fn run_page(args: &PageArgs, gateway: &Gateway, floating: bool) -> Result<()> {
    let source = validate_input_source(&args.input).context("输入无效")?;
    let lang = output_suffix(gateway.config().target_lang());
    let loader = PageLoader::new(LoaderConfig::default().with_timeout(args.crawl_timeout));
    let total_start = Instant::now();

    match &source {
        InputSource::Directory(dir) => {
            let files = collect_html_files(dir, lang);
            if files.is_empty() {
                warn!("⚠️  目录中没有HTML文件: {}", dir.display());
                return Ok(());
            }
            info!("📁 发现 {} 个HTML文件", files.len());

            if let Some(out_dir) = &args.output {
                std::fs::create_dir_all(out_dir)
                    .with_context(|| format!("创建输出目录失败: {}", out_dir.display()))?;
            }

            let loader = &loader;
            let results: Vec<(PathBuf, Result<WalkStats>)> = stream::iter(files)
                .map(|path| async move {
                    let output = directory_output_path(&path, args.output.as_deref(), lang);
                    let outcome = translate_page(
                        loader,
                        &InputSource::File(path.clone()),
                        &output,
                        gateway,
                        floating,
                    )
                    .await;
                    (path, outcome)
                })
                .buffer_unordered(args.concurrent_pages.max(1))
                .collect()
                .await;

            let mut total = WalkStats::begin();
            let mut failed = 0;
            for (path, outcome) in &results {
                match outcome {
                    Ok(stats) => total.absorb(stats),
                    Err(e) => {
                        failed += 1;
                        error!("❌ {} 翻译失败: {:#}", path.display(), e);
                    }
                }
            }
            total.elapsed = total_start.elapsed();

            info!(
                "✅ 目录处理完成: 成功 {} 个，失败 {} 个，总耗时 {}",
                results.len() - failed,
                failed,
                format_duration(total.elapsed)
            );
            if args.stats {
                print_walk_report(&total, &dir.display().to_string());
            }
        }
        _ => {
            let output = generate_output_path_for_source(&source, &args.output, lang);
            info!("📄 输出文件: {}", output.display());

            let stats = translate_page(&loader, &source, &output, gateway, floating).await?;
            info!("✅ 翻译完成！总耗时: {}", format_duration(total_start.elapsed()));
            if args.stats {
                print_walk_report(&stats, &args.input);
            }
        }
    }

    Ok(())
}

fn directory_output_path(input: &Path, out_dir: Option<&Path>, lang: &str) -> PathBuf {
    let generated = generate_output_path(input, &None, lang);
    match (out_dir, generated.file_name()) {
        (Some(dir), Some(name)) => dir.join(name),
        _ => generated,
    }
}

/// 翻译单个页面并写出结果
async fn translate_page(
    loader: &PageLoader,
    source: &InputSource,
    output: &Path,
    translator: &dyn Translate,
    floating: bool,
) -> Result<WalkStats> {
    let page = loader.load(source).await.context("加载页面失败")?;
    let dom = parse_html(&page.html).context("解析HTML失败")?;

    let mut session = Session::new();
    session.apply(&dom, &PreferenceChange::FloatingMode(floating));
    let stats = session.start(&dom, translator).await;

    let html = serialize_dom_to_html(&dom).context("序列化HTML失败")?;
    tokio::fs::write(output, html)
        .await
        .with_context(|| format!("写入文件失败: {}", output.display()))?;
    info!("💾 已写入: {} ({})", output.display(), page.label);

    Ok(stats)
}

async fn run_text(text: &str, gateway: &Gateway, store: &mut PreferenceStore) -> Result<()> {
    let result = gateway.translate(text.trim()).await;
    let shown = result.bubble_text().to_string();
    println!("{}", shown);

    if result.is_success() {
        if let Err(e) = store.record_last(text, &shown) {
            warn!("⚠️  保存最近翻译失败: {}", e);
        }
    }
    Ok(())
}

async fn run_speak(text: &str, output: &Path, gateway: &Gateway) -> Result<()> {
    let audio = gateway.speak(text).await.context("获取朗读音频失败")?;

    tokio::fs::write(output, &audio)
        .await
        .with_context(|| format!("写入音频失败: {}", output.display()))?;
    info!("🔊 音频已写入: {} ({} 字节)", output.display(), audio.len());
    Ok(())
}

fn run_prefs(store: &mut PreferenceStore, action: Option<&PrefsAction>) -> Result<()> {
    match action {
        Some(PrefsAction::Set { key, value }) => {
            let change = store.set(key, value).context("修改偏好失败")?;
            info!("✅ 偏好已更新: {:?}", change);
        }
        Some(PrefsAction::Show) | None => {
            let prefs = store.preferences();
            println!("📋 偏好设置: {}", store.path().display());
            println!("   selection_mode: {}", prefs.selection_mode);
            println!("   floating_mode: {}", prefs.floating_mode);
            println!("   shortcuts_enabled: {}", prefs.shortcuts_enabled);
            println!("   provider: {}", prefs.provider);
            println!(
                "   baidu_app_id: {}",
                prefs.baidu_app_id.as_deref().unwrap_or("-")
            );
            println!(
                "   baidu_secret: {}",
                if prefs.baidu_secret.is_some() { "******" } else { "-" }
            );
            if let (Some(input), Some(output)) = (&prefs.last_input, &prefs.last_output) {
                println!("   last: {} -> {}", input, output);
            }
        }
    }
    Ok(())
}
