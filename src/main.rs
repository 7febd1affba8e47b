use autosafe_ai::{cli, config, error, loader, preview, report, service, session, workflow};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use error::{AutoSafeError, Result};
use preview::{PreviewSlot, PreviewStore};
use service::HttpAnalysisService;
use tracing_subscriber::EnvFilter;
use workflow::AnalysisWorkflow;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { image, save, json } => {
            let endpoint = config.resolve_endpoint(cli.endpoint.as_deref())?;
            let mut workflow = build_workflow(&config, &endpoint)?;

            // 1. 写真読み込み
            let file = loader::load_image(&image)?;
            if !json {
                println!("🚗 AutoSafe AI - 車両判定\n");
                println!("[1/2] 写真: {} ({} bytes)", file.file_name, file.len());
            }
            workflow.select_file(Some(file));

            // 2. 解析
            if !json {
                println!("[2/2] {} に送信中...", endpoint);
            }
            workflow.submit_for_analysis();
            if json {
                workflow.wait_idle().await;
            } else {
                session::wait_with_spinner(&mut workflow).await;
            }

            let notices = workflow.take_notices();
            let (Some(result), Some(file)) = (workflow.analysis_result(), workflow.selected_file())
            else {
                return Err(AutoSafeError::AnalysisFailed(notices.join(" / ")));
            };

            if json {
                println!("{}", serde_json::to_string_pretty(result)?);
            } else {
                println!("\n{}", report::render_result(result));
            }

            if let Some(path) = save {
                report::Certificate::new(file, &endpoint, result).save(&path)?;
                if !json {
                    println!("✔ 証明書を保存: {}", path.display());
                }
            }
        }

        Commands::Interactive => {
            let endpoint = config.resolve_endpoint(cli.endpoint.as_deref())?;
            let mut workflow = build_workflow(&config, &endpoint)?;
            session::run_interactive(&mut workflow, &endpoint).await?;
        }

        Commands::Health => {
            let endpoint = config.resolve_endpoint(cli.endpoint.as_deref())?;
            let service = HttpAnalysisService::new(&endpoint, config.timeout())?;
            let status = service.health().await?;
            println!("✔ {}: {}", endpoint, status.status);
        }

        Commands::Config { set_endpoint, set_timeout, show } => {
            let mut config = config;

            if let Some(endpoint) = set_endpoint {
                config.set_endpoint(endpoint)?;
                println!("✔ 接続先を設定しました");
            }

            if let Some(seconds) = set_timeout {
                config.timeout_seconds = seconds;
                config.save()?;
                println!("✔ タイムアウトを設定しました");
            }

            if show {
                println!("設定:");
                println!("  接続先: {}", config.endpoint);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!(
                    "  プレビュー保存先: {}",
                    config
                        .preview_dir
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "一時ディレクトリ".into())
                );
                println!("  設定ファイル: {}", Config::config_path()?.display());
            }
        }
    }

    Ok(())
}

fn build_workflow(config: &Config, endpoint: &str) -> Result<AnalysisWorkflow<HttpAnalysisService>> {
    let service = HttpAnalysisService::new(endpoint, config.timeout())?;
    let store = match &config.preview_dir {
        Some(dir) => PreviewStore::in_dir(dir)?,
        None => PreviewStore::temporary()?,
    };
    Ok(AnalysisWorkflow::new(service, PreviewSlot::new(store)))
}
