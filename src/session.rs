//! 対話モジュール
//!
//! ワークフローをターミナルから操作する表示層。
//! 送信可否の判定はワークフロー側のガードに任せ、ここでは行わない。

use crate::error::Result;
use crate::loader::load_image;
use crate::report::{render_result, Certificate};
use crate::service::AnalysisService;
use crate::workflow::AnalysisWorkflow;
use autosafe_common::Step;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

/// 対話メニューの操作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionAction {
    /// 写真を選択
    SelectPhoto,
    /// 解析を実行
    Analyze,
    /// 写真を変更（選択解除して再選択）
    ChangePhoto,
    /// 最初からやり直す
    StartOver,
    /// 証明書を保存
    SaveCertificate,
    /// 終了
    Quit,
}

impl SessionAction {
    pub fn label(&self) -> &'static str {
        match self {
            SessionAction::SelectPhoto => "写真を選択",
            SessionAction::Analyze => "解析する",
            SessionAction::ChangePhoto => "写真を変更",
            SessionAction::StartOver => "最初からやり直す",
            SessionAction::SaveCertificate => "判定証明書を保存",
            SessionAction::Quit => "終了",
        }
    }
}

/// 段階ごとのメニュー
pub fn menu_for(step: Step) -> Vec<SessionAction> {
    match step {
        Step::Upload => vec![SessionAction::SelectPhoto, SessionAction::Quit],
        Step::Ready => vec![
            SessionAction::Analyze,
            SessionAction::ChangePhoto,
            SessionAction::StartOver,
            SessionAction::Quit,
        ],
        // 送信中はメニューを出さないが、出すなら撮り直しのみ
        Step::Analyzing => vec![SessionAction::StartOver, SessionAction::Quit],
        Step::Result => vec![
            SessionAction::SaveCertificate,
            SessionAction::ChangePhoto,
            SessionAction::StartOver,
            SessionAction::Quit,
        ],
    }
}

/// 進捗表示（1: Upload > 2: Analyze > 3: Results）
pub fn step_indicator(step: Step) -> String {
    const LABELS: [&str; 3] = ["Upload", "Analyze", "Results"];
    LABELS
        .iter()
        .enumerate()
        .map(|(i, label)| {
            let n = i as u8 + 1;
            if n <= step.ordinal() {
                format!("[{}] {}", n, label)
            } else {
                format!(" {}  {}", n, label)
            }
        })
        .collect::<Vec<_>>()
        .join(" ─ ")
}

/// 送信中スピナーを出しながら完了を待つ
pub async fn wait_with_spinner<S>(workflow: &mut AnalysisWorkflow<S>)
where
    S: AnalysisService + 'static,
{
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("AI解析中...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    workflow.wait_idle().await;

    spinner.finish_and_clear();
}

/// 失敗通知を表示
pub fn print_notices<S>(workflow: &mut AnalysisWorkflow<S>)
where
    S: AnalysisService + 'static,
{
    for notice in workflow.take_notices() {
        eprintln!("⚠ {}", notice);
    }
}

/// 対話モードを実行
pub async fn run_interactive<S>(workflow: &mut AnalysisWorkflow<S>, endpoint: &str) -> Result<()>
where
    S: AnalysisService + 'static,
{
    println!("🚗 AutoSafe AI - 車両判定\n");
    println!("接続先: {}", endpoint);

    loop {
        println!("\n{}", step_indicator(workflow.step()));
        if let Some(handle) = workflow.preview() {
            println!("プレビュー: {}", handle.path().display());
        }

        let actions = menu_for(workflow.step());
        let labels: Vec<&str> = actions.iter().map(|a| a.label()).collect();
        let choice = Select::new()
            .with_prompt("操作を選んでください")
            .items(&labels)
            .default(0)
            .interact()?;

        match actions[choice] {
            SessionAction::SelectPhoto | SessionAction::ChangePhoto => {
                let path: String = Input::new()
                    .with_prompt("写真ファイルのパス")
                    .interact_text()?;
                let path = PathBuf::from(path.trim());

                match load_image(&path) {
                    Ok(image) => {
                        println!("✔ {} ({} bytes, {})", image.file_name, image.len(), image.mime_type);
                        workflow.select_file(Some(image));
                    }
                    // 画像以外は選択しなかったものとして扱う
                    Err(e) => eprintln!("✖ {}", e),
                }
            }
            SessionAction::Analyze => {
                if workflow.submit_for_analysis().is_some() {
                    wait_with_spinner(workflow).await;
                }
                print_notices(workflow);
                if let Some(result) = workflow.analysis_result() {
                    println!("\n{}", render_result(result));
                }
            }
            SessionAction::StartOver => {
                workflow.clear_selection();
                println!("✔ 選択を解除しました");
            }
            SessionAction::SaveCertificate => {
                let (Some(file), Some(result)) = (workflow.selected_file(), workflow.analysis_result())
                else {
                    continue;
                };
                let default_name = format!("{}.cert.json", file.file_name);
                let path: String = Input::new()
                    .with_prompt("保存先")
                    .default(default_name)
                    .interact_text()?;

                let cert = Certificate::new(file, endpoint, result);
                match cert.save(&PathBuf::from(path.trim())) {
                    Ok(()) => println!("✔ 証明書を保存しました: {}", path.trim()),
                    Err(e) => eprintln!("✖ 保存に失敗: {}", e),
                }
            }
            SessionAction::Quit => break,
        }
    }

    workflow.clear_selection();
    Ok(())
}
