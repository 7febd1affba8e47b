//! 解析ワークフロー（ドライバ）
//!
//! 状態は `WorkflowState` が持ち、書き込みは `transition` のみ。
//! ここでは遷移が返した副作用（プレビュー差し替え・送信・通知）を実行する。
//! 送信は tokio タスクで行い、完了はチャネル経由で同じ遷移関数へ戻す。
//! tokio ランタイム内で使うこと。

use crate::preview::{PreviewHandle, PreviewSlot};
use crate::service::AnalysisService;
use autosafe_common::{
    Action, AnalysisResponse, AnalysisResult, Effect, Error, ImageFile, RequestId, Selection, Step,
    WorkflowState, FAILURE_NOTICE,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// 送信完了メッセージ
struct Completion {
    request: RequestId,
    outcome: autosafe_common::Result<AnalysisResponse>,
}

pub struct AnalysisWorkflow<S> {
    state: WorkflowState,
    preview: PreviewSlot,
    service: Arc<S>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
    notices: Vec<String>,
}

impl<S> AnalysisWorkflow<S>
where
    S: AnalysisService + 'static,
{
    pub fn new(service: S, preview: PreviewSlot) -> Self {
        Self::with_shared(Arc::new(service), preview)
    }

    pub fn with_shared(service: Arc<S>, preview: PreviewSlot) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            state: WorkflowState::new(),
            preview,
            service,
            tx,
            rx,
            notices: Vec::new(),
        }
    }

    // ---- 読み取り専用 ----

    pub fn step(&self) -> Step {
        self.state.step()
    }

    pub fn selected_file(&self) -> Option<&ImageFile> {
        self.state.selected_file()
    }

    pub fn preview(&self) -> Option<&PreviewHandle> {
        self.preview.current()
    }

    pub fn pending_request(&self) -> bool {
        self.state.pending_request()
    }

    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.state.analysis_result()
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn preview_slot(&self) -> &PreviewSlot {
        &self.preview
    }

    /// 未読の失敗通知を取り出す
    pub fn take_notices(&mut self) -> Vec<String> {
        std::mem::take(&mut self.notices)
    }

    // ---- 遷移 ----

    /// 写真を選択（None・解析中は無視）
    pub fn select_file(&mut self, file: Option<ImageFile>) {
        self.apply(Action::SelectFile(file));
    }

    /// 選択を解除（常に成功、冪等）
    pub fn clear_selection(&mut self) {
        self.apply(Action::ClearSelection);
    }

    /// 解析を送信。送信した場合はそのIDを返す
    ///
    /// READY以外、または送信が未完了なら何もしない。
    pub fn submit_for_analysis(&mut self) -> Option<RequestId> {
        self.apply(Action::Submit)
    }

    /// 完了を1件待って処理する。未完了の送信がなければ即 None
    pub async fn next_completion(&mut self) -> Option<RequestId> {
        if !self.state.pending_request() {
            return None;
        }
        let completion = self.rx.recv().await?;
        let request = completion.request;
        self.complete(completion);
        Some(request)
    }

    /// 届いている完了を待たずに処理する。処理件数を返す
    pub fn poll_completions(&mut self) -> usize {
        let mut count = 0;
        while let Ok(completion) = self.rx.try_recv() {
            self.complete(completion);
            count += 1;
        }
        count
    }

    /// 未完了の送信がなくなるまで待つ
    pub async fn wait_idle(&mut self) {
        while self.next_completion().await.is_some() {}
    }

    fn complete(&mut self, completion: Completion) {
        let Completion { request, outcome } = completion;
        self.apply(Action::Complete { request, outcome });
    }

    fn apply(&mut self, action: Action) -> Option<RequestId> {
        let mut dispatched = None;

        for effect in self.state.apply(action) {
            match effect {
                Effect::ReplacePreview(selection) => self.replace_preview(selection),
                Effect::Dispatch { request, file } => {
                    self.spawn_request(request, file);
                    dispatched = Some(request);
                }
                Effect::NotifyFailure { request, error } => {
                    warn!(request = %request, kind = error.kind(), error = %error, "analysis failed");
                    self.notices.push(FAILURE_NOTICE.to_string());
                }
                Effect::Discard { request } => {
                    info!(request = %request, "analysis: stale response discarded");
                }
            }
        }

        debug!(step = %self.state.step(), pending = self.state.pending_request(), "workflow: state");
        dispatched
    }

    fn replace_preview(&mut self, selection: Option<Selection>) {
        // 取得失敗は表示できないだけなので状態は進める
        if let Err(e) = self.preview.replace(selection.as_ref()) {
            warn!(error = %e, "preview: acquire failed");
        }
    }

    fn spawn_request(&self, request: RequestId, file: ImageFile) {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        info!(request = %request, file = %file.file_name, digest = %file.digest, "analysis: dispatched");

        tokio::spawn(async move {
            // サービス側のパニックも完了として戻し、ANALYZING に取り残さない
            let task = tokio::spawn(async move { service.analyze(&file).await });
            let outcome = match task.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    error!(request = %request, error = %e, "analysis task aborted");
                    Err(Error::Transport(format!("解析タスクが異常終了しました: {}", e)))
                }
            };
            // 受信側が破棄済みなら結果も不要
            let _ = tx.send(Completion { request, outcome });
        });
    }
}
