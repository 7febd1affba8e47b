//! 解析ワークフローの状態遷移（I/Oなし）
//!
//! `transition(state, action)` が唯一の書き込み口。副作用（プレビュー差し替え、
//! リクエスト送信、失敗通知）は `Effect` として返し、実行はドライバ側に任せる。
//!
//! ```text
//! UPLOAD -> READY -> ANALYZING -> RESULT
//!   ^         |  ^        |          |
//!   +---------+  +--------+          |
//!   +--------------------------------+
//! ```

use crate::error::Error;
use crate::parser::map_response;
use crate::types::{
    AnalysisResponse, AnalysisResult, FileId, ImageFile, RequestId, Selection, Step,
};

/// 失敗時にユーザーへ出す通知（エラー種別は区別しない）
pub const FAILURE_NOTICE: &str =
    "AI解析サーバーとの通信に失敗しました。バックエンドが起動しているか確認してください";

/// ワークフロー状態
#[derive(Debug, Clone, Default)]
pub struct WorkflowState {
    step: Step,
    selection: Option<Selection>,
    result: Option<AnalysisResult>,
    /// 未完了の送信（中断されたものも含む）
    in_flight: Option<RequestId>,
    /// 現在の選択が結果を待っている送信
    awaiting: Option<RequestId>,
    next_file_id: u64,
    next_request_id: u64,
}

/// 遷移アクション
#[derive(Debug)]
pub enum Action {
    /// 写真を選択（None は無視）
    SelectFile(Option<ImageFile>),
    /// 選択を解除して最初に戻る
    ClearSelection,
    /// 解析を送信
    Submit,
    /// 送信の完了
    Complete {
        request: RequestId,
        outcome: Result<AnalysisResponse, Error>,
    },
}

/// ドライバが実行する副作用
#[derive(Debug)]
pub enum Effect {
    /// 既存プレビューを解放し、Some なら新しいプレビューを取得
    ReplacePreview(Option<Selection>),
    /// 解析サービスへ1回だけ送信
    Dispatch { request: RequestId, file: ImageFile },
    /// 失敗通知（状態はREADYへ戻済み）
    NotifyFailure { request: RequestId, error: Error },
    /// 選択が変わった後に届いた結果を破棄
    Discard { request: RequestId },
}

/// 遷移結果
#[derive(Debug)]
pub struct Transition {
    pub state: WorkflowState,
    pub effects: Vec<Effect>,
}

impl WorkflowState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn selected_file(&self) -> Option<&ImageFile> {
        self.selection.as_ref().map(|s| &s.file)
    }

    pub fn analysis_result(&self) -> Option<&AnalysisResult> {
        self.result.as_ref()
    }

    /// 送信が未完了か
    pub fn pending_request(&self) -> bool {
        self.in_flight.is_some()
    }

    /// 現在の選択で送信可能か
    pub fn can_submit(&self) -> bool {
        self.step == Step::Ready && self.in_flight.is_none() && self.selection.is_some()
    }

    /// 状態を書き換えて副作用を返す
    pub fn apply(&mut self, action: Action) -> Vec<Effect> {
        let Transition { state, effects } = transition(std::mem::take(self), action);
        *self = state;
        effects
    }

    /// 不変条件の検査（テスト・デバッグ用）
    pub fn check_invariants(&self) -> Result<(), String> {
        match self.step {
            Step::Analyzing => {
                if self.selection.is_none() {
                    return Err("ANALYZING なのに写真がない".into());
                }
                if !self.pending_request() {
                    return Err("ANALYZING なのに送信がない".into());
                }
            }
            Step::Result => {
                if self.result.is_none() {
                    return Err("RESULT なのに結果がない".into());
                }
                if self.pending_request() {
                    return Err("RESULT なのに送信が未完了".into());
                }
            }
            Step::Upload => {
                if self.selection.is_some() || self.result.is_some() {
                    return Err("UPLOAD なのに写真または結果が残っている".into());
                }
            }
            Step::Ready => {}
        }
        if self.result.is_some() && self.step != Step::Result {
            return Err(format!("{} で結果が残っている", self.step));
        }
        Ok(())
    }
}

/// 状態遷移関数
pub fn transition(mut state: WorkflowState, action: Action) -> Transition {
    let mut effects = Vec::new();

    match action {
        Action::SelectFile(None) => {}

        Action::SelectFile(Some(file)) => {
            // 解析中の差し替えは受け付けない
            if state.step != Step::Analyzing {
                state.next_file_id += 1;
                let selection = Selection {
                    id: FileId(state.next_file_id),
                    file,
                };
                state.selection = Some(selection.clone());
                state.result = None;
                state.step = Step::Ready;
                effects.push(Effect::ReplacePreview(Some(selection)));
            }
        }

        Action::ClearSelection => {
            if state.selection.is_some() {
                effects.push(Effect::ReplacePreview(None));
            }
            state.selection = None;
            state.result = None;
            state.awaiting = None;
            state.step = Step::Upload;
        }

        Action::Submit => {
            if state.can_submit() {
                if let Some(file) = state.selected_file().cloned() {
                    state.next_request_id += 1;
                    let request = RequestId(state.next_request_id);
                    state.in_flight = Some(request);
                    state.awaiting = Some(request);
                    state.step = Step::Analyzing;
                    effects.push(Effect::Dispatch { request, file });
                }
            }
        }

        Action::Complete { request, outcome } => {
            if state.in_flight == Some(request) {
                state.in_flight = None;
            }

            if state.awaiting != Some(request) {
                effects.push(Effect::Discard { request });
            } else {
                state.awaiting = None;
                match outcome.and_then(map_response) {
                    Ok(result) => {
                        state.result = Some(result);
                        state.step = Step::Result;
                    }
                    Err(error) => {
                        state.step = Step::Ready;
                        effects.push(Effect::NotifyFailure { request, error });
                    }
                }
            }
        }
    }

    Transition { state, effects }
}
