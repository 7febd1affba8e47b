//! AutoSafe AI Common Library
//!
//! CLIと表示層で共有される型・レスポンス変換・状態遷移（I/Oなし）

pub mod types;
pub mod error;
pub mod parser;
pub mod workflow;

pub use types::{
    AnalysisResponse, AnalysisResult, FileId, ImageFile, RequestId, Selection, Step, Verdict,
    IDENTIFIED_PREFIX, UNKNOWN_VEHICLE,
};
pub use error::{Error, Result};
pub use parser::{collect_observations, extract_vehicle_type, map_response, parse_analysis_response};
pub use workflow::{transition, Action, Effect, Transition, WorkflowState, FAILURE_NOTICE};
