use contest_core::domain::{DomainError, JudgeApiError, SubmissionId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("配置错误: {0}")]
    Config(String),

    #[error("输入无效: {0}")]
    Domain(#[from] DomainError),

    #[error("评测服务错误: {0}")]
    Api(#[from] JudgeApiError),

    #[error("提交失败: {0}")]
    Submit(#[source] JudgeApiError),

    #[error("查询提交 {id} 状态失败: {source}")]
    Poll {
        id: SubmissionId,
        #[source]
        source: JudgeApiError,
    },

    #[error("身份存储错误: {0}")]
    Identity(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP 客户端错误: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
