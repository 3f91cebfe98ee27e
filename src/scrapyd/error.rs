// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// Scrapyd 调用错误
#[derive(Error, Debug)]
pub enum ScrapydError {
    /// 节点编号越界
    #[error("node index error: {node}, which should be between 1 and {total}")]
    NodeOutOfRange { node: usize, total: usize },

    /// 节点地址格式错误
    #[error("invalid scrapyd server: {0}")]
    InvalidServer(String),

    /// 不支持的 Scrapyd 接口
    #[error("unsupported scrapyd operation: {0}")]
    UnsupportedOperation(String),

    /// 缺少必要参数
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// 请求失败（连接、超时、解码）
    #[error("Failed to connect to Scrapyd server: {0}")]
    Request(#[from] reqwest::Error),

    /// Scrapyd 返回非 2xx 状态码
    #[error("Scrapyd returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl ScrapydError {
    /// 是否为请求层面的异常（而非 Scrapyd 返回的错误）
    pub fn is_transport(&self) -> bool {
        matches!(self, ScrapydError::Request(_))
    }
}
