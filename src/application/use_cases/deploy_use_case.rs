// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::scrapyd::{NodeRegistry, ScrapydClient};
use crate::utils::time_utils::get_now_string;
use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum DeployError {
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// 上传请求
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub project: String,
    /// 为空时使用当前时间戳
    pub version: Option<String>,
    pub egg: Vec<u8>,
    /// 目标节点，为空时使用路径中的节点
    pub selected_nodes: Vec<usize>,
}

/// 单个节点的上传结果
#[derive(Debug, Clone, Serialize)]
pub struct DeployNodeResult {
    pub node: usize,
    pub server: String,
    pub status: String,
    /// Scrapyd 的原始响应
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 上传结果汇总
#[derive(Debug, Clone, Serialize)]
pub struct DeployReport {
    pub project: String,
    pub version: String,
    pub results: Vec<DeployNodeResult>,
}

/// 部署用例：把 egg 包通过 addversion.json 发到多个节点
pub struct DeployUseCase {
    registry: Arc<NodeRegistry>,
    client: Arc<ScrapydClient>,
}

/// 解析逗号分隔的节点列表，忽略空项
pub fn parse_nodes(raw: &str) -> Result<Vec<usize>, DeployError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<usize>()
                .map_err(|_| DeployError::ValidationError(format!("invalid node: {}", s)))
        })
        .collect()
}

impl DeployUseCase {
    pub fn new(registry: Arc<NodeRegistry>, client: Arc<ScrapydClient>) -> Self {
        Self { registry, client }
    }

    /// 上传到选中的节点
    ///
    /// # 参数
    ///
    /// * `node` - 路径中的节点，未选择节点时作为唯一目标
    /// * `request` - 上传内容
    ///
    /// # 返回值
    ///
    /// 每个节点一条结果，节点之间互不影响
    pub async fn deploy(
        &self,
        node: usize,
        request: DeployRequest,
    ) -> Result<DeployReport, DeployError> {
        let project = request.project.trim().to_string();
        if project.is_empty() {
            return Err(DeployError::ValidationError("project is required".to_string()));
        }
        if request.egg.is_empty() {
            return Err(DeployError::ValidationError("egg file is empty".to_string()));
        }

        let version = request
            .version
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| get_now_string(false));

        let mut seen = HashSet::new();
        let nodes: Vec<usize> = if request.selected_nodes.is_empty() {
            vec![node]
        } else {
            request
                .selected_nodes
                .into_iter()
                .filter(|index| seen.insert(*index))
                .collect()
        };

        let egg = &request.egg;
        let results = join_all(nodes.into_iter().map(|index| {
            let project = project.as_str();
            let version = version.as_str();
            async move {
                let target = match self.registry.get(index) {
                    Ok(target) => target,
                    Err(e) => {
                        return DeployNodeResult {
                            node: index,
                            server: String::new(),
                            status: "error".to_string(),
                            response: None,
                            message: Some(e.to_string()),
                        }
                    }
                };
                match self
                    .client
                    .add_version(target, project, version, egg.clone())
                    .await
                {
                    Ok(value) => {
                        let status = value
                            .get("status")
                            .and_then(Value::as_str)
                            .unwrap_or("ok")
                            .to_string();
                        info!("Deployed {} {} to {}: {}", project, version, target.server(), status);
                        DeployNodeResult {
                            node: index,
                            server: target.server(),
                            status,
                            response: Some(value),
                            message: None,
                        }
                    }
                    Err(e) => {
                        warn!("Deploy of {} to {} failed: {}", project, target.server(), e);
                        DeployNodeResult {
                            node: index,
                            server: target.server(),
                            status: "error".to_string(),
                            response: None,
                            message: Some(e.to_string()),
                        }
                    }
                }
            }
        }))
        .await;

        Ok(DeployReport {
            project,
            version,
            results,
        })
    }
}
