// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::scrapyd::error::ScrapydError;
use reqwest::Method;
use std::fmt;
use std::str::FromStr;

/// Scrapyd JSON 接口
///
/// 每个变体对应 `{base_url}/{name}.json`，并规定路径段如何映射为请求参数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapydOperation {
    DaemonStatus,
    ListProjects,
    ListVersions,
    ListSpiders,
    ListJobs,
    DelProject,
    DelVersion,
    Schedule,
    Cancel,
    AddVersion,
}

impl ScrapydOperation {
    /// 接口名
    pub fn name(self) -> &'static str {
        match self {
            ScrapydOperation::DaemonStatus => "daemonstatus",
            ScrapydOperation::ListProjects => "listprojects",
            ScrapydOperation::ListVersions => "listversions",
            ScrapydOperation::ListSpiders => "listspiders",
            ScrapydOperation::ListJobs => "listjobs",
            ScrapydOperation::DelProject => "delproject",
            ScrapydOperation::DelVersion => "delversion",
            ScrapydOperation::Schedule => "schedule",
            ScrapydOperation::Cancel => "cancel",
            ScrapydOperation::AddVersion => "addversion",
        }
    }

    /// 发送给 Scrapyd 的 HTTP 方法，写操作一律使用 POST
    pub fn method(self) -> Method {
        match self {
            ScrapydOperation::DaemonStatus
            | ScrapydOperation::ListProjects
            | ScrapydOperation::ListVersions
            | ScrapydOperation::ListSpiders
            | ScrapydOperation::ListJobs => Method::GET,
            _ => Method::POST,
        }
    }

    /// 是否可以通过通用代理接口调用（addversion 需要上传文件，走部署接口）
    pub fn is_proxyable(self) -> bool {
        !matches!(self, ScrapydOperation::AddVersion)
    }

    fn required(self) -> &'static [&'static str] {
        match self {
            ScrapydOperation::ListVersions
            | ScrapydOperation::ListSpiders
            | ScrapydOperation::DelProject => &["project"],
            ScrapydOperation::DelVersion => &["project", "version"],
            ScrapydOperation::Schedule => &["project", "spider"],
            ScrapydOperation::Cancel => &["project", "job"],
            ScrapydOperation::AddVersion => &["project", "version"],
            _ => &[],
        }
    }

    /// 构造请求参数
    ///
    /// # 参数
    ///
    /// * `project` - 路径中的项目段
    /// * `version_spider_job` - 路径中的第二段，按接口解释为 `_version`、`version`、`spider` 或 `job`
    /// * `extra` - 查询字符串和表单中的参数，路径中已给出的键不会被覆盖
    ///
    /// # 返回值
    ///
    /// * `Ok(Vec<(String, String)>)` - 参数列表，允许重复键（如多个 `setting`）
    /// * `Err(ScrapydError::MissingParameter)` - 缺少该接口的必填参数
    pub fn build_params(
        self,
        project: Option<&str>,
        version_spider_job: Option<&str>,
        extra: &[(String, String)],
    ) -> Result<Vec<(String, String)>, ScrapydError> {
        let mut params: Vec<(String, String)> = Vec::new();

        let takes_project = !matches!(
            self,
            ScrapydOperation::DaemonStatus | ScrapydOperation::ListProjects
        );
        if takes_project {
            if let Some(project) = project.filter(|p| !p.is_empty()) {
                params.push(("project".to_string(), project.to_string()));
            }
        }

        let second_key = match self {
            ScrapydOperation::ListSpiders => Some("_version"),
            ScrapydOperation::DelVersion => Some("version"),
            ScrapydOperation::Schedule => Some("spider"),
            ScrapydOperation::Cancel => Some("job"),
            _ => None,
        };
        if let (Some(key), Some(value)) = (second_key, version_spider_job.filter(|v| !v.is_empty())) {
            params.push((key.to_string(), value.to_string()));
        }

        for (key, value) in extra {
            let from_path = params.iter().any(|(k, _)| k == key)
                && (key == "project" || Some(key.as_str()) == second_key);
            if !from_path {
                params.push((key.clone(), value.clone()));
            }
        }

        for key in self.required() {
            if !params.iter().any(|(k, v)| k == key && !v.is_empty()) {
                return Err(ScrapydError::MissingParameter(key));
            }
        }

        Ok(params)
    }
}

impl fmt::Display for ScrapydOperation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScrapydOperation {
    type Err = ScrapydError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s.trim_end_matches(".json") {
            "daemonstatus" => ScrapydOperation::DaemonStatus,
            "listprojects" => ScrapydOperation::ListProjects,
            "listversions" => ScrapydOperation::ListVersions,
            "listspiders" => ScrapydOperation::ListSpiders,
            "listjobs" => ScrapydOperation::ListJobs,
            "delproject" => ScrapydOperation::DelProject,
            "delversion" => ScrapydOperation::DelVersion,
            "schedule" => ScrapydOperation::Schedule,
            "cancel" => ScrapydOperation::Cancel,
            "addversion" => ScrapydOperation::AddVersion,
            other => return Err(ScrapydError::UnsupportedOperation(other.to_string())),
        };
        Ok(op)
    }
}
