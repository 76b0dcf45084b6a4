//! HTTP 执行器 - 基础设施层
//!
//! 持有唯一的 reqwest Client，只暴露"发请求"的能力

use std::time::Duration;

use reqwest::{header, Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::Config;
use crate::error::{AppError, AppResult, ConfigError};

/// HTTP 执行器
///
/// 职责：
/// - 持有唯一的 Client 资源与后端根地址
/// - 暴露 GET / POST JSON 能力
/// - 不认识 Question / Test
/// - 不处理业务流程
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    client: Client,
    base_url: Url,
}

impl HttpExecutor {
    /// 创建新的 HTTP 执行器
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_base_url(
            &config.api_base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let invalid_base = || {
            AppError::Config(ConfigError::InvalidValue {
                key: "api_base_url".to_string(),
                value: base_url.to_string(),
                expected: "http(s) 根地址".to_string(),
            })
        };
        let parsed = Url::parse(base_url).map_err(|_| invalid_base())?;
        if parsed.cannot_be_a_base() {
            return Err(invalid_base());
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| AppError::api_request_failed(base_url, e))?;

        Ok(Self {
            client,
            base_url: parsed,
        })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// 逐段拼接路径，每段单独做百分号编码
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// 日志与错误中使用的端点描述
    fn endpoint(segments: &[&str]) -> String {
        format!("/{}", segments.join("/"))
    }

    /// 发送 GET 请求并反序列化 JSON 响应
    ///
    /// # 参数
    /// - `segments`: 路径段（不含 `/`），如 `["result", "test", id]`
    /// - `query`: 查询参数
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = self.url(segments);
        let endpoint = &Self::endpoint(segments);
        debug!("GET {} {:?}", url, query);

        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        let response = Self::ensure_success(endpoint, response).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        Ok(serde_json::from_slice(&body)?)
    }

    /// 发送 POST JSON 请求，只关心是否成功
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> AppResult<()> {
        let url = self.url(segments);
        let endpoint = &Self::endpoint(segments);
        debug!("POST {}", url);

        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::api_request_failed(endpoint, e))?;

        Self::ensure_success(endpoint, response).await?;
        Ok(())
    }

    /// 非 2xx 视为错误
    async fn ensure_success(endpoint: &str, response: Response) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.ok().filter(|t| !t.is_empty());
        error!("Request failed with status {} ({})", status.as_u16(), endpoint);
        Err(AppError::bad_response(endpoint, status.as_u16(), message))
    }
}
