//! 一次落地页导航：路径 + 有序 query 参数

use url::form_urlencoded;

/// query 参数名
pub mod params {
    pub const REF_SHARE: &str = "ref_share";
    pub const REF_CAMPAIGN: &str = "ref_campaign";
    pub const CABINET: &str = "cabinet";
    pub const PERIOD: &str = "period";
}

/// 推荐落地路由前缀
pub const REF_ROUTE_PREFIX: &str = "/ref/";
/// 账号创建流程入口
pub const ACCOUNT_PATH: &str = "/account";

/// 一次导航请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    path: String,
    query: Vec<(String, String)>,
}

impl Navigation {
    pub fn new(path: impl Into<String>, query: Vec<(String, String)>) -> Self {
        let path = path.into();
        let path = if path.is_empty() { "/".to_string() } else { path };
        Self { path, query }
    }

    /// 从原始 path 与 query string 构建（query 不含 `?`）
    pub fn from_parts(path: &str, raw_query: Option<&str>) -> Self {
        let query = raw_query
            .map(|q| {
                form_urlencoded::parse(q.trim_start_matches('?').as_bytes())
                    .into_owned()
                    .collect()
            })
            .unwrap_or_default();
        Self::new(path, query)
    }

    /// 从 `path?query` 形式的位置解析
    pub fn from_location(location: &str) -> Self {
        match location.split_once('?') {
            Some((path, query)) => Self::from_parts(path, Some(query)),
            None => Self::from_parts(location, None),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &[(String, String)] {
        &self.query
    }

    /// 第一个同名参数的值
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 路由中的 `/ref/{token}` 段（URL 解码后的原始值）
    pub fn route_token(&self) -> Option<String> {
        let rest = self.path.strip_prefix(REF_ROUTE_PREFIX)?;
        let segment = rest.split('/').next().unwrap_or_default();
        if segment.is_empty() {
            return None;
        }
        Some(
            urlencoding::decode(segment)
                .map(|s| s.into_owned())
                .unwrap_or_else(|_| segment.to_string()),
        )
    }

    /// `cabinet=1` 请求就地展示 cabinet
    pub fn cabinet_mode(&self) -> bool {
        self.param(params::CABINET) == Some("1")
    }

    /// 去掉指定参数后的 query（保持原有顺序）
    pub fn query_without(&self, excluded: &[&str]) -> Vec<(String, String)> {
        self.query
            .iter()
            .filter(|(k, _)| !excluded.contains(&k.as_str()))
            .cloned()
            .collect()
    }

    /// 当前位置（path + 规范化 query）
    pub fn location(&self) -> String {
        build_location(&self.path, &self.query)
    }
}

/// 拼接 path 与 query，query 为空时不带 `?`
pub fn build_location(path: &str, query: &[(String, String)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (k, v) in query {
        serializer.append_pair(k, v);
    }
    format!("{}?{}", path, serializer.finish())
}
