use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 登录认证错误
    #[error("认证错误: {0}")]
    Auth(#[from] AuthError),
    /// HTTP 请求错误
    #[error("HTTP错误: {0}")]
    Http(#[from] HttpError),
    /// 页面结构错误（找不到表单、字段等）
    #[error("页面错误: {0}")]
    Page(#[from] PageError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 登录认证错误，对整个批次是致命的
#[derive(Debug, Error)]
pub enum AuthError {
    /// 用户名为空
    #[error("用户名不能为空")]
    BlankUsername,
    /// 密码为空
    #[error("密码不能为空")]
    BlankPassword,
    /// 登录后页面标题与用户名不一致
    #[error("登录失败: 页面标题为 {heading:?}，期望 {username:?}")]
    Rejected {
        username: String,
        heading: Option<String>,
    },
    /// 登录过程中请求或解析失败
    #[error("登录请求失败: {source}")]
    RequestFailed {
        #[source]
        source: Box<AppError>,
    },
}

/// HTTP 请求错误
#[derive(Debug, Error)]
pub enum HttpError {
    /// 网络请求失败
    #[error("请求 {url} 失败: {source}")]
    RequestFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// 服务器返回非 2xx 状态码
    #[error("请求 {url} 返回状态码 {status}")]
    BadStatus { url: String, status: u16 },
    /// URL 无法解析
    #[error("无效的URL {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 构建 HTTP 客户端失败
    #[error("创建HTTP客户端失败: {0}")]
    ClientBuildFailed(#[source] reqwest::Error),
}

/// 页面结构错误
#[derive(Debug, Error)]
pub enum PageError {
    /// 页面上找不到表单
    #[error("页面 {url} 上找不到表单 {selector}")]
    FormNotFound { url: String, selector: String },
    /// 表单中找不到字段
    #[error("表单 {form} 中找不到字段 {field}")]
    FieldNotFound { form: String, field: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 目录不存在
    #[error("目录不存在: {path}")]
    DirectoryNotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入文件失败
    #[error("写入文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 并发数必须大于 0
    #[error("并发数必须大于 0")]
    ZeroConcurrency,
    /// 站点地址无效
    #[error("站点地址无效: {url}")]
    InvalidBaseUrl { url: String },
}

/// 文件名解析警告
///
/// 只影响单个文件：该文件被跳过，批次继续。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryWarning {
    /// 文件名不是有效的 UTF-8
    #[error("文件名不是有效的UTF-8: {path}")]
    NonUtf8Name { path: String },
    /// 文件名中没有 `_` 分隔符
    #[error("文件名缺少 '_' 分隔符: {file_name}")]
    MissingSeparator { file_name: String },
    /// 命名空间或编号为空
    #[error("文件名中的命名空间或编号为空: {file_name}")]
    EmptyIdentifier { file_name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络请求失败错误
    pub fn request_failed(url: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Http(HttpError::RequestFailed {
            url: url.into(),
            source,
        })
    }

    /// 创建 URL 解析失败错误
    pub fn invalid_url(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Http(HttpError::InvalidUrl {
            url: url.into(),
            source: Box::new(source),
        })
    }

    /// 创建找不到表单错误
    pub fn form_not_found(url: impl Into<String>, selector: impl Into<String>) -> Self {
        AppError::Page(PageError::FormNotFound {
            url: url.into(),
            selector: selector.into(),
        })
    }

    /// 创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::ReadFailed {
            path: path.into(),
            source,
        })
    }

    /// 创建文件写入错误
    pub fn file_write_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source,
        })
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Auth(auth) => auth,
            other => AuthError::RequestFailed {
                source: Box::new(other),
            },
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
