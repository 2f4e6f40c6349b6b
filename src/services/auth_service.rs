//! 登录服务 - 业务能力层
//!
//! 只负责"登录一次，得到可复用的会话"

use std::fmt;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::AuthError;
use crate::infrastructure::WebClient;

const LOGIN_PATH: &str = "/user/login";
const LOGIN_FORM_ID: &str = "user-login";
const TITLE_CLASS: &str = "page__title";

/// 登录凭据，只保存在内存中
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// 已登录的会话
///
/// 创建后只读，所有上传任务共享同一个 cookie 存储。
#[derive(Clone)]
pub struct Session {
    client: Arc<dyn WebClient>,
    base_url: String,
    username: String,
}

impl Session {
    pub fn client(&self) -> &dyn WebClient {
        self.client.as_ref()
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// 站点内的绝对地址
    pub fn url(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .finish()
    }
}

/// 登录服务
///
/// 每个进程最多登录一次：已有会话时直接返回，不再发请求。
pub struct Authenticator {
    client: Arc<dyn WebClient>,
    base_url: String,
    session: OnceCell<Session>,
}

impl Authenticator {
    pub fn new(client: Arc<dyn WebClient>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session: OnceCell::new(),
        }
    }

    /// 当前会话（未登录时为 None）
    pub fn session(&self) -> Option<&Session> {
        self.session.get()
    }

    /// 登录并返回会话
    ///
    /// 成功的唯一依据：登录后页面 `.page__title` 的文本与用户名一致。
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        if let Some(session) = self.session.get() {
            debug!("已有会话，跳过登录");
            return Ok(session.clone());
        }
        if username.trim().is_empty() {
            return Err(AuthError::BlankUsername);
        }
        if password.trim().is_empty() {
            return Err(AuthError::BlankPassword);
        }

        let session = self
            .session
            .get_or_try_init(|| self.login(username, password))
            .await?;
        Ok(session.clone())
    }

    async fn login(&self, username: &str, password: &str) -> Result<Session, AuthError> {
        let login_url = join_url(&self.base_url, LOGIN_PATH);
        info!("🔐 正在登录: {}", login_url);

        let page = self.client.get(&login_url).await?;
        let mut form = page.form_by_id(LOGIN_FORM_ID)?;
        form.set("name", username)?;
        form.set("pass", password)?;
        let submission = form.into_submission(&page.url, None, None)?;

        let result = self.client.submit(submission).await?;
        let heading = result.text_by_class(TITLE_CLASS);

        if heading.as_deref() == Some(username) {
            info!("✓ 登录成功: {}", username);
            Ok(Session {
                client: self.client.clone(),
                base_url: self.base_url.clone(),
                username: username.to_string(),
            })
        } else {
            warn!("登录失败，页面标题: {:?}", heading);
            Err(AuthError::Rejected {
                username: username.to_string(),
                heading,
            })
        }
    }
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}
