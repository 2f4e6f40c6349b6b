//! 测试用的内存站点：模拟登录、对象管理页、加锁 / 解锁确认表单和 MODS 替换表单

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use mods_xml_uploader::error::HttpError;
use mods_xml_uploader::infrastructure::{FormSubmission, WebClient};
use mods_xml_uploader::{AppResult, Page};

pub const BASE_URL: &str = "http://repo.test";
pub const USERNAME: &str = "Archivist";
pub const PASSWORD: &str = "correct horse";

const OBJECT_PREFIX: &str = "/islandora/object/";

#[derive(Default)]
struct SiteState {
    locked: HashSet<String>,
    lock_requests: HashMap<String, usize>,
    release_requests: HashMap<String, usize>,
    uploads: Vec<(String, String, Vec<u8>)>,
}

/// 内存站点
#[derive(Default)]
pub struct FakeRepository {
    requests: AtomicUsize,
    /// 管理页上不显示加锁链接的对象（被他人锁定）
    lock_denied: HashSet<String>,
    /// 提交替换表单时返回 500 的对象
    upload_fails: HashSet<String>,
    /// 加锁确认已生效但响应返回 502 的对象
    lock_confirm_fails: HashSet<String>,
    /// 任意对象加锁成功后触发的取消令牌
    cancel_on_lock: Option<CancellationToken>,
    state: Mutex<SiteState>,
}

impl FakeRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_lock(mut self, object_id: &str) -> Self {
        self.lock_denied.insert(object_id.to_string());
        self
    }

    pub fn fail_upload(mut self, object_id: &str) -> Self {
        self.upload_fails.insert(object_id.to_string());
        self
    }

    pub fn fail_lock_confirm(mut self, object_id: &str) -> Self {
        self.lock_confirm_fails.insert(object_id.to_string());
        self
    }

    pub fn cancel_on_lock(mut self, token: CancellationToken) -> Self {
        self.cancel_on_lock = Some(token);
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn uploads(&self) -> Vec<(String, String, Vec<u8>)> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn lock_requests(&self, object_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.lock_requests.get(object_id).copied().unwrap_or(0)
    }

    pub fn release_requests(&self, object_id: &str) -> usize {
        let state = self.state.lock().unwrap();
        state.release_requests.get(object_id).copied().unwrap_or(0)
    }

    pub fn locked_objects(&self) -> Vec<String> {
        let mut locked: Vec<String> = self.state.lock().unwrap().locked.iter().cloned().collect();
        locked.sort();
        locked
    }

    fn path_of<'a>(&self, url: &'a str) -> &'a str {
        let rest = url.strip_prefix(BASE_URL).unwrap_or(url);
        rest.split('?').next().unwrap_or(rest)
    }

    /// `/islandora/object/repoA%3A001/manage` → (`repoA:001`, `manage`)
    fn object_route(path: &str) -> Option<(String, String)> {
        let rest = path.strip_prefix(OBJECT_PREFIX)?;
        let (encoded_id, action) = rest.split_once('/')?;
        Some((encoded_id.replace("%3A", ":"), action.to_string()))
    }

    fn encoded(object_id: &str) -> String {
        object_id.replace(':', "%3A")
    }

    fn manage_page(&self, object_id: &str) -> String {
        let state = self.state.lock().unwrap();
        let encoded = Self::encoded(object_id);
        let link = if state.locked.contains(object_id) {
            format!(
                r#"<p>You hold the lock. <a href="{}{}/manage/unlock">release</a></p>"#,
                OBJECT_PREFIX, encoded
            )
        } else if self.lock_denied.contains(object_id) {
            "<p>This object is locked by another user.</p>".to_string()
        } else {
            format!(
                r#"<p>You must <a href="{}{}/manage/lock">acquire the lock</a> to edit.</p>"#,
                OBJECT_PREFIX, encoded
            )
        };
        format!(
            r#"<html><body><h1 class="page__title">{}</h1>
               <a href="{}{}">View</a>{}</body></html>"#,
            object_id, OBJECT_PREFIX, encoded, link
        )
    }

    fn confirmation_page(action: &str) -> String {
        format!(
            r#"<html><body>
               <form class="confirmation" method="post" action="{}">
                 <input type="hidden" name="confirm" value="1" />
                 <input type="submit" name="op" value="Confirm" />
               </form></body></html>"#,
            action
        )
    }

    fn replace_page(object_id: &str) -> String {
        format!(
            r#"<html><body>
               <form id="islandora-datastream-version-replace-form" method="post"
                     action="{}{}/datastream/MODS/replace" enctype="multipart/form-data">
                 <input type="hidden" name="form_build_id" value="form-xyz" />
                 <input type="file" name="files[file]" />
                 <input type="submit" name="op" value="Add Contents" />
               </form></body></html>"#,
            OBJECT_PREFIX,
            Self::encoded(object_id)
        )
    }

    fn login_page() -> &'static str {
        r#"<html><body>
           <form id="user-login" method="post" action="/user/login">
             <input type="text" name="name" value="" />
             <input type="password" name="pass" value="" />
             <input type="hidden" name="form_id" value="user_login" />
             <input type="submit" name="op" value="Log in" />
           </form></body></html>"#
    }

    fn not_found(url: &str) -> mods_xml_uploader::AppError {
        HttpError::BadStatus {
            url: url.to_string(),
            status: 404,
        }
        .into()
    }
}

fn field<'a>(submission: &'a FormSubmission, name: &str) -> Option<&'a str> {
    submission
        .fields
        .iter()
        .find(|(field, _)| field == name)
        .map(|(_, value)| value.as_str())
}

#[async_trait]
impl WebClient for FakeRepository {
    async fn get(&self, url: &str) -> AppResult<Page> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let path = self.path_of(url);

        if path == "/user/login" {
            return Ok(Page::new(url, Self::login_page()));
        }

        let (object_id, action) = Self::object_route(path).ok_or_else(|| Self::not_found(url))?;
        let html = match action.as_str() {
            "manage" => self.manage_page(&object_id),
            "manage/lock" | "manage/unlock" => Self::confirmation_page(path),
            "datastream/MODS/replace" => Self::replace_page(&object_id),
            _ => return Err(Self::not_found(url)),
        };
        Ok(Page::new(url, html))
    }

    async fn submit(&self, submission: FormSubmission) -> AppResult<Page> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        let action = submission.action.clone();
        let path = self.path_of(&action).to_string();

        if path == "/user/login" {
            let name = field(&submission, "name").unwrap_or_default();
            let pass = field(&submission, "pass").unwrap_or_default();
            let title = if name == USERNAME && pass == PASSWORD {
                name.to_string()
            } else {
                "User account".to_string()
            };
            let html = format!(r#"<h1 class="page__title">{}</h1>"#, title);
            return Ok(Page::new(&action, html));
        }

        let (object_id, route) =
            Self::object_route(&path).ok_or_else(|| Self::not_found(&action))?;
        let mut state = self.state.lock().unwrap();
        match route.as_str() {
            "manage/lock" => {
                *state.lock_requests.entry(object_id.clone()).or_default() += 1;
                state.locked.insert(object_id.clone());
                if let Some(token) = &self.cancel_on_lock {
                    token.cancel();
                }
                if self.lock_confirm_fails.contains(&object_id) {
                    return Err(HttpError::BadStatus {
                        url: action,
                        status: 502,
                    }
                    .into());
                }
            }
            "manage/unlock" => {
                *state.release_requests.entry(object_id.clone()).or_default() += 1;
                state.locked.remove(&object_id);
            }
            "datastream/MODS/replace" => {
                if self.upload_fails.contains(&object_id) {
                    return Err(HttpError::BadStatus {
                        url: action,
                        status: 500,
                    }
                    .into());
                }
                assert_eq!(field(&submission, "op"), Some("Add Contents"));
                let file = submission.file.ok_or_else(|| Self::not_found(&action))?;
                assert_eq!(file.field, "files[file]");
                state.uploads.push((object_id, file.file_name, file.contents));
            }
            _ => return Err(Self::not_found(&action)),
        }
        Ok(Page::new(&action, "<html><body>ok</body></html>"))
    }
}
