//! 页面解析 - 基础设施层
//!
//! 把服务器返回的 HTML 解析成链接、表单、标题等纯数据。
//! `scraper::Html` 不是 `Send`，所以所有解析都是同步的，只返回自有数据。

use reqwest::Url;
use scraper::{ElementRef, Html};

use crate::error::{AppError, AppResult, PageError};
use crate::infrastructure::web_client::{FileUpload, FormMethod, FormSubmission};

/// 一个已加载的页面
#[derive(Debug, Clone)]
pub struct Page {
    /// 最终地址（跟随重定向之后）
    pub url: String,
    pub html: String,
}

/// 页面上的一个链接
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// 可见文本（去掉首尾空白）
    pub text: String,
    pub href: String,
}

impl Page {
    pub fn new(url: impl Into<String>, html: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            html: html.into(),
        }
    }

    /// 页面上所有带 href 的链接
    pub fn links(&self) -> Vec<Link> {
        let document = Html::parse_document(&self.html);
        let links = elements(&document)
            .filter(|el| el.value().name() == "a")
            .filter_map(|el| {
                let href = el.value().attr("href")?;
                Some(Link {
                    text: element_text(&el),
                    href: href.to_string(),
                })
            })
            .collect();
        links
    }

    /// 查找可见文本与 `text` 完全相同的第一个链接
    pub fn find_link(&self, text: &str) -> Option<Link> {
        self.links().into_iter().find(|link| link.text == text)
    }

    /// 第一个带有指定 CSS class 的元素的文本
    pub fn text_by_class(&self, class: &str) -> Option<String> {
        let document = Html::parse_document(&self.html);
        let text = elements(&document)
            .find(|el| el.value().classes().any(|c| c == class))
            .map(|el| element_text(&el));
        text
    }

    /// 按 id 查找表单
    pub fn form_by_id(&self, id: &str) -> AppResult<HtmlForm> {
        self.find_form(|el| el.value().id() == Some(id))
            .ok_or_else(|| AppError::form_not_found(&self.url, format!("#{}", id)))
    }

    /// 按 CSS class 查找第一个表单
    pub fn form_by_class(&self, class: &str) -> AppResult<HtmlForm> {
        self.find_form(|el| el.value().classes().any(|c| c == class))
            .ok_or_else(|| AppError::form_not_found(&self.url, format!(".{}", class)))
    }

    /// 把相对链接解析为绝对地址
    pub fn resolve(&self, href: &str) -> AppResult<String> {
        let base = Url::parse(&self.url).map_err(|e| AppError::invalid_url(&self.url, e))?;
        let joined = base.join(href).map_err(|e| AppError::invalid_url(href, e))?;
        Ok(joined.to_string())
    }

    fn find_form(&self, predicate: impl Fn(&ElementRef<'_>) -> bool) -> Option<HtmlForm> {
        let document = Html::parse_document(&self.html);
        let form = elements(&document)
            .filter(|el| el.value().name() == "form")
            .find(|el| predicate(el))
            .map(|el| HtmlForm::parse(&el));
        form
    }
}

/// 解析后的 HTML 表单
#[derive(Debug, Clone, Default)]
pub struct HtmlForm {
    pub id: Option<String>,
    pub action: Option<String>,
    pub method: FormMethod,
    /// 普通字段（按出现顺序）
    pub fields: Vec<(String, String)>,
    /// 文件字段名
    pub file_fields: Vec<String>,
    /// 提交控件（name, value）
    pub submits: Vec<(String, String)>,
}

impl HtmlForm {
    fn parse(form: &ElementRef<'_>) -> Self {
        let attrs = form.value();
        let method = match attrs.attr("method") {
            Some(m) if m.eq_ignore_ascii_case("post") => FormMethod::Post,
            _ => FormMethod::Get,
        };
        let mut parsed = HtmlForm {
            id: attrs.id().map(str::to_string),
            action: attrs.attr("action").map(str::to_string),
            method,
            ..Default::default()
        };

        for el in form.descendants().filter_map(ElementRef::wrap) {
            let value = el.value();
            let Some(name) = value.attr("name") else {
                continue;
            };
            let name = name.to_string();
            match value.name() {
                "input" => {
                    let kind = value.attr("type").unwrap_or("text").to_ascii_lowercase();
                    let current = value.attr("value").unwrap_or_default().to_string();
                    match kind.as_str() {
                        "submit" | "image" => parsed.submits.push((name, current)),
                        "file" => parsed.file_fields.push(name),
                        "checkbox" | "radio" => {
                            if value.attr("checked").is_some() {
                                let current = value.attr("value").unwrap_or("on").to_string();
                                parsed.fields.push((name, current));
                            }
                        }
                        "button" | "reset" => {}
                        _ => parsed.fields.push((name, current)),
                    }
                }
                "button" => {
                    let kind = value.attr("type").unwrap_or("submit");
                    if kind.eq_ignore_ascii_case("submit") {
                        let current = value.attr("value").unwrap_or_default().to_string();
                        parsed.submits.push((name, current));
                    }
                }
                "textarea" => parsed.fields.push((name, el.text().collect())),
                "select" => {
                    let options: Vec<ElementRef<'_>> = el
                        .descendants()
                        .filter_map(ElementRef::wrap)
                        .filter(|o| o.value().name() == "option")
                        .collect();
                    let chosen = options
                        .iter()
                        .find(|o| o.value().attr("selected").is_some())
                        .or_else(|| options.first());
                    if let Some(option) = chosen {
                        let current = option
                            .value()
                            .attr("value")
                            .map(str::to_string)
                            .unwrap_or_else(|| element_text(option));
                        parsed.fields.push((name, current));
                    }
                }
                _ => {}
            }
        }

        parsed
    }

    fn label(&self) -> String {
        self.id.clone().unwrap_or_else(|| "<form>".to_string())
    }

    /// 给已有字段赋值
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> AppResult<()> {
        let label = self.label();
        let slot = self
            .fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .ok_or_else(|| PageError::FieldNotFound {
                form: label,
                field: name.to_string(),
            })?;
        slot.1 = value.into();
        Ok(())
    }

    /// 当前字段值
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value.as_str())
    }

    /// 转换为一次提交
    ///
    /// `submit` 为 `None` 时使用第一个提交控件，与浏览器行为一致。
    pub fn into_submission(
        self,
        page_url: &str,
        submit: Option<&str>,
        file: Option<FileUpload>,
    ) -> AppResult<FormSubmission> {
        let label = self.label();
        let page = Page::new(page_url, String::new());
        let action = match self.action.as_deref() {
            Some(action) if !action.trim().is_empty() => page.resolve(action)?,
            _ => page_url.to_string(),
        };

        let pressed = match submit {
            Some(name) => Some(
                self.submits
                    .iter()
                    .find(|(field, _)| field == name)
                    .cloned()
                    .ok_or_else(|| PageError::FieldNotFound {
                        form: label.clone(),
                        field: name.to_string(),
                    })?,
            ),
            None => self.submits.first().cloned(),
        };

        if let Some(upload) = &file {
            if !self.file_fields.iter().any(|f| f == &upload.field) {
                return Err(PageError::FieldNotFound {
                    form: label,
                    field: upload.field.clone(),
                }
                .into());
            }
        }

        let mut fields = self.fields;
        fields.extend(pressed);

        Ok(FormSubmission {
            action,
            method: self.method,
            fields,
            file,
        })
    }
}

fn elements(document: &Html) -> impl Iterator<Item = ElementRef<'_>> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
}

fn element_text(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}
