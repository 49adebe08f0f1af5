//! HTML views
//!
//! Tera templates compiled into the binary with rust-embed. Every page is
//! rendered with a set of standard variables (site name, request path, year,
//! header navigation and an optional toast).

use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::Serialize;
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

use crate::models::User;
use crate::services::{NavModel, Toast};

mod error;

pub use error::ViewError;

/// Embedded page templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct TemplateAssets;

/// Renders the site's HTML pages
pub struct ViewEngine {
    tera: Tera,
}

impl ViewEngine {
    /// Load every embedded template
    pub fn new() -> Result<Self, ViewError> {
        let mut templates: Vec<(String, String)> = Vec::new();
        for name in TemplateAssets::iter() {
            let Some(file) = TemplateAssets::get(&name) else {
                continue;
            };
            let content = String::from_utf8(file.data.into_owned()).map_err(|e| {
                ViewError::TemplateError(format!("Template {} is not UTF-8: {}", name, e))
            })?;
            templates.push((name.to_string(), content));
        }

        Self::from_templates(templates)
    }

    /// Build an engine from raw `(name, source)` pairs
    pub fn from_templates(templates: Vec<(String, String)>) -> Result<Self, ViewError> {
        let mut tera = Tera::default();
        tera.add_raw_templates(templates)
            .map_err(|e| ViewError::TemplateError(error_chain(&e)))?;

        tracing::debug!("Loaded {} templates", tera.get_template_names().count());
        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|t| t == name)
    }

    /// Render a template with a ready-made context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String, ViewError> {
        if !self.has_template(template) {
            return Err(ViewError::NotFound(template.to_string()));
        }
        self.tera
            .render(template, context)
            .map_err(|e| ViewError::TemplateError(format!("Failed to render '{}': {}", template, error_chain(&e))))
    }

    /// Render a page with the standard variables added
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        vars: &PageVars,
    ) -> Result<String, ViewError> {
        let mut full_context = context.clone();
        full_context.insert("site_name", &vars.site_name);
        full_context.insert("request_path", &vars.request_path);
        full_context.insert("year", &vars.year);
        full_context.insert("nav", &vars.nav);
        if let Some(toast) = &vars.toast {
            full_context.insert("toast", toast);
        }

        self.render(template, &full_context)
    }

    /// Render a page, falling back to `error.html` and then to plain HTML
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext, vars: &PageVars) -> String {
        match self.render_page(template, context, vars) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to render template '{}': {}", template, e);

                let mut error_context = TeraContext::new();
                error_context.insert("error_message", "Something went wrong");
                match self.render_page("error.html", &error_context, vars) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::error!("Failed to render error template: {}", error_template_err);
                        simple_error_page(&vars.site_name)
                    }
                }
            }
        }
    }
}

fn error_chain(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Last-resort page when no template can be rendered
fn simple_error_page(site_name: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Error | {}</title></head>
<body><h1>Something went wrong</h1><p>Please try again later.</p></body>
</html>"#,
        tera::escape_html(site_name)
    )
}

/// Variables every page receives
#[derive(Debug, Clone, Serialize)]
pub struct PageVars {
    pub site_name: String,
    pub request_path: String,
    pub year: i32,
    pub nav: NavModel,
    pub toast: Option<Toast>,
}

impl PageVars {
    /// Standard variables for a request by `user`.
    ///
    /// The header is derived once here, so a page never mixes two auth states.
    pub fn new(site_name: impl Into<String>, request_path: impl Into<String>, user: Option<&User>) -> Self {
        Self {
            site_name: site_name.into(),
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
            nav: NavModel::for_user(user),
            toast: None,
        }
    }

    pub fn with_toast(mut self, toast: Option<Toast>) -> Self {
        self.toast = toast;
        self
    }
}
