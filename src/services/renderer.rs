//! HTML rendering via handlebars.
//!
//! The two templates are embedded at compile time and registered once.
//! HTML escaping stays on: all request data is untrusted. Strict mode
//! stays off so an absent optional field renders as an empty string
//! instead of failing the page.

use crate::config::RenderOptions;
use crate::error::AppError;
use crate::services::view_model::RequestView;
use handlebars::Handlebars;
use serde_json::json;

const REQUEST_TEMPLATE: &str = include_str!("../../templates/request.hbs");
const INDEX_TEMPLATE: &str = include_str!("../../templates/index.hbs");

/// Template registry shared by both sinks.
pub struct Renderer {
    hb: Handlebars<'static>,
}

impl Renderer {
    /// Register the embedded templates. Failure here is a build defect.
    pub fn new() -> Result<Self, AppError> {
        let mut hb = Handlebars::new();
        hb.register_template_string("request", REQUEST_TEMPLATE)
            .map_err(|e| AppError::render(format!("Bad request template: {}", e)))?;
        hb.register_template_string("index", INDEX_TEMPLATE)
            .map_err(|e| AppError::render(format!("Bad index template: {}", e)))?;
        Ok(Self { hb })
    }

    /// Render a request page.
    pub fn render_request(&self, view: &RequestView) -> Result<String, AppError> {
        Ok(self.hb.render("request", view)?)
    }

    /// Render the landing page.
    pub fn render_index(&self, options: &RenderOptions) -> Result<String, AppError> {
        Ok(self.hb.render(
            "index",
            &json!({
                "theme": options.theme.to_string(),
                "stylesheet_url": options.stylesheet_url,
            }),
        )?)
    }
}
