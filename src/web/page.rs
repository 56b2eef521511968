//! Index page template
//!
//! The page is a status panel plus a form that posts to `/api/turn` and
//! renders the events, raw answer and insights. When startup failed the
//! form is left out and the error is shown instead.

use askama::Template;
use askama_derive_axum::IntoResponse as AskamaIntoResponse;

use crate::app::{ComponentStatus, NO_INSIGHTS};

#[derive(Template, AskamaIntoResponse)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub initialized: bool,
    pub credential_found: bool,
    pub mcp_server: String,
    pub mcp_connected: bool,
    pub agent: Option<String>,
    pub summary_model: Option<String>,
    pub tools: String,
    pub error: Option<String>,
    pub no_insights: &'static str,
}

impl IndexTemplate {
    pub fn new(status: &ComponentStatus) -> Self {
        let agent = match (&status.agent_name, &status.agent_model) {
            (Some(name), Some(model)) => Some(format!("{} on {}", name, model)),
            _ => None,
        };

        Self {
            initialized: status.initialized,
            credential_found: status.credential_found,
            mcp_server: status.mcp_server.clone(),
            mcp_connected: status.mcp_connected,
            agent,
            summary_model: status.summary_model.clone(),
            tools: status.tools.join(", "),
            error: status.error.clone(),
            no_insights: NO_INSIGHTS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConfigError, FrameworkError};

    fn ready() -> ComponentStatus {
        ComponentStatus {
            initialized: true,
            credential_found: true,
            mcp_server: "localhost:8080".into(),
            mcp_connected: true,
            agent_name: Some("fetch_stock_transactions_agent".into()),
            agent_model: Some("gemini-2.0-flash".into()),
            summary_model: Some("gemini-1.5-pro".into()),
            tools: vec!["fetch_stock_transactions".into()],
            error: None,
        }
    }

    #[test]
    fn test_ready_page_has_form_and_status() {
        let html = IndexTemplate::new(&ready()).render().unwrap();
        assert!(html.contains("id=\"turn-form\""));
        assert!(html.contains("localhost:8080"));
        assert!(html.contains("fetch_stock_transactions_agent on gemini-2.0-flash"));
        assert!(html.contains("Tools: fetch_stock_transactions"));
        assert!(html.contains("No insights available"));
    }

    #[test]
    fn test_failed_page_has_no_form() {
        let err: FrameworkError = ConfigError::MissingCredential("GEMINI_API_KEY".into()).into();
        let html = IndexTemplate::new(&ComponentStatus::failed(&err, "localhost:8080"))
            .render()
            .unwrap();
        assert!(!html.contains("<form"));
        assert!(!html.contains("<script>"));
        assert!(html.contains("Configuration error"));
        assert!(html.contains("GEMINI_API_KEY"));
        assert!(!html.contains("Tools:"));
    }

    #[test]
    fn test_error_text_is_escaped() {
        let mut status = ready();
        status.initialized = false;
        status.error = Some("<script>alert(1)</script>".into());

        let html = IndexTemplate::new(&status).render().unwrap();
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }
}
