use axum::response::Html;
use tera::{Context, Tera};
use tower_cookies::Cookies;

use crate::presentation::AppState;
use crate::presentation::session::AuthenticatedUser;
use crate::presentation::web::error::PageResult;
use crate::presentation::web::flash::take_flash;

pub(crate) fn load_templates(dir: &str) -> Result<Tera, tera::Error> {
    let mut tera = Tera::new(&format!("{}/**/*.html", dir.trim_end_matches('/')))?;
    tera.autoescape_on(vec![".html"]);
    Ok(tera)
}

/// Renders a page with the viewer and any pending flash notices in scope.
pub(crate) fn render(
    state: &AppState,
    cookies: &Cookies,
    viewer: Option<&AuthenticatedUser>,
    template: &str,
    mut context: Context,
) -> PageResult<Html<String>> {
    context.insert("current_user", &viewer);
    context.insert("messages", &take_flash(cookies));
    let body = state.templates.render(template, &context)?;
    Ok(Html(body))
}
