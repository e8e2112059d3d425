//! HTML页面

use carepulse_core::utils::escape_html;
use carepulse_forms::{render_field, FormController, FormLayout};
use carepulse_workflow::{ConfirmationView, Route};
use std::fmt::Write;

fn document(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">",
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
            "<title>{}</title><link rel=\"stylesheet\" href=\"/assets/css/globals.css\"></head>",
            "<body><main class=\"flex h-screen max-h-screen\">",
            "<a href=\"/\"><img src=\"/assets/icons/logo-full.svg\" alt=\"logo\" class=\"h-10 w-fit\"></a>",
            "{}<p class=\"copyright\">© 2024 CarePulse</p></main></body></html>"
        ),
        escape_html(title),
        body
    )
}

/// 登记表单页面
pub fn registration_page(layout: &FormLayout, form: &FormController, user_id: &str) -> String {
    let action = Route::Register {
        user_id: user_id.to_string(),
    }
    .href();

    let mut body = String::new();
    let _ = write!(
        body,
        "<form action=\"{}\" method=\"post\" enctype=\"multipart/form-data\" class=\"space-y-12 flex-1\">",
        escape_html(&action)
    );
    let _ = write!(
        body,
        "<section class=\"mb-12 space-y-4\"><h1 class=\"header\">{}</h1><p class=\"text-dark-700\">{}</p></section>",
        escape_html(&layout.title),
        escape_html(&layout.subtitle)
    );

    for section in &layout.sections {
        let _ = write!(
            body,
            "<section class=\"space-y-6\"><h2 class=\"sub-header\">{}</h2>",
            escape_html(&section.title)
        );
        for row in &section.rows {
            body.push_str("<div class=\"flex flex-col gap-6 xl:flex-row\">");
            for descriptor in row {
                body.push_str(&render_field(descriptor, form).to_html());
            }
            body.push_str("</div>");
        }
        body.push_str("</section>");
    }

    if let Some(error) = form.submission_error() {
        let _ = write!(body, "<p class=\"shad-error\" role=\"alert\">{}</p>", escape_html(error));
    }

    let (label, disabled) = if form.is_loading() {
        ("Loading...", " disabled")
    } else {
        (layout.submit_label.as_str(), "")
    };
    let _ = write!(
        body,
        "<button type=\"submit\" class=\"shad-primary-btn w-full\"{}>{}</button></form>",
        disabled,
        escape_html(label)
    );

    document("Register | CarePulse", &body)
}

/// 预约确认页面
pub fn confirmation_page(view: &ConfirmationView) -> String {
    let title = if view.is_found() {
        "Appointment Requested | CarePulse"
    } else {
        "Appointment Not Found | CarePulse"
    };
    document(title, &format!("<div class=\"success-img\">{}</div>", view.to_html()))
}
