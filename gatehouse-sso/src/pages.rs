//! The login page. Kept as a plain format string: one form, no assets, no
//! client-side script. Query values flow into markup, so everything
//! user-controlled passes through [`escape_html`].

use url::form_urlencoded;

/// Render the login form. `app` and `redirect_to` are carried through the
/// form action so the POST sees the same flow parameters; `error` adds a
/// message line above the form.
pub fn login_page(app: Option<&str>, redirect_to: Option<&str>, error: Option<&str>) -> String {
    let action = escape_html(&login_action(app, redirect_to));
    let heading = match app {
        Some(app) => format!("Sign in to {}", escape_html(app)),
        None => "Sign in".to_string(),
    };
    let error_line = match error {
        Some(message) => format!(
            "\n      <p class=\"error\">{}</p>",
            escape_html(message)
        ),
        None => String::new(),
    };

    format!(
        r#"<!doctype html>
<html lang="en">
  <head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>Sign in</title>
    <style>
      body {{ font-family: system-ui, sans-serif; display: grid; place-items: center; min-height: 100vh; margin: 0; background: #f4f4f5; }}
      form {{ background: #fff; padding: 2rem; border-radius: 8px; box-shadow: 0 1px 4px rgb(0 0 0 / 0.1); min-width: 20rem; }}
      label {{ display: block; margin-top: 1rem; }}
      input {{ width: 100%; padding: 0.5rem; margin-top: 0.25rem; box-sizing: border-box; }}
      button {{ margin-top: 1.5rem; width: 100%; padding: 0.6rem; }}
      .error {{ color: #b91c1c; margin: 0; }}
    </style>
  </head>
  <body>
    <form method="post" action="{action}">
      <h1>{heading}</h1>{error_line}
      <label>Username or email
        <input type="text" name="username" autocomplete="username" autofocus required>
      </label>
      <label>Password
        <input type="password" name="password" autocomplete="current-password" required>
      </label>
      <button type="submit">Sign in</button>
    </form>
  </body>
</html>
"#
    )
}

fn login_action(app: Option<&str>, redirect_to: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    let mut has_query = false;
    if let Some(app) = app {
        query.append_pair("app", app);
        has_query = true;
    }
    if let Some(target) = redirect_to {
        query.append_pair("redirect_to", target);
        has_query = true;
    }

    if has_query {
        format!("/login?{}", query.finish())
    } else {
        "/login".to_string()
    }
}

/// Escape for both text and attribute positions.
pub fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markup_characters_are_escaped() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("a & b"), "a &amp; b");
    }

    #[test]
    fn flow_parameters_ride_the_form_action() {
        let page = login_page(Some("wiki"), Some("/deep/page?x=1"), None);
        assert!(page.contains(r#"action="/login?app=wiki&amp;redirect_to=%2Fdeep%2Fpage%3Fx%3D1""#));
        assert!(page.contains("Sign in to wiki"));
    }

    #[test]
    fn hostile_query_values_cannot_break_out_of_the_form() {
        let page = login_page(Some(r#""><script>alert(1)</script>"#), None, None);
        assert!(!page.contains("<script>alert"));
        assert!(page.contains("&quot;&gt;&lt;script&gt;"));
    }

    #[test]
    fn the_error_line_only_appears_on_demand() {
        let clean = login_page(None, None, None);
        assert!(!clean.contains("class=\"error\""));

        let failed = login_page(None, None, Some("Invalid username or password."));
        assert!(failed.contains("Invalid username or password."));
        assert!(failed.contains("class=\"error\""));
    }
}
