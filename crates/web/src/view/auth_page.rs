//! Login / sign-up page

use serde::Deserialize;

use super::components::{card, escape_html, page, Button, ButtonSize, ButtonVariant, Input};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

impl AuthMode {
    fn other(self) -> Self {
        match self {
            Self::Login => Self::Signup,
            Self::Signup => Self::Login,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Signup => "signup",
        }
    }
}

/// Everything the auth form shows besides its static text
#[derive(Debug, Clone, Default)]
pub struct AuthPage {
    pub mode: AuthMode,
    pub email: String,
    /// Inline error from the last attempt
    pub error: Option<String>,
    /// Informational message, e.g. after sign-up
    pub message: Option<String>,
}

impl AuthPage {
    pub fn new(mode: AuthMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    pub fn render(&self) -> String {
        let is_login = self.mode == AuthMode::Login;
        let (heading, subheading) = if is_login {
            ("Welcome Back", "Enter your credentials to access your list")
        } else {
            ("Create Account", "Sign up to start organizing your life")
        };

        let mut content = format!(
            "<div style=\"text-align:center\"><h1>{}</h1><p class=\"muted\">{}</p></div>",
            heading, subheading
        );

        if let Some(error) = &self.error {
            content.push_str(&format!(
                "<div class=\"alert\" role=\"alert\">&#9888; {}</div>",
                escape_html(error)
            ));
        }
        if let Some(message) = &self.message {
            content.push_str(&format!(
                "<div class=\"info\" role=\"status\">{}</div>",
                escape_html(message)
            ));
        }

        let submit_label = if is_login { "&#8594; Sign In" } else { "+ Sign Up" };
        content.push_str(&format!(
            "<form method=\"post\" action=\"/auth\" class=\"stack\">\
             <input type=\"hidden\" name=\"mode\" value=\"{}\">{}{}{}{}</form>",
            self.mode.as_str(),
            Input::new("email", &self.email)
                .kind("email")
                .label("Email")
                .placeholder("you@example.com")
                .required()
                .render(),
            Input::new("password", "")
                .kind("password")
                .label("Password")
                .placeholder("••••••••")
                .required()
                .render(),
            Button::new("Forgot password?")
                .variant(ButtonVariant::Ghost)
                .size(ButtonSize::Sm)
                .plain()
                .render(),
            Button::new(submit_label)
                .size(ButtonSize::Lg)
                .full_width()
                .render(),
        ));

        let (prompt, switch_label) = if is_login {
            ("Don't have an account? ", "Sign Up")
        } else {
            ("Already have an account? ", "Sign In")
        };
        content.push_str(&format!(
            "<div style=\"text-align:center\"><span class=\"muted\">{}</span>\
             <a href=\"/?mode={}\">{}</a></div>",
            escape_html(prompt),
            self.mode.other().as_str(),
            switch_label
        ));

        let body = format!(
            "<div class=\"container centered\"><div style=\"width:100%;max-width:400px\">{}</div></div>",
            card("stack", &content)
        );
        page(heading, &body)
    }
}
