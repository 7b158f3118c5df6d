//! Presentational building blocks: page shell, card, input, button

const STYLES: &str = r#"
:root {
  --primary: #6366f1; --primary-hover: #4f46e5; --surface: #ffffff;
  --text: #0f172a; --text-muted: #64748b; --border: #e2e8f0;
  --error: #ef4444; --radius: 0.75rem; --shadow-sm: 0 1px 2px rgba(0,0,0,0.05);
}
* { box-sizing: border-box; margin: 0; }
body { font-family: system-ui, sans-serif; background: #f1f5f9; color: var(--text); }
.container { max-width: 720px; margin: 0 auto; padding: 2rem 1rem; }
.centered { display: flex; justify-content: center; align-items: center; min-height: calc(100vh - 4rem); }
.card { background: var(--surface); border-radius: var(--radius); padding: 2rem; box-shadow: var(--shadow-sm); }
.stack { display: flex; flex-direction: column; gap: 1rem; }
.row { display: flex; gap: 1rem; align-items: flex-start; }
.spread { display: flex; justify-content: space-between; align-items: center; }
.field { display: flex; flex-direction: column; gap: 0.5rem; width: 100%; }
.field label { font-size: 0.875rem; font-weight: 500; }
.field input { padding: 0.75rem 1rem; border: 1px solid var(--border); border-radius: var(--radius); font-size: 1rem; }
.btn { display: inline-flex; align-items: center; justify-content: center; gap: 0.5rem;
  border-radius: var(--radius); font-weight: 600; cursor: pointer; border: none; }
.btn:disabled { cursor: not-allowed; opacity: 0.7; }
.btn-primary { background: var(--primary); color: white; box-shadow: var(--shadow-sm); }
.btn-primary:hover { background: var(--primary-hover); }
.btn-ghost { background: transparent; color: var(--text-muted); }
.btn-sm { padding: 0.5rem 0.75rem; font-size: 0.875rem; }
.btn-md { padding: 0.75rem 1.5rem; font-size: 1rem; }
.btn-lg { padding: 1rem 2rem; font-size: 1.125rem; }
.btn-full { width: 100%; }
.inline { display: inline; }
.muted { color: var(--text-muted); }
.alert { background: #fee2e2; color: #dc2626; padding: 1rem; border-radius: var(--radius); font-size: 0.875rem; }
.info { background: #e0e7ff; color: #3730a3; padding: 1rem; border-radius: var(--radius); font-size: 0.875rem; }
.task { display: flex; justify-content: space-between; align-items: flex-start; padding: 1.5rem; }
.task.done { opacity: 0.7; }
.task.done .title, .task.done .text { text-decoration: line-through; color: var(--text-muted); }
.task.editing { border: 2px solid var(--primary); }
.task .title { font-size: 1.1rem; font-weight: 600; }
.task .text { font-size: 0.95rem; color: var(--text-muted); }
.toggle { background: none; border: none; cursor: pointer; text-align: left; display: flex; gap: 1rem; flex: 1; padding: 0; font: inherit; color: inherit; }
.empty { text-align: center; padding: 3rem; color: var(--text-muted); }
"#;

/// Escape text for use in element content and quoted attributes
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Full HTML document around `body`
pub fn page(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape_html(title),
        STYLES,
        body
    )
}

/// Panel wrapper; `class` is appended to the base card class
pub fn card(class: &str, content: &str) -> String {
    if class.is_empty() {
        format!("<div class=\"card\">{}</div>", content)
    } else {
        format!("<div class=\"card {}\">{}</div>", class, content)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonVariant {
    Primary,
    Ghost,
}

impl ButtonVariant {
    fn class(self) -> &'static str {
        match self {
            Self::Primary => "btn-primary",
            Self::Ghost => "btn-ghost",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonSize {
    Sm,
    Md,
    Lg,
}

impl ButtonSize {
    fn class(self) -> &'static str {
        match self {
            Self::Sm => "btn-sm",
            Self::Md => "btn-md",
            Self::Lg => "btn-lg",
        }
    }
}

/// A `<button>`; the label is raw HTML so icons can be mixed in
pub struct Button<'a> {
    label: &'a str,
    variant: ButtonVariant,
    size: ButtonSize,
    submit: bool,
    full_width: bool,
    formaction: Option<&'a str>,
    title: Option<&'a str>,
}

impl<'a> Button<'a> {
    pub fn new(label: &'a str) -> Self {
        Self {
            label,
            variant: ButtonVariant::Primary,
            size: ButtonSize::Md,
            submit: true,
            full_width: false,
            formaction: None,
            title: None,
        }
    }

    pub fn variant(mut self, variant: ButtonVariant) -> Self {
        self.variant = variant;
        self
    }

    pub fn size(mut self, size: ButtonSize) -> Self {
        self.size = size;
        self
    }

    /// Plain button that does not submit its form
    pub fn plain(mut self) -> Self {
        self.submit = false;
        self
    }

    pub fn full_width(mut self) -> Self {
        self.full_width = true;
        self
    }

    /// Submit the enclosing form to a different action
    pub fn formaction(mut self, action: &'a str) -> Self {
        self.formaction = Some(action);
        self
    }

    pub fn title(mut self, title: &'a str) -> Self {
        self.title = Some(title);
        self
    }

    pub fn render(&self) -> String {
        let mut class = format!("btn {} {}", self.variant.class(), self.size.class());
        if self.full_width {
            class.push_str(" btn-full");
        }

        let mut attrs = format!(
            "type=\"{}\" class=\"{}\"",
            if self.submit { "submit" } else { "button" },
            class
        );
        if let Some(action) = self.formaction {
            attrs.push_str(&format!(" formaction=\"{}\"", escape_html(action)));
        }
        if let Some(title) = self.title {
            attrs.push_str(&format!(" title=\"{}\"", escape_html(title)));
        }

        format!("<button {}>{}</button>", attrs, self.label)
    }
}

/// A labelled text input
pub struct Input<'a> {
    name: &'a str,
    value: &'a str,
    kind: &'a str,
    label: Option<&'a str>,
    placeholder: Option<&'a str>,
    required: bool,
    autofocus: bool,
}

impl<'a> Input<'a> {
    pub fn new(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            value,
            kind: "text",
            label: None,
            placeholder: None,
            required: false,
            autofocus: false,
        }
    }

    pub fn kind(mut self, kind: &'a str) -> Self {
        self.kind = kind;
        self
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = Some(label);
        self
    }

    pub fn placeholder(mut self, placeholder: &'a str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn autofocus(mut self) -> Self {
        self.autofocus = true;
        self
    }

    pub fn render(&self) -> String {
        let id = format!("field-{}", self.name);
        let mut html = String::from("<div class=\"field\">");
        if let Some(label) = self.label {
            html.push_str(&format!("<label for=\"{}\">{}</label>", id, escape_html(label)));
        }
        html.push_str(&format!(
            "<input id=\"{}\" type=\"{}\" name=\"{}\" value=\"{}\"",
            id,
            self.kind,
            self.name,
            escape_html(self.value)
        ));
        if let Some(placeholder) = self.placeholder {
            html.push_str(&format!(" placeholder=\"{}\"", escape_html(placeholder)));
        }
        if self.required {
            html.push_str(" required");
        }
        if self.autofocus {
            html.push_str(" autofocus");
        }
        html.push_str("></div>");
        html
    }
}

/// A form holding a single button, for actions with no inputs
pub fn action_button(action: &str, button: Button<'_>) -> String {
    format!(
        "<form method=\"post\" action=\"{}\" class=\"inline\">{}</form>",
        escape_html(action),
        button.render()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            escape_html(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#39;y&#39;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn button_classes() {
        let html = Button::new("Save")
            .variant(ButtonVariant::Ghost)
            .size(ButtonSize::Sm)
            .full_width()
            .render();
        assert_eq!(
            html,
            "<button type=\"submit\" class=\"btn btn-ghost btn-sm btn-full\">Save</button>"
        );

        let html = Button::new("x").plain().render();
        assert!(html.contains("type=\"button\""));
    }

    #[test]
    fn button_optional_attributes_are_escaped() {
        let html = Button::new("Cancel")
            .formaction("/todos/edit/cancel")
            .title("Don't save")
            .render();
        assert_eq!(
            html,
            "<button type=\"submit\" class=\"btn btn-primary btn-md\" \
             formaction=\"/todos/edit/cancel\" title=\"Don&#39;t save\">Cancel</button>"
        );
    }

    #[test]
    fn input_escapes_value() {
        let html = Input::new("title", "a\"b")
            .label("Title")
            .placeholder("Task Title")
            .required()
            .render();
        assert!(html.contains("value=\"a&quot;b\""));
        assert!(html.contains("<label for=\"field-title\">Title</label>"));
        assert!(html.contains(" required"));
        assert!(!html.contains("autofocus"));
    }

    #[test]
    fn page_wraps_body() {
        let html = page("My <Tasks>", "<p>hi</p>");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>My &lt;Tasks&gt;</title>"));
        assert!(html.contains("<p>hi</p>"));
    }
}
