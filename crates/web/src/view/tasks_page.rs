//! Task list page

use todo_core::store::{EditCursor, StoreSnapshot};
use todo_core::task::Task;

use super::components::{action_button, card, escape_html, page, Button, ButtonSize, ButtonVariant, Input};

fn render_create_form(snapshot: &StoreSnapshot) -> String {
    let form = format!(
        "<form method=\"post\" action=\"/todos\" class=\"stack\">{}<div class=\"row\">{}{}</div></form>",
        Input::new("title", &snapshot.draft.title)
            .placeholder("Task Title")
            .required()
            .autofocus()
            .render(),
        Input::new("text", &snapshot.draft.text)
            .placeholder("Description (optional)")
            .render(),
        Button::new("+").size(ButtonSize::Lg).title("Add task").render(),
    );
    card("", &form)
}

fn render_edit_mode(cursor: &EditCursor) -> String {
    let form = format!(
        "<form method=\"post\" action=\"/todos/edit/save\" class=\"stack\" style=\"width:100%\">\
         {}{}<div class=\"row\" style=\"justify-content:flex-end\">{}{}</div></form>",
        Input::new("title", &cursor.title)
            .placeholder("Task Title")
            .render(),
        Input::new("text", &cursor.text)
            .placeholder("Description")
            .render(),
        Button::new("&#10005; Cancel")
            .variant(ButtonVariant::Ghost)
            .size(ButtonSize::Sm)
            .formaction("/todos/edit/cancel")
            .render(),
        Button::new("&#128190; Save").size(ButtonSize::Sm).render(),
    );
    card("task editing", &form)
}

fn render_view_mode(task: &Task) -> String {
    let marker = if task.is_complete { "&#10004;" } else { "&#9675;" };
    let mut label = format!(
        "<span>{}</span><span class=\"stack\" style=\"gap:0.25rem\"><span class=\"title\">{}</span>",
        marker,
        escape_html(&task.title)
    );
    if !task.text.is_empty() {
        label.push_str(&format!("<span class=\"text\">{}</span>", escape_html(&task.text)));
    }
    label.push_str("</span>");

    let toggle = format!(
        "<form method=\"post\" action=\"/todos/{}/toggle\" style=\"flex:1\">\
         <button type=\"submit\" class=\"toggle\">{}</button></form>",
        task.id, label
    );

    let edit_action = format!("/todos/{}/edit", task.id);
    let delete_action = format!("/todos/{}/delete", task.id);
    let actions = format!(
        "<div class=\"row\" style=\"align-items:center\">{}{}</div>",
        action_button(
            &edit_action,
            Button::new("&#9998;")
                .variant(ButtonVariant::Ghost)
                .size(ButtonSize::Sm)
                .title("Edit"),
        ),
        action_button(
            &delete_action,
            Button::new("&#128465;")
                .variant(ButtonVariant::Ghost)
                .size(ButtonSize::Sm)
                .title("Delete"),
        ),
    );

    let class = if task.is_complete { "task done" } else { "task" };
    card(class, &format!("{}{}", toggle, actions))
}

fn render_list(snapshot: &StoreSnapshot) -> String {
    if snapshot.loading {
        return "<p class=\"empty\">Loading tasks...</p>".to_string();
    }
    if snapshot.tasks.is_empty() {
        return "<div class=\"empty\"><p>No tasks yet. Add one above to get started!</p></div>"
            .to_string();
    }

    snapshot
        .tasks
        .iter()
        .map(|task| match &snapshot.editing {
            Some(cursor) if cursor.id == task.id => render_edit_mode(cursor),
            _ => render_view_mode(task),
        })
        .collect()
}

pub fn render_tasks_page(snapshot: &StoreSnapshot) -> String {
    let header = format!(
        "<div class=\"spread\" style=\"margin-bottom:3rem\"><h1>My Tasks</h1>{}</div>",
        action_button(
            "/logout",
            Button::new("&#8617; Sign Out").variant(ButtonVariant::Ghost),
        )
    );

    let notice = snapshot
        .notice
        .as_deref()
        .map(|notice| {
            format!(
                "<div class=\"alert spread\" role=\"alert\"><span>{}</span>{}</div>",
                escape_html(notice),
                action_button(
                    "/todos/notice/dismiss",
                    Button::new("Dismiss")
                        .variant(ButtonVariant::Ghost)
                        .size(ButtonSize::Sm),
                )
            )
        })
        .unwrap_or_default();

    let body = format!(
        "<div class=\"container stack\">{}{}{}<div class=\"stack\">{}</div></div>",
        header,
        notice,
        render_create_form(snapshot),
        render_list(snapshot)
    );
    page("My Tasks", &body)
}
