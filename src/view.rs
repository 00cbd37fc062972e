use minijinja::{Environment, context};
use serde::Serialize;
use std::sync::OnceLock;

use crate::models::Category;

pub const NEW_CATEGORY_PATH: &str = "/dashboard/categories/new";

pub fn edit_path(id: i64) -> String {
    format!("/dashboard/categories/edit/{}", id)
}

pub fn delete_path(id: i64) -> String {
    format!("/dashboard/categories/delete/{}", id)
}

/// CategoryRowView
///
/// One table row. Every field is the record's value rendered as-is; a null parent is an
/// empty cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryRowView {
    pub id: i64,
    pub name: String,
    pub image: String,
    pub parent: String,
    pub created_at: String,
    pub edit_href: String,
    pub delete_href: String,
}

impl From<&Category> for CategoryRowView {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            image: category.image.clone(),
            parent: category
                .parent_id
                .map(|parent| parent.to_string())
                .unwrap_or_default(),
            created_at: category.created_at.clone(),
            edit_href: edit_path(category.id),
            delete_href: delete_path(category.id),
        }
    }
}

/// One row per category, in collection order. No sorting or filtering.
pub fn rows(categories: &[Category]) -> Vec<CategoryRowView> {
    categories.iter().map(CategoryRowView::from).collect()
}

/// DialogState
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Idle,
    Prompted { id: i64 },
}

/// DeleteDialog
///
/// Delete confirmation: `Idle -> Prompted -> (cancel) Idle` or
/// `Prompted -> (confirm) delete requested -> Idle`. Only a confirmation yields an id to
/// delete.
#[derive(Debug, Default)]
pub struct DeleteDialog {
    state: DialogState,
}

impl DeleteDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> DialogState {
        self.state
    }

    /// Opens the prompt for `id`, replacing any prompt already open.
    pub fn prompt(&mut self, id: i64) {
        self.state = DialogState::Prompted { id };
    }

    pub fn cancel(&mut self) {
        if let DialogState::Prompted { id } = self.state {
            tracing::debug!(category_id = id, "delete cancelled");
        }
        self.state = DialogState::Idle;
    }

    /// Returns the id to delete and goes back to `Idle`. `None` when nothing was prompted.
    pub fn confirm(&mut self) -> Option<i64> {
        match std::mem::take(&mut self.state) {
            DialogState::Prompted { id } => Some(id),
            DialogState::Idle => None,
        }
    }
}

const LAYOUT_TEMPLATE: &str = include_str!("../templates/layout.html");
const CATEGORIES_TEMPLATE: &str = include_str!("../templates/categories.html");
const CONFIRM_DELETE_TEMPLATE: &str = include_str!("../templates/confirm_delete.html");

static TEMPLATES: OnceLock<Environment<'static>> = OnceLock::new();

fn templates() -> &'static Environment<'static> {
    TEMPLATES.get_or_init(|| {
        let mut env = Environment::new();
        for (name, source) in [
            ("layout.html", LAYOUT_TEMPLATE),
            ("categories.html", CATEGORIES_TEMPLATE),
            ("confirm_delete.html", CONFIRM_DELETE_TEMPLATE),
        ] {
            if let Err(e) = env.add_template(name, source) {
                tracing::error!("Failed to load template {}: {}", name, e);
            }
        }
        env
    })
}

/// Renders the category table page. `notice` is shown above the table when present.
pub fn render_categories_page(
    rows: &[CategoryRowView],
    notice: Option<&str>,
) -> Result<String, minijinja::Error> {
    templates().get_template("categories.html")?.render(context! {
        rows => rows,
        total => rows.len(),
        notice => notice,
        new_href => NEW_CATEGORY_PATH,
    })
}

/// Renders the confirmation prompt for deleting `row`.
pub fn render_delete_prompt(row: &CategoryRowView) -> Result<String, minijinja::Error> {
    templates().get_template("confirm_delete.html")?.render(context! {
        row => row,
        cancel_href => "/dashboard/categories",
    })
}
