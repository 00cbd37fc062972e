use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::{
    directory::CategoryDirectory,
    error::DirectoryError,
    gateway::GatewayState,
    session::{self, GuardDecision},
    view::{self, CategoryRowView, DeleteDialog, DialogState},
};

/// PageOutcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Guard failed: navigate away, nothing is rendered.
    Redirect(&'static str),
    /// Table content for the current collection.
    Render(PageView),
}

/// PageView
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PageView {
    pub rows: Vec<CategoryRowView>,
    pub notice: Option<String>,
}

/// CategoriesPage
///
/// One activation of the categories dashboard. Owns the directory, the delete dialog and
/// a cancellation scope; dropping or tearing down the page cancels every request still
/// in flight so none of them can touch the collection afterwards.
pub struct CategoriesPage {
    gateway: GatewayState,
    directory: Arc<CategoryDirectory>,
    dialog: DeleteDialog,
    scope: CancellationToken,
}

impl CategoriesPage {
    pub fn new(gateway: GatewayState) -> Self {
        let scope = CancellationToken::new();
        Self {
            directory: Arc::new(CategoryDirectory::new(gateway.clone(), scope.child_token())),
            gateway,
            dialog: DeleteDialog::new(),
            scope,
        }
    }

    pub fn directory(&self) -> &Arc<CategoryDirectory> {
        &self.directory
    }

    /// activate
    ///
    /// Runs the session guard once, then loads the collection. A guard failure is
    /// terminal: no fetch is issued and no content is produced.
    pub async fn activate(&self) -> PageOutcome {
        let user = self.gateway.current_user().await;
        if let GuardDecision::Redirect(path) = session::guard(user) {
            return PageOutcome::Redirect(path);
        }

        // Failures are recorded on the directory and shown by `view()`.
        let _ = self.directory.load_all().await;
        PageOutcome::Render(self.view().await)
    }

    /// The current collection as rows, plus the last failure if one is pending.
    pub async fn view(&self) -> PageView {
        let categories = self.directory.snapshot().await;
        let notice = match self.directory.last_error().await {
            Some(DirectoryError::Decode(_)) | Some(DirectoryError::Transport(_)) => {
                Some("No se pudieron cargar las categorias.".to_string())
            }
            Some(DirectoryError::Server(message)) => Some(message),
            Some(DirectoryError::Cancelled) | None => None,
        };
        PageView {
            rows: view::rows(&categories),
            notice,
        }
    }

    pub fn dialog_state(&self) -> DialogState {
        self.dialog.state()
    }

    /// Menu "Delete": opens the confirmation prompt.
    pub fn request_delete(&mut self, id: i64) {
        self.dialog.prompt(id);
    }

    pub fn cancel_delete(&mut self) {
        self.dialog.cancel();
    }

    /// confirm_delete
    ///
    /// Closes the dialog and starts the delete in its own task. The UI does not wait on
    /// it; callers that need the result can await the handle.
    pub fn confirm_delete(&mut self) -> Option<JoinHandle<Result<(), DirectoryError>>> {
        let id = self.dialog.confirm()?;
        let directory = self.directory.clone();
        Some(tokio::spawn(async move { directory.delete(id).await }))
    }

    /// Cancels every request still pending for this page.
    pub fn teardown(&self) {
        self.scope.cancel();
    }
}

impl Drop for CategoriesPage {
    fn drop(&mut self) {
        self.scope.cancel();
    }
}
