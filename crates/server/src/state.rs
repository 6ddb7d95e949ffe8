use sea_orm::DatabaseConnection;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    /// Write `bitacora` rows alongside each product mutation.
    pub audit_in_app: bool,
    pub web_dist_dir: PathBuf,
}
