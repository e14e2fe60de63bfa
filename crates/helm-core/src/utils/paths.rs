use std::path::PathBuf;

/// Standard application directories for helm.
///
/// - Project-level: ./.helm
/// - User-level config and data: OS-specific dirs
pub struct AppPaths;

impl AppPaths {
    pub fn project_dir() -> PathBuf {
        PathBuf::from(".helm")
    }

    /// ./.helm/catalog.toml
    pub fn project_catalog() -> PathBuf {
        Self::project_dir().join("catalog.toml")
    }

    pub fn user_config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "helm").map(|d| d.config_dir().to_path_buf())
    }

    pub fn user_data_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "helm").map(|d| d.data_dir().to_path_buf())
    }

    pub fn user_catalog() -> Option<PathBuf> {
        Self::user_config_dir().map(|d| d.join("catalog.toml"))
    }

    /// Catalog files that exist, project catalog first.
    pub fn discover_catalogs() -> Vec<PathBuf> {
        let mut paths = vec![Self::project_catalog()];
        if let Some(user) = Self::user_catalog() {
            paths.push(user);
        }
        paths.retain(|p| p.exists());
        paths
    }

    pub fn log_dir() -> Option<PathBuf> {
        Self::user_data_dir().map(|d| d.join("logs"))
    }
}
