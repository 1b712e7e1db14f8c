//! Dependency resolution against Maven repositories
//!
//! Only declared (direct) dependencies are resolved. Each one is looked up
//! in the configured repositories in order; the first repository that has
//! the archive wins. Archives are stored in repository layout
//! (`<group path>/<artifact>/<version>/`) below the target directory.

use crate::core::config::{DependencyDeclaration, DependencyScope};
use crate::core::coordinates::{join_url, Coordinates};
use crate::core::error::PublishError;
use crate::core::traits::RepositoryTransport;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;

/// A dependency archive available on disk
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDependency {
    pub coordinates: Coordinates,
    pub scope: DependencyScope,
    pub path: PathBuf,
    /// Repository the archive was downloaded from; `None` when reused from disk
    pub repository: Option<String>,
}

/// Outcome of resolving every declared dependency
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedDependencies {
    pub items: Vec<ResolvedDependency>,
}

impl ResolvedDependencies {
    /// Archives visible to the main compiler invocation
    pub fn compile_classpath(&self) -> Vec<PathBuf> {
        self.items
            .iter()
            .filter(|d| d.scope.is_compile())
            .map(|d| d.path.clone())
            .collect()
    }

    pub fn downloaded_count(&self) -> usize {
        self.items.iter().filter(|d| d.repository.is_some()).count()
    }
}

/// Downloads declared dependencies into the build directory
pub struct DependencyResolver {
    transport: Arc<dyn RepositoryTransport>,
    repositories: Vec<String>,
    target_dir: PathBuf,
}

impl DependencyResolver {
    pub fn new(
        transport: Arc<dyn RepositoryTransport>,
        repositories: Vec<String>,
        target_dir: &Path,
    ) -> Self {
        Self {
            transport,
            repositories,
            target_dir: target_dir.to_path_buf(),
        }
    }

    /// Resolve every declaration, failing on the first one that cannot be found
    pub async fn resolve(
        &self,
        declarations: &[DependencyDeclaration],
    ) -> Result<ResolvedDependencies, PublishError> {
        // Validate all coordinates before touching the network
        let parsed = declarations
            .iter()
            .map(|d| Coordinates::parse(&d.coordinates).map(|c| (c, d.scope)))
            .collect::<Result<Vec<_>, _>>()?;

        if !parsed.is_empty() && self.repositories.is_empty() {
            return Err(PublishError::DependencyResolution {
                coordinates: parsed[0].0.to_string(),
                message: "リポジトリが設定されていません".to_string(),
            });
        }

        fs::create_dir_all(&self.target_dir).await?;

        let mut resolved = ResolvedDependencies::default();
        for (coordinates, scope) in parsed {
            resolved.items.push(self.resolve_one(coordinates, scope).await?);
        }

        tracing::info!(
            total = resolved.items.len(),
            downloaded = resolved.downloaded_count(),
            "dependencies resolved"
        );
        Ok(resolved)
    }

    async fn resolve_one(
        &self,
        coordinates: Coordinates,
        scope: DependencyScope,
    ) -> Result<ResolvedDependency, PublishError> {
        let file_name = coordinates.file_name(None, "jar");
        let relative = format!("{}/{}", coordinates.version_path(), file_name);
        let path = self.target_dir.join(&relative);

        if path.exists() {
            tracing::debug!(%coordinates, "reusing downloaded archive");
            return Ok(ResolvedDependency {
                coordinates,
                scope,
                path,
                repository: None,
            });
        }

        for repository in &self.repositories {
            let url = join_url(repository, &relative);
            tracing::debug!(%url, "fetching dependency");

            match self.transport.fetch(&url, None).await {
                Ok(Some(bytes)) => {
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent).await?;
                    }
                    // write then rename so an interrupted download is never reused
                    let partial = path.with_extension("jar.part");
                    fs::write(&partial, &bytes).await?;
                    fs::rename(&partial, &path).await?;

                    return Ok(ResolvedDependency {
                        coordinates,
                        scope,
                        path,
                        repository: Some(repository.clone()),
                    });
                }
                Ok(None) => continue,
                Err(e) => {
                    return Err(PublishError::DependencyResolution {
                        coordinates: coordinates.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(PublishError::DependencyResolution {
            coordinates: coordinates.to_string(),
            message: format!(
                "{} 個のリポジトリのいずれにも見つかりませんでした",
                self.repositories.len()
            ),
        })
    }
}
