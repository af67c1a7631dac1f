//! Mapping local document paths into the runner's view of the filesystem.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};

use crate::domain::collab::PathMapper;
use crate::infra::config::Settings;

/// Pick the mapper the settings call for.
pub fn from_config(settings: &Settings) -> Result<Arc<dyn PathMapper>> {
    if settings.container.enabled {
        Ok(Arc::new(MountedPaths::from_config(settings)?))
    } else {
        Ok(Arc::new(LocalPaths))
    }
}

/// Identity mapping for runners that share the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalPaths;

impl PathMapper for LocalPaths {
    fn to_runner_path(&self, local: &Path) -> Result<String> {
        local
            .to_str()
            .map(str::to_owned)
            .ok_or_else(|| anyhow!("document path is not valid UTF-8: {}", local.display()))
    }
}

/// Rewrites paths under the local workspace root to their location inside a
/// container mount.
///
/// Mapped paths always use forward slashes; the runner inside the container
/// never sees host-native separators.
#[derive(Debug, Clone)]
pub struct MountedPaths {
    local_root: PathBuf,
    mount_root: String,
}

impl MountedPaths {
    pub fn new(local_root: impl Into<PathBuf>, mount_root: impl Into<String>) -> Self {
        Self {
            local_root: local_root.into(),
            mount_root: mount_root.into(),
        }
    }

    pub fn from_config(settings: &Settings) -> Result<Self> {
        let container = &settings.container;
        let local_root = container
            .local_root
            .clone()
            .context("container runs need [container] local_root")?;
        let mount_root = container
            .mount_root
            .clone()
            .context("container runs need [container] mount_root")?;
        Ok(Self::new(local_root, mount_root))
    }
}

impl PathMapper for MountedPaths {
    fn to_runner_path(&self, local: &Path) -> Result<String> {
        let relative = local.strip_prefix(&self.local_root).with_context(|| {
            format!(
                "'{}' is outside the mounted workspace root '{}'",
                local.display(),
                self.local_root.display()
            )
        })?;

        let mut mapped = self.mount_root.trim_end_matches('/').to_owned();
        for component in relative.components() {
            let part = component.as_os_str().to_str().ok_or_else(|| {
                anyhow!("document path is not valid UTF-8: {}", local.display())
            })?;
            mapped.push('/');
            mapped.push_str(part);
        }
        Ok(mapped)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_paths_pass_through_unchanged() {
        let mapped = LocalPaths
            .to_runner_path(Path::new("/ws/tests/demo.test"))
            .unwrap();
        assert_eq!(mapped, "/ws/tests/demo.test");
    }

    #[test]
    fn mounted_paths_swap_the_workspace_prefix() {
        let mapper = MountedPaths::new("/home/user/project", "/workspace/project");
        let mapped = mapper
            .to_runner_path(Path::new("/home/user/project/tests/demo.test"))
            .unwrap();
        assert_eq!(mapped, "/workspace/project/tests/demo.test");
    }

    #[test]
    fn trailing_slash_on_the_mount_root_is_tolerated() {
        let mapper = MountedPaths::new("/home/user/project", "/workspace/project/");
        let mapped = mapper
            .to_runner_path(Path::new("/home/user/project/demo.test"))
            .unwrap();
        assert_eq!(mapped, "/workspace/project/demo.test");
    }

    #[test]
    fn paths_outside_the_root_are_rejected() {
        let mapper = MountedPaths::new("/home/user/project", "/workspace/project");
        let err = mapper
            .to_runner_path(Path::new("/home/user/elsewhere/demo.test"))
            .unwrap_err();
        assert!(format!("{err:#}").contains("outside the mounted workspace root"));
    }

    #[test]
    fn container_settings_require_both_roots() {
        let mut settings = Settings::default();
        settings.container.enabled = true;
        settings.container.local_root = Some(PathBuf::from("/home/user/project"));
        assert!(from_config(&settings).is_err());
    }
}
