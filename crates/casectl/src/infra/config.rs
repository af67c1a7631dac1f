//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".casectl/config.toml";

/// Layered settings loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub runner: Runner,
    #[serde(default)]
    pub selector: Selector,
    #[serde(default)]
    pub container: Container,
    #[serde(default)]
    pub build: Build,
}

/// Names of the run configurations the pipeline works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runner {
    #[serde(default = "Runner::default_base_configuration")]
    pub base_configuration: String,
    #[serde(default = "Runner::default_derived_configuration")]
    pub derived_configuration: String,
    #[serde(default = "Runner::default_debugger")]
    pub debugger: String,
}

impl Runner {
    fn default_base_configuration() -> String {
        "systest".to_owned()
    }

    fn default_derived_configuration() -> String {
        "systest-case".into()
    }

    fn default_debugger() -> String {
        "gdb --args".into()
    }
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            base_configuration: Self::default_base_configuration(),
            derived_configuration: Self::default_derived_configuration(),
            debugger: Self::default_debugger(),
        }
    }
}

/// How case selectors are spelled on the runner's command line.
///
/// `strip_flags` lists every spelling that must be scrubbed from inherited
/// argument strings, including historical ones no longer used for new
/// selectors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selector {
    #[serde(default = "Selector::default_flag")]
    pub flag: String,
    #[serde(default = "Selector::default_strip_flags")]
    pub strip_flags: Vec<String>,
}

impl Selector {
    fn default_flag() -> String {
        "-t".into()
    }

    fn default_strip_flags() -> Vec<String> {
        vec!["-t".into(), "--testLocation".into()]
    }
}

impl Default for Selector {
    fn default() -> Self {
        Self {
            flag: Self::default_flag(),
            strip_flags: Self::default_strip_flags(),
        }
    }
}

/// Mount translation for runners executing inside a container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Container {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub local_root: Option<PathBuf>,
    #[serde(default)]
    pub mount_root: Option<String>,
}

/// Dependency rebuild command used when the base configuration is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Build {
    #[serde(default)]
    pub rebuild_command: String,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    base_configuration: Option<String>,
    rebuild_command: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            base_configuration: env::var("CASECTL_BASE_CONFIG").ok(),
            rebuild_command: env::var("CASECTL_REBUILD_CMD").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(base_configuration: &str, rebuild_command: &str) -> Self {
        Self {
            base_configuration: Some(base_configuration.to_owned()),
            rebuild_command: Some(rebuild_command.to_owned()),
        }
    }
}

impl Settings {
    /// Load settings from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Settings> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers
            .into_iter()
            .reduce(Settings::merge)
            .unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(settings)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            runner: merge_runner(self.runner, other.runner),
            selector: merge_selector(self.selector, other.selector),
            container: merge_container(self.container, other.container),
            build: merge_build(self.build, other.build),
        }
    }
}

fn merge_runner(base: Runner, overlay: Runner) -> Runner {
    Runner {
        base_configuration: choose_setting(
            base.base_configuration,
            overlay.base_configuration,
            Runner::default_base_configuration,
        ),
        derived_configuration: choose_setting(
            base.derived_configuration,
            overlay.derived_configuration,
            Runner::default_derived_configuration,
        ),
        debugger: choose_setting(base.debugger, overlay.debugger, Runner::default_debugger),
    }
}

fn merge_selector(base: Selector, overlay: Selector) -> Selector {
    let mut strip_flags: BTreeSet<String> = base.strip_flags.into_iter().collect();
    strip_flags.extend(overlay.strip_flags);

    Selector {
        flag: choose_setting(base.flag, overlay.flag, Selector::default_flag),
        strip_flags: strip_flags.into_iter().collect(),
    }
}

fn merge_container(mut base: Container, overlay: Container) -> Container {
    base.enabled = overlay.enabled || base.enabled;
    if let Some(value) = overlay.local_root {
        base.local_root = Some(value);
    }
    if let Some(value) = overlay.mount_root {
        base.mount_root = Some(value);
    }
    base
}

fn merge_build(mut base: Build, overlay: Build) -> Build {
    if !overlay.rebuild_command.is_empty() {
        base.rebuild_command = overlay.rebuild_command;
    }
    if let Some(value) = overlay.working_dir {
        base.working_dir = Some(value);
    }
    base
}

fn choose_setting(base: String, overlay: String, default_fn: fn() -> String) -> String {
    if overlay != default_fn() {
        overlay
    } else {
        base
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("casectl/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    Ok(Some(workspace_root()?.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

/// Root directory the run-configuration store and workspace config live in.
///
/// The enclosing repository root when one exists, the current directory
/// otherwise.
pub fn workspace_root() -> Result<PathBuf> {
    let cwd = env::current_dir()?;
    Ok(find_repo_root(&cwd).unwrap_or(cwd))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut settings: Settings, env: EnvOverrides) -> Settings {
    if let Some(base_configuration) = env.base_configuration {
        settings.runner.base_configuration = base_configuration;
    }
    if let Some(rebuild_command) = env.rebuild_command {
        settings.build.rebuild_command = rebuild_command;
    }
    settings
}
