//! Project configuration (`nvimdoc.toml`).
//!
//! Every setting is optional. Paths default to the usual Neovim plugin
//! layout derived from the module name:
//!
//! ```toml
//! module = "resession"
//! lua_dir = "lua"
//! api_file = "resession/init.lua"
//! readme = "README.md"
//! vimdoc = "doc/resession.txt"
//! exclude = ["resession/extensions/**"]
//! deny_warnings = false
//!
//! [options]
//! file = "resession/config.lua"
//! start = "^local default_config ="
//! end = "^}$"
//!
//! [render]
//! wrap_width = 80
//! indent = 4
//! ```

use crate::render::RenderConfig;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the optional project file at the plugin root.
pub const CONFIG_FILE: &str = "nvimdoc.toml";

const DEFAULT_OPTIONS_START: &str = r"^local default_config =";
const DEFAULT_OPTIONS_END: &str = r"^}$";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot determine the module name under {}; set `module` or pass --module", .0.display())]
    MissingModule(PathBuf),
}

/// Contents of `nvimdoc.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    pub module: Option<String>,
    pub lua_dir: Option<String>,
    /// API file, relative to `lua_dir`
    pub api_file: Option<String>,
    pub readme: Option<String>,
    pub vimdoc: Option<String>,
    pub options: Option<OptionsConfig>,
    /// Glob patterns relative to `lua_dir`
    pub exclude: Vec<String>,
    pub deny_warnings: bool,
    pub render: RenderConfig,
}

/// Where the default-config table for the Setup sections lives.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OptionsConfig {
    /// Relative to `lua_dir`
    pub file: String,
    #[serde(default = "default_options_start")]
    pub start: String,
    #[serde(default = "default_options_end")]
    pub end: String,
}

fn default_options_start() -> String {
    DEFAULT_OPTIONS_START.to_string()
}

fn default_options_end() -> String {
    DEFAULT_OPTIONS_END.to_string()
}

impl ProjectConfig {
    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    /// `nvimdoc.toml` under `root`, or defaults when there is none.
    pub fn discover(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if path.is_file() {
            debug!("loading {}", path.display());
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}

/// Fully resolved settings for one generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub module: String,
    pub lua_dir: PathBuf,
    /// Registry key of the API file (`/`-separated, relative to `lua_dir`)
    pub api_file: String,
    pub readme: PathBuf,
    pub vimdoc: PathBuf,
    pub options: Option<OptionsSource>,
    pub exclude: Vec<String>,
    pub deny_warnings: bool,
    pub render: RenderConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionsSource {
    pub file: PathBuf,
    pub start: String,
    pub end: String,
}

impl Project {
    /// Resolve a config against `root`. `module` overrides the file's value.
    pub fn resolve(root: &Path, config: ProjectConfig, module: Option<String>) -> Result<Self, ConfigError> {
        let lua_dir = root.join(config.lua_dir.as_deref().unwrap_or("lua"));
        let module = module
            .or(config.module)
            .or_else(|| infer_module(&lua_dir))
            .ok_or_else(|| ConfigError::MissingModule(lua_dir.clone()))?;

        let options = match config.options {
            Some(options) => Some(OptionsSource {
                file: lua_dir.join(options.file),
                start: options.start,
                end: options.end,
            }),
            None => {
                let file = lua_dir.join(&module).join("config.lua");
                file.is_file().then(|| OptionsSource {
                    file,
                    start: default_options_start(),
                    end: default_options_end(),
                })
            }
        };

        Ok(Self {
            root: root.to_path_buf(),
            api_file: config
                .api_file
                .unwrap_or_else(|| format!("{}/init.lua", module)),
            readme: root.join(config.readme.as_deref().unwrap_or("README.md")),
            vimdoc: root.join(
                config
                    .vimdoc
                    .unwrap_or_else(|| format!("doc/{}.txt", module)),
            ),
            module,
            lua_dir,
            options,
            exclude: config.exclude,
            deny_warnings: config.deny_warnings,
            render: config.render,
        })
    }

    /// File name of the help file (`resession.txt`).
    pub fn vimdoc_name(&self) -> String {
        self.vimdoc
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.txt", self.module))
    }
}

/// The single directory under `lua_dir`, if there is exactly one.
fn infer_module(lua_dir: &Path) -> Option<String> {
    let mut dirs = fs::read_dir(lua_dir)
        .ok()?
        .filter_map(Result::ok)
        .filter(|entry| entry.path().is_dir())
        .map(|entry| entry.file_name().to_string_lossy().into_owned());
    let first = dirs.next()?;
    dirs.next().is_none().then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn parses_full_config() {
        let config = ProjectConfig::parse(
            r#"
module = "resession"
exclude = ["resession/extensions/**"]
deny_warnings = true

[options]
file = "resession/config.lua"

[render]
wrap_width = 78
"#,
            Path::new(CONFIG_FILE),
        )
        .unwrap();
        assert_eq!(config.module.as_deref(), Some("resession"));
        assert!(config.deny_warnings);
        let options = config.options.unwrap();
        assert_eq!(options.start, DEFAULT_OPTIONS_START);
        assert_eq!(options.end, DEFAULT_OPTIONS_END);
        assert_eq!(
            config.render,
            RenderConfig {
                wrap_width: 78,
                indent: 4
            }
        );
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ProjectConfig::parse("modul = \"x\"", Path::new(CONFIG_FILE)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn defaults_follow_module_name() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lua/demo")).unwrap();
        fs::write(root.join("lua/demo/config.lua"), "local default_config = {\n}\n").unwrap();

        let project = Project::resolve(root, ProjectConfig::default(), None).unwrap();
        assert_eq!(project.module, "demo");
        assert_eq!(project.lua_dir, root.join("lua"));
        assert_eq!(project.api_file, "demo/init.lua");
        assert_eq!(project.readme, root.join("README.md"));
        assert_eq!(project.vimdoc, root.join("doc/demo.txt"));
        assert_eq!(project.vimdoc_name(), "demo.txt");
        assert_eq!(
            project.options.unwrap().file,
            root.join("lua/demo/config.lua")
        );
        assert_eq!(project.render, RenderConfig::default());
    }

    #[test]
    fn ambiguous_module_needs_override() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("lua/one")).unwrap();
        fs::create_dir_all(root.join("lua/two")).unwrap();

        let err = Project::resolve(root, ProjectConfig::default(), None).unwrap_err();
        assert!(matches!(err, ConfigError::MissingModule(_)));

        let project = Project::resolve(root, ProjectConfig::default(), Some("two".into())).unwrap();
        assert_eq!(project.module, "two");
        assert!(project.options.is_none());
    }

    #[test]
    fn discover_without_file_is_default() {
        let dir = TempDir::new().unwrap();
        assert_eq!(ProjectConfig::discover(dir.path()).unwrap(), ProjectConfig::default());
    }
}
