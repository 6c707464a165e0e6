//! nvimdoc: API documentation for Neovim Lua plugins.
//!
//! Doc comments (`---@param`, `---@class`, ...) are parsed from every Lua file
//! under a root into a cross-referenced [`Registry`], which the renderers turn
//! into a README Markdown section and a Vim help file.
//!
//! ```no_run
//! let registry = nvimdoc::build_registry("lua")?;
//! let functions = registry.public_functions("resession/init.lua");
//! let markdown = nvimdoc::render_markdown(&functions, &registry);
//! let vimdoc = nvimdoc::render_vimdoc("resession", &functions, &registry);
//! # Ok::<(), nvimdoc::RegistryError>(())
//! ```

pub mod config;
pub mod diagnostic;
pub mod generate;
pub mod model;
pub mod parser;
pub mod registry;
pub mod render;
pub mod section;
pub mod toc;

pub use diagnostic::{Diagnostic, RegistryError};
pub use registry::{build_registry, Registry, RegistryBuilder};
pub use render::{render_markdown, render_vimdoc, RenderConfig};
