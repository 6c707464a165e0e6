//! Artifact generation: README sections and the help file.

use crate::config::Project;
use crate::model::FunctionDoc;
use crate::registry::Registry;
use crate::render::markdown::MarkdownRenderer;
use crate::render::vimdoc::{VimdocDocument, VimdocRenderer, VimdocSection};
use crate::render::Renderer;
use crate::section::{has_marker, read_section, SectionError, SectionReplacer};
use crate::toc::generate_toc;

pub const SETUP_START: &str = r"^<!-- Setup -->$";
pub const SETUP_END: &str = r"^<!-- /Setup -->$";
pub const API_START: &str = r"^<!-- API -->$";
pub const API_END: &str = r"^<!-- /API -->$";
pub const TOC_START: &str = r"^<!-- TOC -->$";
pub const TOC_END: &str = r"^<!-- /TOC -->$";

/// Renders every artifact for one project from a built registry.
pub struct Generator<'a> {
    project: &'a Project,
    registry: &'a Registry,
}

impl<'a> Generator<'a> {
    pub fn new(project: &'a Project, registry: &'a Registry) -> Self {
        Self { project, registry }
    }

    /// Public functions of the API file, in source order.
    pub fn api_functions(&self) -> Vec<&'a FunctionDoc> {
        self.registry.public_functions(&self.project.api_file)
    }

    /// Body of the default-config table, when an options file is configured.
    pub fn option_lines(&self) -> Result<Option<Vec<String>>, SectionError> {
        self.project
            .options
            .as_ref()
            .map(|options| read_section(&options.file, &options.start, &options.end))
            .transpose()
    }

    /// Body of the README `Setup` section.
    pub fn readme_setup(&self, options: &[String]) -> Vec<String> {
        let mut lines = vec![
            String::new(),
            "```lua".to_string(),
            format!("require(\"{}\").setup({{", self.project.module),
        ];
        lines.extend(options.iter().cloned());
        lines.push("})".to_string());
        lines.push("```".to_string());
        lines.push(String::new());
        lines
    }

    /// Body of the README `API` section.
    pub fn readme_api(&self) -> Vec<String> {
        let mut lines = vec![String::new()];
        lines.extend(MarkdownRenderer.render(&self.api_functions(), self.registry));
        lines.push(String::new());
        lines
    }

    /// Update the Setup, API and TOC sections of the README. Setup and TOC
    /// are only touched when their start marker is present.
    pub fn update_readme(&self, replacer: &mut dyn SectionReplacer) -> Result<bool, SectionError> {
        let readme = &self.project.readme;
        let mut changed = false;

        if let Some(options) = self.option_lines()? {
            if has_marker(&replacer.read(readme)?, SETUP_START)? {
                changed |= replacer.replace(readme, SETUP_START, SETUP_END, &self.readme_setup(&options))?;
            }
        }

        changed |= replacer.replace(readme, API_START, API_END, &self.readme_api())?;

        let text = replacer.read(readme)?;
        if has_marker(&text, TOC_START)? {
            let mut toc = vec![String::new()];
            toc.extend(generate_toc(&text.lines().collect::<Vec<_>>()));
            toc.push(String::new());
            changed |= replacer.replace(readme, TOC_START, TOC_END, &toc)?;
        }

        Ok(changed)
    }

    /// The complete help file.
    pub fn vimdoc(&self, options: Option<&[String]>) -> Vec<String> {
        let module = &self.project.module;
        let config = self.project.render;
        let mut doc = VimdocDocument::new(self.project.vimdoc_name(), module.as_str());

        if let Some(options) = options {
            let pad = " ".repeat(config.indent);
            let mut body = vec![
                String::new(),
                ">".to_string(),
                format!("{}require(\"{}\").setup({{", pad, module),
            ];
            body.extend(options.iter().map(|line| {
                if line.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", pad, line)
                }
            }));
            body.push(format!("{}}})", pad));
            body.push("<".to_string());
            doc.sections
                .push(VimdocSection::new("options", format!("{}-options", module), body));
        }

        let mut api = vec![String::new()];
        api.extend(VimdocRenderer::new(module, config).render(&self.api_functions(), self.registry));
        doc.sections
            .push(VimdocSection::new("API", format!("{}-api", module), api));

        doc.render(config.wrap_width)
    }
}
