//! Argument sheets: JSON documents declaring the options and positionals of an
//! [`ArgsParser`].
//!
//! A sheet is used to:
//! - build a parser without writing registration code (`argsheet parse`)
//! - report parse results as JSON for shell scripts

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use argsheet_argparse::{ArgsParser, DEFAULT_LINE_WIDTH, ParserConfig};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// File name `argsheet init` writes and `--sheet` defaults to.
pub const DEFAULT_SHEET_NAME: &str = "argsheet.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ArgSheet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_name: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub epilogue: String,
    #[serde(default = "default_show_help")]
    pub show_help: bool,
    #[serde(default)]
    pub margin: usize,
    #[serde(default = "default_line_width")]
    pub line_width: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSheet>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub positionals: Vec<PositionalSheet>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct OptionSheet {
    pub aliases: Vec<String>,
    #[serde(default)]
    pub arity: usize,
    /// Description of the value tokens, e.g. `<file>`.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub params: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub struct PositionalSheet {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
}

fn default_show_help() -> bool {
    true
}

fn default_line_width() -> usize {
    DEFAULT_LINE_WIDTH
}

impl Default for ArgSheet {
    fn default() -> Self {
        Self {
            program_name: None,
            description: String::new(),
            epilogue: String::new(),
            show_help: default_show_help(),
            margin: 0,
            line_width: default_line_width(),
            options: Vec::new(),
            positionals: Vec::new(),
        }
    }
}

impl ArgSheet {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("failed to parse argument sheet JSON")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read argument sheet: {}", path.display()))?;
        Self::from_json(&contents).with_context(|| format!("invalid argument sheet: {}", path.display()))
    }

    /// Build a parser with every option and positional of the sheet registered.
    pub fn parser(&self, exit_on_help: bool) -> Result<ArgsParser> {
        let mut config = ParserConfig::new()
            .show_help(self.show_help)
            .description(self.description.as_str())
            .epilogue(self.epilogue.as_str())
            .exit_on_help(exit_on_help)
            .margin(self.margin)
            .line_width(self.line_width);
        if let Some(name) = &self.program_name {
            config = config.program_name(name.as_str());
        }

        let mut parser = ArgsParser::new(config);
        for option in &self.options {
            parser
                .add_option(option.aliases.as_slice(), option.arity, &option.params, &option.help)
                .with_context(|| format!("cannot register option {:?}", option.aliases))?;
        }
        for positional in &self.positionals {
            parser.add_positional(&positional.name, &positional.help);
        }
        tracing::debug!(
            options = self.options.len(),
            positionals = self.positionals.len(),
            "built parser from argument sheet"
        );
        Ok(parser)
    }

    /// Starter sheet written by `argsheet init`.
    pub fn example() -> Self {
        Self {
            program_name: Some("copy".to_string()),
            description: "Copies a file, optionally in fixed-size blocks.".to_string(),
            options: vec![
                OptionSheet {
                    aliases: vec!["-v".to_string(), "--verbose".to_string()],
                    arity: 0,
                    params: String::new(),
                    help: "Print each block as it is copied.".to_string(),
                },
                OptionSheet {
                    aliases: vec!["-b".to_string(), "--block".to_string()],
                    arity: 1,
                    params: "<bytes>".to_string(),
                    help: "Block size used for copying.".to_string(),
                },
            ],
            positionals: vec![
                PositionalSheet {
                    name: "source".to_string(),
                    help: "File to read.".to_string(),
                },
                PositionalSheet {
                    name: "destination".to_string(),
                    help: "File to write.".to_string(),
                },
            ],
            ..Default::default()
        }
    }
}

/// Result of a successful parse, keyed by each option's first alias.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ParseReport {
    pub program: String,
    pub present: Vec<String>,
    /// Captured tokens of present options that take values.
    pub values: IndexMap<String, Vec<String>>,
    pub positionals: Vec<String>,
}

impl ParseReport {
    pub fn collect(parser: &ArgsParser) -> Self {
        let mut report = Self {
            program: parser.program_name().to_string(),
            positionals: parser.positional_values().to_vec(),
            ..Default::default()
        };
        for info in parser.options() {
            if !parser.was_present_id(info.id()) {
                continue;
            }
            let key = info.primary_alias().to_string();
            if info.arity() > 0 {
                report
                    .values
                    .insert(key.clone(), parser.values_for_id(info.id()).to_vec());
            }
            report.present.push(key);
        }
        report
    }
}
