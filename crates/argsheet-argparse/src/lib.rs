//! Alias-based argument parsing and help rendering.
//!
//! Options are registered under one or more aliases (`-o`, `--output`, `/o`, ...)
//! that share a single [`OptionId`], and consume a fixed number of value tokens.
//! Positional arguments are matched by order against the tokens no alias claims.
//!
//! ```no_run
//! use argsheet_argparse::{ArgsParser, ParseOutcome, ParserConfig};
//!
//! let mut parser = ArgsParser::new(ParserConfig::new().description("Copies files."));
//! parser.add_option(["-v", "--verbose"], 0, "", "Print every copied file.")?;
//! parser.add_option(["-b", "--block"], 1, "<size>", "Block size in bytes.")?;
//! parser.add_positional("source", "File to copy.");
//!
//! let argv: Vec<String> = std::env::args().collect();
//! if parser.parse(&argv, 1)? == ParseOutcome::Parsed {
//!     let source = parser.positional_at(0)?;
//!     # let _ = source;
//! }
//! # Ok::<(), argsheet_argparse::ArgsError>(())
//! ```

pub use config::{DEFAULT_LINE_WIDTH, DEFAULT_PROGRAM_NAME, HELP_ALIASES, ParserConfig};
pub use error::{ArgsError, Result};
pub use parser::{AliasList, ArgsParser, OptionId, OptionInfo, ParseOutcome, Positional};
pub use reflow::reflow;

pub mod error {
    use std::io;

    use thiserror::Error;

    /// Errors reported by registration, parsing and lookups.
    #[derive(Debug, Error)]
    pub enum ArgsError {
        /// The start index points past the end of the argument vector.
        #[error("not enough arguments: start index {start} exceeds argument count {count}")]
        InvalidStart { start: usize, count: usize },

        /// An option was registered without aliases, or with an empty alias.
        #[error("invalid empty argument alias")]
        EmptyAlias,

        /// The alias is already taken by a registered option.
        #[error("invalid duplicated argument: \"{0}\"")]
        DuplicateAlias(String),

        /// The token is not a registered alias and no positional slot is left.
        #[error("invalid argument: \"{0}\"")]
        UnknownArgument(String),

        /// Fewer value tokens follow the option than its arity requires.
        #[error(
            "insufficient number of parameters for argument \"{alias}\": expected {expected}, found {found}"
        )]
        InsufficientParameters {
            alias: String,
            expected: usize,
            found: usize,
        },

        /// No positional value was captured at this index.
        #[error("positional argument {index} out of range ({count} captured)")]
        PositionalOutOfRange { index: usize, count: usize },

        /// Writing help or usage text failed.
        #[error("failed to write help output: {0}")]
        Io(#[from] io::Error),
    }

    pub type Result<T, E = ArgsError> = std::result::Result<T, E>;
}

pub mod reflow {
    /// Characters a help line may be broken at.
    pub const BLANKS: [char; 6] = [' ', '\t', '\n', '\r', '\x0c', '\x0b'];

    fn is_blank(c: char) -> bool {
        BLANKS.contains(&c)
    }

    /// Lines as written by the author. A single trailing newline does not open
    /// another line.
    fn author_lines(text: &str) -> impl Iterator<Item = &str> {
        let text = text.strip_suffix('\n').unwrap_or(text);
        (!text.is_empty())
            .then(|| text.split('\n'))
            .into_iter()
            .flatten()
    }

    /// Byte offset at which `line` is cut for a budget of `width` characters.
    ///
    /// Cuts happen only at blanks: the last blank inside the budget, or the first
    /// blank after it when a single word is longer than the budget.
    fn cut_point(line: &str, width: usize) -> usize {
        if width == 0 {
            return line.len();
        }
        let Some((limit, _)) = line.char_indices().nth(width) else {
            return line.len();
        };
        match line[..limit].rfind(is_blank) {
            Some(pos) => pos,
            None => line.find(is_blank).unwrap_or(line.len()),
        }
    }

    /// Re-wrap `text` so every line fits in `line_width` characters after a
    /// left margin of `margin` spaces.
    ///
    /// Manual line breaks are kept and words are never split, so a word longer
    /// than the available width is emitted on a line of its own. A `line_width`
    /// of zero, or a margin that leaves no room, disables wrapping.
    pub fn reflow(text: &str, margin: usize, line_width: usize) -> String {
        let width = if line_width > 0 {
            line_width.saturating_sub(margin)
        } else {
            0
        };
        let indent = " ".repeat(margin);

        let mut out = String::with_capacity(text.len() + margin);
        for (i, mut rest) in author_lines(text).enumerate() {
            if i > 0 {
                out.push('\n');
            }
            let mut first = true;
            while !rest.is_empty() {
                let (line, tail) = rest.split_at(cut_point(rest, width));
                rest = match tail.chars().next() {
                    Some(c) if is_blank(c) => &tail[c.len_utf8()..],
                    _ => tail,
                };

                if !first {
                    out.push('\n');
                }
                first = false;
                out.push_str(&indent);
                out.push_str(line);
            }
        }
        out
    }
}

pub mod config {
    /// Program name shown in usage when none is configured or derivable.
    pub const DEFAULT_PROGRAM_NAME: &str = "program";

    /// Line width help text is wrapped to unless configured otherwise.
    pub const DEFAULT_LINE_WIDTH: usize = 80;

    /// Aliases of the built-in help option.
    pub const HELP_ALIASES: [&str; 6] = ["-h", "/h", "\\h", "--help", "/help", "\\help"];

    pub(crate) const HELP_TEXT: &str = "Shows this help.";

    /// Construction options for [`ArgsParser`](crate::ArgsParser).
    #[derive(Debug, Clone)]
    pub struct ParserConfig {
        pub(crate) show_help: bool,
        pub(crate) description: String,
        pub(crate) epilogue: String,
        pub(crate) program_name: Option<String>,
        pub(crate) exit_on_help: bool,
        pub(crate) margin: usize,
        pub(crate) line_width: usize,
    }

    impl Default for ParserConfig {
        fn default() -> Self {
            Self {
                show_help: true,
                description: String::new(),
                epilogue: String::new(),
                program_name: None,
                exit_on_help: true,
                margin: 0,
                line_width: DEFAULT_LINE_WIDTH,
            }
        }
    }

    impl ParserConfig {
        pub fn new() -> Self {
            Self::default()
        }

        /// Register the built-in help option (`-h`, `--help`, ...). Default `true`.
        pub fn show_help(mut self, show_help: bool) -> Self {
            self.show_help = show_help;
            self
        }

        /// Text printed above the usage block.
        pub fn description(mut self, description: impl Into<String>) -> Self {
            self.description = description.into();
            self
        }

        /// Text printed after the option list.
        pub fn epilogue(mut self, epilogue: impl Into<String>) -> Self {
            self.epilogue = epilogue.into();
            self
        }

        /// Fixed program name; otherwise it is taken from `argv[0]` at parse time.
        /// An empty name counts as not configured.
        pub fn program_name(mut self, name: impl Into<String>) -> Self {
            self.program_name = Some(name.into()).filter(|name| !name.is_empty());
            self
        }

        /// Exit the process with status 0 after help is shown. Default `true`.
        pub fn exit_on_help(mut self, exit_on_help: bool) -> Self {
            self.exit_on_help = exit_on_help;
            self
        }

        pub fn margin(mut self, margin: usize) -> Self {
            self.margin = margin;
            self
        }

        pub fn line_width(mut self, line_width: usize) -> Self {
            self.line_width = line_width;
            self
        }
    }
}

pub mod parser {
    use std::collections::{HashMap, HashSet};
    use std::fmt;
    use std::io::{self, Write};
    use std::path::Path;

    use indexmap::IndexMap;
    use tracing::{debug, trace};

    use crate::config::{DEFAULT_PROGRAM_NAME, HELP_ALIASES, HELP_TEXT, ParserConfig};
    use crate::error::{ArgsError, Result};
    use crate::reflow::reflow;

    /// Identifier shared by all aliases of one option.
    ///
    /// Identifiers are dense and assigned in registration order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct OptionId(usize);

    impl OptionId {
        pub fn index(self) -> usize {
            self.0
        }
    }

    impl fmt::Display for OptionId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "#{}", self.0)
        }
    }

    /// How a parse run ended.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ParseOutcome {
        /// Every token was consumed.
        Parsed,
        /// Help was printed and the remaining tokens were skipped.
        HelpShown,
    }

    /// Help-table entry for a registered option.
    #[derive(Debug, Clone)]
    pub struct OptionInfo {
        id: OptionId,
        aliases: Vec<String>,
        arity: usize,
        params_help: String,
        help: String,
    }

    impl OptionInfo {
        pub fn id(&self) -> OptionId {
            self.id
        }

        pub fn aliases(&self) -> &[String] {
            &self.aliases
        }

        /// The first alias given at registration; help entries are keyed by it.
        pub fn primary_alias(&self) -> &str {
            self.aliases.first().map(String::as_str).unwrap_or_default()
        }

        pub fn arity(&self) -> usize {
            self.arity
        }

        pub fn params_help(&self) -> &str {
            &self.params_help
        }

        /// Help text, already reflowed.
        pub fn help(&self) -> &str {
            &self.help
        }
    }

    #[derive(Debug, Clone)]
    pub struct Positional {
        name: String,
        help: String,
    }

    impl Positional {
        pub fn name(&self) -> &str {
            &self.name
        }

        pub fn help(&self) -> &str {
            &self.help
        }
    }

    /// Alias collection accepted by [`ArgsParser::add_option`].
    pub trait AliasList {
        fn into_aliases(self) -> Vec<String>;
    }

    impl AliasList for &str {
        fn into_aliases(self) -> Vec<String> {
            vec![self.to_string()]
        }
    }

    impl AliasList for String {
        fn into_aliases(self) -> Vec<String> {
            vec![self]
        }
    }

    impl AliasList for &[&str] {
        fn into_aliases(self) -> Vec<String> {
            self.iter().map(|s| s.to_string()).collect()
        }
    }

    impl AliasList for &[String] {
        fn into_aliases(self) -> Vec<String> {
            self.to_vec()
        }
    }

    impl<const N: usize> AliasList for [&str; N] {
        fn into_aliases(self) -> Vec<String> {
            self.iter().map(|s| s.to_string()).collect()
        }
    }

    impl AliasList for Vec<&str> {
        fn into_aliases(self) -> Vec<String> {
            self.into_iter().map(str::to_string).collect()
        }
    }

    impl AliasList for Vec<String> {
        fn into_aliases(self) -> Vec<String> {
            self
        }
    }

    /// Option/positional registry, parse state and help renderer.
    #[derive(Debug)]
    pub struct ArgsParser {
        exit_on_help: bool,
        margin: usize,
        line_width: usize,
        help_id: Option<OptionId>,
        program_name: Option<String>,
        description: String,
        epilogue: String,

        aliases: HashMap<String, OptionId>,
        // Value slots per option, indexed by `OptionId`; the length is the arity.
        slots: Vec<Vec<String>>,
        present: HashSet<OptionId>,
        positional_values: Vec<String>,

        // Display tables. They survive a help-triggered reset.
        options: IndexMap<String, OptionInfo>,
        positionals: Vec<Positional>,
    }

    impl Default for ArgsParser {
        fn default() -> Self {
            Self::new(ParserConfig::default())
        }
    }

    impl ArgsParser {
        pub fn new(config: ParserConfig) -> Self {
            let ParserConfig {
                show_help,
                description,
                epilogue,
                program_name,
                exit_on_help,
                margin,
                line_width,
            } = config;

            let mut parser = Self {
                exit_on_help,
                margin,
                line_width,
                help_id: None,
                program_name,
                description: reflow(&description, 0, line_width),
                epilogue: reflow(&epilogue, 0, line_width),
                aliases: HashMap::new(),
                slots: Vec::new(),
                present: HashSet::new(),
                positional_values: Vec::new(),
                options: IndexMap::new(),
                positionals: Vec::new(),
            };

            if show_help {
                let indent = if margin == 0 { "    " } else { "" };
                let help = reflow(&format!("{indent}{HELP_TEXT}"), margin, line_width);
                let id = parser.insert_option(HELP_ALIASES.into_aliases(), 0, String::new(), help);
                parser.help_id = Some(id);
            }

            parser
        }

        /// Register an option under one or more aliases.
        ///
        /// `arity` is the number of tokens consumed after the alias. `params_help`
        /// describes those tokens in the help listing (e.g. `<min> <max>`).
        /// Fails without modifying the parser if any alias is empty or taken.
        pub fn add_option(
            &mut self,
            aliases: impl AliasList,
            arity: usize,
            params_help: &str,
            help_text: &str,
        ) -> Result<OptionId> {
            let aliases = aliases.into_aliases();
            if aliases.is_empty() {
                return Err(ArgsError::EmptyAlias);
            }

            let mut seen = HashSet::new();
            for alias in &aliases {
                if alias.is_empty() {
                    return Err(ArgsError::EmptyAlias);
                }
                if self.aliases.contains_key(alias) || !seen.insert(alias.as_str()) {
                    return Err(ArgsError::DuplicateAlias(alias.clone()));
                }
            }

            let help = reflow(help_text, self.margin, self.line_width);
            Ok(self.insert_option(aliases, arity, params_help.to_string(), help))
        }

        /// Append a positional argument and return its index.
        pub fn add_positional(&mut self, name: &str, help_text: &str) -> usize {
            self.positionals.push(Positional {
                name: name.to_string(),
                help: reflow(help_text, self.margin, self.line_width),
            });
            debug!(name, index = self.positionals.len() - 1, "registered positional");
            self.positionals.len() - 1
        }

        fn insert_option(
            &mut self,
            aliases: Vec<String>,
            arity: usize,
            params_help: String,
            help: String,
        ) -> OptionId {
            let id = OptionId(self.slots.len());
            for alias in &aliases {
                self.aliases.insert(alias.clone(), id);
            }
            self.slots.push(vec![String::new(); arity]);
            debug!(%id, ?aliases, arity, "registered option");

            let key = aliases[0].clone();
            self.options.insert(
                key,
                OptionInfo {
                    id,
                    aliases,
                    arity,
                    params_help,
                    help,
                },
            );
            id
        }

        /// Parse `args[start_index..]`, writing help to stdout if it is requested.
        ///
        /// Use `start_index = 1` to skip `argv[0]`, which then also names the
        /// program in usage text unless a name was configured.
        pub fn parse<S: AsRef<str>>(
            &mut self,
            args: &[S],
            start_index: usize,
        ) -> Result<ParseOutcome> {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            self.parse_to(args, start_index, &mut out)
        }

        /// Like [`parse`](Self::parse), writing help to `out`.
        ///
        /// Parsing is a single left-to-right pass. A token that is not an alias
        /// fills the next free positional slot; once all slots are filled it is
        /// an [`ArgsError::UnknownArgument`]. Repeated calls accumulate into the
        /// same state.
        pub fn parse_to<S: AsRef<str>, W: Write>(
            &mut self,
            args: &[S],
            start_index: usize,
            out: &mut W,
        ) -> Result<ParseOutcome> {
            if args.len() < start_index {
                return Err(ArgsError::InvalidStart {
                    start: start_index,
                    count: args.len(),
                });
            }

            if self.program_name.is_none() {
                let name = args
                    .first()
                    .filter(|_| start_index > 0)
                    .map(|arg0| arg0.as_ref())
                    // `..` and paths ending in `..` have no file name; they get the default.
                    .and_then(|arg0: &str| Path::new(arg0).file_name())
                    .map(|name| name.to_string_lossy().into_owned())
                    .filter(|name| !name.is_empty())
                    .unwrap_or_else(|| DEFAULT_PROGRAM_NAME.to_string());
                debug!(program = %name, "resolved program name");
                self.program_name = Some(name);
            }

            let mut i = start_index;
            while i < args.len() {
                let token = args[i].as_ref();
                trace!(index = i, token, "parsing token");

                let Some(id) = self.aliases.get(token).copied() else {
                    if self.positional_values.len() >= self.positionals.len() {
                        return Err(ArgsError::UnknownArgument(token.to_string()));
                    }
                    self.positional_values.push(token.to_string());
                    i += 1;
                    continue;
                };

                if Some(id) == self.help_id {
                    debug!(alias = token, "help requested");
                    self.write_help(out)?;
                    self.reset();
                    return self.finish_help(out);
                }

                self.present.insert(id);
                let slots = &mut self.slots[id.0];
                if !slots.is_empty() {
                    let found = args.len() - i - 1;
                    if found < slots.len() {
                        return Err(ArgsError::InsufficientParameters {
                            alias: token.to_string(),
                            expected: slots.len(),
                            found,
                        });
                    }
                    for (slot, value) in slots.iter_mut().zip(&args[i + 1..]) {
                        *slot = value.as_ref().to_string();
                    }
                    i += slots.len();
                }
                i += 1;
            }

            Ok(ParseOutcome::Parsed)
        }

        // Drop alias resolution and parse state after help. Display tables stay.
        fn reset(&mut self) {
            self.aliases.clear();
            self.slots.clear();
            self.present.clear();
            self.positional_values.clear();
        }

        fn finish_help<W: Write>(&self, out: &mut W) -> Result<ParseOutcome> {
            out.flush()?;
            if self.exit_on_help {
                std::process::exit(0);
            }
            Ok(ParseOutcome::HelpShown)
        }

        pub fn is_valid_alias(&self, alias: &str) -> bool {
            self.aliases.contains_key(alias)
        }

        pub fn option_id(&self, alias: &str) -> Result<OptionId> {
            self.aliases
                .get(alias)
                .copied()
                .ok_or_else(|| ArgsError::UnknownArgument(alias.to_string()))
        }

        /// Identifier of the built-in help option, if registered.
        pub fn help_id(&self) -> Option<OptionId> {
            self.help_id
        }

        /// Whether the option behind `alias` appeared in the parsed arguments.
        pub fn was_present(&self, alias: &str) -> Result<bool> {
            Ok(self.was_present_id(self.option_id(alias)?))
        }

        pub fn was_present_id(&self, id: OptionId) -> bool {
            self.present.contains(&id)
        }

        /// Present and takes at least one value.
        pub fn has_value(&self, alias: &str) -> Result<bool> {
            let id = self.option_id(alias)?;
            Ok(self.was_present_id(id) && !self.values_for_id(id).is_empty())
        }

        /// Value slots of the option behind `alias`.
        ///
        /// The slice always has the registered arity; slots stay empty strings
        /// until a parse fills them.
        pub fn values_for(&self, alias: &str) -> Result<&[String]> {
            Ok(self.values_for_id(self.option_id(alias)?))
        }

        pub fn values_for_id(&self, id: OptionId) -> &[String] {
            self.slots.get(id.0).map(Vec::as_slice).unwrap_or_default()
        }

        pub fn positional_at(&self, index: usize) -> Result<&str> {
            self.positional_values
                .get(index)
                .map(String::as_str)
                .ok_or(ArgsError::PositionalOutOfRange {
                    index,
                    count: self.positional_values.len(),
                })
        }

        pub fn positional_values(&self) -> &[String] {
            &self.positional_values
        }

        /// Registered options in registration order.
        pub fn options(&self) -> impl Iterator<Item = &OptionInfo> {
            self.options.values()
        }

        pub fn positionals(&self) -> &[Positional] {
            &self.positionals
        }

        /// Configured or derived program name; the default before the first parse.
        pub fn program_name(&self) -> &str {
            self.program_name.as_deref().unwrap_or(DEFAULT_PROGRAM_NAME)
        }

        /// Render the usage block.
        ///
        /// ```text
        /// Usage:
        ///     prog OPTIONS \
        ///          input \
        ///          output
        /// ```
        pub fn usage(&self) -> String {
            let indent = if self.margin == 0 { 4 } else { self.margin };
            let program = self.program_name();

            let mut out = String::from("Usage:\n");
            out.push_str(&" ".repeat(indent));
            out.push_str(program);
            if !self.options.is_empty() {
                out.push_str(" OPTIONS");
            }
            let continuation = " ".repeat(indent + program.chars().count() + 1);
            for positional in &self.positionals {
                out.push_str(" \\\n");
                out.push_str(&continuation);
                out.push_str(&positional.name);
            }
            out.push('\n');
            out
        }

        pub fn write_usage<W: Write>(&self, out: &mut W) -> io::Result<()> {
            out.write_all(self.usage().as_bytes())
        }

        pub fn print_usage(&self) -> io::Result<()> {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            self.write_usage(&mut out)
        }

        /// Render the full help text: description, usage, positionals, options
        /// with non-empty help, and epilogue.
        pub fn help_text(&self) -> String {
            let mut out = String::new();
            if !self.description.is_empty() {
                out.push_str(&self.description);
                out.push_str("\n\n");
            }

            out.push_str(&self.usage());

            if !self.positionals.is_empty() {
                out.push_str(&format!(
                    "\nPOSITIONAL ARGUMENTS: {}\n",
                    self.positionals.len()
                ));
                for positional in &self.positionals {
                    out.push_str(&format!("{}\n{}\n\n", positional.name, positional.help));
                }
            }

            if !self.options.is_empty() {
                out.push_str("\nOPTIONS:\n");
                for info in self.options.values().filter(|info| !info.help.is_empty()) {
                    out.push_str(&format!(
                        "{} {}\n{}\n\n",
                        info.aliases.join(", "),
                        info.params_help,
                        info.help
                    ));
                }
            }

            if !self.epilogue.is_empty() {
                out.push_str(&format!("\n{}\n", self.epilogue));
            }

            out
        }

        pub fn write_help<W: Write>(&self, out: &mut W) -> io::Result<()> {
            out.write_all(self.help_text().as_bytes())
        }

        /// Print help to stdout, then exit with status 0 or report
        /// [`ParseOutcome::HelpShown`] depending on the exit-on-help setting.
        pub fn show_help(&self) -> Result<ParseOutcome> {
            let stdout = io::stdout();
            let mut out = stdout.lock();
            self.show_help_to(&mut out)
        }

        pub fn show_help_to<W: Write>(&self, out: &mut W) -> Result<ParseOutcome> {
            self.write_help(out)?;
            self.finish_help(out)
        }
    }
}
