//! Dockerfile instruction parsing.
//!
//! The `dockerfile-parser` crate owns the grammar (continuations, comments,
//! exec-form lists, ENV pairs). This module maps its AST onto the flat
//! [`Instruction`] view dependency resolution works with: keyword, leading
//! `--flags`, and argument tokens.

use dockerfile_parser::{Dockerfile, Instruction as ParsedInstruction};

/// Instruction keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    From,
    Arg,
    Env,
    Copy,
    Add,
    Onbuild,
    /// Any other keyword, upper-cased.
    Other(String),
}

impl Command {
    fn from_keyword(keyword: &str) -> Self {
        let upper = keyword.to_ascii_uppercase();
        match upper.as_str() {
            "FROM" => Self::From,
            "ARG" => Self::Arg,
            "ENV" => Self::Env,
            "COPY" => Self::Copy,
            "ADD" => Self::Add,
            "ONBUILD" => Self::Onbuild,
            _ => Self::Other(upper),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::From => "FROM",
            Self::Arg => "ARG",
            Self::Env => "ENV",
            Self::Copy => "COPY",
            Self::Add => "ADD",
            Self::Onbuild => "ONBUILD",
            Self::Other(keyword) => keyword,
        }
    }

    fn requires_arguments(&self) -> bool {
        matches!(
            self,
            Self::From | Self::Arg | Self::Env | Self::Copy | Self::Add
        )
    }
}

/// One parsed Dockerfile directive.
///
/// `tokens` are rewritten in place by build-argument substitution; the
/// command, flags and line never change after parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    pub command: Command,
    pub tokens: Vec<String>,
    pub flags: Vec<String>,
    /// 1-based line where the instruction starts.
    pub line: usize,
}

/// The base image and optional alias of a `FROM` instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageRef {
    pub image: String,
    /// Lower-cased, since stage names are case-insensitive.
    pub alias: Option<String>,
}

impl Instruction {
    /// Stage view of a `FROM` instruction; `None` for anything else.
    pub fn stage_ref(&self) -> Option<StageRef> {
        if self.command != Command::From {
            return None;
        }
        let image = self.tokens.first()?.clone();
        let alias = match self.tokens.get(1..3) {
            Some([keyword, alias]) if keyword.eq_ignore_ascii_case("as") => {
                Some(alias.to_lowercase())
            }
            _ => None,
        };
        Some(StageRef { image, alias })
    }

    /// Name declared by an `ARG` instruction (the part before `=`).
    pub fn arg_name(&self) -> Option<&str> {
        if self.command != Command::Arg {
            return None;
        }
        self.tokens
            .first()
            .map(|token| token.split_once('=').map_or(token.as_str(), |(name, _)| name))
    }

    /// Whether any flag starts with `prefix`, e.g. `--from=`.
    pub fn has_flag(&self, prefix: &str) -> bool {
        self.flags.iter().any(|flag| flag.starts_with(prefix))
    }
}

/// Parse Dockerfile source into instructions.
///
/// Empty input yields an empty list.
pub fn parse(source: &str) -> Result<Vec<Instruction>, ParseError> {
    let dockerfile = Dockerfile::parse(source).map_err(|e| ParseError::Syntax {
        detail: e.to_string(),
    })?;
    let lines = LineIndex::new(&dockerfile.content);

    dockerfile
        .instructions
        .iter()
        .map(|parsed| map_instruction(parsed, &dockerfile.content, &lines))
        .collect()
}

fn map_instruction(
    parsed: &ParsedInstruction,
    content: &str,
    lines: &LineIndex,
) -> Result<Instruction, ParseError> {
    let span = parsed.span();
    let line = lines.line_for_offset(span.start);

    let (command, flags, tokens) = match parsed {
        ParsedInstruction::From(from) => {
            let mut tokens = vec![from.image.content.clone()];
            if let Some(alias) = &from.alias {
                tokens.push("AS".to_owned());
                tokens.push(alias.content.clone());
            }
            let flags = from
                .flags
                .iter()
                .map(|flag| render_flag(&flag.name.content, &flag.value.content))
                .collect();
            (Command::From, flags, tokens)
        }
        ParsedInstruction::Arg(arg) => {
            let token = match &arg.value {
                Some(value) => format!("{}={}", arg.name.content, value.content),
                None => arg.name.content.clone(),
            };
            (Command::Arg, Vec::new(), vec![token])
        }
        ParsedInstruction::Env(env) => {
            let mut tokens = Vec::with_capacity(env.vars.len() * 2);
            for var in &env.vars {
                tokens.push(var.key.content.clone());
                tokens.push(var.value.to_string().trim().to_owned());
            }
            (Command::Env, Vec::new(), tokens)
        }
        ParsedInstruction::Copy(copy) => {
            let flags = copy
                .flags
                .iter()
                .map(|flag| render_flag(&flag.name.content, &flag.value.content))
                .collect();
            let tokens = copy
                .sources
                .iter()
                .chain(std::iter::once(&copy.destination))
                .map(|s| s.content.clone())
                .collect();
            (Command::Copy, flags, tokens)
        }
        ParsedInstruction::Misc(misc) => {
            let command = Command::from_keyword(&misc.instruction.content);
            let arguments = misc.arguments.to_string();
            let (flags, tokens) = match command {
                Command::Add | Command::Copy => split_flags(arguments.trim()),
                // FROM, ARG and ENV only land here when their own rule rejected them.
                Command::From | Command::Arg | Command::Env if !arguments.trim().is_empty() => {
                    return Err(ParseError::Malformed {
                        line,
                        keyword: command.as_str().to_owned(),
                    });
                }
                _ => (Vec::new(), words(&arguments)),
            };
            (command, flags, tokens)
        }
        ParsedInstruction::Label(_) => opaque("LABEL", content, span.start, span.end)?,
        ParsedInstruction::Run(_) => opaque("RUN", content, span.start, span.end)?,
        ParsedInstruction::Entrypoint(_) => opaque("ENTRYPOINT", content, span.start, span.end)?,
        ParsedInstruction::Cmd(_) => opaque("CMD", content, span.start, span.end)?,
    };

    if tokens.is_empty() && command.requires_arguments() {
        return Err(ParseError::MissingArguments {
            line,
            keyword: command.as_str().to_owned(),
        });
    }

    Ok(Instruction {
        command,
        tokens,
        flags,
        line,
    })
}

fn render_flag(name: &str, value: &str) -> String {
    format!("--{}={}", name.trim_start_matches('-'), value)
}

/// Leading `--flag` words of an ADD line, then its exec-form list or words.
fn split_flags(arguments: &str) -> (Vec<String>, Vec<String>) {
    let mut flags = Vec::new();
    let mut rest = arguments;
    while rest.starts_with("--") {
        let (flag, tail) = match rest.find(char::is_whitespace) {
            Some(pos) => (&rest[..pos], rest[pos..].trim_start()),
            None => (rest, ""),
        };
        flags.push(flag.to_owned());
        rest = tail;
    }
    (flags, json_or_words(rest))
}

/// Exec form `["src", "dst"]` when it decodes, whitespace words otherwise.
fn json_or_words(rest: &str) -> Vec<String> {
    if rest.starts_with('[') {
        match serde_json::from_str::<Vec<String>>(rest) {
            Ok(list) => return list,
            Err(e) => tracing::debug!(error = %e, "not an exec-form list, splitting on whitespace"),
        }
    }
    words(rest)
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_owned).collect()
}

/// An instruction resolution never inspects; its words are read from the
/// source text.
fn opaque(
    keyword: &str,
    content: &str,
    start: usize,
    end: usize,
) -> Result<(Command, Vec<String>, Vec<String>), ParseError> {
    let raw = content
        .get(start..end)
        .ok_or(ParseError::Span { start, end })?;
    let tokens = raw
        .split_whitespace()
        .skip(1)
        .filter(|word| *word != "\\")
        .map(str::to_owned)
        .collect();
    Ok((Command::Other(keyword.to_owned()), Vec::new(), tokens))
}

/// Byte offset to 1-based line lookup.
struct LineIndex {
    newline_offsets: Vec<usize>,
}

impl LineIndex {
    fn new(content: &str) -> Self {
        let newline_offsets = content
            .bytes()
            .enumerate()
            .filter_map(|(index, byte)| (byte == b'\n').then_some(index))
            .collect();
        Self { newline_offsets }
    }

    fn line_for_offset(&self, offset: usize) -> usize {
        self.newline_offsets.partition_point(|newline| *newline < offset) + 1
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid dockerfile: {detail}")]
    Syntax { detail: String },
    #[error("line {line}: malformed {keyword} instruction")]
    Malformed { line: usize, keyword: String },
    #[error("line {line}: {keyword} requires at least one argument")]
    MissingArguments { line: usize, keyword: String },
    #[error("instruction span {start}..{end} is outside the dockerfile")]
    Span { start: usize, end: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_with_alias_and_platform() {
        let parsed = parse("FROM --platform=linux/amd64 golang:1.22 AS Builder").unwrap();

        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].flags, vec!["--platform=linux/amd64"]);
        let stage = parsed[0].stage_ref().unwrap();
        assert_eq!(stage.image, "golang:1.22");
        assert_eq!(stage.alias.as_deref(), Some("builder"));
    }

    #[test]
    fn continuation_keeps_first_line_number() {
        let source = "# leading comment\nFROM alpine\n\nCOPY a \\\n  b /dst\n";
        let parsed = parse(source).unwrap();

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].command, Command::Copy);
        assert_eq!(parsed[1].tokens, vec!["a", "b", "/dst"]);
        assert_eq!(parsed[1].line, 4);
    }

    #[test]
    fn copy_flags_and_exec_form() {
        let parsed = parse("COPY --from=build --chown=1:1 [\"a b\", \"/dst\"]").unwrap();

        assert_eq!(parsed[0].flags, vec!["--from=build", "--chown=1:1"]);
        assert_eq!(parsed[0].tokens, vec!["a b", "/dst"]);
        assert!(parsed[0].has_flag("--from="));
    }

    #[test]
    fn add_flags_are_split_from_sources() {
        let parsed = parse("ADD --chown=1:1 src /dst").unwrap();
        assert_eq!(parsed[0].command, Command::Add);
        assert_eq!(parsed[0].flags, vec!["--chown=1:1"]);
        assert_eq!(parsed[0].tokens, vec!["src", "/dst"]);
    }

    #[test]
    fn add_exec_form() {
        let parsed = parse("ADD [\"a b\", \"/dst\"]").unwrap();
        assert_eq!(parsed[0].tokens, vec!["a b", "/dst"]);
    }

    #[test]
    fn env_pairs_become_key_value_tokens() {
        let parsed = parse("ENV A=1 B=2").unwrap();
        assert_eq!(parsed[0].command, Command::Env);
        assert_eq!(parsed[0].tokens, vec!["A", "1", "B", "2"]);
    }

    #[test]
    fn env_legacy_form() {
        let parsed = parse("ENV GREETING hello").unwrap();
        assert_eq!(parsed[0].tokens, vec!["GREETING", "hello"]);
    }

    #[test]
    fn env_without_value_is_error() {
        assert!(parse("FROM a\nENV ONLY").is_err());
    }

    #[test]
    fn copy_without_arguments_is_error() {
        assert!(parse("COPY").is_err());
    }

    #[test]
    fn other_keywords_are_opaque() {
        let parsed = parse("run echo hi").unwrap();
        assert_eq!(parsed[0].command, Command::Other("RUN".to_owned()));
        assert_eq!(parsed[0].tokens, vec!["echo", "hi"]);
    }

    #[test]
    fn onbuild_is_recognised() {
        let parsed = parse("FROM a\nONBUILD COPY x /y").unwrap();
        assert_eq!(parsed[1].command, Command::Onbuild);
        assert_eq!(parsed[1].line, 2);
    }

    #[test]
    fn arg_name_strips_default() {
        let parsed = parse("ARG VERSION=1.0").unwrap();
        assert_eq!(parsed[0].tokens, vec!["VERSION=1.0"]);
        assert_eq!(parsed[0].arg_name(), Some("VERSION"));
    }

    #[test]
    fn empty_source_parses_to_nothing() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("# only a comment\n").unwrap().is_empty());
    }

    #[test]
    fn line_index_counts_from_one() {
        let index = LineIndex::new("a\nb\nc");
        assert_eq!(index.line_for_offset(0), 1);
        assert_eq!(index.line_for_offset(2), 2);
        assert_eq!(index.line_for_offset(4), 3);
    }
}
