//! COPY/ADD source extraction.

use std::collections::HashMap;

use crate::instruction::{Command, Instruction};
use crate::shell::{self, ShellError};

/// Source tokens of every COPY/ADD, one group per instruction.
///
/// `ENV` values seen so far feed shell-word expansion of the sources.
/// Instructions copying from another stage, and remote URL sources,
/// contribute nothing. Groups left empty are dropped.
pub fn copied_files(instructions: &[Instruction]) -> Result<Vec<Vec<String>>, CopyError> {
    let mut copied = Vec::new();
    let mut envs: HashMap<String, String> = HashMap::new();

    for instruction in instructions {
        match instruction.command {
            Command::Copy | Command::Add => {
                let files = process_copy(instruction, &envs)?;
                if !files.is_empty() {
                    copied.push(files);
                }
            }
            Command::Env => {
                // one ENV may define several variables
                for pair in instruction.tokens.chunks_exact(2) {
                    envs.insert(pair[0].clone(), pair[1].clone());
                }
            }
            _ => {}
        }
    }

    Ok(copied)
}

fn process_copy(
    instruction: &Instruction,
    envs: &HashMap<String, String>,
) -> Result<Vec<String>, CopyError> {
    // A dependency on another stage is not a dependency on the workspace.
    if instruction.has_flag("--from=") {
        return Ok(Vec::new());
    }

    let mut copied = Vec::new();
    // The last token is the destination; a `#` token starts a comment.
    for window in instruction.tokens.windows(2) {
        let (token, next) = (&window[0], &window[1]);
        if next.starts_with('#') {
            break;
        }

        let src = shell::process_word(token, envs).map_err(|e| CopyError::Word {
            line: instruction.line,
            word: token.clone(),
            source: e,
        })?;

        if src.starts_with("http://") || src.starts_with("https://") {
            tracing::debug!(source = %src, "skipping watch on remote dependency");
            continue;
        }
        copied.push(src);
    }

    Ok(copied)
}

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("line {line}: processing word {word:?}")]
    Word {
        line: usize,
        word: String,
        source: ShellError,
    },
}
