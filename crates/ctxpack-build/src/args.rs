//! Build-argument substitution.
//!
//! Each `ARG` binds a value that is substituted into the tokens of every
//! later instruction, up to the next `ARG` redeclaring the same name.
//! Earlier instructions are never touched, so redeclaring an argument
//! cannot change what was already substituted.

use ctxpack_core::BuildArgs;

use crate::instruction::{Command, Instruction};
use crate::template::{self, TemplateError};

/// Substitute build arguments into `instructions` in place.
///
/// A caller-supplied value wins over the inline default and is rendered
/// as an environment template first; an argument with neither binds the
/// empty string.
pub fn expand_build_args(
    instructions: &mut [Instruction],
    build_args: &BuildArgs,
    env: &dyn Fn(&str) -> Option<String>,
) -> Result<(), ArgError> {
    for i in 0..instructions.len() {
        if instructions[i].command != Command::Arg {
            continue;
        }
        let Some(declared) = instructions[i].tokens.first() else {
            continue;
        };

        let (key, default) = match declared.split_once('=') {
            Some((key, default)) => (key.to_owned(), Some(default.to_owned())),
            None => (declared.clone(), None),
        };

        let value = match build_args.get(&key) {
            Some(Some(template)) => {
                template::render(template, env).map_err(|e| ArgError::InvalidValue {
                    key: key.clone(),
                    source: e,
                })?
            }
            _ => default.unwrap_or_default(),
        };

        tracing::debug!(arg = %key, value = %value, line = instructions[i].line, "binding build argument");

        for later in &mut instructions[i + 1..] {
            if later.arg_name() == Some(key.as_str()) {
                break;
            }
            for token in &mut later.tokens {
                *token = expand(token, &key, &value);
            }
        }
    }
    Ok(())
}

/// Replace `${key}` and `$key` references in `text` with `value`.
///
/// `$key` only matches when not directly followed by a name character,
/// so `$KEYS` is left alone when substituting `KEY`.
pub fn expand(text: &str, key: &str, value: &str) -> String {
    let braced = format!("${{{key}}}");
    let text = text.replace(&braced, value);

    let bare = format!("${key}");
    let mut out = String::with_capacity(text.len());
    let mut rest = text.as_str();
    while let Some(pos) = rest.find(&bare) {
        let end = pos + bare.len();
        let bounded = rest[end..]
            .chars()
            .next()
            .is_none_or(|c| !(c.is_ascii_alphanumeric() || c == '_'));

        out.push_str(&rest[..pos]);
        if bounded {
            out.push_str(value);
        } else {
            out.push_str(&bare);
        }
        rest = &rest[end..];
    }
    out.push_str(rest);
    out
}

#[derive(Debug, thiserror::Error)]
pub enum ArgError {
    #[error("invalid build argument value for {key}")]
    InvalidValue {
        key: String,
        source: TemplateError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_braced_and_bare_references() {
        assert_eq!(expand("base:${V}", "V", "1.2"), "base:1.2");
        assert_eq!(expand("base:$V", "V", "1.2"), "base:1.2");
        assert_eq!(expand("$V/$V-x", "V", "1"), "1/1-x");
    }

    #[test]
    fn bare_reference_requires_word_boundary() {
        assert_eq!(expand("$VERSION", "V", "1"), "$VERSION");
        assert_eq!(expand("$V_2", "V", "1"), "$V_2");
        assert_eq!(expand("${VERSION}", "V", "1"), "${VERSION}");
    }

    #[test]
    fn reference_inside_other_name_is_substituted_from_the_dollar() {
        assert_eq!(expand("FOO$A", "A", "x"), "FOOx");
        assert_eq!(expand("FOOA", "A", "x"), "FOOA");
    }
}
