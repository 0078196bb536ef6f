//! ONBUILD trigger resolution.
//!
//! Every external base image may carry ONBUILD triggers that run as part
//! of the child build. Triggers that COPY or ADD files make those files
//! dependencies of the child, so they are fetched here and returned as a
//! preamble to the Dockerfile's own instructions.

use std::collections::HashSet;

use ctxpack_core::{ImageConfigFetcher, InsecureRegistries};

use crate::instruction::{self, Instruction, ParseError, StageRef};

/// Stage references of every `FROM` instruction, in order.
pub fn from_instructions(instructions: &[Instruction]) -> Vec<StageRef> {
    instructions.iter().filter_map(Instruction::stage_ref).collect()
}

/// Fetch and parse the ONBUILD triggers of every external base image.
///
/// `scratch` and references to earlier stages are skipped. A failed lookup
/// is logged and skipped, leaving the result possibly incomplete.
pub async fn onbuild_instructions<F: ImageConfigFetcher>(
    fetcher: &F,
    instructions: &[Instruction],
    insecure_registries: &InsecureRegistries,
) -> Result<Vec<Instruction>, ParseError> {
    let mut triggers: Vec<String> = Vec::new();
    let mut stages: HashSet<String> = HashSet::new();

    for from in from_instructions(instructions) {
        let image_lower = from.image.to_lowercase();
        let is_local = image_lower == "scratch" || stages.contains(&image_lower);

        if let Some(alias) = from.alias {
            stages.insert(alias);
        }
        if is_local {
            continue;
        }

        tracing::debug!(image = %from.image, "checking base image for ONBUILD triggers");

        // Image references are case-sensitive; stage names are not.
        match fetcher.onbuild_triggers(&from.image, insecure_registries).await {
            Ok(found) if !found.is_empty() => {
                tracing::debug!(image = %from.image, triggers = ?found, "found ONBUILD triggers");
                triggers.extend(found);
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    image = %from.image,
                    error = %e,
                    "error processing base image for ONBUILD triggers; dependencies may be incomplete"
                );
            }
        }
    }

    if triggers.is_empty() {
        return Ok(Vec::new());
    }
    instruction::parse(&triggers.join("\n"))
}
