//! Dockerfile dependency resolution and build-context archiving.
//!
//! # Resolution pipeline
//!
//! ```text
//! DependencyResolver::dependencies()
//!   1. Parse       ── Dockerfile → instructions (line continuations, JSON forms)
//!   2. Build args  ── ${NAME} / $NAME substituted until NAME is redeclared
//!   3. ONBUILD     ── triggers of external base images, via ImageConfigFetcher
//!   4. Sources     ── COPY/ADD sources (skips --from, URLs), shell-expanded
//!   5. Expand      ── literal paths kept, globs matched in the workspace
//!   6. Walk        ── directories recursed, .dockerignore applied
//!   7. Result      ── + Dockerfile, − .dockerignore, sorted
//! ```
//!
//! # Build context
//!
//! [`DependencyResolver::write_context`] archives the resolved files into a
//! tar named relative to the workspace; [`DependencyResolver::stream_context`]
//! does the same from a producer thread through a bounded pipe.

pub mod archive;
pub mod args;
pub mod context;
pub mod copy;
pub mod expand;
pub mod ignore;
pub mod instruction;
pub mod onbuild;
pub mod paths;
pub mod resolve;
pub mod shell;
pub mod stream;
pub mod template;
pub mod walk;

pub use archive::{ArchiveError, create_tar};
pub use context::ContextError;
pub use ignore::PatternSet;
pub use instruction::{Command, Instruction, StageRef};
pub use resolve::{DependencyResolver, ResolveError, normalize_dockerfile_path};
pub use stream::{PipeReader, stream_tar};
