//! forkbot command pipeline.
//!
//! Builds and runs the git invocations the bot needs without ever handing
//! untrusted text to a shell.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Construction ([`CommandStep`], [`CommandPipeline`],
//! [`render_template`]) and execution ([`CommandRunner`]) are separate so each
//! can be tested on its own. Rendered command lines exist for logs and error
//! messages only.
//!
//! ## Failure Kinds
//!
//! [`ProcessError`] tells apart a program that could not start, one that exited
//! non-zero, one killed by a signal, and one stopped by the runner's timeout.

pub mod command;
pub mod errors;
pub mod runner;
pub mod template;

pub use command::{CommandPipeline, CommandStep, MASK};
pub use errors::{PipelineError, ProcessError, TemplateError};
pub use runner::{CommandOutput, CommandRunner, TokioCommandRunner};
pub use template::{render_template, shell_escape};
