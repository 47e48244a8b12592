/*!
 * Pipeline plumbing.
 *
 * - `pool`: ordered worker pool and cancellation flag
 * - `translation_batch`: width-bounded grouping of lines for translation
 * - `orchestrator`: the phase-by-phase generation run
 */

pub mod orchestrator;
pub mod pool;
pub mod translation_batch;

pub use orchestrator::{Collaborators, GenerationOutput, SubtitleGenerator, ensure_count};
pub use pool::{CancellationFlag, WorkerPool};
pub use translation_batch::{batch_lines, display_width};
