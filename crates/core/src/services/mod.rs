pub mod arch;
pub mod cache;
pub mod invoker;
pub mod naming;
pub mod pipeline;
pub mod reconcile;

pub use arch::{ArchDetector, ContentClassifier, HeaderClassifier};
pub use cache::CacheCheck;
pub use invoker::{Invocation, LaunchArg, ProcessRunner, ToolRunner};
pub use naming::{hash_file, hash_qualify, ArtifactNamer, ArtifactSet};
pub use pipeline::{ArtifactPipeline, PipelineError, PipelineReport, PipelineState, StateTracker};
pub use reconcile::{Reconciler, Reconciliation};
