//! Domain models for test documents, segments, and run configurations.

use std::path::PathBuf;

/// Immutable snapshot of a test-definition file at the moment of invocation.
///
/// Taken fresh for every request and discarded afterwards; segments derived
/// from it are never cached across edits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDocument {
    pub path: PathBuf,
    pub text: String,
}

/// One addressable segment of a scanned document.
///
/// Index 0 is the synthesized whole-file segment; case segments are numbered
/// from 1 in document order. `start` and `end` are byte offsets of the
/// segment's display line within the document text, end exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TestSegment {
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

/// A user-triggered request to run one segment of a test file.
///
/// `case` 0 addresses the whole file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    pub path: PathBuf,
    pub case: usize,
    pub debug: bool,
}

/// Identity of the runnable artifact a configuration points at.
///
/// Owned by the build-system side; the orchestrator only reads and clones it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationTarget {
    pub build_target: String,
    pub profile: Option<String>,
    pub executable: PathBuf,
}

/// A named execution configuration as held by the configuration store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfiguration {
    pub name: String,
    pub target: InvocationTarget,
    pub program_args: String,
}

/// Outcome of dispatching a run or debug launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchReport {
    pub configuration: String,
    pub debug: bool,
    pub exit_code: Option<i32>,
}
