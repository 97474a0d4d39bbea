//! Parallel compilation of independent documents.

use crate::compiler::Compiler;
use crate::lower::CompiledDocument;
use rayon::prelude::*;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// Single document in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    /// Caller-chosen identifier, echoed back in the result.
    pub id: String,
    /// Document source.
    pub source: String,
    /// Path used for diagnostics and kind detection. Defaults to `id`.
    pub filepath: Option<String>,
}

/// Lowering applied to every document in a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchTarget {
    /// ES module source.
    #[default]
    Source,
    /// Wire-format graph; local assets are dropped.
    Graph,
}

/// Compiled output of one document.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutput {
    /// Generated module.
    Source(String),
    /// Serializable document.
    Graph(CompiledDocument),
}

/// Outcome for one input.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Identifier from the input.
    pub id: String,
    /// Output when compilation succeeded.
    pub result: Option<BatchOutput>,
    /// Error message when compilation failed.
    pub error: Option<String>,
}

/// Statistics about a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStats {
    /// Inputs submitted.
    pub total: u32,
    /// Inputs compiled.
    pub succeeded: u32,
    /// Inputs that failed.
    pub failed: u32,
    /// Wall time in milliseconds.
    pub processing_time_ms: f64,
}

/// Per-input results plus statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchProcessingResult {
    /// Results in input order.
    pub results: Vec<BatchResult>,
    /// Batch statistics.
    pub stats: BatchStats,
}

/// Options for [`Compiler::compile_batch`].
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Maximum worker threads (defaults to the rayon global pool).
    pub max_threads: Option<u32>,
    /// Keep going after a failure (default: true). When false, inputs are
    /// compiled sequentially and the batch stops at the first error.
    pub continue_on_error: Option<bool>,
    /// Output produced for each input.
    pub target: BatchTarget,
}

impl Compiler {
    /// Compiles many documents in parallel.
    pub fn compile_batch(
        &self,
        inputs: Vec<BatchInput>,
        options: Option<BatchOptions>,
    ) -> BatchProcessingResult {
        let start = Instant::now();
        let opts = options.unwrap_or_default();
        let continue_on_error = opts.continue_on_error.unwrap_or(true);

        let pool = match opts.max_threads {
            Some(threads) if threads > 0 => rayon::ThreadPoolBuilder::new()
                .num_threads(threads as usize)
                .build()
                .ok(),
            _ => None,
        };

        let total = inputs.len() as u32;
        let succeeded = AtomicU32::new(0);
        let failed = AtomicU32::new(0);

        let process_input = |input: BatchInput| -> BatchResult {
            let filepath = input.filepath.as_deref().unwrap_or(&input.id);
            let output = match opts.target {
                BatchTarget::Source => self
                    .compile_to_source(&input.source, filepath)
                    .map(BatchOutput::Source),
                BatchTarget::Graph => self
                    .compile_to_graph(&input.source, filepath)
                    .map(BatchOutput::Graph),
            };
            match output {
                Ok(result) => {
                    succeeded.fetch_add(1, Ordering::Relaxed);
                    BatchResult {
                        id: input.id,
                        result: Some(result),
                        error: None,
                    }
                }
                Err(e) => {
                    failed.fetch_add(1, Ordering::Relaxed);
                    log::warn!("Batch item `{}` failed: {e}", input.id);
                    BatchResult {
                        id: input.id,
                        result: None,
                        error: Some(e.to_string()),
                    }
                }
            }
        };

        let results: Vec<BatchResult> = if continue_on_error {
            if let Some(pool) = pool {
                pool.install(|| inputs.into_par_iter().map(process_input).collect())
            } else {
                inputs.into_par_iter().map(process_input).collect()
            }
        } else {
            let mut results = Vec::with_capacity(inputs.len());
            for input in inputs {
                let result = process_input(input);
                let stop = result.error.is_some();
                results.push(result);
                if stop {
                    break;
                }
            }
            results
        };

        BatchProcessingResult {
            results,
            stats: BatchStats {
                total,
                succeeded: succeeded.load(Ordering::Relaxed),
                failed: failed.load(Ordering::Relaxed),
                processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(id: &str, source: &str) -> BatchInput {
        BatchInput {
            id: id.to_string(),
            source: source.to_string(),
            filepath: None,
        }
    }

    fn inputs() -> Vec<BatchInput> {
        vec![
            input("a.mdx", "# A"),
            input("bad.mdx", "Text\n\n<Note>"),
            input("c.mdx", "C"),
        ]
    }

    #[test]
    fn keeps_going_and_preserves_order() {
        let batch = Compiler::default().compile_batch(
            inputs(),
            Some(BatchOptions {
                max_threads: Some(2),
                ..BatchOptions::default()
            }),
        );
        let ids: Vec<&str> = batch.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a.mdx", "bad.mdx", "c.mdx"]);
        assert_eq!(batch.stats.total, 3);
        assert_eq!(batch.stats.succeeded, 2);
        assert_eq!(batch.stats.failed, 1);
        assert!(batch.results[1].error.is_some());
        assert!(matches!(
            batch.results[0].result,
            Some(BatchOutput::Source(ref code)) if code.contains("_createMdxContent")
        ));
    }

    #[test]
    fn stops_at_first_error_when_asked() {
        let batch = Compiler::default().compile_batch(
            inputs(),
            Some(BatchOptions {
                continue_on_error: Some(false),
                ..BatchOptions::default()
            }),
        );
        assert_eq!(batch.results.len(), 2);
        assert_eq!(batch.stats.failed, 1);
    }

    #[test]
    fn graph_target_yields_documents() {
        let batch = Compiler::default().compile_batch(
            vec![input("a.mdx", "# A")],
            Some(BatchOptions {
                target: BatchTarget::Graph,
                ..BatchOptions::default()
            }),
        );
        let Some(BatchOutput::Graph(document)) = &batch.results[0].result else {
            panic!("graph output expected");
        };
        assert_eq!(document.tree.children()[0].name(), Some("html.h1"));
    }
}
