//! Process-wide compiler reuse keyed by configuration fingerprint.

use crate::compiler::{Compiler, CompilerConfig};
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, PoisonError};

static GLOBAL: Lazy<CompilerCache> = Lazy::new(CompilerCache::new);

struct CachedCompiler {
    fingerprint: u64,
    compiler: Arc<Compiler>,
}

/// Holds at most one compiler, rebuilt when the configuration changes.
///
/// A compiler is never reconfigured in place: a new fingerprint swaps in a
/// fresh instance while callers still holding the old `Arc` finish with it.
#[derive(Default)]
pub struct CompilerCache {
    slot: Mutex<Option<CachedCompiler>>,
}

impl CompilerCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache shared by the bundler hook.
    pub fn global() -> &'static CompilerCache {
        &GLOBAL
    }

    /// Returns the compiler for `config`, building it on first use or after
    /// a configuration change.
    pub fn get(&self, config: &CompilerConfig) -> Arc<Compiler> {
        let fingerprint = config.fingerprint();
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = slot.as_ref()
            && cached.fingerprint == fingerprint
        {
            return Arc::clone(&cached.compiler);
        }
        if slot.is_some() {
            log::debug!("Compiler configuration changed; rebuilding");
        }
        let compiler = Arc::new(Compiler::from_config(config.clone()));
        *slot = Some(CachedCompiler {
            fingerprint,
            compiler: Arc::clone(&compiler),
        });
        compiler
    }

    /// Drops the cached compiler.
    pub fn reset(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a compiler is currently cached.
    pub fn is_warm(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}
