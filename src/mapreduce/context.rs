//! Map context lifecycle: compiling N sources once, then reusing the same
//! evaluator for every subsequent `mapreduce_map` call.

use std::cell::RefCell;
use std::rc::Rc;

use boa_engine::{Context, JsValue, Source};

use crate::mapreduce::builtins::{self, Accumulator};
use crate::mapreduce::errors::{MapError, MapResult};

/// A compiled set of map functions sharing one script environment.
///
/// Strictly single-evaluator: `boa_engine::Context` is not `Send`, and a
/// compiled context is never shared across threads.
pub struct MapContext {
    engine: Context,
    functions: Vec<JsValue>,
    accumulator: Accumulator,
}

impl MapContext {
    /// Compiles each entry in `sources` as a function expression against a
    /// fresh script environment preloaded with the builtin prelude.
    ///
    /// # Errors
    /// `MapError::SyntaxError` if any source fails to compile or does not
    /// evaluate to a callable value; no partial context is returned.
    pub fn compile(sources: &[String]) -> MapResult<Self> {
        let mut engine = Context::default();
        let accumulator: Accumulator = Rc::new(RefCell::new(Vec::new()));
        builtins::install_prelude(&mut engine, accumulator.clone())
            .map_err(|e| MapError::SyntaxError(e.to_string()))?;

        let mut functions = Vec::with_capacity(sources.len());
        for source in sources {
            let value = engine
                .eval(Source::from_bytes(source.as_bytes()))
                .map_err(|e| MapError::SyntaxError(e.to_string()))?;
            if !value.is_callable() {
                return Err(MapError::SyntaxError(format!("{source:?} did not evaluate to a function")));
            }
            functions.push(value);
        }
        Ok(Self { engine, functions, accumulator })
    }

    #[must_use]
    pub fn function_count(&self) -> usize {
        self.functions.len()
    }

    pub(crate) fn engine_mut(&mut self) -> &mut Context {
        &mut self.engine
    }

    pub(crate) fn functions(&self) -> &[JsValue] {
        &self.functions
    }

    /// Clears and returns the accumulator's current contents, called once
    /// per function invocation before and after running it.
    pub(crate) fn drain_accumulator(&self) -> Vec<(String, String)> {
        std::mem::take(&mut *self.accumulator.borrow_mut())
    }
}
