//! `mapreduce_map`: invokes every compiled function against one
//! (doc, meta) pair, enforcing the process-wide timeout with a cooperative
//! watchdog thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, LazyLock, Mutex};
use std::time::Duration;

use boa_engine::{JsError, JsValue, Source};

use crate::mapreduce::context::MapContext;
use crate::mapreduce::errors::{MapError, MapResult};

/// Default timeout, matching the 1 ms minimum exercised by the timeout
/// recovery scenario; production callers are expected to raise it via
/// [`set_timeout`].
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5_000);

static GLOBAL_TIMEOUT: LazyLock<Mutex<Duration>> = LazyLock::new(|| Mutex::new(DEFAULT_TIMEOUT));

/// Sets the process-wide map timeout. Takes effect for invocations started
/// after this call; one already in flight keeps its original deadline.
pub fn set_timeout(ms: u64) {
    *GLOBAL_TIMEOUT.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Duration::from_millis(ms);
}

fn current_timeout() -> Duration {
    *GLOBAL_TIMEOUT.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Outcome of one `mapreduce_map` call across every compiled function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MapCallResult {
    /// Per-function results, in source order. Each entry is `Ok(emits)` on
    /// a normal return (an empty vec if nothing was emitted), or
    /// `Err(message)` for a thrown value — the overall call still
    /// succeeds since other functions' outputs are independent.
    Success(Vec<Result<Vec<(String, String)>, String>>),
    Timeout,
}

/// Runs every compiled function in `ctx` against `doc_json`/`meta_json`.
///
/// # Errors
/// `MapError::InvalidJson` if either input fails to parse as JSON. A
/// per-function thrown value does not error the call; it is folded into
/// the corresponding `Result::Err` slot of [`MapCallResult::Success`].
pub fn mapreduce_map(ctx: &mut MapContext, doc_json: &str, meta_json: &str) -> MapResult<MapCallResult> {
    let doc: serde_json::Value = serde_json::from_str(doc_json).map_err(|e| MapError::InvalidJson(e.to_string()))?;
    let meta: serde_json::Value = serde_json::from_str(meta_json).map_err(|e| MapError::InvalidJson(e.to_string()))?;

    let n = ctx.function_count();
    let mut results = Vec::with_capacity(n);

    for i in 0..n {
        ctx.drain_accumulator();
        match invoke_one(ctx, i, &doc, &meta)? {
            Some(outcome) => results.push(outcome),
            None => return Ok(MapCallResult::Timeout),
        }
    }
    Ok(MapCallResult::Success(results))
}

/// Invokes function `i`, returning `None` on timeout (the whole call must
/// abort in that case) or `Some` with that function's per-invocation
/// result otherwise.
fn invoke_one(
    ctx: &mut MapContext,
    i: usize,
    doc: &serde_json::Value,
    meta: &serde_json::Value,
) -> MapResult<Option<Result<Vec<(String, String)>, String>>> {
    let timeout = current_timeout();
    let cancelled = Arc::new(AtomicBool::new(false));

    let watchdog_flag = cancelled.clone();
    let watchdog = std::thread::spawn(move || {
        std::thread::sleep(timeout);
        watchdog_flag.store(true, Ordering::SeqCst);
    });

    let engine = ctx.engine_mut();
    {
        let cancelled_for_handler = cancelled.clone();
        engine.set_interrupt_handler(move |_engine| {
            if cancelled_for_handler.load(Ordering::SeqCst) {
                Err(boa_engine::JsNativeError::error().with_message("map function timed out").into())
            } else {
                Ok(())
            }
        });
    }

    let doc_value = parse_js_value(engine, doc);
    let meta_value = parse_js_value(engine, meta);

    let func = ctx.functions()[i].clone();
    let call_result = func.as_callable().map_or_else(
        || Err(boa_engine::JsNativeError::typ().with_message("compiled value is not callable").into()),
        |callable| callable.call(&JsValue::undefined(), &[doc_value, meta_value], engine),
    );

    let timed_out = cancelled.load(Ordering::SeqCst);
    // The watchdog thread has nothing left to do once we've observed its
    // flag (or the call finished ahead of it); let it run to completion
    // rather than joining and blocking the caller on the remaining sleep.
    drop(watchdog);

    if timed_out {
        return Ok(None);
    }

    match call_result {
        Ok(_) => Ok(Some(Ok(ctx.drain_accumulator()))),
        Err(err) => Ok(Some(Err(describe_thrown(&err, engine)))),
    }
}

fn parse_js_value(engine: &mut boa_engine::Context, value: &serde_json::Value) -> JsValue {
    let literal = value.to_string();
    engine
        .eval(Source::from_bytes(format!("({literal})").as_bytes()))
        .unwrap_or(JsValue::undefined())
}

/// Converts a thrown JS value to its reported string form: a thrown string
/// is reported verbatim, a thrown `Error` (or native error, e.g. the
/// evaluator's own `TypeError`) as its default string coercion.
fn describe_thrown(err: &JsError, engine: &mut boa_engine::Context) -> String {
    let Some(value) = err.as_opaque() else {
        // A native error. `boa_engine` phrases "read a property off
        // undefined/null" with modern spec wording; downstream consumers
        // were written against the legacy wording, so translate it.
        let message = err.to_string();
        return normalize_property_access_wording(&message).unwrap_or(message);
    };
    if let Some(s) = value.as_string() {
        return s.to_std_string_escaped();
    }
    value.to_string(engine).map(|s| s.to_std_string_escaped()).unwrap_or_else(|_| err.to_string())
}

/// Rewrites `boa_engine`'s "Cannot read properties of undefined (reading
/// 'bar')" into the legacy "Cannot read property 'bar' of undefined" form.
/// Returns `None` for any message that isn't this specific shape.
fn normalize_property_access_wording(message: &str) -> Option<String> {
    let body = message.strip_prefix("TypeError: ")?;
    let (prefix, rest) = body.split_once(" (reading '")?;
    if !prefix.starts_with("Cannot read propert") {
        return None;
    }
    let subject = prefix.rsplit("of ").next()?;
    let property = rest.strip_suffix("')")?;
    Some(format!("TypeError: Cannot read property '{property}' of {subject}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sum_builtin_matches_expected_vector() {
        let sources = vec!["function(doc, meta) { emit(meta.id, sum(doc.values)); }".to_string()];
        let mut ctx = MapContext::compile(&sources).unwrap();
        let doc = r#"{"values":[10,-7,20,1],"bin":"aGVsbG8gd29ybGQh","date":"+033658-09-27T01:46:40.000Z"}"#;
        let meta = r#"{"id":"doc1"}"#;
        let result = mapreduce_map(&mut ctx, doc, meta).unwrap();
        match result {
            MapCallResult::Success(results) => {
                let emits = results[0].as_ref().unwrap();
                assert_eq!(emits, &[("\"doc1\"".to_string(), "24".to_string())]);
            }
            MapCallResult::Timeout => panic!("unexpected timeout"),
        }
    }

    #[test]
    fn thrown_string_is_reported_verbatim() {
        let sources = vec!["function(doc, meta) { throw('foobar'); }".to_string()];
        let mut ctx = MapContext::compile(&sources).unwrap();
        let result = mapreduce_map(&mut ctx, r#"{"value":1}"#, "{}").unwrap();
        match result {
            MapCallResult::Success(results) => assert_eq!(results[0].as_ref().unwrap_err(), "foobar"),
            MapCallResult::Timeout => panic!("unexpected timeout"),
        }
    }

    #[test]
    fn reading_a_property_off_undefined_reports_the_legacy_wording() {
        let sources = vec!["function(doc, meta) { emit(doc.foo.bar, meta.id); }".to_string()];
        let mut ctx = MapContext::compile(&sources).unwrap();
        let result = mapreduce_map(&mut ctx, r#"{"value":1}"#, r#"{"id":"doc1"}"#).unwrap();
        match result {
            MapCallResult::Success(results) => {
                assert_eq!(results[0].as_ref().unwrap_err(), "TypeError: Cannot read property 'bar' of undefined");
            }
            MapCallResult::Timeout => panic!("unexpected timeout"),
        }
    }

    #[test]
    fn normalize_property_access_wording_extracts_property_and_subject() {
        let modern = "TypeError: Cannot read properties of undefined (reading 'bar')";
        assert_eq!(
            normalize_property_access_wording(modern),
            Some("TypeError: Cannot read property 'bar' of undefined".to_string())
        );
    }

    #[test]
    fn normalize_property_access_wording_leaves_unrelated_messages_alone() {
        assert_eq!(normalize_property_access_wording("TypeError: foo is not a function"), None);
    }

    #[test]
    fn syntax_error_never_produces_a_context() {
        let sources = vec!["function(doc, meta) { this is not js".to_string()];
        assert!(matches!(MapContext::compile(&sources), Err(MapError::SyntaxError(_))));
    }

    #[test]
    fn result_list_length_matches_function_count() {
        let sources = vec![
            "function(doc, meta) { emit(meta.id, 1); }".to_string(),
            "function(doc, meta) { emit(meta.id, 2); }".to_string(),
        ];
        let mut ctx = MapContext::compile(&sources).unwrap();
        let result = mapreduce_map(&mut ctx, "{}", r#"{"id":"x"}"#).unwrap();
        match result {
            MapCallResult::Success(results) => assert_eq!(results.len(), 2),
            MapCallResult::Timeout => panic!("unexpected timeout"),
        }
    }
}
