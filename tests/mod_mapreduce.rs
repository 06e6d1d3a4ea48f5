use seqstore::mapreduce::{mapreduce_map, set_timeout, MapCallResult, MapContext};

const DOC: &str = r#"{"values":[10,-7,20,1],"bin":"aGVsbG8gd29ybGQh","date":"+033658-09-27T01:46:40.000Z"}"#;
const META: &str = r#"{"id":"doc1"}"#;

fn only_emit(result: MapCallResult) -> (String, String) {
    match result {
        MapCallResult::Success(mut results) => {
            let emits = results.remove(0).unwrap();
            assert_eq!(emits.len(), 1);
            emits.into_iter().next().unwrap()
        }
        MapCallResult::Timeout => panic!("unexpected timeout"),
    }
}

#[test]
fn sum_builtin_adds_a_mixed_sign_array() {
    let sources = vec!["function(doc, meta) { emit(meta.id, sum(doc.values)); }".to_string()];
    let mut ctx = MapContext::compile(&sources).unwrap();
    let (key, value) = only_emit(mapreduce_map(&mut ctx, DOC, META).unwrap());
    assert_eq!(key, "\"doc1\"");
    assert_eq!(value, "24");
}

#[test]
fn a_thrown_string_is_reported_verbatim() {
    let sources = vec!["function(doc, meta) { throw('foobar'); }".to_string()];
    let mut ctx = MapContext::compile(&sources).unwrap();
    let result = mapreduce_map(&mut ctx, r#"{"value":1}"#, META).unwrap();
    match result {
        MapCallResult::Success(results) => {
            assert_eq!(results[0].as_ref().unwrap_err(), "foobar");
        }
        MapCallResult::Timeout => panic!("unexpected timeout"),
    }
}

#[test]
fn decode_base64_builtin_recovers_the_original_string() {
    let sources = vec!["function(doc, meta) { emit(meta.id, String.fromCharCode.apply(this, decodeBase64(doc.bin))); }".to_string()];
    let mut ctx = MapContext::compile(&sources).unwrap();
    let (_, value) = only_emit(mapreduce_map(&mut ctx, DOC, META).unwrap());
    assert_eq!(value, "\"hello world!\"");
}

#[test]
fn date_to_array_builtin_matches_the_extended_year_vector() {
    let sources = vec!["function(doc, meta) { emit(meta.id, dateToArray(doc.date)); }".to_string()];
    let mut ctx = MapContext::compile(&sources).unwrap();
    let (_, value) = only_emit(mapreduce_map(&mut ctx, DOC, META).unwrap());
    assert_eq!(value, "[33658,9,27,1,46,40]");
}

#[test]
fn reading_a_property_off_undefined_reports_the_exact_type_error_wording() {
    let sources = vec!["function(doc, meta) { emit(doc.foo.bar, meta.id); }".to_string()];
    let mut ctx = MapContext::compile(&sources).unwrap();
    let result = mapreduce_map(&mut ctx, r#"{"value":1}"#, META).unwrap();
    match result {
        MapCallResult::Success(results) => {
            assert_eq!(results[0].as_ref().unwrap_err(), "TypeError: Cannot read property 'bar' of undefined");
        }
        MapCallResult::Timeout => panic!("unexpected timeout"),
    }
}

#[test]
fn a_timed_out_invocation_does_not_poison_later_calls_on_the_same_context() {
    let sources = vec![
        "function(doc, meta) { while (doc.value === 1) {} emit(meta.id, doc.value); }".to_string(),
    ];
    let mut ctx = MapContext::compile(&sources).unwrap();
    set_timeout(1);

    let first = mapreduce_map(&mut ctx, r#"{"value":1}"#, r#"{"id":"doc1"}"#).unwrap();
    assert_eq!(first, MapCallResult::Timeout);

    set_timeout(5_000);
    let second = mapreduce_map(&mut ctx, r#"{"value":2}"#, r#"{"id":"doc2"}"#).unwrap();
    match second {
        MapCallResult::Success(results) => {
            let emits = results[0].as_ref().unwrap();
            assert_eq!(emits, &[("\"doc2\"".to_string(), "2".to_string())]);
        }
        MapCallResult::Timeout => panic!("second call should not time out"),
    }
}
