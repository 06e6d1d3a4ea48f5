//! Host-injected helpers available to every map function:
//! `emit`, `sum`, `decodeBase64`, `dateToArray`.

use std::cell::RefCell;
use std::rc::Rc;

use base64::Engine as _;
use boa_engine::object::builtins::JsArray;
use boa_engine::object::FunctionObjectBuilder;
use boa_engine::property::Attribute;
use boa_engine::{js_string, Context, JsNativeError, JsResult, JsValue, NativeFunction};

pub type Accumulator = Rc<RefCell<Vec<(String, String)>>>;

/// Installs `emit`, `sum`, `decodeBase64`, and `dateToArray` as global
/// functions in `context`. `accumulator` is shared with the caller so it
/// can be drained after each invocation.
pub fn install_prelude(context: &mut Context, accumulator: Accumulator) -> JsResult<()> {
    register_emit(context, accumulator)?;
    register_sum(context)?;
    register_decode_base64(context)?;
    register_date_to_array(context)?;
    Ok(())
}

fn to_json_string(value: &JsValue, context: &mut Context) -> JsResult<String> {
    let json = value.to_json(context)?;
    Ok(serde_json::to_string(&json).unwrap_or_else(|_| "null".to_string()))
}

fn register_emit(context: &mut Context, accumulator: Accumulator) -> JsResult<()> {
    let func = NativeFunction::from_closure(move |_this, args, context| {
        let key = args.first().cloned().unwrap_or_default();
        let value = args.get(1).cloned().unwrap_or_default();
        let key_json = to_json_string(&key, context)?;
        let value_json = to_json_string(&value, context)?;
        accumulator.borrow_mut().push((key_json, value_json));
        Ok(JsValue::undefined())
    });
    let emit = FunctionObjectBuilder::new(context.realm(), func).name("emit").length(2).build();
    context.register_global_property(js_string!("emit"), emit, Attribute::all())?;
    Ok(())
}

fn register_sum(context: &mut Context) -> JsResult<()> {
    let func = NativeFunction::from_closure(|_this, args, context| {
        let arg = args.first().cloned().unwrap_or_default();
        let json = arg.to_json(context)?;
        let items = json
            .as_array()
            .ok_or_else(|| JsNativeError::typ().with_message("sum: argument is not an array"))?;
        let mut total = 0.0f64;
        for item in items {
            let n = item
                .as_f64()
                .ok_or_else(|| JsNativeError::typ().with_message("sum: array element is not a number"))?;
            total += n;
        }
        Ok(JsValue::from(total))
    });
    let sum = FunctionObjectBuilder::new(context.realm(), func).name("sum").length(1).build();
    context.register_global_property(js_string!("sum"), sum, Attribute::all())?;
    Ok(())
}

fn register_decode_base64(context: &mut Context) -> JsResult<()> {
    let func = NativeFunction::from_closure(|_this, args, context| {
        let arg = args.first().cloned().unwrap_or_default();
        let s = arg.to_string(context)?.to_std_string_escaped();
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(s.as_bytes())
            .map_err(|e| JsNativeError::typ().with_message(format!("decodeBase64: {e}")))?;
        let values: Vec<JsValue> = bytes.into_iter().map(|b| JsValue::from(i32::from(b))).collect();
        let array = JsArray::from_iter(values, context);
        Ok(JsValue::from(array))
    });
    let decode_base64 = FunctionObjectBuilder::new(context.realm(), func).name("decodeBase64").length(1).build();
    context.register_global_property(js_string!("decodeBase64"), decode_base64, Attribute::all())?;
    Ok(())
}

fn register_date_to_array(context: &mut Context) -> JsResult<()> {
    let func = NativeFunction::from_closure(|_this, args, context| {
        let arg = args.first().cloned().unwrap_or_default();
        let s = arg.to_string(context)?.to_std_string_escaped();
        let parts = parse_iso8601(&s)
            .ok_or_else(|| JsNativeError::typ().with_message(format!("dateToArray: invalid date {s}")))?;
        let values: Vec<JsValue> = parts.into_iter().map(JsValue::from).collect();
        let array = JsArray::from_iter(values, context);
        Ok(JsValue::from(array))
    });
    let date_to_array = FunctionObjectBuilder::new(context.realm(), func).name("dateToArray").length(1).build();
    context.register_global_property(js_string!("dateToArray"), date_to_array, Attribute::all())?;
    Ok(())
}

/// Parses `YYYY-MM-DDTHH:MM:SS[.sss]Z`, where `YYYY` may be a signed,
/// variable-width extended year (`+033658`, `-000001`), and returns
/// `[year, month, day, hour, minute, second]` with a 1-based month.
fn parse_iso8601(s: &str) -> Option<[i64; 6]> {
    let (date_part, time_part) = s.split_once('T')?;
    let time_part = time_part.strip_suffix('Z').unwrap_or(time_part);
    let time_part = time_part.split('.').next().unwrap_or(time_part);

    let (sign, digits) = match date_part.as_bytes().first()? {
        b'+' => (1i64, &date_part[1..]),
        b'-' => (-1i64, &date_part[1..]),
        _ => (1i64, date_part),
    };
    let mut fields = digits.rsplitn(3, '-');
    let day: i64 = fields.next()?.parse().ok()?;
    let month: i64 = fields.next()?.parse().ok()?;
    let year_digits = fields.next()?;
    let year: i64 = sign * year_digits.parse::<i64>().ok()?;

    let mut time_fields = time_part.splitn(3, ':');
    let hour: i64 = time_fields.next()?.parse().ok()?;
    let minute: i64 = time_fields.next()?.parse().ok()?;
    let second: i64 = time_fields.next()?.parse().ok()?;

    Some([year, month, day, hour, minute, second])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extended_positive_year() {
        let parsed = parse_iso8601("+033658-09-27T01:46:40.000Z").unwrap();
        assert_eq!(parsed, [33658, 9, 27, 1, 46, 40]);
    }

    #[test]
    fn parses_ordinary_year() {
        let parsed = parse_iso8601("2024-01-02T03:04:05Z").unwrap();
        assert_eq!(parsed, [2024, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn parses_negative_year() {
        let parsed = parse_iso8601("-000001-06-15T00:00:00.000Z").unwrap();
        assert_eq!(parsed, [-1, 6, 15, 0, 0, 0]);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_iso8601("not-a-date").is_none());
    }
}
