//! `Date` constructor and `Date.prototype` (spec §4.4; supplemented per
//! SPEC_FULL.md §3 from `test_date_object.cpp`). Internally a `Date` is a
//! millisecond-precision Unix timestamp (`NaN` for an invalid date),
//! mirroring the teacher's own epoch-based `datetime_types.rs` model but
//! at millisecond rather than microsecond resolution.

use chrono::{Datelike, Duration, TimeZone, Timelike, Utc};

use super::{global_binding, link_ctor_proto, method, native_fn_ctor, require_class};
use crate::{
    evaluator::Evaluator,
    exception::RunResult,
    heap::{Heap, HeapId},
    object::{ClassTag, InternalSlots},
    value::Value,
    version::Version,
};

fn arg(args: &[Value], i: usize) -> Value {
    args.get(i).copied().unwrap_or(Value::Undefined)
}

pub(super) fn install(heap: &mut Heap, version: Version, function_prototype: HeapId, date_prototype: HeapId, global: HeapId) {
    let ctor = native_fn_ctor(heap, function_prototype, "Date", 7, call, Some(construct));
    link_ctor_proto(heap, ctor, date_prototype);
    method(heap, function_prototype, ctor, "parse", 1, parse);
    method(heap, function_prototype, ctor, "now", 0, now);

    method(heap, function_prototype, date_prototype, "toString", 0, to_string);
    method(heap, function_prototype, date_prototype, "valueOf", 0, get_time);
    method(heap, function_prototype, date_prototype, "getTime", 0, get_time);
    method(heap, function_prototype, date_prototype, "setTime", 1, set_time);
    method(heap, function_prototype, date_prototype, "getFullYear", 0, get_full_year);
    method(heap, function_prototype, date_prototype, "getMonth", 0, get_month);
    method(heap, function_prototype, date_prototype, "getDate", 0, get_date);
    method(heap, function_prototype, date_prototype, "getDay", 0, get_day);
    method(heap, function_prototype, date_prototype, "getHours", 0, get_hours);
    method(heap, function_prototype, date_prototype, "getMinutes", 0, get_minutes);
    method(heap, function_prototype, date_prototype, "getSeconds", 0, get_seconds);
    method(heap, function_prototype, date_prototype, "getMilliseconds", 0, get_milliseconds);
    if version.has_accessors() {
        method(heap, function_prototype, date_prototype, "toISOString", 0, to_iso_string);
    }

    global_binding(heap, global, "Date", Value::Object(ctor), true);
}

fn call(ev: &mut Evaluator, _this: Value, _args: &[Value]) -> RunResult<Value> {
    Ok(ev.string_value(&format_date(now_millis())))
}

fn construct(ev: &mut Evaluator, args: &[Value]) -> RunResult<Value> {
    let ms = match args.len() {
        0 => now_millis(),
        1 => match arg(args, 0) {
            Value::Str(_) | Value::Object(_) => {
                let v = arg(args, 0);
                let v = ev.to_primitive(v, true)?;
                match v {
                    Value::Str(sid) => {
                        let s = ev.read_string(sid);
                        parse_date_string(&s).unwrap_or(f64::NAN)
                    }
                    other => ev.to_number(other)?,
                }
            }
            other => ev.to_number(other)?,
        },
        _ => {
            let year = ev.to_number(arg(args, 0))?;
            let year = if (0.0..=99.0).contains(&year) { 1900.0 + year } else { year };
            let month = ev.to_number(arg(args, 1))?;
            let day = match arg(args, 2) {
                Value::Undefined => 1.0,
                v => ev.to_number(v)?,
            };
            let hours = match arg(args, 3) {
                Value::Undefined => 0.0,
                v => ev.to_number(v)?,
            };
            let minutes = match arg(args, 4) {
                Value::Undefined => 0.0,
                v => ev.to_number(v)?,
            };
            let seconds = match arg(args, 5) {
                Value::Undefined => 0.0,
                v => ev.to_number(v)?,
            };
            let millis = match arg(args, 6) {
                Value::Undefined => 0.0,
                v => ev.to_number(v)?,
            };
            from_components(year, month, day, hours, minutes, seconds, millis)
        }
    };
    let proto = Some(ev.realm.date_prototype);
    Ok(Value::Object(ev.alloc_object_with(ClassTag::Date, proto, InternalSlots::DateBox(ms))))
}

#[allow(clippy::too_many_arguments)]
fn from_components(year: f64, month: f64, day: f64, hours: f64, minutes: f64, seconds: f64, millis: f64) -> f64 {
    if [year, month, day, hours, minutes, seconds, millis].iter().any(|n| n.is_nan()) {
        return f64::NAN;
    }
    let total_months = year as i64 * 12 + month as i64;
    let y = total_months.div_euclid(12);
    let m = total_months.rem_euclid(12);
    let Some(base) = Utc.with_ymd_and_hms(y as i32, (m + 1) as u32, 1, 0, 0, 0).single() else {
        return f64::NAN;
    };
    let dt = base + Duration::days(day as i64 - 1)
        + Duration::hours(hours as i64)
        + Duration::minutes(minutes as i64)
        + Duration::seconds(seconds as i64)
        + Duration::milliseconds(millis as i64);
    dt.timestamp_millis() as f64
}

fn now_millis() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// Accepts the subset of date strings this engine is required to parse:
/// ISO 8601 (`toISOString` output) and RFC 2822-ish outputs of
/// [`format_date`]. Anything else is an invalid date, matching the
/// documented simplification for `Date.parse`.
fn parse_date_string(s: &str) -> Option<f64> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.timestamp_millis() as f64);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(ndt.and_utc().timestamp_millis() as f64);
    }
    None
}

fn parse(ev: &mut Evaluator, _this: Value, args: &[Value]) -> RunResult<Value> {
    let id = ev.to_string_value(arg(args, 0))?;
    let s = ev.read_string(id);
    Ok(Value::Number(parse_date_string(&s).unwrap_or(f64::NAN)))
}

fn now(_ev: &mut Evaluator, _this: Value, _args: &[Value]) -> RunResult<Value> {
    Ok(Value::Number(now_millis()))
}

fn this_millis(ev: &mut Evaluator, this: Value) -> RunResult<f64> {
    let id = require_class(ev, this, ClassTag::Date, "Date.prototype method")?;
    let InternalSlots::DateBox(ms) = ev.heap.obj(id).internal else {
        return Err(ev.throw_type("Date.prototype method called on incompatible receiver"));
    };
    Ok(ms)
}

fn to_utc(ms: f64) -> Option<chrono::DateTime<Utc>> {
    if ms.is_nan() {
        return None;
    }
    Utc.timestamp_millis_opt(ms as i64).single()
}

fn format_date(ms: f64) -> String {
    match to_utc(ms) {
        Some(dt) => dt.format("%a %b %e %Y %H:%M:%S GMT+0000").to_string(),
        None => "Invalid Date".to_string(),
    }
}

fn to_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let ms = this_millis(ev, this)?;
    Ok(ev.string_value(&format_date(ms)))
}

fn to_iso_string(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    let ms = this_millis(ev, this)?;
    match to_utc(ms) {
        Some(dt) => Ok(ev.string_value(&dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string())),
        None => Err(ev.throw_range("Invalid Date")),
    }
}

fn get_time(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
    Ok(Value::Number(this_millis(ev, this)?))
}

fn set_time(ev: &mut Evaluator, this: Value, args: &[Value]) -> RunResult<Value> {
    let id = require_class(ev, this, ClassTag::Date, "Date.prototype.setTime")?;
    let ms = ev.to_number(arg(args, 0))?;
    ev.heap.obj_mut(id).internal = InternalSlots::DateBox(ms);
    Ok(Value::Number(ms))
}

macro_rules! field_getter {
    ($name:ident, $field:expr) => {
        fn $name(ev: &mut Evaluator, this: Value, _args: &[Value]) -> RunResult<Value> {
            let ms = this_millis(ev, this)?;
            match to_utc(ms) {
                Some(dt) => Ok(Value::Number($field(dt))),
                None => Ok(Value::Number(f64::NAN)),
            }
        }
    };
}

field_getter!(get_full_year, |dt: chrono::DateTime<Utc>| dt.year() as f64);
field_getter!(get_month, |dt: chrono::DateTime<Utc>| (dt.month() - 1) as f64);
field_getter!(get_date, |dt: chrono::DateTime<Utc>| dt.day() as f64);
field_getter!(get_day, |dt: chrono::DateTime<Utc>| dt.weekday().num_days_from_sunday() as f64);
field_getter!(get_hours, |dt: chrono::DateTime<Utc>| dt.hour() as f64);
field_getter!(get_minutes, |dt: chrono::DateTime<Utc>| dt.minute() as f64);
field_getter!(get_seconds, |dt: chrono::DateTime<Utc>| dt.second() as f64);
field_getter!(get_milliseconds, |dt: chrono::DateTime<Utc>| (dt.timestamp_subsec_millis()) as f64);
