/*
 *  deutils.rs
 *
 *  NowPanel - touch now playing display
 *  (c) 2020-26 Stuart Hunter
 *
 *  Lenient JSON value coercion and duration formatting
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use serde_json::Value;

/// First non-null value found at any of the dotted `paths` ("song.title").
pub fn lookup<'a>(root: &'a Value, paths: &[&str]) -> Option<&'a Value> {
    paths.iter().find_map(|path| {
        let mut node = root;
        for key in path.split('.') {
            node = node.get(key)?;
        }
        (!node.is_null()).then_some(node)
    })
}

/// Strings as-is, numbers and booleans rendered; anything else is absent.
pub fn value_as_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numbers, or strings holding a number.
pub fn value_as_f64(v: &Value) -> Option<f64> {
    v.as_f64()
        .or_else(|| v.as_str().and_then(|s| s.trim().parse::<f64>().ok()))
        .filter(|n| n.is_finite())
}

/// Booleans, non-zero numbers, and the usual string spellings.
pub fn value_as_bool(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "y" | "t" | "on" => Some(true),
            "0" | "false" | "no" | "n" | "f" | "off" | "" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Converts total seconds (f32) into a "HH:MM:SS" or "MM:SS" duration string.
/// If hours is zero, only MM:SS is surfaced.
pub fn seconds_to_hms(total_seconds: f32) -> String {
    let total_seconds_u32 = total_seconds.max(0.0) as u32;
    let hours = total_seconds_u32 / 3600;
    let minutes = (total_seconds_u32 % 3600) / 60;
    let seconds = total_seconds_u32 % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}
