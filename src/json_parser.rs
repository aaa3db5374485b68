/*

    Provide utilities to parse scene JSON files.

    The format is lenient the same way our course scenes were:
        - Numbers may be given as strings (e.g. "2") or as is
        - Vector3 fields are "<x> <y> <z>" or [x, y, z]
        - Index and float lists are whitespace separated strings,
          e.g. "0 4 5", or plain JSON arrays
        - Booleans may be true/false, "true"/"false" or 1/0

    e.g. In JSON file both
    "ResolutionU": "3" and "ResolutionU": 3
    work as resolution_u: usize in source code

    @date: 2 Oct, 2025
    @author: bartu
*/

use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use void::Void;
use serde::{Deserialize, Deserializer};
use serde::de::{self, Visitor, MapAccess};
use serde_json::Value;

use crate::numeric::{Float, Vector3};
use crate::scene::{RootScene, SceneError};
use tracing::debug;

pub fn parse_scene_json(path: &Path) -> Result<RootScene, SceneError> {

    let span = tracing::span!(tracing::Level::INFO, "load_scene");
    let _enter = span.enter();

    let file = File::open(path)?;
    let reader = BufReader::new(file);
    debug!("Reading scene from {}", path.display());

    let root: RootScene = serde_json::from_reader(reader)?;
    Ok(root)
}


/// Parse a single number given either as JSON number or as string
fn number_from_value<N>(value: &Value) -> Result<N, String>
where
    N: FromStr,
    N::Err: fmt::Display,
{
    match value {
        // Number's Display keeps integers integral, "3" stays a valid usize
        Value::Number(n) => n.to_string().parse::<N>().map_err(|e| format!("{n}: {e}")),
        Value::String(s) => s.trim().parse::<N>().map_err(|e| format!("'{s}': {e}")),
        other => Err(format!("expected a number or a string, found {other}")),
    }
}

/// Whitespace separated string or JSON array of numbers
fn numbers_from_value<N>(value: &Value) -> Result<Vec<N>, String>
where
    N: FromStr,
    N::Err: fmt::Display,
{
    match value {
        Value::String(s) => s
            .split_whitespace()
            .map(|x| x.parse::<N>().map_err(|e| format!("'{x}': {e}")))
            .collect(),
        Value::Array(items) => items.iter().map(number_from_value).collect(),
        Value::Null => Ok(Vec::new()),
        other => number_from_value(other).map(|n| vec![n]),
    }
}


pub(crate) fn deser_usize<'de, D>(deserializer: D) -> Result<usize, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value).map_err(de::Error::custom)
}

pub(crate) fn deser_float<'de, D>(deserializer: D) -> Result<Float, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    number_from_value(&value).map_err(de::Error::custom)
}

pub(crate) fn deser_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64().is_some_and(|x| x != 0.0)),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" | "" => Ok(false),
            _ => Err(de::Error::custom(format!("invalid bool '{s}'"))),
        },
        other => Err(de::Error::custom(format!("expected a bool, found {other}"))),
    }
}

pub(crate) fn deser_vec3<'de, D>(deserializer: D) -> Result<Vector3, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let v: Vec<Float> = numbers_from_value(&value).map_err(de::Error::custom)?;
    match v.as_slice() {
        [x, y, z] => Ok(Vector3::new(*x, *y, *z)),
        _ => Err(de::Error::custom(format!("expected 3 values for a Vector3, got {}", v.len()))),
    }
}

pub(crate) fn deser_float_vec<'de, D>(deserializer: D) -> Result<Vec<Float>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    numbers_from_value(&value).map_err(de::Error::custom)
}

pub(crate) fn deser_usize_vec<'de, D>(deserializer: D) -> Result<Vec<usize>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    numbers_from_value(&value).map_err(de::Error::custom)
}


pub fn deser_vertex_data<'de, D>(deserializer: D) -> Result<Vec<Vector3>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    parse_string_vecvec3(&s).map_err(de::Error::custom)
}

/// "x y z x y z ..." into points, the count must be a multiple of 3
pub fn parse_string_vecvec3(s: &str) -> Result<Vec<Vector3>, String> {
    let nums: Vec<Float> = numbers_from_value(&Value::String(s.to_string()))?;
    if nums.len() % 3 != 0 {
        return Err(format!("{} values do not form whole Vector3s", nums.len()));
    }
    Ok(nums.chunks_exact(3).map(|c| Vector3::new(c[0], c[1], c[2])).collect())
}


// DISCLAIMER: This function is taken from
// https://serde.rs/string-or-struct.html
pub fn deser_string_or_struct<'de, T, D>(deserializer: D) -> Result<T, D::Error>
where
    T: Deserialize<'de> + FromStr<Err = Void>,
    D: Deserializer<'de>,
{
    // Strings go to T's FromStr, maps to T's Deserialize
    struct StringOrStruct<T>(PhantomData<fn() -> T>);

    impl<'de, T> Visitor<'de> for StringOrStruct<T>
    where
        T: Deserialize<'de> + FromStr<Err = Void>,
    {
        type Value = T;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("string or map")
        }

        fn visit_str<E>(self, value: &str) -> Result<T, E>
        where
            E: de::Error,
        {
            Ok(FromStr::from_str(value).unwrap_or_else(|e| void::unreachable(e)))
        }

        fn visit_map<M>(self, map: M) -> Result<T, M::Error>
        where
            M: MapAccess<'de>,
        {
            Deserialize::deserialize(de::value::MapAccessDeserializer::new(map))
        }
    }

    deserializer.deserialize_any(StringOrStruct(PhantomData))
}
