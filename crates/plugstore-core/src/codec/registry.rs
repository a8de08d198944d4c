//! Record type registry and the envelope encoder/decoder.

use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};

use super::value::{DynRecord, Persist, Value};
use super::{ENTRIES_KEY, FIELDS_KEY, FLOAT_TAG, FLOAT_VALUE_KEY, MAP_TAG, RESERVED_TAGS, TYPE_KEY};
use crate::error::{Result, StoreError};

type DecodeFn = fn(serde_json::Value) -> serde_json::Result<Box<dyn DynRecord>>;

#[derive(Debug)]
struct Registration {
    type_id: TypeId,
    type_name: &'static str,
    decode: DecodeFn,
}

fn decode_record<T: Persist>(fields: serde_json::Value) -> serde_json::Result<Box<dyn DynRecord>> {
    let record: T = serde_json::from_value(fields)?;
    Ok(Box::new(record))
}

/// Maps type tags to the record types they decode into.
///
/// Both directions go through the registry: a record whose tag is not
/// registered is refused at encode time, so nothing is persisted that this
/// registry could not read back.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: HashMap<&'static str, Registration>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` under `T::TYPE_TAG`.
    ///
    /// Registering the same type twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Codec` if:
    /// - The tag is empty or reserved by the encoding
    /// - The tag is already registered for a different type
    pub fn register<T: Persist>(&mut self) -> Result<&mut Self> {
        let tag = T::TYPE_TAG;
        if tag.is_empty() || RESERVED_TAGS.contains(&tag) {
            return Err(StoreError::Codec(format!("Type tag `{}` is reserved", tag)));
        }

        if let Some(existing) = self.types.get(tag) {
            if existing.type_id == TypeId::of::<T>() {
                return Ok(self);
            }
            return Err(StoreError::Codec(format!(
                "Type tag `{}` already registered for {}",
                tag, existing.type_name
            )));
        }

        self.types.insert(
            tag,
            Registration {
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                decode: decode_record::<T>,
            },
        );
        Ok(self)
    }

    /// Builder form of [`TypeRegistry::register`].
    pub fn with<T: Persist>(mut self) -> Result<Self> {
        self.register::<T>()?;
        Ok(self)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// Registered tags, sorted.
    pub fn tags(&self) -> Vec<&'static str> {
        let mut tags: Vec<_> = self.types.keys().copied().collect();
        tags.sort_unstable();
        tags
    }

    /// Encode a value into its self-describing text form.
    pub fn encode(&self, value: &Value) -> Result<String> {
        let json = self.encode_json(value)?;
        Ok(serde_json::to_string(&json)?)
    }

    /// Decode a payload produced by [`TypeRegistry::encode`].
    pub fn decode(&self, payload: &str) -> Result<Value> {
        let json: serde_json::Value = serde_json::from_str(payload)?;
        self.decode_json(json)
    }

    fn encode_json(&self, value: &Value) -> Result<serde_json::Value> {
        let json = match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => match serde_json::Number::from_f64(*f) {
                Some(number) => serde_json::Value::Number(number),
                None => envelope(
                    FLOAT_TAG,
                    FLOAT_VALUE_KEY,
                    serde_json::Value::from(non_finite_name(*f)),
                ),
            },
            Value::Str(s) => serde_json::Value::String(s.clone()),
            Value::List(items) => serde_json::Value::Array(
                items
                    .iter()
                    .map(|item| self.encode_json(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Map(entries) => {
                let mut object = serde_json::Map::with_capacity(entries.len());
                for (key, item) in entries {
                    object.insert(key.clone(), self.encode_json(item)?);
                }
                if object.contains_key(TYPE_KEY) {
                    envelope(MAP_TAG, ENTRIES_KEY, serde_json::Value::Object(object))
                } else {
                    serde_json::Value::Object(object)
                }
            }
            Value::Record(record) => {
                let tag = record.type_tag();
                let registration = self
                    .types
                    .get(tag)
                    .ok_or_else(|| StoreError::UnknownType(tag.to_string()))?;
                if registration.type_id != record.as_any().type_id() {
                    return Err(StoreError::Codec(format!(
                        "Type tag `{}` is registered for {}, not this record",
                        tag, registration.type_name
                    )));
                }
                let fields = record.fields()?;
                // serde_json writes non-finite floats as null; refuse fields
                // that would not read back as the same record.
                let restored = (registration.decode)(fields.clone()).map_err(|e| {
                    StoreError::Codec(format!("Record `{}` does not read back: {}", tag, e))
                })?;
                if !restored.eq_dyn(&**record) {
                    return Err(StoreError::Codec(format!(
                        "Record `{}` does not read back as the same value",
                        tag
                    )));
                }
                envelope(tag, FIELDS_KEY, fields)
            }
        };
        Ok(json)
    }

    fn decode_json(&self, json: serde_json::Value) -> Result<Value> {
        let value = match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if n.is_u64() {
                    return Err(StoreError::Codec(format!("Integer {} out of range", n)));
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::Str(s),
            serde_json::Value::Array(items) => Value::List(
                items
                    .into_iter()
                    .map(|item| self.decode_json(item))
                    .collect::<Result<Vec<_>>>()?,
            ),
            serde_json::Value::Object(mut object) => match object.remove(TYPE_KEY) {
                None => Value::Map(self.decode_entries(object)?),
                Some(serde_json::Value::String(tag)) => self.decode_envelope(&tag, object)?,
                Some(other) => {
                    return Err(StoreError::Codec(format!(
                        "`{}` must be a string, got {}",
                        TYPE_KEY, other
                    )))
                }
            },
        };
        Ok(value)
    }

    fn decode_entries(
        &self,
        object: serde_json::Map<String, serde_json::Value>,
    ) -> Result<BTreeMap<String, Value>> {
        let mut entries = BTreeMap::new();
        for (key, item) in object {
            entries.insert(key, self.decode_json(item)?);
        }
        Ok(entries)
    }

    fn decode_envelope(
        &self,
        tag: &str,
        mut object: serde_json::Map<String, serde_json::Value>,
    ) -> Result<Value> {
        match tag {
            MAP_TAG => match object.remove(ENTRIES_KEY) {
                Some(serde_json::Value::Object(entries)) => {
                    Ok(Value::Map(self.decode_entries(entries)?))
                }
                _ => Err(StoreError::Codec(format!(
                    "Map envelope is missing `{}`",
                    ENTRIES_KEY
                ))),
            },
            FLOAT_TAG => match object.remove(FLOAT_VALUE_KEY) {
                Some(serde_json::Value::String(name)) => parse_non_finite(&name)
                    .map(Value::Float)
                    .ok_or_else(|| StoreError::Codec(format!("Invalid float `{}`", name))),
                _ => Err(StoreError::Codec(format!(
                    "Float envelope is missing `{}`",
                    FLOAT_VALUE_KEY
                ))),
            },
            _ => {
                let registration = self
                    .types
                    .get(tag)
                    .ok_or_else(|| StoreError::UnknownType(tag.to_string()))?;
                let fields = object.remove(FIELDS_KEY).ok_or_else(|| {
                    StoreError::Codec(format!("Record `{}` is missing `{}`", tag, FIELDS_KEY))
                })?;
                let record = (registration.decode)(fields).map_err(|e| {
                    StoreError::Codec(format!("Failed to decode record `{}`: {}", tag, e))
                })?;
                Ok(Value::Record(record))
            }
        }
    }
}

fn envelope(tag: &str, key: &str, body: serde_json::Value) -> serde_json::Value {
    let mut object = serde_json::Map::with_capacity(2);
    object.insert(TYPE_KEY.to_string(), serde_json::Value::from(tag));
    object.insert(key.to_string(), body);
    serde_json::Value::Object(object)
}

fn non_finite_name(f: f64) -> &'static str {
    if f.is_nan() {
        "NaN"
    } else if f.is_sign_positive() {
        "inf"
    } else {
        "-inf"
    }
}

fn parse_non_finite(name: &str) -> Option<f64> {
    match name {
        "NaN" => Some(f64::NAN),
        "inf" => Some(f64::INFINITY),
        "-inf" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}
