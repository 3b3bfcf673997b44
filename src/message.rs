use crate::value::{FieldValue, TypeCode};
use indexmap::IndexMap;
use thiserror::Error;

/// Errors from the typed accessor surface. The original platform accessors
/// returned status codes that callers routinely discarded; here every
/// mutation is checked and the enclosing user action aborts on failure.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("field {name:?} not found")]
    FieldNotFound { name: String },
    #[error("index {index} out of range for field {name:?} ({count} values)")]
    IndexOutOfRange {
        name: String,
        index: usize,
        count: usize,
    },
    #[error("type mismatch for field {name:?}: field holds {expected}, value is {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// (name, type, count) triple returned by the indexed field enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: String,
    pub type_code: TypeCode,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq)]
struct Field {
    type_code: TypeCode,
    values: Vec<FieldValue>,
}

/// An ordered, typed key/value container. Each field name maps to one or
/// more values of a single type; values are addressed by zero-based index.
/// Nested messages are owned copies, so the structure is always a tree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArchiveMessage {
    what: u32,
    fields: IndexMap<String, Field>,
}

impl ArchiveMessage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_what(what: u32) -> Self {
        Self {
            what,
            fields: IndexMap::new(),
        }
    }

    /// The message type discriminator ('what' in the original format).
    pub fn what(&self) -> u32 {
        self.what
    }

    pub fn set_what(&mut self, what: u32) {
        self.what = what;
    }

    pub fn count_names(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Indexed field enumeration, in insertion order.
    pub fn field_info(&self, index: usize) -> Option<FieldInfo> {
        self.fields
            .get_index(index)
            .map(|(name, field)| FieldInfo {
                name: name.clone(),
                type_code: field.type_code,
                count: field.values.len(),
            })
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn count_values(&self, name: &str) -> usize {
        self.fields.get(name).map_or(0, |f| f.values.len())
    }

    pub fn type_of(&self, name: &str) -> Option<TypeCode> {
        self.fields.get(name).map(|f| f.type_code)
    }

    pub fn find(&self, name: &str, index: usize) -> Option<&FieldValue> {
        self.fields.get(name).and_then(|f| f.values.get(index))
    }

    pub fn find_message(&self, name: &str, index: usize) -> Option<&ArchiveMessage> {
        self.find(name, index).and_then(FieldValue::as_message)
    }

    pub fn find_bool(&self, name: &str, index: usize) -> Option<bool> {
        match self.find(name, index) {
            Some(FieldValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn find_int32(&self, name: &str, index: usize) -> Option<i32> {
        match self.find(name, index) {
            Some(FieldValue::Int32(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn find_str(&self, name: &str, index: usize) -> Option<&str> {
        self.find(name, index).and_then(FieldValue::as_str)
    }

    /// Append a value. The field is created on first use; subsequent values
    /// must match the established type.
    pub fn add(&mut self, name: &str, value: FieldValue) -> Result<(), MessageError> {
        let type_code = value.type_code();
        match self.fields.get_mut(name) {
            Some(field) => {
                if field.type_code != type_code {
                    return Err(MessageError::TypeMismatch {
                        name: name.to_string(),
                        expected: field.type_code.type_name(),
                        found: type_code.type_name(),
                    });
                }
                field.values.push(value);
            }
            None => {
                self.fields.insert(
                    name.to_string(),
                    Field {
                        type_code,
                        values: vec![value],
                    },
                );
            }
        }
        Ok(())
    }

    /// Replace a value in place. Fails if the field does not exist, the index
    /// is out of range, or the replacement has a different type.
    pub fn replace(
        &mut self,
        name: &str,
        index: usize,
        value: FieldValue,
    ) -> Result<(), MessageError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| MessageError::FieldNotFound {
                name: name.to_string(),
            })?;
        if field.type_code != value.type_code() {
            return Err(MessageError::TypeMismatch {
                name: name.to_string(),
                expected: field.type_code.type_name(),
                found: value.type_code().type_name(),
            });
        }
        let count = field.values.len();
        let slot = field
            .values
            .get_mut(index)
            .ok_or(MessageError::IndexOutOfRange {
                name: name.to_string(),
                index,
                count,
            })?;
        *slot = value;
        Ok(())
    }

    /// Remove one value; the field disappears when its last value goes.
    pub fn remove_value(&mut self, name: &str, index: usize) -> Result<(), MessageError> {
        let field = self
            .fields
            .get_mut(name)
            .ok_or_else(|| MessageError::FieldNotFound {
                name: name.to_string(),
            })?;
        let count = field.values.len();
        if index >= count {
            return Err(MessageError::IndexOutOfRange {
                name: name.to_string(),
                index,
                count,
            });
        }
        field.values.remove(index);
        if field.values.is_empty() {
            // shift_remove keeps the enumeration order of the other fields
            self.fields.shift_remove(name);
        }
        Ok(())
    }

    pub fn remove_field(&mut self, name: &str) -> Result<(), MessageError> {
        self.fields
            .shift_remove(name)
            .map(|_| ())
            .ok_or_else(|| MessageError::FieldNotFound {
                name: name.to_string(),
            })
    }

    /// Delete all fields, keeping the 'what' type.
    pub fn make_empty(&mut self) {
        self.fields.clear();
    }

    pub fn values(&self, name: &str) -> &[FieldValue] {
        self.fields.get(name).map_or(&[], |f| f.values.as_slice())
    }

    pub fn flattened_size(&self) -> usize {
        crate::wire::flatten(self).len()
    }
}
