//! Lists of DTOs, and lists of strings, as top-level request and response
//! bodies.
use std::{
    any::{Any, type_name},
    borrow::Cow,
    ops::{Deref, DerefMut},
};

use serde::{Serialize, Serializer};
use serde_json::Value;
use snafu::ResultExt;

use crate::{
    dto::{AbsorbError, Dto, absorb_from},
    format::serialize_dto,
    populate::{
        ConvertValueSnafu, PopulateElementSnafu, PopulateError, PopulateOptions,
        UnexpectedShapeSnafu,
    },
    value::{FieldValue, JsonKind, ValueError},
};

const STRING_LIST: &str = "StringList";

/// An ordered list of DTOs, populated from a JSON array.
///
/// Element order is preserved by every operation. Populating replaces the
/// whole list, and only once every element was populated successfully.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DtoList<T>(pub Vec<T>);

impl<T> DtoList<T> {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Deref for DtoList<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for DtoList<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> From<Vec<T>> for DtoList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for DtoList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<T> IntoIterator for DtoList<T> {
    type IntoIter = std::vec::IntoIter<T>;
    type Item = T;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a DtoList<T> {
    type IntoIter = std::slice::Iter<'a, T>;
    type Item = &'a T;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T> Dto for DtoList<T>
where
    T: Dto + Default + Clone,
{
    fn dto_type_name(&self) -> &'static str {
        type_name::<Self>()
    }

    fn populate_value(
        &mut self,
        value: Value,
        options: &PopulateOptions,
    ) -> Result<(), PopulateError> {
        let items = match value {
            Value::Null => return Ok(()),
            Value::Array(items) => items,
            other => {
                return UnexpectedShapeSnafu {
                    expected: JsonKind::Array,
                    found: JsonKind::from(&other),
                    type_name: self.dto_type_name(),
                }
                .fail();
            }
        };

        let mut populated = Vec::with_capacity(items.len());
        for (index, item) in items.into_iter().enumerate() {
            let mut element = T::default();
            element
                .populate_value(item, options)
                .map_err(Box::new)
                .context(PopulateElementSnafu { index })?;
            populated.push(element);
        }

        self.0 = populated;
        Ok(())
    }

    fn marshal_value(&self) -> Value {
        Value::Array(self.0.iter().map(Dto::marshal_value).collect())
    }

    fn absorb(&mut self, other: &dyn Dto) -> Result<(), AbsorbError> {
        absorb_from(self, other)
    }

    /// Renders every element on its own line.
    fn format_text(&self) -> String {
        self.0.iter().fold(String::new(), |mut text, element| {
            text.push_str(&element.format_text());
            text.push('\n');
            text
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl<T: FieldValue> FieldValue for DtoList<T> {
    fn type_name() -> Cow<'static, str> {
        Vec::<T>::type_name()
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        Vec::from_field_value(value).map(Self)
    }

    fn to_field_value(&self) -> Value {
        self.0.to_field_value()
    }
}

impl<T> Serialize for DtoList<T>
where
    T: Dto + Default + Clone,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_dto(self, serializer)
    }
}

/// An ordered list of strings, populated from a JSON array of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StringList(pub Vec<String>);

impl StringList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn into_inner(self) -> Vec<String> {
        self.0
    }
}

impl Deref for StringList {
    type Target = Vec<String>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for StringList {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<Vec<String>> for StringList {
    fn from(items: Vec<String>) -> Self {
        Self(items)
    }
}

impl<S: Into<String>> FromIterator<S> for StringList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl Dto for StringList {
    fn dto_type_name(&self) -> &'static str {
        STRING_LIST
    }

    fn populate_value(
        &mut self,
        value: Value,
        _options: &PopulateOptions,
    ) -> Result<(), PopulateError> {
        match value {
            Value::Null => Ok(()),
            value @ Value::Array(_) => {
                self.0 = Vec::from_field_value(value).context(ConvertValueSnafu {
                    type_name: STRING_LIST,
                })?;
                Ok(())
            }
            other => UnexpectedShapeSnafu {
                expected: JsonKind::Array,
                found: JsonKind::from(&other),
                type_name: STRING_LIST,
            }
            .fail(),
        }
    }

    fn marshal_value(&self) -> Value {
        self.0.to_field_value()
    }

    fn absorb(&mut self, other: &dyn Dto) -> Result<(), AbsorbError> {
        absorb_from(self, other)
    }

    /// Renders one string per line.
    fn format_text(&self) -> String {
        self.0.join("\n")
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl FieldValue for StringList {
    fn type_name() -> Cow<'static, str> {
        Cow::Borrowed(STRING_LIST)
    }

    fn from_field_value(value: Value) -> Result<Self, ValueError> {
        Vec::from_field_value(value).map(Self)
    }

    fn to_field_value(&self) -> Value {
        self.0.to_field_value()
    }
}

impl Serialize for StringList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_dto(self, serializer)
    }
}
