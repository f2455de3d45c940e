//! The capability shared by single DTOs and lists of DTOs.
use std::{any::Any, fmt::Debug, io::Read};

use serde_json::Value;
use snafu::Snafu;

use crate::{
    format::{self, FormatError},
    populate::{self, PopulateError, PopulateOptions},
};

/// The error type for [`Dto::absorb`].
#[derive(Debug, PartialEq, Eq, Snafu)]
pub enum AbsorbError {
    #[snafu(display("a {target} cannot absorb the values from a {source_type} ({source_value})"))]
    IncompatibleType {
        target: &'static str,
        source_type: &'static str,
        source_value: String,
    },
}

/// A generic data transfer object.
///
/// Implemented by every [`#[derive(Fielder)]`](derive@crate::Fielder) type,
/// by [`DtoList`](crate::DtoList) and by [`StringList`](crate::StringList).
/// The trait is object safe, so heterogeneous DTOs can be handled as
/// `&mut dyn Dto`.
pub trait Dto: Debug + Any {
    /// The name of the concrete type, as reported in errors and logs.
    fn dto_type_name(&self) -> &'static str;

    /// Populates `self` from an already-parsed JSON value. Single DTOs expect
    /// an object, lists expect an array.
    fn populate_value(
        &mut self,
        value: Value,
        options: &PopulateOptions,
    ) -> Result<(), PopulateError>;

    /// The presence-aware JSON form of `self`.
    fn marshal_value(&self) -> Value;

    /// Replaces the entire value of `self` (including presence) with the value
    /// of `other`, which must be of the same concrete type. `self` is left
    /// unmodified on error.
    fn absorb(&mut self, other: &dyn Dto) -> Result<(), AbsorbError>;

    /// Human-readable rendering, for logging and debugging.
    fn format_text(&self) -> String;

    fn as_any(&self) -> &dyn Any;

    /// Reads a JSON body from `reader` and populates `self` from it. See
    /// [`read_populate`](crate::read_populate).
    fn populate(&mut self, reader: &mut dyn Read) -> Result<(), PopulateError> {
        populate::read_populate(reader, self)
    }

    /// Indented JSON rendering, for logging and debugging.
    fn format_json(&self) -> String {
        format::format_json(self)
    }

    /// Presence-aware JSON encoding, suitable for sending to a peer.
    fn marshal_json(&self) -> Result<Vec<u8>, FormatError> {
        format::marshal_json(self)
    }
}

/// Replaces `target` with a clone of `other`, if `other` is a `T`.
///
/// This is the shared implementation of [`Dto::absorb`].
pub fn absorb_from<T>(target: &mut T, other: &dyn Dto) -> Result<(), AbsorbError>
where
    T: Dto + Clone,
{
    match other.as_any().downcast_ref::<T>() {
        Some(like) => {
            target.clone_from(like);
            Ok(())
        }
        None => IncompatibleTypeSnafu {
            target: target.dto_type_name(),
            source_type: other.dto_type_name(),
            source_value: format!("{other:?}"),
        }
        .fail(),
    }
}
