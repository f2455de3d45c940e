use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod field_enum;
mod fielder;
mod path_overrides;
mod rename;

/// Derives the swaggering DTO traits for a struct with named fields.
///
/// Generates implementations of `Schema` (and thus `Fielder`), `FieldValue`,
/// `Dto` and `serde::Serialize`. The struct must implement `Clone`, `Debug`
/// and `Default`, and must hold exactly one `Presence` field marked with
/// `#[fielder(presence)]`. Every other field must implement `FieldValue`.
///
/// The wire name of a field is its identifier in `camelCase`. Fields can also
/// be addressed by their `PascalCase` exported name and by their Rust
/// identifier.
///
/// ## Container attributes
///
/// - `#[fielder(rename = "...")]` overrides the type name reported in errors
///   and text output.
/// - `#[fielder(rename_all = "...")]` changes how wire names are derived. One
///   of `camelCase`, `PascalCase`, `snake_case`, `SCREAMING_SNAKE_CASE`,
///   `kebab-case` or `lowercase`.
/// - `#[fielder(path_overrides(swaggering = "..."))]` changes the path the
///   generated code uses to refer to this crate.
///
/// ## Field attributes
///
/// - `#[fielder(presence)]` marks the presence tracker.
/// - `#[fielder(rename = "...")]` sets the wire name.
/// - `#[fielder(alias = "...")]` adds another accepted name, and can be
///   repeated.
/// - `#[fielder(skip)]` excludes the field from population and marshalling.
///   Skipped fields keep their value when the DTO is populated again.
///
/// ```
/// use swaggering::{Fielder, Presence};
///
/// #[derive(Clone, Debug, Default, Fielder)]
/// struct SingularityTaskId {
///     #[fielder(presence)]
///     presence: Presence,
///     request_id: String,
///     #[fielder(rename = "instanceNo", alias = "instance")]
///     instance: i32,
/// }
/// ```
#[proc_macro_derive(Fielder, attributes(fielder))]
pub fn derive_fielder(input: TokenStream) -> TokenStream {
    fielder::derive(parse_macro_input!(input as DeriveInput)).into()
}

/// Derives `FieldValue`, `Display` and `serde::Serialize` for an enum of unit
/// variants, which is encoded as a JSON string.
///
/// Wire names default to `SCREAMING_SNAKE_CASE`. The Rust variant name is
/// accepted as well. Also generates `as_str` and a `VARIANTS` constant.
///
/// Supports the same `rename`, `rename_all` and `path_overrides` container
/// attributes as [`Fielder`](derive@Fielder), and `rename` and `alias` on
/// variants, all under `#[field_enum(...)]`.
#[proc_macro_derive(FieldEnum, attributes(field_enum))]
pub fn derive_field_enum(input: TokenStream) -> TokenStream {
    field_enum::derive(parse_macro_input!(input as DeriveInput)).into()
}
