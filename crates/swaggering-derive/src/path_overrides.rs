use darling::FromMeta;
use syn::{Path, parse_quote};

/// Where generated code finds the runtime crate, for crates that re-export it.
#[derive(FromMeta)]
pub(crate) struct PathOverrides {
    #[darling(default = "PathOverrides::default_swaggering")]
    pub(crate) swaggering: Path,
}

impl Default for PathOverrides {
    fn default() -> Self {
        Self {
            swaggering: Self::default_swaggering(),
        }
    }
}

impl PathOverrides {
    fn default_swaggering() -> Path {
        parse_quote!(::swaggering)
    }
}
