use convert_case::{Case, Casing};
use darling::FromMeta;

/// How Rust identifiers are turned into wire names.
#[derive(Clone, Copy, Debug, FromMeta)]
pub enum RenameRule {
    #[darling(rename = "camelCase")]
    CamelCase,

    #[darling(rename = "PascalCase")]
    PascalCase,

    #[darling(rename = "snake_case")]
    SnakeCase,

    #[darling(rename = "SCREAMING_SNAKE_CASE")]
    ScreamingSnakeCase,

    #[darling(rename = "kebab-case")]
    KebabCase,

    #[darling(rename = "lowercase")]
    Lowercase,
}

impl RenameRule {
    pub fn apply(self, name: &str) -> String {
        match self {
            Self::CamelCase => name.to_case(Case::Camel),
            Self::PascalCase => name.to_case(Case::Pascal),
            Self::SnakeCase => name.to_case(Case::Snake),
            Self::ScreamingSnakeCase => name.to_case(Case::Snake).to_uppercase(),
            Self::KebabCase => name.to_case(Case::Kebab),
            Self::Lowercase => name.to_lowercase(),
        }
    }
}

/// The exported form of a field name, as a struct field would be spelled in
/// PascalCase.
pub fn exported(name: &str) -> String {
    name.to_case(Case::Pascal)
}

/// Collects `candidates` which are distinct from `name` and from each other,
/// keeping the first occurrence.
pub fn distinct_aliases(name: &str, candidates: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut aliases = Vec::new();
    for candidate in candidates {
        if candidate != name && !aliases.contains(&candidate) {
            aliases.push(candidate);
        }
    }
    aliases
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(RenameRule::CamelCase, "request_id", "requestId")]
    #[case(RenameRule::PascalCase, "request_id", "RequestId")]
    #[case(RenameRule::SnakeCase, "RequestId", "request_id")]
    #[case(RenameRule::ScreamingSnakeCase, "FromOffer", "FROM_OFFER")]
    #[case(RenameRule::KebabCase, "request_id", "request-id")]
    #[case(RenameRule::Lowercase, "Literal", "literal")]
    fn rename_rules(#[case] rule: RenameRule, #[case] input: &str, #[case] expected: &str) {
        assert_eq!(rule.apply(input), expected);
    }

    #[test]
    fn aliases_skip_the_name_and_duplicates() {
        let aliases = distinct_aliases(
            "port",
            ["Port", "port", "listenPort", "Port"].map(str::to_owned),
        );
        assert_eq!(aliases, vec!["Port", "listenPort"]);
    }
}
