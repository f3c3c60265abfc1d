//! Comparison operators and the per-column-type operator catalog

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Comparison operator of a condition, named by its permission-language tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Operator {
    #[default]
    #[serde(rename = "_eq")]
    Eq,
    #[serde(rename = "_neq")]
    Neq,
    #[serde(rename = "_in")]
    In,
    #[serde(rename = "_nin")]
    Nin,
    #[serde(rename = "_gt")]
    Gt,
    #[serde(rename = "_lt")]
    Lt,
    #[serde(rename = "_gte")]
    Gte,
    #[serde(rename = "_lte")]
    Lte,
    #[serde(rename = "_ceq")]
    Ceq,
    #[serde(rename = "_cne")]
    Cne,
    #[serde(rename = "_cgt")]
    Cgt,
    #[serde(rename = "_clt")]
    Clt,
    #[serde(rename = "_cgte")]
    Cgte,
    #[serde(rename = "_clte")]
    Clte,
    #[serde(rename = "_is_null")]
    IsNull,
    #[serde(rename = "_like")]
    Like,
    #[serde(rename = "_nlike")]
    Nlike,
    #[serde(rename = "_ilike")]
    Ilike,
    #[serde(rename = "_nilike")]
    Nilike,
    #[serde(rename = "_similar")]
    Similar,
    #[serde(rename = "_nsimilar")]
    Nsimilar,
    #[serde(rename = "_regex")]
    Regex,
    #[serde(rename = "_nregex")]
    Nregex,
    #[serde(rename = "_iregex")]
    Iregex,
    #[serde(rename = "_niregex")]
    Niregex,
    #[serde(rename = "_contains")]
    Contains,
    #[serde(rename = "_contained_in")]
    ContainedIn,
    #[serde(rename = "_has_key")]
    HasKey,
    #[serde(rename = "_has_keys_any")]
    HasKeysAny,
    #[serde(rename = "_has_keys_all")]
    HasKeysAll,
}

impl Operator {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Eq => "_eq",
            Self::Neq => "_neq",
            Self::In => "_in",
            Self::Nin => "_nin",
            Self::Gt => "_gt",
            Self::Lt => "_lt",
            Self::Gte => "_gte",
            Self::Lte => "_lte",
            Self::Ceq => "_ceq",
            Self::Cne => "_cne",
            Self::Cgt => "_cgt",
            Self::Clt => "_clt",
            Self::Cgte => "_cgte",
            Self::Clte => "_clte",
            Self::IsNull => "_is_null",
            Self::Like => "_like",
            Self::Nlike => "_nlike",
            Self::Ilike => "_ilike",
            Self::Nilike => "_nilike",
            Self::Similar => "_similar",
            Self::Nsimilar => "_nsimilar",
            Self::Regex => "_regex",
            Self::Nregex => "_nregex",
            Self::Iregex => "_iregex",
            Self::Niregex => "_niregex",
            Self::Contains => "_contains",
            Self::ContainedIn => "_contained_in",
            Self::HasKey => "_has_key",
            Self::HasKeysAny => "_has_keys_any",
            Self::HasKeysAll => "_has_keys_all",
        }
    }

    pub fn helper_text(self) -> &'static str {
        match self {
            Self::Eq => "equals",
            Self::Neq => "does not equal",
            Self::In => "in",
            Self::Nin => "not in",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Ceq => "equals column",
            Self::Cne => "does not equal column",
            Self::Cgt => "> column",
            Self::Clt => "< column",
            Self::Cgte => ">= column",
            Self::Clte => "<= column",
            Self::IsNull => "is null",
            Self::Like => "like",
            Self::Nlike => "not like",
            Self::Ilike => "like (case-insensitive)",
            Self::Nilike => "not like (case-insensitive)",
            Self::Similar => "similar",
            Self::Nsimilar => "not similar",
            Self::Regex => "~",
            Self::Nregex => "!~",
            Self::Iregex => "~*",
            Self::Niregex => "!~*",
            Self::Contains => "contains",
            Self::ContainedIn => "contained in",
            Self::HasKey => "has key",
            Self::HasKeysAny => "has any of the keys",
            Self::HasKeysAll => "has all of the keys",
        }
    }

    /// Look an operator up by its tag
    pub fn from_tag(tag: &str) -> Option<Self> {
        ALL_OPERATORS.iter().copied().find(|op| op.tag() == tag)
    }

    /// `_in` / `_nin`: the value is a list
    pub fn is_set_membership(self) -> bool {
        matches!(self, Self::In | Self::Nin)
    }

    /// `_c*` operators: the value names another column
    pub fn is_column_comparison(self) -> bool {
        matches!(
            self,
            Self::Ceq | Self::Cne | Self::Cgt | Self::Clt | Self::Cgte | Self::Clte
        )
    }

    pub fn is_null_check(self) -> bool {
        matches!(self, Self::IsNull)
    }
}

/// One entry of the operator picker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorOption {
    pub operator: Operator,
    pub helper_text: &'static str,
}

impl OperatorOption {
    pub fn tag(&self) -> &'static str {
        self.operator.tag()
    }

    /// Case-insensitive match of the search text against tag and helper text
    pub fn matches(&self, search: &str) -> bool {
        let search = search.trim().to_lowercase();
        search.is_empty()
            || self.tag().to_lowercase().contains(&search)
            || self.helper_text.to_lowercase().contains(&search)
    }
}

const BASE_OPERATORS: [Operator; 15] = [
    Operator::Eq,
    Operator::Neq,
    Operator::In,
    Operator::Nin,
    Operator::Gt,
    Operator::Lt,
    Operator::Gte,
    Operator::Lte,
    Operator::Ceq,
    Operator::Cne,
    Operator::Cgt,
    Operator::Clt,
    Operator::Cgte,
    Operator::Clte,
    Operator::IsNull,
];

const TEXT_OPERATORS: [Operator; 10] = [
    Operator::Like,
    Operator::Nlike,
    Operator::Ilike,
    Operator::Nilike,
    Operator::Similar,
    Operator::Nsimilar,
    Operator::Regex,
    Operator::Nregex,
    Operator::Iregex,
    Operator::Niregex,
];

const JSONB_OPERATORS: [Operator; 5] = [
    Operator::Contains,
    Operator::ContainedIn,
    Operator::HasKey,
    Operator::HasKeysAny,
    Operator::HasKeysAll,
];

static ALL_OPERATORS: Lazy<Vec<Operator>> = Lazy::new(|| {
    BASE_OPERATORS
        .iter()
        .chain(TEXT_OPERATORS.iter())
        .chain(JSONB_OPERATORS.iter())
        .copied()
        .collect()
});

fn options<'a>(operators: impl Iterator<Item = &'a Operator>) -> Vec<OperatorOption> {
    operators
        .map(|&operator| OperatorOption {
            operator,
            helper_text: operator.helper_text(),
        })
        .collect()
}

static BASE_CATALOG: Lazy<Vec<OperatorOption>> = Lazy::new(|| options(BASE_OPERATORS.iter()));

static TEXT_CATALOG: Lazy<Vec<OperatorOption>> =
    Lazy::new(|| options(BASE_OPERATORS.iter().chain(TEXT_OPERATORS.iter())));

static JSONB_CATALOG: Lazy<Vec<OperatorOption>> =
    Lazy::new(|| options(BASE_OPERATORS.iter().chain(JSONB_OPERATORS.iter())));

/// Operators legal for a column of the given underlying type
///
/// Every type gets the base set; `text` adds pattern matching and `jsonb`
/// adds containment and key checks. Unknown types get the base set only.
#[inline]
pub fn available_operators(column_type: Option<&str>) -> &'static [OperatorOption] {
    match column_type {
        Some("text") => &TEXT_CATALOG,
        Some("jsonb") => &JSONB_CATALOG,
        _ => &BASE_CATALOG,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(options: &[OperatorOption]) -> Vec<&'static str> {
        options.iter().map(|o| o.tag()).collect()
    }

    #[test]
    fn test_base_catalog_order() {
        assert_eq!(
            tags(available_operators(None)),
            vec![
                "_eq", "_neq", "_in", "_nin", "_gt", "_lt", "_gte", "_lte", "_ceq", "_cne",
                "_cgt", "_clt", "_cgte", "_clte", "_is_null",
            ]
        );
    }

    #[test]
    fn test_text_catalog_appends_pattern_operators() {
        let text = tags(available_operators(Some("text")));
        assert_eq!(text.len(), 25);
        assert_eq!(&text[..15], &tags(available_operators(None))[..]);
        assert_eq!(text[15], "_like");
        assert_eq!(text[24], "_niregex");
    }

    #[test]
    fn test_jsonb_catalog_appends_key_operators() {
        let jsonb = tags(available_operators(Some("jsonb")));
        assert_eq!(
            &jsonb[15..],
            &["_contains", "_contained_in", "_has_key", "_has_keys_any", "_has_keys_all"]
        );
    }

    #[test]
    fn test_unknown_type_gets_base_catalog() {
        assert_eq!(available_operators(Some("int4")), available_operators(None));
        assert_eq!(available_operators(Some("uuid")).len(), 15);
    }

    #[test]
    fn test_from_tag_round_trips_every_operator() {
        for op in ALL_OPERATORS.iter() {
            assert_eq!(Operator::from_tag(op.tag()), Some(*op));
        }
        assert_eq!(Operator::from_tag("_xor"), None);
    }

    #[test]
    fn test_option_search_matches_tag_and_helper() {
        let option = OperatorOption {
            operator: Operator::Nin,
            helper_text: Operator::Nin.helper_text(),
        };
        assert!(option.matches("nin"));
        assert!(option.matches("NOT IN"));
        assert!(option.matches(""));
        assert!(!option.matches("like"));
    }

    #[test]
    fn test_operator_classes() {
        assert!(Operator::In.is_set_membership());
        assert!(Operator::Nin.is_set_membership());
        assert!(!Operator::Eq.is_set_membership());
        assert!(Operator::Cgte.is_column_comparison());
        assert!(!Operator::Gte.is_column_comparison());
        assert!(Operator::IsNull.is_null_check());
    }
}
