//! Search filter construction.
//!
//! Filters are built per invocation from the decoded [`FilterSpec`] and the
//! host's current variables. Values are substituted as they are; filter
//! metacharacters in variable values are not escaped.

use crate::config::{FilterSpec, FilterTerm};
use crate::value::{resolve_or_literal, resolve_variable, VariableResolver, VARIABLE_PREFIX};

/// Builds the LDAP filter string for `spec`.
#[must_use]
pub fn build_filter<R: VariableResolver + ?Sized>(spec: &FilterSpec, resolver: &R) -> String {
    match spec {
        FilterSpec::FreeText { template } => expand_free_text(template, resolver),
        FilterSpec::AttributeTable { terms } => attribute_table_filter(terms, resolver),
    }
}

/// Substitutes `in.` variable references in a free-text filter.
///
/// A reference runs from the marker up to the next `)`, which stays in the
/// output. Unresolved references expand to nothing. A marker without a
/// closing parenthesis leaves the remaining text untouched.
#[must_use]
pub fn expand_free_text<R: VariableResolver + ?Sized>(template: &str, resolver: &R) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(VARIABLE_PREFIX) {
        let reference = &rest[start..];
        let Some(close) = reference.find(')') else {
            break;
        };
        out.push_str(&rest[..start]);
        if let Some(value) = resolve_variable(resolver, &reference[..close]) {
            out.push_str(&value.to_string());
        }
        out.push(')');
        rest = &reference[close + 1..];
    }

    out.push_str(rest);
    out
}

/// Builds a conjunction of `attribute=value` terms.
///
/// Returns an empty string when there are no terms.
#[must_use]
pub fn attribute_table_filter<R: VariableResolver + ?Sized>(
    terms: &[FilterTerm],
    resolver: &R,
) -> String {
    if terms.is_empty() {
        return String::new();
    }

    let mut filter = String::from("(&");
    for term in terms {
        filter.push('(');
        filter.push_str(&resolve_or_literal(resolver, &term.attribute));
        filter.push('=');
        filter.push_str(&term_value(&term.value, resolver));
        filter.push(')');
    }
    filter.push(')');
    filter
}

/// Resolves the base object expression, falling back to the literal text.
#[must_use]
pub fn resolve_base_object<R: VariableResolver + ?Sized>(expr: &str, resolver: &R) -> String {
    resolve_or_literal(resolver, expr)
}

fn term_value<R: VariableResolver + ?Sized>(expr: &str, resolver: &R) -> String {
    let expr = expr.trim();
    match quoted_literal(expr) {
        Some(literal) => literal.to_string(),
        None => resolve_or_literal(resolver, expr),
    }
}

fn quoted_literal(expr: &str) -> Option<&str> {
    if expr.len() >= 2 {
        expr.strip_prefix('"')?.strip_suffix('"')
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::value::ProcessData;

    fn data() -> ProcessData {
        serde_json::from_value(json!({
            "name": "Alice",
            "surname": "Smith",
            "attr": "mail",
            "department": "ou=sales,o=acme",
            "age": 42,
            "nothing": null,
            "customer": { "id": "c-17" }
        }))
        .unwrap()
    }

    fn term(attribute: &str, value: &str) -> FilterTerm {
        FilterTerm {
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn free_text_substitutes_variables() {
        let filter = expand_free_text("(&(objectClass=person)(cn=in.name)(sn=in.surname))", &data());
        assert_eq!(filter, "(&(objectClass=person)(cn=Alice)(sn=Smith))");
    }

    #[test]
    fn free_text_formats_non_text_values() {
        assert_eq!(expand_free_text("(age=in.age)", &data()), "(age=42)");
        assert_eq!(
            expand_free_text("(uid=in.customer.id)", &data()),
            "(uid=c-17)"
        );
    }

    #[test]
    fn free_text_drops_unresolved_references() {
        assert_eq!(expand_free_text("(cn=in.missing)", &data()), "(cn=)");
        assert_eq!(expand_free_text("(cn=in.nothing)", &data()), "(cn=)");
    }

    #[test]
    fn free_text_keeps_unterminated_marker() {
        assert_eq!(
            expand_free_text("(cn=in.name)(sn=in.surname", &data()),
            "(cn=Alice)(sn=in.surname"
        );
    }

    #[test]
    fn free_text_does_not_escape_values() {
        let data: ProcessData = serde_json::from_value(json!({ "name": "*)(uid=*" })).unwrap();
        assert_eq!(expand_free_text("(cn=in.name)", &data), "(cn=*)(uid=*)");
    }

    #[test]
    fn empty_table_yields_empty_filter() {
        assert_eq!(attribute_table_filter(&[], &data()), "");
        assert_eq!(build_filter(&FilterSpec::default(), &data()), "");
    }

    #[test]
    fn table_terms_form_conjunction_in_order() {
        let terms = [
            term("objectClass", "\"person\""),
            term("cn", "name"),
            term("ou", "sales"),
        ];
        assert_eq!(
            attribute_table_filter(&terms, &data()),
            "(&(objectClass=person)(cn=Alice)(ou=sales))"
        );
    }

    #[test]
    fn table_attribute_names_resolve_as_variables() {
        let terms = [term("attr", "\" a@b.c \"")];
        assert_eq!(attribute_table_filter(&terms, &data()), "(&(mail= a@b.c ))");
    }

    #[test]
    fn table_values_are_trimmed_before_quote_check() {
        let terms = [term("cn", "  \"Bob\"  "), term("sn", " surname ")];
        assert_eq!(attribute_table_filter(&terms, &data()), "(&(cn=Bob)(sn=Smith))");

        let terms = [term("cn", "\"")];
        assert_eq!(attribute_table_filter(&terms, &data()), "(&(cn=\"))");
    }

    #[test]
    fn base_object_resolves_or_stays_literal() {
        assert_eq!(resolve_base_object("department", &data()), "ou=sales,o=acme");
        assert_eq!(resolve_base_object("ou=people", &data()), "ou=people");
        assert_eq!(resolve_base_object("\"ou=people\"", &data()), "\"ou=people\"");
        assert_eq!(resolve_base_object("", &data()), "");
    }

    proptest! {
        #[test]
        fn free_text_without_markers_is_identity(template in "[ -~]{0,40}") {
            prop_assume!(!template.contains(VARIABLE_PREFIX));
            prop_assert_eq!(expand_free_text(&template, &data()), template);
        }

        #[test]
        fn table_filter_shape(values in prop::collection::vec("[a-z]{1,6}", 1..6)) {
            let terms: Vec<FilterTerm> = values
                .iter()
                .enumerate()
                .map(|(i, v)| term(&format!("a{i}"), &format!("\"{v}\"")))
                .collect();
            let filter = attribute_table_filter(&terms, &data());
            let expected: String = values
                .iter()
                .enumerate()
                .map(|(i, v)| format!("(a{i}={v})"))
                .collect();
            prop_assert_eq!(filter, format!("(&{expected})"));
        }
    }
}
