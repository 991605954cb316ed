//! Query element configuration.
//!
//! The element is configured with property text (see [`crate::properties`]).
//! [`QuerySpec::decode`] turns that text into a typed search specification
//! and [`QuerySpec::encode`] writes it back in the same key layout, so a
//! configuration survives a decode/encode round trip unchanged.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::QueryResult;
use crate::properties::Properties;
use crate::value::{resolve_or_literal, strip_variable_prefix, VariableResolver};

/// Column header used for the entry name in table results.
pub const ENTRY_NAME_COLUMN: &str = "EntryName";

/// Property keys of the persisted configuration.
pub mod keys {
    /// Directory vendor (provider name).
    pub const SERVER_PROVIDER: &str = "server_provider";
    /// Server URL.
    pub const SERVER_URL: &str = "server_url";
    /// Authentication kind (`none` or `simple`).
    pub const SERVER_AUTH_KIND: &str = "server_authkind";
    /// Bind user name.
    pub const SERVER_USERNAME: &str = "server_username";
    /// Bind password.
    pub const SERVER_PASSWORD: &str = "server_password";
    /// Use TLS.
    pub const SERVER_USE_SSL: &str = "server_useSsl";
    /// Default naming context.
    pub const SERVER_CONTEXT: &str = "server_context";

    /// Base object of the search.
    pub const SEARCH_ROOT_OBJECT: &str = "search_root_object";
    /// Search scope.
    pub const SEARCH_SCOPE: &str = "search_scope";
    /// Filter format marker.
    pub const SEARCH_FILTER_FORMAT: &str = "search_filter_format";
    /// Free-text filter template.
    pub const SEARCH_FILTER_TEXT: &str = "search_filter_text";
    /// Filter attribute name, suffixed with the row index.
    pub const SEARCH_FILTER_ATTRIBUTE: &str = "search_filter_attribute_";
    /// Filter value expression, suffixed with the row index.
    pub const SEARCH_FILTER_VALUE: &str = "search_filter_value_";

    /// Result mode marker.
    pub const RESULT_RETURN: &str = "result_return";
    /// Table result attribute, suffixed with the row index.
    pub const RESULT_ATTRIBUTE: &str = "result_attribute_attribute_";
    /// Table result output slot.
    pub const RESULT_GRID_ATTRIBUTE: &str = "result_ivyGrid_attribute";
    /// Single-row attribute, suffixed with the row index.
    pub const RESULT_TABLE_ATTRIBUTE: &str = "result_table_attribute_";
    /// Single-row output path, suffixed with the row index.
    pub const RESULT_TABLE_VALUE: &str = "result_table_value_";
    /// Include the entry name (single-row mode).
    pub const RESULT_INCLUDE_NAME: &str = "result_include_name";
    /// Include the entry name (table mode).
    pub const RESULT_INCLUDE_NAME_TABLE: &str = "result_include_name2";
    /// Output path of the entry name.
    pub const RESULT_NAME_ATTRIBUTE: &str = "result_ivyGrid_name_attribute";
    /// Sort attribute.
    pub const RESULT_SORT_ATTRIBUTE: &str = "result_sort_attribute";
    /// Sort order.
    pub const RESULT_SORT_ORDER: &str = "result_sort_order";

    /// `search_filter_format` value selecting the free-text filter.
    pub const FILTER_TEXT_MARKER: &str = "filterText";
    /// `result_return` value selecting table results.
    pub const RETURN_ALL: &str = "all";
    /// `result_return` value selecting the first entry only.
    pub const RETURN_FIRST: &str = "onlyFirst";
    /// `result_sort_order` value for descending order.
    pub const SORT_DESCENDING: &str = "descending";
    /// `result_sort_order` value for ascending order.
    pub const SORT_ASCENDING: &str = "ascending";
}

// ============================================================================
// LDAP Vendor
// ============================================================================

/// Known LDAP directory vendors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LdapVendor {
    /// Novell / NetIQ eDirectory.
    #[default]
    NovellEDirectory,

    /// Microsoft Active Directory.
    ActiveDirectory,

    /// Sun ONE / Oracle Directory Server.
    SunOne,

    /// OpenLDAP.
    OpenLdap,

    /// Generic LDAP (RFC 4510 compliant).
    Other,
}

impl LdapVendor {
    /// All vendors, in editor order.
    pub const ALL: [Self; 5] = [
        Self::NovellEDirectory,
        Self::ActiveDirectory,
        Self::SunOne,
        Self::OpenLdap,
        Self::Other,
    ];

    /// Returns the provider name stored in the configuration.
    #[must_use]
    pub const fn provider_name(&self) -> &'static str {
        match self {
            Self::NovellEDirectory => "Novell eDirectory",
            Self::ActiveDirectory => "Microsoft Active Directory",
            Self::SunOne => "Sun ONE Directory Server",
            Self::OpenLdap => "OpenLDAP",
            Self::Other => "Other",
        }
    }

    /// Looks up a vendor by its provider name.
    #[must_use]
    pub fn from_provider_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.provider_name() == name)
    }

    /// Returns the binary GUID attribute for this vendor.
    #[must_use]
    pub const fn uuid_attribute(&self) -> &'static str {
        match self {
            Self::ActiveDirectory => "objectGUID",
            Self::NovellEDirectory => "GUID",
            Self::SunOne => "nsUniqueId",
            Self::OpenLdap | Self::Other => "entryUUID",
        }
    }
}

/// How the element authenticates to the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticationKind {
    /// Anonymous access.
    None,
    /// Simple bind with user name and password.
    #[default]
    Simple,
}

impl AuthenticationKind {
    /// Returns the configuration value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Simple => "simple",
        }
    }
}

impl FromStr for AuthenticationKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "simple" => Ok(Self::Simple),
            _ => Err(()),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Directory server settings.
///
/// `url`, `user_name` and `password` may name a process variable; they are
/// expanded per invocation with [`ServerConfig::expand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Directory vendor.
    pub vendor: LdapVendor,

    /// Server URL (`ldap://host:port` or `ldaps://host:port`).
    pub url: String,

    /// Authentication kind.
    pub auth_kind: AuthenticationKind,

    /// Bind DN or user name.
    pub user_name: String,

    /// Bind password.
    #[serde(skip_serializing)]
    pub password: String,

    /// Connect with TLS.
    pub use_ssl: bool,

    /// Naming context appended to every search base.
    pub default_context: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            vendor: LdapVendor::default(),
            url: "ldap://".to_string(),
            auth_kind: AuthenticationKind::default(),
            user_name: String::new(),
            password: String::new(),
            use_ssl: false,
            default_context: String::new(),
        }
    }
}

impl ServerConfig {
    /// Expands url, user name and password through `resolver`.
    ///
    /// Each field that names a variable is replaced by the variable's value;
    /// anything else is kept as written.
    #[must_use]
    pub fn expand<R: VariableResolver + ?Sized>(&self, resolver: &R) -> Self {
        Self {
            url: resolve_or_literal(resolver, &self.url),
            user_name: resolve_or_literal(resolver, &self.user_name),
            password: resolve_or_literal(resolver, &self.password),
            ..self.clone()
        }
    }

    /// Returns the URL to connect to, switching to `ldaps://` when TLS is on.
    #[must_use]
    pub fn effective_url(&self) -> String {
        match self.url.strip_prefix("ldap://") {
            Some(rest) if self.use_ssl => format!("ldaps://{rest}"),
            _ => self.url.clone(),
        }
    }

    /// Joins a base object with the default naming context.
    #[must_use]
    pub fn search_base(&self, base_object: &str) -> String {
        let base = base_object.trim();
        let context = self.default_context.trim();
        match (base.is_empty(), context.is_empty()) {
            (_, true) => base.to_string(),
            (true, false) => context.to_string(),
            (false, false) => format!("{base},{context}"),
        }
    }

    /// Checks if a bind is needed before searching.
    #[must_use]
    pub fn requires_bind(&self) -> bool {
        self.auth_kind == AuthenticationKind::Simple && !self.user_name.is_empty()
    }

    fn from_properties(props: &Properties) -> Self {
        let defaults = Self::default();
        Self {
            vendor: props
                .get(keys::SERVER_PROVIDER)
                .and_then(LdapVendor::from_provider_name)
                .unwrap_or(defaults.vendor),
            url: props.get_or(keys::SERVER_URL, &defaults.url).to_string(),
            auth_kind: props
                .get(keys::SERVER_AUTH_KIND)
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.auth_kind),
            user_name: props.get_or(keys::SERVER_USERNAME, "").to_string(),
            password: props.get_or(keys::SERVER_PASSWORD, "").to_string(),
            use_ssl: parse_flag(props.get(keys::SERVER_USE_SSL)),
            default_context: props.get_or(keys::SERVER_CONTEXT, "").to_string(),
        }
    }

    fn write_properties(&self, props: &mut Properties) {
        props.set(keys::SERVER_PROVIDER, self.vendor.provider_name());
        props.set(keys::SERVER_URL, self.url.as_str());
        props.set(keys::SERVER_AUTH_KIND, self.auth_kind.as_str());
        props.set(keys::SERVER_USERNAME, self.user_name.as_str());
        props.set(keys::SERVER_PASSWORD, self.password.as_str());
        props.set(keys::SERVER_USE_SSL, self.use_ssl.to_string());
        props.set(keys::SERVER_CONTEXT, self.default_context.as_str());
    }
}

// ============================================================================
// Search Specification
// ============================================================================

/// LDAP search scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SearchScope {
    /// Search only the base object.
    #[default]
    Object,
    /// Search one level below the base object.
    OneLevel,
    /// Search the entire subtree.
    Subtree,
}

impl SearchScope {
    /// Converts to ldap3 scope.
    #[must_use]
    pub fn to_ldap3(&self) -> ldap3::Scope {
        match self {
            Self::Object => ldap3::Scope::Base,
            Self::OneLevel => ldap3::Scope::OneLevel,
            Self::Subtree => ldap3::Scope::Subtree,
        }
    }

    /// Parses the configuration value; anything unknown is [`SearchScope::Object`].
    #[must_use]
    pub fn from_config_value(value: &str) -> Self {
        match value {
            "subTree" => Self::Subtree,
            "oneLevel" => Self::OneLevel,
            _ => Self::Object,
        }
    }

    /// Returns the configuration value.
    #[must_use]
    pub const fn config_value(&self) -> &'static str {
        match self {
            Self::Object => "oneObject",
            Self::OneLevel => "oneLevel",
            Self::Subtree => "subTree",
        }
    }
}

/// One `attribute=value` condition of a table filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterTerm {
    /// Directory attribute name, or a variable naming it.
    pub attribute: String,
    /// Value expression: a quoted literal, a variable, or plain text.
    pub value: String,
}

/// How the search filter is formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum FilterSpec {
    /// Conjunction of attribute/value terms, in configured order.
    AttributeTable {
        /// Filter terms.
        terms: Vec<FilterTerm>,
    },
    /// Free filter text with embedded `in.` variable references.
    FreeText {
        /// Filter template.
        template: String,
    },
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self::AttributeTable { terms: Vec::new() }
    }
}

/// Maps one directory attribute to an output path (single-row mode).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeBinding {
    /// Directory attribute name.
    pub attribute: String,
    /// Output path receiving the attribute's value.
    pub output: String,
}

/// How results are returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ResultSpec {
    /// Only the first entry, each attribute bound to its own output.
    SingleRow {
        /// Attribute bindings, in projection order.
        bindings: Vec<AttributeBinding>,
    },
    /// All entries as one table written to a single output.
    MultiRow {
        /// Projected attributes, in column order.
        attributes: Vec<String>,
        /// Output path receiving the table.
        output: String,
    },
}

impl Default for ResultSpec {
    fn default() -> Self {
        Self::SingleRow {
            bindings: Vec::new(),
        }
    }
}

/// A decoded directory query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySpec {
    /// Directory server settings.
    pub server: ServerConfig,

    /// Search scope.
    pub scope: SearchScope,

    /// Base object: a variable reference or a literal DN.
    pub base_object: String,

    /// Filter definition.
    pub filter: FilterSpec,

    /// Result definition.
    pub result: ResultSpec,

    /// Whether the entry name is part of the result.
    pub include_entry_name: bool,

    /// Output path of the entry name (single-row mode).
    pub entry_name_output: String,

    /// Column to sort table results by; may name a variable.
    pub sort_attribute: Option<String>,

    /// Sort table results in descending order.
    pub sort_descending: bool,
}

impl QuerySpec {
    /// Creates a new specification builder.
    #[must_use]
    pub fn builder() -> QuerySpecBuilder {
        QuerySpecBuilder::default()
    }

    /// Decodes property text.
    ///
    /// ## Errors
    ///
    /// Returns [`crate::QueryError::Configuration`] if the text is not valid
    /// property syntax.
    pub fn decode(text: &str) -> QueryResult<Self> {
        let props = Properties::parse(text)?;
        Ok(Self::from_properties(&props))
    }

    /// Encodes the specification as property text.
    #[must_use]
    pub fn encode(&self) -> String {
        self.to_properties().to_text()
    }

    /// Builds the specification from parsed properties.
    #[must_use]
    pub fn from_properties(props: &Properties) -> Self {
        let result = if props.get(keys::RESULT_RETURN) == Some(keys::RETURN_ALL) {
            ResultSpec::MultiRow {
                attributes: read_result_attributes(props),
                output: strip_variable_prefix(props.get_or(keys::RESULT_GRID_ATTRIBUTE, ""))
                    .to_string(),
            }
        } else {
            ResultSpec::SingleRow {
                bindings: read_result_bindings(props),
            }
        };

        let include_key = match result {
            ResultSpec::SingleRow { .. } => keys::RESULT_INCLUDE_NAME,
            ResultSpec::MultiRow { .. } => keys::RESULT_INCLUDE_NAME_TABLE,
        };

        let filter = if props.get(keys::SEARCH_FILTER_FORMAT) == Some(keys::FILTER_TEXT_MARKER) {
            FilterSpec::FreeText {
                template: props.get_or(keys::SEARCH_FILTER_TEXT, "").to_string(),
            }
        } else {
            FilterSpec::AttributeTable {
                terms: read_filter_terms(props),
            }
        };

        let sort_attribute = props.get_or(keys::RESULT_SORT_ATTRIBUTE, "");

        Self {
            server: ServerConfig::from_properties(props),
            scope: SearchScope::from_config_value(props.get_or(keys::SEARCH_SCOPE, "")),
            base_object: strip_variable_prefix(props.get_or(keys::SEARCH_ROOT_OBJECT, ""))
                .to_string(),
            filter,
            result,
            include_entry_name: parse_flag(props.get(include_key)),
            entry_name_output: strip_variable_prefix(props.get_or(keys::RESULT_NAME_ATTRIBUTE, ""))
                .to_string(),
            sort_attribute: (!sort_attribute.is_empty()).then(|| sort_attribute.to_string()),
            sort_descending: props.get(keys::RESULT_SORT_ORDER) == Some(keys::SORT_DESCENDING),
        }
    }

    /// Writes the specification in the persisted key layout.
    #[must_use]
    pub fn to_properties(&self) -> Properties {
        let mut props = Properties::new();
        self.server.write_properties(&mut props);

        props.set(keys::SEARCH_ROOT_OBJECT, self.base_object.as_str());
        props.set(keys::SEARCH_SCOPE, self.scope.config_value());

        match &self.filter {
            FilterSpec::FreeText { template } => {
                props.set(keys::SEARCH_FILTER_FORMAT, keys::FILTER_TEXT_MARKER);
                props.set(keys::SEARCH_FILTER_TEXT, template.as_str());
            }
            FilterSpec::AttributeTable { terms } => {
                props.set(keys::SEARCH_FILTER_TEXT, "");
                for (i, term) in terms.iter().enumerate() {
                    props.set(format!("{}{i}", keys::SEARCH_FILTER_ATTRIBUTE), term.attribute.as_str());
                    props.set(format!("{}{i}", keys::SEARCH_FILTER_VALUE), term.value.as_str());
                }
            }
        }

        let (return_value, grid_output) = match &self.result {
            ResultSpec::SingleRow { bindings } => {
                for (i, binding) in bindings.iter().enumerate() {
                    props.set(format!("{}{i}", keys::RESULT_TABLE_ATTRIBUTE), binding.attribute.as_str());
                    props.set(format!("{}{i}", keys::RESULT_TABLE_VALUE), binding.output.as_str());
                }
                (keys::RETURN_FIRST, "")
            }
            ResultSpec::MultiRow { attributes, output } => {
                for (i, attribute) in attributes.iter().enumerate() {
                    props.set(format!("{}{i}", keys::RESULT_ATTRIBUTE), attribute.as_str());
                }
                (keys::RETURN_ALL, output.as_str())
            }
        };

        props.set(keys::RESULT_GRID_ATTRIBUTE, grid_output);
        props.set(
            keys::RESULT_SORT_ATTRIBUTE,
            self.sort_attribute.as_deref().unwrap_or_default(),
        );
        props.set(keys::RESULT_RETURN, return_value);
        props.set(
            keys::RESULT_SORT_ORDER,
            if self.sort_descending {
                keys::SORT_DESCENDING
            } else {
                keys::SORT_ASCENDING
            },
        );

        let multi_row = self.is_multi_row();
        props.set(
            keys::RESULT_INCLUDE_NAME,
            (self.include_entry_name && !multi_row).to_string(),
        );
        props.set(
            keys::RESULT_INCLUDE_NAME_TABLE,
            (self.include_entry_name && multi_row).to_string(),
        );
        props.set(keys::RESULT_NAME_ATTRIBUTE, self.entry_name_output.as_str());
        props
    }

    /// Checks if results are returned as a table.
    #[must_use]
    pub const fn is_multi_row(&self) -> bool {
        matches!(self.result, ResultSpec::MultiRow { .. })
    }

    /// Returns the projected attribute names, in column order.
    #[must_use]
    pub fn projected_attributes(&self) -> Vec<&str> {
        match &self.result {
            ResultSpec::SingleRow { bindings } => {
                bindings.iter().map(|b| b.attribute.as_str()).collect()
            }
            ResultSpec::MultiRow { attributes, .. } => {
                attributes.iter().map(String::as_str).collect()
            }
        }
    }

    /// Returns the table column headers: the entry name (if included)
    /// followed by the projected attributes.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut columns = Vec::new();
        if self.include_entry_name {
            columns.push(ENTRY_NAME_COLUMN.to_string());
        }
        columns.extend(self.projected_attributes().into_iter().map(String::from));
        columns
    }
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

fn read_filter_terms(props: &Properties) -> Vec<FilterTerm> {
    let mut terms: Vec<FilterTerm> = Vec::new();
    for i in 0.. {
        let attribute = props.get(&format!("{}{i}", keys::SEARCH_FILTER_ATTRIBUTE));
        let value = props.get(&format!("{}{i}", keys::SEARCH_FILTER_VALUE));
        let (Some(attribute), Some(value)) = (attribute, value) else {
            break;
        };
        if attribute.is_empty() {
            continue;
        }
        let value = strip_variable_prefix(value).to_string();
        match terms.iter_mut().find(|t| t.attribute == attribute) {
            Some(existing) => existing.value = value,
            None => terms.push(FilterTerm {
                attribute: attribute.to_string(),
                value,
            }),
        }
    }
    terms
}

fn read_result_attributes(props: &Properties) -> Vec<String> {
    let mut attributes: Vec<String> = Vec::new();
    for i in 0.. {
        let Some(attribute) = props.get(&format!("{}{i}", keys::RESULT_ATTRIBUTE)) else {
            break;
        };
        if !attribute.is_empty() && !attributes.iter().any(|a| a == attribute) {
            attributes.push(attribute.to_string());
        }
    }
    attributes
}

fn read_result_bindings(props: &Properties) -> Vec<AttributeBinding> {
    let mut bindings: Vec<AttributeBinding> = Vec::new();
    for i in 0.. {
        let attribute = props.get(&format!("{}{i}", keys::RESULT_TABLE_ATTRIBUTE));
        let output = props.get(&format!("{}{i}", keys::RESULT_TABLE_VALUE));
        let (Some(attribute), Some(output)) = (attribute, output) else {
            break;
        };
        if attribute.is_empty() {
            continue;
        }
        match bindings.iter_mut().find(|b| b.attribute == attribute) {
            Some(existing) => existing.output = output.to_string(),
            None => bindings.push(AttributeBinding {
                attribute: attribute.to_string(),
                output: output.to_string(),
            }),
        }
    }
    bindings
}

// ============================================================================
// Specification Builder
// ============================================================================

/// Builder for [`QuerySpec`].
#[derive(Debug, Default)]
pub struct QuerySpecBuilder {
    spec: QuerySpec,
}

impl QuerySpecBuilder {
    /// Sets the server settings.
    #[must_use]
    pub fn server(mut self, server: ServerConfig) -> Self {
        self.spec.server = server;
        self
    }

    /// Sets the search scope.
    #[must_use]
    pub const fn scope(mut self, scope: SearchScope) -> Self {
        self.spec.scope = scope;
        self
    }

    /// Sets the base object expression.
    #[must_use]
    pub fn base_object(mut self, base: impl Into<String>) -> Self {
        self.spec.base_object = base.into();
        self
    }

    /// Appends an attribute filter term, switching to the table filter.
    #[must_use]
    pub fn filter_term(mut self, attribute: impl Into<String>, value: impl Into<String>) -> Self {
        let term = FilterTerm {
            attribute: attribute.into(),
            value: value.into(),
        };
        match &mut self.spec.filter {
            FilterSpec::AttributeTable { terms } => terms.push(term),
            FilterSpec::FreeText { .. } => {
                self.spec.filter = FilterSpec::AttributeTable { terms: vec![term] };
            }
        }
        self
    }

    /// Uses a free-text filter template.
    #[must_use]
    pub fn free_text(mut self, template: impl Into<String>) -> Self {
        self.spec.filter = FilterSpec::FreeText {
            template: template.into(),
        };
        self
    }

    /// Binds an attribute of the first entry to an output path.
    #[must_use]
    pub fn bind(mut self, attribute: impl Into<String>, output: impl Into<String>) -> Self {
        let binding = AttributeBinding {
            attribute: attribute.into(),
            output: output.into(),
        };
        match &mut self.spec.result {
            ResultSpec::SingleRow { bindings } => bindings.push(binding),
            ResultSpec::MultiRow { .. } => {
                self.spec.result = ResultSpec::SingleRow {
                    bindings: vec![binding],
                };
            }
        }
        self
    }

    /// Returns all entries as a table written to `output`.
    #[must_use]
    pub fn table<I, S>(mut self, output: impl Into<String>, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.result = ResultSpec::MultiRow {
            attributes: attributes.into_iter().map(Into::into).collect(),
            output: output.into(),
        };
        self
    }

    /// Includes the entry name, bound to `output` in single-row mode.
    #[must_use]
    pub fn include_entry_name(mut self, output: impl Into<String>) -> Self {
        self.spec.include_entry_name = true;
        self.spec.entry_name_output = output.into();
        self
    }

    /// Sorts table results by `attribute`.
    #[must_use]
    pub fn sort_by(mut self, attribute: impl Into<String>, descending: bool) -> Self {
        self.spec.sort_attribute = Some(attribute.into());
        self.spec.sort_descending = descending;
        self
    }

    /// Builds the specification.
    #[must_use]
    pub fn build(self) -> QuerySpec {
        self.spec
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::value::ProcessData;

    const EDITOR_OUTPUT: &str = "\
server_provider=Microsoft Active Directory
server_url=ldap\\://dc01.example.com\\:389
server_authkind=simple
server_username=cn\\=svc,dc\\=example,dc\\=com
server_password=in.ldapPassword
server_useSsl=false
server_context=dc\\=example,dc\\=com
search_root_object=in.department
search_scope=subTree
search_filter_text=
search_filter_attribute_0=objectClass
search_filter_value_0=\"person\"
search_filter_attribute_1=sn
search_filter_value_1=in.customer.lastName
result_table_attribute_0=cn
result_table_value_0=in.customer.fullName
result_table_attribute_1=mail
result_table_value_1=in.customer.email
result_ivyGrid_attribute=
result_sort_attribute=
result_return=onylFirst
result_sort_order=ascending
result_include_name=true
result_include_name2=false
result_ivyGrid_name_attribute=in.customer.dn
";

    #[test]
    fn decodes_editor_output() {
        let spec = QuerySpec::decode(EDITOR_OUTPUT).unwrap();

        assert_eq!(spec.server.vendor, LdapVendor::ActiveDirectory);
        assert_eq!(spec.server.url, "ldap://dc01.example.com:389");
        assert_eq!(spec.server.user_name, "cn=svc,dc=example,dc=com");
        assert_eq!(spec.server.password, "in.ldapPassword");
        assert_eq!(spec.server.default_context, "dc=example,dc=com");
        assert_eq!(spec.scope, SearchScope::Subtree);
        assert_eq!(spec.base_object, "department");
        assert_eq!(
            spec.filter,
            FilterSpec::AttributeTable {
                terms: vec![
                    FilterTerm {
                        attribute: "objectClass".to_string(),
                        value: "\"person\"".to_string(),
                    },
                    FilterTerm {
                        attribute: "sn".to_string(),
                        value: "customer.lastName".to_string(),
                    },
                ],
            }
        );
        assert_eq!(spec.projected_attributes(), vec!["cn", "mail"]);
        assert!(spec.include_entry_name);
        assert_eq!(spec.entry_name_output, "customer.dn");
        assert_eq!(spec.sort_attribute, None);
        assert!(!spec.sort_descending);
        assert!(!spec.is_multi_row());
    }

    #[test]
    fn empty_configuration_yields_defaults() {
        let spec = QuerySpec::decode("").unwrap();
        assert_eq!(spec, QuerySpec::default());
        assert_eq!(spec.server.url, "ldap://");
        assert_eq!(spec.scope, SearchScope::Object);
    }

    #[test]
    fn unknown_scope_and_provider_fall_back() {
        let spec = QuerySpec::decode("search_scope=deep\nserver_provider=Acme\n").unwrap();
        assert_eq!(spec.scope, SearchScope::Object);
        assert_eq!(spec.server.vendor, LdapVendor::NovellEDirectory);

        let spec = QuerySpec::decode("search_scope=oneLevel\n").unwrap();
        assert_eq!(spec.scope, SearchScope::OneLevel);
    }

    #[test]
    fn filter_pairs_stop_at_gap_and_skip_empty_names() {
        let text = "\
search_filter_attribute_0=
search_filter_value_0=ignored
search_filter_attribute_1=cn
search_filter_value_1=in.name
search_filter_attribute_2=ou
search_filter_attribute_3=mail
search_filter_value_3=x
";
        let spec = QuerySpec::decode(text).unwrap();
        assert_eq!(
            spec.filter,
            FilterSpec::AttributeTable {
                terms: vec![FilterTerm {
                    attribute: "cn".to_string(),
                    value: "name".to_string(),
                }],
            }
        );
    }

    #[test]
    fn duplicate_filter_attribute_keeps_position() {
        let text = "\
search_filter_attribute_0=cn
search_filter_value_0=a
search_filter_attribute_1=sn
search_filter_value_1=b
search_filter_attribute_2=cn
search_filter_value_2=c
";
        let spec = QuerySpec::decode(text).unwrap();
        let FilterSpec::AttributeTable { terms } = spec.filter else {
            panic!("expected attribute table");
        };
        let pairs: Vec<_> = terms
            .iter()
            .map(|t| (t.attribute.as_str(), t.value.as_str()))
            .collect();
        assert_eq!(pairs, vec![("cn", "c"), ("sn", "b")]);
    }

    #[test]
    fn filter_text_marker_selects_free_text() {
        let text = "\
search_filter_format=filterText
search_filter_text=(&(objectClass=person)(cn=in.name))
search_filter_attribute_0=sn
search_filter_value_0=ignored
";
        let spec = QuerySpec::decode(text).unwrap();
        assert_eq!(
            spec.filter,
            FilterSpec::FreeText {
                template: "(&(objectClass=person)(cn=in.name))".to_string(),
            }
        );
    }

    #[test]
    fn table_mode_reads_attributes_and_grid() {
        let text = "\
result_return=all
result_attribute_attribute_0=cn
result_attribute_attribute_1=
result_attribute_attribute_2=mail
result_attribute_attribute_3=cn
result_ivyGrid_attribute=in.people
result_include_name=false
result_include_name2=true
result_sort_attribute=in.sortColumn
result_sort_order=descending
";
        let spec = QuerySpec::decode(text).unwrap();
        assert_eq!(
            spec.result,
            ResultSpec::MultiRow {
                attributes: vec!["cn".to_string(), "mail".to_string()],
                output: "people".to_string(),
            }
        );
        assert!(spec.include_entry_name);
        assert_eq!(spec.column_names(), vec![ENTRY_NAME_COLUMN, "cn", "mail"]);
        assert_eq!(spec.sort_attribute.as_deref(), Some("in.sortColumn"));
        assert!(spec.sort_descending);
    }

    #[test]
    fn include_name_key_depends_on_mode() {
        let single = QuerySpec::decode("result_include_name2=true\n").unwrap();
        assert!(!single.include_entry_name);

        let table = QuerySpec::decode("result_return=all\nresult_include_name=true\n").unwrap();
        assert!(!table.include_entry_name);
    }

    #[test]
    fn single_row_bindings_stop_at_first_missing_pair() {
        let text = "\
result_table_attribute_0=cn
result_table_value_0=in.name
result_table_attribute_1=mail
result_table_attribute_2=sn
result_table_value_2=in.surname
";
        let spec = QuerySpec::decode(text).unwrap();
        assert_eq!(
            spec.result,
            ResultSpec::SingleRow {
                bindings: vec![AttributeBinding {
                    attribute: "cn".to_string(),
                    output: "in.name".to_string(),
                }],
            }
        );
    }

    #[test]
    fn malformed_payload_is_a_configuration_error() {
        let err = QuerySpec::decode("search_root_object=\\uZZZZ\n").unwrap_err();
        assert!(matches!(err, crate::QueryError::Configuration(_)));
    }

    #[test]
    fn server_settings_expand_variables() {
        let data: ProcessData = serde_json::from_value(serde_json::json!({
            "ldapPassword": "s3cret",
            "ldapUrl": "ldap://dir.example.com"
        }))
        .unwrap();
        let server = ServerConfig {
            url: "ldapUrl".to_string(),
            user_name: "cn=svc".to_string(),
            password: "in.ldapPassword".to_string(),
            use_ssl: true,
            ..ServerConfig::default()
        };

        let expanded = server.expand(&data);
        assert_eq!(expanded.url, "ldap://dir.example.com");
        assert_eq!(expanded.user_name, "cn=svc");
        assert_eq!(expanded.password, "s3cret");
        assert_eq!(expanded.effective_url(), "ldaps://dir.example.com");
    }

    #[test]
    fn search_base_joins_context() {
        let server = ServerConfig {
            default_context: "dc=example,dc=com".to_string(),
            ..ServerConfig::default()
        };
        assert_eq!(server.search_base("ou=people"), "ou=people,dc=example,dc=com");
        assert_eq!(server.search_base(""), "dc=example,dc=com");
        assert_eq!(ServerConfig::default().search_base("ou=people"), "ou=people");
    }

    #[test]
    fn builder_and_encode_round_trip() {
        let spec = QuerySpec::builder()
            .scope(SearchScope::OneLevel)
            .base_object("ou=people")
            .filter_term("objectClass", "\"person\"")
            .table("people", ["cn", "mail"])
            .include_entry_name("")
            .sort_by("cn", true)
            .build();

        let text = spec.encode();
        assert!(text.contains("result_return=all\n"));
        assert!(text.contains("result_include_name2=true\n"));
        assert!(text.contains("search_scope=oneLevel\n"));
        assert_eq!(QuerySpec::decode(&text).unwrap(), spec);
    }

    fn ident() -> impl Strategy<Value = String> {
        "[a-zA-Z][a-zA-Z0-9]{0,8}"
    }

    fn text() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9äöü =:#!()*,\\\\\t]{0,12}".prop_filter("no variable prefix", |s| {
            !s.starts_with("in.")
        })
    }

    fn server() -> impl Strategy<Value = ServerConfig> {
        (
            prop::sample::select(LdapVendor::ALL.to_vec()),
            text(),
            prop::bool::ANY,
            text(),
            text(),
            prop::bool::ANY,
            text(),
        )
            .prop_map(|(vendor, url, anonymous, user_name, password, use_ssl, context)| {
                ServerConfig {
                    vendor,
                    url,
                    auth_kind: if anonymous {
                        AuthenticationKind::None
                    } else {
                        AuthenticationKind::Simple
                    },
                    user_name,
                    password,
                    use_ssl,
                    default_context: context,
                }
            })
    }

    fn filter() -> impl Strategy<Value = FilterSpec> {
        prop_oneof![
            prop::collection::btree_map(ident(), text(), 0..4).prop_map(|terms| {
                FilterSpec::AttributeTable {
                    terms: terms
                        .into_iter()
                        .map(|(attribute, value)| FilterTerm { attribute, value })
                        .collect(),
                }
            }),
            "[ -~]{0,24}".prop_map(|template| FilterSpec::FreeText { template }),
        ]
    }

    fn result() -> impl Strategy<Value = ResultSpec> {
        prop_oneof![
            prop::collection::btree_map(ident(), text(), 0..4).prop_map(|bindings| {
                ResultSpec::SingleRow {
                    bindings: bindings
                        .into_iter()
                        .map(|(attribute, output)| AttributeBinding { attribute, output })
                        .collect(),
                }
            }),
            (prop::collection::btree_set(ident(), 0..4), text()).prop_map(
                |(attributes, output)| ResultSpec::MultiRow {
                    attributes: attributes.into_iter().collect(),
                    output,
                }
            ),
        ]
    }

    fn spec() -> impl Strategy<Value = QuerySpec> {
        (
            server(),
            prop::sample::select(vec![
                SearchScope::Object,
                SearchScope::OneLevel,
                SearchScope::Subtree,
            ]),
            text(),
            filter(),
            result(),
            prop::bool::ANY,
            text(),
            prop::option::of(ident()),
            prop::bool::ANY,
        )
            .prop_map(
                |(
                    server,
                    scope,
                    base_object,
                    filter,
                    result,
                    include_entry_name,
                    entry_name_output,
                    sort_attribute,
                    sort_descending,
                )| QuerySpec {
                    server,
                    scope,
                    base_object,
                    filter,
                    result,
                    include_entry_name,
                    entry_name_output,
                    sort_attribute,
                    sort_descending,
                },
            )
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(spec in spec()) {
            let text = spec.encode();
            prop_assert_eq!(QuerySpec::decode(&text).unwrap(), spec);
        }
    }
}
