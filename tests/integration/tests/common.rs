//! Common test utilities and fixtures.

use ldq_query::{DirectoryEntry, LdapQueryElement, ProcessData, ReplayDirectory};
use serde_json::json;

/// Single-row query: first person's name and mail plus its entry name.
pub const SINGLE_ROW_CONFIG: &str = "\
server_provider=OpenLDAP
server_url=ldap\\://dir.example.com
search_root_object=in.department
search_scope=subTree
search_filter_attribute_0=objectClass
search_filter_value_0=\"person\"
search_filter_attribute_1=sn
search_filter_value_1=in.surname
result_table_attribute_0=cn
result_table_value_0=in.person.name
result_table_attribute_1=mail
result_table_value_1=in.person.mail
result_include_name=true
result_ivyGrid_name_attribute=in.person.dn
result_return=onlyFirst
";

/// Multi-row query: all people, sorted by `cn`, into `in.people`.
pub const MULTI_ROW_CONFIG: &str = "\
server_url=ldap\\://dir.example.com
search_root_object=in.department
search_scope=oneLevel
search_filter_format=filterText
search_filter_text=(&(objectClass=person)(l=in.city))
result_attribute_attribute_0=cn
result_attribute_attribute_1=mail
result_ivyGrid_attribute=in.people
result_include_name2=true
result_sort_attribute=cn
result_sort_order=ascending
result_return=all
";

/// Initializes test logging once; `RUST_LOG` selects the level.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ldq_query=debug".to_string()),
        )
        .with_test_writer()
        .try_init();
}

/// Creates a person entry.
pub fn person(name: &str, cn: &str, mail: Option<&str>) -> DirectoryEntry {
    let entry = DirectoryEntry::new(name)
        .with_attribute("cn", [cn])
        .with_attribute("objectClass", ["top", "person"]);
    match mail {
        Some(mail) => entry.with_attribute("mail", [mail]),
        None => entry,
    }
}

/// Three people, deliberately out of order.
pub fn people() -> ReplayDirectory {
    ReplayDirectory::new(vec![
        person("cn=carol", "Carol", Some("carol@example.com")),
        person("cn=alice", "alice", Some("alice@example.com")),
        person("cn=bob", "Bob", None),
    ])
}

/// Process data with the variables the fixture configurations use.
pub fn process_data() -> ProcessData {
    serde_json::from_value(json!({
        "department": "ou=people",
        "surname": "Smith",
        "city": "Zurich",
        "person": {}
    }))
    .expect("valid process data")
}

/// Creates an element on `directory` configured with `config`.
pub fn element(directory: &ReplayDirectory, config: &str) -> LdapQueryElement<ReplayDirectory> {
    init_tracing();
    let mut element = LdapQueryElement::with_connector(directory.clone());
    element.set_configuration(config);
    element
}
