//! Configuration text in, process data out.

use ldq_query::{
    DirectoryEntry, OutputBinder, ProcessData, Recordset, ReplayDirectory, SearchRequest,
    SearchScope, Value,
};
use serde_json::json;

use crate::common::{self, MULTI_ROW_CONFIG, SINGLE_ROW_CONFIG};

fn text(s: &str) -> Value {
    Value::from(s)
}

// ============================================================================
// Single-row queries
// ============================================================================

#[tokio::test]
async fn single_row_binds_first_entry() {
    let dir = common::people();
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let mut data = common::process_data();
    element.perform(&mut data).await.unwrap();

    assert_eq!(data.get("person.name"), Some(&text("Carol")));
    assert_eq!(data.get("person.mail"), Some(&text("carol@example.com")));
    assert_eq!(data.get("person.dn"), Some(&text("cn=carol,ou=people")));

    assert_eq!(
        dir.requests().await,
        vec![SearchRequest {
            base: "ou=people".to_string(),
            scope: SearchScope::Subtree,
            filter: "(&(objectClass=person)(sn=Smith))".to_string(),
            attributes: vec!["cn".to_string(), "mail".to_string()],
        }]
    );
}

#[tokio::test]
async fn single_row_pulls_one_entry_of_many() {
    let dir = common::people();
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    element.perform(&mut common::process_data()).await.unwrap();

    assert_eq!(dir.entries().len(), 3);
    assert_eq!(dir.entries_pulled(), 1);
}

#[tokio::test]
async fn single_row_without_entries_clears_outputs() {
    let dir = ReplayDirectory::new(Vec::new());
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let mut data: ProcessData = serde_json::from_value(json!({
        "department": "ou=people",
        "person": { "name": "stale", "mail": "stale", "dn": "stale" }
    }))
    .unwrap();
    element.perform(&mut data).await.unwrap();

    assert_eq!(data.get("person.name"), Some(&Value::Null));
    assert_eq!(data.get("person.mail"), Some(&Value::Null));
    assert_eq!(data.get("person.dn"), Some(&Value::Null));
}

#[tokio::test]
async fn single_row_absent_attribute_is_empty_text() {
    let dir = ReplayDirectory::new(vec![common::person("cn=bob", "Bob", None)]);
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let mut data = common::process_data();
    element.perform(&mut data).await.unwrap();

    assert_eq!(data.get("person.name"), Some(&text("Bob")));
    assert_eq!(data.get("person.mail"), Some(&text("")));
}

#[tokio::test]
async fn blank_base_object_reports_bare_entry_name() {
    let config = SINGLE_ROW_CONFIG.replace("search_root_object=in.department", "search_root_object=");
    let dir = ReplayDirectory::new(vec![common::person("cn=Alice", "Alice", None)]);
    let element = common::element(&dir, &config);

    let mut data = common::process_data();
    element.perform(&mut data).await.unwrap();

    assert_eq!(data.get("person.dn"), Some(&text("cn=Alice")));
    assert_eq!(dir.requests().await[0].base, "");
}

#[tokio::test]
async fn multi_valued_attribute_binds_a_list() {
    let dir = ReplayDirectory::new(vec![DirectoryEntry::new("cn=alice")
        .with_attribute("cn", ["Alice"])
        .with_attribute("mail", ["alice@example.com", "a.smith@example.com"])]);
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let mut data = common::process_data();
    element.perform(&mut data).await.unwrap();

    assert_eq!(
        data.get("person.mail"),
        Some(&Value::from(vec![
            "alice@example.com".to_string(),
            "a.smith@example.com".to_string(),
        ]))
    );
}

// ============================================================================
// Multi-row queries
// ============================================================================

#[tokio::test]
async fn multi_row_fills_recordset_slot_sorted() {
    let dir = common::people();
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    let mut data = common::process_data();
    data.set_output("people", Value::Recordset(Recordset::default())).unwrap();
    element.perform(&mut data).await.unwrap();

    let Some(Value::Recordset(table)) = data.get("people") else {
        panic!("expected a recordset, got {:?}", data.get("people"));
    };
    assert_eq!(table.columns, vec!["EntryName", "cn", "mail"]);
    assert_eq!(
        table.rows,
        vec![
            vec![text("cn=alice,ou=people"), text("alice"), text("alice@example.com")],
            vec![text("cn=bob,ou=people"), text("Bob"), text("")],
            vec![text("cn=carol,ou=people"), text("Carol"), text("carol@example.com")],
        ]
    );
    assert_eq!(dir.entries_pulled(), 3);
}

#[tokio::test]
async fn multi_row_fills_list_slot() {
    let config = MULTI_ROW_CONFIG.replace("result_sort_order=ascending", "result_sort_order=descending");
    let dir = common::people();
    let element = common::element(&dir, &config);

    let mut data = common::process_data();
    element.perform(&mut data).await.unwrap();

    let Some(Value::List(rows)) = data.get("people") else {
        panic!("expected a list, got {:?}", data.get("people"));
    };
    let names: Vec<String> = rows
        .iter()
        .map(|row| match row {
            Value::List(cells) => cells[1].to_string(),
            other => panic!("expected a row list, got {other:?}"),
        })
        .collect();
    assert_eq!(names, vec!["Carol", "Bob", "alice"]);
}

#[tokio::test]
async fn multi_row_expands_free_text_filter() {
    let dir = common::people();
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    element.perform(&mut common::process_data()).await.unwrap();

    let requests = dir.requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].filter, "(&(objectClass=person)(l=Zurich))");
    assert_eq!(requests[0].scope, SearchScope::OneLevel);
    assert_eq!(requests[0].attributes, vec!["cn", "mail"]);
}

#[tokio::test]
async fn multi_row_empty_result_clears_recordset_slot() {
    let dir = ReplayDirectory::new(Vec::new());
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    let mut data = common::process_data();
    data.set_output("people", Value::Recordset(Recordset::default())).unwrap();
    element.perform(&mut data).await.unwrap();

    assert_eq!(data.get("people"), Some(&Value::Null));
}

#[tokio::test]
async fn multi_row_keeps_column_count_for_sparse_entries() {
    let dir = ReplayDirectory::new(vec![
        DirectoryEntry::new("cn=x"),
        common::person("cn=y", "Y", Some("y@example.com")),
    ]);
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    let mut data = common::process_data();
    data.set_output("people", Value::Recordset(Recordset::default())).unwrap();
    element.perform(&mut data).await.unwrap();

    let Some(Value::Recordset(table)) = data.get("people") else {
        panic!("expected a recordset");
    };
    assert!(table.rows.iter().all(|row| row.len() == table.columns.len()));
}

// ============================================================================
// Configuration handling
// ============================================================================

#[tokio::test]
async fn invalid_reconfiguration_keeps_running_query() {
    let dir = common::people();
    let mut element = common::element(&dir, SINGLE_ROW_CONFIG);
    element.set_configuration("result_return=all\nbad=\\uZZZZ\n");

    let mut data = common::process_data();
    element.perform(&mut data).await.unwrap();

    assert!(!element.spec().is_multi_row());
    assert_eq!(data.get("person.name"), Some(&text("Carol")));
}

#[test]
fn configuration_survives_encode_and_decode() {
    let dir = common::people();
    let element = common::element(&dir, MULTI_ROW_CONFIG);

    let text = element.spec().encode();
    let decoded = ldq_query::QuerySpec::decode(&text).unwrap();
    assert_eq!(&decoded, element.spec());
}
