//! One element serving overlapping invocations.

use ldq_query::Value;
use serde_json::json;

use crate::common::{self, SINGLE_ROW_CONFIG};

#[tokio::test]
async fn concurrent_performs_use_their_own_variables() {
    let dir = common::people();
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let mut first = common::process_data();
    let mut second: ldq_query::ProcessData = serde_json::from_value(json!({
        "department": "ou=staff",
        "surname": "Jones",
        "person": {}
    }))
    .unwrap();

    let (a, b) = tokio::join!(element.perform(&mut first), element.perform(&mut second));
    a.unwrap();
    b.unwrap();

    assert_eq!(first.get("person.dn"), Some(&Value::from("cn=carol,ou=people")));
    assert_eq!(second.get("person.dn"), Some(&Value::from("cn=carol,ou=staff")));

    let mut filters: Vec<String> = dir.requests().await.into_iter().map(|r| r.filter).collect();
    filters.sort();
    assert_eq!(
        filters,
        vec![
            "(&(objectClass=person)(sn=Jones))",
            "(&(objectClass=person)(sn=Smith))",
        ]
    );
    assert_eq!(dir.connects(), 2);
    assert_eq!(dir.clients_closed(), 2);
}

#[tokio::test]
async fn failing_invocation_does_not_disturb_another() {
    let dir = common::people();
    let element = common::element(&dir, SINGLE_ROW_CONFIG);

    let mut good = common::process_data();
    let mut unbindable = ldq_query::ProcessData::new();

    let (a, b) = tokio::join!(element.perform(&mut good), element.perform(&mut unbindable));
    a.unwrap();
    assert!(b.unwrap_err().is_binding_error());

    assert_eq!(good.get("person.name"), Some(&Value::from("Carol")));
    assert_eq!(dir.cursors_closed(), 2);
    assert_eq!(dir.clients_closed(), 2);
}
