//! Entity registry against a live database.

mod common;

use common::TestDb;
use helpdesk_core::DataError;
use helpdesk_core::registry::agent::{
    add_dept_agent, get_agents_by_dept, remove_dept_agent, set_head_for_agent,
};
use helpdesk_core::registry::dept::{
    create_dept, edit_dept_name, get_departments, get_dept_labels, subscribe_dept_to_label,
};
use helpdesk_core::registry::label::{
    create_label, edit_label_color, edit_label_deadline, edit_label_title, get_labels,
};
use helpdesk_core::registry::priority::{
    create_priority, edit_priority_level, edit_priority_title, get_priorities,
};
use helpdesk_core::registry::user::{get_users, get_users_outside_dept};
use helpdesk_core::registry::{AddDeptAgentResult, SubscribeDeptToLabelResult};

#[tokio::test]
async fn label_edits_are_visible() {
    let t = TestDb::start().await;
    let pool = t.pool();

    let lid = create_label(pool, "Bug", 0xc0debeef, Some(7)).await.unwrap();
    assert_ne!(lid, 0);
    assert!(edit_label_title(pool, lid, "Defect").await.unwrap());
    assert!(edit_label_color(pool, lid, 0xdeadbeef).await.unwrap());
    assert!(edit_label_deadline(pool, lid, None).await.unwrap());

    let labels = get_labels(pool).await.unwrap();
    assert_eq!(labels.len(), 1);
    assert_eq!(labels[0].title, "Defect");
    assert_eq!(labels[0].color, 0xdeadbeef);
    assert_eq!(labels[0].deadline, None);

    assert!(edit_label_deadline(pool, lid, Some(3)).await.unwrap());
    assert_eq!(get_labels(pool).await.unwrap()[0].deadline, Some(3));
}

#[tokio::test]
async fn sentinel_ids_are_not_found() {
    let t = TestDb::start().await;
    let pool = t.pool();

    assert!(!edit_label_title(pool, 0, "x").await.unwrap());
    assert!(!edit_label_color(pool, 0, 0).await.unwrap());
    assert!(!edit_label_deadline(pool, 0, Some(1)).await.unwrap());
    assert!(!edit_priority_title(pool, 0, "x").await.unwrap());
    assert!(!edit_priority_level(pool, 0, 1).await.unwrap());
    assert!(!edit_dept_name(pool, 0, "x").await.unwrap());
    assert_eq!(set_head_for_agent(pool, 0, "nobody", true).await.unwrap(), None);
}

#[tokio::test]
async fn oversized_input_is_rejected_before_storage() {
    let t = TestDb::start().await;
    let long = "x".repeat(65);
    let err = create_dept(t.pool(), &long).await.unwrap_err();
    assert!(matches!(err, DataError::ValidationError(_)));
    assert!(matches!(
        create_label(t.pool(), "ok", 0, Some(0)).await,
        Err(DataError::ValidationError(_))
    ));
    assert!(get_departments(t.pool()).await.unwrap().is_empty());
}

#[tokio::test]
async fn priorities_round_trip() {
    let t = TestDb::start().await;
    let pool = t.pool();

    let pid = create_priority(pool, "Low", 1).await.unwrap();
    assert!(edit_priority_level(pool, pid, 5).await.unwrap());
    assert!(edit_priority_title(pool, pid, "High").await.unwrap());
    let priorities = get_priorities(pool).await.unwrap();
    assert_eq!(priorities.len(), 1);
    assert_eq!((priorities[0].title.as_str(), priorities[0].priority), ("High", 5));
}

#[tokio::test]
async fn agent_membership() {
    let t = TestDb::start().await;
    let pool = t.pool();
    t.user("alice").await;
    t.user("bob").await;
    let dept = create_dept(pool, "Billing").await.unwrap();
    assert!(edit_dept_name(pool, dept, "Accounts").await.unwrap());

    assert_eq!(
        add_dept_agent(pool, dept, "alice", true).await.unwrap(),
        AddDeptAgentResult::Success
    );
    assert_eq!(
        add_dept_agent(pool, dept, "alice", false).await.unwrap(),
        AddDeptAgentResult::AlreadyExists
    );
    assert_eq!(
        add_dept_agent(pool, 0, "alice", false).await.unwrap(),
        AddDeptAgentResult::NoDept
    );
    assert_eq!(
        add_dept_agent(pool, dept, "nobody", false).await.unwrap(),
        AddDeptAgentResult::NoUser
    );

    let outside = get_users_outside_dept(pool, dept).await.unwrap();
    assert_eq!(outside.len(), 1);
    assert_eq!(outside[0].user_id, "bob");
    assert_eq!(get_users(pool).await.unwrap().len(), 2);

    assert_eq!(get_agents_by_dept(pool, dept).await.unwrap().len(), 1);
    assert_eq!(set_head_for_agent(pool, dept, "alice", false).await.unwrap(), Some(true));

    assert_eq!(remove_dept_agent(pool, dept, "alice").await.unwrap(), Some(false));
    assert_eq!(remove_dept_agent(pool, dept, "alice").await.unwrap(), None);
    assert!(get_agents_by_dept(pool, dept).await.unwrap().is_empty());
}

#[tokio::test]
async fn dept_label_subscriptions() {
    let t = TestDb::start().await;
    let pool = t.pool();
    let dept = create_dept(pool, "IT").await.unwrap();
    let label = create_label(pool, "Network", 0x00ff00ff, None).await.unwrap();

    let subscribe = |d, l| subscribe_dept_to_label(pool, d, l);
    assert_eq!(subscribe(dept, label).await.unwrap(), SubscribeDeptToLabelResult::Success);
    assert_eq!(
        subscribe(dept, label).await.unwrap(),
        SubscribeDeptToLabelResult::AlreadyExists
    );
    assert_eq!(subscribe(0, label).await.unwrap(), SubscribeDeptToLabelResult::NoDept);
    assert_eq!(subscribe(dept, 0).await.unwrap(), SubscribeDeptToLabelResult::NoLabel);
    assert_eq!(get_dept_labels(pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_subscriptions_yield_one_success() {
    let t = TestDb::start().await;
    let pool = t.pool();
    let dept = create_dept(pool, "Ops").await.unwrap();
    let label = create_label(pool, "Outage", 0xff0000ff, None).await.unwrap();

    let (a, b) = tokio::join!(
        subscribe_dept_to_label(pool, dept, label),
        subscribe_dept_to_label(pool, dept, label),
    );
    let mut outcomes = [a.unwrap(), b.unwrap()];
    outcomes.sort_by_key(|o| *o == SubscribeDeptToLabelResult::AlreadyExists);
    assert_eq!(
        outcomes,
        [SubscribeDeptToLabelResult::Success, SubscribeDeptToLabelResult::AlreadyExists]
    );
}

#[tokio::test]
async fn schema_carries_every_declared_constraint() {
    let t = TestDb::start().await;
    t.db.verify_constraints().await.unwrap();
}
