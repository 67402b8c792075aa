#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Query-layer operations against in-memory `SQLite`.

mod common;

use common::{item, item_data, seed, setup};
use sea_orm::{ColumnTrait, Condition, Value};
use tracing_test::traced_test;
use watchlist_db::{
    ChangeOptions, CountQuery, DbError, DisableFieldType, DisableRequest, EntityQuery,
    FieldValues, ItemQuery, ListQuery, NoneFields, OrderBy, QueryError,
};

fn items(session: &watchlist_db::Session) -> EntityQuery<item::Entity> {
    EntityQuery::new(session.clone())
}

#[tokio::test]
async fn create_then_get_returns_the_same_fields() {
    let db = setup("q_roundtrip").await;
    let session = db.session();
    let q = items(&session);

    let data = FieldValues::new()
        .set("name", "Cowboy Bebop")
        .set("note", "see you space cowboy")
        .set("score", 98_i16);
    let created = q.create_item(data, false).await.unwrap();
    assert!(!session.in_transaction().await);

    let found = q
        .get_item(created.id, ItemQuery::default())
        .await
        .unwrap()
        .expect("created item is visible");
    assert_eq!(found.name, "Cowboy Bebop");
    assert_eq!(found.note.as_deref(), Some("see you space cowboy"));
    assert_eq!(found.score, Some(98));
    assert!(!found.disabled);
    assert_eq!(found, created);
}

#[tokio::test]
async fn get_by_other_field_and_missing_item() {
    let db = setup("q_get_field").await;
    let session = db.session();
    seed(&session, &[("Akira", Some(90)), ("Paprika", None)]).await;
    let q = items(&session);

    let found = q
        .get_item("Paprika".to_owned(), ItemQuery::by_field("name"))
        .await
        .unwrap();
    assert_eq!(found.map(|i| i.name).as_deref(), Some("Paprika"));

    let extra = ItemQuery::by_field("name").filter(Condition::all().add(item::Column::Score.gt(95)));
    assert!(q.get_item("Akira".to_owned(), extra).await.unwrap().is_none());

    assert!(q.get_item(9999, ItemQuery::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn unknown_identity_field_fails_before_io() {
    let db = setup("q_unknown_field").await;
    let session = db.session();
    session.close().await.unwrap();

    // A closed session would fail any statement; the field error must come first.
    let err = items(&session)
        .get_item(1, ItemQuery::by_field("nonexistent_field"))
        .await
        .unwrap_err();
    match err {
        QueryError::UnknownField { model, field } => {
            assert_eq!(model, "items");
            assert_eq!(field, "nonexistent_field");
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let err = items(&session)
        .get_item(1, ItemQuery::default())
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::Db(DbError::SessionClosed)));
}

#[tokio::test]
async fn count_with_and_without_filters() {
    let db = setup("q_count").await;
    let session = db.session();
    seed(&session, &[("a", Some(10)), ("b", Some(50)), ("c", None)]).await;
    let q = items(&session);

    assert_eq!(q.get_items_count(CountQuery::default()).await.unwrap(), 3);
    let high = CountQuery::default().filter(Condition::all().add(item::Column::Score.gte(50)));
    assert_eq!(q.get_items_count(high).await.unwrap(), 1);
    let none = CountQuery::default().filter(Condition::all().add(item::Column::Name.eq("zzz")));
    assert_eq!(q.get_items_count(none).await.unwrap(), 0);
}

#[tokio::test]
async fn search_treats_pattern_characters_literally() {
    let db = setup("q_search_escape").await;
    let session = db.session();
    seed(
        &session,
        &[("Mega 50%_OFF sale", None), ("50 percent off", None), ("5000 off", None)],
    )
    .await;
    let q = items(&session);

    let found = q
        .get_item_list(ListQuery::default().search("50%_off", ["name"]))
        .await
        .unwrap();
    let names: Vec<_> = found.into_iter().map(|i| i.name).collect();
    assert_eq!(names, vec!["Mega 50%_OFF sale".to_owned()]);

    let err = q
        .get_item_list(ListQuery::default().search("x", ["nope"]))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { .. }));
}

#[tokio::test]
async fn search_ors_fields_and_ands_filters() {
    let db = setup("q_search_or").await;
    let session = db.session();
    let seeded = seed(
        &session,
        &[("Trigun", Some(80)), ("Gungrave", Some(60)), ("Monster", Some(95))],
    )
    .await;
    let q = items(&session);
    let staged = FieldValues::new().set("note", "gunslinger");
    q.change_item(staged, seeded[2].clone(), ChangeOptions::default())
        .await
        .unwrap();

    let all = q
        .get_item_list(
            ListQuery::default()
                .search("GUN", ["name", "note"])
                .order_by(OrderBy::asc("name")),
        )
        .await
        .unwrap();
    let names: Vec<_> = all.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["Gungrave", "Monster", "Trigun"]);

    let filtered = q
        .get_item_list(
            ListQuery::default()
                .search("gun", ["name", "note"])
                .filter(Condition::all().add(item::Column::Score.gt(70))),
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 2);
}

#[tokio::test]
async fn ordering_and_pagination() {
    let db = setup("q_paging").await;
    let session = db.session();
    seed(
        &session,
        &[("a", Some(1)), ("b", Some(2)), ("c", Some(3)), ("d", Some(4))],
    )
    .await;
    let q = items(&session);

    let page = q
        .get_item_list(
            ListQuery::default()
                .order_by(OrderBy::parse("-score"))
                .paginate(Some(2), Some(1)),
        )
        .await
        .unwrap();
    let names: Vec<_> = page.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, ["c", "b"]);

    let past_end = q
        .get_item_list(ListQuery::default().paginate(Some(10), Some(10)))
        .await
        .unwrap();
    assert!(past_end.is_empty());

    let err = q
        .get_item_list(ListQuery::default().order_by(OrderBy::asc("rating")))
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::UnknownField { .. }));
}

#[tokio::test]
async fn change_reports_whether_anything_differs() {
    let db = setup("q_change").await;
    let session = db.session();
    let item = seed(&session, &[("Nana", Some(70))]).await.remove(0);
    let q = items(&session);

    let same = FieldValues::new().set("name", "Nana").set("score", 70_i16);
    let (updated, item) = q
        .change_item(same, item, ChangeOptions::default())
        .await
        .unwrap();
    assert!(!updated);

    let differs = FieldValues::new().set("name", "Nana").set("score", 75_i16);
    let (updated, item) = q
        .change_item(differs, item, ChangeOptions::default())
        .await
        .unwrap();
    assert!(updated);
    assert_eq!(item.score, Some(75));

    let stored = q.get_item(item.id, ItemQuery::default()).await.unwrap().unwrap();
    assert_eq!(stored.score, Some(75));
}

#[tokio::test]
async fn change_skips_nulls_unless_allowed() {
    let db = setup("q_change_null").await;
    let session = db.session();
    let item = seed(&session, &[("Mushishi", Some(88))]).await.remove(0);
    let q = items(&session);

    let nulls = FieldValues::new().set_null("score").set_null("note");
    let (updated, item) = q
        .change_item(nulls.clone(), item, ChangeOptions::default())
        .await
        .unwrap();
    assert!(!updated);
    assert_eq!(item.score, Some(88));

    let only_note = ChangeOptions::default().set_none(NoneFields::only(["note"]));
    let (updated, item) = q.change_item(nulls.clone(), item, only_note).await.unwrap();
    assert!(!updated, "note was already null");
    assert_eq!(item.score, Some(88));

    let all = ChangeOptions::default().set_none(NoneFields::All);
    let (updated, item) = q.change_item(nulls, item, all).await.unwrap();
    assert!(updated);
    assert_eq!(item.score, None);
}

#[tokio::test]
async fn change_rejects_wrong_value_type() {
    let db = setup("q_change_type").await;
    let session = db.session();
    let item = seed(&session, &[("Ping Pong", Some(91))]).await.remove(0);

    let err = items(&session)
        .change_item(
            FieldValues::new().set("score", "high"),
            item,
            ChangeOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::FieldType { .. }));

    let err = items(&session)
        .create_item(FieldValues::new().set("name", 5_i32), false)
        .await
        .unwrap_err();
    assert!(matches!(err, QueryError::FieldType { .. }));
}

#[tokio::test]
async fn staged_writes_are_discarded_by_rollback() {
    let db = setup("q_staged").await;
    let session = db.session();
    let q = items(&session);

    q.create_item(item_data("draft", None), true).await.unwrap();
    assert!(session.in_transaction().await);
    assert_eq!(q.get_items_count(CountQuery::default()).await.unwrap(), 1);

    session.rollback().await.unwrap();
    assert_eq!(q.get_items_count(CountQuery::default()).await.unwrap(), 0);
}

#[tokio::test]
async fn delete_removes_item() {
    let db = setup("q_delete").await;
    let session = db.session();
    let item = seed(&session, &[("Erased", None)]).await.remove(0);
    let q = items(&session);

    assert!(q.delete_item(item.clone(), false).await);
    assert!(q.get_item(item.id, ItemQuery::default()).await.unwrap().is_none());
}

#[tokio::test]
#[traced_test]
async fn delete_failure_returns_false_and_logs() {
    let db = setup("q_delete_fail").await;
    let session = db.session();
    let item = seed(&session, &[("Kept", None)]).await.remove(0);
    session.close().await.unwrap();

    assert!(!items(&session).delete_item(item.clone(), false).await);
    assert!(logs_contain("delete failed"));

    let fresh = db.session();
    assert!(items(&fresh).get_item(item.id, ItemQuery::default()).await.unwrap().is_some());
}

#[tokio::test]
async fn disable_with_no_ids_touches_nothing() {
    let db = setup("q_disable_empty").await;
    let session = db.session();
    session.close().await.unwrap();

    // Even on a closed session and an unknown field, nothing is attempted.
    let req = DisableRequest::new(Vec::<i32>::new(), "nope", DisableFieldType::Boolean);
    assert_eq!(items(&session).disable_items(req).await.unwrap(), 0);
}

#[tokio::test]
async fn disable_boolean_is_idempotent() {
    let db = setup("q_disable_bool").await;
    let session = db.session();
    let seeded = seed(&session, &[("a", None), ("b", None), ("c", None)]).await;
    let q = items(&session);
    let ids = [seeded[0].id, seeded[1].id];

    let first = q
        .disable_items(DisableRequest::new(ids, "disabled", DisableFieldType::Boolean))
        .await
        .unwrap();
    assert_eq!(first, 2);
    let second = q
        .disable_items(DisableRequest::new(ids, "disabled", DisableFieldType::Boolean))
        .await
        .unwrap();
    assert_eq!(second, 0);

    let forced = q
        .disable_items(DisableRequest::new(ids, "disabled", DisableFieldType::Boolean).overwrite())
        .await
        .unwrap();
    assert_eq!(forced, 2);

    let enabled = CountQuery::default().filter(Condition::all().add(item::Column::Disabled.eq(false)));
    assert_eq!(q.get_items_count(enabled).await.unwrap(), 1);
}

#[tokio::test]
async fn disable_timestamp_sets_time_once() {
    let db = setup("q_disable_ts").await;
    let session = db.session();
    let seeded = seed(&session, &[("a", None), ("b", None)]).await;
    let q = items(&session);

    let kind = DisableFieldType::from_column::<item::Entity>("disabled_at").unwrap();
    assert_eq!(kind, DisableFieldType::Timestamp);
    let ids: Vec<Value> = seeded.iter().map(|i| Value::from(i.id)).collect();

    let extra = Condition::all().add(item::Column::Name.eq("a"));
    let first = q
        .disable_items(DisableRequest::new(ids.clone(), "disabled_at", kind).filter(extra))
        .await
        .unwrap();
    assert_eq!(first, 1);
    let second = q
        .disable_items(DisableRequest::new(ids, "disabled_at", kind))
        .await
        .unwrap();
    assert_eq!(second, 1, "only 'b' was still enabled");

    let stamped = q
        .get_item(seeded[0].id, ItemQuery::default())
        .await
        .unwrap()
        .unwrap();
    assert!(stamped.disabled_at.is_some());
}

#[test]
fn disable_field_type_is_checked() {
    let err = DisableFieldType::from_column::<item::Entity>("name").unwrap_err();
    assert!(matches!(err, QueryError::DisableFieldType { .. }));
    assert_eq!(
        DisableFieldType::from_column::<item::Entity>("disabled").unwrap(),
        DisableFieldType::Boolean
    );
}
