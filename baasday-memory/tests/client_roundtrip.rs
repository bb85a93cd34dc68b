//! Drives `MemoryTransport` through the real `ApiClient`, so every request and
//! response crosses the wire codec exactly as it would over HTTP.

use baasday_core::{
    client::ApiClient,
    error::{BaasdayError, ErrorKind},
    query::{Filter, Query, SortDirection},
    update::Update,
    value::FieldAccess,
    value_map,
};
use baasday_memory::MemoryTransport;
use chrono::{TimeZone, Utc};

fn setup() -> (MemoryTransport, ApiClient<MemoryTransport>) {
    let transport = MemoryTransport::new("app", "key");
    let client = ApiClient::new(transport.client_config(), transport.clone());
    (transport, client)
}

#[test]
fn created_documents_can_be_fetched_updated_and_deleted() {
    let (transport, client) = setup();
    let due = Utc.with_ymd_and_hms(2014, 7, 1, 12, 0, 0).unwrap();

    let created = client
        .create_values("items/tasks", &value_map! { "title" => "write", "due" => due, "views" => 0 })
        .unwrap();
    let id = created.get_string("_id").unwrap().unwrap().to_string();
    let path = format!("items/tasks/{id}");

    let fetched = client.fetch_values(&path).unwrap();
    assert_eq!(fetched.get_date("due").unwrap(), Some(due));

    let updated = client
        .update(
            &path,
            &Update::merge([
                Update::increment("views", 2),
                Update::push_unique("tags", "rust"),
                Update::set("title", "rewrite"),
            ]),
        )
        .unwrap();
    assert_eq!(updated.get_int("views").unwrap(), 2);
    assert_eq!(updated.get_string("title").unwrap(), Some("rewrite"));
    assert_eq!(updated.get_list("tags").unwrap().map(<[_]>::len), Some(1));
    assert!(updated.get_date("_updatedAt").unwrap() >= created.get_date("_updatedAt").unwrap());

    client.delete(&path).unwrap();
    assert!(transport.documents("items/tasks").is_empty());

    let err = client.fetch_values(&path).unwrap_err();
    assert!(matches!(err, BaasdayError::Api { status: 404, .. }));
}

#[test]
fn list_count_is_independent_of_page_size() {
    let (_, client) = setup();
    for n in 0..7 {
        client
            .create_values("items/numbers", &value_map! { "n" => n, "even" => n % 2 == 0 })
            .unwrap();
    }

    let query = Query::builder()
        .filter(Filter::eq("even", true))
        .sort("n", SortDirection::Desc)
        .limit(2)
        .build();
    let page = client.fetch_all_values("items/numbers", &query).unwrap();

    assert_eq!(page.count(), 4);
    let numbers: Vec<i32> = page.iter().map(|document| document.get_int("n").unwrap()).collect();
    assert_eq!(numbers, vec![6, 4]);
}

#[test]
fn combined_filters_select_server_side() {
    let (_, client) = setup();
    for (name, score) in [("alice", 90), ("bob", 40), ("carol", 75), ("dave", 10)] {
        client
            .create_values("items/players", &value_map! { "name" => name, "score" => score })
            .unwrap();
    }

    let query = Query::builder()
        .filter(Filter::or([
            Filter::gte("score", 80),
            Filter::and([Filter::lt("score", 50), Filter::ne("name", "dave")]),
        ]))
        .sort("name", SortDirection::Asc)
        .build();
    let page = client.fetch_all_values("items/players", &query).unwrap();
    let names: Vec<&str> = page
        .iter()
        .map(|document| document.get_string("name").unwrap().unwrap())
        .collect();

    assert_eq!(names, vec!["alice", "bob"]);
}

#[test]
fn leaderboards_ignore_filters_and_rank_by_score() {
    let (_, client) = setup();
    for (name, score) in [("alice", 90), ("bob", 40), ("carol", 90)] {
        client
            .create_values("leaderboards/weekly", &value_map! { "name" => name, "_score" => score })
            .unwrap();
    }

    let query = Query::builder()
        .filter(Filter::eq("name", "bob"))
        .sort("name", SortDirection::Desc)
        .build();
    let page = client.fetch_all_values("leaderboards/weekly", &query).unwrap();
    let ranks: Vec<(&str, i32)> = page
        .iter()
        .map(|entry| (entry.get_string("name").unwrap().unwrap(), entry.get_int("_rank").unwrap()))
        .collect();

    assert_eq!(page.count(), 3);
    assert_eq!(ranks, vec![("alice", 1), ("carol", 1), ("bob", 3)]);
}

#[test]
fn wrong_credentials_surface_as_api_errors() {
    let (transport, _) = setup();
    let mut config = transport.client_config();
    config.api_key = "stolen".to_string();
    let client = ApiClient::new(config, transport);

    let err = client.fetch_values("items/notes/x").unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Api);
    assert!(matches!(err, BaasdayError::Api { status: 401, .. }));
}
