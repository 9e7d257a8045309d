use connector::{
    client::response_body, Call, Collection, Connector, DeleteHandler, DetailHandler, Endpoint,
    Envelope, Error, ListHandler, OrderDirection, OrderParams, PageParams, PostHandler,
    PutHandler, Resource, SecondaryDeleteHandler, SecondaryDetailHandler, SecondaryEndpoint,
    SecondaryListHandler, SecondaryPostHandler, SecondaryPutHandler, SecondaryResource, Verb,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::num::NonZeroU32;
use std::sync::{Arc, Mutex};
use tide::{Body, Request, Response, StatusCode};

connector::connector! {
    /// A pet store, served in-process by tide.
    pub struct PetStore {
        pets: Pets => "pets" [get, post, put, delete] {
            orders: PetOrders => "orders" [get, post, put, delete],
        },
        tags: Tags => "tags" [get],
        labels: Labels => "labels" [get],
        status: Status => "status" [get],
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Seen {
    method: String,
    path: String,
    query: Option<String>,
    body: Value,
}

/// Every request the test server received, in order.
#[derive(Clone, Default)]
struct Log(Arc<Mutex<Vec<Seen>>>);

impl Log {
    fn record(&self, req: &Request<Log>, body: Value) {
        self.0.lock().unwrap().push(Seen {
            method: req.method().to_string(),
            path: req.url().path().to_owned(),
            query: req.url().query().map(str::to_owned),
            body,
        });
    }

    fn take(&self) -> Vec<Seen> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}

fn json_response(status: StatusCode, value: Value) -> tide::Result {
    Ok(Response::builder(status)
        .body(Body::from_json(&value)?)
        .build())
}

async fn json_body(req: &mut Request<Log>) -> tide::Result<Value> {
    let text = req.body_string().await?;
    Ok(if text.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text)?
    })
}

async fn record(mut req: Request<Log>) -> tide::Result {
    let body = json_body(&mut req).await?;
    req.state().record(&req, body);
    Ok(Response::new(StatusCode::NoContent))
}

async fn list_pets(req: Request<Log>) -> tide::Result {
    req.state().record(&req, Value::Null);
    json_response(
        StatusCode::Ok,
        json!({
            "page": 2,
            "size": 2,
            "total_pages": 3,
            "page_data": [
                { "id": 3, "name": "rex", "tag": "dog" },
                { "id": 4, "name": "tom" },
            ],
        }),
    )
}

async fn get_pet(req: Request<Log>) -> tide::Result {
    let id: u64 = req.param("id")?.parse()?;
    match id {
        404 => Ok(Response::builder(StatusCode::NotFound)
            .body(format!("no pet with id {}", id))
            .build()),
        13 => json_response(StatusCode::Ok, json!({ "id": "thirteen" })),
        id => json_response(StatusCode::Ok, json!({ "id": id, "name": "rex" })),
    }
}

async fn create_pet(mut req: Request<Log>) -> tide::Result {
    let body = json_body(&mut req).await?;
    req.state().record(&req, body.clone());
    json_response(
        StatusCode::Created,
        json!({ "id": 99, "name": body["name"], "tag": body["tag"] }),
    )
}

async fn list_orders(req: Request<Log>) -> tide::Result {
    req.state().record(&req, Value::Null);
    let pet: u64 = req.param("id")?.parse()?;
    json_response(
        StatusCode::Ok,
        json!([
            { "id": 1, "pet_id": pet, "quantity": 2 },
            { "id": 2, "pet_id": pet, "quantity": 1 },
        ]),
    )
}

async fn list_all_orders(req: Request<Log>) -> tide::Result {
    req.state().record(&req, Value::Null);
    json_response(
        StatusCode::Ok,
        json!([
            { "id": 1, "pet_id": 7, "quantity": 2 },
            { "id": 4, "pet_id": 9, "quantity": 1 },
            { "id": 6, "pet_id": 9, "quantity": 3 },
        ]),
    )
}

async fn get_order(req: Request<Log>) -> tide::Result {
    req.state().record(&req, Value::Null);
    let pet: u64 = req.param("id")?.parse()?;
    let order: u64 = req.param("order")?.parse()?;
    json_response(
        StatusCode::Ok,
        json!({ "id": order, "pet_id": pet, "quantity": 5 }),
    )
}

async fn list_tags(req: Request<Log>) -> tide::Result {
    req.state().record(&req, Value::Null);
    let prefix = req
        .url()
        .query_pairs()
        .find(|(key, _)| key == "prefix")
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default();
    let tags: Vec<Value> = ["cat", "dog", "dove"]
        .iter()
        .filter(|tag| tag.starts_with(&prefix))
        .map(|tag| json!({ "name": tag }))
        .collect();
    json_response(StatusCode::Ok, Value::Array(tags))
}

async fn list_labels(req: Request<Log>) -> tide::Result {
    req.state().record(&req, Value::Null);
    Ok(Response::builder(StatusCode::Ok)
        .body(r#"[{"name":"new"},{"name":"sale"}]"#)
        .content_type("text/plain")
        .build())
}

async fn status(_req: Request<Log>) -> tide::Result {
    Ok(Response::builder(StatusCode::ServiceUnavailable)
        .body("maintenance until 5pm")
        .build())
}

fn petstore() -> (PetStore, Log) {
    let log = Log::default();
    let mut app = tide::with_state(log.clone());
    app.at("/v1/pets").get(list_pets).post(create_pet);
    app.at("/v1/pets/orders").get(list_all_orders).post(record);
    app.at("/v1/pets/:id").get(get_pet).put(record).delete(record);
    app.at("/v1/pets/:id/orders").get(list_orders).post(record);
    app.at("/v1/pets/:id/orders/:order")
        .get(get_order)
        .put(record)
        .delete(record);
    app.at("/v1/tags").get(list_tags);
    app.at("/v1/labels").get(list_labels);
    app.at("/v1/status").get(status);

    let client = surf::Client::with_http_client(app);
    (PetStore::new(client, "http://petstore.test/v1/"), log)
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Pet {
    id: u64,
    name: String,
    #[serde(default)]
    tag: Option<String>,
}

#[derive(Debug, Default, Serialize)]
struct PetChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tag: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum PetOrdering {
    Name,
}

#[derive(Default, Serialize)]
struct PetQuery {
    #[serde(flatten)]
    page: PageParams,
    #[serde(flatten)]
    order: OrderParams<PetOrdering>,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Order {
    id: u64,
    pet_id: u64,
    quantity: u32,
}

#[derive(Debug, Default, Serialize)]
struct OrderChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
}

#[derive(Debug, PartialEq, Deserialize)]
struct Tag {
    name: String,
}

#[derive(Default, Serialize)]
struct TagQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    prefix: Option<String>,
}

struct PetsApi<'a>(&'a PetStore);

impl Resource for PetsApi<'_> {
    type Id = u64;

    fn endpoint(&self) -> Endpoint<'_> {
        self.0.pets().into()
    }
}

impl ListHandler for PetsApi<'_> {
    type ListParams = PetQuery;
    type Listing = Envelope<Vec<Pet>>;
}

impl DetailHandler for PetsApi<'_> {
    type Detail = Pet;
}

impl PutHandler for PetsApi<'_> {
    type PutBody = PetChanges;
}

impl PostHandler for PetsApi<'_> {
    type PostBody = PetChanges;
    type PostResponse = Pet;
}

impl DeleteHandler for PetsApi<'_> {}

struct PetOrdersApi<'a>(&'a PetStore);

impl SecondaryResource for PetOrdersApi<'_> {
    type ParentId = u64;
    type Id = u64;

    fn secondary_endpoint(&self) -> SecondaryEndpoint<'_> {
        self.0.pets().orders().into()
    }
}

impl SecondaryListHandler for PetOrdersApi<'_> {
    type ListParams = ();
    type Listing = Collection<Order>;
}

impl SecondaryDetailHandler for PetOrdersApi<'_> {
    type Detail = Order;
}

impl SecondaryPutHandler for PetOrdersApi<'_> {
    type PutBody = OrderChanges;
}

impl SecondaryPostHandler for PetOrdersApi<'_> {
    type PostBody = OrderChanges;
}

impl SecondaryDeleteHandler for PetOrdersApi<'_> {}

struct TagsApi<'a>(&'a PetStore);

impl Resource for TagsApi<'_> {
    type Id = String;

    fn endpoint(&self) -> Endpoint<'_> {
        self.0.tags().into()
    }
}

impl ListHandler for TagsApi<'_> {
    type ListParams = TagQuery;
    type Listing = Collection<Tag>;
}

struct LabelsApi<'a>(&'a PetStore);

impl Resource for LabelsApi<'_> {
    type Id = String;

    fn endpoint(&self) -> Endpoint<'_> {
        self.0.labels().into()
    }
}

impl ListHandler for LabelsApi<'_> {
    type ListParams = ();
    type Listing = Collection<Tag>;
}

struct StatusApi<'a>(&'a PetStore);

impl Resource for StatusApi<'_> {
    type Id = u64;

    fn endpoint(&self) -> Endpoint<'_> {
        self.0.status().into()
    }
}

impl ListHandler for StatusApi<'_> {
    type ListParams = ();
    type Listing = Collection<Value>;
}

fn seen(method: &str, path: &str, query: Option<&str>, body: Value) -> Seen {
    Seen {
        method: method.to_owned(),
        path: path.to_owned(),
        query: query.map(str::to_owned),
        body,
    }
}

#[async_std::test]
async fn list_parses_page_envelope() {
    let (store, log) = petstore();
    let query = PetQuery {
        page: PageParams::new().with_page(NonZeroU32::new(2).unwrap()),
        order: OrderParams {
            order_by: Some(PetOrdering::Name),
            order_direction: Some(OrderDirection::Asc),
        },
    };
    let page = PetsApi(&store).list(Some(query)).await.unwrap();
    assert_eq!(page.page.get(), 2);
    assert_eq!(page.total_pages, 3);
    assert_eq!(
        page.page_data,
        vec![
            Pet {
                id: 3,
                name: "rex".into(),
                tag: Some("dog".into()),
            },
            Pet {
                id: 4,
                name: "tom".into(),
                tag: None,
            },
        ]
    );
    assert_eq!(
        log.take(),
        vec![seen(
            "GET",
            "/v1/pets",
            Some("order_by=name&order_direction=ASC&page=2"),
            Value::Null
        )]
    );
}

#[async_std::test]
async fn list_without_params_sends_no_query() {
    let (store, log) = petstore();
    PetsApi(&store).list(None).await.unwrap();
    assert_eq!(log.take(), vec![seen("GET", "/v1/pets", None, Value::Null)]);
}

#[async_std::test]
async fn list_parses_collections() {
    let (store, log) = petstore();
    let tags = TagsApi(&store).list(None).await.unwrap();
    assert_eq!(
        tags,
        vec![
            Tag { name: "cat".into() },
            Tag { name: "dog".into() },
            Tag {
                name: "dove".into()
            },
        ]
    );

    let query = TagQuery {
        prefix: Some("do".into()),
    };
    assert_eq!(TagsApi(&store).list(Some(query)).await.unwrap().len(), 2);

    let query = TagQuery {
        prefix: Some("zebra".into()),
    };
    assert!(TagsApi(&store).list(Some(query)).await.unwrap().is_empty());

    let queries: Vec<_> = log.take().into_iter().map(|seen| seen.query).collect();
    assert_eq!(
        queries,
        vec![None, Some("prefix=do".into()), Some("prefix=zebra".into())]
    );
}

#[async_std::test]
async fn json_bodies_are_validated_whatever_their_content_type() {
    let (store, log) = petstore();
    let labels = LabelsApi(&store).list(None).await.unwrap();
    assert_eq!(
        labels,
        vec![Tag { name: "new".into() }, Tag { name: "sale".into() }]
    );
    assert_eq!(log.take(), vec![seen("GET", "/v1/labels", None, Value::Null)]);
}

#[async_std::test]
async fn list_reports_http_failures_verbatim() {
    let (store, _) = petstore();
    let err = StatusApi(&store).list(None).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::ServiceUnavailable));
    assert_eq!(err.body(), Some("maintenance until 5pm"));
}

#[async_std::test]
async fn detail_by_identity() {
    let (store, _) = petstore();
    let pet = PetsApi(&store).detail(7).await.unwrap();
    assert_eq!(
        pet,
        Pet {
            id: 7,
            name: "rex".into(),
            tag: None,
        }
    );

    let err = PetsApi(&store).detail(404).await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NotFound));
    assert_eq!(err.body(), Some("no pet with id 404"));

    let err = PetsApi(&store).detail(13).await.unwrap_err();
    assert!(matches!(err, Error::Validation { .. }), "{}", err);
}

#[async_std::test]
async fn put_and_post_send_only_set_fields() {
    let (store, log) = petstore();
    let changes = PetChanges {
        name: Some("rex".into()),
        ..Default::default()
    };
    PetsApi(&store).put(&changes, 7).await.unwrap();

    let created = PetsApi(&store)
        .post(&PetChanges {
            tag: Some("cat".into()),
            name: Some("tom".into()),
        })
        .await
        .unwrap();
    assert_eq!(
        created,
        Pet {
            id: 99,
            name: "tom".into(),
            tag: Some("cat".into()),
        }
    );

    PetsApi(&store).delete(7).await.unwrap();

    assert_eq!(
        log.take(),
        vec![
            seen("PUT", "/v1/pets/7", None, json!({ "name": "rex" })),
            seen(
                "POST",
                "/v1/pets",
                None,
                json!({ "name": "tom", "tag": "cat" })
            ),
            seen("DELETE", "/v1/pets/7", None, Value::Null),
        ]
    );
}

#[async_std::test]
async fn secondary_operations_use_nested_urls() {
    let (store, log) = petstore();
    let orders = PetOrdersApi(&store);

    let listed = orders.list(Some(7), None).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|order| order.pet_id == 7));

    let order = orders.detail(7, 3).await.unwrap();
    assert_eq!(
        order,
        Order {
            id: 3,
            pet_id: 7,
            quantity: 5,
        }
    );

    let changes = OrderChanges {
        quantity: Some(4),
        ..Default::default()
    };
    orders.put(&changes, 7, 3).await.unwrap();
    orders
        .post(
            &OrderChanges {
                note: Some("gift".into()),
                ..Default::default()
            },
            Some(7),
        )
        .await
        .unwrap();
    orders.delete(7, 3).await.unwrap();

    assert_eq!(
        log.take(),
        vec![
            seen("GET", "/v1/pets/7/orders", None, Value::Null),
            seen("GET", "/v1/pets/7/orders/3", None, Value::Null),
            seen("PUT", "/v1/pets/7/orders/3", None, json!({ "quantity": 4 })),
            seen("POST", "/v1/pets/7/orders", None, json!({ "note": "gift" })),
            seen("DELETE", "/v1/pets/7/orders/3", None, Value::Null),
        ]
    );
}

#[async_std::test]
async fn secondary_list_and_post_without_parent() {
    let (store, log) = petstore();
    let orders = PetOrdersApi(&store);

    let listed = orders.list(None, None).await.unwrap();
    assert_eq!(
        listed.iter().map(|order| order.id).collect::<Vec<_>>(),
        vec![1, 4, 6]
    );
    orders
        .post(
            &OrderChanges {
                quantity: Some(1),
                ..Default::default()
            },
            None,
        )
        .await
        .unwrap();

    assert_eq!(
        log.take(),
        vec![
            seen("GET", "/v1/pets/orders", None, Value::Null),
            seen("POST", "/v1/pets/orders", None, json!({ "quantity": 1 })),
        ]
    );
}

#[async_std::test]
async fn raw_methods_forward_calls_unchanged() {
    let (store, log) = petstore();

    let mut res = store
        .pets()
        .get()
        .call(Call::new().identity(8))
        .await
        .unwrap();
    let pet: Pet = response_body(&mut res).await.unwrap();
    assert_eq!(pet.id, 8);

    // The bound secondary path wins over one passed in the call.
    store
        .pets()
        .orders()
        .get()
        .call(Call::new().identity(7).secondary("invoices"))
        .await
        .unwrap();

    store
        .pets()
        .endpoint()
        .send(
            Verb::Put,
            Call::new()
                .identity(5)
                .secondary("orders")
                .secondary_identity(6)
                .payload(json!({ "quantity": 1 })),
        )
        .await
        .unwrap();

    let paths: Vec<_> = log.take().into_iter().map(|seen| seen.path).collect();
    assert_eq!(paths, vec!["/v1/pets/7/orders", "/v1/pets/5/orders/6"]);
}

#[async_std::test]
async fn concurrent_calls_share_one_connector() {
    let (store, _) = petstore();
    let pets = PetsApi(&store);
    let results = join_all((1..=8u64).map(|id| pets.detail(id))).await;
    let ids: Vec<u64> = results.into_iter().map(|pet| pet.unwrap().id).collect();
    assert_eq!(ids, (1..=8).collect::<Vec<_>>());
}

#[async_std::test]
async fn invalid_urls_fail_before_sending() {
    let (store, log) = petstore();
    let connector = Connector::new(surf::Client::new(), "no-scheme/");
    let err = connector
        .endpoint("pets")
        .get()
        .call(Call::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidUrl { .. }), "{}", err);
    assert_eq!(store.connector().base_url(), "http://petstore.test/v1/");
    assert!(log.take().is_empty());
}
