use std::sync::Arc;

use pathrouter::config::WebserverConfig;
use pathrouter::context::Context;
use pathrouter::router::{Handler, handler};
use pathrouter::{
    ConfigError, Dispatcher, Method, PathValue, Request, Response, RouteError, RouteTable,
    StatusCode,
};

fn tagged(tag: &'static str) -> Handler {
    handler(move |_ctx: Context| async move { Ok(Response::new(StatusCode::Ok).body(tag)) })
}

fn freeze(table: RouteTable) -> Dispatcher {
    Dispatcher::new(table, &WebserverConfig::default())
}

async fn call(dispatcher: &Dispatcher, method: Method, path: &str) -> Vec<u8> {
    let call = dispatcher.resolve(path, &method).unwrap();
    let res = call
        .invoke(Context::new(Request::new(method, path)))
        .await
        .unwrap();
    res.payload().to_vec()
}

#[test]
fn literal_templates_match_exact_paths_only() {
    let mut table = RouteTable::new();
    table.mount_handler("/kng/list", tagged("list"), ["GET"]).unwrap();
    table.mount_handler("/kng/new", tagged("new"), ["POST"]).unwrap();
    let d = freeze(table);

    assert!(d.resolve("/kng/list", &Method::Get).is_ok());
    assert!(d.resolve("kng/list/", &Method::Get).is_ok());
    assert!(d.resolve("/kng/new", &Method::Post).is_ok());

    assert!(matches!(
        d.resolve("/kng/list", &Method::Post),
        Err(RouteError::MethodNotAllowed { .. })
    ));
    for path in ["/", "/kng", "/kng/list/x", "/xkng/list", "/KNG/LIST"] {
        assert!(
            matches!(d.resolve(path, &Method::Get), Err(RouteError::NotFound { .. })),
            "{path}"
        );
    }
}

#[test]
fn mounting_twice_is_idempotent() {
    let h = tagged("h");
    let mut table = RouteTable::new();
    table.mount_handler("/kng/list", Arc::clone(&h), ["GET"]).unwrap();
    table.mount_handler("/kng/list", Arc::clone(&h), ["GET"]).unwrap();

    assert_eq!(table.len(), 1);
    let route = table.routes().next().unwrap();
    assert_eq!(route.methods().len(), 1);
    assert!(Arc::ptr_eq(route.methods().get(&Method::Get).unwrap(), &h));
}

#[tokio::test]
async fn methods_are_merged_into_one_route() {
    let mut table = RouteTable::new();
    table.mount_handler("/kng/{kid:str}", tagged("h1"), ["GET"]).unwrap();
    table.mount_handler("/kng/{kid:str}", tagged("h2"), ["POST"]).unwrap();
    assert_eq!(table.len(), 1);
    assert_eq!(table.describe(), vec!["/kng/{kid:str} GET,POST"]);

    let d = freeze(table);
    assert_eq!(call(&d, Method::Get, "/kng/a").await, b"h1");
    assert_eq!(call(&d, Method::Post, "/kng/a").await, b"h2");
}

#[test]
fn variables_are_coerced_to_native_types() {
    let mut table = RouteTable::new();
    table.mount_handler("/items/{n:int64}", tagged("n"), ["GET"]).unwrap();
    let d = freeze(table);

    let resolved = d.resolve("/items/42", &Method::Get).unwrap();
    assert_eq!(resolved.args().get("n"), Some(&PathValue::Int(42)));

    assert!(matches!(
        d.resolve("/items/abc", &Method::Get),
        Err(RouteError::NotFound { .. })
    ));
}

#[test]
fn overlapping_templates_are_ambiguous() {
    let mut table = RouteTable::new();
    table.mount_handler("/a/{x:str}", tagged("x"), ["GET"]).unwrap();
    table.mount_handler("/a/{y:int64}", tagged("y"), ["GET"]).unwrap();
    let d = freeze(table);

    let err = d.resolve("/a/42", &Method::Get).unwrap_err();
    assert!(matches!(err, RouteError::AmbiguousRoute { ref candidates, .. } if candidates.len() == 2));
    assert_eq!(err.status(), StatusCode::MultipleChoices);
}

#[test]
fn method_restriction() {
    let mut table = RouteTable::new();
    table
        .mount_handler("/kng/{kid:str}/details", tagged("details"), ["GET"])
        .unwrap();
    let d = freeze(table);

    assert!(matches!(
        d.resolve("/kng/abc-1/details", &Method::Post),
        Err(RouteError::MethodNotAllowed { .. })
    ));
    let resolved = d.resolve("/kng/abc-1/details", &Method::Get).unwrap();
    assert_eq!(resolved.args().get_str("kid"), Some("abc-1"));
    assert_eq!(resolved.args().len(), 1);
}

#[test]
fn unsupported_method_is_rejected_at_mount_time() {
    let mut table = RouteTable::new();
    let err = table.mount_handler("/x", tagged("x"), ["FETCH"]).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedMethod { ref method, .. } if method == "FETCH"));
    assert!(table.is_empty());

    // a bad name anywhere in the list registers nothing
    let err = table.mount_handler("/x", tagged("x"), ["GET", "get"]).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedMethod { .. }));
    assert!(table.is_empty());
}

#[test]
fn unknown_type_tag_matches_like_str() {
    let mut table = RouteTable::new();
    table.mount_handler("/files/{name:path}", tagged("f"), ["GET"]).unwrap();
    let d = freeze(table);
    let resolved = d.resolve("/files/report.pdf", &Method::Get).unwrap();
    assert_eq!(resolved.args().get_str("name"), Some("report.pdf"));
}
