//! Route trie behaviour through the public API
//!
//! - method + path resolution with typed captures
//! - concurrent registration from many threads leaves every route matchable
//! - lookups running during registration keep resolving existing routes
//! - registration errors for malformed patterns

use bframe::router::{ParamKind, RoutePattern, Router, Segment};
use bframe::{MatchError, RouteError};
use http::Method;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

fn zoo() -> Router<&'static str> {
    let router = Router::new();
    for (method, pattern, name) in [
        (Method::GET, "/", "root"),
        (Method::GET, "/zoo/animals", "get_animals"),
        (Method::POST, "/zoo/animals", "create_animal"),
        (Method::GET, "/zoo/animals/<int:id>", "get_animal"),
        (Method::PUT, "/zoo/animals/<int:id>", "update_animal"),
        (Method::GET, "/zoo/animals/<str:name>", "get_animal_by_name"),
        (Method::GET, "/zoo/files/<*:path>", "files"),
    ] {
        router.add(&method, pattern, name).unwrap();
    }
    router
}

#[test]
fn test_router_resolves_method_and_path() {
    let r = zoo();
    let cases = [
        (Method::GET, "/", "root"),
        (Method::GET, "/zoo/animals", "get_animals"),
        (Method::POST, "/zoo/animals", "create_animal"),
        (Method::GET, "/zoo/animals/12", "get_animal"),
        (Method::PUT, "/zoo/animals/12", "update_animal"),
        (Method::GET, "/zoo/animals/zebra", "get_animal_by_name"),
        (Method::GET, "/zoo/files/img/zebra.png", "files"),
    ];
    for (method, path, expected) in cases {
        let m = r
            .route(&method, path)
            .unwrap_or_else(|e| panic!("{method} {path}: {e}"));
        assert_eq!(m.value, expected, "{method} {path}");
    }
    assert_eq!(
        r.route(&Method::PUT, "/zoo/animals/zebra").unwrap_err(),
        MatchError::NotFound
    );
    assert_eq!(
        r.route(&Method::DELETE, "/zoo/animals").unwrap_err(),
        MatchError::NotFound
    );
}

#[test]
fn test_captures() {
    let r = zoo();
    let m = r.route(&Method::GET, "/zoo/animals/0042").unwrap();
    assert_eq!(m.get_param("id"), Some("0042"));
    let m = r.route(&Method::GET, "/zoo/files/a/b/c").unwrap();
    assert_eq!(m.get_param("path"), Some("a/b/c"));
    assert_eq!(m.params_map().get("path").map(String::as_str), Some("a/b/c"));
}

#[test]
fn test_concurrent_registrations_stay_matchable() {
    const N: usize = 64;
    let router: Arc<Router<usize>> = Arc::new(Router::new());

    let handles: Vec<_> = (0..N)
        .map(|i| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                router
                    .add(&Method::GET, &format!("/svc{i}/items/<int:id>"), i)
                    .unwrap();
                router
                    .add(&Method::POST, &format!("/shared/r{i}"), i)
                    .unwrap();
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    assert_eq!(router.len(), 2 * N);
    for i in 0..N {
        let m = router
            .route(&Method::GET, &format!("/svc{i}/items/{i}"))
            .unwrap();
        assert_eq!(m.value, i);
        assert_eq!(m.get_param("id"), Some(i.to_string().as_str()));
        assert_eq!(
            router
                .route(&Method::POST, &format!("/shared/r{i}"))
                .unwrap()
                .value,
            i
        );
    }
}

#[test]
fn test_matching_while_registering() {
    const WRITERS: usize = 8;
    const ROUTES_PER_WRITER: usize = 32;
    let router = Arc::new(zoo());
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|r| {
            let router = Arc::clone(&router);
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let mut lookups = 0usize;
                while !done.load(Ordering::Acquire) || lookups == 0 {
                    let id = (r * 1000 + lookups).to_string();
                    let m = router
                        .route(&Method::GET, &format!("/zoo/animals/{id}"))
                        .unwrap();
                    assert_eq!(m.value, "get_animal");
                    assert_eq!(m.get_param("id"), Some(id.as_str()));

                    let m = router
                        .route(&Method::GET, "/zoo/files/a/b.txt")
                        .unwrap();
                    assert_eq!((m.value, m.get_param("path")), ("files", Some("a/b.txt")));
                    lookups += 1;
                }
                lookups
            })
        })
        .collect();

    // writers extend the same nodes the readers walk through
    let writers: Vec<_> = (0..WRITERS)
        .map(|w| {
            let router = Arc::clone(&router);
            thread::spawn(move || {
                for i in 0..ROUTES_PER_WRITER {
                    let pattern = format!("/zoo/animals/<int:id>/w{w}r{i}");
                    router.add(&Method::GET, &pattern, "nested").unwrap();
                    let pattern = format!("/zoo/w{w}/<str:name>/r{i}");
                    router.add(&Method::GET, &pattern, "fresh").unwrap();
                }
            })
        })
        .collect();
    for h in writers {
        h.join().unwrap();
    }
    done.store(true, Ordering::Release);
    for h in readers {
        assert!(h.join().unwrap() > 0);
    }

    assert_eq!(router.len(), 7 + 2 * WRITERS * ROUTES_PER_WRITER);
    for w in 0..WRITERS {
        for i in 0..ROUTES_PER_WRITER {
            let m = router
                .route(&Method::GET, &format!("/zoo/animals/7/w{w}r{i}"))
                .unwrap();
            assert_eq!((m.value, m.get_param("id")), ("nested", Some("7")));
            let m = router
                .route(&Method::GET, &format!("/zoo/w{w}/okapi/r{i}"))
                .unwrap();
            assert_eq!((m.value, m.get_param("name")), ("fresh", Some("okapi")));
        }
    }
    assert_eq!(router.route(&Method::GET, "/zoo/animals/7").unwrap().value, "get_animal");
}

#[test]
fn test_concurrent_duplicates_rejected_once() {
    let router: Arc<Router<usize>> = Arc::new(Router::new());
    let handles: Vec<_> = (0..16)
        .map(|i| {
            let router = Arc::clone(&router);
            thread::spawn(move || router.add(&Method::GET, "/same/<str:x>", i).is_ok())
        })
        .collect();
    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();
    assert_eq!(successes, 1);
    assert_eq!(router.len(), 1);
}

#[test]
fn test_invalid_patterns() {
    let r: Router<()> = Router::new();
    for pattern in [
        "/static/<*:rest>/extra",
        "/a/<float:x>",
        "/a/<int:>",
        "/a/<int:x",
        "/a/pre<int:x>",
    ] {
        assert!(
            matches!(
                r.add(&Method::GET, pattern, ()),
                Err(RouteError::InvalidPattern { .. })
            ),
            "{pattern}"
        );
    }
    assert!(r.is_empty());
}

#[test]
fn test_pattern_parse_public() {
    let p = RoutePattern::parse("/users/<int:id>/<*:rest>").unwrap();
    assert_eq!(p.segments().len(), 3);
    assert_eq!(p.segments()[0], Segment::Literal("users".into()));
    assert!(matches!(
        &p.segments()[1],
        Segment::Typed { kind: ParamKind::Int, .. }
    ));
    assert_eq!(p.to_string(), "/users/<int:id>/<*:rest>");
}
