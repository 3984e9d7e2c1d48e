use bframe::testing::TestClient;
use bframe::{Dispatcher, Router};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use http::Method;
use std::hint::black_box;

fn build_router(services: usize) -> Router<usize> {
    let router = Router::new();
    let mut id = 0;
    for s in 0..services {
        for pattern in [
            format!("/svc{s}/items"),
            format!("/svc{s}/items/<int:id>"),
            format!("/svc{s}/items/<str:slug>"),
            format!("/svc{s}/users/<int:user>/posts/<int:post>"),
            format!("/svc{s}/files/<*:path>"),
        ] {
            router.add(&Method::GET, &pattern, id).unwrap();
            id += 1;
        }
    }
    router
}

fn bench_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("router_match");
    for services in [1, 10, 100] {
        let router = build_router(services);
        let last = services - 1;
        let paths = [
            ("literal", format!("/svc{last}/items")),
            ("int", format!("/svc{last}/items/42")),
            ("str_fallthrough", format!("/svc{last}/items/blue-shoes")),
            ("two_captures", format!("/svc{last}/users/7/posts/99")),
            ("wildcard", format!("/svc{last}/files/a/b/c/d.txt")),
            ("miss", format!("/svc{last}/nothing/here")),
        ];
        for (name, path) in &paths {
            group.bench_with_input(BenchmarkId::new(*name, services), path, |b, path| {
                b.iter(|| black_box(router.route(&Method::GET, black_box(path)).ok()));
            });
        }
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    let app = Dispatcher::new();
    app.get("/users/<int:id>", |ctx| {
        Ok(ctx.param("id").unwrap_or_default().to_string().into())
    })
    .unwrap();
    app.add_before_handle(|ctx| {
        ctx.set("seen", true);
        Ok(())
    });
    let client = TestClient::new(&app);

    c.bench_function("dispatch_hook_and_handler", |b| {
        b.iter(|| black_box(client.get(black_box("/users/42"))));
    });
}

criterion_group!(benches, bench_route, bench_dispatch);
criterion_main!(benches);
