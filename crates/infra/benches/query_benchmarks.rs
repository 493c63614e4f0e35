use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;

use carshop_core::{ExpectedVersion, Login, ProductId};
use carshop_infra::{InMemoryRepository, Repository};
use carshop_products::{CreateProduct, Product};
use carshop_query::{ConditionPayload, Operator, PageRequest, SortOrder, compile_payloads};

const MANUFACTURERS: [&str; 5] = ["Toyota", "Honda", "Audi", "BMW", "Fiat"];

fn fixture(n: usize) -> Vec<Product> {
    let owner = Login::parse("seller").unwrap();
    (0..n)
        .map(|i| {
            Product::create(
                ProductId::new(),
                owner.clone(),
                CreateProduct {
                    manufacturer: MANUFACTURERS[i % MANUFACTURERS.len()].to_string(),
                    model: format!("Model {i}"),
                    description: None,
                    price: Decimal::from(1_000 + (i as i64 * 37) % 20_000),
                },
                NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            )
            .unwrap()
        })
        .collect()
}

fn conditions() -> Vec<ConditionPayload> {
    vec![
        ConditionPayload::new("price", Operator::Ge, json!(5000)),
        ConditionPayload::new("manufacturer", Operator::Like, json!("Toy")),
        ConditionPayload::new("deleted", Operator::Eq, json!(false)),
    ]
}

fn bench_compile(c: &mut Criterion) {
    let payloads = conditions();
    c.bench_function("compile_three_conditions", |b| {
        b.iter(|| compile_payloads::<Product>(Some(black_box(payloads.as_slice()))).unwrap())
    });
}

fn bench_evaluate(c: &mut Criterion) {
    let predicate = compile_payloads::<Product>(Some(conditions().as_slice())).unwrap();
    let mut group = c.benchmark_group("evaluate_in_memory");
    for size in [100usize, 1_000, 10_000] {
        let products = fixture(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &products, |b, products| {
            b.iter(|| products.iter().filter(|p| predicate.matches(*p)).count())
        });
    }
    group.finish();
}

fn bench_paged_search(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let repo = InMemoryRepository::<Product>::new();
    runtime.block_on(async {
        for p in fixture(5_000) {
            repo.save(p, ExpectedVersion::New).await.unwrap();
        }
    });
    let predicate = compile_payloads::<Product>(Some(conditions().as_slice())).unwrap();
    let page = PageRequest::new(3, 50).unwrap().with_sort(SortOrder::desc("price"));

    c.bench_function("in_memory_paged_search_5000", |b| {
        b.iter(|| {
            runtime
                .block_on(repo.find_all(black_box(&predicate), Some(&page)))
                .unwrap()
        })
    });
}

criterion_group!(benches, bench_compile, bench_evaluate, bench_paged_search);
criterion_main!(benches);
