use criterion::{black_box, criterion_group, criterion_main, Criterion};
use bucket_semver::{compare_versions, Constraint, ConstraintInterface, Operator, VersionParser};

fn bench_compare_versions(c: &mut Criterion) {
    let cases = [
        ("1.2.3.0", "1.2.4.0"),
        ("2.4.0.0-alpha", "2.4.0.0"),
        ("2.1.0.0-dev", "2.1.0.0"),
        ("1.2.3.0-RC1", "1.2.3.0"),
        ("1.2.3.0-patch1", "1.2.3.0"),
    ];

    c.bench_function("compare_versions", |b| {
        b.iter(|| {
            for (a, other) in cases {
                black_box(compare_versions(black_box(a), black_box(other)));
            }
        })
    });
}

fn bench_normalize(c: &mut Criterion) {
    let parser = VersionParser::new();
    let versions = [
        "v1.2.3",
        "1.2.3-beta.1",
        "2.4.0+build.5",
        "1.2.x-dev",
        "dev-master",
        "2020.04.20",
        "1.2.3-rc1",
    ];

    c.bench_function("normalize_versions", |b| {
        b.iter(|| {
            for version in versions {
                black_box(parser.normalize(black_box(version)).ok());
            }
        })
    });
}

fn bench_parse_constraints(c: &mut Criterion) {
    let parser = VersionParser::new();
    let constraints = [
        ">=1.2.3 <2.0.0",
        "^1.2.3 || ~2.4",
        "1.2.* || 2.*",
        "1.2.3 - 2.0.0",
        "dev-main as 1.0.0",
    ];

    c.bench_function("parse_constraints", |b| {
        b.iter(|| {
            for constraint in constraints {
                black_box(parser.parse_constraints(black_box(constraint)).ok());
            }
        })
    });
}

fn bench_matches(c: &mut Criterion) {
    let parser = VersionParser::new();
    let required = parser.parse_constraints("^1.2 || ^2.0, !=2.1.0").unwrap();
    let candidates: Vec<Constraint> = ["1.2.0.0", "1.9.9.0", "2.1.0.0", "3.0.0.0"]
        .iter()
        .map(|v| Constraint::new(Operator::Equal, *v))
        .collect();

    c.bench_function("constraint_matches", |b| {
        b.iter(|| {
            for candidate in &candidates {
                black_box(required.matches(black_box(candidate)));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_compare_versions,
    bench_normalize,
    bench_parse_constraints,
    bench_matches
);
criterion_main!(benches);
