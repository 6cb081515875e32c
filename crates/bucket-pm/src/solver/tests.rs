//! Solver scenarios running the whole pipeline: pool, rule generation,
//! propagation, learning and the transaction.

use super::*;
use crate::error::SolverError;
use crate::package::{AliasPackage, Package, Stability};
use crate::repository::{ArrayRepository, ProviderRepository, Repository};
use bucket_semver::{ConstraintInterface, VersionParser};
use std::collections::HashMap;
use std::sync::Arc;

fn pkg(name: &str, version: &str) -> Package {
    Package::new(name, version)
}

fn pkg_with_requires(name: &str, version: &str, requires: &[(&str, &str)]) -> Package {
    requires
        .iter()
        .fold(Package::new(name, version), |package, (target, constraint)| {
            package.with_require(target, constraint)
        })
}

fn constraint(text: &str) -> Option<Box<dyn ConstraintInterface>> {
    Some(VersionParser::new().parse_constraints(text).unwrap())
}

/// Pool with the installed repository first, then the remote one
fn setup(installed: Vec<Package>, remote: Vec<Package>) -> (Pool, Arc<ArrayRepository>) {
    let installed = Arc::new(ArrayRepository::installed().with_packages(installed));
    let mut pool = Pool::default();
    pool.add_repository(installed.clone());
    pool.add_repository(Arc::new(ArrayRepository::new("remote").with_packages(remote)));
    (pool, installed)
}

fn solve(
    pool: &Pool,
    installed: &ArrayRepository,
    request: &Request,
    policy: &DefaultPolicy,
) -> Result<Transaction, SolverError> {
    Solver::new(pool, policy, installed).solve(request)
}

/// (job type, name, pretty version) of every operation, in order
fn check_solver_result(transaction: &Transaction, expected: Vec<(&str, &str, &str)>) {
    let actual: Vec<(&str, &str, &str)> = transaction
        .operations()
        .iter()
        .map(|op| (op.job_type(), op.package_name(), op.pretty_version()))
        .collect();
    assert_eq!(actual, expected);
}

/// Checks the installed set after applying the transaction: one package
/// per name, every requirement met, no conflict violated.
fn assert_sound(pool: &Pool, installed: &ArrayRepository, transaction: &Transaction) {
    let removed: Vec<&Arc<Package>> = transaction
        .removals()
        .chain(transaction.updates().map(|(from, _)| from))
        .collect();

    let mut result: Vec<PoolEntry> = installed
        .packages()
        .into_iter()
        .filter(|entry| match entry {
            PoolEntry::Package(package) => !removed.iter().any(|r| Arc::ptr_eq(r, package)),
            PoolEntry::Alias(_) => true,
        })
        .collect();
    result.extend(transaction.installs().cloned().map(PoolEntry::Package));
    result.extend(transaction.alias_installs().cloned().map(PoolEntry::Alias));

    let mut per_name: HashMap<String, usize> = HashMap::new();
    for entry in result.iter().filter(|e| !e.is_alias()) {
        *per_name.entry(entry.name().to_string()).or_default() += 1;
    }
    assert!(per_name.values().all(|&count| count == 1), "duplicate names in {:?}", per_name);

    let ids: Vec<PackageId> = result.iter().map(|e| pool.id_of(e).unwrap()).collect();
    let satisfies = |name: &str, text: &str, exclude: Option<PackageId>| {
        let constraint = pool.parse_constraint(text);
        ids.iter().filter(|&&id| Some(id) != exclude).any(|&id| {
            matches!(
                pool.match_package(id, name, constraint.as_deref(), true),
                PoolMatch::Match | PoolMatch::Provide | PoolMatch::Replace
            )
        })
    };

    for (entry, &id) in result.iter().zip(&ids) {
        for link in entry.requires() {
            assert!(
                satisfies(&link.target, &link.constraint, None),
                "{} requirement {} {} not met",
                entry.name(),
                link.target,
                link.constraint
            );
        }
        for link in entry.conflicts() {
            assert!(
                !satisfies(&link.target, &link.constraint, Some(id)),
                "{} conflicts with {} {}",
                entry.name(),
                link.target,
                link.constraint
            );
        }
    }
}

// ============================================================================
// Basic Installation Tests
// ============================================================================

#[test]
fn test_solver_install_single() {
    let (pool, installed) = setup(vec![], vec![pkg("a/a", "1.0")]);
    let mut request = Request::new();
    request.install("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("install", "a/a", "1.0")]);
}

#[test]
fn test_solver_install_with_deps_in_order() {
    let (pool, installed) = setup(
        vec![],
        vec![
            pkg_with_requires("a/a", "1.0", &[("b/b", "^1.0")]),
            pkg("b/b", "1.0"),
            pkg("b/b", "2.0"),
        ],
    );
    let mut request = Request::new();
    request.install("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    // b 2.0 is outside ^1.0, the policy has nothing to choose from
    check_solver_result(
        &transaction,
        vec![("install", "b/b", "1.0"), ("install", "a/a", "1.0")],
    );

    let lowest = solve(&pool, &installed, &request, &DefaultPolicy::new().prefer_lowest(true)).unwrap();
    check_solver_result(&lowest, vec![("install", "b/b", "1.0"), ("install", "a/a", "1.0")]);
}

#[test]
fn test_solver_policy_decides_between_versions() {
    let (pool, installed) = setup(
        vec![],
        vec![
            pkg_with_requires("a/a", "1.0", &[("b/b", ">=1.0")]),
            pkg("b/b", "1.0"),
            pkg("b/b", "2.0"),
        ],
    );
    let mut request = Request::new();
    request.install("a/a", None);

    let highest = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&highest, vec![("install", "b/b", "2.0"), ("install", "a/a", "1.0")]);
    assert_sound(&pool, &installed, &highest);

    let lowest = solve(&pool, &installed, &request, &DefaultPolicy::new().prefer_lowest(true)).unwrap();
    check_solver_result(&lowest, vec![("install", "b/b", "1.0"), ("install", "a/a", "1.0")]);
    assert_sound(&pool, &installed, &lowest);
}

#[test]
fn test_solver_is_deterministic() {
    let (pool, installed) = setup(
        vec![],
        vec![
            pkg_with_requires("a/a", "1.0", &[("b/b", ">=1.0"), ("c/c", "*")]),
            pkg("b/b", "1.0"),
            pkg("b/b", "2.0"),
            pkg_with_requires("c/c", "1.0", &[("b/b", "<2.0")]),
            pkg("c/c", "0.9"),
        ],
    );
    let mut request = Request::new();
    request.install("a/a", None);

    let first = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    let second = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    let render = |t: &Transaction| t.operations().iter().map(ToString::to_string).collect::<Vec<_>>();
    assert_eq!(render(&first), render(&second));
    assert_sound(&pool, &installed, &first);
}

// ============================================================================
// Update and Removal Tests
// ============================================================================

#[test]
fn test_solver_keeps_installed_version_without_update() {
    let (pool, installed) = setup(vec![pkg("a/a", "1.0")], vec![pkg("a/a", "1.0"), pkg("a/a", "1.1")]);
    let mut request = Request::new();
    request.install("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    assert!(transaction.is_empty(), "unexpected operations: {:?}", transaction.operations());
}

#[test]
fn test_solver_update_all() {
    let (pool, installed) = setup(vec![pkg("a/a", "1.0")], vec![pkg("a/a", "1.0"), pkg("a/a", "1.1")]);
    let mut request = Request::new();
    request.install("a/a", None).update_all();

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("update", "a/a", "1.1")]);
    assert_eq!(transaction.operations()[0].to_string(), "Updating a/a (1.0) to a/a (1.1)");
}

#[test]
fn test_solver_update_single() {
    let (pool, installed) = setup(vec![pkg("a/a", "1.0")], vec![pkg("a/a", "1.0"), pkg("a/a", "1.1")]);
    let mut request = Request::new();
    request.install("a/a", None).update("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("update", "a/a", "1.1")]);
}

#[test]
fn test_solver_fix_keeps_installed_on_update_all() {
    let (pool, installed) = setup(vec![pkg("a/a", "1.0")], vec![pkg("a/a", "1.0"), pkg("a/a", "1.1")]);
    let mut request = Request::new();
    request.fix("a/a", None).update_all();

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    assert!(transaction.is_empty());
}

#[test]
fn test_solver_keeps_untouched_installed_packages() {
    let (pool, installed) = setup(
        vec![pkg("p/p", "1.0")],
        vec![pkg("p/p", "1.0"), pkg("p/p", "1.1"), pkg("q/q", "1.0")],
    );
    let mut request = Request::new();
    request.install("q/q", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("install", "q/q", "1.0")]);
    assert_sound(&pool, &installed, &transaction);

    let transaction = solve(&pool, &installed, &Request::new(), &DefaultPolicy::new()).unwrap();
    assert!(transaction.is_empty(), "unexpected operations: {:?}", transaction.operations());
}

#[test]
fn test_solver_update_all_covers_packages_without_jobs() {
    let (pool, installed) = setup(vec![pkg("p/p", "1.0")], vec![pkg("p/p", "1.0"), pkg("p/p", "1.1")]);
    let mut request = Request::new();
    request.update_all();

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("update", "p/p", "1.1")]);
}

#[test]
fn test_solver_removes_installed_package_with_missing_requirement() {
    let (pool, installed) = setup(vec![pkg_with_requires("a/a", "1.0", &[("gone/pkg", "^1.0")])], vec![]);

    let transaction = solve(&pool, &installed, &Request::new(), &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("remove", "a/a", "1.0")]);
    let reason = transaction.operations()[0].reason().unwrap();
    assert_eq!(reason.reason(), RuleReason::PackageRequires);
}

#[test]
fn test_solver_repository_priority_beats_newer_version() {
    let installed = Arc::new(ArrayRepository::installed().with_packages([pkg("a/a", "1.0")]));
    let mut pool = Pool::default();
    pool.add_repository(installed.clone());
    pool.add_repository(Arc::new(ArrayRepository::new("first").with_packages([pkg("a/a", "1.0")])));
    pool.add_repository(Arc::new(ArrayRepository::new("second").with_packages([pkg("a/a", "2.0")])));

    let mut request = Request::new();
    request.install("a/a", None).update_all();

    let first = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    let second = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    assert!(first.is_empty(), "unexpected operations: {:?}", first.operations());
    assert!(second.is_empty());
}

#[test]
fn test_solver_remove_job() {
    let (pool, installed) = setup(vec![pkg("a/a", "1.0")], vec![pkg("a/a", "1.0")]);
    let mut request = Request::new();
    request.remove("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("remove", "a/a", "1.0")]);
    let reason = transaction.operations()[0].reason().unwrap();
    assert_eq!(reason.reason(), RuleReason::JobUninstall);
}

// ============================================================================
// Provide, Replace and Alias Tests
// ============================================================================

#[test]
fn test_install_provider() {
    let (pool, installed) = setup(
        vec![],
        vec![
            pkg_with_requires("a/a", "1.0", &[("virtual/x", "^1.0")]),
            pkg("p/p", "1.0").with_provide("virtual/x", "1.0"),
        ],
    );
    let mut request = Request::new();
    request.install("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("install", "p/p", "1.0"), ("install", "a/a", "1.0")]);
    assert_eq!(pool.match_package(2, "virtual/x", constraint("^1.0").as_deref(), false), PoolMatch::Provide);
}

#[test]
fn test_name_match_hides_providers() {
    let (pool, _) = setup(
        vec![],
        vec![
            pkg("p/p", "1.0").with_provide("virtual/x", "1.0"),
            pkg("virtual/x", "1.0"),
        ],
    );

    assert_eq!(pool.what_provides("virtual/x", None, false, false), vec![2]);
    assert_eq!(pool.what_provides("virtual/x", constraint("^2.0").as_deref(), false, false), Vec::<PackageId>::new());
}

#[test]
fn test_install_replacer_satisfies_requirement() {
    let (pool, installed) = setup(
        vec![],
        vec![
            pkg_with_requires("a/a", "1.0", &[("old/lib", "^1.0")]),
            pkg("new/lib", "1.0").with_replace("old/lib", "1.0"),
        ],
    );
    let mut request = Request::new();
    request.install("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("install", "new/lib", "1.0"), ("install", "a/a", "1.0")]);
}

#[test]
fn test_install_alias_after_aliased_package() {
    let installed = Arc::new(ArrayRepository::installed());
    let remote = Arc::new(ArrayRepository::new("remote"));
    let base = remote.add_package(pkg("a/a", "dev-main"));
    remote.add_alias(Arc::new(AliasPackage::new(base, "1.0.9999999.9999999-dev", "1.0.x-dev")));
    remote.add_package(pkg_with_requires("b/b", "1.0", &[("a/a", "^1.0")]));

    let mut pool = Pool::with_minimum_stability(Stability::Dev);
    pool.add_repository(installed.clone());
    pool.add_repository(remote);

    let mut request = Request::new();
    request.install("b/b", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(
        &transaction,
        vec![
            ("install", "a/a", "dev-main"),
            ("markAliasInstalled", "a/a", "1.0.x-dev"),
            ("install", "b/b", "1.0"),
        ],
    );
}

#[test]
fn test_mark_alias_installed() {
    let installed = Arc::new(ArrayRepository::installed());
    let base = installed.add_package(pkg("a/a", "dev-main"));
    let remote = Arc::new(ArrayRepository::new("remote"));
    remote.add_alias(Arc::new(AliasPackage::new(base, "1.0.9999999.9999999-dev", "1.0.x-dev")));

    let mut pool = Pool::with_minimum_stability(Stability::Dev);
    pool.add_repository(installed.clone());
    pool.add_repository(remote);

    let mut request = Request::new();
    request.mark_alias_installed("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("markAliasInstalled", "a/a", "1.0.x-dev")]);
    assert_eq!(transaction.summary().alias_installs, 1);
}

#[test]
fn test_mark_alias_uninstalled_keeps_aliased_package() {
    let installed = Arc::new(ArrayRepository::installed());
    let base = installed.add_package(pkg("a/a", "dev-main"));
    installed.add_alias(Arc::new(AliasPackage::new(base, "1.0.9999999.9999999-dev", "1.0.x-dev")));

    let mut pool = Pool::with_minimum_stability(Stability::Dev);
    pool.add_repository(installed.clone());

    let mut request = Request::new();
    request.mark_alias_uninstalled("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("markAliasUninstalled", "a/a", "1.0.x-dev")]);
    let reason = transaction.operations()[0].reason().unwrap();
    assert_eq!(reason.reason(), RuleReason::JobUninstall);
}

#[test]
fn test_install_root_alias_from_lazy_repository() {
    let installed = Arc::new(ArrayRepository::installed());
    let lazy = Arc::new(ProviderRepository::new("lazy").with_packages([
        pkg("a/a", "dev-main"),
        pkg_with_requires("b/b", "1.0", &[("a/a", "^1.0")]),
    ]));

    let mut root_aliases = RootAliases::new();
    root_aliases.entry("a/a".to_string()).or_default().insert(
        "dev-main".to_string(),
        RootAlias {
            alias: "1.0.0".to_string(),
            alias_normalized: "1.0.0.0".to_string(),
        },
    );

    let mut pool = Pool::with_minimum_stability(Stability::Dev);
    pool.add_repository(installed.clone());
    pool.add_repository_with_aliases(lazy, &root_aliases);

    let mut request = Request::new();
    request.install("b/b", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(
        &transaction,
        vec![
            ("install", "a/a", "dev-main"),
            ("markAliasInstalled", "a/a", "1.0.0"),
            ("install", "b/b", "1.0"),
        ],
    );
    assert!(transaction.alias_installs().all(|alias| alias.is_root_package_alias()));
}

#[test]
fn test_install_from_lazy_repository() {
    let installed = Arc::new(ArrayRepository::installed());
    let lazy = Arc::new(ProviderRepository::new("lazy").with_packages([
        pkg_with_requires("a/a", "1.0", &[("b/b", "^1.0")]),
        pkg("b/b", "1.0"),
        pkg("unrelated/pkg", "1.0"),
    ]));
    let mut pool = Pool::default();
    pool.add_repository(installed.clone());
    pool.add_repository(lazy.clone());

    let mut request = Request::new();
    request.install("a/a", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(&transaction, vec![("install", "b/b", "1.0"), ("install", "a/a", "1.0")]);

    let loaded = lazy.loaded_names();
    assert!(loaded.contains(&"a/a".to_string()));
    assert!(loaded.contains(&"b/b".to_string()));
    assert!(!loaded.contains(&"unrelated/pkg".to_string()));
}

// ============================================================================
// Conflict and Backtracking Tests
// ============================================================================

#[test]
fn test_solver_pick_older_if_newer_conflicts() {
    let (pool, installed) = setup(
        vec![],
        vec![
            pkg_with_requires("x/x", "1.0", &[("a/a", ">=1.0"), ("b/b", "*")]),
            pkg_with_requires("a/a", "1.0", &[("s/s", ">=1.0")]),
            pkg_with_requires("a/a", "2.0", &[("s/s", ">=3.0")]),
            pkg("b/b", "1.0").with_conflict("s/s", ">=3.0"),
            pkg("s/s", "1.0"),
            pkg("s/s", "3.0"),
        ],
    );
    let mut request = Request::new();
    request.install("x/x", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(
        &transaction,
        vec![
            ("install", "b/b", "1.0"),
            ("install", "s/s", "1.0"),
            ("install", "a/a", "1.0"),
            ("install", "x/x", "1.0"),
        ],
    );
    assert_sound(&pool, &installed, &transaction);
}

#[test]
fn test_solver_learns_from_conflict_between_choices() {
    // picking b 2.0 after a 2.0 leaves a's requirement on p unsatisfiable,
    // the learned clause sends the solver back to b 1.0
    let (pool, installed) = setup(
        vec![],
        vec![
            pkg_with_requires("x/x", "1.0", &[("a/a", "*"), ("b/b", "*")]),
            pkg("a/a", "1.0"),
            pkg_with_requires("a/a", "2.0", &[("p/p", "*")]),
            pkg("b/b", "1.0"),
            pkg("b/b", "2.0").with_conflict("p/p", "*"),
            pkg("p/p", "1.0"),
            pkg("p/p", "2.0"),
        ],
    );
    let mut request = Request::new();
    request.install("x/x", None);

    let transaction = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap();
    check_solver_result(
        &transaction,
        vec![
            ("install", "b/b", "1.0"),
            ("install", "p/p", "2.0"),
            ("install", "a/a", "2.0"),
            ("install", "x/x", "1.0"),
        ],
    );
    assert_sound(&pool, &installed, &transaction);
}

#[test]
fn test_solver_conflict_between_requirements() {
    let (pool, installed) = setup(
        vec![],
        vec![pkg("a/a", "1.0").with_conflict("b/b", "*"), pkg("b/b", "1.0")],
    );
    let mut request = Request::new();
    request.install("a/a", None).install("b/b", None);

    let err = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap_err();
    let report = err.problems().report();
    assert!(!err.problems().is_empty());
    assert!(report.contains("Problem 1"));
    assert!(report.contains("a/a 1.0 conflicts with b/b 1.0."));
    assert!(report.contains("Installation request for b/b -> satisfiable by b/b[1.0]."));
}

#[test]
fn test_solver_missing_package() {
    let (pool, installed) = setup(vec![], vec![pkg("a/a", "1.0")]);
    let mut request = Request::new();
    request.install("vendor/typo", None);

    let err = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap_err();
    assert_eq!(err.problems().len(), 1);
    assert!(err
        .to_string()
        .contains("The requested package vendor/typo could not be found in any version"));
}

#[test]
fn test_solver_missing_version() {
    let (pool, installed) = setup(vec![], vec![pkg("a/a", "1.0")]);
    let mut request = Request::new();
    request.install("a/a", constraint("^2.0"));

    let err = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap_err();
    assert!(err.problems().report().contains("The requested package a/a ^2.0 could not be found."));
}

#[test]
fn test_solver_reports_every_problem() {
    let (pool, installed) = setup(vec![], vec![pkg("a/a", "1.0")]);
    let mut request = Request::new();
    request.install("first/missing", None).install("second/missing", None);

    let err = solve(&pool, &installed, &request, &DefaultPolicy::new()).unwrap_err();
    assert_eq!(err.problems().len(), 2);
    assert!(err.problems().report().contains("Problem 2"));
}
