//! Integration tests for imports
//!
//! These tests cover nesting and merging of imported recipes, cycle and
//! depth detection, caching, and reading recipes from disk.

use std::{fs, sync::Mutex};

use async_trait::async_trait;

use fiz::{
    Compiler, FizError,
    config::{AppConfig, ImportConfig},
    dag::{Dag, GraphElement},
    diagnostics::ErrorCode,
    identifier::Id,
    import::{ImportChain, ImportError},
    resolver::{CachingResolver, FileResolver, ImportResolver, MemoryResolver, compile_source},
};

/// Resolves from memory and records every location it is asked for.
struct Recording {
    sources: MemoryResolver,
    requested: Mutex<Vec<String>>,
}

impl Recording {
    fn new(sources: MemoryResolver) -> Self {
        Self {
            sources,
            requested: Mutex::new(Vec::new()),
        }
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImportResolver for Recording {
    async fn resolve(&self, location: &str, chain: &ImportChain) -> Result<Dag, ImportError> {
        self.requested.lock().unwrap().push(location.to_string());
        let source = fiz::resolver::SourceLoader::load(&self.sources, location)?;
        compile_source(self, location, &source, chain).await
    }
}

fn compiler(resolver: impl ImportResolver + 'static) -> Compiler {
    Compiler::new(AppConfig::default(), resolver)
}

#[tokio::test]
async fn test_aliased_import_nests_under_name() {
    let resolver = MemoryResolver::new().with_source("pantry", "flour = mill()\nsugar = refine()");
    let compilation = compiler(resolver)
        .compile("stock = @ \"pantry\"\nbake(stock.flour)")
        .await
        .unwrap();
    let dag = compilation.dag();

    assert!(compilation.diagnostics().is_empty());
    assert!(dag.nodes().all(|n| n.name() == "bake"));

    let stock = dag.child_dags().next().unwrap();
    assert_eq!(stock.name(), "");
    assert_eq!(dag.var_bindings()["stock"], stock.id());
    assert_eq!(stock.node_names(), ["mill", "refine"]);
    assert_eq!(dag.edges().next().unwrap().name(), "flour");
    assert_eq!(dag.used_imports().iter().collect::<Vec<_>>(), ["pantry"]);
}

#[tokio::test]
async fn test_unaliased_import_merges() {
    let resolver = MemoryResolver::new().with_source(
        "basics",
        "#hot{color: red; shape: box}\n%oven{#hot}\nwater = tap()",
    );
    let source = "#hot{color: blue; size: big}\n@ \"basics\"\nboil(water){#hot}";
    let compilation = compiler(resolver).compile(source).await.unwrap();
    let dag = compilation.dag();

    assert!(compilation.diagnostics().is_empty());
    assert_eq!(dag.node_names(), ["boil", "tap"]);
    assert_eq!(dag.edge_name_pairs(), [("tap", "boil")]);
    assert!(dag.style_bindings().contains_key("oven"));

    let hot = &dag.flattened_styles()["hot"];
    assert_eq!(hot["color"], "red");
    assert_eq!(hot["shape"], "box");
    assert!(!hot.contains_key("size"));
}

#[tokio::test]
async fn test_mutual_imports_fail_as_cycle() {
    let sources = MemoryResolver::new()
        .with_source("a", "@ \"b\"\nfrom_a()")
        .with_source("b", "@ \"a\"\nfrom_b()");
    let recording = Recording::new(sources);
    let compiler = compiler(recording);

    let dag = compiler.compile_location("a").await.unwrap();
    assert_eq!(dag.node_names(), ["from_a", "from_b"]);
}

#[tokio::test]
async fn test_self_import_reports_cycle() {
    let resolver = MemoryResolver::new().with_source("loop", "@ \"loop\"\nf()");
    let dag = compiler(resolver).compile_location("loop").await.unwrap();
    assert_eq!(dag.node_names(), ["f"]);

    let chain = ImportChain::default().enter("loop").unwrap();
    let err = chain.enter("loop").unwrap_err();
    assert_eq!(err.code(), ErrorCode::E305);
}

#[tokio::test]
async fn test_cycle_is_not_resolved_again() {
    let sources = MemoryResolver::new()
        .with_source("a", "@ \"b\"")
        .with_source("b", "@ \"a\"");
    let recording = Recording::new(sources);

    let chain = ImportChain::default().enter("a").unwrap();
    recording.resolve("a", &chain).await.unwrap();
    assert_eq!(recording.requested(), ["a", "b"]);
}

#[tokio::test]
async fn test_sibling_imports_are_not_cycles() {
    let resolver = MemoryResolver::new().with_source("lib", "x = f()");
    let compiler = compiler(resolver);

    let compilation = compiler.compile("@ \"lib\"\n@ \"lib\"").await.unwrap();
    assert!(compilation.diagnostics().is_empty());
    assert_eq!(compilation.dag().node_names(), ["f", "f"]);
}

#[tokio::test]
async fn test_depth_bound_stops_deep_chains() {
    let resolver = MemoryResolver::new()
        .with_source("one", "two = @ \"two\"")
        .with_source("two", "three = @ \"three\"")
        .with_source("three", "leaf()");
    let config = AppConfig::new(ImportConfig::new(None, 2, false));
    let compiler = Compiler::new(config, resolver);

    let compilation = compiler.compile("one = @ \"one\"").await.unwrap();
    let one = compilation.dag().child_dags().next().unwrap();
    let two = one.child_dags().next().unwrap();
    assert_eq!(two.child_dags().count(), 0);
    assert!(two.var_bindings().is_empty());

    let compilation = compiler.compile("x = @ \"one\"\ny = @ \"two\"").await.unwrap();
    assert!(compilation.diagnostics().is_empty());

    let shallow = Compiler::new(AppConfig::new(ImportConfig::new(None, 0, false)), MemoryResolver::new());
    let compilation = shallow.compile("@ \"one\"").await.unwrap();
    assert_eq!(
        compilation.diagnostics().iter().filter_map(|d| d.code()).collect::<Vec<_>>(),
        [ErrorCode::E306]
    );
}

#[tokio::test]
async fn test_failed_standalone_import_is_skipped() {
    let compilation = compiler(MemoryResolver::new())
        .compile("@ \"nowhere\"\nf()")
        .await
        .unwrap();

    assert_eq!(compilation.dag().node_names(), ["f"]);
    let diagnostic = &compilation.diagnostics()[0];
    assert_eq!(diagnostic.code(), Some(ErrorCode::E304));
    assert_eq!(diagnostic.labels()[0].span().start(), 2);
}

#[tokio::test]
async fn test_repeated_cached_imports_get_fresh_ids() {
    let resolver = CachingResolver::new(MemoryResolver::new().with_source("lib", "x = f()"));
    let compilation = compiler(resolver)
        .compile("a = @ \"lib\"\nb = @ \"lib\"\nuse(a.x, b.x)")
        .await
        .unwrap();
    let dag = compilation.dag();

    let children: Vec<&Dag> = dag.child_dags().collect();
    assert_eq!(children.len(), 2);
    assert_ne!(children[0].id(), children[1].id());

    let first: Vec<Id> = children[0].nodes().map(GraphElement::id).collect();
    assert!(children[1].nodes().all(|n| !first.contains(&n.id())));
    assert_eq!(dag.edges().count(), 2);
}

/// Compiles `source` once through a plain resolver and once through a cache.
async fn plain_and_cached(sources: MemoryResolver, source: &str, max_depth: usize) -> (Dag, Dag) {
    let config = AppConfig::new(ImportConfig::new(None, max_depth, false));
    let plain = Compiler::new(config.clone(), sources.clone());
    let cached = Compiler::new(config, CachingResolver::new(sources));
    (
        plain.compile(source).await.unwrap().into_parts().0,
        cached.compile(source).await.unwrap().into_parts().0,
    )
}

fn nesting(dag: &Dag) -> Vec<(&str, usize)> {
    dag.child_dags()
        .map(|child| (child.name(), child.child_dags().count()))
        .collect()
}

#[tokio::test]
async fn test_cache_matches_plain_resolution_around_cycles() {
    let sources = MemoryResolver::new()
        .with_source("A", "b @ \"B\"\nfrom_a()")
        .with_source("B", "a @ \"A\"\nfrom_b()");
    let (plain, cached) = plain_and_cached(sources, "a @ \"A\"\nb @ \"B\"", 16).await;

    assert_eq!(nesting(&plain), [("a", 1), ("b", 1)]);
    assert_eq!(nesting(&cached), nesting(&plain));
    assert_eq!(cached.to_string(), plain.to_string());
}

#[tokio::test]
async fn test_cache_matches_plain_resolution_near_depth_bound() {
    let sources = MemoryResolver::new()
        .with_source("one", "two = @ \"two\"")
        .with_source("two", "three = @ \"three\"")
        .with_source("three", "leaf()");
    let (plain, cached) = plain_and_cached(sources, "x = @ \"two\"\ny = @ \"one\"", 2).await;

    assert_eq!(nesting(&plain), [("", 1), ("", 1)]);
    assert_eq!(cached.to_string(), plain.to_string());
}

#[tokio::test]
async fn test_file_resolver_reads_below_root() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("pantry.fiz"), "flour = mill()").unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/bread.fiz"), "p @ \"pantry\"\nloaf = bake(p.flour)").unwrap();

    let config = AppConfig::new(ImportConfig::default().with_root(dir.path()));
    let compiler = Compiler::from_config(config);

    let compilation = compiler.compile("b = @ \"sub/bread\"\neat(b.loaf)").await.unwrap();
    assert!(compilation.diagnostics().is_empty());

    let bread = compilation.dag().child_dags().next().unwrap();
    assert_eq!(bread.node_names(), ["bake"]);
    assert_eq!(bread.edge_name_pairs(), [("p", "bake")]);
}

#[tokio::test]
async fn test_compile_location_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let compiler = Compiler::new(AppConfig::default(), FileResolver::new(dir.path()));

    let err = compiler.compile_location("absent").await.unwrap_err();
    assert!(matches!(err, FizError::Import(ImportError::NotFound { .. })));
}
