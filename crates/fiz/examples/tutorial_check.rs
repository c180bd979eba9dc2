//! Example: Checking a learner's recipe the way a tutorial would
//!
//! Compiles a recipe, prints the graph dump, and evaluates a few success
//! predicates with the inspection helpers.

use fiz::{
    Compiler,
    config::AppConfig,
    dag::GraphElement,
    inspect,
    resolver::MemoryResolver,
};

const RECIPE: &str = r#"
    #hot{color: red; 'served steaming'}
    w{#hot} = water()
    hot = heat(w)
    leaves = pick()
    cup = steep(hot, leaves){#hot}
    serve(cup)
    stash(cup)
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let resolver = MemoryResolver::new().with_source("extras", "sugar = refine()");
    let compiler = Compiler::new(AppConfig::default(), resolver);

    let compilation = futures::executor::block_on(compiler.compile(RECIPE))?;
    let dag = compilation.dag();

    println!("{dag}");

    // A node used by two later steps
    let shared = dag
        .nodes()
        .filter(|node| inspect::out_degree(dag, node.id()) >= 2)
        .map(GraphElement::name)
        .collect::<Vec<_>>();
    println!("Feeds several steps: {shared:?}");

    // A step taking more than one input
    let joins = dag
        .nodes()
        .filter(|node| inspect::in_degree(dag, node.id()) >= 2)
        .map(GraphElement::name)
        .collect::<Vec<_>>();
    println!("Combines inputs: {joins:?}");

    let styled = inspect::style_tagged_nodes(dag)
        .into_iter()
        .map(GraphElement::name)
        .collect::<Vec<_>>();
    println!("Styled steps: {styled:?}");

    for diagnostic in compilation.diagnostics() {
        println!("{diagnostic}");
    }
    Ok(())
}
