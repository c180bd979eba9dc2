//! Graph building for parsed recipes.
//!
//! The [`Builder`] walks the statements of a recipe in source order and
//! populates one [`Dag`] per nesting level. Each statement kind maps onto the
//! graph as follows:
//!
//! - **Call**: one node, plus one edge per resolvable argument
//! - **Assignment**: the right-hand side is built once and every left-hand
//!   variable is bound to the resulting id
//! - **Alias**: a second name for an existing binding, no graph elements
//! - **Named style**: flattened and registered on the current level
//! - **Style binding**: tag list recorded under its keyword
//! - **Namespace**: a child level built recursively, fed by its arguments
//! - **Import**: resolved through the import coordinator, then nested or merged
//!
//! Nothing a single statement does can abort the build. Unresolvable
//! references and failed imports are logged, reported as warning
//! diagnostics, and the offending piece is dropped.

use futures::future::{BoxFuture, FutureExt};
use log::{debug, info, warn};

use fiz_core::{
    dag::{Dag, Edge, Node},
    identifier::Id,
    path::QualifiedPath,
    style::DagStyle,
};
use fiz_parser::{
    Span, Spanned,
    ast::{
        Alias, Assignment, AssignmentRhs, Call, Import, NamedStyle, Namespace, Recipe, Statement,
        StyleBinding, Value,
    },
    error::{Diagnostic, DiagnosticCollector, ErrorCode},
};

use crate::{
    import::{self, ImportChain, ImportError},
    resolver::ImportResolver,
    style::{element_style, flatten_named},
};

/// One argument flowing into a call or namespace.
struct IncomingEdge {
    src_id: Id,
    name: String,
    style: DagStyle,
    span: Span,
}

pub(crate) struct Builder<'r> {
    resolver: &'r dyn ImportResolver,
    diagnostics: DiagnosticCollector,
}

impl<'r> Builder<'r> {
    pub(crate) fn new(resolver: &'r dyn ImportResolver) -> Self {
        Self {
            resolver,
            diagnostics: DiagnosticCollector::new(),
        }
    }

    // ============================================================================
    // Main Entry Methods
    // ============================================================================

    /// Build the root level of `recipe`, returning it with every warning.
    pub(crate) async fn build(
        mut self,
        recipe: &Recipe,
        chain: &ImportChain,
    ) -> (Dag, Vec<Diagnostic>) {
        info!(
            statements = recipe.statements.len(),
            import_depth = chain.depth();
            "Building dag"
        );

        let root = Dag::new(Id::fresh(), "");
        let dag = self.build_level(root, &recipe.statements, chain).await;
        let diagnostics = self.diagnostics.into_diagnostics();

        info!(
            nodes = dag.nodes().count(),
            edges = dag.edges().count(),
            children = dag.child_dags().count(),
            warnings = diagnostics.len();
            "Dag built"
        );
        (dag, diagnostics)
    }

    /// Populate `dag` with `statements`, one at a time.
    ///
    /// Boxed so that namespaces and imports can recurse.
    fn build_level<'a>(
        &'a mut self,
        mut dag: Dag,
        statements: &'a [Spanned<Statement>],
        chain: &'a ImportChain,
    ) -> BoxFuture<'a, Dag> {
        async move {
            for statement in statements {
                self.process_statement(&mut dag, statement, chain).await;
            }
            dag
        }
        .boxed()
    }

    async fn process_statement(
        &mut self,
        dag: &mut Dag,
        statement: &Spanned<Statement>,
        chain: &ImportChain,
    ) {
        debug!(dag = dag.name(), span:? = statement.span(); "Processing statement");
        match statement.inner() {
            Statement::Call(call) => {
                self.process_call(dag, call);
            }
            Statement::Assignment(assignment) => {
                self.process_assignment(dag, assignment, chain).await;
            }
            Statement::Alias(alias) => self.process_alias(dag, alias),
            Statement::NamedStyle(named) => self.process_named_style(dag, named),
            Statement::StyleBinding(binding) => self.process_style_binding(dag, binding),
            Statement::Namespace(namespace) => {
                self.process_namespace(dag, namespace, chain).await;
            }
            Statement::Import(import) => self.process_import(dag, import, chain).await,
            Statement::Variable(path) => {
                debug!(variable:% = path.inner(); "Skipping bare variable");
                self.diagnostics.emit(
                    Diagnostic::warning(format!("statement `{}` has no effect", path.inner()))
                        .with_code(ErrorCode::E307)
                        .with_label(path.span(), "a bare variable adds nothing to the graph")
                        .with_help(format!("pass it to a call instead, e.g. `use({})`", path.inner())),
                );
            }
        }
    }

    // ============================================================================
    // Graph Elements
    // ============================================================================

    /// Add a node for `call` and connect its arguments to it.
    fn process_call(&mut self, dag: &mut Dag, call: &Call) -> Id {
        let node = Node::new(
            Id::fresh(),
            call.name.inner().as_str(),
            element_style(call.style.as_ref()),
        );
        let id = dag.add_node(node);
        let incoming = self.incoming_edges(dag, &call.args);
        self.add_incoming_edges(dag, incoming, id);
        id
    }

    async fn process_assignment(
        &mut self,
        dag: &mut Dag,
        assignment: &Assignment,
        chain: &ImportChain,
    ) {
        let produced = match &assignment.rhs {
            AssignmentRhs::Call(call) => Some(self.process_call(dag, call)),
            AssignmentRhs::Namespace(namespace) => {
                Some(self.process_namespace(dag, namespace, chain).await)
            }
            AssignmentRhs::Import(import) => self.import_nested(dag, import, chain).await,
        };
        let Some(id) = produced else {
            debug!(
                variables = assignment.lhs.len();
                "Dropping assignment with failed right-hand side"
            );
            return;
        };

        for var in &assignment.lhs {
            let name = var.name.inner().as_str();
            dag.set_var_node(name, id);
            dag.set_var_style(name, var.style.as_ref().map(|style| element_style(Some(style))));
        }
    }

    fn process_alias(&mut self, dag: &mut Dag, alias: &Alias) {
        let Some(id) = dag.visible_producer(alias.rhs.inner()) else {
            self.report_unresolved(&alias.rhs);
            return;
        };
        let name = alias.lhs.name.inner().as_str();
        dag.set_var_node(name, id);
        dag.set_var_style(
            name,
            alias.lhs.style.as_ref().map(|style| element_style(Some(style))),
        );
    }

    /// Build a namespace as a child level and return the child's id.
    ///
    /// Arguments are resolved before the child is attached, so they cannot
    /// refer into the namespace they feed.
    async fn process_namespace(
        &mut self,
        dag: &mut Dag,
        namespace: &Namespace,
        chain: &ImportChain,
    ) -> Id {
        let name = namespace
            .name
            .as_ref()
            .map(|name| name.inner().as_str())
            .unwrap_or_default();
        debug!(parent = dag.name(), namespace = name; "Entering namespace");

        let incoming = self.incoming_edges(dag, &namespace.args);
        let child = Dag::new(Id::fresh(), name)
            .with_parent(dag.id())
            .with_style(element_style(namespace.style.as_ref()));
        let child = self.build_level(child, &namespace.statements, chain).await;

        let id = dag.add_child_dag(child);
        self.add_incoming_edges(dag, incoming, id);
        id
    }

    /// Resolve every argument to an incoming edge, dropping unresolvable ones.
    fn incoming_edges(&mut self, dag: &mut Dag, args: &[Value]) -> Vec<IncomingEdge> {
        let mut incoming = Vec::with_capacity(args.len());
        for arg in args {
            match arg {
                Value::Call(call) => {
                    let src_id = self.process_call(dag, call);
                    incoming.push(IncomingEdge {
                        src_id,
                        name: String::new(),
                        style: DagStyle::default(),
                        span: call.span(),
                    });
                }
                Value::Variable(path) => {
                    let Some(src_id) = dag.visible_producer(path.inner()) else {
                        self.report_unresolved(path);
                        continue;
                    };
                    incoming.push(IncomingEdge {
                        src_id,
                        name: path.last().unwrap_or_default().to_string(),
                        style: dag.var_style(path.inner()).cloned().unwrap_or_default(),
                        span: path.span(),
                    });
                }
            }
        }
        incoming
    }

    fn add_incoming_edges(&mut self, dag: &mut Dag, incoming: Vec<IncomingEdge>, dest_id: Id) {
        for edge in incoming {
            let span = edge.span;
            let result = dag.add_edge(Edge::new(
                Id::fresh(),
                edge.name,
                edge.src_id,
                dest_id,
                edge.style,
            ));
            if let Err(err) = result {
                self.report(
                    Diagnostic::warning(err.to_string())
                        .with_code(ErrorCode::E303)
                        .with_label(span, "edge dropped"),
                );
            }
        }
    }

    // ============================================================================
    // Styles
    // ============================================================================

    fn process_named_style(&mut self, dag: &mut Dag, named: &NamedStyle) {
        let flattened = flatten_named(dag, &named.style);
        for tag in flattened.missing {
            self.report(
                Diagnostic::warning(format!("undefined style tag `{}`", tag.inner()))
                    .with_code(ErrorCode::E301)
                    .with_label(tag.span(), "not declared before this style")
                    .with_help("declare referenced styles first; the reference is skipped"),
            );
        }
        debug!(
            style = named.name.inner().as_str(),
            properties = flattened.properties.len();
            "Registering style"
        );
        dag.set_style(named.name.inner().as_str(), flattened.properties);
    }

    fn process_style_binding(&mut self, dag: &mut Dag, binding: &StyleBinding) {
        let tags: Vec<QualifiedPath> = binding.tags.iter().map(|tag| tag.inner().clone()).collect();
        debug!(keyword = binding.keyword.inner().as_str(), tags = tags.len(); "Binding styles");
        dag.add_style_binding(binding.keyword.inner().as_str(), tags);
    }

    // ============================================================================
    // Imports
    // ============================================================================

    /// A standalone import: nested when named, merged otherwise.
    async fn process_import(&mut self, dag: &mut Dag, import: &Import, chain: &ImportChain) {
        let Some(imported) = self.fetch_import(dag, import, chain).await else {
            return;
        };
        match &import.name {
            Some(name) => {
                import::adopt(dag, imported, name.inner());
            }
            None => import::absorb(dag, imported),
        }
    }

    /// An import on the right-hand side of an assignment: always nested.
    async fn import_nested(
        &mut self,
        dag: &mut Dag,
        import: &Import,
        chain: &ImportChain,
    ) -> Option<Id> {
        let imported = self.fetch_import(dag, import, chain).await?;
        let name = import
            .name
            .as_ref()
            .map(|name| name.inner().as_str())
            .unwrap_or_default();
        Some(import::adopt(dag, imported, name))
    }

    async fn fetch_import(
        &mut self,
        dag: &mut Dag,
        import: &Import,
        chain: &ImportChain,
    ) -> Option<Dag> {
        let location = import.location.inner().as_str();
        if location.is_empty() {
            self.report(
                Diagnostic::warning("import has no location")
                    .with_code(ErrorCode::E304)
                    .with_label(import.location.span(), "expected a quoted location")
                    .with_help("write the location in quotes, e.g. `@ \"pantry\"`"),
            );
            return None;
        }

        match import::fetch(self.resolver, dag, location, chain).await {
            Ok(imported) => Some(imported),
            Err(err) => {
                self.report_import_failure(&err, import.location.span());
                None
            }
        }
    }

    // ============================================================================
    // Diagnostics
    // ============================================================================

    fn report(&mut self, diagnostic: Diagnostic) {
        warn!(code:? = diagnostic.code(); "{}", diagnostic.message());
        self.diagnostics.emit(diagnostic);
    }

    fn report_unresolved(&mut self, path: &Spanned<QualifiedPath>) {
        let diagnostic = if path.is_qualified() {
            Diagnostic::warning(format!("unresolved qualified path `{}`", path.inner()))
                .with_code(ErrorCode::E302)
                .with_label(path.span(), "no such variable in the named level")
        } else {
            Diagnostic::warning(format!("undefined variable `{}`", path.inner()))
                .with_code(ErrorCode::E300)
                .with_label(path.span(), "not bound at this level")
                .with_help(format!("assign it first, e.g. `{} = make()`", path.inner()))
        };
        self.report(diagnostic);
    }

    fn report_import_failure(&mut self, err: &ImportError, span: Span) {
        let label = match err {
            ImportError::Cycle { .. } => "already being imported",
            ImportError::DepthExceeded { .. } => "nested too deeply",
            _ => "could not be imported",
        };
        let mut diagnostic = Diagnostic::warning(err.to_string())
            .with_code(err.code())
            .with_label(span, label);
        if let ImportError::DepthExceeded { .. } = err {
            diagnostic = diagnostic.with_help("raise `imports.max_depth` in the configuration");
        }
        self.report(diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use fiz_core::dag::GraphElement;

    use super::*;
    use crate::resolver::{MemoryResolver, NoImports};

    async fn build_with(resolver: &dyn ImportResolver, source: &str) -> (Dag, Vec<Diagnostic>) {
        let recipe = fiz_parser::parse(source).expect("recipe should parse");
        Builder::new(resolver)
            .build(&recipe, &ImportChain::default())
            .await
    }

    fn codes(diagnostics: &[Diagnostic]) -> Vec<ErrorCode> {
        diagnostics.iter().filter_map(Diagnostic::code).collect()
    }

    #[tokio::test]
    async fn test_undefined_variable_is_dropped_with_warning() {
        let (dag, diagnostics) = build_with(&NoImports, "f(a, g())").await;
        assert_eq!(dag.node_names(), ["f", "g"]);
        assert_eq!(dag.edges().count(), 1);
        assert_eq!(codes(&diagnostics), [ErrorCode::E300]);
        assert_eq!(diagnostics[0].labels()[0].span(), Span::new(2..3));
    }

    #[tokio::test]
    async fn test_unresolved_qualified_path() {
        let (dag, diagnostics) = build_with(&NoImports, "ns[x = f()]\ng(ns.y)\nh(zz.x)").await;
        assert_eq!(dag.edges().count(), 0);
        assert_eq!(codes(&diagnostics), [ErrorCode::E302, ErrorCode::E302]);
    }

    #[tokio::test]
    async fn test_bare_variable_has_no_effect() {
        let (dag, diagnostics) = build_with(&NoImports, "x = f()\nx").await;
        assert_eq!(dag.nodes().count(), 1);
        assert_eq!(codes(&diagnostics), [ErrorCode::E307]);
        assert!(diagnostics[0].severity().is_warning());
    }

    #[tokio::test]
    async fn test_edge_named_after_last_segment() {
        let (dag, diagnostics) = build_with(&NoImports, "ns[flour = mill()]\nbake(ns.flour)").await;
        assert!(diagnostics.is_empty());
        let edge = dag.edges().next().unwrap();
        assert_eq!(edge.name(), "flour");
        let child = dag.child_dags().next().unwrap();
        assert_eq!(edge.src_id(), child.id());
    }

    #[tokio::test]
    async fn test_edge_style_comes_from_variable() {
        let (dag, _) = build_with(&NoImports, "w{#cold; color: blue} = water()\nheat(w)").await;
        let edge = dag.edges().next().unwrap();
        assert_eq!(edge.style_tags(), &[QualifiedPath::from("cold")]);
        assert_eq!(edge.style_properties()["color"], "blue");
    }

    #[tokio::test]
    async fn test_failed_import_drops_assignment() {
        let (dag, diagnostics) = build_with(&NoImports, "lib = @ \"pantry\"\nuse(lib)").await;
        assert!(dag.var_bindings().is_empty());
        assert_eq!(dag.node_names(), ["use"]);
        assert_eq!(codes(&diagnostics), [ErrorCode::E304, ErrorCode::E300]);
    }

    #[tokio::test]
    async fn test_missing_location_is_reported() {
        let (dag, diagnostics) = build_with(&NoImports, "@").await;
        assert!(dag.used_imports().is_empty());
        assert_eq!(codes(&diagnostics), [ErrorCode::E304]);
    }

    #[tokio::test]
    async fn test_named_import_statement_nests() {
        let resolver = MemoryResolver::new().with_source("pantry", "flour = mill()");
        let (dag, diagnostics) = build_with(&resolver, "pantry @ \"pantry\"\nbake(pantry.flour)").await;
        assert!(diagnostics.is_empty());
        let child = dag.child_dags().next().unwrap();
        assert_eq!(child.name(), "pantry");
        assert_eq!(dag.edge_name_pairs(), [("pantry", "bake")]);
        assert_eq!(dag.used_imports().len(), 1);
    }

    #[tokio::test]
    async fn test_namespace_arguments_cannot_reach_into_themselves() {
        let (dag, diagnostics) = build_with(&NoImports, "ns[x = f()](ns.x)").await;
        assert_eq!(dag.edges().count(), 0);
        assert_eq!(codes(&diagnostics), [ErrorCode::E302]);
        assert!(dag.topological_order().is_ok());
    }
}
