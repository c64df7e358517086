//! Human-readable output. `--json` bypasses all of this.

use colored::Colorize;
use metacontext_graph::{Classification, Edge, Node, Subgraph, TypeDef};
use metacontext_resolver::{Context, ContextualNode, ElementSummary};

pub fn node(n: &Node) {
    println!("{} {}", n.id.bold(), format!("[{}]", n.type_name()).cyan());
    for (key, value) in &n.properties {
        println!("    {key} = {value}");
    }
    for c in &n.classifications {
        println!("    {} {}", "classified".yellow(), c.name);
    }
}

pub fn nodes(list: &[Node]) {
    for n in list {
        node(n);
    }
    println!("{} node(s)", list.len());
}

pub fn classifications(list: &[Classification]) {
    for c in list {
        println!("{}", c.name.bold());
        for (key, value) in &c.properties {
            println!("    {key} = {value}");
        }
    }
}

pub fn edge(e: &Edge) {
    println!(
        "{} {} {} -- {}",
        e.id.bold(),
        format!("[{}]", e.type_name()).cyan(),
        e.end_one.id,
        e.end_two.id
    );
}

pub fn edges(list: &[Edge]) {
    for e in list {
        edge(e);
    }
    println!("{} relationship(s)", list.len());
}

pub fn subgraph(graph: &Subgraph) {
    println!("{}", "nodes".green().bold());
    for n in &graph.nodes {
        println!("  {} {}", n.id, format!("[{}]", n.type_name()).cyan());
    }
    println!("{}", "edges".green().bold());
    for e in &graph.edges {
        print!("  ");
        edge(e);
    }
}

fn rung(label: &str, slot: &Option<ElementSummary>) {
    match slot {
        Some(s) => println!(
            "    {:<11}{} {}{}",
            label,
            s.id.bold(),
            format!("[{}]", s.type_name).cyan(),
            s.qualified_name
                .as_deref()
                .map(|q| format!(" {q}"))
                .unwrap_or_default()
        ),
        None => println!("    {:<11}{}", label, "-".dimmed()),
    }
}

pub fn context(ctx: &Context) {
    rung("column", &ctx.column);
    rung("table", &ctx.table);
    rung("schema", &ctx.schema);
    rung("database", &ctx.database);
    rung("connection", &ctx.connection);
    rung("connector", &ctx.connector);
    rung("endpoint", &ctx.endpoint);
}

pub fn contextual(found: &ContextualNode) {
    node(&found.node);
    if found.contexts.is_empty() {
        println!("  {}", "no context".dimmed());
    }
    for (i, ctx) in found.contexts.iter().enumerate() {
        println!("  {} {}", "context".green().bold(), i + 1);
        context(ctx);
    }
}

pub fn hits(list: &[ContextualNode]) {
    for found in list {
        contextual(found);
        println!();
    }
    println!("{} hit(s)", list.len());
}

pub fn type_def(def: &TypeDef) {
    println!("{} {}", def.name.bold(), def.guid.dimmed());
    if let Some(parent) = &def.super_type {
        println!("    supertype  {parent}");
    }
    println!("    category   {:?}", def.category);
    if let Some(text) = &def.description {
        println!("    {text}");
    }
}

pub fn type_names(names: &[String]) {
    for name in names {
        println!("{name}");
    }
    println!("{} type(s)", names.len());
}
