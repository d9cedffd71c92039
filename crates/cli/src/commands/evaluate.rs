use std::path::Path;

use civicnav_catalog::values::{format_date, parse_date};
use civicnav_eval::assemble::assemble_snapshot;
use civicnav_eval::{evaluate_life_event, proactive_suggestions, NodeOutcome, NodeState};
use time::{Date, OffsetDateTime};

use super::{load_catalog, read_json, Context};
use crate::OutputFormat;

pub(crate) struct EvaluateArgs<'a> {
    pub catalog: Option<&'a Path>,
    pub event: Option<&'a str>,
    pub facts: Option<&'a Path>,
    pub statuses: Option<&'a Path>,
    pub today: Option<&'a str>,
    pub suggest: bool,
}

/// Evaluate one life event for a fact/status snapshot.
pub(crate) fn cmd_evaluate(ctx: &Context, args: EvaluateArgs<'_>) {
    let path = ctx.catalog_path(args.catalog);
    let catalog = load_catalog(ctx, &path);

    let event = match args.event.or(ctx.config.life_event.as_deref()) {
        Some(e) => e.to_string(),
        None => ctx.fail("error: no life event given (pass --event or set `life_event` in the config file)"),
    };
    let today = resolve_today(ctx, args.today);

    let empty = || serde_json::Value::Object(serde_json::Map::new());
    let facts = args
        .facts
        .map(|p| read_json(ctx, p, "facts"))
        .unwrap_or_else(empty);
    let statuses = args
        .statuses
        .map(|p| read_json(ctx, p, "statuses"))
        .unwrap_or_else(empty);

    let snapshot = match assemble_snapshot(&catalog, &facts, &statuses, today) {
        Ok(s) => s,
        Err(e) => ctx.fail(&format!("error: {}", e)),
    };
    let report = match evaluate_life_event(&catalog, &snapshot, &event) {
        Ok(r) => r,
        Err(e) => ctx.fail(&format!("error: {}", e)),
    };
    let suggestions = if args.suggest {
        proactive_suggestions(&catalog, &snapshot, &report)
    } else {
        Vec::new()
    };

    if ctx.quiet {
        return;
    }
    match ctx.output {
        OutputFormat::Json => {
            let mut json = report.to_json();
            if args.suggest {
                json["suggestions"] = serde_json::to_value(&suggestions).unwrap_or_default();
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&json)
                    .unwrap_or_else(|e| format!("serialization error: {}", e))
            );
        }
        OutputFormat::Text => {
            let name = catalog
                .life_event(&event)
                .map(|e| e.name.as_str())
                .unwrap_or(event.as_str());
            println!("{} ({})", name, format_date(report.today));
            println!();
            for node in &report.nodes {
                print_node(node);
            }
            println!();
            let s = &report.summary;
            println!(
                "{} service(s): {} actionable, {} need info, {} ineligible, {} locked, {} hidden, {} done",
                report.nodes.len(),
                s.actionable,
                s.needs_info,
                s.ineligible,
                s.locked,
                s.hidden_gated,
                s.satisfied
            );
            if args.suggest && !suggestions.is_empty() {
                println!();
                println!("You may also be able to claim:");
                for node in &suggestions {
                    println!("  {} ({})", node.name, node.service);
                }
            }
        }
    }
}

fn print_node(node: &NodeOutcome) {
    match node.state {
        NodeState::Locked => println!(
            "  {:<12} {} (after {})",
            node.state.as_str(),
            node.service,
            node.blocked_by.join(", ")
        ),
        _ => println!("  {:<12} {}", node.state.as_str(), node.service),
    }
    for q in &node.questions {
        println!("  {:<12}   ? {}", "", q.text);
    }
    if node.state == NodeState::Actionable {
        if let Some(phone) = node.contact.as_ref().and_then(|c| c.phone.as_deref()) {
            println!("  {:<12}   call {}", "", phone);
        }
    }
}

/// `--today`, else the config file's `today`, else the current UTC date.
fn resolve_today(ctx: &Context, flag: Option<&str>) -> Date {
    match flag.or(ctx.config.today.as_deref()) {
        Some(s) => match parse_date(s) {
            Ok(d) => d,
            Err(e) => ctx.fail(&format!("error: {}", e)),
        },
        None => OffsetDateTime::now_utc().date(),
    }
}
