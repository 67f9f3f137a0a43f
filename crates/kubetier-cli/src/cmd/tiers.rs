use crate::output::{print_json, print_table};
use console::style;
use kubetier_core::tier;

pub fn run(json: bool) -> anyhow::Result<()> {
    let tiers = tier::all();

    if json {
        let value: Vec<_> = tiers
            .iter()
            .map(|t| {
                serde_json::json!({
                    "tier": t.number(),
                    "name": t.name(),
                    "rationale": t.rationale(),
                    "implemented": t.implemented(),
                    "namespaces": t.namespaces(),
                    "components": t.components().iter().map(|c| serde_json::json!({
                        "name": c.name,
                        "release": c.release,
                        "chart": c.chart,
                        "namespace": c.namespace,
                    })).collect::<Vec<_>>(),
                })
            })
            .collect();
        return print_json(&value);
    }

    for t in &tiers {
        let title = format!("Tier {}: {}", t.number(), t.name());
        if t.implemented() {
            println!("{}", style(title).bold());
        } else {
            println!("{} {}", style(title).bold(), style("(not yet implemented)").dim());
        }
        println!("  {}", t.rationale());
        println!("  namespaces: {}", t.namespaces().join(", "));
        if !t.components().is_empty() {
            println!();
            let rows = t
                .components()
                .iter()
                .map(|c| {
                    vec![
                        c.name.to_string(),
                        c.release.to_string(),
                        c.chart.to_string(),
                        c.namespace.to_string(),
                    ]
                })
                .collect();
            print_table(&["COMPONENT", "RELEASE", "CHART", "NAMESPACE"], rows);
        }
        println!();
    }
    Ok(())
}
