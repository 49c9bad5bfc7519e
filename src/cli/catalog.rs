use crate::analysis::{profile, TaskCatalog, AGENT_PROFILES};
use crate::cli::CatalogArgs;
use crate::config::Config;

pub fn execute(args: CatalogArgs) -> anyhow::Result<()> {
    let config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        Config::default()
    };
    let catalog = TaskCatalog::standard(&config.analysis.optional_groups);

    println!("\n=== Analysis Tasks ===\n");
    for task in catalog.tasks() {
        let groups: Vec<&str> = task.focus.iter().map(|g| g.key()).collect();
        let tools = profile(&task.role)
            .map(|p| p.tools.join(", "))
            .unwrap_or_default();
        println!("  - {} -> {}", task.role, groups.join(", "));
        println!("      {}", task.description);
        if !tools.is_empty() {
            println!("      tools: {}", tools);
        }
    }

    println!("\n=== Agent Roles ===\n");
    for agent in AGENT_PROFILES {
        println!("  - {}: {}", agent.role, agent.description);
    }
    println!();
    Ok(())
}
