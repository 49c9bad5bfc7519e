use crate::analysis::AnalysisReport;
use crate::cli::SchemaArgs;
use crate::config::Config;
use schemars::schema_for;

pub fn execute(args: SchemaArgs) -> anyhow::Result<()> {
    let schema = if args.report {
        schema_for!(AnalysisReport)
    } else {
        schema_for!(Config)
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
