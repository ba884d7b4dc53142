use super::index_client;
use crate::console;
use anyhow::Result;
use clap::Args;
use pydeps_core::{PydepsConfig, ResolverSettings, operations};
use pydeps_pep508::Requirement;

#[derive(Args, Debug)]
pub struct DepsArgs {
    /// Package name
    pub package: String,

    /// Inspect this release instead of the latest
    #[arg(long = "release", value_name = "VERSION")]
    pub version: Option<String>,

    /// Output JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn run(args: DepsArgs, config: &PydepsConfig) -> Result<()> {
    if !args.json {
        console::header("deps");
    }

    let index = index_client(config)?;
    let settings = ResolverSettings::from_config(config);
    let deps = operations::package_dependencies(
        &index,
        &settings,
        &args.package,
        args.version.as_deref(),
    )
    .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&deps)?);
        return Ok(());
    }

    console::info(&format!("{}@{}", deps.name, deps.version));
    if let Some(requires_python) = &deps.requires_python {
        console::info(&console::dim(&format!("requires python {}", requires_python)));
    }

    print_group("runtime", &deps.buckets.runtime);

    for (group, requirements) in &deps.buckets.development {
        print_group(&format!("development [{}]", group), requirements);
    }

    for (group, requirements) in &deps.buckets.extras {
        print_group(&format!("extra [{}]", group), requirements);
    }

    if deps.skipped > 0 {
        console::warn(&format!(
            "{} requirement line(s) could not be parsed and were skipped",
            deps.skipped
        ));
    }

    Ok(())
}

fn print_group(title: &str, requirements: &[Requirement]) {
    console::section(&format!("{} ({})", title, requirements.len()));

    for req in requirements {
        console::info(&format!("  {}", req));
    }
}
