use clap::Parser;
use dossier::cli::output::Output;
use dossier::cli::Cli;
use dossier::research::{ResearchCoordinator, ResearchRequest};
use dossier::utils::config::Config;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "dossier=debug" } else { "dossier=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();

    let out = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };
    out.banner();

    if let Err(e) = run(&cli, &out).await {
        out.error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run(cli: &Cli, out: &Output) -> dossier::Result<()> {
    let config = Config::from_env()?;
    let coordinator = ResearchCoordinator::from_config(&config).await?;

    let mut request = ResearchRequest::new(&cli.goal, cli.persona.persona());
    request.github_override = cli.github.clone();
    request.linkedin_override = cli.linkedin.clone();

    out.step(1, 2, &format!("researching {}", cli.goal));
    let outcome = coordinator.run(&request).await;

    if outcome.degraded_plan {
        out.warning("planning collaborator unavailable, used the fallback plan");
    }
    if outcome.profile.is_empty() {
        out.warning("no usable data was collected");
    }

    out.step(2, 2, "rendering report");
    println!("\n{}", outcome.report);
    out.info(&format!("session cost: ${:.3}", outcome.costs.total));

    if cli.no_save {
        out.info("skipping save (--no-save)");
    } else {
        let path = coordinator.save(&outcome, &request, cli.output.as_deref())?;
        out.success(&format!("report saved to {}", path.display()));
    }

    Ok(())
}
