use clap::Parser;
use megaverse::config::cli::{Cli, Command, CreateArgs, GoalFileArgs, LogFormat, SourceArgs};
use megaverse::core::goal_loader;
use megaverse::domain::model::GoalMap;
use megaverse::domain::ports::ConfigProvider;
use megaverse::utils::{logger, validation::Validate};
use megaverse::{ApiClient, ConsoleProgressObserver, MegaverseCreator, MegaverseError, RunSummary, Settings};
use std::path::PathBuf;
use std::sync::Arc;

type Creator = MegaverseCreator<ApiClient, Settings>;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut settings = match Settings::load(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("❌ Configuration Error: {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(e.exit_code());
        }
    };
    if let Some(id) = &cli.candidate_id {
        settings.candidate_id = Some(id.clone());
    }
    if let Some(level) = &cli.log_level {
        settings.log_level = level.clone();
    }

    match cli.log_format {
        LogFormat::Text => logger::init_cli_logger(&settings.log_level, cli.verbose),
        LogFormat::Json => logger::init_json_logger(&settings.log_level, cli.verbose),
    }
    if cli.verbose {
        tracing::debug!("CLI args: {:?}", cli);
        tracing::debug!("Settings: {:?}", settings);
    }

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        eprintln!("❌ Configuration Error: {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());
        std::process::exit(e.exit_code());
    }

    let exit_code = tokio::select! {
        result = run(cli.command_or_default(), settings) => match result {
            Ok(code) => code,
            Err(e) => {
                tracing::error!(
                    "❌ Run failed: {} (Category: {:?}, Severity: {:?})",
                    e,
                    e.category(),
                    e.severity()
                );
                eprintln!("\n❌ Error: {}", e.user_friendly_message());
                eprintln!("💡 {}", e.recovery_suggestion());
                e.exit_code()
            }
        },
        _ = tokio::signal::ctrl_c() => {
            println!("\n\n⚠️  Operation cancelled by user.");
            1
        }
    };

    std::process::exit(exit_code);
}

async fn run(command: Command, settings: Settings) -> Result<i32, MegaverseError> {
    let client = ApiClient::new(
        &settings.api_base_url,
        settings.retry_policy(),
        settings.request_timeout(),
    )?;
    let mut creator = MegaverseCreator::new(client, settings);

    match command {
        Command::Create(args) => {
            creator.add_observer(Arc::new(ConsoleProgressObserver::new("creation")));
            command_create(&creator, args).await
        }
        Command::Preview(args) => command_preview(&creator, args),
        Command::Delete { yes } => {
            creator.add_observer(Arc::new(ConsoleProgressObserver::new("deletion")));
            command_delete(&creator, yes).await
        }
        Command::FetchGoal { output } => command_fetch_goal(&creator, output).await,
        Command::Status(args) => command_status(&creator, args).await,
    }
}

fn goal_path(settings: &Settings, args: &GoalFileArgs) -> PathBuf {
    args.goal_file
        .clone()
        .unwrap_or_else(|| PathBuf::from(settings.goal_file()))
}

async fn load_goal(creator: &Creator, source: &SourceArgs, candidate_id: &str) -> Result<GoalMap, MegaverseError> {
    if source.from_api {
        println!("📡 Loading goal map from API...");
        goal_loader::load_from_api(creator.api(), candidate_id).await
    } else {
        let path = goal_path(creator.config(), &source.goal);
        println!("📁 Loading goal map from file: {}", path.display());
        goal_loader::load_from_file(&path)
    }
}

fn print_results(summary: &RunSummary) {
    println!("   ✅ Successful: {}", summary.successful);
    println!("   ❌ Failed: {}", summary.failed);
    println!("   📊 Total: {}", summary.total);
}

async fn command_create(creator: &Creator, args: CreateArgs) -> Result<i32, MegaverseError> {
    println!("🚀 Megaverse Creator");
    println!("{}", "=".repeat(60));

    let candidate_id = creator.config().require_candidate_id()?;
    let goal_map = load_goal(creator, &args.source, candidate_id).await?;

    let summary = if args.only_missing {
        creator.create_missing(&goal_map, candidate_id).await?
    } else {
        creator.create_from_goal(&goal_map, candidate_id).await?
    };

    println!("\n{}", "=".repeat(60));
    println!("📊 Final Results:");
    print_results(&summary);

    if summary.is_success() {
        println!("\n🎉 All objects created successfully!");
        println!("   Check your map at the challenge website to verify.");
        Ok(0)
    } else {
        println!("\n⚠️  {} objects failed to create:", summary.failed);
        for failure in &summary.failures {
            println!("   - {}", failure);
        }
        println!("   Rerun with `create --only-missing` to retry just these.");
        Ok(1)
    }
}

fn command_preview(creator: &Creator, args: GoalFileArgs) -> Result<i32, MegaverseError> {
    println!("🔍 Megaverse Creation Preview");
    println!("{}", "=".repeat(40));

    let preview = creator.preview_creation(goal_path(creator.config(), &args))?;
    let stats = &preview.statistics;

    println!("📏 Map Dimensions: {}x{}", stats.rows, stats.columns);
    println!("📊 Total Objects: {}", stats.total_objects);
    println!("🚀 Space Cells: {}", stats.space_count);

    println!("\n📈 Object Type Breakdown:");
    for (object_type, count) in stats.type_counts.iter().filter(|(_, c)| **c > 0) {
        println!("   {}: {}", object_type, count);
    }

    println!("\n🎯 Specific Object Counts:");
    for (label, count) in &stats.object_counts {
        println!("   {}: {}", label, count);
    }

    println!(
        "\n⏱️  Estimated Time: {:.1} minutes",
        preview.estimated_time.as_secs_f64() / 60.0
    );

    if !preview.objects.is_empty() {
        println!("\n📍 First 5 Objects to Create:");
        for (i, object) in preview.objects.iter().take(5).enumerate() {
            println!("   {}. {}", i + 1, object);
        }
        if preview.objects.len() > 5 {
            println!("   ... and {} more", preview.objects.len() - 5);
        }
    }

    Ok(0)
}

async fn command_delete(creator: &Creator, yes: bool) -> Result<i32, MegaverseError> {
    println!("🗑️  Megaverse Deletion");
    println!("{}", "=".repeat(30));

    let candidate_id = creator.config().require_candidate_id()?;
    println!(
        "⚠️  This will delete ALL objects from the megaverse for candidate: {}",
        candidate_id
    );

    if !yes {
        let answer = tokio::task::spawn_blocking(|| {
            dialoguer::Confirm::new()
                .with_prompt("Are you sure you want to proceed?")
                .default(false)
                .interact()
        })
        .await
        .map_err(|e| MegaverseError::IoError(std::io::Error::other(e)))?;

        if let Some(code) = declined_exit_code(answer) {
            println!("❌ Operation cancelled.");
            return Ok(code);
        }
    }

    let summary = creator.delete_all(candidate_id).await?;

    println!("\n📊 Deletion Results:");
    print_results(&summary);

    if summary.is_success() {
        println!("\n🎉 All objects deleted successfully!");
        Ok(0)
    } else {
        println!("\n⚠️  {} objects failed to delete.", summary.failed);
        Ok(1)
    }
}

/// `None` when the user confirmed. A declined prompt exits 0, an interrupted one exits 1.
fn declined_exit_code(answer: Result<bool, dialoguer::Error>) -> Option<i32> {
    match answer {
        Ok(true) => None,
        Ok(false) => Some(0),
        Err(e) => {
            tracing::debug!("Confirmation prompt interrupted: {}", e);
            Some(1)
        }
    }
}

async fn command_fetch_goal(creator: &Creator, output: Option<PathBuf>) -> Result<i32, MegaverseError> {
    let candidate_id = creator.config().require_candidate_id()?;
    let output = output.unwrap_or_else(|| PathBuf::from(creator.config().goal_file()));

    println!("📡 Downloading goal map for candidate {}", candidate_id);
    let goal_map = goal_loader::load_from_api(creator.api(), candidate_id).await?;
    goal_loader::save_to_file(&goal_map, &output)?;

    println!(
        "💾 Saved {}x{} goal map to {}",
        goal_map.rows(),
        goal_map.columns(),
        output.display()
    );
    Ok(0)
}

async fn command_status(creator: &Creator, source: SourceArgs) -> Result<i32, MegaverseError> {
    let candidate_id = creator.config().require_candidate_id()?;
    let goal_map = load_goal(creator, &source, candidate_id).await?;
    let diff = creator.diff(&goal_map, candidate_id).await?;

    let goal_objects = goal_loader::statistics(&goal_map).total_objects;
    println!("🛰️  Megaverse Status");
    println!("   🎯 Goal objects: {}", goal_objects);
    println!("   ✅ In place: {}", goal_objects - diff.missing.len());
    println!("   ⏳ Missing: {}", diff.missing.len());
    println!("   ❓ Not in goal: {}", diff.unexpected.len());

    for object in diff.missing.iter().take(10) {
        println!("   + {}", object);
    }
    for object in diff.unexpected.iter().take(10) {
        println!("   - {}", object);
    }

    if diff.is_complete() {
        println!("\n🎉 The megaverse matches the goal map.");
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declined_exit_code() {
        assert_eq!(declined_exit_code(Ok(true)), None);
        assert_eq!(declined_exit_code(Ok(false)), Some(0));

        let interrupted = dialoguer::Error::IO(std::io::Error::new(
            std::io::ErrorKind::Interrupted,
            "interrupted",
        ));
        assert_eq!(declined_exit_code(Err(interrupted)), Some(1));
    }

    #[test]
    fn test_goal_path_falls_back_to_configured_file() {
        let settings = Settings {
            goal_file: "maps/goal.json".to_string(),
            ..Settings::default()
        };
        assert_eq!(
            goal_path(&settings, &GoalFileArgs::default()),
            PathBuf::from("maps/goal.json")
        );

        let args = GoalFileArgs {
            goal_file: Some(PathBuf::from("other.json")),
        };
        assert_eq!(goal_path(&settings, &args), PathBuf::from("other.json"));
    }
}
