mod runner;

use clap::{Args, Parser, Subcommand};
use rand::rngs::StdRng;
use rand::SeedableRng;
use runner::{format_clock, Outcome};
use sauna_core::adjust::{COLD_TEMP_RANGE, HEAT_TEMP_RANGE};
use sauna_core::suggest::suggest_into;
use sauna_core::*;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "saunaflow")]
#[command(about = "Guided sauna and cold plunge rituals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Read configuration from this file instead of the default location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Accept the health notice and set your name and goal
    Setup {
        #[arg(long)]
        name: String,

        /// Ritual goal (relax, performance)
        #[arg(long, value_parser = parse_goal)]
        goal: Goal,

        /// Accept the health notice without prompting
        #[arg(long)]
        accept_health_check: bool,
    },

    /// List the built-in protocols
    Protocols {
        /// Only show protocols for this goal
        #[arg(long, value_parser = parse_goal)]
        goal: Option<Goal>,
    },

    /// Show how temperatures change a protocol's stage durations
    Adjust {
        /// Protocol id (see `protocols`)
        id: String,

        #[command(flatten)]
        temps: Temperatures,
    },

    /// Run a built-in protocol
    Run {
        /// Protocol id (see `protocols`)
        id: String,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Build and run a custom ritual
    Custom {
        #[arg(long)]
        name: Option<String>,

        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=10))]
        cycles: Option<u32>,

        /// Sauna stage length in minutes
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=60))]
        sauna_min: Option<u32>,

        /// Cold stage length in minutes
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=60))]
        cold_min: Option<u32>,

        /// Rest stage length in minutes
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=60))]
        rest_min: Option<u32>,

        #[arg(long)]
        no_sauna: bool,

        #[arg(long)]
        no_cold: bool,

        #[arg(long)]
        no_rest: bool,

        /// Start from a suggestion for this level (beginner, intermediate, advanced)
        #[arg(long, value_parser = parse_level)]
        suggest: Option<ExperienceLevel>,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Show streak, totals, achievements and recent rituals
    Stats,

    /// Export the session history to CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },

    /// Clear your name and goal so setup can pick new ones
    ChangeGoal,

    /// Erase all stored data
    Reset {
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Clone, Copy)]
struct Temperatures {
    /// Sauna temperature in °C
    #[arg(long, value_parser = parse_heat_temp)]
    heat: Option<i32>,

    /// Cold plunge temperature in °C
    #[arg(long, value_parser = parse_cold_temp)]
    cold: Option<i32>,
}

#[derive(Args, Clone, Copy)]
struct RunArgs {
    #[command(flatten)]
    temps: Temperatures,

    /// Dry run - show the plan without starting a session
    #[arg(long)]
    dry_run: bool,

    /// Auto-complete (for testing) - run every stage instantly
    #[arg(long)]
    auto_complete: bool,

    /// Seed for the stage microcopy and tips
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_goal(s: &str) -> std::result::Result<Goal, String> {
    Goal::parse(s).ok_or_else(|| format!("unknown goal '{}' (relax, performance)", s))
}

fn parse_level(s: &str) -> std::result::Result<ExperienceLevel, String> {
    ExperienceLevel::parse(s)
        .ok_or_else(|| format!("unknown level '{}' (beginner, intermediate, advanced)", s))
}

fn parse_temp(
    s: &str,
    range: &std::ops::RangeInclusive<i32>,
) -> std::result::Result<i32, String> {
    let value: i32 = s.parse().map_err(|_| format!("'{}' is not a number", s))?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{} is outside {}..={} °C",
            value,
            range.start(),
            range.end()
        ))
    }
}

fn parse_heat_temp(s: &str) -> std::result::Result<i32, String> {
    parse_temp(s, &HEAT_TEMP_RANGE)
}

fn parse_cold_temp(s: &str) -> std::result::Result<i32, String> {
    parse_temp(s, &COLD_TEMP_RANGE)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    sauna_core::logging::init(cli.verbose);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let data_dir = cli
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data.data_dir.clone());

    match cli.command {
        Commands::Setup {
            name,
            goal,
            accept_health_check,
        } => cmd_setup(&data_dir, &name, goal, accept_health_check),
        Commands::Protocols { goal } => cmd_protocols(goal),
        Commands::Adjust { id, temps } => cmd_adjust(&id, temps, &config),
        Commands::Run { id, run } => cmd_run(&data_dir, &id, run, &config),
        Commands::Custom {
            name,
            cycles,
            sauna_min,
            cold_min,
            rest_min,
            no_sauna,
            no_cold,
            no_rest,
            suggest,
            run,
        } => {
            let mut ritual = CustomRitual::default();
            if let Some(level) = suggest {
                apply_suggestion(&mut ritual, level, &config);
            }
            if let Some(name) = name {
                ritual.name = name;
            }
            if let Some(cycles) = cycles {
                ritual.cycles = cycles;
            }
            for (setting, minutes, off) in [
                (&mut ritual.heat, sauna_min, no_sauna),
                (&mut ritual.cold, cold_min, no_cold),
                (&mut ritual.rest, rest_min, no_rest),
            ] {
                if let Some(minutes) = minutes {
                    setting.minutes = minutes;
                    setting.enabled = true;
                }
                if off {
                    setting.enabled = false;
                }
            }
            cmd_custom(&data_dir, &ritual, run, &config)
        }
        Commands::Stats => cmd_stats(&data_dir),
        Commands::Export { out } => cmd_export(&data_dir, &out),
        Commands::ChangeGoal => cmd_change_goal(&data_dir),
        Commands::Reset { yes } => cmd_reset(&data_dir, yes),
    }
}

fn open_flow(data_dir: &Path) -> Result<AppFlow<FileStore>> {
    let mut flow = AppFlow::new(FileStore::in_dir(data_dir));
    flow.load()?;
    Ok(flow)
}

fn checked_catalog() -> Result<&'static Catalog> {
    let catalog = default_catalog();
    let errors = catalog.validate();
    if !errors.is_empty() {
        eprintln!("Catalog validation errors:");
        for error in errors {
            eprintln!("  - {}", error);
        }
        return Err(Error::CatalogValidation("Invalid catalog".into()));
    }
    Ok(catalog)
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn confirm(prompt: &str, expected: &str) -> Result<bool> {
    print!("{} ", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case(expected))
}

fn cmd_setup(data_dir: &Path, name: &str, goal: Goal, accept: bool) -> Result<()> {
    let mut flow = open_flow(data_dir)?;

    if flow.screen() == Screen::HealthCheck {
        println!("╭─────────────────────────────────────────╮");
        println!("│  HEALTH NOTICE");
        println!("╰─────────────────────────────────────────╯");
        println!("  Sauna and cold exposure put real stress on the heart.");
        println!("  Check with a doctor if you are pregnant, have a heart");
        println!("  condition or high blood pressure. Stay hydrated, skip");
        println!("  alcohol, and leave any stage the moment you feel unwell.");
        println!();

        if !(accept || confirm("Type 'yes' to accept:", "yes")?) {
            return Err(Error::Other(
                "Health notice not accepted; nothing was saved".into(),
            ));
        }
        flow.accept_health_check()?;
    }

    if flow.screen() == Screen::Dashboard {
        flow.change_goal()?;
    }
    flow.complete_onboarding(name, goal)?;

    println!("✓ Welcome, {}! Goal: {}", name.trim(), goal);
    Ok(())
}

fn cmd_protocols(goal: Option<Goal>) -> Result<()> {
    let catalog = checked_catalog()?;

    let protocols: Vec<&Protocol> = match goal {
        Some(goal) => catalog.for_goal(goal).collect(),
        None => catalog.protocols.iter().collect(),
    };

    for protocol in protocols {
        let stages: Vec<String> = protocol
            .stages
            .iter()
            .map(|s| format!("{} {}", s.kind.label(), format_clock(s.duration)))
            .collect();

        println!("{:<8} {} [{}]", protocol.id, protocol.name, protocol.goal);
        println!("         {}", protocol.description);
        println!(
            "         {} × ({}) = {}",
            protocol.cycles,
            stages.join(" · "),
            format_clock(protocol.total_duration())
        );
    }
    Ok(())
}

fn lookup(id: &str) -> Result<Protocol> {
    checked_catalog()?
        .get(id)
        .cloned()
        .ok_or_else(|| Error::Other(format!("Unknown protocol '{}'. See `saunaflow protocols`.", id)))
}

fn adjusted_for(protocol: &Protocol, temps: Temperatures, config: &Config) -> Protocol {
    adjust_protocol(
        protocol,
        temps.heat.unwrap_or(config.session.heat_temp),
        temps.cold.unwrap_or(config.session.cold_temp),
    )
}

fn display_plan(original: &Protocol, adjusted: &Protocol, temps: Temperatures, config: &Config) {
    println!("\n╭─────────────────────────────────────────╮");
    println!("│  {}", adjusted.name.to_uppercase());
    println!("╰─────────────────────────────────────────╯");
    println!("  {}", adjusted.description);
    println!(
        "  Sauna {}°C · Plunge {}°C · {} cycles",
        temps.heat.unwrap_or(config.session.heat_temp),
        temps.cold.unwrap_or(config.session.cold_temp),
        adjusted.cycles
    );
    println!();

    for (before, after) in original.stages.iter().zip(&adjusted.stages) {
        if before.duration == after.duration {
            println!("  {:<6} {}", after.kind.label(), format_clock(after.duration));
        } else {
            println!(
                "  {:<6} {} → {}",
                after.kind.label(),
                format_clock(before.duration),
                format_clock(after.duration)
            );
        }
    }
    println!("  Total  {}", format_clock(adjusted.total_duration()));

    if !has_changes(original, adjusted) {
        println!("  (baseline durations)");
    }
}

fn cmd_adjust(id: &str, temps: Temperatures, config: &Config) -> Result<()> {
    let protocol = lookup(id)?;
    let adjusted = adjusted_for(&protocol, temps, config);
    display_plan(&protocol, &adjusted, temps, config);
    Ok(())
}

fn cmd_run(data_dir: &Path, id: &str, run: RunArgs, config: &Config) -> Result<()> {
    let protocol = lookup(id)?;
    run_protocol(data_dir, protocol, false, run, config)
}

fn apply_suggestion(ritual: &mut CustomRitual, level: ExperienceLevel, config: &Config) {
    let result = match &config.suggestions.file {
        Some(path) => suggest_into(&FileAdvisor::new(path), level, ritual),
        None => suggest_into(&PresetAdvisor, level, ritual),
    };

    match result {
        Ok(()) => println!("✓ Using the {} suggestion", level),
        Err(e) => println!("⚠ Suggestion unavailable ({}). Keeping manual settings.", e),
    }
}

fn cmd_custom(data_dir: &Path, ritual: &CustomRitual, run: RunArgs, config: &Config) -> Result<()> {
    let stored_goal = open_flow(data_dir)?.profile().goal;
    let protocol = ritual.build(Some(stored_goal.unwrap_or(config.session.default_goal)))?;
    run_protocol(data_dir, protocol, true, run, config)
}

fn require_ready(flow: &AppFlow<FileStore>) -> Result<()> {
    match flow.screen() {
        Screen::HealthCheck => Err(Error::Other(
            "Health notice not accepted. Run `saunaflow setup --accept-health-check` first.".into(),
        )),
        Screen::Onboarding => Err(Error::Other(
            "No name or goal set. Run `saunaflow setup` first.".into(),
        )),
        _ => Ok(()),
    }
}

fn run_protocol(
    data_dir: &Path,
    protocol: Protocol,
    custom: bool,
    run: RunArgs,
    config: &Config,
) -> Result<()> {
    let adjusted = adjusted_for(&protocol, run.temps, config);
    display_plan(&protocol, &adjusted, run.temps, config);

    if run.dry_run {
        println!("\n[Dry run - session not started]");
        return Ok(());
    }

    let mut flow = open_flow(data_dir)?;
    require_ready(&flow)?;
    flow.start_ritual()?;
    if custom {
        flow.create_custom_ritual()?;
    }
    flow.select_protocol(protocol)?;
    flow.start_session(adjusted)?;

    let clock = SystemClock;
    let mut rng = make_rng(run.seed);
    let outcome = {
        let timer = flow
            .timer_mut()
            .ok_or_else(|| Error::Other("Session did not start".into()))?;
        if run.auto_complete {
            runner::run_auto(timer, &clock, &mut rng)?
        } else {
            runner::run_interactive(timer, &clock, &mut rng)?
        }
    };

    match outcome {
        Outcome::Completed(log) => {
            flow.complete_session(log)?;
            display_summary(&flow, &clock);
        }
        Outcome::Exited => {
            flow.exit_session()?;
            println!("\nSession ended. Nothing was recorded.");
        }
    }
    Ok(())
}

fn display_summary(flow: &AppFlow<FileStore>, clock: &dyn Clock) {
    let Some(log) = flow.last_completed() else {
        return;
    };
    let history = flow.history();
    let now = clock.now_local();

    println!("\n╭─────────────────────────────────────────╮");
    println!("│  RITUAL COMPLETE");
    println!("╰─────────────────────────────────────────╯");
    println!("  {}", log.protocol_name);
    println!("  Time:   {}", format_clock(log.total_time));
    println!("  Cycles: {}", log.cycles_completed);
    println!("\n✓ Session logged!");

    let streak = compute_streak(history, now);
    println!("  Streak: {} day(s)", streak);

    let earlier = &history[..history.len().saturating_sub(1)];
    let before = evaluate_achievements(earlier, compute_streak(earlier, now));
    let after = evaluate_achievements(history, streak);
    for (was, is) in before.iter().zip(&after) {
        if is.unlocked && !was.unlocked {
            println!(
                "  🏆 Unlocked: {} - {}",
                is.achievement.title, is.achievement.description
            );
        }
    }
}

fn cmd_stats(data_dir: &Path) -> Result<()> {
    let flow = open_flow(data_dir)?;
    let history = flow.history();
    let now = SystemClock.now_local();

    if let Some(name) = &flow.profile().user_name {
        println!("Hello, {}!", name);
    }

    let streak = compute_streak(history, now);
    let totals = compute_aggregates(history);
    println!("  Streak:     {} day(s)", streak);
    println!("  Total time: {:.1} min", totals.total_minutes);
    println!("  Sessions:   {}", totals.total_sessions);

    let achievements = evaluate_achievements(history, streak);
    let unlocked = achievements.iter().filter(|a| a.unlocked).count();
    println!("\nAchievements ({}/{})", unlocked, achievements.len());
    for status in &achievements {
        println!(
            "  {} {} - {}",
            if status.unlocked { "✓" } else { "·" },
            status.achievement.title,
            status.achievement.description
        );
    }

    println!("\nRecent rituals");
    let recent = recent_sessions(history, 5);
    if recent.is_empty() {
        println!("  No rituals yet.");
    }
    for log in recent {
        println!(
            "  {}  {}  {} ({} cycles)",
            log.date.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M"),
            log.protocol_name,
            format_clock(log.total_time),
            log.cycles_completed
        );
    }
    Ok(())
}

fn cmd_export(data_dir: &Path, out: &Path) -> Result<()> {
    let flow = open_flow(data_dir)?;
    let count = sauna_core::export::export_csv(flow.history(), out)?;

    println!("✓ Exported {} sessions to CSV", count);
    println!("  CSV: {}", out.display());
    Ok(())
}

fn cmd_change_goal(data_dir: &Path) -> Result<()> {
    let mut flow = open_flow(data_dir)?;
    flow.change_goal()?;
    println!("✓ Name and goal cleared. Run `saunaflow setup` to choose again.");
    Ok(())
}

fn cmd_reset(data_dir: &Path, yes: bool) -> Result<()> {
    if !(yes || confirm("Erase all SaunaFlow data? Type 'reset' to confirm:", "reset")?) {
        println!("Nothing was erased.");
        return Ok(());
    }

    let mut flow = open_flow(data_dir)?;
    flow.reset()?;
    println!("✓ All data erased.");
    Ok(())
}
