use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use fitxp_core::calendar::local_date;
use fitxp_core::exercise_score::{muscle_sessions, Novelty};
use fitxp_core::food_score::{daily_breakdowns, food_group_name, DailyXpBreakdown};
use fitxp_core::muscle_load::classify_lagging_muscles;
use fitxp_core::progress::{cleanup_muscle_load, recompute_muscle_load};
use fitxp_core::reconcile::correct_user_xp;
use fitxp_core::streak::streak_summary;
use fitxp_core::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fitxp")]
#[command(about = "Fitness XP tracker: workouts, food, levels and muscle load", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Override data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Reference time (RFC 3339) instead of the current time
    #[arg(long, global = true, value_parser = parse_timestamp)]
    now: Option<DateTime<Utc>>,

    /// More diagnostics on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Score and log a workout
    LogWorkout {
        /// Exercise id from the catalog
        #[arg(long)]
        exercise: String,

        /// A set as WEIGHTxREPS (e.g. 100x5), or REPS for bodyweight; repeatable
        #[arg(long = "set", value_parser = parse_set)]
        sets: Vec<SetEntry>,

        /// Duration in minutes
        #[arg(long)]
        duration: Option<f64>,

        /// Distance in the configured distance unit
        #[arg(long)]
        distance: Option<f64>,
    },

    /// Score and log a food
    LogFood {
        /// Food id from the catalog
        #[arg(long)]
        food: String,

        /// Number of reference servings
        #[arg(long, default_value_t = 1.0)]
        serving: f64,

        /// Free-form unit label
        #[arg(long)]
        units: Option<String>,
    },

    /// Show level, streaks and muscle load (default)
    Status,

    /// Rebuild muscle load from the full workout history
    Recompute,

    /// Reset today's muscle load if the day has rolled over
    Cleanup,

    /// Check stored XP against the logs
    Validate {
        /// Overwrite the stored total with the recalculated one
        #[arg(long)]
        fix: bool,
    },

    /// Show a day's nutrition breakdown
    Day {
        /// Local date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Write a CSV report
    Export {
        /// Output file
        #[arg(long)]
        out: PathBuf,

        #[arg(long, value_enum, default_value_t = Report::Muscles)]
        report: Report,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Report {
    Muscles,
    Nutrition,
}

fn parse_timestamp(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{}': {}", raw, e))
}

fn parse_set(raw: &str) -> std::result::Result<SetEntry, String> {
    let number = |s: &str| {
        s.trim()
            .parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| format!("invalid set '{}': expected WEIGHTxREPS or REPS", raw))
    };

    match raw.to_lowercase().split_once('x') {
        Some((weight, reps)) if weight.trim().is_empty() => Ok(SetEntry::bodyweight(number(reps)?)),
        Some((weight, reps)) => Ok(SetEntry::new(number(weight)?, number(reps)?)),
        None => Ok(SetEntry::bodyweight(number(raw)?)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    fitxp_core::logging::init_with_verbosity(cli.verbose);

    let mut config = Config::load()?;
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = dir;
    }
    let now = cli.now.unwrap_or_else(Utc::now);

    match cli.command {
        Some(Commands::LogWorkout {
            exercise,
            sets,
            duration,
            distance,
        }) => cmd_log_workout(&config, now, exercise, sets, duration, distance),
        Some(Commands::LogFood {
            food,
            serving,
            units,
        }) => cmd_log_food(&config, now, food, serving, units),
        Some(Commands::Status) | None => cmd_status(&config, now),
        Some(Commands::Recompute) => cmd_recompute(&config, now),
        Some(Commands::Cleanup) => cmd_cleanup(&config, now),
        Some(Commands::Validate { fix }) => cmd_validate(&config, fix),
        Some(Commands::Day { date }) => cmd_day(&config, now, date),
        Some(Commands::Export { out, report }) => cmd_export(&config, now, out, report),
    }
}

fn load_catalog(config: &Config) -> Result<Catalog> {
    Catalog::load_with_overrides(&config.data.catalog_path())
}

fn load_profile(config: &Config) -> Result<UserProfile> {
    UserProfile::load(&config.data.profile_path(), &config.data.user_id)
}

fn update_profile<T>(
    config: &Config,
    f: impl FnOnce(&UserProfile) -> Result<(UserProfile, T)>,
) -> Result<T> {
    UserProfile::update(&config.data.profile_path(), &config.data.user_id, f)
}

fn cmd_log_workout(
    config: &Config,
    now: DateTime<Utc>,
    exercise_id: String,
    sets: Vec<SetEntry>,
    duration: Option<f64>,
    distance: Option<f64>,
) -> Result<()> {
    if sets.is_empty() && duration.is_none() {
        return Err(Error::Other(
            "a workout needs at least one --set or a --duration".into(),
        ));
    }

    let catalog = load_catalog(config)?;
    let exercise = catalog.exercise(&exercise_id)?;

    let mut entry = WorkoutLogEntry::new(&config.data.user_id, &exercise_id, now);
    entry.sets = sets;
    entry.duration = duration;
    entry.distance = distance;

    // History, log and profile all move together under the profile lock
    let outcome = update_profile(config, |profile| {
        let history = load_workout_history(&config.data)?;
        let sessions = muscle_sessions(&history, &catalog);
        let outcome = record_workout(profile, &entry, exercise, &sessions, config);

        // The log is the source of truth, so it is written before the profile
        JsonlSink::new(config.data.workout_log_path()).append(&outcome.entry)?;
        Ok((outcome.profile.clone(), outcome))
    })?;

    let score = &outcome.score;
    println!("✓ Logged {}: +{} XP", exercise.name, score.total);
    println!("  Base: {:.1} x{}", score.base, score.effort_multiplier);
    match score.novelty {
        Novelty::FirstOfWeek => println!("  First time this week: +{}", score.novelty_bonus),
        Novelty::FirstOfDay => println!("  First time today: +{}", score.novelty_bonus),
        Novelty::None => {}
    }
    if !score.personal_best.beaten.is_empty() {
        let windows: Vec<String> = score
            .personal_best
            .beaten
            .iter()
            .map(|w| format!("{:?}", w))
            .collect();
        println!(
            "  Personal best ({}): +{}",
            windows.join(", "),
            score.personal_best.total
        );
    }
    if score.lagging_bonus > 0.0 {
        println!("  Lagging muscle bonus: +{}", score.lagging_bonus);
    }
    print_level(&outcome.profile, config, outcome.leveled_up());

    Ok(())
}

fn cmd_log_food(
    config: &Config,
    now: DateTime<Utc>,
    food_id: String,
    serving: f64,
    units: Option<String>,
) -> Result<()> {
    if !(serving.is_finite() && serving > 0.0) {
        return Err(Error::Other(format!("invalid serving {}", serving)));
    }

    let catalog = load_catalog(config)?;
    let food = catalog.food(&food_id)?;

    let mut entry = FoodLogEntry::new(&config.data.user_id, &food_id, now, serving);
    if let Some(units) = units {
        entry.units = units;
    }

    let outcome = update_profile(config, |profile| {
        let outcome = record_food(profile, &entry, food, config);
        JsonlSink::new(config.data.food_log_path()).append(&outcome.entry)?;
        Ok((outcome.profile.clone(), outcome))
    })?;

    println!("✓ Logged {} x{}: +{} XP", food.name, serving, outcome.score.total);
    println!(
        "  {:.0} kcal, {} (x{})",
        outcome.score.calories,
        food_group_name(food.food_group),
        outcome.score.multiplier
    );
    print_level(&outcome.profile, config, outcome.leveled_up());

    Ok(())
}

fn print_level(profile: &UserProfile, config: &Config, leveled_up: bool) {
    let progress = LevelCurve::from(&config.leveling).level_from_xp(profile.total_xp);
    if leveled_up {
        println!("\n★ Level up! You are now level {}", progress.level);
    }
    println!(
        "  Level {} ({}) - {:.0} XP to next",
        progress.level,
        title_for_level(progress.level),
        progress.xp_to_next
    );
}

fn cmd_status(config: &Config, now: DateTime<Utc>) -> Result<()> {
    let catalog = load_catalog(config)?;
    let profile = cleanup_muscle_load(&load_profile(config)?, now, &config.calendar);
    let history = load_workout_history(&config.data)?;

    let progress = LevelCurve::from(&config.leveling).level_from_xp(profile.total_xp);
    println!("Level {} - {}", progress.level, title_for_level(progress.level));
    println!(
        "  Total XP: {:.0} ({:.1}% to level {}, {:.0} XP to go)",
        profile.total_xp,
        progress.progress_percent,
        progress.level + 1,
        progress.xp_to_next
    );

    let streaks = streak_summary(&history, now, &config.calendar);
    println!();
    println!("Streaks");
    println!("  Daily: {} (bonus {})", streaks.daily, streaks.daily_bonus);
    println!("  Weekly: {} (bonus {})", streaks.weekly, streaks.weekly_bonus);

    let mut by_week: Vec<(&String, f64)> = profile
        .muscle_scores
        .iter()
        .map(|(muscle, record)| (muscle, record.seven_day))
        .filter(|(_, load)| *load > 0.0)
        .collect();
    by_week.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    if !by_week.is_empty() {
        println!();
        println!("Most trained (7 days)");
        for (muscle, load) in by_week.iter().take(5) {
            println!("  {:<12} {:.0}", muscle, load);
        }
    }

    let known = catalog.all_muscles();
    let lagging = classify_lagging_muscles(
        &profile.muscle_scores,
        known.iter().map(String::as_str),
        &config.exercise,
    );
    if !lagging.is_empty() {
        let mut names: Vec<String> = lagging
            .iter()
            .map(|(muscle, state)| format!("{} ({:?})", muscle, state))
            .collect();
        names.sort();
        println!();
        println!("Lagging: {}", names.join(", "));
    }

    Ok(())
}

fn cmd_recompute(config: &Config, now: DateTime<Utc>) -> Result<()> {
    let catalog = load_catalog(config)?;
    let (muscles, workouts) = update_profile(config, |profile| {
        let history = load_workout_history(&config.data)?;
        let rebuilt = recompute_muscle_load(profile, &history, &catalog, now, &config.calendar);
        let counts = (rebuilt.muscle_scores.len(), history.len());
        Ok((rebuilt, counts))
    })?;

    println!(
        "✓ Recomputed muscle load for {} muscles from {} workouts",
        muscles, workouts
    );
    Ok(())
}

fn cmd_cleanup(config: &Config, now: DateTime<Utc>) -> Result<()> {
    update_profile(config, |profile| {
        Ok((cleanup_muscle_load(profile, now, &config.calendar), ()))
    })?;

    println!("✓ Cleaned up muscle load");
    Ok(())
}

/// Reconcile `profile` against the logs; also returns the number of logs read
fn check_xp(config: &Config, profile: &UserProfile) -> Result<(XpValidation, usize)> {
    let workouts = load_workout_history(&config.data)?;
    let foods = load_food_history(&config.data)?;
    let validation = validate_user_xp(
        Some(profile),
        &workouts,
        &foods,
        config.reconciliation.tolerance,
    );
    Ok((validation, workouts.len() + foods.len()))
}

fn cmd_validate(config: &Config, fix: bool) -> Result<()> {
    let profile = load_profile(config)?;
    let (validation, logs) = check_xp(config, &profile)?;

    if validation.is_valid {
        println!(
            "✓ XP is consistent: {:.0} across {} logs",
            validation.stored_xp, logs
        );
        return Ok(());
    }

    println!(
        "✗ XP drift: stored {:.0}, calculated {:.0}, discrepancy {:+.0}",
        validation.stored_xp, validation.calculated_xp, validation.discrepancy
    );

    if !fix {
        return Err(Error::State(format!(
            "stored XP differs from logs by {:.0}; rerun with --fix to correct",
            validation.discrepancy
        )));
    }

    // Re-check under the lock so a concurrent log is not overwritten
    let corrected = update_profile(config, |profile| {
        let (validation, _) = check_xp(config, profile)?;
        let corrected = correct_user_xp(profile, &validation);
        let total = corrected.total_xp;
        Ok((corrected, total))
    })?;
    println!("✓ Stored XP corrected to {:.0}", corrected);
    Ok(())
}

fn cmd_day(config: &Config, now: DateTime<Utc>, date: Option<NaiveDate>) -> Result<()> {
    let catalog = load_catalog(config)?;
    let foods = load_food_history(&config.data)?;
    let profile = load_profile(config)?;
    let goals = profile
        .macro_goals
        .clone()
        .unwrap_or_else(|| config.goals.macro_goals());

    let date = date.unwrap_or_else(|| local_date(now, &config.calendar));
    let days = daily_breakdowns(&foods, &catalog, &config.calendar, &goals);

    match days.get(&date) {
        Some(day) => print_day(date, day),
        None => println!("No food logged on {}", date),
    }
    Ok(())
}

fn print_day(date: NaiveDate, day: &DailyXpBreakdown) {
    println!("Nutrition for {}", date);
    println!(
        "  {:.0} kcal, {:.1} g protein, {:.1} g carbs, {:.1} g fat, {:.1} g fiber",
        day.totals.calories, day.totals.protein, day.totals.carbs, day.totals.fat, day.totals.fiber
    );
    println!();
    println!("  Food XP:            {:.0}", day.base_xp);
    println!("  Food group bonus:   {:.0}", day.food_group_bonus);
    println!("  Macro goals:        {:.0}", day.macro_goal.bonus);
    for adherence in &day.macro_goal.adherence {
        let mark = if adherence.in_range { "✓" } else { " " };
        println!(
            "    {} {:?}: {:.0} / {:.0}",
            mark, adherence.nutrient, adherence.total, adherence.goal
        );
    }
    println!(
        "  Micronutrients:     {:.0} ({} met)",
        day.micronutrients.bonus,
        day.micronutrients.met.len()
    );
    println!(
        "  Variety:            {:.0} ({} foods)",
        day.unique_food_bonus, day.unique_foods
    );
    println!("  Total:              {:.0} XP", day.total_xp);
}

fn cmd_export(config: &Config, now: DateTime<Utc>, out: PathBuf, report: Report) -> Result<()> {
    let rows = match report {
        Report::Muscles => {
            let profile = cleanup_muscle_load(&load_profile(config)?, now, &config.calendar);
            export::write_muscle_report(&profile.muscle_scores, &out)?
        }
        Report::Nutrition => {
            let catalog = load_catalog(config)?;
            let foods = load_food_history(&config.data)?;
            let profile = load_profile(config)?;
            let goals = profile
                .macro_goals
                .clone()
                .unwrap_or_else(|| config.goals.macro_goals());
            let days = daily_breakdowns(&foods, &catalog, &config.calendar, &goals);
            export::write_nutrition_report(&days, &out)?
        }
    };

    tracing::info!("Exported {} rows", rows);
    println!("✓ Wrote {} rows to {}", rows, out.display());
    Ok(())
}
