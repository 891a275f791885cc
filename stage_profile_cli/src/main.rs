use clap::{ArgAction, Parser, Subcommand};
use log::debug;
use stage_profile::{
    answer::{are_norm_equal, strip_accents, verify_info, verify_result},
    config::read_config_json,
    io::{read_elevation_file, stage_db::StageDb, write_gradient_json},
    stage::{Classification, InfoField},
    ElevationProfile, FinalPoint, GradientPoint, ProfileConfig,
};

/// Command line access to stage elevation profiles and trivia answers.
#[derive(Parser)]
#[command(name = "stage_profile_cli", version)]
struct Cli {
    /// Increase log output (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ProfileArgs {
    /// Metres between generated points. Falls back to the configured value
    /// when missing or not a number.
    #[arg(long)]
    resolution: Option<String>,
    /// Drop the closing point when the route ends exactly on the grid.
    #[arg(long)]
    skip_final: bool,
    /// JSON file with profile settings.
    #[arg(long)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a gradient profile from a CSV or JSON file of elevation samples.
    Gradient {
        input: String,
        #[command(flatten)]
        profile: ProfileArgs,
        /// Write the profile to a file instead of stdout.
        #[arg(long)]
        output: Option<String>,
    },
    /// Interpolate the elevation at a distance from a file of elevation samples.
    ElevationAt { input: String, distance: f64 },
    /// List the stage IDs in a stage database.
    Stages { db: String },
    /// Print descriptive information about a stage.
    StageInfo { db: String, stage_id: i64 },
    /// Print the raw elevation samples of a stage.
    Elevation { db: String, stage_id: i64 },
    /// Print the gradient profile of a stage.
    StageGradient {
        db: String,
        stage_id: i64,
        #[command(flatten)]
        profile: ProfileArgs,
    },
    /// Print the top results of a stage in every classification.
    Results {
        db: String,
        stage_id: i64,
        #[arg(long, default_value_t = 1000)]
        top_n: u32,
    },
    /// Print the results of one classification of a stage.
    ClassificationResults {
        db: String,
        stage_id: i64,
        classification: String,
        #[arg(long, default_value_t = 1000)]
        top_n: u32,
    },
    /// Print the number of answerable results in each classification.
    ResultCounts { db: String, stage_id: i64 },
    /// List the riders appearing in a stage's results.
    Riders { db: String, stage_id: i64 },
    /// List the teams appearing in a stage's results.
    Teams { db: String, stage_id: i64 },
    /// Print the correct answer for a stage info field.
    Answer {
        db: String,
        stage_id: i64,
        field: String,
    },
    /// Check a guess for a stage info field.
    VerifyInfo {
        db: String,
        stage_id: i64,
        field: String,
        guess: String,
    },
    /// Check a rider or team guess for a ranked result.
    VerifyResult {
        db: String,
        stage_id: i64,
        classification: String,
        rank: u32,
        guess: String,
    },
    /// Compare two names the way guesses are compared.
    Compare { a: String, b: String },
    /// Print text with accents removed.
    StripAccents { text: String },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .try_init();
}

fn fail(msg: String) -> ! {
    eprintln!("{}", msg);
    std::process::exit(1);
}

fn profile_config(args: &ProfileArgs) -> ProfileConfig {
    let mut config = match &args.config {
        Some(path) => match read_config_json(path) {
            Ok(c) => c,
            Err(e) => fail(format!("Error reading {}: {}", path, e)),
        },
        None => ProfileConfig::default(),
    };
    config = config.with_resolution_param(args.resolution.as_deref());
    if args.skip_final {
        config.final_point = FinalPoint::Skip;
    }
    if let Err(e) = config.validate() {
        fail(format!("Invalid profile settings: {}", e));
    }
    debug!("profile settings: {:?}", config);
    config
}

fn parse_field(field: &str) -> InfoField {
    match field.parse() {
        Ok(f) => f,
        Err(e) => fail(e.to_string()),
    }
}

fn parse_classification(classification: &str) -> Classification {
    match classification.parse() {
        Ok(c) => c,
        Err(e) => fail(e.to_string()),
    }
}

fn open_db(path: &str) -> StageDb {
    match StageDb::open(path) {
        Ok(db) => db,
        Err(e) => fail(format!("Error opening {}: {}", path, e)),
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(format!("Error encoding JSON: {}", e)),
    }
}

fn write_or_print(points: &[GradientPoint], output: Option<String>) {
    match output {
        Some(path) => match write_gradient_json(&path, points) {
            Ok(()) => println!("Wrote {} points to {}", points.len(), path),
            Err(e) => fail(format!("Error writing {}: {}", path, e)),
        },
        None => print_json(points),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Gradient {
            input,
            profile,
            output,
        } => {
            let config = profile_config(&profile);
            let samples = match read_elevation_file(&input) {
                Ok(pts) => pts,
                Err(e) => fail(format!("Error reading {}: {}", input, e)),
            };
            match ElevationProfile::new(samples)
                .and_then(|p| p.gradient_profile(config.resolution, config.final_point))
            {
                Ok(points) => write_or_print(&points, output),
                Err(e) => fail(format!("Error building profile: {}", e)),
            }
        }
        Commands::ElevationAt { input, distance } => {
            let samples = match read_elevation_file(&input) {
                Ok(pts) => pts,
                Err(e) => fail(format!("Error reading {}: {}", input, e)),
            };
            match ElevationProfile::new(samples).and_then(|p| p.elevation_at(distance)) {
                Ok(elev) => println!("{:.3}", elev),
                Err(e) => fail(format!("Error interpolating: {}", e)),
            }
        }
        Commands::Stages { db } => match open_db(&db).stage_ids() {
            Ok(ids) => print_json(&ids),
            Err(e) => fail(format!("Error listing stages: {}", e)),
        },
        Commands::StageInfo { db, stage_id } => match open_db(&db).stage_info(stage_id) {
            Ok(info) => print_json(&info),
            Err(e) => fail(format!("Error reading stage {}: {}", stage_id, e)),
        },
        Commands::Elevation { db, stage_id } => match open_db(&db).elevation_profile(stage_id) {
            Ok(pts) => print_json(&pts),
            Err(e) => fail(format!("Error reading stage {}: {}", stage_id, e)),
        },
        Commands::StageGradient {
            db,
            stage_id,
            profile,
        } => {
            let config = profile_config(&profile);
            match open_db(&db).gradient_profile(stage_id, &config) {
                Ok(points) => print_json(&points),
                Err(e) => fail(format!("Error building profile for stage {}: {}", stage_id, e)),
            }
        }
        Commands::Results {
            db,
            stage_id,
            top_n,
        } => match open_db(&db).results(stage_id, top_n) {
            Ok(results) => print_json(&results),
            Err(e) => fail(format!("Error reading results for stage {}: {}", stage_id, e)),
        },
        Commands::ClassificationResults {
            db,
            stage_id,
            classification,
            top_n,
        } => {
            let classification = parse_classification(&classification);
            match open_db(&db).results_for_classification(stage_id, classification, top_n) {
                Ok(results) => print_json(&results),
                Err(e) => fail(format!("Error reading results for stage {}: {}", stage_id, e)),
            }
        }
        Commands::ResultCounts { db, stage_id } => {
            match open_db(&db).valid_result_counts(stage_id) {
                Ok(counts) => print_json(&counts),
                Err(e) => fail(format!("Error counting results for stage {}: {}", stage_id, e)),
            }
        }
        Commands::Riders { db, stage_id } => match open_db(&db).riders(stage_id) {
            Ok(names) => print_json(&names),
            Err(e) => fail(format!("Error reading riders for stage {}: {}", stage_id, e)),
        },
        Commands::Teams { db, stage_id } => match open_db(&db).teams(stage_id) {
            Ok(names) => print_json(&names),
            Err(e) => fail(format!("Error reading teams for stage {}: {}", stage_id, e)),
        },
        Commands::Answer {
            db,
            stage_id,
            field,
        } => {
            let field = parse_field(&field);
            match open_db(&db).answer(stage_id, field) {
                Ok(answer) => println!("{}", answer),
                Err(e) => fail(format!("Error reading stage {}: {}", stage_id, e)),
            }
        }
        Commands::VerifyInfo {
            db,
            stage_id,
            field,
            guess,
        } => {
            let field = parse_field(&field);
            match open_db(&db).stage_info(stage_id) {
                Ok(info) => println!("{}", verify_info(&info, field, &guess)),
                Err(e) => fail(format!("Error reading stage {}: {}", stage_id, e)),
            }
        }
        Commands::VerifyResult {
            db,
            stage_id,
            classification,
            rank,
            guess,
        } => {
            let classification = parse_classification(&classification);
            let result = match open_db(&db).result_for_rank(stage_id, classification, rank) {
                Ok(r) => r,
                Err(e) => fail(format!("Error reading result: {}", e)),
            };
            match verify_result(&result, &guess) {
                Ok(verified) => println!("{}", verified),
                Err(e) => fail(format!("Error verifying result: {}", e)),
            }
        }
        Commands::Compare { a, b } => println!("{}", are_norm_equal(&a, &b)),
        Commands::StripAccents { text } => println!("{}", strip_accents(&text)),
    }
}
