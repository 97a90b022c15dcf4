use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use internrank_core::{candidate_from_value, CandidateStore, RankedResult, StudentProfile};
use internrank_local::config::load_rank_config;
use internrank_local::extract::PdfExtractor;
use internrank_local::store::JsonCatalogStore;
use internrank_local::Ranker;
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "internrank")]
#[command(about = "Recommend internships from a local catalog", long_about = None)]
struct Cli {
    /// Catalog file (JSON array). Default: <data dir>/internrank/catalog.json
    #[arg(long, global = true, env = "INTERNRANK_CATALOG")]
    catalog: Option<PathBuf>,
    /// Ranking config (JSON, partial allowed). Env vars override it.
    #[arg(long, global = true, env = "INTERNRANK_CONFIG")]
    config: Option<PathBuf>,
    /// More logging on stderr (-v, -vv). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create the catalog with sample listings if it is empty.
    Init(InitCmd),
    /// Add one internship listing to the catalog.
    Add(AddCmd),
    /// Rank catalog listings for a student profile or resume.
    Recommend(RecommendCmd),
    /// Catalog summary: totals, averages, recent listings.
    Dashboard(DashboardCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct InitCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct AddCmd {
    /// Read the listing from a JSON object file instead of flags.
    #[arg(
        long,
        conflicts_with_all = [
            "title",
            "description",
            "required_skills",
            "organization",
            "duration",
            "stipend",
            "popularity",
            "rating",
            "prestige",
        ]
    )]
    from_json: Option<PathBuf>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    required_skills: Option<String>,
    #[arg(long)]
    preferred_skills: Option<String>,
    #[arg(long)]
    responsibilities: Option<String>,
    #[arg(long, alias = "company")]
    organization: Option<String>,
    /// Free text, e.g. "3 months".
    #[arg(long)]
    duration: Option<String>,
    #[arg(long)]
    stipend: Option<u64>,
    /// 0-100
    #[arg(long)]
    popularity: Option<u32>,
    /// 0-5
    #[arg(long)]
    rating: Option<f64>,
    /// 0-10
    #[arg(long, alias = "company-prestige")]
    prestige: Option<u32>,
}

#[derive(clap::Args, Debug)]
struct RecommendCmd {
    /// Free-text skills.
    #[arg(long, default_value = "")]
    skills: String,
    /// Free-text interests.
    #[arg(long, default_value = "")]
    interests: String,
    /// Field of study (recorded, not used for scoring).
    #[arg(long)]
    field: Option<String>,
    /// Resume PDF; its text is the whole query (no --skills or --interests).
    #[arg(long, conflicts_with_all = ["skills", "interests"])]
    resume: Option<PathBuf>,
    /// Max results (default: INTERNRANK_TOP_N or 5).
    #[arg(long)]
    top_n: Option<usize>,
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct DashboardCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

const REQUIRED_FIELDS: &[(&str, &[&str])] = &[
    ("title", &[]),
    ("description", &[]),
    ("required_skills", &[]),
    ("organization", &["company"]),
    ("duration", &[]),
    ("stipend", &[]),
    ("popularity", &[]),
    ("rating", &[]),
    ("prestige", &["company_prestige"]),
];

fn default_catalog_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("internrank")
        .join("catalog.json")
}

/// Optional `KEY=value` env-file loader (opt-in via INTERNRANK_ENV_FILE).
///
/// Never overrides variables already set in the process environment.
fn load_env_file() {
    let Ok(p) = std::env::var("INTERNRANK_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info,internrank_local=debug",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn add_record(args: &AddCmd) -> Result<serde_json::Value> {
    if let Some(p) = &args.from_json {
        let raw = std::fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
        return serde_json::from_str(&raw).with_context(|| format!("parse {}", p.display()));
    }
    let mut m = serde_json::Map::new();
    let mut put = |k: &str, v: Option<serde_json::Value>| {
        if let Some(v) = v {
            m.insert(k.to_string(), v);
        }
    };
    put("title", args.title.clone().map(Into::into));
    put("description", args.description.clone().map(Into::into));
    put("required_skills", args.required_skills.clone().map(Into::into));
    put("preferred_skills", args.preferred_skills.clone().map(Into::into));
    put("responsibilities", args.responsibilities.clone().map(Into::into));
    put("organization", args.organization.clone().map(Into::into));
    put("duration", args.duration.clone().map(Into::into));
    put("stipend", args.stipend.map(Into::into));
    put("popularity", args.popularity.map(Into::into));
    put("rating", args.rating.map(Into::into));
    put("prestige", args.prestige.map(Into::into));
    Ok(serde_json::Value::Object(m))
}

fn missing_fields(record: &serde_json::Value) -> Vec<&'static str> {
    REQUIRED_FIELDS
        .iter()
        .filter(|(k, aliases)| {
            !std::iter::once(*k)
                .chain(aliases.iter().copied())
                .any(|key| record.get(key).is_some_and(|v| !v.is_null()))
        })
        .map(|(k, _)| *k)
        .collect()
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn results_json(results: &[RankedResult<'_>]) -> serde_json::Value {
    serde_json::Value::Array(
        results
            .iter()
            .enumerate()
            .map(|(i, r)| {
                serde_json::json!({
                    "rank": i + 1,
                    "score": round4(r.score),
                    "internship": r.candidate,
                    "explanation": r.explanation.to_string(),
                    "details": r.explanation,
                })
            })
            .collect(),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let store = JsonCatalogStore::new(cli.catalog.clone().unwrap_or_else(default_catalog_path));

    match cli.command {
        Commands::Init(args) => {
            let seeded = store.seed_if_empty().await?;
            let total = store.list().await?.len();
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!(
                    "catalog {} ({} listings, {} seeded)",
                    store.path().display(),
                    total,
                    seeded
                ),
                _ => println!(
                    "{}",
                    serde_json::json!({
                        "ok": true,
                        "kind": "init",
                        "catalog": store.path().display().to_string(),
                        "seeded": seeded,
                        "total": total,
                    })
                ),
            }
        }
        Commands::Add(args) => {
            let record = add_record(&args)?;
            let missing = missing_fields(&record);
            if !missing.is_empty() {
                bail!("missing required fields: {}", missing.join(", "));
            }
            let candidate = candidate_from_value(0, record)?;
            let id = store.insert(candidate).await?;
            println!(
                "{}",
                serde_json::json!({
                    "message": "Internship added successfully",
                    "id": id,
                })
            );
        }
        Commands::Recommend(args) => {
            let candidates = store.list().await?;
            if candidates.is_empty() {
                bail!(
                    "no internships available in the catalog ({})",
                    store.path().display()
                );
            }
            // Extraction failures stop here, before ranking.
            let skills = match &args.resume {
                Some(p) => PdfExtractor
                    .extract_path(p)
                    .await
                    .with_context(|| format!("error parsing resume {}", p.display()))?,
                None => args.skills.clone(),
            };
            let profile = StudentProfile {
                skills,
                interests: args.interests.clone(),
                field: args.field.clone(),
            };
            let config = load_rank_config(cli.config.as_deref())?;
            let top_n = args.top_n.unwrap_or(config.top_n);
            let ranker = Ranker::new(config);
            let results = ranker.rank(&profile, &candidates, top_n);
            tracing::info!(results = results.len(), "ranked catalog");

            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    if results.is_empty() {
                        println!("No recommendations.");
                    }
                    for (i, r) in results.iter().enumerate() {
                        println!(
                            "\nRecommendation #{}: {} at {}",
                            i + 1,
                            r.candidate.title,
                            r.candidate.organization
                        );
                        println!("Overall Score: {:.3}", r.score);
                        println!("Explanation:\n{}", r.explanation);
                        println!("{}", "-".repeat(50));
                    }
                }
                _ => println!("{}", results_json(&results)),
            }
        }
        Commands::Dashboard(args) => {
            let stats = store.stats().await?;
            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    println!("Total internships: {}", stats.total);
                    println!("Average rating: {:.2}", stats.avg_rating);
                    println!("Average stipend: {:.2}", stats.avg_stipend);
                    println!("Recent:");
                    for c in &stats.recent {
                        println!(
                            "- #{} {} at {} (${}, {})",
                            c.id.map(|id| id.to_string()).unwrap_or_else(|| "-".to_string()),
                            c.title,
                            c.organization,
                            c.stipend,
                            c.duration
                        );
                    }
                }
                _ => {
                    let mut v = serde_json::to_value(&stats)?;
                    if let Some(obj) = v.as_object_mut() {
                        obj.insert("schema_version".to_string(), 1.into());
                        obj.insert("kind".to_string(), "dashboard".into());
                    }
                    println!("{v}");
                }
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "internrank",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("internrank {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{v}"),
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_accepts_company_aliases() {
        let v = serde_json::json!({
            "title": "T", "description": "d", "required_skills": "r",
            "company": "C", "duration": "1 month", "stipend": 1,
            "popularity": 1, "rating": 1.0, "company_prestige": 1
        });
        assert!(missing_fields(&v).is_empty());
    }

    #[test]
    fn missing_fields_lists_every_absent_field() {
        let v = serde_json::json!({ "title": "T", "rating": null });
        let missing = missing_fields(&v);
        assert!(missing.contains(&"rating"));
        assert!(missing.contains(&"stipend"));
        assert!(!missing.contains(&"title"));
    }

    #[test]
    fn round4_rounds_half_away_from_zero() {
        assert_eq!(round4(0.123_456), 0.1235);
        assert_eq!(round4(1.0), 1.0);
    }

    #[test]
    fn cli_parses_recommend_flags() {
        let cli = Cli::try_parse_from([
            "internrank",
            "--catalog",
            "c.json",
            "recommend",
            "--skills",
            "python",
            "--top-n",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.catalog, Some(PathBuf::from("c.json")));
        match cli.command {
            Commands::Recommend(r) => {
                assert_eq!(r.skills, "python");
                assert_eq!(r.top_n, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_resume_with_interests() {
        let r = Cli::try_parse_from([
            "internrank",
            "recommend",
            "--interests",
            "research",
            "--resume",
            "cv.pdf",
        ]);
        assert!(r.is_err());

        let cli = Cli::try_parse_from(["internrank", "recommend", "--resume", "cv.pdf"]).unwrap();
        match cli.command {
            Commands::Recommend(r) => {
                assert_eq!(r.resume, Some(PathBuf::from("cv.pdf")));
                assert!(r.interests.is_empty());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn cli_rejects_resume_with_skills() {
        let r = Cli::try_parse_from([
            "internrank",
            "recommend",
            "--skills",
            "python",
            "--resume",
            "cv.pdf",
        ]);
        assert!(r.is_err());
    }
}
