use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use retria_core::{
    classify, reporting::render_daily_csv, ClinicalPicture, ConfigSource, ConfigStore, CoreConfig,
    Priority, ReferralFilter, ReferralService, ReferralStatus, ReportService, Severity,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "retria")]
#[command(about = "Retria referral triage CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a clinical picture without persisting anything
    Classify {
        /// Patient age in years
        age: u32,
        /// Reported severity: alta, media, or baja
        severity: String,
        /// Requested specialty
        specialty: String,
        /// Symptoms (comma-separated)
        #[arg(long, default_value = "")]
        symptoms: String,
    },
    /// List stored referrals
    List {
        /// Filter by status: PENDING, ACCEPTED, REJECTED
        #[arg(long)]
        estado: Option<String>,
        /// Filter by priority: ROJO, VERDE
        #[arg(long)]
        prioridad: Option<String>,
    },
    /// Print the daily report
    Report {
        /// Report date (YYYY-MM-DD, default today)
        #[arg(long)]
        fecha: Option<String>,
        /// Print as CSV instead of plain text
        #[arg(long)]
        csv: bool,
    },
    /// Show the effective classifier configuration
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Classify {
            age,
            severity,
            specialty,
            symptoms,
        }) => {
            let cfg = core_config()?;
            let picture = ClinicalPicture {
                age,
                severity: Severity::parse(&severity),
                specialty,
                symptoms: symptoms
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            };
            let effective = ConfigStore::new(cfg).effective(Utc::now());
            match classify(&picture, &effective.config) {
                Ok(result) => {
                    println!(
                        "Priority: {}  score: {:.3}  confidence: {:.3}",
                        result.priority.as_str(),
                        result.score,
                        result.confidence
                    );
                    for (name, factor) in [
                        ("age", &result.factors.age),
                        ("severity", &result.factors.severity),
                        ("specialty", &result.factors.specialty),
                        ("symptoms", &result.factors.symptoms),
                    ] {
                        println!("  {name}: {:.2} ({})", factor.impact, factor.description);
                    }
                }
                Err(e) => eprintln!("Error classifying: {e}"),
            }
        }
        Some(Commands::List { estado, prioridad }) => {
            let cfg = core_config()?;
            let filter = ReferralFilter {
                status: match estado.as_deref() {
                    None => None,
                    Some(s) => Some(
                        ReferralStatus::from_wire(s).ok_or(format!("unknown estado: {s}"))?,
                    ),
                },
                priority: match prioridad.as_deref() {
                    None => None,
                    Some(p) => {
                        Some(Priority::from_wire(p).ok_or(format!("unknown prioridad: {p}"))?)
                    }
                },
            };
            let referrals = ReferralService::new(cfg).list(filter);
            if referrals.is_empty() {
                println!("No referrals found.");
            } else {
                for referral in referrals {
                    println!(
                        "{}  {}  {}  {}  score {:.3}  {}",
                        referral.code,
                        referral.priority.as_str(),
                        referral.status.as_str(),
                        referral.specialty,
                        referral.score,
                        referral.created_at.to_rfc3339()
                    );
                }
            }
        }
        Some(Commands::Report { fecha, csv }) => {
            let cfg = core_config()?;
            let date = match fecha {
                Some(s) => s.parse::<NaiveDate>()?,
                None => Utc::now().date_naive(),
            };
            let report = ReportService::new(ReferralService::new(cfg)).daily(date);
            if csv {
                print!("{}", render_daily_csv(&report));
            } else {
                println!("Report for {}", report.date);
                println!("  total: {}", report.total);
                println!("  rojo: {}  verde: {}", report.rojo, report.verde);
                println!(
                    "  processed: {}  pending: {}",
                    report.processed, report.pending
                );
                match report.mean_score {
                    Some(mean) => println!("  mean score: {mean:.3}"),
                    None => println!("  mean score: n/a"),
                }
            }
        }
        Some(Commands::Config) => {
            let cfg = core_config()?;
            let effective = ConfigStore::new(cfg).effective(Utc::now());
            let c = &effective.config;
            println!(
                "weights: age {} severity {} specialty {} symptoms {}",
                c.w_age, c.w_severity, c.w_specialty, c.w_symptoms
            );
            println!(
                "thresholds: red {} green {}",
                c.red_threshold, c.green_threshold
            );
            match effective.source {
                ConfigSource::Stored => println!(
                    "source: stored (version {}, updated by {})",
                    effective.version.unwrap_or_default(),
                    effective.updated_by.unwrap_or_default()
                ),
                ConfigSource::Default => println!("source: bootstrap default"),
            }
        }
        None => {
            println!("Use 'retria --help' for commands");
        }
    }

    Ok(())
}

fn core_config() -> Result<Arc<CoreConfig>, Box<dyn std::error::Error>> {
    let data_dir = std::env::var("RETRIA_DATA_DIR")
        .unwrap_or_else(|_| retria_core::config::DEFAULT_DATA_DIR.into());
    Ok(Arc::new(CoreConfig::new(PathBuf::from(data_dir))?))
}
