use std::fmt;

use chrono::{DateTime, Duration, Utc};
use fold_core::model::{OptionLetter, QuestionOutcome, QuestionId, ScoreReport, SessionId};
use storage::repository::{AnswerSnapshot, ReportRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    namespace: String,
    questions: u32,
    answered: u32,
    reports: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidQuestions { raw: String },
    InvalidAnswered { raw: String },
    InvalidReports { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidQuestions { raw } => write!(f, "invalid --questions value: {raw}"),
            ArgsError::InvalidAnswered { raw } => write!(f, "invalid --answered value: {raw}"),
            ArgsError::InvalidReports { raw } => write!(f, "invalid --reports value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("FOLD_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut namespace = std::env::var("FOLD_NAMESPACE")
            .unwrap_or_else(|_| "paperfolding_answers_full".into());
        let mut questions = std::env::var("FOLD_QUESTIONS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(30);
        let mut answered = std::env::var("FOLD_ANSWERED")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(12);
        let mut reports = std::env::var("FOLD_REPORTS")
            .ok()
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(2);
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--namespace" => {
                    namespace = require_value(&mut args, "--namespace")?;
                }
                "--questions" => {
                    let value = require_value(&mut args, "--questions")?;
                    questions = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidQuestions { raw: value })?;
                }
                "--answered" => {
                    let value = require_value(&mut args, "--answered")?;
                    answered = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAnswered { raw: value })?;
                }
                "--reports" => {
                    let value = require_value(&mut args, "--reports")?;
                    reports = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidReports { raw: value })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value })?;
                    now = Some(parsed.with_timezone(&Utc));
                }
                "-h" | "--help" => {
                    print_usage();
                    std::process::exit(0);
                }
                other => return Err(ArgsError::UnknownArg(other.to_string())),
            }
        }

        Ok(Self {
            db_url,
            namespace,
            questions,
            answered: answered.min(questions),
            reports,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>         SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --namespace <key>         Answer-sheet namespace (default: paperfolding_answers_full)");
    eprintln!("  --questions <n>           Questions covered by the sheet (default: 30)");
    eprintln!("  --answered <n>            Answered slots in the sheet (default: 12)");
    eprintln!("  --reports <n>             Score reports to append (default: 2)");
    eprintln!("  --now <rfc3339>           Fixed current time for deterministic seeding");
    eprintln!("  -h, --help                Show this help");
    eprintln!();
    eprintln!("Environment (same as flags):");
    eprintln!("  FOLD_DB_URL, FOLD_NAMESPACE, FOLD_QUESTIONS, FOLD_ANSWERED, FOLD_REPORTS");
}

fn sample_letter(index: u32) -> OptionLetter {
    OptionLetter::ALL[(index as usize) % OptionLetter::ALL.len()]
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let answers: Vec<Option<OptionLetter>> = (0..args.questions)
        .map(|index| (index < args.answered).then(|| sample_letter(index)))
        .collect();
    storage
        .answers
        .save_sheet(&args.namespace, &AnswerSnapshot::new(answers, now))
        .await?;

    for i in 0..args.reports {
        let completed_at = now - Duration::days(i64::from(i) * 2) - Duration::minutes(5);
        let correct = args.questions.saturating_sub(i + 1);
        let outcomes: Vec<QuestionOutcome> = (0..args.questions)
            .map(|index| {
                let correct_letter = sample_letter(index);
                let is_correct = index < correct;
                let chosen = if is_correct {
                    correct_letter
                } else {
                    sample_letter(index + 1)
                };
                QuestionOutcome {
                    question_index: index as usize,
                    question_id: QuestionId::from_position(index as usize),
                    chosen: Some(chosen),
                    correct: correct_letter,
                    is_correct,
                }
            })
            .collect();
        let report = ScoreReport::from_persisted(
            SessionId::random(),
            args.questions,
            correct,
            completed_at,
            outcomes,
        )?;
        let _ = storage
            .reports
            .append_report(&ReportRecord::from_report(&args.namespace, &report))
            .await?;
    }

    println!(
        "Seeded namespace {} with a {}-question sheet ({} answered) and {} reports into {}",
        args.namespace, args.questions, args.answered, args.reports, args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
