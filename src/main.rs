//! Command-line front end for the labeling loop. Responses are printed as JSON on stdout.

use std::path::PathBuf;

use glyphlearn::config::{self, Settings};
use glyphlearn::{FileLearner, LabelSubmission, app_dirs, logging};
use serde::Serialize;
use serde_json::{Value, json};

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let Some(options) = parse_args(std::env::args().skip(1).collect())? else {
        return Ok(());
    };
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    let settings = load_settings(options.config.as_ref())?;
    let data_dir = match &settings.paths.data_dir {
        Some(dir) => dir.clone(),
        None => app_dirs::data_dir().map_err(|err| err.to_string())?,
    };
    let paths = settings.paths.resolve(&data_dir);
    let learner = FileLearner::open(settings, &paths);

    match options.command {
        Command::Import { source } => {
            let summary = match source {
                Some(path) => {
                    let documents = glyphlearn::dataset::feature_json::load_documents(&path)
                        .map_err(|err| err.to_string())?;
                    learner.import_documents(&documents)
                }
                None => learner.import_from_source(),
            }
            .map_err(|err| err.to_string())?;
            print_json(&summary)
        }
        Command::Answer(submission) => {
            let response = learner
                .handle_answer(&submission)
                .map_err(|err| err.to_string())?;
            print_json(&response)
        }
        Command::Update => {
            let response = learner
                .handle_complete_update()
                .map_err(|err| err.to_string())?;
            print_json(&response)
        }
        Command::Reset => {
            let table = learner.reset_train_data().map_err(|err| err.to_string())?;
            print_json(&json!({ "documents": table.len(), "labeled": table.labeled_count() }))
        }
        Command::History => {
            let history = learner.history().map_err(|err| err.to_string())?;
            print_json(&json!({ "f1": history }))
        }
        Command::CurrentScore => {
            let score = learner.current_score().map_err(|err| err.to_string())?;
            print_json(&json!({ "f1": score }))
        }
    }
}

fn load_settings(path: Option<&PathBuf>) -> Result<Settings, String> {
    match path {
        Some(path) => config::load_from(path),
        None => config::load_or_default(),
    }
    .map_err(|err| err.to_string())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), String> {
    let text = serde_json::to_string(value).map_err(|err| format!("Serialize response failed: {err}"))?;
    println!("{text}");
    Ok(())
}

#[derive(Debug)]
enum Command {
    Import { source: Option<PathBuf> },
    Answer(LabelSubmission),
    Update,
    Reset,
    History,
    CurrentScore,
}

#[derive(Debug)]
struct Options {
    config: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: Vec<String>) -> Result<Option<Options>, String> {
    let mut config = None;
    let mut command_name = None;
    let mut source = None;
    let mut document = None;
    let mut answer = None;
    let mut question = None;
    let mut text = None;
    let mut payload = None;
    let mut idx = 0usize;
    while idx < args.len() {
        let arg = args[idx].as_str();
        let mut value = |name: &str| -> Result<String, String> {
            idx += 1;
            args.get(idx)
                .cloned()
                .ok_or_else(|| format!("{name} requires a value"))
        };
        match arg {
            "-h" | "--help" => {
                println!("{}", help_text());
                return Ok(None);
            }
            "--config" => config = Some(PathBuf::from(value("--config")?)),
            "--source" => source = Some(PathBuf::from(value("--source")?)),
            "--document" => {
                let raw = value("--document")?;
                document = Some(
                    raw.parse::<i64>()
                        .map_err(|_| format!("Invalid --document value: {raw}"))?,
                );
            }
            "--answer" => answer = Some(value("--answer")?),
            "--question" => question = Some(value("--question")?),
            "--text" => text = Some(value("--text")?),
            "--json" => payload = Some(value("--json")?),
            flag if flag.starts_with('-') => {
                return Err(format!("Unknown argument: {flag}\n\n{}", help_text()));
            }
            name if command_name.is_none() => command_name = Some(name.to_string()),
            extra => return Err(format!("Unexpected argument: {extra}\n\n{}", help_text())),
        }
        idx += 1;
    }

    let command = match command_name.as_deref() {
        Some("import") => Command::Import { source },
        Some("answer") => {
            let submission = match payload {
                Some(payload) => serde_json::from_str::<LabelSubmission>(&payload)
                    .map_err(|err| format!("Invalid --json payload: {err}"))?,
                None => LabelSubmission {
                    document_id: document.ok_or_else(|| "--document is required".to_string())?,
                    question_id: question.map(Value::String),
                    answer: Value::String(answer.ok_or_else(|| "--answer is required".to_string())?),
                    text,
                },
            };
            Command::Answer(submission)
        }
        Some("update") => Command::Update,
        Some("reset") => Command::Reset,
        Some("history") => Command::History,
        Some("current-score") => Command::CurrentScore,
        Some(other) => return Err(format!("Unknown command: {other}\n\n{}", help_text())),
        None => return Err(format!("A command is required\n\n{}", help_text())),
    };
    Ok(Some(Options { config, command }))
}

fn help_text() -> &'static str {
    "Usage: glyphlearn [--config <path>] <command> [options]\n\
\n\
Commands:\n\
  import [--source <json>]          Build the document table and held-out split\n\
  answer --document <id> --answer <label> [--question <id>] [--text <text>]\n\
  answer --json <payload>           Submit a label; retrains once enough are labeled\n\
  update                            Rescore, re-embed and export the feature JSON\n\
  reset                             Clear every label\n\
  history                           Print the F1 history\n\
  current-score                     Print the latest F1"
}
