use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::info;

use risk_assessor::report::{render_text, to_json};
use risk_assessor::{
    GenerationClient, GenerationConfig, OverviewField, WizardController, WizardError,
    WizardIntent, WizardStep,
};

const BACK_COMMAND: &str = ":back";

#[derive(Parser, Debug)]
#[command(author, version, about = "AI construction risk-assessment wizard", long_about = None)]
struct Args {
    /// TOML file with `model`, `base_url` and optionally `api_key`
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the model identifier
    #[arg(long)]
    model: Option<String>,

    /// Override the API key (prefer the API_KEY environment variable)
    #[arg(long)]
    api_key: Option<String>,

    /// Project name; together with the other overview flags and
    /// --work-types runs a single assessment without prompting
    #[arg(long)]
    project_name: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    duration: Option<String>,

    #[arg(long)]
    description: Option<String>,

    /// Comma-separated work types, e.g. "비계 설치, 터파기"
    #[arg(long)]
    work_types: Option<String>,

    /// Print the finished assessment as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

impl Args {
    fn is_one_shot(&self) -> bool {
        self.project_name.is_some() || self.work_types.is_some()
    }

    fn overview_intents(&self) -> Vec<WizardIntent> {
        [
            (OverviewField::ProjectName, &self.project_name),
            (OverviewField::Location, &self.location),
            (OverviewField::Duration, &self.duration),
            (OverviewField::Description, &self.description),
        ]
        .into_iter()
        .filter_map(|(field, value)| {
            value.clone().map(|value| WizardIntent::UpdateOverviewField { field, value })
        })
        .collect()
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = GenerationConfig::load(args.config.as_deref())?;
    if let Some(model) = args.model.clone() {
        config = config.with_model(model);
    }
    if let Some(api_key) = args.api_key.clone() {
        config = config.with_api_key(api_key);
    }
    config
        .validate()
        .map_err(anyhow::Error::msg)
        .context("invalid generation config")?;

    info!(
        model = %config.model,
        base_url = %config.base_url,
        credential = config.api_key().is_some(),
        "Risk assessor starting"
    );

    let mut wizard = WizardController::new(GenerationClient::from_config(config));

    let outcome = if args.is_one_shot() {
        run_one_shot(&mut wizard, &args).await
    } else {
        run_interactive(&mut wizard, args.json).await
    };
    tracing::debug!(history = %wizard.history_summary(), "Wizard finished");
    outcome
}

async fn run_one_shot(wizard: &mut WizardController, args: &Args) -> Result<()> {
    let mut intents = args.overview_intents();
    intents.push(WizardIntent::SubmitOverview);
    intents.push(WizardIntent::UpdateWorkTypes(
        args.work_types.clone().unwrap_or_default(),
    ));
    intents.push(WizardIntent::SubmitWorkTypes);

    for intent in intents {
        wizard
            .dispatch(intent)
            .await
            .map_err(|err| anyhow!(err.user_message()))?;
    }
    print_report(wizard, args.json)
}

async fn run_interactive(wizard: &mut WizardController, json: bool) -> Result<()> {
    let mut terminal = Terminal::new();

    loop {
        match wizard.step() {
            WizardStep::Overview => {
                print_step_indicator(wizard.step());
                for field in OverviewField::ALL {
                    let label = if field.required() {
                        format!("{} *", field.label())
                    } else {
                        field.label().to_string()
                    };
                    let current = wizard.overview().get(field).to_string();
                    let Some(line) = terminal.ask(&label, &current).await? else {
                        return Ok(());
                    };
                    if !line.is_empty() {
                        wizard.update_overview_field(field, line)?;
                    }
                }
                if let Err(err) = wizard.submit_overview() {
                    println!("{}", err.user_message());
                }
            }
            WizardStep::WorkType => {
                print_step_indicator(wizard.step());
                if let Some(message) = wizard.last_error() {
                    println!("오류: {message}");
                }
                let label = format!("공종 (쉼표로 구분, {BACK_COMMAND} 이전 단계)");
                let current = wizard.work_types().to_string();
                let Some(line) = terminal.ask(&label, &current).await? else {
                    return Ok(());
                };
                if line.trim() == BACK_COMMAND {
                    wizard.go_back()?;
                    continue;
                }
                if !line.is_empty() {
                    wizard.update_work_types(line)?;
                }
                submit_with_progress(wizard).await?;
            }
            // Only observable while `submit_work_types` is running.
            WizardStep::Analyzing => wizard.reset(),
            WizardStep::Result => {
                print_step_indicator(wizard.step());
                print_report(wizard, json)?;
                let answer = terminal
                    .ask("새 작업을 시작하시겠습니까? 현재 결과는 사라집니다 (y/N)", "")
                    .await?;
                match answer.as_deref().map(str::trim) {
                    Some("y") | Some("Y") => wizard.reset(),
                    _ => return Ok(()),
                }
            }
        }
    }
}

/// Submit the work types while echoing progress messages to stderr.
async fn submit_with_progress(wizard: &mut WizardController) -> Result<()> {
    let mut progress = wizard.subscribe_progress();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            let message = progress.borrow_and_update().clone();
            if !message.is_empty() {
                eprintln!("  ... {message}");
            }
        }
    });

    let outcome = wizard.submit_work_types().await;
    printer.abort();

    match outcome {
        Ok(()) => Ok(()),
        // Surfaced through `last_error()` on the next prompt.
        Err(WizardError::Generation(_)) => Ok(()),
        Err(err @ (WizardError::EmptyWorkTypes | WizardError::MissingFields(_))) => {
            println!("{}", err.user_message());
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_report(wizard: &WizardController, json: bool) -> Result<()> {
    let report = wizard
        .report()
        .context("no finished assessment to print")?;
    if json {
        println!("{}", to_json(report).context("serialize assessment")?);
    } else {
        println!("{}", render_text(report));
    }
    Ok(())
}

fn print_step_indicator(current: WizardStep) {
    let steps: Vec<String> = WizardStep::ALL
        .iter()
        .map(|step| {
            let mark = if *step == current {
                '>'
            } else if step.is_completed_at(current) {
                'v'
            } else {
                ' '
            };
            format!("[{mark}] {}", step.label())
        })
        .collect();
    println!();
    println!("{}", steps.join("  "));
}

struct Terminal {
    lines: Lines<BufReader<Stdin>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Prompt for one line. `None` on end of input.
    async fn ask(&mut self, label: &str, current: &str) -> Result<Option<String>> {
        if current.is_empty() {
            print!("{label}: ");
        } else {
            print!("{label} [{current}]: ");
        }
        std::io::stdout().flush().context("flush stdout")?;
        self.lines.next_line().await.context("read stdin")
    }
}
