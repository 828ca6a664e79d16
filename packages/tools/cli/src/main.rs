//! Fieldkit CLI (`fk`)
//!
//! 스키마와 ability 정책을 로컬에서 점검하고, 변경 집합이 어떻게 필터링되는지 확인하는 도구입니다.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod context;

use config::FkConfig;

#[derive(Parser)]
#[command(name = "fk")]
#[command(author, version, about = "Fieldkit CLI - field-level authorization for change sets", long_about = None)]
struct Cli {
    /// Schema YAML (overrides FK_SCHEMA and config)
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    /// Ability policy YAML (overrides FK_POLICY and config)
    #[arg(long, global = true)]
    policy: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate schema and policy, list models and their rule tables
    Check,

    /// Run the assignment pipeline for a change set
    Sanitize {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        actor: ActorArgs,

        /// Trusted system execution (no filtering)
        #[arg(long)]
        system: bool,
    },

    /// Show the aggregated permission set for a change set
    Grants {
        #[command(flatten)]
        target: TargetArgs,

        #[command(flatten)]
        actor: ActorArgs,
    },
}

/// 대상 모델과 입력 파일
#[derive(Args)]
pub struct TargetArgs {
    /// Model name
    #[arg(long)]
    pub model: String,

    /// Current record (JSON object); defaults to a new record
    #[arg(long)]
    pub record: Option<PathBuf>,

    /// Candidate changes (JSON object)
    #[arg(long)]
    pub changes: PathBuf,
}

/// actor 정보
#[derive(Args)]
pub struct ActorArgs {
    /// Actor ID (parsed as JSON when possible)
    #[arg(long)]
    pub actor_id: Option<String>,

    /// Actor role (repeatable)
    #[arg(long = "role")]
    pub roles: Vec<String>,

    /// Extra actor attribute as key=value (repeatable)
    #[arg(long = "attr")]
    pub attributes: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // 로깅 초기화 (출력과 섞이지 않도록 stderr)
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fk=info,fk_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!("{}", describe_error(&err));
        std::process::exit(1);
    }
    Ok(())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    // 설정 로드
    let config = FkConfig::load()?;

    // 입력 결정 (CLI 옵션 > 환경변수 > 설정 파일)
    let ctx = context::resolve_context(cli.schema, cli.policy, &config)?;

    match cli.command {
        Commands::Check => commands::check::run(&ctx, cli.format),
        Commands::Sanitize { target, actor, system } => {
            commands::sanitize::run(&ctx, &target, &actor, system, cli.format)
        }
        Commands::Grants { target, actor } => commands::grants::run(&ctx, &target, &actor, cli.format),
    }
}

/// 엔진 에러는 에러 코드와 함께 출력
fn describe_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<fk_core::Error>() {
        Some(core) => format!("error[{}]: {}", core.code(), core),
        None => format!("error: {:#}", err),
    }
}
