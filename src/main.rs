use assembly_ballot::app::cast::{AutoConfirm, Confirmer, PromptConfirmer};
use assembly_ballot::app::report::render_ranking;
use assembly_ballot::utils::error::ErrorSeverity;
use assembly_ballot::utils::logger;
use assembly_ballot::{
    cast_ballot, AppConfig, CastOutcome, CliConfig, Command, HttpVotingApi, Ranking, Result,
    VotingApi,
};
use clap::Parser;

async fn run(cli: &CliConfig, config: &AppConfig) -> Result<()> {
    let api = HttpVotingApi::new(config)?;

    match &cli.command {
        Command::Ranking { format, category } => {
            let ranking = Ranking::new(api.fetch_ranking().await?);
            print!("{}", render_ranking(&ranking, *format, *category)?);
        }
        Command::Vote { yes, .. } => {
            let Some(request) = cli.command.cast_request() else {
                return Ok(());
            };

            let stdin = std::io::stdin();
            let mut prompt_confirmer = PromptConfirmer::new(stdin.lock(), std::io::stdout());
            let mut auto_confirmer = AutoConfirm;
            let confirmer: &mut dyn Confirmer = if *yes {
                &mut auto_confirmer
            } else {
                &mut prompt_confirmer
            };

            match cast_ballot(&api, &config.members, &request, confirmer).await? {
                CastOutcome::Submitted(receipt) => {
                    println!(
                        "✅ Voto registrado para el asambleísta {} ({})",
                        receipt.voter_id,
                        receipt.submitted_at.format("%Y-%m-%d %H:%M:%S UTC")
                    );
                }
                CastOutcome::Declined => println!("Voto cancelado."),
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 設定載入失敗時 logger 尚未初始化，直接輸出到 stderr
    let config = match cli.load_app_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(3);
        }
    };

    let level = if cli.verbose {
        None
    } else {
        config.logging.level.as_deref()
    };
    if config.logging.json {
        logger::init_json_logger(cli.verbose, level);
    } else {
        logger::init_cli_logger(cli.verbose, level);
    }

    tracing::info!("Starting asamblea against {}", config.api.base_url);
    tracing::debug!("CLI config: {:?}", cli);

    if let Err(e) = run(&cli, &config).await {
        tracing::error!(
            "❌ {} (Kind: {:?}, Severity: {:?})",
            e,
            e.kind(),
            e.severity()
        );
        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 {}", e.recovery_suggestion());

        let exit_code = match e.severity() {
            ErrorSeverity::Low => 2,
            ErrorSeverity::Medium => 4,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        };
        std::process::exit(exit_code);
    }
}
