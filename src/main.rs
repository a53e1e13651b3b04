// ==========================================
// GMAO 维护数据核心 - 命令行入口
// ==========================================
// 职责: 解析命令行参数, 调用 API 层, 输出 JSON 结果
// 约定: 结果写 stdout, 日志写 stderr
// ==========================================

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use gmao_core::api::ApiError;
use gmao_core::app::{get_default_db_path, AppState};
use gmao_core::logging::{self, LogFormat};
use gmao_core::repository::KpiFilter;
use gmao_core::{i18n, MetricType};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gmao-core")]
#[command(author, version, about = "Ingestion des données de maintenance (GMAO)")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Chemin de la base SQLite
    #[arg(long, global = true, env = "GMAO_DB_PATH")]
    db: Option<PathBuf>,

    /// Langue des messages (fr, en)
    #[arg(long, global = true, default_value = "fr")]
    lang: String,

    /// Journaux au format JSON
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Importer un fichier (CSV, XLS/XLSX, sauvegarde JSON)
    Import {
        file: PathBuf,

        /// Ne garder que les lignes de cet équipement
        #[arg(long, short = 'm')]
        machine: Option<String>,
    },

    /// Recalculer les KPI à partir des ordres de travail
    RecalcKpis,

    /// Lister les KPI
    Kpis {
        /// mtbf, mttr, availability
        #[arg(long)]
        metric: Option<String>,

        #[arg(long)]
        asset: Option<String>,

        /// Période AAAA-MM
        #[arg(long)]
        period: Option<String>,
    },

    /// Exporter la base en JSON
    Export {
        /// Fichier de sortie (stdout par défaut)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Restaurer une sauvegarde JSON (remplace toutes les données)
    Restore { file: PathBuf },

    /// Vider toutes les collections
    Clear {
        /// Confirmer la suppression
        #[arg(long)]
        yes: bool,
    },

    /// Nombre d'enregistrements par collection
    Counts,

    /// État des stocks de pièces de rechange
    Stock {
        /// N'afficher que les alertes
        #[arg(long)]
        alerts_only: bool,
    },

    /// Analyse AMDEC assistée (nécessite GROQ_API_KEY)
    Analyze {
        #[arg(long)]
        asset: Option<String>,
    },

    /// Traitement serveur via le script ETL
    Etl {
        file: PathBuf,

        #[arg(long)]
        tenant_id: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// ApiError → 结构化错误载荷（类别 + 提示）
fn api_failure(err: ApiError) -> anyhow::Error {
    let payload = err.to_payload();
    match serde_json::to_string_pretty(&payload) {
        Ok(json) => eprintln!("{}", json),
        Err(_) => eprintln!("{}: {}", payload.category, payload.message),
    }
    anyhow::Error::new(err)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init_with_format(if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    });
    i18n::set_locale(&cli.lang);

    let db_path = cli
        .db
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(get_default_db_path);
    tracing::info!(version = gmao_core::VERSION, db_path = %db_path, "GMAO core");

    let state = AppState::new(db_path).map_err(anyhow::Error::msg)?;

    match cli.command {
        Commands::Import { file, machine } => {
            let summary = state
                .upload_api
                .upload_file(&file, machine.as_deref())
                .await
                .map_err(api_failure)?;
            print_json(&summary)?;
        }
        Commands::RecalcKpis => {
            let summary = state.data_api.recalc_kpis().await.map_err(api_failure)?;
            print_json(&summary)?;
        }
        Commands::Kpis {
            metric,
            asset,
            period,
        } => {
            let filter = KpiFilter {
                metric: metric
                    .as_deref()
                    .map(str::parse::<MetricType>)
                    .transpose()
                    .map_err(anyhow::Error::msg)?,
                asset_code: asset,
                fleet_only: false,
                period,
            };
            let kpis = state.data_api.list_kpis(&filter).await.map_err(api_failure)?;
            print_json(&kpis)?;
        }
        Commands::Export { output } => {
            let json = state.data_api.export_snapshot().await.map_err(api_failure)?;
            match output {
                Some(path) => tokio::fs::write(&path, json)
                    .await
                    .with_context(|| format!("écriture de {}", path.display()))?,
                None => println!("{}", json),
            }
        }
        Commands::Restore { file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("lecture de {}", file.display()))?;
            let counts = state
                .data_api
                .restore_snapshot(&raw)
                .await
                .map_err(api_failure)?;
            print_json(&counts)?;
        }
        Commands::Clear { yes } => {
            if !yes {
                bail!("suppression non confirmée : relancer avec --yes");
            }
            state.data_api.clear_all().await.map_err(api_failure)?;
            println!("{}", i18n::t("common.success"));
        }
        Commands::Counts => {
            let counts = state.data_api.counts().await.map_err(api_failure)?;
            print_json(&counts)?;
        }
        Commands::Stock { alerts_only } => {
            let alerts = state
                .data_api
                .stock_alerts(alerts_only)
                .await
                .map_err(api_failure)?;
            print_json(&alerts)?;
        }
        Commands::Analyze { asset } => {
            let api = state.analysis_api().await.map_err(api_failure)?;
            let report = api.analyze(asset.as_deref()).await.map_err(api_failure)?;
            print_json(&report)?;
        }
        Commands::Etl { file, tenant_id } => {
            let outcome = state
                .data_api
                .run_etl(&file, &tenant_id)
                .await
                .map_err(api_failure)?;
            print_json(&outcome)?;
            if !outcome.success {
                bail!(outcome
                    .message
                    .unwrap_or_else(|| "échec du traitement ETL".to_string()));
            }
        }
    }

    Ok(())
}
