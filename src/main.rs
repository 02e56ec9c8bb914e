// src/main.rs
//
// vehiclesale command-line entry point.
//
// Logging goes to stderr through tracing-subscriber (RUST_LOG, default
// "info"); command output goes to stdout, as JSON with --json.

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use vehiclesale::application::{ErrorResponse, ImportReportDto, StorefrontVehicleDto};
use vehiclesale::config::AppConfig;
use vehiclesale::db::{
    create_connection_pool, get_connection, get_database_stats, initialize_database,
    verify_database_integrity,
};
use vehiclesale::{
    scan_directory, AppError, AppState, CreateVehicleRequest, ImportKind, ImportSummary,
    SessionContext, SubmitInquiryRequest, Vehicle,
};

#[derive(Parser, Debug)]
#[command(name = "vehiclesale", version, about = "Insolvency vehicle sale back office")]
struct Cli {
    /// Configuration file (TOML); falls back to $VEHICLESALE_CONFIG
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or migrate the database and print its statistics
    InitDb,

    /// Register a vehicle by appraisal report number
    AddVehicle {
        report_number: String,
        brand: String,
        model: String,
        #[arg(long)]
        first_registration: Option<String>,
        #[arg(long)]
        mileage_km: Option<u64>,
        #[arg(long)]
        vin: Option<String>,
        #[arg(long)]
        power_kw: Option<u32>,
        #[arg(long)]
        fuel: Option<String>,
        #[arg(long)]
        color: Option<String>,
    },

    /// Attach every photo in a directory to the vehicle named by its file name
    ImportPhotos { dir: PathBuf },

    /// Attach every appraisal report in a directory to its vehicle
    ImportReports { dir: PathBuf },

    /// Parse "am DD.MM.YYYY bei N km", optionally recording it on a vehicle
    ParseMaintenance {
        text: String,
        /// Report number of the vehicle to add the reading to
        #[arg(long)]
        vehicle: Option<String>,
    },

    /// Apply tab-separated "label<TAB>value" lines to a vehicle ("-" reads stdin)
    ImportFields { report_number: String, file: PathBuf },

    /// List vehicles as a storefront visitor sees them
    Storefront {
        /// Lead of the visitor session; marks vehicles already inquired about
        #[arg(long)]
        lead: Option<Uuid>,
    },

    /// Submit a purchase inquiry for one or more vehicles
    Inquire {
        #[arg(long)]
        lead: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        message: Option<String>,
        #[arg(required = true)]
        report_numbers: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        let code = match err.downcast_ref::<AppError>() {
            Some(app_error) => {
                let response = ErrorResponse::from_app_error(app_error);
                if json {
                    println!("{}", response.to_json());
                } else {
                    eprintln!("error: {:#}", err);
                }
                response.error_type.exit_code()
            }
            None => {
                eprintln!("error: {:#}", err);
                1
            }
        };
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;

    if let Command::InitDb = cli.command {
        return init_db(&config, cli.json);
    }

    let state = AppState::initialize(config)?;
    let result = dispatch(&state, cli.command, cli.json).await;
    state.shutdown().await?;
    result
}

async fn dispatch(state: &AppState, command: Command, json: bool) -> Result<()> {
    match command {
        Command::InitDb => unreachable!("handled before state is built"),

        Command::AddVehicle {
            report_number,
            brand,
            model,
            first_registration,
            mileage_km,
            vin,
            power_kw,
            fuel,
            color,
        } => {
            let id = state.vehicle_service.create_vehicle(CreateVehicleRequest {
                report_number: report_number.clone(),
                brand,
                model,
                first_registration,
                mileage_km,
                vin,
                power_kw,
                fuel,
                color,
            })?;
            emit(json, &serde_json::json!({ "id": id, "report_number": report_number }), || {
                format!("Created vehicle {} ({})", report_number, id)
            })
        }

        Command::ImportPhotos { dir } => import_directory(state, ImportKind::Photo, &dir, json).await,
        Command::ImportReports { dir } => import_directory(state, ImportKind::Report, &dir, json).await,

        Command::ParseMaintenance { text, vehicle } => {
            let reading = state.maintenance_extractor.parse(&text)?;

            if let Some(report_number) = vehicle {
                let target = find_vehicle(state, &report_number)?;
                let added = state
                    .vehicle_service
                    .add_maintenance(target.id, reading.clone())?;
                if !added {
                    log::info!("{} already has reading {}", report_number, reading);
                }
            }

            emit(json, &reading, || {
                format!("date: {}\nmileage_km: {}", reading.date, reading.mileage_km)
            })
        }

        Command::ImportFields {
            report_number,
            file,
        } => {
            let text = read_text(&file)?;
            let import = state.field_importer.parse(&text);

            let vehicle = find_vehicle(state, &report_number)?;
            let updated = state.vehicle_service.apply_field_import(vehicle.id, &import)?;

            emit(json, &import, || {
                let mut out = format!(
                    "Applied {} field(s) to {} ({})",
                    import.fields.len(),
                    updated.report_number,
                    updated.display_label()
                );
                for skipped in &import.unrecognized {
                    out.push_str(&format!(
                        "\n  line {}: {:?} skipped ({})",
                        skipped.line, skipped.label, skipped.reason
                    ));
                }
                out
            })
        }

        Command::Storefront { lead } => {
            let session = match lead {
                Some(lead_id) => SessionContext::for_lead(lead_id),
                None => SessionContext::anonymous(),
            };
            let vehicles: Vec<StorefrontVehicleDto> = state
                .vehicle_service
                .list_storefront(&session)?
                .into_iter()
                .map(StorefrontVehicleDto::from)
                .collect();

            emit(json, &vehicles, || {
                vehicles
                    .iter()
                    .map(|v| {
                        format!(
                            "{:<8} {:<30} {:>9} km  {} photo(s){}",
                            v.report_number,
                            v.label,
                            v.mileage_km.map(|km| km.to_string()).unwrap_or_else(|| "-".to_string()),
                            v.photo_urls.len(),
                            if v.reserved { "  [angefragt]" } else { "" }
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })
        }

        Command::Inquire {
            lead,
            name,
            email,
            message,
            report_numbers,
        } => {
            let mut vehicle_ids = Vec::with_capacity(report_numbers.len());
            for report_number in &report_numbers {
                vehicle_ids.push(find_vehicle(state, report_number)?.id);
            }

            let id = state.inquiry_service.submit_inquiry(SubmitInquiryRequest {
                lead_id: lead,
                name,
                email,
                message,
                vehicle_ids,
            })?;
            emit(json, &serde_json::json!({ "id": id }), || format!("Inquiry {} submitted", id))
        }
    }
}

fn find_vehicle(state: &AppState, report_number: &str) -> Result<Vehicle> {
    state
        .vehicle_service
        .get_by_report_number(report_number)?
        .ok_or(AppError::NotFound)
        .with_context(|| format!("No vehicle with report number {}", report_number))
}

fn init_db(config: &AppConfig, json: bool) -> Result<()> {
    let db_path = config.resolved_database_path()?;
    let pool = create_connection_pool(&db_path)?;
    let conn = get_connection(&pool)?;

    initialize_database(&conn)?;
    verify_database_integrity(&conn)?;
    let stats = get_database_stats(&conn)?;

    emit(json, &stats, || {
        format!(
            "Database ready at {}\n  vehicles: {}\n  inquiries: {}\n  size: {} bytes",
            db_path.display(),
            stats.vehicle_count,
            stats.inquiry_count,
            stats.size_bytes
        )
    })
}

/// One "[done/total] pct%" line per change in the terminal count
#[derive(Debug, Default)]
struct ProgressLine {
    last_terminal: Option<usize>,
}

impl ProgressLine {
    fn next(&mut self, summary: &ImportSummary) -> Option<String> {
        if summary.total == 0 || self.last_terminal == Some(summary.terminal()) {
            return None;
        }
        self.last_terminal = Some(summary.terminal());
        Some(format!(
            "[{}/{}] {}%",
            summary.terminal(),
            summary.total,
            summary.percent_complete
        ))
    }
}

async fn import_directory(state: &AppState, kind: ImportKind, dir: &Path, json: bool) -> Result<()> {
    let scan = scan_directory(dir).with_context(|| format!("Cannot read {}", dir.display()))?;
    log::info!("Found {} file(s) in {}", scan.inputs.len(), dir.display());

    let mut rx = state.bulk_import.subscribe(kind);
    rx.mark_unchanged();
    let mut progress = ProgressLine::default();

    let import = state.bulk_import.import(kind, scan.inputs);
    tokio::pin!(import);

    let mut report = loop {
        tokio::select! {
            result = &mut import => break result?,
            Ok(()) = rx.changed(), if !json => {
                let summary = ImportSummary::from_progress(&rx.borrow_and_update());
                if let Some(line) = progress.next(&summary) {
                    eprintln!("{}", line);
                }
            }
        }
    };
    if !json {
        if let Some(line) = progress.next(&report.summary) {
            eprintln!("{}", line);
        }
    }
    report.rejected += scan.unreadable;

    let dto = ImportReportDto::from(&report);
    emit(json, &dto, || render_report(&dto))?;

    if !json && report.summary.should_auto_close() {
        tokio::time::sleep(state.bulk_import.auto_close_delay()).await;
    }
    Ok(())
}

fn render_report(dto: &ImportReportDto) -> String {
    let mut lines: Vec<String> = dto
        .candidates
        .iter()
        .map(|c| {
            format!(
                "{:<32} {:<10} {}",
                c.file,
                c.status,
                c.matched_label
                    .as_deref()
                    .or(c.message.as_deref())
                    .unwrap_or("")
            )
        })
        .collect();

    lines.push(format!(
        "{} {}: {} matched, {} not found, {} invalid, {} failed, {} rejected ({} ms)",
        dto.total, dto.kind, dto.matched, dto.not_found, dto.invalid, dto.failed, dto.rejected,
        dto.duration_ms
    ));

    if !dto.unresolved.is_empty() {
        lines.push("Needs manual follow-up:".to_string());
        lines.extend(dto.unresolved.iter().map(|name| format!("  {}", name)));
    }
    if !dto.shared_paths.is_empty() {
        lines.push("Several files stored under one path (last upload kept):".to_string());
        lines.extend(dto.shared_paths.iter().map(|path| format!("  {}", path)));
    }
    if !dto.orphaned_paths.is_empty() {
        lines.push("Uploaded but not linked to a vehicle:".to_string());
        lines.extend(dto.orphaned_paths.iter().map(|path| format!("  {}", path)));
    }

    lines.join("\n")
}

fn read_text(file: &Path) -> Result<String> {
    if file == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Cannot read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(file).with_context(|| format!("Cannot read {}", file.display()))
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce() -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", text());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total: usize, matched: usize) -> ImportSummary {
        ImportSummary {
            total,
            matched,
            pending: total - matched,
            percent_complete: (matched * 100 / total) as u8,
            ..ImportSummary::default()
        }
    }

    #[test]
    fn test_progress_line_prints_each_count_once() {
        let mut progress = ProgressLine::default();

        assert_eq!(progress.next(&summary(2, 1)).as_deref(), Some("[1/2] 50%"));
        assert_eq!(progress.next(&summary(2, 1)), None);
        assert_eq!(progress.next(&summary(2, 2)).as_deref(), Some("[2/2] 100%"));
        assert_eq!(progress.next(&summary(2, 2)), None);
    }

    #[test]
    fn test_final_progress_line_is_printed_from_report() {
        // Snapshots only reached 1/2 before the batch returned
        let mut progress = ProgressLine::default();
        progress.next(&summary(2, 1));

        assert_eq!(progress.next(&summary(2, 2)).as_deref(), Some("[2/2] 100%"));
    }

    #[test]
    fn test_progress_line_skips_empty_batch() {
        let mut progress = ProgressLine::default();
        assert_eq!(progress.next(&ImportSummary::default()), None);
    }

    #[test]
    fn test_render_report_lists_shared_paths() {
        let dto = ImportReportDto {
            batch_id: "b".to_string(),
            kind: "photo".to_string(),
            total: 2,
            matched: 2,
            not_found: 0,
            invalid: 0,
            failed: 0,
            rejected: 1,
            percent_complete: 100,
            duration_ms: 3,
            unresolved: Vec::new(),
            orphaned_paths: Vec::new(),
            shared_paths: vec!["2704/photo.jpg".to_string()],
            candidates: Vec::new(),
        };

        let text = render_report(&dto);

        assert!(text.contains("2 photo: 2 matched, 0 not found, 0 invalid, 0 failed, 1 rejected"));
        assert!(text.contains("last upload kept"));
        assert!(text.contains("  2704/photo.jpg"));
    }

    #[test]
    fn test_config_flag_has_no_env_fallback_of_its_own() {
        std::env::set_var("VEHICLESALE_CONFIG", "/tmp/from-env.toml");
        let cli = Cli::try_parse_from(["vehiclesale", "init-db"]).unwrap();
        std::env::remove_var("VEHICLESALE_CONFIG");

        assert!(cli.config.is_none());
    }
}
