// Entry point and interactive CLI flow.
//
// - Option [1] loads client records from the configured source.
// - Option [2] runs every report, exports them and previews them.
// - After generating reports, the user can go back to the menu or exit.
use chrono::Utc;
use crm_report::types::ClientRecord;
use crm_report::{loader, output, reports, util, AppConfig, ReportResult};
use log::{error, info};
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};

// Loaded records live here so the source is read once but reports can be
// generated many times in a single run.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState { data: None }));

struct AppState {
    data: Option<Vec<ClientRecord>>,
}

fn app_state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Read a single line of input after printing the common prompt.
///
/// Returns `None` once stdin is closed.
fn read_choice() -> Option<String> {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match io::stdin().read_line(&mut buf) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(buf.trim().to_string()),
    }
}

/// Returns `true` if the user chose `Y`, `false` if they chose `N`.
fn prompt_back_to_menu() -> bool {
    loop {
        print!("Back to Report Selection (Y/N): ");
        let _ = io::stdout().flush();
        let mut buf = String::new();
        if io::stdin().read_line(&mut buf).unwrap_or(0) == 0 {
            return false;
        }
        match buf.trim().to_uppercase().as_str() {
            "Y" => return true,
            "N" => return false,
            _ => println!("Invalid choice. Please enter Y or N."),
        }
    }
}

fn handle_load(cfg: &AppConfig) {
    match loader::load_records(&cfg.source, Utc::now()) {
        Ok((data, load_report)) => {
            println!(
                "Processing clients... ({} rows read, {} loaded)",
                util::format_int(load_report.total_rows),
                util::format_int(load_report.loaded_rows)
            );
            if load_report.parse_errors > 0 {
                println!(
                    "Note: {} rows skipped due to parse errors.",
                    util::format_int(load_report.parse_errors)
                );
            }
            if load_report.dropped_plan_values > 0 {
                println!(
                    "Info: Ignored {} unreadable plan values.",
                    util::format_int(load_report.dropped_plan_values)
                );
            }
            println!();
            app_state().data = Some(data);
        }
        Err(e) => {
            error!("Failed to load client records: {}", e);
            eprintln!("Failed to load client records: {}\n", e);
        }
    }
}

fn generate_reports(cfg: &AppConfig, data: &[ClientRecord]) -> ReportResult<()> {
    let now = Utc::now();
    let dir = &cfg.output_dir;
    let rows = cfg.preview_rows;
    std::fs::create_dir_all(dir)?;

    let dashboard = reports::build_dashboard(data, now);
    info!("Generating reports for {} clients into {}", data.len(), dir.display());

    let kpis = &dashboard.kpis;
    println!("Headline KPIs");
    println!("  Total revenue:   {}", util::format_number(kpis.total_revenue, 2));
    println!("  Average ticket:  {}", util::format_number(kpis.average_ticket, 2));
    println!("  Conversion rate: {}%", util::format_number(kpis.conversion_rate, 1));
    println!("  Churn rate:      {}%", util::format_number(kpis.churn_rate, 1));
    println!("  Monthly growth:  {}%\n", util::format_number(kpis.monthly_growth, 1));

    let file = dir.join("funnel.csv");
    output::write_csv(&file, &dashboard.funnel)?;
    println!("Sales Funnel\n");
    output::preview_table_rows(&dashboard.funnel, rows);
    println!("(Full table exported to {})\n", file.display());

    let file = dir.join("revenue_by_plan.csv");
    output::write_csv(&file, &dashboard.revenue_by_plan.slices)?;
    println!(
        "Revenue by Plan (total {})\n",
        util::format_number(dashboard.revenue_by_plan.total, 2)
    );
    output::preview_table_rows(&dashboard.revenue_by_plan.slices, rows);
    println!("(Full table exported to {})\n", file.display());

    let file = dir.join("traffic_sources.csv");
    output::write_csv(&file, &dashboard.traffic_sources.slices)?;
    println!("Traffic Sources\n");
    output::preview_table_rows(&dashboard.traffic_sources.slices, rows);
    println!("(Full table exported to {})\n", file.display());

    let file = dir.join("growth_timeline.csv");
    output::write_csv(&file, &dashboard.growth)?;
    println!("Client Growth (last {} months)\n", reports::GROWTH_MONTHS);
    output::preview_table_rows(&dashboard.growth, reports::GROWTH_MONTHS as usize);
    println!("(Full table exported to {})\n", file.display());

    let file = dir.join("state_distribution.csv");
    output::write_csv(&file, &dashboard.states)?;
    println!("Clients by State (top {})\n", reports::TOP_STATES);
    output::preview_table_rows(&dashboard.states, rows);
    println!("(Full table exported to {})\n", file.display());

    let file = dir.join("origin_performance.csv");
    output::write_csv(&file, &dashboard.origins)?;
    println!("Origin Performance\n");
    output::preview_table_rows(&dashboard.origins, rows);
    println!("(Full table exported to {})\n", file.display());

    let file = dir.join("dashboard.json");
    output::write_json(&file, &dashboard)?;
    println!("Dashboard snapshot saved to {}\n", file.display());
    Ok(())
}

fn handle_generate_reports(cfg: &AppConfig) {
    let data = app_state().data.clone();
    let Some(data) = data else {
        println!("Error: No clients loaded. Please load the records first (option 1).\n");
        return;
    };
    if let Err(e) = generate_reports(cfg, &data) {
        error!("Report generation failed: {}", e);
        eprintln!("Write error: {}\n", e);
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cfg = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(2);
        }
    };

    loop {
        println!("Client Reports");
        println!("[1] Load client records");
        println!("[2] Generate Reports\n");
        let Some(choice) = read_choice() else {
            break;
        };
        match choice.as_str() {
            "1" => handle_load(&cfg),
            "2" => {
                println!();
                handle_generate_reports(&cfg);
                if !prompt_back_to_menu() {
                    println!("Exiting the program.");
                    break;
                }
            }
            _ => println!("Invalid choice. Please enter 1 or 2.\n"),
        }
    }
}
