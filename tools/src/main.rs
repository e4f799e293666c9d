//! panel-runner: headless driver for the elasticity panel.
//!
//! Usage:
//!   panel-runner --data-dir ./data provision --username Dados --password changeme
//!   panel-runner --data-dir ./data simulate --username U --password P --product X --percent 5
//!   panel-runner --data-dir ./data curve --username U --password P --product X --points 20
//!   panel-runner --data-dir ./data --ipc-mode
//!
//! In IPC mode the UI writes one JSON command per line on stdin and
//! reads one JSON response per line on stdout. One process serves one
//! user session.

use anyhow::{bail, Result};
use elasticity_core::{
    auth::LoginStatus,
    config::PanelConfig,
    error::PanelError,
    panel::Panel,
    session::SessionContext,
    simulator::PriceChange,
};
use std::env;
use std::io::{self, BufRead, Write};

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcCommand {
    GetState,
    Login { username: String, password: String },
    PasswordRequirements { password: String },
    ResetPassword { new_password: String, confirmation: String },
    Logout,
    Products,
    PriceBounds { product: String },
    Simulate { product: String, change: PriceChange },
    Curve { product: String, points: Option<usize> },
    Reload,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    session:         &'a SessionContext,
    dashboard:       bool,
    forecast_start:  chrono::NaiveDate,
    forecast_end:    chrono::NaiveDate,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let config = PanelConfig::load(data_dir)?;
    let panel = Panel::open(config)?;

    if ipc_mode {
        return run_ipc_loop(&panel);
    }

    let command = args
        .iter()
        .skip(1)
        .find(|a| matches!(a.as_str(), "provision" | "simulate" | "curve"))
        .map(String::as_str);

    match command {
        Some("provision") => provision(&panel, &args),
        Some("simulate") => simulate(&panel, &args),
        Some("curve") => curve(&panel, &args),
        _ => bail!("expected one of: provision, simulate, curve, --ipc-mode"),
    }
}

fn provision(panel: &Panel, args: &[String]) -> Result<()> {
    let username = required(args, "--username")?;
    let password = required(args, "--password")?;
    let outcome = panel.provision_user(username, password)?;
    println!("provision {username}: {outcome:?}");
    Ok(())
}

/// Log in for a one-shot command. Forced resets cannot be completed here.
fn cli_session(panel: &Panel, args: &[String]) -> Result<SessionContext> {
    let username = required(args, "--username")?;
    let password = required(args, "--password")?;
    let mut session = SessionContext::new();
    match panel.login(&mut session, username, password)? {
        LoginStatus::Success => Ok(session),
        status if status.requires_reset() => {
            bail!("login for {username} requires a password reset ({status:?}); use the panel UI")
        }
        _ => bail!("invalid username or password"),
    }
}

fn simulate(panel: &Panel, args: &[String]) -> Result<()> {
    let session = cli_session(panel, args)?;
    let product = required(args, "--product")?;
    let change = match (parse_arg::<f64>(args, "--price"), parse_arg::<f64>(args, "--percent")) {
        (Some(price), _) => PriceChange::Target(price),
        (None, Some(pct)) => PriceChange::Percent(pct),
        (None, None) => PriceChange::Percent(0.0),
    };

    let Some(r) = panel.simulate(&session, product, change)? else {
        bail!("product '{product}' not found");
    };
    let (start, end) = panel.forecast_window();

    println!("=== SIMULATION: {} ===", r.item_name);
    println!("  period:           {} - {}", start.format("%d/%m/%Y"), end.format("%d/%m/%Y"));
    println!("  price:            {:.2} -> {:.2} ({:+.1}%)", r.current_price, r.new_price, r.price_change_pct);
    println!("  sales:            {:.0} -> {:.0} ({:+.0}, {:+.1}%)", r.current_sales, r.predicted_sales, r.sales_change, r.sales_change_pct);
    println!("  revenue:          {:.2} -> {:.2} ({:+.2}, {:+.1}%)", r.current_revenue, r.predicted_revenue, r.revenue_change, r.revenue_change_pct);
    Ok(())
}

fn curve(panel: &Panel, args: &[String]) -> Result<()> {
    let session = cli_session(panel, args)?;
    let product = required(args, "--product")?;
    let points = parse_arg::<usize>(args, "--points");

    let Some(curve) = panel.sensitivity_curve(&session, product, points)? else {
        bail!("product '{product}' not found");
    };
    println!("=== SENSITIVITY: {product} ===");
    for p in &curve {
        println!("  {:>10.2}  {:>8.0}  {:>12.2}", p.price, p.predicted_sales, p.predicted_revenue);
    }
    Ok(())
}

fn run_ipc_loop(panel: &Panel) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();
    let mut session = SessionContext::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }

        let cmd: IpcCommand = match serde_json::from_str(&buffer) {
            Ok(c) => c,
            Err(e) => {
                let err_json = serde_json::json!({ "error": "bad_request", "message": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        if matches!(cmd, IpcCommand::Quit) {
            break;
        }

        let response = match handle_command(panel, &mut session, cmd) {
            Ok(value) => value,
            Err(e) => error_json(&e),
        };
        writeln!(stdout, "{}", response)?;
        stdout.flush()?;
    }
    Ok(())
}

fn handle_command(
    panel: &Panel,
    session: &mut SessionContext,
    cmd: IpcCommand,
) -> Result<serde_json::Value, PanelError> {
    let value = match cmd {
        IpcCommand::GetState => state_json(panel, session)?,
        IpcCommand::Login { username, password } => {
            let status = panel.login(session, &username, &password)?;
            serde_json::json!({ "status": status, "state": state_json(panel, session)? })
        }
        IpcCommand::PasswordRequirements { password } => {
            let req = panel.password_requirements(&password);
            serde_json::json!({
                "requirements": req,
                "all_met": req.all_met(),
                "checklist": req.checklist(),
            })
        }
        IpcCommand::ResetPassword { new_password, confirmation } => {
            panel.reset_password(session, &new_password, &confirmation)?;
            state_json(panel, session)?
        }
        IpcCommand::Logout => {
            panel.logout(session);
            state_json(panel, session)?
        }
        IpcCommand::Products => serde_json::json!({ "products": panel.products(session)? }),
        IpcCommand::PriceBounds { product } => {
            found_or_missing(&product, panel.price_bounds(session, &product)?)?
        }
        IpcCommand::Simulate { product, change } => {
            found_or_missing(&product, panel.simulate(session, &product, change)?)?
        }
        IpcCommand::Curve { product, points } => {
            found_or_missing(&product, panel.sensitivity_curve(session, &product, points)?)?
        }
        IpcCommand::Reload => {
            panel.reload_resources();
            serde_json::json!({ "reloaded": true })
        }
        IpcCommand::Quit => serde_json::Value::Null,
    };
    Ok(value)
}

fn state_json(panel: &Panel, session: &SessionContext) -> Result<serde_json::Value, PanelError> {
    let (forecast_start, forecast_end) = panel.forecast_window();
    let state = UiState {
        session,
        dashboard: session.can_view_dashboard(),
        forecast_start,
        forecast_end,
    };
    Ok(serde_json::to_value(&state)?)
}

fn found_or_missing<T: serde::Serialize>(
    product: &str,
    value: Option<T>,
) -> Result<serde_json::Value, PanelError> {
    match value {
        Some(v) => Ok(serde_json::json!({ "found": true, "result": v })),
        None => Ok(serde_json::json!({ "found": false, "product": product })),
    }
}

fn error_json(e: &PanelError) -> serde_json::Value {
    let kind = match e {
        PanelError::NotFound { .. } => "not_found",
        PanelError::Authentication(_) => "authentication",
        PanelError::Transport(_) => "transport",
        PanelError::Validation(_) => "validation",
        PanelError::Inference(_) => "inference",
        PanelError::Serialization(_) | PanelError::Config(_) | PanelError::Other(_) => "internal",
    };
    log::warn!("ipc: {kind}: {e}");
    serde_json::json!({
        "error": kind,
        "message": e.user_message(),
        "retryable": e.is_retryable(),
    })
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn required<'a>(args: &'a [String], flag: &str) -> Result<&'a str> {
    flag_value(args, flag).ok_or_else(|| anyhow::anyhow!("missing {flag} <value>"))
}

fn parse_arg<T: std::str::FromStr>(args: &[String], flag: &str) -> Option<T> {
    flag_value(args, flag).and_then(|v| v.parse().ok())
}
