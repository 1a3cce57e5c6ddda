// pensettings/src/cli.rs
// Command-line front end over the settings model.

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::{
    cell::RefCell,
    error::Error,
    io::{self, BufRead, Write},
    rc::Rc,
};

use crate::config::{self, AppConfig};
use crate::registry::{PathGroup, RegistryAccess, RegistryError, RegistryStore, ResetOutcome};
use crate::settings::{PenSettings, Setting, SettingValue, SettingsError};
use crate::{info, warn, error};

const RESTART_NOTE: &str =
    "Note: some settings may require you to log out and log back in or restart your computer to take effect.";

const READ_ONLY_NOTE: &str =
    "Admin Rights Required: some settings require administrator rights to read and are shown with their defaults (read-only)";

#[derive(Parser, Debug)]
#[command(author, version, about = "View, change and reset pen and touch digitizer settings")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Reload every setting from the registry and print it
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Print one setting
    Get { setting: Setting },
    /// Change one setting (booleans accept true/false, on/off, yes/no, 1/0)
    Set { setting: Setting, value: String },
    /// Rewrite every registry group with its default values
    Reset {
        /// Do not ask for confirmation
        #[arg(short = 'y', long)]
        yes: bool,
    },
    /// Print every stored value of every group, tagged by group
    Dump {
        #[arg(long)]
        json: bool,
    },
    /// List the known settings with their registry location and default
    List,
    /// Show or change config.yaml
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    Show,
    Set { key: String, value: String },
}

pub fn run_cli() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    info!("CLI parsed: {:?}", cli);

    if let Command::Config { action } = cli.command {
        return run_config(action);
    }

    let cfg = config::current_config();
    let stdin = io::stdin();
    let stdout = io::stdout();
    execute(cli.command, open_store(), &cfg, &mut stdin.lock(), &mut stdout.lock())
}

#[cfg(windows)]
fn open_store() -> crate::registry::WindowsRegistry {
    crate::registry::WindowsRegistry
}

#[cfg(not(windows))]
fn open_store() -> crate::registry::MemoryRegistry {
    warn!("Not running on Windows, settings are kept in memory only");
    eprintln!("warning: not running on Windows; changes are not persisted");
    crate::registry::MemoryRegistry::new()
}

fn run_config(action: ConfigAction) -> Result<(), Box<dyn Error>> {
    let cfg = match action {
        ConfigAction::Show => config::current_config(),
        ConfigAction::Set { key, value } => {
            let cfg = config::set_config_value(&key, &value)?;
            crate::logging::set_debug(cfg.debug_logging);
            cfg
        }
    };
    print!("{}", serde_yaml::to_string(&cfg)?);
    Ok(())
}

fn execute<S: RegistryStore>(
    command: Command,
    store: S,
    cfg: &AppConfig,
    input: &mut impl BufRead,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    let access = RegistryAccess::new(store);

    match command {
        Command::Show { json } => {
            let settings = PenSettings::new(access)?;
            print_settings(&settings, json || cfg.json_output, out)?;
        }

        Command::Get { setting } => {
            let settings = PenSettings::new(access)?;
            if settings.unreadable().contains(&setting) {
                writeln!(out, "{} = {} (read-only, requires administrator rights)", setting, settings.get(setting))?;
            } else {
                writeln!(out, "{} = {}", setting, settings.get(setting))?;
            }
        }

        Command::Set { setting, value } => {
            let value = setting.parse_value(&value)?;
            let mut settings = PenSettings::new(access)?;

            let changed: Rc<RefCell<Vec<(Setting, SettingValue)>>> = Rc::default();
            let sink = Rc::clone(&changed);
            let id = settings.subscribe(move |s, v| sink.borrow_mut().push((s, v)));
            let result = settings.set(setting, value);
            settings.unsubscribe(id);

            if !result? {
                writeln!(out, "{} is already {}", setting, value)?;
                return Ok(());
            }
            for (s, v) in changed.borrow().iter() {
                writeln!(out, "{s} = {v}")?;
            }
            writeln!(out, "{RESTART_NOTE}")?;
        }

        Command::Reset { yes } => {
            if !yes && cfg.confirm_reset && !confirm_reset(input, out)? {
                writeln!(out, "Reset cancelled.")?;
                return Ok(());
            }
            let mut settings = PenSettings::unloaded(access);
            let report = settings.reset_to_defaults()?;

            for (group, outcome) in report.outcomes() {
                let status = match outcome {
                    ResetOutcome::Succeeded => "reset".to_string(),
                    ResetOutcome::Denied(e) => format!("skipped: {e}"),
                    ResetOutcome::Failed(e) => format!("failed: {e}"),
                };
                writeln!(out, "  {:<22} {}", group.label(), status)?;
            }
            if !report.denied_groups().is_empty() {
                writeln!(
                    out,
                    "Admin Rights Required: some settings could not be reset because they require administrator rights."
                )?;
            }

            let report = report.into_result()?;
            if report.is_complete() {
                writeln!(out, "Settings have been reset to default values.")?;
            }
        }

        Command::Dump { json } => {
            let all = access.enumerate()?;
            if json || cfg.json_output {
                writeln!(out, "{}", serde_json::to_string_pretty(&all)?)?;
            } else {
                for (name, value) in &all {
                    writeln!(out, "{name} = {value}")?;
                }
            }
        }

        Command::List => {
            for setting in Setting::ALL {
                let group = setting.group();
                writeln!(
                    out,
                    "{:<30} {:<5} default {:<6} {}\\{}",
                    setting.name(),
                    format!("{:?}", setting.kind()).to_lowercase(),
                    setting.default_value().to_string(),
                    group.display_path(),
                    setting.value_name(),
                )?;
            }
        }

        Command::Config { action } => return run_config(action),
    }
    Ok(())
}

fn confirm_reset(input: &mut impl BufRead, out: &mut impl Write) -> io::Result<bool> {
    write!(out, "Are you sure you want to reset all pen settings to their default values? [y/N] ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

fn print_settings<S: RegistryStore>(
    settings: &PenSettings<S>,
    as_json: bool,
    out: &mut impl Write,
) -> Result<(), Box<dyn Error>> {
    if as_json {
        let rows: Vec<Value> = settings
            .iter()
            .map(|(setting, value)| {
                json!({
                    "setting": setting.name(),
                    "group": setting.group().label(),
                    "value": value,
                    "read_only": settings.unreadable().contains(&setting),
                })
            })
            .collect();
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    for group in PathGroup::ALL {
        writeln!(out, "[{}] {}", group.label(), group.display_path())?;
        for (setting, value) in settings.iter().filter(|(s, _)| s.group() == group) {
            writeln!(out, "  {:<30} {}", setting.name(), value)?;
        }
    }
    if !settings.unreadable().is_empty() {
        let names: Vec<&str> = settings.unreadable().iter().map(|s| s.name()).collect();
        writeln!(out, "{READ_ONLY_NOTE}: {}", names.join(", "))?;
    }
    Ok(())
}

fn is_access_denied(err: &(dyn Error + 'static)) -> bool {
    if let Some(e) = err.downcast_ref::<SettingsError>() {
        return e.is_access_denied();
    }
    if let Some(e) = err.downcast_ref::<RegistryError>() {
        return e.is_access_denied();
    }
    false
}

/// Print a failed command and return the process exit code.
pub fn report_error(err: &(dyn Error + 'static)) -> i32 {
    if is_access_denied(err) {
        warn!("Access denied: {err}");
        eprintln!("Admin Rights Required: {err}");
        eprintln!("Try running the application as administrator to change these settings.");
        2
    } else {
        error!("Command failed: {err}");
        eprintln!("Error: {err}");
        1
    }
}
