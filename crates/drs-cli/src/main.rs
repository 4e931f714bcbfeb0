//! `drs-safety` - read-only view of version history and safety state
//!
//! Commands that touch live tenants (snapshot, rollback) need an adapter and
//! live with it; this binary only reads what the managers stored.

use anyhow::{anyhow, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use drs_core::DrConfig;
use drs_safety::SafetyManager;
use drs_versions::{VersionManager, VersionSnapshot, VersionSummary};
use std::io::Write;
use std::path::PathBuf;

fn cli() -> Command {
    let kind = || {
        Arg::new("kind")
            .required(true)
            .help("Resource-kind, e.g. parsing-rules")
    };
    let version = || {
        Arg::new("version")
            .required(true)
            .help("Version id, e.g. v_20260115_080000")
    };
    let json = || {
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Output as JSON")
    };

    Command::new("drs-safety")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Inspect DRS version history and safety state")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file (environment variables still apply)"),
        )
        .subcommand(
            Command::new("list")
                .about("List stored versions, newest first")
                .arg(kind())
                .arg(
                    Arg::new("limit")
                        .long("limit")
                        .default_value("10")
                        .value_parser(value_parser!(usize))
                        .help("Maximum number of versions to show"),
                )
                .arg(json()),
        )
        .subcommand(
            Command::new("status")
                .about("Show current, previous and last known good versions")
                .arg(kind())
                .arg(json()),
        )
        .subcommand(
            Command::new("plan")
                .about("Show the rollback plan for a version without executing it")
                .arg(kind())
                .arg(version())
                .arg(json()),
        )
        .subcommand(
            Command::new("show")
                .about("Print a stored snapshot as JSON")
                .arg(kind())
                .arg(version()),
        )
}

fn main() {
    let matches = cli().get_matches();
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = run(&matches, &mut stdout) {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn run(matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    let config_path = matches.get_one::<PathBuf>("config");
    let config = DrConfig::load(config_path.map(PathBuf::as_path))
        .context("failed to load configuration")?;
    drs_core::logging::init(&config.logging);
    dispatch(&config, matches, out)
}

fn dispatch(config: &DrConfig, matches: &ArgMatches, out: &mut impl Write) -> Result<()> {
    match matches.subcommand() {
        Some(("list", args)) => {
            let versions = versions(config, args)?;
            let limit = args.get_one::<usize>("limit").copied();
            let listed = versions.list_versions(limit);
            if args.get_flag("json") {
                writeln!(out, "{}", serde_json::to_string_pretty(&listed)?)?;
            } else {
                write_list(out, versions.kind(), &listed)?;
            }
        }
        Some(("status", args)) => {
            let versions = versions(config, args)?;
            let safety = SafetyManager::new(&config.safety, versions.kind())
                .context("failed to open safety store")?;
            write_status(out, config, &versions, &safety, args.get_flag("json"))?;
        }
        Some(("plan", args)) => {
            let versions = versions(config, args)?;
            let id = arg(args, "version")?;
            let plan = versions
                .create_rollback_plan(id)
                .ok_or_else(|| anyhow!("version {id} not found for {}", versions.kind()))?;
            if args.get_flag("json") {
                writeln!(out, "{}", serde_json::to_string_pretty(&plan)?)?;
            } else {
                writeln!(out, "Rollback plan for {} -> {}", versions.kind(), plan.target_version_id)?;
                writeln!(out, "  Target timestamp: {}", plan.target_timestamp)?;
                writeln!(
                    out,
                    "  Diffed against:   {}",
                    plan.current_version_id.as_deref().unwrap_or("none")
                )?;
                writeln!(out, "  Delete from TeamB: {}", plan.summary.delete_count)?;
                writeln!(out, "  Create in TeamB:   {}", plan.summary.create_count)?;
            }
        }
        Some(("show", args)) => {
            let versions = versions(config, args)?;
            let id = arg(args, "version")?;
            let snapshot = versions
                .get_version(id)
                .ok_or_else(|| anyhow!("version {id} not found for {}", versions.kind()))?;
            writeln!(out, "{}", serde_json::to_string_pretty(&snapshot)?)?;
        }
        Some((other, _)) => return Err(anyhow!("unknown command: {other}")),
        None => return Err(anyhow!("no command given")),
    }
    Ok(())
}

fn arg<'a>(args: &'a ArgMatches, id: &str) -> Result<&'a str> {
    args.get_one::<String>(id)
        .map(String::as_str)
        .ok_or_else(|| anyhow!("missing argument: {id}"))
}

fn versions(config: &DrConfig, args: &ArgMatches) -> Result<VersionManager> {
    let kind = arg(args, "kind")?;
    VersionManager::new(&config.versions, kind)
        .with_context(|| format!("failed to open version store for {kind}"))
}

fn write_list(out: &mut impl Write, kind: &str, listed: &[VersionSummary]) -> Result<()> {
    writeln!(out, "Versions for {kind} (newest first):")?;
    if listed.is_empty() {
        writeln!(out, "  No versions found.")?;
        return Ok(());
    }
    for v in listed {
        writeln!(
            out,
            "  {}  {}  {:<15}  TeamA: {:>5}  TeamB: {:>5}",
            v.version_id,
            v.timestamp,
            v.version_type.as_str(),
            v.teama_count,
            v.teamb_count
        )?;
    }
    Ok(())
}

fn write_status(
    out: &mut impl Write,
    config: &DrConfig,
    versions: &VersionManager,
    safety: &SafetyManager,
    json: bool,
) -> Result<()> {
    let current = versions.get_current_version();
    let previous = versions.get_previous_version();
    let last_good = versions.last_known_good_version();
    let zeros = safety.recent_zero_results();
    let window = config.safety.max_zero_results_window_hours;

    if json {
        let status = serde_json::json!({
            "kind": versions.kind(),
            "current_version": current.as_ref().map(brief),
            "previous_version": previous.as_ref().map(brief),
            "last_known_good_version": last_good.as_ref().map(|v| &v.version_id),
            "recent_zero_results": zeros,
            "zero_results_window_hours": window,
            "repeated_zero_limit": safety.thresholds().repeated_zero_limit,
        });
        writeln!(out, "{}", serde_json::to_string_pretty(&status)?)?;
        return Ok(());
    }

    writeln!(out, "Safety status for {}", versions.kind())?;
    write_version_line(out, "Current version", current.as_ref())?;
    write_version_line(out, "Previous version (v-1)", previous.as_ref())?;
    writeln!(
        out,
        "  Last known good: {}",
        last_good.as_ref().map_or("none", |v| v.version_id.as_str())
    )?;
    writeln!(
        out,
        "  Zero results in last {window}h: {zeros} (limit {})",
        safety.thresholds().repeated_zero_limit
    )?;
    Ok(())
}

fn brief(snapshot: &VersionSnapshot) -> serde_json::Value {
    serde_json::json!({
        "version_id": snapshot.version_id,
        "timestamp": snapshot.timestamp,
        "version_type": snapshot.version_type,
        "teama_count": snapshot.teama_count(),
        "teamb_count": snapshot.teamb_count(),
    })
}

fn write_version_line(
    out: &mut impl Write,
    label: &str,
    snapshot: Option<&VersionSnapshot>,
) -> Result<()> {
    match snapshot {
        Some(s) => writeln!(
            out,
            "  {label}: {} ({}, {}, TeamA {}, TeamB {})",
            s.version_id,
            s.version_type,
            s.timestamp,
            s.teama_count(),
            s.teamb_count()
        )?,
        None => writeln!(out, "  {label}: none")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use drs_versions::VersionType;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DrConfig) {
        let dir = TempDir::new().unwrap();
        let config = DrConfig::new().with_storage_root(dir.path());
        (dir, config)
    }

    fn exec(config: &DrConfig, argv: &[&str]) -> Result<String> {
        let matches = cli().try_get_matches_from(argv)?;
        let mut out = Vec::new();
        dispatch(config, &matches, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn seed(config: &DrConfig, kind: &str) -> String {
        let versions = VersionManager::new(&config.versions, kind).unwrap();
        let resource = serde_json::json!({"name": "r1"}).as_object().cloned().unwrap();
        versions
            .create_version_snapshot(&[resource.clone()], &[resource], VersionType::MANUAL)
            .unwrap()
    }

    #[test]
    fn command_tree_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn list_empty_kind() {
        let (_dir, config) = setup();
        let out = exec(&config, &["drs-safety", "list", "views"]).unwrap();
        assert!(out.contains("No versions found."));
    }

    #[test]
    fn list_as_json() {
        let (_dir, config) = setup();
        let id = seed(&config, "views");
        let out = exec(&config, &["drs-safety", "list", "views", "--json"]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed[0]["version_id"], serde_json::json!(id));
        assert_eq!(parsed[0]["version_type"], serde_json::json!("manual"));
    }

    #[test]
    fn status_reports_current_version() {
        let (_dir, config) = setup();
        let id = seed(&config, "slo");
        let out = exec(&config, &["drs-safety", "status", "slo"]).unwrap();
        assert!(out.contains(&format!("Current version: {id}")));
        assert!(out.contains("Previous version (v-1): none"));
        assert!(out.contains(&format!("Last known good: {id}")));
    }

    #[test]
    fn kind_outside_storage_root_is_rejected() {
        let (dir, config) = setup();
        for command in ["list", "status"] {
            assert!(exec(&config, &["drs-safety", command, "../escape"]).is_err());
        }
        assert!(!dir.path().join("escape").exists());
    }

    #[test]
    fn plan_and_show_unknown_version_fail() {
        let (_dir, config) = setup();
        assert!(exec(&config, &["drs-safety", "plan", "slo", "v_20200101_000000"]).is_err());
        assert!(exec(&config, &["drs-safety", "show", "slo", "v_20200101_000000"]).is_err());
    }

    #[test]
    fn plan_summarizes_counts() {
        let (_dir, config) = setup();
        let id = seed(&config, "alerts");
        let out = exec(&config, &["drs-safety", "plan", "alerts", &id]).unwrap();
        assert!(out.contains("Delete from TeamB: 1"));
        assert!(out.contains("Create in TeamB:   1"));
    }

    #[test]
    fn show_prints_snapshot() {
        let (_dir, config) = setup();
        let id = seed(&config, "alerts");
        let out = exec(&config, &["drs-safety", "show", "alerts", &id]).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed["teama"]["count"], serde_json::json!(1));
        assert_eq!(parsed["service"], serde_json::json!("alerts"));
    }
}
