use anyhow::Result;
use clap::{Args, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use outreach_browser::{BrowserSession, ChromeFinder, ChromeLauncher, Credentials, ProfileManager};
use outreach_core::{target, ActionRole, QuotaTracker, ResultLedger, RunConfig};
use outreach_engine::{Orchestrator, StateMarkers};
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::time::Duration;

/// Kill a process by PID (cross-platform)
fn kill_process_by_pid(pid: u32) {
    #[cfg(unix)]
    {
        use std::process::Command;
        // Use kill command to send SIGTERM
        let _ = Command::new("kill").arg(pid.to_string()).output();
    }

    #[cfg(windows)]
    {
        use std::process::Command;
        let _ = Command::new("taskkill")
            .args(["/PID", &pid.to_string(), "/F"])
            .output();
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum ActionArg {
    Connect,
    Message,
}

impl ActionArg {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionArg::Connect => "connect",
            ActionArg::Message => "message",
        }
    }
}

impl From<ActionArg> for ActionRole {
    fn from(arg: ActionArg) -> Self {
        match arg {
            ActionArg::Connect => ActionRole::Connect,
            ActionArg::Message => ActionRole::Message,
        }
    }
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the target CSV file
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Column holding profile URLs
    #[arg(long, default_value = "profile", env = "OUTREACH_URL_COLUMN")]
    pub url_column: String,

    /// Column holding names for personalization
    #[arg(long, env = "OUTREACH_NAME_COLUMN")]
    pub name_column: Option<String>,

    /// Action to perform on each profile
    #[arg(long, value_enum, default_value_t = ActionArg::Connect)]
    pub action: ActionArg,

    /// Note template; {name} and CSV column placeholders are substituted
    #[arg(long, env = "OUTREACH_MESSAGE")]
    pub message: Option<String>,

    /// Read the note template from a file instead
    #[arg(long, conflicts_with = "message")]
    pub message_file: Option<PathBuf>,

    /// Daily action limit
    #[arg(long, default_value_t = 40, env = "OUTREACH_DAILY_LIMIT")]
    pub limit: u32,

    /// Minimum pause between targets, in seconds
    #[arg(long, default_value_t = 20, env = "OUTREACH_DELAY_MIN")]
    pub delay_min: u64,

    /// Maximum pause between targets, in seconds
    #[arg(long, default_value_t = 40, env = "OUTREACH_DELAY_MAX")]
    pub delay_max: u64,

    /// Results ledger CSV
    #[arg(short, long, default_value = "results.csv", env = "OUTREACH_OUTPUT")]
    pub output: PathBuf,

    /// Path to the quota store CSV
    #[arg(long, default_value = "quota.csv", env = "OUTREACH_QUOTA_STORE")]
    pub quota_store: PathBuf,

    /// Login page URL
    #[arg(
        long,
        default_value = "https://www.linkedin.com/login",
        env = "OUTREACH_LOGIN_URL"
    )]
    pub login_url: String,

    /// Account email for the automated login
    #[arg(long, env = "OUTREACH_EMAIL")]
    pub email: Option<String>,

    /// Account password for the automated login
    #[arg(long, env = "OUTREACH_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log in by hand in the browser window instead
    #[arg(long)]
    pub manual_login: bool,

    /// Seconds allowed for the manual login
    #[arg(long, default_value_t = 300, requires = "manual_login")]
    pub login_timeout: u64,

    /// Run Chrome headless
    #[arg(long)]
    pub headless: bool,

    /// Chrome binary location
    #[arg(long)]
    pub chrome_path: Option<PathBuf>,

    /// Named persistent browser profile (kept under ~/.outreach/profiles/)
    #[arg(long)]
    pub profile: Option<String>,

    /// Save step-by-step screenshots to debug_screenshots/
    #[arg(long)]
    pub debug: bool,

    /// Extra page marker meaning the request was already made
    #[arg(long = "already-marker", value_name = "TEXT")]
    pub already_markers: Vec<String>,

    /// Extra page marker confirming a sent request
    #[arg(long = "confirmation-marker", value_name = "TEXT")]
    pub confirmation_markers: Vec<String>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    // Create tokio runtime for async operations
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(args))
}

async fn run(args: RunArgs) -> Result<()> {
    tracing::info!(
        "Starting {} run from {}",
        args.action.as_str(),
        args.file.display()
    );

    let note_template = match (&args.message, &args.message_file) {
        (Some(text), _) => Some(text.clone()),
        (None, Some(path)) => Some(std::fs::read_to_string(path)?.trim_end().to_string()),
        (None, None) => None,
    };

    let config = RunConfig {
        daily_limit: args.limit,
        delay_min: Duration::from_secs(args.delay_min),
        delay_max: Duration::from_secs(args.delay_max),
        role: args.action.into(),
        note_template,
        debug: args.debug,
    };
    config.validate()?;

    // Fail on a bad CSV or an exhausted quota before Chrome starts.
    let targets = target::load_targets(&args.file, &args.url_column, args.name_column.as_deref())?;
    if targets.is_empty() {
        println!("No usable targets in {}", args.file.display());
        return Ok(());
    }
    let quota = QuotaTracker::open(&args.quota_store, args.limit)?;
    println!(
        "📋 {} targets loaded, {} actions remaining today",
        targets.len(),
        quota.remaining()
    );
    if quota.remaining() == 0 {
        println!("🛑 Daily limit already reached; try again tomorrow");
        return Ok(());
    }

    println!("🔍 Locating Chrome...");
    let finder = ChromeFinder::new(args.chrome_path.clone());
    let chrome_binary = finder.find()?;
    println!("✅ Found Chrome at: {}", chrome_binary.display());

    let profile_manager = if let Some(name) = &args.profile {
        let profile_path = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .join(".outreach")
            .join("profiles")
            .join(name);
        println!("📁 Using profile: {}", profile_path.display());
        ProfileManager::persistent(profile_path)?
    } else {
        println!("📁 Using temporary profile");
        ProfileManager::temporary()?
    };

    let launcher = ChromeLauncher::new(
        chrome_binary,
        profile_manager.path().to_path_buf(),
        args.headless,
    );
    println!("🚀 Launching Chrome...");
    let chrome_process = launcher.launch()?;
    let chrome_pid = chrome_process.id();
    tracing::debug!("Chrome running with pid {}", chrome_pid);

    let result = drive_session(&args, config, quota, targets, launcher.debugging_port()).await;

    tracing::debug!("Stopping Chrome (pid {})", chrome_pid);
    kill_process_by_pid(chrome_pid);
    result
}

/// Everything that needs the live browser; split out so the caller can
/// kill Chrome on any exit path.
async fn drive_session(
    args: &RunArgs,
    config: RunConfig,
    quota: QuotaTracker,
    targets: Vec<outreach_core::Target>,
    debugging_port: u16,
) -> Result<()> {
    let debug_dir = args.debug.then(|| PathBuf::from("debug_screenshots"));
    let session = BrowserSession::connect(debugging_port, debug_dir).await?;

    if args.manual_login {
        session
            .manual_login(&args.login_url, Duration::from_secs(args.login_timeout))
            .await?;
    } else {
        let (Some(email), Some(password)) = (args.email.clone(), args.password.clone()) else {
            anyhow::bail!("--email and --password are required unless --manual-login is set");
        };
        let credentials = Credentials { email, password };
        session
            .automated_login(&args.login_url, &credentials, 3)
            .await?;
    }
    println!("🔓 Logged in, starting the queue");

    let markers = StateMarkers::with_extra(&args.already_markers, &args.confirmation_markers);
    let mut orchestrator = Orchestrator::new(session, config, quota)?.with_markers(markers);

    // Ctrl-C stops at the next step boundary, never mid-action.
    let abort = orchestrator.abort_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\n⏹  Stop requested; finishing the current target...");
            abort.store(true, Ordering::SeqCst);
        }
    });

    let total = targets.len();
    let mut ledger = ResultLedger::with_output(&args.output);
    let progress = ProgressBar::new(total as u64);
    progress.set_style(ProgressStyle::with_template(
        "{bar:40.cyan/blue} {pos}/{len} {msg}",
    )?);

    let outcome = {
        let progress = progress.clone();
        orchestrator
            .run(targets, &mut ledger, move |record| {
                progress.set_message(format!("{}: {}", record.outcome.as_str(), record.profile_url));
                progress.inc(1);
            })
            .await
    };
    progress.finish_and_clear();

    match outcome {
        Ok(summary) => {
            println!();
            println!("Summary:");
            println!("  ✅ Succeeded:    {}", style(summary.succeeded).green());
            println!("  🤝 Already done: {}", style(summary.already_done).cyan());
            println!("  ❌ Failed:       {}", style(summary.failed).red());
            println!("  ⏭️  Skipped:      {}", style(summary.skipped).yellow());
            println!("  📒 Ledger: {}", args.output.display());
            println!(
                "  🔋 Remaining today: {}",
                orchestrator.quota().remaining()
            );
            Ok(())
        }
        Err(err) => {
            eprintln!(
                "❌ Run stopped early: {} ({} of {} targets recorded, ledger: {})",
                err,
                ledger.records().len(),
                total,
                args.output.display()
            );
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_arg_maps_to_role() {
        assert_eq!(ActionArg::Connect.as_str(), "connect");
        assert_eq!(ActionArg::Message.as_str(), "message");
        assert_eq!(ActionRole::from(ActionArg::Connect), ActionRole::Connect);
        assert_eq!(ActionRole::from(ActionArg::Message), ActionRole::Message);
    }
}
