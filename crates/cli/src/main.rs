use anyhow::{anyhow, bail, Result};
use aduan_backend::{CommunityBackend, MemoryBackend};
use aduan_feed::{
    rank, EngagementView, FeedSession, FeedTuning, ModerationConsole, NotificationInbox, Notice,
    NoticeLevel, Reconciler, Resolution,
};
use aduan_model::{
    FeedFilter, Profile, ReportCategory, ReportDraft, ReportItem, ReportStatus,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

mod demo;

#[derive(Parser)]
#[command(name = "aduan")]
#[command(about = "Community issue feed against a seeded in-memory backend", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Act as this user ("admin" for the seeded moderator, "anon" for
    /// no session)
    #[arg(long, global = true, default_value = "demo-user")]
    user: String,

    /// Tuning overrides, JSON or TOML (page size, rate limits, pool)
    #[arg(long, global = true)]
    tuning: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Page through the feed
    Feed(FeedArgs),
    /// Rank reports by engagement
    Trending(TrendingArgs),
    /// Submit a new report
    Report(ReportArgs),
    /// Like a report (run twice to unlike)
    Like(TargetArgs),
    /// Confirm a report as fixed
    Confirm(TargetArgs),
    /// Comment on a report
    Comment(CommentArgs),
    /// Flag a report for review
    Flag(FlagArgs),
    /// List notifications
    Notifications(NotificationsArgs),
    /// Moderator actions
    Admin(AdminArgs),
}

#[derive(Args)]
struct FeedArgs {
    /// Only this status: open|acknowledged|in_progress|closed
    #[arg(long)]
    status: Option<String>,

    /// Only this category: roads|lighting|waste|safety|other
    #[arg(long)]
    category: Option<String>,

    /// Title substring (case-insensitive)
    #[arg(long)]
    search: Option<String>,

    /// Pages to load
    #[arg(long, default_value_t = 1)]
    pages: usize,

    /// Emit items as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct TrendingArgs {
    /// Address substring, or "all"
    #[arg(long)]
    region: Option<String>,
}

#[derive(Args)]
struct ReportArgs {
    /// Report title
    title: String,

    /// roads|lighting|waste|safety|other
    #[arg(long, default_value = "other")]
    category: String,

    #[arg(long)]
    description: Option<String>,
}

#[derive(Args)]
struct TargetArgs {
    /// Report id (see `aduan feed`)
    report_id: String,
}

#[derive(Args)]
struct CommentArgs {
    report_id: String,
    text: String,
}

#[derive(Args)]
struct FlagArgs {
    report_id: String,

    #[arg(long, default_value = "inappropriate")]
    reason: String,
}

#[derive(Args)]
struct NotificationsArgs {
    /// Mark everything read after listing
    #[arg(long)]
    mark_all_read: bool,
}

#[derive(Args)]
struct AdminArgs {
    #[command(subcommand)]
    action: AdminAction,
}

#[derive(Subcommand)]
enum AdminAction {
    /// Move a report along the status stepper
    SetStatus {
        report_id: String,
        /// open|acknowledged|in_progress|closed
        status: String,
    },
    /// Hide or unhide a report from all feeds
    SetHidden {
        report_id: String,
        #[arg(long)]
        unhide: bool,
    },
    /// Lock or unlock comments on a report
    SetLocked {
        report_id: String,
        #[arg(long)]
        unlock: bool,
    },
    /// Ban or unban a user
    Ban {
        user_id: String,
        #[arg(long)]
        unban: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let tuning = match &cli.tuning {
        Some(path) => FeedTuning::from_file(path)?,
        None => FeedTuning::default(),
    };

    let backend = demo::backend();
    let user = if cli.user == "anon" {
        None
    } else {
        Some(cli.user.as_str())
    };

    match cli.command {
        Commands::Feed(args) => run_feed(&backend, args, &tuning).await?,
        Commands::Trending(args) => run_trending(&backend, args, &tuning).await?,
        Commands::Report(args) => run_report(&backend, user, args, &tuning).await?,
        Commands::Like(args) => run_like(&backend, user, args, &tuning).await?,
        Commands::Confirm(args) => run_confirm(&backend, user, args, &tuning).await?,
        Commands::Comment(args) => run_comment(&backend, user, args, &tuning).await?,
        Commands::Flag(args) => run_flag(&backend, user, args, &tuning).await?,
        Commands::Notifications(args) => run_notifications(&backend, user, args).await?,
        Commands::Admin(args) => run_admin(&backend, user, args).await?,
    }
    Ok(())
}

fn parse_status(raw: &str) -> Result<ReportStatus> {
    ReportStatus::parse(raw)
        .ok_or_else(|| anyhow!("unknown status '{raw}' (open|acknowledged|in_progress|closed)"))
}

fn parse_category(raw: &str) -> Result<ReportCategory> {
    ReportCategory::parse(raw)
        .ok_or_else(|| anyhow!("unknown category '{raw}' (roads|lighting|waste|safety|other)"))
}

async fn run_feed(backend: &Arc<MemoryBackend>, args: FeedArgs, tuning: &FeedTuning) -> Result<()> {
    let filter = FeedFilter {
        status: args.status.as_deref().map(parse_status).transpose()?,
        category: args.category.as_deref().map(parse_category).transpose()?,
        search_text: args.search,
    };
    let mut session = FeedSession::with_tuning(
        Arc::clone(backend) as Arc<dyn CommunityBackend>,
        filter,
        tuning,
    );
    for _ in 0..args.pages.max(1) {
        session.load_more().await?;
        if !session.has_more() {
            break;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(session.items())?);
        return Ok(());
    }
    for item in session.items() {
        print_report(item);
    }
    if session.has_more() {
        println!("... more available (--pages {})", args.pages + 1);
    }
    Ok(())
}

async fn run_trending(
    backend: &Arc<MemoryBackend>,
    args: TrendingArgs,
    tuning: &FeedTuning,
) -> Result<()> {
    let mut session = FeedSession::with_tuning(
        Arc::clone(backend) as Arc<dyn CommunityBackend>,
        FeedFilter::all(),
        tuning,
    );
    while session.has_more() && session.items().len() < tuning.trending_pool {
        session.load_more().await?;
    }

    let ranked = rank(session.items(), args.region.as_deref(), tuning);
    if ranked.is_empty() {
        println!("Nothing trending for that region.");
        return Ok(());
    }
    for entry in &ranked {
        let badge = entry
            .top_rank
            .map(|n| format!("#{n} "))
            .unwrap_or_default();
        println!(
            "{badge}{} (score {})  {}",
            entry.report.id, entry.score, entry.report.title
        );
    }
    Ok(())
}

async fn run_report(
    backend: &Arc<MemoryBackend>,
    user: Option<&str>,
    args: ReportArgs,
    tuning: &FeedTuning,
) -> Result<()> {
    let mut draft = ReportDraft::new(args.title, parse_category(&args.category)?)?;
    if let Some(description) = args.description {
        draft = draft.description(description);
    }

    let reconciler = reconciler(backend, tuning);
    let (resolution, created) = reconciler
        .create_report(user, &draft, backend.now_ms())
        .await;
    print_notices(&reconciler.drain_notices());
    if let Some(report) = created {
        print_report(&report);
    }
    exit_code(resolution)
}

async fn run_like(
    backend: &Arc<MemoryBackend>,
    user: Option<&str>,
    args: TargetArgs,
    tuning: &FeedTuning,
) -> Result<()> {
    let report = backend.fetch_report(&args.report_id).await?;
    let mut view = view_of(&report, backend, user);
    let reconciler = reconciler(backend, tuning);
    let resolution = reconciler.toggle_like(&mut view, &report.id, user).await;
    print_notices(&reconciler.drain_notices());
    println!(
        "{} now has {} likes ({})",
        report.id,
        view.likes,
        if view.is_liked { "liked" } else { "not liked" }
    );
    exit_code(resolution)
}

async fn run_confirm(
    backend: &Arc<MemoryBackend>,
    user: Option<&str>,
    args: TargetArgs,
    tuning: &FeedTuning,
) -> Result<()> {
    let report = backend.fetch_report(&args.report_id).await?;
    let mut view = view_of(&report, backend, user);
    let reconciler = reconciler(backend, tuning);
    let resolution = reconciler.confirm(&mut view, &report.id, user).await;
    print_notices(&reconciler.drain_notices());
    println!("{}: {} confirmations", report.id, view.confirmations);
    exit_code(resolution)
}

async fn run_comment(
    backend: &Arc<MemoryBackend>,
    user: Option<&str>,
    args: CommentArgs,
    tuning: &FeedTuning,
) -> Result<()> {
    let report = backend.fetch_report(&args.report_id).await?;
    let mut view = view_of(&report, backend, user);
    let reconciler = reconciler(backend, tuning);
    let resolution = reconciler
        .post_comment(&mut view, &report, user, &args.text, backend.now_ms())
        .await;
    print_notices(&reconciler.drain_notices());
    exit_code(resolution)
}

async fn run_flag(
    backend: &Arc<MemoryBackend>,
    user: Option<&str>,
    args: FlagArgs,
    tuning: &FeedTuning,
) -> Result<()> {
    let reconciler = reconciler(backend, tuning);
    let resolution = reconciler.flag(&args.report_id, user, &args.reason).await;
    print_notices(&reconciler.drain_notices());
    exit_code(resolution)
}

async fn run_notifications(
    backend: &Arc<MemoryBackend>,
    user: Option<&str>,
    args: NotificationsArgs,
) -> Result<()> {
    let Some(user_id) = user else {
        bail!("notifications require a signed-in user");
    };
    let mut inbox =
        NotificationInbox::new(Arc::clone(backend) as Arc<dyn CommunityBackend>, user_id);
    inbox.refresh().await?;

    if inbox.items().is_empty() {
        println!("No notifications.");
        return Ok(());
    }
    for n in inbox.items() {
        let marker = if n.is_read { ' ' } else { '*' };
        let actor = n.actor_name.as_deref().unwrap_or("Someone");
        let about = n.report_title.as_deref().unwrap_or("");
        println!("{marker} [{:?}] {actor} {about}", n.kind);
    }
    println!("{} unread", inbox.unread_count());

    if args.mark_all_read {
        inbox.mark_all_read().await;
        println!("All marked read.");
    }
    Ok(())
}

async fn run_admin(
    backend: &Arc<MemoryBackend>,
    user: Option<&str>,
    args: AdminArgs,
) -> Result<()> {
    let caller: Option<Profile> = user.and_then(|id| backend.profile(id));
    let console = ModerationConsole::new(Arc::clone(backend) as Arc<dyn CommunityBackend>);

    match args.action {
        AdminAction::SetStatus { report_id, status } => {
            let status = parse_status(&status)?;
            console.set_status(caller.as_ref(), &report_id, status).await?;
            println!("{report_id} -> {}", status.as_str());
        }
        AdminAction::SetHidden { report_id, unhide } => {
            console
                .set_hidden(caller.as_ref(), &report_id, !unhide)
                .await?;
            println!("{report_id} hidden={}", !unhide);
        }
        AdminAction::SetLocked { report_id, unlock } => {
            console
                .set_locked(caller.as_ref(), &report_id, !unlock)
                .await?;
            println!("{report_id} locked={}", !unlock);
        }
        AdminAction::Ban { user_id, unban } => {
            console.ban_user(caller.as_ref(), &user_id, !unban).await?;
            println!("{user_id} banned={}", !unban);
        }
    }
    Ok(())
}

fn reconciler(backend: &Arc<MemoryBackend>, tuning: &FeedTuning) -> Reconciler {
    Reconciler::with_tuning(
        Arc::clone(backend) as Arc<dyn CommunityBackend>,
        tuning.clone(),
    )
}

fn view_of(report: &ReportItem, backend: &MemoryBackend, user: Option<&str>) -> EngagementView {
    EngagementView {
        is_liked: user.is_some_and(|u| backend.like_exists(&report.id, u)),
        likes: report.counts.likes,
        has_confirmed: false,
        confirmations: report.counts.confirmations,
        is_following: false,
        comments: Vec::new(),
    }
}

fn print_report(item: &ReportItem) {
    let address = item
        .location
        .as_ref()
        .map(|l| l.address.as_str())
        .unwrap_or("-");
    println!(
        "{:<8} [{:<11} {}/{}] {:<8} likes={:<3} comments={:<3} {}  ({address})",
        item.id,
        item.status.as_str(),
        item.status.step_index() + 1,
        ReportStatus::STEPS.len(),
        item.category.as_str(),
        item.counts.likes,
        item.counts.comments,
        item.title,
    );
}

fn print_notices(notices: &[Notice]) {
    for notice in notices {
        let tag = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "ok",
            NoticeLevel::Error => "error",
        };
        println!("[{tag}] {}", notice.message);
    }
}

fn exit_code(resolution: Resolution) -> Result<()> {
    match resolution {
        Resolution::Committed | Resolution::DuplicateNoOp | Resolution::Ignored => Ok(()),
        Resolution::RolledBack => bail!("backend rejected the action"),
        Resolution::RateLimited => bail!("rate limit exceeded"),
        Resolution::AuthRequired => bail!("login required"),
        Resolution::Locked => bail!("report is locked"),
    }
}
