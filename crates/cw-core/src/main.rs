//! CardWatch reporting CLI
//!
//! The main entry point for `cardwatch`, handling:
//! - Report rendering (template + data to PDF or HTML)
//! - Dashboard generation against the reporting backend
//! - Report listing, the local report index, and scheduled reports
//! - Assistant chat with transcript export

use clap::{Args, Parser, Subcommand};
use cw_client::{ApiClient, ReportingApi};
use cw_common::validate::default_date_range;
use cw_common::{file_safe_patient, validate_inputs, Frequency, OutputFormat, PatientId, ReportFormat, ReportSection};
use cw_core::chat::{ChatSession, QUICK_QUESTIONS};
use cw_core::config::{load_config, ConfigOptions, ResolvedConfig};
use cw_core::dashboard::{DashboardController, DashboardRequest};
use cw_core::exit_codes::ExitCode;
use cw_core::log_event;
use cw_core::logging::{event_names, init_logging, verbosity_level, LogConfig, LogContext, LogFormat, Stage};
use cw_core::output::{self, print_error, print_success, CommandError};
use cw_core::schedule::{self, ScheduleRequest};
use cw_report::store::NUTRITION;
use cw_report::{
    report_filename, ChromeBackend, NewReport, RenderedReport, ReportRenderer, ReportStore,
    DEFAULT_TEMPLATE, HTML_FALLBACK_RENDERER,
};
use serde_json::json;
use std::path::{Path, PathBuf};

/// CardWatch - nutrition report generation and dashboard client
#[derive(Parser)]
#[command(name = "cardwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Reporting backend base URL (or CARDWATCH_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Config file (or CARDWATCH_CONFIG; default: $XDG_CONFIG_HOME/cardwatch/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "md")]
    format: OutputFormat,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Decrease verbosity (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Per-request timeout for backend calls (seconds)
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a PDF report from an HTML template and a JSON data file
    RenderPdf(RenderPdfArgs),

    /// Substitute a JSON data file into an HTML template
    RenderHtml(RenderArgs),

    /// Print an existing HTML report to PDF as it looks on screen
    Convert(ConvertArgs),

    /// Print the built-in report template
    Template,

    /// Check that a headless browser can be launched
    VerifyBrowser,

    /// List patients
    Clients,

    /// Generate a patient's nutrition dashboard
    Dashboard(DashboardArgs),

    /// Backend report generation and listing
    Report(ReportArgs),

    /// Ask the AI nutritionist about a patient's report
    Chat(ChatArgs),

    /// Manage recurring report schedules
    Schedule(ScheduleArgs),

    /// Raw health data for a patient
    HealthData(PatientArgs),

    /// Response of the backend's prompt endpoint
    Prompt,

    /// Print version information
    Version,
}

// ============================================================================
// Command argument structs
// ============================================================================

#[derive(Args, Debug)]
struct RenderArgs {
    /// HTML template containing the data placeholder
    template: PathBuf,

    /// JSON data file
    data: PathBuf,

    /// Output file (default: <reports-dir>/<patient>_nutrition_<timestamp>.<ext>)
    output: Option<PathBuf>,

    /// Record the report in the local index under this patient
    #[arg(long)]
    patient: Option<String>,

    /// Reporting period start recorded with the report (YYYY-MM-DD)
    #[arg(long)]
    start: Option<String>,

    /// Reporting period end recorded with the report (YYYY-MM-DD)
    #[arg(long)]
    end: Option<String>,

    /// Reports directory for the local index
    #[arg(long)]
    reports_dir: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RenderPdfArgs {
    #[command(flatten)]
    render: RenderArgs,

    /// Keep the HTML report when no browser can be launched
    #[arg(long)]
    html_fallback: bool,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// HTML file to print; the PDF is written next to it
    html: PathBuf,
}

#[derive(Args, Debug)]
struct PatientArgs {
    /// Patient ID
    #[arg(long)]
    patient: String,
}

#[derive(Args, Debug)]
struct DashboardArgs {
    /// Patient ID
    #[arg(long)]
    patient: Option<String>,

    /// Period start (YYYY-MM-DD, default: first of this month)
    #[arg(long)]
    start: Option<String>,

    /// Period end (YYYY-MM-DD, default: today)
    #[arg(long)]
    end: Option<String>,

    /// Do not request AI analysis
    #[arg(long)]
    no_analysis: bool,

    /// Skip the embedded report and fetch dashboard data directly
    #[arg(long)]
    skip_embedded: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    #[command(subcommand)]
    command: ReportCommands,
}

#[derive(Subcommand, Debug)]
enum ReportCommands {
    /// Ask the backend to generate a report
    Generate {
        /// Patient ID
        #[arg(long)]
        patient: Option<String>,

        /// Period start (YYYY-MM-DD)
        #[arg(long)]
        start: Option<String>,

        /// Period end (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,

        /// Sections to include (default: all)
        #[arg(long, value_delimiter = ',')]
        sections: Vec<ReportSection>,

        /// Leave out AI analysis
        #[arg(long)]
        no_ai: bool,
    },

    /// Reports the backend has stored for a patient
    List(PatientArgs),

    /// Reports recorded in the local index
    Index {
        /// Patient ID
        #[arg(long)]
        patient: String,

        /// Reports directory (default: from config)
        #[arg(long)]
        reports_dir: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// Patient ID
    #[arg(long)]
    patient: Option<String>,

    /// Message to send (default: one message per stdin line)
    message: Option<String>,

    /// Send one of the canned report questions (1-6)
    #[arg(long, conflicts_with = "message", value_parser = clap::value_parser!(u8).range(1..=6))]
    quick: Option<u8>,

    /// Write the conversation as HTML
    #[arg(long)]
    transcript: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    #[command(subcommand)]
    command: ScheduleCommands,
}

#[derive(Subcommand, Debug)]
enum ScheduleCommands {
    /// Schedule a recurring report
    Add {
        /// Patient ID
        #[arg(long)]
        patient: String,

        #[arg(long, value_enum)]
        frequency: Frequency,

        /// Day of week for weekly reports (0 = Monday .. 6 = Sunday)
        #[arg(long)]
        weekday: Option<u8>,

        /// Time of day (HH:MM, default 02:00)
        #[arg(long)]
        time: Option<String>,

        /// Sections to include (default: all)
        #[arg(long, value_delimiter = ',')]
        sections: Vec<ReportSection>,

        /// Leave out AI analysis
        #[arg(long)]
        no_ai: bool,
    },

    /// List scheduled reports
    List {
        /// Only this patient's schedules
        #[arg(long)]
        patient: Option<String>,
    },

    /// Cancel a patient's schedule
    Cancel {
        /// Patient ID
        #[arg(long)]
        patient: String,

        #[arg(long, value_enum)]
        frequency: Frequency,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::RenderPdf(_) => "render-pdf",
            Commands::RenderHtml(_) => "render-html",
            Commands::Convert(_) => "convert",
            Commands::Template => "template",
            Commands::VerifyBrowser => "verify-browser",
            Commands::Clients => "clients",
            Commands::Dashboard(_) => "dashboard",
            Commands::Report(args) => match args.command {
                ReportCommands::Generate { .. } => "report generate",
                ReportCommands::List(_) => "report list",
                ReportCommands::Index { .. } => "report index",
            },
            Commands::Chat(_) => "chat",
            Commands::Schedule(args) => match args.command {
                ScheduleCommands::Add { .. } => "schedule add",
                ScheduleCommands::List { .. } => "schedule list",
                ScheduleCommands::Cancel { .. } => "schedule cancel",
            },
            Commands::HealthData(_) => "health-data",
            Commands::Prompt => "prompt",
            Commands::Version => "version",
        }
    }
}

type CmdResult = Result<(), CommandError>;

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests are not failures.
            let code = if e.use_stderr() {
                ExitCode::ArgsError
            } else {
                ExitCode::Success
            };
            let _ = e.print();
            std::process::exit(code.as_i32());
        }
    };

    let cli_format = cli.global.format.is_machine().then_some(LogFormat::Jsonl);
    let log_config = LogConfig::from_env(
        verbosity_level(cli.global.verbose, cli.global.quiet),
        cli_format,
    );
    init_logging(&log_config);

    let ctx = LogContext::generate();
    let command = cli.command.name();
    log_event!(ctx, DEBUG, event_names::RUN_STARTED, Stage::Init, "starting", command = command);

    let global = &cli.global;
    let result = match &cli.command {
        Commands::RenderPdf(args) => run_render_pdf(global, &ctx, args),
        Commands::RenderHtml(args) => run_render_html(global, &ctx, args),
        Commands::Convert(args) => run_convert(global, &ctx, args),
        Commands::Template => {
            print!("{}", DEFAULT_TEMPLATE);
            Ok(())
        }
        Commands::VerifyBrowser => run_verify_browser(global, &ctx),
        Commands::Clients => run_clients(global, &ctx),
        Commands::Dashboard(args) => run_dashboard(global, &ctx, args),
        Commands::Report(args) => run_report(global, &ctx, args),
        Commands::Chat(args) => run_chat(global, &ctx, args),
        Commands::Schedule(args) => run_schedule(global, &ctx, args),
        Commands::HealthData(args) => run_health_data(global, &ctx, args),
        Commands::Prompt => run_prompt(global, &ctx),
        Commands::Version => {
            print_version(global);
            Ok(())
        }
    };

    let exit_code = match result {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            print_error(global.format, command, &ctx.run_id, &e);
            e.exit
        }
    };
    log_event!(
        ctx,
        DEBUG,
        event_names::RUN_FINISHED,
        Stage::Init,
        "finished",
        command = command,
        exit_code = exit_code.code_name()
    );
    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Shared helpers
// ============================================================================

fn load(global: &GlobalOpts, ctx: &LogContext) -> Result<ResolvedConfig, CommandError> {
    let options = ConfigOptions {
        config_path: global.config.clone(),
        api_url: global.api_url.clone(),
        timeout_secs: global.timeout,
    };
    let resolved = load_config(&options)?;
    match &resolved.path {
        Some(path) => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_LOADED,
            Stage::Init,
            "config loaded",
            path = path.display().to_string().as_str(),
            base_url_source = resolved.base_url_source.as_str()
        ),
        None => log_event!(
            ctx,
            DEBUG,
            event_names::CONFIG_DEFAULT_USED,
            Stage::Init,
            "no config file; using defaults",
            base_url_source = resolved.base_url_source.as_str()
        ),
    }
    Ok(resolved)
}

fn api_client(config: &ResolvedConfig) -> ApiClient {
    ApiClient::with_timeout(config.config.api.base_url.clone(), config.config.api.timeout())
}

fn patient_id(raw: &str) -> Result<PatientId, CommandError> {
    let id = PatientId::new(raw);
    if id.is_blank() {
        return Err(cw_common::ValidationError::MissingPatient.into());
    }
    Ok(id)
}

// ============================================================================
// Rendering
// ============================================================================

/// Explicit output, or a timestamped file in the reports directory.
fn render_output(
    args: &RenderArgs,
    store: &ReportStore,
    format: ReportFormat,
) -> Result<PathBuf, CommandError> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    let patient = args.patient.as_deref().ok_or_else(|| {
        CommandError::args("an output path is required unless --patient is given")
    })?;
    let name = report_filename(
        &file_safe_patient(patient)?,
        NUTRITION,
        format,
        chrono::Local::now().naive_local(),
    );
    Ok(store.report_path(&name))
}

fn report_store(args: &RenderArgs, config: &ResolvedConfig) -> ReportStore {
    ReportStore::new(
        args.reports_dir
            .clone()
            .unwrap_or_else(|| config.config.reports.dir.clone()),
    )
}

/// Index name for a report file; only files inside the reports directory can be recorded.
fn index_name(store: &ReportStore, path: &Path) -> Result<String, CommandError> {
    store.relative_name(path).ok_or_else(|| {
        CommandError::args(format!(
            "--patient only records reports inside {}; drop the output path or pass --reports-dir",
            store.dir().display()
        ))
    })
}

/// Refuse before rendering anything that could not be recorded afterwards.
fn check_recordable(args: &RenderArgs, store: &ReportStore, output: &Path) -> CmdResult {
    if args.patient.is_some() {
        index_name(store, output)?;
    }
    Ok(())
}

/// Add the rendered file to the local index when a patient is given.
fn record(
    args: &RenderArgs,
    store: &ReportStore,
    report: &RenderedReport,
) -> Result<Option<cw_common::Report>, CommandError> {
    let Some(patient) = args.patient.as_deref() else {
        return Ok(None);
    };
    let entry = NewReport::new(patient_id(patient)?, index_name(store, &report.path)?)
        .with_dates(args.start.clone(), args.end.clone())
        .with_renderer(report.renderer.clone())
        .with_format(report.format);
    Ok(Some(store.store(entry)?))
}

fn print_rendered(
    global: &GlobalOpts,
    ctx: &LogContext,
    command: &str,
    report: &RenderedReport,
    recorded: Option<cw_common::Report>,
) -> CmdResult {
    let payload = json!({ "report": report, "recorded": recorded });
    print_success(
        global.format,
        command,
        &ctx.run_id,
        payload,
        || output::rendered_markdown(report),
        || format!("{} ({} bytes)", report.path.display(), report.bytes),
    );
    Ok(())
}

fn render_failed(ctx: &LogContext, e: cw_report::ReportError) -> CommandError {
    log_event!(
        ctx,
        ERROR,
        event_names::RENDER_FAILED,
        Stage::Render,
        "render failed",
        error = e.to_string().as_str()
    );
    e.into()
}

fn render_started(ctx: &LogContext, args: &RenderArgs, output: &Path) {
    log_event!(
        ctx,
        INFO,
        event_names::RENDER_STARTED,
        Stage::Render,
        "rendering report",
        template = args.template.display().to_string().as_str(),
        data = args.data.display().to_string().as_str(),
        output = output.display().to_string().as_str()
    );
}

fn run_render_pdf(global: &GlobalOpts, ctx: &LogContext, args: &RenderPdfArgs) -> CmdResult {
    let config = load(global, ctx)?;
    let render = &args.render;
    let store = report_store(render, &config);
    let output = render_output(render, &store, ReportFormat::Pdf)?;
    check_recordable(render, &store, &output)?;
    render_started(ctx, render, &output);

    let renderer = ReportRenderer::chrome(config.config.render.clone());
    let result = if args.html_fallback {
        renderer.render_with_fallback(&render.template, &render.data, &output)
    } else {
        renderer.render_pdf(&render.template, &render.data, &output)
    };
    let report = result.map_err(|e| render_failed(ctx, e))?;

    if report.renderer == HTML_FALLBACK_RENDERER {
        log_event!(
            ctx,
            WARN,
            event_names::RENDER_FALLBACK,
            Stage::Render,
            "browser unavailable; wrote HTML instead",
            path = report.path.display().to_string().as_str()
        );
    } else {
        log_event!(
            ctx,
            INFO,
            event_names::RENDER_PDF_WRITTEN,
            Stage::Render,
            "PDF written",
            bytes = report.bytes
        );
    }

    let recorded = record(render, &store, &report)?;
    print_rendered(global, ctx, "render-pdf", &report, recorded)
}

fn run_render_html(global: &GlobalOpts, ctx: &LogContext, args: &RenderArgs) -> CmdResult {
    let config = load(global, ctx)?;
    let store = report_store(args, &config);
    let output = render_output(args, &store, ReportFormat::Html)?;
    check_recordable(args, &store, &output)?;
    render_started(ctx, args, &output);

    let renderer = ReportRenderer::chrome(config.config.render.clone());
    let report = renderer
        .render_html(&args.template, &args.data, &output)
        .map_err(|e| render_failed(ctx, e))?;
    log_event!(
        ctx,
        INFO,
        event_names::RENDER_HTML_WRITTEN,
        Stage::Render,
        "HTML written",
        bytes = report.bytes
    );

    let recorded = record(args, &store, &report)?;
    print_rendered(global, ctx, "render-html", &report, recorded)
}

fn run_convert(global: &GlobalOpts, ctx: &LogContext, args: &ConvertArgs) -> CmdResult {
    let config = load(global, ctx)?;
    let renderer = ReportRenderer::chrome(config.config.render.clone());
    let report = renderer
        .convert_html(&args.html)
        .map_err(|e| render_failed(ctx, e))?;
    log_event!(
        ctx,
        INFO,
        event_names::RENDER_PDF_WRITTEN,
        Stage::Render,
        "PDF written",
        bytes = report.bytes
    );
    print_rendered(global, ctx, "convert", &report, None)
}

fn run_verify_browser(global: &GlobalOpts, ctx: &LogContext) -> CmdResult {
    let config = load(global, ctx)?;
    let check = ChromeBackend::new(config.config.render.clone())
        .verify()
        .map_err(|e| render_failed(ctx, e))?;
    log_event!(
        ctx,
        INFO,
        event_names::RENDER_BROWSER_VERIFIED,
        Stage::Render,
        "browser verified",
        product = check.product.as_str()
    );
    print_success(
        global.format,
        "verify-browser",
        &ctx.run_id,
        serde_json::to_value(&check)?,
        || output::browser_check_markdown(&check),
        || check.product.clone(),
    );
    Ok(())
}

// ============================================================================
// Backend commands
// ============================================================================

fn run_clients(global: &GlobalOpts, ctx: &LogContext) -> CmdResult {
    let config = load(global, ctx)?;
    let clients = api_client(&config).fetch_clients()?;
    print_success(
        global.format,
        "clients",
        &ctx.run_id,
        serde_json::to_value(&clients)?,
        || output::clients_markdown(&clients),
        || format!("{} patients", clients.len()),
    );
    Ok(())
}

fn run_dashboard(global: &GlobalOpts, ctx: &LogContext, args: &DashboardArgs) -> CmdResult {
    let config = load(global, ctx)?;
    let api = api_client(&config);

    let (start, end) = match (&args.start, &args.end) {
        (None, None) => {
            let range = default_date_range(chrono::Local::now().date_naive());
            (Some(range.start_str()), Some(range.end_str()))
        }
        (start, end) => (start.clone(), end.clone()),
    };
    let request = DashboardRequest {
        patient: args.patient.as_deref(),
        start: start.as_deref(),
        end: end.as_deref(),
        include_analysis: !args.no_analysis,
    };
    let dashboard = DashboardController::new(&api, ctx.clone())
        .skip_embedded(args.skip_embedded)
        .generate(&request)?;

    print_success(
        global.format,
        "dashboard",
        &ctx.run_id,
        serde_json::to_value(&dashboard)?,
        || output::dashboard_markdown(&dashboard),
        || {
            let tier = dashboard
                .attempts
                .last()
                .map(|a| a.tier.as_str())
                .unwrap_or("none");
            format!("patient {} via {}", dashboard.patient_id, tier)
        },
    );
    Ok(())
}

fn run_report(global: &GlobalOpts, ctx: &LogContext, args: &ReportArgs) -> CmdResult {
    match &args.command {
        ReportCommands::Generate {
            patient,
            start,
            end,
            sections,
            no_ai,
        } => {
            let patient = patient_id(patient.as_deref().unwrap_or(""))?;
            if start.is_some() || end.is_some() {
                validate_inputs(Some(patient.as_str()), start.as_deref(), end.as_deref())?;
            }
            let config = load(global, ctx)?;
            let result = api_client(&config).generate_report(
                Some(&patient),
                start.as_deref(),
                end.as_deref(),
                sections,
                !no_ai,
            )?;
            print_success(
                global.format,
                "report generate",
                &ctx.run_id,
                serde_json::to_value(&result)?,
                || output::generate_result_markdown(&result),
                || {
                    format!(
                        "{} {}",
                        result.title(),
                        result.file.as_deref().unwrap_or_default()
                    )
                },
            );
            Ok(())
        }
        ReportCommands::List(PatientArgs { patient }) => {
            let patient = patient_id(patient)?;
            let config = load(global, ctx)?;
            let listing = api_client(&config).get_patient_reports(&patient)?;
            print_success(
                global.format,
                "report list",
                &ctx.run_id,
                serde_json::to_value(&listing)?,
                || output::reports_markdown(patient.as_str(), &listing.reports),
                || format!("{} reports", listing.reports.len()),
            );
            Ok(())
        }
        ReportCommands::Index {
            patient,
            reports_dir,
        } => {
            let patient = patient_id(patient)?;
            let config = load(global, ctx)?;
            let store = ReportStore::new(
                reports_dir
                    .clone()
                    .unwrap_or_else(|| config.config.reports.dir.clone()),
            );
            let reports = store.reports_for_patient(&patient)?;
            print_success(
                global.format,
                "report index",
                &ctx.run_id,
                json!({ "patient_id": patient, "reports": reports }),
                || output::reports_markdown(patient.as_str(), &reports),
                || format!("{} reports", reports.len()),
            );
            Ok(())
        }
    }
}

fn run_chat(global: &GlobalOpts, ctx: &LogContext, args: &ChatArgs) -> CmdResult {
    let config = load(global, ctx)?;
    let api = api_client(&config);
    let mut session = ChatSession::new(args.patient.as_deref().map(PatientId::new));

    // One request per stdin line, as it is read.
    let messages: Box<dyn Iterator<Item = std::io::Result<String>>> =
        match (&args.message, args.quick) {
            (Some(message), _) => Box::new(std::iter::once(Ok(message.clone()))),
            (None, Some(n)) => Box::new(std::iter::once(Ok(
                QUICK_QUESTIONS[usize::from(n) - 1].to_string(),
            ))),
            (None, None) => Box::new(std::io::stdin().lines()),
        };

    let mut exchanges = Vec::new();
    let mut failure = None;
    for message in messages {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                failure = Some(CommandError::from(e));
                break;
            }
        };
        match session.send(&api, &message, ctx) {
            Ok(Some(reply)) => {
                if global.format == OutputFormat::Md {
                    println!("**You:** {}\n", message);
                    println!("**AI Nutritionist:** {}\n", reply);
                }
                exchanges.push(json!({ "message": message, "response": reply }));
            }
            Ok(None) => {}
            Err(e) => {
                failure = Some(CommandError::from(e));
                break;
            }
        }
    }

    if let Some(path) = &args.transcript {
        std::fs::write(path, session.transcript_html()).map_err(|e| {
            CommandError::new(
                ExitCode::IoError,
                format!("Failed to write transcript {}: {}", path.display(), e),
            )
        })?;
    }
    if let Some(e) = failure {
        return Err(e);
    }

    let payload = json!({
        "patient_id": session.patient(),
        "exchanges": exchanges,
        "chat_history": session.history(),
    });
    match global.format {
        // Replies were streamed as they arrived.
        OutputFormat::Md => {}
        format => print_success(
            format,
            "chat",
            &ctx.run_id,
            payload,
            String::new,
            || format!("{} messages", exchanges.len()),
        ),
    }
    Ok(())
}

fn run_schedule(global: &GlobalOpts, ctx: &LogContext, args: &ScheduleArgs) -> CmdResult {
    let config = load(global, ctx)?;
    let api = api_client(&config);
    match &args.command {
        ScheduleCommands::Add {
            patient,
            frequency,
            weekday,
            time,
            sections,
            no_ai,
        } => {
            let request = ScheduleRequest::new(
                Some(patient.as_str()),
                *frequency,
                *weekday,
                time.as_deref(),
                !no_ai,
            )?
            .with_sections(sections.clone());
            let ack = schedule::schedule(&api, &request, ctx)?;
            let report = request.report();
            print_success(
                global.format,
                "schedule add",
                &ctx.run_id,
                json!({ "schedule": report, "response": ack }),
                || {
                    format!(
                        "Scheduled {} report for patient {} at {} (AI analysis: {})\n",
                        report.frequency_text(),
                        report.patient_id,
                        report.time_text(),
                        report.include_ai_text()
                    )
                },
                || format!("{} {}", report.patient_id, report.frequency_text()),
            );
            Ok(())
        }
        ScheduleCommands::List { patient } => {
            let patient = patient.as_deref().map(patient_id).transpose()?;
            let reports = schedule::list(&api, patient.as_ref())?;
            print_success(
                global.format,
                "schedule list",
                &ctx.run_id,
                json!({ "scheduled_reports": reports }),
                || output::schedules_markdown(&reports),
                || format!("{} scheduled reports", reports.len()),
            );
            Ok(())
        }
        ScheduleCommands::Cancel { patient, frequency } => {
            let patient = patient_id(patient)?;
            let ack = schedule::cancel(&api, &patient, *frequency, ctx)?;
            print_success(
                global.format,
                "schedule cancel",
                &ctx.run_id,
                serde_json::to_value(&ack)?,
                || {
                    format!(
                        "Cancelled {} report for patient {}\n",
                        frequency.label(),
                        patient
                    )
                },
                || format!("{} {} cancelled", patient, frequency),
            );
            Ok(())
        }
    }
}

fn run_health_data(global: &GlobalOpts, ctx: &LogContext, args: &PatientArgs) -> CmdResult {
    let patient = patient_id(&args.patient)?;
    let config = load(global, ctx)?;
    let data = api_client(&config).fetch_health_data(&patient)?;
    print_success(
        global.format,
        "health-data",
        &ctx.run_id,
        data.clone(),
        || format!("# Health data: patient {}\n\n```json\n{}\n```\n", patient, output::to_pretty(&data)),
        || format!("patient {}", patient),
    );
    Ok(())
}

fn run_prompt(global: &GlobalOpts, ctx: &LogContext) -> CmdResult {
    let config = load(global, ctx)?;
    let data = api_client(&config).fetch_prompt_response()?;
    let text = data
        .get("response")
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| output::to_pretty(&data));
    print_success(
        global.format,
        "prompt",
        &ctx.run_id,
        data,
        || format!("{}\n", text),
        || "ok".to_string(),
    );
    Ok(())
}

fn print_version(global: &GlobalOpts) {
    let version_info = json!({
        "schema_version": cw_common::SCHEMA_VERSION,
        "cardwatch_version": env!("CARGO_PKG_VERSION"),
        "rust_version": env!("CARGO_PKG_RUST_VERSION"),
    });

    match global.format {
        OutputFormat::Json => println!("{}", output::to_pretty(&version_info)),
        OutputFormat::Exitcode => {}
        _ => {
            println!("cardwatch {}", env!("CARGO_PKG_VERSION"));
            println!("schema version: {}", cw_common::SCHEMA_VERSION);
        }
    }
}
