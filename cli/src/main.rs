use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use astro_booking_cli::{
    load_config, resolve_endpoint, ConsoleForm, DirSessionStore, FileNormalizer, FileTicketHost,
    Overrides, ReqwestDelivery, StdoutNavigator, TokioTimer,
};
use astro_booking_core::{
    run_ticket_page, Attachments, BookingConfig, FormFields, HandoffEnvelope, SubmissionController,
};
use astro_booking_image::NormalizerConfig;
use astro_booking_ticket::PdfTicketRenderer;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "astro-booking-cli", version, about = "Booking and ticket tools for astrology consultations")]
struct Cli {
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize images, send a booking and print the ticket URL.
    Submit(SubmitArgs),
    /// Render the ticket for a ticket URL or query string.
    Ticket(TicketArgs),
    /// Run one image through the normalizer.
    Normalize {
        input: PathBuf,
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args)]
struct SubmitArgs {
    #[arg(long)]
    full_name: String,
    #[arg(long)]
    whatsapp: String,
    #[arg(long)]
    dob: String,
    #[arg(long)]
    tob: String,
    #[arg(long)]
    pob: String,
    #[arg(long, default_value = "Horoscope Reading")]
    service: String,
    #[arg(long, default_value = "")]
    question: String,
    #[arg(long)]
    payment_slip: Option<PathBuf>,
    #[arg(long)]
    horoscope: Option<PathBuf>,
    #[arg(long, env = "BOOKING_BASE_URL", default_value = "http://localhost:8787")]
    base_url: String,
    #[arg(long, env = "BOOKING_ENDPOINT")]
    endpoint: Option<String>,
    #[arg(long, env = "BOOKING_RECIPIENT")]
    recipient: Option<String>,
    #[arg(long, env = "BOOKING_DEADLINE_MS")]
    deadline_ms: Option<u64>,
    #[arg(long)]
    redirect_delay_ms: Option<u64>,
    #[arg(long, default_value = ".astro-booking-session")]
    session_dir: PathBuf,
    /// Render the ticket into this directory after the redirect.
    #[arg(long)]
    ticket_dir: Option<PathBuf>,
}

#[derive(Args)]
struct TicketArgs {
    /// A ticket URL or bare query string.
    url: String,
    #[arg(long, env = "BOOKING_RECIPIENT")]
    recipient: Option<String>,
    #[arg(long, default_value = ".astro-booking-session")]
    session_dir: PathBuf,
    #[arg(long, default_value = ".")]
    out: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Submit(args) => {
            let overrides = Overrides {
                endpoint: args.endpoint.clone(),
                recipient: args.recipient.clone(),
                deadline_ms: args.deadline_ms,
                redirect_delay_ms: args.redirect_delay_ms,
            };
            let config = load_config(cli.config.as_deref(), &overrides)?;
            submit(args, config).await
        }
        Commands::Ticket(args) => {
            let overrides = Overrides {
                recipient: args.recipient.clone(),
                ..Overrides::default()
            };
            let config = load_config(cli.config.as_deref(), &overrides)?;
            ticket(&args.url, &args.session_dir, &args.out, &config)
        }
        Commands::Normalize { input, output } => {
            let config = load_config(cli.config.as_deref(), &Overrides::default())?;
            normalize(&input, output.as_deref(), &config)
        }
    }
}

async fn submit(args: SubmitArgs, config: BookingConfig) -> Result<()> {
    let url = resolve_endpoint(&args.base_url, &config.endpoint)
        .with_context(|| format!("invalid endpoint {}", config.endpoint))?;
    let form = ConsoleForm::new(FormFields {
        full_name: args.full_name,
        whatsapp: args.whatsapp,
        dob: args.dob,
        tob: args.tob,
        pob: args.pob,
        service: args.service,
        question: args.question,
    });
    let attachments = Attachments {
        payment_slip: args.payment_slip,
        horoscope: args.horoscope,
    };
    let store = DirSessionStore::new(&args.session_dir);
    let controller = SubmissionController::new(
        FileNormalizer::new(normalizer_config(&config)),
        ReqwestDelivery::new(url),
        &store,
        StdoutNavigator::default(),
        TokioTimer,
    )
    .with_config(config.clone());

    let report = controller.submit(&form, &attachments).await?;
    println!("booking: {}", report.booking_id);
    println!("delivery: {}", report.outcome);

    if let Some(out) = args.ticket_dir {
        ticket(&report.redirect_url, store.dir(), &out, &config)?;
    }
    Ok(())
}

fn ticket(url: &str, session_dir: &Path, out: &Path, config: &BookingConfig) -> Result<()> {
    let query = url.split_once('?').map_or(url, |(_, query)| query);
    let host = FileTicketHost::new(out);
    let prepared = run_ticket_page(&host, &PdfTicketRenderer::new(), query, config)?;
    let store = DirSessionStore::new(session_dir);
    let images = HandoffEnvelope::from_query(query)?.load_images(&store);
    println!("reference: {}", prepared.view.id);
    println!(
        "images: payment slip {}, horoscope {}",
        if images.payment_slip.is_some() { "kept" } else { "missing" },
        if images.horoscope.is_some() { "kept" } else { "none" },
    );
    Ok(())
}

fn normalize(input: &Path, output: Option<&Path>, config: &BookingConfig) -> Result<()> {
    let bytes = std::fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    if astro_booking_image::is_large_source(bytes.len()) {
        tracing::warn!(path = %input.display(), "large image, compression may take a while");
    }
    let normalized = astro_booking_image::normalize(&bytes, &normalizer_config(config))?;
    println!(
        "{}x{} {}",
        normalized.width,
        normalized.height,
        normalized.size_summary()
    );
    if let Some(path) = output {
        std::fs::write(path, &normalized.data_url)
            .with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

fn normalizer_config(config: &BookingConfig) -> NormalizerConfig {
    NormalizerConfig {
        max_width: config.normalizer.max_width,
        quality: config.normalizer.quality,
    }
}
