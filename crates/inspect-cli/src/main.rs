//! Inspection CLI
//!
//! Command-line interface for food-facility inspection reports.

#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]

use clap::{Parser, Subcommand};
use inspect_checklist::FacilityInfo;
use inspect_cli::{
    apply_transition, checklist_output, create_record, export_record, list_output, load_config,
    parse_role, parse_status, rate_item, read_record, score_output, sign_record, summary_output,
    write_record, ExportRequest, NewRecordArgs, RateArgs, Transition,
};
use inspect_report::ExportMode;
use inspect_workflow::InspectConfig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "inspect")]
#[command(about = "Food-facility inspection reports", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the built-in checklist
    Checklist {
        /// Output format (yaml, markdown)
        #[arg(long, default_value = "markdown")]
        format: String,
    },

    /// Create a draft record covering the whole checklist
    New {
        /// Report identifier (e.g. "RPT-001")
        #[arg(long)]
        id: String,

        /// Facility name
        #[arg(long)]
        facility: String,

        /// Facility address
        #[arg(long, default_value = "")]
        address: String,

        /// Business owner
        #[arg(long, default_value = "")]
        owner: String,

        /// Licence number
        #[arg(long)]
        license: String,

        /// Inspection officer (repeat for several)
        #[arg(long = "inspector")]
        inspectors: Vec<String>,

        /// Inspection date (YYYY-MM-DD)
        #[arg(long)]
        date: String,

        /// Site latitude
        #[arg(long, requires = "lng")]
        lat: Option<f64>,

        /// Site longitude
        #[arg(long, requires = "lat")]
        lng: Option<f64>,

        /// Record file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Rate, annotate or exclude a checklist item
    Rate {
        /// Record file
        record: PathBuf,

        /// Category identifier (e.g. "building")
        #[arg(long)]
        category: String,

        /// Item number (e.g. "1.4.2")
        #[arg(long)]
        item: String,

        /// Points: 2 good, 1 fair, 0 needs improvement
        #[arg(long)]
        rating: Option<u8>,

        /// Inspector note for the item
        #[arg(long)]
        note: Option<String>,

        /// Leave the item out of the score
        #[arg(long, conflicts_with = "include")]
        exclude: bool,

        /// Count a previously excluded item again
        #[arg(long)]
        include: bool,
    },

    /// Attach a signature image
    Sign {
        /// Record file
        record: PathBuf,

        /// Signer role (inspector, owner)
        #[arg(long)]
        role: String,

        /// Signer name
        #[arg(long)]
        signer: String,

        /// Signature image (PNG or JPEG)
        #[arg(long)]
        image: PathBuf,
    },

    /// Show category and overall scores
    Score {
        /// Record file
        record: PathBuf,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Print a markdown summary of a record
    Summary {
        /// Record file
        record: PathBuf,
    },

    /// Submit a signed draft for approval
    Submit {
        /// Record file
        record: PathBuf,
    },

    /// Approve a pending report
    Approve {
        /// Record file
        record: PathBuf,

        /// Approval note
        #[arg(long, default_value = "")]
        note: String,
    },

    /// Reject a pending report
    Reject {
        /// Record file
        record: PathBuf,

        /// Rejection reason
        #[arg(long)]
        reason: String,
    },

    /// Render a record onto the form and write the PDF
    Export {
        /// Record file
        record: PathBuf,

        /// Page template file (defaults to the TS2 form)
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Directory with the form page images
        #[arg(long)]
        assets: Option<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Raster scale
        #[arg(long)]
        scale: Option<f32>,

        /// JPEG quality used by compression (0.0-1.0)
        #[arg(long)]
        image_quality: Option<f32>,

        /// Export mode (raster, direct)
        #[arg(long)]
        mode: Option<ExportMode>,

        /// Keep the uncompressed PDF
        #[arg(long)]
        no_compress: bool,
    },

    /// List the reports in a directory with dashboard totals
    List {
        /// Directory of record files
        dir: PathBuf,

        /// Only this status (draft, pending-approval, approved, rejected)
        #[arg(long)]
        status: Option<String>,

        /// Match facility name, licence or inspector
        #[arg(long)]
        search: Option<String>,
    },
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn exit_on_error<T>(result: Result<T, String>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    }
}

fn print_result(result: Result<String, String>) {
    let output = exit_on_error(result);
    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
}

async fn run_export(request: ExportRequest, config: &InspectConfig) {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("\nInterrupted, discarding the export...");
            on_interrupt.cancel();
        }
    });

    println!("Exporting {}", request.record.display());
    let summary = exit_on_error(export_record(&request, config, Some(&cancel)).await);
    println!(
        "Wrote {} ({} page(s), {} bytes{})",
        summary.path.display(),
        summary.pages,
        summary.size,
        if summary.compressed { ", compressed" } else { "" }
    );
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let config = exit_on_error(load_config(cli.config.as_deref()));

    match cli.command {
        Commands::Checklist { format } => print_result(checklist_output(&format)),
        Commands::New {
            id,
            facility,
            address,
            owner,
            license,
            inspectors,
            date,
            lat,
            lng,
            output,
        } => {
            let args = NewRecordArgs {
                id,
                facility: FacilityInfo {
                    name: facility,
                    address,
                    owner,
                    ..FacilityInfo::default()
                },
                license,
                inspectors,
                date,
                location: lat.zip(lng),
            };
            let record = exit_on_error(create_record(args));
            exit_on_error(write_record(&output, &record));
            println!("Created {} at {}", record.id, output.display());
        }
        Commands::Rate {
            record,
            category,
            item,
            rating,
            note,
            exclude,
            include,
        } => {
            let excluded = if exclude {
                Some(true)
            } else if include {
                Some(false)
            } else {
                None
            };
            let args = RateArgs {
                category,
                item,
                rating,
                note,
                excluded,
            };
            print_result(rate_item(&record, &args));
        }
        Commands::Sign {
            record,
            role,
            signer,
            image,
        } => {
            let role = exit_on_error(parse_role(&role));
            print_result(sign_record(&record, role, &signer, &image));
        }
        Commands::Score { record, json } => {
            let loaded = exit_on_error(read_record(&record));
            print_result(score_output(&loaded, &config.calculator(), json));
        }
        Commands::Summary { record } => {
            let loaded = exit_on_error(read_record(&record));
            print_result(Ok(summary_output(&loaded, &config.calculator())));
        }
        Commands::Submit { record } => print_result(apply_transition(&record, &Transition::Submit)),
        Commands::Approve { record, note } => {
            print_result(apply_transition(&record, &Transition::Approve(note)));
        }
        Commands::Reject { record, reason } => {
            print_result(apply_transition(&record, &Transition::Reject(reason)));
        }
        Commands::Export {
            record,
            templates,
            assets,
            output,
            scale,
            image_quality,
            mode,
            no_compress,
        } => {
            let request = ExportRequest {
                record,
                templates,
                assets,
                output,
                scale,
                image_quality,
                mode,
                no_compress,
            };
            run_export(request, &config).await;
        }
        Commands::List {
            dir,
            status,
            search,
        } => {
            let status = exit_on_error(status.as_deref().map(parse_status).transpose());
            print_result(list_output(
                &dir,
                status,
                search.as_deref(),
                &config.calculator(),
            ));
        }
    }
}
