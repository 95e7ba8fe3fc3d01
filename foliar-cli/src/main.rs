use anyhow::Result;
use clap::{Parser, Subcommand};
use foliar::{inspect, Corner, FileAuditLog, FolioStamper, Orientation, StampOptions};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "foliar",
    about = "Stamp sequential folio numbers onto PDF pages",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Stamp folio numbers onto a range of pages
    Stamp {
        /// Input PDF file
        input: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Folio value of the first stamped page
        #[arg(short = 'n', long, default_value_t = 1)]
        start_number: u32,

        /// First page to stamp (1-based)
        #[arg(long, default_value_t = 1)]
        start_page: i32,

        /// Last page to stamp (1-based, inclusive; omit or 0 for the last page)
        #[arg(long)]
        end_page: Option<u32>,

        /// Folio type size in points
        #[arg(long, default_value_t = 16.0)]
        font_size: f64,

        /// Margin from the page edge, in centimetres
        #[arg(long, default_value_t = 1.0)]
        offset: f64,

        /// Corner to anchor the folio to: top-left, top-right, bottom-left, bottom-right
        #[arg(short, long, default_value = "bottom-right")]
        corner: Corner,

        /// Reading direction: horizontal or vertical
        #[arg(long, default_value = "horizontal")]
        orientation: Orientation,

        /// Directory the audit log is written to
        #[arg(long, default_value = "logs")]
        log_dir: PathBuf,
    },

    /// Show page count and encryption state of a PDF file
    Info {
        /// Input PDF file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "foliar=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Stamp {
            input,
            output,
            start_number,
            start_page,
            end_page,
            font_size,
            offset,
            corner,
            orientation,
            log_dir,
        } => {
            let options = StampOptions {
                start_number,
                start_page,
                end_page,
                font_size,
                offset_cm: offset,
                corner,
                orientation,
                preview: false,
            };

            let stamper = FolioStamper::new(FileAuditLog::new(log_dir));
            let summary = stamper.stamp_file(&input, &output, &options)?;

            println!(
                "Stamped {} pages (folios {:04} to {:04}) into {}",
                summary.pages_stamped,
                summary.first_folio,
                summary.last_folio,
                output.display()
            );
        }

        Commands::Info { input } => {
            let info = inspect(&input)?;
            println!("Pages:     {}", info.page_count);
            println!("Encrypted: {}", if info.encrypted { "yes" } else { "no" });
        }
    }

    Ok(())
}
