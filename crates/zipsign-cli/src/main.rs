//! Command-line interface for the zipsign archive signer.
//!
//! Signs a ZIP archive with a PEM private key and certificate, adding
//! `META-INF/MANIFEST.MF`, `META-INF/CERT.SF` and a CMS signature block.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use zipsign::{DigestAlgorithm, ZipSigner};

#[derive(Parser)]
#[command(name = "zipsign")]
#[command(about = "JAR-style signing tool for ZIP archives", version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign an archive
    Sign {
        /// Input ZIP archive
        input: PathBuf,

        /// Output archive (replaced atomically on success)
        output: PathBuf,

        /// Private key file (PKCS#8 PEM)
        private_key: PathBuf,

        /// Certificate file (PEM)
        certificate: PathBuf,

        /// Value of the Created-By header
        #[arg(long, default_value = "zipsign")]
        created_by: String,

        /// Digest algorithm for manifest and signature-file entries
        #[arg(long, default_value = "sha1")]
        digest: DigestAlgorithm,

        /// ZIP compression level for the added entries (0-9)
        /// 0 = stored, 9 = maximum compression
        #[arg(
            short = 'z',
            long,
            default_value_t = 6,
            value_parser = clap::value_parser!(u32).range(0..=9)
        )]
        zip_level: u32,
    },
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Usage errors exit 1; --help and --version exit 0.
            return if err.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sign {
            input,
            output,
            private_key,
            certificate,
            created_by,
            digest,
            zip_level,
        } => {
            debug!(input = %input.display(), digest = %digest, zip_level, "signing");

            let artifacts = ZipSigner::new()
                .private_key(&private_key)
                .certificate(&certificate)
                .created_by(created_by)
                .digest_algorithm(digest)
                .compression_level(zip_level)
                .sign(&input, &output)
                .with_context(|| format!("failed to sign {}", input.display()))?;

            debug!(block = %artifacts.signature_block_name, "signature block written");
            println!("Signed: {}", output.display());
        }
    }

    Ok(())
}
