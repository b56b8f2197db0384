mod commands;
mod error;
mod filetime;
mod layout;
mod signer;

use std::path::PathBuf;

use anyhow::Context;
use structopt::clap::AppSettings::*;
use structopt::StructOpt;
use tracing_subscriber::EnvFilter;

use crate::commands::sign::SignOptions;
use crate::signer::OpenSsl;

#[derive(Debug, StructOpt)]
enum Commands {
    #[structopt(
        name = "s",
        visible_alias = "sign",
        about = "Sign a file, adding a signature entry to its trailing meta box"
    )]
    Sign {
        #[structopt(
            long,
            env = "ISOSIGN_OPENSSL",
            default_value = "openssl",
            parse(from_os_str),
            help = "Path to the openssl executable"
        )]
        openssl: PathBuf,

        #[structopt(
            short = "S",
            long,
            default_value = "256",
            help = "Bytes reserved for the signature; 256 for a 2048-bit RSA key"
        )]
        signature_size: u64,

        #[structopt(
            short = "t",
            long,
            parse(try_from_str = filetime::parse_ticks),
            help = "Start time of the recording [yyyy-mm-ddThh:mm:ss[.zzz], UTC]"
        )]
        start_time: Option<u64>,

        #[structopt(short = "c", long, help = "Comment stored alongside the signature")]
        comment: Option<String>,

        #[structopt(name = "file", parse(from_os_str), help = "Path to the media file")]
        path: PathBuf,

        #[structopt(
            name = "certificate",
            parse(from_os_str),
            help = "DER encoded certificate to embed"
        )]
        certificate: PathBuf,

        #[structopt(name = "key", parse(from_os_str), help = "PEM encoded private key")]
        key: PathBuf,
    },

    #[structopt(name = "l", visible_alias = "list", about = "List the boxes of a file")]
    List {
        #[structopt(long, help = "Print the box tree as JSON")]
        json: bool,

        #[structopt(name = "file", parse(from_os_str), help = "Path to the media file")]
        path: PathBuf,
    },
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "isosign",
    about = "Sign and inspect ISO base media files.",
    settings = &[SubcommandRequiredElseHelp, DisableHelpSubcommand, VersionlessSubcommands],
    usage = "isosign (s|l) [FLAGS|OPTIONS] <file> [certificate] [key]"
)]
struct CliOpts {
    #[structopt(short, long, help = "Show verbose output", global = true)]
    verbose: bool,

    #[structopt(subcommand)]
    cmd: Commands,
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(opts: CliOpts) -> anyhow::Result<()> {
    match opts.cmd {
        Commands::Sign {
            openssl,
            signature_size,
            start_time,
            comment,
            path,
            certificate,
            key,
        } => {
            let options = SignOptions {
                certificate: commands::sign::read_certificate(&certificate)?,
                key,
                start_time,
                comment,
                signature_size,
            };
            commands::sign(&path, options, &OpenSsl::new(openssl))
                .with_context(|| format!("Cannot sign `{}`", path.display()))
        }
        Commands::List { json, path } => commands::list(&path, json)
            .with_context(|| format!("Cannot list `{}`", path.display())),
    }
}

fn main() {
    let opts = CliOpts::from_iter(wild::args_os());
    init_tracing(opts.verbose);

    if let Err(e) = run(opts) {
        eprintln!("{:?}", e);
        std::process::exit(1);
    }
}
