use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing_subscriber::EnvFilter;

use seatmate::cli::{Cli, Command};
use seatmate::config::Config;
use seatmate::error::{SeatingError, StoreError};
use seatmate::report;
use seatmate::roster::DelimitedRoster;
use seatmate::service;
use seatmate::timestamp::GenerationId;

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn fail(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("{context}: {err}");
    std::process::exit(1);
}

fn warn_audit(failure: Option<&StoreError>) {
    if let Some(e) = failure {
        eprintln!("warning: change saved, but {e}");
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let config = Config::from_args(&cli.global).unwrap_or_else(|e| fail("Error loading config", e));
    let service = service::open(&config).unwrap_or_else(|e| fail("Error opening snapshot store", e));

    match cli.command {
        Command::Generate(args) => {
            let Some(path) = &config.roster_path else {
                fail("Error", "no roster file; pass --roster or set [roster] path in config.toml");
            };
            let roster = DelimitedRoster::from_path(path, config.delimiter);

            let mut rng = match config.seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };

            match service.generate_and_save(&roster, &mut rng) {
                Ok(generated) => {
                    report::print_generated(&generated, args.json);
                    warn_audit(generated.audit_failure.as_ref());
                }
                Err(SeatingError::Roster(e)) => fail("Invalid roster", e),
                Err(e) => fail("Error saving arrangement", e),
            }
        }
        Command::Show(args) => match service.get_current() {
            Ok(Some(seating)) => report::print_seating(&seating, args.json),
            Ok(None) if args.json => println!("null"),
            Ok(None) => println!("No arrangement yet. Run 'seatmate generate' to create one."),
            Err(e) => fail("Error loading current arrangement", e),
        },
        Command::History(args) => match service.list_history() {
            Ok(entries) => report::print_history(&entries, args.json),
            Err(e) => fail("Error listing history", e),
        },
        Command::View(args) => match service.get_by_id(&args.id) {
            Ok(seating) => {
                if !args.json {
                    if let Some(id) = GenerationId::parse(&args.id) {
                        println!("{}\n", service.store().codec().display(id.as_str()));
                    }
                }
                report::print_seating(&seating, args.json);
            }
            Err(e) => fail("Error loading snapshot", e),
        },
        Command::Restore(args) => match service.restore(&args.id) {
            Ok(restored) => {
                report::print_restored(&restored, args.json);
                warn_audit(restored.audit_failure.as_ref());
            }
            Err(e) => fail("Error restoring snapshot", e),
        },
    }
}
