//! Drive the KZG bridge the way a string-only host would.
//!
//! Every value crosses into the bridge as a hex string and every result comes back as a string or
//! an integer. Blobs and cells are too long to pass as arguments, so they are read from files
//! containing their hex encoding (surrounding whitespace is ignored).
//!
//! # Usage
//!
//! ```sh
//! # Commit to a blob with the embedded Ethereum setup
//! kzg-bridge commit --blob blob.hex
//!
//! # Use a trusted setup file instead
//! kzg-bridge --trusted-setup trusted_setup.txt --precompute 8 cells --blob blob.hex --output cells.hex
//!
//! # Drop every odd cell and recover the rest
//! kzg-bridge recover --buffer cells.hex --indices 0,2,4,6
//! ```

use clap::{value_parser, Arg, ArgMatches, Command};
use kzg_bridge::{boundary, buffer, signal, CKzg, Code, Config, Session};
use std::{fs, process::ExitCode};
use tracing::{info, Level};

fn read_hex(matches: &ArgMatches, name: &str) -> String {
    let path = matches
        .get_one::<String>(name)
        .expect("Please provide a file");
    fs::read_to_string(path)
        .expect("Unable to read file")
        .trim()
        .to_string()
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches
        .get_one::<String>(name)
        .expect("Please provide a value")
}

/// Prints an owned-string result, failing on an error message.
fn report(output: String) -> ExitCode {
    let code = signal::classify(&output);
    println!("{output}");
    if code == Code::Ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Prints a verification result, failing unless it verified.
fn verdict(output: &str) -> ExitCode {
    println!("{output}");
    match signal::parse_verdict(output) {
        Ok(true) => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn main() -> ExitCode {
    // Parse arguments
    let blob = Arg::new("blob")
        .long("blob")
        .required(true)
        .help("File containing a hex-encoded blob");
    let commitment = Arg::new("commitment").long("commitment").required(true);
    let proof = Arg::new("proof").long("proof").required(true);
    let matches = Command::new("kzg-bridge")
        .about("compute and verify KZG commitments, proofs, and cells over hex strings")
        .arg(
            Arg::new("trusted-setup")
                .long("trusted-setup")
                .required(false)
                .help("Trusted setup in the textual format (defaults to the Ethereum setup)"),
        )
        .arg(
            Arg::new("precompute")
                .long("precompute")
                .default_value("0")
                .value_parser(value_parser!(u64)),
        )
        .arg(
            Arg::new("max-setup-bytes")
                .long("max-setup-bytes")
                .required(false)
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .default_value("info")
                .value_parser(value_parser!(Level)),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("commit")
                .about("commit to a blob")
                .arg(blob.clone()),
        )
        .subcommand(
            Command::new("prove")
                .about("compute the proof of a blob")
                .arg(blob.clone())
                .arg(commitment.clone().required(false)),
        )
        .subcommand(
            Command::new("evaluate")
                .about("compute the proof and value of a blob at a point")
                .arg(blob.clone())
                .arg(Arg::new("z").long("z").required(true)),
        )
        .subcommand(
            Command::new("verify-blob")
                .about("verify a blob proof")
                .arg(blob.clone())
                .arg(commitment.clone())
                .arg(proof.clone()),
        )
        .subcommand(
            Command::new("verify-point")
                .about("verify that a commitment evaluates to y at z")
                .arg(commitment.clone())
                .arg(Arg::new("z").long("z").required(true))
                .arg(Arg::new("y").long("y").required(true))
                .arg(proof.clone()),
        )
        .subcommand(
            Command::new("cells")
                .about("compute every cell and cell proof of a blob")
                .arg(blob)
                .arg(Arg::new("output").long("output").required(false)),
        )
        .subcommand(
            Command::new("recover")
                .about("recover every cell and cell proof from a subset of cells")
                .arg(
                    Arg::new("buffer")
                        .long("buffer")
                        .required(true)
                        .help("File containing the output of `cells`"),
                )
                .arg(
                    Arg::new("indices")
                        .long("indices")
                        .required(true)
                        .value_delimiter(',')
                        .value_parser(value_parser!(u64))
                        .help("Indices of the cells to keep"),
                ),
        )
        .subcommand(
            Command::new("verify-cell")
                .about("verify one cell against its commitment")
                .arg(commitment)
                .arg(
                    Arg::new("index")
                        .long("index")
                        .required(true)
                        .value_parser(value_parser!(u64)),
                )
                .arg(
                    Arg::new("cell")
                        .long("cell")
                        .required(true)
                        .help("File containing a hex-encoded cell"),
                )
                .arg(proof),
        )
        .get_matches();

    // Create logger
    let level = *matches.get_one::<Level>("log-level").expect("Please provide log level");
    tracing_subscriber::fmt().with_max_level(level).init();

    // Load trusted setup
    let mut cfg = Config::default();
    if let Some(max) = matches.get_one::<usize>("max-setup-bytes") {
        cfg.max_setup_bytes = *max;
    }
    let precompute = *matches
        .get_one::<u64>("precompute")
        .expect("Please provide precompute");
    let mut session = Session::<CKzg>::new(cfg);
    match matches.get_one::<String>("trusted-setup") {
        Some(path) => {
            let file = fs::File::open(path).expect("Unable to open trusted setup");
            let code = boundary::load_trusted_setup_from_reader(&mut session, file, precompute);
            if code != Code::Ok {
                eprintln!("unable to load trusted setup: {code:?}");
                return ExitCode::FAILURE;
            }
        }
        None => {
            let code = boundary::load_ethereum(&mut session, precompute);
            if code != 0 {
                let (code, detail) = signal::unpack(code);
                eprintln!("unable to load trusted setup: {code:?} ({detail:?})");
                return ExitCode::FAILURE;
            }
        }
    }
    info!(precompute, "loaded trusted setup");

    // Run operation
    match matches.subcommand() {
        Some(("commit", matches)) => {
            let blob = read_hex(matches, "blob");
            report(boundary::blob_to_kzg_commitment(&session, &blob))
        }
        Some(("prove", matches)) => {
            let blob = read_hex(matches, "blob");
            let commitment = match matches.get_one::<String>("commitment") {
                Some(commitment) => commitment.clone(),
                None => boundary::blob_to_kzg_commitment(&session, &blob),
            };
            report(boundary::compute_blob_kzg_proof(&session, &blob, &commitment))
        }
        Some(("evaluate", matches)) => {
            let blob = read_hex(matches, "blob");
            let output = boundary::compute_kzg_proof(&session, &blob, value(matches, "z"));
            if signal::classify(&output) != Code::Ok {
                return report(output);
            }
            let (proof, y) = output.split_at(output.len() - 64);
            println!("proof: {proof}");
            println!("y: {y}");
            ExitCode::SUCCESS
        }
        Some(("verify-blob", matches)) => {
            let blob = read_hex(matches, "blob");
            verdict(boundary::verify_blob_kzg_proof(
                &session,
                &blob,
                value(matches, "commitment"),
                value(matches, "proof"),
            ))
        }
        Some(("verify-point", matches)) => verdict(boundary::verify_kzg_proof(
            &session,
            value(matches, "commitment"),
            value(matches, "z"),
            value(matches, "y"),
            value(matches, "proof"),
        )),
        Some(("cells", matches)) => {
            let blob = read_hex(matches, "blob");
            let output = boundary::compute_cells_and_kzg_proofs(&session, &blob);
            match matches.get_one::<String>("output") {
                Some(path) if signal::classify(&output) == Code::Ok => {
                    fs::write(path, &output).expect("Unable to write output");
                    info!(path = %path, len = output.len(), "wrote cells and proofs");
                    ExitCode::SUCCESS
                }
                _ => report(output),
            }
        }
        Some(("recover", matches)) => {
            let full = read_hex(matches, "buffer");
            let decoded = buffer::decode(&full).expect("Buffer not well-formed");
            let indices: Vec<u64> = matches
                .get_many::<u64>("indices")
                .expect("Please provide indices")
                .copied()
                .collect();
            let cells: Vec<String> = indices
                .iter()
                .map(|&index| {
                    decoded
                        .cells()
                        .get(index as usize)
                        .map(|cell| cell.to_hex())
                        .unwrap_or_default()
                })
                .collect();
            let cells: Vec<&str> = cells.iter().map(String::as_str).collect();
            let output = boundary::recover_cells_and_kzg_proofs(&session, &indices, &cells);
            if signal::classify(&output) != Code::Ok {
                return report(output);
            }
            let expected = buffer::encode(&decoded).expect("Unable to encode buffer");
            let matched = output == expected;
            info!(kept = indices.len(), matched, "recovered cells and proofs");
            if matched {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Some(("verify-cell", matches)) => {
            let cell = read_hex(matches, "cell");
            let index = *matches.get_one::<u64>("index").expect("Please provide index");
            verdict(boundary::verify_cell_kzg_proof(
                &session,
                value(matches, "commitment"),
                index,
                &cell,
                value(matches, "proof"),
            ))
        }
        _ => unreachable!("subcommand required"),
    }
}
