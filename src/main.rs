use {
    anyhow::{anyhow, Context, Result},
    argh::FromArgs,
    glob::glob,
    icao_9303_proof::{
        certificate::{self, CertificateInfo, PublicKeyInfo},
        passport, Leniency, PassportData, VerifierConfig,
    },
    serde_json::{json, Value},
    std::{
        fs,
        path::PathBuf,
        process::ExitCode,
        sync::atomic::{AtomicUsize, Ordering},
        thread,
    },
    tracing::{info, warn},
    tracing_subscriber::EnvFilter,
};

/// Passive authentication of eMRTD reads.
#[derive(FromArgs)]
struct Args {
    /// certificates that do not decode: allow, warn or strict
    #[argh(option, default = "Leniency::Warn")]
    key_fallback: Leniency,

    /// PKCS#1 DigestInfo without NULL parameters: allow, warn or strict
    #[argh(option, default = "Leniency::Warn")]
    digest_info_parameters: Leniency,

    /// unknown signature algorithm names: allow, warn or strict
    #[argh(option, default = "Leniency::Warn")]
    scheme_detection: Leniency,

    /// reject every deviation, overrides the other options
    #[argh(switch)]
    strict: bool,

    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Verify(Verify),
    ExtractKeys(ExtractKeys),
}

/// Verify a passport JSON export.
#[derive(FromArgs)]
#[argh(subcommand, name = "verify")]
struct Verify {
    /// passport JSON file
    #[argh(positional)]
    passport: PathBuf,
}

/// Extract the public keys of certificates.
#[derive(FromArgs)]
#[argh(subcommand, name = "extract-keys")]
struct ExtractKeys {
    /// glob patterns for PEM, base64 or DER certificates
    #[argh(positional)]
    patterns: Vec<String>,

    /// number of worker threads
    #[argh(option, default = "4")]
    workers: usize,
}

impl Args {
    const fn config(&self) -> VerifierConfig {
        if self.strict {
            return VerifierConfig::strict();
        }
        VerifierConfig {
            key_fallback:           self.key_fallback,
            digest_info_parameters: self.digest_info_parameters,
            scheme_detection:       self.scheme_detection,
        }
    }
}

fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Args = argh::from_env();
    let config = args.config();
    match &args.command {
        Command::Verify(verify) => run_verify(verify, &config),
        Command::ExtractKeys(extract) => run_extract_keys(extract, &config),
    }
}

fn run_verify(args: &Verify, config: &VerifierConfig) -> Result<ExitCode> {
    let json = fs::read_to_string(&args.passport)
        .with_context(|| format!("reading {}", args.passport.display()))?;
    let data = PassportData::from_json(&json)?;
    let report = passport::verify(&data, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(if report.result.is_valid {
        info!("passport is valid");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_extract_keys(args: &ExtractKeys, config: &VerifierConfig) -> Result<ExitCode> {
    let mut paths = Vec::new();
    for pattern in &args.patterns {
        for entry in glob(pattern)? {
            paths.push(entry?);
        }
    }
    if paths.is_empty() {
        return Err(anyhow!("no certificates match {:?}", args.patterns));
    }
    info!(count = paths.len(), workers = args.workers, "extracting keys");

    let next = AtomicUsize::new(0);
    let failures = AtomicUsize::new(0);
    thread::scope(|scope| {
        for _ in 0..args.workers.clamp(1, paths.len()) {
            scope.spawn(|| {
                while let Some(path) = paths.get(next.fetch_add(1, Ordering::Relaxed)) {
                    let line = fs::read(path)
                        .map_err(anyhow::Error::from)
                        .and_then(|bytes| Ok(certificate::parse(&bytes, config)?));
                    match line {
                        Ok(info) => println!("{}", summary(path, &info)),
                        Err(error) => {
                            warn!(path = %path.display(), %error, "no key extracted");
                            failures.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            });
        }
    });

    let failures = failures.into_inner();
    info!(failures, "done");
    Ok(if failures == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn summary(path: &std::path::Path, info: &CertificateInfo) -> Value {
    let key = match &info.public_key {
        PublicKeyInfo::Rsa { modulus, exponent } => json!({
            "type": "RSA",
            "bits": modulus.bits(),
            "modulus": modulus.to_str_radix(16),
            "exponent": exponent.to_string(),
        }),
        PublicKeyInfo::Ec { curve, point } => json!({
            "type": "EC",
            "bits": curve.prime.bits(),
            "curve": curve.name,
            "x": point.x.to_str_radix(16),
            "y": point.y.to_str_radix(16),
        }),
    };
    json!({
        "path": path.display().to_string(),
        "key": key,
        "signatureAlgorithm": info.signature_algorithm.as_ref().map(ToString::to_string),
        "extraction": format!("{:?}", info.extraction),
    })
}
