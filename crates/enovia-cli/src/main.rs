//! `enovia` — download 3DEXPERIENCE document files from the command line.
//!
//! Connection settings come from flags or, when a flag is absent, from the
//! same environment variables the SDK reads (`BASE_URL`, `SERVICE_NAME`,
//! `SERVICE_SECRET`, `ENOVIA_USER`, `SSL_VERIFY`). Client options start from
//! [`ClientOptions::from_env`] and the corresponding flags override them.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use enovia_models::{DocumentId, FileId};
use enovia_sdk::{ClientOptions, DownloadRequest, EnoviaClient, ServiceCredential};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "enovia")]
#[command(about = "3DEXPERIENCE batch-service client")]
#[command(author, version, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Debug)]
pub struct ConnectionArgs {
    /// Platform base URL (without /3dspace)
    #[arg(long, env = "BASE_URL", global = true)]
    pub base_url: Option<String>,

    /// Batch service name
    #[arg(long, env = "SERVICE_NAME", global = true)]
    pub service_name: Option<String>,

    /// Batch service secret
    #[arg(long, env = "SERVICE_SECRET", hide_env_values = true, global = true)]
    pub service_secret: Option<String>,

    /// User the batch service acts for
    #[arg(long, env = "ENOVIA_USER", global = true)]
    pub user: Option<String>,

    /// "false" disables TLS certificate verification
    #[arg(long, env = "SSL_VERIFY", global = true)]
    pub ssl_verify: Option<String>,

    /// Per-request timeout in seconds, 0 for none [default: ENOVIA_TIMEOUT_SECS or 60]
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Do not re-authenticate when the session expires [default: ENOVIA_REAUTHENTICATE]
    #[arg(long, global = true)]
    pub no_reauthenticate: bool,

    /// Downloads in flight at once for `batch` [default: ENOVIA_MAX_CONCURRENT_DOWNLOADS or 4]
    #[arg(long, global = true)]
    pub max_concurrent: Option<usize>,
}

impl ConnectionArgs {
    fn credential(&self) -> Result<ServiceCredential, enovia_sdk::EnoviaError> {
        ServiceCredential::load(
            self.base_url.clone(),
            self.service_name.clone(),
            self.service_secret.clone(),
            self.user.clone(),
            self.ssl_verify.as_deref(),
        )
    }

    fn options(&self) -> ClientOptions {
        self.override_options(ClientOptions::from_env())
    }

    /// Apply the flags that were given on top of `base`.
    fn override_options(&self, mut base: ClientOptions) -> ClientOptions {
        if let Some(secs) = self.timeout_secs {
            base.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if self.no_reauthenticate {
            base.reauthenticate_on_expiry = false;
        }
        if let Some(n) = self.max_concurrent {
            base.max_concurrent_downloads = n.max(1);
        }
        base
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Authenticate and print the security context
    Whoami,
    /// Download one document file
    Download {
        /// Document physical ID
        document: DocumentId,
        /// File ID within the document
        file: FileId,
        /// Destination path (overwritten)
        output: PathBuf,
    },
    /// Download every file listed in a JSON manifest
    ///
    /// The manifest is an array of {"document", "file", "destination"} objects.
    Batch {
        /// Path to the manifest
        manifest: PathBuf,
    },
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let credential = cli
        .connection
        .credential()
        .context("incomplete connection settings")?;
    let client = EnoviaClient::connect(credential, cli.connection.options()).await?;

    match cli.command {
        Commands::Whoami => {
            println!("{}", client.security_context().await);
        }
        Commands::Download {
            document,
            file,
            output,
        } => {
            let report = client
                .download_document_file(&document, &file, &output)
                .await?;
            println!("{} bytes → {}", report.bytes, report.destination.display());
        }
        Commands::Batch { manifest } => {
            let raw = tokio::fs::read(&manifest)
                .await
                .with_context(|| format!("reading manifest {}", manifest.display()))?;
            let requests: Vec<DownloadRequest> = serde_json::from_slice(&raw)
                .with_context(|| format!("parsing manifest {}", manifest.display()))?;

            let results = client.download_many(&requests).await;
            let mut failed = 0;
            for (request, result) in requests.iter().zip(results) {
                match result {
                    Ok(report) => println!(
                        "{}/{}: {} bytes → {}",
                        report.document,
                        report.file,
                        report.bytes,
                        report.destination.display()
                    ),
                    Err(e) => {
                        failed += 1;
                        error!(
                            document = %request.document,
                            file = %request.file,
                            error = %e,
                            "download failed"
                        );
                    }
                }
            }
            if failed > 0 {
                bail!("{failed} of {} downloads failed", requests.len());
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging (controlled via RUST_LOG env var).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    run(Cli::parse()).await
}

#[cfg(test)]
mod tests {
    use mock_3dx::{MockConfig, Route};

    use super::*;

    fn connection_flags(base_url: &str) -> Vec<String> {
        [
            "enovia",
            "--base-url",
            base_url,
            "--service-name",
            "svc",
            "--service-secret",
            "sec",
            "--user",
            "alice",
        ]
        .iter()
        .map(ToString::to_string)
        .collect()
    }

    #[test]
    fn parses_download() {
        let mut args = connection_flags("https://example.test");
        args.extend(["download", "doc1", "file1", "/tmp/out.bin"].map(String::from));
        let cli = Cli::try_parse_from(args).unwrap();
        match cli.command {
            Commands::Download { document, file, output } => {
                assert_eq!(document.as_str(), "doc1");
                assert_eq!(file.as_str(), "file1");
                assert_eq!(output, PathBuf::from("/tmp/out.bin"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.connection.service_name.as_deref(), Some("svc"));
    }

    #[test]
    fn rejects_invalid_document_id() {
        let mut args = connection_flags("https://example.test");
        args.extend(["download", "doc/1", "file1", "out"].map(String::from));
        assert!(Cli::try_parse_from(args).is_err());
    }

    #[test]
    fn options_from_flags() {
        let mut args = connection_flags("https://example.test");
        args.extend(["--timeout-secs", "0", "--no-reauthenticate", "whoami"].map(String::from));
        let cli = Cli::try_parse_from(args).unwrap();
        let options = cli.connection.override_options(ClientOptions::default());
        assert_eq!(options.request_timeout, None);
        assert!(!options.reauthenticate_on_expiry);
        assert!(cli.connection.credential().unwrap().tls_verify());
    }

    #[test]
    fn environment_options_survive_without_flags() {
        let mut args = connection_flags("https://example.test");
        args.push("whoami".into());
        let cli = Cli::try_parse_from(args).unwrap();
        let from_env = ClientOptions::from_lookup(|key| match key {
            "ENOVIA_REAUTHENTICATE" => Some("false".into()),
            "ENOVIA_MAX_CONCURRENT_DOWNLOADS" => Some("9".into()),
            _ => None,
        });

        let options = cli.connection.override_options(from_env);

        assert!(!options.reauthenticate_on_expiry);
        assert_eq!(options.max_concurrent_downloads, 9);
        assert_eq!(options.request_timeout, Some(Duration::from_secs(60)));
    }

    #[test]
    fn flags_override_environment_options() {
        let mut args = connection_flags("https://example.test");
        args.extend(["--max-concurrent", "2", "--timeout-secs", "5", "whoami"].map(String::from));
        let cli = Cli::try_parse_from(args).unwrap();
        let from_env = ClientOptions::from_lookup(|key| {
            (key == "ENOVIA_MAX_CONCURRENT_DOWNLOADS").then(|| "9".to_string())
        });

        let options = cli.connection.override_options(from_env);

        assert_eq!(options.max_concurrent_downloads, 2);
        assert_eq!(options.request_timeout, Some(Duration::from_secs(5)));
        assert!(options.reauthenticate_on_expiry);
    }

    #[test]
    fn reauthenticate_variable_reaches_the_client() {
        std::env::set_var("ENOVIA_REAUTHENTICATE", "FALSE");
        let mut args = connection_flags("https://example.test");
        args.push("whoami".into());
        let cli = Cli::try_parse_from(args).unwrap();
        let options = cli.connection.options();
        std::env::remove_var("ENOVIA_REAUTHENTICATE");

        assert!(!options.reauthenticate_on_expiry);
    }

    #[tokio::test]
    async fn download_command_writes_file() {
        let running = mock_3dx::spawn(MockConfig::default().with_file("doc1", "file1", vec![1, 2]))
            .await
            .expect("spawn mock");
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.bin");

        let mut args = connection_flags(&running.base_url);
        args.extend(["download", "doc1", "file1"].map(String::from));
        args.push(out.display().to_string());
        run(Cli::try_parse_from(args).unwrap()).await.expect("run");

        assert_eq!(std::fs::read(&out).unwrap(), [1, 2]);
    }

    #[tokio::test]
    async fn batch_reports_partial_failure() {
        let running = mock_3dx::spawn(MockConfig::default().with_file("doc1", "a", vec![1]))
            .await
            .expect("spawn mock");
        let dir = tempfile::tempdir().unwrap();
        let manifest = dir.path().join("manifest.json");
        let body = serde_json::json!([
            {"document": "doc1", "file": "a", "destination": dir.path().join("a")},
            {"document": "doc1", "file": "zzz", "destination": dir.path().join("zzz")},
        ]);
        std::fs::write(&manifest, body.to_string()).unwrap();

        let mut args = connection_flags(&running.base_url);
        args.extend(["batch".to_string(), manifest.display().to_string()]);
        let err = run(Cli::try_parse_from(args).unwrap()).await.unwrap_err();

        assert_eq!(err.to_string(), "1 of 2 downloads failed");
        assert_eq!(std::fs::read(dir.path().join("a")).unwrap(), [1]);
        assert_eq!(running.mock.count(Route::Tgt), 1);
    }
}
