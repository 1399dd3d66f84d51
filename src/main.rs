use std::net::SocketAddr;

use cesto::config::Config;
use cesto::relay::{self, RelayState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load();

    // Set up logging to the systemd user journal (`journalctl --user -t cesto -f`).
    // Wrapper filters: cesto crate at info/debug (per config), everything else at warn.
    {
        struct FilteredJournal {
            inner: systemd_journal_logger::JournalLog,
        }

        impl log::Log for FilteredJournal {
            fn enabled(&self, metadata: &log::Metadata) -> bool {
                if metadata.target().starts_with("cesto") {
                    let max = if cesto::debug_logging() {
                        log::LevelFilter::Debug
                    } else {
                        log::LevelFilter::Info
                    };
                    metadata.level() <= max
                } else {
                    metadata.level() <= log::LevelFilter::Warn
                }
            }
            fn log(&self, record: &log::Record) {
                if self.enabled(record.metadata()) {
                    self.inner.log(record);
                }
            }
            fn flush(&self) {
                self.inner.flush();
            }
        }

        let journal = systemd_journal_logger::JournalLog::new()?
            .with_syslog_identifier("cesto".to_string());

        cesto::set_debug_logging(config.debug_logging);

        log::set_boxed_logger(Box::new(FilteredJournal { inner: journal }))?;
        // Global max must be Debug so cesto debug logs can pass through when toggled.
        log::set_max_level(log::LevelFilter::Debug);
    }

    // Parse CLI flags
    let addr: SocketAddr = {
        let args: Vec<String> = std::env::args().collect();
        let given = args
            .iter()
            .position(|a| a == "--addr")
            .and_then(|i| args.get(i + 1));
        match given {
            Some(raw) => raw.parse()?,
            None => SocketAddr::from(([0, 0, 0, 0], 8787)),
        }
    };

    config.resolve_secrets().await;

    let state = RelayState {
        upstream: config.search.endpoint.clone(),
        api_key: config.search_api_key(),
        http: reqwest::Client::builder().build()?,
    };

    relay::serve(addr, state).await?;
    Ok(())
}
