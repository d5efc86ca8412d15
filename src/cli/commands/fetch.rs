//! Fetch command - resolve one request the way an intercepted page load would

use super::open_registered;
use crate::cli::args::FetchArgs;
use crate::config::Config;
use crate::error::{CacheError, CacheResult};
use crate::http::RequestDescriptor;
use crate::worker::{Event, EventOutcome, ResolutionSource};
use console::style;
use std::io::{self, Write};

/// Execute the fetch command
pub async fn execute(args: FetchArgs, config: &Config) -> CacheResult<()> {
    let (manager, _) = open_registered(config).await?;

    let url = manager.scope().resolve(&args.url)?;
    let mut request = RequestDescriptor::new(&args.method, url);
    for (name, value) in args.headers {
        request = request.with_header(&name, value);
    }
    if let Some(data) = args.data {
        request = request.with_body(data.into_bytes());
    }

    let outcome = manager.dispatch(Event::Fetch(request)).wait().await;
    // Let the opportunistic cache write land before the process exits
    manager.flush_pending().await;

    let mut resolution = match outcome? {
        EventOutcome::Response(resolution) => resolution,
        other => {
            return Err(CacheError::Internal(format!(
                "unexpected fetch outcome: {:?}",
                other
            )))
        }
    };

    let source = match resolution.source {
        ResolutionSource::Cache => style(resolution.source.to_string()).green(),
        ResolutionSource::Network => style(resolution.source.to_string()).cyan(),
        ResolutionSource::Fallback => style(resolution.source.to_string()).yellow(),
    };
    let response = &mut resolution.response;

    eprintln!(
        "{} {} via {}",
        style(response.status()).bold(),
        response.kind(),
        source
    );
    if let Some(content_type) = response.headers().get("content-type") {
        eprintln!("  {} {}", style("content-type:").dim(), content_type);
    }

    if args.body {
        let body = response.bytes()?;
        io::stdout()
            .write_all(&body)
            .map_err(|e| CacheError::io("writing response body", e))?;
    }

    Ok(())
}
