//! Render a URL through the blog pipeline.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use folio_blog::InMemoryContent;
use folio_core::{RenderMode, RenderRequest, SsrConfig};
use folio_server::{Dispatch, SsrResponse};
use futures::StreamExt;
use serde::Serialize;

use super::RenderArgs;
use crate::context::Context;
use crate::output::{format_bytes, status_badge};

#[derive(Serialize)]
struct RenderReport {
    url: String,
    status: u16,
    headers: BTreeMap<String, String>,
    body: String,
    elapsed_ms: u64,
    rendered_at: String,
}

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let config = effective_config(&args, ctx);
    let middleware = folio_blog::middleware(config, Arc::new(InMemoryContent::sample()));
    let request = build_request(&args);

    let spinner = ctx.output.spinner(&format!("Rendering {}", args.url));
    let started = Instant::now();
    let dispatch = middleware.dispatch(request).await;
    spinner.finish_and_clear();

    let response = match dispatch {
        Dispatch::Bypass(request) => {
            ctx.output.warn(&format!(
                "{} is under the API prefix {} and is not server rendered",
                request.path(),
                middleware.config().api_prefix
            ));
            return Ok(());
        }
        Dispatch::Response(response) => response,
    };
    ctx.output.debug(&format!(
        "Status committed after {} ms",
        started.elapsed().as_millis()
    ));

    if ctx.output.is_json() {
        let report = RenderReport {
            url: args.url.clone(),
            status: response.status.as_u16(),
            headers: header_map(&response),
            body: response.into_string().await,
            elapsed_ms: started.elapsed().as_millis() as u64,
            rendered_at: chrono::Utc::now().to_rfc3339(),
        };
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output
        .header(&format!("{} {}", status_badge(response.status), args.url));
    for (name, value) in header_map(&response) {
        ctx.output.kv(&name, &value);
    }
    if args.head_only {
        return Ok(());
    }

    let mut chunks = response.body.into_stream();
    let mut bytes = 0u64;
    while let Some(chunk) = chunks.next().await {
        bytes += chunk.len() as u64;
        ctx.output.body(&chunk)?;
    }
    ctx.output.success(&format!(
        "{} in {} ms",
        format_bytes(bytes),
        started.elapsed().as_millis()
    ));
    Ok(())
}

fn effective_config(args: &RenderArgs, ctx: &Context) -> SsrConfig {
    let mut config = ctx.config.clone();
    if args.dev {
        config = config.with_mode(RenderMode::Development);
    }
    if args.blocking {
        config = config.with_streaming(false);
    }
    config.template.source_path = ctx.resolve_path(&config.template.source_path);
    config.template.dist_path = ctx.resolve_path(&config.template.dist_path);
    config
}

fn build_request(args: &RenderArgs) -> RenderRequest {
    let request = args
        .headers
        .iter()
        .fold(RenderRequest::new(&args.url), |request, (name, value)| {
            request.with_header(name, value)
        });
    args.cookies
        .iter()
        .fold(request, |request, (name, value)| request.with_cookie(name, value))
}

fn header_map(response: &SsrResponse) -> BTreeMap<String, String> {
    response
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                value.to_str().unwrap_or("<binary>").to_string(),
            )
        })
        .collect()
}
