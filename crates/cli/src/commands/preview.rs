// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schedule preview

use super::schedule::ScheduleArgs;
use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Local, Utc};
use clap::Args;
use tk_core::{config::to_chrono, Expander};

#[derive(Args)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub schedule: ScheduleArgs,
    /// Window start as RFC 3339 (defaults to now)
    #[arg(long)]
    pub from: Option<String>,
    /// Window length, e.g. 7days
    #[arg(long = "for", default_value = "7days")]
    pub span: String,
    /// Print at most this many occurrences
    #[arg(long)]
    pub limit: Option<usize>,
    /// Expand in UTC instead of the local timezone
    #[arg(long)]
    pub utc: bool,
}

pub fn handle(args: PreviewArgs) -> anyhow::Result<()> {
    let Some(schedule) = args.schedule.parse()? else {
        bail!("preview needs a schedule (--daily, --every, --at or --schedule)");
    };
    schedule.validate()?;

    let start = match &args.from {
        Some(from) => DateTime::parse_from_rfc3339(from)
            .with_context(|| format!("invalid --from {from:?}"))?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    let span = humantime::parse_duration(&args.span)
        .map_err(|e| anyhow!("invalid --for {:?}: {e}", args.span))?;

    let occurrences = if args.utc {
        Expander::utc().expand_from(&schedule, start, to_chrono(span), args.limit)
    } else {
        Expander::new(Local).expand_from(&schedule, start, to_chrono(span), args.limit)
    };

    for instant in occurrences {
        if args.utc {
            println!("{}", instant.to_rfc3339());
        } else {
            println!("{}", instant.with_timezone(&Local).to_rfc3339());
        }
    }
    Ok(())
}
