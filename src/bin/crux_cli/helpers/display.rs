// ABOUTME: Output formatting helpers for crux-cli
// ABOUTME: Pretty JSON for responses and short human summaries for plans and stats
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Crux Coach

use crux_coach::outdoor::OutdoorStats;
use crux_core::errors::{AppError, AppResult};
use crux_core::models::WeekPlan;
use serde::Serialize;

/// Print any response as pretty JSON on stdout
pub fn print_json<T: Serialize>(value: &T) -> AppResult<()> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| AppError::internal(format!("Failed to render response: {e}")))?;
    println!("{text}");
    Ok(())
}

/// One line per planned day, on stderr so stdout stays machine-readable
pub fn display_week_summary(plan: &WeekPlan) {
    eprintln!("{}", "=".repeat(60));
    for day in plan.days() {
        let sessions: Vec<String> = day
            .sessions
            .iter()
            .map(|s| format!("{}:{} ({})", s.slot.as_str(), s.session_id, s.location.as_str()))
            .collect();
        let line = if sessions.is_empty() {
            "rest".to_owned()
        } else {
            sessions.join(", ")
        };
        eprintln!("{} {:<3} {line}", day.date, day.weekday.as_str());
    }
    eprintln!("{}", "=".repeat(60));
}

/// Outdoor statistics as a short table
pub fn display_outdoor_stats(stats: &OutdoorStats) {
    println!("Sessions: {}", stats.total_sessions);
    println!("Routes:   {}", stats.total_routes);
    println!(
        "Onsight {:.1}%  Flash {:.1}%  Sent {:.1}%",
        stats.onsight_pct, stats.flash_pct, stats.sent_pct
    );
    if let Some(top) = &stats.top_grade_sent {
        println!("Top grade sent: {top}");
    }
    if !stats.grade_histogram.is_empty() {
        println!("Grades:");
        for (grade, count) in &stats.grade_histogram {
            println!("  {grade:<5} {count}");
        }
    }
}
