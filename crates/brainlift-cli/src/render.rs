//! Human-readable output

use colored::Colorize;

use brainlift_evidence::{BrainliftDocument, EvidenceProfile, ExpertMention, RankedExpert};
use brainlift_oracle::{RankingOrigin, RefreshOutcome};
use brainlift_storage::StoredExpert;

fn score_label(score: u8) -> colored::ColoredString {
    let text = format!("{score:>2}");
    match score {
        8..=10 => text.green().bold(),
        6..=7 => text.green(),
        4..=5 => text.yellow(),
        _ => text.dimmed(),
    }
}

fn handle_label(handle: Option<&str>) -> String {
    handle.map(|h| format!(" {}", h.cyan())).unwrap_or_default()
}

pub fn print_roster(mentions: &[ExpertMention]) {
    if mentions.is_empty() {
        eprintln!("{} no expert roster found", "info:".yellow().bold());
        return;
    }
    for mention in mentions {
        println!("{}{}", mention.name.bold(), handle_label(mention.handle.as_deref()));
        if !mention.focus_description.is_empty() {
            println!("    {}", mention.focus_description.dimmed());
        }
    }
}

pub fn print_profiles(document: &BrainliftDocument, scored: &[(&EvidenceProfile, u8)]) {
    println!("{} {}", "Brainlift".green().bold(), document.title.bold());
    if scored.is_empty() {
        eprintln!("{} no experts to profile", "info:".yellow().bold());
        return;
    }
    for (profile, score) in scored {
        println!(
            "  {}  {}{}  facts={} reading={} score5={}{}",
            score_label(*score),
            profile.canonical_name.bold(),
            handle_label(profile.twitter_handle.as_deref()),
            profile.fact_citations,
            profile.reading_list_mentions,
            profile.score5_fact_citations,
            if profile.is_in_dok1_section {
                " listed".blue().to_string()
            } else {
                String::new()
            }
        );
    }
}

fn print_expert(id: u64, expert: &RankedExpert) {
    let id = format!("#{id:<4} ");
    let follow = if expert.is_following {
        "★".yellow().to_string()
    } else {
        " ".to_string()
    };
    println!(
        "  {}{} {} {}{}  {} {}",
        id.dimmed(),
        score_label(expert.rank_score),
        follow,
        expert.name.bold(),
        handle_label(expert.twitter_handle.as_deref()),
        format!("[{}]", expert.source).dimmed(),
        expert.rationale
    );
}

pub fn print_outcome(document: &BrainliftDocument, outcome: &RefreshOutcome) {
    let origin = match &outcome.origin {
        RankingOrigin::Empty => "no experts found".dimmed().to_string(),
        RankingOrigin::Oracle { dropped: 0 } => "ranked by oracle".green().to_string(),
        RankingOrigin::Oracle { dropped } => {
            format!("ranked by oracle ({dropped} entries dropped)").yellow().to_string()
        }
        RankingOrigin::Fallback { reason } => {
            format!("fallback scores: {reason}").yellow().to_string()
        }
    };
    println!(
        "{} {} ({})",
        "Brainlift".green().bold(),
        document.title.bold(),
        origin
    );
    for row in &outcome.stored {
        print_expert(row.id, &row.expert);
    }
}

pub fn print_stored(brainlift_id: i64, rows: &[StoredExpert]) {
    if rows.is_empty() {
        eprintln!(
            "{} no experts stored for brainlift {}",
            "info:".yellow().bold(),
            brainlift_id
        );
        return;
    }
    for row in rows {
        print_expert(row.id, &row.expert);
    }
}
