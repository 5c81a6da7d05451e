//! Revise CLI
//!
//! Command-line interface for the revision planner: register topics, record
//! reviews, and see what to study next.

mod config;

use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, SubsecRound, Utc};
use clap::{Parser, Subcommand};
use colored::Colorize;
use revise_core::{
    AtRiskConfig, BloomLevel, QueueConfig, TopicKey, TopicMasteryRecord, TopicStore,
};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::config::EnvConfig;

/// Revise - SM-2 revision planner
#[derive(Parser)]
#[command(name = "revise")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Spaced repetition planner for exam revision")]
#[command(long_about = "Revise schedules topic reviews with the SM-2 algorithm.\n\nRate each recall from 0 (blackout) to 5 (perfect) and revise picks the next review date.")]
struct Cli {
    /// Custom data directory (defaults to REVISE_DATA_DIR, then the platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Learner whose records are used
    #[arg(long, global = true, env = "REVISE_LEARNER", default_value = "default")]
    learner: String,

    /// Emit JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a topic (or reset its mastery and make it due now)
    AddTopic {
        /// Subject name
        subject: String,
        /// Topic name
        topic: String,
        /// Starting mastery score (0-100)
        #[arg(long, default_value = "0", allow_negative_numbers = true)]
        initial_mastery: i64,
        /// Bloom level (remember, understand, apply, analyse, evaluate, create)
        #[arg(long)]
        bloom: Option<BloomLevel>,
    },

    /// Record a review with a recall quality from 0 to 5
    Review {
        /// Subject name
        subject: String,
        /// Topic name
        topic: String,
        /// Recall quality (0 = blackout, 5 = perfect)
        #[arg(allow_negative_numbers = true)]
        quality: i64,
    },

    /// Show what is due now and coming up
    Queue {
        /// Override the due-now cap
        #[arg(long)]
        due_limit: Option<usize>,
        /// Override the upcoming cap
        #[arg(long)]
        upcoming_limit: Option<usize>,
        /// Override the upcoming window in days
        #[arg(long)]
        window_days: Option<u32>,
    },

    /// Show XP and mastery per subject
    Progress,

    /// Show what each quality would do to a topic
    Preview {
        /// Subject name
        subject: String,
        /// Topic name
        topic: String,
    },

    /// List topics with low mastery across all learners
    AtRisk {
        /// Mean mastery must be below this
        #[arg(long, default_value = "60")]
        threshold: u8,
        /// Minimum number of learners studying the topic
        #[arg(long, default_value = "2")]
        min_learners: usize,
        /// Maximum number of topics listed
        #[arg(long, default_value = "10")]
        limit: usize,
    },
}

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays clean for --json
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::WARN.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let env = EnvConfig::from_env();
    let db_path = env.database_path(cli.data_dir.clone());
    let store = TopicStore::new(db_path).context("Failed to open the revise database")?;

    // One clock reading per invocation, at the storage precision
    let now = Utc::now().trunc_subsecs(6);

    let app = App {
        store,
        learner: cli.learner,
        json: cli.json,
        now,
    };

    match cli.command {
        Commands::AddTopic {
            subject,
            topic,
            initial_mastery,
            bloom,
        } => app.run_add_topic(subject, topic, initial_mastery, bloom),
        Commands::Review {
            subject,
            topic,
            quality,
        } => app.run_review(subject, topic, quality),
        Commands::Queue {
            due_limit,
            upcoming_limit,
            window_days,
        } => {
            let queue = QueueConfig {
                due_limit: due_limit.unwrap_or(env.queue.due_limit),
                upcoming_limit: upcoming_limit.unwrap_or(env.queue.upcoming_limit),
                upcoming_window_days: window_days.unwrap_or(env.queue.upcoming_window_days),
            };
            app.run_queue(&queue)
        }
        Commands::Progress => app.run_progress(),
        Commands::Preview { subject, topic } => app.run_preview(subject, topic),
        Commands::AtRisk {
            threshold,
            min_learners,
            limit,
        } => app.run_at_risk(&AtRiskConfig {
            mastery_threshold: threshold,
            min_learners,
            limit,
        }),
    }
}

/// Everything a subcommand needs
struct App {
    store: TopicStore,
    learner: String,
    json: bool,
    now: DateTime<Utc>,
}

impl App {
    fn key(&self, subject: String, topic: String) -> anyhow::Result<TopicKey> {
        Ok(TopicKey::new(self.learner.as_str(), subject, topic)?)
    }

    /// Run add-topic command
    fn run_add_topic(
        &self,
        subject: String,
        topic: String,
        initial_mastery: i64,
        bloom: Option<BloomLevel>,
    ) -> anyhow::Result<()> {
        let key = self.key(subject, topic)?;
        let record = self
            .store
            .register_topic(&key, initial_mastery, bloom, self.now)
            .with_context(|| format!("Failed to register {}", key))?;

        if self.json {
            return print_json(&record);
        }

        println!(
            "{} {} / {}",
            "Registered".green().bold(),
            record.subject,
            record.topic
        );
        println!("  {}: {}", "Mastery".white().bold(), record.mastery_score);
        println!("  {}: {}", "Bloom level".white().bold(), record.bloom_level);
        println!("  {}: {}", "Due".white().bold(), format_date(record.next_review));
        Ok(())
    }

    /// Run review command
    fn run_review(&self, subject: String, topic: String, quality: i64) -> anyhow::Result<()> {
        let key = self.key(subject, topic)?;
        let before = self.store.get(&key)?;
        let record = self
            .store
            .record_review(&key, quality, self.now)
            .with_context(|| format!("Failed to record review for {}", key))?;

        if self.json {
            return print_json(&record);
        }

        let previous_mastery = before.as_ref().map_or(0, |r| r.mastery_score);
        let delta = i16::from(record.mastery_score) - i16::from(previous_mastery);
        let delta_text = match delta {
            d if d > 0 => format!("+{}", d).green(),
            d if d < 0 => d.to_string().red(),
            _ => "±0".dimmed(),
        };

        println!(
            "{} {} / {}",
            "Reviewed".cyan().bold(),
            record.subject,
            record.topic
        );
        println!(
            "  {}: {} ({})",
            "Mastery".white().bold(),
            record.mastery_score,
            delta_text
        );
        println!("  {}: {}", "XP".white().bold(), record.xp);
        println!(
            "  {}: {} day{}",
            "Interval".white().bold(),
            record.interval,
            if record.interval == 1 { "" } else { "s" }
        );
        println!("  {}: {:.2}", "Ease factor".white().bold(), record.ease_factor);
        println!("  {}: {}", "Next review".white().bold(), format_date(record.next_review));
        Ok(())
    }

    /// Run queue command
    fn run_queue(&self, config: &QueueConfig) -> anyhow::Result<()> {
        let queue = self.store.review_queue(&self.learner, self.now, config)?;

        if self.json {
            return print_json(&queue);
        }

        println!("{}", "=== Review Queue ===".cyan().bold());
        println!();
        println!(
            "{}: {}",
            "Readiness".white().bold(),
            readiness_label(queue.readiness, queue.total_topics)
        );
        println!("{}: {}", "Topics".white().bold(), queue.total_topics);

        println!();
        println!("{}", format!("Due now ({})", queue.due_now.len()).yellow().bold());
        if queue.due_now.is_empty() {
            println!("  {}", "Nothing due.".dimmed());
        }
        for record in &queue.due_now {
            print_queue_entry(record);
        }

        println!();
        println!(
            "{}",
            format!(
                "Upcoming, next {} days ({})",
                config.upcoming_window_days,
                queue.upcoming.len()
            )
            .blue()
            .bold()
        );
        if queue.upcoming.is_empty() {
            println!("  {}", "Nothing scheduled.".dimmed());
        }
        for record in &queue.upcoming {
            print_queue_entry(record);
        }

        if !queue.subjects.is_empty() {
            println!();
            println!("{}", "Subjects".magenta().bold());
            for (subject, summary) in &queue.subjects {
                println!(
                    "  {:20} {:>3} topics  {:>3}% mastery  {:>6} XP",
                    subject, summary.topics, summary.average_mastery, summary.total_xp
                );
            }
        }

        Ok(())
    }

    /// Run progress command
    fn run_progress(&self) -> anyhow::Result<()> {
        let progress = self.store.progress(&self.learner)?;

        if self.json {
            return print_json(&progress);
        }

        println!("{}", "=== Progress ===".cyan().bold());
        println!();
        println!("{}: {}", "Total XP".white().bold(), progress.total_xp);
        println!("{}: {}%", "Average mastery".white().bold(), progress.average_mastery);
        println!("{}: {}", "Topics".white().bold(), progress.total_topics);

        if progress.subjects.is_empty() {
            println!();
            println!("{}", "No topics yet. Add one with `revise add-topic`.".dimmed());
            return Ok(());
        }

        for (subject, detail) in &progress.subjects {
            println!();
            println!(
                "{} ({}% mastery)",
                subject.yellow().bold(),
                detail.average_mastery
            );
            for snapshot in &detail.topics {
                println!(
                    "  {:28} [{}] {:>3}%  {:>5} XP  {:10}  due {}",
                    snapshot.topic,
                    mastery_bar(snapshot.mastery),
                    snapshot.mastery,
                    snapshot.xp,
                    snapshot.bloom_level.as_str(),
                    format_date(snapshot.next_review)
                );
            }
        }

        Ok(())
    }

    /// Run preview command
    fn run_preview(&self, subject: String, topic: String) -> anyhow::Result<()> {
        let key = self.key(subject, topic)?;
        let preview = self.store.preview(&key, self.now)?;

        if self.json {
            return print_json(&preview);
        }

        println!(
            "{} {} / {}",
            "Preview".cyan().bold(),
            key.subject(),
            key.topic()
        );
        println!();
        for outcome in &preview.outcomes {
            let label = format!("{} {:8}", outcome.quality, outcome.quality.label());
            let label = if outcome.quality.is_pass() {
                label.green()
            } else {
                label.red()
            };
            println!(
                "  {}  interval {:>4}d  ease {:.2}  mastery {:>3}  due {}",
                label,
                outcome.interval,
                outcome.ease_factor,
                outcome.mastery_score,
                format_date(outcome.next_review)
            );
        }
        Ok(())
    }

    /// Run at-risk command
    fn run_at_risk(&self, config: &AtRiskConfig) -> anyhow::Result<()> {
        let topics = self.store.at_risk_topics(config)?;

        if self.json {
            return print_json(&topics);
        }

        println!("{}", "=== Topics Needing Help ===".red().bold());
        println!();
        if topics.is_empty() {
            println!("{}", "No topics below the threshold.".dimmed());
            return Ok(());
        }
        for entry in &topics {
            println!(
                "  {:20} {:28} {:>5.1}% mastery  {:>3} learners",
                entry.subject, entry.topic, entry.average_mastery, entry.learners
            );
        }
        Ok(())
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_queue_entry(record: &TopicMasteryRecord) {
    println!(
        "  {:20} {:28} {:>3}%  {}",
        record.subject,
        record.topic,
        record.mastery_score,
        format_date(record.next_review).dimmed()
    );
}

fn format_date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn mastery_bar(mastery: u8) -> String {
    let width = 20usize;
    let filled = usize::from(mastery) * width / 100;
    format!("{}{}", "#".repeat(filled), "-".repeat(width - filled))
}

fn readiness_label(readiness: u8, total_topics: usize) -> colored::ColoredString {
    let text = format!("{}%", readiness);
    if total_topics == 0 {
        text.white()
    } else if readiness >= 70 {
        text.green().bold()
    } else if readiness >= 40 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}
