//! # CLI Module
//!
//! Command-line interface for the drive deduplication engine.
//!
//! ## Usage
//! ```bash
//! # Report duplicate files and identical folders, change nothing
//! drive-dedup scan /mnt/archive
//!
//! # JSON output
//! drive-dedup scan /mnt/archive --output json
//!
//! # Deduplicate in place, prompting for every group and pair
//! drive-dedup organize /mnt/archive
//!
//! # Unattended run
//! drive-dedup organize /mnt/archive --files keep-first --folders merge
//!
//! # Move everything from one drive into another
//! drive-dedup merge /mnt/new-drive /mnt/old-drive
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use console::{style, Term};
use drive_dedup::core::actions::{BatchPolicy, FilePolicy, FolderPolicy};
use drive_dedup::core::duplicates::DuplicateGroup;
use drive_dedup::core::folders::{FolderCompareMode, FolderPair};
use drive_dedup::core::merge::{MergeConfig, MergeEngine, MergeStats};
use drive_dedup::core::organize::{DecisionProvider, Discovery, OrganizeConfig, OrganizeReport, Organizer};
use drive_dedup::core::pipeline::CancellationToken;
use drive_dedup::error::Result;
use drive_dedup::events::{
    ActionEvent, CompareEvent, Event, EventChannel, EventReceiver, HashEvent, MergeEvent,
    PipelineEvent, ScanEvent,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// Drive Dedup - Find duplicates and merge drives without losing a file
#[derive(Parser, Debug)]
#[command(name = "drive-dedup")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Report duplicate files and identical folders without changing anything
    Scan {
        /// Volume root to scan
        root: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,

        /// How same-named files in same-named folders are compared
        #[arg(short, long, default_value = "content")]
        compare: CompareArg,

        /// Skip files and folders whose name starts with '.'
        #[arg(long)]
        skip_hidden: bool,
    },

    /// Deduplicate a volume in place
    Organize {
        /// Volume root to organize
        root: PathBuf,

        /// JSON file with stored decisions ({"files": ..., "folders": ...})
        #[arg(long)]
        policy_file: Option<PathBuf>,

        /// Apply this to every duplicate group instead of asking
        #[arg(long)]
        files: Option<FileArg>,

        /// Apply this to every identical folder pair instead of asking
        #[arg(long)]
        folders: Option<FolderArg>,

        /// How same-named files in same-named folders are compared
        #[arg(short, long, default_value = "content")]
        compare: CompareArg,

        /// Skip files and folders whose name starts with '.'
        #[arg(long)]
        skip_hidden: bool,

        /// Print every action as it happens
        #[arg(short, long)]
        verbose: bool,
    },

    /// Move everything from SOURCE into DESTINATION
    Merge {
        /// Tree that receives the files
        destination: PathBuf,

        /// Tree that is emptied
        source: PathBuf,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Print every action as it happens
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Human-readable output with colors
    Pretty,
    /// JSON output for scripting
    Json,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CompareArg {
    /// Trust matching size and modification time
    Metadata,
    /// Compare bytes (default)
    Content,
}

impl From<CompareArg> for FolderCompareMode {
    fn from(arg: CompareArg) -> Self {
        match arg {
            CompareArg::Metadata => FolderCompareMode::Metadata,
            CompareArg::Content => FolderCompareMode::Content,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FileArg {
    /// Leave every copy in place
    KeepAll,
    /// Keep the first copy found, set the rest aside
    KeepFirst,
    /// Copy every member into the holding area
    DuplicateAll,
}

impl From<FileArg> for FilePolicy {
    fn from(arg: FileArg) -> Self {
        match arg {
            FileArg::KeepAll => FilePolicy::KeepAll,
            FileArg::KeepFirst => FilePolicy::KeepFirst,
            FileArg::DuplicateAll => FilePolicy::DuplicateAll,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FolderArg {
    /// Leave both folders
    KeepBoth,
    /// Delete the second folder
    KeepFirst,
    /// Delete the first folder
    KeepSecond,
    /// Move the second folder's contents into the first
    Merge,
}

impl From<FolderArg> for FolderPolicy {
    fn from(arg: FolderArg) -> Self {
        match arg {
            FolderArg::KeepBoth => FolderPolicy::KeepBoth,
            FolderArg::KeepFirst => FolderPolicy::KeepFirst,
            FolderArg::KeepSecond => FolderPolicy::KeepSecond,
            FolderArg::Merge => FolderPolicy::Merge,
        }
    }
}

/// Run the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            root,
            output,
            compare,
            skip_hidden,
        } => run_scan(root, output, compare.into(), skip_hidden),
        Commands::Organize {
            root,
            policy_file,
            files,
            folders,
            compare,
            skip_hidden,
            verbose,
        } => {
            let mut policy = match policy_file {
                Some(path) => BatchPolicy::load(&path)?,
                None => BatchPolicy::default(),
            };
            if let Some(files) = files {
                policy.files = Some(files.into());
            }
            if let Some(folders) = folders {
                policy.folders = Some(folders.into());
            }
            run_organize(root, policy, compare.into(), skip_hidden, verbose)
        }
        Commands::Merge {
            destination,
            source,
            yes,
            verbose,
        } => run_merge(destination, source, yes, verbose),
    }
}

fn print_header(term: &Term) {
    term.write_line(&format!(
        "{} {}",
        style("Drive Dedup").bold().cyan(),
        style(concat!("v", env!("CARGO_PKG_VERSION"))).dim()
    ))
    .ok();
    term.write_line("").ok();
}

fn new_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(0);
    if let Ok(bar_style) =
        ProgressStyle::default_bar().template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(bar_style.progress_chars("█▓░"));
    }
    pb
}

// Handle events in a separate thread, drawing onto `progress`.
fn spawn_event_thread(
    receiver: EventReceiver,
    progress: Option<ProgressBar>,
    verbose: bool,
) -> JoinHandle<()> {
    thread::spawn(move || {
        for event in receiver.iter() {
            let Some(ref pb) = progress else {
                continue;
            };
            match event {
                Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                    pb.set_position(0);
                    pb.set_length(0);
                    pb.set_message(format!("{}", phase));
                }
                Event::Scan(ScanEvent::Started { total_files, .. }) => {
                    pb.set_length(total_files as u64);
                }
                Event::Scan(ScanEvent::Progress(p))
                | Event::Hash(HashEvent::Progress(p))
                | Event::Compare(CompareEvent::Progress(p))
                | Event::Action(ActionEvent::Progress(p))
                | Event::Merge(MergeEvent::Progress(p)) => {
                    pb.set_length(p.total as u64);
                    pb.set_position(p.processed as u64);
                }
                Event::Scan(ScanEvent::Skipped { path, message })
                | Event::Hash(HashEvent::Skipped { path, message }) => {
                    if verbose {
                        pb.println(format!(
                            "  {} {} ({})",
                            style("skipped").yellow(),
                            path.display(),
                            message
                        ));
                    }
                }
                Event::Merge(MergeEvent::Started { total_files, .. }) => {
                    pb.set_message("Merging");
                    pb.set_length(total_files as u64);
                }
                Event::Action(ActionEvent::Applied { line })
                | Event::Merge(MergeEvent::FileHandled { line }) => {
                    if verbose {
                        pb.println(format!("  {}", style(line).dim()));
                    }
                }
                Event::Action(ActionEvent::Failed { message })
                | Event::Merge(MergeEvent::FileFailed { message, .. }) => {
                    pb.println(format!("  {} {}", style("error:").red().bold(), message));
                }
                Event::Message { text } => pb.println(text),
                Event::Pipeline(PipelineEvent::Completed)
                | Event::Pipeline(PipelineEvent::Cancelled)
                | Event::Pipeline(PipelineEvent::Error { .. })
                | Event::Merge(MergeEvent::Completed { .. }) => pb.finish_and_clear(),
                _ => {}
            }
        }
    })
}

fn run_scan(root: PathBuf, output: OutputFormat, compare: FolderCompareMode, skip_hidden: bool) -> Result<()> {
    let term = Term::stderr();
    let pretty = matches!(output, OutputFormat::Pretty);
    if pretty {
        print_header(&term);
    }

    let config = OrganizeConfig::new(&root)
        .compare_mode(compare)
        .include_hidden(!skip_hidden);
    let organizer = Organizer::new(config);

    let (sender, receiver) = EventChannel::new();
    let progress = pretty.then(new_progress_bar);
    let event_thread = spawn_event_thread(receiver, progress, false);

    let result = organizer.find(&sender, &CancellationToken::new());

    // Drop sender to signal event thread to finish
    drop(sender);
    event_thread.join().ok();

    let discovery = result?;
    match output {
        OutputFormat::Pretty => print_discovery(&term, &discovery),
        OutputFormat::Json => match serde_json::to_string_pretty(&discovery) {
            Ok(json) => println!("{}", json),
            Err(e) => tracing::error!(error = %e, "could not serialize scan results"),
        },
    }

    Ok(())
}

fn print_discovery(term: &Term, discovery: &Discovery) {
    term.write_line(&format!("{} Scan Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} files scanned, {} hashed",
        style(discovery.files_scanned).cyan(),
        style(discovery.files_hashed).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups found",
        style(discovery.groups.len()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} identical folder pairs",
        style(discovery.identical_pairs().count()).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} potential space savings",
        style(format_bytes(discovery.reclaimable_bytes())).yellow()
    ))
    .ok();
    term.write_line("").ok();

    if discovery.groups.is_empty() && discovery.identical_pairs().count() == 0 {
        term.write_line(&format!("  {} No duplicates found!", style("🎉").green()))
            .ok();
        return;
    }

    if discovery.identical_pairs().count() > 0 {
        term.write_line(&format!("{}", style("Identical Folders:").bold().underlined()))
            .ok();
        term.write_line("").ok();
        for pair in discovery.identical_pairs() {
            term.write_line(&format!("  {}", style(&pair.name).bold())).ok();
            term.write_line(&format!("    {}", display_path(&pair.first))).ok();
            term.write_line(&format!("    {}", display_path(&pair.second))).ok();
        }
        term.write_line("").ok();
    }

    if !discovery.groups.is_empty() {
        term.write_line(&format!("{}", style("Duplicate Groups:").bold().underlined()))
            .ok();
        term.write_line("").ok();
        for (i, group) in discovery.groups.iter().enumerate() {
            term.write_line(&format!(
                "  {} ({} files, {} each)",
                style(format!("Group {}:", i + 1)).bold(),
                group.len(),
                format_bytes(group.size)
            ))
            .ok();
            for (idx, path) in group.paths().enumerate() {
                let marker = if idx == 0 {
                    style("★").green().to_string()
                } else {
                    style("○").dim().to_string()
                };
                term.write_line(&format!("    {} {}", marker, display_path(path)))
                    .ok();
            }
            term.write_line("").ok();
        }
    }

    term.write_line(&format!(
        "{}",
        style("No files were changed. Run `organize` to act on these results.").dim()
    ))
    .ok();
}

/// Uses the stored policy where one is set and asks on the terminal otherwise
struct TerminalDecisions {
    term: Term,
    policy: BatchPolicy,
    progress: Option<ProgressBar>,
}

impl TerminalDecisions {
    fn ask(&self, lines: &[String], prompt: &str) -> String {
        let read = || {
            for line in lines {
                self.term.write_line(line).ok();
            }
            self.term.write_str(prompt).ok();
            self.term.read_line().unwrap_or_default()
        };
        match &self.progress {
            Some(pb) => pb.suspend(read),
            None => read(),
        }
    }
}

impl DecisionProvider for TerminalDecisions {
    fn folder_policy(&mut self, pair: &FolderPair) -> FolderPolicy {
        if let Some(policy) = self.policy.folders {
            return policy;
        }
        let lines = vec![
            String::new(),
            format!("{} {}", style("Identical folders:").bold(), style(&pair.name).cyan()),
            format!("  1) {}", display_path(&pair.first)),
            format!("  2) {}", display_path(&pair.second)),
        ];
        loop {
            let answer = self.ask(&lines, "[b]oth / keep [1] / keep [2] / [m]erge 2 into 1 (b): ");
            if let Some(policy) = parse_folder_choice(&answer) {
                return policy;
            }
        }
    }

    fn file_policy(&mut self, group: &DuplicateGroup) -> FilePolicy {
        if let Some(policy) = self.policy.files {
            return policy;
        }
        let mut lines = vec![
            String::new(),
            format!(
                "{} ({} files, {} each)",
                style("Duplicate files").bold(),
                group.len(),
                format_bytes(group.size)
            ),
        ];
        lines.extend(
            group
                .paths()
                .enumerate()
                .map(|(i, path)| format!("  {}) {}", i + 1, display_path(path))),
        );
        loop {
            let answer = self.ask(
                &lines,
                "keep [a]ll / keep [f]irst / keep number / [d]uplicate all to holding area (a): ",
            );
            if let Some(policy) = parse_file_choice(&answer, group.len()) {
                return policy;
            }
        }
    }

    fn mode(&self) -> &str {
        match (self.policy.files, self.policy.folders) {
            (Some(_), Some(_)) => "batch",
            (None, None) => "interactive",
            _ => "mixed",
        }
    }
}

fn parse_folder_choice(answer: &str) -> Option<FolderPolicy> {
    match answer.trim().to_lowercase().as_str() {
        "" | "b" | "both" => Some(FolderPolicy::KeepBoth),
        "1" => Some(FolderPolicy::KeepFirst),
        "2" => Some(FolderPolicy::KeepSecond),
        "m" | "merge" => Some(FolderPolicy::Merge),
        _ => None,
    }
}

fn parse_file_choice(answer: &str, len: usize) -> Option<FilePolicy> {
    let answer = answer.trim().to_lowercase();
    match answer.as_str() {
        "" | "a" | "all" => Some(FilePolicy::KeepAll),
        "f" | "first" => Some(FilePolicy::KeepFirst),
        "d" | "duplicate" => Some(FilePolicy::DuplicateAll),
        other => match other.parse::<usize>() {
            Ok(n) if (1..=len).contains(&n) => Some(FilePolicy::KeepSelected(n - 1)),
            _ => None,
        },
    }
}

fn run_organize(
    root: PathBuf,
    policy: BatchPolicy,
    compare: FolderCompareMode,
    skip_hidden: bool,
    verbose: bool,
) -> Result<()> {
    let term = Term::stderr();
    print_header(&term);

    let config = OrganizeConfig::new(&root)
        .compare_mode(compare)
        .include_hidden(!skip_hidden);
    let log_path = config.log_path();
    let organizer = Organizer::new(config);

    let (sender, receiver) = EventChannel::new();
    let progress = new_progress_bar();
    let event_thread = spawn_event_thread(receiver, Some(progress.clone()), verbose);

    let mut decisions = TerminalDecisions {
        term: term.clone(),
        policy,
        progress: Some(progress),
    };
    let result = organizer.run(&mut decisions, &sender, &CancellationToken::new());

    drop(sender);
    event_thread.join().ok();

    let report = result?;
    print_organize_report(&term, &report, &log_path);
    Ok(())
}

fn print_organize_report(term: &Term, report: &OrganizeReport, log_path: &Path) {
    term.write_line("").ok();
    term.write_line(&format!("{} Organize Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!(
        "  {} identical folder pairs ({} compared)",
        style(report.identical_folders).cyan(),
        report.folder_pairs
    ))
    .ok();
    term.write_line(&format!(
        "  {} folders removed, {} entries merged",
        style(report.folders.removed).cyan(),
        style(report.folders.moved).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} duplicate groups in {} files",
        style(report.groups).cyan(),
        report.files_scanned
    ))
    .ok();
    term.write_line(&format!(
        "  {} files set aside, {} copied to the holding area",
        style(report.files.set_aside).cyan(),
        style(report.files.copied).cyan()
    ))
    .ok();
    print_error_count(term, report.folders.errors.len() + report.files.errors.len());
    term.write_line("").ok();
    term.write_line(&format!(
        "{} {}",
        style("Log:").dim(),
        style(display_path(log_path)).dim()
    ))
    .ok();
}

fn run_merge(destination: PathBuf, source: PathBuf, yes: bool, verbose: bool) -> Result<()> {
    let term = Term::stderr();
    print_header(&term);

    let engine = MergeEngine::new(MergeConfig::new(&destination, &source));
    engine.check()?;

    if !yes {
        term.write_line(&format!(
            "Move everything from {} into {}?",
            style(display_path(&source)).cyan(),
            style(display_path(&destination)).cyan()
        ))
        .ok();
        term.write_str("Identical files go to the holding area, clashing names get a suffix. [y/N] ")
            .ok();
        let answer = term.read_line().unwrap_or_default();
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            term.write_line("Aborted. Nothing was changed.").ok();
            return Ok(());
        }
    }

    let (sender, receiver) = EventChannel::new();
    let event_thread = spawn_event_thread(receiver, Some(new_progress_bar()), verbose);

    let result = engine.run(&sender, &CancellationToken::new());

    drop(sender);
    event_thread.join().ok();

    let stats = result?;
    print_merge_stats(&term, &stats, &engine.config().log_path());
    Ok(())
}

fn print_merge_stats(term: &Term, stats: &MergeStats, log_path: &Path) {
    term.write_line("").ok();
    term.write_line(&format!("{} Merge Complete", style("✓").green().bold()))
        .ok();
    term.write_line("").ok();
    term.write_line(&format!("  {} files moved", style(stats.moved).cyan()))
        .ok();
    term.write_line(&format!(
        "  {} duplicates set aside",
        style(stats.duplicates).cyan()
    ))
    .ok();
    term.write_line(&format!(
        "  {} folders created",
        style(stats.folders_created).cyan()
    ))
    .ok();
    print_error_count(term, stats.errors.len());
    term.write_line("").ok();
    term.write_line(&format!(
        "{} {}",
        style("Log:").dim(),
        style(display_path(log_path)).dim()
    ))
    .ok();
}

fn print_error_count(term: &Term, errors: usize) {
    if errors > 0 {
        term.write_line(&format!(
            "  {} errors (see log)",
            style(errors).red().bold()
        ))
        .ok();
    }
}

fn display_path(path: &Path) -> String {
    match dirs::home_dir().and_then(|home| path.strip_prefix(home).ok().map(Path::to_path_buf)) {
        Some(relative) => format!("~/{}", relative.display()),
        None => path.display().to_string(),
    }
}

fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
