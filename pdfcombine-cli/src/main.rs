//! pdfcombine - Order, select and combine PDF and PNG files into one PDF.
//!
//! Command-line front end over the `pdfcombine` library: listing, import,
//! compile, conversion and editor hand-off for one working directory.

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::{Arc, Mutex};

use crate::cli::{
    BlendArgs, Cli, Command, CompileArgs, ConvertArgs, ImportArgs, ListArgs, OpenArgs,
    SettingsAction,
};
use pdfcombine::config::{Config, OverwriteMode, RawSettings, Settings};
use pdfcombine::entry::{self, CompilationRequest, FileKind, SelectionMode};
use pdfcombine::error::{CombineError, SourceProblem};
use pdfcombine::launch::{Editor, ProcessLauncher};
use pdfcombine::merge::{CancellationFlag, Compiler, SourceProgress, SourceStatus};
use pdfcombine::output::{self, OutputFormatter, ProgressBar};
use pdfcombine::{convert, listing, utils};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();
    init_logging(&cli);

    // Run the application and handle errors
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(exit_code(&err));
    }
}

fn init_logging(cli: &Cli) {
    let default_filter = if cli.verbose {
        "pdfcombine=debug"
    } else {
        "error"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

/// Process exit code for an error: the library's code, 1 for anything else.
fn exit_code(err: &anyhow::Error) -> i32 {
    err.downcast_ref::<CombineError>()
        .map_or(1, CombineError::exit_code)
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);

    // The location is printable even when the file itself is broken
    if let Command::Settings {
        action: SettingsAction::Path,
    } = &cli.command
    {
        println!("{}", settings_path.display());
        return Ok(());
    }

    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);
    let settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        // A file with values of the wrong type can still be shown and repaired
        Err(err @ CombineError::Settings { .. }) => match cli.command {
            Command::Settings { action } => {
                formatter.warning(&format!("{err}; editing it as plain JSON"));
                return raw_settings_command(action, &settings_path, &formatter);
            }
            _ => return Err(err.into()),
        },
        Err(err) => return Err(err.into()),
    };

    match cli.command {
        Command::List(args) => list(&args, &settings, &formatter),
        Command::Compile(args) => {
            compile(&args, &settings, &formatter, cli.verbose, cli.quiet).await
        }
        Command::Import(args) => import(&args, &settings, &formatter),
        Command::Convert(args) => convert_file(&args, &settings, &formatter),
        Command::Blend(args) => blend(&args, &formatter),
        Command::Open(args) => open(&args, &settings, &formatter),
        Command::Settings { action } => {
            settings_command(action, settings, &settings_path, &formatter)
        }
    }
}

/// Working directory: `--dir` if given, else the configured one.
fn working_dir<'a>(dir: Option<&'a Path>, settings: &'a Settings) -> Result<&'a Path> {
    match dir {
        Some(dir) if dir.is_dir() => Ok(dir),
        Some(dir) => Err(CombineError::configuration(format!(
            "Working directory does not exist: {}",
            dir.display()
        ))
        .into()),
        None => Ok(settings.require_working_dir()?),
    }
}

fn list(args: &ListArgs, settings: &Settings, formatter: &OutputFormatter) -> Result<()> {
    let dir = working_dir(args.dir.as_deref(), settings)?;
    let entries = listing::list_entries(dir, &settings.ordering_keywords)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    formatter.info(&format!("{} ({} file(s))", dir.display(), entries.len()));
    output::display_listing(formatter, &entries);
    Ok(())
}

/// Entries to compile: plan file, explicit files, or the working directory.
fn build_request(
    args: &CompileArgs,
    settings: &Settings,
    working_dir: Option<&Path>,
) -> Result<CompilationRequest> {
    if let Some(plan) = &args.plan {
        let json = std::fs::read_to_string(plan)
            .with_context(|| format!("Cannot read plan {}", plan.display()))?;
        let base = plan
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let entries = entry::parse_plan(&json, base)?;
        return Ok(CompilationRequest::new(entries, args.selection_mode()));
    }

    if !args.files.is_empty() {
        let paths = utils::collect_paths_for_patterns(&args.files)?;
        return Ok(CompilationRequest::from_paths(paths));
    }

    let dir = working_dir.ok_or_else(|| {
        CombineError::configuration("No files given and no working directory configured")
    })?;
    let entries = listing::list_entries(dir, &settings.ordering_keywords)?;
    Ok(CompilationRequest::new(entries, SelectionMode::All))
}

fn is_interactive(formatter: &OutputFormatter) -> bool {
    !formatter.is_quiet() && io::stdin().is_terminal()
}

/// Ask whether `path` may be replaced.
fn ask_overwrite(path: &Path, formatter: &OutputFormatter) -> Result<bool> {
    formatter.warning(&format!("Output file already exists: {}", path.display()));

    print!("Overwrite? [y/N]: ");
    io::stdout().flush().ok();

    let mut response = String::new();
    io::stdin()
        .read_line(&mut response)
        .context("Failed to read input")?;

    Ok(matches!(
        response.trim().to_lowercase().as_str(),
        "y" | "yes"
    ))
}

/// Turn `OverwriteMode::Prompt` into a decision before compiling.
///
/// Without a terminal to ask on, an existing output is kept.
fn resolve_overwrite(config: &mut Config, formatter: &OutputFormatter) -> Result<()> {
    if config.dry_run
        || config.overwrite_mode != OverwriteMode::Prompt
        || !config.output.is_file()
    {
        return Ok(());
    }

    if !is_interactive(formatter) {
        config.overwrite_mode = OverwriteMode::NoClobber;
        return Ok(());
    }

    if ask_overwrite(&config.output, formatter)? {
        config.overwrite_mode = OverwriteMode::Force;
        Ok(())
    } else {
        Err(CombineError::Cancelled.into())
    }
}

/// Editors to open the combined PDF in: `--open-with` plus settings toggles.
fn editors_for_result(args: &CompileArgs, settings: &Settings) -> Result<Vec<Editor>> {
    let mut editors = Vec::new();
    for name in &args.open_with {
        editors.push(name.parse::<Editor>()?);
    }
    if settings.open_combined_in_inkscape {
        editors.push(Editor::Inkscape);
    }
    if settings.open_combined_in_libreoffice {
        editors.push(Editor::LibreOfficeDraw);
    }

    let mut unique = Vec::with_capacity(editors.len());
    for editor in editors {
        if !unique.contains(&editor) {
            unique.push(editor);
        }
    }
    Ok(unique)
}

fn report_deletions(formatter: &OutputFormatter, failures: &[(PathBuf, io::Error)]) {
    for (path, err) in failures {
        formatter.warning(&format!("Could not delete {}: {err}", path.display()));
    }
}

async fn compile(
    args: &CompileArgs,
    settings: &Settings,
    formatter: &OutputFormatter,
    verbose: bool,
    quiet: bool,
) -> Result<()> {
    let working_dir = match &args.dir {
        Some(dir) => Some(dir.as_path()),
        None => settings.working_dir.as_deref(),
    };

    let mut config = args.to_config(working_dir, verbose, quiet)?;
    let request = build_request(args, settings, working_dir)?;

    // Missing files are reported per entry by the compiler; flag them early
    for missing in listing::missing_entries(request.entries()) {
        formatter.debug(&format!("Not on disk: {}", missing.path.display()));
    }

    let editors = editors_for_result(args, settings)?;
    resolve_overwrite(&mut config, formatter)?;

    formatter.info(&format!(
        "Combining {} file(s) into {}",
        request.len(),
        config.output.display()
    ));

    // Ctrl-C stops the compile after the file in progress
    let cancel = CancellationFlag::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, stopping after the current file");
                cancel.cancel();
            }
        })
    };

    let progress = Arc::new(Mutex::new(ProgressBar::for_sources(
        request.len(),
        formatter.is_quiet(),
    )));
    let on_progress = {
        let progress = Arc::clone(&progress);
        move |p: &SourceProgress<'_>| {
            if let Ok(mut bar) = progress.lock() {
                let skipped = matches!(p.status, SourceStatus::Skipped { .. });
                bar.advance(p.entry.file_name(), skipped);
            }
        }
    };

    let compiler = Compiler::new(config)
        .with_cancellation(cancel)
        .with_progress(Arc::new(on_progress));
    let result = compiler.compile_async(request).await;
    ctrl_c.abort();

    if let Ok(bar) = progress.lock() {
        bar.clear();
    }
    let outcome = result?;

    output::display_compile_summary(formatter, &outcome);
    if !outcome.written {
        return Ok(());
    }

    if settings.delete_originals {
        let originals: Vec<&Path> = outcome.succeeded.iter().map(|s| s.path.as_path()).collect();
        let failures = convert::remove_sources(&originals);
        formatter.info(&format!(
            "Deleted {} original file(s)",
            originals.len() - failures.len()
        ));
        report_deletions(formatter, &failures);
    }

    let launcher = ProcessLauncher::new();
    let combined = [outcome.document.path.clone()];
    for editor in editors {
        match editor.open(&launcher, settings, &combined) {
            Ok(()) => formatter.info(&format!("Opening result with {editor}")),
            Err(err) => formatter.warning(&format!("Could not open result with {editor}: {err}")),
        }
    }

    Ok(())
}

fn import(args: &ImportArgs, settings: &Settings, formatter: &OutputFormatter) -> Result<()> {
    let dir = working_dir(args.dir.as_deref(), settings)?;

    let paths = if args.files.is_empty() {
        let source = settings.source_dir.as_deref().ok_or_else(|| {
            CombineError::configuration(
                "No files given and no source directory configured (settings key 'source_dir')",
            )
        })?;
        listing::list_entries(source, &settings.ordering_keywords)?
            .into_iter()
            .map(|e| e.path)
            .collect()
    } else {
        utils::collect_paths_for_patterns(&args.files)?
    };

    let report = listing::import_files(&paths, dir, args.force)?;
    output::display_import_report(formatter, &report);
    Ok(())
}

/// Ask before replacing `target` unless `--force` was given.
///
/// Without a terminal the answer is "no"; the library then refuses to
/// overwrite.
fn confirm_overwrite(target: &Path, force: bool, formatter: &OutputFormatter) -> Result<bool> {
    if force || !target.is_file() || !is_interactive(formatter) {
        return Ok(force);
    }
    if ask_overwrite(target, formatter)? {
        Ok(true)
    } else {
        Err(CombineError::Cancelled.into())
    }
}

/// PNG to one-page PDF, or page 1 of a PDF to PNG, depending on the input.
fn convert_file(args: &ConvertArgs, settings: &Settings, formatter: &OutputFormatter) -> Result<()> {
    let input = &args.input;
    let stats = match FileKind::from_path(input) {
        FileKind::Png => {
            let overwrite =
                confirm_overwrite(&convert::converted_path(input), args.force, formatter)?;
            convert::convert_png_to_pdf(input, overwrite)?
        }
        FileKind::Pdf => {
            let overwrite =
                confirm_overwrite(&convert::rendered_path(input), args.force, formatter)?;
            convert::convert_pdf_to_png(input, overwrite)?
        }
        FileKind::Unsupported => {
            return Err(CombineError::source_read(input, SourceProblem::Unsupported).into());
        }
    };

    formatter.success(&format!(
        "Converted {} to {} ({})",
        input.display(),
        stats.output_path.display(),
        stats.format_file_size()
    ));

    if args.delete_original || settings.delete_originals {
        let failures = convert::remove_sources([input]);
        if failures.is_empty() {
            formatter.info(&format!("Deleted {}", input.display()));
        }
        report_deletions(formatter, &failures);
    }

    Ok(())
}

#[cfg(feature = "png")]
fn blend(args: &BlendArgs, formatter: &OutputFormatter) -> Result<()> {
    use pdfcombine::blend::{self, BlendMode};

    let mode: BlendMode = args.mode.parse()?;
    let overwrite = if confirm_overwrite(&args.output, args.force, formatter)? {
        OverwriteMode::Force
    } else {
        OverwriteMode::NoClobber
    };

    let stats = blend::blend_files(&args.base, &args.layer, mode, &args.output, overwrite)?;
    formatter.success(&format!(
        "Blended {} over {} ({mode}) into {} ({})",
        args.layer.display(),
        args.base.display(),
        stats.output_path.display(),
        stats.format_file_size()
    ));
    Ok(())
}

#[cfg(not(feature = "png"))]
fn blend(_args: &BlendArgs, _formatter: &OutputFormatter) -> Result<()> {
    Err(CombineError::configuration("Blending needs a build with the png feature").into())
}

fn open(args: &OpenArgs, settings: &Settings, formatter: &OutputFormatter) -> Result<()> {
    let editor: Editor = args.editor.parse()?;

    if let Some(missing) = args.files.iter().find(|f| !f.exists()) {
        return Err(CombineError::source_read(missing, SourceProblem::NotFound).into());
    }

    editor.open(&ProcessLauncher::new(), settings, &args.files)?;
    formatter.success(&format!(
        "Opening {} file(s) with {editor}",
        args.files.len()
    ));
    Ok(())
}

fn settings_command(
    action: SettingsAction,
    mut settings: Settings,
    path: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        SettingsAction::Get { key } => match settings.get(&key) {
            Some(value) => println!("{value}"),
            None => {
                return Err(CombineError::configuration(format!("{key} is not set")).into());
            }
        },
        SettingsAction::Set { key, value } => {
            warn_unknown_key(&key, formatter);
            settings.set(&key, &value)?;
            settings.save(path)?;
            formatter.success(&format!("Saved {key} to {}", path.display()));
        }
        SettingsAction::Path => println!("{}", path.display()),
    }
    Ok(())
}

fn warn_unknown_key(key: &str, formatter: &OutputFormatter) {
    if !Settings::is_known_key(key) {
        formatter.warning(&format!(
            "'{key}' is not a known setting, storing it as is (known: {})",
            pdfcombine::config::SETTINGS_KEYS.join(", ")
        ));
    }
}

/// `settings` subcommands on a file that does not parse as [`Settings`].
fn raw_settings_command(
    action: SettingsAction,
    path: &Path,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut raw = RawSettings::load(path)?;
    match action {
        SettingsAction::Show => {
            println!("{}", serde_json::to_string_pretty(raw.values())?);
        }
        SettingsAction::Get { key } => match raw.get(&key) {
            Some(serde_json::Value::String(value)) => println!("{value}"),
            Some(value) => println!("{value}"),
            None => {
                return Err(CombineError::configuration(format!("{key} is not set")).into());
            }
        },
        SettingsAction::Set { key, value } => {
            warn_unknown_key(&key, formatter);
            raw.set(&key, &value);
            raw.save(path)?;
            formatter.success(&format!("Saved {key} to {}", path.display()));
        }
        SettingsAction::Path => println!("{}", path.display()),
    }
    Ok(())
}
