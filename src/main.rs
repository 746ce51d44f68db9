//! Main entry point for the apkcat CLI.
//!
//! This binary indexes an APK/ZIP container (local, remote over HTTP
//! Range requests, or spread across split parts) and inspects the
//! resulting catalog: entry listings, the path tree, the signing block,
//! or single-entry payload dumps.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use apkcat::{Archive, Cli, InputSource, PathTree, ReadAt};
use apkcat::{SIGNATURE_SCHEME_V2_ID, SIGNATURE_SCHEME_V3_ID};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.is_http_url() {
        let archive = Archive::open_url(&cli.files[0])
            .await
            .with_context(|| format!("failed to index {}", cli.files[0]))?;

        let transferred_before = archive.reader().transferred_bytes();
        run(&archive, &cli).await?;

        // Network transfer statistics for remote containers
        if !cli.is_quiet() {
            let transferred = archive.reader().transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else if cli.is_split() {
        let parts: Vec<PathBuf> = cli.files.iter().map(PathBuf::from).collect();
        let archive = Archive::open_parts(&parts)
            .await
            .context("failed to index split container")?;
        run(&archive, &cli).await?;
    } else {
        let archive = Archive::open(&cli.files[0])
            .await
            .with_context(|| format!("failed to index {}", cli.files[0]))?;
        run(&archive, &cli).await?;
    }

    Ok(())
}

/// Dispatch the requested views over an indexed archive.
async fn run<R: ReadAt + 'static>(archive: &Archive<R>, cli: &Cli) -> Result<()> {
    if !cli.print.is_empty() {
        return print_entries(archive, cli).await;
    }

    let mut handled = false;
    if cli.sig {
        print_signature(archive);
        handled = true;
    }
    if cli.tree {
        print_tree(archive);
        handled = true;
    }
    if cli.list {
        list_entries(archive, false);
        handled = true;
    }
    if cli.verbose || !handled {
        list_entries(archive, true);
    }

    Ok(())
}

/// List catalog entries, either names only or the verbose table.
fn list_entries<R: ReadAt>(archive: &Archive<R>, verbose: bool) {
    if verbose {
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in archive.entries() {
        if !verbose {
            println!("{}", entry.name());
            continue;
        }

        let modified = entry.modified();
        let ratio = if entry.uncompressed_size() > 0 {
            format!(
                "{:>4}%",
                100 - (entry.compressed_size() * 100 / entry.uncompressed_size())
            )
        } else {
            "  0%".to_string()
        };

        println!(
            "{:>10}  {:>10}  {}  {}  {}  {}",
            entry.uncompressed_size(),
            entry.compressed_size(),
            ratio,
            modified.format("%Y-%m-%d"),
            modified.format("%H:%M"),
            entry.name()
        );

        if entry.is_file() {
            total_uncompressed += entry.uncompressed_size();
            total_compressed += entry.compressed_size();
            file_count += 1;
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        let total_ratio = if total_uncompressed > 0 {
            format!(
                "{:>4}%",
                100 - (total_compressed * 100 / total_uncompressed)
            )
        } else {
            "  0%".to_string()
        };
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed, total_compressed, total_ratio, "", file_count
        );
    }
}

/// Render the path tree of the file sources, one node per line.
fn print_tree<R: ReadAt>(archive: &Archive<R>) {
    fn walk<T>(node: &PathTree<T>, depth: usize) {
        for child in node.children() {
            let marker = if child.is_leaf() { "" } else { "/" };
            println!("{}{}{}", "  ".repeat(depth), child.name(), marker);
            walk(child, depth + 1);
        }
    }

    walk(&archive.path_tree(), 0);
}

/// Summarize the signing block, if the package carries one.
fn print_signature<R: ReadAt>(archive: &Archive<R>) {
    let Some(block) = archive.signature_block() else {
        println!("no signing block");
        return;
    };

    println!(
        "signing block: {} bytes at offset {:#x}",
        block.size(),
        block.offset()
    );
    for pair in block.pairs() {
        let label = match pair.id {
            SIGNATURE_SCHEME_V2_ID => " (signature scheme v2)",
            SIGNATURE_SCHEME_V3_ID => " (signature scheme v3)",
            _ => "",
        };
        println!("  id {:#010x}{}: {} bytes", pair.id, label, pair.value.len());
    }
}

/// Write the named entries' payloads to stdout.
async fn print_entries<R: ReadAt>(archive: &Archive<R>, cli: &Cli) -> Result<()> {
    let multiple = cli.print.len() > 1;
    let mut stdout = tokio::io::stdout();

    for name in &cli.print {
        let Some(source) = archive.entry_source(name) else {
            bail!("entry not found: {}", name);
        };

        if multiple {
            stdout
                .write_all(format!("--- {} ---\n", source.alias()).as_bytes())
                .await?;
        }

        let data = source.read_to_memory().await?;
        stdout.write_all(&data).await?;
    }

    stdout.flush().await?;
    Ok(())
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
