//! `icq-artifact-extractor` — forensic extractor for a defunct instant-
//! messaging client's on-disk desktop artifacts. See [`icq_artifact_extractor`]
//! for the decoder/correlation core; this binary is just the thin I/O
//! shell around it: discover the input tree, decode every artifact
//! family, correlate, and write one JSON document per family.
//!
//! ```sh
//! icq-artifact-extractor ~/forensics/icq-capture ./out
//! icq-artifact-extractor ~/forensics/icq-capture ./out --verbose --config extractor.toml
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Context, Result, eyre};
use serde::Deserialize;

use icq_artifact_extractor::decode;
use icq_artifact_extractor::model::{Owner, Store};
use icq_artifact_extractor::stream::Blocks;
use icq_artifact_extractor::{correlate, discover, json_ingest};

/// Decode a defunct instant-messaging client's on-disk artifacts into
/// correlated JSON.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory captured from a desktop installation.
    #[arg(value_name = "INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory to write the per-family JSON documents into.
    #[arg(value_name = "OUTPUT_DIR")]
    output_dir: Option<PathBuf>,

    /// Path to a specific configuration file.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Print per-file/per-block progress.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Deserialize, Default)]
struct FileConfig {
    output_dir: Option<PathBuf>,
}

fn load_file_config(explicit_path: Option<&Path>) -> Result<FileConfig> {
    let path = match explicit_path {
        Some(p) if !p.exists() => return Err(eyre!("Config file not found: {}", p.display())),
        Some(p) => Some(p.to_path_buf()),
        None => None,
    };
    match path {
        None => Ok(FileConfig::default()),
        Some(p) => {
            let content = fs::read_to_string(&p)
                .wrap_err_with(|| format!("Failed to read config: {}", p.display()))?;
            toml::from_str(&content)
                .wrap_err_with(|| format!("Failed to parse config: {}", p.display()))
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .init();

    let file_cfg = load_file_config(cli.config.as_deref())?;
    let output_dir = cli.output_dir.or(file_cfg.output_dir).unwrap_or_else(|| PathBuf::from("out"));

    if !cli.input_dir.exists() {
        return Err(eyre!("Input directory not found: {}", cli.input_dir.display()));
    }
    fs::create_dir_all(&output_dir)
        .wrap_err_with(|| format!("creating output directory {}", output_dir.display()))?;

    let tree = discover::discover(&cli.input_dir)?;
    tracing::info!(
        message_history = tree.message_history.len(),
        gallery_cache = tree.gallery_cache.len(),
        dialog_state = tree.dialog_state.len(),
        "discovery complete"
    );

    let mut store = Store::default();
    decode_all(&tree, &mut store)?;
    correlate::correlate(&mut store, &tree.content_cache_dirs);

    write_outputs(&output_dir, &store)?;
    Ok(())
}

fn decode_all(tree: &discover::DiscoveredTree, store: &mut Store) -> Result<()> {
    for (uid, path) in &tree.message_history {
        decode_binary_family(path, |blk| {
            decode::message_history::decode_block(
                blk,
                icq_artifact_extractor::tags::message_history,
                store.messages.entry(uid.clone()).or_default(),
                path,
            )
        });
    }
    for (uid, path) in &tree.gallery_cache {
        decode_binary_family(path, |blk| {
            decode::gallery_cache::decode_block(blk, store.shared_files.entry(uid.clone()).or_default(), path)
        });
    }
    for (uid, path) in &tree.gallery_state {
        let Ok(bytes) = fs::read(path) else {
            tracing::warn!(file = %path.display(), "cannot read gallery-state file, skipping");
            continue;
        };
        let mut fields = Default::default();
        for blk in Blocks::new(&bytes) {
            decode::gallery_state::decode_block(blk, &mut fields, path);
        }
        store.gallery_states.insert(uid.clone(), fields);
    }
    for (uid, path) in &tree.dialog_state {
        let Ok(bytes) = fs::read(path) else {
            tracing::warn!(file = %path.display(), "cannot read dialog-state file, skipping");
            continue;
        };
        let record = store.dialog_states.entry(uid.clone()).or_default();
        for blk in Blocks::new(&bytes) {
            decode::dialog_state::decode_block(blk, record, path);
        }
    }
    for (uid, path) in &tree.draft_storage {
        decode_binary_family(path, |blk| {
            decode::draft::decode_block(blk, store.drafts.entry(uid.clone()).or_default(), path)
        });
    }
    for (uid, path) in &tree.search_history {
        if let Ok(terms) = json_ingest::load_search_history(path) {
            store
                .search_history
                .insert(uid.clone(), icq_artifact_extractor::model::SearchHistory { user_id: uid.clone(), terms });
        }
    }
    for (uid, path) in &tree.avatars {
        store.contact_entry(uid).avatars.push(path.clone());
    }

    for path in &tree.my_info {
        if json_ingest::looks_like_json(path) {
            if let Some(owner) = json_ingest::load_my_info_json(path) {
                store.owner = owner;
            }
        } else {
            let Ok(bytes) = fs::read(path) else { continue };
            let mut owner = Owner::default();
            for blk in Blocks::new(&bytes) {
                decode::my_info::decode_block(blk, &mut owner, path);
            }
            store.owner = owner;
        }
    }

    for path in &tree.call_log {
        decode_binary_family(path, |blk| {
            decode::call_log::decode_block(blk, &mut store.call_log, path)
        });
    }

    for path in &tree.ui_settings {
        let Ok(bytes) = fs::read(path) else {
            tracing::warn!(file = %path.display(), "cannot read ui2.stg, skipping");
            continue;
        };
        let mut settings = decode::ui_settings::UiSettings::default();
        decode::ui_settings::decode(&bytes, &mut settings, path);
        for (k, v) in settings.global {
            store.app_settings.insert(k.to_string(), v);
        }
        store.favorites_pinned_on_start.extend(settings.favorites_pinned_on_start);
    }

    for path in &tree.contact_list {
        if let Some((contacts, ignore_list)) = json_ingest::load_contact_list(path) {
            for (uid, profile) in contacts {
                store.contact_entry(&uid).profile = Some(profile);
            }
            store.ignore_list.extend(ignore_list);
        }
    }
    for path in &tree.dialog_index {
        if let Some(uids) = json_ingest::load_dialog_index(path) {
            for uid in uids {
                store.contact_entry(&uid);
            }
        }
    }
    for path in &tree.favorites {
        if let Some(uids) = json_ingest::load_favorites(path) {
            store.favorites.extend(uids);
        }
    }

    Ok(())
}

/// Read a binary artifact fully into memory and run `decode_one_block`
/// over each of its frames (spec.md §5: files are read once, fully,
/// then closed before decoding).
fn decode_binary_family(path: &Path, mut decode_one_block: impl FnMut(&[u8])) {
    let Ok(bytes) = fs::read(path) else {
        tracing::warn!(file = %path.display(), "cannot read file, skipping");
        return;
    };
    for blk in Blocks::new(&bytes) {
        decode_one_block(blk);
    }
}

fn write_outputs(output_dir: &Path, store: &Store) -> Result<()> {
    write_json(output_dir, "owner.json", &store.owner)?;
    write_json(output_dir, "contacts.json", &store.contacts)?;
    write_json(output_dir, "messages.json", &store.messages)?;
    write_json(output_dir, "dialog-states.json", &store.dialog_states)?;
    write_json(output_dir, "calls.json", &store.call_log)?;
    write_json(output_dir, "drafts.json", &store.drafts)?;
    write_json(output_dir, "files.json", &store.shared_files)?;
    write_json(output_dir, "states.json", &store.gallery_states)?;
    write_json(output_dir, "history.json", &store.search_history)?;
    write_json(output_dir, "app-settings.json", &(&store.app_settings, &store.favorites_pinned_on_start))?;
    write_json(output_dir, "favorites.json", &store.favorites)?;
    write_json(output_dir, "shared-urls.json", &store.url_metadata)?;
    Ok(())
}

fn write_json<T: serde::Serialize>(output_dir: &Path, filename: &str, value: &T) -> Result<()> {
    let path = output_dir.join(filename);
    let json = serde_json::to_vec_pretty(value).wrap_err_with(|| format!("serialising {filename}"))?;
    fs::write(&path, json).wrap_err_with(|| format!("writing {}", path.display()))?;
    tracing::debug!(file = %path.display(), "wrote output");
    Ok(())
}
