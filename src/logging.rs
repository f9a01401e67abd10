use {
    anyhow::Result,
    std::{
        fs::{
            create_dir_all,
            File,
            OpenOptions,
        },
        path::Path,
        sync::Arc,
    },
    tracing::Level,
    tracing_subscriber::{
        fmt::{
            layer,
            writer::MakeWriterExt,
        },
        layer::SubscriberExt,
        util::SubscriberInitExt,
    },
};

/// Open the log file, creating its directory. With `append` an existing log
/// is continued instead of truncated.
fn open_log_file(
    path: &Path,
    append: bool,
) -> Result<File> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let file = if append {
        OpenOptions::new().create(true).append(true).open(path)?
    } else {
        File::create(path)?
    };
    Ok(file)
}

/// Install a global subscriber writing to `path` and to stdout.
///
/// A level of `None` turns logging off for that writer.
pub fn setup_logging(
    path: &dyn AsRef<Path>,
    min_level_file: Option<Level>,
    min_level_stdout: Option<Level>,
    append: bool,
) -> Result<()> {
    if min_level_file.is_none() && min_level_stdout.is_none() {
        return Ok(());
    }

    let log_file = Arc::new(open_log_file(path.as_ref(), append)?);

    tracing_subscriber::registry()
        // File writer
        .with(min_level_file.map(|level| {
            layer()
                .with_writer(log_file.with_max_level(level))
                .with_ansi(false)
        }))
        // Stdout writer
        .with(min_level_stdout.map(|level| {
            layer()
                .with_writer(std::io::stdout.with_max_level(level))
                .compact()
                .pretty()
                .with_line_number(true)
                .with_thread_ids(false)
                .with_target(false)
        }))
        // Create and set Subscriber
        .init();

    Ok(())
}
