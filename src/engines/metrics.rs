use {
    crate::error::{
        DdpgError,
        Result,
    },
    polars::prelude::{
        DataFrame,
        NamedFrom,
        ParquetWriter,
        Series,
    },
    std::{
        fs::{
            create_dir_all,
            read_dir,
            File,
        },
        path::{
            Path,
            PathBuf,
        },
    },
    tracing::{
        debug,
        error,
        info,
        warn,
    },
};


/// Receives named scalars tagged with a step or episode index.
///
/// Emission is fire-and-forget: sinks never report failure back to the
/// learner. Sinks that buffer rows write them out on [`MetricSink::flush`].
pub trait MetricSink {
    fn add_scalar(
        &mut self,
        name: &'static str,
        value: f64,
        step: usize,
    );

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<M: MetricSink + ?Sized> MetricSink for Box<M> {
    fn add_scalar(
        &mut self,
        name: &'static str,
        value: f64,
        step: usize,
    ) {
        (**self).add_scalar(name, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}

impl<M: MetricSink + ?Sized> MetricSink for &mut M {
    fn add_scalar(
        &mut self,
        name: &'static str,
        value: f64,
        step: usize,
    ) {
        (**self).add_scalar(name, value, step)
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }
}


/// Writes every scalar to the `tracing` subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl MetricSink for TracingSink {
    fn add_scalar(
        &mut self,
        name: &'static str,
        value: f64,
        step: usize,
    ) {
        info!(metric = name, value, step);
    }
}


#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scalar {
    pub name: &'static str,
    pub step: usize,
    pub value: f64,
}

/// One row per scalar (`name`, `step`, `value`).
fn write_scalars(
    scalars: &[Scalar],
    path: &Path,
) -> Result<()> {
    let names: Vec<&str> = scalars.iter().map(|s| s.name).collect();
    let steps: Vec<u64> = scalars.iter().map(|s| s.step as u64).collect();
    let values: Vec<f64> = scalars.iter().map(|s| s.value).collect();

    let mut df = DataFrame::new(vec![
        Series::new("name", &names),
        Series::new("step", &steps),
        Series::new("value", &values),
    ]).map_err(|e| DdpgError::Metrics(e.to_string()))?;

    ParquetWriter::new(File::create(path)?)
        .finish(&mut df)
        .map_err(|e| DdpgError::Metrics(e.to_string()))?;
    Ok(())
}


/// Keeps every scalar in memory, in emission order.
///
/// Meant for tests and short runs; long runs should use a [`ParquetSink`].
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    scalars: Vec<Scalar>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalars(&self) -> &[Scalar] {
        &self.scalars
    }

    /// All `(step, value)` pairs emitted under `name`.
    pub fn series(
        &self,
        name: &str,
    ) -> Vec<(usize, f64)> {
        self.scalars
            .iter()
            .filter(|s| s.name == name)
            .map(|s| (s.step, s.value))
            .collect()
    }

    /// Write everything recorded so far to a single Parquet file.
    pub fn write_parquet(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<()> {
        write_scalars(&self.scalars, path.as_ref())
    }
}

impl MetricSink for RecordingSink {
    fn add_scalar(
        &mut self,
        name: &'static str,
        value: f64,
        step: usize,
    ) {
        debug!(metric = name, value, step);
        self.scalars.push(Scalar {
            name,
            step,
            value,
        });
    }
}


/// Buffers at most `chunk_rows` scalars and writes them to numbered part
/// files `<dir>/part-<n>.parquet`.
///
/// Numbering continues after the parts already in `dir`, so a resumed run
/// adds to the metrics of the run it continues. Whatever is still pending is
/// written on [`MetricSink::flush`] and on drop.
#[derive(Debug)]
pub struct ParquetSink {
    dir: PathBuf,
    chunk_rows: usize,
    pending: Vec<Scalar>,
    next_part: usize,
}

fn part_index(path: &Path) -> Option<usize> {
    path.file_name()?
        .to_str()?
        .strip_prefix("part-")?
        .strip_suffix(".parquet")?
        .parse()
        .ok()
}

impl ParquetSink {
    pub fn new(
        dir: impl AsRef<Path>,
        chunk_rows: usize,
    ) -> Result<Self> {
        if chunk_rows == 0 {
            return Err(DdpgError::Config("metric chunks must hold at least one row".into()));
        }
        let dir = dir.as_ref().to_path_buf();
        create_dir_all(&dir)?;

        let mut next_part = 0;
        for entry in read_dir(&dir)? {
            if let Some(index) = part_index(&entry?.path()) {
                next_part = next_part.max(index + 1);
            }
        }

        Ok(Self {
            dir,
            chunk_rows,
            pending: Vec::with_capacity(chunk_rows),
            next_part,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Rows not yet written.
    pub fn pending(&self) -> &[Scalar] {
        &self.pending
    }

    pub fn part_path(
        &self,
        index: usize,
    ) -> PathBuf {
        self.dir.join(format!("part-{index:05}.parquet"))
    }
}

impl MetricSink for ParquetSink {
    fn add_scalar(
        &mut self,
        name: &'static str,
        value: f64,
        step: usize,
    ) {
        debug!(metric = name, value, step);
        self.pending.push(Scalar {
            name,
            step,
            value,
        });
        if self.pending.len() >= self.chunk_rows {
            if let Err(e) = self.flush() {
                error!("Dropping {} metric rows: {e}", self.pending.len());
                self.pending.clear();
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let path = self.part_path(self.next_part);
        write_scalars(&self.pending, &path)?;
        debug!("Wrote {} metric rows to {path:?}", self.pending.len());
        self.pending.clear();
        self.next_part += 1;
        Ok(())
    }
}

impl Drop for ParquetSink {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            warn!("Lost {} metric rows: {e}", self.pending.len());
        }
    }
}


#[cfg(test)]
mod tests {
    use {
        super::*,
        tempdir::TempDir,
    };

    #[test]
    fn series_are_filtered_by_name() {
        let mut sink = RecordingSink::new();
        sink.add_scalar("loss_critic", 1.0, 0);
        sink.add_scalar("memory", 10.0, 0);
        sink.add_scalar("loss_critic", 0.5, 1);

        assert_eq!(sink.series("loss_critic"), vec![(0, 1.0), (1, 0.5)]);
        assert_eq!(sink.series("memory"), vec![(0, 10.0)]);
        assert!(sink.series("missing").is_empty());
    }

    #[test]
    fn boxed_sinks_forward() {
        let mut recording = RecordingSink::new();
        {
            let mut boxed: Box<dyn MetricSink + '_> = Box::new(&mut recording);
            boxed.add_scalar("step", 3.0, 7);
            boxed.flush().unwrap();
        }
        assert_eq!(recording.scalars().len(), 1);
    }

    #[test]
    fn writes_parquet() {
        let dir = TempDir::new("metrics").unwrap();
        let path = dir.path().join("metrics.parquet");

        let mut sink = RecordingSink::new();
        sink.add_scalar("test_reward", -12.5, 0);
        sink.add_scalar("test_reward", 40.0, 10);
        sink.write_parquet(&path).unwrap();

        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn parquet_sink_never_holds_more_than_a_chunk() {
        let dir = TempDir::new("metrics").unwrap();
        let mut sink = ParquetSink::new(dir.path(), 4).unwrap();

        for step in 0..10 {
            sink.add_scalar("loss_critic", step as f64, step);
            assert!(sink.pending().len() < 4);
        }
        assert_eq!(sink.pending().len(), 2);
        assert!(sink.part_path(0).exists());
        assert!(sink.part_path(1).exists());
        assert!(!sink.part_path(2).exists());

        sink.flush().unwrap();
        assert!(sink.pending().is_empty());
        assert!(sink.part_path(2).exists());

        // nothing pending, nothing written
        sink.flush().unwrap();
        assert!(!sink.part_path(3).exists());
    }

    #[test]
    fn parquet_sink_flushes_on_drop_and_continues_numbering() {
        let dir = TempDir::new("metrics").unwrap();
        {
            let mut sink = ParquetSink::new(dir.path(), 100).unwrap();
            sink.add_scalar("memory", 10.0, 0);
        }
        let first = ParquetSink::new(dir.path(), 100).unwrap();
        assert!(first.part_path(0).exists());

        let mut resumed = first;
        resumed.add_scalar("memory", 20.0, 1);
        resumed.flush().unwrap();
        assert!(resumed.part_path(1).exists());
    }

    #[test]
    fn empty_chunks_are_rejected() {
        let dir = TempDir::new("metrics").unwrap();
        assert!(matches!(ParquetSink::new(dir.path(), 0), Err(DdpgError::Config(_))));
    }
}
