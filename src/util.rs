use {
    crate::error::{
        DdpgError,
        Result,
    },
    serde::{
        de::DeserializeOwned,
        Serialize,
    },
    std::{
        fs::{
            read_to_string,
            File,
        },
        io::Write,
        path::Path,
    },
};

/// Read a RON config file into `C`.
pub fn read_config<C: DeserializeOwned>(
    path: impl AsRef<Path>,
) -> Result<C> {
    let content = read_to_string(path.as_ref())?;
    ron::from_str(&content).map_err(|e| {
        DdpgError::Config(format!("cannot parse {:?}: {e}", path.as_ref()))
    })
}

/// Write `config` as pretty RON, refusing to overwrite an existing file.
pub fn write_config<C: Serialize>(
    config: &C,
    path: impl AsRef<Path>,
) -> Result<()> {
    if path.as_ref().try_exists()? {
        return Err(DdpgError::Config(format!(
            "{:?} already exists, refusing to overwrite it",
            path.as_ref(),
        )));
    }
    let content = ron::ser::to_string_pretty(
        config,
        ron::ser::PrettyConfig::default(),
    ).map_err(|e| DdpgError::Config(e.to_string()))?;
    File::create(path)?.write_all(content.as_bytes())?;
    Ok(())
}
