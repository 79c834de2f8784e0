//! Master key resolution for the local secret protector.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

use zeroize::Zeroizing;

use hush_crypto::protector::LocalSecretProtector;

use crate::config::HushConfig;

#[derive(Debug, thiserror::Error)]
pub enum KeystoreError {
    #[error("master key file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid master key: {0}")]
    Invalid(#[from] hush_crypto::CryptoError),
}

/// Build the protector from `secrets.master_key_hex`, or from
/// `$data_dir/master.key`, generating that file on first start.
///
/// Instances sharing a data directory agree on one key: a generated key is
/// published with a no-replace link, and the loser of a race adopts the
/// winner's file.
pub fn load_protector(config: &HushConfig) -> Result<LocalSecretProtector, KeystoreError> {
    if !config.secrets.master_key_hex.is_empty() {
        return Ok(LocalSecretProtector::from_hex(&config.secrets.master_key_hex)?);
    }
    let path = config.master_key_path();
    match read(&path) {
        Ok(key_hex) => return Ok(LocalSecretProtector::from_hex(&key_hex)?),
        Err(KeystoreError::Io { ref source, .. }) if source.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }

    let key = LocalSecretProtector::generate_master_key();
    let key_hex = Zeroizing::new(hex::encode(&key[..]));
    if publish_new(&path, &key_hex)? {
        tracing::info!(path = %path.display(), "generated new master key");
        Ok(LocalSecretProtector::new(*key))
    } else {
        tracing::info!(path = %path.display(), "master key created concurrently; using it");
        Ok(LocalSecretProtector::from_hex(&read(&path)?)?)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> KeystoreError + '_ {
    move |source| KeystoreError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read(path: &Path) -> Result<Zeroizing<String>, KeystoreError> {
    std::fs::read_to_string(path)
        .map(Zeroizing::new)
        .map_err(io_err(path))
}

/// Write `contents` to a private temp file, then link it to `path` only if
/// `path` does not exist yet. Returns `false` when another writer got there
/// first. Readers never see a partially written key.
fn publish_new(path: &Path, contents: &str) -> Result<bool, KeystoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let tmp = path.with_extension(format!("{:016x}.tmp", rand::random::<u64>()));
    write_restricted(&tmp, contents)?;

    let linked = std::fs::hard_link(&tmp, path);
    let _ = std::fs::remove_file(&tmp);
    match linked {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(io_err(path)(e)),
    }
}

/// Create a new file readable only by the owner from the first byte on.
fn write_restricted(path: &Path, contents: &str) -> Result<(), KeystoreError> {
    let mut options = OpenOptions::new();
    options.create_new(true).write(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path).map_err(io_err(path))?;
    file.write_all(contents.as_bytes()).map_err(io_err(path))?;
    file.sync_all().map_err(io_err(path))?;
    Ok(())
}
