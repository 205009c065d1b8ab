use anyhow::{Result, bail};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// 10 MB upload limit for images
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

// A bare dotfile such as ".png" has no extension, so a stem character is required
static IMAGE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)[^/\\](\.(?:jpg|jpeg|png|gif|webp|svg))$").expect("image pattern")
});

/// Extension (with its dot) of an allowed image filename, as the client sent it.
pub fn image_extension(original_filename: &str) -> Option<&str> {
    let ext = IMAGE_NAME.captures(original_filename)?.get(1)?;
    Some(ext.as_str())
}

/// Manages on-disk storage for uploaded images.
///
/// Each upload is a flat file at `{dir}/{stored_name}`. Names are generated
/// server-side and never reused, so there is exactly one writer per file.
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub async fn new(dir: PathBuf) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Upload directory: {}", dir.display());
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path for a stored name. Rejects anything that could leave the directory.
    pub fn file_path(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty()
            || name.contains(['/', '\\'])
            || name.contains("..")
        {
            bail!("Invalid stored filename: {:?}", name);
        }
        Ok(self.dir.join(name))
    }

    /// Write a new upload. Fails if a file with this name already exists.
    pub async fn save(&self, name: &str, data: &[u8]) -> Result<()> {
        let path = self.file_path(name)?;
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await?;
        file.write_all(data).await?;
        file.flush().await?;
        debug!("Stored upload {} ({} bytes)", name, data.len());
        Ok(())
    }

    /// Delete an upload. A file that is already gone counts as deleted.
    pub async fn delete_file(&self, name: &str) -> Result<()> {
        let path = self.file_path(name)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!("Deleted upload {}", name);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Upload {} already gone", name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
