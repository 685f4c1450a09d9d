//! Drum-stem separation, treated as an external collaborator.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const STEM_FILENAME: &str = "drums.wav";

/// Produces an isolated drum recording for a song. Implementations write the
/// stem into `out_dir` and return its path.
pub trait StemSeparator {
    fn separate(&self, song: &Path, out_dir: &Path) -> Result<PathBuf, Box<dyn Error>>;
}

/// Runs the `demucs` executable in two-stem mode and collects its output.
pub struct DemucsCli {
    pub model: String,
}

impl DemucsCli {
    pub fn new(model: &str) -> Self {
        Self { model: model.to_owned() }
    }
}

impl StemSeparator for DemucsCli {
    fn separate(&self, song: &Path, out_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
        let name = song
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or("input file has no usable name")?;
        let tmp = out_dir.join("separated");

        log::info!("separating drums from {}", song.display());
        let status = Command::new("demucs")
            .args(["-n", &self.model, "--two-stems", "drums", "-o"])
            .arg(&tmp)
            .arg(song)
            .status()?;
        if !status.success() {
            return Err(format!("demucs exited with {status}").into());
        }

        let produced = tmp.join(&self.model).join(name).join(STEM_FILENAME);
        let dest = out_dir.join(STEM_FILENAME);
        move_file(&produced, &dest)?;
        let _ = fs::remove_dir_all(&tmp);
        Ok(dest)
    }
}

/// Treats the input as an already-isolated drum track. Used when demucs is
/// unavailable, and in tests.
pub struct PassthroughStem;

impl StemSeparator for PassthroughStem {
    fn separate(&self, song: &Path, out_dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
        let dest = out_dir.join(STEM_FILENAME);
        fs::copy(song, &dest)?;
        Ok(dest)
    }
}

/// Rename, falling back to copy + remove when crossing filesystems.
pub fn move_file(from: &Path, to: &Path) -> Result<(), Box<dyn Error>> {
    if fs::rename(from, to).is_err() {
        fs::copy(from, to)?;
        fs::remove_file(from)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passthrough_copies_stem() {
        let dir = std::env::temp_dir().join("drumline_stem_test");
        fs::create_dir_all(&dir).unwrap();
        let song = dir.join("song.wav");
        fs::write(&song, b"fake wav").unwrap();

        let out = PassthroughStem.separate(&song, &dir).unwrap();
        assert_eq!(out, dir.join(STEM_FILENAME));
        assert_eq!(fs::read(&out).unwrap(), b"fake wav");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_move_file() {
        let dir = std::env::temp_dir().join("drumline_move_test");
        fs::create_dir_all(&dir).unwrap();
        let from = dir.join("a");
        let to = dir.join("b");
        fs::write(&from, b"x").unwrap();
        move_file(&from, &to).unwrap();
        assert!(!from.exists());
        assert_eq!(fs::read(&to).unwrap(), b"x");
        fs::remove_dir_all(&dir).unwrap();
    }
}
