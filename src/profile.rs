use configparser::ini::Ini;
use std::path::{Path, PathBuf};

use crate::error::{Result, ShotError};

fn aws_dir() -> Result<PathBuf> {
    dirs_next::home_dir()
        .map(|home| home.join(".aws"))
        .ok_or_else(|| ShotError::Profile("could not locate home directory".into()))
}

/// Looks for `profile` in the shared credentials and config files under
/// the user's `~/.aws` directory.
pub fn profile_exists(profile: &str) -> Result<bool> {
    profile_exists_in(&aws_dir()?, profile)
}

pub fn profile_exists_in(aws_dir: &Path, profile: &str) -> Result<bool> {
    // configparser lowercases section names by default.
    let wanted = profile.to_lowercase();

    let credentials = aws_dir.join("credentials");
    if credentials.exists() && sections(&credentials)?.iter().any(|s| *s == wanted) {
        return Ok(true);
    }

    let config = aws_dir.join("config");
    if config.exists() {
        let named = format!("profile {}", wanted);
        return Ok(sections(&config)?
            .iter()
            .any(|s| *s == named || (wanted == "default" && *s == "default")));
    }

    Ok(false)
}

fn sections(path: &Path) -> Result<Vec<String>> {
    let mut ini = Ini::new();
    ini.load(path)
        .map_err(|e| ShotError::Profile(format!("{}: {}", path.display(), e)))?;
    Ok(ini.sections())
}
