use std::env;
use std::path::PathBuf;

/// Candidate `.env` location used when the working directory has none:
/// `$SCRIPTORIUM_HOME/.env`, else `~/.scriptorium/.env`.
fn fallback_dotenv_path(
    scriptorium_home: Option<PathBuf>,
    home_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(base) = scriptorium_home {
        return Some(base.join(".env"));
    }
    Some(home_dir?.join(".scriptorium").join(".env"))
}

/// Load `.env` from the working directory, falling back to the scriptorium
/// home. A missing or malformed file never blocks startup.
pub fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    let fallback = fallback_dotenv_path(
        env::var_os("SCRIPTORIUM_HOME").map(PathBuf::from),
        dirs::home_dir(),
    );
    if let Some(path) = fallback
        && path.is_file()
    {
        let _ = dotenvy::from_path(&path);
    }
}
