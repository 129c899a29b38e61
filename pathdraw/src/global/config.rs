use pathdraw_core::config::EngineConfig;

const DOCUMENTATION: &str = r#"# Pathdraw settings. You may edit this file, but be aware that formatting and comments will not
# be preserved, and all keys and values are case sensitive.

# Colors accept `none`, `transparent`, `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(r, g, b)`,
# `rgba(r, g, b, a)` and CSS color names. Invalid values are ignored with a warning.
# `mode` is one of "pencil" or "pen", `input_source` one of "mouse" or "touch".
# Exports are saved into `output_dir`, or the working directory if unset.

# Examples:
# output_dir = "/home/me/drawings"
# [engine]
# throttle_ms = 16.0
# stroke = "rgba(0, 0, 0, 0.5)"

"#;

#[must_use]
pub fn preferences_dir() -> Option<std::path::PathBuf> {
    let mut base_dir = dirs::preference_dir()?;
    base_dir.push(env!("CARGO_PKG_NAME"));
    Some(base_dir)
}

#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub output_dir: Option<std::path::PathBuf>,
    pub engine: EngineConfig,
}

pub struct Config {
    failed_to_load: bool,
    pub file: ConfigFile,
}
impl Config {
    const FILENAME: &'static str = "config.toml";
    /// Shared global settings, saved and loaded from user preferences.
    /// (Or defaulted, if unavailable for some reason)
    #[must_use]
    pub fn get() -> &'static Self {
        static GLOBAL_CONFIG: std::sync::OnceLock<Config> = std::sync::OnceLock::new();

        GLOBAL_CONFIG.get_or_init(|| {
            let mut dir = preferences_dir();
            match dir.as_mut() {
                None => Self::no_path(),
                Some(dir) => {
                    dir.push(Self::FILENAME);
                    Self::load_or_default(dir)
                }
            }
        })
    }
    #[must_use]
    pub fn no_path() -> Self {
        log::warn!("Settings weren't available, defaulting.");
        Self {
            failed_to_load: true,
            file: ConfigFile::default(),
        }
    }
    #[must_use]
    fn load_or_default(path: &std::path::Path) -> Self {
        let file: anyhow::Result<ConfigFile> = try_block::try_block! {
            let string = std::fs::read_to_string(path)?;
            let file : ConfigFile = toml::from_str(&string)?;

            Ok(file)
        };

        match file {
            Ok(file) => Self {
                failed_to_load: false,
                file,
            },
            Err(e) => {
                log::debug!("reading {path:?}: {e}");
                Self::no_path()
            }
        }
    }
    /// Return true if loading user's settings failed.
    #[must_use]
    pub fn did_fail_to_load(&self) -> bool {
        self.failed_to_load
    }
    /// Where exports are written.
    #[must_use]
    pub fn output_dir(&self) -> std::path::PathBuf {
        self.file
            .output_dir
            .clone()
            .unwrap_or_else(|| std::path::PathBuf::from("."))
    }
    pub fn save(&self) -> anyhow::Result<std::path::PathBuf> {
        let mut preferences =
            preferences_dir().ok_or_else(|| anyhow::anyhow!("No preferences dir found"))?;
        // Explicity do *not* create recursively. If not found, the user probably has a good reason.
        // Ignore errors (could already exist). Any real errors will be emitted by file access below.
        let _ = std::fs::DirBuilder::new().create(&preferences);

        preferences.push(Self::FILENAME);
        let mut string = toml::ser::to_string_pretty(&self.file)?;
        string = DOCUMENTATION.to_owned() + &string;
        std::fs::write(&preferences, string)?;
        Ok(preferences)
    }
}
