use crate::search::SearchCategory;
use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "docindex";
const CONFIG_FILE: &str = "config.json";

/// Generated subtree attached to a configured navigation section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SectionSource {
    /// Annotated class list grouped by namespace
    ClassList,
    Hierarchy,
    Namespaces,
    Concepts,
    Files,
    /// One node per leading character of the member names in a category
    Members { category: SearchCategory },
}

impl SectionSource {
    /// Name of the script file holding the generated children
    pub fn script_name(&self) -> String {
        match self {
            SectionSource::ClassList => "annotated_dup".to_string(),
            SectionSource::Hierarchy => "hierarchy".to_string(),
            SectionSource::Namespaces => "namespaces_dup".to_string(),
            SectionSource::Concepts => "concepts".to_string(),
            SectionSource::Files => "files_dup".to_string(),
            SectionSource::Members { category } => {
                let suffix = match category {
                    SearchCategory::All => "dup",
                    SearchCategory::Classes => "class",
                    SearchCategory::Functions => "func",
                    SearchCategory::Variables => "vars",
                    SearchCategory::Typedefs => "type",
                    SearchCategory::Enums => "enum",
                    SearchCategory::EnumValues => "eval",
                    SearchCategory::Concepts => "conc",
                };
                format!("functions_{}", suffix)
            }
        }
    }
}

/// One node of the configured navigation skeleton
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionConfig {
    pub title: String,

    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub source: Option<SectionSource>,

    #[serde(default)]
    pub children: Vec<SectionConfig>,
}

impl SectionConfig {
    fn page(title: &str, link: &str) -> Self {
        Self {
            title: title.to_string(),
            link: Some(link.to_string()),
            source: None,
            children: Vec::new(),
        }
    }

    fn generated(title: &str, link: &str, source: SectionSource) -> Self {
        Self {
            source: Some(source),
            ..Self::page(title, link)
        }
    }

    fn group(title: &str, link: &str, children: Vec<SectionConfig>) -> Self {
        Self {
            children,
            ..Self::page(title, link)
        }
    }
}

/// Build configuration, read from JSON with per-field defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocConfig {
    /// Label of the navigation root
    #[serde(default = "default_project_name")]
    pub project_name: String,

    #[serde(default = "default_main_page")]
    pub main_page: String,

    /// Entries per `navtreeindexN.js` page
    #[serde(default = "default_page_size")]
    pub page_size: usize,

    /// Mixed into every generated anchor; change it to version the anchors
    #[serde(default)]
    pub anchor_seed: String,

    /// Shorter identifier segments are not indexed for search
    #[serde(default = "default_min_segment_len")]
    pub min_segment_len: usize,

    /// File-name glob for symbol tables when the input is a directory
    #[serde(default = "default_input_glob")]
    pub input_glob: String,

    #[serde(default = "default_sections")]
    pub sections: Vec<SectionConfig>,
}

fn default_project_name() -> String {
    "dxFeed Graal CXX API".to_string()
}

fn default_main_page() -> String {
    "index.html".to_string()
}

fn default_page_size() -> usize {
    250
}

fn default_min_segment_len() -> usize {
    2
}

fn default_input_glob() -> String {
    "*.json".to_string()
}

fn default_sections() -> Vec<SectionConfig> {
    let members = |title: &str, link: &str, category| {
        SectionConfig::generated(title, link, SectionSource::Members { category })
    };

    vec![
        SectionConfig::group(
            "Namespaces",
            "namespaces.html",
            vec![SectionConfig::generated(
                "Namespace List",
                "namespaces.html",
                SectionSource::Namespaces,
            )],
        ),
        SectionConfig::generated("Concepts", "concepts.html", SectionSource::Concepts),
        SectionConfig::group(
            "Classes",
            "annotated.html",
            vec![
                SectionConfig::generated("Class List", "annotated.html", SectionSource::ClassList),
                SectionConfig::page("Class Index", "classes.html"),
                SectionConfig::generated("Class Hierarchy", "hierarchy.html", SectionSource::Hierarchy),
                SectionConfig::group(
                    "Class Members",
                    "functions.html",
                    vec![
                        members("All", "functions.html", SearchCategory::All),
                        members("Functions", "functions_func.html", SearchCategory::Functions),
                        members("Variables", "functions_vars.html", SearchCategory::Variables),
                        members("Typedefs", "functions_type.html", SearchCategory::Typedefs),
                        members("Enumerations", "functions_enum.html", SearchCategory::Enums),
                        members("Enumerator", "functions_eval.html", SearchCategory::EnumValues),
                    ],
                ),
            ],
        ),
        SectionConfig::group(
            "Files",
            "files.html",
            vec![SectionConfig::generated("File List", "files.html", SectionSource::Files)],
        ),
    ]
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            main_page: default_main_page(),
            page_size: default_page_size(),
            anchor_seed: String::new(),
            min_segment_len: default_min_segment_len(),
            input_glob: default_input_glob(),
            sections: default_sections(),
        }
    }
}

impl DocConfig {
    /// Load from an explicit file, else the user config file, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match get_config_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: DocConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            bail!("page_size must be at least 1");
        }
        if self.main_page.is_empty() {
            bail!("main_page must not be empty");
        }
        Ok(())
    }
}

/// Path of the user-level config file, if the platform has a config dir
pub fn get_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE))
}
