use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use visql::{SchemaCatalog, Table};

#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_path: PathBuf,
    /// `true` when the built-in demo catalog stands in for a missing file.
    pub is_demo: bool,
    pub catalog: SchemaCatalog,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let mut file: ConfigFile = toml::from_str(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e}",
                config_path.display()
            )
        })?;

        file.expand_env()?;
        file.validate()?;

        let catalog = SchemaCatalog::new(file.tables, file.relationships).map_err(|e| {
            anyhow::anyhow!("invalid catalog in {}: {e}", config_path.display())
        })?;

        tracing::debug!(
            path = %config_path.display(),
            tables = catalog.list_tables().len(),
            "loaded catalog"
        );

        Ok(Self {
            config_path,
            is_demo: false,
            catalog,
        })
    }

    /// Load `config_path` if it exists, otherwise fall back to the demo catalog.
    pub fn load_or_demo(config_path: PathBuf) -> anyhow::Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        tracing::info!(
            path = %config_path.display(),
            "config not found; using built-in demo catalog"
        );
        Ok(Self {
            config_path,
            is_demo: true,
            catalog: SchemaCatalog::demo(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    #[serde(default)]
    pub tables: Vec<Table>,

    #[serde(default)]
    pub relationships: BTreeMap<String, Vec<String>>,
}

impl ConfigFile {
    fn expand_env(&mut self) -> anyhow::Result<()> {
        for t in &mut self.tables {
            t.name = expand_env_vars(&t.name)?;
            for c in &mut t.columns {
                *c = expand_env_vars(c)?;
            }
        }

        let mut relationships = BTreeMap::new();
        for (from, targets) in std::mem::take(&mut self.relationships) {
            let targets = targets
                .iter()
                .map(|t| expand_env_vars(t))
                .collect::<anyhow::Result<Vec<_>>>()?;
            relationships.insert(expand_env_vars(&from)?, targets);
        }
        self.relationships = relationships;

        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }

        if self.tables.is_empty() {
            anyhow::bail!("at least one [[tables]] entry is required");
        }

        for t in &self.tables {
            if t.name.trim().is_empty() {
                anyhow::bail!("tables.name must not be empty");
            }
            if t.name.contains('.') {
                anyhow::bail!("tables.name must not contain '.' (table: {})", t.name);
            }
            if t.columns.is_empty() {
                anyhow::bail!("tables.columns must not be empty (table: {})", t.name);
            }
            let mut seen = std::collections::HashSet::<&str>::new();
            for c in &t.columns {
                if c.trim().is_empty() {
                    anyhow::bail!("column names must not be empty (table: {})", t.name);
                }
                if !seen.insert(c.as_str()) {
                    anyhow::bail!("duplicate column {c} in table {}", t.name);
                }
            }
        }

        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '$' && chars.peek() == Some(&'{') {
            chars.next(); // consume '{'

            let mut key = String::new();
            let mut closed = false;
            while let Some(&ch) = chars.peek() {
                chars.next();
                if ch == '}' {
                    closed = true;
                    break;
                }
                key.push(ch);
            }

            if !closed {
                anyhow::bail!("unterminated env var reference: ${{{key}}}");
            }
            if key.is_empty() {
                anyhow::bail!("invalid env var reference: ${{}}");
            }

            let v = std::env::var(&key)
                .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
            out.push_str(&v);
            continue;
        }

        out.push(c);
    }

    Ok(out)
}
