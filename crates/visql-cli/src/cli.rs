use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Catalog,
    Render,
    Session,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Catalog(CatalogArgs),
    Render(RenderArgs),
    Session(SessionArgs),
}

#[derive(Debug, Clone)]
pub struct CatalogArgs {
    pub config: PathBuf,
}

#[derive(Debug, Clone)]
pub struct RenderArgs {
    pub config: PathBuf,
    pub json: bool,
    pub recipe: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SessionArgs {
    pub config: PathBuf,
}

const DEFAULT_CONFIG: &str = "visql.toml";

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1);
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first.as_str() {
        "-h" | "--help" | "help" => Ok(Command::Help(HelpTopic::Root)),
        "catalog" => parse_catalog(it.map(|s| s.as_str())),
        "render" => parse_render(it.map(|s| s.as_str())),
        "session" => parse_session(it.map(|s| s.as_str())),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

/// Handle `--config <FILE>` / `--config=<FILE>`; returns `true` if consumed.
fn take_config<'a>(
    token: &str,
    it: &mut impl Iterator<Item = &'a str>,
    config: &mut PathBuf,
) -> anyhow::Result<bool> {
    if token == "--config" {
        let Some(v) = it.next() else {
            anyhow::bail!("--config requires a value");
        };
        *config = PathBuf::from(v);
        return Ok(true);
    }
    if let Some(v) = token.strip_prefix("--config=") {
        *config = PathBuf::from(v);
        return Ok(true);
    }
    Ok(false)
}

fn parse_catalog<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Catalog)),
            _ if take_config(token, &mut it, &mut config)? => {}
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Catalog(CatalogArgs { config }))
}

fn parse_render<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut json = false;
    let mut recipe: Option<PathBuf> = None;

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Render)),
            "--json" => json = true,
            _ if take_config(token, &mut it, &mut config)? => {}
            other if other.starts_with('-') => anyhow::bail!("unknown argument: {other}"),
            other => {
                if recipe.is_some() {
                    anyhow::bail!("only one recipe file may be given (extra: {other})");
                }
                recipe = Some(PathBuf::from(other));
            }
        }
    }

    let Some(recipe) = recipe else {
        anyhow::bail!("render requires a recipe file");
    };

    Ok(Command::Render(RenderArgs {
        config,
        json,
        recipe,
    }))
}

fn parse_session<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut config = PathBuf::from(DEFAULT_CONFIG);

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Session)),
            _ if take_config(token, &mut it, &mut config)? => {}
            other => anyhow::bail!("unknown argument: {other}"),
        }
    }

    Ok(Command::Session(SessionArgs { config }))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
visql - build SQL SELECT statements from table, join and filter picks

USAGE:
  visql <COMMAND> [OPTIONS]

COMMANDS:
  catalog       Show tables, columns and relationships
  render        Replay a query recipe and print the SQL
  session       Build a query interactively on stdin

Run `visql <command> --help` for more."
            );
        }
        HelpTopic::Catalog => {
            println!(
                "\
USAGE:
  visql catalog [OPTIONS]

OPTIONS:
  --config <FILE>       Config file path (default: visql.toml; built-in demo catalog if missing)
  -h, --help            Print help"
            );
        }
        HelpTopic::Render => {
            println!(
                "\
USAGE:
  visql render [OPTIONS] <RECIPE>

NOTES:
  - The recipe is a TOML file listing table rows, joins, where-conditions,
    group_by, order_by, limit and offset; it is applied in form order.

OPTIONS:
  --config <FILE>       Config file path (default: visql.toml; built-in demo catalog if missing)
  --json                Print SQL and picker options as JSON
  -h, --help            Print help"
            );
        }
        HelpTopic::Session => {
            println!(
                "\
USAGE:
  visql session [OPTIONS]

NOTES:
  - Reads one action per line from stdin; type `help` inside the session
    for the action list. Nothing is saved when the session ends.

OPTIONS:
  --config <FILE>       Config file path (default: visql.toml; built-in demo catalog if missing)
  -h, --help            Print help"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(v: &[&str]) -> Vec<String> {
        std::iter::once("visql")
            .chain(v.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn parse_no_args_is_help() {
        let cmd = parse_args(&args(&[])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }

    #[test]
    fn parse_render_with_options() {
        let cmd = parse_args(&args(&["render", "--config=db/visql.toml", "--json", "q.toml"])).unwrap();
        let Command::Render(r) = cmd else {
            panic!("expected render");
        };
        assert_eq!(r.config, PathBuf::from("db/visql.toml"));
        assert!(r.json);
        assert_eq!(r.recipe, PathBuf::from("q.toml"));
    }

    #[test]
    fn parse_render_requires_recipe() {
        let err = parse_args(&args(&["render", "--json"])).unwrap_err();
        assert!(err.to_string().contains("recipe"));
    }

    #[test]
    fn parse_render_rejects_two_recipes() {
        assert!(parse_args(&args(&["render", "a.toml", "b.toml"])).is_err());
    }

    #[test]
    fn parse_session_config() {
        let cmd = parse_args(&args(&["session", "--config", "x.toml"])).unwrap();
        let Command::Session(s) = cmd else {
            panic!("expected session");
        };
        assert_eq!(s.config, PathBuf::from("x.toml"));
    }

    #[test]
    fn parse_catalog_help_and_errors() {
        let cmd = parse_args(&args(&["catalog", "--help"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Catalog)));
        assert!(parse_args(&args(&["catalog", "--config"])).is_err());
        assert!(parse_args(&args(&["catalog", "--bogus"])).is_err());
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }
}
