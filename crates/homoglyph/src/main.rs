use std::path::PathBuf;

use anyhow::{anyhow, bail};

mod cli;

const HELP: &str = "\
Usage: homoglyph <command> [options...]

Commands:
  build       Derive ASCII equivalents and write the map and rule files
  coverage    Report code points covered by neither a record nor a range
  pattern     Print the pattern matching the given variants

build options:
  --ucd <file>            UnicodeData.txt
  --confusables <file>    confusablesSummary.txt
  --emoji <file>          emoji-data.txt (optional)
  --map <file>            Write the code point map here
  --rules <file>          Write the per-letter rule file here
  --config <file>         Config file (default: discovered)
  --json                  Print the build summary as JSON

coverage options:
  --ucd <file>            UnicodeData.txt
  --config <file>         Config file (default: discovered)
  --json                  Print the report as JSON

pattern options:
  --json                  Print the pattern as JSON

  -h, --help              Prints help information
  -V, --version           Prints version information

Exit codes: 0 ok, 1 error, 2 coverage issues found.
Set RUST_LOG=info (or debug) for pass details.
";

fn finish(args: pico_args::Arguments) -> anyhow::Result<()> {
    let remaining = args.finish();
    if !remaining.is_empty() {
        bail!("unrecognized arguments: {:?}", remaining);
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = pico_args::Arguments::from_env();
    if args.contains(["-h", "--help"]) {
        eprint!("{HELP}");
        return Ok(());
    }
    if args.contains(["-V", "--version"]) {
        println!("homoglyph {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let code = match args.subcommand()?.as_deref() {
        Some("build") => {
            let options = cli::build::Options {
                ucd: args.value_from_str("--ucd")?,
                confusables: args.value_from_str("--confusables")?,
                emoji: args.opt_value_from_str("--emoji")?,
                map: args.opt_value_from_str("--map")?,
                rules: args.opt_value_from_str("--rules")?,
                config: args.opt_value_from_str("--config")?,
                json: args.contains("--json"),
            };
            finish(args)?;
            cli::build::run(&options)
        }
        Some("coverage") => {
            let ucd: PathBuf = args.value_from_str("--ucd")?;
            let config: Option<PathBuf> = args.opt_value_from_str("--config")?;
            let json = args.contains("--json");
            finish(args)?;
            cli::coverage::run(&ucd, config.as_deref(), json)
        }
        Some("pattern") => {
            let json = args.contains("--json");
            let variants = args
                .finish()
                .into_iter()
                .map(|s| s.into_string())
                .collect::<Result<Vec<String>, _>>()
                .map_err(|s| anyhow!("variant is not valid UTF-8: {s:?}"))?;
            cli::pattern::run(&variants, json)
        }
        Some(other) => bail!("unknown command: {other}"),
        None => {
            eprint!("{HELP}");
            1
        }
    };

    std::process::exit(code);
}
