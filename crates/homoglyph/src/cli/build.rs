use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use homoglyph_core::artifact::{self, Header};
use homoglyph_core::output;
use homoglyph_core::pipeline::{self, BuildInputs};

pub struct Options {
    pub ucd: PathBuf,
    pub confusables: PathBuf,
    pub emoji: Option<PathBuf>,
    pub map: Option<PathBuf>,
    pub rules: Option<PathBuf>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

pub fn run(options: &Options) -> i32 {
    let Some(config) = super::load_config(options.config.as_deref()) else {
        return 1;
    };
    let Some(ucd) = super::read_input(&options.ucd) else {
        return 1;
    };
    let Some(confusables) = super::read_input(&options.confusables) else {
        return 1;
    };
    let emoji = match &options.emoji {
        Some(path) => match super::read_input(path) {
            Some(text) => Some(text),
            None => return 1,
        },
        None => None,
    };

    let inputs = BuildInputs {
        ucd: &ucd,
        confusables: &confusables,
        emoji: emoji.as_deref(),
    };
    let built = match pipeline::build(inputs, &config) {
        Ok(built) => built,
        Err(e) => {
            eprintln!("homoglyph: build failed: {e}");
            return 1;
        }
    };

    let ucd_name = super::source_name(&options.ucd);
    let confusables_name = super::source_name(&options.confusables);
    let emoji_name = options.emoji.as_deref().map(super::source_name);
    let mut sources = vec![
        (ucd_name.as_str(), ucd.as_bytes()),
        (confusables_name.as_str(), confusables.as_bytes()),
    ];
    if let (Some(name), Some(text)) = (&emoji_name, &emoji) {
        sources.push((name.as_str(), text.as_bytes()));
    }
    let header = Header::new(&sources);

    if let Some(path) = &options.map {
        let written = create(path).and_then(|mut w| {
            artifact::write_map(&built.map, &header, &mut w)?;
            w.flush()
        });
        if let Err(e) = written {
            eprintln!("homoglyph: cannot write map {}: {e}", path.display());
            return 1;
        }
    }

    if let Some(path) = &options.rules {
        let written = create(path)
            .map_err(homoglyph_core::Error::from)
            .and_then(|mut w| {
                artifact::write_rules(&built.rules, &header, &mut w)?;
                Ok(w.flush()?)
            });
        if let Err(e) = written {
            eprintln!("homoglyph: cannot write rules {}: {e}", path.display());
            return 1;
        }
    }

    let printed = if options.json {
        output::write_build_json(&built.summary, std::io::stdout().lock())
    } else {
        output::write_build_auto(&built.summary)
    };
    if let Err(e) = printed {
        eprintln!("homoglyph: output failed: {e}");
        return 1;
    }
    0
}

fn create(path: &Path) -> std::io::Result<BufWriter<File>> {
    Ok(BufWriter::new(File::create(path)?))
}
