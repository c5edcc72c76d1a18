use homoglyph_core::pattern;

pub fn run(variants: &[String], json: bool) -> i32 {
    let Some(synthesized) = pattern::synthesize(variants) else {
        eprintln!("homoglyph: no non-empty variants given");
        return 1;
    };

    if let Err(e) = pattern::compile(&synthesized) {
        eprintln!("homoglyph: synthesized pattern does not compile: {e}");
        return 1;
    }

    if json {
        let value = serde_json::json!({
            "schema_version": 1,
            "variants": variants,
            "pattern": synthesized,
        });
        match serde_json::to_string(&value) {
            Ok(s) => println!("{s}"),
            Err(e) => {
                eprintln!("homoglyph: JSON serialization failed: {e}");
                return 1;
            }
        }
    } else {
        println!("{synthesized}");
    }
    0
}
