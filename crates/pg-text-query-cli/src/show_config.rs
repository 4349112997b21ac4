use std::path::Path;

use pg_text_query::{ConfigLayers, ConfigOrigin};

use crate::cli::ConfigArgs;

/// Bundled defaults plus `--config`, falling back to `PGTQ_OPENAI_CONFIG`.
pub fn load_layers(config: Option<&Path>) -> anyhow::Result<ConfigLayers> {
    let layers = match config {
        Some(path) => ConfigLayers::builtin().with_file(path)?,
        None => ConfigLayers::from_env()?,
    };
    Ok(layers)
}

pub fn run(args: ConfigArgs) -> anyhow::Result<()> {
    let layers = load_layers(args.config.as_deref())?;

    for (origin, layer) in layers.layers() {
        let name = match origin {
            ConfigOrigin::Builtin => "builtin".to_string(),
            ConfigOrigin::File(p) => p.display().to_string(),
            ConfigOrigin::Overrides => "overrides".to_string(),
        };
        tracing::debug!(origin = %name, keys = layer.len(), "config layer");
    }

    let effective = layers.resolve(&args.overrides);
    println!("{}", serde_json::to_string_pretty(effective.as_map())?);
    Ok(())
}
