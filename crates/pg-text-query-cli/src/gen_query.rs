use pg_text_query::{Credential, GenerateOptions, OpenAiClient, PgtqError, QueryGenerator};

use crate::cli::GenArgs;
use crate::show_config::load_layers;

pub async fn run(args: GenArgs) -> anyhow::Result<()> {
    let layers = load_layers(args.config.as_deref())?;
    let generator = QueryGenerator::new(OpenAiClient::from_env(), Credential::from_env(), layers);

    let options = GenerateOptions::new()
        .validate_sql(args.validate)
        .overrides(args.overrides);

    tracing::info!(validate = args.validate, "generating query");

    match generator.generate_query(&args.prompt, &options).await {
        Ok(sql) => {
            println!("{sql}");
            Ok(())
        }
        Err(PgtqError::EnvVar(msg)) => {
            anyhow::bail!("{msg}; set it in the environment or a .env file")
        }
        Err(e) => Err(e.into()),
    }
}
