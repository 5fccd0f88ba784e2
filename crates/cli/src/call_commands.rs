use {
    anyhow::{Context, Result, bail},
    clap::Args,
    serde_json::Value,
    tgwire_client::BotClient,
    tgwire_config::ClientConfig,
    tgwire_payload::{InputFile, ParamValue, Params},
    tracing::info,
};

#[derive(Args)]
pub struct CallArgs {
    /// API method name, e.g. `sendMessage`.
    pub method: String,

    /// String parameter (`key=value`).
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_pair)]
    pub params: Vec<(String, String)>,

    /// Parameter given as JSON (`key=<json>`).
    #[arg(long = "json", value_name = "KEY=JSON", value_parser = parse_pair)]
    pub json: Vec<(String, String)>,

    /// Upload a local file (`key=<path>`).
    #[arg(long = "file", value_name = "KEY=PATH", value_parser = parse_pair)]
    pub files: Vec<(String, String)>,

    /// Upload a file downloaded from a URL (`key=<url>`).
    #[arg(long = "url", value_name = "KEY=URL", value_parser = parse_pair)]
    pub urls: Vec<(String, String)>,

    /// Send to the test environment.
    #[arg(long)]
    pub test_env: bool,
}

pub async fn handle_call(mut config: ClientConfig, args: CallArgs) -> Result<()> {
    if !config.has_token() {
        bail!("no token configured; set TGWIRE_TOKEN or `token` in tgwire.toml");
    }
    config.test_env |= args.test_env;

    let method = args.method.clone();
    let params = build_params(args)?;
    info!(method = %method, fields = params.len(), "calling");

    let client = BotClient::new(config)?;
    let result = client.request(&method, params).await?;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

/// Collects parameters in flag order: strings, JSON, files, then URLs.
/// `--json` values get the same attachment detection as JSON input
/// elsewhere, so `{"source": ..}` shapes are uploaded.
/// A later flag for the same key replaces the earlier value.
fn build_params(args: CallArgs) -> Result<Params> {
    let mut params = Params::new();
    for (key, value) in args.params {
        params.insert(key, value);
    }
    for (key, raw) in args.json {
        let value: Value =
            serde_json::from_str(&raw).with_context(|| format!("--json {key}: invalid JSON"))?;
        let value = ParamValue::from_json(&key, value).with_context(|| format!("--json {key}"))?;
        params.insert(key, value);
    }
    for (key, path) in args.files {
        params.insert(key, InputFile::path(path));
    }
    for (key, url) in args.urls {
        params.insert(key, InputFile::url(url));
    }
    Ok(params)
}

fn parse_pair(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected KEY=VALUE, got `{raw}`")),
    }
}
