use super::{prepare, print_json, rpc_error, supervisor};
use crate::args::{Cli, LaunchArgs};
use anyhow::{Context, Result};
use lbrynet_supervisor::Params;

pub(crate) async fn cmd_status(cli: &Cli, launch: LaunchArgs) -> Result<()> {
    let supervisor = supervisor(cli, false)?;
    prepare(&supervisor, launch).await?;
    print_json(&supervisor.status().await.map_err(rpc_error)?)
}

pub(crate) async fn cmd_version(cli: &Cli, launch: LaunchArgs) -> Result<()> {
    let supervisor = supervisor(cli, false)?;
    prepare(&supervisor, launch).await?;
    println!("{}", supervisor.version().await.map_err(rpc_error)?);
    Ok(())
}

pub(crate) async fn cmd_call(
    cli: &Cli,
    method: &str,
    params: &str,
    launch: LaunchArgs,
) -> Result<()> {
    let params = parse_params(params)?;
    tracing::trace!(method = %method, params = ?params, "cmd_call invoked");

    let supervisor = supervisor(cli, false)?;
    prepare(&supervisor, launch).await?;
    let result = supervisor
        .request(method, params)
        .await
        .map_err(rpc_error)?;
    print_json(&result)
}

pub(crate) async fn cmd_resolve(cli: &Cli, urls: &[String], launch: LaunchArgs) -> Result<()> {
    let supervisor = supervisor(cli, false)?;
    prepare(&supervisor, launch).await?;

    if let [url] = urls {
        return print_json(&supervisor.resolve_one(url).await.map_err(rpc_error)?);
    }
    let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
    let entries = supervisor
        .resolve(&urls, Params::new())
        .await
        .map_err(rpc_error)?;
    print_json(&entries)
}

pub(crate) async fn cmd_get(cli: &Cli, uri: &str, launch: LaunchArgs) -> Result<()> {
    let supervisor = supervisor(cli, false)?;
    prepare(&supervisor, launch).await?;
    let info = supervisor
        .get(uri, Params::new())
        .await
        .map_err(rpc_error)?;
    print_json(&info)
}

fn parse_params(raw: &str) -> Result<Params> {
    serde_json::from_str(raw)
        .with_context(|| format!("--params must be a JSON object, got: {}", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_params_object() {
        let params = parse_params(r#"{"page_size": 5}"#).unwrap();
        assert_eq!(params.get("page_size"), Some(&serde_json::json!(5)));
    }

    #[test]
    fn test_parse_params_rejects_non_objects() {
        assert!(parse_params("[1, 2]").is_err());
        assert!(parse_params("nope").is_err());
    }
}
