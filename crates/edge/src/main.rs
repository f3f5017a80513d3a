use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gatehouse_observability::init();

    let config = gatehouse_edge::EdgeConfig::from_env().context("invalid edge configuration")?;
    let bind_addr = config.bind_addr;

    let app = gatehouse_edge::app::build_app(config);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
